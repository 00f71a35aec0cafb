use crate::core::{color::Color, config_args::ConfigArgs};

use super::TextureT;

pub struct ConstantTex {
    value: Color,
}

impl ConstantTex {
    pub fn new(value: Color) -> Self {
        Self { value }
    }

    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let value = args.load_vec3("value")?;
        Ok(Self::new(value.into()))
    }
}

impl TextureT for ConstantTex {
    fn color_at(&self, _uv: glam::Vec2) -> Color {
        self.value
    }
}
