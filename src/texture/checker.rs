use crate::core::{color::Color, config_args::ConfigArgs};

use super::{util::UvMapping, TextureT};

/// Alternates two colours over a `scale` x `scale` grid per uv unit.
pub struct CheckerTex {
    color0: Color,
    color1: Color,
    scale: f32,
    mapping: UvMapping,
}

impl CheckerTex {
    pub fn new(color0: Color, color1: Color, scale: f32, mapping: UvMapping) -> Self {
        Self {
            color0,
            color1,
            scale,
            mapping,
        }
    }

    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let color0 = args.load_vec3_or("color0", glam::Vec3::ZERO)?;
        let color1 = args.load_vec3_or("color1", glam::Vec3::ONE)?;
        let scale = args.load_float_or("scale", 8.0)?;
        if scale <= 0.0 {
            anyhow::bail!("{} - 'scale' should be positive", args.path());
        }
        let mapping = UvMapping::load(args)?;
        Ok(Self::new(color0.into(), color1.into(), scale, mapping))
    }
}

impl TextureT for CheckerTex {
    fn color_at(&self, uv: glam::Vec2) -> Color {
        let uv = self.mapping.apply(uv) * self.scale;
        let parity = (uv.x.floor() as i64 + uv.y.floor() as i64).rem_euclid(2);
        if parity == 0 {
            self.color0
        } else {
            self.color1
        }
    }
}
