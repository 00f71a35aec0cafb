use crate::{
    core::{color::Color, config_args::ConfigArgs},
    texture::ShaderField,
};

use super::BsdfT;

pub struct Lambertian {
    albedo: ShaderField,
}

impl Lambertian {
    pub fn new(albedo: ShaderField) -> Self {
        Self { albedo }
    }

    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let albedo = ShaderField::load(args, "albedo")?;
        Ok(Self::new(albedo))
    }

    pub fn albedo_field(&self) -> &ShaderField {
        &self.albedo
    }
}

impl BsdfT for Lambertian {
    fn albedo(&self, uv: glam::Vec2) -> Color {
        self.albedo.at(uv)
    }
}
