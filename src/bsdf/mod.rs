mod lambert;

pub use lambert::*;

use crate::core::{asset_table::Configurable, color::Color, config_args::ConfigArgs};

/// Surface response as seen by the preview shader.
#[enum_dispatch::enum_dispatch(Bsdf)]
pub trait BsdfT: Send + Sync {
    fn albedo(&self, uv: glam::Vec2) -> Color;
}

#[enum_dispatch::enum_dispatch]
pub enum Bsdf {
    Lambertian,
}

impl Configurable for Bsdf {}

pub fn load_bsdf(args: &ConfigArgs<'_>) -> anyhow::Result<Bsdf> {
    let ty = args.load_string("type")?;
    let res = match ty.as_str() {
        "lambertian" => Lambertian::load(args)?.into(),
        _ => anyhow::bail!("{} - unknown bsdf type '{}'", args.path(), ty),
    };
    Ok(res)
}
