mod checker;
mod constant;
mod field;
mod image_tex;
mod util;

pub use checker::*;
pub use constant::*;
pub use field::*;
pub use image_tex::*;
pub use util::UvMapping;

use crate::core::{asset_table::Configurable, color::Color, config_args::ConfigArgs};

#[enum_dispatch::enum_dispatch(Texture)]
pub trait TextureT: Send + Sync {
    fn color_at(&self, uv: glam::Vec2) -> Color;
}

#[enum_dispatch::enum_dispatch]
pub enum Texture {
    ConstantTex,
    CheckerTex,
    ImageTex,
}

impl Configurable for Texture {}

pub fn load_texture(args: &ConfigArgs<'_>) -> anyhow::Result<Texture> {
    let ty = args.load_string("type")?;
    let res = match ty.as_str() {
        "constant" => ConstantTex::load(args)?.into(),
        "checker" => CheckerTex::load(args)?.into(),
        "image" => ImageTex::load(args)?.into(),
        _ => anyhow::bail!("{} - unknown texture type '{}'", args.path(), ty),
    };
    Ok(res)
}
