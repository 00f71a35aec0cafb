use std::sync::Arc;

use crate::core::{
    color::Color,
    config_args::{ConfigArgs, NodeKind},
};

use super::{Texture, TextureT};

/// A colour input of a shader: either a literal (possibly animated) or a texture asset.
#[derive(Clone)]
pub enum ShaderField {
    Constant(Color),
    Texture(Arc<Texture>),
}

impl ShaderField {
    /// A string value names a texture asset, anything else is read as a colour.
    pub fn load(args: &ConfigArgs<'_>, key: &str) -> anyhow::Result<Self> {
        if args.kind_of(key)? == NodeKind::String {
            Ok(Self::Texture(args.load_asset::<Texture, _>(key)?))
        } else {
            Ok(Self::Constant(args.load_vec3(key)?.into()))
        }
    }

    pub fn at(&self, uv: glam::Vec2) -> Color {
        match self {
            Self::Constant(color) => *color,
            Self::Texture(tex) => tex.color_at(uv),
        }
    }
}
