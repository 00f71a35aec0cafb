mod perspective;

pub use perspective::*;

use std::sync::Arc;

use crate::core::{
    asset_table::Configurable,
    config_args::{ConfigArgs, NodeKind},
    ray::Ray,
};

#[enum_dispatch::enum_dispatch(Camera)]
pub trait CameraT: Send + Sync {
    /// `point` is on the film plane, `y` in `[-0.5, 0.5]` and `x` scaled by the aspect ratio.
    fn generate_ray(&self, point: (f32, f32)) -> Ray;
}

#[enum_dispatch::enum_dispatch]
pub enum Camera {
    PerspectiveCamera,
}

impl Configurable for Camera {}

pub fn load_camera(args: &ConfigArgs<'_>) -> anyhow::Result<Camera> {
    let ty = args.load_string_or("type", "perspective")?;
    let res = match ty.as_str() {
        "perspective" => PerspectiveCamera::load(args)?.into(),
        _ => anyhow::bail!("{} - unknown camera type '{}'", args.path(), ty),
    };
    Ok(res)
}

/// `key` is either a camera asset path or an inline camera table, sampled at the
/// current time of `args`.
pub fn camera_from_field(args: &ConfigArgs<'_>, key: &str) -> anyhow::Result<Arc<Camera>> {
    if args.kind_of(key)? == NodeKind::String {
        return Ok(args.load_asset::<Camera, _>(key)?);
    }
    let inline = args.child(key)?;
    let camera = load_camera(&inline)?;
    inline.check_unused_keys();
    Ok(Arc::new(camera))
}
