mod mesh;
mod placement;
mod sphere;

pub use mesh::*;
pub use placement::*;
pub use sphere::*;

use std::sync::Arc;

use crate::{
    bsdf::Bsdf,
    core::{asset_table::Configurable, config_args::ConfigArgs, ray::Ray},
};

/// World-space hit record.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub t: f32,
    pub position: glam::Vec3,
    /// Unit length, facing against the incoming ray.
    pub normal: glam::Vec3,
    pub uv: glam::Vec2,
}

#[enum_dispatch::enum_dispatch(Geometry)]
pub trait GeometryT: Send + Sync {
    /// Closest hit in `(ray.t_min, t_max)`.
    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<Hit>;

    fn material(&self) -> Option<&Arc<Bsdf>>;
}

#[enum_dispatch::enum_dispatch]
pub enum Geometry {
    Sphere,
    Mesh,
}

impl Configurable for Geometry {}

pub fn load_geometry(args: &ConfigArgs<'_>) -> anyhow::Result<Geometry> {
    let ty = args.load_string("type")?;
    let res = match ty.as_str() {
        "sphere" => Sphere::load(args)?.into(),
        "mesh" => Mesh::load(args)?.into(),
        _ => anyhow::bail!("{} - unknown geometry type '{}'", args.path(), ty),
    };
    Ok(res)
}
