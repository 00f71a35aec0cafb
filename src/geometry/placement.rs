use std::sync::Arc;

use crate::{
    bsdf::Bsdf,
    core::{config_args::ConfigArgs, ray::Ray, transform::Transform},
};

use super::Hit;

/// Object-to-world transform and material shared by every geometry type.
pub struct Placement {
    to_world: Transform,
    to_local: Transform,
    material: Option<Arc<Bsdf>>,
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(Transform::IDENTITY, None)
    }
}

impl Placement {
    pub fn new(to_world: Transform, material: Option<Arc<Bsdf>>) -> Self {
        Self {
            to_world,
            to_local: to_world.inverse(),
            material,
        }
    }

    /// Reads the optional `transform` table and `material` asset path.
    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let to_world = args.load_transform_or_identity("transform")?;
        let material = if args.contains("material") {
            Some(args.load_asset::<Bsdf, _>("material")?)
        } else {
            None
        };
        Ok(Self::new(to_world, material))
    }

    pub fn material(&self) -> Option<&Arc<Bsdf>> {
        self.material.as_ref()
    }

    /// The ray parameter is preserved, so local `t` is world `t`.
    pub fn ray_to_local(&self, ray: &Ray) -> Ray {
        Ray {
            origin: self.to_local.transform_point3(ray.origin),
            direction: self.to_local.transform_vector3(ray.direction),
            t_min: ray.t_min,
        }
    }

    pub fn hit_to_world(&self, ray: &Ray, t: f32, local_normal: glam::Vec3, uv: glam::Vec2) -> Hit {
        let mut normal = self.to_world.transform_normal3(local_normal);
        if normal.dot(ray.direction) > 0.0 {
            normal = -normal;
        }
        Hit {
            t,
            position: ray.point_at(t),
            normal,
            uv,
        }
    }
}
