use std::sync::Arc;

use crate::{
    bsdf::Bsdf,
    core::{config_args::ConfigArgs, ray::Ray},
};

use super::{GeometryT, Hit, Placement};

pub struct Sphere {
    center: glam::Vec3,
    radius: f32,
    placement: Placement,
}

impl Sphere {
    pub fn new(center: glam::Vec3, radius: f32, placement: Placement) -> Self {
        Self {
            center,
            radius,
            placement,
        }
    }

    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let center = args.load_vec3_or("center", glam::Vec3::ZERO)?;
        let radius = args.load_float("radius")?;
        if radius <= 0.0 {
            anyhow::bail!("{} - 'radius' should be positive", args.path());
        }
        let placement = Placement::load(args)?;
        Ok(Sphere::new(center, radius, placement))
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let b = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;
        let delta = b * b - a * c;
        if delta >= 0.0 {
            let delta = delta.sqrt();
            let min = (-b - delta) / a;
            let max = (-b + delta) / a;
            Some((min, max))
        } else {
            None
        }
    }
}

impl GeometryT for Sphere {
    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<Hit> {
        let local = self.placement.ray_to_local(ray);
        let (min, max) = self.intersect_ray(&local)?;
        let t = if min > local.t_min { min } else { max };
        if t <= local.t_min || t >= t_max {
            return None;
        }
        let norm = (local.point_at(t) - self.center) / self.radius;
        Some(
            self.placement
                .hit_to_world(ray, t, norm, sphere_normal_to_texcoords(norm)),
        )
    }

    fn material(&self) -> Option<&Arc<Bsdf>> {
        self.placement.material()
    }
}

fn sphere_normal_to_texcoords(p: glam::Vec3) -> glam::Vec2 {
    let theta = p.y.clamp(-1.0, 1.0).acos();
    let phi = p.x.atan2(p.z) + std::f32::consts::PI;
    glam::Vec2::new(
        phi * 0.5 * std::f32::consts::FRAC_1_PI,
        theta * std::f32::consts::FRAC_1_PI,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::Transform;

    #[test]
    fn closest_hit_from_outside_and_inside() {
        let sphere = Sphere::new(glam::Vec3::new(0.0, 0.0, -5.0), 1.0, Placement::default());
        let ray = Ray::new(glam::Vec3::ZERO, -glam::Vec3::Z);
        let hit = sphere.intersect(&ray, f32::MAX).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!(hit.normal.abs_diff_eq(glam::Vec3::Z, 1e-5));

        let inside = Ray::new(glam::Vec3::new(0.0, 0.0, -5.0), glam::Vec3::X);
        let hit = sphere.intersect(&inside, f32::MAX).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!(hit.normal.abs_diff_eq(-glam::Vec3::X, 1e-5));

        assert!(sphere.intersect(&ray, 3.0).is_none());
        let miss = Ray::new(glam::Vec3::ZERO, glam::Vec3::Y);
        assert!(sphere.intersect(&miss, f32::MAX).is_none());
    }

    #[test]
    fn placement_moves_the_sphere() {
        let to_world = Transform::from_scale_euler_translation(
            glam::Vec3::splat(2.0),
            0.0,
            0.0,
            0.0,
            glam::Vec3::new(0.0, 0.0, -10.0),
        );
        let sphere = Sphere::new(glam::Vec3::ZERO, 1.0, Placement::new(to_world, None));
        let ray = Ray::new(glam::Vec3::ZERO, -glam::Vec3::Z);
        let hit = sphere.intersect(&ray, f32::MAX).unwrap();
        assert!((hit.t - 8.0).abs() < 1e-4);
        assert!(hit.position.abs_diff_eq(glam::Vec3::new(0.0, 0.0, -8.0), 1e-4));
        assert!(sphere.material().is_none());
    }
}
