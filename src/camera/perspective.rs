use crate::core::{config_args::ConfigArgs, ray::Ray};

use super::CameraT;

pub struct PerspectiveCamera {
    eye: glam::Vec3,
    forward: glam::Vec3,
    up: glam::Vec3,
    right: glam::Vec3,
    half_cot_half_fov: f32,
}

impl PerspectiveCamera {
    /// `fov` is the vertical field of view in radians.
    pub fn new(eye: glam::Vec3, forward: glam::Vec3, up: glam::Vec3, fov: f32) -> Self {
        let forward = forward.normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        Self {
            eye,
            forward,
            up,
            right,
            half_cot_half_fov: 0.5 / (fov * 0.5).tan(),
        }
    }

    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let eye = args.load_vec3("eye")?;
        let forward = args.load_normalized_vec3("forward")?;
        let up = if args.contains("up") {
            args.load_normalized_vec3("up")?
        } else {
            glam::Vec3::Y
        };
        let fov_deg = args.load_float("fov")?;
        if fov_deg <= 0.0 || fov_deg >= 180.0 {
            anyhow::bail!("{} - 'fov' should be in (0, 180), got {}", args.path(), fov_deg);
        }
        if forward.cross(up).length_squared() == 0.0 {
            anyhow::bail!("{} - 'forward' and 'up' should not be parallel", args.path());
        }

        Ok(Self::new(eye, forward, up, fov_deg.to_radians()))
    }
}

impl CameraT for PerspectiveCamera {
    fn generate_ray(&self, point: (f32, f32)) -> Ray {
        let origin = self.eye;
        let direction =
            (self.forward * self.half_cot_half_fov + self.right * point.0 + self.up * point.1)
                .normalize();
        Ray::new(origin, direction)
    }
}
