use std::sync::Arc;

use crate::{
    bsdf::BsdfT,
    camera::{camera_from_field, Camera, PerspectiveCamera},
    core::{color::Color, config_args::ConfigArgs, ray::Ray},
    geometry::{Geometry, GeometryT, Hit},
};

/// Colour of surfaces without a material.
const DEFAULT_ALBEDO: f32 = 0.8;
const DEFAULT_FOV_DEG: f32 = 60.0;

fn default_camera() -> Camera {
    PerspectiveCamera::new(
        glam::Vec3::ZERO,
        -glam::Vec3::Z,
        glam::Vec3::Y,
        DEFAULT_FOV_DEG.to_radians(),
    )
    .into()
}

/// What one frame of a render task sees, sampled at the task view's current time.
pub struct Scene {
    camera: Arc<Camera>,
    geometries: Vec<Arc<Geometry>>,
    background: Color,
}

impl Scene {
    pub fn new(camera: Arc<Camera>, geometries: Vec<Arc<Geometry>>, background: Color) -> Self {
        Self {
            camera,
            geometries,
            background,
        }
    }

    /// `camera` falls back to the first loaded `camera.*` asset, then to a camera at the
    /// origin looking down -Z. `geometry` lists asset paths and defaults to every loaded
    /// `geometry.*` asset.
    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let table = args.asset_table();
        let camera = if args.contains("camera") {
            camera_from_field(args, "camera")?
        } else if let Some(path) = table.paths_with_prefix("camera").first() {
            log::info!("{} - no 'camera', using '{}'", args.path(), path);
            table.require::<Camera>(path)?
        } else {
            log::info!("{} - no 'camera', using the default camera", args.path());
            Arc::new(default_camera())
        };

        let geometries = if args.contains("geometry") {
            let list = args.child("geometry")?;
            (0..list.array_size()?)
                .map(|i| list.load_asset::<Geometry, _>(i))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            table
                .paths_with_prefix("geometry")
                .iter()
                .map(|path| table.require::<Geometry>(path))
                .collect::<Result<Vec<_>, _>>()?
        };
        if geometries.is_empty() {
            log::warn!("{} - scene has no geometry", args.path());
        }

        let background = args.load_vec3_or("background", glam::Vec3::ZERO)?;
        Ok(Self::new(camera, geometries, background.into()))
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn intersect(&self, ray: &Ray) -> Option<(Hit, &Geometry)> {
        let mut closest = None;
        let mut t_max = f32::MAX;
        for geometry in &self.geometries {
            if let Some(hit) = geometry.intersect(ray, t_max) {
                t_max = hit.t;
                closest = Some((hit, geometry.as_ref()));
            }
        }
        closest
    }

    /// Albedo times the cosine between the normal and the view direction.
    pub fn shade(&self, ray: &Ray) -> Color {
        let (hit, geometry) = match self.intersect(ray) {
            Some(found) => found,
            None => return self.background,
        };
        let cos = hit.normal.dot(-ray.direction).max(0.0);
        let albedo = match geometry.material() {
            Some(bsdf) => bsdf.albedo(hit.uv),
            None => Color::gray(DEFAULT_ALBEDO),
        };
        albedo * cos
    }
}
