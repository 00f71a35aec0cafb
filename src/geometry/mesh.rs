use std::sync::Arc;

use anyhow::Context;

use crate::{
    bsdf::Bsdf,
    core::{config_args::ConfigArgs, ray::Ray},
};

use super::{GeometryT, Hit, Placement};

/// Triangle mesh, tested triangle by triangle.
pub struct Mesh {
    positions: Vec<glam::Vec3>,
    texcoords: Vec<glam::Vec2>,
    triangles: Vec<[u32; 3]>,
    placement: Placement,
}

impl Mesh {
    pub fn new(
        positions: Vec<glam::Vec3>,
        texcoords: Vec<glam::Vec2>,
        indices: Vec<u32>,
        placement: Placement,
    ) -> anyhow::Result<Self> {
        if indices.len() % 3 != 0 {
            anyhow::bail!("index count {} is not a multiple of 3", indices.len());
        }
        if let Some(index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            anyhow::bail!(
                "index {} is out of range ({} vertices)",
                index,
                positions.len()
            );
        }
        if !texcoords.is_empty() && texcoords.len() != positions.len() {
            anyhow::bail!(
                "{} texcoords are given for {} vertices",
                texcoords.len(),
                positions.len()
            );
        }
        let triangles = indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();
        Ok(Self {
            positions,
            texcoords,
            triangles,
            placement,
        })
    }

    /// Either `path` to an OBJ file, or inline `vertices`, `indices` and optional `texcoords`.
    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let (positions, texcoords, indices) = if args.contains("path") {
            load_obj(args)?
        } else {
            load_inline(args)?
        };
        let placement = Placement::load(args)?;
        Self::new(positions, texcoords, indices, placement).with_context(|| args.path().to_owned())
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn intersect_triangle(&self, ray: &Ray, tri: &[u32; 3]) -> Option<(f32, f32, f32)> {
        let p0 = self.positions[tri[0] as usize];
        let p1 = self.positions[tri[1] as usize];
        let p2 = self.positions[tri[2] as usize];
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let q = ray.direction.cross(e2);
        let det = e1.dot(q);
        if det.abs() < f32::EPSILON {
            return None;
        }
        let det_inv = 1.0 / det;
        let s = ray.origin - p0;
        let u = s.dot(q) * det_inv;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let r = s.cross(e1);
        let v = ray.direction.dot(r) * det_inv;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(r) * det_inv;
        Some((t, u, v))
    }
}

impl GeometryT for Mesh {
    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<Hit> {
        let local = self.placement.ray_to_local(ray);
        let mut closest: Option<(f32, f32, f32, &[u32; 3])> = None;
        let mut t_far = t_max;
        for tri in &self.triangles {
            if let Some((t, u, v)) = self.intersect_triangle(&local, tri) {
                if t > local.t_min && t < t_far {
                    t_far = t;
                    closest = Some((t, u, v, tri));
                }
            }
        }

        let (t, u, v, tri) = closest?;
        let p0 = self.positions[tri[0] as usize];
        let p1 = self.positions[tri[1] as usize];
        let p2 = self.positions[tri[2] as usize];
        let normal = (p1 - p0).cross(p2 - p0).normalize();
        let uv = if self.texcoords.is_empty() {
            glam::Vec2::new(u, v)
        } else {
            self.texcoords[tri[0] as usize] * (1.0 - u - v)
                + self.texcoords[tri[1] as usize] * u
                + self.texcoords[tri[2] as usize] * v
        };
        Some(self.placement.hit_to_world(ray, t, normal, uv))
    }

    fn material(&self) -> Option<&Arc<Bsdf>> {
        self.placement.material()
    }
}

type MeshBuffers = (Vec<glam::Vec3>, Vec<glam::Vec2>, Vec<u32>);

fn load_inline(args: &ConfigArgs<'_>) -> anyhow::Result<MeshBuffers> {
    let vertices = args.child("vertices")?;
    let positions = (0..vertices.array_size()?)
        .map(|i| vertices.load_vec3(i))
        .collect::<Result<Vec<_>, _>>()?;

    let texcoords = if args.contains("texcoords") {
        let texcoords = args.child("texcoords")?;
        (0..texcoords.array_size()?)
            .map(|i| texcoords.load_vec2(i))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![]
    };

    let indices = args.child("indices")?;
    let indices = (0..indices.array_size()?)
        .map(|i| {
            let index = indices.load_integer(i)?;
            if index < 0 {
                anyhow::bail!("{}[{}] - index should not be negative", indices.path(), i);
            }
            Ok(index as u32)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok((positions, texcoords, indices))
}

fn load_obj(args: &ConfigArgs<'_>) -> anyhow::Result<MeshBuffers> {
    let obj_file = args.load_path("path")?;

    let mut load_options = tobj::LoadOptions::default();
    load_options.triangulate = true;
    load_options.single_index = true;
    let (models, _) = tobj::load_obj(&obj_file, &load_options)
        .with_context(|| format!("{} - can't load '{}'", args.path(), obj_file.display()))?;

    let mut positions = vec![];
    let mut texcoords = vec![];
    let mut indices = vec![];
    for model in models {
        let base = positions.len() as u32;
        let vertex_count = model.mesh.positions.len() / 3;
        let has_texcoords = model.mesh.texcoords.len() >= 2 * vertex_count;
        for i in 0..vertex_count {
            positions.push(glam::Vec3::new(
                model.mesh.positions[3 * i],
                model.mesh.positions[3 * i + 1],
                model.mesh.positions[3 * i + 2],
            ));
            texcoords.push(if has_texcoords {
                glam::Vec2::new(model.mesh.texcoords[2 * i], model.mesh.texcoords[2 * i + 1])
            } else {
                glam::Vec2::ZERO
            });
        }
        indices.extend(model.mesh.indices.iter().map(|ind| ind + base));
    }
    log::debug!(
        "{} - {} vertices, {} triangles from '{}'",
        args.path(),
        positions.len(),
        indices.len() / 3,
        obj_file.display()
    );

    Ok((positions, texcoords, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                glam::Vec3::new(-1.0, -1.0, -2.0),
                glam::Vec3::new(1.0, -1.0, -2.0),
                glam::Vec3::new(1.0, 1.0, -2.0),
                glam::Vec3::new(-1.0, 1.0, -2.0),
            ],
            vec![
                glam::Vec2::new(0.0, 0.0),
                glam::Vec2::new(1.0, 0.0),
                glam::Vec2::new(1.0, 1.0),
                glam::Vec2::new(0.0, 1.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
            Placement::default(),
        )
        .unwrap()
    }

    #[test]
    fn quad_is_hit_in_its_interior() {
        let mesh = quad();
        assert_eq!(mesh.triangle_count(), 2);
        let ray = Ray::new(glam::Vec3::new(0.5, 0.25, 0.0), -glam::Vec3::Z);
        let hit = mesh.intersect(&ray, f32::MAX).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(hit.normal.abs_diff_eq(glam::Vec3::Z, 1e-5));
        assert!(hit.uv.abs_diff_eq(glam::Vec2::new(0.75, 0.625), 1e-5));

        let outside = Ray::new(glam::Vec3::new(1.5, 0.0, 0.0), -glam::Vec3::Z);
        assert!(mesh.intersect(&outside, f32::MAX).is_none());
        assert!(mesh.intersect(&ray, 1.0).is_none());
    }

    #[test]
    fn malformed_buffers_are_rejected() {
        let positions = vec![glam::Vec3::ZERO; 3];
        assert!(Mesh::new(positions.clone(), vec![], vec![0, 1], Placement::default()).is_err());
        assert!(Mesh::new(positions.clone(), vec![], vec![0, 1, 3], Placement::default()).is_err());
        assert!(Mesh::new(positions, vec![glam::Vec2::ZERO], vec![0, 1, 2], Placement::default())
            .is_err());
    }
}
