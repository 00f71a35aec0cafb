#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: glam::Vec3,
    pub direction: glam::Vec3,
    pub t_min: f32,
}

impl Ray {
    pub const T_MIN_EPS: f32 = 0.0001;

    pub fn new(origin: glam::Vec3, direction: glam::Vec3) -> Self {
        Self {
            origin,
            direction,
            t_min: Self::T_MIN_EPS,
        }
    }

    pub fn point_at(&self, t: f32) -> glam::Vec3 {
        self.origin + self.direction * t
    }
}
