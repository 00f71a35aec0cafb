#[derive(Debug, Clone, Copy)]
pub struct Transform {
    trans: glam::Affine3A,
    trans_it: glam::Mat3A,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        trans: glam::Affine3A::IDENTITY,
        trans_it: glam::Mat3A::IDENTITY,
    };

    pub fn new(trans: glam::Affine3A) -> Self {
        let trans_inv = trans.inverse();
        let trans_it = trans_inv.matrix3.transpose();
        Self { trans, trans_it }
    }

    /// Scale first, then rotate by intrinsic X, Y, Z angles (radians), then translate.
    pub fn from_scale_euler_translation(
        scale: glam::Vec3,
        roll: f32,
        pitch: f32,
        yaw: f32,
        translation: glam::Vec3,
    ) -> Self {
        let rotation = glam::Quat::from_rotation_x(roll)
            * glam::Quat::from_rotation_y(pitch)
            * glam::Quat::from_rotation_z(yaw);
        Self::new(glam::Affine3A::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }

    pub fn transform_point3(&self, other: glam::Vec3) -> glam::Vec3 {
        self.trans.transform_point3(other)
    }

    pub fn transform_vector3(&self, other: glam::Vec3) -> glam::Vec3 {
        self.trans.transform_vector3(other)
    }

    pub fn transform_normal3(&self, other: glam::Vec3) -> glam::Vec3 {
        glam::Vec3::from(self.trans_it * glam::Vec3A::from(other)).normalize()
    }

    pub fn inverse(&self) -> Transform {
        Self::new(self.trans.inverse())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
