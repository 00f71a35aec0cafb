use crate::core::{config_args::ConfigArgs, error::ConfigError};

/// `uv * tiling + offset`, shared by every texture type.
#[derive(Debug, Clone, Copy)]
pub struct UvMapping {
    tiling: glam::Vec2,
    offset: glam::Vec2,
}

impl Default for UvMapping {
    fn default() -> Self {
        Self {
            tiling: glam::Vec2::ONE,
            offset: glam::Vec2::ZERO,
        }
    }
}

impl UvMapping {
    pub fn new(tiling: glam::Vec2, offset: glam::Vec2) -> Self {
        Self { tiling, offset }
    }

    pub fn load(args: &ConfigArgs<'_>) -> Result<Self, ConfigError> {
        let tiling = args.load_vec2_or("tiling", glam::Vec2::ONE)?;
        let offset = args.load_vec2_or("offset", glam::Vec2::ZERO)?;
        Ok(Self::new(tiling, offset))
    }

    pub fn apply(&self, uv: glam::Vec2) -> glam::Vec2 {
        uv * self.tiling + self.offset
    }
}

pub fn wrap_uv(u: f32, v: f32) -> (f32, f32) {
    let u_new = if u >= 0.0 { u.fract() } else { 1.0 + u.fract() };
    let v_new = if v >= 0.0 { v.fract() } else { 1.0 + v.fract() };
    (u_new.min(1.0), v_new.min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_repeats_in_unit_square() {
        let (u, v) = wrap_uv(1.25, -0.25);
        assert!((u - 0.25).abs() < 1e-6);
        assert!((v - 0.75).abs() < 1e-6);
    }

    #[test]
    fn mapping_scales_then_offsets() {
        let mapping = UvMapping::new(glam::Vec2::new(2.0, 4.0), glam::Vec2::new(0.5, 0.0));
        assert_eq!(
            mapping.apply(glam::Vec2::new(0.5, 0.5)),
            glam::Vec2::new(1.5, 2.0)
        );
    }
}
