use anyhow::Context;

use crate::core::{color::Color, config_args::ConfigArgs};

use super::{
    util::{wrap_uv, UvMapping},
    TextureT,
};

/// Bilinearly filtered RGB image with repeat wrapping.
pub struct ImageTex {
    image: image::RgbImage,
    mapping: UvMapping,
}

impl ImageTex {
    pub fn new(image: image::RgbImage, mapping: UvMapping) -> Self {
        Self { image, mapping }
    }

    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let path = args.load_path("path")?;
        let image = image::open(&path)
            .with_context(|| format!("{} - can't open '{}'", args.path(), path.display()))?
            .into_rgb8();
        log::debug!(
            "{} - image '{}' is {}x{}",
            args.path(),
            path.display(),
            image.width(),
            image.height()
        );
        let mapping = UvMapping::load(args)?;
        Ok(Self::new(image, mapping))
    }

    fn texel(&self, x: i64, y: i64) -> glam::Vec3 {
        let (width, height) = self.image.dimensions();
        let x = x.rem_euclid(width as i64) as u32;
        let y = y.rem_euclid(height as i64) as u32;
        let pixel = self.image.get_pixel(x, y);
        glam::Vec3::new(
            pixel.0[0] as f32 / 255.0,
            pixel.0[1] as f32 / 255.0,
            pixel.0[2] as f32 / 255.0,
        )
    }
}

impl TextureT for ImageTex {
    fn color_at(&self, uv: glam::Vec2) -> Color {
        let uv = self.mapping.apply(uv);
        let (u, v) = wrap_uv(uv.x, uv.y);
        let (width, height) = self.image.dimensions();
        // v grows upwards, image rows grow downwards
        let x = u * width as f32 - 0.5;
        let y = (1.0 - v) * height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), tx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), tx);
        top.lerp(bottom, ty).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_colour_image_is_constant() {
        let image = image::RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 255]));
        let tex = ImageTex::new(image, UvMapping::default());
        for uv in [glam::Vec2::ZERO, glam::Vec2::new(0.3, 0.9), glam::Vec2::new(-2.5, 7.25)] {
            assert_eq!(tex.color_at(uv), Color::new(1.0, 0.0, 1.0));
        }
    }

    #[test]
    fn texel_centers_are_exact() {
        let mut image = image::RgbImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgb([0, 0, 0]));
        image.put_pixel(1, 0, image::Rgb([255, 255, 255]));
        let tex = ImageTex::new(image, UvMapping::default());
        assert_eq!(tex.color_at(glam::Vec2::new(0.25, 0.5)), Color::BLACK);
        assert_eq!(tex.color_at(glam::Vec2::new(0.75, 0.5)), Color::WHITE);
    }
}
