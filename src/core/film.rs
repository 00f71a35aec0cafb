use image::{Rgb, RgbImage};

use crate::core::color::Color;

/// Accumulates per-pixel sample sums; resolved by averaging.
pub struct Film {
    width: u32,
    height: u32,
    sums: Vec<Color>,
    counts: Vec<u32>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            sums: vec![Color::BLACK; size],
            counts: vec![0; size],
        }
    }

    fn add_sample(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index_of(x, y);
        self.sums[index] += color;
        self.counts[index] += 1;
    }

    /// Adds `colors.len() / spp` pixels of row `y`, `spp` consecutive samples each.
    pub fn add_row(&mut self, y: u32, spp: u32, colors: &[Color]) {
        for (x, samples) in colors.chunks(spp as usize).enumerate() {
            for color in samples {
                self.add_sample(x as u32, y, *color);
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let index = self.index_of(x, y);
        match self.counts[index] {
            0 => Color::BLACK,
            count => self.sums[index] / count as f32,
        }
    }

    pub fn to_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                image.put_pixel(x, y, color_to_rgb(self.pixel(x, y)));
            }
        }
        image
    }

    fn index_of(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn color_to_rgb(color: Color) -> Rgb<u8> {
    Rgb(color.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_averaged() {
        let mut film = Film::new(2, 1);
        film.add_row(0, 2, &[Color::WHITE, Color::BLACK, Color::gray(0.2), Color::gray(0.4)]);
        assert_eq!(film.pixel(0, 0), Color::gray(0.5));
        assert!((film.pixel(1, 0).r - 0.3).abs() < 1e-6);

        let image = film.to_image();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn empty_pixels_are_black() {
        let film = Film::new(1, 1);
        assert_eq!(film.pixel(0, 0), Color::BLACK);
    }
}
