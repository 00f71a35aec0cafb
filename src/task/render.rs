use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use rand::{Rng, SeedableRng};

use crate::{
    camera::CameraT,
    core::{config_args::ConfigArgs, film::Film},
};

use super::scene::Scene;

/// Image-level settings shared by `render` and `render_sequence`.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub spp: u32,
    pub seed: u64,
}

impl RenderSettings {
    pub fn load(args: &ConfigArgs<'_>) -> anyhow::Result<Self> {
        let resolution = args.child("resolution")?;
        if resolution.array_size()? != 2 {
            anyhow::bail!("{} - should be [width, height]", resolution.path());
        }
        let width = resolution.load_integer(0)?;
        let height = resolution.load_integer(1)?;
        if width <= 0 || height <= 0 {
            anyhow::bail!("{} - should be positive", resolution.path());
        }
        let spp = args.load_integer_or("spp", 1)?;
        if spp <= 0 {
            anyhow::bail!("{} - 'spp' should be positive", args.path());
        }
        let seed = args.load_integer_or("seed", 0)?;
        let (width, height, spp) = (width as u32, height as u32, spp as u32);
        if width.checked_mul(height).is_none() {
            anyhow::bail!(
                "{} - {}x{} pixels is too many",
                resolution.path(),
                width,
                height
            );
        }
        if width.checked_mul(spp).is_none() {
            anyhow::bail!(
                "{} - {} spp over {} columns is too many samples per row",
                args.path(),
                spp,
                width
            );
        }
        Ok(Self {
            width,
            height,
            spp,
            seed: seed as u64,
        })
    }
}

#[derive(Copy, Clone)]
struct ImageRange {
    from: u32,
    to: u32,
}

fn split_rows(height: u32, parts: u32) -> Vec<ImageRange> {
    let parts = parts.clamp(1, height.max(1));
    let height_per_part = height / parts;
    (0..parts)
        .map(|t| ImageRange {
            from: t * height_per_part,
            to: if t + 1 == parts {
                height
            } else {
                (t + 1) * height_per_part
            },
        })
        .collect()
}

/// Renders on `num_cpus` worker threads, each owning a contiguous band of rows.
pub fn render_image(scene: &Scene, settings: &RenderSettings) -> anyhow::Result<image::RgbImage> {
    let RenderSettings {
        width,
        height,
        spp,
        seed,
    } = *settings;
    let film = Arc::new(Mutex::new(Film::new(width, height)));
    let aspect = width as f32 / height as f32;

    let progress_bar = indicatif::ProgressBar::new(height as u64);
    progress_bar.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (eta: {eta})")
            .progress_chars("#>-"),
    );

    let ranges = split_rows(height, num_cpus::get() as u32);
    crossbeam::scope(|scope| {
        for (t, &ImageRange { from, to }) in ranges.iter().enumerate() {
            let film = film.clone();
            let progress_bar = progress_bar.clone();
            let width_inv = 1.0 / width as f32;
            let height_inv = 1.0 / height as f32;

            scope.spawn(move |_| {
                let mut rng = rand::rngs::SmallRng::seed_from_u64(seed.wrapping_add(t as u64));
                let mut row = Vec::with_capacity(width as usize * spp as usize);
                for j in from..to {
                    row.clear();
                    for i in 0..width {
                        for _ in 0..spp {
                            let (offset_x, offset_y) = if spp == 1 {
                                (0.5, 0.5)
                            } else {
                                (rng.gen::<f32>(), rng.gen::<f32>())
                            };
                            let x = ((i as f32 + offset_x) * width_inv - 0.5) * aspect;
                            let y = ((height - j - 1) as f32 + offset_y) * height_inv - 0.5;
                            let ray = scene.camera().generate_ray((x, y));
                            row.push(scene.shade(&ray));
                        }
                    }
                    film.lock().unwrap().add_row(j, spp, &row);
                    progress_bar.inc(1);
                }
            });
        }
    })
    .map_err(|_| anyhow::anyhow!("a render worker panicked"))?;
    progress_bar.finish_and_clear();

    let film = film.lock().unwrap();
    Ok(film.to_image())
}

pub fn save_image(image: &image::RgbImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("failed to save image '{}'", path.display()))?;
    log::info!("Image saved to [{}]", path.display());
    Ok(())
}

/// `render` task: one image, optionally at a given `time`.
pub fn render_task(args: &ConfigArgs<'_>, task_dir: &Path, _index: usize) -> anyhow::Result<()> {
    let time = args.load_float_or("time", args.time())?;
    args.update_time(time);

    let settings = RenderSettings::load(args)?;
    let scene = Scene::load(args)?;
    let output = args.load_string_or("output", "image.png")?;
    log::info!(
        "Rendering {}x{} with {} spp, {} geometries, time {}",
        settings.width,
        settings.height,
        settings.spp,
        scene.geometry_count(),
        time
    );

    let begin_time = std::time::Instant::now();
    let image = render_image(&scene, &settings)?;
    log::info!("Rendered in {:?}", begin_time.elapsed());
    save_image(&image, &task_dir.join(output))
}
