use std::path::Path;

use crate::core::config_args::ConfigArgs;

use super::{
    render::{render_image, save_image, RenderSettings},
    scene::Scene,
};

/// Evenly spaced sample times, both ends included.
pub fn frame_times(frames: u32, time_start: f32, time_end: f32) -> Vec<f32> {
    match frames {
        0 => vec![],
        1 => vec![time_start],
        _ => (0..frames)
            .map(|f| time_start + (time_end - time_start) * f as f32 / (frames - 1) as f32)
            .collect(),
    }
}

/// `render_sequence` task: the scene is reloaded at every frame time so animated
/// task fields such as an inline camera are resampled.
pub fn render_sequence_task(
    args: &ConfigArgs<'_>,
    task_dir: &Path,
    _index: usize,
) -> anyhow::Result<()> {
    let frames = args.load_integer("frames")?;
    if frames <= 0 {
        anyhow::bail!("{} - 'frames' should be positive", args.path());
    }
    let time_start = args.load_float_or("time_start", 0.0)?;
    let time_end = args.load_float_or("time_end", time_start)?;
    let prefix = args.load_string_or("prefix", "frame")?;
    let settings = RenderSettings::load(args)?;

    let times = frame_times(frames as u32, time_start, time_end);
    for (frame, &time) in times.iter().enumerate() {
        args.update_time(time);
        let scene = Scene::load(args)?;
        log::info!("Frame {}/{} at time {}", frame + 1, times.len(), time);

        let image = render_image(&scene, &settings)?;
        save_image(&image, &task_dir.join(format!("{}_{:04}.png", prefix, frame)))?;
    }
    Ok(())
}
