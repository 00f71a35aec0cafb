use std::path::PathBuf;

use structopt::StructOpt;

use simple_task_tracer::core::config_service::ConfigService;

#[derive(StructOpt, Debug)]
#[structopt(name = "simple-task-tracer", about = "Loads a scene document and runs its tasks")]
struct Opt {
    /// Scene document (JSON)
    #[structopt(parse(from_os_str))]
    scene: PathBuf,

    /// Overrides `output_dir` of the scene document
    #[structopt(short, long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `simple_task_tracer=trace`
    #[structopt(long)]
    log_level: Option<String>,

    /// Load assets and stop before running any task
    #[structopt(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = &opt.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    let mut service = ConfigService::new();
    simple_task_tracer::register_builtin(&mut service);

    log::info!("Loading scene [{}]", opt.scene.display());
    service.try_parse_file(&opt.scene)?;
    service.set_output_directory(opt.output_dir);

    let begin_time = std::time::Instant::now();
    service.load_assets()?;
    if opt.dry_run {
        log::info!("Dry run, {} assets loaded, no task is run", service.asset_table().len());
        return Ok(());
    }

    service.run_all_tasks()?;
    log::info!("Finished, time used: {:?}", begin_time.elapsed());
    Ok(())
}
