use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::Context;
use serde_json::Value;

use crate::core::{
    asset_table::{AssetTable, Configurable},
    config_args::ConfigArgs,
    error::{ConfigError, TaskError},
    keyframe::KeyframeCache,
    task::{self, TaskRegistry, TASK_CONFIG_FILE_NAME},
};

/// Owns the scene document and everything derived from it: the asset table, the
/// keyframe cache and the registered tasks. Every [`ConfigArgs`] borrows from it.
pub struct ConfigService {
    document: Value,
    base_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    asset_table: AssetTable,
    keyframes: KeyframeCache,
    tasks: TaskRegistry,
    // resolved task tables stay alive so their node addresses are never reused as cache keys
    resolved_tasks: Mutex<Vec<Arc<Value>>>,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            document: Value::Object(Default::default()),
            base_dir: None,
            output_dir: None,
            asset_table: AssetTable::default(),
            keyframes: KeyframeCache::default(),
            tasks: TaskRegistry::default(),
            resolved_tasks: Mutex::new(vec![]),
        }
    }

    pub fn try_parse(&mut self, text: &str) -> Result<(), ConfigError> {
        let document: Value =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        if !document.is_object() {
            return Err(ConfigError::Parse(
                "top level of the document should be a table".to_owned(),
            ));
        }
        self.document = document;
        self.keyframes.clear();
        Ok(())
    }

    /// Logs malformed input and keeps the previous document.
    pub fn parse(&mut self, text: &str) {
        if let Err(err) = self.try_parse(text) {
            log::error!("{}", err);
        }
    }

    pub fn try_parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            ConfigError::Parse(format!("can't read '{}': {}", path.display(), err))
        })?;
        self.try_parse(&text).map_err(|err| match err {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {}", path.display(), msg)),
            err => err,
        })?;
        self.base_dir = path.parent().map(Path::to_path_buf);
        Ok(())
    }

    /// Logs malformed input and keeps the previous document.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) {
        if let Err(err) = self.try_parse_file(path) {
            log::error!("{}", err);
        }
    }

    pub fn register_asset<T, F>(&mut self, prefix: &str, parser: F)
    where
        T: Configurable,
        F: Fn(&ConfigArgs<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.asset_table.register_parser(
            prefix,
            Box::new(move |args: &ConfigArgs<'_>| {
                Ok(Arc::new(parser(args)?) as Arc<dyn Configurable>)
            }),
        );
    }

    pub fn register_task<F>(&mut self, name: &str, task: F)
    where
        F: Fn(&ConfigArgs<'_>, &Path, usize) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tasks.register(name, task);
    }

    pub fn task_registry(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn load_assets(&self) -> anyhow::Result<()> {
        self.asset_table.load(self, &self.document)?;
        log::info!("{} assets loaded", self.asset_table.len());
        Ok(())
    }

    pub fn asset_table(&self) -> &AssetTable {
        &self.asset_table
    }

    pub fn keyframe_cache(&self) -> &KeyframeCache {
        &self.keyframes
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// View over the whole document.
    pub fn root_args(&self) -> ConfigArgs<'_> {
        ConfigArgs::new(self, &self.document, String::new())
    }

    /// Takes precedence over the document's `output_dir`.
    pub fn set_output_directory(&mut self, dir: Option<PathBuf>) {
        self.output_dir = dir;
    }

    pub fn output_directory(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        match self.document.get("output_dir") {
            Some(Value::String(dir)) => Ok(PathBuf::from(dir)),
            Some(_) => Err(ConfigError::type_error("output_dir", "string")),
            None => Ok(PathBuf::from(
                chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string(),
            )),
        }
    }

    /// Runs every entry of `task` in document order. The first failure stops the run.
    pub fn run_all_tasks(&self) -> anyhow::Result<()> {
        let output_dir = self.output_directory()?;
        if task::create_dir(&output_dir)? {
            log::info!("Created output directory [{}]", output_dir.display());
        }

        let tasks = match self.document.get("task") {
            Some(tasks) => tasks
                .as_array()
                .ok_or_else(|| ConfigError::type_error("task", "array of tables"))?,
            None => {
                log::info!("No task to run");
                return Ok(());
            }
        };

        for index in 0..tasks.len() {
            let task_dir = output_dir.join(task::resolve_task_dir(
                task::task_table(tasks, index)?,
                index,
            )?);
            task::create_dir(&task_dir)?;

            let resolved = Arc::new(Value::Object(task::resolve_task(tasks, index)?));
            self.resolved_tasks.lock().unwrap().push(resolved.clone());

            task::persist_task(&resolved, &task_dir.join(TASK_CONFIG_FILE_NAME))?;

            let table = resolved
                .as_object()
                .ok_or_else(|| ConfigError::type_error(format!("task[{}]", index), "table"))?;
            let ty = task::task_type(table, index)?;
            let run = self.tasks.get(ty).ok_or_else(|| TaskError::UnknownType {
                task: index,
                ty: ty.to_owned(),
            })?;

            log::info!("Next task: {} ('{}')", index, ty);
            log::debug!("{}", serde_json::to_string_pretty(&*resolved)?);

            let args = ConfigArgs::new(self, &resolved, format!("task[{}]", index));
            args.mark_used(task::TYPE_KEY);
            args.mark_used(task::TASK_DIR_KEY);
            run(&args, &task_dir, index)
                .with_context(|| format!("task {} ('{}') failed", index, ty))?;
            args.check_unused_keys();

            log::info!("Saving output to [{}]", task_dir.display());
        }
        Ok(())
    }
}
