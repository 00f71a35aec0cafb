use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::core::{
    config_args::ConfigArgs,
    error::{ConfigError, TaskError},
};

/// Resolved task configuration is written here inside each task directory.
pub const TASK_CONFIG_FILE_NAME: &str = "config.json";

pub const OVERRIDE_KEY: &str = "override";
pub const TASK_DIR_KEY: &str = "task_dir";
pub const TYPE_KEY: &str = "type";

/// `(args, task_dir, task_index)`
pub type TaskFn = Box<dyn Fn(&ConfigArgs<'_>, &Path, usize) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, TaskFn>,
}

impl TaskRegistry {
    pub fn register<F>(&mut self, name: &str, task: F)
    where
        F: Fn(&ConfigArgs<'_>, &Path, usize) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if self.tasks.insert(name.to_owned(), Box::new(task)).is_some() {
            log::warn!("task '{}' is registered again, replacing the old one", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TaskFn> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.tasks.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

fn task_path(index: usize) -> String {
    format!("task[{}]", index)
}

pub fn task_table(tasks: &[Value], index: usize) -> Result<&Map<String, Value>, ConfigError> {
    tasks[index]
        .as_object()
        .ok_or_else(|| ConfigError::type_error(task_path(index), "table"))
}

/// `task_dir` if given, `task_<index>` otherwise.
pub fn resolve_task_dir(task: &Map<String, Value>, index: usize) -> Result<PathBuf, ConfigError> {
    match task.get(TASK_DIR_KEY) {
        Some(Value::String(dir)) => Ok(PathBuf::from(dir)),
        Some(_) => Err(ConfigError::type_error(
            format!("{}.{}", task_path(index), TASK_DIR_KEY),
            "string",
        )),
        None => Ok(PathBuf::from(format!("task_{}", index))),
    }
}

/// Base keys overlaid by every derived key but `override`; derived values win.
pub fn compose_override(base: &Map<String, Value>, derived: &Map<String, Value>) -> Map<String, Value> {
    let mut composed = base.clone();
    for (key, value) in derived {
        if key != OVERRIDE_KEY {
            composed.insert(key.clone(), value.clone());
        }
    }
    composed
}

/// Effective table of task `index`. Inheritance is single level: the base must come
/// earlier and must not override anything itself.
pub fn resolve_task(tasks: &[Value], index: usize) -> anyhow::Result<Map<String, Value>> {
    let task = task_table(tasks, index)?;
    let base = match task.get(OVERRIDE_KEY) {
        Some(base) => base.as_i64().ok_or_else(|| {
            ConfigError::type_error(format!("{}.{}", task_path(index), OVERRIDE_KEY), "integer")
        })?,
        None => return Ok(task.clone()),
    };

    if base < 0 || base as usize >= index {
        return Err(TaskError::ForwardOverride { task: index, base }.into());
    }
    let base = base as usize;
    let base_task = task_table(tasks, base)?;
    if base_task.contains_key(OVERRIDE_KEY) {
        return Err(TaskError::ChainedOverride { task: index, base }.into());
    }
    Ok(compose_override(base_task, task))
}

pub fn task_type(task: &Map<String, Value>, index: usize) -> Result<&str, ConfigError> {
    match task.get(TYPE_KEY) {
        Some(Value::String(ty)) => Ok(ty.as_str()),
        Some(_) => Err(ConfigError::type_error(
            format!("{}.{}", task_path(index), TYPE_KEY),
            "string",
        )),
        None => Err(ConfigError::KeyNotFound {
            path: task_path(index),
            key: TYPE_KEY.to_owned(),
        }),
    }
}

pub fn persist_task(task: &Value, path: &Path) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(task)?;
    std::fs::write(path, text + "\n").map_err(|source| TaskError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn create_dir(path: &Path) -> Result<bool, TaskError> {
    if path.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(path).map_err(|source| TaskError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
