use std::path::PathBuf;

/// Errors raised while reading the scene document.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Malformed document text.
    #[error("parsing failed: {0}")]
    Parse(String),

    /// Required structure is missing or inconsistent.
    #[error("{path} - {message}")]
    Schema { path: String, message: String },

    #[error("{path} - there is no '{key}' field")]
    KeyNotFound { path: String, key: String },

    #[error("{path} - index {index} is out of range (array size {size})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        size: usize,
    },

    #[error("{path} - should be {expected}")]
    Type { path: String, expected: String },

    #[error("there is no asset named '{0}'")]
    AssetNotFound(String),

    #[error("asset '{path}' is not a {expected}")]
    AssetType { path: String, expected: &'static str },
}

impl ConfigError {
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn type_error(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Type {
            path: path.into(),
            expected: expected.into(),
        }
    }
}

/// Conditions that stop `run_all_tasks` for good.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("failed to create directory '{}'", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write resolved config '{}'", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("task {task} - there is no task type named '{ty}'")]
    UnknownType { task: usize, ty: String },

    #[error("task {task} - 'override' should refer to an earlier task, got {base}")]
    ForwardOverride { task: usize, base: i64 },

    #[error("task {task} - overridden task {base} has an 'override' itself")]
    ChainedOverride { task: usize, base: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_document_path() {
        let err = ConfigError::KeyNotFound {
            path: "bsdf.red".to_owned(),
            key: "albedo".to_owned(),
        };
        assert_eq!(err.to_string(), "bsdf.red - there is no 'albedo' field");

        let err = ConfigError::type_error("task[0].spp", "integer");
        assert_eq!(err.to_string(), "task[0].spp - should be integer");
    }

    #[test]
    fn task_errors_keep_io_source() {
        use std::error::Error;

        let err = TaskError::CreateDirectory {
            path: PathBuf::from("out/task_0"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("out/task_0"));
        assert!(err.source().is_some());
    }
}
