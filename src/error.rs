use thiserror::Error;

/// Errors raised while building task configurations or evaluating reward terms.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("unknown task id `{0}`")]
    UnknownTask(String),

    #[error("scene has no {kind} named `{name}`")]
    MissingEntity { kind: &'static str, name: String },

    #[error("no command named `{0}`")]
    MissingCommand(String),

    #[error("reward term parameter `{name}` is missing or not a {expected}")]
    BadParam { name: String, expected: &'static str },

    #[error("pattern `{pattern}` matched nothing in {entity}")]
    NoMatch { pattern: String, entity: String },

    #[error("invalid name pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("no run directory under {root} matches `{pattern}`")]
    NoRun { root: String, pattern: String },

    #[error("no checkpoint in {run} matches `{pattern}`")]
    NoCheckpoint { run: String, pattern: String },

    #[error("unknown timezone `{0}`")]
    Timezone(String),

    #[error("tensor data error: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("env index {index} is out of range for {num_envs} envs")]
    EnvIndex { index: usize, num_envs: usize },

    #[error("expected state for {expected} envs, got {actual}")]
    EnvCount { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, TaskError>;
