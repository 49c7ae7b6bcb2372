#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("compile: {0}")]
    Compile(String),
    #[error("instantiation: {0}")]
    Instantiation(String),
    #[error("script does not export `{0}() -> i32`")]
    MissingEntry(&'static str),
    #[error("execution: {0}")]
    Execution(String),
    #[error("script returned code {0}")]
    NonZeroExit(i32),
    #[error("script execution timed out")]
    Timeout,
    #[error("context: {0}")]
    Context(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
