use thiserror::Error;

#[derive(Error, Debug)]
pub enum TapError {
    #[error("button count must be at least 1")]
    NoButtons,
    #[error("game duration must be at least 1 second")]
    ZeroDuration,
    #[error("tick interval must be at least 1 millisecond")]
    ZeroTickInterval,
    #[error("{name} must be between 0 and 1, got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("could not read or write the config file")]
    IO(#[from] std::io::Error),
    #[error("the config file is not valid JSON")]
    Json(#[from] serde_json::Error),
}
