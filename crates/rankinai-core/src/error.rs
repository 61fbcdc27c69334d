use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("invalid sentiment: {0}")]
    InvalidSentiment(String),
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("invalid billing interval: {0}")]
    InvalidBillingInterval(String),
    #[error("invalid analytics window: {0} (expected 7d, 30d or all)")]
    InvalidWindow(String),
    #[error("invalid {kind}: {value}")]
    InvalidKind { kind: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read plans file {path}: {source}")]
    PlansFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plans file: {0}")]
    PlansFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
