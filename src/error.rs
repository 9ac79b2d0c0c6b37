use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshlessError {
    // AWS Errors
    #[error("AWS SSM error: {0}")]
    Ssm(String),

    #[error("AWS EC2 error: {0}")]
    Ec2(String),

    #[error("AWS S3 error: {0}")]
    S3(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    // Target Errors
    #[error("--name and --filters are mutually exclusive")]
    ConflictingTargets,

    #[error("No targets specified. Use --instances, --name, --filters or --cached-filters.")]
    NoTargets,

    #[error("No cached filters found. Run a command with --name or --filters first.")]
    NoCachedFilters,

    // Filter Errors
    #[error("Invalid filter expression: {0} (expected Key=Value)")]
    InvalidFilter(String),

    // State Errors
    #[error("State file corrupted: {0}")]
    StateCorrupted(String),

    // File/IO Errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SshlessError {
    pub fn ssm(err: impl std::fmt::Display) -> Self {
        SshlessError::Ssm(err.to_string())
    }

    pub fn ec2(err: impl std::fmt::Display) -> Self {
        SshlessError::Ec2(err.to_string())
    }

    pub fn s3(err: impl std::fmt::Display) -> Self {
        SshlessError::S3(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SshlessError>;
