use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(
        "Data directory not found: {}. Set {env_var} environment variable or ensure {} exists.",
        path.display(),
        path.display()
    )]
    MissingDataRoot { path: PathBuf, env_var: &'static str },

    #[error("Failed to load {path}: {reason}. Run the {stage} stage to generate it.")]
    Load {
        path: String,
        stage: String,
        reason: String,
    },

    #[error("{artifact} missing required columns: {missing:?}. Found columns: {present:?}")]
    SchemaViolation {
        artifact: String,
        missing: Vec<String>,
        present: Vec<String>,
    },

    #[error("BLOCKING: quality gate '{gate}' failed: {detail}")]
    QualityGate { gate: String, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn load(path: impl Into<String>, stage: impl Into<String>, reason: impl Into<String>) -> Self {
        DashboardError::Load {
            path: path.into(),
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
