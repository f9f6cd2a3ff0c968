use std::path::PathBuf;

use thiserror::Error;

pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised while loading plan documents.
///
/// Shape checks themselves never fail, so everything here surfaces while reading or decoding
/// input.
#[derive(Error, Debug)]
pub enum PlanError {
    /// No json structure could be located, or the located structure carries no plan root.
    #[error("malformed plan document: {0}")]
    MalformedDocument(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Manifest(String),

    /// A relation check was requested without naming the relation.
    #[error("check `{0}` requires a target relation")]
    MissingTarget(String),
}

impl PlanError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        PlanError::MalformedDocument(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlanError::Io {
            path: path.into(),
            source,
        }
    }
}
