//! Error taxonomy shared by the identity normalizer, the patchers, and the orchestrator.

use crate::template_vars::TemplateError;
use std::path::{Path, PathBuf};

/// Errors raised while scaffolding a rule. Every variant is fatal to the invocation.
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    #[error("invalid {field}: {reason}")]
    InvalidIdentity { field: &'static str, reason: String },
    #[error("unknown category '{name}'{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownCategory {
        name: String,
        suggestion: Option<String>,
    },
    #[error("{} already exists; refusing to overwrite it", .0.display())]
    FileAlreadyExists(PathBuf),
    #[error("malformed module index: {0}")]
    MalformedIndex(String),
    #[error("anchor line not found: `{0}`")]
    AnchorNotFound(String),
    #[error("category marker not found: `{0}`")]
    CategoryMarkerNotFound(String),
    #[error("bad registry template")]
    Template(#[from] TemplateError),
    #[error("I/O failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

impl ScaffoldError {
    /// Build an [`ScaffoldError::InvalidIdentity`] for the named parameter.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            field,
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Process exit code for this failure. 1 and 2 are left to generic and usage errors.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidIdentity { .. } => 3,
            Self::UnknownCategory { .. } => 4,
            Self::FileAlreadyExists(_) => 5,
            Self::MalformedIndex(_) => 6,
            Self::AnchorNotFound(_) => 7,
            Self::CategoryMarkerNotFound(_) => 8,
            Self::Io { .. } => 9,
            Self::Template(_) => 1,
        }
    }
}
