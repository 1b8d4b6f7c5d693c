pub type Result<T> = std::result::Result<T, ModuleError>;

/// Errors produced while decoding or validating module identifiers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error("invalid escaped module path {path:?}: {reason}")]
    InvalidEscapedPath { path: String, reason: &'static str },

    #[error("invalid escaped version {version:?}: {reason}")]
    InvalidEscapedVersion {
        version: String,
        reason: &'static str,
    },

    #[error("invalid module path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid version {version:?}")]
    InvalidVersion { version: String },

    #[error("mismatched module path {path:?} and version {version:?}")]
    MismatchedPathMajor { path: String, version: String },
}
