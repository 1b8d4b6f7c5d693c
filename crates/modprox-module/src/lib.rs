//! Module identity: paths, versions, and the filesystem-safe escaping scheme.
//!
//! Module paths and versions are opaque strings chosen by module authors.
//! Because they may contain uppercase ASCII letters, which collide on
//! case-insensitive filesystems, on-disk and on-wire forms use an *escaped*
//! encoding: every uppercase letter `X` is written as `!x`. The codec is
//! invertible and rejects malformed input; the proxy never fabricates
//! identifiers, it only decodes what it reads from directory names and
//! request paths.

mod check;
mod error;
mod escape;
mod version;

pub use check::{check, check_path};
pub use error::{ModuleError, Result};
pub use escape::{escape_path, escape_version, unescape_path, unescape_version};
pub use version::{compare, is_pseudo_version, is_valid_version, pseudo_version_hash};

use std::fmt;

/// A module path paired with a version, both in decoded (human-readable)
/// form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

impl ModuleVersion {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.version)
    }
}
