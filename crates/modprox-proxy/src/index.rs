//! Startup scan of the source directory into an immutable module index.

use std::fmt;
use std::io;
use std::path::Path;

use modprox_module::{unescape_path, unescape_version, ModuleError, ModuleVersion};

/// The result of scanning a source directory: the modules found, in
/// name-sorted first-seen order (duplicates allowed), plus a diagnostic for
/// every entry that was skipped. The caller decides whether diagnostics are
/// fatal; the proxy logs them and carries on.
#[derive(Debug, Default)]
pub struct Scan {
    pub modules: Vec<ModuleVersion>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

/// Why a directory entry was skipped during [`scan`].
#[derive(Debug)]
pub enum ScanDiagnostic {
    /// Not a directory and not a `.txt`/`.txtar` file (or not UTF-8).
    UnrecognizedForm { entry: String },
    /// No `_v` separator between the encoded path and version halves.
    MissingVersionSeparator { entry: String },
    /// The path half failed to decode.
    InvalidPath { entry: String, error: ModuleError },
    /// The version half failed to decode.
    InvalidVersion { entry: String, error: ModuleError },
}

impl fmt::Display for ScanDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedForm { entry } => {
                write!(f, "{entry}: not a module directory or text archive")
            }
            Self::MissingVersionSeparator { entry } => {
                write!(f, "{entry}: no `_v` between module path and version")
            }
            Self::InvalidPath { entry, error } => {
                write!(f, "{entry}: cannot decode module path: {error}")
            }
            Self::InvalidVersion { entry, error } => {
                write!(f, "{entry}: cannot decode module version: {error}")
            }
        }
    }
}

/// Scans the top-level entries of `dir` (not recursive) for module archives.
///
/// An entry named `<encPath with '/'→'_'>_v<encVersion>` — as a plain
/// directory or with a `.txt`/`.txtar` suffix — contributes one module. The
/// split point between path and version is the *last* occurrence of the
/// literal `_v`, so an encoded path containing `_v` itself is ambiguous; this
/// is a documented limitation, not detected here.
pub fn scan(dir: &Path) -> io::Result<Scan> {
    let mut entries = std::fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut scan = Scan::default();
    for entry in entries {
        let name_os = entry.file_name();
        let file_type = entry.file_type()?;
        let Some(name) = name_os.to_str() else {
            scan.diagnostics.push(ScanDiagnostic::UnrecognizedForm {
                entry: name_os.to_string_lossy().into_owned(),
            });
            continue;
        };

        let base = if let Some(base) = name.strip_suffix(".txt") {
            base
        } else if let Some(base) = name.strip_suffix(".txtar") {
            base
        } else if file_type.is_dir() {
            name
        } else {
            scan.diagnostics.push(ScanDiagnostic::UnrecognizedForm {
                entry: name.to_string(),
            });
            continue;
        };

        let Some(split) = base.rfind("_v") else {
            scan.diagnostics.push(ScanDiagnostic::MissingVersionSeparator {
                entry: name.to_string(),
            });
            continue;
        };

        // On disk, slashes in the escaped path were flattened to underscores.
        let enc_path = base[..split].replace('_', "/");
        let path = match unescape_path(&enc_path) {
            Ok(path) => path,
            Err(error) => {
                scan.diagnostics.push(ScanDiagnostic::InvalidPath {
                    entry: name.to_string(),
                    error,
                });
                continue;
            }
        };
        let version = match unescape_version(&base[split + 1..]) {
            Ok(version) => version,
            Err(error) => {
                scan.diagnostics.push(ScanDiagnostic::InvalidVersion {
                    entry: name.to_string(),
                    error,
                });
                continue;
            }
        };
        scan.modules.push(ModuleVersion { path, version });
    }
    Ok(scan)
}
