//! Locating and parsing on-disk archives, memoized per module version.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use modprox_module::{escape_path, escape_version};
use modprox_txtar::{Archive, File};
use walkdir::WalkDir;

use crate::cache::OnceMap;

/// Loads archives from the source directory.
///
/// Results — including "absent" — are memoized per decoded (path, version)
/// key for the lifetime of the source: the filesystem is touched at most once
/// per key, and concurrent first loads for a key share a single read.
pub struct ArchiveSource {
    dir: PathBuf,
    cache: OnceMap<(String, String), Option<Arc<Archive>>>,
}

impl ArchiveSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: OnceMap::new(),
        }
    }

    /// Returns the archive for the given decoded module path and version, or
    /// `None` if it does not exist (the expected case for unknown modules) or
    /// cannot be read (logged, never surfaced).
    pub fn load(&self, path: &str, version: &str) -> Option<Arc<Archive>> {
        self.cache
            .get_or_init((path.to_string(), version.to_string()), || {
                self.read_archive(path, version)
            })
    }

    fn read_archive(&self, path: &str, version: &str) -> Option<Arc<Archive>> {
        let enc_path = match escape_path(path) {
            Ok(enc) => enc,
            Err(err) => {
                tracing::debug!(target = "modprox.source", error = %err, "cannot escape module path");
                return None;
            }
        };
        let enc_version = match escape_version(version) {
            Ok(enc) => enc,
            Err(err) => {
                tracing::debug!(target = "modprox.source", error = %err, "cannot escape module version");
                return None;
            }
        };
        let stem = format!("{}_{}", enc_path.replace('/', "_"), enc_version);

        for ext in ["txtar", "txt"] {
            let file = self.dir.join(format!("{stem}.{ext}"));
            match modprox_txtar::parse_file(&file) {
                Ok(archive) => return Some(Arc::new(archive)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        target = "modprox.source",
                        file = %file.display(),
                        error = %err,
                        "failed to read module archive"
                    );
                    return None;
                }
            }
        }

        let root = self.dir.join(&stem);
        match read_dir_archive(&root) {
            Ok(archive) => archive.map(Arc::new),
            Err(err) => {
                tracing::warn!(
                    target = "modprox.source",
                    dir = %root.display(),
                    error = %err,
                    "failed to read module directory"
                );
                None
            }
        }
    }
}

/// Collects every regular file under `root` into an archive, entry names
/// being the forward-slash relative paths. `Ok(None)` means `root` does not
/// exist — the silent not-found case after all lookup strategies miss.
fn read_dir_archive(root: &Path) -> io::Result<Option<Archive>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let not_found = err
                    .io_error()
                    .is_some_and(|io| io.kind() == io::ErrorKind::NotFound);
                if not_found && err.path() == Some(root) {
                    return Ok(None);
                }
                return Err(err.into());
            }
        };
        if entry.depth() == 0 && !entry.file_type().is_dir() {
            return Err(io::Error::other(format!(
                "{}: expected a directory root",
                root.display()
            )));
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|err| io::Error::other(err.to_string()))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let data = std::fs::read(entry.path())?;
        files.push(File { name, data });
    }
    Ok(Some(Archive {
        comment: Vec::new(),
        files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_txtar_then_txt_then_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("example.com_a_v1.0.0.txtar"),
            b"-- .info --\nfrom txtar\n",
        )
        .expect("write");
        std::fs::write(
            dir.path().join("example.com_b_v1.0.0.txt"),
            b"-- .info --\nfrom txt\n",
        )
        .expect("write");
        let subdir = dir.path().join("example.com_c_v1.0.0");
        std::fs::create_dir_all(subdir.join("sub")).expect("mkdir");
        std::fs::write(subdir.join(".info"), b"from dir\n").expect("write");
        std::fs::write(subdir.join("sub/x.go"), b"package x\n").expect("write");

        let source = ArchiveSource::new(dir.path());
        let a = source.load("example.com/a", "v1.0.0").expect("a");
        assert_eq!(a.get(".info"), Some(b"from txtar\n".as_slice()));
        let b = source.load("example.com/b", "v1.0.0").expect("b");
        assert_eq!(b.get(".info"), Some(b"from txt\n".as_slice()));
        let c = source.load("example.com/c", "v1.0.0").expect("c");
        assert_eq!(c.get(".info"), Some(b"from dir\n".as_slice()));
        assert_eq!(c.get("sub/x.go"), Some(b"package x\n".as_slice()));
    }

    #[test]
    fn missing_module_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = ArchiveSource::new(dir.path());
        assert!(source.load("example.com/nope", "v1.0.0").is_none());
    }

    #[test]
    fn escaped_names_are_used_for_lookup() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("github.com_!azure_v1.0.0.txtar"),
            b"-- .info --\n{}\n",
        )
        .expect("write");
        let source = ArchiveSource::new(dir.path());
        assert!(source.load("github.com/Azure", "v1.0.0").is_some());
        assert!(source.load("github.com/azure", "v1.0.0").is_none());
    }

    #[test]
    fn loads_are_memoized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("example.com_p_v1.0.0.txtar");
        std::fs::write(&file, b"-- .info --\n{}\n").expect("write");

        let source = ArchiveSource::new(dir.path());
        let first = source.load("example.com/p", "v1.0.0").expect("first load");

        // The second load must come from memory, not the filesystem.
        std::fs::remove_file(&file).expect("remove");
        let second = source.load("example.com/p", "v1.0.0").expect("second load");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn absence_is_memoized_too() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = ArchiveSource::new(dir.path());
        assert!(source.load("example.com/p", "v1.0.0").is_none());

        // Creating the file afterwards does not un-memoize the miss.
        std::fs::write(
            dir.path().join("example.com_p_v1.0.0.txtar"),
            b"-- .info --\n{}\n",
        )
        .expect("write");
        assert!(source.load("example.com/p", "v1.0.0").is_none());
    }
}
