//! On-demand assembly of module zip payloads.

use std::io::{Cursor, Write};
use std::sync::Arc;

use hyper::body::Bytes;
use modprox_txtar::Archive;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::cache::OnceMap;
use crate::error::ZipAssemblyError;

/// Memoizes assembled zips per archive *identity*.
///
/// Archives themselves are memoized for the proxy's lifetime, so the `Arc`
/// address is a stable key: the same loaded archive always maps to the same
/// zip bytes, built exactly once even under concurrent requests. A build
/// failure is memoized and replayed the same way — a broken archive will not
/// start working without a restart.
pub(crate) struct ZipCache {
    cache: OnceMap<usize, Result<Bytes, Arc<ZipAssemblyError>>>,
}

impl ZipCache {
    pub fn new() -> Self {
        Self {
            cache: OnceMap::new(),
        }
    }

    pub fn zip_for(
        &self,
        archive: &Arc<Archive>,
        path: &str,
        version: &str,
    ) -> Result<Bytes, Arc<ZipAssemblyError>> {
        let key = Arc::as_ptr(archive) as usize;
        self.cache.get_or_init(key, || {
            build_zip(archive, path, version)
                .map(Bytes::from)
                .map_err(Arc::new)
        })
    }
}

/// Packages an archive's non-metadata entries, in order, into a zip whose
/// entry names carry the `<path>@<version>/` prefix required by the protocol.
/// All-or-nothing: any failed write aborts the whole build.
fn build_zip(archive: &Archive, path: &str, version: &str) -> Result<Vec<u8>, ZipAssemblyError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for file in &archive.files {
        // Entries named `.info`, `.mod`, etc. are protocol metadata, not
        // module content.
        if file.name.starts_with('.') {
            continue;
        }
        writer.start_file(format!("{path}@{version}/{}", file.name), options)?;
        writer.write_all(&file.data)?;
    }
    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modprox_txtar::File;
    use std::io::Read;

    fn archive() -> Arc<Archive> {
        Arc::new(Archive {
            comment: Vec::new(),
            files: vec![
                File {
                    name: ".info".to_string(),
                    data: b"{\"Version\":\"v1.0.0\"}\n".to_vec(),
                },
                File {
                    name: ".mod".to_string(),
                    data: b"module example.com/p\n".to_vec(),
                },
                File {
                    name: "x.go".to_string(),
                    data: b"package p\n".to_vec(),
                },
                File {
                    name: "sub/y.go".to_string(),
                    data: b"package sub\n".to_vec(),
                },
            ],
        })
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let reader = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open zip");
        reader.file_names().map(str::to_string).collect()
    }

    #[test]
    fn packages_entries_with_prefix_and_skips_metadata() {
        let bytes = build_zip(&archive(), "example.com/p", "v1.0.0").expect("build");
        assert_eq!(
            entry_names(&bytes),
            vec![
                "example.com/p@v1.0.0/x.go".to_string(),
                "example.com/p@v1.0.0/sub/y.go".to_string(),
            ]
        );

        let mut reader = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
        let mut content = String::new();
        reader
            .by_name("example.com/p@v1.0.0/x.go")
            .expect("entry")
            .read_to_string(&mut content)
            .expect("read entry");
        assert_eq!(content, "package p\n");
    }

    #[test]
    fn same_archive_builds_once() {
        let cache = ZipCache::new();
        let archive = archive();
        let first = cache
            .zip_for(&archive, "example.com/p", "v1.0.0")
            .expect("zip");
        let second = cache
            .zip_for(&archive, "example.com/p", "v1.0.0")
            .expect("zip");
        // `Bytes` clones share the underlying buffer.
        assert_eq!(first.as_ptr(), second.as_ptr());
    }
}
