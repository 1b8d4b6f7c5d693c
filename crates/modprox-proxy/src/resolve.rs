//! Resolution of commit-hash version queries to concrete versions.

use std::cmp::Ordering;

use modprox_module::{compare, pseudo_version_hash, ModuleVersion};
use serde::Deserialize;

use crate::source::ArchiveSource;

/// Resolves a version query for `path` against the module index.
///
/// A query that is not entirely lowercase hex is already a concrete version
/// and is returned unchanged. Otherwise it is treated as a possibly truncated
/// commit hash: every indexed version of `path` derives a hash — the suffix
/// of a pseudo-version, or the `Short` field of the candidate's own `.info`
/// metadata — and matches if either string is a prefix of the other. The
/// semantically greatest matching version wins. With no match the query is
/// returned unchanged, and the caller's subsequent load is the designed
/// not-found path.
pub(crate) fn resolve(
    modules: &[ModuleVersion],
    source: &ArchiveSource,
    path: &str,
    query: &str,
) -> String {
    if !all_hex(query) {
        return query.to_string();
    }
    let mut best = String::new();
    for m in modules {
        if m.path != path || compare(&best, &m.version) != Ordering::Less {
            continue;
        }
        let hash = match pseudo_version_hash(&m.version) {
            Some(hash) => hash.to_string(),
            None => find_short_hash(source, m),
        };
        if hash.starts_with(query) || query.starts_with(&hash) {
            best = m.version.clone();
        }
    }
    if best.is_empty() {
        query.to_string()
    } else {
        best
    }
}

/// Reads the `Short` commit hash from a candidate's own `.info` entry,
/// loading (and thereby memoizing) its archive. Empty when the archive,
/// entry, or field is missing.
fn find_short_hash(source: &ArchiveSource, m: &ModuleVersion) -> String {
    #[derive(Default, Deserialize)]
    struct Info {
        #[serde(default, rename = "Short")]
        short: String,
    }

    let Some(archive) = source.load(&m.path, &m.version) else {
        return String::new();
    };
    let Some(data) = archive.get(".info") else {
        return String::new();
    };
    serde_json::from_slice::<Info>(data)
        .unwrap_or_default()
        .short
}

fn all_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
