//! Version string classification and ordering.
//!
//! Versions are semantic versions carrying a leading `v`. Comparison is
//! lenient: anything that does not parse orders strictly below every valid
//! version, and two unparseable versions compare equal. This matches how the
//! resolver treats an empty "best so far" candidate.

use std::cmp::Ordering;

/// Returns whether `version` is a well-formed `v`-prefixed semantic version.
pub fn is_valid_version(version: &str) -> bool {
    parse(version).is_some()
}

/// Compares two versions, ordering unparseable strings lowest.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Returns whether `version` is a pseudo-version: a synthesized version whose
/// last two hyphen-separated groups are a 14-digit UTC timestamp and a commit
/// hash, e.g. `v0.0.0-20200101000000-abcdef123456`.
pub fn is_pseudo_version(version: &str) -> bool {
    pseudo_version_hash(version).is_some()
}

/// Returns the commit-hash suffix of a pseudo-version, or `None` if `version`
/// does not follow the pseudo-version convention.
pub fn pseudo_version_hash(version: &str) -> Option<&str> {
    let mut groups = version.rsplitn(3, '-');
    let hash = groups.next()?;
    let timestamp = groups.next()?;
    let base = groups.next()?;
    if base.is_empty()
        || timestamp.len() != 14
        || !timestamp.bytes().all(|b| b.is_ascii_digit())
        || hash.is_empty()
        || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return None;
    }
    Some(hash)
}

pub(crate) fn parse(version: &str) -> Option<semver::Version> {
    let rest = version.strip_prefix('v')?;
    semver::Version::parse(rest).ok()
}
