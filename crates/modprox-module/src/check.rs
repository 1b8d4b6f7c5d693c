//! Validity checking for path + version combinations.
//!
//! The rules are a practical subset of a full registry's: paths are
//! slash-separated ASCII elements with a domain-like first element, versions
//! are `v`-prefixed semantic versions, and a major version of 2 or higher
//! must be reflected in a `/vN` path suffix (unless the version is marked
//! `+incompatible`).

use crate::error::{ModuleError, Result};
use crate::version;

/// Checks that `path` and `version` are individually well-formed and agree on
/// the major version.
pub fn check(path: &str, version_str: &str) -> Result<()> {
    check_path(path)?;
    let Some(parsed) = version::parse(version_str) else {
        return Err(ModuleError::InvalidVersion {
            version: version_str.to_string(),
        });
    };
    let incompatible = parsed.build.as_str() == "incompatible";
    let required = if parsed.major >= 2 && !incompatible {
        Some(parsed.major)
    } else {
        None
    };
    if path_major_suffix(path) != required {
        return Err(ModuleError::MismatchedPathMajor {
            path: path.to_string(),
            version: version_str.to_string(),
        });
    }
    Ok(())
}

/// Checks that `path` is a well-formed decoded module path.
pub fn check_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(ModuleError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };
    if path.is_empty() {
        return invalid("empty path");
    }
    if !path.is_ascii() {
        return invalid("path must be ASCII");
    }
    if path.starts_with('/') || path.ends_with('/') {
        return invalid("leading or trailing slash");
    }
    if path.contains("//") {
        return invalid("double slash");
    }
    for (i, element) in path.split('/').enumerate() {
        if element.starts_with('.') || element.ends_with('.') {
            return invalid("path element begins or ends with a dot");
        }
        if !element
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'+'))
        {
            return invalid("path element contains a disallowed character");
        }
        if i == 0 && !element.contains('.') {
            return invalid("first path element must contain a dot");
        }
    }
    Ok(())
}

/// Returns `Some(major)` when the final path element is a `/vN` major-version
/// suffix (N >= 2, no leading zero).
fn path_major_suffix(path: &str) -> Option<u64> {
    let last = path.rsplit('/').next()?;
    let digits = last.strip_prefix('v')?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let major: u64 = digits.parse().ok()?;
    (major >= 2).then_some(major)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_modules() {
        check("example.com/p", "v1.0.0").expect("valid");
        check("example.com/p", "v0.0.0-20200101000000-abcdef123456").expect("valid");
        check("example.com", "v0.1.0").expect("valid");
        check("github.com/Azure/SDK", "v1.2.3").expect("uppercase is fine decoded");
    }

    #[test]
    fn major_version_must_match_path_suffix() {
        check("example.com/p/v2", "v2.0.1").expect("valid");
        check("example.com/p/v3", "v3.0.0-rc.1").expect("valid");
        assert!(matches!(
            check("example.com/p", "v2.0.0"),
            Err(ModuleError::MismatchedPathMajor { .. })
        ));
        assert!(matches!(
            check("example.com/p/v2", "v1.0.0"),
            Err(ModuleError::MismatchedPathMajor { .. })
        ));
        assert!(matches!(
            check("example.com/p/v2", "v3.0.0"),
            Err(ModuleError::MismatchedPathMajor { .. })
        ));
    }

    #[test]
    fn incompatible_versions_skip_the_suffix_rule() {
        check("example.com/p", "v2.0.0+incompatible").expect("valid");
        assert!(check("example.com/p/v2", "v2.0.0+incompatible").is_err());
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(check_path("").is_err());
        assert!(check_path("/example.com").is_err());
        assert!(check_path("example.com/").is_err());
        assert!(check_path("example.com//p").is_err());
        assert!(check_path("example.com/.hidden").is_err());
        assert!(check_path("example.com/p ").is_err());
        assert!(check_path("noDot/p").is_err());
    }

    #[test]
    fn rejects_invalid_versions() {
        assert!(matches!(
            check("example.com/p", "list"),
            Err(ModuleError::InvalidVersion { .. })
        ));
        assert!(check("example.com/p", "1.0.0").is_err());
    }
}
