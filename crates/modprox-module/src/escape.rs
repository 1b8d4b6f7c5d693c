//! The bang-escaping codec between decoded identifiers and their
//! filesystem/URL-safe forms.
//!
//! Uppercase ASCII letters are the only characters the codec rewrites: `X`
//! encodes as `!x`. In the escaped form a `!` must therefore be followed by a
//! lowercase ASCII letter, and a literal uppercase letter is malformed.

use crate::error::{ModuleError, Result};

/// Escapes a decoded module path for use in filenames and URLs.
pub fn escape_path(path: &str) -> Result<String> {
    escape(path).ok_or_else(|| ModuleError::InvalidPath {
        path: path.to_string(),
        reason: "path contains the escape character '!' or non-ASCII bytes".to_string(),
    })
}

/// Escapes a decoded version string for use in filenames and URLs.
pub fn escape_version(version: &str) -> Result<String> {
    escape(version).ok_or_else(|| ModuleError::InvalidVersion {
        version: version.to_string(),
    })
}

/// Decodes an escaped module path. Fails on malformed escape sequences.
pub fn unescape_path(escaped: &str) -> Result<String> {
    unescape(escaped).map_err(|reason| ModuleError::InvalidEscapedPath {
        path: escaped.to_string(),
        reason,
    })
}

/// Decodes an escaped version string. Fails on malformed escape sequences.
pub fn unescape_version(escaped: &str) -> Result<String> {
    unescape(escaped).map_err(|reason| ModuleError::InvalidEscapedVersion {
        version: escaped.to_string(),
        reason,
    })
}

fn escape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '!' => return None,
            c if !c.is_ascii() => return None,
            c if c.is_ascii_uppercase() => {
                out.push('!');
                out.push(c.to_ascii_lowercase());
            }
            c => out.push(c),
        }
    }
    Some(out)
}

fn unescape(s: &str) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '!' => match chars.next() {
                Some(l) if l.is_ascii_lowercase() => out.push(l.to_ascii_uppercase()),
                Some(_) => return Err("'!' must be followed by a lowercase letter"),
                None => return Err("trailing '!'"),
            },
            c if c.is_ascii_uppercase() => {
                return Err("escaped form may not contain uppercase letters")
            }
            c if !c.is_ascii() => return Err("escaped form must be ASCII"),
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_paths_pass_through() {
        assert_eq!(escape_path("example.com/p").expect("escape"), "example.com/p");
        assert_eq!(unescape_path("example.com/p").expect("unescape"), "example.com/p");
    }

    #[test]
    fn uppercase_round_trips() {
        let decoded = "github.com/Azure/SDK";
        let escaped = escape_path(decoded).expect("escape");
        assert_eq!(escaped, "github.com/!azure/!s!d!k");
        assert_eq!(unescape_path(&escaped).expect("unescape"), decoded);
    }

    #[test]
    fn version_round_trips() {
        let decoded = "v1.0.0-RC1";
        let escaped = escape_version(decoded).expect("escape");
        assert_eq!(escaped, "v1.0.0-!r!c1");
        assert_eq!(unescape_version(&escaped).expect("unescape"), decoded);
    }

    #[test]
    fn rejects_malformed_escapes() {
        assert!(matches!(
            unescape_path("example.com/!9"),
            Err(ModuleError::InvalidEscapedPath { .. })
        ));
        assert!(unescape_path("example.com/p!").is_err());
        assert!(unescape_path("example.com/P").is_err());
        assert!(unescape_version("v1.0.0-RC1").is_err());
    }

    #[test]
    fn escape_rejects_reserved_character() {
        assert!(escape_path("example.com/a!b").is_err());
        assert!(escape_version("v1!").is_err());
    }
}
