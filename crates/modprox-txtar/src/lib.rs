//! A trivial text-based archive format for bundling small file trees.
//!
//! An archive is a free-form comment followed by a sequence of files, each
//! introduced by a marker line of the form `-- NAME --`. The file's data runs
//! until the next marker or the end of input. The format is line-oriented and
//! deliberately unspecified beyond that: any byte sequence parses as a valid
//! archive, which makes it convenient for hand-written test fixtures.
//!
//! Parsing normalizes each data section (and the comment) to end with a
//! newline so that `format` followed by `parse` round-trips.

use std::io;
use std::path::Path;

/// A parsed archive: leading comment plus an ordered list of named files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Archive {
    pub comment: Vec<u8>,
    pub files: Vec<File>,
}

/// A single named entry in an [`Archive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub data: Vec<u8>,
}

impl Archive {
    /// Returns the data of the file with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.data.as_slice())
    }
}

/// Parses an archive from raw bytes. Never fails: input with no markers is an
/// archive consisting solely of a comment.
pub fn parse(data: &[u8]) -> Archive {
    let mut archive = Archive::default();
    let mut current: Option<File> = None;

    for line in split_lines(data) {
        if let Some(name) = marker_name(line) {
            if let Some(file) = current.take() {
                archive.files.push(fix_newline(file));
            }
            current = Some(File {
                name: name.to_string(),
                data: Vec::new(),
            });
            continue;
        }
        match &mut current {
            Some(file) => file.data.extend_from_slice(line),
            None => archive.comment.extend_from_slice(line),
        }
    }
    if let Some(file) = current.take() {
        archive.files.push(fix_newline(file));
    }
    archive.comment = ensure_trailing_newline(std::mem::take(&mut archive.comment));
    archive
}

/// Reads and parses the archive stored at `path`.
///
/// The only failure mode is I/O: callers that probe speculative paths can
/// check for [`io::ErrorKind::NotFound`].
pub fn parse_file(path: impl AsRef<Path>) -> io::Result<Archive> {
    let data = std::fs::read(path)?;
    Ok(parse(&data))
}

/// Serializes an archive back to its textual form.
///
/// Inverse of [`parse`] as long as no file's data contains a line that would
/// itself parse as a marker.
pub fn format(archive: &Archive) -> Vec<u8> {
    let mut out = ensure_trailing_newline(archive.comment.clone());
    for file in &archive.files {
        out.extend_from_slice(b"-- ");
        out.extend_from_slice(file.name.as_bytes());
        out.extend_from_slice(b" --\n");
        out.extend_from_slice(&ensure_trailing_newline(file.data.clone()));
    }
    out
}

/// Splits into lines, each retaining its trailing newline (if any).
fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|&b| b == b'\n')
}

/// Returns the file name if `line` is a marker line (`-- NAME --`).
fn marker_name(line: &[u8]) -> Option<&str> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let middle = line.strip_prefix(b"-- ")?.strip_suffix(b" --")?;
    let name = std::str::from_utf8(middle).ok()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

fn fix_newline(mut file: File) -> File {
    file.data = ensure_trailing_newline(std::mem::take(&mut file.data));
    file
}

fn ensure_trailing_newline(mut data: Vec<u8>) -> Vec<u8> {
    if !data.is_empty() && !data.ends_with(b"\n") {
        data.push(b'\n');
    }
    data
}
