//! A local, in-process module-distribution proxy.
//!
//! [`Proxy`] serves versioned module artifacts over the module proxy wire
//! protocol (`/@v/list`, `.info`, `.mod`, `.zip`) from a directory of
//! pre-baked archives, so build tools and test harnesses can resolve and
//! fetch module content deterministically and without a network.
//!
//! Each module version is represented on disk by one of:
//! - a text archive `<path>_<vers>.txtar` (or `.txt`), or
//! - a directory `<path>_<vers>` containing the unpacked files,
//!
//! where `<path>` and `<vers>` are the escaped forms from
//! [`modprox_module`] and slashes in the escaped path are flattened to
//! underscores. The archive or directory must contain `.info` and `.mod`
//! entries, served verbatim as the protocol's info and mod files; the
//! remaining entries become the contents of the module zip, which the proxy
//! prefixes with `<path>@<vers>/` automatically.
//!
//! Archive parsing and zip assembly are memoized for the lifetime of the
//! proxy: each distinct key is computed at most once, even under concurrent
//! requests, and failures are replayed rather than retried.

mod cache;
mod error;
mod index;
mod resolve;
mod server;
mod source;
mod zips;

pub use error::{ProxyError, ZipAssemblyError};
pub use index::{scan, Scan, ScanDiagnostic};
pub use server::Proxy;
pub use source::ArchiveSource;
