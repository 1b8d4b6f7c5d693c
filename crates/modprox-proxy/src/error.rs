use std::path::PathBuf;

/// Errors that prevent a [`crate::Proxy`] from starting.
///
/// Once serving, the proxy never surfaces internal errors to callers except
/// as a not-found response (or a 500 for zip assembly failures); see the
/// crate docs.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("cannot read module index from {dir}: {source}")]
    Scan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http server error: {0}")]
    Http(#[from] hyper::Error),
}

/// A zip assembly failure. Memoized per archive and replayed to every caller
/// until the proxy shuts down; there is no retry.
#[derive(Debug, thiserror::Error)]
pub enum ZipAssemblyError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
