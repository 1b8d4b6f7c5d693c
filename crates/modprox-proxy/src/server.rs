//! The HTTP server and protocol handler.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use modprox_module::{check, is_pseudo_version, unescape_path, unescape_version, ModuleVersion};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ProxyError;
use crate::resolve::resolve;
use crate::source::ArchiveSource;
use crate::zips::ZipCache;

/// A running module proxy.
///
/// Serves the module proxy protocol under `<url()>`: `/@v/list`, `.info`,
/// `.mod` and `.zip` requests against the archives in the source directory.
/// The server owns all mutable state (the two memoization caches); the module
/// index is immutable after construction. Dropping the proxy (or calling
/// [`Proxy::close`]) shuts the listener down.
pub struct Proxy {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Proxy {
    /// Starts a proxy serving the archives in `dir` on `addr`.
    ///
    /// An empty `addr` picks an arbitrary free localhost port. The source
    /// directory is scanned once, up front; entries that fail to decode are
    /// logged and skipped, but an unreadable directory is fatal. Must be
    /// called from within a tokio runtime.
    pub fn bind(dir: impl Into<PathBuf>, addr: &str) -> Result<Proxy, ProxyError> {
        let dir = dir.into();
        let scan = crate::index::scan(&dir).map_err(|source| ProxyError::Scan {
            dir: dir.clone(),
            source,
        })?;
        for diagnostic in &scan.diagnostics {
            tracing::debug!(
                target = "modprox.proxy",
                dir = %dir.display(),
                "skipping source entry: {diagnostic}"
            );
        }

        let addr = if addr.is_empty() { "127.0.0.1:0" } else { addr };
        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let state = Arc::new(ProxyState {
            modules: scan.modules,
            source: ArchiveSource::new(dir),
            zips: ZipCache::new(),
        });
        let make_svc = make_service_fn({
            let state = Arc::clone(&state);
            move |_conn| {
                let state = Arc::clone(&state);
                async move {
                    Ok::<_, Infallible>(service_fn(move |req| handle(Arc::clone(&state), req)))
                }
            }
        });

        let (shutdown, rx) = oneshot::channel::<()>();
        let server = Server::from_tcp(listener)?
            .serve(make_svc)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            });
        let task = tokio::spawn(async move {
            if let Err(err) = server.await {
                tracing::warn!(target = "modprox.proxy", error = %err, "proxy server error");
            }
        });

        let url = format!("http://{local_addr}/mod");
        tracing::debug!(target = "modprox.proxy", url = %url, "proxy listening");
        Ok(Proxy {
            url,
            shutdown: Some(shutdown),
            task,
        })
    }

    /// The base URL callers should use, e.g. `http://127.0.0.1:43211/mod`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Shuts the proxy down and waits for in-flight requests to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        // Await the server task directly; `self` is consumed so Drop only
        // sees the already-taken sender.
        let _ = (&mut self.task).await;
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

struct ProxyState {
    modules: Vec<ModuleVersion>,
    source: ArchiveSource,
    zips: ZipCache,
}

async fn handle(
    state: Arc<ProxyState>,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path().to_string();
    // Archive loads and zip builds are blocking filesystem work; keep them
    // off the async workers.
    let response = tokio::task::spawn_blocking(move || state.respond(&path))
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(target = "modprox.proxy", error = %err, "request handler panicked");
            status_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        });
    Ok(response)
}

impl ProxyState {
    /// Serves one request, routing purely on the path.
    fn respond(&self, request_path: &str) -> Response<Body> {
        let Some(rest) = request_path.strip_prefix("/mod/") else {
            return not_found();
        };
        let Some((enc_path, file)) = rest.split_once("/@v/") else {
            return not_found();
        };
        let path = match unescape_path(enc_path) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(target = "modprox.proxy", error = %err, "bad module path in request");
                return not_found();
            }
        };

        if file == "list" {
            return self.list(&path);
        }

        let Some((enc_version, ext)) = file.rsplit_once('.') else {
            return not_found();
        };
        let version = match unescape_version(enc_version) {
            Ok(version) => version,
            Err(err) => {
                tracing::debug!(target = "modprox.proxy", error = %err, "bad version in request");
                return not_found();
            }
        };
        let version = resolve(&self.modules, &self.source, &path, &version);

        let Some(archive) = self.source.load(&path, &version) else {
            // Clients resolve prefixes speculatively and expect a 404/410 for
            // whatever does not exist; a 500 here would abort the whole
            // resolution on their side.
            tracing::debug!(
                target = "modprox.proxy",
                module = %path,
                version = %version,
                "no archive for module"
            );
            return not_found();
        };

        match ext {
            "info" | "mod" => {
                let want = format!(".{ext}");
                match archive.get(&want) {
                    Some(data) => status_response(StatusCode::OK, data.to_vec()),
                    None => not_found(),
                }
            }
            "zip" => match self.zips.zip_for(&archive, &path, &version) {
                Ok(bytes) => status_response(StatusCode::OK, bytes),
                Err(err) => {
                    tracing::warn!(
                        target = "modprox.proxy",
                        module = %path,
                        version = %version,
                        error = %err,
                        "zip assembly failed"
                    );
                    status_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
            },
            _ => not_found(),
        }
    }

    /// `/@v/list`: one concrete version per line. Pseudo-versions and
    /// path/version combinations that fail validity checking are excluded;
    /// zero results is a 404, not an empty 200.
    fn list(&self, path: &str) -> Response<Body> {
        let mut body = String::new();
        for m in &self.modules {
            if m.path == path && !is_pseudo_version(&m.version) && check(&m.path, &m.version).is_ok()
            {
                body.push_str(&m.version);
                body.push('\n');
            }
        }
        if body.is_empty() {
            return not_found();
        }
        status_response(StatusCode::OK, body)
    }
}

fn not_found() -> Response<Body> {
    status_response(StatusCode::NOT_FOUND, "not found")
}

fn status_response(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}
