//! Module with the handler serving published operation results.

use std::io;
use std::path::{Path, PathBuf};

use hyper::{Body, Response, StatusCode};
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use pixl::blob::mime_type;
use tokio::fs;

use super::util::error_response;


/// Published files never change, so clients may cache them indefinitely.
const CACHE_FOREVER: &str = "public, max-age=31536000, immutable";


/// Serve the blob at given path (relative to `/blobs/`) from the `root` directory.
pub async fn serve_blob(root: &Path, path: &str) -> Response<Body> {
    let file = match resolve(root, path) {
        Some(f) => f,
        None => {
            warn!("Rejected request for blob at invalid path: {}", path);
            return error_response(StatusCode::BAD_REQUEST,
                "argument", "request", format!("invalid blob path: {}", path));
        }
    };

    trace!("Reading blob from {}", file.display());
    let bytes = match fs::read(&file).await {
        Ok(b) => b,
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Blob {} not found", path);
            return error_response(StatusCode::NOT_FOUND,
                "argument", "request", format!("no such blob: {}", path));
        }
        Err(e) => {
            error!("Failed to read blob {}: {}", file.display(), e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR,
                "upload", "upload", format!("cannot read blob: {}", e));
        }
    };

    let content_type = HeaderValue::from_str(mime_type(&file).as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let mut response = Response::new(Body::empty());
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    response.headers_mut().insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_FOREVER));
    *response.body_mut() = Body::from(bytes);
    response
}

/// Resolve the blob path into a file path within `root`.
///
/// The path must consist of exactly two segments (task ID and file name),
/// each containing only `[A-Za-z0-9._-]` characters and not starting with a dot.
fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let segments: Vec<_> = path.split('/').collect();
    if segments.len() != 2 || !segments.iter().all(|s| is_safe_segment(s)) {
        return None;
    }
    Some(root.join(segments[0]).join(segments[1]))
}

fn is_safe_segment(s: &str) -> bool {
    !s.is_empty() && !s.starts_with('.')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}
