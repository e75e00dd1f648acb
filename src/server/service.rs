//! Module with the service that implements ALL the functionality.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use hyper::{self, Body, Method, Request, Response, StatusCode};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::service::Service;
use pixl::Operation;
use serde_json::Value as Json;

use crate::{NAME, REVISION, VERSION};
use crate::handlers::{call_rpc, call_with_json, call_with_query, serve_blob, Worker};
use crate::handlers::list::{list_fonts, list_operations};
use crate::handlers::util::{empty_response, json_response};


/// Prefix of the paths where the published results are served.
const BLOBS_PREFIX: &str = "/blobs/";


/// State shared by all connections to the server.
pub struct State {
    worker: Worker,
    /// Directory with published results, if the server serves them.
    blob_root: Option<PathBuf>,
}

impl State {
    #[inline]
    pub fn new(worker: Worker, blob_root: Option<PathBuf>) -> Self {
        State{worker, blob_root}
    }
}


/// The HTTP service, created for every client connection.
pub struct Pixl {
    state: Arc<State>,
    remote_addr: Option<SocketAddr>,
}

impl Pixl {
    #[inline]
    pub fn new(state: Arc<State>, remote_addr: Option<SocketAddr>) -> Self {
        Pixl{state, remote_addr}
    }
}

impl Service<Request<Body>> for Pixl {
    type Response = Response<Body>;
    type Error = hyper::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.log(&req);

        let state = self.state.clone();
        let start = Instant::now();
        Box::pin(async move {
            let mut resp = handle(&state, req).await?;
            fix_headers(&mut resp);

            info!("HTTP {status}, produced {len} bytes of {ctype} in {time:.3} secs",
                status = resp.status(),
                len = resp.headers().get(CONTENT_LENGTH)
                    .and_then(|l| l.to_str().ok()).unwrap_or("unknown number of"),
                ctype = resp.headers().get(CONTENT_TYPE)
                    .and_then(|ct| ct.to_str().ok()).unwrap_or("unknown type"),
                time = start.elapsed().as_secs_f64());
            Ok(resp)
        })
    }
}

impl Pixl {
    #[inline]
    fn log(&self, req: &Request<Body>) {
        info!("{} {} {}{} {:?}",
            self.remote_addr.map(|a| format!("{}", a.ip())).unwrap_or_else(|| "-".to_owned()),
            req.method(),
            req.uri().path(),
            req.uri().query().map(|q| format!("?{}", q)).unwrap_or_else(String::new),
            req.version());
    }
}


/// Route the request to its handler.
async fn handle(state: &State, req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
    let path = req.uri().path().to_owned();
    let method = req.method().clone();

    if path.starts_with(BLOBS_PREFIX) {
        return Ok(match (&method, state.blob_root.as_ref()) {
            (&Method::GET, Some(root)) => serve_blob(root, &path[BLOBS_PREFIX.len()..]).await,
            (_, Some(_)) => handle_405(&method, &path),
            (_, None) => handle_404(&path),
        });
    }

    let resp = match path.as_str() {
        "/" => match method {
            Method::GET => handle_info(state),
            _ => handle_405(&method, &path),
        },
        "/call" => match method {
            Method::POST => {
                let body = hyper::body::to_bytes(req.into_body()).await?;
                call_rpc(&state.worker, &body).await
            }
            _ => handle_405(&method, &path),
        },
        "/operations" => match method {
            Method::GET => json_response(StatusCode::OK, list_operations()),
            _ => handle_405(&method, &path),
        },
        "/fonts" => match method {
            Method::GET => json_response(StatusCode::OK, list_fonts(state.worker.processor())),
            _ => handle_405(&method, &path),
        },
        "/stats" => match method {
            Method::GET => json_response(StatusCode::OK, state.worker.stats()),
            _ => handle_405(&method, &path),
        },
        p => match p.trim_start_matches('/').parse::<Operation>() {
            Ok(op) if !p[1..].contains('/') => match method {
                Method::GET => call_with_query(&state.worker, op, req.uri().query()).await,
                Method::POST => {
                    let body = hyper::body::to_bytes(req.into_body()).await?;
                    call_with_json(&state.worker, op, &body).await
                }
                _ => handle_405(&method, &path),
            },
            _ => handle_404(&path),
        },
    };
    Ok(resp)
}

/// Handle the request for basic information about the server.
fn handle_info(state: &State) -> Response<Body> {
    let info: Json = json!({
        "name": *NAME,
        "version": *VERSION,
        "revision": *REVISION,
        "backend": state.worker.processor().transform_name(),
    });
    json_response(StatusCode::OK, info)
}

fn handle_404(path: &str) -> Response<Body> {
    debug!("Path {} doesn't match any endpoint", path);
    empty_response(StatusCode::NOT_FOUND)
}

fn handle_405(method: &Method, path: &str) -> Response<Body> {
    warn!("Unsupported HTTP method {} for {}", method, path);
    empty_response(StatusCode::METHOD_NOT_ALLOWED)
}

/// Fix headers in the response, providing default values where necessary.
fn fix_headers(resp: &mut Response<Body>) {
    if !resp.headers().contains_key(CONTENT_TYPE) {
        resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    }
}
