//! Module with the server's request handlers.

mod blobs;
pub mod list;
pub mod util;
mod worker;

pub use self::blobs::serve_blob;
pub use self::worker::{WorkError, Worker};


use hyper::{Body, Response, StatusCode};
use pixl::{ArgsSource, Call, ErrorKind, Operation, UnknownOperation};
use serde::de::DeserializeOwned;
use serde_json::{self, Value as Json};
use serde_qs;
use thiserror::Error;

use self::util::{error_response, json_response};


/// Handle the operation request given with query string parameters.
pub async fn call_with_query(worker: &Worker, op: Operation, query: Option<&str>) -> Response<Body> {
    let query = match query {
        Some(q) => { trace!("{} request query string: {}", op, q); q }
        None => { trace!("No query string found in {} request", op); "" }
    };
    debug!("Decoding {} call from {} bytes of query string", op, query.len());
    match Call::decode(op, QueryString(query)) {
        Ok(call) => perform(worker, call).await,
        Err(e) => decode_error_response(DecodeError::Query(e)),
    }
}

/// Handle the operation request given with a JSON body.
pub async fn call_with_json(worker: &Worker, op: Operation, body: &[u8]) -> Response<Body> {
    trace!("{} request body: {}", op, String::from_utf8_lossy(body));
    debug!("Decoding {} call from {} bytes of JSON", op, body.len());
    match decode_json(op, body) {
        Ok(call) => perform(worker, call).await,
        Err(e) => decode_error_response(e),
    }
}

/// Handle the generic call request, with operation name given in the JSON body.
pub async fn call_rpc(worker: &Worker, body: &[u8]) -> Response<Body> {
    trace!("Call request body: {}", String::from_utf8_lossy(body));
    match decode_rpc(body) {
        Ok(call) => perform(worker, call).await,
        Err(e) => decode_error_response(e),
    }
}

async fn perform(worker: &Worker, call: Call) -> Response<Body> {
    debug!("Decoded {:?}", call);
    match worker.perform(call).await {
        Ok(url) => json_response(StatusCode::OK, json!({"result": url})),
        Err(e) => work_error_response(e),
    }
}


// Decoding

/// Query string as the source of call arguments.
pub struct QueryString<'q>(pub &'q str);

impl<'q> ArgsSource for QueryString<'q> {
    type Error = serde_qs::Error;

    fn args<T: DeserializeOwned>(self) -> Result<T, Self::Error> {
        serde_qs::from_str(self.0)
    }
}

/// Body of the generic call request.
#[derive(Debug, Deserialize)]
struct RpcRequest {
    method: String,
    /// Either an object with named parameters, or an array of them in order.
    #[serde(default)]
    params: Json,
}

/// Decode the call from a JSON object or array of parameters.
fn decode_json(op: Operation, body: &[u8]) -> Result<Call, DecodeError> {
    let params: Json = serde_json::from_slice(body)?;
    Ok(Call::decode(op, params)?)
}

/// Decode the call from the generic `{"method": ..., "params": ...}` request.
fn decode_rpc(body: &[u8]) -> Result<Call, DecodeError> {
    let request: RpcRequest = serde_json::from_slice(body)?;
    let op: Operation = request.method.parse()?;
    Ok(Call::decode(op, request.params)?)
}


/// Error while decoding the operation call from the request.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot decode request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot decode request: {0}")]
    Query(#[from] serde_qs::Error),
    #[error("{0}")]
    Operation(#[from] UnknownOperation),
}


// Errors

fn decode_error_response(e: DecodeError) -> Response<Body> {
    warn!("Failed to decode operation call: {}", e);
    match e {
        DecodeError::Operation(..) =>
            error_response(StatusCode::NOT_FOUND, "operation", "request", e),
        _ => error_response(StatusCode::BAD_REQUEST, ErrorKind::Argument.name(), "request", e),
    }
}

fn work_error_response(e: WorkError) -> Response<Body> {
    match e {
        WorkError::Operation(ref e) =>
            error_response(status_code_for(e.kind()), e.kind().name(), e.stage().name(), e),
        WorkError::Timeout(..) =>
            error_response(StatusCode::GATEWAY_TIMEOUT, "timeout", "request", e),
        WorkError::Unavailable =>
            error_response(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "request", e),
    }
}

/// Determine the HTTP response code that best corresponds to an operation error.
fn status_code_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Argument => StatusCode::BAD_REQUEST,
        ErrorKind::Fetch | ErrorKind::Upload => StatusCode::BAD_GATEWAY,
        ErrorKind::Layout => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Transform | ErrorKind::Font => StatusCode::INTERNAL_SERVER_ERROR,
    }
}


#[cfg(test)]
mod tests {
    use hyper::StatusCode;
    use pixl::{Call, ErrorKind, Operation};
    use spectral::prelude::*;
    use super::{decode_error_response, decode_json, decode_rpc, status_code_for,
                DecodeError, QueryString};

    #[test]
    fn query_string() {
        let call = Call::decode(Operation::Resize,
            QueryString("scale=0.5&url=http%3A%2F%2Fexample.com%2Fcat.jpg"));
        assert_that!(call).is_ok();
        let call = call.unwrap();
        assert_eq!(Operation::Resize, call.operation());
        assert_eq!("http://example.com/cat.jpg", call.url());

        assert_that!(Call::decode(Operation::Resize, QueryString(""))).is_err();
        assert_that!(Call::decode(Operation::Resize, QueryString("scale=half&url=x"))).is_err();
    }

    #[test]
    fn json_object_and_array() {
        let call = decode_json(Operation::MemeGenerate,
            br#"{"topText": "hi", "bottomText": "there", "url": "http://x/y.png"}"#);
        assert_eq!(Operation::MemeGenerate, call.unwrap().operation());

        let call = decode_json(Operation::Rotate, br#"[90, "http://x/y.png"]"#);
        assert_that!(call).is_ok();
        assert_eq!("http://x/y.png", call.unwrap().url());

        assert_that!(decode_json(Operation::Rotate, b"{not json")).is_err();
        assert_that!(decode_json(Operation::Rotate, br#"{"angle": 90}"#)).is_err();
    }

    #[test]
    fn rpc() {
        let call = decode_rpc(br#"{"method": "blur", "params": {"amount": 2, "url": "http://x/y.png"}}"#);
        assert_eq!(Operation::Blur, call.unwrap().operation());

        let call = decode_rpc(br#"{"method": "convert", "params": ["png", "http://x/y.gif"]}"#);
        assert_eq!(Operation::Convert, call.unwrap().operation());

        match decode_rpc(br#"{"method": "sharpen", "params": {}}"#) {
            Err(DecodeError::Operation(..)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_that!(decode_rpc(br#"{"method": "blur"}"#)).is_err();
        assert_that!(decode_rpc(br#"{"params": {}}"#)).is_err();
    }

    #[test]
    fn decode_error_statuses() {
        let unknown = decode_rpc(br#"{"method": "sharpen"}"#).unwrap_err();
        assert_eq!(StatusCode::NOT_FOUND, decode_error_response(unknown).status());
        let invalid = decode_rpc(b"[]").unwrap_err();
        assert_eq!(StatusCode::BAD_REQUEST, decode_error_response(invalid).status());
    }

    #[test]
    fn operation_error_statuses() {
        assert_eq!(StatusCode::BAD_REQUEST, status_code_for(ErrorKind::Argument));
        assert_eq!(StatusCode::BAD_GATEWAY, status_code_for(ErrorKind::Fetch));
        assert_eq!(StatusCode::BAD_GATEWAY, status_code_for(ErrorKind::Upload));
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status_code_for(ErrorKind::Layout));
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status_code_for(ErrorKind::Transform));
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status_code_for(ErrorKind::Font));
    }
}
