//! Utilities for request handlers.

use hyper::{Body, Response, StatusCode};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value as Json;


/// Create a JSON response.
pub fn json_response(status: StatusCode, json: Json) -> Response<Body> {
    let body = json.to_string();
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    *response.body_mut() = Body::from(body);
    response
}

/// Create an erroneous JSON response.
///
/// `kind` and `stage` tell the client what has failed and at which point.
pub fn error_response<T: ToString>(status: StatusCode,
                                   kind: &str, stage: &str, message: T) -> Response<Body> {
    json_response(status, json!({
        "error": {
            "kind": kind,
            "stage": stage,
            "message": message.to_string(),
        }
    }))
}

/// Create a response with no content.
pub fn empty_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(0usize));
    response
}


#[cfg(test)]
mod tests {
    use hyper::StatusCode;
    use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use super::{empty_response, error_response, json_response};

    #[test]
    fn json() {
        let resp = json_response(StatusCode::OK, json!({"result": "http://x/y.png"}));
        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!("application/json", resp.headers()[CONTENT_TYPE]);
        assert_eq!("27", resp.headers()[CONTENT_LENGTH]);
    }

    #[test]
    fn error() {
        let resp = error_response(StatusCode::BAD_GATEWAY, "fetch", "fetch", "HTTP 404");
        assert_eq!(StatusCode::BAD_GATEWAY, resp.status());
        assert_eq!("application/json", resp.headers()[CONTENT_TYPE]);
    }

    #[test]
    fn empty() {
        let resp = empty_response(StatusCode::NOT_FOUND);
        assert_eq!(StatusCode::NOT_FOUND, resp.status());
        assert_eq!("0", resp.headers()[CONTENT_LENGTH]);
    }
}
