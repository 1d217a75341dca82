pub mod password;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::StatusCode;

/// Buffers a request body into contiguous bytes.
pub async fn aggregate<B: Body>(body: B) -> Result<Bytes, StatusCode> {
    match body.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
