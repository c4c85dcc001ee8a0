//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn the upstream response into the client response
//! - Keep only `Content-Type` and `Content-Length`, add the CORS headers
//! - Relay the body in bounded chunks without buffering it
//!
//! # Design Decisions
//! - The upstream status is relayed as-is, redirects and errors included
//! - Access-filter rejections are plain 403 responses, not errors

use axum::body::{Body, Bytes};
use axum::http::{Response, StatusCode};
use futures_util::stream::{self, Stream, StreamExt};

use crate::security::headers::client_response_headers;

/// Largest chunk written to the client at once.
pub const CHUNK_SIZE: usize = 4096;

/// Build the client response from an upstream response.
pub fn relay(upstream: Response<Body>) -> Response<Body> {
    let (parts, body) = upstream.into_parts();

    let mut response = Response::new(Body::from_stream(bounded_chunks(
        body.into_data_stream(),
        CHUNK_SIZE,
    )));
    *response.status_mut() = parts.status;
    *response.headers_mut() = client_response_headers(&parts.headers);
    response
}

/// Response for clients rejected by the access filter.
pub fn forbidden() -> Response<Body> {
    let mut response = Response::new(Body::from("Forbidden"));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}

/// Re-chunk a byte stream so no item exceeds `max` bytes.
pub fn bounded_chunks<S, E>(inner: S, max: usize) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let max = max.max(1);
    inner.flat_map(move |item| stream::iter(split(item, max)))
}

fn split<E>(item: Result<Bytes, E>, max: usize) -> Vec<Result<Bytes, E>> {
    match item {
        Ok(mut bytes) => {
            let mut out = Vec::with_capacity(bytes.len() / max + 1);
            while bytes.len() > max {
                out.push(Ok(bytes.split_to(max)));
            }
            if !bytes.is_empty() {
                out.push(Ok(bytes));
            }
            out
        }
        Err(e) => vec![Err(e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn test_bounded_chunks_splits_large_items() {
        let source = stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from(vec![b'a'; 10_000])),
            Ok(Bytes::from_static(b"tail")),
        ]);

        let sizes: Vec<usize> = bounded_chunks(source, CHUNK_SIZE)
            .map(|chunk| chunk.unwrap().len())
            .collect()
            .await;

        assert_eq!(sizes, vec![4096, 4096, 1808, 4]);
    }

    #[tokio::test]
    async fn test_bounded_chunks_passes_errors_through() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err("boom"),
        ]);

        let items: Vec<Result<Bytes, &str>> = bounded_chunks(source, 1).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[2], Err("boom"));
    }

    #[tokio::test]
    async fn test_relay_filters_headers_and_keeps_status() {
        let upstream = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::SET_COOKIE, "id=1")
            .header(header::SERVER, "upstream")
            .body(Body::from("missing"))
            .unwrap();

        let response = relay(upstream);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(headers.get(header::SERVER).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"missing");
    }
}
