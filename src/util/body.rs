use futures::StreamExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyReadError {
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to read response body: {0}")]
    Network(#[source] reqwest::Error),
}

/// Reads a response body, refusing anything over `limit` bytes.
///
/// A declared `Content-Length` over the limit fails before any body is
/// read. Chunked responses carry no length, so the running total is checked
/// as each chunk arrives and the read stops at the first chunk that
/// crosses the limit.
pub async fn read_limited_body(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, BodyReadError> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(BodyReadError::TooLarge { limit });
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BodyReadError::Network(e.without_url()))?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(BodyReadError::TooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one chunked response with no Content-Length, `chunks` chunks
    /// of `chunk_size` bytes each.
    async fn chunked_server(chunks: usize, chunk_size: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let chunk = vec![b' '; chunk_size];
            for _ in 0..chunks {
                let frame = format!("{:x}\r\n", chunk_size);
                if socket.write_all(frame.as_bytes()).await.is_err()
                    || socket.write_all(&chunk).await.is_err()
                    || socket.write_all(b"\r\n").await.is_err()
                {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_chunked_body_within_limit() {
        let url = chunked_server(4, 256).await;
        let response = reqwest::get(&url).await.unwrap();
        assert!(response.content_length().is_none());
        let bytes = read_limited_body(response, 4096).await.unwrap();
        assert_eq!(bytes.len(), 1024);
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit() {
        let url = chunked_server(64, 1024).await;
        let response = reqwest::get(&url).await.unwrap();
        assert!(response.content_length().is_none());
        let err = read_limited_body(response, 4096).await.unwrap_err();
        assert!(matches!(err, BodyReadError::TooLarge { limit: 4096 }));
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&server)
            .await;
        let response = reqwest::get(server.uri()).await.unwrap();
        let err = read_limited_body(response, 10).await.unwrap_err();
        assert!(matches!(err, BodyReadError::TooLarge { limit: 10 }));
    }
}
