//! Outbound HTTP through a single upstream proxy

use async_trait::async_trait;
use bytes::Bytes;
use http::Response;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{PoolError, Result};
use crate::models::Address;

/// Performs a GET routed through one proxy
///
/// Every failure to complete the exchange (connect refused, DNS, TLS,
/// timeout, truncated body) is an error. HTTP error statuses are not.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, proxy: &Address, target: &Url, timeout: Duration)
        -> Result<Response<Bytes>>;
}

/// Plain HTTP proxy transport; HTTPS targets are tunnelled with CONNECT
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProxyTransport;

impl HttpProxyTransport {
    pub fn new() -> Self {
        Self
    }

    fn client_for(proxy: &Address, timeout: Duration) -> Result<reqwest::Client> {
        let upstream = reqwest::Proxy::all(proxy.proxy_url())
            .map_err(|e| PoolError::InvalidProxyAddress(format!("{}: {}", proxy, e)))?;

        reqwest::Client::builder()
            .proxy(upstream)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| PoolError::Internal(format!("failed to build HTTP client: {}", e)))
    }
}

#[async_trait]
impl Transport for HttpProxyTransport {
    #[instrument(skip_all, fields(proxy = %proxy, target = %target))]
    async fn get(
        &self,
        proxy: &Address,
        target: &Url,
        timeout: Duration,
    ) -> Result<Response<Bytes>> {
        let client = Self::client_for(proxy, timeout)?;

        let response = client
            .get(target.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?;

        debug!(status = status.as_u16(), bytes = body.len(), "Proxied request completed");

        let mut builder = Response::builder().status(status).version(version);
        if let Some(h) = builder.headers_mut() {
            *h = headers;
        }
        builder
            .body(body)
            .map_err(|e| PoolError::Http(format!("Failed to build response: {}", e)))
    }
}

fn transport_error(err: reqwest::Error) -> PoolError {
    if err.is_timeout() {
        PoolError::Timeout
    } else {
        PoolError::ProxyConnectionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Fake upstream proxy answering one request; reports the request head it saw
    async fn fake_proxy(response: &'static str) -> (Address, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = Address::parse(&listener.local_addr().unwrap().to_string()).unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });

        (addr, rx)
    }

    #[tokio::test]
    async fn test_get_routes_through_proxy() {
        let (proxy, seen) = fake_proxy(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nX-Upstream: fake\r\nConnection: close\r\n\r\nhello",
        )
        .await;
        let target = Url::parse("http://target.invalid/path?q=1").unwrap();

        let response = HttpProxyTransport::new()
            .get(&proxy, &target, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.headers()["x-upstream"], "fake");
        assert_eq!(response.body().as_ref(), b"hello");

        let head = seen.await.unwrap();
        assert!(
            head.starts_with("GET http://target.invalid/path?q=1 HTTP/1.1"),
            "unexpected request line: {}",
            head
        );
    }

    #[tokio::test]
    async fn test_get_error_status_is_not_a_failure() {
        let (proxy, _seen) = fake_proxy(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let target = Url::parse("http://target.invalid/").unwrap();

        let response = HttpProxyTransport::new()
            .get(&proxy, &target, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_get_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy = Address::parse(&listener.local_addr().unwrap().to_string()).unwrap();
        drop(listener);

        let err = HttpProxyTransport::new()
            .get(
                &proxy,
                &Url::parse("http://target.invalid/").unwrap(),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(err.is_proxy_failure(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_get_times_out_on_silent_proxy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy = Address::parse(&listener.local_addr().unwrap().to_string()).unwrap();

        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let err = HttpProxyTransport::new()
            .get(
                &proxy,
                &Url::parse("http://target.invalid/").unwrap(),
                Duration::from_millis(200),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::Timeout), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_get_rejects_unusable_address() {
        let proxy = Address::parse("999.999.999.999:99999").unwrap();
        let err = HttpProxyTransport::new()
            .get(
                &proxy,
                &Url::parse("http://target.invalid/").unwrap(),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidProxyAddress(_)));
    }
}
