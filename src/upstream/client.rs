//! Outbound HTTP client.

use std::error::Error as StdError;
use std::time::Duration;

use axum::http::{header::HOST, HeaderMap, Method, StatusCode};
use bytes::Bytes;
use hyper::ext::ReasonPhrase;
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::config::schema::{TimeoutConfig, UpstreamConfig};
use crate::resilience::Deadline;
use crate::routing::TargetUrl;
use crate::transform::Payload;

/// Request about to be sent upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub target: TargetUrl,
    pub headers: HeaderMap,
    pub body: Payload,
}

/// Fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Reason phrase, only when the upstream sent a non-canonical one.
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Why an upstream call produced no response.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The deadline passed before the response body was complete.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// DNS, connect, TLS or transport failure.
    #[error("network failure: {}", describe(.0))]
    Network(#[source] reqwest::Error),

    /// Anything else the client reported (redirect loops, builder errors).
    #[error("upstream call failed: {}", describe(.0))]
    Other(#[source] reqwest::Error),
}

impl InvokeError {
    fn classify(err: reqwest::Error, budget: Duration) -> Self {
        if err.is_timeout() {
            InvokeError::Timeout(budget)
        } else if err.is_connect() || err.is_request() || err.is_body() {
            InvokeError::Network(err)
        } else {
            InvokeError::Other(err)
        }
    }

    /// Label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            InvokeError::Timeout(_) => "timeout",
            InvokeError::Network(_) => "network",
            InvokeError::Other(_) => "other",
        }
    }
}

/// Error message including the full source chain. reqwest's own message only
/// names the URL; the cause (refused, dns error, ...) sits further down.
pub fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Client used for every proxied call.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl UpstreamClient {
    /// Build the client from configuration.
    pub fn from_config(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let redirect = if upstream.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(upstream.max_redirects)
        };

        let mut builder = reqwest::Client::builder()
            .redirect(redirect)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .pool_max_idle_per_host(0);
        if !upstream.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        })
    }

    /// Fresh deadline for one proxied call.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send `request` and buffer the response, giving up at `deadline`.
    pub async fn invoke(
        &self,
        request: OutboundRequest,
        deadline: Deadline,
    ) -> Result<UpstreamResponse, InvokeError> {
        let OutboundRequest {
            method,
            target,
            mut headers,
            body,
        } = request;

        // reqwest derives Host from the URL on every hop, redirects included;
        // for the first hop it is the same value the translator produced.
        headers.remove(HOST);

        let builder = self
            .client
            .request(method, target.as_url().clone())
            .headers(headers);
        let builder = match body {
            Payload::Text(text) => builder.body(text),
            Payload::Binary(bytes) => builder.body(bytes),
            Payload::Absent => builder,
        };

        let call = async move {
            let response = builder.send().await?;
            let status = response.status();
            let reason = response.extensions().get::<ReasonPhrase>().cloned();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse {
                status,
                reason,
                headers,
                body,
            })
        };

        match deadline.run(call).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(InvokeError::classify(e, deadline.budget())),
            Err(_) => Err(InvokeError::Timeout(deadline.budget())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::resolve_target;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(request_secs: u64) -> UpstreamClient {
        let timeouts = TimeoutConfig {
            connect_secs: 2,
            request_secs,
        };
        UpstreamClient::from_config(&UpstreamConfig::default(), &timeouts).unwrap()
    }

    fn get(target: &str) -> OutboundRequest {
        OutboundRequest {
            method: Method::GET,
            target: resolve_target(target, None).unwrap(),
            headers: HeaderMap::new(),
            body: Payload::Absent,
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(5);
        let err = client
            .invoke(get(&format!("http://{}/", addr)), client.deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Network(_)), "got {:?}", err);
        assert_eq!(err.label(), "network");
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = client(1);
        let err = client
            .invoke(get(&format!("http://{}/", addr)), client.deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Timeout(d) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_buffers_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 202 Accepted\r\nX-Up: 1\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc")
                .await;
        });

        let client = client(5);
        let response = client
            .invoke(get(&format!("http://{}/x", addr)), client.deadline())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::ACCEPTED);
        assert_eq!(response.headers.get("x-up").unwrap(), "1");
        assert_eq!(&response.body[..], b"abc");
        assert!(response.reason.is_none());
    }
}
