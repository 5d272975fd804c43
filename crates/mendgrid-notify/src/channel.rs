//! Notification channels.
//!
//! `WebhookChannel` POSTs `{"subject": ..., "message": ...}` as JSON over
//! HTTP/1.1 to the configured endpoint, bounded by a timeout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::Uri;
use http_body_util::Full;
use serde::Serialize;
use tracing::debug;

use crate::error::NotifyError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An external channel that accepts formatted reports.
pub trait NotificationChannel: Send + Sync {
    /// Identifier shown in logs.
    fn id(&self) -> &str;

    fn publish<'a>(&'a self, subject: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

/// Delivers reports to an `http://` webhook.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    endpoint: String,
    authority: String,
    path: String,
    timeout: Duration,
}

impl WebhookChannel {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let invalid = |reason: &str| NotifyError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = endpoint.parse().map_err(|_| invalid("not a URI"))?;
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => return Err(invalid(&format!("unsupported scheme {other}"))),
            None => return Err(invalid("missing scheme")),
        }
        let host = uri.host().ok_or_else(|| invalid("missing host"))?;
        let port = uri.port_u16().unwrap_or(80);
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            endpoint: endpoint.to_string(),
            authority: format!("{host}:{port}"),
            path,
            timeout,
        })
    }

    async fn deliver(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        let connect_err = |reason: String| NotifyError::Connect {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let body = serde_json::to_vec(&WebhookPayload { subject, message })
            .map_err(|e| NotifyError::Encode(e.to_string()))?;

        let stream = tokio::net::TcpStream::connect(&self.authority)
            .await
            .map_err(|e| connect_err(e.to_string()))?;
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| connect_err(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("POST")
            .uri(self.path.as_str())
            .header("host", self.authority.as_str())
            .header("content-type", "application/json")
            .header("user-agent", "mendgrid-notify/0.1")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| NotifyError::Encode(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| connect_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected {
                endpoint: self.endpoint.clone(),
                status: resp.status().as_u16(),
            });
        }
        debug!(endpoint = %self.endpoint, status = %resp.status(), "report delivered");
        Ok(())
    }
}

impl NotificationChannel for WebhookChannel {
    fn id(&self) -> &str {
        &self.endpoint
    }

    fn publish<'a>(&'a self, subject: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.deliver(subject, message)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout {
                    endpoint: self.endpoint.clone(),
                }),
            }
        })
    }
}
