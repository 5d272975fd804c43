//! HTTP trigger.
//!
//! `RecoveryTrigger` runs a hyper HTTP/1.1 server where each `POST` body
//! is one notification batch. The response carries the invocation status
//! as JSON; a malformed batch answers 400.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use mendgrid_recovery::RecoveryDispatcher;

pub struct RecoveryTrigger {
    dispatcher: Arc<RecoveryDispatcher>,
}

impl RecoveryTrigger {
    pub fn new(dispatcher: Arc<RecoveryDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Bind `addr` and serve until the shutdown signal flips.
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind HTTP trigger on {addr}"))?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener. Spawns a task per connection.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let local = listener.local_addr().context("listener has no local address")?;
        info!(addr = %local, "HTTP trigger listening");

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer_addr) = accept_result.context("accept failed")?;
                    let dispatcher = self.dispatcher.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let dispatcher = dispatcher.clone();
                            async move {
                                Ok::<_, hyper::Error>(handle_request(&dispatcher, req).await)
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("HTTP trigger shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handle one invocation request.
pub async fn handle_request(dispatcher: &RecoveryDispatcher, req: Request<Incoming>) -> Response<Full<Bytes>> {
    if req.method() != Method::POST {
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            serde_json::json!({ "error": "POST a notification batch" }),
        );
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": format!("failed to read body: {e}") }),
            );
        }
    };
    debug!(bytes = body.len(), "invocation received");

    match dispatcher.handle_raw(&body).await {
        Ok(status) => match serde_json::to_value(&status) {
            Ok(value) => json_response(StatusCode::OK, value),
            Err(e) => {
                error!(error = %e, "failed to encode invocation status");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "failed to encode status" }),
                )
            }
        },
        Err(e) => {
            warn!(error = %e, "rejected malformed batch");
            json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": e.to_string() }),
            )
        }
    }
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body.to_string())));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}
