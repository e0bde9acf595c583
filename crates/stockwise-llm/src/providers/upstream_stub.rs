//! Local stand-in for a provider endpoint
//!
//! Answers every request with one canned status and JSON body and records
//! what it received, so tests can drive the real HTTP path of a provider.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub(crate) struct Received {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

pub(crate) struct UpstreamStub {
    base: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl UpstreamStub {
    pub async fn start(status: StatusCode, reply: Value) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();

        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let log = log.clone();
                let reply = reply.clone();
                async move {
                    log.lock().unwrap().push(Received {
                        method,
                        path: uri.path().to_string(),
                        headers,
                        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
                    });
                    (status, Json(reply))
                }
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            received,
        }
    }

    /// Base URL to hand to a provider config
    pub fn base(&self) -> String {
        self.base.clone()
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}
