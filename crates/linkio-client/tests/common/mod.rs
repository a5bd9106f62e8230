#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use linkio_client::LinkIo;
use linkio_core::{MemoryStore, SdkConfig};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

struct MockInner {
    pending_status: u16,
    pending_body: String,
    pending_delay: Duration,
    referral_status: u16,
    referral_delay: Duration,
    pending_requests: Vec<String>,
    referral_bodies: Vec<Value>,
}

#[derive(Clone)]
struct MockState(Arc<Mutex<MockInner>>);

/// In-process attribution backend on an ephemeral port.
pub struct MockBackend {
    pub base_url: String,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState(Arc::new(Mutex::new(MockInner {
            pending_status: 404,
            pending_body: String::new(),
            pending_delay: Duration::ZERO,
            referral_status: 200,
            referral_delay: Duration::ZERO,
            pending_requests: Vec::new(),
            referral_bodies: Vec::new(),
        })));

        let app = Router::new()
            .route("/api/pending-link/:device_id", get(pending_link))
            .route("/api/track-referral", post(track_referral))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url, state }
    }

    pub fn config(&self) -> SdkConfig {
        SdkConfig::new("example.com", self.base_url.clone())
    }

    pub fn sdk(&self) -> LinkIo {
        self.sdk_with(self.config())
    }

    pub fn sdk_with(&self, config: SdkConfig) -> LinkIo {
        LinkIo::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    pub fn set_pending(&self, status: u16, body: &str) {
        let mut inner = self.state.0.lock().unwrap();
        inner.pending_status = status;
        inner.pending_body = body.to_string();
    }

    pub fn set_pending_delay(&self, delay: Duration) {
        self.state.0.lock().unwrap().pending_delay = delay;
    }

    pub fn set_referral_status(&self, status: u16) {
        self.state.0.lock().unwrap().referral_status = status;
    }

    pub fn set_referral_delay(&self, delay: Duration) {
        self.state.0.lock().unwrap().referral_delay = delay;
    }

    pub fn pending_requests(&self) -> Vec<String> {
        self.state.0.lock().unwrap().pending_requests.clone()
    }

    pub fn referral_bodies(&self) -> Vec<Value> {
        self.state.0.lock().unwrap().referral_bodies.clone()
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn pending_link(State(state): State<MockState>, Path(device_id): Path<String>) -> Response {
    let (status, body, delay) = {
        let mut inner = state.0.lock().unwrap();
        inner.pending_requests.push(device_id);
        (
            inner.pending_status,
            inner.pending_body.clone(),
            inner.pending_delay,
        )
    };
    tokio::time::sleep(delay).await;
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn track_referral(State(state): State<MockState>, body: String) -> StatusCode {
    let (status, delay) = {
        let mut inner = state.0.lock().unwrap();
        inner
            .referral_bodies
            .push(serde_json::from_str(&body).unwrap_or(Value::Null));
        (inner.referral_status, inner.referral_delay)
    };
    tokio::time::sleep(delay).await;
    StatusCode::from_u16(status).unwrap()
}
