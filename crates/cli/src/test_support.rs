// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a stub broker, a recording credential
//! writer, and assertion helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use crate::kubeconfig::CredentialWriter;

/// Assert that an expression returns `Err` whose message contains `substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = format!("{err:#}");
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// Install the process-wide rustls provider. Safe to call repeatedly.
pub fn install_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Loopback broker serving `/exchange` from a fixed handle table.
///
/// Handles are single-use, like the real broker's default.
pub struct StubBroker {
    pub url: String,
    pub calls: Arc<AtomicU32>,
}

impl StubBroker {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

struct StubState {
    credentials: Mutex<HashMap<String, String>>,
    calls: Arc<AtomicU32>,
}

/// Spawn a stub broker on `127.0.0.1:0`.
pub async fn spawn_stub_broker(credentials: &[(&str, &str)]) -> anyhow::Result<StubBroker> {
    let calls = Arc::new(AtomicU32::new(0));
    let state = Arc::new(StubState {
        credentials: Mutex::new(
            credentials.iter().map(|(h, c)| ((*h).to_owned(), (*c).to_owned())).collect(),
        ),
        calls: Arc::clone(&calls),
    });
    let router = Router::new().route("/exchange", get(stub_exchange)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(StubBroker { url: format!("http://{addr}"), calls })
}

async fn stub_exchange(
    State(s): State<Arc<StubState>>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    s.calls.fetch_add(1, Ordering::SeqCst);
    let credential = q
        .get("token")
        .and_then(|t| s.credentials.lock().ok().and_then(|mut m| m.remove(t)));
    match credential {
        Some(c) => (StatusCode::OK, c),
        None => (StatusCode::UNAUTHORIZED, "Invalid token\n".to_owned()),
    }
}

/// Credential writer that records what it was given.
#[derive(Default)]
pub struct RecordingWriter {
    written: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingWriter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A writer whose every write fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Self::default() })
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl CredentialWriter for RecordingWriter {
    fn write(&self, credential: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        self.written
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .push(credential.to_owned());
        Ok(())
    }
}
