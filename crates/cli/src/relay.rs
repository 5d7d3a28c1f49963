// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot loopback listener that receives the broker's redirect, trades
//! the handle for a credential, and hands it to a [`CredentialWriter`].

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::LoginError;
use crate::kubeconfig::CredentialWriter;

/// Upper bound on waiting for the in-flight browser response after the
/// login has resolved.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Reserve a free loopback port by binding port 0, then release it.
///
/// Another process could claim the port before the listener rebinds it;
/// [`serve_once`] reports that as a bind error.
pub fn allocate_free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

/// URL the user opens to start a login that returns to `port`.
pub fn build_login_url(server_url: &str, port: u16) -> String {
    format!("{}/login?port={port}", server_url.trim_end_matches('/'))
}

/// HTTP client for the broker's `/exchange` endpoint.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    server_url: String,
}

impl BrokerClient {
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, server_url: server_url.trim_end_matches('/').to_owned() })
    }

    /// Trade a handle for the credential it names.
    pub async fn exchange(&self, handle: &str) -> Result<String, LoginError> {
        let url = format!("{}/exchange", self.server_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("token", handle)])
            .send()
            .await
            .map_err(|e| LoginError::Exchange(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LoginError::Exchange(format!("broker returned {status}")));
        }
        resp.text().await.map_err(|e| LoginError::Exchange(e.to_string()))
    }
}

struct RelayState {
    broker: BrokerClient,
    writer: Arc<dyn CredentialWriter>,
    done: Mutex<Option<oneshot::Sender<Result<(), LoginError>>>>,
}

impl RelayState {
    /// Claim the right to resolve the login. Only the first caller wins.
    fn claim(&self) -> Option<oneshot::Sender<Result<(), LoginError>>> {
        self.done.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeQuery {
    token: Option<String>,
}

/// Running relay listener.
///
/// Resolves exactly once: with the outcome of the first `/exchange/`
/// request, or with [`LoginError::TimedOut`] from [`Relay::wait`].
pub struct Relay {
    addr: SocketAddr,
    completion: oneshot::Receiver<Result<(), LoginError>>,
    shutdown: CancellationToken,
    server: JoinHandle<()>,
}

impl Relay {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the login to resolve, then stop the listener.
    ///
    /// `None` waits indefinitely. The in-flight browser response is given
    /// a short window to flush before the server task is abandoned.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<(), LoginError> {
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.completion).await {
                Ok(received) => received.unwrap_or(Err(LoginError::ListenerClosed)),
                Err(_) => Err(LoginError::TimedOut(limit)),
            },
            None => self.completion.await.unwrap_or(Err(LoginError::ListenerClosed)),
        };

        self.shutdown.cancel();
        if tokio::time::timeout(DRAIN_TIMEOUT, self.server).await.is_err() {
            tracing::debug!("relay listener did not drain in time");
        }
        outcome
    }
}

/// Bind `127.0.0.1:port` and serve the redirect target until the login
/// resolves.
pub async fn serve_once(
    port: u16,
    broker: BrokerClient,
    writer: Arc<dyn CredentialWriter>,
) -> anyhow::Result<Relay> {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind 127.0.0.1:{port}: {e}"))?;
    let addr = listener.local_addr()?;

    let (tx, completion) = oneshot::channel();
    let state = Arc::new(RelayState { broker, writer, done: Mutex::new(Some(tx)) });
    let router = Router::new()
        .route("/exchange/", get(exchange))
        .route("/exchange", get(exchange))
        .route("/favicon.ico", get(favicon))
        .with_state(state);

    let shutdown = CancellationToken::new();
    let server = {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) =
                axum::serve(listener, router).with_graceful_shutdown(sd.cancelled_owned()).await
            {
                tracing::warn!("relay listener error: {e}");
            }
        })
    };
    tracing::debug!(%addr, "relay listener started");

    Ok(Relay { addr, completion, shutdown, server })
}

async fn favicon() -> StatusCode {
    StatusCode::OK
}

async fn exchange(
    State(s): State<Arc<RelayState>>,
    Query(q): Query<ExchangeQuery>,
) -> impl IntoResponse {
    let Some(done) = s.claim() else {
        return (StatusCode::CONFLICT, "Login already handled".to_owned());
    };

    let outcome = relay_token(&s, q.token.as_deref()).await;
    let reply = match &outcome {
        Ok(()) => {
            (StatusCode::OK, "You are now logged in! You can close this window".to_owned())
        }
        Err(e) => {
            tracing::warn!("login failed: {e}");
            let status = match e {
                LoginError::MissingToken => StatusCode::BAD_REQUEST,
                LoginError::Exchange(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.browser_message().to_owned())
        }
    };

    // The waiter may already have given up.
    let _ = done.send(outcome);
    reply
}

async fn relay_token(s: &RelayState, token: Option<&str>) -> Result<(), LoginError> {
    let handle = token.filter(|t| !t.is_empty()).ok_or(LoginError::MissingToken)?;
    let credential = s.broker.exchange(handle).await?;
    tracing::debug!("credential received");
    s.writer.write(&credential).map_err(|e| LoginError::Write(format!("{e:#}")))?;
    Ok(())
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
