// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the login relay.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::error::{BrokerError, StoreError};
use crate::oidc::state::parse_port;
use crate::state::BrokerState;
use crate::store::{derive_handle, handle_prefix};

/// Embedded landing page.
const INDEX_HTML: &str = include_str!("../web/index.html");

// -- Request types ------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub port: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Set by the provider when the user denies consent or login fails.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExchangeQuery {
    #[serde(default)]
    pub token: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// URL on the CLI's loopback listener that receives the exchange handle.
pub fn send_back_url(port: u16, handle: &str) -> String {
    format!("http://localhost:{port}/exchange?token={handle}")
}

// -- Handlers -----------------------------------------------------------------

/// `GET /`
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// `GET /health`
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// `GET /login?port=<p>`: send the browser to the provider.
pub async fn login(State(s): State<Arc<BrokerState>>, Query(q): Query<LoginQuery>) -> Response {
    let Some(raw) = non_empty(q.port) else {
        tracing::debug!("login without return port");
        return BrokerError::BadRequest.to_http_response("No return port in URL");
    };
    let Some(port) = parse_port(&raw) else {
        tracing::debug!(port = %raw, "login with invalid return port");
        return BrokerError::BadRequest.to_http_response("Invalid return port in URL");
    };

    let state = s.state_codec.encode(port);
    let url = s.provider.authorize_url(&state);
    tracing::info!(port, "redirecting login to identity provider");
    Redirect::to(&url).into_response()
}

/// `GET /callback?code=<c>&state=<s>`: finish the code flow and hand the
/// browser an exchange handle for the CLI.
pub async fn callback(
    State(s): State<Arc<BrokerState>>,
    Query(q): Query<CallbackQuery>,
) -> Response {
    if let Some(ref error) = q.error {
        tracing::warn!(error = %error, "provider returned an error to the callback");
    }
    let (Some(code), Some(state)) = (non_empty(q.code), non_empty(q.state)) else {
        tracing::warn!("callback missing code or state");
        return BrokerError::BadRequest.to_http_response("Bad Request");
    };
    let Some(port) = s.state_codec.decode(&state) else {
        tracing::warn!("callback with invalid state");
        return BrokerError::BadRequest.to_http_response("Invalid state");
    };

    let id_token = match s.provider.exchange_code(&code).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(port, err = %e, "authorization code exchange failed");
            return BrokerError::UpstreamError.to_http_response("Error in auth");
        }
    };

    let handle = derive_handle(&id_token);
    if let Err(e) = s.store.put(&handle, &id_token, s.config.token_ttl()).await {
        tracing::error!(port, handle = %handle_prefix(&handle), err = %e, "failed to store token");
        return BrokerError::Internal.to_http_response("Failed to generate send back url");
    }

    tracing::info!(port, handle = %handle_prefix(&handle), "login complete, relaying handle");
    Redirect::to(&send_back_url(port, &handle)).into_response()
}

/// `GET /exchange?token=<h>`: redeem a handle for the raw credential.
pub async fn exchange(
    State(s): State<Arc<BrokerState>>,
    Query(q): Query<ExchangeQuery>,
) -> Response {
    let Some(handle) = non_empty(q.token) else {
        return BrokerError::Unauthorized.to_http_response("Invalid token");
    };

    let result = if s.config.reusable_handles {
        s.store.get(&handle).await
    } else {
        s.store.take(&handle).await
    };

    match result {
        Ok(credential) => {
            tracing::info!(handle = %handle_prefix(&handle), "handle redeemed");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-store"),
                ],
                credential,
            )
                .into_response()
        }
        Err(StoreError::NotFound) => {
            tracing::info!(handle = %handle_prefix(&handle), "unknown or expired handle");
            BrokerError::Unauthorized.to_http_response("Invalid token")
        }
        Err(e) => {
            // Operators see the fault; the caller sees the same 401 as a miss.
            tracing::warn!(handle = %handle_prefix(&handle), err = %e, "token store lookup failed");
            BrokerError::Unauthorized.to_http_response("Invalid token")
        }
    }
}
