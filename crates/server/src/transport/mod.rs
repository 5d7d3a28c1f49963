// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the login broker.

pub mod http;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::BrokerState;

/// Build the axum `Router` with all broker routes.
pub fn build_router(state: Arc<BrokerState>) -> Router {
    let downloads = ServeDir::new(&state.config.download_dir);
    Router::new()
        .route("/", get(http::index))
        .route("/health", get(http::health))
        // Login relay
        .route("/login", get(http::login))
        .route("/callback", get(http::callback))
        .route("/exchange", get(http::exchange))
        // CLI binaries
        .nest_service("/download", downloads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
