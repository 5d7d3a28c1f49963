// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubelogin broker: OIDC authorization code flow relayed to a CLI's
//! loopback listener through short-lived exchange handles.

pub mod config;
pub mod error;
pub mod oidc;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{ServerConfig, StateMode};
use crate::oidc::OidcClient;
use crate::state::BrokerState;
use crate::store::MemoryStore;
use crate::transport::build_router;

/// Run the broker until shutdown.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let provider = Arc::new(OidcClient::from_config(&config).await?);

    let store = MemoryStore::new();
    let sweep_every = config.token_ttl().max(Duration::from_secs(1));
    store.spawn_sweeper(sweep_every, shutdown.clone());

    if config.state_mode == StateMode::Signed && config.state_secret.is_none() {
        tracing::warn!("no state secret configured; signed state will not verify across replicas");
    }

    let state = Arc::new(BrokerState::new(config, provider, store));
    let router = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("kubelogin-server listening on {addr}");

    {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutting down");
            }
            sd.cancel();
        });
    }

    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    Ok(())
}
