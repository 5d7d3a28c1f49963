// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ephemeral token store: short-lived handle -> credential mapping.
//!
//! Keeps the identity token out of browser-visible redirect URLs. The
//! callback handler stores the token under a handle, the browser carries
//! only the handle to the CLI, and the CLI redeems it at `/exchange`.
//! Expiry is owned by the backend; callers never compare timestamps.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::StoreError;

pub use memory::MemoryStore;

/// Backend for exchange handles.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store `credential` under `handle` for `ttl`.
    ///
    /// Re-storing identical content succeeds. Storing different content
    /// under a live handle fails with [`StoreError::Conflict`].
    async fn put(&self, handle: &str, credential: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Read the credential for a live handle without consuming it.
    async fn get(&self, handle: &str) -> Result<String, StoreError>;

    /// Read and delete the credential for a live handle in one step.
    async fn take(&self, handle: &str) -> Result<String, StoreError>;
}

/// Derive the exchange handle for a credential.
///
/// base64url(sha256(credential)), 43 characters, safe in a query string.
pub fn derive_handle(credential: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(credential.as_bytes()))
}

/// Abbreviate a handle for log lines.
pub fn handle_prefix(handle: &str) -> &str {
    handle.get(..8).unwrap_or(handle)
}
