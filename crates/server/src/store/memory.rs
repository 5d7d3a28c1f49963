// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process token store with per-entry deadlines.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::store::{handle_prefix, TokenStore};

struct Entry {
    credential: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Token store held in broker memory.
///
/// Expired entries are never returned; they are dropped lazily on access
/// and in bulk by [`MemoryStore::spawn_sweeper`]. Not shared across broker
/// replicas.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    /// Spawn a background task that purges expired entries every `interval`.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {}
                }

                let removed = store.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "purged expired exchange handles");
                }
            }
        });
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn put(&self, handle: &str, credential: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Unavailable(format!("ttl out of range: {ttl:?}")))?;
        let mut entries = self.entries.write().await;

        if let Some(existing) = entries.get_mut(handle) {
            if existing.is_live(now) {
                if existing.credential != credential {
                    tracing::error!(handle = %handle_prefix(handle), "handle collision");
                    return Err(StoreError::Conflict);
                }
                existing.expires_at = expires_at;
                return Ok(());
            }
        }

        entries.insert(
            handle.to_owned(),
            Entry { credential: credential.to_owned(), expires_at },
        );
        Ok(())
    }

    async fn get(&self, handle: &str) -> Result<String, StoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(handle) {
                Some(e) if e.is_live(now) => return Ok(e.credential.clone()),
                Some(_) => {}
                None => return Err(StoreError::NotFound),
            }
        }

        // Expired: drop it so it cannot linger until the next sweep.
        let mut entries = self.entries.write().await;
        if entries.get(handle).is_some_and(|e| !e.is_live(now)) {
            entries.remove(handle);
        }
        Err(StoreError::NotFound)
    }

    async fn take(&self, handle: &str) -> Result<String, StoreError> {
        let now = Instant::now();
        match self.entries.write().await.remove(handle) {
            Some(e) if e.is_live(now) => Ok(e.credential),
            _ => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
