// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process store of open login ceremonies.
//!
//! Keyed by nonce. Entries expire after the configured TTL and are consumed
//! exactly once by a successful login.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::blockchain::keys::Ed25519PublicKey;

/// Upper bound on ceremonies held at once.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// One open ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ceremony {
    pub nonce: String,
    pub ephemeral_public_key: Ed25519PublicKey,
    pub epoch: u64,
    pub max_epoch: u64,
    pub randomness: String,
}

struct Entry {
    ceremony: Ceremony,
    opened_at: Instant,
}

pub struct CeremonyStore {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl CeremonyStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn insert(&self, ceremony: Ceremony) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.put(
            ceremony.nonce.clone(),
            Entry {
                ceremony,
                opened_at: Instant::now(),
            },
        );
    }

    /// The open ceremony for `nonce`, without consuming it.
    pub fn peek(&self, nonce: &str) -> Option<Ceremony> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match entries.peek(nonce) {
            Some(entry) if entry.opened_at.elapsed() < self.ttl => Some(entry.ceremony.clone()),
            Some(_) => {
                entries.pop(nonce);
                None
            }
            None => None,
        }
    }

    /// Remove and return the ceremony for `nonce`. Only one caller wins.
    pub fn take(&self, nonce: &str) -> Option<Ceremony> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let entry = entries.pop(nonce)?;
        (entry.opened_at.elapsed() < self.ttl).then_some(entry.ceremony)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
