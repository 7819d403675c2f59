// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Activity Feed
//!
//! Builds a day-bucketed transfer history for one address straight from the
//! chain. Nothing is stored.
//!
//! `fetch` → `normalize` → `classify` → `bucket`
//!
//! Records that fail the schema or have no counterparty are dropped without
//! error; one odd transaction must not break the feed.

pub mod parse;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::blockchain::client::{SuiClientError, SuiRpc};
use crate::blockchain::keys::SuiAddress;
use crate::blockchain::transactions::mist_to_sui;
use crate::blockchain::types::{execution_succeeded, TransactionBlockResponseOptions, TransactionFilter};

pub use parse::{BalanceChange, BalanceChangeSet};

/// Transactions fetched per direction.
pub const HISTORY_PAGE_SIZE: usize = 50;

/// Bucket label, e.g. `Jan 5, 2024`.
const DAY_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Send,
    Receive,
}

/// One transfer as seen from the tracked address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub digest: String,
    pub sender: bool,
    pub action: Action,
    /// Signed SUI delta of the tracked address
    #[schema(value_type = String, example = "-2.5")]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub counterparty_address: SuiAddress,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivityBucket {
    /// Calendar day (UTC)
    pub key: String,
    pub data: Vec<Activity>,
}

/// A successful, schema-valid record with a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub digest: String,
    pub changes: Vec<BalanceChange>,
    pub timestamp: DateTime<Utc>,
}

pub struct ActivityAggregator {
    chain: Arc<dyn SuiRpc>,
}

impl ActivityAggregator {
    pub fn new(chain: Arc<dyn SuiRpc>) -> Self {
        Self { chain }
    }

    /// Transactions sent from and received by `address`, newest first per
    /// direction. The union may contain duplicates.
    pub async fn fetch(&self, address: &SuiAddress) -> Result<Vec<Value>, SuiClientError> {
        let options = TransactionBlockResponseOptions::effects_and_balances();
        let (sent, received) = tokio::try_join!(
            self.chain.query_transaction_blocks(
                TransactionFilter::FromAddress(address.to_string()),
                options,
                HISTORY_PAGE_SIZE,
                true,
            ),
            self.chain.query_transaction_blocks(
                TransactionFilter::ToAddress(address.to_string()),
                options,
                HISTORY_PAGE_SIZE,
                true,
            ),
        )?;

        let mut blocks = sent;
        blocks.extend(received);
        Ok(blocks)
    }

    /// Dedupe by digest, keep successful blocks, validate the schema.
    pub fn normalize(raw: Vec<Value>) -> Vec<ActivityRecord> {
        let mut seen = HashSet::new();
        raw.iter()
            .filter(|block| execution_succeeded(block))
            .filter_map(BalanceChangeSet::parse)
            .filter(|set| seen.insert(set.digest.clone()))
            .filter_map(|set| {
                let timestamp = DateTime::from_timestamp_millis(set.timestamp_ms?)?;
                Some(ActivityRecord {
                    digest: set.digest,
                    changes: set.changes,
                    timestamp,
                })
            })
            .collect()
    }

    /// The transfer as seen by `address`; `None` when `address` is not a
    /// party or no counterparty exists.
    pub fn classify(record: &ActivityRecord, address: &SuiAddress) -> Option<Activity> {
        let own = record.changes.iter().find(|c| c.owner == *address)?;
        let sender = own.amount < 0;

        let counterparty = record.changes.iter().find(|c| {
            if sender {
                c.owner != *address
            } else {
                c.amount < 0
            }
        })?;

        Some(Activity {
            digest: record.digest.clone(),
            sender,
            action: if sender { Action::Send } else { Action::Receive },
            amount: mist_to_sui(own.amount)?,
            counterparty_address: counterparty.owner,
            created_at: record.timestamp,
        })
    }

    /// Newest first, grouped by UTC calendar day. No empty buckets.
    pub fn bucket(mut activities: Vec<Activity>) -> Vec<ActivityBucket> {
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut buckets: Vec<ActivityBucket> = Vec::new();
        for activity in activities {
            let key = activity.created_at.format(DAY_FORMAT).to_string();
            match buckets.last_mut() {
                Some(last) if last.key == key => last.data.push(activity),
                _ => buckets.push(ActivityBucket {
                    key,
                    data: vec![activity],
                }),
            }
        }
        buckets
    }

    pub async fn feed(&self, address: &SuiAddress) -> Result<Vec<ActivityBucket>, SuiClientError> {
        let raw = self.fetch(address).await?;
        let activities = Self::normalize(raw)
            .iter()
            .filter_map(|record| Self::classify(record, address))
            .collect();
        Ok(Self::bucket(activities))
    }
}
