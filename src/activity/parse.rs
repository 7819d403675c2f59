// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Schema for the balance-change view of a transaction block.
//!
//! Shared by the activity feed and by card funding evidence. A block passes
//! only if every balance change is an address-owned SUI change with an
//! integer amount.

use serde::Deserialize;
use serde_json::Value;

use crate::blockchain::keys::SuiAddress;
use crate::blockchain::types::SUI_COIN_TYPE;

/// One owner's signed SUI delta in MIST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub owner: SuiAddress,
    pub amount: i128,
}

/// A validated transaction block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChangeSet {
    pub digest: String,
    pub changes: Vec<BalanceChange>,
    pub timestamp_ms: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    digest: String,
    balance_changes: Vec<RawChange>,
    #[serde(default)]
    timestamp_ms: Option<Number>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChange {
    owner: RawOwner,
    coin_type: String,
    amount: Number,
}

#[derive(Deserialize)]
struct RawOwner {
    #[serde(rename = "AddressOwner")]
    address_owner: String,
}

/// Sui sends big integers as strings; accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Str(String),
    Int(i64),
}

impl Number {
    fn to_i128(&self) -> Option<i128> {
        match self {
            Number::Str(s) => s.trim().parse().ok(),
            Number::Int(n) => Some(i128::from(*n)),
        }
    }
}

impl BalanceChangeSet {
    /// Validate a raw `SuiTransactionBlockResponse`. `None` if any part of
    /// the schema does not hold.
    pub fn parse(block: &Value) -> Option<Self> {
        let raw = RawBlock::deserialize(block).ok()?;

        let changes = raw
            .balance_changes
            .iter()
            .map(|change| {
                if change.coin_type != SUI_COIN_TYPE {
                    return None;
                }
                Some(BalanceChange {
                    owner: change.owner.address_owner.parse().ok()?,
                    amount: change.amount.to_i128()?,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let timestamp_ms = match raw.timestamp_ms {
            Some(ts) => Some(i64::try_from(ts.to_i128()?).ok()?),
            None => None,
        };

        Some(Self {
            digest: raw.digest,
            changes,
            timestamp_ms,
        })
    }

    pub fn change_of(&self, owner: &SuiAddress) -> Option<&BalanceChange> {
        self.changes.iter().find(|c| c.owner == *owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addr(s: &str) -> SuiAddress {
        s.parse().unwrap()
    }

    #[test]
    fn parses_string_and_numeric_amounts() {
        let set = BalanceChangeSet::parse(&json!({
            "digest": "d1",
            "timestampMs": "1700000000000",
            "balanceChanges": [
                {"owner": {"AddressOwner": "0xa"}, "coinType": "0x2::sui::SUI", "amount": "-5000000000"},
                {"owner": {"AddressOwner": "0xb"}, "coinType": "0x2::sui::SUI", "amount": 5000000000i64}
            ]
        }))
        .unwrap();

        assert_eq!(set.digest, "d1");
        assert_eq!(set.timestamp_ms, Some(1_700_000_000_000));
        assert_eq!(set.change_of(&addr("0xa")).unwrap().amount, -5_000_000_000);
        assert_eq!(set.change_of(&addr("0xb")).unwrap().amount, 5_000_000_000);
        assert!(set.change_of(&addr("0xc")).is_none());
    }

    #[test]
    fn timestamp_is_optional() {
        let set = BalanceChangeSet::parse(&json!({"digest": "d", "balanceChanges": []})).unwrap();
        assert!(set.timestamp_ms.is_none());
        assert!(set.changes.is_empty());
    }

    #[test]
    fn rejects_other_coin_types() {
        let block = json!({
            "digest": "d",
            "balanceChanges": [
                {"owner": {"AddressOwner": "0xa"}, "coinType": "0xdead::usdc::USDC", "amount": "1"}
            ]
        });
        assert!(BalanceChangeSet::parse(&block).is_none());
    }

    #[test]
    fn rejects_object_owned_changes() {
        let block = json!({
            "digest": "d",
            "balanceChanges": [
                {"owner": {"ObjectOwner": "0xa"}, "coinType": "0x2::sui::SUI", "amount": "1"}
            ]
        });
        assert!(BalanceChangeSet::parse(&block).is_none());
    }

    #[test]
    fn rejects_missing_fields_and_bad_numbers() {
        assert!(BalanceChangeSet::parse(&json!({"balanceChanges": []})).is_none());
        assert!(BalanceChangeSet::parse(&json!({"digest": "d"})).is_none());
        let block = json!({
            "digest": "d",
            "balanceChanges": [
                {"owner": {"AddressOwner": "0xa"}, "coinType": "0x2::sui::SUI", "amount": "lots"}
            ]
        });
        assert!(BalanceChangeSet::parse(&block).is_none());
    }
}
