// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed repositories over the redb database.

pub mod cards;
pub mod identities;

pub use cards::{Card, CardRepository, CardStatus, Transition};
pub use identities::{Identity, IdentityRepository, Registration};
