// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entity
//!
//! A persisted asset instance: a stable identifier, the typed [`Asset`]
//! payload, and the timestamps a repository maintains across repeated
//! observations of the same asset.

use crate::assets::{Asset, AssetKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A node in the discovery graph.
///
/// Entities are created once via a repository and never destroyed during a
/// session; later observations only advance `last_seen`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub asset: Asset,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Entity {
    /// Wraps an asset as a freshly observed entity, stamping both
    /// timestamps to `now`.
    pub fn new(asset: Asset, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn asset_type(&self) -> AssetKind {
        self.asset.asset_type()
    }

    pub fn key(&self) -> String {
        self.asset.key()
    }

    /// Advances `last_seen` to `now`, recording a repeat observation.
    pub fn observe(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }
}

/// A free-form property attached directly to an entity (as opposed to an
/// [`crate::edge::Edge`]'s [`crate::edge::SourceProperty`] provenance).
///
/// Used by collectors for facts that belong to the entity itself rather
/// than to a relation between two entities, e.g. a TLS certificate's
/// validity window or an RDAP record's raw status codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProperty {
    pub name: String,
    pub value: String,
}
