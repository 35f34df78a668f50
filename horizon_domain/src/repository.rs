// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repository Port
//!
//! This module defines the repository pattern interface for asset-graph
//! persistence, providing an abstraction layer between the engine and
//! whatever concrete graph store backs it.
//!
//! The asset-graph persistence layer itself is an external collaborator:
//! this trait is the narrow interface the engine calls through, not a
//! specification of the storage technology. An in-memory implementation is
//! used for tests; a real deployment plugs in a durable graph store behind
//! the same trait.

use crate::edge::{Edge, EdgeProperty, EdgeTag, Relation};
use crate::entity::{Entity, EntityProperty};
use crate::{Asset, EngineError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The graph-store port the engine and its handlers consume.
///
/// All operations are asynchronous to support non-blocking I/O, and every
/// time-bounded query takes a `since` parameter where `None` means "no
/// lower bound".
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to support concurrent access from
/// many handlers running in parallel.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Creates (or upserts, advancing `last_seen`) an entity for `asset`.
    async fn create_asset(&self, asset: Asset) -> Result<Entity, EngineError>;

    /// Creates a directed edge between two entities.
    async fn create_edge(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
        source_name: &str,
        confidence: u8,
    ) -> Result<Edge, EngineError>;

    /// Finds entities whose asset content matches `asset`, optionally
    /// bounded to those observed at or after `since`.
    async fn find_entity_by_content(
        &self,
        asset: &Asset,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Entity>, EngineError>;

    /// Finds a single entity by its identifier.
    async fn find_entity_by_id(&self, id: Uuid) -> Result<Option<Entity>, EngineError>;

    /// Lists edges leading out of `entity`, optionally filtered to the
    /// given relations and bounded by `since`.
    async fn outgoing_edges(
        &self,
        entity: Uuid,
        since: Option<DateTime<Utc>>,
        relations: &[Relation],
    ) -> Result<Vec<Edge>, EngineError>;

    /// Lists edges leading into `entity`, optionally filtered to the given
    /// relations and bounded by `since`.
    async fn incoming_edges(
        &self,
        entity: Uuid,
        since: Option<DateTime<Utc>>,
        relations: &[Relation],
    ) -> Result<Vec<Edge>, EngineError>;

    /// Attaches a free-form property to an entity.
    async fn create_entity_property(&self, entity: Uuid, property: EntityProperty) -> Result<(), EngineError>;

    /// Attaches a free-form property to an edge.
    async fn create_edge_property(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
        property: EdgeProperty,
    ) -> Result<(), EngineError>;

    /// Lists the tags recorded against the edge `(from, to, relation)`.
    async fn get_edge_tags(&self, from: Uuid, to: Uuid, relation: Relation) -> Result<Vec<EdgeTag>, EngineError>;
}
