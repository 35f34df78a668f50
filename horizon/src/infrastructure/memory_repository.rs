// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-memory Repository
//!
//! The `memory` `GraphSystem` backend (§6) and the implementation the
//! crate's own tests build sessions over (`repository.rs`'s doc comment:
//! "An in-memory implementation is used for tests"). A real deployment
//! plugs in a durable graph store behind the same [`Repository`] trait;
//! this one keeps everything in a lock-guarded `HashMap`.
//!
//! `GetEdgeTags` has no paired creator in the narrow port (§4.4 only lists
//! `CreateEdgeProperty`, not `CreateEdgeTag`): this implementation treats
//! an edge property named `"tag"` as the tag creator, and `get_edge_tags`
//! projects those properties back out. See `DESIGN.md` for the rationale.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use horizon_domain::{Asset, Edge, EdgeProperty, EdgeTag, Entity, EntityProperty, EngineError, Relation, Repository};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    entities: HashMap<Uuid, Entity>,
    by_key: HashMap<String, Uuid>,
    edges: Vec<Edge>,
    entity_properties: HashMap<Uuid, Vec<EntityProperty>>,
    edge_properties: HashMap<(Uuid, Uuid, Relation), Vec<EdgeProperty>>,
}

pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_asset(&self, asset: Asset) -> Result<Entity, EngineError> {
        let now = Utc::now();
        let key = asset.key();
        let mut inner = self.inner.lock();
        if let Some(id) = inner.by_key.get(&key).copied() {
            let entity = inner.entities.get_mut(&id).expect("by_key entry without entity");
            entity.observe(now);
            return Ok(entity.clone());
        }
        let entity = Entity::new(asset, now);
        let id = entity.id;
        inner.entities.insert(id, entity.clone());
        inner.by_key.insert(key, id);
        Ok(entity)
    }

    async fn create_edge(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
        source_name: &str,
        confidence: u8,
    ) -> Result<Edge, EngineError> {
        let edge = Edge {
            from,
            to,
            relation,
            source: horizon_domain::SourceProperty {
                name: source_name.to_string(),
                confidence,
            },
        };
        self.inner.lock().edges.push(edge.clone());
        Ok(edge)
    }

    async fn find_entity_by_content(
        &self,
        asset: &Asset,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Entity>, EngineError> {
        let inner = self.inner.lock();
        let key = asset.key();
        Ok(inner
            .by_key
            .get(&key)
            .and_then(|id| inner.entities.get(id))
            .filter(|e| since.is_none_or(|since| e.last_seen >= since))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn find_entity_by_id(&self, id: Uuid) -> Result<Option<Entity>, EngineError> {
        Ok(self.inner.lock().entities.get(&id).cloned())
    }

    async fn outgoing_edges(
        &self,
        entity: Uuid,
        _since: Option<DateTime<Utc>>,
        relations: &[Relation],
    ) -> Result<Vec<Edge>, EngineError> {
        let inner = self.inner.lock();
        Ok(inner
            .edges
            .iter()
            .filter(|e| e.from == entity && (relations.is_empty() || relations.contains(&e.relation)))
            .cloned()
            .collect())
    }

    async fn incoming_edges(
        &self,
        entity: Uuid,
        _since: Option<DateTime<Utc>>,
        relations: &[Relation],
    ) -> Result<Vec<Edge>, EngineError> {
        let inner = self.inner.lock();
        Ok(inner
            .edges
            .iter()
            .filter(|e| e.to == entity && (relations.is_empty() || relations.contains(&e.relation)))
            .cloned()
            .collect())
    }

    async fn create_entity_property(&self, entity: Uuid, property: EntityProperty) -> Result<(), EngineError> {
        self.inner.lock().entity_properties.entry(entity).or_default().push(property);
        Ok(())
    }

    async fn create_edge_property(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
        property: EdgeProperty,
    ) -> Result<(), EngineError> {
        self.inner
            .lock()
            .edge_properties
            .entry((from, to, relation))
            .or_default()
            .push(property);
        Ok(())
    }

    async fn get_edge_tags(&self, from: Uuid, to: Uuid, relation: Relation) -> Result<Vec<EdgeTag>, EngineError> {
        let inner = self.inner.lock();
        Ok(inner
            .edge_properties
            .get(&(from, to, relation))
            .into_iter()
            .flatten()
            .filter(|p| p.name == "tag")
            .map(|p| EdgeTag { name: p.value.clone() })
            .collect())
    }
}
