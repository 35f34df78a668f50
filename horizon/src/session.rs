// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session
//!
//! The per-discovery context (§3, §4.4): scope, configuration, the
//! per-session event-set, a cached repository wrapper, statistics, and a
//! termination signal. A `Session` is created by [`crate::session_manager::SessionManager`]
//! and threaded into every [`crate::event::Event`] and handler invocation.

use crate::asn_cache::AsnCache;
use crate::scope::Scope;
use horizon_domain::{Asset, EdgeProperty, EdgeTag, Entity, EntityProperty, Relation, Repository};
use horizon_domain::{EngineConfig, EngineError};
use parking_lot::Mutex as SyncMutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use uuid::Uuid;

/// Lock-guarded work-item counters (§3, §5).
///
/// Both counters are monotonically non-decreasing and
/// `completed <= total` always holds; increments happen under the same
/// lock so the invariant can never be observed broken mid-update.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub work_items_total: u64,
    pub work_items_completed: u64,
}

#[derive(Default)]
struct StatsCell(SyncMutex<Stats>);

impl StatsCell {
    fn snapshot(&self) -> Stats {
        *self.0.lock()
    }

    fn increment_total(&self) {
        self.0.lock().work_items_total += 1;
    }

    fn increment_completed(&self) {
        self.0.lock().work_items_completed += 1;
    }
}

/// The per-session set of already-dispatched entity keys (§3 invariant:
/// "per-session uniqueness of dispatch").
#[derive(Default)]
pub struct EventSet(SyncMutex<HashSet<String>>);

impl EventSet {
    pub fn has(&self, key: &str) -> bool {
        self.0.lock().contains(key)
    }

    /// Inserts `key`, returning `true` if it was newly inserted. Used
    /// atomically by the dispatcher so check-then-insert cannot race
    /// (§4.3 step 3).
    pub fn insert(&self, key: &str) -> bool {
        self.0.lock().insert(key.to_string())
    }
}

/// Serializes writes to the same entity key so upsert semantics (§5
/// "Session.Cache: ... serializes writes per entity key") hold even under
/// concurrent handlers.
#[derive(Default)]
struct KeyLocks(SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>);

impl KeyLocks {
    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.0
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// The cached repository wrapper handlers use for all graph mutations
/// (§4.4 `Cache()`), centralizing deduplication and property attachment so
/// individual collectors never talk to the repository directly (§4.8).
pub struct SessionCache {
    repository: Arc<dyn Repository>,
    key_locks: KeyLocks,
}

impl SessionCache {
    fn new(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            key_locks: KeyLocks::default(),
        }
    }

    pub async fn create_asset(&self, asset: Asset) -> Result<Entity, EngineError> {
        let lock = self.key_locks.lock_for(&asset.key());
        let _guard = lock.lock().await;
        self.repository.create_asset(asset).await
    }

    pub async fn create_entity_property(
        &self,
        entity: Uuid,
        property: EntityProperty,
    ) -> Result<(), EngineError> {
        self.repository.create_entity_property(entity, property).await
    }

    pub async fn create_edge(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
        source_name: &str,
        confidence: u8,
    ) -> Result<horizon_domain::Edge, EngineError> {
        self.repository
            .create_edge(from, to, relation, source_name, confidence)
            .await
    }

    pub async fn create_edge_property(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
        property: EdgeProperty,
    ) -> Result<(), EngineError> {
        self.repository.create_edge_property(from, to, relation, property).await
    }

    pub async fn find_entity_by_id(&self, id: Uuid) -> Result<Option<Entity>, EngineError> {
        self.repository.find_entity_by_id(id).await
    }

    pub async fn find_entity_by_content(
        &self,
        asset: &Asset,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<Entity>, EngineError> {
        self.repository.find_entity_by_content(asset, since).await
    }

    pub async fn outgoing_edges(
        &self,
        entity: Uuid,
        since: Option<chrono::DateTime<chrono::Utc>>,
        relations: &[Relation],
    ) -> Result<Vec<horizon_domain::Edge>, EngineError> {
        self.repository.outgoing_edges(entity, since, relations).await
    }

    pub async fn incoming_edges(
        &self,
        entity: Uuid,
        since: Option<chrono::DateTime<chrono::Utc>>,
        relations: &[Relation],
    ) -> Result<Vec<horizon_domain::Edge>, EngineError> {
        self.repository.incoming_edges(entity, since, relations).await
    }

    pub async fn get_edge_tags(
        &self,
        from: Uuid,
        to: Uuid,
        relation: Relation,
    ) -> Result<Vec<EdgeTag>, EngineError> {
        self.repository.get_edge_tags(from, to, relation).await
    }
}

/// The per-discovery context threaded into every event and handler (§3,
/// §4.4).
pub struct Session {
    pub token: Uuid,
    config: Arc<EngineConfig>,
    scope: Scope,
    cache: SessionCache,
    event_set: EventSet,
    asn_cache: AsnCache,
    stats: StatsCell,
    done: AtomicBool,
    done_notify: Notify,
}

impl Session {
    pub fn new(config: Arc<EngineConfig>, repository: Arc<dyn Repository>, asn_cache: AsnCache) -> Self {
        let scope = Scope::from_config(&config);
        Self {
            token: Uuid::new_v4(),
            config,
            scope,
            cache: SessionCache::new(repository),
            event_set: EventSet::default(),
            asn_cache,
            stats: StatsCell::default(),
            done: AtomicBool::new(false),
            done_notify: Notify::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn event_set(&self) -> &EventSet {
        &self.event_set
    }

    pub fn asn_cache(&self) -> &AsnCache {
        &self.asn_cache
    }

    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub(crate) fn record_total(&self) {
        self.stats.increment_total();
    }

    pub(crate) fn record_completed(&self) {
        self.stats.increment_completed();
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Marks the session terminated (§4.4 `CancelSession`). Idempotent;
    /// wakes every task blocked on [`Session::wait_for_done`].
    pub fn mark_done(&self) {
        if !self.done.swap(true, Ordering::SeqCst) {
            self.done_notify.notify_waiters();
        }
    }

    pub async fn wait_for_done(&self) {
        if self.is_done() {
            return;
        }
        self.done_notify.notified().await;
    }
}

#[cfg(test)]
impl Session {
    /// An in-memory session for use in unit tests elsewhere in this crate.
    pub fn new_for_test() -> Arc<Session> {
        use crate::infrastructure::memory_repository::MemoryRepository;
        let config = Arc::new(EngineConfig::default());
        let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
        Arc::new(Session::new(config, repo, AsnCache::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_set_insert_reports_first_occurrence_only() {
        let set = EventSet::default();
        assert!(set.insert("example.com"));
        assert!(!set.insert("example.com"));
        assert!(set.has("example.com"));
    }

    #[test]
    fn stats_start_at_zero_and_only_increase() {
        let cell = StatsCell::default();
        cell.increment_total();
        cell.increment_total();
        cell.increment_completed();
        let snap = cell.snapshot();
        assert_eq!(snap.work_items_total, 2);
        assert_eq!(snap.work_items_completed, 1);
    }

    #[tokio::test]
    async fn mark_done_wakes_waiters() {
        let session = Session::new_for_test();
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move {
                session.wait_for_done().await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        session.mark_done();
        tokio::time::timeout(std::time::Duration::from_millis(200), waiter)
            .await
            .expect("waiter should wake promptly")
            .unwrap();
    }
}
