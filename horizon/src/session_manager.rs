// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SessionManager
//!
//! Owns the set of active sessions keyed by token (§2, §4.4): creates and
//! tears them down, and cancels everything on engine shutdown.

use crate::asn_cache::AsnCache;
use crate::session::Session;
use horizon_domain::{EngineConfig, Repository};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The manager contract of §4.4: `new_session`, `get_session`,
/// `cancel_session`, `shutdown`.
pub struct SessionManager {
    repository: Arc<dyn Repository>,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a session over `config`, returning its token alongside the
    /// session itself (§4.4 `NewSession`).
    pub fn new_session(&self, config: EngineConfig) -> (Uuid, Arc<Session>) {
        let session = Arc::new(Session::new(Arc::new(config), self.repository.clone(), AsnCache::new()));
        let token = session.token;
        self.sessions.write().insert(token, session.clone());
        (token, session)
    }

    pub fn get_session(&self, token: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().get(&token).cloned()
    }

    /// Marks the session done; pipelines drop its in-flight work on their
    /// next `data()` call (§4.4 `CancelSession`, §4.2).
    pub fn cancel_session(&self, token: Uuid) -> bool {
        match self.sessions.read().get(&token) {
            Some(session) => {
                session.mark_done();
                true
            }
            None => false,
        }
    }

    /// Cancels every session and releases the manager's bookkeeping
    /// (§4.4 `Shutdown`, §6 shutdown order).
    pub fn shutdown(&self) {
        let sessions = self.sessions.write();
        for session in sessions.values() {
            session.mark_done();
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_repository::MemoryRepository;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryRepository::new()))
    }

    #[test]
    fn new_session_is_retrievable_by_token() {
        let manager = manager();
        let (token, session) = manager.new_session(EngineConfig::default());
        let found = manager.get_session(token).unwrap();
        assert_eq!(found.token, session.token);
    }

    #[test]
    fn cancel_session_marks_it_done() {
        let manager = manager();
        let (token, session) = manager.new_session(EngineConfig::default());
        assert!(!session.is_done());
        assert!(manager.cancel_session(token));
        assert!(session.is_done());
    }

    #[test]
    fn shutdown_cancels_every_session() {
        let manager = manager();
        let (_, s1) = manager.new_session(EngineConfig::default());
        let (_, s2) = manager.new_session(EngineConfig::default());
        manager.shutdown();
        assert!(s1.is_done());
        assert!(s2.is_done());
    }

    #[test]
    fn unknown_token_cancel_is_a_no_op() {
        let manager = manager();
        assert!(!manager.cancel_session(Uuid::new_v4()));
    }
}
