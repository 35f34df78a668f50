// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event & Handler Contract
//!
//! `Event` is the unit of dispatch: an entity whose discovery should
//! trigger further collectors. `HandlerRegistration` and `CollectorPlugin`
//! are the registration-time and startup-time halves of the plugin contract.
//! All three live here rather than in `horizon-domain` because each
//! carries a live back-reference to the [`Dispatcher`] that owns it, which
//! would make the domain crate depend on the application crate if they were
//! moved down.

use crate::dispatcher::Dispatcher;
use crate::session::Session;
use horizon_domain::{AssetKind, EngineError, Entity};
use std::fmt;
use std::sync::Arc;

/// The unit of dispatch: an entity whose discovery should trigger
/// further collectors, carrying opaque per-handler metadata and a
/// back-reference to the dispatcher that will route it.
#[derive(Clone)]
pub struct Event {
    /// Human-readable label, used in log spans.
    pub name: String,
    /// The discovered entity this event carries.
    pub entity: Entity,
    /// Opaque per-handler data.
    pub meta: serde_json::Value,
    /// Back-reference stamped by the dispatcher on `dispatch_event`,
    /// so a handler can dispatch follow-on events without being
    /// handed a dispatcher explicitly.
    pub dispatcher: Arc<Dispatcher>,
    /// The session this event belongs to.
    pub session: Arc<Session>,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("entity", &self.entity)
            .field("meta", &self.meta)
            .field("session", &self.session.token)
            .finish_non_exhaustive()
    }
}

impl Event {
    pub fn asset_type(&self) -> AssetKind {
        self.entity.asset_type()
    }

    pub fn key(&self) -> String {
        self.entity.key()
    }
}

/// A registered callback consuming events of a specific asset kind.
///
/// Handlers are plain closures rather than a trait object hierarchy:
/// the payload types differ, so tagged variants suffice without a class
/// hierarchy.
pub type Handler = Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>;

/// The boxed future a [`Handler`] returns; handlers are async so they can
/// perform I/O without blocking a pipeline worker.
pub type HandlerFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), EngineError>> + Send>>;

/// A registration submitted to the [`crate::registry::Registry`].
#[derive(Clone)]
pub struct HandlerRegistration {
    /// The plugin that owns this handler, for logging and transformation
    /// checks.
    pub plugin: String,
    /// The handler's own name, used in per-event error logs.
    pub name: String,
    /// The asset kind this handler consumes; determines which pipeline it
    /// is grouped into.
    pub event_type: AssetKind,
    /// Asset kinds this handler may produce, matched against configured
    /// transformations (`EngineConfig::check_transformations`).
    pub transforms: Vec<AssetKind>,
    /// Lower runs earlier. Handlers sharing a priority within the same
    /// pipeline form one concurrent stage.
    pub priority: i32,
    /// Concurrency cap for this handler, enforced by a per-handler
    /// semaphore.
    pub max_instances: usize,
    pub callback: Handler,
}

impl fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("plugin", &self.plugin)
            .field("name", &self.name)
            .field("event_type", &self.event_type)
            .field("transforms", &self.transforms)
            .field("priority", &self.priority)
            .field("max_instances", &self.max_instances)
            .finish_non_exhaustive()
    }
}

impl HandlerRegistration {
    /// Validates the fields the registry rejects registration for: an
    /// empty name, a negative priority, or a zero concurrency cap.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidHandler(
                "handler name must not be empty".into(),
            ));
        }
        if self.priority < 0 {
            return Err(EngineError::InvalidHandler(format!(
                "handler {} has negative priority {}",
                self.name, self.priority
            )));
        }
        if self.max_instances < 1 {
            return Err(EngineError::InvalidHandler(format!(
                "handler {} has max_instances {} (must be >= 1)",
                self.name, self.max_instances
            )));
        }
        Ok(())
    }
}

/// A data-source plugin: `name()` for logging, `start()` to register
/// one or more handlers against the registry, `stop()` to release any
/// resources the plugin holds. Plugins are shut down in reverse
/// registration order.
#[async_trait::async_trait]
pub trait CollectorPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self, registry: &crate::registry::Registry) -> Result<(), EngineError>;

    async fn stop(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
