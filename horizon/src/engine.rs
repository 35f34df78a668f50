// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine composition root
//!
//! The manager, dispatcher, and registry are engine-scoped: the engine
//! value owns them for the rest of the process's life. This module
//! supplies the construction API for that: an `EngineBuilder` that starts
//! collector plugins against a `Registry`, then an `Engine` that owns the
//! built `Registry`, `Dispatcher`, and `SessionManager`.

use crate::dispatcher::Dispatcher;
use crate::event::CollectorPlugin;
use crate::registry::Registry;
use crate::session_manager::SessionManager;
use horizon_domain::{EngineError, Repository};
use std::sync::Arc;

/// Starts plugins against a fresh [`Registry`] and, once every plugin has
/// registered its handlers, builds the pipelines and wires up the
/// [`Dispatcher`] and [`SessionManager`] into a running [`Engine`].
pub struct EngineBuilder {
    registry: Registry,
    plugins: Vec<Arc<dyn CollectorPlugin>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            plugins: Vec::new(),
        }
    }

    /// Registers `plugin` to be started when [`EngineBuilder::build`]
    /// runs. Plugins are started in the order added and stopped in
    /// reverse order on shutdown.
    pub fn with_plugin(mut self, plugin: Arc<dyn CollectorPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Starts every plugin (each registers its handlers via
    /// `registry.register_handler`), builds the pipelines, and returns a
    /// running [`Engine`]. A plugin start failure or a pipeline build
    /// failure aborts startup.
    pub async fn build(self, repository: Arc<dyn Repository>) -> Result<Engine, EngineError> {
        for plugin in &self.plugins {
            plugin.start(&self.registry).await?;
        }
        self.registry.build_pipelines()?;
        let registry = Arc::new(self.registry);
        let dispatcher = Dispatcher::new(registry.clone());
        let session_manager = Arc::new(SessionManager::new(repository));
        Ok(Engine {
            registry,
            dispatcher,
            session_manager,
            plugins: self.plugins,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The composition root: owns a `Registry`, `Dispatcher`, and
/// `SessionManager` for the engine's lifetime.
pub struct Engine {
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    session_manager: Arc<SessionManager>,
    plugins: Vec<Arc<dyn CollectorPlugin>>,
}

impl Engine {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session_manager
    }

    /// Tears the engine down in order: dispatcher, then session
    /// manager, then plugins in reverse registration order.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        self.session_manager.shutdown();
        for plugin in self.plugins.iter().rev() {
            if let Err(err) = plugin.stop().await {
                tracing::warn!(plugin = plugin.name(), error = %err, "plugin failed to stop cleanly");
            }
        }
    }
}
