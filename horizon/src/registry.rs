// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Registry & AssetPipeline
//!
//! The `Registry` accepts handler registrations and, once `build_pipelines`
//! is called, groups them by asset kind into one [`AssetPipeline`] per kind.
//! Each pipeline is an ordered sequence of `Stage`s — handlers
//! sharing a priority run concurrently within a stage, and stage `i`
//! finishes before stage `i+1` begins for the same event.

use crate::event::HandlerRegistration;
use crate::pipeline_queue::{EventDataElement, PipelineQueue};
use horizon_domain::{AssetKind, EngineError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A group of same-priority handlers, run concurrently, each bounded by
/// its own `max_instances` semaphore.
pub struct Stage {
    pub priority: i32,
    handlers: Vec<(HandlerRegistration, Arc<Semaphore>)>,
}

impl Stage {
    /// Runs every handler in this stage against `event`, in parallel,
    /// waiting for all of them before returning (the caller enforces
    /// stage ordering by awaiting each `Stage::run` in sequence). A
    /// handler error does not stop its siblings; it is reported back for
    /// the dispatcher to log.
    async fn run(&self, event: crate::event::Event) -> Vec<(String, Result<(), EngineError>)> {
        let futures = self.handlers.iter().map(|(registration, semaphore)| {
            let event = event.clone();
            let semaphore = semaphore.clone();
            let callback = registration.callback.clone();
            let name = registration.name.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("handler semaphore is never closed");
                let result = callback(event).await;
                (name, result)
            }
        });
        futures::future::join_all(futures).await
    }
}

/// The compiled pipeline for one asset kind: an
/// ordered list of stages plus the `PipelineQueue` that feeds it.
pub struct AssetPipeline {
    pub asset_kind: AssetKind,
    stages: Vec<Stage>,
    pub queue: PipelineQueue,
}

impl AssetPipeline {
    /// Runs every stage of `element`'s event in priority order, returning
    /// once the final stage has completed. This is what makes stage `i`
    /// finish before stage `i+1` begins for the same event:
    /// stages are awaited sequentially, not spawned independently.
    ///
    /// A handler error is recorded on `element` rather than logged here:
    /// logging a handler failure under its event's group is the
    /// completion collector's job (§4.3 step 6), once the element reaches
    /// `Dispatcher::drain_completions` — this method only ever decides
    /// *whether* there was a failure, never how it's surfaced.
    pub async fn process(&self, element: &EventDataElement) {
        for stage in &self.stages {
            let results = stage.run(element.event.clone()).await;
            for (handler_name, result) in results {
                if let Err(err) = result {
                    element.set_error(EngineError::HandlerFailure {
                        handler: handler_name,
                        source: err.to_string(),
                    });
                }
            }
        }
    }
}

/// Accepts handler registrations, then builds one pipeline per asset kind
/// with at least one handler.
pub struct Registry {
    pending: parking_lot::Mutex<Vec<HandlerRegistration>>,
    built: AtomicBool,
    pipelines: parking_lot::RwLock<HashMap<AssetKind, Arc<AssetPipeline>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            pending: parking_lot::Mutex::new(Vec::new()),
            built: AtomicBool::new(false),
            pipelines: parking_lot::RwLock::new(HashMap::new()),
        }
    }

    /// Accepts a handler registration; rejects malformed registrations
    /// and registrations submitted after `build_pipelines` has run.
    pub fn register_handler(&self, registration: HandlerRegistration) -> Result<(), EngineError> {
        if self.built.load(Ordering::SeqCst) {
            return Err(EngineError::AlreadyBuilt);
        }
        registration.validate()?;
        self.pending.lock().push(registration);
        Ok(())
    }

    /// Groups pending registrations by asset kind, sorts each group by
    /// priority ascending, and buckets equal priorities into stages.
    /// After this call, no further registrations are accepted.
    pub fn build_pipelines(&self) -> Result<(), EngineError> {
        if self.built.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyBuilt);
        }
        let mut by_kind: HashMap<AssetKind, Vec<HandlerRegistration>> = HashMap::new();
        for registration in self.pending.lock().drain(..) {
            by_kind.entry(registration.event_type).or_default().push(registration);
        }

        let mut pipelines = self.pipelines.write();
        for (kind, mut handlers) in by_kind {
            handlers.sort_by_key(|h| h.priority);
            let mut stages: Vec<Stage> = Vec::new();
            for handler in handlers {
                let semaphore = Arc::new(Semaphore::new(handler.max_instances));
                match stages.last_mut() {
                    Some(stage) if stage.priority == handler.priority => {
                        stage.handlers.push((handler, semaphore));
                    }
                    _ => stages.push(Stage {
                        priority: handler.priority,
                        handlers: vec![(handler, semaphore)],
                    }),
                }
            }
            pipelines.insert(
                kind,
                Arc::new(AssetPipeline {
                    asset_kind: kind,
                    stages,
                    queue: PipelineQueue::new(),
                }),
            );
        }
        Ok(())
    }

    pub fn get_pipeline(&self, kind: AssetKind) -> Result<Arc<AssetPipeline>, EngineError> {
        self.pipelines
            .read()
            .get(&kind)
            .cloned()
            .ok_or(EngineError::NoPipelineForType(kind))
    }

    pub fn pipelines(&self) -> Vec<Arc<AssetPipeline>> {
        self.pipelines.read().values().cloned().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use horizon_domain::Entity;
    use std::sync::atomic::AtomicUsize;

    fn registration(
        name: &str,
        priority: i32,
        log: Arc<parking_lot::Mutex<Vec<String>>>,
    ) -> HandlerRegistration {
        let name_owned = name.to_string();
        HandlerRegistration {
            plugin: "test-plugin".into(),
            name: name.into(),
            event_type: AssetKind::Fqdn,
            transforms: vec![],
            priority,
            max_instances: 4,
            callback: Arc::new(move |_event| {
                let log = log.clone();
                let name = name_owned.clone();
                Box::pin(async move {
                    log.lock().push(name);
                    Ok(())
                })
            }),
        }
    }

    #[test]
    fn invalid_handler_rejected_before_build() {
        let registry = Registry::new();
        let bad = HandlerRegistration {
            plugin: "p".into(),
            name: "".into(),
            event_type: AssetKind::Fqdn,
            transforms: vec![],
            priority: 0,
            max_instances: 1,
            callback: Arc::new(|_| Box::pin(async { Ok(()) })),
        };
        assert!(matches!(
            registry.register_handler(bad),
            Err(EngineError::InvalidHandler(_))
        ));
    }

    #[test]
    fn double_build_errors_already_built() {
        let registry = Registry::new();
        registry.build_pipelines().unwrap();
        assert!(matches!(registry.build_pipelines(), Err(EngineError::AlreadyBuilt)));
    }

    #[test]
    fn registration_after_build_is_rejected() {
        let registry = Registry::new();
        registry.build_pipelines().unwrap();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        assert!(matches!(
            registry.register_handler(registration("late", 0, log)),
            Err(EngineError::AlreadyBuilt)
        ));
    }

    #[tokio::test]
    async fn same_priority_handlers_form_one_concurrent_stage() {
        let registry = Registry::new();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        registry.register_handler(registration("a", 1, log.clone())).unwrap();
        registry.register_handler(registration("b", 1, log.clone())).unwrap();
        registry.register_handler(registration("c", 5, log.clone())).unwrap();
        registry.build_pipelines().unwrap();
        let pipeline = registry.get_pipeline(AssetKind::Fqdn).unwrap();
        assert_eq!(pipeline.stages.len(), 2, "priorities 1 and 5 form two stages");
        assert_eq!(pipeline.stages[0].handlers.len(), 2);
        assert_eq!(pipeline.stages[1].handlers.len(), 1);

        let session = Session::new_for_test();
        let event = crate::event::Event {
            name: "seed".into(),
            entity: Entity::new(
                horizon_domain::Asset::Fqdn(horizon_domain::assets::Fqdn::new("example.com")),
                chrono::Utc::now(),
            ),
            meta: serde_json::Value::Null,
            dispatcher: crate::dispatcher::Dispatcher::new_for_test(),
            session,
        };
        let element = EventDataElement::new(event);
        pipeline.process(&element).await;
        let order = log.lock().clone();
        assert_eq!(order.len(), 3);
        assert_eq!(
            &order[2], "c",
            "priority-5 handler must run only after both priority-1 handlers"
        );
        assert_eq!(
            { AtomicUsize::new(order.iter().filter(|n| n.as_str() == "c").count()) }.into_inner(),
            1
        );
    }
}
