// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatcher
//!
//! Validates events, dedupes per session, enqueues into the right
//! pipeline, and collects completions. One worker task per pipeline
//! drains its `PipelineQueue`; each popped element is handed to its own
//! spawned task so that many events of the same asset kind run
//! concurrently, with each handler's own `max_instances` semaphore
//! (`registry.rs`'s `Stage::run`) the only thing gating how many
//! invocations of *that* handler are in flight at once — exactly the
//! per-handler concurrency cap of §4.1/§5. A single completion collector
//! task increments session stats and logs any handler failure once a
//! pipeline finishes with an event, driven by both a signal and a 100 ms
//! ticker so bursty producers can never stall completion accounting.

use crate::event::Event;
use crate::pipeline_queue::EventDataElement;
use crate::registry::Registry;
use crate::session::Session;
use horizon_domain::{Entity, EngineError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};

/// Everything needed to construct an [`Event`] except the dispatcher
/// back-reference, which `dispatch_event` stamps in.
pub struct EventRequest {
    pub name: String,
    pub entity: Entity,
    pub meta: serde_json::Value,
    pub session: Arc<Session>,
}

struct CompletionQueue {
    items: Mutex<VecDeque<Arc<EventDataElement>>>,
    notify: Notify,
}

impl CompletionQueue {
    fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    fn push(&self, element: Arc<EventDataElement>) {
        self.items.lock().push_back(element);
        self.notify.notify_one();
    }

    fn drain(&self) -> Vec<Arc<EventDataElement>> {
        self.items.lock().drain(..).collect()
    }
}

/// Routes events to pipelines and collects completions.
pub struct Dispatcher {
    registry: Arc<Registry>,
    completions: Arc<CompletionQueue>,
    cancel: Arc<Notify>,
    shut_down: AtomicBool,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Builds a dispatcher over an already-`build_pipelines`-ed registry
    /// and spawns one worker task per pipeline plus the completion
    /// collector.
    pub fn new(registry: Arc<Registry>) -> Arc<Self> {
        let dispatcher = Arc::new(Self {
            registry,
            completions: Arc::new(CompletionQueue::new()),
            cancel: Arc::new(Notify::new()),
            shut_down: AtomicBool::new(false),
            worker_handles: Mutex::new(Vec::new()),
        });
        dispatcher.spawn_workers();
        dispatcher
    }

    fn spawn_workers(self: &Arc<Self>) {
        let mut handles = Vec::new();
        for pipeline in self.registry.pipelines() {
            let cancel = self.cancel.clone();
            let completions = self.completions.clone();
            handles.push(tokio::spawn(async move {
                // Each popped element is processed in its own spawned task
                // so that many events of this asset kind run concurrently;
                // the per-handler semaphores acquired inside
                // `AssetPipeline::process` are what actually bound how many
                // invocations of any one handler run at a time, not this
                // loop. `in_flight` is drained after cancellation so
                // shutdown still waits for everything already popped.
                let mut in_flight = JoinSet::new();
                loop {
                    if !pipeline.queue.next(&cancel).await {
                        break;
                    }
                    while let Some(element) = pipeline.queue.data() {
                        let pipeline = pipeline.clone();
                        let completions = completions.clone();
                        in_flight.spawn(async move {
                            pipeline.process(&element).await;
                            completions.push(element);
                        });
                    }
                }
                while in_flight.join_next().await.is_some() {}
            }));
        }
        let completions = self.completions.clone();
        let cancel = self.cancel.clone();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = completions.notify.notified() => {}
                    _ = ticker.tick() => {}
                    _ = cancel.notified() => {
                        Self::drain_completions(&completions);
                        break;
                    }
                }
                Self::drain_completions(&completions);
            }
        }));
        *self.worker_handles.lock() = handles;
    }

    /// Consumes each completed element's stored error (if any), logging it
    /// at `Error` level under a group named after the event (§4.3 step 6,
    /// §4.9: "logs it at Error level under a group named after the
    /// event"), then records the work item as completed regardless —
    /// a handler failure never aborts the pipeline or the accounting.
    fn drain_completions(completions: &CompletionQueue) {
        for element in completions.drain() {
            if let Some(err) = element.error.lock().take() {
                let handler = match &err {
                    EngineError::HandlerFailure { handler, .. } => handler.as_str(),
                    _ => "unknown",
                };
                tracing::error!(
                    handler = %handler,
                    entity_key = %element.event.key(),
                    session_token = %element.event.session.token,
                    error = %err,
                    "handler failed"
                );
            }
            element.event.session.record_completed();
        }
    }

    /// Validates `request`, dedupes against the session's event-set,
    /// resolves the destination pipeline, and enqueues.
    pub async fn dispatch_event(self: &Arc<Self>, request: EventRequest) -> Result<(), EngineError> {
        if request.session.is_done() {
            return Err(EngineError::SessionTerminated(request.session.token));
        }

        let pipeline = self.registry.get_pipeline(request.entity.asset_type())?;

        let key = request.entity.key();
        if !request.session.event_set().insert(&key) {
            return Err(EngineError::AlreadyProcessed);
        }

        let event = Event {
            name: request.name,
            entity: request.entity,
            meta: request.meta,
            dispatcher: self.clone(),
            session: request.session.clone(),
        };
        request.session.record_total();

        let element = Arc::new(EventDataElement::new(event));
        pipeline.queue.append(element).await;
        Ok(())
    }

    /// Idempotent: signals cancellation to every pipeline worker
    /// and the completion collector, then performs a final synchronous
    /// drain of whatever completions are still queued.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.notify_waiters();
        let handles: Vec<_> = self.worker_handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        Self::drain_completions(&self.completions);
    }
}

#[cfg(test)]
impl Dispatcher {
    /// A dispatcher over an empty, already-built registry, for tests
    /// that only need a back-reference to populate an [`Event`].
    pub fn new_for_test() -> Arc<Self> {
        let registry = Arc::new(Registry::new());
        registry.build_pipelines().expect("empty registry builds cleanly");
        Dispatcher::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HandlerRegistration;
    use horizon_domain::assets::Fqdn;
    use horizon_domain::{Asset, AssetKind};

    fn noop_handler(name: &str, priority: i32) -> HandlerRegistration {
        HandlerRegistration {
            plugin: "test".into(),
            name: name.into(),
            event_type: AssetKind::Fqdn,
            transforms: vec![],
            priority,
            max_instances: 4,
            callback: Arc::new(|_event| Box::pin(async { Ok(()) })),
        }
    }

    fn seed_request(session: Arc<Session>, name: &str) -> EventRequest {
        EventRequest {
            name: "seed".into(),
            entity: Entity::new(Asset::Fqdn(Fqdn::new(name)), chrono::Utc::now()),
            meta: serde_json::Value::Null,
            session,
        }
    }

    #[tokio::test]
    async fn duplicate_fqdn_case_insensitive_is_deduped() {
        let registry = Arc::new(Registry::new());
        registry.register_handler(noop_handler("h", 0)).unwrap();
        registry.build_pipelines().unwrap();
        let dispatcher = Dispatcher::new(registry);
        let session = Session::new_for_test();

        dispatcher
            .dispatch_event(seed_request(session.clone(), "Example.com"))
            .await
            .unwrap();
        let second = dispatcher
            .dispatch_event(seed_request(session.clone(), "example.com"))
            .await;
        assert!(matches!(second, Err(EngineError::AlreadyProcessed)));

        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        assert_eq!(session.stats().work_items_total, 1);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn event_for_unregistered_kind_is_rejected() {
        let registry = Arc::new(Registry::new());
        registry.build_pipelines().unwrap();
        let dispatcher = Dispatcher::new(registry);
        let session = Session::new_for_test();
        let result = dispatcher.dispatch_event(seed_request(session, "example.com")).await;
        assert!(matches!(result, Err(EngineError::NoPipelineForType(AssetKind::Fqdn))));
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn terminated_session_rejects_new_dispatch() {
        let registry = Arc::new(Registry::new());
        registry.register_handler(noop_handler("h", 0)).unwrap();
        registry.build_pipelines().unwrap();
        let dispatcher = Dispatcher::new(registry);
        let session = Session::new_for_test();
        session.mark_done();
        let result = dispatcher.dispatch_event(seed_request(session, "example.com")).await;
        assert!(matches!(result, Err(EngineError::SessionTerminated(_))));
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn handler_failure_still_counts_as_completed() {
        let registry = Arc::new(Registry::new());
        let failing = HandlerRegistration {
            plugin: "test".into(),
            name: "fails".into(),
            event_type: AssetKind::Fqdn,
            transforms: vec![],
            priority: 0,
            max_instances: 4,
            callback: Arc::new(|_event| {
                Box::pin(async { Err(EngineError::InvalidConfiguration("boom".into())) })
            }),
        };
        registry.register_handler(failing).unwrap();
        registry.build_pipelines().unwrap();
        let dispatcher = Dispatcher::new(registry);
        let session = Session::new_for_test();

        for i in 0..3 {
            dispatcher
                .dispatch_event(seed_request(session.clone(), &format!("host{i}.example.com")))
                .await
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let stats = session.stats();
        assert_eq!(stats.work_items_total, 3);
        assert_eq!(stats.work_items_completed, 3);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn terminating_session_drops_in_flight_work() {
        // Exercises session termination at the level it is actually guaranteed:
        // once a session is marked done, every subsequent `data()` pop off
        // its pipeline queue returns nothing, regardless of how much was
        // enqueued before termination. Driving this through the
        // `Dispatcher`'s spawned workers would race the background task
        // against `mark_done`; asserting directly against the queue is
        // deterministic.
        let registry = Arc::new(Registry::new());
        registry.register_handler(noop_handler("h", 0)).unwrap();
        registry.build_pipelines().unwrap();
        let pipeline = registry.get_pipeline(AssetKind::Fqdn).unwrap();
        let session = Session::new_for_test();

        for i in 0..100 {
            let event = Event {
                name: "seed".into(),
                entity: Entity::new(
                    Asset::Fqdn(Fqdn::new(format!("host{i}.example.com"))),
                    chrono::Utc::now(),
                ),
                meta: serde_json::Value::Null,
                dispatcher: Dispatcher::new_for_test(),
                session: session.clone(),
            };
            pipeline.queue.append(Arc::new(EventDataElement::new(event))).await;
        }
        assert_eq!(pipeline.queue.len(), 100);

        session.mark_done();
        let mut drained = 0;
        while pipeline.queue.data().is_some() {
            drained += 1;
        }
        assert_eq!(
            drained, 0,
            "pipeline queue must drop every entry once its session is done"
        );
        assert_eq!(pipeline.queue.len(), 0, "stale entries are still removed from the queue");
    }

    /// A `max_instances = 1` handler's semaphore must serialize it: even
    /// with several events queued at once, only one invocation should ever
    /// be in flight.
    #[tokio::test]
    async fn max_instances_one_serializes_handler_invocations() {
        use std::sync::atomic::AtomicUsize;

        let registry = Arc::new(Registry::new());
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let current_cb = current.clone();
        let max_seen_cb = max_seen.clone();
        registry
            .register_handler(HandlerRegistration {
                plugin: "test".into(),
                name: "serial".into(),
                event_type: AssetKind::Fqdn,
                transforms: vec![],
                priority: 0,
                max_instances: 1,
                callback: Arc::new(move |_event| {
                    let current = current_cb.clone();
                    let max_seen = max_seen_cb.clone();
                    Box::pin(async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                }),
            })
            .unwrap();
        registry.build_pipelines().unwrap();
        let dispatcher = Dispatcher::new(registry);
        let session = Session::new_for_test();

        for i in 0..5 {
            dispatcher
                .dispatch_event(seed_request(session.clone(), &format!("host{i}.example.com")))
                .await
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        assert_eq!(
            max_seen.load(Ordering::SeqCst),
            1,
            "max_instances=1 must never let two invocations of the same handler overlap"
        );
        assert_eq!(session.stats().work_items_completed, 5);
        dispatcher.shutdown().await;
    }

    /// A `max_instances = N` handler must actually let up to `N`
    /// invocations overlap — the semaphore bounds concurrency, it does not
    /// serialize it away entirely.
    #[tokio::test]
    async fn max_instances_n_allows_concurrent_handler_invocations() {
        use std::sync::atomic::AtomicUsize;

        let registry = Arc::new(Registry::new());
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let max_instances = 3usize;
        let current_cb = current.clone();
        let max_seen_cb = max_seen.clone();
        registry
            .register_handler(HandlerRegistration {
                plugin: "test".into(),
                name: "bounded".into(),
                event_type: AssetKind::Fqdn,
                transforms: vec![],
                priority: 0,
                max_instances,
                callback: Arc::new(move |_event| {
                    let current = current_cb.clone();
                    let max_seen = max_seen_cb.clone();
                    Box::pin(async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                }),
            })
            .unwrap();
        registry.build_pipelines().unwrap();
        let dispatcher = Dispatcher::new(registry);
        let session = Session::new_for_test();

        for i in 0..9 {
            dispatcher
                .dispatch_event(seed_request(session.clone(), &format!("host{i}.example.com")))
                .await
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert_eq!(
            max_seen.load(Ordering::SeqCst),
            max_instances,
            "max_instances={max_instances} should let exactly that many invocations overlap given enough concurrent work"
        );
        assert_eq!(session.stats().work_items_completed, 9);
        dispatcher.shutdown().await;
    }

    /// The completion collector, not `AssetPipeline::process`, is
    /// responsible for consuming a failed element's stored error: once
    /// drained, the slot must be empty so the same failure is never
    /// reported twice.
    #[tokio::test]
    async fn drain_completions_consumes_the_stored_handler_error() {
        let registry = Arc::new(Registry::new());
        registry
            .register_handler(HandlerRegistration {
                plugin: "test".into(),
                name: "fails".into(),
                event_type: AssetKind::Fqdn,
                transforms: vec![],
                priority: 0,
                max_instances: 1,
                callback: Arc::new(|_event| {
                    Box::pin(async { Err(EngineError::InvalidConfiguration("boom".into())) })
                }),
            })
            .unwrap();
        registry.build_pipelines().unwrap();
        let pipeline = registry.get_pipeline(AssetKind::Fqdn).unwrap();
        let session = Session::new_for_test();
        let event = Event {
            name: "seed".into(),
            entity: Entity::new(Asset::Fqdn(Fqdn::new("example.com")), chrono::Utc::now()),
            meta: serde_json::Value::Null,
            dispatcher: Dispatcher::new_for_test(),
            session: session.clone(),
        };
        let element = Arc::new(EventDataElement::new(event));
        pipeline.process(&element).await;
        assert!(element.error.lock().is_some(), "process() must record the handler failure");

        let completions = CompletionQueue::new();
        completions.push(element.clone());
        Dispatcher::drain_completions(&completions);
        assert!(
            element.error.lock().is_none(),
            "drain_completions must take the stored error so it is reported exactly once"
        );
    }
}
