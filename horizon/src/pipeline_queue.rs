// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineQueue
//!
//! A concurrent FIFO used as a pipeline's input source (§4.2). `append` is
//! non-blocking; `next` blocks until an element is present or cancellation
//! fires; `data` returns the next element whose session is still live,
//! silently dropping entries from terminated sessions (§4.2, §8 scenario 6).

use crate::event::Event;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// A queued unit of work plus the completion plumbing the dispatcher needs
/// once a pipeline finishes processing it (§4.3).
pub struct EventDataElement {
    pub event: Event,
    pub error: Mutex<Option<horizon_domain::EngineError>>,
}

impl EventDataElement {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            error: Mutex::new(None),
        }
    }

    pub fn set_error(&self, err: horizon_domain::EngineError) {
        *self.error.lock() = Some(err);
    }
}

/// The FIFO a pipeline reads from (§4.2). Optionally bounded (§9
/// "Back-pressure"): when `capacity` is set, `append` blocks until a slot
/// frees up rather than growing the queue without limit.
pub struct PipelineQueue {
    items: Mutex<VecDeque<Arc<EventDataElement>>>,
    notify: Notify,
    capacity: Option<Arc<Semaphore>>,
    len: AtomicUsize,
}

impl PipelineQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity: None,
            len: AtomicUsize::new(0),
        }
    }

    /// Bounds the queue to `capacity` in-flight elements; `append` then
    /// blocks (the documented back-pressure policy, §9) once full.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity: Some(Arc::new(Semaphore::new(capacity))),
            len: AtomicUsize::new(0),
        }
    }

    /// Appends `element`, blocking only if the queue is bounded and full.
    pub async fn append(&self, element: Arc<EventDataElement>) {
        let _permit = match &self.capacity {
            Some(sem) => Some(sem.clone().acquire_owned().await.expect("semaphore never closed")),
            None => None,
        };
        // The permit is intentionally leaked into the queue slot: it is
        // released when the element is popped in `data`.
        std::mem::forget(_permit);
        self.items.lock().push_back(element);
        self.len.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Blocks until at least one element is present or `cancel` fires.
    /// Returns `false` if cancellation won the race.
    pub async fn next(&self, cancel: &Notify) -> bool {
        if !self.items.lock().is_empty() {
            return true;
        }
        tokio::select! {
            _ = self.notify.notified() => true,
            _ = cancel.notified() => false,
        }
    }

    /// Pops the next element whose session has not terminated, dropping
    /// (and releasing the back-pressure slot of) any stale entries first.
    pub fn data(&self) -> Option<Arc<EventDataElement>> {
        loop {
            let popped = self.items.lock().pop_front();
            let element = popped?;
            self.len.fetch_sub(1, Ordering::SeqCst);
            if let Some(sem) = &self.capacity {
                sem.add_permits(1);
            }
            if !element.event.session.is_done() {
                return Some(element);
            }
            // Stale element from a terminated session: drop and keep looking.
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PipelineQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use horizon_domain::Asset;
    use std::sync::Arc;

    fn test_event(session: Arc<Session>) -> Event {
        use horizon_domain::assets::Fqdn;
        let asset = Asset::Fqdn(Fqdn::new("example.com"));
        let entity = horizon_domain::Entity::new(asset, chrono::Utc::now());
        Event {
            name: "seed".into(),
            entity,
            meta: serde_json::Value::Null,
            dispatcher: crate::dispatcher::Dispatcher::new_for_test(),
            session,
        }
    }

    #[tokio::test]
    async fn appended_elements_come_back_in_order() {
        let queue = PipelineQueue::new();
        let session = Session::new_for_test();
        let e1 = Arc::new(EventDataElement::new(test_event(session.clone())));
        let e2 = Arc::new(EventDataElement::new(test_event(session.clone())));
        queue.append(e1.clone()).await;
        queue.append(e2.clone()).await;
        assert_eq!(queue.len(), 2);
        let first = queue.data().unwrap();
        assert_eq!(first.event.key(), e1.event.key());
        let second = queue.data().unwrap();
        assert_eq!(second.event.key(), e2.event.key());
        assert!(queue.data().is_none());
    }

    #[tokio::test]
    async fn stale_session_elements_are_dropped() {
        let queue = PipelineQueue::new();
        let session = Session::new_for_test();
        let element = Arc::new(EventDataElement::new(test_event(session.clone())));
        queue.append(element).await;
        session.mark_done();
        assert!(queue.data().is_none());
        assert_eq!(
            queue.len(),
            0,
            "stale element must still be removed from the queue"
        );
    }

    #[tokio::test]
    async fn next_unblocks_on_cancel() {
        let queue = PipelineQueue::new();
        let cancel = Notify::new();
        cancel.notify_one();
        let ready = queue.next(&cancel).await;
        assert!(!ready, "cancellation with no data must report not-ready");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn bounded_queue_blocks_past_capacity() {
        let queue = Arc::new(PipelineQueue::bounded(1));
        let session = Session::new_for_test();
        let e1 = Arc::new(EventDataElement::new(test_event(session.clone())));
        queue.append(e1).await;

        let queue2 = queue.clone();
        let session2 = session.clone();
        let e2 = Arc::new(EventDataElement::new(test_event(session2)));
        let append_task = tokio::spawn(async move {
            queue2.append(e2).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(
            !append_task.is_finished(),
            "second append should block while the single slot is occupied"
        );
        queue.data();
        append_task.await.unwrap();
    }
}
