// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Error
//!
//! A single, flat, `Clone`-able error enum for the whole engine, in the
//! style the teacher favors: one descriptive variant per failure mode
//! rather than a hierarchy of nested error types.
//!
//! Variants map one-for-one onto the error kinds of the dispatch subsystem:
//! registry build failures are fatal at startup, dispatch failures drop the
//! offending event, and handler/repository/queue failures are local to the
//! caller and never abort a pipeline.

use thiserror::Error;

/// All errors the dispatch, session, and pipeline subsystem can raise.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Raised by `Registry::register_handler` when a handler registration is
    /// malformed (no callback, empty event type, negative priority, or
    /// `max_instances < 1`). Fatal at startup.
    #[error("invalid handler registration: {0}")]
    InvalidHandler(String),

    /// `Registry::build_pipelines` was called a second time.
    #[error("registry already built")]
    AlreadyBuilt,

    /// No pipeline is registered for the given asset kind.
    #[error("no pipeline registered for asset kind {0:?}")]
    NoPipelineForType(crate::assets::AssetKind),

    /// `Dispatcher::dispatch_event` was given a `None` entity/asset.
    #[error("event carries no entity")]
    NoEntity,

    /// `Dispatcher::dispatch_event` was given an event with no session.
    #[error("event carries no session")]
    NoSession,

    /// The event's session has already been marked done.
    #[error("session {0} has been terminated")]
    SessionTerminated(uuid::Uuid),

    /// The event's entity key is already present in the session's event set.
    #[error("entity already processed for this session")]
    AlreadyProcessed,

    /// A handler callback returned an error while processing an event.
    #[error("handler {handler} failed: {source}")]
    HandlerFailure { handler: String, source: String },

    /// The repository returned an error while a handler mutated the graph.
    #[error("repository error: {0}")]
    RepositoryError(String),

    /// The persistent work queue's I/O failed.
    #[error("persistent queue error: {0}")]
    QueueIoError(String),

    /// Configuration failed to load or did not validate.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::QueueIoError(e.to_string())
    }
}
