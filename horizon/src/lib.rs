// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Horizon Engine
//!
//! The event dispatch, session, and collector-pipeline subsystem that
//! turns a scope into a running, backpressured, deduplicated discovery
//! workflow.
//!
//! ## Module Structure
//!
//! - [`registry`] — `Registry` and `AssetPipeline`: accepts handler
//!   registrations, then builds one priority-staged pipeline per asset
//!   kind (§4.1).
//! - [`pipeline_queue`] — `PipelineQueue`, the concurrent FIFO a pipeline
//!   reads from (§4.2).
//! - [`event`] — `Event`, `HandlerRegistration`, and the `CollectorPlugin`
//!   contract (§3, §4.8); these live here rather than in `horizon-domain`
//!   because each carries a back-reference into this crate.
//! - [`dispatcher`] — `Dispatcher`: validates, dedupes, routes, and
//!   collects completions (§4.3).
//! - [`session`] — `Session` and `SessionCache`: the per-discovery context
//!   handlers consume (§4.4).
//! - [`session_manager`] — `SessionManager`: owns the set of active
//!   sessions (§4.4).
//! - [`scope`] — `Scope`: the configured roots a session tests assets
//!   against (§4.6).
//! - [`asn_cache`] — `AsnCache`: the longest-prefix-match IP→ASN lookup
//!   (§4.7).
//! - [`engine`] — `EngineBuilder`/`Engine`, the composition root (§11).
//! - [`infrastructure`] — the persistent work queue, in-memory repository,
//!   layered configuration loading, and logging setup (§10.2, §10.4,
//!   §4.5).

pub mod asn_cache;
pub mod dispatcher;
pub mod engine;
pub mod event;
pub mod infrastructure;
pub mod pipeline_queue;
pub mod registry;
pub mod scope;
pub mod session;
pub mod session_manager;

pub use dispatcher::{Dispatcher, EventRequest};
pub use engine::{Engine, EngineBuilder};
pub use event::{CollectorPlugin, Event, Handler, HandlerFuture, HandlerRegistration};
pub use pipeline_queue::{EventDataElement, PipelineQueue};
pub use registry::{AssetPipeline, Registry, Stage};
pub use scope::{Scope, ScopeMatch};
pub use session::{EventSet, Session, SessionCache, Stats};
pub use session_manager::SessionManager;

pub use horizon_domain::{
    Asset, AssetKind, Edge, EdgeProperty, EdgeTag, EngineConfig, EngineError, Entity, EntityProperty, GraphDbConfig,
    GraphSystem, Relation, Repository, SourceProperty, Transformation, MAX_CHAIN_DEPTH,
};
