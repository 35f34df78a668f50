// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Horizon Domain
//!
//! Pure, `tokio`-free domain layer for the Horizon attack-surface discovery
//! engine: the asset model, the event and handler-registration contracts,
//! and the narrow repository and collector-plugin ports that the
//! infrastructure layer (the `horizon` crate) implements.
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            horizon-bootstrap                 │
//! │  process lifecycle, signals, composition     │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │                  horizon                     │
//! │  registry, pipeline, dispatcher, session      │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │              horizon-domain (this)           │
//! │  assets, events, handler contract, ports      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`assets`] - the typed asset payloads (`Fqdn`, `IpAddress`, `Netblock`,
//!   `Asn`, `Url`, `ContactRecord`, `RegistrationRecord`, `TlsCertificate`)
//!   and the `AssetKind` tag used to route events to pipelines.
//! - [`entity`] / [`edge`] - the persisted graph shapes (`Entity`, `Edge`,
//!   `SourceProperty`) that a `Repository` stores.
//! - [`repository`] - the narrow graph-store port the engine consumes.
//! - [`config`] - the configuration shape (`EngineConfig`) loaded by the
//!   infrastructure layer.
//! - [`error`] - `EngineError`, the flat error-kind enum of the engine.
//!
//! `Event`, the handler-registration contract, and the collector-plugin
//! contract are *not* defined here: each one carries a live back-reference
//! to the dispatcher or session that owns it, which makes them
//! application-layer types rather than pure domain data. They live in the
//! `horizon` crate alongside the `Registry`/`Dispatcher`/`Session` they
//! reference.

pub mod assets;
pub mod config;
pub mod edge;
pub mod entity;
pub mod error;
pub mod repository;

pub use assets::{Asset, AssetKind};
pub use config::{EngineConfig, GraphDbConfig, GraphSystem, Transformation};
pub use edge::{Edge, EdgeProperty, EdgeTag, Relation, SourceProperty};
pub use entity::{Entity, EntityProperty};
pub use error::EngineError;
pub use repository::Repository;

/// Maximum depth a collector should walk a chain of same-kind relations
/// (e.g. CNAME chains) before giving up, guaranteeing termination on
/// cyclic asset graphs. The dispatcher and session's
/// event-set deduplication do not walk chains themselves; this constant
/// is the canonical place a collector implementation reads the bound
/// from, so every plugin uses the same limit.
pub const MAX_CHAIN_DEPTH: usize = 10;
