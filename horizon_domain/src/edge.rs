// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Edge
//!
//! A typed, directed relation between two entities, carrying provenance
//! properties. Relation names are fixed to the set the engine's collectors
//! are known to produce; the open-asset-model's full relation vocabulary is
//! an external concern, not specified bit-exactly here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The named relation an [`Edge`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    ARecord,
    CnameRecord,
    NsRecord,
    MxRecord,
    Contains,
    Announces,
    Registration,
    RdapUrl,
    WhoisServer,
}

/// Provenance attached to an edge: which collector produced it and how
/// confident it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProperty {
    pub name: String,
    pub confidence: u8,
}

/// A directed relation from one entity to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: Uuid,
    pub to: Uuid,
    pub relation: Relation,
    pub source: SourceProperty,
}

/// A free-form property attached to an [`Edge`], beyond its `source`
/// provenance — e.g. a TTL observed alongside an `a_record` edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperty {
    pub name: String,
    pub value: String,
}

/// A tag recorded against an edge by a collector, queryable independently
/// of the edge's other properties via `Repository::get_edge_tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTag {
    pub name: String,
}
