// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Configuration
//!
//! The configuration shape consumed by the engine: the scope seeds
//! (`domains`, `addresses`, `cidrs`, `asns`), the allowed `(from, to)`
//! transformations per collector plugin, the data directory, and the
//! graph-database backend selection.
//!
//! This module only defines the shape; loading it from TOML + environment
//! overrides is an infrastructure concern that lives in the `horizon` crate
//! (`horizon::config_loader`), kept separate from the service that loads it.

use crate::assets::AssetKind;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

/// Graph database backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphSystem {
    Memory,
    Local,
    Postgres,
    Bolt,
}

impl Default for GraphSystem {
    fn default() -> Self {
        GraphSystem::Memory
    }
}

/// A single graph-database connection profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDbConfig {
    #[serde(default)]
    pub system: GraphSystem,
    pub url: Option<String>,
    pub db_name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub options: std::collections::HashMap<String, String>,
}

/// A single `(from, to)` transformation permitted for a named plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation {
    pub plugin: String,
    pub from: AssetKind,
    pub to: AssetKind,
}

/// The engine configuration: scope seeds, permitted transformations,
/// the data directory, and the graph backend selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    #[serde(default)]
    pub cidrs: Vec<IpNet>,
    #[serde(default)]
    pub asns: Vec<u32>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    /// Data directory for the persistent work queue and cached state.
    #[serde(default = "default_dir")]
    pub dir: String,
    #[serde(default)]
    pub graph_dbs: Vec<GraphDbConfig>,
}

fn default_dir() -> String {
    ".horizon".to_string()
}

impl EngineConfig {
    /// Whether `plugin` is permitted to transform `from` into `to`.
    ///
    /// An empty `transformations` list means no restriction is configured
    /// (any transformation is allowed) — collectors would otherwise be
    /// impossible to run against a bare scope with no explicit config.
    pub fn check_transformations(&self, plugin: &str, from: AssetKind, to: AssetKind) -> bool {
        if self.transformations.is_empty() {
            return true;
        }
        self.transformations
            .iter()
            .any(|t| t.plugin == plugin && t.from == from && t.to == to)
    }

    /// The primary graph database, if one is configured as such (or the
    /// sole entry when only one is configured).
    pub fn primary_graph_db(&self) -> Option<&GraphDbConfig> {
        self.graph_dbs
            .iter()
            .find(|g| g.primary)
            .or_else(|| self.graph_dbs.first())
    }

    /// The configured scope domains, lowercased for case-insensitive
    /// matching.
    pub fn domain_set(&self) -> HashSet<String> {
        self.domains.iter().map(|d| d.trim().to_lowercase()).collect()
    }
}
