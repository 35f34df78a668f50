// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layered configuration loading
//!
//! Loads an [`EngineConfig`] from a TOML base file with environment
//! variable overrides, via the `config` crate, the way the teacher's
//! `infrastructure/config.rs` layers its configuration sources (§10.4).
//!
//! Environment overrides use the `HORIZON_` prefix and `__` as the
//! nesting separator, e.g. `HORIZON_DIR=/var/lib/horizon` or
//! `HORIZON_GRAPH_DBS__0__HOST=db.internal`.

use config::{Config, Environment, File};
use horizon_domain::{EngineConfig, EngineError};
use std::path::Path;

pub const ENV_PREFIX: &str = "HORIZON";

/// Loads configuration from `path` (if it exists) layered with
/// `HORIZON_*` environment variable overrides.
pub fn load(path: impl AsRef<Path>) -> Result<EngineConfig, EngineError> {
    let builder = Config::builder()
        .add_source(File::from(path.as_ref().to_path_buf()).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
    let config = builder
        .build()
        .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
    config
        .try_deserialize()
        .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))
}

/// Loads configuration from in-memory TOML text, used by tests that don't
/// want to touch the filesystem.
pub fn load_from_str(toml: &str) -> Result<EngineConfig, EngineError> {
    let builder = Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
    let config = builder
        .build()
        .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
    config
        .try_deserialize()
        .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))
}
