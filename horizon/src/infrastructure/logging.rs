// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Structured logging
//!
//! Installs a global `tracing` subscriber from an `RUST_LOG`-style
//! filter, the way the teacher's `infrastructure/logging.rs` sets up its
//! subscriber from configuration (§10.2). The dispatcher's per-event
//! error log (`registry.rs::AssetPipeline::process`) runs inside this
//! subscriber as a structured `tracing::error!` call carrying
//! `session_token`, `entity_key`, and `handler_name` fields, rather than
//! bespoke string formatting.
//!
//! Bootstrap-phase messages emitted before this subscriber is installed
//! go through `horizon_bootstrap::logger::BootstrapLogger` instead, so a
//! failure to install the subscriber is still visible.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `default_directive` is used when
/// `RUST_LOG` is unset, e.g. `"info"` or `"horizon=debug,warn"`.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = fmt().with_env_filter(filter).try_init();
}
