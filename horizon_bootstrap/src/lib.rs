// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides the process lifecycle
//! a deployment wires the engine into:
//!
//! - **Platform abstraction** - OS-specific operations (POSIX vs Windows)
//! - **Signal handling** - Graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Shutdown coordination** - Cancellation tokens with grace-period timeout
//! - **Exit codes** - Mapping `EngineError` to conventional process exit codes
//! - **Bootstrap logging** - A minimal logger usable before the global
//!   `tracing` subscriber is installed
//!
//! It deliberately does **not** include a CLI argument parser or terminal
//! UI; those are a front-end concern this crate has no opinion about.
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Module)            │
//! │  - Process Lifecycle                        │
//! │  - Platform Abstraction                      │
//! │  - Signal Handling                           │
//! │  - Shutdown Coordination                     │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER (`horizon`)       │
//! │  - Registry / Dispatcher / Session           │
//! │  - Persistent Work Queue                     │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │        DOMAIN LAYER (`horizon-domain`)      │
//! │  - Assets, Entities, Edges                   │
//! │  - Repository port, EngineError              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from enterprise layers** - bootstrap can reach into the
//!    application and domain crates; neither reaches back into bootstrap.
//! 2. **Platform abstraction** - OS-specific functionality lives behind the
//!    [`platform::Platform`] trait, selected at compile time.
//! 3. **Graceful shutdown** - signal handlers feed a
//!    [`shutdown::ShutdownCoordinator`] that enforces a grace period before
//!    a caller gives up on waiting for in-flight work.
//! 4. **Testability** - every component is behind a trait with a no-op or
//!    capturing test double.
//!
//! ## Usage Example
//!
//! ```rust
//! use horizon_bootstrap::platform::create_platform;
//! use horizon_bootstrap::shutdown::ShutdownCoordinator;
//! use horizon_bootstrap::signals::SystemSignals;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let platform = create_platform();
//!     println!("Running on: {}", platform.platform_name());
//!
//!     let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
//!     let signals = horizon_bootstrap::signals::create_signal_handler();
//!     let shutdown = coordinator.clone();
//!     signals
//!         .wait_for_signal(Box::new(move || shutdown.initiate_shutdown()))
//!         .await;
//! }
//! ```
//!
//! ## Module Structure
//!
//! - `platform` - OS abstraction (Unix/Windows)
//! - `signals` - Signal handling (SIGTERM, SIGINT, SIGHUP / Ctrl+C)
//! - `exit_code` - Conventional process exit code enumeration
//! - `logger` - Bootstrap-specific logging
//! - `shutdown` - Shutdown coordination

pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use exit_code::ExitCode;
