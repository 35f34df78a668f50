// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! ## Exit Code Conventions
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **128+N**: Fatal signal N (e.g., 130 = SIGINT)

use horizon::EngineError;
use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    UsageError = 64,
    DataError = 65,
    NoInput = 66,
    Unavailable = 69,
    Software = 70,
    IoError = 74,
    NoPerm = 77,
    Config = 78,
    Interrupted = 130,
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps an [`EngineError`] directly onto its exit code by variant,
    /// rather than sniffing the rendered message for keywords: every
    /// variant names a specific failure kind already, so the mapping is
    /// exhaustive and exact (§7).
    pub fn from_engine_error(error: &EngineError) -> Self {
        match error {
            EngineError::InvalidConfiguration(_) => ExitCode::Config,
            EngineError::InvalidHandler(_) | EngineError::AlreadyBuilt => ExitCode::Software,
            EngineError::NoPipelineForType(_) => ExitCode::UsageError,
            EngineError::NoEntity | EngineError::NoSession => ExitCode::Software,
            EngineError::SessionTerminated(_) => ExitCode::Unavailable,
            EngineError::AlreadyProcessed => ExitCode::Error,
            EngineError::HandlerFailure { .. } => ExitCode::Software,
            EngineError::RepositoryError(_) => ExitCode::IoError,
            EngineError::QueueIoError(_) => ExitCode::IoError,
        }
    }

    /// Falls back to keyword matching for errors outside the engine's own
    /// `EngineError` enum (e.g. a plugin's `anyhow::Error`), where no
    /// variant-level mapping exists.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let message = error.to_string().to_lowercase();
        if message.contains("permission") || message.contains("access denied") {
            ExitCode::NoPerm
        } else if message.contains("not found") || message.contains("no such") {
            ExitCode::NoInput
        } else if message.contains("invalid") || message.contains("argument") {
            ExitCode::UsageError
        } else if message.contains("parse") || message.contains("format") {
            ExitCode::DataError
        } else if message.contains("io") || message.contains("read") || message.contains("write") {
            ExitCode::IoError
        } else if message.contains("config") {
            ExitCode::Config
        } else if message.contains("unavailable") {
            ExitCode::Unavailable
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::IoError => "I/O error",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}
