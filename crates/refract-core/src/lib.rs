//! Refract Core - compiler session engine for the Refract translation service
//!
//! This crate provides the pieces below the message protocol:
//! - Engine: the narrow adapter over the native shader translator ABI
//! - Session: the single long-lived compiler instance and its lifecycle
//! - Executor: per-request compile passes and result collection

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine boundary - trait and types mirroring the native translator ABI
pub mod engine;

/// Compiler session - init-once, finalize-at-shutdown lifecycle
pub mod session;

/// Compile request executor - one compile pass per request
pub mod executor;

/// Test utilities - scripted engine double for exercising the stack
/// without the native library present
pub mod testutil;
