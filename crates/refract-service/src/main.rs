//! Refract - shader translation service over stdio

use anyhow::{Context, Result};

use refract_core::engine::native::NativeEngine;
use refract_core::session::{CompilerSession, SessionConfig};
use refract_service::CompileService;

/// Environment variable naming the native translator library.
const ENGINE_LIB_VAR: &str = "REFRACT_ENGINE_LIB";

/// Default library name, resolved through the platform loader search path.
const DEFAULT_ENGINE_LIB: &str = "libshtranslator.so";

#[tokio::main]
async fn main() -> Result<()> {
    let lib_path =
        std::env::var(ENGINE_LIB_VAR).unwrap_or_else(|_| DEFAULT_ENGINE_LIB.to_string());

    // Startup failure is fatal: exit nonzero without ever emitting `loaded`.
    let engine = NativeEngine::load(&lib_path)
        .with_context(|| format!("loading translator engine from '{lib_path}'"))?;
    let session = CompilerSession::initialize(engine, SessionConfig::default())
        .context("initializing compiler session")?;

    refract_service::run_server(CompileService::new(session)).await
}
