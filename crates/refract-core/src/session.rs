//! Compiler session lifecycle.
//!
//! The session is the one long-lived piece of state in the service: a
//! single compiler instance constructed once at startup, bound to a fixed
//! stage, input spec, and output dialect, and finalized only at process
//! teardown. It is an explicitly owned value rather than a global, so
//! ownership and shutdown are visible at the type level.

use thiserror::Error;

use crate::engine::{
    CompileOptions, CompilerHandle, DiagnosticSink, EngineError, InfoKind, InputSpec,
    OutputDialect, ShaderStage, TranslatorEngine,
};

/// Fixed configuration a session is bound to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub stage: ShaderStage,
    pub input_spec: InputSpec,
    pub output_dialect: OutputDialect,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stage: ShaderStage::Vertex,
            input_spec: InputSpec::CssShaders,
            output_dialect: OutputDialect::Essl,
        }
    }
}

/// Failure during the one-time startup sequence.
///
/// Any of these is fatal to the service: a compiler service with no
/// compiler has no degraded mode. The variant records which step failed.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("global runtime initialization failed: {0}")]
    Init(#[source] EngineError),

    #[error("populating default resource limits failed: {0}")]
    Limits(#[source] EngineError),

    #[error("compiler construction failed: {0}")]
    Construct(#[source] EngineError),
}

/// The single long-lived compiler instance.
///
/// Owns the engine and the opaque handle. A compile pass takes `&mut self`,
/// so the type system enforces the non-reentrancy invariant: at most one
/// request can be in flight per session.
pub struct CompilerSession<E: TranslatorEngine> {
    engine: E,
    handle: CompilerHandle,
    config: SessionConfig,
}

impl<E: TranslatorEngine> CompilerSession<E> {
    /// Run the startup sequence: global init, then default resource limits,
    /// then compiler construction. Each step must fully complete before the
    /// next begins; failure at any step aborts initialization.
    pub fn initialize(mut engine: E, config: SessionConfig) -> Result<Self, SessionError> {
        engine.global_init().map_err(SessionError::Init)?;
        let limits = engine.default_limits().map_err(SessionError::Limits)?;
        let handle = engine
            .construct(config.stage, config.input_spec, config.output_dialect, &limits)
            .map_err(SessionError::Construct)?;
        Ok(Self {
            engine,
            handle,
            config,
        })
    }

    /// The configuration this session was constructed with.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Run one compile pass over a single source fragment. The ABI accepts
    /// several fragments; this service always submits exactly one.
    pub(crate) fn compile_pass(&mut self, source: &str, options: CompileOptions) -> bool {
        self.engine.compile_pass(self.handle, &[source], options)
    }

    /// Fetch a result string using the length-query/copy two-step the ABI
    /// requires. A reported length of 0 or 1 is an empty or NUL-only
    /// buffer and decodes to the empty string.
    pub(crate) fn fetch_string(&mut self, kind: InfoKind) -> String {
        let length = self.engine.query_info(self.handle, kind);
        if length <= 1 {
            return String::new();
        }
        let mut buf = vec![0u8; length];
        match kind {
            InfoKind::ObjectCodeLength => self.engine.fetch_object_code(self.handle, &mut buf),
            InfoKind::InfoLogLength => self.engine.fetch_info_log(self.handle, &mut buf),
        }
        // Drop the trailing NUL the engine writes.
        buf.truncate(length - 1);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Route the engine's out-of-band print channel into `sink`.
    pub fn set_diagnostic_sink(&mut self, sink: DiagnosticSink) {
        self.engine.set_diagnostic_sink(sink);
    }

    /// Finalize the global runtime. Only at process teardown, never
    /// between requests.
    pub fn shutdown(mut self) {
        self.engine.global_finalize();
    }
}
