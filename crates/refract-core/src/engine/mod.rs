//! Engine boundary for the native shader translator.
//!
//! The translator is an opaque shared library exposing the `Sh*` C ABI.
//! Everything above this module talks to it through [`TranslatorEngine`],
//! a narrow adapter trait with one method per logical entry point. The
//! enum discriminants mirror the ABI header constants exactly.

use std::num::NonZeroUsize;

use thiserror::Error;

/// Dynamic FFI implementation over a shared library loaded at runtime.
/// FFI requires unsafe code for symbol resolution and buffer marshaling.
#[allow(unsafe_code, clippy::missing_safety_doc)]
pub mod native;

/// Shader stage a compiler instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// ABI constant for this stage.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Vertex => 0x8B31,
            Self::Fragment => 0x8B30,
        }
    }
}

/// Input specification the submitted source is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSpec {
    WebGl,
    CssShaders,
}

impl InputSpec {
    /// ABI constant for this specification.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::WebGl => 0x8B41,
            Self::CssShaders => 0x8B42,
        }
    }
}

/// Target dialect the translator emits object code in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDialect {
    Essl,
    Glsl,
    Hlsl,
}

impl OutputDialect {
    /// ABI constant for this dialect.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Essl => 0x8B45,
            Self::Glsl => 0x8B46,
            Self::Hlsl => 0x8B47,
        }
    }
}

/// Result metadata queryable after a compile pass.
///
/// Both report buffer lengths that include the trailing NUL byte, so a
/// length of 0 or 1 means "nothing was produced".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    InfoLogLength,
    ObjectCodeLength,
}

impl InfoKind {
    /// ABI constant for this query.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::InfoLogLength => 0x8B84,
            Self::ObjectCodeLength => 0x8B88,
        }
    }
}

/// Bit set of compile-pass options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions(u32);

impl CompileOptions {
    /// Request translated object code.
    pub const OBJECT_CODE: Self = Self(0x0004);
    /// Request the intermediate tree dump.
    pub const INTERMEDIATE_TREE: Self = Self(0x0002);

    /// Raw option bits as passed across the boundary.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Combine with another option set.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Size of the engine-defined built-in resources table.
///
/// The layout is owned by the engine; the host only allocates the buffer
/// and hands it back across the boundary, so it stays opaque here.
pub const RESOURCE_TABLE_BYTES: usize = 400;

/// Opaque capability/limits table populated by the engine.
pub struct ResourceLimits {
    raw: Box<[u8]>,
}

impl ResourceLimits {
    /// Allocate a zeroed table, ready for the engine to fill in.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            raw: vec![0u8; RESOURCE_TABLE_BYTES].into_boxed_slice(),
        }
    }

    /// Raw pointer to the table, for handing across the boundary.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.raw.as_ptr()
    }

    /// Mutable raw pointer, for the engine to populate defaults into.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.raw.as_mut_ptr()
    }
}

/// Opaque handle to a constructed compiler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerHandle(NonZeroUsize);

impl CompilerHandle {
    /// Wrap a raw handle value. A zero handle means construction failed.
    #[must_use]
    pub fn new(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// The raw handle value.
    #[must_use]
    pub fn raw(self) -> usize {
        self.0.get()
    }
}

/// Callback receiving out-of-band engine diagnostics (the engine's internal
/// print channel). Text pushed here is independent of any compile request.
pub type DiagnosticSink = Box<dyn Fn(String) + Send>;

/// Failure at the native boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to load translator library '{path}': {reason}")]
    LibraryLoad { path: String, reason: String },

    #[error("translator library is missing symbol '{0}'")]
    MissingSymbol(&'static str),

    #[error("global translator initialization failed")]
    InitFailed,

    #[error("compiler construction returned a null handle")]
    ConstructFailed,
}

/// Narrow adapter over the native translator ABI.
///
/// One method per logical entry point. The session layer owns the calling
/// discipline (init order, one pass at a time); implementations only
/// marshal arguments across the boundary.
pub trait TranslatorEngine {
    /// Initialize the global translator runtime. Called once, before any
    /// other entry point.
    fn global_init(&mut self) -> Result<(), EngineError>;

    /// Populate a resource-limits table with engine-defined defaults.
    fn default_limits(&mut self) -> Result<ResourceLimits, EngineError>;

    /// Construct a compiler bound to a stage, input spec, output dialect,
    /// and limits table.
    fn construct(
        &mut self,
        stage: ShaderStage,
        spec: InputSpec,
        output: OutputDialect,
        limits: &ResourceLimits,
    ) -> Result<CompilerHandle, EngineError>;

    /// Run one compile pass over the given source fragments, returning the
    /// engine's success indicator.
    fn compile_pass(
        &mut self,
        handle: CompilerHandle,
        sources: &[&str],
        options: CompileOptions,
    ) -> bool;

    /// Query result metadata for the most recent pass. Reported lengths
    /// include the trailing NUL byte.
    fn query_info(&mut self, handle: CompilerHandle, kind: InfoKind) -> usize;

    /// Copy the translated object code into `buf`, sized by a preceding
    /// [`TranslatorEngine::query_info`] call.
    fn fetch_object_code(&mut self, handle: CompilerHandle, buf: &mut [u8]);

    /// Copy the diagnostic log into `buf`, sized by a preceding
    /// [`TranslatorEngine::query_info`] call.
    fn fetch_info_log(&mut self, handle: CompilerHandle, buf: &mut [u8]);

    /// Finalize the global translator runtime. No entry point may be
    /// called afterwards.
    fn global_finalize(&mut self);

    /// Install the sink for the engine's out-of-band print channel.
    /// Engines without such a channel keep the default no-op.
    fn set_diagnostic_sink(&mut self, _sink: DiagnosticSink) {}
}
