//! Test utilities for Refract
//!
//! This module provides a scripted stand-in for the native translator
//! engine so the session, executor, and service layers can be exercised
//! without the shared library present. The engine performs a deterministic
//! toy "translation" and records every ABI call it receives.

use std::sync::{Arc, Mutex};

use crate::engine::{
    CompileOptions, CompilerHandle, DiagnosticSink, EngineError, InfoKind, InputSpec,
    OutputDialect, ResourceLimits, ShaderStage, TranslatorEngine,
};

/// ABI entry points, recorded in call order by [`ScriptedEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiCall {
    GlobalInit,
    DefaultLimits,
    Construct,
    CompilePass,
    QueryInfo,
    FetchObjectCode,
    FetchInfoLog,
    GlobalFinalize,
}

/// Scripted translator engine.
///
/// A source with balanced parentheses and braces "compiles": the engine
/// produces translated text and a NUL-only info log (length 1). Anything
/// unbalanced fails with a syntax diagnostic and a zero-length object
/// code buffer. Lengths include the trailing NUL byte, matching the real
/// ABI, so both the 0-length and 1-length decoding rules get exercised.
pub struct ScriptedEngine {
    /// Fail the global init step.
    pub fail_init: bool,
    /// Fail the resource-limits step.
    pub fail_limits: bool,
    /// Fail compiler construction.
    pub fail_construct: bool,
    /// Panic inside the compile pass, simulating an internal engine fault.
    pub panic_on_compile: bool,
    /// Text pushed through the diagnostic sink during each compile pass,
    /// as the engine's internal print hook would.
    pub diag_on_compile: Option<String>,
    log: Arc<Mutex<Vec<AbiCall>>>,
    object_code: Vec<u8>,
    info_log: Vec<u8>,
    sink: Option<DiagnosticSink>,
}

impl ScriptedEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail_init: false,
            fail_limits: false,
            fail_construct: false,
            panic_on_compile: false,
            diag_on_compile: None,
            log: Arc::new(Mutex::new(Vec::new())),
            object_code: Vec::new(),
            info_log: Vec::new(),
            sink: None,
        }
    }

    /// Snapshot of the calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<AbiCall> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Shared handle to the call log, usable after the engine has been
    /// consumed by a session.
    #[must_use]
    pub fn call_log(&self) -> Arc<Mutex<Vec<AbiCall>>> {
        Arc::clone(&self.log)
    }

    fn record(&self, call: AbiCall) {
        if let Ok(mut log) = self.log.lock() {
            log.push(call);
        }
    }

    /// The toy validator: every `(` and `{` must close, in order.
    fn translate(source: &str) -> Result<String, String> {
        let mut parens = 0i32;
        let mut braces = 0i32;
        for ch in source.chars() {
            match ch {
                '(' => parens += 1,
                ')' => parens -= 1,
                '{' => braces += 1,
                '}' => braces -= 1,
                _ => {}
            }
            if parens < 0 || braces < 0 {
                return Err("ERROR: 0:1: syntax error, unbalanced delimiter\n".to_string());
            }
        }
        if parens != 0 || braces != 0 {
            return Err("ERROR: 0:1: syntax error, unexpected end of source\n".to_string());
        }
        Ok(format!("precision mediump float;\n{source}\n"))
    }

    fn nul_terminated(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        bytes
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslatorEngine for ScriptedEngine {
    fn global_init(&mut self) -> Result<(), EngineError> {
        self.record(AbiCall::GlobalInit);
        if self.fail_init {
            return Err(EngineError::InitFailed);
        }
        Ok(())
    }

    fn default_limits(&mut self) -> Result<ResourceLimits, EngineError> {
        self.record(AbiCall::DefaultLimits);
        if self.fail_limits {
            return Err(EngineError::InitFailed);
        }
        Ok(ResourceLimits::zeroed())
    }

    fn construct(
        &mut self,
        _stage: ShaderStage,
        _spec: InputSpec,
        _output: OutputDialect,
        _limits: &ResourceLimits,
    ) -> Result<CompilerHandle, EngineError> {
        self.record(AbiCall::Construct);
        if self.fail_construct {
            return Err(EngineError::ConstructFailed);
        }
        CompilerHandle::new(1).ok_or(EngineError::ConstructFailed)
    }

    fn compile_pass(
        &mut self,
        _handle: CompilerHandle,
        sources: &[&str],
        _options: CompileOptions,
    ) -> bool {
        self.record(AbiCall::CompilePass);
        if self.panic_on_compile {
            panic!("scripted internal compiler fault");
        }
        if let (Some(sink), Some(text)) = (&self.sink, &self.diag_on_compile) {
            sink(text.clone());
        }
        let source = sources.concat();
        match Self::translate(&source) {
            Ok(code) => {
                self.object_code = Self::nul_terminated(&code);
                // Empty log, reported as a lone NUL like the real engine.
                self.info_log = vec![0];
                true
            }
            Err(log) => {
                self.object_code = Vec::new();
                self.info_log = Self::nul_terminated(&log);
                false
            }
        }
    }

    fn query_info(&mut self, _handle: CompilerHandle, kind: InfoKind) -> usize {
        self.record(AbiCall::QueryInfo);
        match kind {
            InfoKind::ObjectCodeLength => self.object_code.len(),
            InfoKind::InfoLogLength => self.info_log.len(),
        }
    }

    fn fetch_object_code(&mut self, _handle: CompilerHandle, buf: &mut [u8]) {
        self.record(AbiCall::FetchObjectCode);
        let n = buf.len().min(self.object_code.len());
        buf[..n].copy_from_slice(&self.object_code[..n]);
    }

    fn fetch_info_log(&mut self, _handle: CompilerHandle, buf: &mut [u8]) {
        self.record(AbiCall::FetchInfoLog);
        let n = buf.len().min(self.info_log.len());
        buf[..n].copy_from_slice(&self.info_log[..n]);
    }

    fn global_finalize(&mut self) {
        self.record(AbiCall::GlobalFinalize);
    }

    fn set_diagnostic_sink(&mut self, sink: DiagnosticSink) {
        self.sink = Some(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_source_translates() {
        let code = ScriptedEngine::translate("void main(){}").expect("should compile");
        assert!(code.contains("void main(){}"));
    }

    #[test]
    fn unterminated_source_fails() {
        let log = ScriptedEngine::translate("void main(").expect_err("should fail");
        assert!(log.contains("syntax error"));
    }

    #[test]
    fn empty_source_translates_trivially() {
        assert!(ScriptedEngine::translate("").is_ok());
    }
}
