//! Compile request execution.
//!
//! One compile pass per request: submit the source, capture the success
//! indicator, then collect both result strings through the session's
//! fetch helper. The executor never fails toward its caller; an engine
//! failure is an in-band outcome, not an error.

use crate::engine::{CompileOptions, InfoKind, TranslatorEngine};
use crate::session::CompilerSession;

/// Outcome of one compile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    /// The source text exactly as submitted.
    pub original: String,
    /// The engine's success indicator for the pass.
    pub succeeded: bool,
    /// Translated object code in the target dialect, empty when the
    /// engine produced none.
    pub translated_code: String,
    /// Human-readable diagnostic log, empty when the engine produced none.
    pub info_log: String,
}

/// Run one compile pass over `source` and collect both result strings.
///
/// The source is submitted unchanged, including when empty; the engine's
/// own handling of empty input is preserved. Object code and info log are
/// fetched regardless of the success indicator.
pub fn compile<E: TranslatorEngine>(
    session: &mut CompilerSession<E>,
    source: &str,
) -> CompileOutcome {
    let succeeded = session.compile_pass(source, CompileOptions::OBJECT_CODE);
    let translated_code = session.fetch_string(InfoKind::ObjectCodeLength);
    let info_log = session.fetch_string(InfoKind::InfoLogLength);
    CompileOutcome {
        original: source.to_string(),
        succeeded,
        translated_code,
        info_log,
    }
}
