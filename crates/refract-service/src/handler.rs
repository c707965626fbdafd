//! Message protocol handler.
//!
//! A two-state machine driving the single compiler session: `Idle` between
//! requests, `Compiling` while a pass runs. Processing is strictly serial,
//! one message start-to-finish at a time, which is itself the concurrency
//! control for the non-reentrant session.

use std::panic::{self, AssertUnwindSafe};

use refract_core::engine::{DiagnosticSink, TranslatorEngine};
use refract_core::executor;
use refract_core::session::CompilerSession;

use crate::protocol::{Inbound, Outbound, TranslationReport};

/// Handler state. `Compiling` is never observable from outside a
/// [`CompileService::handle`] call under the serial loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Compiling,
}

/// The protocol handler owning the compiler session.
pub struct CompileService<E: TranslatorEngine> {
    session: CompilerSession<E>,
    state: ServiceState,
}

impl<E: TranslatorEngine> CompileService<E> {
    #[must_use]
    pub fn new(session: CompilerSession<E>) -> Self {
        Self {
            session,
            state: ServiceState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Route the engine's out-of-band print channel into `sink`.
    pub fn set_diagnostic_sink(&mut self, sink: DiagnosticSink) {
        self.session.set_diagnostic_sink(sink);
    }

    /// Handle one raw inbound line, returning the response to emit, if any.
    ///
    /// Malformed JSON is ignored the same way unrecognized kinds are: no
    /// response, no error.
    pub fn handle_line(&mut self, line: &str) -> Option<Outbound> {
        match serde_json::from_str::<Inbound>(line) {
            Ok(message) => self.handle(message),
            Err(_) => None,
        }
    }

    /// Handle one decoded inbound message.
    pub fn handle(&mut self, message: Inbound) -> Option<Outbound> {
        match message {
            Inbound::Compile { source } => Some(self.run_compile(&source)),
            Inbound::Other => None,
        }
    }

    fn run_compile(&mut self, source: &str) -> Outbound {
        self.state = ServiceState::Compiling;
        // An unexpected fault inside the engine must not kill the worker
        // without a response; it is reported on the error channel.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            executor::compile(&mut self.session, source)
        }));
        self.state = ServiceState::Idle;
        match outcome {
            Ok(outcome) => Outbound::Result {
                result: TranslationReport::from(outcome),
            },
            Err(payload) => Outbound::Error {
                value: panic_text(payload.as_ref()),
            },
        }
    }

    /// Tear down the session. Only at process shutdown.
    pub fn shutdown(self) {
        self.session.shutdown();
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unexpected fault during compile pass".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_core::session::SessionConfig;
    use refract_core::testutil::ScriptedEngine;

    fn service_with(engine: ScriptedEngine) -> CompileService<ScriptedEngine> {
        let session = CompilerSession::initialize(engine, SessionConfig::default())
            .expect("startup should succeed");
        CompileService::new(session)
    }

    fn service() -> CompileService<ScriptedEngine> {
        service_with(ScriptedEngine::new())
    }

    #[test]
    fn compile_request_yields_a_result() {
        let mut service = service();
        let response = service
            .handle_line(r#"{"kind":"compile","source":"void main(){}"}"#)
            .expect("should respond");
        match response {
            Outbound::Result { result } => {
                assert!(result.compile_succeeded);
                assert_eq!(result.original, "void main(){}");
                assert!(!result.source.is_empty());
                assert_eq!(result.info, "");
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn failed_compile_is_still_a_result() {
        let mut service = service();
        let response = service
            .handle_line(r#"{"kind":"compile","source":"void main("}"#)
            .expect("should respond");
        match response {
            Outbound::Result { result } => {
                assert!(!result.compile_succeeded);
                assert_eq!(result.source, "");
                assert!(result.info.contains("syntax error"));
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_a_no_op() {
        let mut service = service();
        assert_eq!(service.handle_line(r#"{"kind":"shutdown"}"#), None);
    }

    #[test]
    fn malformed_json_is_a_no_op() {
        let mut service = service();
        assert_eq!(service.handle_line("{not json"), None);
    }

    #[test]
    fn responses_follow_request_order() {
        let mut service = service();
        let first = service.handle_line(r#"{"kind":"compile","source":"void a(){}"}"#);
        let second = service.handle_line(r#"{"kind":"compile","source":"void b("}"#);
        match (first, second) {
            (
                Some(Outbound::Result { result: r1 }),
                Some(Outbound::Result { result: r2 }),
            ) => {
                assert_eq!(r1.original, "void a(){}");
                assert_eq!(r2.original, "void b(");
            }
            other => panic!("expected two results, got {other:?}"),
        }
    }

    #[test]
    fn engine_fault_becomes_an_error_message() {
        let mut engine = ScriptedEngine::new();
        engine.panic_on_compile = true;
        let mut service = service_with(engine);
        let response = service
            .handle_line(r#"{"kind":"compile","source":"void main(){}"}"#)
            .expect("should respond");
        match response {
            Outbound::Error { value } => {
                assert!(value.contains("scripted internal compiler fault"));
            }
            other => panic!("expected error, got {other:?}"),
        }
        // The worker survives the fault and keeps serving.
        assert_eq!(service.state(), ServiceState::Idle);
        assert!(service
            .handle_line(r#"{"kind":"compile","source":"void main(){}"}"#)
            .is_some());
    }

    #[test]
    fn state_returns_to_idle_after_each_request() {
        let mut service = service();
        assert_eq!(service.state(), ServiceState::Idle);
        service.handle_line(r#"{"kind":"compile","source":"void main(){}"}"#);
        assert_eq!(service.state(), ServiceState::Idle);
    }
}
