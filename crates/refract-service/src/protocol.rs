//! Wire protocol for the translation service.
//!
//! Line-delimited JSON messages tagged by `kind`. The message channel is
//! the service's entire public surface: no files, no persisted state, no
//! CLI beyond it.

use refract_core::executor::CompileOutcome;
use serde::{Deserialize, Serialize};

/// Inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Inbound {
    /// Request one compile pass over `source`.
    Compile { source: String },
    /// Any other message kind. Ignored by design: no response, no error.
    #[serde(other)]
    Other,
}

/// Outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outbound {
    /// Emitted exactly once, after the session is ready. The only
    /// spontaneous message.
    Loaded,
    /// Response to a compile request. Responses pair with requests purely
    /// by arrival order; the protocol carries no request identifiers.
    Result { result: TranslationReport },
    /// Asynchronous diagnostic side channel: engine-internal print output
    /// and text recovered from an unexpected fault during a pass.
    Error { value: String },
}

/// Body of a `result` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationReport {
    /// The source text exactly as submitted.
    pub original: String,
    /// The engine's success indicator.
    #[serde(rename = "compileSucceeded")]
    pub compile_succeeded: bool,
    /// Translated object code in the target dialect, empty when none.
    pub source: String,
    /// Info log from the pass, empty when none.
    pub info: String,
}

impl From<CompileOutcome> for TranslationReport {
    fn from(outcome: CompileOutcome) -> Self {
        Self {
            original: outcome.original,
            compile_succeeded: outcome.succeeded,
            source: outcome.translated_code,
            info: outcome.info_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compile_request() {
        let message: Inbound =
            serde_json::from_str(r#"{"kind":"compile","source":"void main(){}"}"#)
                .expect("should parse");
        assert_eq!(
            message,
            Inbound::Compile {
                source: "void main(){}".to_string()
            }
        );
    }

    #[test]
    fn unknown_kind_parses_as_other() {
        let message: Inbound =
            serde_json::from_str(r#"{"kind":"ping"}"#).expect("should parse");
        assert_eq!(message, Inbound::Other);
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let message: Inbound =
            serde_json::from_str(r#"{"kind":"compile","source":"x","extra":1}"#)
                .expect("should parse");
        assert_eq!(
            message,
            Inbound::Compile {
                source: "x".to_string()
            }
        );
    }

    #[test]
    fn loaded_wire_shape() {
        let json = serde_json::to_string(&Outbound::Loaded).expect("should serialize");
        assert_eq!(json, r#"{"kind":"loaded"}"#);
    }

    #[test]
    fn error_wire_shape() {
        let json = serde_json::to_string(&Outbound::Error {
            value: "boom".to_string(),
        })
        .expect("should serialize");
        assert_eq!(json, r#"{"kind":"error","value":"boom"}"#);
    }

    #[test]
    fn result_wire_shape() {
        let message = Outbound::Result {
            result: TranslationReport {
                original: "a".to_string(),
                compile_succeeded: true,
                source: "b".to_string(),
                info: String::new(),
            },
        };
        let json = serde_json::to_string(&message).expect("should serialize");
        assert_eq!(
            json,
            r#"{"kind":"result","result":{"original":"a","compileSucceeded":true,"source":"b","info":""}}"#
        );
    }

    #[test]
    fn report_carries_outcome_fields() {
        let report = TranslationReport::from(CompileOutcome {
            original: "src".to_string(),
            succeeded: false,
            translated_code: String::new(),
            info_log: "ERROR".to_string(),
        });
        assert!(!report.compile_succeeded);
        assert_eq!(report.original, "src");
        assert_eq!(report.source, "");
        assert_eq!(report.info, "ERROR");
    }
}
