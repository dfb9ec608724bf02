//! DebugSession trait for a unified debug adapter interface
//!
//! The fetch logic only needs four requests from a debug adapter. This trait
//! captures exactly those, so the same code runs against a live adapter
//! ([`DapClient`](super::dap_client::DapClient)), the in-process
//! [`MemorySession`](super::memory_session::MemorySession), or a mock.
//!
//! The payload types mirror the subset of Debug Adapter Protocol fields the
//! fetcher reads. Unknown fields are ignored when deserializing.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A thread of the debuggee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A stack frame of a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A named group of variables visible in a stack frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub name: String,
    pub variables_reference: i64,
}

/// A variable as reported by the adapter
///
/// A non-zero `variables_reference` marks a composite value (array, struct)
/// whose children are fetched with further `variables` requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DapVariable {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluate_name: Option<String>,
    #[serde(default)]
    pub variables_reference: i64,
}

impl DapVariable {
    /// Create a scalar variable whose evaluate name equals its name
    pub fn scalar(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            evaluate_name: Some(name.clone()),
            name,
            value: value.into(),
            variables_reference: 0,
        }
    }

    /// Create a composite variable pointing at a child reference
    pub fn composite(name: impl Into<String>, summary: impl Into<String>, reference: i64) -> Self {
        let name = name.into();
        Self {
            evaluate_name: Some(name.clone()),
            name,
            value: summary.into(),
            variables_reference: reference,
        }
    }

    /// Whether this variable has children to page through
    pub fn is_composite(&self) -> bool {
        self.variables_reference > 0
    }
}

/// Unified interface for debug sessions
///
/// Calls block until the adapter answers. Implementations must be `Send` so
/// the session can live on the backend worker thread.
#[cfg_attr(test, mockall::automock)]
pub trait DebugSession: Send {
    /// List the debuggee's threads
    fn threads(&mut self) -> Result<Vec<Thread>>;

    /// Fetch up to `levels` frames of a thread's stack starting at `start_frame`
    fn stack_trace(&mut self, thread_id: i64, start_frame: i64, levels: i64)
        -> Result<Vec<StackFrame>>;

    /// List the scopes of a stack frame
    fn scopes(&mut self, frame_id: i64) -> Result<Vec<Scope>>;

    /// List the children of a variables reference
    ///
    /// `start` and `count` request a page; `None` asks for everything.
    fn variables(
        &mut self,
        variables_reference: i64,
        start: Option<i64>,
        count: Option<i64>,
    ) -> Result<Vec<DapVariable>>;

    /// Short description for logs and the status bar
    fn describe(&self) -> String {
        "debug session".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_deserialize_camel_case() {
        let json = r#"{
            "name": "arr",
            "value": "int[3]",
            "evaluateName": "arr",
            "variablesReference": 7,
            "type": "int[3]"
        }"#;
        let var: DapVariable = serde_json::from_str(json).unwrap();
        assert_eq!(var.evaluate_name.as_deref(), Some("arr"));
        assert_eq!(var.variables_reference, 7);
        assert!(var.is_composite());
    }

    #[test]
    fn test_variable_defaults() {
        let var: DapVariable = serde_json::from_str(r#"{"name":"[0]","value":"1"}"#).unwrap();
        assert_eq!(var.evaluate_name, None);
        assert!(!var.is_composite());
    }

    #[test]
    fn test_scope_deserialize() {
        let scope: Scope =
            serde_json::from_str(r#"{"name":"Locals","variablesReference":3,"expensive":false}"#)
                .unwrap();
        assert_eq!(scope.name, "Locals");
        assert_eq!(scope.variables_reference, 3);
    }
}
