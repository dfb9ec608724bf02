//! In-process debug session
//!
//! [`MemorySession`] answers the four [`DebugSession`] requests from a table
//! of local variables held in memory. It backs the `--demo` mode and the
//! integration tests, where a real debug adapter is not available.
//!
//! # Layout
//!
//! - one thread (`id = 1`) with one frame (`id = 1000`)
//! - a local scope (`Locals` by default, reference [`LOCALS_REFERENCE`])
//!   and an empty `Globals` scope
//! - every array local gets its own child reference, starting at
//!   [`FIRST_ARRAY_REFERENCE`]
//!
//! Every request is recorded so tests can assert on the exact sequence the
//! fetcher issued.
//!
//! # Example
//!
//! ```ignore
//! let mut session = MemorySession::new()
//!     .with_scalar("x", "3.14")
//!     .with_array("samples", [1.0, 2.0, 3.0]);
//!
//! let points = resolve(Some(&mut session), &["x".into(), "samples".into()]);
//! ```

use super::session::{DapVariable, DebugSession, Scope, StackFrame, Thread};
use crate::error::{DebugChartError, Result};

/// Thread id reported by the session
pub const THREAD_ID: i64 = 1;

/// Frame id of the single stack frame
pub const FRAME_ID: i64 = 1000;

/// Reference of the local scope
pub const LOCALS_REFERENCE: i64 = 1;

/// Reference of the (always empty) global scope
pub const GLOBALS_REFERENCE: i64 = 2;

/// Reference assigned to the first array local
pub const FIRST_ARRAY_REFERENCE: i64 = 100;

/// Value of a local held by the session
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValue {
    /// Scalar rendered as text
    Scalar(String),
    /// Array of element texts
    Array(Vec<String>),
}

/// A request received by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Threads,
    StackTrace {
        thread_id: i64,
        start_frame: i64,
        levels: i64,
    },
    Scopes {
        frame_id: i64,
    },
    Variables {
        reference: i64,
        start: Option<i64>,
        count: Option<i64>,
    },
}

/// Debug session backed by an in-memory variable table
#[derive(Debug, Clone)]
pub struct MemorySession {
    locals: Vec<(String, MemoryValue)>,
    scope_name: String,
    paused: bool,
    fail_page_at: Option<i64>,
    requests: Vec<SessionRequest>,
    tick: u64,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self {
            locals: Vec::new(),
            scope_name: "Locals".to_string(),
            paused: true,
            fail_page_at: None,
            requests: Vec::new(),
            tick: 0,
        }
    }
}

impl MemorySession {
    /// Create an empty, paused session
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with a handful of evolving locals for the demo mode
    pub fn demo() -> Self {
        let mut session = Self::new();
        session.update_demo_values();
        session
    }

    /// Add or replace a scalar local
    pub fn with_scalar(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_local(name, MemoryValue::Scalar(value.into()));
        self
    }

    /// Add or replace an array local
    pub fn with_array<I, T>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.set_local(name, MemoryValue::Array(values));
        self
    }

    /// Rename the local scope (adapters use `Local`, `Locals`, or something else)
    pub fn with_scope_name(mut self, name: impl Into<String>) -> Self {
        self.scope_name = name.into();
        self
    }

    /// Make the `variables` page starting at `start` fail
    pub fn failing_page_at(mut self, start: i64) -> Self {
        self.fail_page_at = Some(start);
        self
    }

    /// Start in the running state
    pub fn running(mut self) -> Self {
        self.paused = false;
        self
    }

    /// Replace a local, keeping its position if it already exists
    pub fn set_local(&mut self, name: impl Into<String>, value: MemoryValue) {
        let name = name.into();
        match self.locals.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.locals.push((name, value)),
        }
    }

    /// Pause or resume the simulated debuggee
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> &[SessionRequest] {
        &self.requests
    }

    /// Forget recorded requests
    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }

    /// Advance the demo values by one step
    pub fn step(&mut self) {
        self.tick += 1;
        self.update_demo_values();
        self.paused = true;
    }

    fn update_demo_values(&mut self) {
        let t = self.tick as f64;
        let samples: Vec<String> = (0..24)
            .map(|i| format!("{:.3}", (t * 0.4 + i as f64 * 0.35).sin() * 10.0))
            .collect();
        let buckets: Vec<String> = (0..5)
            .map(|i| format!("{}", ((self.tick + i * 3) % 7) + 1))
            .collect();

        self.set_local("counter", MemoryValue::Scalar(format!("{}", self.tick)));
        self.set_local(
            "temperature",
            MemoryValue::Scalar(format!("{:.2}", 21.5 + (t * 0.7).sin() * 2.0)),
        );
        self.set_local("samples", MemoryValue::Array(samples));
        self.set_local("buckets", MemoryValue::Array(buckets));
        self.set_local("label", MemoryValue::Scalar("\"sensor-a\"".to_string()));
    }

    fn array_reference(index: usize) -> i64 {
        FIRST_ARRAY_REFERENCE + index as i64
    }

    fn local_variables(&self) -> Vec<DapVariable> {
        self.locals
            .iter()
            .enumerate()
            .map(|(index, (name, value))| match value {
                MemoryValue::Scalar(text) => DapVariable::scalar(name.clone(), text.clone()),
                MemoryValue::Array(items) => DapVariable::composite(
                    name.clone(),
                    format!("[{}]", items.len()),
                    Self::array_reference(index),
                ),
            })
            .collect()
    }

    fn array_children(
        &self,
        reference: i64,
        start: Option<i64>,
        count: Option<i64>,
    ) -> Result<Vec<DapVariable>> {
        let index = (reference - FIRST_ARRAY_REFERENCE) as usize;
        let Some((name, MemoryValue::Array(items))) = self.locals.get(index) else {
            return Err(protocol_error("variables", format!("unknown reference {}", reference)));
        };

        let start = start.unwrap_or(0).max(0) as usize;
        let end = match count {
            Some(count) if count > 0 => (start + count as usize).min(items.len()),
            _ => items.len(),
        };

        Ok(items
            .iter()
            .enumerate()
            .skip(start)
            .take(end.saturating_sub(start))
            .map(|(i, text)| DapVariable {
                name: format!("[{}]", i),
                value: text.clone(),
                evaluate_name: Some(format!("{}[{}]", name, i)),
                variables_reference: 0,
            })
            .collect())
    }

    fn require_paused(&self, command: &str) -> Result<()> {
        if self.paused {
            Ok(())
        } else {
            Err(protocol_error(command, "debuggee is running"))
        }
    }
}

fn protocol_error(command: &str, message: impl Into<String>) -> DebugChartError {
    DebugChartError::Protocol {
        command: command.to_string(),
        message: message.into(),
    }
}

impl DebugSession for MemorySession {
    fn threads(&mut self) -> Result<Vec<Thread>> {
        self.requests.push(SessionRequest::Threads);
        Ok(vec![Thread {
            id: THREAD_ID,
            name: "main".to_string(),
        }])
    }

    fn stack_trace(
        &mut self,
        thread_id: i64,
        start_frame: i64,
        levels: i64,
    ) -> Result<Vec<StackFrame>> {
        self.requests.push(SessionRequest::StackTrace {
            thread_id,
            start_frame,
            levels,
        });
        self.require_paused("stackTrace")?;
        if thread_id != THREAD_ID {
            return Err(protocol_error("stackTrace", format!("unknown thread {}", thread_id)));
        }
        if start_frame > 0 || levels == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![StackFrame {
            id: FRAME_ID,
            name: "main".to_string(),
        }])
    }

    fn scopes(&mut self, frame_id: i64) -> Result<Vec<Scope>> {
        self.requests.push(SessionRequest::Scopes { frame_id });
        self.require_paused("scopes")?;
        if frame_id != FRAME_ID {
            return Err(protocol_error("scopes", format!("unknown frame {}", frame_id)));
        }
        Ok(vec![
            Scope {
                name: self.scope_name.clone(),
                variables_reference: LOCALS_REFERENCE,
            },
            Scope {
                name: "Globals".to_string(),
                variables_reference: GLOBALS_REFERENCE,
            },
        ])
    }

    fn variables(
        &mut self,
        variables_reference: i64,
        start: Option<i64>,
        count: Option<i64>,
    ) -> Result<Vec<DapVariable>> {
        self.requests.push(SessionRequest::Variables {
            reference: variables_reference,
            start,
            count,
        });
        self.require_paused("variables")?;

        if start.is_some() && start == self.fail_page_at {
            return Err(protocol_error("variables", "page request failed"));
        }

        match variables_reference {
            LOCALS_REFERENCE => Ok(self.local_variables()),
            GLOBALS_REFERENCE => Ok(Vec::new()),
            reference if reference >= FIRST_ARRAY_REFERENCE => {
                self.array_children(reference, start, count)
            }
            reference => Err(protocol_error(
                "variables",
                format!("unknown reference {}", reference),
            )),
        }
    }

    fn describe(&self) -> String {
        format!("in-memory session ({} locals)", self.locals.len())
    }
}
