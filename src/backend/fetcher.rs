//! Value fetching from a paused debug session
//!
//! Resolves watched variable names to numeric sequences by walking
//! threads → top stack frame → local scope → variables, and paging through
//! composite variables to flatten their numeric children.
//!
//! # Failure policy
//!
//! Nothing in here returns an error to the caller. A missing session, an
//! empty thread list, a protocol failure or a non-numeric value all degrade
//! to empty sequences, which the chart shows as "no data yet". This is the
//! normal state while the debuggee is running.

use crate::backend::session::{DapVariable, DebugSession};
use crate::config::FetchConfig;
use crate::error::Result;
use crate::types::{parse_float, DataPoints};

/// Number of children requested per `variables` page
pub const PAGE_SIZE: i64 = 10;

/// Scope names treated as the frame's locals
pub const LOCAL_SCOPE_NAMES: [&str; 2] = ["Local", "Locals"];

/// Paging options for composite variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Children requested per page
    pub page_size: i64,
    /// Stop after this many pages; `None` pages until the adapter runs dry
    pub max_pages: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_pages: None,
        }
    }
}

impl From<&FetchConfig> for FetchOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            max_pages: config.max_pages,
        }
    }
}

/// Resolves watched names against a debug session
#[derive(Debug, Clone, Default)]
pub struct ValueFetcher {
    options: FetchOptions,
}

impl ValueFetcher {
    /// Create a fetcher with explicit paging options
    pub fn new(options: FetchOptions) -> Self {
        Self { options }
    }

    /// Resolve every watched name to its current values
    ///
    /// The returned mapping always contains every name, in watch order.
    /// Names that could not be resolved map to an empty sequence.
    pub fn resolve(
        &self,
        session: Option<&mut dyn DebugSession>,
        names: &[String],
    ) -> DataPoints {
        let mut points = DataPoints::with_names(names);

        let Some(session) = session else {
            tracing::trace!("No active debug session, {} variables left empty", names.len());
            return points;
        };

        match self.try_resolve(session, names) {
            Ok(resolved) => {
                for (name, values) in resolved.iter() {
                    points.insert(name, values.to_vec());
                }
            }
            Err(e) => {
                tracing::warn!("Failed to resolve debug values: {}", e);
            }
        }

        points
    }

    fn try_resolve(&self, session: &mut dyn DebugSession, names: &[String]) -> Result<DataPoints> {
        let locals = match self.local_variables(session)? {
            Some(locals) => locals,
            None => return Ok(DataPoints::new()),
        };

        let mut resolved = DataPoints::new();
        for name in names {
            let values = match find_variable(&locals, name) {
                Some(var) if var.is_composite() => self.fetch_all(session, var.variables_reference),
                Some(var) => match parse_float(&var.value) {
                    Some(value) => vec![value],
                    None => {
                        tracing::trace!("Variable '{}' is not numeric: {:?}", name, var.value);
                        Vec::new()
                    }
                },
                None => {
                    tracing::trace!("Variable '{}' not found in locals", name);
                    Vec::new()
                }
            };
            resolved.insert(name.as_str(), values);
        }

        Ok(resolved)
    }

    /// Walk to the top frame's local scope and list its variables
    ///
    /// `Ok(None)` means the session is reachable but there is nothing to read
    /// (no threads, no frames, no local scope).
    fn local_variables(&self, session: &mut dyn DebugSession) -> Result<Option<Vec<DapVariable>>> {
        let threads = session.threads()?;
        let Some(thread) = threads.first() else {
            tracing::debug!("No threads available");
            return Ok(None);
        };

        let frames = session.stack_trace(thread.id, 0, 1)?;
        let Some(frame) = frames.first() else {
            tracing::debug!("No stack frames available for thread {}", thread.id);
            return Ok(None);
        };

        let scopes = session.scopes(frame.id)?;
        let Some(scope) = scopes
            .iter()
            .find(|s| LOCAL_SCOPE_NAMES.contains(&s.name.as_str()))
        else {
            tracing::debug!("No local scope found in frame {}", frame.id);
            return Ok(None);
        };

        session
            .variables(scope.variables_reference, None, None)
            .map(Some)
            .map_err(|e| e.with_context("Failed to list local variables"))
    }

    /// Page through a composite variable and collect its numeric children
    ///
    /// Stops at the first failed request, empty page or short page. Values
    /// gathered before a failure are kept.
    pub fn fetch_all(&self, session: &mut dyn DebugSession, variables_reference: i64) -> Vec<f64> {
        let page_size = self.options.page_size;
        let mut values = Vec::new();
        let mut start = 0;
        let mut pages = 0usize;

        loop {
            if let Some(max) = self.options.max_pages {
                if pages >= max {
                    tracing::debug!(
                        "Stopped paging reference {} after {} pages",
                        variables_reference,
                        max
                    );
                    break;
                }
            }

            let page = match session.variables(variables_reference, Some(start), Some(page_size)) {
                Ok(page) => page,
                Err(e) => {
                    tracing::debug!(
                        "Page at {} of reference {} failed, keeping {} values: {}",
                        start,
                        variables_reference,
                        values.len(),
                        e
                    );
                    break;
                }
            };
            pages += 1;

            if page.is_empty() {
                break;
            }

            values.extend(page.iter().filter_map(|child| parse_float(&child.value)));

            if (page.len() as i64) < page_size {
                break;
            }
            start += page_size;
        }

        values
    }
}

fn find_variable<'a>(locals: &'a [DapVariable], name: &str) -> Option<&'a DapVariable> {
    locals
        .iter()
        .find(|v| v.evaluate_name.as_deref() == Some(name))
}

/// Resolve names with the default paging options
pub fn resolve(session: Option<&mut dyn DebugSession>, names: &[String]) -> DataPoints {
    ValueFetcher::default().resolve(session, names)
}

/// Page through a composite variable with the default paging options
pub fn fetch_all(session: &mut dyn DebugSession, variables_reference: i64) -> Vec<f64> {
    ValueFetcher::default().fetch_all(session, variables_reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::session::{MockDebugSession, Scope, StackFrame, Thread};
    use crate::error::DebugChartError;
    use mockall::predicate::eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn page(start: usize, len: usize) -> Vec<DapVariable> {
        (start..start + len)
            .map(|i| DapVariable {
                name: format!("[{}]", i),
                value: format!("{}", i),
                evaluate_name: None,
                variables_reference: 0,
            })
            .collect()
    }

    /// Mock that answers threads/stackTrace/scopes for a single paused thread
    fn paused_session(locals: Vec<DapVariable>) -> MockDebugSession {
        let mut mock = MockDebugSession::new();
        mock.expect_threads().returning(|| {
            Ok(vec![Thread {
                id: 1,
                name: "main".into(),
            }])
        });
        mock.expect_stack_trace()
            .with(eq(1), eq(0), eq(1))
            .returning(|_, _, _| {
                Ok(vec![StackFrame {
                    id: 100,
                    name: "main".into(),
                }])
            });
        mock.expect_scopes().with(eq(100)).returning(|_| {
            Ok(vec![
                Scope {
                    name: "Locals".into(),
                    variables_reference: 3,
                },
                Scope {
                    name: "Globals".into(),
                    variables_reference: 4,
                },
            ])
        });
        mock.expect_variables()
            .withf(|reference, start, count| *reference == 3 && start.is_none() && count.is_none())
            .returning(move |_, _, _| Ok(locals.clone()));
        mock
    }

    #[test]
    fn test_resolve_without_session_maps_all_names_empty() {
        let points = resolve(None, &names(&["x", "y", "z"]));
        assert_eq!(points.len(), 3);
        assert!(points.all_empty());
    }

    #[test]
    fn test_resolve_scalar() {
        let mut mock = paused_session(vec![DapVariable::scalar("x", "3.14")]);
        let points = resolve(Some(&mut mock as &mut dyn DebugSession), &names(&["x"]));
        assert_eq!(points.get("x"), Some(&[3.14][..]));
    }

    #[test]
    fn test_resolve_non_numeric_scalar_is_empty() {
        let mut mock = paused_session(vec![DapVariable::scalar("x", "undefined")]);
        let points = resolve(Some(&mut mock as &mut dyn DebugSession), &names(&["x"]));
        assert_eq!(points.get("x"), Some(&[][..]));
    }

    #[test]
    fn test_resolve_matches_evaluate_name_exactly() {
        let mut var = DapVariable::scalar("count", "5");
        var.evaluate_name = Some("self.count".to_string());
        let mut mock = paused_session(vec![var]);

        let points = resolve(
            Some(&mut mock as &mut dyn DebugSession),
            &names(&["count", "self.count", "Self.count"]),
        );
        assert_eq!(points.get("count"), Some(&[][..]));
        assert_eq!(points.get("self.count"), Some(&[5.0][..]));
        assert_eq!(points.get("Self.count"), Some(&[][..]));
    }

    #[test]
    fn test_resolve_composite_pages_children() {
        let mut mock = paused_session(vec![DapVariable::composite("arr", "int[12]", 7)]);
        mock.expect_variables()
            .withf(|reference, start, count| {
                *reference == 7 && *start == Some(0) && *count == Some(PAGE_SIZE)
            })
            .times(1)
            .returning(|_, _, _| Ok(page(0, 10)));
        mock.expect_variables()
            .withf(|reference, start, _| *reference == 7 && *start == Some(10))
            .times(1)
            .returning(|_, _, _| Ok(page(10, 2)));

        let points = resolve(Some(&mut mock as &mut dyn DebugSession), &names(&["arr"]));
        let expected: Vec<f64> = (0..12).map(|i| i as f64).collect();
        assert_eq!(points.get("arr"), Some(expected.as_slice()));
    }

    #[test]
    fn test_resolve_no_threads() {
        let mut mock = MockDebugSession::new();
        mock.expect_threads().returning(|| Ok(Vec::new()));
        mock.expect_stack_trace().never();

        let points = resolve(Some(&mut mock as &mut dyn DebugSession), &names(&["x"]));
        assert_eq!(points.len(), 1);
        assert!(points.all_empty());
    }

    #[test]
    fn test_resolve_without_local_scope() {
        let mut mock = MockDebugSession::new();
        mock.expect_threads()
            .returning(|| Ok(vec![Thread { id: 1, name: String::new() }]));
        mock.expect_stack_trace()
            .returning(|_, _, _| Ok(vec![StackFrame { id: 2, name: String::new() }]));
        mock.expect_scopes().returning(|_| {
            Ok(vec![Scope {
                name: "Registers".into(),
                variables_reference: 9,
            }])
        });
        mock.expect_variables().never();

        let points = resolve(Some(&mut mock as &mut dyn DebugSession), &names(&["x"]));
        assert!(points.all_empty());
    }

    #[test]
    fn test_resolve_protocol_error_yields_empty_mapping() {
        let mut mock = MockDebugSession::new();
        mock.expect_threads().returning(|| {
            Err(DebugChartError::Protocol {
                command: "threads".into(),
                message: "not stopped".into(),
            })
        });

        let points = resolve(Some(&mut mock as &mut dyn DebugSession), &names(&["a", "b"]));
        assert_eq!(points.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(points.all_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut mock = paused_session(vec![
            DapVariable::scalar("x", "1.5"),
            DapVariable::scalar("y", "oops"),
        ]);
        let watched = names(&["x", "y", "missing"]);

        let first = resolve(Some(&mut mock as &mut dyn DebugSession), &watched);
        let second = resolve(Some(&mut mock as &mut dyn DebugSession), &watched);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fetch_all_three_pages() {
        let mut mock = MockDebugSession::new();
        let mut seq = mockall::Sequence::new();
        for (start, len) in [(0, 10), (10, 10), (20, 3)] {
            mock.expect_variables()
                .withf(move |reference, s, count| {
                    *reference == 42 && *s == Some(start as i64) && *count == Some(10)
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _, _| Ok(page(start, len)));
        }

        let values = fetch_all(&mut mock, 42);
        assert_eq!(values.len(), 23);
        assert_eq!(values.first(), Some(&0.0));
        assert_eq!(values.last(), Some(&22.0));
    }

    #[test]
    fn test_fetch_all_stops_at_failed_page() {
        let mut mock = MockDebugSession::new();
        mock.expect_variables()
            .withf(|_, start, _| *start == Some(0))
            .times(1)
            .returning(|_, _, _| Ok(page(0, 10)));
        mock.expect_variables()
            .withf(|_, start, _| *start == Some(10))
            .times(1)
            .returning(|_, _, _| Err(DebugChartError::Session("connection lost".into())));

        let values = fetch_all(&mut mock, 1);
        assert_eq!(values.len(), 10);
    }

    #[test]
    fn test_fetch_all_drops_non_numeric_children() {
        let mut mock = MockDebugSession::new();
        mock.expect_variables().times(1).returning(|_, _, _| {
            Ok(vec![
                DapVariable::scalar("[0]", "1"),
                DapVariable::scalar("[1]", "{...}"),
                DapVariable::scalar("[2]", "2.5"),
            ])
        });

        assert_eq!(fetch_all(&mut mock, 1), vec![1.0, 2.5]);
    }

    #[test]
    fn test_fetch_all_empty_first_page() {
        let mut mock = MockDebugSession::new();
        mock.expect_variables().times(1).returning(|_, _, _| Ok(Vec::new()));
        assert!(fetch_all(&mut mock, 1).is_empty());
    }

    #[test]
    fn test_fetch_all_respects_max_pages() {
        let mut mock = MockDebugSession::new();
        mock.expect_variables()
            .times(2)
            .returning(|_, start, _| Ok(page(start.unwrap_or(0) as usize, 10)));

        let fetcher = ValueFetcher::new(FetchOptions {
            page_size: 10,
            max_pages: Some(2),
        });
        assert_eq!(fetcher.fetch_all(&mut mock, 1).len(), 20);
    }

    #[test]
    fn test_fetch_options_from_config_clamps_page_size() {
        let config = FetchConfig {
            page_size: 0,
            max_pages: Some(5),
        };
        let options = FetchOptions::from(&config);
        assert_eq!(options.page_size, 1);
        assert_eq!(options.max_pages, Some(5));
    }
}
