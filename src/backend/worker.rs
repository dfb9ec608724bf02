//! Backend Worker Thread Implementation
//!
//! This module contains the worker loop that owns the debug session. It runs
//! in its own thread and talks to the UI thread through crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Session lifecycle**: connect to an adapter, install an in-memory
//!   session, disconnect, notice when the adapter goes away
//! - **Refreshes**: resolve a chart's watched names, build its series and
//!   post the resulting display message
//! - **Events**: forward `stopped`/`continued`/`terminated` notifications so
//!   the UI can refresh every open chart
//!
//! Commands are handled one at a time, so the requests of one refresh never
//! interleave with those of another.

use crate::backend::dap_client::{DapClient, SessionEvent};
use crate::backend::fetcher::{FetchOptions, ValueFetcher};
use crate::backend::memory_session::MemorySession;
use crate::backend::session::DebugSession;
use crate::backend::{BackendCommand, BackendMessage};
use crate::chart::{self, DisplayMessage};
use crate::config::{AppConfig, SessionConfig};
use crate::types::{ChartId, ChartKind, ConnectionStatus};
use crossbeam_channel::{never, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long the loop waits for work before re-checking the running flag
const IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// The session currently owned by the worker
enum ActiveSession {
    Dap(DapClient),
    Memory(MemorySession),
}

impl ActiveSession {
    fn session(&mut self) -> &mut dyn DebugSession {
        match self {
            ActiveSession::Dap(client) => client,
            ActiveSession::Memory(session) => session,
        }
    }

    fn events(&self) -> Option<Receiver<SessionEvent>> {
        match self {
            ActiveSession::Dap(client) => Some(client.events()),
            ActiveSession::Memory(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            ActiveSession::Dap(client) => client.describe(),
            ActiveSession::Memory(session) => session.describe(),
        }
    }
}

/// The backend worker that owns the debug session
pub struct BackendWorker {
    /// Command receiver from the UI
    command_rx: Receiver<BackendCommand>,
    /// Message sender to the UI
    message_tx: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Default session settings for `Connect` without overrides
    session_config: SessionConfig,
    /// Resolves watched names
    fetcher: ValueFetcher,
    /// Active session, if any
    session: Option<ActiveSession>,
    /// Event stream of the active session
    events: Option<Receiver<SessionEvent>>,
}

impl BackendWorker {
    /// Create a new backend worker
    pub fn new(
        config: AppConfig,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            command_rx,
            message_tx,
            running,
            fetcher: ValueFetcher::new(FetchOptions::from(&config.fetch)),
            session_config: config.session,
            session: None,
            events: None,
        }
    }

    /// Run the worker loop until shutdown
    pub fn run(&mut self) {
        tracing::info!("Backend worker started");

        while self.running.load(Ordering::SeqCst) {
            let events = self.events.clone().unwrap_or_else(never);

            select! {
                recv(self.command_rx) -> cmd => match cmd {
                    Ok(cmd) => self.handle_command(cmd),
                    Err(_) => {
                        tracing::info!("Command channel closed, stopping backend");
                        self.running.store(false, Ordering::SeqCst);
                    }
                },
                recv(events) -> event => match event {
                    Ok(event) => self.handle_event(event),
                    Err(_) => self.handle_session_lost(),
                },
                default(IDLE_TIMEOUT) => {}
            }
        }

        self.close_session();
        let _ = self.message_tx.send(BackendMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    fn send(&self, message: BackendMessage) {
        if self.message_tx.send(message).is_err() {
            tracing::debug!("UI receiver dropped a backend message");
        }
    }

    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Connect(config) => {
                let config = config.unwrap_or_else(|| self.session_config.clone());
                self.connect(&config);
            }
            BackendCommand::UseMemorySession(session) => {
                self.close_session();
                self.install(ActiveSession::Memory(*session));
            }
            BackendCommand::Step => self.step(),
            BackendCommand::Disconnect => {
                self.close_session();
                self.send(BackendMessage::ConnectionStatus(ConnectionStatus::Disconnected));
            }
            BackendCommand::Refresh {
                chart_id,
                names,
                kind,
            } => self.refresh(chart_id, &names, kind),
            BackendCommand::Shutdown => {
                tracing::info!("Shutdown requested");
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    fn connect(&mut self, config: &SessionConfig) {
        self.close_session();
        self.send(BackendMessage::ConnectionStatus(ConnectionStatus::Connecting));

        match DapClient::start(config) {
            Ok(client) => self.install(ActiveSession::Dap(client)),
            Err(e) => {
                tracing::warn!("Failed to start debug session at {}: {}", config.address, e);
                self.send(BackendMessage::ConnectionError(e.to_string()));
                self.send(BackendMessage::ConnectionStatus(ConnectionStatus::Error));
            }
        }
    }

    fn install(&mut self, session: ActiveSession) {
        let description = session.describe();
        let steppable = matches!(session, ActiveSession::Memory(_));
        tracing::info!("Debug session started: {}", description);
        self.events = session.events();
        self.session = Some(session);
        self.send(BackendMessage::ConnectionStatus(ConnectionStatus::Connected));
        self.send(BackendMessage::SessionStarted {
            description,
            steppable,
        });
    }

    fn close_session(&mut self) {
        self.events = None;
        if let Some(session) = self.session.take() {
            tracing::info!("Debug session ended: {}", session.describe());
            if let ActiveSession::Dap(mut client) = session {
                client.disconnect();
            }
        }
    }

    fn handle_session_lost(&mut self) {
        tracing::info!("Debug adapter closed the connection");
        self.events = None;
        self.session = None;
        self.send(BackendMessage::SessionTerminated);
        self.send(BackendMessage::ConnectionStatus(ConnectionStatus::Disconnected));
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Stopped { reason, thread_id } => {
                tracing::info!("Debugger stopped, reason: {}", reason);
                self.send(BackendMessage::DebuggerStopped { reason, thread_id });
            }
            SessionEvent::Continued => self.send(BackendMessage::DebuggerContinued),
            SessionEvent::Terminated | SessionEvent::Exited { .. } => {
                tracing::info!("Debug session ended ({:?})", event);
                self.close_session();
                self.send(BackendMessage::SessionTerminated);
                self.send(BackendMessage::ConnectionStatus(ConnectionStatus::Disconnected));
            }
            SessionEvent::Initialized | SessionEvent::Other(_) => {
                tracing::debug!("Debug custom event received: {:?}", event);
            }
        }
    }

    /// Advance an in-memory session and report a stop, like a real step would
    fn step(&mut self) {
        match &mut self.session {
            Some(ActiveSession::Memory(session)) => {
                session.step();
                self.send(BackendMessage::DebuggerStopped {
                    reason: "step".to_string(),
                    thread_id: Some(crate::backend::memory_session::THREAD_ID),
                });
            }
            _ => tracing::debug!("Step ignored: no in-memory session"),
        }
    }

    fn refresh(&mut self, chart_id: ChartId, names: &[String], kind: ChartKind) {
        tracing::debug!("Updating chart {}", chart_id);
        let session = self.session.as_mut().map(ActiveSession::session);
        let points = self.fetcher.resolve(session, names);
        tracing::debug!(
            "Resolved {} values for chart {}: {:?}",
            points.total_values(),
            chart_id,
            points
        );

        let data = chart::build(&points, kind);
        self.send(BackendMessage::ChartUpdate {
            chart_id,
            message: DisplayMessage::update(data),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SeriesDescription;
    use crossbeam_channel::bounded;

    fn worker() -> (BackendWorker, Sender<BackendCommand>, Receiver<BackendMessage>) {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (msg_tx, msg_rx) = bounded(64);
        let worker = BackendWorker::new(
            AppConfig::default(),
            cmd_rx,
            msg_tx,
            Arc::new(AtomicBool::new(true)),
        );
        (worker, cmd_tx, msg_rx)
    }

    #[test]
    fn test_refresh_without_session_posts_empty_series() {
        let (mut worker, _tx, rx) = worker();
        worker.handle_command(BackendCommand::Refresh {
            chart_id: ChartId(7),
            names: vec!["x".into(), "y".into()],
            kind: ChartKind::Line,
        });

        match rx.try_recv().unwrap() {
            BackendMessage::ChartUpdate { chart_id, message } => {
                assert_eq!(chart_id, ChartId(7));
                let DisplayMessage::UpdateChart { data } = message;
                assert_eq!(data.len(), 2);
                assert_eq!(data.point_count(), 0);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_refresh_with_memory_session() {
        let (mut worker, _tx, rx) = worker();
        let session = MemorySession::new().with_array("arr", [1.0, 2.0]);
        worker.handle_command(BackendCommand::UseMemorySession(Box::new(session)));
        let _: Vec<_> = rx.try_iter().collect();

        worker.handle_command(BackendCommand::Refresh {
            chart_id: ChartId(1),
            names: vec!["arr".into()],
            kind: ChartKind::Pie,
        });

        let Ok(BackendMessage::ChartUpdate { message, .. }) = rx.try_recv() else {
            panic!("expected chart update");
        };
        let DisplayMessage::UpdateChart { data } = message;
        let SeriesDescription::Pie(slices) = data else {
            panic!("expected pie data");
        };
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[1].name, "arr[1]");
    }

    #[test]
    fn test_step_reports_stop() {
        let (mut worker, _tx, rx) = worker();
        worker.handle_command(BackendCommand::UseMemorySession(Box::new(MemorySession::demo())));
        let _: Vec<_> = rx.try_iter().collect();

        worker.handle_command(BackendCommand::Step);
        assert!(matches!(
            rx.try_recv(),
            Ok(BackendMessage::DebuggerStopped { ref reason, .. }) if reason == "step"
        ));
    }

    #[test]
    fn test_terminated_event_closes_session() {
        let (mut worker, _tx, rx) = worker();
        worker.handle_command(BackendCommand::UseMemorySession(Box::new(MemorySession::new())));
        let _: Vec<_> = rx.try_iter().collect();

        worker.handle_event(SessionEvent::Terminated);
        assert!(worker.session.is_none());
        let messages: Vec<_> = rx.try_iter().collect();
        assert!(messages
            .iter()
            .any(|m| matches!(m, BackendMessage::SessionTerminated)));
    }

    #[test]
    fn test_connect_failure_reports_error() {
        let (mut worker, _tx, rx) = worker();
        let config = SessionConfig {
            address: "127.0.0.1:1".to_string(),
            ..Default::default()
        };
        worker.handle_command(BackendCommand::Connect(Some(config)));

        let messages: Vec<_> = rx.try_iter().collect();
        assert!(messages
            .iter()
            .any(|m| matches!(m, BackendMessage::ConnectionError(_))));
        assert!(messages.iter().any(|m| matches!(
            m,
            BackendMessage::ConnectionStatus(ConnectionStatus::Error)
        )));
    }
}
