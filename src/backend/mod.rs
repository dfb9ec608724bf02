//! Backend module for reading debuggee variables over the Debug Adapter Protocol
//!
//! This module handles all debug adapter traffic in a separate thread to keep
//! the UI responsive. It uses crossbeam channels for thread-safe communication
//! with the frontend.
//!
//! # Architecture
//!
//! The backend runs in a separate thread from the UI, communicating via channels:
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (connect, refresh, step, etc.)
//! - [`BackendMessage`] - Messages sent from backend to UI (chart updates, status, events)
//! - [`FrontendReceiver`] - UI-side handle for sending commands and receiving messages
//! - [`DebugBackend`] - Main backend entry point that runs the worker loop
//!
//! # Components
//!
//! - [`DebugSession`] - The four adapter requests the fetcher depends on
//! - [`DapClient`] - Session over a TCP connection to a real debug adapter
//! - [`MemorySession`] - Scripted in-process session for demos and tests
//! - [`ValueFetcher`] - Resolves watched names to numeric vectors
//! - [`BackendWorker`] - Main worker loop that processes commands and session events
//!
//! # Example
//!
//! ```ignore
//! use debugchart_rs::backend::DebugBackend;
//! use debugchart_rs::config::AppConfig;
//!
//! let (backend, frontend) = DebugBackend::new(AppConfig::default());
//!
//! // Spawn backend thread
//! std::thread::spawn(move || backend.run());
//!
//! // Send commands from UI
//! frontend.connect(None);
//!
//! // Receive messages
//! for msg in frontend.drain() {
//!     match msg {
//!         BackendMessage::ChartUpdate { chart_id, message } => {
//!             // Hand the message to the chart display
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod dap_client;
pub mod fetcher;
pub mod memory_session;
pub mod session;
pub mod worker;

pub use dap_client::{DapClient, SessionEvent};
pub use fetcher::{FetchOptions, ValueFetcher, PAGE_SIZE};
pub use memory_session::{MemorySession, MemoryValue, SessionRequest};
pub use session::{DapVariable, DebugSession, Scope, StackFrame, Thread};
pub use worker::BackendWorker;

use crate::chart::{DisplayMessage, RefreshRequest};
use crate::config::{AppConfig, SessionConfig};
use crate::types::{ChartId, ChartKind, ConnectionStatus};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Message sent from the UI to the backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Start a session with a debug adapter; `None` uses the configured session
    Connect(Option<SessionConfig>),
    /// Replace the current session with an in-memory one
    UseMemorySession(Box<MemorySession>),
    /// Advance the in-memory session and report a stop
    Step,
    /// End the current session
    Disconnect,
    /// Resolve a chart's watched names and post its series
    Refresh {
        chart_id: ChartId,
        names: Vec<String>,
        kind: ChartKind,
    },
    /// Shutdown the backend
    Shutdown,
}

/// Message sent from the backend to the UI
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// Connection status changed
    ConnectionStatus(ConnectionStatus),
    /// Connection error occurred
    ConnectionError(String),
    /// A session is ready to serve requests; only in-memory sessions can step
    SessionStarted { description: String, steppable: bool },
    /// The debuggee stopped (breakpoint, step, pause, ...)
    DebuggerStopped {
        reason: String,
        thread_id: Option<i64>,
    },
    /// The debuggee resumed
    DebuggerContinued,
    /// The session ended or the adapter went away
    SessionTerminated,
    /// Fresh series for a chart
    ChartUpdate {
        chart_id: ChartId,
        message: DisplayMessage,
    },
    /// Backend is shutting down
    Shutdown,
}

/// Frontend receiver for backend messages
pub struct FrontendReceiver {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Sender for commands to the backend
    pub command_sender: Sender<BackendCommand>,
}

impl FrontendReceiver {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        self.receiver.try_iter().collect()
    }

    /// Send a command to the backend
    pub fn send_command(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Request a session with a debug adapter
    pub fn connect(&self, config: Option<SessionConfig>) {
        let _ = self.command_sender.send(BackendCommand::Connect(config));
    }

    /// Use the built-in demo session
    pub fn use_demo_session(&self) {
        self.use_memory_session(MemorySession::demo());
    }

    /// Use an in-memory session
    pub fn use_memory_session(&self, session: MemorySession) {
        let _ = self
            .command_sender
            .send(BackendCommand::UseMemorySession(Box::new(session)));
    }

    /// Step the in-memory session
    pub fn step(&self) {
        let _ = self.command_sender.send(BackendCommand::Step);
    }

    /// Request disconnection
    pub fn disconnect(&self) {
        let _ = self.command_sender.send(BackendCommand::Disconnect);
    }

    /// Ask the backend to refresh one chart
    pub fn refresh(&self, request: RefreshRequest) {
        tracing::debug!(
            "Refresh of chart {} requested ({})",
            request.chart_id,
            request.trigger
        );
        let _ = self.command_sender.send(BackendCommand::Refresh {
            chart_id: request.chart_id,
            names: request.names,
            kind: request.kind,
        });
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }
}

/// The debug backend that runs in a separate thread
pub struct DebugBackend {
    /// Configuration
    config: AppConfig,
    /// Receiver for commands from the UI
    command_receiver: Receiver<BackendCommand>,
    /// Sender for messages to the UI
    message_sender: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl DebugBackend {
    /// Create a new backend with communication channels
    pub fn new(config: AppConfig) -> (Self, FrontendReceiver) {
        let (cmd_tx, cmd_rx) = bounded(256);
        let (msg_tx, msg_rx) = bounded(1_024);

        let backend = Self {
            config,
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let frontend = FrontendReceiver {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, frontend)
    }

    /// Run the backend loop
    pub fn run(self) {
        let mut worker = BackendWorker::new(
            self.config,
            self.command_receiver,
            self.message_sender,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
