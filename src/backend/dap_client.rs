//! Debug Adapter Protocol client over TCP
//!
//! Connects to a debug adapter listening on a socket, performs the
//! `initialize` → `attach`/`launch` → `initialized` event → `configurationDone`
//! handshake, and then serves the four [`DebugSession`] requests.
//!
//! # Threads
//!
//! A reader thread owns the receiving half of the socket. Responses are
//! routed to the caller waiting on the matching `request_seq`; events are
//! forwarded on a channel as [`SessionEvent`]s. When the connection closes,
//! every waiting caller is released with an error and the event channel is
//! disconnected.
//!
//! # Framing
//!
//! Each message is a JSON body preceded by a `Content-Length` header and a
//! blank line, see [`read_message`] and [`write_message`].

use super::session::{DapVariable, DebugSession, Scope, StackFrame, Thread};
use crate::config::{SessionConfig, StartRequest};
use crate::error::{DebugChartError, Result};
use crate::error::ResultExt;
use crossbeam_channel::{bounded, never, select, unbounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Client identifier sent in `initialize`
pub const CLIENT_ID: &str = "debugchart-rs";

/// How often a caller without a request timeout checks that the reader is alive
const READER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long to wait for the `initialized` event when no request timeout is set
pub const INITIALIZED_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification from the adapter
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Adapter is ready to accept configuration
    Initialized,
    /// Debuggee paused
    Stopped {
        reason: String,
        thread_id: Option<i64>,
    },
    /// Debuggee resumed
    Continued,
    /// Debug session ended
    Terminated,
    /// Debuggee exited with a code
    Exited { exit_code: i64 },
    /// Any other event, by name
    Other(String),
}

impl SessionEvent {
    /// Map a raw DAP event message to a session event
    pub fn from_message(event: &str, body: &Value) -> Self {
        match event {
            "initialized" => SessionEvent::Initialized,
            "stopped" => SessionEvent::Stopped {
                reason: body
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                thread_id: body.get("threadId").and_then(Value::as_i64),
            },
            "continued" => SessionEvent::Continued,
            "terminated" => SessionEvent::Terminated,
            "exited" => SessionEvent::Exited {
                exit_code: body.get("exitCode").and_then(Value::as_i64).unwrap_or(0),
            },
            other => SessionEvent::Other(other.to_string()),
        }
    }
}

/// Outgoing request envelope
#[derive(Debug, Serialize)]
struct DapRequest<'a> {
    seq: i64,
    #[serde(rename = "type")]
    r#type: &'static str,
    command: &'a str,
    arguments: Value,
}

/// Incoming response envelope
#[derive(Debug, Clone, Deserialize)]
struct DapResponse {
    request_seq: i64,
    success: bool,
    command: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Deserialize)]
struct ThreadsBody {
    #[serde(default)]
    threads: Vec<Thread>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StackTraceBody {
    #[serde(default)]
    stack_frames: Vec<StackFrame>,
}

#[derive(Deserialize)]
struct ScopesBody {
    #[serde(default)]
    scopes: Vec<Scope>,
}

#[derive(Deserialize)]
struct VariablesBody {
    #[serde(default)]
    variables: Vec<DapVariable>,
}

type PendingMap = Arc<Mutex<HashMap<i64, Sender<DapResponse>>>>;

/// Read one framed message
///
/// Returns an error when the stream closes before a complete message.
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Value> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read_n = reader.read_line(&mut line)?;
        if read_n == 0 {
            return Err(DebugChartError::Session("DAP connection closed".to_string()));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some(v) = line.strip_prefix("Content-Length:") {
            content_length = Some(v.trim().parse().map_err(|_| {
                DebugChartError::Serialization(format!("bad Content-Length header: {}", line))
            })?);
        }
    }

    let len = content_length
        .ok_or_else(|| DebugChartError::Serialization("missing Content-Length".to_string()))?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Write one framed message
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    write!(writer, "Content-Length: {}\r\n\r\n", payload.len())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Debug session talking to an adapter over TCP
pub struct DapClient {
    address: String,
    stream: TcpStream,
    next_seq: i64,
    pending: PendingMap,
    events: Receiver<SessionEvent>,
    initialized: Receiver<()>,
    request_timeout: Option<Duration>,
    reader: Option<JoinHandle<()>>,
}

impl DapClient {
    /// Open the socket and start the reader thread
    ///
    /// No DAP traffic is sent; call [`DapClient::handshake`] next.
    pub fn connect(address: &str, request_timeout: Option<Duration>) -> Result<Self> {
        let stream = TcpStream::connect(address).map_err(|e| {
            DebugChartError::Connection(format!("failed to connect to {}: {}", address, e))
        })?;
        stream.set_nodelay(true)?;
        let read_half = stream.try_clone()?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = unbounded();
        let (initialized_tx, initialized_rx) = bounded(1);

        let reader_pending = pending.clone();
        let reader = std::thread::Builder::new()
            .name("dap-reader".to_string())
            .spawn(move || {
                reader_loop(
                    BufReader::new(read_half),
                    reader_pending,
                    event_tx,
                    initialized_tx,
                )
            })?;

        tracing::info!("Connected to debug adapter at {}", address);

        Ok(Self {
            address: address.to_string(),
            stream,
            next_seq: 1,
            pending,
            events: event_rx,
            initialized: initialized_rx,
            request_timeout,
            reader: Some(reader),
        })
    }

    /// Connect and start a session as described by the configuration
    pub fn start(config: &SessionConfig) -> Result<Self> {
        let mut client = Self::connect(&config.address, config.request_timeout())?;
        client
            .handshake(config.request, config.arguments_json()?)
            .with_context(|| format!("Handshake with {} failed", config.address))?;
        Ok(client)
    }

    /// Run `initialize`, `attach`/`launch` and `configurationDone`
    ///
    /// `configurationDone` is only sent once the adapter has announced
    /// `initialized`. Some adapters only answer `launch` after
    /// `configurationDone`, so the start request's response is awaited last.
    pub fn handshake(&mut self, request: StartRequest, arguments: Value) -> Result<()> {
        self.request(
            "initialize",
            json!({
                "clientID": CLIENT_ID,
                "clientName": "Debug Chart",
                "adapterID": CLIENT_ID,
                "linesStartAt1": true,
                "columnsStartAt1": true,
                "pathFormat": "path",
                "supportsVariableType": true,
                "supportsVariablePaging": true,
            }),
        )?;

        let command = request.command();
        let start_rx = self.send_request(command, arguments)?;
        let early_response = self.await_initialized(command, &start_rx)?;
        self.request("configurationDone", json!({}))?;
        match early_response {
            Some(response) => response_body(response)?,
            None => self.await_response(command, start_rx)?,
        };

        tracing::info!("Debug session started ({}) on {}", command, self.address);
        Ok(())
    }

    /// Events received from the adapter
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events.clone()
    }

    /// End the session without terminating the debuggee and close the socket
    pub fn disconnect(&mut self) {
        if let Ok(rx) = self.send_request("disconnect", json!({ "terminateDebuggee": false })) {
            let _ = rx.recv_timeout(Duration::from_millis(500));
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }

    fn send_request(&mut self, command: &str, arguments: Value) -> Result<Receiver<DapResponse>> {
        let seq = self.next_seq;
        self.next_seq += 1;

        let (tx, rx) = bounded(1);
        self.pending
            .lock()
            .map_err(|_| DebugChartError::Channel("pending request table poisoned".to_string()))?
            .insert(seq, tx);

        let request = DapRequest {
            seq,
            r#type: "request",
            command,
            arguments,
        };
        tracing::trace!("-> {} (seq {})", command, seq);

        if let Err(e) = write_message(&mut self.stream, &request) {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&seq);
            }
            return Err(e.with_context(format!("Failed to send '{}'", command)));
        }
        Ok(rx)
    }

    /// Wait for the `initialized` event
    ///
    /// The start request may be answered first. A failed answer ends the
    /// wait; a successful one is handed back so it is not awaited twice.
    fn await_initialized(
        &self,
        command: &str,
        start_rx: &Receiver<DapResponse>,
    ) -> Result<Option<DapResponse>> {
        let timeout = self.request_timeout.unwrap_or(INITIALIZED_TIMEOUT);
        let deadline = Instant::now() + timeout;
        let mut early_response = None;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DebugChartError::Timeout(format!(
                    "no 'initialized' event within {:?}",
                    timeout
                )));
            }

            let start = if early_response.is_none() {
                start_rx.clone()
            } else {
                never()
            };

            select! {
                recv(self.initialized) -> msg => {
                    return match msg {
                        Ok(()) => Ok(early_response),
                        Err(_) => Err(connection_closed("initialized")),
                    };
                }
                recv(start) -> msg => match msg {
                    Ok(response) if response.success => early_response = Some(response),
                    Ok(response) => return Err(protocol_error(response)),
                    Err(_) => return Err(connection_closed(command)),
                },
                default(remaining.min(READER_POLL_INTERVAL)) => {
                    if self.reader_finished() && self.initialized.is_empty() {
                        return Err(connection_closed("initialized"));
                    }
                }
            }
        }
    }

    fn await_response(&self, command: &str, rx: Receiver<DapResponse>) -> Result<Value> {
        let response = match self.request_timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|_| {
                DebugChartError::Timeout(format!(
                    "no response to '{}' within {:?}",
                    command, timeout
                ))
            })?,
            None => loop {
                match rx.recv_timeout(READER_POLL_INTERVAL) {
                    Ok(response) => break response,
                    Err(RecvTimeoutError::Timeout) if !self.reader_finished() => continue,
                    Err(_) => return Err(connection_closed(command)),
                }
            },
        };

        response_body(response)
    }

    /// Send a request and wait for its response body
    pub fn request(&mut self, command: &str, arguments: Value) -> Result<Value> {
        let rx = self.send_request(command, arguments)?;
        self.await_response(command, rx)
    }

    fn request_as<T: serde::de::DeserializeOwned>(
        &mut self,
        command: &str,
        arguments: Value,
    ) -> Result<T> {
        let body = match self.request(command, arguments)? {
            Value::Null => json!({}),
            body => body,
        };
        Ok(serde_json::from_value(body)?)
    }

    fn reader_finished(&self) -> bool {
        self.reader.as_ref().map_or(true, |reader| reader.is_finished())
    }
}

impl Drop for DapClient {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl std::fmt::Debug for DapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DapClient")
            .field("address", &self.address)
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

fn protocol_error(response: DapResponse) -> DebugChartError {
    DebugChartError::Protocol {
        command: response.command,
        message: response.message.unwrap_or_else(|| "request failed".to_string()),
    }
}

fn response_body(response: DapResponse) -> Result<Value> {
    if !response.success {
        return Err(protocol_error(response));
    }
    Ok(response.body.unwrap_or(Value::Null))
}

fn connection_closed(waiting_for: &str) -> DebugChartError {
    DebugChartError::Session(format!("connection closed while waiting for '{}'", waiting_for))
}

fn reader_loop<R: BufRead>(
    mut reader: R,
    pending: PendingMap,
    events: Sender<SessionEvent>,
    initialized: Sender<()>,
) {
    loop {
        let message = match read_message(&mut reader) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("DAP reader stopped: {}", e);
                break;
            }
        };

        match message.get("type").and_then(Value::as_str) {
            Some("response") => match serde_json::from_value::<DapResponse>(message) {
                Ok(response) => {
                    tracing::trace!(
                        "<- {} (request_seq {})",
                        response.command,
                        response.request_seq
                    );
                    let waiter = pending
                        .lock()
                        .ok()
                        .and_then(|mut p| p.remove(&response.request_seq));
                    match waiter {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => tracing::debug!(
                            "Dropping response to unknown request {}",
                            response.request_seq
                        ),
                    }
                }
                Err(e) => tracing::warn!("Malformed DAP response: {}", e),
            },
            Some("event") => {
                let name = message.get("event").and_then(Value::as_str).unwrap_or("");
                let body = message.get("body").cloned().unwrap_or(Value::Null);
                let event = SessionEvent::from_message(name, &body);
                tracing::debug!("DAP event: {:?}", event);
                let is_initialized = event == SessionEvent::Initialized;
                if events.send(event).is_err() {
                    break;
                }
                if is_initialized {
                    let _ = initialized.try_send(());
                }
            }
            other => tracing::debug!("Ignoring DAP message of type {:?}", other),
        }
    }

    // Release everyone still waiting
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
}

impl DebugSession for DapClient {
    fn threads(&mut self) -> Result<Vec<Thread>> {
        let body: ThreadsBody = self.request_as("threads", json!({}))?;
        Ok(body.threads)
    }

    fn stack_trace(
        &mut self,
        thread_id: i64,
        start_frame: i64,
        levels: i64,
    ) -> Result<Vec<StackFrame>> {
        let body: StackTraceBody = self.request_as(
            "stackTrace",
            json!({
                "threadId": thread_id,
                "startFrame": start_frame,
                "levels": levels,
            }),
        )?;
        Ok(body.stack_frames)
    }

    fn scopes(&mut self, frame_id: i64) -> Result<Vec<Scope>> {
        let body: ScopesBody = self.request_as("scopes", json!({ "frameId": frame_id }))?;
        Ok(body.scopes)
    }

    fn variables(
        &mut self,
        variables_reference: i64,
        start: Option<i64>,
        count: Option<i64>,
    ) -> Result<Vec<DapVariable>> {
        let mut arguments = json!({ "variablesReference": variables_reference });
        if let Some(start) = start {
            arguments["start"] = json!(start);
        }
        if let Some(count) = count {
            arguments["count"] = json!(count);
        }
        let body: VariablesBody = self.request_as("variables", arguments)?;
        Ok(body.variables)
    }

    fn describe(&self) -> String {
        format!("DAP adapter at {}", self.address)
    }
}
