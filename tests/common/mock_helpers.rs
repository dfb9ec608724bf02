//! A scripted debug adapter listening on a local TCP port
//!
//! The adapter accepts one connection, answers the handful of requests the
//! client sends, and records every request it receives. Events can be pushed
//! to the client at any time with [`FakeAdapter::send_event`].
//!
//! By default `initialized` follows the `initialize` response. Scripts can
//! hold it back until after another command, or never send it.

use debugchart_rs::backend::dap_client::{read_message, write_message};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::BufReader;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Variables reference of the `Locals` scope
pub const LOCALS_REFERENCE: i64 = 1;

/// Pause before a held-back `initialized` event, long enough for an eager
/// client to send `configurationDone` first
const HELD_INITIALIZED_DELAY: Duration = Duration::from_millis(200);

/// When the adapter announces `initialized`
#[derive(Debug, Clone, Default, PartialEq)]
enum InitializedTiming {
    #[default]
    AfterInitialize,
    /// After the response to this command, following a short pause
    HeldUntil(String),
    Never,
}

/// What the adapter reports about the paused program
#[derive(Debug, Clone, Default)]
pub struct AdapterScript {
    locals: Vec<Value>,
    children: HashMap<i64, Vec<String>>,
    failing: Vec<String>,
    scope_name: Option<String>,
    no_threads: bool,
    initialized: InitializedTiming,
}

impl AdapterScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: &str, value: &str) -> Self {
        self.locals.push(json!({
            "name": name,
            "value": value,
            "evaluateName": name,
            "variablesReference": 0,
        }));
        self
    }

    pub fn array(mut self, name: &str, values: Vec<String>) -> Self {
        let reference = 100 + self.children.len() as i64;
        self.locals.push(json!({
            "name": name,
            "value": format!("Array({})", values.len()),
            "evaluateName": name,
            "variablesReference": reference,
            "indexedVariables": values.len(),
        }));
        self.children.insert(reference, values);
        self
    }

    /// Answer this command with `success: false`
    pub fn failing(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    pub fn scope_name(mut self, name: &str) -> Self {
        self.scope_name = Some(name.to_string());
        self
    }

    pub fn without_threads(mut self) -> Self {
        self.no_threads = true;
        self
    }

    /// Send `initialized` only after answering `command`
    pub fn initialized_after(mut self, command: &str) -> Self {
        self.initialized = InitializedTiming::HeldUntil(command.to_string());
        self
    }

    pub fn never_initialized(mut self) -> Self {
        self.initialized = InitializedTiming::Never;
        self
    }

    fn body(&self, command: &str, arguments: &Value) -> Value {
        match command {
            "initialize" => json!({ "supportsConfigurationDoneRequest": true }),
            "threads" if self.no_threads => json!({ "threads": [] }),
            "threads" => json!({ "threads": [{ "id": 1, "name": "main" }] }),
            "stackTrace" => json!({
                "stackFrames": [{ "id": 7, "name": "main", "line": 12, "column": 1 }],
                "totalFrames": 1,
            }),
            "scopes" => json!({
                "scopes": [
                    { "name": "Arguments", "variablesReference": 2, "expensive": false },
                    {
                        "name": self.scope_name.as_deref().unwrap_or("Locals"),
                        "variablesReference": LOCALS_REFERENCE,
                        "expensive": false,
                    },
                ]
            }),
            "variables" => {
                let reference = arguments["variablesReference"].as_i64().unwrap_or(0);
                if reference == LOCALS_REFERENCE {
                    return json!({ "variables": self.locals });
                }
                let items = self.children.get(&reference).cloned().unwrap_or_default();
                let start = arguments["start"].as_u64().unwrap_or(0) as usize;
                let count = arguments["count"].as_u64().map_or(items.len(), |c| c as usize);
                let page: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .skip(start)
                    .take(count)
                    .map(|(i, v)| {
                        json!({ "name": format!("[{}]", i), "value": v, "variablesReference": 0 })
                    })
                    .collect();
                json!({ "variables": page })
            }
            _ => json!({}),
        }
    }
}

/// A running fake adapter
pub struct FakeAdapter {
    pub address: String,
    requests: Arc<Mutex<Vec<Value>>>,
    writer: Arc<Mutex<Option<TcpStream>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeAdapter {
    /// Bind to an ephemeral port and serve one client
    pub fn spawn(script: AdapterScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake adapter");
        let address = listener.local_addr().expect("local addr").to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::new(Mutex::new(None));

        let handle = {
            let requests = requests.clone();
            let writer = writer.clone();
            std::thread::spawn(move || serve(listener, script, requests, writer))
        };

        Self {
            address,
            requests,
            writer,
            handle: Some(handle),
        }
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r["command"].as_str().map(str::to_string))
            .collect()
    }

    /// Requests and sent `initialized` events in the order they happened;
    /// the event shows up as `"event:initialized"`
    pub fn timeline(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| match (r["command"].as_str(), r["event"].as_str()) {
                (Some(command), _) => Some(command.to_string()),
                (None, Some(event)) => Some(format!("event:{}", event)),
                _ => None,
            })
            .collect()
    }

    /// Arguments of every request with this command
    pub fn arguments_of(&self, command: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r["command"] == command)
            .map(|r| r["arguments"].clone())
            .collect()
    }

    /// Push an event to the connected client
    pub fn send_event(&self, event: &str, body: Value) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            if let Some(stream) = self.writer.lock().unwrap().as_mut() {
                let message = json!({ "seq": 0, "type": "event", "event": event, "body": body });
                write_message(stream, &message).expect("write event");
                return;
            }
            assert!(Instant::now() < deadline, "no client connected");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Drop the client connection
    pub fn hang_up(&self) {
        if let Some(stream) = self.writer.lock().unwrap().take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for FakeAdapter {
    fn drop(&mut self) {
        self.hang_up();
        // The thread may still be blocked in accept() if nobody connected
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn serve(
    listener: TcpListener,
    script: AdapterScript,
    requests: Arc<Mutex<Vec<Value>>>,
    writer: Arc<Mutex<Option<TcpStream>>>,
) {
    let Ok((stream, _)) = listener.accept() else {
        return;
    };
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    *writer.lock().unwrap() = Some(stream);

    let mut seq = 1;
    while let Ok(message) = read_message(&mut reader) {
        let command = message["command"].as_str().unwrap_or_default().to_string();
        let request_seq = message["seq"].as_i64().unwrap_or_default();
        requests.lock().unwrap().push(message.clone());

        let success = !script.failing.contains(&command);
        let mut response = json!({
            "seq": seq,
            "type": "response",
            "request_seq": request_seq,
            "success": success,
            "command": command,
        });
        if success {
            response["body"] = script.body(&command, &message["arguments"]);
        } else {
            response["message"] = json!("scripted failure");
        }
        seq += 1;

        let mut guard = writer.lock().unwrap();
        let Some(stream) = guard.as_mut() else {
            break;
        };
        if write_message(stream, &response).is_err() {
            break;
        }
        match &script.initialized {
            InitializedTiming::AfterInitialize if command == "initialize" => {
                requests.lock().unwrap().push(json!({ "event": "initialized" }));
                let _ = write_message(stream, &initialized_event());
            }
            InitializedTiming::HeldUntil(after) if *after == command => {
                let requests = requests.clone();
                let writer = writer.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(HELD_INITIALIZED_DELAY);
                    requests.lock().unwrap().push(json!({ "event": "initialized" }));
                    if let Some(stream) = writer.lock().unwrap().as_mut() {
                        let _ = write_message(stream, &initialized_event());
                    }
                });
            }
            _ => {}
        }
        if command == "disconnect" {
            break;
        }
    }
}

fn initialized_event() -> Value {
    json!({ "seq": 0, "type": "event", "event": "initialized" })
}
