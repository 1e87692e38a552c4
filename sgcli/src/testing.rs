//! Scripted transports for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{Result, TransportError};
use crate::session::CliContext;
use crate::transport::{Dialer, Endpoint, Transport};

/// What the fake peer does in response to a write.
pub(crate) enum Reply {
    /// Queue text for reading.
    Text(String),
    /// End the stream once queued text is drained.
    Close,
}

type Responder = Box<dyn FnMut(&str) -> Vec<Reply> + Send>;

#[derive(Default)]
struct MockState {
    inbound: VecDeque<u8>,
    closing: bool,
    writes: Vec<String>,
    responder: Option<Responder>,
    greeting: Vec<u8>,
    dials: usize,
    closes: usize,
    ping_replies: VecDeque<bool>,
    ping_count: usize,
}

#[derive(Default)]
struct Shared {
    state: Mutex<MockState>,
    readable: Notify,
}

/// Shared view of a mock peer, used by tests to script and inspect traffic.
#[derive(Clone, Default)]
pub(crate) struct MockHandle(Arc<Shared>);

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue text for the next reads.
    pub(crate) fn push_output(&self, data: &[u8]) {
        self.lock().inbound.extend(data);
        self.0.readable.notify_one();
    }

    /// End the stream after the queued text.
    pub(crate) fn close_after_output(&self) {
        self.lock().closing = true;
        self.0.readable.notify_one();
    }

    /// Answer every write with the replies from `responder`.
    pub(crate) fn on_write<F>(&self, responder: F)
    where
        F: FnMut(&str) -> Vec<Reply> + Send + 'static,
    {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Text queued on every successful dial.
    pub(crate) fn set_greeting(&self, greeting: &str) {
        self.lock().greeting = greeting.as_bytes().to_vec();
    }

    /// Replies to successive pings; once exhausted, pings fail.
    pub(crate) fn set_ping_replies(&self, results: &[bool]) {
        self.lock().ping_replies = results.iter().copied().collect();
    }

    /// Every write so far, as text.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub(crate) fn dials(&self) -> usize {
        self.lock().dials
    }

    pub(crate) fn closes(&self) -> usize {
        self.lock().closes
    }

    pub(crate) fn ping_count(&self) -> usize {
        self.lock().ping_count
    }
}

/// In-memory transport driven by a [`MockHandle`].
pub(crate) struct MockTransport {
    handle: MockHandle,
}

impl MockTransport {
    /// A transport that never produces data.
    pub(crate) fn silent() -> (Self, MockHandle) {
        let handle = MockHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    /// A transport with `data` already queued.
    pub(crate) fn with_output(data: &[u8]) -> (Self, MockHandle) {
        let (transport, handle) = Self::silent();
        handle.push_output(data);
        (transport, handle)
    }
}

impl Transport for MockTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        let mut state = self.handle.lock();
        if state.closing && state.inbound.is_empty() {
            return Err(TransportError::Disconnected.into());
        }
        state.writes.push(text.clone());

        if let Some(mut responder) = state.responder.take() {
            for reply in responder(&text) {
                match reply {
                    Reply::Text(out) => state.inbound.extend(out.as_bytes()),
                    Reply::Close => state.closing = true,
                }
            }
            state.responder = Some(responder);
        }
        drop(state);
        self.handle.0.readable.notify_one();
        Ok(())
    }

    async fn read(&mut self, max: usize) -> Result<Vec<u8>> {
        loop {
            {
                let mut state = self.handle.lock();
                if !state.inbound.is_empty() {
                    let n = max.min(state.inbound.len());
                    return Ok(state.inbound.drain(..n).collect());
                }
                if state.closing {
                    return Ok(Vec::new());
                }
            }
            self.handle.0.readable.notified().await;
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.handle.lock().closes += 1;
        Ok(())
    }
}

/// Dialer handing out [`MockTransport`]s that share one [`MockHandle`].
#[derive(Clone, Default)]
pub(crate) struct MockDialer {
    pub(crate) handle: MockHandle,
}

impl MockDialer {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Dialer for MockDialer {
    type Transport = MockTransport;

    async fn dial(&self, _endpoint: &Endpoint) -> Result<MockTransport> {
        {
            let mut state = self.handle.lock();
            state.dials += 1;
            state.closing = false;
            state.inbound.clear();
            let greeting = state.greeting.clone();
            state.inbound.extend(greeting);
        }
        Ok(MockTransport {
            handle: self.handle.clone(),
        })
    }

    async fn ping(&self, _address: &str, _timeout: Duration) -> bool {
        let mut state = self.handle.lock();
        state.ping_count += 1;
        state.ping_replies.pop_front().unwrap_or(false)
    }
}

/// Minimal appliance console: echoes lines, tracks its mode, prints prompts.
pub(crate) struct FakeAppliance {
    context: CliContext,
    enable_password: Option<String>,
    awaiting_password: bool,
    outputs: HashMap<String, String>,
    confirmations: HashMap<String, (String, String)>,
    pending_confirmation: Option<String>,
    restarts: HashSet<String>,
    after_restart: HashMap<String, String>,
}

impl FakeAppliance {
    pub(crate) fn new(context: CliContext) -> Self {
        Self {
            context,
            enable_password: None,
            awaiting_password: false,
            outputs: HashMap::new(),
            confirmations: HashMap::new(),
            pending_confirmation: None,
            restarts: HashSet::new(),
            after_restart: HashMap::new(),
        }
    }

    /// Require `password` after `enable`.
    pub(crate) fn with_enable_password(mut self, password: &str) -> Self {
        self.enable_password = Some(password.to_string());
        self
    }

    /// Output printed for `command`.
    pub(crate) fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    /// `command` asks `question` first and prints `output` after "yes".
    pub(crate) fn with_confirmation(mut self, command: &str, question: &str, output: &str) -> Self {
        self.confirmations.insert(
            command.to_string(),
            (question.to_string(), output.to_string()),
        );
        self
    }

    /// `command` drops the session and comes back at the root prompt.
    pub(crate) fn with_restart(mut self, command: &str) -> Self {
        self.restarts.insert(command.to_string());
        self
    }

    /// Output printed for `command` once a restart has happened.
    pub(crate) fn with_output_after_restart(mut self, command: &str, output: &str) -> Self {
        self.after_restart
            .insert(command.to_string(), output.to_string());
        self
    }

    pub(crate) fn prompt(&self) -> &'static str {
        match self.context {
            CliContext::Root | CliContext::Exit => "proxysg>",
            CliContext::Enable => "proxysg#",
            CliContext::Config => "proxysg#(config)",
            CliContext::ConfigTree => "proxysg#(config ssl)",
        }
    }

    pub(crate) fn respond(&mut self, written: &str) -> Vec<Reply> {
        let line = written.trim_end_matches('\r');

        if self.awaiting_password {
            self.awaiting_password = false;
            if Some(line) == self.enable_password.as_deref() {
                self.context = CliContext::Enable;
            }
            return vec![Reply::Text(format!("\r\n{}", self.prompt()))];
        }

        if let Some(command) = self.pending_confirmation.take() {
            let body = match line {
                "yes" => self
                    .confirmations
                    .get(&command)
                    .map(|(_, output)| output.clone())
                    .unwrap_or_default(),
                _ => "aborted\r\n".to_string(),
            };
            return vec![Reply::Text(format!("{}\r\n{}{}", line, body, self.prompt()))];
        }

        let echo = format!("{}\r\n", line);

        if self.restarts.contains(line) {
            self.context = CliContext::Root;
            self.outputs.extend(self.after_restart.drain());
            return vec![Reply::Text(echo), Reply::Close];
        }

        if let Some((question, _)) = self.confirmations.get(line) {
            self.pending_confirmation = Some(line.to_string());
            return vec![Reply::Text(format!("{}{}", echo, question))];
        }

        match (line, self.context) {
            ("enable", CliContext::Root) => {
                if self.enable_password.is_some() {
                    self.awaiting_password = true;
                    return vec![Reply::Text(format!("{}Enable Password:", echo))];
                }
                self.context = CliContext::Enable;
            }
            ("configure terminal", CliContext::Enable) => self.context = CliContext::Config,
            ("ssl" | "installed-systems", CliContext::Config) => {
                self.context = CliContext::ConfigTree
            }
            ("exit", CliContext::ConfigTree) => self.context = CliContext::Config,
            ("exit", CliContext::Config) => self.context = CliContext::Enable,
            ("exit", _) => return vec![Reply::Text(echo), Reply::Close],
            _ => {}
        }

        let body = self.outputs.get(line).cloned().unwrap_or_default();
        vec![Reply::Text(format!("{}{}{}", echo, body, self.prompt()))]
    }

    /// Install this appliance behind `dialer`, greeting with its prompt.
    pub(crate) fn install(self, dialer: &MockDialer) {
        dialer
            .handle
            .set_greeting(&format!("Welcome\r\n{}", self.prompt()));
        let mut appliance = self;
        dialer.handle.on_write(move |written| appliance.respond(written));
    }

    /// Install as an idle serial line: nothing is printed until a key is sent.
    pub(crate) fn install_serial(self, dialer: &MockDialer) {
        dialer.handle.set_greeting("");
        let mut appliance = self;
        dialer.handle.on_write(move |written| appliance.respond(written));
    }
}
