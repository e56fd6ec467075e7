//! Scripted line server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use regex::Regex;
use sonic_codec::LineStream;
use sonic_protocol::QUIT_COMMAND;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Errors starting a mock server.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// A rule pattern failed to compile.
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Binding the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
enum Action {
    /// Send each template, expanded with the pattern's captures.
    Reply(Vec<String>),
    /// Drop the connection without answering.
    HangUp,
}

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    action: Action,
}

/// Builder for a [`MockServer`].
///
/// Rules are tried in the order they were added; the first match wins.
#[derive(Debug, Default)]
pub struct MockServerBuilder {
    rules: Vec<(String, Action)>,
}

impl MockServerBuilder {
    /// Create a builder with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `START <mode> <password>` with a successful handshake
    /// announcing `buffer_size`.
    #[must_use]
    pub fn accept_start(self, buffer_size: usize) -> Self {
        self.on(
            r"^START (\w+) \S+$",
            [
                "CONNECTED <sonic-server v1.4.9>".to_string(),
                format!("STARTED ${{1}} protocol(1) buffer({buffer_size})"),
            ],
        )
    }

    /// Reply to lines matching `pattern`.
    ///
    /// Replies may refer to capture groups as `$1` or `${name}`.
    #[must_use]
    pub fn on<I, S>(mut self, pattern: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies = replies.into_iter().map(Into::into).collect();
        self.rules.push((pattern.to_string(), Action::Reply(replies)));
        self
    }

    /// Close the connection when a line matches `pattern`.
    #[must_use]
    pub fn hang_up_on(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), Action::HangUp));
        self
    }

    /// Bind to an ephemeral local port and start serving.
    pub async fn start(self) -> Result<MockServer, MockServerError> {
        let rules = self
            .rules
            .into_iter()
            .map(|(pattern, action)| {
                Ok(Rule {
                    pattern: Regex::new(&pattern)?,
                    action,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shared = Arc::new(Shared {
            rules,
            connections: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            changed: Notify::new(),
        });

        let task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));

        tracing::debug!(addr = %addr, "mock server listening");

        Ok(MockServer { addr, shared, task })
    }
}

struct Shared {
    rules: Vec<Rule>,
    connections: AtomicUsize,
    closed: AtomicUsize,
    received: Mutex<Vec<String>>,
    changed: Notify,
}

impl Shared {
    fn react(&self, line: &str) -> Option<Vec<String>> {
        for rule in &self.rules {
            let Some(captures) = rule.pattern.captures(line) else {
                continue;
            };
            return match &rule.action {
                Action::HangUp => None,
                Action::Reply(templates) => Some(
                    templates
                        .iter()
                        .map(|template| {
                            let mut reply = String::new();
                            captures.expand(template, &mut reply);
                            reply
                        })
                        .collect(),
                ),
            };
        }

        Some(vec![format!("ERR no match: {line}")])
    }
}

/// A scripted Sonic server on a local TCP port.
///
/// The server stops accepting connections when dropped.
pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Address to connect to, as `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Number of connections accepted so far.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Number of connections that have ended.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Every line received, across all connections, in arrival order.
    #[must_use]
    pub fn received(&self) -> Vec<String> {
        self.shared.received.lock().clone()
    }

    /// Wait until at least `count` connections have ended.
    pub async fn wait_for_closed(&self, count: usize) {
        loop {
            let changed = self.shared.changed.notified();
            if self.closed() >= count {
                return;
            }
            changed.await;
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("addr", &self.addr)
            .field("connections", &self.connections())
            .field("closed", &self.closed())
            .finish()
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                shared.connections.fetch_add(1, Ordering::SeqCst);
                tracing::trace!(peer = %peer, "mock server accepted connection");
                tokio::spawn(serve(socket, Arc::clone(&shared)));
            }
            Err(err) => {
                tracing::warn!(error = %err, "mock server accept failed");
                return;
            }
        }
    }
}

async fn serve(socket: TcpStream, shared: Arc<Shared>) {
    let mut lines = LineStream::new(socket);

    while let Ok(line) = lines.next_line().await {
        let line = line.trim().to_string();
        shared.received.lock().push(line.clone());

        if line.starts_with(QUIT_COMMAND) {
            let _ = lines.send_line("ENDED quit").await;
            break;
        }

        let Some(replies) = shared.react(&line) else {
            break;
        };

        let mut failed = false;
        for reply in &replies {
            if lines.send_line(reply).await.is_err() {
                failed = true;
                break;
            }
        }
        if failed {
            break;
        }
    }

    drop(lines);
    shared.closed.fetch_add(1, Ordering::SeqCst);
    shared.changed.notify_waiters();
}
