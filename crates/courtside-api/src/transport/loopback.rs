//! In-process push feed.
//!
//! [`loopback()`] returns a connector for a [`TransportClient`](super::TransportClient)
//! and the matching server end. Each `connect` on the connector yields a
//! [`ServerSession`] from [`LoopbackServer::accept`], through which a test
//! or demo can read the client's subscribe frames and push messages back.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::connection::{Connector, FrameSink, WireConnection};
use crate::error::Error;
use crate::wire::ClientFrame;

struct Shared {
    sessions: mpsc::UnboundedSender<ServerSession>,
    refuse: AtomicUsize,
    attempts: AtomicUsize,
}

/// Create a connected connector/server pair.
pub fn loopback() -> (LoopbackConnector, LoopbackServer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        sessions: tx,
        refuse: AtomicUsize::new(0),
        attempts: AtomicUsize::new(0),
    });
    (
        LoopbackConnector {
            shared: Arc::clone(&shared),
        },
        LoopbackServer {
            sessions: rx,
            shared,
        },
    )
}

// ── Client side ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LoopbackConnector {
    shared: Arc<Shared>,
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self) -> Result<WireConnection, Error> {
        self.shared.attempts.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .shared
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::WebSocketConnect("loopback refused connection".into()));
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();

        self.shared
            .sessions
            .send(ServerSession {
                frames: from_client,
                tx: Some(to_client),
            })
            .map_err(|_| Error::WebSocketConnect("loopback server is gone".into()))?;

        Ok(WireConnection {
            outbound: Box::new(LoopbackSink(to_server)),
            inbound: UnboundedReceiverStream::new(from_server).boxed(),
        })
    }
}

struct LoopbackSink(mpsc::UnboundedSender<String>);

#[async_trait]
impl FrameSink for LoopbackSink {
    async fn send(&mut self, frame: String) -> Result<(), Error> {
        self.0
            .send(frame)
            .map_err(|_| Error::WebSocketSend("loopback session closed".into()))
    }
}

// ── Server side ──────────────────────────────────────────────────────

pub struct LoopbackServer {
    sessions: mpsc::UnboundedReceiver<ServerSession>,
    shared: Arc<Shared>,
}

impl LoopbackServer {
    /// Wait for the next client connection.
    pub async fn accept(&mut self) -> Option<ServerSession> {
        self.sessions.recv().await
    }

    /// Fail the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        self.shared.refuse.store(n, Ordering::SeqCst);
    }

    /// Total connection attempts seen so far, refused ones included.
    pub fn attempts(&self) -> usize {
        self.shared.attempts.load(Ordering::SeqCst)
    }
}

/// Server end of one loopback session.
pub struct ServerSession {
    frames: mpsc::UnboundedReceiver<String>,
    tx: Option<mpsc::UnboundedSender<Result<String, Error>>>,
}

impl ServerSession {
    /// Push `{"topic": topic, "data": data}` to the client.
    pub fn send_json(&self, topic: &str, data: Value) -> bool {
        self.send_raw(json!({ "topic": topic, "data": data }).to_string())
    }

    /// Push an arbitrary text frame. Returns `false` if the client is gone.
    pub fn send_raw(&self, text: impl Into<String>) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(text.into())).is_ok())
    }

    /// Next client frame, skipping anything that is not a valid
    /// subscribe/unsubscribe frame. `None` once the client hangs up.
    pub async fn next_frame(&mut self) -> Option<ClientFrame> {
        loop {
            let raw = self.frames.recv().await?;
            if let Ok(frame) = serde_json::from_str(&raw) {
                return Some(frame);
            }
        }
    }

    /// Client frame already queued, without waiting.
    pub fn try_next_frame(&mut self) -> Option<ClientFrame> {
        while let Ok(raw) = self.frames.try_recv() {
            if let Ok(frame) = serde_json::from_str(&raw) {
                return Some(frame);
            }
        }
        None
    }

    /// End the session cleanly.
    pub fn close(mut self) {
        self.tx = None;
    }

    /// Break the session with a transport error.
    pub fn fail(mut self, error: Error) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(error));
        }
    }
}
