// Background connection task: connect → resubscribe → read → on loss,
// back off → reconnect, until cancelled or out of retries.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::backoff::calculate_backoff;
use super::connection::{FrameSink, WireConnection};
use super::registry::Callback;
use super::{ConnectionState, Inner};
use crate::error::Error;
use crate::wire::{self, ClientFrame, ControlFrame, Decoded, Topic};

enum SessionEnd {
    Cancelled,
    Closed,
    Broken(Error),
}

pub(super) async fn run(
    inner: Arc<Inner>,
    mut commands: mpsc::UnboundedReceiver<Topic>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut failures: u32 = 0;
    let mut established = false;

    loop {
        inner.set_state(if attempt == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting { attempt }
        });

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = inner.connector.connect() => result,
        };

        match connected {
            Ok(connection) => {
                failures = 0;
                attempt = 0;
                let is_reconnect = std::mem::replace(&mut established, true);

                let end = session(&inner, connection, &mut commands, &cancel, is_reconnect).await;

                inner.set_state(ConnectionState::Disconnected);
                fire(&inner.lifecycle.disconnect.snapshot(), "disconnect");

                match end {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed => tracing::info!("Push feed closed by server, reconnecting"),
                    SessionEnd::Broken(e) => tracing::warn!(error = %e, "Push feed connection lost"),
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(error = %e, attempt, failures, "Push feed connection attempt failed");

                if inner.reconnect.max_retries.is_some_and(|max| failures >= max) {
                    tracing::error!(failures, "Push feed reconnection limit reached, giving up");
                    inner.set_state(ConnectionState::Failed);
                    return;
                }
            }
        }

        let delay = calculate_backoff(failures, &inner.reconnect);
        tracing::debug!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }

    inner.set_state(ConnectionState::Disconnected);
    tracing::debug!("Push feed task exiting");
}

/// Drive one established session until it ends.
async fn session(
    inner: &Inner,
    connection: WireConnection,
    commands: &mut mpsc::UnboundedReceiver<Topic>,
    cancel: &CancellationToken,
    is_reconnect: bool,
) -> SessionEnd {
    let WireConnection {
        mut outbound,
        mut inbound,
    } = connection;

    // Topics the server currently has us subscribed to on this session.
    let mut wire_topics: HashSet<Topic> = HashSet::new();

    // Requests queued while disconnected are superseded by the full
    // resubscription below.
    while commands.try_recv().is_ok() {}

    for topic in inner.registry.active_topics() {
        if let Err(e) = send(outbound.as_mut(), ClientFrame::Subscribe { topic: topic.clone() }).await {
            return SessionEnd::Broken(e);
        }
        wire_topics.insert(topic);
    }

    inner.set_state(ConnectionState::Connected);
    tracing::info!(topics = wire_topics.len(), "Push feed connected");
    fire(&inner.lifecycle.connect.snapshot(), "connect");
    if is_reconnect {
        fire(&inner.lifecycle.reconnect.snapshot(), "reconnect");
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = outbound.close().await;
                return SessionEnd::Cancelled;
            }
            Some(topic) = commands.recv() => {
                if let Err(e) = reconcile(inner, outbound.as_mut(), &mut wire_topics, topic).await {
                    return SessionEnd::Broken(e);
                }
            }
            frame = inbound.next() => match frame {
                Some(Ok(text)) => inner.deliver(&text),
                Some(Err(e)) => return SessionEnd::Broken(e),
                None => return SessionEnd::Closed,
            },
        }
    }
}

/// Bring the wire subscription for `topic` in line with its refcount.
async fn reconcile(
    inner: &Inner,
    outbound: &mut dyn FrameSink,
    wire_topics: &mut HashSet<Topic>,
    topic: Topic,
) -> Result<(), Error> {
    let wanted = inner.registry.count(&topic) > 0;
    let active = wire_topics.contains(&topic);

    if wanted && !active {
        send(outbound, ClientFrame::Subscribe { topic: topic.clone() }).await?;
        tracing::debug!(%topic, "Subscribed");
        wire_topics.insert(topic);
    } else if !wanted && active {
        send(outbound, ClientFrame::Unsubscribe { topic: topic.clone() }).await?;
        tracing::debug!(%topic, "Unsubscribed");
        wire_topics.remove(&topic);
    }
    Ok(())
}

async fn send(outbound: &mut dyn FrameSink, frame: ClientFrame) -> Result<(), Error> {
    outbound.send(frame.encode()?).await
}

fn fire(callbacks: &[Callback], event: &'static str) {
    for callback in callbacks {
        if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
            tracing::warn!(event, "Lifecycle callback panicked");
        }
    }
}

impl Inner {
    /// Decode one text frame and hand it to the topic's handlers.
    pub(super) fn deliver(&self, text: &str) {
        let message = match wire::decode(text) {
            Ok(Decoded::Message(message)) => message,
            Ok(Decoded::Control(ControlFrame::Error { message })) => {
                tracing::warn!(%message, "Push feed reported an error");
                return;
            }
            Ok(Decoded::Control(control)) => {
                tracing::debug!(?control, "Push feed control frame");
                return;
            }
            Ok(Decoded::Unknown { topic, kind }) => {
                tracing::debug!(%topic, %kind, "Ignoring unknown message type");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed frame");
                return;
            }
        };

        if self.registry.count(&message.topic) == 0 {
            tracing::debug!(topic = %message.topic, "Dropping message for inactive topic");
            return;
        }

        let message = Arc::new(message);
        self.last_message.send_replace(Some(Arc::clone(&message)));

        for handler in self.registry.handlers_for(&message.topic) {
            if catch_unwind(AssertUnwindSafe(|| handler(&message))).is_err() {
                tracing::warn!(topic = %message.topic, kind = message.payload.kind(), "Message handler panicked");
            }
        }
    }
}
