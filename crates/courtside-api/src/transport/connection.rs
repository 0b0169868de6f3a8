// Connection seam between the transport driver and the wire.
//
// A `Connector` opens one session and hands back its two halves: an
// outbound sink for client frames and an inbound stream of text frames.
// The stream ending means the peer closed cleanly; an `Err` item means the
// session broke. Either way the driver reconnects.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use url::Url;

use crate::error::Error;

/// Write half of a session.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: String) -> Result<(), Error>;

    /// Best-effort close. The default does nothing.
    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// One established session.
pub struct WireConnection {
    pub outbound: Box<dyn FrameSink>,
    pub inbound: BoxStream<'static, Result<String, Error>>,
}

/// Opens sessions to the push feed.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<WireConnection, Error>;
}

// ── WebSocket ────────────────────────────────────────────────────────

/// Production connector over `tokio-tungstenite`.
///
/// If a token is set it is sent as `Authorization: Bearer ...` on the
/// upgrade request.
pub struct WsConnector {
    url: Url,
    token: Option<SecretString>,
}

impl WsConnector {
    pub fn new(url: Url) -> Self {
        Self { url, token: None }
    }

    pub fn with_token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<WireConnection, Error> {
        tracing::info!(url = %self.url, "Connecting to push feed");

        let uri: tungstenite::http::Uri = self
            .url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(token) = &self.token {
            request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
        }

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let inbound = futures_util::stream::unfold(read, |mut read| async move {
            loop {
                match read.next().await? {
                    Ok(Message::Text(text)) => return Some((Ok(text.as_str().to_owned()), read)),
                    Ok(Message::Close(frame)) => {
                        match frame {
                            Some(cf) => tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "Push feed close frame received"
                            ),
                            None => tracing::info!("Push feed close frame received (no payload)"),
                        }
                        return None;
                    }
                    Ok(Message::Ping(_)) => {
                        // tungstenite queues the pong itself
                        tracing::trace!("Push feed ping");
                    }
                    Ok(_) => {}
                    Err(e) => return Some((Err(Error::WebSocketConnect(e.to_string())), read)),
                }
            }
        })
        .boxed();

        Ok(WireConnection {
            outbound: Box::new(WsSink(write)),
            inbound,
        })
    }
}

struct WsSink<S>(S);

#[async_trait]
impl<S> FrameSink for WsSink<S>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin + Send,
{
    async fn send(&mut self, frame: String) -> Result<(), Error> {
        self.0
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| Error::WebSocketSend(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.0
            .close()
            .await
            .map_err(|e| Error::WebSocketSend(e.to_string()))
    }
}
