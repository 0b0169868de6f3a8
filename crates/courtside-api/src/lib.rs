// courtside-api: push-feed transport and REST client for the live stats backend.
//
// The transport is a reference-counted pub/sub client over a WebSocket (or
// the in-process loopback), with automatic reconnection and ordered
// per-topic handler dispatch. The REST client covers the notification
// store and the per-user preference document.

pub mod error;
pub mod http;
pub mod model;
pub mod rest;
pub mod transport;
pub mod wire;

pub use error::Error;
pub use http::{HttpConfig, TlsMode};
pub use model::{
    GameSnapshot, GameStatus, NoticeLevel, PlayerStatLine, ProjectionSnapshot, SystemNotice,
    TeamRef,
};
pub use rest::RestClient;
pub use transport::{
    CallbackId, ConnectionState, Connector, HandlerId, Listener, ReconnectConfig, Subscription,
    TransportClient, WsConnector,
};
pub use wire::{ClientFrame, ControlFrame, Decoded, InboundMessage, Payload, Topic};
