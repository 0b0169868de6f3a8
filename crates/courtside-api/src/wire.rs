//! Push-feed wire codec.
//!
//! Every server frame is a JSON envelope `{"topic": T, "data": {...}}` whose
//! `data.type` discriminator selects the payload shape. Entity updates carry
//! the snapshot under a nested `data` key:
//!
//! ```json
//! {"topic": "games", "data": {"type": "game_update", "game_id": "g1", "data": {...}}}
//! ```
//!
//! Control frames (`connected`, `subscribed`, `unsubscribed`, `error`) are
//! sent on the `personal` topic and never reach topic handlers.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::model::{GameSnapshot, PlayerStatLine, ProjectionSnapshot, SystemNotice};

// ── Topic ────────────────────────────────────────────────────────────

/// Name of a logical stream on the push feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub const GAMES: &'static str = "games";
    pub const PLAYERS: &'static str = "players";
    pub const PROJECTIONS: &'static str = "projections";
    pub const SYSTEM: &'static str = "system";
    pub const PERSONAL: &'static str = "personal";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Per-game topic, `game/{id}`.
    pub fn game(id: &str) -> Self {
        Self(format!("game/{id}"))
    }

    /// Per-player topic, `player/{id}`.
    pub fn player(id: &str) -> Self {
        Self(format!("player/{id}"))
    }

    /// Per-projection topic, `projection/{id}`.
    pub fn projection(id: &str) -> Self {
        Self(format!("projection/{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Topic {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Topic> for Topic {
    fn from(t: &Topic) -> Self {
        t.clone()
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Payload ──────────────────────────────────────────────────────────

/// Typed body of a push message, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    GameUpdate {
        #[serde(rename = "data")]
        game: GameSnapshot,
    },
    PlayerUpdate {
        #[serde(rename = "data")]
        stats: PlayerStatLine,
    },
    ProjectionUpdate {
        #[serde(rename = "data")]
        projection: ProjectionSnapshot,
    },
    BulkProjectionsUpdate {
        #[serde(rename = "data")]
        projections: Vec<ProjectionSnapshot>,
    },
    SystemNotification(SystemNotice),
}

impl Payload {
    const KINDS: [&'static str; 5] = [
        "game_update",
        "player_update",
        "projection_update",
        "bulk_projections_update",
        "system_notification",
    ];

    /// The wire discriminator for this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameUpdate { .. } => "game_update",
            Self::PlayerUpdate { .. } => "player_update",
            Self::ProjectionUpdate { .. } => "projection_update",
            Self::BulkProjectionsUpdate { .. } => "bulk_projections_update",
            Self::SystemNotification(_) => "system_notification",
        }
    }
}

/// A decoded message destined for topic handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: Topic,
    pub payload: Payload,
    pub received_at: DateTime<Utc>,
}

// ── Control frames ───────────────────────────────────────────────────

/// Server acknowledgements and errors, addressed to this client only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlFrame {
    Connected {
        #[serde(default)]
        client_id: Option<String>,
    },
    Subscribed {
        topic: Topic,
    },
    Unsubscribed {
        topic: Topic,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ControlFrame {
    const KINDS: [&'static str; 4] = ["connected", "subscribed", "unsubscribed", "error"];
}

/// Result of decoding one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message(InboundMessage),
    Control(ControlFrame),
    /// Well-formed envelope with a `type` this client does not know.
    Unknown { topic: Topic, kind: String },
}

#[derive(Deserialize)]
struct Envelope {
    topic: Topic,
    data: Value,
}

/// Decode a server text frame.
///
/// Unknown payload kinds decode to [`Decoded::Unknown`] so the caller can
/// ignore them. Non-JSON input, a missing envelope, or a known kind whose
/// body does not match its shape is an [`Error::MalformedFrame`].
pub fn decode(text: &str) -> Result<Decoded, Error> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| Error::MalformedFrame(e.to_string()))?;

    let kind = envelope
        .data
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedFrame("payload has no `type` field".into()))?
        .to_owned();

    if Payload::KINDS.contains(&kind.as_str()) {
        let payload: Payload = serde_json::from_value(envelope.data)
            .map_err(|e| Error::MalformedFrame(format!("{kind}: {e}")))?;
        return Ok(Decoded::Message(InboundMessage {
            topic: envelope.topic,
            payload,
            received_at: Utc::now(),
        }));
    }

    if ControlFrame::KINDS.contains(&kind.as_str()) {
        let control: ControlFrame = serde_json::from_value(envelope.data)
            .map_err(|e| Error::MalformedFrame(format!("{kind}: {e}")))?;
        return Ok(Decoded::Control(control));
    }

    Ok(Decoded::Unknown {
        topic: envelope.topic,
        kind,
    })
}

// ── Client frames ────────────────────────────────────────────────────

/// Frames this client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe { topic: Topic },
    Unsubscribe { topic: Topic },
}

impl ClientFrame {
    pub fn topic(&self) -> &Topic {
        match self {
            Self::Subscribe { topic } | Self::Unsubscribe { topic } => topic,
        }
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::MalformedFrame(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{GameStatus, NoticeLevel};
    use serde_json::json;

    fn frame(topic: &str, data: Value) -> String {
        json!({ "topic": topic, "data": data }).to_string()
    }

    #[test]
    fn decodes_game_update() {
        let text = frame(
            "games",
            json!({
                "type": "game_update",
                "game_id": "g1",
                "data": {
                    "id": "g1",
                    "home_team_id": "BOS",
                    "visitor_team_id": "NYK",
                    "home_team_score": 54,
                    "visitor_team_score": 50,
                    "status": "in_progress"
                }
            }),
        );

        let Decoded::Message(msg) = decode(&text).unwrap() else {
            panic!("expected a message");
        };
        assert_eq!(msg.topic.as_str(), "games");
        let Payload::GameUpdate { game } = msg.payload else {
            panic!("expected a game update");
        };
        assert_eq!(game.status, GameStatus::InProgress);
        assert_eq!(game.scores(), Some((54, 50)));
    }

    #[test]
    fn decodes_bulk_projections() {
        let text = frame(
            "projections",
            json!({
                "type": "bulk_projections_update",
                "data": [
                    { "player_id": "p1", "game_id": "g1", "projected_points": 20.5 },
                    { "player_id": "p2", "game_id": "g1", "projected_points": 11.0 }
                ]
            }),
        );

        let Decoded::Message(msg) = decode(&text).unwrap() else {
            panic!("expected a message");
        };
        let Payload::BulkProjectionsUpdate { projections } = msg.payload else {
            panic!("expected bulk projections");
        };
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].key(), "p1@g1");
    }

    #[test]
    fn decodes_system_notification_with_flat_fields() {
        let text = frame(
            "system",
            json!({
                "type": "system_notification",
                "message": "Maintenance at midnight",
                "level": "warning",
                "timestamp": "2026-03-01 12:00:00"
            }),
        );

        let Decoded::Message(msg) = decode(&text).unwrap() else {
            panic!("expected a message");
        };
        let Payload::SystemNotification(notice) = msg.payload else {
            panic!("expected a system notification");
        };
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "Maintenance at midnight");
    }

    #[test]
    fn control_frames_are_recognised() {
        let text = frame("personal", json!({ "type": "subscribed", "topic": "games" }));
        assert_eq!(
            decode(&text).unwrap(),
            Decoded::Control(ControlFrame::Subscribed {
                topic: "games".into()
            })
        );
    }

    #[test]
    fn unknown_kind_is_not_an_error() {
        let text = frame("games", json!({ "type": "score_correction", "data": {} }));
        assert_eq!(
            decode(&text).unwrap(),
            Decoded::Unknown {
                topic: "games".into(),
                kind: "score_correction".into()
            }
        );
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(decode("not json"), Err(Error::MalformedFrame(_))));
        assert!(matches!(
            decode(&frame("games", json!({ "no_type": true }))),
            Err(Error::MalformedFrame(_))
        ));
        // Known kind, wrong body.
        assert!(matches!(
            decode(&frame("games", json!({ "type": "game_update", "data": 42 }))),
            Err(Error::MalformedFrame(_))
        ));
    }

    #[test]
    fn client_frames_encode_as_tagged_objects() {
        let sub = ClientFrame::Subscribe {
            topic: Topic::game("g7"),
        };
        let value: Value = serde_json::from_str(&sub.encode().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "subscribe", "topic": "game/g7" }));
    }

    #[test]
    fn payload_kind_matches_wire_tag() {
        let payload = Payload::SystemNotification(SystemNotice {
            message: "hello".into(),
            level: NoticeLevel::Info,
            title: None,
            url: None,
            timestamp: None,
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], payload.kind());
    }
}
