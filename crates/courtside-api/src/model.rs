// ── Live entity snapshots ──
//
// Immutable point-in-time copies of server state, as carried inside push
// frames. Every inbound snapshot replaces the cached one for its key
// wholesale; nothing here is ever patched field by field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── GameStatus ──────────────────────────────────────────────────────

/// Lifecycle status of a game.
///
/// The backend is inconsistent about spelling (`"in_progress"`, `"live"`,
/// `"Final"`, `"completed"`), so parsing is case-insensitive and lenient.
/// Anything unrecognised is preserved verbatim in [`GameStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    Postponed,
    Cancelled,
    Other(String),
}

impl GameStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Final => "final",
            Self::Postponed => "postponed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for GameStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Ok(match normalized.as_str() {
            "scheduled" | "pre_game" | "pregame" => Self::Scheduled,
            "in_progress" | "live" | "inprogress" | "halftime" => Self::InProgress,
            "final" | "finished" | "completed" | "complete" => Self::Final,
            "postponed" => Self::Postponed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(s.to_owned()),
        })
    }
}

impl From<String> for GameStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<GameStatus> for String {
    fn from(status: GameStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── GameSnapshot ────────────────────────────────────────────────────

/// Optional team details embedded in a game payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

/// Server state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: String,
    #[serde(default)]
    pub season_id: Option<String>,
    #[serde(default)]
    pub game_date: Option<String>,
    pub home_team_id: String,
    pub visitor_team_id: String,
    #[serde(default)]
    pub home_team_score: Option<u32>,
    #[serde(default)]
    pub visitor_team_score: Option<u32>,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<TeamRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_team: Option<TeamRef>,
}

impl GameSnapshot {
    /// Both scores, if the server has published them.
    pub fn scores(&self) -> Option<(u32, u32)> {
        Some((self.home_team_score?, self.visitor_team_score?))
    }

    /// Display name for the home side, falling back to the team id.
    pub fn home_label(&self) -> &str {
        self.home_team
            .as_ref()
            .and_then(|t| t.full_name.as_deref())
            .unwrap_or(&self.home_team_id)
    }

    /// Display name for the visiting side, falling back to the team id.
    pub fn visitor_label(&self) -> &str {
        self.visitor_team
            .as_ref()
            .and_then(|t| t.full_name.as_deref())
            .unwrap_or(&self.visitor_team_id)
    }
}

// ── PlayerStatLine ──────────────────────────────────────────────────

/// A player's running box-score line for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatLine {
    pub player_id: String,
    pub game_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default, alias = "full_name")]
    pub player_name: Option<String>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub rebounds: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub steals: u32,
    #[serde(default)]
    pub blocks: u32,
}

impl PlayerStatLine {
    /// Cache key: one line per player per game.
    pub fn key(&self) -> String {
        format!("{}@{}", self.player_id, self.game_id)
    }

    /// Display name, falling back to the player id.
    pub fn display_name(&self) -> &str {
        self.player_name.as_deref().unwrap_or(&self.player_id)
    }
}

// ── ProjectionSnapshot ──────────────────────────────────────────────

/// Model projection for one player in one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSnapshot {
    pub player_id: String,
    pub game_id: String,
    #[serde(default, alias = "full_name")]
    pub player_name: Option<String>,
    #[serde(default)]
    pub projected_minutes: f64,
    #[serde(default)]
    pub projected_points: f64,
    #[serde(default)]
    pub projected_rebounds: f64,
    #[serde(default)]
    pub projected_assists: f64,
    #[serde(default)]
    pub projected_steals: f64,
    #[serde(default)]
    pub projected_blocks: f64,
    #[serde(default)]
    pub projected_turnovers: f64,
    #[serde(default)]
    pub projected_three_pointers: f64,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub model_version: Option<String>,
    /// Server-side generation time. Not part of the projected values.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ProjectionSnapshot {
    /// Cache key: one projection per (player, game) pair.
    pub fn key(&self) -> String {
        format!("{}@{}", self.player_id, self.game_id)
    }

    pub fn display_name(&self) -> &str {
        self.player_name.as_deref().unwrap_or(&self.player_id)
    }

    /// Value equality over the projected numbers and model version,
    /// ignoring `created_at` so that a re-generated but identical
    /// projection compares equal.
    #[allow(clippy::float_cmp)]
    pub fn same_values(&self, other: &Self) -> bool {
        self.player_id == other.player_id
            && self.game_id == other.game_id
            && self.projected_minutes == other.projected_minutes
            && self.projected_points == other.projected_points
            && self.projected_rebounds == other.projected_rebounds
            && self.projected_assists == other.projected_assists
            && self.projected_steals == other.projected_steals
            && self.projected_blocks == other.projected_blocks
            && self.projected_turnovers == other.projected_turnovers
            && self.projected_three_pointers == other.projected_three_pointers
            && self.confidence_score == other.confidence_score
            && self.model_version == other.model_version
    }
}

// ── SystemNotice ────────────────────────────────────────────────────

/// Severity of a server-pushed system message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    #[default]
    Info,
    Warning,
    Error,
    #[serde(other)]
    Other,
}

impl NoticeLevel {
    /// Capitalised label used as a fallback title.
    pub fn label(self) -> &'static str {
        match self {
            Self::Info | Self::Other => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

/// A user-facing message broadcast on the `system` topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNotice {
    pub message: String,
    #[serde(default)]
    pub level: NoticeLevel,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn game_status_parsing_is_lenient() {
        assert_eq!("in_progress".parse::<GameStatus>().unwrap(), GameStatus::InProgress);
        assert_eq!("Live".parse::<GameStatus>().unwrap(), GameStatus::InProgress);
        assert_eq!("Final".parse::<GameStatus>().unwrap(), GameStatus::Final);
        assert_eq!("completed".parse::<GameStatus>().unwrap(), GameStatus::Final);
        assert_eq!(
            "Suspended".parse::<GameStatus>().unwrap(),
            GameStatus::Other("Suspended".into())
        );
    }

    #[test]
    fn game_snapshot_deserializes_with_null_scores() {
        let game: GameSnapshot = serde_json::from_value(json!({
            "id": "g1",
            "home_team_id": "BOS",
            "visitor_team_id": "NYK",
            "home_team_score": null,
            "status": "Scheduled",
            "home_team": { "full_name": "Boston Celtics" }
        }))
        .unwrap();

        assert_eq!(game.status, GameStatus::Scheduled);
        assert!(game.scores().is_none());
        assert_eq!(game.home_label(), "Boston Celtics");
        assert_eq!(game.visitor_label(), "NYK");
    }

    #[test]
    fn stat_line_defaults_missing_counters() {
        let line: PlayerStatLine = serde_json::from_value(json!({
            "player_id": "p1",
            "game_id": "g1",
            "full_name": "Jayson Tatum",
            "points": 31
        }))
        .unwrap();

        assert_eq!(line.points, 31);
        assert_eq!(line.rebounds, 0);
        assert_eq!(line.display_name(), "Jayson Tatum");
        assert_eq!(line.key(), "p1@g1");
    }

    #[test]
    fn projection_value_equality_ignores_created_at() {
        let a: ProjectionSnapshot = serde_json::from_value(json!({
            "player_id": "p1",
            "game_id": "g1",
            "projected_points": 24.5,
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        let mut b = a.clone();
        b.created_at = Some("2026-01-02T00:00:00Z".into());
        assert!(a.same_values(&b));

        b.projected_points = 25.0;
        assert!(!a.same_values(&b));
    }

    #[test]
    fn unknown_notice_level_is_tolerated() {
        let notice: SystemNotice =
            serde_json::from_value(json!({ "message": "hi", "level": "debug" })).unwrap();
        assert_eq!(notice.level, NoticeLevel::Other);
        assert_eq!(notice.level.label(), "Info");
    }
}
