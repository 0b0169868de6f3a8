use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::{GameSnapshot, PlayerStatLine, ProjectionSnapshot};

/// Discriminator of a [`DomainEvent`], rendered in snake_case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    GameStarted,
    GameEnded,
    StatMilestone,
    DoubleDouble,
    TripleDouble,
    ProjectionChanged,
}

/// Box-score category tracked for milestones and double figures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatCategory {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
}

impl StatCategory {
    pub const ALL: [Self; 5] = [
        Self::Points,
        Self::Rebounds,
        Self::Assists,
        Self::Steals,
        Self::Blocks,
    ];

    pub fn value(self, line: &PlayerStatLine) -> u32 {
        match self {
            Self::Points => line.points,
            Self::Rebounds => line.rebounds,
            Self::Assists => line.assists,
            Self::Steals => line.steals,
            Self::Blocks => line.blocks,
        }
    }
}

/// A semantically meaningful transition between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    GameStarted {
        game: GameSnapshot,
    },
    GameEnded {
        game: GameSnapshot,
    },
    StatMilestone {
        line: PlayerStatLine,
        stat: StatCategory,
        threshold: u32,
    },
    DoubleDouble {
        line: PlayerStatLine,
    },
    TripleDouble {
        line: PlayerStatLine,
    },
    ProjectionChanged {
        previous: ProjectionSnapshot,
        current: ProjectionSnapshot,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::GameStarted { .. } => EventKind::GameStarted,
            Self::GameEnded { .. } => EventKind::GameEnded,
            Self::StatMilestone { .. } => EventKind::StatMilestone,
            Self::DoubleDouble { .. } => EventKind::DoubleDouble,
            Self::TripleDouble { .. } => EventKind::TripleDouble,
            Self::ProjectionChanged { .. } => EventKind::ProjectionChanged,
        }
    }

    /// Game id for game events, player id otherwise.
    pub fn entity_id(&self) -> &str {
        match self {
            Self::GameStarted { game } | Self::GameEnded { game } => &game.id,
            Self::StatMilestone { line, .. }
            | Self::DoubleDouble { line }
            | Self::TripleDouble { line } => &line.player_id,
            Self::ProjectionChanged { current, .. } => &current.player_id,
        }
    }

    pub fn threshold(&self) -> Option<u32> {
        match self {
            Self::StatMilestone { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_renders_snake_case() {
        assert_eq!(EventKind::StatMilestone.to_string(), "stat_milestone");
        assert_eq!("triple_double".parse::<EventKind>().ok(), Some(EventKind::TripleDouble));
        let name: &'static str = EventKind::ProjectionChanged.into();
        assert_eq!(name, "projection_changed");
    }
}
