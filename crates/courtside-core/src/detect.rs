//! Snapshot diff / milestone detection.
//!
//! Pure functions of `(previous, current)`. The caller keeps the previous
//! snapshot per entity; nothing here holds state. Every rule requires a
//! *change* between the two snapshots, so feeding the same snapshot twice
//! yields no events the second time.

use crate::model::{DomainEvent, GameSnapshot, PlayerStatLine, ProjectionSnapshot, StatCategory};
use crate::sync::LiveEntity;

/// Point totals that fire a milestone when first reached.
pub const POINT_TIERS: [u32; 3] = [30, 40, 50];
/// Rebound totals that fire a milestone when first reached.
pub const REBOUND_TIERS: [u32; 2] = [15, 20];
/// Assist totals that fire a milestone when first reached.
pub const ASSIST_TIERS: [u32; 2] = [10, 15];
/// Bar for a category to count toward a double- or triple-double.
pub const DOUBLE_FIGURES: u32 = 10;

// ── Games ────────────────────────────────────────────────────────────

pub fn game_events(previous: Option<&GameSnapshot>, current: &GameSnapshot) -> Vec<DomainEvent> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let was_live = previous.status.is_in_progress();
    let is_live = current.status.is_in_progress();

    if !was_live && is_live {
        vec![DomainEvent::GameStarted {
            game: current.clone(),
        }]
    } else if was_live && !is_live && current.scores().is_some() {
        vec![DomainEvent::GameEnded {
            game: current.clone(),
        }]
    } else {
        Vec::new()
    }
}

// ── Players ──────────────────────────────────────────────────────────

/// Milestones for one stat-line update, in order: points tiers, rebound
/// tiers, assist tiers (each ascending), then double-double, then
/// triple-double.
pub fn player_events(
    previous: Option<&PlayerStatLine>,
    current: &PlayerStatLine,
) -> Vec<DomainEvent> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let mut events = Vec::new();

    for (stat, tiers) in [
        (StatCategory::Points, &POINT_TIERS[..]),
        (StatCategory::Rebounds, &REBOUND_TIERS[..]),
        (StatCategory::Assists, &ASSIST_TIERS[..]),
    ] {
        let before = stat.value(previous);
        let after = stat.value(current);
        events.extend(
            crossed(tiers, before, after).map(|threshold| DomainEvent::StatMilestone {
                line: current.clone(),
                stat,
                threshold,
            }),
        );
    }

    if double_figure_count(current) >= 2 && double_figure_count(previous) < 2 {
        events.push(DomainEvent::DoubleDouble {
            line: current.clone(),
        });
    }

    if is_triple_double(current) && !is_triple_double(previous) {
        events.push(DomainEvent::TripleDouble {
            line: current.clone(),
        });
    }

    events
}

/// Tiers in `(before, after]`, ascending.
fn crossed(tiers: &[u32], before: u32, after: u32) -> impl Iterator<Item = u32> + '_ {
    tiers
        .iter()
        .copied()
        .filter(move |&tier| before < tier && tier <= after)
}

/// Categories (of all five) at or above [`DOUBLE_FIGURES`].
pub fn double_figure_count(line: &PlayerStatLine) -> usize {
    StatCategory::ALL
        .iter()
        .filter(|stat| stat.value(line) >= DOUBLE_FIGURES)
        .count()
}

/// Points, rebounds and assists all in double figures.
pub fn is_triple_double(line: &PlayerStatLine) -> bool {
    line.points >= DOUBLE_FIGURES
        && line.rebounds >= DOUBLE_FIGURES
        && line.assists >= DOUBLE_FIGURES
}

// ── Projections ──────────────────────────────────────────────────────

pub fn projection_events(
    previous: Option<&ProjectionSnapshot>,
    current: &ProjectionSnapshot,
) -> Vec<DomainEvent> {
    match previous {
        Some(previous) if !previous.same_values(current) => vec![DomainEvent::ProjectionChanged {
            previous: previous.clone(),
            current: current.clone(),
        }],
        _ => Vec::new(),
    }
}

/// Events for one transition of any live entity kind.
pub fn diff<T: LiveEntity>(previous: Option<&T>, current: &T) -> Vec<DomainEvent> {
    T::diff(previous, current)
}
