// ── Signal → notification composition ──

use courtside_api::model::{NoticeLevel, SystemNotice};

use super::channels::ToastVariant;
use crate::model::{DomainEvent, NotificationDraft, NotificationType, StatCategory};

/// Anything the notification center can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Domain(DomainEvent),
    System(SystemNotice),
}

impl From<DomainEvent> for Signal {
    fn from(event: DomainEvent) -> Self {
        Self::Domain(event)
    }
}

impl From<SystemNotice> for Signal {
    fn from(notice: SystemNotice) -> Self {
        Self::System(notice)
    }
}

impl Signal {
    /// Notification type used for preference gating and display.
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::Domain(
                DomainEvent::GameStarted { .. } | DomainEvent::GameEnded { .. },
            ) => NotificationType::Update,
            Self::Domain(
                DomainEvent::StatMilestone { .. }
                | DomainEvent::DoubleDouble { .. }
                | DomainEvent::TripleDouble { .. },
            ) => NotificationType::Alert,
            Self::Domain(DomainEvent::ProjectionChanged { .. }) => NotificationType::Info,
            Self::System(_) => NotificationType::System,
        }
    }

    pub fn toast_variant(&self) -> ToastVariant {
        match self {
            Self::System(notice) if notice.level == NoticeLevel::Error => ToastVariant::Destructive,
            _ => ToastVariant::Default,
        }
    }

    /// Build the record to persist for `user_id`.
    pub fn compose(&self, user_id: &str) -> NotificationDraft {
        let (title, message, url) = match self {
            Self::Domain(event) => describe(event),
            Self::System(notice) => (
                notice
                    .title
                    .clone()
                    .unwrap_or_else(|| notice.level.label().to_owned()),
                notice.message.clone(),
                notice.url.clone(),
            ),
        };

        let data = match self {
            Self::Domain(event) => serde_json::to_value(event).ok(),
            Self::System(notice) => serde_json::to_value(notice).ok(),
        };

        NotificationDraft {
            user_id: user_id.to_owned(),
            title,
            message,
            kind: self.notification_type(),
            url,
            data,
        }
    }
}

fn describe(event: &DomainEvent) -> (String, String, Option<String>) {
    match event {
        DomainEvent::GameStarted { game } => (
            "Game Started".into(),
            format!("{} vs {} is under way", game.home_label(), game.visitor_label()),
            Some(format!("/games/{}", game.id)),
        ),
        DomainEvent::GameEnded { game } => {
            let (home, visitor) = game.scores().unwrap_or_default();
            (
                "Final".into(),
                format!(
                    "{} {home}, {} {visitor}",
                    game.home_label(),
                    game.visitor_label()
                ),
                Some(format!("/games/{}", game.id)),
            )
        }
        DomainEvent::StatMilestone {
            line,
            stat,
            threshold,
        } => (
            "Player Milestone".into(),
            format!(
                "{} reached {threshold}+ {} ({})",
                line.display_name(),
                stat_noun(*stat),
                stat.value(line)
            ),
            Some(format!("/players/{}", line.player_id)),
        ),
        DomainEvent::DoubleDouble { line } => (
            "Double-Double".into(),
            format!("{} recorded a double-double", line.display_name()),
            Some(format!("/players/{}", line.player_id)),
        ),
        DomainEvent::TripleDouble { line } => (
            "Triple-Double".into(),
            format!(
                "{} recorded a triple-double with {} pts, {} reb, {} ast",
                line.display_name(),
                line.points,
                line.rebounds,
                line.assists
            ),
            Some(format!("/players/{}", line.player_id)),
        ),
        DomainEvent::ProjectionChanged { current, .. } => (
            "Projection Updated".into(),
            format!(
                "{} - Points: {:.1}, Rebounds: {:.1}, Assists: {:.1}",
                current.display_name(),
                current.projected_points,
                current.projected_rebounds,
                current.projected_assists
            ),
            Some(format!("/players/{}", current.player_id)),
        ),
    }
}

fn stat_noun(stat: StatCategory) -> &'static str {
    stat.into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{GameSnapshot, GameStatus, PlayerStatLine};
    use pretty_assertions::assert_eq;

    fn line() -> PlayerStatLine {
        PlayerStatLine {
            player_id: "p23".into(),
            game_id: "g1".into(),
            team_id: None,
            player_name: Some("LeBron James".into()),
            points: 31,
            rebounds: 7,
            assists: 4,
            steals: 0,
            blocks: 0,
        }
    }

    #[test]
    fn milestone_composes_alert_with_player_link() {
        let signal = Signal::from(DomainEvent::StatMilestone {
            line: line(),
            stat: StatCategory::Points,
            threshold: 30,
        });
        let draft = signal.compose("u1");

        assert_eq!(draft.kind, NotificationType::Alert);
        assert_eq!(draft.title, "Player Milestone");
        assert_eq!(draft.message, "LeBron James reached 30+ points (31)");
        assert_eq!(draft.url.as_deref(), Some("/players/p23"));
        let data = draft.data.unwrap();
        assert_eq!(data["kind"], "stat_milestone");
        assert_eq!(data["threshold"], 30);
    }

    #[test]
    fn game_end_reports_final_score() {
        let game = GameSnapshot {
            id: "g1".into(),
            season_id: None,
            game_date: None,
            home_team_id: "BOS".into(),
            visitor_team_id: "NYK".into(),
            home_team_score: Some(102),
            visitor_team_score: Some(99),
            status: GameStatus::Final,
            home_team: None,
            visitor_team: None,
        };
        let draft = Signal::from(DomainEvent::GameEnded { game }).compose("u1");
        assert_eq!(draft.kind, NotificationType::Update);
        assert_eq!(draft.message, "BOS 102, NYK 99");
        assert_eq!(draft.url.as_deref(), Some("/games/g1"));
    }

    #[test]
    fn system_notice_title_falls_back_to_level() {
        let notice = SystemNotice {
            message: "Feed delayed".into(),
            level: NoticeLevel::Error,
            title: None,
            url: None,
            timestamp: None,
        };
        let signal = Signal::from(notice);
        let draft = signal.compose("u1");
        assert_eq!(draft.kind, NotificationType::System);
        assert_eq!(draft.title, "Error");
        assert_eq!(signal.toast_variant(), ToastVariant::Destructive);
    }
}
