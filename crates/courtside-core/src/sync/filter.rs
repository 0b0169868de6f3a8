use std::fmt;

use courtside_api::Topic;

use super::LiveEntity;

/// Which entities a [`LiveView`](super::LiveView) keeps.
pub enum EntityFilter<T> {
    /// Every entity on the collection topic.
    All,
    /// A single entity by id. Uses the narrow per-entity topic where the
    /// server publishes one.
    Id(String),
    /// Any of the listed ids.
    Ids(Vec<String>),
    /// Arbitrary predicate over the snapshot.
    Custom(Box<dyn Fn(&T) -> bool + Send + Sync>),
}

impl<T: LiveEntity> EntityFilter<T> {
    pub fn custom(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Box::new(predicate))
    }

    pub fn matches(&self, entity: &T) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => entity.entity_id() == id,
            Self::Ids(ids) => ids.iter().any(|id| id == entity.entity_id()),
            Self::Custom(predicate) => predicate(entity),
        }
    }

    /// Topic the view should subscribe to.
    pub fn topic(&self) -> Topic {
        match self {
            Self::Id(id) => T::entity_topic(id).unwrap_or_else(|| Topic::new(T::TOPIC)),
            _ => Topic::new(T::TOPIC),
        }
    }
}

impl<T> Default for EntityFilter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T> fmt::Debug for EntityFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameSnapshot, GameStatus, ProjectionSnapshot};

    fn game(id: &str) -> GameSnapshot {
        GameSnapshot {
            id: id.into(),
            season_id: None,
            game_date: None,
            home_team_id: "BOS".into(),
            visitor_team_id: "NYK".into(),
            home_team_score: None,
            visitor_team_score: None,
            status: GameStatus::Scheduled,
            home_team: None,
            visitor_team: None,
        }
    }

    #[test]
    fn id_filter_narrows_topic_when_available() {
        let games: EntityFilter<GameSnapshot> = EntityFilter::Id("g7".into());
        assert_eq!(games.topic().as_str(), "game/g7");
        assert!(games.matches(&game("g7")));
        assert!(!games.matches(&game("g8")));

        let projections: EntityFilter<ProjectionSnapshot> = EntityFilter::Id("p1".into());
        assert_eq!(projections.topic().as_str(), "projections");
    }

    #[test]
    fn ids_and_custom_filters() {
        let ids: EntityFilter<GameSnapshot> = EntityFilter::Ids(vec!["a".into(), "b".into()]);
        assert!(ids.matches(&game("b")));
        assert!(!ids.matches(&game("c")));
        assert_eq!(ids.topic().as_str(), "games");

        let home: EntityFilter<GameSnapshot> = EntityFilter::custom(|g: &GameSnapshot| g.home_team_id == "BOS");
        assert!(home.matches(&game("x")));
        assert_eq!(format!("{home:?}"), "Custom(..)");
    }
}
