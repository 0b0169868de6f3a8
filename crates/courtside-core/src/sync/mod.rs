// ── Entity synchronizers ──
//
// `LiveEntity` ties each snapshot kind to its topics, cache key, payload
// extraction and diff rule. `Synchronizer` is the process-level tracker the
// engine feeds; `LiveView` is a scoped, filtered view for one consumer.

mod filter;
mod view;

use courtside_api::{Payload, Topic};

pub use filter::EntityFilter;
pub use view::LiveView;

use crate::detect;
use crate::model::{DomainEvent, GameSnapshot, PlayerStatLine, ProjectionSnapshot};
use crate::store::EntityCache;

/// A snapshot kind delivered over the push feed.
pub trait LiveEntity: Send + Sync + 'static {
    /// Collection topic carrying every update of this kind.
    const TOPIC: &'static str;

    /// Narrow topic for a single entity, if the server publishes one.
    fn entity_topic(id: &str) -> Option<Topic>;

    /// Cache key; one slot per key.
    fn key(&self) -> String;

    /// Id matched by [`EntityFilter::Id`].
    fn entity_id(&self) -> &str;

    /// Snapshots of this kind carried by a payload.
    fn extract(payload: &Payload) -> Vec<Self>
    where
        Self: Sized;

    /// Domain events for one transition.
    fn diff(previous: Option<&Self>, current: &Self) -> Vec<DomainEvent>;
}

impl LiveEntity for GameSnapshot {
    const TOPIC: &'static str = Topic::GAMES;

    fn entity_topic(id: &str) -> Option<Topic> {
        Some(Topic::game(id))
    }

    fn key(&self) -> String {
        self.id.clone()
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn extract(payload: &Payload) -> Vec<Self> {
        match payload {
            Payload::GameUpdate { game } => vec![game.clone()],
            _ => Vec::new(),
        }
    }

    fn diff(previous: Option<&Self>, current: &Self) -> Vec<DomainEvent> {
        detect::game_events(previous, current)
    }
}

impl LiveEntity for PlayerStatLine {
    const TOPIC: &'static str = Topic::PLAYERS;

    fn entity_topic(id: &str) -> Option<Topic> {
        Some(Topic::player(id))
    }

    fn key(&self) -> String {
        PlayerStatLine::key(self)
    }

    fn entity_id(&self) -> &str {
        &self.player_id
    }

    fn extract(payload: &Payload) -> Vec<Self> {
        match payload {
            Payload::PlayerUpdate { stats } => vec![stats.clone()],
            _ => Vec::new(),
        }
    }

    fn diff(previous: Option<&Self>, current: &Self) -> Vec<DomainEvent> {
        detect::player_events(previous, current)
    }
}

impl LiveEntity for ProjectionSnapshot {
    const TOPIC: &'static str = Topic::PROJECTIONS;

    // `projection/{id}` is keyed by the server's row id, which snapshots
    // do not carry, so filtered views stay on the collection topic.
    fn entity_topic(_id: &str) -> Option<Topic> {
        None
    }

    fn key(&self) -> String {
        ProjectionSnapshot::key(self)
    }

    fn entity_id(&self) -> &str {
        &self.player_id
    }

    fn extract(payload: &Payload) -> Vec<Self> {
        match payload {
            Payload::ProjectionUpdate { projection } => vec![projection.clone()],
            Payload::BulkProjectionsUpdate { projections } => projections.clone(),
            _ => Vec::new(),
        }
    }

    fn diff(previous: Option<&Self>, current: &Self) -> Vec<DomainEvent> {
        detect::projection_events(previous, current)
    }
}

// ── Synchronizer ─────────────────────────────────────────────────────

/// Process-level tracker for one entity kind.
///
/// Keeps the previous/current pair per key and runs the detector on every
/// ingested snapshot. Per-key ordering follows the order of `ingest`
/// calls, which the transport keeps in server order per topic.
pub struct Synchronizer<T: LiveEntity> {
    cache: EntityCache<T>,
}

impl<T: LiveEntity> Default for Synchronizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LiveEntity> Synchronizer<T> {
    pub fn new() -> Self {
        Self {
            cache: EntityCache::new(),
        }
    }

    /// Record server-fetched values as baselines.
    pub fn seed(&self, initial: impl IntoIterator<Item = T>) {
        for entity in initial {
            self.cache.seed(entity.key(), entity);
        }
    }

    /// Apply every snapshot in `payload` and return the resulting events.
    pub fn ingest(&self, payload: &Payload) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        for entity in T::extract(payload) {
            let transition = self.cache.apply(entity.key(), entity);
            events.extend(T::diff(transition.previous.as_deref(), &transition.current));
        }
        events
    }

    pub fn cache(&self) -> &EntityCache<T> {
        &self.cache
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventKind, GameStatus};
    use serde_json::json;

    fn game_payload(status: &str, home: Option<u32>, visitor: Option<u32>) -> Payload {
        serde_json::from_value(json!({
            "type": "game_update",
            "data": {
                "id": "g1",
                "home_team_id": "BOS",
                "visitor_team_id": "NYK",
                "home_team_score": home,
                "visitor_team_score": visitor,
                "status": status
            }
        }))
        .unwrap_or_else(|e| panic!("bad fixture: {e}"))
    }

    #[test]
    fn synchronizer_detects_across_ingests() {
        let sync: Synchronizer<GameSnapshot> = Synchronizer::new();

        assert!(sync.ingest(&game_payload("scheduled", None, None)).is_empty());
        let started = sync.ingest(&game_payload("in_progress", None, None));
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].kind(), EventKind::GameStarted);

        assert!(sync.ingest(&game_payload("in_progress", Some(88), Some(85))).is_empty());
        let ended = sync.ingest(&game_payload("Final", Some(102), Some(99)));
        assert_eq!(ended[0].kind(), EventKind::GameEnded);

        let latest = sync.cache().get("g1").unwrap_or_else(|| panic!("missing g1"));
        assert_eq!(latest.status, GameStatus::Final);
    }

    #[test]
    fn seeded_baseline_participates_in_first_diff() {
        let sync: Synchronizer<PlayerStatLine> = Synchronizer::new();
        sync.seed([PlayerStatLine {
            player_id: "p1".into(),
            game_id: "g1".into(),
            team_id: None,
            player_name: None,
            points: 28,
            rebounds: 0,
            assists: 0,
            steals: 0,
            blocks: 0,
        }]);

        let payload: Payload = serde_json::from_value(json!({
            "type": "player_update",
            "player_id": "p1",
            "data": { "player_id": "p1", "game_id": "g1", "points": 30 }
        }))
        .unwrap_or_else(|e| panic!("bad fixture: {e}"));

        let events = sync.ingest(&payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].threshold(), Some(30));
    }

    #[test]
    fn bulk_projection_updates_fan_out_per_pair() {
        let sync: Synchronizer<ProjectionSnapshot> = Synchronizer::new();
        let bulk = |p1: f64, p2: f64| -> Payload {
            serde_json::from_value(json!({
                "type": "bulk_projections_update",
                "data": [
                    { "player_id": "p1", "game_id": "g1", "projected_points": p1 },
                    { "player_id": "p2", "game_id": "g1", "projected_points": p2 }
                ]
            }))
            .unwrap_or_else(|e| panic!("bad fixture: {e}"))
        };

        assert!(sync.ingest(&bulk(20.0, 10.0)).is_empty());
        let events = sync.ingest(&bulk(20.0, 12.5));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_id(), "p2");
        assert_eq!(sync.cache().len(), 2);
    }

    #[test]
    fn other_payload_kinds_are_ignored() {
        let sync: Synchronizer<GameSnapshot> = Synchronizer::new();
        let payload: Payload = serde_json::from_value(json!({
            "type": "system_notification",
            "message": "hello"
        }))
        .unwrap_or_else(|e| panic!("bad fixture: {e}"));
        assert!(sync.ingest(&payload).is_empty());
        assert!(sync.cache().is_empty());
    }
}
