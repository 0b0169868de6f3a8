// ── Entity storage ──

mod cache;

pub use cache::{EntityCache, Transition};
