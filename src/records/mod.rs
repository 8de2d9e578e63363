//! Collaborator seams for persistence and analytics.
//!
//! The core treats both as fire-and-forget: a finished game is handed
//! to [`Archive::persist`] once, and [`Sink::emit`] fires for game
//! start, every move, and game end. Implementations swallow their own
//! failures; nothing here may surface to players or block gameplay.

use crate::Column;
use crate::ID;
use crate::Row;
use crate::game::Game;
use crate::game::Outcome;
use crate::game::Side;
use crate::game::Snapshot;
use std::sync::Arc;

/// Analytics event: game id, wall-clock timestamp, and a free-form
/// JSON payload describing what happened.
#[derive(Clone, Debug)]
pub struct Event {
    pub game: ID<Game>,
    pub timestamp: std::time::SystemTime,
    pub payload: serde_json::Value,
}

impl Event {
    fn new(game: ID<Game>, payload: serde_json::Value) -> Self {
        Self {
            game,
            timestamp: std::time::SystemTime::now(),
            payload,
        }
    }
    pub fn started(game: ID<Game>, vs_bot: bool) -> Self {
        Self::new(game, serde_json::json!({ "event": "started", "vsBot": vs_bot }))
    }
    pub fn moved(game: ID<Game>, side: Side, column: Column, row: Row) -> Self {
        Self::new(
            game,
            serde_json::json!({
                "event": "moved",
                "player": side.index(),
                "column": column,
                "row": row,
            }),
        )
    }
    pub fn ended(game: ID<Game>, outcome: Outcome, winner: Option<&str>) -> Self {
        Self::new(
            game,
            serde_json::json!({ "event": "ended", "result": outcome, "winner": winner }),
        )
    }
}

/// Persistence of finished games.
#[async_trait::async_trait]
pub trait Archive: Send + Sync {
    async fn persist(&self, game: &Snapshot);
}

/// Analytics event delivery.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn emit(&self, event: Event);
}

/// Log-only implementation of both seams, used until a real store or
/// event pipeline is plugged in.
pub struct Logbook;

#[async_trait::async_trait]
impl Archive for Logbook {
    async fn persist(&self, game: &Snapshot) {
        log::info!(
            "[records] finished game {}: {:?} after {} moves in {}ms",
            game.id,
            game.result,
            game.move_count,
            game.duration_ms
        );
    }
}

#[async_trait::async_trait]
impl Sink for Logbook {
    async fn emit(&self, event: Event) {
        log::debug!("[records] {} {}", event.game, event.payload);
    }
}

/// Bundle of both collaborator handles, shared across the hub.
#[derive(Clone)]
pub struct Recorder {
    pub archive: Arc<dyn Archive>,
    pub sink: Arc<dyn Sink>,
}

impl Recorder {
    /// Log-only recorder.
    pub fn logbook() -> Self {
        Self {
            archive: Arc::new(Logbook),
            sink: Arc::new(Logbook),
        }
    }
}
