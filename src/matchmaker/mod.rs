//! FIFO matchmaking queue with timeout-driven bot fallback, plus the
//! registry of active games.

use crate::ID;
use crate::MATCHMAKING_TIMEOUT;
use crate::Unique;
use crate::game::Game;
use crate::game::SharedGame;
use crate::game::Status;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Display name of the automated opponent.
pub const BOT_NAME: &str = "BOT";

/// Callback invoked whenever a new game starts (pairing or bot
/// fallback). Feeds the analytics seam; failures there never block
/// matchmaking.
pub type OnStart = Box<dyn Fn(SharedGame) + Send + Sync>;

/// A player parked in the queue. The one-shot sender is the single
/// writer slot: resolved exactly once by pairing or bot fallback, or
/// dropped by an explicit leave so the reader observes cancellation.
struct Waiting {
    name: String,
    since: Instant,
    slot: oneshot::Sender<SharedGame>,
}

#[derive(Default)]
struct Registry {
    queue: VecDeque<Waiting>,
    games: HashMap<ID<Game>, SharedGame>,
    players: HashMap<String, ID<Game>>,
}

/// Pairs waiting players into games, falls back to the bot after a
/// timeout, and owns the id/name registries. One lock guards the queue
/// and both maps; every critical section is short. Unrelated games
/// never contend here after creation.
pub struct Matchmaker {
    registry: Mutex<Registry>,
    on_start: Option<OnStart>,
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            on_start: None,
        }
    }
}

impl Matchmaker {
    pub fn with_on_start(on_start: OnStart) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            on_start: Some(on_start),
        }
    }

    /// Joins the queue. Resolution paths, in order:
    /// - the name already owns a live game → resolved immediately (rejoin)
    /// - someone is waiting → pop the head, pair, resolve both slots
    /// - otherwise → park, and arm the bot-fallback timer
    pub async fn enqueue(self: &Arc<Self>, name: &str) -> oneshot::Receiver<SharedGame> {
        let (tx, rx) = oneshot::channel();
        let mut registry = self.registry.lock().await;

        if let Some(game) = registry
            .players
            .get(name)
            .and_then(|id| registry.games.get(id))
            .cloned()
        {
            if game.read().await.status() != Status::Finished {
                let _ = tx.send(game);
                return rx;
            }
        }

        if let Some(opponent) = registry.queue.pop_front() {
            let mut game = Game::new(&opponent.name);
            game.add_opponent(name, false).expect("fresh game has one seat");
            let id = game.id();
            let game: SharedGame = Arc::new(tokio::sync::RwLock::new(game));
            registry.games.insert(id, game.clone());
            registry.players.insert(opponent.name.clone(), id);
            registry.players.insert(name.to_string(), id);
            log::info!("[matchmaker] paired {} with {}", opponent.name, name);
            let _ = opponent.slot.send(game.clone());
            let _ = tx.send(game.clone());
            self.started(game);
            return rx;
        }

        registry.queue.push_back(Waiting {
            name: name.to_string(),
            since: Instant::now(),
            slot: tx,
        });
        log::debug!("[matchmaker] {} waiting for opponent", name);
        let mm = self.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(MATCHMAKING_TIMEOUT).await;
            mm.fallback(&name).await;
        });
        rx
    }

    /// Fires when the matchmaking timer expires. Re-validates queue
    /// membership under the lock: if the entry was paired (or left) in
    /// the interim this is a no-op, so at most one game is ever created
    /// per waiting entry.
    async fn fallback(&self, name: &str) {
        let mut registry = self.registry.lock().await;
        let Some(pos) = registry.queue.iter().position(|w| w.name == name) else {
            return;
        };
        let waiting = registry.queue.remove(pos).expect("position just found");
        log::info!(
            "[matchmaker] no opponent for {} after {:?}, starting bot game",
            waiting.name,
            waiting.since.elapsed()
        );
        let mut game = Game::new(&waiting.name);
        game.add_opponent(BOT_NAME, true).expect("fresh game has one seat");
        let id = game.id();
        let game: SharedGame = Arc::new(tokio::sync::RwLock::new(game));
        registry.games.insert(id, game.clone());
        registry.players.insert(waiting.name.clone(), id);
        let _ = waiting.slot.send(game.clone());
        self.started(game);
    }

    /// Removes a still-queued entry. Dropping the slot cancels the
    /// reader's one-shot; a no-op once the entry has been paired.
    pub async fn leave(&self, name: &str) {
        let mut registry = self.registry.lock().await;
        if let Some(pos) = registry.queue.iter().position(|w| w.name == name) {
            registry.queue.remove(pos);
            log::debug!("[matchmaker] {} left the queue", name);
        }
    }

    pub async fn game(&self, id: ID<Game>) -> Option<SharedGame> {
        self.registry.lock().await.games.get(&id).cloned()
    }

    pub async fn game_by_player(&self, name: &str) -> Option<SharedGame> {
        let registry = self.registry.lock().await;
        registry
            .players
            .get(name)
            .and_then(|id| registry.games.get(id))
            .cloned()
    }

    /// Evicts a finished game and both name mappings. The bot never
    /// owns a mapping.
    pub async fn remove(&self, id: ID<Game>) {
        let mut registry = self.registry.lock().await;
        if let Some(game) = registry.games.remove(&id) {
            let game = game.read().await;
            registry.players.remove(game.name_of(crate::game::Side::One));
            let guest = game.name_of(crate::game::Side::Two).to_string();
            if !game.vs_bot() && !guest.is_empty() {
                registry.players.remove(&guest);
            }
            log::debug!("[matchmaker] removed game {}", id);
        }
    }

    pub async fn waiting_count(&self) -> usize {
        self.registry.lock().await.queue.len()
    }

    pub async fn active_count(&self) -> usize {
        self.registry.lock().await.games.len()
    }

    fn started(&self, game: SharedGame) {
        if let Some(ref on_start) = self.on_start {
            on_start(game);
        }
    }
}
