use super::ClientMessage;
use super::Connection;
use super::Hub;
use super::ServerMessage;
use crate::Column;
use crate::ID;
use crate::Unique;
use crate::game::Game;
use crate::game::GameError;
use crate::game::SharedGame;
use crate::game::Status;
use crate::matchmaker::Matchmaker;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-connection protocol logic. Parses inbound frames, talks to the
/// matchmaker and hub, and remembers which game this connection is
/// bound to.
#[derive(Clone)]
pub struct Dispatcher {
    name: String,
    connection: Connection,
    hub: Hub,
    matchmaker: Arc<Matchmaker>,
    binding: Arc<Mutex<Option<SharedGame>>>,
}

impl Dispatcher {
    pub fn new(name: &str, connection: Connection, hub: Hub, matchmaker: Arc<Matchmaker>) -> Self {
        Self {
            name: name.to_string(),
            connection,
            hub,
            matchmaker,
            binding: Arc::new(Mutex::new(None)),
        }
    }

    /// The game this connection is currently playing, if any.
    pub async fn binding(&self) -> Option<SharedGame> {
        self.binding.lock().await.clone()
    }

    pub async fn dispatch(&self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Join) => self.join().await,
            Ok(ClientMessage::Move { column }) => self.apply(column).await,
            Ok(ClientMessage::Reconnect { match_id }) => self.reconnect(match_id).await,
            Err(_) => {
                log::debug!("[dispatch {}] unparseable frame: {}", self.name, text);
                self.connection.send(&ServerMessage::error("invalid message format"));
            }
        }
    }

    /// Join resumes a live game when the name already owns one, and
    /// otherwise queues up. The queue resolution is awaited on a side
    /// task so a parked player can still receive frames.
    async fn join(&self) {
        if let Some(game) = self.matchmaker.game_by_player(&self.name).await {
            if game.read().await.status() != Status::Finished {
                self.resume(game).await;
                return;
            }
        }
        self.connection.send(&ServerMessage::waiting("Searching for an opponent..."));
        let rx = self.matchmaker.enqueue(&self.name).await;
        let dispatcher = self.clone();
        tokio::spawn(async move {
            // a dropped sender means the player left the queue
            let Ok(game) = rx.await else { return };
            dispatcher.bind(&game).await;
            dispatcher.matched(&game).await;
        });
    }

    /// Validates and applies one move, then lets the hub fan out the
    /// consequences.
    async fn apply(&self, column: Column) {
        let Some(game) = self.binding().await else {
            self.connection.send(&ServerMessage::error("not in a game"));
            return;
        };
        let side = match game.read().await.side_of(&self.name) {
            Some(side) => side,
            None => {
                self.connection.send(&ServerMessage::error(GameError::NotAParticipant));
                return;
            }
        };
        let result = game.write().await.apply_move(side, column);
        match result {
            Ok(row) => {
                log::info!("[dispatch {}] played column {} (row {})", self.name, column, row);
                self.hub.moved(&game, side, column, row).await;
            }
            Err(e) => self.connection.send(&ServerMessage::error(e)),
        }
    }

    /// Rebinds to a live game, by id when the client still has one and
    /// by name otherwise.
    async fn reconnect(&self, match_id: Option<String>) {
        let game = match match_id.as_deref().and_then(|s| ID::<Game>::from_str(s).ok()) {
            Some(id) => self.matchmaker.game(id).await,
            None => None,
        };
        let game = match game {
            Some(game) => Some(game),
            None => self.matchmaker.game_by_player(&self.name).await,
        };
        let Some(game) = game else {
            self.connection.send(&ServerMessage::error(GameError::GameNotFound));
            return;
        };
        self.resume(game).await;
    }

    /// Shared tail of join-rejoin and reconnect: flips the seat back to
    /// connected (when inside the window), rebinds, and notifies.
    async fn resume(&self, game: SharedGame) {
        let side = match game.read().await.side_of(&self.name) {
            Some(side) => side,
            None => {
                self.connection.send(&ServerMessage::error(GameError::NotAParticipant));
                return;
            }
        };
        let (accepted, status) = {
            let mut game = game.write().await;
            (game.mark_reconnected(side), game.status())
        };
        if !accepted && status == Status::Disconnected {
            self.connection.send(&ServerMessage::error("reconnection window expired"));
            return;
        }
        if status == Status::Finished {
            self.connection.send(&ServerMessage::error("game has already ended"));
            return;
        }
        self.bind(&game).await;
        if accepted {
            log::info!("[dispatch {}] reconnected", self.name);
            let id = game.read().await.id();
            self.hub.broadcast(id, ServerMessage::OpponentReconnected);
        }
        self.matched(&game).await;
    }

    async fn bind(&self, game: &SharedGame) {
        *self.binding.lock().await = Some(game.clone());
        let id = game.read().await.id();
        self.hub.bind(id, self.connection.clone());
    }

    /// Sends this player their seat assignment and the full state.
    async fn matched(&self, game: &SharedGame) {
        let game = game.read().await;
        let side = game.side_of(&self.name).expect("bound player has a seat");
        let opponent = game.name_of(side.opponent());
        self.connection.send(&ServerMessage::matched(
            game.id(),
            opponent,
            game.turn() == side,
            side,
            game.snapshot(),
        ));
    }
}
