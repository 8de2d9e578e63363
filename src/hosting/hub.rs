use super::Connection;
use super::ServerMessage;
use crate::BOT_MOVE_DELAY;
use crate::CLEANUP_DELAY;
use crate::Column;
use crate::ID;
use crate::RECONNECT_WINDOW;
use crate::Row;
use crate::Unique;
use crate::game::Bot;
use crate::game::Game;
use crate::game::SharedGame;
use crate::game::Side;
use crate::game::Status;
use crate::matchmaker::Matchmaker;
use crate::records::Event;
use crate::records::Recorder;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Registry mutations, processed strictly in arrival order by the hub
/// actor so registration races cannot corrupt the maps.
enum HubCommand {
    Register(Connection),
    Unregister(Connection, Option<SharedGame>),
    Bind(ID<Game>, Connection),
    Broadcast(ID<Game>, ServerMessage),
    Evict(ID<Game>),
}

/// Handle to the session hub. Cheap to clone; registry mutation goes
/// through the actor's command queue, while game-state work (bot
/// moves, game end, timers) runs on the caller's task against the
/// per-game lock.
#[derive(Clone)]
pub struct Hub {
    tx: UnboundedSender<HubCommand>,
    matchmaker: Arc<Matchmaker>,
    recorder: Recorder,
}

impl Hub {
    /// Starts the hub actor and returns its handle.
    pub fn spawn(matchmaker: Arc<Matchmaker>, recorder: Recorder) -> Self {
        let (tx, rx) = unbounded_channel();
        let hub = Self {
            tx,
            matchmaker,
            recorder,
        };
        tokio::spawn(
            HubActor {
                hub: hub.clone(),
                connections: HashMap::new(),
                audiences: HashMap::new(),
            }
            .run(rx),
        );
        hub
    }

    pub fn register(&self, connection: Connection) {
        let _ = self.tx.send(HubCommand::Register(connection));
    }

    /// Hands the dead connection (and whatever game it was bound to)
    /// to the actor, which drives the disconnect protocol.
    pub fn unregister(&self, connection: Connection, game: Option<SharedGame>) {
        let _ = self.tx.send(HubCommand::Unregister(connection, game));
    }

    /// Binds a connection to a game for broadcast delivery.
    pub fn bind(&self, id: ID<Game>, connection: Connection) {
        let _ = self.tx.send(HubCommand::Bind(id, connection));
    }

    pub fn broadcast(&self, id: ID<Game>, message: ServerMessage) {
        let _ = self.tx.send(HubCommand::Broadcast(id, message));
    }

    /// Serializes the current snapshot once and fans it out to every
    /// connection bound to the game.
    pub async fn broadcast_state(&self, game: &SharedGame) {
        let game = game.read().await;
        self.broadcast(game.id(), ServerMessage::state(game.snapshot()));
    }

    /// Post-move orchestration: emit the analytics event, broadcast
    /// the new state, then either finish the game or hand the turn to
    /// the bot.
    pub async fn moved(&self, game: &SharedGame, side: Side, column: Column, row: Row) {
        let id = game.read().await.id();
        self.emit(Event::moved(id, side, column, row));
        self.broadcast_state(game).await;
        let (finished, bot_next) = {
            let game = game.read().await;
            (game.status() == Status::Finished, game.bot_to_move())
        };
        if finished {
            self.game_over(game).await;
        } else if bot_next {
            self.trigger_bot(game.clone());
        }
    }

    /// Schedules the automated reply. The delay keeps the bot from
    /// answering instantly; the status re-check under the lock covers
    /// the game ending (disconnect, forfeit) while the timer ran. The
    /// search itself runs on a private board clone with no lock held.
    pub fn trigger_bot(&self, game: SharedGame) {
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(BOT_MOVE_DELAY).await;
            let (board, side) = {
                let game = game.read().await;
                if !game.bot_to_move() {
                    return;
                }
                (game.board().clone(), game.turn())
            };
            let Some(column) = Bot::new(side).best_move(&board) else {
                return;
            };
            let row = {
                let mut game = game.write().await;
                if !game.bot_to_move() {
                    return;
                }
                match game.apply_move(side, column) {
                    Ok(row) => row,
                    Err(e) => {
                        log::error!("[hub] bot move rejected: {}", e);
                        return;
                    }
                }
            };
            log::debug!("[hub] bot played column {} (row {})", column, row);
            hub.moved(&game, side, column, row).await;
        });
    }

    /// Terminal handling: broadcast the result, persist, emit, and
    /// schedule eviction from the hub and matchmaker registries.
    pub async fn game_over(&self, game: &SharedGame) {
        let (id, snapshot) = {
            let game = game.read().await;
            (game.id(), game.snapshot())
        };
        let Some(reason) = snapshot.result else {
            log::error!("[hub] game {} ended without an outcome", id);
            return;
        };
        self.broadcast(id, ServerMessage::game_over(snapshot.winner.clone(), reason));
        self.emit(Event::ended(id, reason, snapshot.winner.as_deref()));
        let archive = self.recorder.archive.clone();
        tokio::spawn(async move { archive.persist(&snapshot).await });
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(CLEANUP_DELAY).await;
            let _ = hub.tx.send(HubCommand::Evict(id));
            hub.matchmaker.remove(id).await;
        });
    }

    /// Fire-and-forget analytics; a slow sink never blocks gameplay.
    pub fn emit(&self, event: Event) {
        let sink = self.recorder.sink.clone();
        tokio::spawn(async move { sink.emit(event).await });
    }

    /// Arms the reconnect deadline. If the game is still `Disconnected`
    /// when it fires, the absent side forfeits; any other status means
    /// the player came back (or the game ended) and the timer is a
    /// no-op.
    fn reconnect_timer(&self, game: SharedGame, side: Side) {
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RECONNECT_WINDOW).await;
            let expired = {
                let mut game = game.write().await;
                match game.status() {
                    Status::Disconnected => {
                        game.forfeit(side);
                        true
                    }
                    _ => false,
                }
            };
            if expired {
                hub.game_over(&game).await;
            }
        });
    }
}

/// Owns the connection registries exclusively. Commands are processed
/// one at a time in arrival order; nothing else touches the maps.
struct HubActor {
    hub: Hub,
    connections: HashMap<String, Connection>,
    audiences: HashMap<ID<Game>, HashMap<String, Connection>>,
}

impl HubActor {
    async fn run(mut self, mut rx: UnboundedReceiver<HubCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                HubCommand::Register(connection) => {
                    log::debug!("[hub] registered {}", connection.name());
                    self.connections.insert(connection.name().to_string(), connection);
                }
                HubCommand::Unregister(connection, game) => {
                    self.unregister(connection, game).await;
                }
                HubCommand::Bind(id, connection) => {
                    self.audiences
                        .entry(id)
                        .or_default()
                        .insert(connection.name().to_string(), connection);
                }
                HubCommand::Broadcast(id, message) => {
                    self.broadcast(id, &message);
                }
                HubCommand::Evict(id) => {
                    self.audiences.remove(&id);
                    log::debug!("[hub] evicted game {}", id);
                }
            }
        }
    }

    fn broadcast(&self, id: ID<Game>, message: &ServerMessage) {
        let Some(audience) = self.audiences.get(&id) else {
            return;
        };
        let json = message.to_json();
        for connection in audience.values() {
            connection.raw(json.clone());
        }
    }

    /// The disconnect protocol. A stale unregister (the name was
    /// re-registered by a fresh connection) only detaches the old
    /// channel; otherwise: unbound sessions just leave the queue, a
    /// bot opponent wins by instant forfeit, and a human opponent is
    /// notified and given the reconnect window.
    async fn unregister(&mut self, connection: Connection, game: Option<SharedGame>) {
        let name = connection.name().to_string();
        let stale = match self.connections.get(&name) {
            Some(current) => !current.same(&connection),
            None => true,
        };
        if stale {
            log::debug!("[hub] ignoring stale unregister for {}", name);
            return;
        }
        self.connections.remove(&name);
        log::debug!("[hub] unregistered {}", name);
        let Some(game) = game else {
            self.hub.matchmaker.leave(&name).await;
            return;
        };
        let (id, side, vs_bot, status) = {
            let game = game.read().await;
            match game.side_of(&name) {
                Some(side) => (game.id(), side, game.vs_bot(), game.status()),
                None => return,
            }
        };
        if let Some(audience) = self.audiences.get_mut(&id) {
            audience.remove(&name);
        }
        if status == Status::Finished {
            return;
        }
        if vs_bot {
            // the bot does not wait for anyone
            game.write().await.forfeit(side);
            self.hub.game_over(&game).await;
            return;
        }
        game.write().await.mark_disconnected(side);
        let deadline = std::time::SystemTime::now() + RECONNECT_WINDOW;
        if let Some(audience) = self.audiences.get(&id) {
            for connection in audience.values().filter(|c| c.name() != name) {
                connection.send(&ServerMessage::opponent_disconnected(deadline));
            }
        }
        self.hub.reconnect_timer(game, side);
    }
}
