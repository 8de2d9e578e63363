use super::Board;
use super::GameError;
use super::Side;
use crate::Column;
use crate::ID;
use crate::RECONNECT_WINDOW;
use crate::Row;
use crate::Unique;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Shared handle to a live game. Writers take the write lock for the
/// duration of one state transition; snapshots take the read lock.
pub type SharedGame = Arc<tokio::sync::RwLock<Game>>;

/// Lifecycle of a game. Moves are processed only while `Playing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Waiting,
    Playing,
    Disconnected,
    Finished,
}

/// How a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Connect4,
    Draw,
    Forfeit,
}

/// One side's occupant: a named human connection or the bot.
#[derive(Clone, Debug)]
pub struct Participant {
    pub name: String,
    pub side: Side,
    pub is_bot: bool,
    pub connected: bool,
}

/// Immutable record of a single placed disc.
#[derive(Clone, Debug)]
pub struct Move {
    pub side: Side,
    pub column: Column,
    pub row: Row,
    pub index: usize,
    pub timestamp: std::time::SystemTime,
}

/// One match's full state machine: board, two participants, turn
/// ownership, move log, and disconnect bookkeeping. All mutation goes
/// through `&mut self`; concurrency is the [`SharedGame`] lock's job.
pub struct Game {
    id: ID<Game>,
    board: Board,
    host: Participant,
    guest: Option<Participant>,
    turn: Side,
    status: Status,
    winner: Option<Side>,
    outcome: Option<Outcome>,
    moves: Vec<Move>,
    started: Instant,
    ended: Option<Instant>,
    dropped: Option<(Side, Instant)>,
}

impl Game {
    /// Opens a game with only side 1 seated, waiting for an opponent.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            id: ID::default(),
            board: Board::default(),
            host: Participant {
                name: host.into(),
                side: Side::One,
                is_bot: false,
                connected: true,
            },
            guest: None,
            turn: Side::One,
            status: Status::Waiting,
            winner: None,
            outcome: None,
            moves: Vec::new(),
            started: Instant::now(),
            ended: None,
            dropped: None,
        }
    }

    /// Seats side 2 and starts play.
    pub fn add_opponent(&mut self, name: impl Into<String>, is_bot: bool) -> Result<(), GameError> {
        if self.guest.is_some() {
            return Err(GameError::GameFull);
        }
        self.guest = Some(Participant {
            name: name.into(),
            side: Side::Two,
            is_bot,
            connected: true,
        });
        self.status = Status::Playing;
        log::info!("[game {}] started: {} vs {}", self.id, self.host.name, self.name_of(Side::Two));
        Ok(())
    }

    /// Applies one move for the side holding the turn. On success the
    /// move is logged, then win → draw → turn-flip checks run in order.
    pub fn apply_move(&mut self, side: Side, column: Column) -> Result<Row, GameError> {
        if self.status != Status::Playing {
            return Err(GameError::NotPlaying);
        }
        if self.turn != side {
            return Err(GameError::NotYourTurn);
        }
        let row = self.board.drop_disc(column, side)?;
        self.moves.push(Move {
            side,
            column,
            row,
            index: self.moves.len(),
            timestamp: std::time::SystemTime::now(),
        });
        if self.board.check_win(side) {
            self.status = Status::Finished;
            self.winner = Some(side);
            self.outcome = Some(Outcome::Connect4);
            self.ended = Some(Instant::now());
        } else if self.board.is_full() {
            self.status = Status::Finished;
            self.outcome = Some(Outcome::Draw);
            self.ended = Some(Instant::now());
        } else {
            self.turn = side.opponent();
        }
        Ok(row)
    }

    /// Records a mid-game disconnect. No-op unless currently `Playing`.
    pub fn mark_disconnected(&mut self, side: Side) {
        if self.status != Status::Playing {
            return;
        }
        self.dropped = Some((side, Instant::now()));
        self.status = Status::Disconnected;
        if let Some(p) = self.participant_mut(side) {
            p.connected = false;
        }
        log::info!("[game {}] {} disconnected", self.id, side);
    }

    /// Restores play if this exact side disconnected and is still inside
    /// the reconnect window. Returns false (state unchanged) otherwise;
    /// the caller decides forfeiture.
    pub fn mark_reconnected(&mut self, side: Side) -> bool {
        match self.dropped {
            Some((s, since)) if self.status == Status::Disconnected && s == side => {
                if since.elapsed() > RECONNECT_WINDOW {
                    return false;
                }
                self.status = Status::Playing;
                self.dropped = None;
                if let Some(p) = self.participant_mut(side) {
                    p.connected = true;
                }
                log::info!("[game {}] {} reconnected", self.id, side);
                true
            }
            _ => false,
        }
    }

    /// Ends the game in favor of the non-offending side, from any
    /// non-terminal status. No-op once finished, so a double forfeit
    /// cannot flip the winner.
    pub fn forfeit(&mut self, loser: Side) {
        if self.status == Status::Finished {
            return;
        }
        self.status = Status::Finished;
        self.outcome = Some(Outcome::Forfeit);
        self.winner = Some(loser.opponent());
        self.ended = Some(Instant::now());
        log::info!("[game {}] {} forfeits", self.id, loser);
    }

    pub fn status(&self) -> Status {
        self.status
    }
    pub fn turn(&self) -> Side {
        self.turn
    }
    pub fn winner(&self) -> Option<Side> {
        self.winner
    }
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
    /// Elapsed play time, frozen at the terminal transition.
    pub fn duration(&self) -> Duration {
        self.ended.unwrap_or_else(Instant::now) - self.started
    }

    /// Which side a display name occupies, if any.
    pub fn side_of(&self, name: &str) -> Option<Side> {
        if self.host.name == name {
            Some(Side::One)
        } else {
            self.guest.as_ref().filter(|p| p.name == name).map(|p| p.side)
        }
    }

    pub fn participant(&self, side: Side) -> Option<&Participant> {
        match side {
            Side::One => Some(&self.host),
            Side::Two => self.guest.as_ref(),
        }
    }

    fn participant_mut(&mut self, side: Side) -> Option<&mut Participant> {
        match side {
            Side::One => Some(&mut self.host),
            Side::Two => self.guest.as_mut(),
        }
    }

    pub fn name_of(&self, side: Side) -> &str {
        self.participant(side).map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Whether the given side faces an automated opponent.
    pub fn vs_bot(&self) -> bool {
        self.guest.as_ref().is_some_and(|p| p.is_bot)
    }

    /// True when the side holding the turn is the bot.
    pub fn bot_to_move(&self) -> bool {
        self.status == Status::Playing
            && self.participant(self.turn).is_some_and(|p| p.is_bot)
    }

    /// Immutable serializable view of the game, safe to take under the
    /// read lock while broadcasts and status checks run concurrently.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            id: self.id,
            player1: self.host.name.clone(),
            player2: self.guest.as_ref().map(|p| p.name.clone()),
            vs_bot: self.vs_bot(),
            board: self.board.to_rows(),
            current_turn: self.turn,
            status: self.status,
            winner: self.winner.map(|s| self.name_of(s).to_string()),
            result: self.outcome,
            last_move: self.moves.last().map(|m| LastMove {
                column: m.column,
                row: m.row,
            }),
            move_count: self.moves.len(),
            duration_ms: self.duration().as_millis() as u64,
        }
    }
}

impl Unique for Game {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Serializable game state sent inside `matched` and `state` messages.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: ID<Game>,
    pub player1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2: Option<String>,
    pub vs_bot: bool,
    pub board: Vec<Vec<u8>>,
    pub current_turn: Side,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMove>,
    pub move_count: usize,
    pub duration_ms: u64,
}

/// Column and landing row of the most recent move.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct LastMove {
    pub column: Column,
    pub row: Row,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> Game {
        let mut game = Game::new("alice");
        game.add_opponent("bob", false).unwrap();
        game
    }

    #[test]
    fn opens_waiting_with_host_to_move() {
        let game = Game::new("alice");
        assert_eq!(game.status(), Status::Waiting);
        assert_eq!(game.turn(), Side::One);
        assert_eq!(game.side_of("alice"), Some(Side::One));
        assert_eq!(game.side_of("bob"), None);
    }

    #[test]
    fn seating_second_player_starts_play() {
        let game = playing();
        assert_eq!(game.status(), Status::Playing);
        assert_eq!(game.side_of("bob"), Some(Side::Two));
        assert!(!game.vs_bot());
    }

    #[test]
    fn third_seat_rejected() {
        let mut game = playing();
        assert_eq!(game.add_opponent("carol", false), Err(GameError::GameFull));
    }

    #[test]
    fn moves_rejected_before_play_starts() {
        let mut game = Game::new("alice");
        assert_eq!(game.apply_move(Side::One, 0), Err(GameError::NotPlaying));
    }

    #[test]
    fn out_of_turn_move_leaves_state_unchanged() {
        let mut game = playing();
        assert_eq!(game.apply_move(Side::Two, 0), Err(GameError::NotYourTurn));
        assert_eq!(game.turn(), Side::One);
        assert_eq!(game.moves().len(), 0);
        assert_eq!(game.board(), &Board::default());
    }

    #[test]
    fn turn_alternates_after_each_move() {
        let mut game = playing();
        game.apply_move(Side::One, 0).unwrap();
        assert_eq!(game.turn(), Side::Two);
        game.apply_move(Side::Two, 1).unwrap();
        assert_eq!(game.turn(), Side::One);
    }

    #[test]
    fn bottom_row_connect4_finishes_the_game() {
        // P1 fills columns 0..4 along the bottom row while P2 answers
        // in column 6 each turn.
        let mut game = playing();
        for col in 0..4 {
            game.apply_move(Side::One, col).unwrap();
            if col < 3 {
                game.apply_move(Side::Two, 6).unwrap();
            }
        }
        assert_eq!(game.status(), Status::Finished);
        assert_eq!(game.winner(), Some(Side::One));
        assert_eq!(game.outcome(), Some(Outcome::Connect4));
        assert_eq!(game.snapshot().winner.as_deref(), Some("alice"));
    }

    #[test]
    fn no_further_moves_after_finish() {
        let mut game = playing();
        for col in 0..4 {
            game.apply_move(Side::One, col).unwrap();
            if col < 3 {
                game.apply_move(Side::Two, 6).unwrap();
            }
        }
        assert_eq!(game.apply_move(Side::Two, 6), Err(GameError::NotPlaying));
    }

    #[test]
    fn full_board_without_connect4_is_a_draw() {
        let mut game = playing();
        // Target position, rows listed bottom to top. Every column
        // alternates vertically; starts are staggered 1 1 2 2 1 1 2 so
        // no direction ever runs longer than two.
        let rows: [[u8; 7]; 6] = [
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
        ];
        // Fill move by move under real turn alternation: each turn,
        // play the first column whose next empty cell wants the
        // mover's color. Such a column always exists for this pattern.
        let mut heights = [0usize; 7];
        for _ in 0..42 {
            let side = game.turn();
            let col = (0..7)
                .find(|&c| heights[c] < 6 && rows[heights[c]][c] == side.index())
                .expect("a legal column exists for this pattern");
            heights[col] += 1;
            game.apply_move(side, col).unwrap();
        }
        assert_eq!(game.status(), Status::Finished);
        assert_eq!(game.outcome(), Some(Outcome::Draw));
        assert_eq!(game.winner(), None);
        assert_eq!(game.moves().len(), 42);
    }

    #[test]
    fn forfeit_awards_the_other_side() {
        let mut game = playing();
        game.forfeit(Side::Two);
        assert_eq!(game.status(), Status::Finished);
        assert_eq!(game.winner(), Some(Side::One));
        assert_eq!(game.outcome(), Some(Outcome::Forfeit));
    }

    #[test]
    fn double_forfeit_does_not_flip_the_winner() {
        let mut game = playing();
        game.forfeit(Side::Two);
        game.forfeit(Side::One);
        assert_eq!(game.winner(), Some(Side::One));
    }

    #[test]
    fn disconnect_only_registers_while_playing() {
        let mut game = Game::new("alice");
        game.mark_disconnected(Side::One);
        assert_eq!(game.status(), Status::Waiting);
        let mut game = playing();
        game.mark_disconnected(Side::Two);
        assert_eq!(game.status(), Status::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_inside_window_restores_play() {
        let mut game = playing();
        game.mark_disconnected(Side::One);
        tokio::time::advance(std::time::Duration::from_secs(29)).await;
        assert!(game.mark_reconnected(Side::One));
        assert_eq!(game.status(), Status::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_after_window_fails_and_state_holds() {
        let mut game = playing();
        game.mark_disconnected(Side::One);
        tokio::time::advance(std::time::Duration::from_secs(31)).await;
        assert!(!game.mark_reconnected(Side::One));
        assert_eq!(game.status(), Status::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_duration_freezes_at_finish() {
        let mut game = playing();
        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        game.forfeit(Side::Two);
        assert_eq!(game.snapshot().duration_ms, 3_000);
        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        assert_eq!(game.snapshot().duration_ms, 3_000);
    }

    #[test]
    fn wrong_side_cannot_claim_the_reconnect() {
        let mut game = playing();
        game.mark_disconnected(Side::One);
        assert!(!game.mark_reconnected(Side::Two));
        assert_eq!(game.status(), Status::Disconnected);
    }
}
