use crate::Column;
use crate::ID;
use crate::game::Game;
use crate::game::Outcome;
use crate::game::Side;
use crate::game::Snapshot;
use serde::Deserialize;
use serde::Serialize;

/// Messages sent from client to server over WebSocket.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Enter the matchmaking queue, or resume an existing game.
    Join,
    /// Drop a disc in the given column.
    Move { column: Column },
    /// Rebind to a live game within the reconnect window.
    #[serde(rename_all = "camelCase")]
    Reconnect {
        #[serde(default)]
        match_id: Option<String>,
    },
}

/// Messages sent from server to client over WebSocket.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Queued, no opponent yet.
    Waiting { message: String },
    /// Match found or resumed, with the joiner's seat assignment.
    #[serde(rename_all = "camelCase")]
    Matched {
        game_id: ID<Game>,
        opponent: String,
        your_turn: bool,
        player_num: Side,
        state: Snapshot,
    },
    /// Full state update after any move.
    State { state: Snapshot },
    /// Terminal: winner is absent on a draw.
    GameOver {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<String>,
        reason: Outcome,
    },
    /// Opponent lost its connection; deadline is an RFC 3339 timestamp.
    #[serde(rename_all = "camelCase")]
    OpponentDisconnected { reconnect_deadline: String },
    /// Opponent is back.
    OpponentReconnected,
    /// Malformed input or invalid action, sent to the offender only.
    Error { message: String },
}

impl ServerMessage {
    pub fn waiting(message: &str) -> Self {
        Self::Waiting {
            message: message.to_string(),
        }
    }
    pub fn matched(game_id: ID<Game>, opponent: &str, your_turn: bool, side: Side, state: Snapshot) -> Self {
        Self::Matched {
            game_id,
            opponent: opponent.to_string(),
            your_turn,
            player_num: side,
            state,
        }
    }
    pub fn state(state: Snapshot) -> Self {
        Self::State { state }
    }
    pub fn game_over(winner: Option<String>, reason: Outcome) -> Self {
        Self::GameOver { winner, reason }
    }
    pub fn opponent_disconnected(deadline: std::time::SystemTime) -> Self {
        let deadline = chrono::DateTime::<chrono::Utc>::from(deadline);
        Self::OpponentDisconnected {
            reconnect_deadline: deadline.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join));
    }

    #[test]
    fn decodes_move_with_column() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"move","column":3}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Move { column: 3 }));
    }

    #[test]
    fn decodes_reconnect_with_and_without_id() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"reconnect","matchId":"abc"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Reconnect { match_id: Some(_) }));
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"reconnect"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Reconnect { match_id: None }));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"quit"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn rejects_negative_column() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"move","column":-1}"#).is_err());
    }

    #[test]
    fn server_messages_use_wire_tags() {
        let json = ServerMessage::waiting("looking for opponent").to_json();
        assert!(json.contains(r#""type":"waiting""#));
        let json = ServerMessage::opponent_disconnected(
            std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1),
        )
        .to_json();
        assert!(json.contains(r#""type":"opponentDisconnected""#));
        assert!(json.contains(r#""reconnectDeadline":"1970-01-01T00:00:01Z""#));
        let json = ServerMessage::game_over(Some("alice".into()), Outcome::Forfeit).to_json();
        assert!(json.contains(r#""reason":"forfeit""#));
        assert!(json.contains(r#""winner":"alice""#));
        let json = ServerMessage::game_over(None, Outcome::Draw).to_json();
        assert!(!json.contains("winner"));
    }

    #[test]
    fn snapshot_serializes_board_and_turn() {
        let mut game = crate::game::Game::new("alice");
        game.add_opponent("bob", false).unwrap();
        game.apply_move(Side::One, 3).unwrap();
        let json = ServerMessage::state(game.snapshot()).to_json();
        assert!(json.contains(r#""currentTurn":2"#));
        assert!(json.contains(r#""lastMove":{"column":3,"row":5}"#));
        assert!(json.contains(r#""moveCount":1"#));
        assert!(json.contains(r#""status":"playing""#));
    }
}
