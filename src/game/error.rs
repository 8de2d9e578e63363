/// Rule violations and lookup failures surfaced to the offending
/// connection. None of these mutate game state or terminate play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameError {
    InvalidColumn,
    ColumnFull,
    NotYourTurn,
    NotPlaying,
    GameFull,
    GameNotFound,
    NotAParticipant,
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColumn => write!(f, "invalid column"),
            Self::ColumnFull => write!(f, "column is full"),
            Self::NotYourTurn => write!(f, "not your turn"),
            Self::NotPlaying => write!(f, "game is not in progress"),
            Self::GameFull => write!(f, "game already has two players"),
            Self::GameNotFound => write!(f, "game not found"),
            Self::NotAParticipant => write!(f, "player not found"),
        }
    }
}

impl std::error::Error for GameError {}
