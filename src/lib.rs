//! Realtime Connect Four server.
//!
//! Two remote players (or one player and a minimax opponent) play a
//! turn-based grid game over a persistent WebSocket connection, with
//! matchmaking, mid-game disconnect tolerance, and an adversarial
//! search engine driving the automated side.
//!
//! - [`game`] — board, game state machine, and the minimax bot
//! - [`matchmaker`] — FIFO pairing queue with bot fallback
//! - [`hosting`] — HTTP/WebSocket server, session hub, dispatcher
//! - [`records`] — persistence and analytics seams

pub mod game;
pub mod hosting;
pub mod matchmaker;
pub mod records;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Board column index (0 = leftmost).
pub type Column = usize;
/// Board row index (0 = top, ROWS - 1 = bottom).
pub type Row = usize;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> std::str::FromStr for ID<T> {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(|inner| Self {
            inner,
            marker: PhantomData,
        })
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.inner)
    }
}

// ============================================================================
// BOARD GEOMETRY
// ============================================================================
/// Number of rows on the board.
pub const ROWS: usize = 6;
/// Number of columns on the board.
pub const COLS: usize = 7;
/// Discs in a row required to win.
pub const CONNECT: usize = 4;

// ============================================================================
// SEARCH PARAMETERS
// ============================================================================
/// Minimax lookahead in plies.
pub const SEARCH_DEPTH: u32 = 5;

// ============================================================================
// TIMING
// Timers re-validate their guarding condition under the game lock before
// acting; the condition may have resolved before they fire.
// ============================================================================
/// How long a lone player waits in the queue before a bot game is created.
pub const MATCHMAKING_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
/// Grace period for a disconnected player to reconnect before forfeiting.
pub const RECONNECT_WINDOW: std::time::Duration = std::time::Duration::from_secs(30);
/// Artificial thinking delay before the bot's move is applied.
pub const BOT_MOVE_DELAY: std::time::Duration = std::time::Duration::from_millis(500);
/// Delay between a game reaching a terminal state and registry eviction.
pub const CLEANUP_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

// ============================================================================
// BACKPRESSURE
// ============================================================================
/// Outbound message buffer per connection. Broadcasts to a full buffer
/// are dropped; the client catches up on the next state broadcast.
pub const OUTBOUND_BUFFER: usize = 64;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("violent interrupt received, exiting immediately");
        std::process::exit(0);
    });
}
