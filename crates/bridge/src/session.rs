//! The session aggregate: settings, connection, board mirror and game binding.

use std::sync::{Arc, Mutex, PoisonError};

use bridge_core::{BoardMirror, Settings};
use lichess::{Account, Connector, LichessApi};
use shakmaty::Color;
use tracing::info;

use crate::coordinator::Responder;
use crate::error::BridgeError;

/// Lifecycle of the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    Challenging,
    WaitingRemote,
    MoveReady,
    /// The game finished. Cleared by `ucinewgame`.
    Ended,
}

/// An authenticated client and the account it logged in as.
#[derive(Clone)]
pub struct Connection {
    pub api: Arc<dyn LichessApi>,
    pub account: Account,
}

/// How a remote game finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub status: String,
    pub winner: Option<Color>,
}

/// The remote game this session plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameBinding {
    pub id: String,
    /// Confirmed by `gameFull`. `None` until then.
    pub color: Option<Color>,
    /// What discovery or the challenge said. Logged, never trusted.
    pub advisory_color: Option<Color>,
    /// Starting FEN from `gameFull`. `None` or `"startpos"` is the standard start.
    pub initial_fen: Option<String>,
    pub remote_moves: Vec<String>,
    /// A `gameFull` has been seen.
    pub synced: bool,
    /// Set once the stream reports a terminal status.
    pub result: Option<GameResult>,
}

impl GameBinding {
    pub fn new(id: String, advisory_color: Option<Color>) -> Self {
        Self {
            id,
            color: None,
            advisory_color,
            initial_fen: None,
            remote_moves: Vec::new(),
            synced: false,
            result: None,
        }
    }
}

pub struct SessionState {
    pub settings: Settings,
    pub connection: Option<Connection>,
    /// Bumped whenever the credential changes.
    pub credential_generation: u64,
    pub board: BoardMirror,
    pub game: Option<GameBinding>,
    pub phase: Phase,
}

impl SessionState {
    pub fn new(settings: Settings) -> Self {
        let board = BoardMirror::new(settings.variant.castling_mode());
        Self {
            settings,
            connection: None,
            credential_generation: 0,
            board,
            game: None,
            phase: Phase::Idle,
        }
    }

    /// Forget the connection; the next remote call logs in again.
    pub fn invalidate_connection(&mut self) {
        self.credential_generation += 1;
        self.connection = None;
    }
}

/// Shared handle to the session. The lock is never held across an `.await`.
#[derive(Clone)]
pub struct SessionCell {
    state: Arc<Mutex<SessionState>>,
    connecting: Arc<tokio::sync::Mutex<()>>,
}

impl SessionCell {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new(settings))),
            connecting: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn phase(&self) -> Phase {
        self.with(|s| s.phase)
    }

    pub fn set_phase(&self, phase: Phase) {
        self.with(|s| s.phase = phase);
    }

    pub fn game(&self) -> Option<GameBinding> {
        self.with(|s| s.game.clone())
    }

    pub fn connection(&self) -> Option<Connection> {
        self.with(|s| s.connection.clone())
    }
}

/// Return the current connection, logging in first if there is none.
///
/// Attempts are serialized, so concurrent callers share one login. A result
/// for a credential that changed meanwhile is not stored.
pub async fn connect(
    cell: &SessionCell,
    connector: &dyn Connector,
    responder: &Responder,
) -> Result<Connection, BridgeError> {
    let _gate = cell.connecting.lock().await;

    let (token, generation, existing) = cell.with(|s| {
        (
            s.settings.token.clone(),
            s.credential_generation,
            s.connection.clone(),
        )
    });
    if let Some(connection) = existing {
        return Ok(connection);
    }
    if token.is_empty() {
        return Err(BridgeError::Config(
            "No Lichess token set (setoption name LichessToken value <token>)".to_string(),
        ));
    }

    let api = connector.connect(&token)?;
    let account = api.account().await?;
    info!(username = %account.username, "Logged in");
    responder.info(format_args!("Logged in as {}", account.username));

    let connection = Connection { api, account };
    cell.with(|s| {
        if s.credential_generation == generation {
            s.connection = Some(connection.clone());
        }
    });
    Ok(connection)
}
