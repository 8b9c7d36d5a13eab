//! Local mirror of the board the GUI is showing.
//!
//! The mirror is fed only by `position` commands and by remote moves that
//! have been confirmed by the game stream. It never talks to the network.

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("malformed move '{0}'")]
    MalformedMove(String),

    #[error("illegal move '{uci}' in {fen}")]
    IllegalMove { uci: String, fen: String },
}

/// Where a `position` command starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

/// Board replica: start position, applied moves and the resulting position.
#[derive(Debug, Clone)]
pub struct BoardMirror {
    mode: CastlingMode,
    initial: Chess,
    position: Chess,
    moves: Vec<String>,
}

impl Default for BoardMirror {
    fn default() -> Self {
        Self::new(CastlingMode::Standard)
    }
}

impl BoardMirror {
    pub fn new(mode: CastlingMode) -> Self {
        Self {
            mode,
            initial: Chess::default(),
            position: Chess::default(),
            moves: Vec::new(),
        }
    }

    /// Switch castling notation (standard vs. Chess960). Resets the board.
    pub fn set_castling_mode(&mut self, mode: CastlingMode) {
        self.mode = mode;
        self.reset();
    }

    /// Back to the standard starting position with no moves.
    pub fn reset(&mut self) {
        self.initial = Chess::default();
        self.position = Chess::default();
        self.moves.clear();
    }

    /// Replace the start position. Clears the move list.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), BoardError> {
        let invalid = |reason: String| BoardError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let pos: Chess = parsed
            .into_position(self.mode)
            .map_err(|e| invalid(format!("{e}")))?;

        self.initial = pos.clone();
        self.position = pos;
        self.moves.clear();
        Ok(())
    }

    /// Apply one move in UCI notation. Returns the move as stored
    /// (normalized to this board's castling notation).
    pub fn push_uci(&mut self, uci: &str) -> Result<&str, BoardError> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| BoardError::MalformedMove(uci.to_string()))?;
        let mv = parsed
            .to_move(&self.position)
            .map_err(|_| BoardError::IllegalMove {
                uci: uci.to_string(),
                fen: self.fen(),
            })?;

        self.moves.push(mv.to_uci(self.mode).to_string());
        self.position.play_unchecked(mv);
        Ok(self.moves.last().map(String::as_str).unwrap_or_default())
    }

    /// Reset to `start` and replay `moves`.
    ///
    /// On failure the board keeps every move applied before the failing
    /// one, and the error is returned for logging.
    pub fn replay(&mut self, start: &StartPosition, moves: &[String]) -> Result<(), BoardError> {
        self.reset();
        if let StartPosition::Fen(fen) = start {
            self.set_fen(fen)?;
        }
        for uci in moves {
            self.push_uci(uci)?;
        }
        Ok(())
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Color of the side that played the last move, if any move was played.
    pub fn last_mover(&self) -> Option<Color> {
        if self.moves.is_empty() {
            None
        } else {
            Some(!self.turn())
        }
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// FEN of the start position the moves were applied to.
    pub fn initial_fen(&self) -> String {
        Fen::from_position(&self.initial, EnPassantMode::Legal).to_string()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }
}
