//! UCI command parsing.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::board::StartPosition;

static SETOPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^setoption\s+name\s+(.+?)(?:\s+value(?:\s+(.*))?)?$").expect("valid regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("malformed setoption: {0}")]
    SetOption(String),

    #[error("malformed position: {0}")]
    Position(String),
}

/// One command from the GUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci`
    Handshake,
    /// `setoption name <name> [value <value>]`
    SetOption { name: String, value: String },
    /// `isready`
    Ready,
    /// `ucinewgame`
    NewGame,
    /// `position (startpos | fen <fen>) [moves ...]`
    Position { start: StartPosition, moves: Vec<String> },
    /// `go [...]`; only pondering is distinguished.
    Go { ponder: bool },
    Stop,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse one input line. Unrecognized commands become `Unknown`.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();

        let command = match keyword.as_str() {
            "uci" => Command::Handshake,
            "isready" => Command::Ready,
            "ucinewgame" => Command::NewGame,
            "stop" => Command::Stop,
            "quit" => Command::Quit,
            "go" => Command::Go {
                ponder: tokens.any(|t| t.eq_ignore_ascii_case("ponder")),
            },
            "setoption" => parse_setoption(line)?,
            "position" => parse_position(line, tokens.collect())?,
            _ => Command::Unknown(line.to_string()),
        };
        Ok(command)
    }

    /// Commands the dispatcher answers itself instead of queueing.
    pub fn is_fast_path(&self) -> bool {
        matches!(self, Command::Handshake | Command::Ready)
    }
}

fn parse_setoption(line: &str) -> Result<Command, ParseError> {
    let caps = SETOPTION_RE
        .captures(line)
        .ok_or_else(|| ParseError::SetOption(line.to_string()))?;

    let name = caps[1].trim().to_string();
    let value = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Ok(Command::SetOption { name, value })
}

fn parse_position(line: &str, tokens: Vec<&str>) -> Result<Command, ParseError> {
    let moves_at = tokens.iter().position(|t| t.eq_ignore_ascii_case("moves"));
    let (setup, moves) = match moves_at {
        Some(i) => (&tokens[..i], &tokens[i + 1..]),
        None => (&tokens[..], &[][..]),
    };

    let start = match setup {
        [kind] if kind.eq_ignore_ascii_case("startpos") => StartPosition::Standard,
        [kind, fen @ ..] if kind.eq_ignore_ascii_case("fen") && !fen.is_empty() => {
            StartPosition::Fen(fen.join(" "))
        }
        _ => return Err(ParseError::Position(line.to_string())),
    };

    Ok(Command::Position {
        start,
        moves: moves.iter().map(|m| m.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setoption(name: &str, value: &str) -> Command {
        Command::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("uci"), Ok(Command::Handshake));
        assert_eq!(Command::parse("  ISREADY \n"), Ok(Command::Ready));
        assert_eq!(Command::parse("ucinewgame"), Ok(Command::NewGame));
        assert_eq!(Command::parse("Stop"), Ok(Command::Stop));
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
        assert_eq!(Command::parse(""), Err(ParseError::Empty));
    }

    #[test]
    fn test_go() {
        assert_eq!(Command::parse("go"), Ok(Command::Go { ponder: false }));
        assert_eq!(
            Command::parse("go wtime 300000 btime 300000 winc 3000 binc 3000"),
            Ok(Command::Go { ponder: false })
        );
        assert_eq!(
            Command::parse("go ponder wtime 1000"),
            Ok(Command::Go { ponder: true })
        );
    }

    #[test]
    fn test_setoption_value_keeps_spaces() {
        assert_eq!(
            Command::parse("setoption name Opponent value Some Bot Name"),
            Ok(setoption("Opponent", "Some Bot Name"))
        );
        assert_eq!(
            Command::parse("setoption name LichessToken value abc123"),
            Ok(setoption("LichessToken", "abc123"))
        );
    }

    #[test]
    fn test_setoption_without_value() {
        assert_eq!(
            Command::parse("setoption name VerifyConnection"),
            Ok(setoption("VerifyConnection", ""))
        );
        assert_eq!(
            Command::parse("setoption name LichessToken value"),
            Ok(setoption("LichessToken", ""))
        );
        assert_eq!(
            Command::parse("SETOPTION NAME Clear Hash"),
            Ok(setoption("Clear Hash", ""))
        );
    }

    #[test]
    fn test_setoption_malformed() {
        assert!(matches!(
            Command::parse("setoption Minutes 5"),
            Err(ParseError::SetOption(_))
        ));
    }

    #[test]
    fn test_position() {
        assert_eq!(
            Command::parse("position startpos"),
            Ok(Command::Position {
                start: StartPosition::Standard,
                moves: vec![],
            })
        );
        assert_eq!(
            Command::parse("position startpos moves e2e4 e7e5"),
            Ok(Command::Position {
                start: StartPosition::Standard,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            })
        );
        assert_eq!(
            Command::parse("position fen 8/8/8/8/8/8/4k3/4K3 w - - 0 1 moves e1d1"),
            Ok(Command::Position {
                start: StartPosition::Fen("8/8/8/8/8/8/4k3/4K3 w - - 0 1".to_string()),
                moves: vec!["e1d1".to_string()],
            })
        );
    }

    #[test]
    fn test_position_malformed() {
        assert!(matches!(
            Command::parse("position moves e2e4"),
            Err(ParseError::Position(_))
        ));
        assert!(matches!(
            Command::parse("position fen"),
            Err(ParseError::Position(_))
        ));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            Command::parse("ponderhit"),
            Ok(Command::Unknown("ponderhit".to_string()))
        );
        assert!(!Command::Unknown(String::new()).is_fast_path());
        assert!(Command::Ready.is_fast_path());
    }
}
