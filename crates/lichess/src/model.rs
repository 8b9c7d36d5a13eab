//! Domain types returned by the Lichess API.

use std::fmt;

use shakmaty::Color;

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub username: String,
}

/// An entry of the account's "now playing" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OngoingGame {
    pub game_id: String,
    /// Our color as reported by the listing. Advisory.
    pub color: Option<Color>,
    pub opponent_id: Option<String>,
    pub opponent_name: String,
}

impl OngoingGame {
    /// Whether the opponent is `name`, by id or display name, ignoring case.
    pub fn is_against(&self, name: &str) -> bool {
        self.opponent_name.eq_ignore_ascii_case(name)
            || self
                .opponent_id
                .as_deref()
                .is_some_and(|id| id.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Player {
    pub id: Option<String>,
    pub name: Option<String>,
    pub ai_level: Option<u8>,
}

impl Player {
    pub fn is(&self, account_id: &str) -> bool {
        self.id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(account_id))
    }
}

/// Lichess game status (`created`, `started`, `mate`, `resign`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStatus(pub String);

impl GameStatus {
    pub fn started() -> Self {
        GameStatus("started".to_string())
    }

    /// Anything other than `created`/`started` means the game is over.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.0.as_str(), "created" | "started")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete game state, as carried by `gameFull`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub id: String,
    pub white: Player,
    pub black: Player,
    /// `startpos` or a FEN.
    pub initial_fen: Option<String>,
    pub moves: Vec<String>,
    pub status: GameStatus,
}

impl GameSnapshot {
    /// Which side `account_id` plays, if it plays at all.
    pub fn color_of(&self, account_id: &str) -> Option<Color> {
        if self.white.is(account_id) {
            Some(Color::White)
        } else if self.black.is(account_id) {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// One event of the board game stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Players, initial moves and status. Always first; may repeat after reconnects.
    Full(GameSnapshot),
    Update {
        moves: Vec<String>,
        status: GameStatus,
    },
    Ended {
        status: GameStatus,
        winner: Option<Color>,
        moves: Vec<String>,
    },
}

impl GameEvent {
    pub fn moves(&self) -> &[String] {
        match self {
            GameEvent::Full(snapshot) => &snapshot.moves,
            GameEvent::Update { moves, .. } | GameEvent::Ended { moves, .. } => moves,
        }
    }

    pub fn move_count(&self) -> usize {
        self.moves().len()
    }
}

/// Clock settings of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeClock {
    Realtime { limit_secs: u32, increment_secs: u32 },
    Correspondence { days: u32 },
    Unlimited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub opponent: String,
    pub rated: bool,
    /// `white`, `black` or `random`.
    pub color: String,
    pub clock: ChallengeClock,
    /// Lichess variant key.
    pub variant: String,
}

impl ChallengeRequest {
    /// Form fields for `POST /api/challenge/{username}`.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("rated", self.rated.to_string()),
            ("color", self.color.clone()),
        ];
        if self.variant != "standard" {
            form.push(("variant", self.variant.clone()));
        }
        match self.clock {
            ChallengeClock::Realtime {
                limit_secs,
                increment_secs,
            } => {
                form.push(("clock.limit", limit_secs.to_string()));
                form.push(("clock.increment", increment_secs.to_string()));
            }
            ChallengeClock::Correspondence { days } => form.push(("days", days.to_string())),
            ChallengeClock::Unlimited => {}
        }
        form
    }
}

/// What happened to a challenge right after it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// The game exists already. Color is advisory.
    Started {
        game_id: String,
        color: Option<Color>,
    },
    /// Waiting for the opponent to accept.
    Pending { challenge_id: String },
    Declined { reason: String },
}

pub(crate) fn parse_color(name: &str) -> Option<Color> {
    match name {
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status() {
        assert!(!GameStatus::started().is_terminal());
        assert!(!GameStatus("created".into()).is_terminal());
        for status in ["mate", "resign", "outoftime", "draw", "aborted", "stalemate"] {
            assert!(GameStatus(status.into()).is_terminal(), "{status}");
        }
    }

    #[test]
    fn test_color_of() {
        let snapshot = GameSnapshot {
            id: "abcd1234".into(),
            white: Player {
                id: Some("maia1".into()),
                ..Player::default()
            },
            black: Player {
                id: Some("lucas".into()),
                name: Some("Lucas".into()),
                ai_level: None,
            },
            initial_fen: None,
            moves: vec![],
            status: GameStatus::started(),
        };
        assert_eq!(snapshot.color_of("LUCAS"), Some(Color::Black));
        assert_eq!(snapshot.color_of("maia1"), Some(Color::White));
        assert_eq!(snapshot.color_of("someone"), None);
    }

    #[test]
    fn test_ongoing_match_by_id_or_name() {
        let game = OngoingGame {
            game_id: "g1".into(),
            color: Some(Color::White),
            opponent_id: Some("maia1".into()),
            opponent_name: "Maia1".into(),
        };
        assert!(game.is_against("MAIA1"));
        assert!(!game.is_against("maia5"));
    }

    #[test]
    fn test_challenge_form() {
        let request = ChallengeRequest {
            opponent: "maia1".into(),
            rated: false,
            color: "random".into(),
            clock: ChallengeClock::Realtime {
                limit_secs: 300,
                increment_secs: 3,
            },
            variant: "standard".into(),
        };
        assert_eq!(
            request.form(),
            vec![
                ("rated", "false".to_string()),
                ("color", "random".to_string()),
                ("clock.limit", "300".to_string()),
                ("clock.increment", "3".to_string()),
            ]
        );

        let correspondence = ChallengeRequest {
            clock: ChallengeClock::Correspondence { days: 3 },
            variant: "chess960".into(),
            ..request
        };
        let form = correspondence.form();
        assert!(form.contains(&("days", "3".to_string())));
        assert!(form.contains(&("variant", "chess960".to_string())));
        assert!(!form.iter().any(|(k, _)| k.starts_with("clock")));
    }
}
