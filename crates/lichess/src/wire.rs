//! JSON shapes as Lichess sends them, and their conversion into model types.

use serde::Deserialize;

use crate::error::ClientError;
use crate::model::{
    parse_color, Account, ChallengeOutcome, GameEvent, GameSnapshot, GameStatus, OngoingGame,
    Player,
};

#[derive(Debug, Deserialize)]
pub(crate) struct AccountJson {
    id: String,
    username: String,
}

impl From<AccountJson> for Account {
    fn from(json: AccountJson) -> Self {
        Account {
            id: json.id,
            username: json.username,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayingJson {
    #[serde(rename = "nowPlaying", default)]
    now_playing: Vec<OngoingJson>,
}

#[derive(Debug, Deserialize)]
struct OngoingJson {
    #[serde(rename = "gameId")]
    game_id: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    opponent: OpponentJson,
}

#[derive(Debug, Default, Deserialize)]
struct OpponentJson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl PlayingJson {
    pub(crate) fn into_games(self) -> Vec<OngoingGame> {
        self.now_playing
            .into_iter()
            .map(|g| OngoingGame {
                game_id: g.game_id,
                color: g.color.as_deref().and_then(parse_color),
                opponent_name: g
                    .opponent
                    .username
                    .clone()
                    .or_else(|| g.opponent.id.clone())
                    .unwrap_or_default(),
                opponent_id: g.opponent.id,
            })
            .collect()
    }
}

/// Response of `POST /api/challenge/{username}`.
///
/// Lichess has answered with the challenge at the top level, wrapped in
/// `challenge`, or (for instant games) with a `game` object.
#[derive(Debug, Deserialize)]
pub(crate) struct ChallengeJson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "declineReason", default)]
    decline_reason: Option<String>,
    #[serde(default)]
    done: Option<String>,
    #[serde(default)]
    challenge: Option<Box<ChallengeJson>>,
    #[serde(default)]
    game: Option<StartedGameJson>,
}

#[derive(Debug, Deserialize)]
struct StartedGameJson {
    id: String,
    #[serde(default)]
    color: Option<String>,
}

impl ChallengeJson {
    pub(crate) fn into_outcome(self) -> Result<ChallengeOutcome, ClientError> {
        if let Some(game) = self.game {
            return Ok(ChallengeOutcome::Started {
                game_id: game.id,
                color: game.color.as_deref().and_then(parse_color),
            });
        }

        let declined = self.status.as_deref() == Some("declined")
            || self.done.as_deref() == Some("declined");
        if declined {
            let reason = self
                .decline_reason
                .unwrap_or_else(|| "declined".to_string());
            return Ok(ChallengeOutcome::Declined { reason });
        }

        match (self.id, self.challenge) {
            (Some(id), _) => Ok(ChallengeOutcome::Pending { challenge_id: id }),
            (None, Some(inner)) => inner.into_outcome(),
            (None, None) => Err(ClientError::Stream(
                "challenge response without id".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum EventJson {
    GameFull(GameFullJson),
    GameState(GameStateJson),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct GameFullJson {
    id: String,
    #[serde(default)]
    white: PlayerJson,
    #[serde(default)]
    black: PlayerJson,
    #[serde(rename = "initialFen", default)]
    initial_fen: Option<String>,
    state: GameStateJson,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerJson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "aiLevel", default)]
    ai_level: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct GameStateJson {
    #[serde(default)]
    moves: String,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    winner: Option<String>,
}

fn default_status() -> String {
    "started".to_string()
}

impl From<PlayerJson> for Player {
    fn from(json: PlayerJson) -> Self {
        Player {
            id: json.id,
            name: json.name,
            ai_level: json.ai_level,
        }
    }
}

fn split_moves(moves: &str) -> Vec<String> {
    moves.split_whitespace().map(String::from).collect()
}

/// Decode one NDJSON line of the board game stream.
///
/// Returns `Ok(None)` for event types the bridge does not care about
/// (`chatLine`, `opponentGone`, ...).
pub fn parse_event(line: &str) -> Result<Option<GameEvent>, ClientError> {
    let event = match serde_json::from_str::<EventJson>(line)? {
        EventJson::GameFull(full) => GameEvent::Full(GameSnapshot {
            id: full.id,
            white: full.white.into(),
            black: full.black.into(),
            initial_fen: full.initial_fen,
            moves: split_moves(&full.state.moves),
            status: GameStatus(full.state.status),
        }),
        EventJson::GameState(state) => {
            let status = GameStatus(state.status);
            let moves = split_moves(&state.moves);
            if status.is_terminal() {
                GameEvent::Ended {
                    status,
                    winner: state.winner.as_deref().and_then(parse_color),
                    moves,
                }
            } else {
                GameEvent::Update { moves, status }
            }
        }
        EventJson::Other => return Ok(None),
    };
    Ok(Some(event))
}
