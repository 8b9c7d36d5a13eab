//! Lichess Board API client.
//!
//! The bridge talks to Lichess only through [`LichessApi`], so tests can swap
//! in a scripted implementation. [`LichessClient`] is the HTTP one.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

pub mod client;
pub mod error;
pub mod model;
pub mod ndjson;
mod wire;

pub use client::{ClientSettings, HttpConnector, LichessClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use model::{
    Account, ChallengeClock, ChallengeOutcome, ChallengeRequest, GameEvent, GameSnapshot,
    GameStatus, OngoingGame, Player,
};
pub use ndjson::{decode_events, EventStream};
pub use wire::parse_event;

/// Remote operations the bridge needs.
#[async_trait]
pub trait LichessApi: Send + Sync {
    /// The account the token belongs to.
    async fn account(&self) -> Result<Account, ClientError>;

    async fn ongoing_games(&self) -> Result<Vec<OngoingGame>, ClientError>;

    async fn user_exists(&self, name: &str) -> Result<bool, ClientError>;

    async fn create_challenge(
        &self,
        request: &ChallengeRequest,
    ) -> Result<ChallengeOutcome, ClientError>;

    async fn cancel_challenge(&self, challenge_id: &str) -> Result<(), ClientError>;

    async fn make_move(&self, game_id: &str, uci: &str) -> Result<(), ClientError>;

    /// Open the board game stream. The first event is a `Full` snapshot.
    async fn stream_game(&self, game_id: &str) -> Result<EventStream, ClientError>;

    async fn resign(&self, game_id: &str) -> Result<(), ClientError>;

    async fn abort(&self, game_id: &str) -> Result<(), ClientError>;

    /// Current state of one game, read from the first event of its stream.
    async fn game(&self, game_id: &str) -> Result<GameSnapshot, ClientError> {
        let mut events = self.stream_game(game_id).await?;
        match events.next().await {
            Some(Ok(GameEvent::Full(snapshot))) => Ok(snapshot),
            Some(Ok(_)) => Err(ClientError::Stream(format!(
                "game {game_id}: stream did not start with gameFull"
            ))),
            Some(Err(e)) => Err(e),
            None => Err(ClientError::Stream(format!(
                "game {game_id}: stream closed before gameFull"
            ))),
        }
    }
}

/// Turns an API token into a client.
pub trait Connector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn LichessApi>, ClientError>;
}
