//! reqwest implementation of [`LichessApi`] against lichess.org.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;
use crate::model::{Account, ChallengeOutcome, ChallengeRequest, OngoingGame};
use crate::ndjson::{decode_events, EventStream};
use crate::wire::{AccountJson, ChallengeJson, PlayingJson};
use crate::{Connector, LichessApi};

pub const DEFAULT_BASE_URL: &str = "https://lichess.org";

/// Connection settings shared by every client a connector creates.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to plain requests, not to the long-lived game stream.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

pub struct LichessClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
}

impl LichessClient {
    pub fn new(token: &str, settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| ClientError::Unauthorized)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .user_agent(concat!("lichess-bridge/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            request_timeout: settings.request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let text = check(resp).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post(&self, path: &str) -> Result<Response, ClientError> {
        debug!(path, "POST");
        let resp = self
            .http
            .post(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await?;
        check(resp).await
    }
}

/// Pass successful responses through, classify the rest.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::from_status(status, &body))
}

#[async_trait]
impl LichessApi for LichessClient {
    async fn account(&self) -> Result<Account, ClientError> {
        let account: AccountJson = self.get_json("/api/account").await?;
        Ok(account.into())
    }

    async fn ongoing_games(&self) -> Result<Vec<OngoingGame>, ClientError> {
        let playing: PlayingJson = self.get_json("/api/account/playing?nb=50").await?;
        Ok(playing.into_games())
    }

    async fn user_exists(&self, name: &str) -> Result<bool, ClientError> {
        match self
            .get_json::<serde_json::Value>(&format!("/api/user/{name}"))
            .await
        {
            Ok(_) => Ok(true),
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_challenge(
        &self,
        request: &ChallengeRequest,
    ) -> Result<ChallengeOutcome, ClientError> {
        let path = format!("/api/challenge/{}", request.opponent);
        debug!(path, form = ?request.form(), "POST");
        let resp = self
            .http
            .post(self.url(&path))
            .form(&request.form())
            .timeout(self.request_timeout)
            .send()
            .await?;
        let text = check(resp).await?.text().await?;
        let challenge: ChallengeJson = serde_json::from_str(&text)?;
        challenge.into_outcome()
    }

    async fn cancel_challenge(&self, challenge_id: &str) -> Result<(), ClientError> {
        self.post(&format!("/api/challenge/{challenge_id}/cancel"))
            .await
            .map(drop)
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> Result<(), ClientError> {
        self.post(&format!("/api/board/game/{game_id}/move/{uci}"))
            .await
            .map(drop)
    }

    async fn stream_game(&self, game_id: &str) -> Result<EventStream, ClientError> {
        let path = format!("/api/board/game/stream/{game_id}");
        debug!(path, "GET (stream)");
        let resp = self.http.get(self.url(&path)).send().await?;
        let resp = check(resp).await?;
        Ok(decode_events(resp.bytes_stream()))
    }

    async fn resign(&self, game_id: &str) -> Result<(), ClientError> {
        self.post(&format!("/api/board/game/{game_id}/resign"))
            .await
            .map(drop)
    }

    async fn abort(&self, game_id: &str) -> Result<(), ClientError> {
        self.post(&format!("/api/board/game/{game_id}/abort"))
            .await
            .map(drop)
    }
}

/// Creates [`LichessClient`]s.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    settings: ClientSettings,
}

impl HttpConnector {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn LichessApi>, ClientError> {
        Ok(Arc::new(LichessClient::new(token, &self.settings)?))
    }
}
