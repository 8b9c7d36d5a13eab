//! Bridge configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use bridge_core::Settings;
use lichess::{ClientSettings, DEFAULT_BASE_URL};

/// How long each kind of wait may take.
#[derive(Clone, Debug)]
pub struct Timeouts {
    /// Login / account check, and the `isready` budget
    pub connect: Duration,

    /// Waiting for a challenge to be accepted
    pub challenge: Duration,

    /// Interval between discovery polls while a challenge is pending
    pub challenge_poll: Duration,

    /// Waiting for the first `gameFull` event of a stream
    pub sync: Duration,

    /// Waiting for the opponent's move
    pub move_wait: Duration,

    /// Time background tasks get after the router stops
    pub grace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            challenge: Duration::from_secs(30),
            challenge_poll: Duration::from_secs(1),
            sync: Duration::from_secs(15),
            move_wait: Duration::from_secs(180),
            grace: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Pre-seeds the LichessToken option
    pub token: Option<String>,

    /// Pre-seeds the Opponent option
    pub opponent: Option<String>,

    /// Lichess server, without trailing slash
    pub base_url: String,

    /// Log file; logs go to stderr when unset
    pub log_file: Option<PathBuf>,

    /// tracing filter directive used when Debug is off
    pub log_filter: String,

    pub timeouts: Timeouts,
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    /// Missing or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            connect: secs_var("BRIDGE_CONNECT_TIMEOUT_SECS", defaults.connect),
            challenge: secs_var("BRIDGE_CHALLENGE_TIMEOUT_SECS", defaults.challenge),
            challenge_poll: defaults.challenge_poll,
            sync: secs_var("BRIDGE_SYNC_TIMEOUT_SECS", defaults.sync),
            move_wait: secs_var("BRIDGE_MOVE_TIMEOUT_SECS", defaults.move_wait),
            grace: secs_var("BRIDGE_SHUTDOWN_GRACE_SECS", defaults.grace),
        };

        Self {
            token: non_empty_var("LICHESS_TOKEN"),
            opponent: non_empty_var("LICHESS_OPPONENT"),
            base_url: env::var("LICHESS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            log_file: non_empty_var("BRIDGE_LOG_FILE").map(PathBuf::from),
            log_filter: env::var("BRIDGE_LOG").unwrap_or_else(|_| "info".to_string()),
            timeouts,
        }
    }

    /// Option values before the GUI sends any `setoption`.
    pub fn initial_settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(token) = &self.token {
            settings.token = token.clone();
        }
        if let Some(opponent) = &self.opponent {
            settings.opponent = opponent.clone();
        }
        settings
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: self.timeouts.connect,
            request_timeout: self.timeouts.sync,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn secs_var(name: &str, default: Duration) -> Duration {
    parse_secs(env::var(name).ok().as_deref()).unwrap_or(default)
}

fn parse_secs(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs(Some("30")), Some(Duration::from_secs(30)));
        assert_eq!(parse_secs(Some(" 7 ")), Some(Duration::from_secs(7)));
        assert_eq!(parse_secs(Some("soon")), None);
        assert_eq!(parse_secs(Some("-1")), None);
        assert_eq!(parse_secs(None), None);
    }

    #[test]
    fn test_initial_settings_are_seeded() {
        let config = BridgeConfig {
            token: Some("lip_abc".to_string()),
            opponent: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            log_file: None,
            log_filter: "info".to_string(),
            timeouts: Timeouts::default(),
        };
        let settings = config.initial_settings();
        assert_eq!(settings.token, "lip_abc");
        assert_eq!(settings.opponent, "maia1");
        assert_eq!(config.client_settings().connect_timeout, Duration::from_secs(5));
    }
}
