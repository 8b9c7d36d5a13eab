//! Engine options advertised on `uci` and the settings they control.

use std::fmt;

use shakmaty::{CastlingMode, Color};
use thiserror::Error;

pub const DEFAULT_OPPONENT: &str = "maia1";

pub const MINUTES_RANGE: (u32, u32) = (1, 180);
pub const INCREMENT_RANGE: (u32, u32) = (0, 180);
pub const DAYS_RANGE: (u32, u32) = (1, 14);

/// How UCI GUIs spell an empty string option value.
const EMPTY: &str = "<empty>";

/// Correspondence day counts the Lichess challenge API accepts.
const ALLOWED_DAYS: [u32; 7] = [1, 2, 3, 5, 7, 10, 14];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("{option}: '{value}' is not a number")]
    NotANumber { option: &'static str, value: String },

    #[error("{option}: '{value}' is not one of {allowed}")]
    NotAllowed {
        option: &'static str,
        value: String,
        allowed: &'static str,
    },
}

/// Which color to request when challenging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayAs {
    White,
    Black,
    Random,
    /// Pick the color that lets the opponent play the side to move.
    Auto,
}

impl PlayAs {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayAs::White => "white",
            PlayAs::Black => "black",
            PlayAs::Random => "random",
            PlayAs::Auto => "auto",
        }
    }

    /// Color parameter for the challenge request, given who is to move on
    /// the GUI board.
    pub fn challenge_color(self, side_to_move: Color) -> &'static str {
        match self {
            PlayAs::Auto => match side_to_move {
                // the opponent answers for the side to move, so we take the other one
                Color::White => "black",
                Color::Black => "white",
            },
            other => other.as_str(),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "white" => Some(PlayAs::White),
            "black" => Some(PlayAs::Black),
            "random" => Some(PlayAs::Random),
            "auto" => Some(PlayAs::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Standard,
    Chess960,
    Crazyhouse,
    Antichess,
    Atomic,
    Horde,
    KingOfTheHill,
    RacingKings,
    ThreeCheck,
}

impl Variant {
    pub const ALL: [Variant; 9] = [
        Variant::Standard,
        Variant::Chess960,
        Variant::Crazyhouse,
        Variant::Antichess,
        Variant::Atomic,
        Variant::Horde,
        Variant::KingOfTheHill,
        Variant::RacingKings,
        Variant::ThreeCheck,
    ];

    /// Lichess variant key.
    pub fn key(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Chess960 => "chess960",
            Variant::Crazyhouse => "crazyhouse",
            Variant::Antichess => "antichess",
            Variant::Atomic => "atomic",
            Variant::Horde => "horde",
            Variant::KingOfTheHill => "kingOfTheHill",
            Variant::RacingKings => "racingKings",
            Variant::ThreeCheck => "threeCheck",
        }
    }

    pub fn castling_mode(self) -> CastlingMode {
        match self {
            Variant::Chess960 => CastlingMode::Chess960,
            _ => CastlingMode::Standard,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.key().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    Realtime,
    Correspondence,
    Unlimited,
}

impl TimeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeMode::Realtime => "realtime",
            TimeMode::Correspondence => "correspondence",
            TimeMode::Unlimited => "unlimited",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "realtime" => Some(TimeMode::Realtime),
            "correspondence" => Some(TimeMode::Correspondence),
            "unlimited" => Some(TimeMode::Unlimited),
            _ => None,
        }
    }
}

/// Clock parameters for a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControl {
    Clock { limit_secs: u32, increment_secs: u32 },
    Days(u32),
    Unlimited,
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeControl::Clock {
                limit_secs,
                increment_secs,
            } => write!(f, "{}+{}", limit_secs / 60, increment_secs),
            TimeControl::Days(1) => write!(f, "1 day"),
            TimeControl::Days(days) => write!(f, "{days} days"),
            TimeControl::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Button options: no value, they trigger an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    VerifyConnection,
    Resign,
}

/// What a `setoption` did, so the caller can react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChange {
    /// A plain setting changed; nothing else to do.
    Updated,
    /// The credential changed; any existing connection is stale.
    Credential,
    /// The variant changed; the board's castling notation may differ.
    Variant(Variant),
    Debug(bool),
    Pressed(Button),
    /// Not an option we know. Ignored.
    Unknown(String),
}

/// Session configuration driven by `setoption`.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub token: String,
    pub opponent: String,
    pub play_as: PlayAs,
    pub variant: Variant,
    pub time_mode: TimeMode,
    pub minutes: u32,
    pub increment: u32,
    pub days: u32,
    pub rated: bool,
    pub debug: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("token", &if self.token.is_empty() { "<unset>" } else { "<set>" })
            .field("opponent", &self.opponent)
            .field("play_as", &self.play_as)
            .field("variant", &self.variant)
            .field("time_mode", &self.time_mode)
            .field("minutes", &self.minutes)
            .field("increment", &self.increment)
            .field("days", &self.days)
            .field("rated", &self.rated)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            opponent: DEFAULT_OPPONENT.to_string(),
            play_as: PlayAs::Random,
            variant: Variant::Standard,
            time_mode: TimeMode::Realtime,
            minutes: 5,
            increment: 3,
            days: 1,
            rated: false,
            debug: false,
        }
    }
}

impl Settings {
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn time_control(&self) -> TimeControl {
        match self.time_mode {
            TimeMode::Realtime => TimeControl::Clock {
                limit_secs: self.minutes * 60,
                increment_secs: self.increment,
            },
            TimeMode::Correspondence => TimeControl::Days(self.days),
            TimeMode::Unlimited => TimeControl::Unlimited,
        }
    }

    /// Apply `setoption name <name> value <value>`.
    ///
    /// Option names are matched case-insensitively. Numbers are clamped to
    /// the advertised range. On error the setting is left unchanged.
    pub fn apply(&mut self, name: &str, value: &str) -> Result<OptionChange, OptionError> {
        let value = match value.trim() {
            EMPTY => "",
            value => value,
        };
        let change = match name.trim().to_ascii_lowercase().as_str() {
            "lichesstoken" => {
                self.token = value.to_string();
                OptionChange::Credential
            }
            "opponent" => {
                self.opponent = value.to_string();
                OptionChange::Updated
            }
            "playas" | "challengecolor" => {
                self.play_as = PlayAs::parse(value).ok_or_else(|| OptionError::NotAllowed {
                    option: "PlayAs",
                    value: value.to_string(),
                    allowed: "white, black, random, auto",
                })?;
                OptionChange::Updated
            }
            "variant" => {
                self.variant = Variant::parse(value).ok_or_else(|| OptionError::NotAllowed {
                    option: "Variant",
                    value: value.to_string(),
                    allowed: "the advertised variants",
                })?;
                OptionChange::Variant(self.variant)
            }
            "timemode" => {
                self.time_mode = TimeMode::parse(value).ok_or_else(|| OptionError::NotAllowed {
                    option: "TimeMode",
                    value: value.to_string(),
                    allowed: "realtime, correspondence, unlimited",
                })?;
                OptionChange::Updated
            }
            "minutes" => {
                self.minutes = parse_clamped("Minutes", value, MINUTES_RANGE)?;
                OptionChange::Updated
            }
            "increment" => {
                self.increment = parse_clamped("Increment", value, INCREMENT_RANGE)?;
                OptionChange::Updated
            }
            "days" => {
                let days = parse_clamped("Days", value, DAYS_RANGE)?;
                self.days = snap_days(days);
                OptionChange::Updated
            }
            "rated" => {
                self.rated = parse_check(value);
                OptionChange::Updated
            }
            "debug" => {
                self.debug = parse_check(value);
                OptionChange::Debug(self.debug)
            }
            "verifyconnection" => OptionChange::Pressed(Button::VerifyConnection),
            "resign" => OptionChange::Pressed(Button::Resign),
            _ => OptionChange::Unknown(name.to_string()),
        };
        Ok(change)
    }

    /// `option ...` lines for the `uci` reply, using current values as defaults.
    pub fn option_lines(&self) -> Vec<String> {
        let variants: String = Variant::ALL
            .iter()
            .map(|v| format!(" var {}", v.key()))
            .collect();
        let play_as = match self.play_as {
            PlayAs::Auto => PlayAs::Random,
            other => other,
        };

        vec![
            format!("option name LichessToken type string default {EMPTY}"),
            format!(
                "option name Opponent type string default {}",
                if self.opponent.is_empty() { EMPTY } else { &self.opponent }
            ),
            format!(
                "option name PlayAs type combo default {} var white var black var random",
                play_as.as_str()
            ),
            format!(
                "option name Variant type combo default {}{variants}",
                self.variant.key()
            ),
            format!(
                "option name TimeMode type combo default {} \
                 var realtime var correspondence var unlimited",
                self.time_mode.as_str()
            ),
            format!(
                "option name Minutes type spin default {} min {} max {}",
                self.minutes, MINUTES_RANGE.0, MINUTES_RANGE.1
            ),
            format!(
                "option name Increment type spin default {} min {} max {}",
                self.increment, INCREMENT_RANGE.0, INCREMENT_RANGE.1
            ),
            format!(
                "option name Days type spin default {} min {} max {}",
                self.days, DAYS_RANGE.0, DAYS_RANGE.1
            ),
            format!("option name Rated type check default {}", self.rated),
            format!("option name Debug type check default {}", self.debug),
            "option name VerifyConnection type button".to_string(),
            "option name Resign type button".to_string(),
        ]
    }
}

/// Parse an integer and clamp it to `min..=max`. Integers too large for
/// `i64` saturate instead of failing.
fn parse_clamped(
    option: &'static str,
    value: &str,
    (min, max): (u32, u32),
) -> Result<u32, OptionError> {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OptionError::NotANumber {
            option,
            value: value.to_string(),
        });
    }
    let parsed = match value.parse::<i64>() {
        Ok(n) => n,
        Err(_) if value.starts_with('-') => i64::MIN,
        Err(_) => i64::MAX,
    };
    Ok(parsed.clamp(i64::from(min), i64::from(max)) as u32)
}

fn parse_check(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

/// Largest allowed day count not above `days`.
fn snap_days(days: u32) -> u32 {
    ALLOWED_DAYS
        .iter()
        .copied()
        .filter(|&d| d <= days)
        .max()
        .unwrap_or(ALLOWED_DAYS[0])
}
