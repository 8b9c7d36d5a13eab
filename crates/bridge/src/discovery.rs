//! Finding the remote game to bind: ongoing games first, then a challenge.

use bridge_core::{Settings, TimeControl};
use lichess::{ChallengeClock, ChallengeRequest, ClientError, LichessApi};
use shakmaty::Color;
use tracing::{debug, info};

/// A game discovery decided to bind. The color is advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundGame {
    pub game_id: String,
    pub color: Option<Color>,
}

/// Look for a live game against `opponent`.
///
/// With a challenge id the game is first checked directly, because the
/// ongoing list is capped and lags behind; a challenge that was accepted
/// keeps its id as game id. Then the list is scanned by id and finally by
/// opponent name.
pub async fn find_game(
    api: &dyn LichessApi,
    opponent: &str,
    challenge_id: Option<&str>,
) -> Result<Option<FoundGame>, ClientError> {
    if let Some(id) = challenge_id {
        match api.game(id).await {
            Ok(snapshot) if !snapshot.status.is_terminal() => {
                info!(game_id = %snapshot.id, "Challenge accepted (direct check)");
                return Ok(Some(FoundGame {
                    game_id: snapshot.id,
                    color: None,
                }));
            }
            Ok(snapshot) => debug!(
                game_id = %snapshot.id,
                status = %snapshot.status,
                "Challenged game already over"
            ),
            Err(e) => debug!(challenge_id = id, error = %e, "Challenge not started yet"),
        }
    }

    let games = api.ongoing_games().await?;
    debug!(count = games.len(), "Ongoing games");

    if let Some(id) = challenge_id {
        if let Some(game) = games.iter().find(|g| g.game_id == id) {
            return Ok(Some(FoundGame {
                game_id: game.game_id.clone(),
                color: game.color,
            }));
        }
    }

    Ok(games
        .into_iter()
        .find(|g| g.is_against(opponent))
        .map(|g| FoundGame {
            game_id: g.game_id,
            color: g.color,
        }))
}

/// Challenge parameters from the current settings. `side_to_move` is the
/// side to move on the GUI board, used by `PlayAs = auto`.
pub fn challenge_request(settings: &Settings, side_to_move: Color) -> ChallengeRequest {
    let clock = match settings.time_control() {
        TimeControl::Clock {
            limit_secs,
            increment_secs,
        } => ChallengeClock::Realtime {
            limit_secs,
            increment_secs,
        },
        TimeControl::Days(days) => ChallengeClock::Correspondence { days },
        TimeControl::Unlimited => ChallengeClock::Unlimited,
    };

    ChallengeRequest {
        opponent: settings.opponent.clone(),
        rated: settings.rated,
        color: settings.play_as.challenge_color(side_to_move).to_string(),
        clock,
        variant: settings.variant.key().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use bridge_core::{PlayAs, TimeMode, Variant};

    use super::*;

    #[test]
    fn test_challenge_request_from_settings() {
        let mut settings = Settings::default();
        let request = challenge_request(&settings, Color::White);
        assert_eq!(request.opponent, "maia1");
        assert_eq!(request.color, "random");
        assert_eq!(
            request.clock,
            ChallengeClock::Realtime {
                limit_secs: 300,
                increment_secs: 3
            }
        );
        assert_eq!(request.variant, "standard");

        settings.play_as = PlayAs::Auto;
        settings.time_mode = TimeMode::Unlimited;
        settings.variant = Variant::ThreeCheck;
        settings.rated = true;
        let request = challenge_request(&settings, Color::White);
        assert_eq!(request.color, "black");
        assert_eq!(request.clock, ChallengeClock::Unlimited);
        assert_eq!(request.variant, "threeCheck");
        assert!(request.rated);
    }
}
