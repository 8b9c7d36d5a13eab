//! Background consumer of one game's event stream.

use std::sync::Arc;

use futures::StreamExt;
use lichess::{GameEvent, LichessApi};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Game(GameEvent),
    /// The stream failed or closed before the game ended.
    Disconnected(String),
}

/// Drops updates that carry no new move.
///
/// `Full` always passes and re-bases the count. `Update` passes only when
/// it has more moves than anything seen so far. `Ended` always passes.
#[derive(Debug, Default)]
pub struct MoveCounter {
    seen: usize,
}

impl MoveCounter {
    pub fn admit(&mut self, event: &GameEvent) -> bool {
        match event {
            GameEvent::Full(snapshot) => {
                self.seen = snapshot.moves.len();
                true
            }
            GameEvent::Update { moves, .. } => {
                if moves.len() > self.seen {
                    self.seen = moves.len();
                    true
                } else {
                    false
                }
            }
            GameEvent::Ended { .. } => true,
        }
    }
}

/// Owns the stream task of the bound game. Dropping it stops the task.
pub struct GameListener {
    game_id: String,
    events: mpsc::UnboundedReceiver<ListenerEvent>,
    task: JoinHandle<()>,
}

impl GameListener {
    pub fn spawn(api: Arc<dyn LichessApi>, game_id: String) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let id = game_id.clone();

        let task = tokio::spawn(async move {
            let mut stream = match api.stream_game(&id).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(game_id = %id, error = %e, "Failed to open game stream");
                    let _ = tx.send(ListenerEvent::Disconnected(e.to_string()));
                    return;
                }
            };
            info!(game_id = %id, "Game stream opened");

            let mut counter = MoveCounter::default();
            while let Some(item) = stream.next().await {
                let event = match item {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(game_id = %id, error = %e, "Game stream failed");
                        let _ = tx.send(ListenerEvent::Disconnected(e.to_string()));
                        return;
                    }
                };
                if !counter.admit(&event) {
                    debug!(game_id = %id, moves = event.move_count(), "Dropping stale update");
                    continue;
                }
                let ended = matches!(event, GameEvent::Ended { .. });
                if tx.send(ListenerEvent::Game(event)).is_err() || ended {
                    return;
                }
            }

            info!(game_id = %id, "Game stream closed");
            let _ = tx.send(ListenerEvent::Disconnected("stream closed".to_string()));
        });

        Self {
            game_id,
            events,
            task,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Next event. `None` once the task is gone and the channel drained.
    pub async fn recv(&mut self) -> Option<ListenerEvent> {
        self.events.recv().await
    }

    /// An already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ListenerEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for GameListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use lichess::{GameSnapshot, GameStatus, Player};

    use super::*;

    fn moves(n: usize) -> Vec<String> {
        ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"][..n]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn update(n: usize) -> GameEvent {
        GameEvent::Update {
            moves: moves(n),
            status: GameStatus::started(),
        }
    }

    fn full(n: usize) -> GameEvent {
        GameEvent::Full(GameSnapshot {
            id: "g1".into(),
            white: Player::default(),
            black: Player::default(),
            initial_fen: None,
            moves: moves(n),
            status: GameStatus::started(),
        })
    }

    #[test]
    fn test_duplicates_and_regressions_are_dropped() {
        let mut counter = MoveCounter::default();
        assert!(counter.admit(&full(2)));
        assert!(!counter.admit(&update(2)));
        assert!(!counter.admit(&update(1)));
        assert!(counter.admit(&update(3)));
        assert!(!counter.admit(&update(3)));
    }

    #[test]
    fn test_full_rebases_count() {
        let mut counter = MoveCounter::default();
        assert!(counter.admit(&update(4)));
        assert!(counter.admit(&full(2)));
        assert!(counter.admit(&update(3)));
    }

    #[test]
    fn test_ended_always_passes() {
        let mut counter = MoveCounter::default();
        assert!(counter.admit(&update(3)));
        assert!(counter.admit(&GameEvent::Ended {
            status: GameStatus("resign".into()),
            winner: None,
            moves: moves(3),
        }));
    }
}
