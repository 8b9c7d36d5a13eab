//! Shared fixtures: a scripted Lichess and a bridge wired to in-memory pipes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge::{Bridge, SessionCell, Timeouts};
use bridge_core::Settings;
use futures::stream::{self, StreamExt};
use lichess::{
    Account, ChallengeOutcome, ChallengeRequest, ClientError, Connector, EventStream, GameEvent,
    GameSnapshot, GameStatus, LichessApi, OngoingGame, Player,
};
use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const ACCOUNT_ID: &str = "lucas";
pub const USERNAME: &str = "Lucas";
pub const OPPONENT: &str = "maia1";
pub const TOKEN: &str = "lip_test";

/// How long a test waits for a line it expects.
const LINE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Scripted Lichess
// ---------------------------------------------------------------------------

/// In-memory Lichess. Every call is recorded as a short string such as
/// `"move:g1:e7e5"`.
pub struct FakeLichess {
    calls: Mutex<Vec<String>>,
    pub login_fails: Mutex<bool>,
    /// How long `account` takes to answer.
    pub login_delay: Mutex<Duration>,
    pub ongoing: Mutex<Vec<OngoingGame>>,
    pub games: Mutex<HashMap<String, GameSnapshot>>,
    /// Events a stream replays right after its `Full` snapshot.
    pub stream_tail: Mutex<HashMap<String, Vec<GameEvent>>>,
    /// Events pushed to the live stream after each accepted move, in order.
    pub after_move: Mutex<Vec<Vec<GameEvent>>>,
    pub challenge: Mutex<ChallengeOutcome>,
    /// When set, `make_move` is refused with this reason.
    pub reject_moves: Mutex<Option<String>>,
    pub known_users: Mutex<Vec<String>>,
    /// Games whose stream cannot be opened.
    pub broken_streams: Mutex<Vec<String>>,
    live: Mutex<HashMap<String, mpsc::UnboundedSender<GameEvent>>>,
}

impl Default for FakeLichess {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            login_fails: Mutex::new(false),
            login_delay: Mutex::new(Duration::ZERO),
            ongoing: Mutex::new(Vec::new()),
            games: Mutex::new(HashMap::new()),
            stream_tail: Mutex::new(HashMap::new()),
            after_move: Mutex::new(Vec::new()),
            challenge: Mutex::new(ChallengeOutcome::Pending {
                challenge_id: "ch1".to_string(),
            }),
            reject_moves: Mutex::new(None),
            known_users: Mutex::new(vec![OPPONENT.to_string()]),
            broken_streams: Mutex::new(Vec::new()),
            live: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeLichess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A started game between `OPPONENT` and our account, listed as ongoing.
    pub fn with_game(game_id: &str, we_play: Color, moves: &[&str]) -> Arc<Self> {
        let fake = Self::new();
        fake.add_game(game_id, we_play, moves);
        fake.ongoing.lock().unwrap().push(OngoingGame {
            game_id: game_id.to_string(),
            color: Some(we_play),
            opponent_id: Some(OPPONENT.to_string()),
            opponent_name: OPPONENT.to_string(),
        });
        fake
    }

    /// Register a game snapshot without listing it as ongoing.
    pub fn add_game(&self, game_id: &str, we_play: Color, moves: &[&str]) {
        self.games
            .lock()
            .unwrap()
            .insert(game_id.to_string(), snapshot(game_id, we_play, moves));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Push an event into the open stream of `game_id`.
    pub fn push_event(&self, game_id: &str, event: GameEvent) -> bool {
        self.live
            .lock()
            .unwrap()
            .get(game_id)
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LichessApi for FakeLichess {
    async fn account(&self) -> Result<Account, ClientError> {
        self.record("account".to_string());
        let delay = *self.login_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.login_fails.lock().unwrap() {
            return Err(ClientError::Unauthorized);
        }
        Ok(Account {
            id: ACCOUNT_ID.to_string(),
            username: USERNAME.to_string(),
        })
    }

    async fn ongoing_games(&self) -> Result<Vec<OngoingGame>, ClientError> {
        self.record("ongoing".to_string());
        Ok(self.ongoing.lock().unwrap().clone())
    }

    async fn user_exists(&self, name: &str) -> Result<bool, ClientError> {
        self.record(format!("user:{name}"));
        Ok(self
            .known_users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.eq_ignore_ascii_case(name)))
    }

    async fn create_challenge(
        &self,
        request: &ChallengeRequest,
    ) -> Result<ChallengeOutcome, ClientError> {
        self.record(format!("challenge:{}", request.opponent));
        Ok(self.challenge.lock().unwrap().clone())
    }

    async fn cancel_challenge(&self, challenge_id: &str) -> Result<(), ClientError> {
        self.record(format!("cancel:{challenge_id}"));
        Ok(())
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> Result<(), ClientError> {
        self.record(format!("move:{game_id}:{uci}"));
        if let Some(reason) = self.reject_moves.lock().unwrap().clone() {
            return Err(ClientError::Rejected(reason));
        }
        if let Some(game) = self.games.lock().unwrap().get_mut(game_id) {
            game.moves.push(uci.to_string());
        }

        let events = {
            let mut scripted = self.after_move.lock().unwrap();
            if scripted.is_empty() {
                Vec::new()
            } else {
                scripted.remove(0)
            }
        };
        for event in events {
            self.push_event(game_id, event);
        }
        Ok(())
    }

    async fn stream_game(&self, game_id: &str) -> Result<EventStream, ClientError> {
        self.record(format!("stream:{game_id}"));
        if self.broken_streams.lock().unwrap().iter().any(|g| g == game_id) {
            return Err(ClientError::Stream("connection reset".to_string()));
        }
        let snapshot = self
            .games
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("game {game_id}")))?;
        let tail = self
            .stream_tail
            .lock()
            .unwrap()
            .remove(game_id)
            .unwrap_or_default();

        let (tx, rx) = mpsc::unbounded_channel();
        self.live.lock().unwrap().insert(game_id.to_string(), tx);

        let replay = std::iter::once(GameEvent::Full(snapshot)).chain(tail);
        let live = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (Ok(event), rx))
        });
        Ok(stream::iter(replay.map(Ok)).chain(live).boxed())
    }

    async fn resign(&self, game_id: &str) -> Result<(), ClientError> {
        self.record(format!("resign:{game_id}"));
        Ok(())
    }

    async fn abort(&self, game_id: &str) -> Result<(), ClientError> {
        self.record(format!("abort:{game_id}"));
        Ok(())
    }

    // answered from the snapshot so a lookup never replaces a live stream
    async fn game(&self, game_id: &str) -> Result<GameSnapshot, ClientError> {
        self.record(format!("game:{game_id}"));
        self.games
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("game {game_id}")))
    }
}

pub struct FakeConnector {
    api: Arc<FakeLichess>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(api: Arc<FakeLichess>) -> Self {
        Self {
            api,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn connect(&self, _token: &str) -> Result<Arc<dyn LichessApi>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let api: Arc<dyn LichessApi> = self.api.clone();
        Ok(api)
    }
}

// ---------------------------------------------------------------------------
// Game fixtures
// ---------------------------------------------------------------------------

fn account_player() -> Player {
    Player {
        id: Some(ACCOUNT_ID.to_string()),
        name: Some(USERNAME.to_string()),
        ai_level: None,
    }
}

fn opponent_player() -> Player {
    Player {
        id: Some(OPPONENT.to_string()),
        name: Some(OPPONENT.to_string()),
        ai_level: None,
    }
}

pub fn uci_moves(moves: &[&str]) -> Vec<String> {
    moves.iter().map(|m| m.to_string()).collect()
}

pub fn snapshot(game_id: &str, we_play: Color, moves: &[&str]) -> GameSnapshot {
    let (white, black) = match we_play {
        Color::White => (account_player(), opponent_player()),
        Color::Black => (opponent_player(), account_player()),
    };
    GameSnapshot {
        id: game_id.to_string(),
        white,
        black,
        initial_fen: None,
        moves: uci_moves(moves),
        status: GameStatus::started(),
    }
}

pub fn update(moves: &[&str]) -> GameEvent {
    GameEvent::Update {
        moves: uci_moves(moves),
        status: GameStatus::started(),
    }
}

pub fn ended(status: &str, winner: Option<Color>, moves: &[&str]) -> GameEvent {
    GameEvent::Ended {
        status: GameStatus(status.to_string()),
        winner,
        moves: uci_moves(moves),
    }
}

// ---------------------------------------------------------------------------
// Bridge harness
// ---------------------------------------------------------------------------

/// Short waits so failure paths finish quickly.
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        connect: Duration::from_secs(2),
        challenge: Duration::from_millis(400),
        challenge_poll: Duration::from_millis(50),
        sync: Duration::from_secs(2),
        move_wait: Duration::from_secs(3),
        grace: Duration::from_millis(500),
    }
}

pub fn settings_with_token() -> Settings {
    Settings {
        token: TOKEN.to_string(),
        ..Settings::default()
    }
}

/// A running bridge seen from the GUI side.
pub struct Gui {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    pub session: SessionCell,
    pub connector: Arc<FakeConnector>,
    pub task: JoinHandle<()>,
}

pub fn start(api: Arc<FakeLichess>, settings: Settings) -> Gui {
    start_with(api, settings, fast_timeouts())
}

pub fn start_with(api: Arc<FakeLichess>, settings: Settings, timeouts: Timeouts) -> Gui {
    let (gui_in, bridge_in) = tokio::io::duplex(64 * 1024);
    let (bridge_out, gui_out) = tokio::io::duplex(64 * 1024);
    let connector = Arc::new(FakeConnector::new(api));

    let bridge = Bridge::new(settings, timeouts, connector.clone());
    let session = bridge.session();
    let task = tokio::spawn(bridge.run(BufReader::new(bridge_in), bridge_out));

    Gui {
        input: gui_in,
        output: BufReader::new(gui_out).lines(),
        session,
        connector,
        task,
    }
}

impl Gui {
    pub async fn send(&mut self, line: &str) {
        self.input
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("bridge input closed");
    }

    /// Next output line; panics when none arrives in time.
    pub async fn line(&mut self) -> String {
        tokio::time::timeout(LINE_TIMEOUT, self.output.next_line())
            .await
            .expect("timed out waiting for output")
            .expect("read failed")
            .expect("bridge output closed")
    }

    /// Read lines up to and including the first that starts with `prefix`.
    pub async fn until(&mut self, prefix: &str) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.line().await;
            let done = line.starts_with(prefix);
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    /// The next `bestmove` line, plus the `info string` lines before it.
    pub async fn bestmove(&mut self) -> (String, Vec<String>) {
        let mut lines = self.until("bestmove").await;
        let best = lines.pop().unwrap_or_default();
        (best, lines)
    }

    /// True when nothing is written for `wait`.
    pub async fn silent_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.output.next_line()).await.is_err()
    }

    /// Send `quit` and wait for the bridge to finish.
    pub async fn quit(mut self) {
        self.send("quit").await;
        tokio::time::timeout(LINE_TIMEOUT, &mut self.task)
            .await
            .expect("bridge did not stop")
            .expect("bridge task panicked");
    }

    /// Close the GUI side of the input pipe.
    pub async fn close_input(&mut self) {
        self.input.shutdown().await.expect("shutdown failed");
    }
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
