//! The session state machine. Handles queued commands one at a time.

use std::sync::Arc;

use bridge_core::{Button, Command, OptionChange, StartPosition};
use lichess::{ChallengeOutcome, ClientError, Connector, GameEvent, LichessApi};
use shakmaty::Color;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Timeouts;
use crate::coordinator::{Envelope, Responder, StopWatch};
use crate::discovery::{self, FoundGame};
use crate::error::BridgeError;
use crate::listener::{GameListener, ListenerEvent};
use crate::logging::DebugToggle;
use crate::session::{self, Connection, GameBinding, GameResult, Phase, SessionCell};

/// How a `go` ends when it does not end with a move.
enum GoEnd {
    /// Answer with the null move.
    Null,
    /// Answer nothing (rejected submission).
    Silent,
}

enum Wake {
    Event(Option<ListenerEvent>),
    Deadline,
    Stopped,
}

pub struct SessionMachine {
    cell: SessionCell,
    connector: Arc<dyn Connector>,
    responder: Responder,
    stop: StopWatch,
    commands: mpsc::UnboundedReceiver<Envelope>,
    applied: watch::Sender<u64>,
    timeouts: Timeouts,
    debug_toggle: Option<DebugToggle>,
    listener: Option<GameListener>,
    ponder_pending: bool,
}

impl SessionMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cell: SessionCell,
        connector: Arc<dyn Connector>,
        responder: Responder,
        stop: StopWatch,
        commands: mpsc::UnboundedReceiver<Envelope>,
        applied: watch::Sender<u64>,
        timeouts: Timeouts,
        debug_toggle: Option<DebugToggle>,
    ) -> Self {
        Self {
            cell,
            connector,
            responder,
            stop,
            commands,
            applied,
            timeouts,
            debug_toggle,
            listener: None,
            ponder_pending: false,
        }
    }

    pub async fn run(mut self) {
        info!("Session machine started");
        while let Some(envelope) = self.commands.recv().await {
            let seq = envelope.seq;
            let quit = matches!(envelope.command, Command::Quit);
            self.handle(envelope).await;
            self.applied.send_replace(seq);
            if quit {
                return;
            }
        }
        // every producer is gone without a quit
        self.quit().await;
    }

    async fn handle(&mut self, envelope: Envelope) {
        debug!(seq = envelope.seq, command = ?envelope.command, "Handling command");
        match envelope.command {
            Command::SetOption { name, value } => self.set_option(&name, &value).await,
            Command::NewGame => self.new_game().await,
            Command::Position { start, moves } => self.position(&start, &moves),
            Command::Go { ponder: true } => {
                debug!("Ignoring go ponder until stop");
                self.ponder_pending = true;
            }
            Command::Go { ponder: false } => {
                self.ponder_pending = false;
                self.go(envelope.stop_epoch).await;
            }
            Command::Stop => {
                if self.ponder_pending {
                    self.ponder_pending = false;
                    self.responder.bestmove(None);
                } else {
                    debug!("Stop with no search running");
                }
            }
            Command::Quit => self.quit().await,
            Command::Handshake | Command::Ready => {}
            Command::Unknown(text) => debug!(text = %text, "Unknown command"),
        }
    }

    async fn set_option(&mut self, name: &str, value: &str) {
        let applied = self.cell.with(|s| {
            let change = s.settings.apply(name, value)?;
            match &change {
                OptionChange::Credential => {
                    // a game bound under the old account is not ours to play
                    s.invalidate_connection();
                    s.game = None;
                    s.phase = Phase::Idle;
                }
                OptionChange::Variant(variant) => {
                    s.board.set_castling_mode(variant.castling_mode());
                }
                _ => {}
            }
            Ok::<_, bridge_core::OptionError>(change)
        });

        let change = match applied {
            Ok(change) => change,
            Err(e) => {
                warn!(option = name, value, error = %e, "Invalid option value");
                self.responder.info(BridgeError::from(e));
                return;
            }
        };

        match change {
            OptionChange::Updated | OptionChange::Variant(_) => {
                info!(option = name, value, "Option set");
            }
            OptionChange::Credential => {
                // never log the token itself
                info!("Lichess token updated");
                self.drop_listener();
            }
            OptionChange::Debug(on) => {
                if let Some(toggle) = &self.debug_toggle {
                    toggle(on);
                }
            }
            OptionChange::Pressed(Button::VerifyConnection) => self.verify_connection().await,
            OptionChange::Pressed(Button::Resign) => self.resign_button().await,
            OptionChange::Unknown(name) => debug!(option = %name, "Ignoring unknown option"),
        }
    }

    async fn verify_connection(&mut self) {
        let connection = match self.connection().await {
            Ok(connection) => connection,
            Err(e) => {
                self.responder.info(format_args!("[ERROR] {e}"));
                return;
            }
        };

        let opponent = self.cell.with(|s| s.settings.opponent.clone());
        self.responder.info(format_args!(
            "[SUCCESS] Connected as {}",
            connection.account.username
        ));
        match connection.api.user_exists(&opponent).await {
            Ok(true) => self
                .responder
                .info(format_args!("[SUCCESS] Opponent {opponent} found")),
            Ok(false) => self
                .responder
                .info(format_args!("[WARNING] Opponent {opponent} does not exist")),
            Err(e) => self
                .responder
                .info(format_args!("[ERROR] Could not look up {opponent}: {e}")),
        }
    }

    async fn resign_button(&mut self) {
        if self.cell.game().is_none() {
            self.responder.info("No active game to resign");
            return;
        }
        self.leave_game().await;
        self.cell.set_phase(Phase::Ended);
        self.responder.info("Game resigned");
    }

    async fn new_game(&mut self) {
        self.leave_game().await;
        self.ponder_pending = false;
        self.cell.with(|s| {
            s.board.reset();
            s.phase = Phase::Idle;
        });
        info!("New game");
    }

    fn position(&mut self, start: &StartPosition, moves: &[String]) {
        let result = self.cell.with(|s| s.board.replay(start, moves));
        match result {
            Ok(()) => debug!(moves = moves.len(), "Position set"),
            Err(e) => {
                let applied = self.cell.with(|s| s.board.len());
                warn!(error = %e, applied, "Position replay stopped early");
            }
        }
    }

    async fn quit(&mut self) {
        info!("Quit");
        self.leave_game().await;
        self.responder.shutdown();
    }

    /// Stop listening and give the bound game up: abort while fewer than two
    /// moves were played, resign otherwise. A binding that never saw a
    /// `gameFull` is looked up first. Failures are only logged.
    async fn leave_game(&mut self) {
        self.drop_listener();
        let Some(game) = self.cell.with(|s| s.game.take()) else {
            return;
        };
        if game.result.is_some() {
            return;
        }
        let Some(connection) = self.cell.connection() else {
            debug!(game_id = %game.id, "No connection, leaving game as is");
            return;
        };

        let played = if game.synced {
            game.remote_moves.len()
        } else {
            match connection.api.game(&game.id).await {
                Ok(snapshot) if snapshot.status.is_terminal() => {
                    debug!(game_id = %game.id, status = %snapshot.status, "Game already over");
                    return;
                }
                Ok(snapshot) => snapshot.moves.len().max(game.remote_moves.len()),
                Err(e) => {
                    // resigning also ends a game that could still be aborted
                    warn!(game_id = %game.id, error = %e, "Game lookup failed before leaving");
                    usize::MAX
                }
            }
        };

        let result = if played < 2 {
            info!(game_id = %game.id, "Aborting game");
            connection.api.abort(&game.id).await
        } else {
            info!(game_id = %game.id, "Resigning game");
            connection.api.resign(&game.id).await
        };
        if let Err(e) = result {
            warn!(game_id = %game.id, error = %e, "Failed to leave game");
        }
    }

    fn drop_listener(&mut self) {
        if let Some(listener) = self.listener.take() {
            debug!(game_id = listener.game_id(), "Closing game stream");
        }
    }

    async fn connection(&self) -> Result<Connection, BridgeError> {
        session::connect(&self.cell, self.connector.as_ref(), &self.responder).await
    }

    async fn go(&mut self, epoch: u64) {
        match self.search(epoch).await {
            Ok(mv) => self.responder.bestmove(Some(&mv)),
            Err(GoEnd::Null) => self.responder.bestmove(None),
            Err(GoEnd::Silent) => {}
        }
    }

    /// Report `e` and end the search with the null move.
    fn fail(&self, e: BridgeError) -> GoEnd {
        match &e {
            BridgeError::Inconsistency(_) => error!(error = %e, "Cannot reconcile board"),
            _ => warn!(error = %e, "Search failed"),
        }
        self.responder.info(&e);
        GoEnd::Null
    }

    /// The whole `go`: connect, bind, sync, submit, wait.
    async fn search(&mut self, epoch: u64) -> Result<String, GoEnd> {
        if self.stop.is_raised_since(epoch) {
            debug!("Stopped before the search began");
            return Err(GoEnd::Null);
        }
        if !self.cell.with(|s| s.settings.has_token()) {
            let e = BridgeError::Config("No Lichess token set".to_string());
            return Err(self.fail(e));
        }
        if self.cell.phase() == Phase::Ended {
            self.responder.info("Game is over, send ucinewgame to start another");
            return Err(GoEnd::Null);
        }

        let connection = match self.connection().await {
            Ok(connection) => connection,
            Err(e) => return Err(self.fail(e)),
        };

        if self.cell.game().is_none() {
            match self.bind_game(connection.api.as_ref(), epoch).await {
                Ok(Some(found)) => {
                    info!(game_id = %found.game_id, advisory_color = ?found.color, "Game bound");
                    self.cell
                        .with(|s| s.game = Some(GameBinding::new(found.game_id, found.color)));
                }
                Ok(None) => return Err(GoEnd::Null),
                Err(e) => {
                    self.cell.set_phase(Phase::Idle);
                    return Err(self.fail(e));
                }
            }
        }

        self.ensure_listener(&connection);
        self.drain_events(&connection);
        if !self.synced() && !self.game_over() {
            self.await_sync(&connection, epoch).await?;
        }
        if let Some(outcome) = self.finish_ended_game() {
            return outcome;
        }

        let color = self.reconcile()?;
        self.submit_pending(&connection, color).await?;
        self.cell.set_phase(Phase::WaitingRemote);
        self.await_remote_move(&connection, epoch).await
    }

    /// Find an ongoing game, or challenge the opponent and poll until the
    /// challenge is accepted. `None` when stopped or timed out.
    async fn bind_game(
        &mut self,
        api: &dyn LichessApi,
        epoch: u64,
    ) -> Result<Option<FoundGame>, BridgeError> {
        self.cell.set_phase(Phase::Searching);
        let (opponent, request, time_control) = self.cell.with(|s| {
            (
                s.settings.opponent.clone(),
                discovery::challenge_request(&s.settings, s.board.turn()),
                s.settings.time_control(),
            )
        });

        info!(opponent = %opponent, "Looking for an ongoing game");
        if let Some(found) = discovery::find_game(api, &opponent, None).await? {
            self.responder.info(format_args!("Resuming game vs {opponent}"));
            return Ok(Some(found));
        }

        self.cell.set_phase(Phase::Challenging);
        info!(
            opponent = %opponent,
            time = %time_control,
            variant = %request.variant,
            rated = request.rated,
            color = %request.color,
            "Creating challenge"
        );
        self.responder.info(format_args!("Challenging {opponent} ({time_control})..."));

        let challenge_id = match api.create_challenge(&request).await? {
            ChallengeOutcome::Started { game_id, color } => {
                self.responder.info("Game started!");
                return Ok(Some(FoundGame { game_id, color }));
            }
            ChallengeOutcome::Declined { reason } => {
                return Err(BridgeError::Rejected(format!(
                    "Challenge declined by {opponent}: {reason}"
                )));
            }
            ChallengeOutcome::Pending { challenge_id } => challenge_id,
        };

        info!(challenge_id = %challenge_id, "Challenge created, waiting for acceptance");
        self.responder.info("Waiting for opponent to accept...");

        let deadline = Instant::now() + self.timeouts.challenge;
        let mut polls = 0u32;
        loop {
            polls += 1;
            match discovery::find_game(api, &opponent, Some(&challenge_id)).await {
                Ok(Some(found)) => {
                    if let Some(color) = found.color {
                        self.responder.info(format_args!("Playing as {}", color_name(color)));
                    }
                    return Ok(Some(found));
                }
                Ok(None) => debug!(polls, "Challenge not accepted yet"),
                Err(e) => warn!(polls, error = %e, "Discovery poll failed"),
            }

            if Instant::now() >= deadline {
                warn!(polls, "Challenge timed out");
                cancel_challenge(api, &challenge_id).await;
                self.cell.set_phase(Phase::Idle);
                self.responder.info("Challenge timed out");
                self.responder.info(format_args!(
                    "Check {opponent}'s profile for accepted settings"
                ));
                return Ok(None);
            }

            let stopped = tokio::select! {
                _ = sleep(self.timeouts.challenge_poll) => false,
                _ = sleep_until(deadline) => false,
                _ = self.stop.raised_since(epoch) => true,
            };
            if stopped {
                info!("Challenge polling stopped");
                cancel_challenge(api, &challenge_id).await;
                self.cell.set_phase(Phase::Idle);
                return Ok(None);
            }
        }
    }

    fn ensure_listener(&mut self, connection: &Connection) {
        let Some(game_id) = self.cell.game().map(|g| g.id) else {
            return;
        };
        if self
            .listener
            .as_ref()
            .is_some_and(|l| l.game_id() == game_id)
        {
            return;
        }
        self.cell.with(|s| {
            if let Some(game) = s.game.as_mut() {
                game.synced = false;
            }
        });
        self.listener = Some(GameListener::spawn(connection.api.clone(), game_id));
    }

    /// Absorb events that arrived between searches. A stream that died
    /// meanwhile is reopened.
    fn drain_events(&mut self, connection: &Connection) {
        let mut lost = false;
        while let Some(event) = self.listener.as_mut().and_then(GameListener::try_recv) {
            match event {
                ListenerEvent::Game(event) => self.absorb(event, connection),
                ListenerEvent::Disconnected(reason) => {
                    debug!(reason = %reason, "Stream lost between searches");
                    lost = true;
                    break;
                }
            }
        }
        if lost {
            self.listener = None;
            self.ensure_listener(connection);
        }
    }

    fn synced(&self) -> bool {
        self.cell.game().is_some_and(|g| g.synced)
    }

    fn game_over(&self) -> bool {
        self.cell.game().is_some_and(|g| g.result.is_some())
    }

    /// True when the board is a strict prefix of the remote moves and the
    /// next remote move is the opponent's.
    fn board_follows_remote(&self) -> bool {
        self.cell.with(|s| {
            let Some(game) = s.game.as_ref() else {
                return false;
            };
            let local = s.board.moves();
            local.len() < game.remote_moves.len()
                && game.remote_moves.starts_with(local)
                && game.color.is_some_and(|c| s.board.turn() != c)
        })
    }

    /// Settle a finished game: relay the opponent's final move if the board
    /// has not seen it yet, otherwise report the result.
    fn finish_ended_game(&mut self) -> Option<Result<String, GoEnd>> {
        if !self.game_over() {
            return None;
        }
        if self.board_follows_remote() {
            match self.take_remote_move() {
                Ok(Some(mv)) => return Some(Ok(mv)),
                Ok(None) => {}
                Err(end) => return Some(Err(end)),
            }
        }
        self.game_end_notice().map(Err)
    }

    /// Fold one stream event into the game binding. Move lists never shrink.
    fn absorb(&mut self, event: GameEvent, connection: &Connection) {
        let account_id = &connection.account.id;
        self.cell.with(|s| {
            let Some(game) = s.game.as_mut() else {
                return;
            };
            match event {
                GameEvent::Full(snapshot) => {
                    let color = snapshot.color_of(account_id);
                    if color != game.color {
                        info!(
                            game_id = %game.id,
                            color = ?color,
                            advisory = ?game.advisory_color,
                            "Color confirmed"
                        );
                    }
                    game.color = color;
                    game.initial_fen = snapshot.initial_fen;
                    game.remote_moves = snapshot.moves;
                    game.synced = true;
                    if snapshot.status.is_terminal() {
                        game.result = Some(GameResult {
                            status: snapshot.status.to_string(),
                            winner: None,
                        });
                    }
                }
                GameEvent::Update { moves, .. } => {
                    if moves.len() > game.remote_moves.len() {
                        game.remote_moves = moves;
                    }
                }
                GameEvent::Ended {
                    status,
                    winner,
                    moves,
                } => {
                    if moves.len() > game.remote_moves.len() {
                        game.remote_moves = moves;
                    }
                    game.result = Some(GameResult {
                        status: status.to_string(),
                        winner,
                    });
                }
            }
        });
    }

    /// If the bound game has finished, clear the binding and tell the GUI.
    fn game_end_notice(&mut self) -> Option<GoEnd> {
        let (game_id, result) = self.cell.with(|s| {
            let result = s.game.as_ref()?.result.clone()?;
            let game = s.game.take()?;
            s.phase = Phase::Ended;
            Some((game.id, result))
        })?;
        self.drop_listener();

        let winner = result.winner.map(color_name).unwrap_or("none");
        info!(game_id = %game_id, status = %result.status, winner, "Game over");
        self.responder.info(format_args!("Game over: {}, winner: {winner}", result.status));
        Some(GoEnd::Null)
    }

    /// The stream died under a search.
    fn stream_lost(&mut self, reason: String) -> GoEnd {
        self.listener = None;
        warn!(reason = %reason, "Game stream lost");
        self.responder.info(format_args!("Lost game stream: {reason}"));
        GoEnd::Null
    }

    /// Wait for the first `gameFull` of the stream, or for the game to end.
    async fn await_sync(&mut self, connection: &Connection, epoch: u64) -> Result<(), GoEnd> {
        let deadline = Instant::now() + self.timeouts.sync;
        loop {
            match self.wake(deadline, epoch).await {
                Wake::Event(Some(ListenerEvent::Game(event))) => {
                    self.absorb(event, connection);
                    if self.synced() || self.game_over() {
                        return Ok(());
                    }
                }
                Wake::Event(Some(ListenerEvent::Disconnected(reason))) => {
                    return Err(self.stream_lost(reason));
                }
                Wake::Event(None) => return Err(self.stream_lost("stream closed".to_string())),
                Wake::Deadline => {
                    let e = BridgeError::Transient(ClientError::Stream(format!(
                        "no game state within {}s",
                        self.timeouts.sync.as_secs()
                    )));
                    return Err(self.fail(e));
                }
                Wake::Stopped => {
                    debug!("Stopped while waiting for game state");
                    return Err(GoEnd::Null);
                }
            }
        }
    }

    /// Check the board mirror against the remote game: same starting
    /// position and no diverging move. Returns our (the GUI user's)
    /// confirmed color.
    fn reconcile(&self) -> Result<Color, GoEnd> {
        let (game, local, local_start) = self.cell.with(|s| {
            (s.game.clone(), s.board.moves().to_vec(), s.board.initial_fen())
        });
        let Some(game) = game else {
            return Err(GoEnd::Null);
        };
        let Some(color) = game.color else {
            let e = BridgeError::Inconsistency(format!(
                "account is not a player in game {}",
                game.id
            ));
            return Err(self.fail(e));
        };

        let remote_start = match game.initial_fen.as_deref() {
            None | Some("startpos") => STANDARD_FEN,
            Some(fen) => fen,
        };
        if !same_start(&local_start, remote_start) {
            let e = BridgeError::Inconsistency(format!(
                "board starts from {local_start}, Lichess game starts from {remote_start}"
            ));
            return Err(self.fail(e));
        }

        let common = local.len().min(game.remote_moves.len());
        if let Some(ply) = (0..common).find(|&i| local[i] != game.remote_moves[i]) {
            let e = BridgeError::Inconsistency(format!(
                "move {} differs: board has {}, Lichess has {}",
                ply + 1,
                local[ply],
                game.remote_moves[ply]
            ));
            return Err(self.fail(e));
        }
        Ok(color)
    }

    /// Send the GUI's move when the board is exactly one move ahead and that
    /// move belongs to our side.
    async fn submit_pending(
        &mut self,
        connection: &Connection,
        color: Color,
    ) -> Result<(), GoEnd> {
        let (game_id, remote_len, local_len, last_mover, last_move) = self.cell.with(|s| {
            let game = s.game.as_ref();
            (
                game.map(|g| g.id.clone()).unwrap_or_default(),
                game.map_or(0, |g| g.remote_moves.len()),
                s.board.len(),
                s.board.last_mover(),
                s.board.last_move().map(String::from),
            )
        });

        if local_len <= remote_len {
            return Ok(());
        }
        let ours = local_len == remote_len + 1 && last_mover == Some(color);
        let Some(mv) = last_move.filter(|_| ours) else {
            let e = BridgeError::Inconsistency(format!(
                "board has {local_len} moves, Lichess has {remote_len}, \
                 and the extra moves are not ours to send"
            ));
            return Err(self.fail(e));
        };

        info!(game_id = %game_id, mv = %mv, "Sending move");
        match connection.api.make_move(&game_id, &mv).await {
            Ok(()) => {
                self.cell.with(|s| {
                    if let Some(game) = s.game.as_mut() {
                        if game.remote_moves.len() == remote_len {
                            game.remote_moves.push(mv.clone());
                        }
                    }
                });
                Ok(())
            }
            Err(e) => {
                let e = BridgeError::from(e);
                match e {
                    BridgeError::Rejected(reason) => {
                        warn!(mv = %mv, reason = %reason, "Move rejected");
                        self.responder.info(format_args!("Move rejected: {reason}"));
                        Err(GoEnd::Silent)
                    }
                    e => Err(self.fail(e)),
                }
            }
        }
    }

    /// Wait until the remote game is ahead of the board, then play its
    /// next move onto the board.
    async fn await_remote_move(
        &mut self,
        connection: &Connection,
        epoch: u64,
    ) -> Result<String, GoEnd> {
        let deadline = Instant::now() + self.timeouts.move_wait;
        loop {
            // a final move still reaches the GUI before the game-over notice
            if let Some(mv) = self.take_remote_move()? {
                return Ok(mv);
            }
            if let Some(end) = self.game_end_notice() {
                return Err(end);
            }

            match self.wake(deadline, epoch).await {
                Wake::Event(Some(ListenerEvent::Game(event))) => self.absorb(event, connection),
                Wake::Event(Some(ListenerEvent::Disconnected(reason))) => {
                    return Err(self.stream_lost(reason));
                }
                Wake::Event(None) => return Err(self.stream_lost("stream closed".to_string())),
                Wake::Deadline => {
                    warn!("No move from opponent in time");
                    self.responder.info(format_args!(
                        "No move from opponent within {}s",
                        self.timeouts.move_wait.as_secs()
                    ));
                    return Err(GoEnd::Null);
                }
                Wake::Stopped => {
                    debug!("Search stopped");
                    return Err(GoEnd::Null);
                }
            }
        }
    }

    /// Apply the remote move that follows the board, if there is one.
    fn take_remote_move(&mut self) -> Result<Option<String>, GoEnd> {
        let result = self.cell.with(|s| {
            let Some(game) = s.game.as_ref() else {
                return Ok(None);
            };
            let local_len = s.board.len();
            let Some(next) = game.remote_moves.get(local_len).cloned() else {
                return Ok(None);
            };
            match s.board.push_uci(&next) {
                Ok(stored) => {
                    let stored = stored.to_string();
                    s.phase = Phase::MoveReady;
                    Ok(Some(stored))
                }
                Err(e) => Err(e),
            }
        });

        match result {
            Ok(Some(mv)) => {
                info!(mv = %mv, "Opponent moved");
                Ok(Some(mv))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(self.fail(BridgeError::Inconsistency(e.to_string()))),
        }
    }

    /// Sleep until an event, the deadline or a stop, whichever comes first.
    async fn wake(&mut self, deadline: Instant, epoch: u64) -> Wake {
        let Some(listener) = self.listener.as_mut() else {
            return Wake::Event(None);
        };
        let stop = &mut self.stop;
        tokio::select! {
            event = listener.recv() => Wake::Event(event),
            _ = sleep_until(deadline) => Wake::Deadline,
            _ = stop.raised_since(epoch) => Wake::Stopped,
        }
    }
}

async fn cancel_challenge(api: &dyn LichessApi, challenge_id: &str) {
    if let Err(e) = api.cancel_challenge(challenge_id).await {
        debug!(challenge_id, error = %e, "Failed to cancel challenge");
    }
}

const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Compare piece placement and side to move only. Lichess and the GUI may
/// spell castling rights and move counters differently.
fn same_start(local: &str, remote: &str) -> bool {
    let fields = |fen: &str| fen.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
    fields(local) == fields(remote)
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
