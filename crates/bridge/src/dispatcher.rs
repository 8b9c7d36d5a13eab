//! Reads GUI lines, answers the time-critical commands itself and queues
//! everything else for the session machine.

use std::ops::ControlFlow;
use std::sync::Arc;

use bridge_core::{Command, ParseError};
use lichess::Connector;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::coordinator::{Envelope, Responder, StopSignal};
use crate::error::BridgeError;
use crate::session::{self, SessionCell};

/// Consecutive read errors after which input counts as closed.
const MAX_READ_FAILURES: u32 = 10;

const AUTHOR: &str = "lichess-bridge contributors";

pub struct Dispatcher {
    cell: SessionCell,
    connector: Arc<dyn Connector>,
    responder: Responder,
    stop: StopSignal,
    commands: mpsc::UnboundedSender<Envelope>,
    applied: watch::Receiver<u64>,
    timeouts: Timeouts,
    next_seq: u64,
    /// Sequence number of the most recent queued `setoption`.
    last_option_seq: u64,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cell: SessionCell,
        connector: Arc<dyn Connector>,
        responder: Responder,
        stop: StopSignal,
        commands: mpsc::UnboundedSender<Envelope>,
        applied: watch::Receiver<u64>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            cell,
            connector,
            responder,
            stop,
            commands,
            applied,
            timeouts,
            next_seq: 0,
            last_option_seq: 0,
        }
    }

    pub async fn run<R>(mut self, input: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut failures = 0;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => {
                    failures = 0;
                    line
                }
                Ok(None) => break,
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, failures, "Failed to read input line");
                    if failures >= MAX_READ_FAILURES {
                        warn!("Too many read errors, treating input as closed");
                        break;
                    }
                    continue;
                }
            };

            debug!(line = %line, "<<<");
            match Command::parse(&line) {
                Ok(command) => {
                    if self.dispatch(command).await.is_break() {
                        return;
                    }
                }
                Err(ParseError::Empty) => {}
                Err(e) => warn!(error = %BridgeError::from(e), "Dropping command"),
            }
        }

        info!("End of input");
        self.stop.raise();
        self.enqueue(Command::Quit);
    }

    async fn dispatch(&mut self, command: Command) -> ControlFlow<()> {
        if command.is_fast_path() {
            if matches!(command, Command::Handshake) {
                self.handshake();
            } else {
                self.ready().await;
            }
            return ControlFlow::Continue(());
        }

        match command {
            Command::Stop => {
                self.stop.raise();
                self.enqueue(Command::Stop);
            }
            Command::Quit => {
                self.stop.raise();
                self.enqueue(Command::Quit);
                return ControlFlow::Break(());
            }
            Command::Unknown(text) => debug!(text = %text, "Ignoring unknown command"),
            command => {
                let is_option = matches!(command, Command::SetOption { .. });
                let seq = self.enqueue(command);
                if is_option {
                    self.last_option_seq = seq;
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn enqueue(&mut self, command: Command) -> u64 {
        self.next_seq += 1;
        let envelope = Envelope {
            command,
            seq: self.next_seq,
            stop_epoch: self.stop.epoch(),
        };
        if self.commands.send(envelope).is_err() {
            warn!("Session machine gone, dropping command");
        }
        self.next_seq
    }

    fn handshake(&self) {
        let options = self.cell.with(|s| s.settings.option_lines());
        self.responder.send(format!(
            "id name Lichess Bridge {}",
            env!("CARGO_PKG_VERSION")
        ));
        self.responder.send(format!("id author {AUTHOR}"));
        for line in options {
            self.responder.send(line);
        }
        self.responder.send("uciok");
    }

    /// Let queued options land, log in if there is a token but no
    /// connection, then answer `readyok`. Bounded by the connect timeout.
    async fn ready(&mut self) {
        let deadline = Instant::now() + self.timeouts.connect;

        let target = self.last_option_seq;
        let options_applied = timeout_at(deadline, self.applied.wait_for(|&seq| seq >= target))
            .await
            .is_ok();
        if !options_applied {
            warn!(target, "Options not applied before readyok");
        }

        let needs_login = self
            .cell
            .with(|s| s.settings.has_token() && s.connection.is_none());
        if needs_login {
            let cell = self.cell.clone();
            let connector = self.connector.clone();
            let responder = self.responder.clone();
            let login = tokio::spawn(async move {
                if let Err(e) = session::connect(&cell, connector.as_ref(), &responder).await {
                    warn!(error = %e, "Login failed");
                    responder.info(&e);
                }
            });
            if timeout_at(deadline, login).await.is_err() {
                info!("Login still pending, answering readyok");
            }
        }

        self.responder.send("readyok");
    }
}
