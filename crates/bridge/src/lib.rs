//! Lichess UCI bridge.
//!
//! Speaks UCI to a chess GUI and turns every `go` into "wait for the Lichess
//! opponent's move". [`Bridge`] wires the tasks together:
//!
//! - the [`dispatcher`] reads GUI lines and answers `uci`/`isready` itself,
//! - the [`machine`] runs the queued commands against Lichess,
//! - the [`router`] is the only writer of the GUI's output.

use std::sync::Arc;

use bridge_core::Settings;
use lichess::Connector;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod logging;
pub mod machine;
pub mod router;
pub mod session;

pub use config::{BridgeConfig, Timeouts};
pub use error::BridgeError;
pub use session::{Phase, SessionCell};

use crate::coordinator::{Responder, StopSignal};
use crate::dispatcher::Dispatcher;
use crate::logging::DebugToggle;
use crate::machine::SessionMachine;
use crate::router::Router;

/// Composition root: owns the session and creates the channels.
pub struct Bridge {
    cell: SessionCell,
    connector: Arc<dyn Connector>,
    timeouts: Timeouts,
    debug_toggle: Option<DebugToggle>,
}

impl Bridge {
    pub fn new(settings: Settings, timeouts: Timeouts, connector: Arc<dyn Connector>) -> Self {
        Self {
            cell: SessionCell::new(settings),
            connector,
            timeouts,
            debug_toggle: None,
        }
    }

    pub fn with_debug_toggle(mut self, toggle: DebugToggle) -> Self {
        self.debug_toggle = Some(toggle);
        self
    }

    /// Handle on the shared session, for inspection.
    pub fn session(&self) -> SessionCell {
        self.cell.clone()
    }

    /// Run until `quit` or end of input has been handled and every queued
    /// line is written.
    pub async fn run<R, W>(self, input: R, output: W)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (applied_tx, applied_rx) = watch::channel(0);
        let responder = Responder::new(out_tx);
        let stop = StopSignal::new();

        let dispatcher = Dispatcher::new(
            self.cell.clone(),
            self.connector.clone(),
            responder.clone(),
            stop.clone(),
            cmd_tx,
            applied_rx,
            self.timeouts.clone(),
        );
        let machine = SessionMachine::new(
            self.cell.clone(),
            self.connector.clone(),
            responder,
            stop.watch(),
            cmd_rx,
            applied_tx,
            self.timeouts.clone(),
            self.debug_toggle.clone(),
        );

        let reader = tokio::spawn(dispatcher.run(input));
        let mut worker = tokio::spawn(machine.run());
        info!("Bridge running");

        Router::new(out_rx).run(output).await;

        // the router only stops early when the GUI is gone
        stop.raise();
        if tokio::time::timeout(self.timeouts.grace, &mut worker).await.is_err() {
            warn!("Session machine did not finish in time");
            worker.abort();
        }
        reader.abort();
        info!("Bridge stopped");
    }
}
