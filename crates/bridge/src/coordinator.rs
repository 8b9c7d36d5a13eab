//! Channels and signals shared by the dispatcher, the session machine and the router.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bridge_core::Command;
use tokio::sync::{mpsc, watch};
use tracing::debug;

pub const NULL_MOVE: &str = "0000";

/// What the router receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Line { seq: u64, text: String },
    /// Everything sent before this is written; then the router stops.
    Shutdown,
}

struct ResponderInner {
    next_seq: u64,
    tx: mpsc::UnboundedSender<Outbound>,
}

/// Producer handle for outbound lines. Sequence numbers follow channel order.
#[derive(Clone)]
pub struct Responder {
    inner: Arc<Mutex<ResponderInner>>,
}

impl Responder {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ResponderInner { next_seq: 0, tx })),
        }
    }

    pub fn send(&self, text: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_seq += 1;
        let line = Outbound::Line {
            seq: inner.next_seq,
            text: text.into(),
        };
        if inner.tx.send(line).is_err() {
            debug!("Router gone, dropping line");
        }
    }

    /// `info string <text>`
    pub fn info(&self, text: impl fmt::Display) {
        self.send(format!("info string {text}"));
    }

    /// `bestmove <move>`, or the null move.
    pub fn bestmove(&self, mv: Option<&str>) {
        self.send(format!("bestmove {}", mv.unwrap_or(NULL_MOVE)));
    }

    pub fn shutdown(&self) {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = inner.tx.send(Outbound::Shutdown);
    }
}

/// The cancellation signal raised by `stop`, `quit` and end of input.
///
/// It is an epoch counter rather than a flag: a waiter cancels once the
/// epoch moves past the value recorded when its command was read.
#[derive(Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn raise(&self) {
        self.tx.send_modify(|epoch| *epoch += 1);
    }

    pub fn epoch(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn watch(&self) -> StopWatch {
        StopWatch {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct StopWatch {
    rx: watch::Receiver<u64>,
}

impl StopWatch {
    pub fn is_raised_since(&self, epoch: u64) -> bool {
        *self.rx.borrow() > epoch
    }

    /// Resolves once the signal has been raised after `epoch`.
    pub async fn raised_since(&mut self, epoch: u64) {
        if self.rx.wait_for(|&current| current > epoch).await.is_err() {
            // signal owner gone: nobody can stop us any more
            std::future::pending::<()>().await;
        }
    }
}

/// A queued command with its read order and the stop epoch seen at read time.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub command: Command,
    pub seq: u64,
    pub stop_epoch: u64,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_responder_sequence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let responder = Responder::new(tx);
        let other = responder.clone();
        responder.send("readyok");
        other.info("Logged in as lucas");
        responder.bestmove(None);
        other.shutdown();

        let mut seen = Vec::new();
        while let Some(msg) = rx.recv().await {
            seen.push(msg);
            if seen.last() == Some(&Outbound::Shutdown) {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                Outbound::Line { seq: 1, text: "readyok".into() },
                Outbound::Line { seq: 2, text: "info string Logged in as lucas".into() },
                Outbound::Line { seq: 3, text: "bestmove 0000".into() },
                Outbound::Shutdown,
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_epoch() {
        let stop = StopSignal::new();
        let mut watch = stop.watch();
        stop.raise();
        let epoch = stop.epoch();
        assert_eq!(epoch, 1);
        assert!(watch.is_raised_since(0));
        assert!(!watch.is_raised_since(epoch));

        // an old stop does not cancel a newer wait
        let waited =
            tokio::time::timeout(Duration::from_millis(50), watch.raised_since(epoch)).await;
        assert!(waited.is_err());

        let raiser = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            raiser.raise();
        });
        tokio::time::timeout(Duration::from_secs(1), watch.raised_since(epoch))
            .await
            .expect("stop observed");
    }
}
