//! The single writer of the GUI's stdout.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::coordinator::Outbound;

pub struct Router {
    lines: mpsc::UnboundedReceiver<Outbound>,
}

impl Router {
    pub fn new(lines: mpsc::UnboundedReceiver<Outbound>) -> Self {
        Self { lines }
    }

    /// Write lines in the order they were queued, flushing after each.
    /// Returns on the shutdown sentinel, when every producer is gone, or
    /// when the output fails.
    pub async fn run<W>(mut self, mut output: W)
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(message) = self.lines.recv().await {
            let (seq, text) = match message {
                Outbound::Line { seq, text } => (seq, text),
                Outbound::Shutdown => {
                    debug!("Router received shutdown");
                    return;
                }
            };

            debug!(seq, line = %text, ">>>");
            if let Err(e) = write_line(&mut output, &text).await {
                warn!(error = %e, "Output closed, router stopping");
                return;
            }
        }
        debug!("All producers gone, router stopping");
    }
}

async fn write_line<W>(output: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
