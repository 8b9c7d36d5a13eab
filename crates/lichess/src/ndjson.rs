//! NDJSON decoding of the board game stream.

use std::io;

use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::model::GameEvent;
use crate::wire::parse_event;

pub type EventStream = BoxStream<'static, Result<GameEvent, ClientError>>;

/// Turn a byte stream of newline-delimited JSON into game events.
///
/// Blank keep-alive lines and event types without meaning for the bridge are
/// skipped. A line that fails to decode is logged and skipped. A transport
/// error is yielded once and ends the stream.
pub fn decode_events<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let chunks = body
        .map_ok(io::Cursor::new)
        .map_err(|e| {
            let e: ClientError = e.into();
            io::Error::other(e)
        })
        .boxed();
    let lines = StreamReader::new(chunks).lines();

    stream::unfold(Some(lines), |lines| async move {
        let mut lines = lines?;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some((Err(transport_error(e)), None)),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_event(line) {
                Ok(Some(event)) => return Some((Ok(event), Some(lines))),
                Ok(None) => debug!(line, "Ignoring stream event"),
                Err(e) => warn!(error = %e, line, "Failed to decode stream line"),
            }
        }
    })
    .boxed()
}

/// The client error a chunk failed with, or a stream error for anything
/// the reader raised itself.
fn transport_error(e: io::Error) -> ClientError {
    let message = e.to_string();
    match e.into_inner().map(|inner| inner.downcast::<ClientError>()) {
        Some(Ok(e)) => *e,
        _ => ClientError::Stream(message),
    }
}
