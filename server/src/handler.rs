//! Per-connection control loop
//!
//! A handler moves through Connecting → Active → Draining → Closed:
//! it registers the connection and pushes the current snapshot, feeds every
//! received line to the round, and on disconnect unregisters and closes the
//! connection before reporting back to the supervisor. When the round ends the
//! handler returns at once and leaves the connection to the supervisor.

use crate::registry::{Connection, ConnectionId};
use crate::round::{GuessOutcome, Round};
use crate::snapshot;
use log::{debug, info, warn};
use shared::{MAX_MESSAGE_SIZE, ROUND_OVER_NOTICE};
use std::net::SocketAddr;
use std::str::Utf8Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::watch;

/// Why a handler left the Active state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerExit {
    /// Peer closed the stream cleanly
    PeerClosed,
    /// Read failed or the payload was not valid UTF-8
    TransportError(String),
    /// The round terminated
    RoundOver,
}

/// Final report a handler hands back to the supervisor
#[derive(Debug, Clone)]
pub struct HandlerReport {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub exit: HandlerExit,
}

/// Runs one participant connection to completion
///
/// `grace` bounds how long closing waits for queued messages to reach the peer.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    round: Arc<Round>,
    grace: Duration,
) -> HandlerReport
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);

    // Connecting: holding the round lock keeps any guess from being
    // broadcast between registration and the initial snapshot.
    let id = {
        let state = round.state().lock().await;
        let mut registry = round.registry().write().await;
        let id = registry.register(Connection::spawn_writer(addr, writer));
        if !registry.send_to(id, &snapshot::render(&state)) {
            debug!("Initial snapshot to player {} was not delivered", id);
        }
        id
    };

    let exit = read_guesses(&mut reader, id, &round).await;
    info!("Connection from {} closed ({:?})", addr, exit);

    // Draining. After the round ends the connection stays registered so the
    // supervisor's restart notice and close-all reach it.
    if exit != HandlerExit::RoundOver {
        let connection = round.registry().write().await.unregister(id);
        if let Some(connection) = connection {
            connection.close(grace).await;
        }
    }

    HandlerReport { id, addr, exit }
}

/// Active state: reads guesses until the peer leaves or the round ends
///
/// Pending input is read before the end signal is checked, so a guess that
/// raced the end of the round still gets the round-over notice.
async fn read_guesses<R>(reader: &mut R, id: ConnectionId, round: &Round) -> HandlerExit
where
    R: AsyncRead + Unpin,
{
    let mut ended = round.subscribe_end();
    let mut buffer = [0u8; MAX_MESSAGE_SIZE];
    let mut pending = LineBuffer::default();

    loop {
        let len = tokio::select! {
            biased;

            read = reader.read(&mut buffer) => match read {
                Ok(0) => return HandlerExit::PeerClosed,
                Ok(len) => len,
                Err(e) => return HandlerExit::TransportError(e.to_string()),
            },
            _ = wait_for_end(&mut ended) => return HandlerExit::RoundOver,
        };

        if let Err(e) = pending.extend(&buffer[..len]) {
            warn!("Player {} sent undecodable data: {}", id, e);
            return HandlerExit::TransportError(e.to_string());
        }

        while let Some(token) = pending.next_line() {
            let outcome = round.submit_guess(id, &token).await;
            if outcome.is_terminal() {
                return HandlerExit::RoundOver;
            }
            if outcome == GuessOutcome::RoundOver {
                round.registry().read().await.send_to(id, ROUND_OVER_NOTICE);
                return HandlerExit::RoundOver;
            }
        }

        if pending.discard_overflow(MAX_MESSAGE_SIZE) {
            debug!("Player {} sent an unterminated line; dropped it", id);
        }
        if round.has_ended() {
            return HandlerExit::RoundOver;
        }
    }
}

/// Resolves once the round has ended, including before the call
async fn wait_for_end(ended: &mut watch::Receiver<bool>) {
    loop {
        if *ended.borrow_and_update() {
            return;
        }
        if ended.changed().await.is_err() {
            return;
        }
    }
}

/// Bytes received from a participant that do not yet form a full line
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    /// Appends a chunk; fails once the data can no longer be valid UTF-8
    ///
    /// A multi-byte character cut at the end of the chunk is kept for the
    /// next read.
    fn extend(&mut self, chunk: &[u8]) -> Result<(), Utf8Error> {
        self.bytes.extend_from_slice(chunk);
        match std::str::from_utf8(&self.bytes) {
            Err(e) if e.error_len().is_some() => Err(e),
            _ => Ok(()),
        }
    }

    /// Takes the next newline-terminated line, without its terminator
    fn next_line(&mut self) -> Option<String> {
        let end = self.bytes.iter().position(|byte| *byte == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=end).collect();
        let text = String::from_utf8_lossy(&line);
        Some(text.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Drops an unterminated line longer than `limit`
    fn discard_overflow(&mut self, limit: usize) -> bool {
        if self.bytes.len() > limit {
            self.bytes.clear();
            return true;
        }
        false
    }
}
