//! Round lifecycle: AwaitingWord → Accepting → Ending → AwaitingReplay → Closed
//!
//! The supervisor owns the listening socket for the whole process and one
//! `Round` at a time. Each round accepts connections until the round
//! terminates or the operator interrupts it, then waits a bounded time for
//! its handlers, sends the restart notice and closes what is left.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{handle_connection, HandlerReport};
use crate::operator::Operator;
use crate::round::{Round, RoundEnd, SecretWord};
use log::{debug, error, info, warn};
use shared::RESTART_NOTICE;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};

/// What happened during one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub end: RoundEnd,
    /// Connections accepted during the round
    pub connections: usize,
    /// Handlers aborted because they outlived the grace period
    pub forced: usize,
}

pub struct RoundSupervisor<O> {
    listener: TcpListener,
    config: ServerConfig,
    operator: O,
}

impl<O: Operator> RoundSupervisor<O> {
    /// Binds the listening socket; failure here is fatal
    pub async fn bind(config: ServerConfig, operator: O) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;

        Ok(Self {
            listener,
            config,
            operator,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Plays rounds until the operator declines another one
    pub async fn run(mut self) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        info!("Hangman server listening on {}", addr);
        self.operator
            .announce(&format!("Hangman server started on {}", addr));

        while let Some(word) = self.await_word().await {
            let summary = self.play_round(word, tokio::signal::ctrl_c()).await;
            self.operator.announce(&describe(&summary));

            if !self.operator.play_again().await {
                break;
            }
        }

        self.operator.announce("Shutting down server.");
        Ok(())
    }

    /// AwaitingWord: prompts until a valid word arrives or input ends
    async fn await_word(&mut self) -> Option<SecretWord> {
        loop {
            let raw = self.operator.secret_word().await?;
            match SecretWord::parse(&raw) {
                Ok(word) => return Some(word),
                Err(e) => {
                    debug!("Refused secret word: {}", e);
                    self.operator.word_rejected(&e);
                }
            }
        }
    }

    /// Runs one round from first accept to final teardown
    ///
    /// Accepting stops when the round terminates or `interrupt` completes.
    pub async fn play_round<F>(&self, word: SecretWord, interrupt: F) -> RoundSummary
    where
        F: Future,
    {
        let round = Arc::new(Round::new(word));
        let mut handlers = JoinSet::new();
        let mut ended = round.subscribe_end();
        let mut connections = 0;

        info!("New game started. Ready for players.");
        tokio::pin!(interrupt);

        // Accepting. Round end is polled first so a connection arriving after
        // termination waits in the backlog for the next round.
        loop {
            tokio::select! {
                biased;

                changed = ended.changed() => {
                    if changed.is_err() || *ended.borrow_and_update() {
                        break;
                    }
                },
                _ = &mut interrupt => {
                    round.interrupt().await;
                    break;
                },
                Some(joined) = handlers.join_next() => log_handler_exit(joined),
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        connections += 1;
                        debug!("Accepted connection from {}", addr);
                        handlers.spawn(handle_connection(
                            stream,
                            addr,
                            Arc::clone(&round),
                            self.config.grace_period,
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
            }
        }

        // Ending
        info!("Game over. Cleaning up...");
        let forced = self.drain_handlers(&mut handlers).await;

        let report = round.broadcast(RESTART_NOTICE).await;
        debug!(
            "Restart notice reached {}/{} connections",
            report.delivered, report.attempted
        );

        let remaining = round.registry().write().await.drain();
        let mut closing = JoinSet::new();
        for (_, connection) in remaining {
            closing.spawn(connection.close(self.config.grace_period));
        }
        while closing.join_next().await.is_some() {}

        let end = round
            .state()
            .lock()
            .await
            .ending()
            .cloned()
            .unwrap_or(RoundEnd::Interrupted);

        RoundSummary {
            end,
            connections,
            forced,
        }
    }

    /// Waits up to the grace period for handlers, then aborts the rest
    ///
    /// Returns how many handlers had to be aborted. Aborted handlers stay
    /// registered so they still receive the restart notice.
    async fn drain_handlers(&self, handlers: &mut JoinSet<HandlerReport>) -> usize {
        let deadline = tokio::time::sleep(self.config.grace_period);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = handlers.join_next() => match joined {
                    Some(joined) => log_handler_exit(joined),
                    None => return 0,
                },
                _ = &mut deadline => break,
            }
        }

        let forced = handlers.len();
        warn!("Forcibly closing {} connection handlers", forced);
        handlers.abort_all();
        while handlers.join_next().await.is_some() {}
        forced
    }
}

fn log_handler_exit(joined: Result<HandlerReport, JoinError>) {
    match joined {
        Ok(report) => debug!(
            "Handler for player {} ({}) finished: {:?}",
            report.id, report.addr, report.exit
        ),
        Err(e) if e.is_cancelled() => debug!("Handler cancelled"),
        Err(e) => error!("Connection handler panicked: {}", e),
    }
}

/// Operator-facing one-line summary of a finished round
pub fn describe(summary: &RoundSummary) -> String {
    let result = match &summary.end {
        RoundEnd::Won { player } => format!("Player {} won", player),
        RoundEnd::Lost => "Players lost".to_string(),
        RoundEnd::Interrupted => "Round interrupted".to_string(),
    };
    format!(
        "{} ({} connections, {} forcibly closed).",
        result, summary.connections, summary.forced
    )
}
