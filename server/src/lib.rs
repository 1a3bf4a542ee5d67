//! # Hangman Server Library
//!
//! This library implements the host side of a multiplayer hangman game. The
//! host holds one secret word per round; any number of participants connect
//! over TCP, submit single-letter guesses and receive the updated game state
//! after every accepted guess.
//!
//! ## Architecture Design
//!
//! ### Explicitly Owned Rounds
//! All mutable game data lives in a [`round::Round`] created by the
//! supervisor for each round and shared with connection handlers through an
//! `Arc`. Nothing is global; a new round gets fresh state and a fresh
//! registry.
//!
//! ### Serialized Guesses
//! Guesses are evaluated one at a time under the round lock, and their
//! broadcast is issued before the lock is released. "Already guessed" and
//! win/loss checks are therefore never racy, and every participant sees the
//! same sequence of updates.
//!
//! ### Non-Blocking Broadcast
//! Each connection has a writer task fed by an unbounded queue. Broadcasting
//! only enqueues, so a slow or dead peer cannot stall guess processing or
//! delivery to anyone else.
//!
//! ### Structured Teardown
//! Handlers run in a `JoinSet` owned by the supervisor and report how they
//! ended. At round end the supervisor waits a bounded grace period, aborts
//! stragglers, sends the restart notice and closes every remaining
//! connection.
//!
//! ## Module Organization
//!
//! - `round`: secret word validation, round state and the guess state machine
//! - `snapshot`: deterministic text rendering of round state
//! - `registry`: connection registry, writer tasks and broadcast
//! - `handler`: per-connection control loop
//! - `supervisor`: round lifecycle and the accept loop
//! - `operator`: prompts for the person running the server
//! - `config` / `error`: settings and error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::operator::TerminalOperator;
//! use server::supervisor::RoundSupervisor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor =
//!         RoundSupervisor::bind(ServerConfig::default(), TerminalOperator::new()).await?;
//!
//!     // Prompts for a word, plays rounds until the operator answers "n"
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod operator;
pub mod registry;
pub mod round;
pub mod snapshot;
pub mod supervisor;
