//! # Hangman Client Library
//!
//! The participant side of the hangman game is deliberately thin: it
//! forwards each line typed by the player to the server and prints whatever
//! the server sends back. All game logic lives on the server.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Connects to the server, prints incoming snapshots and notices, and
//! reports when the server goes away.
//!
//! ### Input Module (`input`)
//! Reads player input line by line and frames it for the wire.

pub mod input;
pub mod network;
