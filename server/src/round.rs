//! Round state and the guess state machine
//!
//! A round owns one secret word, the set of letters guessed so far and,
//! once it has terminated, how it ended. `RoundState::apply_guess` is the pure transition
//! function; `Round` wraps the state with its lock, the connection registry
//! and the end-of-round signal so handlers can share it through an `Arc`.

use crate::error::WordError;
use crate::registry::{BroadcastReport, ConnectionId, ConnectionRegistry};
use crate::snapshot;
use log::{debug, info};
use shared::{normalize_guess, MAX_WRONG_GUESSES};
use std::collections::HashSet;
use std::fmt;
use tokio::sync::{watch, Mutex, RwLock};

/// A validated secret word: lowercase, non-empty, no whitespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretWord(String);

impl SecretWord {
    /// Validates operator input
    ///
    /// Surrounding whitespace is trimmed and the word is lowercased. Empty
    /// input and input with interior whitespace are refused.
    pub fn parse(raw: &str) -> Result<Self, WordError> {
        let word = raw.trim().to_lowercase();
        if word.is_empty() {
            return Err(WordError::Empty);
        }
        if word.chars().any(char::is_whitespace) {
            return Err(WordError::ContainsWhitespace);
        }
        Ok(Self(word))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, letter: char) -> bool {
        self.0.contains(letter)
    }
}

impl fmt::Display for SecretWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of feeding one raw token to the round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Token was empty or longer than one character
    Rejected,
    /// The round had already terminated
    RoundOver,
    /// Letter was guessed before; nothing changed
    Duplicate,
    Continue { player: ConnectionId, letter: char },
    Win { player: ConnectionId, word: String },
    Loss { word: String },
}

impl GuessOutcome {
    /// True for the outcomes that end the round
    pub fn is_terminal(&self) -> bool {
        matches!(self, GuessOutcome::Win { .. } | GuessOutcome::Loss { .. })
    }
}

/// How a round terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEnd {
    Won { player: ConnectionId },
    Lost,
    Interrupted,
}

/// Mutable data of a single round
#[derive(Debug, Clone)]
pub struct RoundState {
    secret: SecretWord,
    guessed: HashSet<char>,
    ending: Option<RoundEnd>,
}

impl RoundState {
    pub fn new(secret: SecretWord) -> Self {
        Self {
            secret,
            guessed: HashSet::new(),
            ending: None,
        }
    }

    pub fn secret(&self) -> &SecretWord {
        &self.secret
    }

    pub fn is_guessed(&self, letter: char) -> bool {
        self.guessed.contains(&letter)
    }

    pub fn guessed_count(&self) -> usize {
        self.guessed.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.ending.is_some()
    }

    /// How the round ended, once it has
    pub fn ending(&self) -> Option<&RoundEnd> {
        self.ending.as_ref()
    }

    /// Wrong guesses in lexicographic order
    ///
    /// Always derived from the guessed set and the secret word so the count
    /// can never drift from what was actually guessed.
    pub fn wrong_guesses(&self) -> Vec<char> {
        let mut wrong: Vec<char> = self
            .guessed
            .iter()
            .copied()
            .filter(|letter| !self.secret.contains(*letter))
            .collect();
        wrong.sort_unstable();
        wrong
    }

    pub fn wrong_guess_count(&self) -> usize {
        self.guessed
            .iter()
            .filter(|letter| !self.secret.contains(**letter))
            .count()
    }

    fn is_solved(&self) -> bool {
        self.secret.as_str().chars().all(|c| self.guessed.contains(&c))
    }

    /// Applies one raw guess token on behalf of `player`
    ///
    /// Malformed tokens, guesses after termination and repeated letters
    /// leave the state untouched. A novel letter is recorded, then the win
    /// check runs before the loss check.
    pub fn apply_guess(&mut self, player: ConnectionId, raw: &str) -> GuessOutcome {
        let Some(letter) = normalize_guess(raw) else {
            return GuessOutcome::Rejected;
        };
        if self.is_terminated() {
            return GuessOutcome::RoundOver;
        }
        if !self.guessed.insert(letter) {
            return GuessOutcome::Duplicate;
        }

        if self.is_solved() {
            self.ending = Some(RoundEnd::Won { player });
            return GuessOutcome::Win {
                player,
                word: self.secret.to_string(),
            };
        }

        if self.wrong_guess_count() >= MAX_WRONG_GUESSES {
            self.ending = Some(RoundEnd::Lost);
            return GuessOutcome::Loss {
                word: self.secret.to_string(),
            };
        }

        GuessOutcome::Continue { player, letter }
    }

    /// Ends the round without a winner. Returns false if it had already ended.
    pub fn force_end(&mut self) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.ending = Some(RoundEnd::Interrupted);
        true
    }
}

/// Everything shared between the supervisor and the handlers of one round
pub struct Round {
    state: Mutex<RoundState>,
    registry: RwLock<ConnectionRegistry>,
    ended: watch::Sender<bool>,
}

impl Round {
    pub fn new(secret: SecretWord) -> Self {
        let (ended, _) = watch::channel(false);
        Self {
            state: Mutex::new(RoundState::new(secret)),
            registry: RwLock::new(ConnectionRegistry::new()),
            ended,
        }
    }

    pub fn state(&self) -> &Mutex<RoundState> {
        &self.state
    }

    pub fn registry(&self) -> &RwLock<ConnectionRegistry> {
        &self.registry
    }

    /// Receiver that observes `true` once the round has terminated
    pub fn subscribe_end(&self) -> watch::Receiver<bool> {
        self.ended.subscribe()
    }

    pub fn has_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// Processes one guess and broadcasts the result
    ///
    /// The round lock is held across evaluation and broadcast so every
    /// participant receives updates in the order guesses were applied.
    /// Lock order is state then registry; registry sends only enqueue.
    pub async fn submit_guess(&self, player: ConnectionId, raw: &str) -> GuessOutcome {
        let mut state = self.state.lock().await;
        let outcome = state.apply_guess(player, raw);

        if let Some(message) = snapshot::broadcast_message(&outcome, &state) {
            let report = self.registry.write().await.broadcast(&message);
            debug!(
                "Broadcast {:?} to {}/{} connections",
                outcome, report.delivered, report.attempted
            );
        }

        if outcome.is_terminal() {
            info!("Round over: {:?}", outcome);
            self.ended.send_replace(true);
        }

        outcome
    }

    /// Terminates the round on operator request
    pub async fn interrupt(&self) {
        let forced = self.state.lock().await.force_end();
        if forced {
            info!("Round interrupted by operator");
        }
        self.ended.send_replace(true);
    }

    /// Sends a message to every registered connection
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        self.registry.write().await.broadcast(message)
    }
}
