//! Text rendering of round state
//!
//! Pure functions only: identical state always renders to identical bytes,
//! which keeps every participant's view consistent.

use crate::round::{GuessOutcome, RoundState};
use shared::{guess_announcement, loss_line, win_line, MAX_WRONG_GUESSES};

/// Gallows drawings, one per wrong guess from zero up to the maximum
pub const STAGES: [&str; MAX_WRONG_GUESSES + 1] = [
    r"
  +---+
  |   |
      |
      |
      |
      |
=========",
    r"
  +---+
  |   |
  O   |
      |
      |
      |
=========",
    r"
  +---+
  |   |
  O   |
  |   |
      |
      |
=========",
    r"
  +---+
  |   |
  O   |
 /|   |
      |
      |
=========",
    r"
  +---+
  |   |
  O   |
 /|\  |
      |
      |
=========",
    r"
  +---+
  |   |
  O   |
 /|\  |
 /    |
      |
=========",
    r"
  +---+
  |   |
  O   |
 /|\  |
 / \  |
      |
=========",
];

/// Placeholder shown for letters nobody has guessed yet
const MASK: char = '_';

pub fn stage(wrong_guesses: usize) -> &'static str {
    STAGES[wrong_guesses.min(MAX_WRONG_GUESSES)]
}

/// The secret word with unguessed positions masked, letters space-separated
pub fn masked_word(state: &RoundState) -> String {
    state
        .secret()
        .as_str()
        .chars()
        .map(|c| {
            let shown = if state.is_guessed(c) { c } else { MASK };
            format!("{} ", shown)
        })
        .collect()
}

/// Renders the full snapshot: drawing, masked word and wrong guesses
pub fn render(state: &RoundState) -> String {
    let wrong = state.wrong_guesses();
    let wrong_list = wrong
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{}\n\nWord: {}\nWrong guesses ({}/{}): {}\n",
        stage(wrong.len()),
        masked_word(state),
        wrong.len(),
        MAX_WRONG_GUESSES,
        wrong_list
    )
}

/// Message to broadcast for a guess outcome, if it warrants one
///
/// `state` must be the state the outcome was produced from, still under the
/// round lock.
pub fn broadcast_message(outcome: &GuessOutcome, state: &RoundState) -> Option<String> {
    match outcome {
        GuessOutcome::Continue { player, letter } => Some(format!(
            "{}\n{}",
            guess_announcement(player, *letter),
            render(state)
        )),
        GuessOutcome::Win { player, word } => {
            Some(format!("\n{}\n{}", render(state), win_line(player, word)))
        }
        GuessOutcome::Loss { word } => Some(format!("\n{}\n{}", render(state), loss_line(word))),
        GuessOutcome::Rejected | GuessOutcome::RoundOver | GuessOutcome::Duplicate => None,
    }
}
