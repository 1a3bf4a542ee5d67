//! Wire protocol shared by the hangman server and its participants.
//!
//! The protocol is plain UTF-8 text over one TCP stream per participant.
//! Participants send one letter per line; the server answers with free-form
//! text blobs (snapshots, guess announcements, result lines and notices).

use std::fmt::Display;

/// Address the server binds to by default
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
/// Address a participant connects to by default
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 65432;

/// Wrong guesses allowed before the round is lost
pub const MAX_WRONG_GUESSES: usize = 6;

/// Largest chunk the server reads from a participant at once
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Sent to every remaining participant while a round is torn down
pub const RESTART_NOTICE: &str = "Server is restarting for a new game...";

/// Sent only to a participant whose guess arrived after the round ended
pub const ROUND_OVER_NOTICE: &str = "The round is over. Please wait for the next game.";

/// Prompt the participant client prints after every server message
pub const GUESS_PROMPT: &str = "Enter a letter: ";

/// Normalizes a raw guess token
///
/// Trims surrounding whitespace and lowercases the token. Returns the letter
/// only when exactly one character remains; anything else is not a guess.
pub fn normalize_guess(raw: &str) -> Option<char> {
    let folded = raw.trim().to_lowercase();
    let mut chars = folded.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => Some(letter),
        _ => None,
    }
}

/// Frames one line of participant input for the wire
pub fn encode_guess(line: &str) -> String {
    format!("{}\n", line.trim_end_matches(['\r', '\n']))
}

/// First line of the broadcast that follows a non-terminal guess
pub fn guess_announcement(player: impl Display, letter: char) -> String {
    format!("Player {} guessed '{}'.", player, letter)
}

pub fn win_line(player: impl Display, word: &str) -> String {
    format!("*** Player {} won! The word was '{}'. ***", player, word)
}

pub fn loss_line(word: &str) -> String {
    format!("*** Game Over! You lost. The word was '{}'. ***", word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_single_letter() {
        assert_eq!(normalize_guess("a"), Some('a'));
        assert_eq!(normalize_guess("  Q \r\n"), Some('q'));
    }

    #[test]
    fn test_normalize_rejects_empty_and_long_tokens() {
        assert_eq!(normalize_guess(""), None);
        assert_eq!(normalize_guess("   \n"), None);
        assert_eq!(normalize_guess("ab"), None);
        assert_eq!(normalize_guess("a b"), None);
    }

    #[test]
    fn test_normalize_keeps_non_ascii_letters() {
        assert_eq!(normalize_guess("É"), Some('é'));
    }

    #[test]
    fn test_encode_guess_appends_single_newline() {
        assert_eq!(encode_guess("a"), "a\n");
        assert_eq!(encode_guess("a\r\n"), "a\n");
    }

    #[test]
    fn test_result_lines() {
        assert_eq!(
            win_line(3, "go"),
            "*** Player 3 won! The word was 'go'. ***"
        );
        assert_eq!(
            loss_line("cat"),
            "*** Game Over! You lost. The word was 'cat'. ***"
        );
        assert_eq!(guess_announcement(1, 'g'), "Player 1 guessed 'g'.");
    }
}
