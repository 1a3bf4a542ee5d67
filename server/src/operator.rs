//! Operator-facing prompts
//!
//! The supervisor talks to whoever runs the server through the `Operator`
//! trait: it asks for the secret word, reports refused words, asks whether
//! to play another round and prints status lines.

use crate::error::WordError;
use log::{debug, error};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

const SECRET_PROMPT: &str = "Enter the secret word for the new game: ";

#[allow(async_fn_in_trait)]
pub trait Operator {
    /// Next candidate secret word; `None` when input has ended
    async fn secret_word(&mut self) -> Option<String>;

    /// Tells the operator why the last word was refused
    fn word_rejected(&mut self, error: &WordError);

    /// Whether to start another round; re-prompts until it gets an answer
    async fn play_again(&mut self) -> bool;

    /// Status line meant for the operator
    fn announce(&mut self, message: &str);
}

/// Blocking prompt that reads a line without echoing it
pub type HiddenReader = fn(&str) -> io::Result<String>;

fn prompt_hidden(prompt: &str) -> io::Result<String> {
    rpassword::prompt_password(prompt)
}

/// Operator at a terminal
///
/// The secret word is typed without echo on the controlling terminal. Without
/// one (piped input), it is read from the line input like every other answer.
pub struct TerminalOperator<R = BufReader<Stdin>> {
    lines: Lines<R>,
    read_hidden: HiddenReader,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self::with_input(BufReader::new(tokio::io::stdin()), prompt_hidden)
    }
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin> TerminalOperator<R> {
    pub fn with_input(input: R, read_hidden: HiddenReader) -> Self {
        Self {
            lines: input.lines(),
            read_hidden,
        }
    }

    /// Prints `prompt` and waits for one line; Ctrl-C and end of input yield `None`
    async fn prompt(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        if let Err(e) = io::stdout().flush() {
            debug!("Failed to flush prompt: {}", e);
        }

        tokio::select! {
            line = self.lines.next_line() => line.ok().flatten(),
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        }
    }
}

impl<R: AsyncBufRead + Unpin> Operator for TerminalOperator<R> {
    async fn secret_word(&mut self) -> Option<String> {
        let read_hidden = self.read_hidden;
        let hidden = tokio::select! {
            read = tokio::task::spawn_blocking(move || read_hidden(SECRET_PROMPT)) => read,
            _ = tokio::signal::ctrl_c() => {
                println!();
                return None;
            }
        };

        match hidden {
            Ok(Ok(word)) => Some(word),
            Ok(Err(e)) => {
                debug!("No terminal for hidden input ({}), reading the word as a line", e);
                self.prompt(SECRET_PROMPT).await
            }
            Err(e) => {
                error!("Secret word prompt failed: {}", e);
                None
            }
        }
    }

    fn word_rejected(&mut self, error: &WordError) {
        println!("Invalid word ({}). Please try again.", error);
    }

    async fn play_again(&mut self) -> bool {
        loop {
            match self.prompt("Play another game? (y/n): ").await {
                None => return false,
                Some(answer) => match parse_replay_answer(&answer) {
                    Some(again) => return again,
                    None => continue,
                },
            }
        }
    }

    fn announce(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Interprets a replay answer; only `y` and `n` are recognized
pub fn parse_replay_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_answers() {
        assert_eq!(parse_replay_answer("y"), Some(true));
        assert_eq!(parse_replay_answer(" Y \n"), Some(true));
        assert_eq!(parse_replay_answer("n"), Some(false));
        assert_eq!(parse_replay_answer("yes"), None);
        assert_eq!(parse_replay_answer(""), None);
    }

    #[tokio::test]
    async fn test_secret_word_is_read_hidden() {
        let mut operator =
            TerminalOperator::with_input(&b"n\n"[..], |_| Ok("hidden".to_string()));

        assert_eq!(operator.secret_word().await.as_deref(), Some("hidden"));
        // Line input is left for the other prompts
        assert!(!operator.play_again().await);
    }

    #[tokio::test]
    async fn test_secret_word_falls_back_to_line_input() {
        let mut operator = TerminalOperator::with_input(&b"visible\n"[..], |_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "no terminal"))
        });

        assert_eq!(operator.secret_word().await.as_deref(), Some("visible"));
        assert_eq!(operator.secret_word().await, None);
    }

    #[tokio::test]
    async fn test_play_again_reprompts_until_answered() {
        let mut operator = TerminalOperator::with_input(&b"maybe\n\nY\n"[..], prompt_hidden);
        assert!(operator.play_again().await);
        assert!(!operator.play_again().await);
    }
}
