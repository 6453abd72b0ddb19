//! Line-based stdin handling for the terminal client.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

const LINE_BUFFER: usize = 8;

/// Forward stdin lines on a channel; the channel closes at end of input.
pub fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(error = %err, "stdin closed");
                    break;
                }
            }
        }
    });
    rx
}

/// Map user input to a 0-based option index.
///
/// Accepts a 1-based number (`2`) or an option letter (`b`, `B`).
#[must_use]
pub fn parse_choice(input: &str) -> Option<usize> {
    let input = input.trim();
    let mut chars = input.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            let offset = u32::from(c.to_ascii_lowercase()) - u32::from('a');
            return usize::try_from(offset).ok();
        }
    }
    input.parse::<usize>().ok()?.checked_sub(1)
}

/// `true` for an empty line or anything starting with `y`.
#[must_use]
pub fn parse_confirm(input: &str) -> bool {
    let input = input.trim();
    input.is_empty() || input.to_ascii_lowercase().starts_with('y')
}
