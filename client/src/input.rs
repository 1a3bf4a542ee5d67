//! Player input forwarding

use log::debug;
use shared::encode_guess;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Forwards every non-empty input line to the server
///
/// Returns the number of lines sent once input ends. Blank lines are not
/// sent; all other validation is left to the server.
pub async fn forward_lines<R, W>(input: R, mut server: W) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Sending {:?}", line);
        server.write_all(encode_guess(&line).as_bytes()).await?;
        sent += 1;
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_forwards_non_empty_lines() {
        let (local, mut remote) = tokio::io::duplex(256);
        let input: &[u8] = b"a\n\n  \nB\r\nxyz\n";

        let sent = assert_ok!(forward_lines(input, local).await);
        assert_eq!(sent, 3);

        let mut received = String::new();
        assert_ok!(remote.read_to_string(&mut received).await);
        assert_eq!(received, "a\nB\nxyz\n");
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (local, remote) = tokio::io::duplex(16);
        drop(remote);
        let input: &[u8] = b"a\n";

        assert!(forward_lines(input, local).await.is_err());
    }
}
