use crate::input::forward_lines;
use log::{info, warn};
use shared::{GUESS_PROMPT, MAX_MESSAGE_SIZE};
use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::net::TcpStream;

/// How the server connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// Server closed the stream
    Closed,
    /// Stream was reset or failed
    Failed(String),
}

pub struct Client {
    stream: TcpStream,
    server_addr: String,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", server_addr);

        Ok(Client {
            stream,
            server_addr: server_addr.to_string(),
        })
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Prints server messages while forwarding stdin until either side ends
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, writer) = self.stream.into_split();
        let stdin = BufReader::new(tokio::io::stdin());

        let mut receiver = tokio::spawn(receive_messages(reader, std::io::stdout()));

        tokio::select! {
            ended = &mut receiver => {
                match ended? {
                    ConnectionEnd::Closed => println!("\nConnection lost from server."),
                    ConnectionEnd::Failed(reason) => {
                        warn!("Connection failed: {}", reason);
                        println!("\nConnection to server has been closed.");
                    }
                }
            },
            forwarded = forward_lines(stdin, writer) => {
                let sent = forwarded?;
                info!("Input ended after {} guesses", sent);
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\nDisconnecting...");
            },
        }

        receiver.abort();
        Ok(())
    }
}

/// Prints each message from the server followed by a fresh prompt
pub async fn receive_messages<R, W>(mut reader: R, mut out: W) -> ConnectionEnd
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut buffer = [0u8; MAX_MESSAGE_SIZE * 4];

    loop {
        let len = match reader.read(&mut buffer).await {
            Ok(0) => return ConnectionEnd::Closed,
            Ok(len) => len,
            Err(e) => return ConnectionEnd::Failed(e.to_string()),
        };

        let text = String::from_utf8_lossy(&buffer[..len]);
        // Clear the pending prompt before printing over it
        let written = write!(out, "\r{}\r{}\n{}", " ".repeat(60), text, GUESS_PROMPT)
            .and_then(|_| out.flush());
        if let Err(e) = written {
            return ConnectionEnd::Failed(e.to_string());
        }
    }
}
