use clap::Parser;
use client::network::Client;
use log::info;
use shared::{DEFAULT_PORT, DEFAULT_SERVER_HOST};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to (host:port)
    #[arg(short = 's', long)]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let server = args
        .server
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_SERVER_HOST, DEFAULT_PORT));

    info!("Connecting to: {}", server);
    let client = match Client::connect(&server).await {
        Ok(client) => client,
        Err(e) => {
            info!("Connect error: {}", e);
            println!("Connection failed. Is the server running on {}?", server);
            return Ok(());
        }
    };

    println!(
        "Connected to the Hangman server at {}! Waiting for game to start...",
        client.server_addr()
    );
    client.run().await
}
