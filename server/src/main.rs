use clap::Parser;
use log::error;
use server::config::ServerConfig;
use server::operator::TerminalOperator;
use server::supervisor::RoundSupervisor;
use shared::{DEFAULT_BIND_HOST, DEFAULT_PORT};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_BIND_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// How long round teardown waits for connections before closing them
    #[arg(short, long, default_value = "2000")]
    grace_period_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ServerConfig::new(
        &args.host,
        args.port,
        Duration::from_millis(args.grace_period_ms),
    );

    let supervisor = match RoundSupervisor::bind(config, TerminalOperator::new()).await {
        Ok(supervisor) => supervisor,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    supervisor.run().await?;
    Ok(())
}
