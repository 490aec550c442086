use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use chatrelay::connector::api::serve;
use chatrelay::{
    Commands, Container, ContainerConfig, ExternalChatAdapter, HttpClientConfig, RetryPolicy,
    Router,
};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the external chat service [env: EXTERNAL_CHAT_BASE_URL]
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true, default_value = "5000")]
    connect_timeout_ms: u64,

    #[arg(long, global = true, default_value = "30000")]
    read_timeout_ms: u64,

    #[arg(long, global = true, default_value = "30000")]
    write_timeout_ms: u64,

    /// Idle keep-alive connections retained per upstream host (not a cap on concurrent connections)
    #[arg(long, global = true, default_value = "100")]
    pool_max_idle: usize,

    #[arg(long, global = true, default_value = "20")]
    pool_idle_timeout_secs: u64,

    /// Total attempts per request, including the first
    #[arg(long, global = true, default_value = "3")]
    retry_max_attempts: u32,

    #[arg(long, global = true, default_value = "200")]
    retry_initial_backoff_ms: u64,

    #[arg(long, global = true, default_value = "2000")]
    retry_max_backoff_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(ExternalChatAdapter::configured_base_url),
            http: HttpClientConfig {
                connect_timeout_ms: self.connect_timeout_ms,
                read_timeout_ms: self.read_timeout_ms,
                write_timeout_ms: self.write_timeout_ms,
                pool_max_idle_per_host: self.pool_max_idle,
                pool_idle_timeout_secs: self.pool_idle_timeout_secs,
            },
            retry: RetryPolicy {
                max_attempts: self.retry_max_attempts,
                initial_backoff_ms: self.retry_initial_backoff_ms,
                max_backoff_ms: self.retry_max_backoff_ms,
                ..RetryPolicy::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.container_config())?;

    if let Commands::Serve { port, public } = cli.command {
        let ip = if public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        return serve(&container, SocketAddr::new(ip, port)).await;
    }

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}
