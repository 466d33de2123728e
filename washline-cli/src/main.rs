mod handlers;
mod reconciler;
mod server;
mod simulate;

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use washline_core::config::{PoolConfig, DEFAULT_MACHINES};

#[derive(Parser)]
#[command(
    name = "washline",
    about = "washline — first-come allocation of a fixed pool of machines",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the washline HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "WASHLINE_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "WASHLINE_HOST")]
        host: String,

        /// Number of machines in the pool (fixed for the life of the process)
        #[arg(short, long, default_value_t = DEFAULT_MACHINES, env = "WASHLINE_MACHINES")]
        machines: usize,

        /// Offset from UTC, in minutes, used when printing times
        #[arg(long, default_value = "330", env = "WASHLINE_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
        utc_offset_minutes: i32,

        /// Also reconcile every N seconds in the background (0 = only on requests)
        #[arg(long, default_value = "0", env = "WASHLINE_RECONCILE_INTERVAL_SECS")]
        reconcile_interval_secs: u64,

        /// Keep at most this many completed users (unbounded when unset)
        #[arg(long, env = "WASHLINE_COMPLETED_CAPACITY")]
        completed_capacity: Option<usize>,

        /// Maximum requests processed concurrently
        #[arg(long, default_value = "256", env = "WASHLINE_MAX_CONCURRENT_REQUESTS")]
        max_concurrent_requests: usize,
    },

    /// Replay a JSON scenario from stdin against a manual clock
    Simulate,

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            machines,
            utc_offset_minutes,
            reconcile_interval_secs,
            completed_capacity,
            max_concurrent_requests,
        } => {
            let pool = PoolConfig {
                machines,
                completed_capacity,
            };
            let config = server::ServeConfig {
                host,
                port,
                pool,
                utc_offset_minutes,
                reconcile_interval: (reconcile_interval_secs > 0)
                    .then(|| Duration::from_secs(reconcile_interval_secs)),
                max_concurrent_requests: max_concurrent_requests.max(1),
            };
            server::run(config).await?;
        }
        Commands::Simulate => {
            eprintln!("Reading scenario from stdin...");
            let mut input = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut input)?;
            println!("{}", simulate::run_from_json(&input)?);
        }
        Commands::Version => {
            println!("washline {}", env!("CARGO_PKG_VERSION"));
            println!("First-come machine allocation with FIFO wait-list");
        }
    }

    Ok(())
}
