use std::process;
use std::time::Duration;

use clap::Parser;
use cornlet_bench::{BenchConfig, run};
use tracing_subscriber::EnvFilter;

/// HTTP benchmark tool.
#[derive(Parser, Debug)]
#[command(name = "cornlet-bench", version)]
struct Cli {
    /// Target URL.
    #[arg(long, default_value = "http://localhost:8000/")]
    url: String,
    /// Number of concurrent clients.
    #[arg(long, default_value_t = 50)]
    clients: usize,
    /// Duration in seconds.
    #[arg(long = "time", default_value_t = 10)]
    time: u64,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = bench(&cli).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn bench(cli: &Cli) -> anyhow::Result<()> {
    let config = BenchConfig::new(&cli.url, cli.clients, Duration::from_secs(cli.time))?
        .with_request_timeout(Duration::from_secs(cli.timeout));

    if !cli.json {
        println!("Starting Benchmark...");
        println!("Target: {}", config.url);
        println!("Clients: {}, Duration: {}s", config.clients, cli.time);
        println!("{}", "-".repeat(40));
    }

    let report = run(&config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\nBenchmark Completed!\n");
        println!("{report}");
    }
    Ok(())
}
