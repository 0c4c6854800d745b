use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pagepacer",
    about = "Priority-bucketed, admission-controlled page prefetch scheduling",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded network-event trace through the scheduler
    Replay {
        /// JSONL trace file (one network event per line)
        #[arg(long)]
        trace: PathBuf,

        /// Pretty-print agent messages instead of JSON lines
        #[arg(long)]
        pretty: bool,
    },

    /// Parse an x-prefetch header value and show the bucket layout
    ParseHints {
        /// Raw header value
        #[arg(long)]
        value: String,
    },

    /// Format resources from a JSON file as an x-prefetch header value
    EncodeHints {
        /// JSON array of {url, resource_type, priority} objects
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { trace, pretty } => {
            tracing::info!(trace = %trace.display(), "Replaying trace");
            let events = pagepacer::replay::load_trace(&trace)?;
            let messages = pagepacer::replay::run_trace(events);
            for message in &messages {
                let line = if pretty {
                    serde_json::to_string_pretty(message)?
                } else {
                    serde_json::to_string(message)?
                };
                println!("{}", line);
            }
        }
        Commands::ParseHints { value } => {
            let mut buckets = pagepacer::PriorityBuckets::new();
            buckets.parse_hints(&value);
            if buckets.pending() == 0 {
                println!("No resources parsed.");
            } else {
                println!("{:<6} | {:<10} | URL", "Tier", "Type");
                println!("{:-<6}-|-{:-<10}-|-{:-<50}", "", "", "");
                for (tier, resources) in buckets.occupied() {
                    for resource in resources {
                        println!(
                            "{:<6} | {:<10} | {}",
                            tier, resource.resource_type, resource.url
                        );
                    }
                }
            }
        }
        Commands::EncodeHints { input } => {
            let contents = std::fs::read_to_string(&input)?;
            let resources: Vec<pagepacer::PrefetchResource> = serde_json::from_str(&contents)?;
            println!("{}", pagepacer::hints::encode_hints(&resources));
        }
    }

    Ok(())
}
