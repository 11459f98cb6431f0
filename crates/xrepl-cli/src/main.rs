//! xrepl — add tables to a cross-cluster replication group.
//!
//! # Usage
//!
//! ```text
//! xrepl --config xrepl.toml tables --group <uuid> --search orders
//! xrepl --config xrepl.toml add --group <uuid> --table <table-uuid> --table <table-uuid>
//! xrepl add --group <uuid> --all --search shop --no-wait
//! ```

use clap::{Parser, Subcommand};

mod commands;

use commands::ConfigArgs;

#[derive(Parser)]
#[command(
    name = "xrepl",
    about = "Replication membership editor",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List source tables not yet in the replication group.
    Tables {
        /// Replication group UUID.
        #[arg(short, long)]
        group: String,
        /// Case-insensitive name filter.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add tables to the replication group and watch the resulting task.
    Add {
        /// Replication group UUID.
        #[arg(short, long)]
        group: String,
        /// Table UUID to add. Repeatable.
        #[arg(short, long = "table")]
        tables: Vec<String>,
        /// Select every eligible table matching --search.
        #[arg(long)]
        all: bool,
        /// Case-insensitive name filter applied before --all.
        #[arg(short, long)]
        search: Option<String>,
        /// Print the task link and exit without watching.
        #[arg(long)]
        no_wait: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,xrepl=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.load()?;

    match cli.command {
        Commands::Tables { group, search } => {
            commands::tables::list(config, &group, search.as_deref()).await
        }
        Commands::Add {
            group,
            tables,
            all,
            search,
            no_wait,
        } => {
            let request = commands::add::AddRequest {
                group,
                tables,
                all,
                search,
                wait: !no_wait,
            };
            commands::add::add(config, request).await
        }
    }
}
