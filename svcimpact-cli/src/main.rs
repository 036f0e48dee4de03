mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use svcimpact_core::impact::Direction;

#[derive(Parser)]
#[command(name = "svcimpact")]
#[command(about = "Evaluate service health and blast radius from topology snapshots", long_about = None)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-service health and the filtered view for one or more snapshots
    Evaluate {
        /// Snapshot files; discovered from the current directory when omitted
        files: Vec<PathBuf>,
        /// View mode: all, down_only, attention, critical_path
        #[arg(short, long)]
        view: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the transitive upstream or downstream closure of services
    Impact {
        file: Option<PathBuf>,
        #[arg(long = "from", required = true)]
        from: Vec<String>,
        #[arg(short, long, default_value = "upstream")]
        direction: Direction,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate a snapshot and audit its bindings
    Check { file: Option<PathBuf> },
    /// Suggest which services a monitor should be bound to
    Recommend {
        file: Option<PathBuf>,
        #[arg(long = "type")]
        monitor_type: String,
        #[arg(long = "ref")]
        monitor_ref: String,
    },
}

fn init_tracing(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match cli.command {
        Commands::Evaluate {
            files,
            view,
            format,
        } => commands::run_evaluate(files, view, format).await,
        Commands::Impact {
            file,
            from,
            direction,
            format,
        } => commands::run_impact(file, &from, direction, format),
        Commands::Check { file } => commands::run_check(file),
        Commands::Recommend {
            file,
            monitor_type,
            monitor_ref,
        } => commands::run_recommend(file, &monitor_type, &monitor_ref),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
