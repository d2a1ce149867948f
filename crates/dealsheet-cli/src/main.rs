mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "dealsheet",
    version,
    about = "Extract \"buy X get Y free\" deal tiers from vendor deal sheet PDFs"
)]
struct Cli {
    /// Log parser decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a deal sheet (PDF or extracted-pages JSON) into a deals matrix
    Parse {
        /// Path to PDF or extracted-pages JSON file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write parsed output to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Parser to run
        #[arg(long, value_enum, default_value_t = Engine::Auto)]
        engine: Engine,

        /// JSON parser options file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Snap an order quantity against a SKU's deal tiers
    Qty {
        /// Quantity as entered
        qty: i64,

        /// Deal tier, e.g. "10+1" or "Buy 20 get 3 FREE" (repeatable)
        #[arg(short, long = "tier", value_name = "DEAL", required = true)]
        tiers: Vec<String>,

        /// How the quantity changed: increase, decrease, input or hydrate
        #[arg(short, long, default_value = "increase")]
        mode: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Engine {
    /// Table parser with plain-text fallback
    Auto,
    /// Table parser only
    Table,
    /// Plain-text parser only
    Legacy,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            input_file,
            output,
            out,
            engine,
            config,
        } => commands::parse::run(input_file, &output, out, engine, config),
        Commands::Qty { qty, tiers, mode } => commands::quantity::run(qty, &tiers, &mode),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
