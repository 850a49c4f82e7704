//! Armonica CLI - offline THD measurement and telemetry tools.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "armonica")]
#[command(author, version, about = "Armonica THD analyzer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure THD of an audio file
    Analyze(commands::analyze::AnalyzeArgs),

    /// Generate measurement test tones
    Generate(commands::generate::GenerateArgs),

    /// Run a channel-strip/master telemetry simulation
    Simulate(commands::simulate::SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
    }
}
