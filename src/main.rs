//! survival-fairness - Main Entry Point
//!
//! Trains audited survival classifiers and serves predictions from the command line.

use clap::Parser;
use survival_fairness::cli::{cmd_contributions, cmd_explain, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survival_fairness=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, samples, seed, config, output } => {
            cmd_train(data.as_deref(), samples, seed, config.as_deref(), &output)?;
        }
        Commands::Predict { artifacts, input } => {
            cmd_predict(&artifacts, &input)?;
        }
        Commands::Explain { artifacts, input } => {
            cmd_explain(&artifacts, &input)?;
        }
        Commands::Contributions { artifacts, input } => {
            cmd_contributions(&artifacts, &input)?;
        }
    }

    Ok(())
}
