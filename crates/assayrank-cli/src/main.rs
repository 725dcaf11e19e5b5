//! assayrank — ChEMBL learning-to-rank dataset preparation.
//! Entry point for the command-line tools.

mod cli;
mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assayrank_common::Config;
use assayrank_molecules::{FeatureExtractor, RdkitExtractor};

use crate::cli::{Cli, Command};

fn rdkit_extractor(config: &Config) -> anyhow::Result<Arc<dyn FeatureExtractor>> {
    let extractor = RdkitExtractor::new(&config.features.rdkit_command)?;
    Ok(Arc::new(extractor))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("assayrank=info,info")),
        )
        .with_writer(std::io::stdout)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Command::CleanChembl(args) => {
            let report = commands::clean_chembl(&config, args)?;
            info!(
                rows = report.rows_retained,
                queries = report.queries_retained,
                output = %args.output.display(),
                "Done: clean-chembl"
            );
        }
        Command::MakeFeatures(args) => {
            let matrix = commands::make_features(&config, rdkit_extractor(&config)?, args).await?;
            info!(rows = matrix.n_rows(), output = %args.output.display(), "Done: make-features");
        }
        Command::SampleDecoys(args) => {
            let n = commands::sample(&config, args)?;
            info!(decoys = n, output = %args.output.display(), "Done: sample-decoys");
        }
        Command::MakeDecoyFeatures(args) => {
            let matrix = commands::make_decoy_features(&config, rdkit_extractor(&config)?, args).await?;
            info!(
                rows = matrix.n_rows(),
                skipped = matrix.skipped_rows.len(),
                output = %args.output.display(),
                "Done: make-decoy-features"
            );
        }
    }
    Ok(())
}
