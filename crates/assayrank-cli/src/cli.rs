use std::path::PathBuf;

use assayrank_common::{DedupPolicy, UnparsablePolicy};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "assayrank", version)]
#[command(about = "Prepare learning-to-rank datasets from ChEMBL assays and random decoys")]
pub struct Cli {
    /// Configuration file (default: $ASSAYRANK_CONFIG, then ./assayrank.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a ChEMBL activity export and tag rows with query ids
    CleanChembl(CleanChemblArgs),
    /// Featurize the scored table into a ranking file
    MakeFeatures(MakeFeaturesArgs),
    /// Sample random decoys per query from a candidate library
    SampleDecoys(SampleDecoysArgs),
    /// Featurize sampled decoys into a ranking file
    MakeDecoyFeatures(MakeDecoyFeaturesArgs),
}

#[derive(Args, Debug)]
pub struct CleanChemblArgs {
    /// Tab-delimited ChEMBL activity export
    pub input: PathBuf,
    /// Scored CSV to write
    pub output: PathBuf,
    /// Target digit; parsed from the input file name when omitted
    #[arg(long)]
    pub target: Option<String>,
    /// IC50 inactivity threshold in micromolar
    #[arg(long)]
    pub threshold: Option<f64>,
    /// keep_first or prefer_complete
    #[arg(long)]
    pub dedup_policy: Option<DedupPolicy>,
    /// Write the assembly report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MakeFeaturesArgs {
    /// Scored CSV from clean-chembl
    pub input: PathBuf,
    /// Ranking file to write
    pub output: PathBuf,
    /// abort or skip
    #[arg(long)]
    pub on_unparsable: Option<UnparsablePolicy>,
    /// Also write the column names, one per line
    #[arg(long)]
    pub feature_names: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SampleDecoysArgs {
    /// Ranking file whose qids are counted
    pub input: PathBuf,
    /// Space-delimited candidate library (structure, identifier)
    pub candidates: PathBuf,
    /// Decoy CSV to write
    pub output: PathBuf,
    /// Decoys per real compound
    #[arg(long)]
    pub sample_ratio: Option<usize>,
    /// Keep every Nth candidate line
    #[arg(long)]
    pub read_stride: Option<usize>,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MakeDecoyFeaturesArgs {
    /// Decoy CSV from sample-decoys
    pub input: PathBuf,
    /// Ranking file to write
    pub output: PathBuf,
    /// Label written for every decoy
    #[arg(long)]
    pub dummy_relevance: Option<f64>,
    /// abort or skip
    #[arg(long)]
    pub on_unparsable: Option<UnparsablePolicy>,
    #[arg(long)]
    pub feature_names: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_chembl() {
        let cli = Cli::try_parse_from([
            "assayrank",
            "clean-chembl",
            "SIRT2.tsv",
            "out.csv",
            "--threshold",
            "50",
            "--dedup-policy",
            "prefer_complete",
        ])
        .unwrap();
        match cli.command {
            Command::CleanChembl(args) => {
                assert_eq!(args.threshold, Some(50.0));
                assert_eq!(args.dedup_policy, Some(DedupPolicy::PreferComplete));
                assert!(args.target.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "assayrank",
            "sample-decoys",
            "in.svmlight",
            "zinc.smi",
            "out.csv",
            "--seed",
            "7",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Command::SampleDecoys(args) => assert_eq!(args.seed, Some(7)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_candidate_file_is_required() {
        assert!(Cli::try_parse_from(["assayrank", "sample-decoys", "in.svmlight", "out.csv"]).is_err());
    }

    #[test]
    fn test_bad_policy_rejected() {
        assert!(Cli::try_parse_from([
            "assayrank",
            "make-features",
            "in.csv",
            "out.svmlight",
            "--on-unparsable",
            "maybe",
        ])
        .is_err());
    }
}
