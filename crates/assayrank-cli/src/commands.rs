use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use assayrank_common::{Config, UnparsablePolicy};
use assayrank_decoys::{
    count_qids_in_ranking_file, make_rng, read_candidates, read_decoys, sample_decoys, write_decoys,
    SamplingOptions,
};
use assayrank_molecules::{
    write_feature_names, write_ranking_file, FeatureBuilder, FeatureExtractor, LabeledStructure,
    RankingMatrix,
};
use assayrank_ranker::{
    assemble, read_assay_table, read_dataset, write_dataset, AssemblyOptions, AssemblyReport, TargetId,
};

use crate::cli::{CleanChemblArgs, MakeDecoyFeaturesArgs, MakeFeaturesArgs, SampleDecoysArgs};

pub fn clean_chembl(config: &Config, args: &CleanChemblArgs) -> Result<AssemblyReport> {
    let mut scoring = config.scoring.clone();
    if let Some(threshold) = args.threshold {
        anyhow::ensure!(threshold > 0.0, "--threshold must be positive, got {threshold}");
        scoring.ic50_threshold_um = threshold;
    }
    if let Some(policy) = args.dedup_policy {
        scoring.dedup_policy = policy;
    }

    let target = match &args.target {
        Some(raw) => TargetId::parse(raw)?,
        None => TargetId::from_path(&args.input, &config.query.target_prefix)?,
    };
    info!(input = %args.input.display(), target = %target.digit(), "Cleaning ChEMBL export");

    let records = read_assay_table(&args.input)
        .with_context(|| format!("Failed to read assay table {}", args.input.display()))?;

    let mut options = AssemblyOptions::from(&scoring);
    options.progress_every = config.features.progress_every;
    let assembled = assemble(&records, target, &options)?;
    assembled.report.log();

    write_dataset(&args.output, &assembled.rows)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&assembled.report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }
    Ok(assembled.report)
}

pub async fn make_features(
    config: &Config,
    extractor: Arc<dyn FeatureExtractor>,
    args: &MakeFeaturesArgs,
) -> Result<RankingMatrix> {
    let rows = read_dataset(&args.input)
        .with_context(|| format!("Failed to read scored table {}", args.input.display()))?;
    let labeled = rows
        .iter()
        .map(|row| -> Result<LabeledStructure> {
            Ok(LabeledStructure {
                key: row.compound_id.clone(),
                structure: row.canonical_smiles.clone(),
                relevance: row.relevance,
                qid: row.qid.numeric()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let policy = args.on_unparsable.unwrap_or(config.features.training_on_unparsable);
    featurize(config, extractor, &labeled, policy, &args.output, args.feature_names.as_deref()).await
}

pub fn sample(config: &Config, args: &SampleDecoysArgs) -> Result<usize> {
    let ratio = args.sample_ratio.unwrap_or(config.decoys.sample_ratio);
    let stride = args.read_stride.unwrap_or(config.decoys.read_stride);
    let seed = args.seed.or(config.decoys.seed);

    let counts = count_qids_in_ranking_file(&args.input)
        .with_context(|| format!("Failed to read ranking file {}", args.input.display()))?;
    let pool = read_candidates(&args.candidates, stride, config.features.progress_every)
        .with_context(|| format!("Failed to read candidates {}", args.candidates.display()))?;

    let options = SamplingOptions {
        sample_ratio: ratio,
        progress_every: config.features.progress_every,
    };
    let mut rng = make_rng(seed);
    let pairs = sample_decoys(&mut rng, &counts, &pool, options)?;

    write_decoys(&args.output, &pairs)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    Ok(pairs.len())
}

pub async fn make_decoy_features(
    config: &Config,
    extractor: Arc<dyn FeatureExtractor>,
    args: &MakeDecoyFeaturesArgs,
) -> Result<RankingMatrix> {
    let pairs = read_decoys(&args.input)
        .with_context(|| format!("Failed to read decoy table {}", args.input.display()))?;
    let relevance = args.dummy_relevance.unwrap_or(config.decoys.dummy_relevance);
    let labeled: Vec<LabeledStructure> = pairs
        .into_iter()
        .map(|pair| LabeledStructure {
            key: pair.structure.clone(),
            structure: pair.structure,
            relevance,
            qid: pair.qid,
        })
        .collect();

    let policy = args.on_unparsable.unwrap_or(config.features.decoy_on_unparsable);
    featurize(config, extractor, &labeled, policy, &args.output, args.feature_names.as_deref()).await
}

async fn featurize(
    config: &Config,
    extractor: Arc<dyn FeatureExtractor>,
    rows: &[LabeledStructure],
    policy: UnparsablePolicy,
    output: &std::path::Path,
    feature_names: Option<&std::path::Path>,
) -> Result<RankingMatrix> {
    let builder = FeatureBuilder::new(extractor, &config.features)
        .await?
        .with_policy(policy);

    if let Some(path) = feature_names {
        write_feature_names(path, builder.layout())
            .with_context(|| format!("Failed to write feature names {}", path.display()))?;
    }

    let matrix = builder.build(rows).await?;
    write_ranking_file(output, &matrix)
        .with_context(|| format!("Failed to write ranking file {}", output.display()))?;
    Ok(matrix)
}
