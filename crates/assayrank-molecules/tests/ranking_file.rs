//! Featurize labeled rows and write them as a ranking file.

use std::sync::Arc;

use assayrank_common::config::FeatureConfig;
use assayrank_common::UnparsablePolicy;
use assayrank_molecules::{
    read_qids, write_ranking_file, FeatureBuilder, FeatureExtractor, LabeledStructure,
    MockFeatureExtractor,
};

fn labeled(key: &str, relevance: f64, qid: u64) -> LabeledStructure {
    LabeledStructure {
        key: key.to_string(),
        structure: key.to_string(),
        relevance,
        qid,
    }
}

#[test]
fn test_decoy_style_ranking_file() {
    let extractor: Arc<dyn FeatureExtractor> = Arc::new(
        MockFeatureExtractor::new(&["MolWt", "MinPartialCharge", "NumHDonors"])
            .with("CCO", &[0, 2], &[46.07, -0.39, 1.0])
            .with("CCCC", &[3], &[58.12, -0.06, 0.0]),
    );
    let config = FeatureConfig {
        fingerprint_bits: 4,
        ..FeatureConfig::default()
    };

    let rows = vec![
        labeled("CCCC", 0.0, 2221),
        labeled("not a molecule", 0.0, 2112),
        labeled("CCO", 0.0, 2112),
    ];

    let matrix = tokio_test::block_on(async {
        let builder = FeatureBuilder::new(extractor, &config)
            .await
            .unwrap()
            .with_policy(UnparsablePolicy::Skip);
        builder.build(&rows).await.unwrap()
    });
    assert_eq!(matrix.skipped_rows, vec![1]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decoys.svmlight");
    write_ranking_file(&path, &matrix).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "0 qid:2112 0:1 2:1 4:46.07 5:1\n0 qid:2221 3:1 4:58.12\n"
    );
    assert_eq!(read_qids(&path).unwrap(), vec![2112, 2221]);
}
