//! End-to-end assembly from a ChEMBL-style TSV to the scored CSV.

use std::collections::HashSet;
use std::fs;

use assayrank_ranker::{assemble, read_assay_table, read_dataset, write_dataset, AssemblyOptions, TargetId};

const EXPORT: &str = "\
CMPD_CHEMBLID\tDOC_CHEMBLID\tCANONICAL_SMILES\tSTANDARD_TYPE\tRELATION\tSTANDARD_VALUE\tSTANDARD_UNITS\tPCHEMBL_VALUE
CHEMBL10\tCHEMBL900\tCCO\tIC50\t=\t120\tnM\t6.92
CHEMBL10\tCHEMBL900\tCCO\tIC50\t=\t800\tnM\t6.10
CHEMBL11\tCHEMBL900\tCCN\tIC50\t>\t100000\tnM\t
CHEMBL12\tCHEMBL900\tCCC\tIC50\t>\t2000\tnM\t
CHEMBL13\tCHEMBL901\tc1ccccc1\tIC50\t=\t\t\t
CHEMBL14\tCHEMBL901\tc1ccncc1\tIC50\t>\t500000\tnM\t
CHEMBL15\tCHEMBL900\tCC(=O)O\tInhibition\t=\t-12\t%\t
CHEMBL16\tCHEMBL900\tCC(=O)N\tInhibition\t=\t48\t%\t
CHEMBL17\tCHEMBL902\tCCCl\tInhibition\t<\t10\t%\t
CHEMBL18\tCHEMBL902\tCCBr\tKi\t=\t3\tnM\t
";

#[test]
fn test_clean_chembl_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("SIRT2_activities.tsv");
    fs::write(&input, EXPORT).unwrap();

    let records = read_assay_table(&input).unwrap();
    assert_eq!(records.len(), 10);

    let target = TargetId::from_path(&input, "SIRT").unwrap();
    let assembled = assemble(&records, target, &AssemblyOptions::default()).unwrap();

    // CHEMBL901 IC50 query holds only zeros (missing unit, >500 uM) → pruned.
    // CHEMBL902 only carried an excluded "<" reading and a Ki row.
    let qids: HashSet<&str> = assembled.rows.iter().map(|r| r.qid.as_str()).collect();
    assert_eq!(qids, HashSet::from(["211", "221"]));

    let compounds: Vec<&str> = assembled.rows.iter().map(|r| r.compound_id.as_str()).collect();
    assert_eq!(compounds, vec!["CHEMBL10", "CHEMBL11", "CHEMBL15", "CHEMBL16"]);

    // first duplicate wins: 120 nM
    let first = &assembled.rows[0];
    assert!((first.relevance - (-(0.12f64).log10() + 6.0)).abs() < 1e-9);
    assert!(assembled.rows.iter().all(|r| r.relevance >= 0.0));

    let report = &assembled.report;
    assert_eq!(report.other_type_rows, 1);
    assert_eq!(report.queries_pruned, 1);
    assert_eq!(report.rows_pruned, 2);

    let out = dir.path().join("SIRT2_scored.csv");
    write_dataset(&out, &assembled.rows).unwrap();
    let back = read_dataset(&out).unwrap();
    assert_eq!(back, assembled.rows);
}
