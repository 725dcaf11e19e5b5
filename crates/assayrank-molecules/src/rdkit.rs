//! RDKit feature extraction through a helper process.
//!
//! Protocol (one process per call):
//! - `<cmd> --descriptor-names` prints a JSON array of descriptor names.
//! - `<cmd> --nbits N` reads one structure per stdin line and answers with one
//!   JSON object per line, either `{"bits": [...], "descriptors": [...]}` or
//!   `{"error": "..."}`. Null descriptor values are read as NaN.

use std::process::Stdio;

use assayrank_common::{AssayRankError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::features::{Extraction, FeatureExtractor, RawFeatures};

#[derive(Debug, Deserialize)]
struct ExtractorLine {
    bits: Option<Vec<usize>>,
    descriptors: Option<Vec<Option<f64>>>,
    error: Option<String>,
}

/// Wrapper for the RDKit helper script.
pub struct RdkitExtractor {
    program: String,
    args: Vec<String>,
}

impl RdkitExtractor {
    /// Create an extractor from a command line such as `["python3", "scripts/rdkit_features.py"]`.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AssayRankError::Config("empty RDKit command".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> AssayRankError {
        AssayRankError::ExternalTool(format!("failed to run {}: {e}", self.program))
    }
}

fn parse_line(line: &str) -> Result<Extraction> {
    let parsed: ExtractorLine = serde_json::from_str(line)?;
    if let Some(error) = parsed.error {
        return Ok(Extraction::Unparsable(error));
    }
    match (parsed.bits, parsed.descriptors) {
        (Some(on_bits), Some(descriptors)) => Ok(Extraction::Parsed(RawFeatures {
            on_bits,
            descriptors: descriptors.into_iter().map(|d| d.unwrap_or(f64::NAN)).collect(),
        })),
        _ => Err(AssayRankError::ExternalTool(format!(
            "extractor line has neither features nor an error: {line}"
        ))),
    }
}

#[async_trait]
impl FeatureExtractor for RdkitExtractor {
    async fn descriptor_names(&self) -> Result<Vec<String>> {
        let output = self
            .command()
            .arg("--descriptor-names")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssayRankError::ExternalTool(format!(
                "descriptor listing failed: {stderr}"
            )));
        }
        let names: Vec<String> = serde_json::from_slice(&output.stdout)?;
        debug!(n_descriptors = names.len(), "RDKit descriptor list loaded");
        Ok(names)
    }

    async fn extract(&self, structures: &[String], fingerprint_bits: usize) -> Result<Vec<Extraction>> {
        info!(n = structures.len(), "Running RDKit feature extraction");

        let mut child = self
            .command()
            .arg("--nbits")
            .arg(fingerprint_bits.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // A line break inside a structure would shift every later answer by one.
        let mut payload = String::new();
        for s in structures {
            if !s.contains(['\n', '\r']) {
                payload.push_str(s);
            }
            payload.push('\n');
        }

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AssayRankError::ExternalTool("extractor stdin unavailable".into()))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        let written = writer
            .await
            .map_err(|e| AssayRankError::ExternalTool(format!("stdin writer panicked: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssayRankError::ExternalTool(format!("feature extraction failed: {stderr}")));
        }
        written.map_err(|e| AssayRankError::ExternalTool(format!("writing to extractor failed: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let results = stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(parse_line)
            .collect::<Result<Vec<_>>>()?;

        if results.len() != structures.len() {
            return Err(AssayRankError::ExternalTool(format!(
                "extractor answered {} of {} structures",
                results.len(),
                structures.len()
            )));
        }
        Ok(results)
    }
}
