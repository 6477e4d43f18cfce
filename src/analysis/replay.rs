use super::{find_candidate, Analyzer};
use crate::error::AnalysisError;
use crate::model::{AnalysisResult, EncodedImage, ScanReport};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Returns a previously exported result after the simulated delay. Useful for
/// reproducible demos; like the mock, it never inspects the image.
pub(crate) struct ReplayAnalyzer {
    delay: Duration,
    result: AnalysisResult,
}

impl ReplayAnalyzer {
    pub fn new(delay: Duration, result: AnalysisResult) -> Result<Self> {
        let candidate = find_candidate(&result.condition).with_context(|| {
            format!(
                "replayed condition {:?} is not one of the known conditions",
                result.condition
            )
        })?;
        if !candidate.confidence_range().contains(&result.confidence) {
            anyhow::bail!(
                "replayed confidence {} is outside {:?} for {}",
                result.confidence,
                candidate.confidence_range(),
                result.condition
            );
        }
        Ok(Self { delay, result })
    }

    /// Load from a JSON export: either a full scan report or a bare analysis result.
    pub fn from_file(delay: Duration, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read replay file {}", path.display()))?;
        let result = match serde_json::from_str::<ScanReport>(&raw) {
            Ok(report) => report.result,
            Err(_) => serde_json::from_str::<AnalysisResult>(&raw)
                .with_context(|| format!("parse replay file {}", path.display()))?,
        };
        Self::new(delay, result)
    }
}

impl Analyzer for ReplayAnalyzer {
    async fn analyze(&self, _image: &EncodedImage) -> Result<AnalysisResult, AnalysisError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.result.clone())
    }
}
