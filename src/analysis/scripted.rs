use super::{Analyzer, CANDIDATES};
use crate::error::AnalysisError;
use crate::model::{AnalysisResult, EncodedImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Test analyzer that fails a fixed number of times before returning the first candidate.
pub(crate) struct ScriptedAnalyzer {
    delay: Duration,
    failures_left: AtomicUsize,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedAnalyzer {
    pub fn failing(delay: Duration, failures: usize) -> Self {
        Self {
            delay,
            failures_left: AtomicUsize::new(failures),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, _image: &EncodedImage) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AnalysisError::Failed("scripted failure".into()));
        }
        Ok(CANDIDATES[0].to_result(CANDIDATES[0].base))
    }
}
