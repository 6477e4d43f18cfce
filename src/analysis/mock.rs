use super::{Analyzer, CANDIDATES};
use crate::error::AnalysisError;
use crate::model::{AnalysisResult, EncodedImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Placeholder analyzer: waits `delay`, then picks one candidate uniformly at random and
/// computes its confidence at selection time. The image content is ignored, so the same
/// image can yield different results on repeated runs.
pub(crate) struct MockAnalyzer {
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl MockAnalyzer {
    pub fn new(delay: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            delay,
            rng: Mutex::new(rng),
        }
    }

    fn pick(&self) -> AnalysisResult {
        // A poisoned lock only means another pick panicked; the RNG state is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let candidate = &CANDIDATES[rng.gen_range(0..CANDIDATES.len())];
        let confidence = rng.gen_range(candidate.confidence_range());
        candidate.to_result(confidence)
    }
}

impl Analyzer for MockAnalyzer {
    async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisResult, AnalysisError> {
        tracing::debug!(bytes = image.bytes.len(), delay = ?self.delay, "mock analysis started");
        tokio::time::sleep(self.delay).await;
        Ok(self.pick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::find_candidate;
    use bytes::Bytes;
    use std::collections::HashSet;

    fn image() -> EncodedImage {
        EncodedImage {
            mime: "image/jpeg",
            bytes: Bytes::from_static(b"jpeg"),
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn confidence_stays_in_declared_range_for_all_seeds() {
        for seed in 0..500 {
            let analyzer = MockAnalyzer::new(Duration::ZERO, Some(seed));
            let result = analyzer.pick();
            let candidate = find_candidate(&result.condition).expect("condition from fixed set");
            assert!(
                candidate.confidence_range().contains(&result.confidence),
                "{} confidence {} outside {:?}",
                result.condition,
                result.confidence,
                candidate.confidence_range()
            );
            assert_eq!(result.severity, candidate.severity);
        }
    }

    #[test]
    fn every_candidate_is_reachable_and_confidence_varies() {
        let analyzer = MockAnalyzer::new(Duration::ZERO, Some(7));
        let results: Vec<_> = (0..300).map(|_| analyzer.pick()).collect();
        let conditions: HashSet<_> = results.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(
            conditions,
            HashSet::from(["Healthy", "Fatigue Detection", "Stress Indicators"])
        );

        let healthy: HashSet<u64> = results
            .iter()
            .filter(|r| r.condition == "Healthy")
            .map(|r| r.confidence.to_bits())
            .collect();
        assert!(healthy.len() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn result_arrives_after_exactly_the_configured_delay() {
        let analyzer = MockAnalyzer::new(Duration::from_secs(3), Some(1));
        let start = tokio::time::Instant::now();
        let result = analyzer.analyze(&image()).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_millis(3010));
        assert!(find_candidate(&result.condition).is_some());
    }
}
