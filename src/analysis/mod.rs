//! Pluggable analysis capability.
//!
//! The lifecycle controller only sees [`Analyzer`]. The shipped implementations are
//! placeholders: [`MockAnalyzer`] samples a fixed table after a simulated delay and
//! [`ReplayAnalyzer`] returns a previously exported result. Neither looks at the image.

mod mock;
mod replay;
mod table;

#[cfg(test)]
pub(crate) mod scripted;

pub(crate) use mock::MockAnalyzer;
pub(crate) use replay::ReplayAnalyzer;
pub(crate) use table::{find as find_candidate, CANDIDATES};

use crate::error::AnalysisError;
use crate::model::{AnalysisResult, EncodedImage};
use std::future::Future;

pub(crate) trait Analyzer: Send + Sync + 'static {
    fn analyze(
        &self,
        image: &EncodedImage,
    ) -> impl Future<Output = Result<AnalysisResult, AnalysisError>> + Send;
}

pub(crate) enum AnyAnalyzer {
    Mock(MockAnalyzer),
    Replay(ReplayAnalyzer),
}

impl Analyzer for AnyAnalyzer {
    async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisResult, AnalysisError> {
        match self {
            AnyAnalyzer::Mock(a) => a.analyze(image).await,
            AnyAnalyzer::Replay(a) => a.analyze(image).await,
        }
    }
}
