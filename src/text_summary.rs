//! Text summary builder for CLI output.

use crate::model::{Origin, ScanReport};

pub(crate) const DISCLAIMER: &str = "Disclaimer: this result comes from a placeholder analysis \
(a fixed table sampled at random) and is for demonstration only. It is not medical advice; \
consult a healthcare provider for any health concerns.";

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(report: &ScanReport) -> TextSummary {
    let result = &report.result;
    let mut lines = vec![
        format!("Condition: {}", result.condition),
        format!(
            "Confidence: {:.1}% ({} priority)",
            result.confidence,
            result.severity.as_str().to_uppercase()
        ),
        result.description.clone(),
        "Recommendations:".to_string(),
    ];
    lines.extend(result.recommendations.iter().map(|r| format!("  - {r}")));

    let source = match &report.origin {
        Origin::Camera => "camera".to_string(),
        Origin::Upload { path } => format!("upload {}", path.display()),
    };
    lines.push(format!(
        "Source: {source} ({}x{} {}, {} bytes)",
        report.image.width, report.image.height, report.image.mime, report.image.size_bytes
    ));
    lines.push(format!("Analyzed at: {}", report.timestamp_utc));
    lines.push(DISCLAIMER.to_string());

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CANDIDATES;
    use crate::model::ImageSummary;
    use std::path::PathBuf;

    #[test]
    fn lists_result_recommendations_and_source() {
        let report = ScanReport {
            timestamp_utc: "2026-10-16T12:00:00Z".into(),
            origin: Origin::Upload {
                path: PathBuf::from("face.png"),
            },
            image: ImageSummary {
                mime: "image/png".into(),
                width: 5,
                height: 4,
                size_bytes: 70,
            },
            image_data_url: None,
            result: CANDIDATES[0].to_result(91.26),
        };

        let lines = build_text_summary(&report).lines;
        assert_eq!(lines[0], "Condition: Healthy");
        assert_eq!(lines[1], "Confidence: 91.3% (LOW priority)");
        assert!(lines.contains(&"  - Stay hydrated and get adequate sleep".to_string()));
        assert!(lines.contains(&"Source: upload face.png (5x4 image/png, 70 bytes)".to_string()));
        assert_eq!(lines.last().unwrap(), DISCLAIMER);
    }
}
