use crate::model::{AnalysisResult, Severity};

/// One fixed entry of the placeholder result table.
#[derive(Debug)]
pub(crate) struct Candidate {
    pub condition: &'static str,
    pub base: f64,
    pub spread: f64,
    pub severity: Severity,
    pub description: &'static str,
    pub recommendations: &'static [&'static str],
}

impl Candidate {
    /// Confidence lies in `[base, base + spread)`.
    pub fn confidence_range(&self) -> std::ops::Range<f64> {
        self.base..self.base + self.spread
    }

    pub fn to_result(&self, confidence: f64) -> AnalysisResult {
        AnalysisResult {
            condition: self.condition.to_string(),
            confidence,
            severity: self.severity,
            recommendations: self.recommendations.iter().map(|r| r.to_string()).collect(),
            description: self.description.to_string(),
        }
    }
}

pub(crate) const CANDIDATES: [Candidate; 3] = [
    Candidate {
        condition: "Healthy",
        base: 85.0,
        spread: 10.0,
        severity: Severity::Low,
        description: "No significant health indicators detected. Facial analysis shows normal vital signs and skin condition.",
        recommendations: &[
            "Maintain regular health checkups",
            "Continue healthy lifestyle habits",
            "Stay hydrated and get adequate sleep",
        ],
    },
    Candidate {
        condition: "Fatigue Detection",
        base: 78.0,
        spread: 15.0,
        severity: Severity::Medium,
        description: "Signs of fatigue detected in facial features. Eye area analysis indicates potential sleep deprivation.",
        recommendations: &[
            "Ensure 7-9 hours of quality sleep",
            "Take regular breaks during work",
            "Consider stress management techniques",
            "Consult healthcare provider if fatigue persists",
        ],
    },
    Candidate {
        condition: "Stress Indicators",
        base: 70.0,
        spread: 20.0,
        severity: Severity::Medium,
        description: "Facial tension patterns suggest elevated stress levels. Micro-expressions indicate psychological strain.",
        recommendations: &[
            "Practice relaxation techniques",
            "Consider meditation or mindfulness",
            "Evaluate work-life balance",
            "Speak with a healthcare professional",
        ],
    },
];

pub(crate) fn find(condition: &str) -> Option<&'static Candidate> {
    CANDIDATES.iter().find(|c| c.condition == condition)
}
