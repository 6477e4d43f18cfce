use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub camera: CameraConstraints,
    /// JPEG quality (1-100) used when grabbing a still frame from the camera.
    pub jpeg_quality: u8,
    /// Simulated processing latency of the placeholder analyzer.
    #[serde(with = "humantime_serde")]
    pub analysis_delay: Duration,
    /// Fixed RNG seed for reproducible mock results.
    pub seed: Option<u64>,
    pub snapshot_path: Option<PathBuf>,
    /// Capture device index for the webcam backend.
    pub device: Option<i32>,
    pub replay_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            camera: CameraConstraints::default(),
            jpeg_quality: 80,
            analysis_delay: Duration::from_secs(3),
            seed: None,
            snapshot_path: None,
            device: None,
            replay_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: FacingMode::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Capturing,
    Analyzing,
    Completed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Capturing => "capturing",
            Phase::Analyzing => "analyzing",
            Phase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub condition: String,
    pub confidence: f64,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub description: String,
}

/// Encoded still image as produced by a frame grab or a decoded upload.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime: &'static str,
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            mime: self.mime.to_string(),
            width: self.width,
            height: self.height,
            size_bytes: self.bytes.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// Where the captured image of a session came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    Camera,
    Upload { path: PathBuf },
}

/// Completion record handed to presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub timestamp_utc: String,
    pub origin: Origin,
    pub image: ImageSummary,
    /// Captured image as a `data:` URL, only when explicitly requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CameraAccess,
    Decode,
    Analysis,
    InvalidTransition,
}

/// User-facing error notification. Never fatal; the controller is interactive afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    PhaseChanged {
        phase: Phase,
    },
    Info(InfoEvent),
    Error(ErrorNotice),
    Completed {
        // Boxed to keep ScanEvent small; the report carries strings and a vec.
        report: Box<ScanReport>,
    },
}

/// Structured info events emitted by the controller and consumed by presenters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    CameraActivated { width: u32, height: u32 },
    CameraReleased,
    ImageCaptured(ImageSummary),
    AnalysisComplete { condition: String, confidence: f64 },
}

impl InfoEvent {
    /// Render a human-readable message for presenters.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::CameraActivated { width, height } => format!(
                "Camera activated ({width}x{height}). Position your face in the frame for analysis"
            ),
            InfoEvent::CameraReleased => "Camera released".to_string(),
            InfoEvent::ImageCaptured(img) => format!(
                "Captured {}x{} {} ({} bytes)",
                img.width, img.height, img.mime, img.size_bytes
            ),
            InfoEvent::AnalysisComplete {
                condition,
                confidence,
            } => format!("Analysis complete: {condition} detected with {confidence:.1}% confidence"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_carries_mime_and_base64_payload() {
        let img = EncodedImage {
            mime: "image/png",
            bytes: Bytes::from_static(b"abc"),
            width: 1,
            height: 1,
        };
        assert_eq!(img.to_data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn config_round_trips_durations_as_humantime() {
        let cfg = ScanConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["analysis_delay"], "3s");
        assert_eq!(json["camera"]["facing"], "user");
        let back: ScanConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"medium\"");
    }
}
