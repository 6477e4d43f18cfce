//! Scan error taxonomy.
//!
//! Every failure is caught at the operation that produced it, logged, and turned into an
//! [`ErrorNotice`] for presenters. None of these are fatal to the process.

use crate::model::{ErrorKind, ErrorNotice, Phase};
use std::path::PathBuf;
use thiserror::Error;

/// Camera acquisition or frame grab failure.
#[derive(Debug, Error)]
pub enum CameraAccessError {
    #[error("permission to access the camera was denied: {0}")]
    PermissionDenied(String),

    #[error("no camera device available: {0}")]
    DeviceUnavailable(String),

    #[error("failed to grab a frame: {0}")]
    FrameGrab(String),
}

/// Uploaded file could not be turned into an encoded image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a supported image format")]
    UnsupportedFormat { path: PathBuf },

    #[error("{path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Analysis step failure. The placeholder analyzer never produces one.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    CameraAccess(#[from] CameraAccessError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("cannot {action} while {}", phase.label())]
    InvalidTransition { action: &'static str, phase: Phase },
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::CameraAccess(_) => ErrorKind::CameraAccess,
            ScanError::Decode(_) => ErrorKind::Decode,
            ScanError::Analysis(_) => ErrorKind::Analysis,
            ScanError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }

    /// Build the user-facing notification for this error.
    pub fn notice(&self) -> ErrorNotice {
        let (title, hint) = match self.kind() {
            ErrorKind::CameraAccess => (
                "Camera Error",
                "Unable to access camera. Please check permissions.",
            ),
            ErrorKind::Decode => (
                "Upload Failed",
                "Unable to read the uploaded image. Please try another file.",
            ),
            ErrorKind::Analysis => (
                "Analysis Failed",
                "Unable to complete facial analysis. Please try again.",
            ),
            ErrorKind::InvalidTransition => ("Not Available", "Finish or reset the current scan first."),
        };
        ErrorNotice {
            kind: self.kind(),
            title: title.to_string(),
            message: format!("{hint} ({self})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_keep_error_kinds_distinct() {
        let camera: ScanError = CameraAccessError::PermissionDenied("denied".into()).into();
        let decode: ScanError = DecodeError::UnsupportedFormat {
            path: PathBuf::from("a.txt"),
        }
        .into();
        let analysis: ScanError = AnalysisError::Failed("boom".into()).into();

        assert_eq!(camera.notice().kind, ErrorKind::CameraAccess);
        assert_eq!(decode.notice().kind, ErrorKind::Decode);
        assert_eq!(analysis.notice().kind, ErrorKind::Analysis);
        assert!(camera.notice().message.contains("check permissions"));
    }

    #[test]
    fn invalid_transition_names_action_and_phase() {
        let err = ScanError::InvalidTransition {
            action: "start the camera",
            phase: Phase::Analyzing,
        };
        assert_eq!(err.to_string(), "cannot start the camera while analyzing");
    }
}
