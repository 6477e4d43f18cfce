//! Scan lifecycle state machine.
//!
//! ```text
//!            start_camera           capture
//!   Idle ─────────────────▶ Capturing ──────────▶ Analyzing ──(analysis)──▶ Completed
//!    │ ▲                        │                     ▲                          │
//!    │ └──── cancel_camera ─────┘                     │                          │
//!    └──────────────── upload(file) ─────────────────┘                          │
//!    ▲                                                                           │
//!    └──────────────────────────────── reset ───────────────────────────────────┘
//! ```
//!
//! Failures never leave the controller in a non-interactive state: camera and decode
//! errors keep it in `Idle`; an analysis failure returns to `Idle` with the captured
//! image retained so the analysis can be retried. The camera stream is released on
//! capture, cancel, teardown and drop.

use crate::analysis::Analyzer;
use crate::camera::{CameraSource, CameraStream};
use crate::decode::FileDecoder;
use crate::error::{AnalysisError, ScanError};
use crate::model::{
    AnalysisResult, CameraConstraints, EncodedImage, InfoEvent, Origin, Phase, ScanEvent,
    ScanReport,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Image held by the current session and where it came from.
#[derive(Debug, Clone)]
pub(crate) struct CapturedImage {
    pub image: EncodedImage,
    pub origin: Origin,
}

#[derive(Debug)]
struct ScanSession {
    phase: Phase,
    captured: Option<CapturedImage>,
    report: Option<ScanReport>,
}

impl ScanSession {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            captured: None,
            report: None,
        }
    }
}

pub(crate) struct ScanController<C: CameraSource, D: FileDecoder, A: Analyzer> {
    camera: C,
    decoder: D,
    analyzer: Arc<A>,
    constraints: CameraConstraints,
    jpeg_quality: u8,
    event_tx: UnboundedSender<ScanEvent>,
    session: ScanSession,
    stream: Option<CameraStream>,
}

impl<C: CameraSource, D: FileDecoder, A: Analyzer> ScanController<C, D, A> {
    pub fn new(
        camera: C,
        decoder: D,
        analyzer: A,
        constraints: CameraConstraints,
        jpeg_quality: u8,
        event_tx: UnboundedSender<ScanEvent>,
    ) -> Self {
        let ctrl = Self {
            camera,
            decoder,
            analyzer: Arc::new(analyzer),
            constraints,
            jpeg_quality,
            event_tx,
            session: ScanSession::idle(),
            stream: None,
        };
        ctrl.emit(ScanEvent::PhaseChanged { phase: Phase::Idle });
        ctrl
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn captured(&self) -> Option<&CapturedImage> {
        self.session.captured.as_ref()
    }

    pub fn report(&self) -> Option<&ScanReport> {
        self.session.report.as_ref()
    }

    pub fn active_streams(&self) -> usize {
        self.camera.active_streams()
    }

    fn emit(&self, ev: ScanEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn info(&self, info: InfoEvent) {
        self.emit(ScanEvent::Info(info));
    }

    pub fn notify(&self, msg: String) {
        self.info(InfoEvent::Message(msg));
    }

    pub fn status_line(&self) -> String {
        let image = match self.session.captured.as_ref() {
            Some(c) => format!("{}x{} {}", c.image.width, c.image.height, c.image.mime),
            None => "none".to_string(),
        };
        let result = match self.session.report.as_ref() {
            Some(r) => format!("{} ({:.1}%)", r.result.condition, r.result.confidence),
            None => "none".to_string(),
        };
        format!(
            "Phase: {} | camera streams: {} | image: {image} | result: {result}",
            self.session.phase.label(),
            self.camera.active_streams()
        )
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.session.phase != phase {
            tracing::debug!(from = ?self.session.phase, to = ?phase, "phase change");
            self.session.phase = phase;
            self.emit(ScanEvent::PhaseChanged { phase });
        }
    }

    /// Log the error and surface it to presenters; hands it back for the caller.
    fn report_error(&self, err: ScanError) -> ScanError {
        tracing::warn!(kind = ?err.kind(), "{err}");
        self.emit(ScanEvent::Error(err.notice()));
        err
    }

    fn require(&self, expected: Phase, action: &'static str) -> Result<(), ScanError> {
        if self.session.phase == expected {
            Ok(())
        } else {
            Err(self.report_error(ScanError::InvalidTransition {
                action,
                phase: self.session.phase,
            }))
        }
    }

    /// Idle → Capturing. On failure the controller stays Idle with no stream held.
    pub async fn start_camera(&mut self) -> Result<(), ScanError> {
        self.require(Phase::Idle, "start the camera")?;

        match self.camera.acquire(&self.constraints).await {
            Ok(stream) => {
                // A new session supersedes anything retained from a failed one.
                self.session = ScanSession::idle();
                self.info(InfoEvent::CameraActivated {
                    width: stream.constraints.width,
                    height: stream.constraints.height,
                });
                self.stream = Some(stream);
                self.set_phase(Phase::Capturing);
                Ok(())
            }
            Err(e) => Err(self.report_error(e.into())),
        }
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.camera.release(stream);
            self.info(InfoEvent::CameraReleased);
        }
    }

    /// Capturing → Analyzing. The stream is released before the phase changes, whether
    /// or not the grab succeeded.
    pub async fn capture(&mut self) -> Result<EncodedImage, ScanError> {
        self.require(Phase::Capturing, "capture")?;
        let grabbed = match self.stream.as_ref() {
            Some(stream) => self.camera.grab_frame(stream, self.jpeg_quality).await,
            None => Err(crate::error::CameraAccessError::FrameGrab(
                "no active stream".into(),
            )),
        };
        self.release_stream();

        match grabbed {
            Ok(image) => {
                self.info(InfoEvent::ImageCaptured(image.summary()));
                self.session.captured = Some(CapturedImage {
                    image: image.clone(),
                    origin: Origin::Camera,
                });
                self.set_phase(Phase::Analyzing);
                Ok(image)
            }
            Err(e) => {
                self.set_phase(Phase::Idle);
                Err(self.report_error(e.into()))
            }
        }
    }

    /// Capturing → Idle without taking a picture.
    pub fn cancel_camera(&mut self) -> Result<(), ScanError> {
        self.require(Phase::Capturing, "cancel the camera")?;
        self.release_stream();
        self.set_phase(Phase::Idle);
        Ok(())
    }

    /// Idle → Analyzing from an image file, bypassing Capturing.
    pub async fn upload(&mut self, path: &Path) -> Result<EncodedImage, ScanError> {
        self.require(Phase::Idle, "upload an image")?;

        match self.decoder.decode(path).await {
            Ok(image) => {
                self.session = ScanSession::idle();
                self.info(InfoEvent::ImageCaptured(image.summary()));
                self.session.captured = Some(CapturedImage {
                    image: image.clone(),
                    origin: Origin::Upload {
                        path: path.to_path_buf(),
                    },
                });
                self.set_phase(Phase::Analyzing);
                Ok(image)
            }
            Err(e) => Err(self.report_error(e.into())),
        }
    }

    /// Idle (with an image retained from a failed analysis) → Analyzing.
    pub fn retry_analysis(&mut self) -> Result<EncodedImage, ScanError> {
        self.require(Phase::Idle, "retry the analysis")?;
        let image = match self.session.captured.as_ref() {
            Some(captured) if self.session.report.is_none() => captured.image.clone(),
            _ => {
                return Err(self.report_error(ScanError::InvalidTransition {
                    action: "retry without a captured image",
                    phase: self.session.phase,
                }))
            }
        };
        self.set_phase(Phase::Analyzing);
        Ok(image)
    }

    /// Future running the analyzer on `image`, detached from the controller so it can be
    /// spawned while the controller keeps handling commands.
    pub fn analysis_job(
        &self,
        image: EncodedImage,
    ) -> impl Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'static {
        let analyzer = self.analyzer.clone();
        async move { analyzer.analyze(&image).await }
    }

    /// Analyzing → Completed on success; Analyzing → Idle (capture retained) on failure.
    pub fn finish_analysis(
        &mut self,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> Result<&ScanReport, ScanError> {
        self.require(Phase::Analyzing, "publish an analysis result")?;
        let captured = match self.session.captured.as_ref() {
            Some(c) => c,
            None => {
                self.set_phase(Phase::Idle);
                return Err(self.report_error(
                    AnalysisError::Failed("no captured image for this session".into()).into(),
                ));
            }
        };

        match outcome {
            Ok(result) => {
                let report = ScanReport {
                    timestamp_utc: time::OffsetDateTime::now_utc()
                        .format(&time::format_description::well_known::Rfc3339)
                        .unwrap_or_else(|_| "now".into()),
                    origin: captured.origin.clone(),
                    image: captured.image.summary(),
                    image_data_url: None,
                    result,
                };
                self.info(InfoEvent::AnalysisComplete {
                    condition: report.result.condition.clone(),
                    confidence: report.result.confidence,
                });
                self.emit(ScanEvent::Completed {
                    report: Box::new(report.clone()),
                });
                self.set_phase(Phase::Completed);
                Ok(self.session.report.insert(report))
            }
            Err(e) => {
                self.set_phase(Phase::Idle);
                Err(self.report_error(e.into()))
            }
        }
    }

    /// Run the analysis for the current session in place (one-shot flows and tests).
    pub async fn analyze(&mut self) -> Result<&ScanReport, ScanError> {
        self.require(Phase::Analyzing, "analyze")?;
        let outcome = match self.session.captured.as_ref() {
            Some(captured) => self.analysis_job(captured.image.clone()).await,
            None => Err(AnalysisError::Failed("no captured image for this session".into())),
        };
        self.finish_analysis(outcome)
    }

    /// Completed or Idle → Idle, dropping the image and the result.
    pub fn reset(&mut self) -> Result<(), ScanError> {
        if matches!(self.session.phase, Phase::Capturing | Phase::Analyzing) {
            return Err(self.report_error(ScanError::InvalidTransition {
                action: "reset",
                phase: self.session.phase,
            }));
        }
        self.session.captured = None;
        self.session.report = None;
        self.set_phase(Phase::Idle);
        Ok(())
    }

    /// Release the camera if it is still held. Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.release_stream();
        if self.session.phase == Phase::Capturing {
            self.set_phase(Phase::Idle);
        }
    }
}

impl<C: CameraSource, D: FileDecoder, A: Analyzer> Drop for ScanController<C, D, A> {
    fn drop(&mut self) {
        self.teardown();
    }
}
