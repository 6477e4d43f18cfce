//! Scan command loop.
//!
//! Maps user commands onto lifecycle transitions, runs the analysis as a spawned task and
//! keeps only one session in flight. Presentation layers read the controller's events.

use super::lifecycle::ScanController;
use super::post_process::{process_scan_completion, PostProcess};
use crate::analysis::Analyzer;
use crate::camera::CameraSource;
use crate::decode::FileDecoder;
use crate::error::{AnalysisError, ScanError};
use crate::model::{AnalysisResult, EncodedImage};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Commands emitted by UI layers to drive the scan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiCommand {
    StartCamera,
    Capture,
    CancelCamera,
    Upload(PathBuf),
    Retry,
    Reset,
    Status,
    Quit,
}

type AnalysisHandle = JoinHandle<Result<AnalysisResult, AnalysisError>>;

fn spawn_analysis<C, D, A>(
    scan: &ScanController<C, D, A>,
    started: Result<EncodedImage, ScanError>,
) -> Option<AnalysisHandle>
where
    C: CameraSource,
    D: FileDecoder,
    A: Analyzer,
{
    // Transition errors have already been reported by the controller.
    let image = started.ok()?;
    scan.notify("Analyzing facial features... This may take a moment".to_string());
    Some(tokio::spawn(scan.analysis_job(image)))
}

/// Drive the scan from UI commands until quit. Quit waits for an in-flight analysis.
pub(crate) async fn run_controller<C, D, A>(
    scan: &mut ScanController<C, D, A>,
    post: &PostProcess,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) where
    C: CameraSource,
    D: FileDecoder,
    A: Analyzer,
{
    let mut in_flight: Option<AnalysisHandle> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                tracing::debug!(?cmd, phase = ?scan.phase(), "command");
                match cmd {
                    Some(UiCommand::StartCamera) => {
                        let _ = scan.start_camera().await;
                    }
                    Some(UiCommand::Capture) => {
                        let started = scan.capture().await;
                        in_flight = spawn_analysis(scan, started).or(in_flight);
                    }
                    Some(UiCommand::Upload(path)) => {
                        let started = scan.upload(&path).await;
                        in_flight = spawn_analysis(scan, started).or(in_flight);
                    }
                    Some(UiCommand::Retry) => {
                        let started = scan.retry_analysis();
                        in_flight = spawn_analysis(scan, started).or(in_flight);
                    }
                    Some(UiCommand::CancelCamera) => {
                        let _ = scan.cancel_camera();
                    }
                    Some(UiCommand::Reset) => {
                        let _ = scan.reset();
                    }
                    Some(UiCommand::Status) => {
                        scan.notify(scan.status_line());
                    }
                    Some(UiCommand::Quit) | None => {
                        if in_flight.is_some() {
                            quit_pending = true;
                            scan.notify("Waiting for the analysis to finish…".to_string());
                        } else {
                            break;
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(h) = in_flight.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    in_flight = None;
                    let outcome = match join_res {
                        Ok(outcome) => outcome,
                        Err(e) => Err(AnalysisError::Failed(format!("analysis task failed: {e}"))),
                    };
                    if let Ok(report) = scan.finish_analysis(outcome) {
                        let report = report.clone();
                        let processed = process_scan_completion(post, &report, scan.captured());
                        for msg in processed.messages {
                            scan.notify(msg);
                        }
                    }
                    if quit_pending {
                        break;
                    }
                }
            }
        }
    }

    scan.teardown();
}
