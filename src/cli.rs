use crate::analysis::{AnyAnalyzer, MockAnalyzer, ReplayAnalyzer};
use crate::camera::{AnyCamera, SnapshotCamera, TestPatternCamera};
use crate::decode::ImageFileDecoder;
use crate::error::ScanError;
use crate::model::{FacingMode, ScanConfig, ScanEvent, ScanReport};
use crate::orchestrator::{
    process_scan_completion, run_controller, PostProcess, ScanController, UiCommand,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

type Scanner = ScanController<AnyCamera, ImageFileDecoder, AnyAnalyzer>;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "face-scan",
    version,
    about = "Face capture with a placeholder health analysis (mock results, not medical advice)"
)]
pub struct Cli {
    /// Analyze an image file and exit
    #[arg(long, conflicts_with = "camera")]
    pub upload: Option<PathBuf>,

    /// Capture one frame from the camera, analyze it and exit
    #[arg(long)]
    pub camera: bool,

    /// Time the camera stays live before the frame is captured (with --camera)
    #[arg(long, default_value = "2s")]
    pub capture_after: humantime::Duration,

    /// Print the scan report as JSON (one-shot modes)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print a text summary (one-shot modes, default)
    #[arg(long)]
    pub text: bool,

    /// Snapshot file kept up to date by an external capture tool; test pattern if unset
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Capture from this camera device index (requires the `webcam` feature)
    #[arg(long, conflicts_with = "snapshot")]
    pub device: Option<i32>,

    /// Requested capture width
    #[arg(long)]
    pub width: Option<u32>,

    /// Requested capture height
    #[arg(long)]
    pub height: Option<u32>,

    /// Requested camera facing mode
    #[arg(long, value_enum)]
    pub facing: Option<FacingMode>,

    /// JPEG quality for captured frames (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,

    /// Simulated analysis duration
    #[arg(long)]
    pub analysis_delay: Option<humantime::Duration>,

    /// Seed for the mock analyzer (reproducible results)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Replay a previously exported result instead of sampling the mock table
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Export the scan report as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Save the captured image
    #[arg(long)]
    pub save_image: Option<PathBuf>,

    /// Embed the captured image as a data URL in JSON output and exports
    #[arg(long)]
    pub embed_image: bool,

    /// Configuration file (JSON); defaults to the user config dir if present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    pub write_config: bool,

    /// Log filter used when RUST_LOG is unset (e.g. warn, info, face_scan=debug)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

pub async fn run(args: Cli) -> Result<()> {
    let file_cfg = crate::config::load_layered(args.config.as_deref())?;
    let cfg = build_config(&args, file_cfg);

    if args.write_config {
        let path = args
            .config
            .clone()
            .or_else(crate::config::default_config_path)
            .context("no config directory available; pass --config")?;
        crate::config::save(&cfg, &path)?;
        println!("Wrote config: {}", path.display());
        return Ok(());
    }

    if args.upload.is_some() || args.camera {
        return run_once(args, cfg).await;
    }
    run_interactive(args, cfg).await
}

/// Lifecycle failures reach the user as an `ErrorNotice` through the presenter, so the
/// caller should only set the exit status for them.
pub fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ScanError>().is_some()
}

/// Layer CLI flags over the file configuration.
pub fn build_config(args: &Cli, mut cfg: ScanConfig) -> ScanConfig {
    if let Some(width) = args.width {
        cfg.camera.width = width;
    }
    if let Some(height) = args.height {
        cfg.camera.height = height;
    }
    if let Some(facing) = args.facing {
        cfg.camera.facing = facing;
    }
    if let Some(q) = args.jpeg_quality {
        cfg.jpeg_quality = q;
    }
    if let Some(d) = args.analysis_delay {
        cfg.analysis_delay = Duration::from(d);
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    if args.device.is_some() {
        cfg.device = args.device;
        cfg.snapshot_path = None;
    }
    if args.snapshot.is_some() {
        cfg.snapshot_path = args.snapshot.clone();
    }
    if args.replay.is_some() {
        cfg.replay_path = args.replay.clone();
    }
    cfg
}

fn build_post_process(args: &Cli) -> PostProcess {
    PostProcess {
        export_json: args.export_json.clone(),
        save_image: args.save_image.clone(),
        embed_image: args.embed_image,
    }
}

#[cfg(feature = "webcam")]
fn webcam(device: i32) -> Result<AnyCamera> {
    Ok(AnyCamera::Webcam(crate::camera::OpencvCamera::new(device)))
}

#[cfg(not(feature = "webcam"))]
fn webcam(device: i32) -> Result<AnyCamera> {
    anyhow::bail!("camera device {device} requested, but face-scan was built without the `webcam` feature")
}

fn build_scanner(cfg: &ScanConfig, event_tx: mpsc::UnboundedSender<ScanEvent>) -> Result<Scanner> {
    let (camera, source) = match (cfg.snapshot_path.clone(), cfg.device) {
        (Some(path), _) => (AnyCamera::Snapshot(SnapshotCamera::new(path)), "snapshot"),
        (None, Some(device)) => (webcam(device)?, "webcam"),
        (None, None) => (AnyCamera::TestPattern(TestPatternCamera::new()), "test-pattern"),
    };
    let analyzer = match cfg.replay_path.as_deref() {
        Some(path) => AnyAnalyzer::Replay(ReplayAnalyzer::from_file(cfg.analysis_delay, path)?),
        None => AnyAnalyzer::Mock(MockAnalyzer::new(cfg.analysis_delay, cfg.seed)),
    };
    tracing::info!(
        camera = source,
        delay = ?cfg.analysis_delay,
        "scanner ready"
    );
    Ok(ScanController::new(
        camera,
        ImageFileDecoder,
        analyzer,
        cfg.camera,
        cfg.jpeg_quality,
        event_tx,
    ))
}

/// Render progress events; completion is rendered separately by each mode.
fn render_progress(ev: &ScanEvent) -> Option<String> {
    match ev {
        ScanEvent::PhaseChanged { phase } => Some(format!("== {} ==", phase.label())),
        ScanEvent::Info(info) => Some(info.to_message()),
        ScanEvent::Error(notice) => Some(format!("{}: {}", notice.title, notice.message)),
        ScanEvent::Completed { .. } => None,
    }
}

async fn run_once(args: Cli, cfg: ScanConfig) -> Result<()> {
    let post = build_post_process(&args);
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ScanEvent>();
    let mut scan = build_scanner(&cfg, evt_tx)?;

    let json = args.json && !args.text;
    let progress_tx = out_tx.clone();
    let presenter = tokio::spawn(async move {
        while let Some(ev) = evt_rx.recv().await {
            // JSON mode keeps stderr quiet except for errors.
            if json && !matches!(ev, ScanEvent::Error(_)) {
                continue;
            }
            if let Some(line) = render_progress(&ev) {
                let _ = progress_tx.send(OutputLine::Stderr(line));
            }
        }
    });

    let outcome = match drive_once(&args, &mut scan).await {
        Ok(report) => Ok(process_scan_completion(&post, &report, scan.captured())),
        Err(e) => Err(e),
    };
    // Dropping the scanner releases the camera and closes the event channel.
    drop(scan);
    let _ = presenter.await;

    let res = match outcome {
        Ok(processed) => {
            for msg in processed.messages {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            if json {
                serde_json::to_string_pretty(&processed.report)
                    .map(|out| {
                        let _ = out_tx.send(OutputLine::Stdout(out));
                    })
                    .context("serialize scan report")
            } else {
                for line in crate::text_summary::build_text_summary(&processed.report).lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
                Ok(())
            }
        }
        Err(e) => Err(e),
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn drive_once(args: &Cli, scan: &mut Scanner) -> Result<ScanReport> {
    if let Some(path) = args.upload.as_deref() {
        scan.upload(path).await.context("upload failed")?;
    } else {
        scan.start_camera().await.context("camera failed")?;
        tokio::select! {
            _ = tokio::time::sleep(Duration::from(args.capture_after)) => {}
            _ = tokio::signal::ctrl_c() => {
                scan.cancel_camera()?;
                anyhow::bail!("scan cancelled");
            }
        }
        scan.capture().await.context("capture failed")?;
    }
    let report = scan.analyze().await.context("analysis failed")?;
    Ok(report.clone())
}

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum Input {
    Command(UiCommand),
    Help,
    Empty,
}

const HELP: &str = "Commands:
  start            start the camera
  capture          capture a frame and analyze it
  cancel           stop the camera without capturing
  upload <path>    analyze an image file
  retry            retry a failed analysis on the same image
  reset            start a new scan
  status           show the current phase
  help             show this help
  quit             exit";

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let cmd = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(Input::Empty),
        "help" | "?" => return Ok(Input::Help),
        "start" | "camera" => UiCommand::StartCamera,
        "capture" | "analyze" => UiCommand::Capture,
        "cancel" | "stop" => UiCommand::CancelCamera,
        "upload" if rest.is_empty() => return Err("usage: upload <path>".to_string()),
        "upload" => UiCommand::Upload(PathBuf::from(rest)),
        "retry" => UiCommand::Retry,
        "reset" | "new" => UiCommand::Reset,
        "status" => UiCommand::Status,
        "quit" | "exit" | "q" => UiCommand::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Input::Command(cmd))
}

async fn run_interactive(args: Cli, cfg: ScanConfig) -> Result<()> {
    let post = build_post_process(&args);
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ScanEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let mut scan = build_scanner(&cfg, evt_tx)?;

    let present_tx = out_tx.clone();
    let presenter = tokio::spawn(async move {
        while let Some(ev) = evt_rx.recv().await {
            match &ev {
                ScanEvent::Completed { report } => {
                    for line in crate::text_summary::build_text_summary(report).lines {
                        let _ = present_tx.send(OutputLine::Stdout(line));
                    }
                }
                other => {
                    if let Some(line) = render_progress(other) {
                        let _ = present_tx.send(OutputLine::Stdout(line));
                    }
                }
            }
        }
    });

    let input_tx = out_tx.clone();
    let input_cmd_tx = cmd_tx.clone();
    let input = tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_input(&line) {
                    Ok(Input::Command(cmd)) => {
                        if input_cmd_tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    Ok(Input::Help) => {
                        let _ = input_tx.send(OutputLine::Stdout(HELP.to_string()));
                    }
                    Ok(Input::Empty) => {}
                    Err(msg) => {
                        let _ = input_tx.send(OutputLine::Stderr(msg));
                    }
                },
                Ok(None) => {
                    let _ = input_cmd_tx.send(UiCommand::Quit);
                    break;
                }
                Err(e) => {
                    tracing::warn!("stdin read failed: {e}");
                    let _ = input_cmd_tx.send(UiCommand::Quit);
                    break;
                }
            }
        }
    });

    let signal_cmd_tx = cmd_tx;
    let signals = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_cmd_tx.send(UiCommand::Quit);
        }
    });

    let _ = out_tx.send(OutputLine::Stdout(
        "face-scan: results are placeholders, not medical advice. Type `help` for commands."
            .to_string(),
    ));

    run_controller(&mut scan, &post, cmd_rx).await;

    drop(scan);
    input.abort();
    signals.abort();
    let _ = presenter.await;
    drop(out_tx);
    // Aborted tasks drop their writer handles once they are cancelled.
    let _ = input.await;
    let _ = out_handle.await;
    Ok(())
}
