//! Post-scan processing utilities.
//!
//! Handles image embedding, image saving and JSON export after a scan completes.

use super::lifecycle::CapturedImage;
use crate::model::ScanReport;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Output options applied to every completed scan.
#[derive(Debug, Clone, Default)]
pub(crate) struct PostProcess {
    pub export_json: Option<PathBuf>,
    pub save_image: Option<PathBuf>,
    pub embed_image: bool,
}

/// Result of post-scan processing, ready for presentation layers.
pub(crate) struct ProcessedScan {
    pub report: ScanReport,
    pub messages: Vec<String>,
}

/// Process a completed scan: optionally embed the image, save it, and export the report.
pub(crate) fn process_scan_completion(
    post: &PostProcess,
    report: &ScanReport,
    captured: Option<&CapturedImage>,
) -> ProcessedScan {
    let mut report = report.clone();
    let mut messages = Vec::new();

    if post.embed_image {
        report.image_data_url = captured.map(|c| c.image.to_data_url());
    }

    if let Some(path) = post.save_image.as_deref() {
        match captured {
            Some(c) => match save_image(path, &c.image.bytes) {
                Ok(()) => messages.push(format!("Saved image: {}", path.display())),
                Err(e) => messages.push(format!("Save image failed: {e:#}")),
            },
            None => messages.push("Save image skipped: no captured image".to_string()),
        }
    }

    if let Some(path) = post.export_json.as_deref() {
        match export_json(path, &report) {
            Ok(()) => messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedScan { report, messages }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    Ok(())
}

fn save_image(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, bytes).with_context(|| format!("write image {}", path.display()))
}

pub(crate) fn export_json(path: &Path, report: &ScanReport) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(report).context("serialize scan report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))
}
