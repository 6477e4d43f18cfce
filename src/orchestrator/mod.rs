//! Application-level orchestration utilities.
//!
//! This module owns the scan lifecycle (camera, capture, analysis, reset), the command
//! loop that drives it, and post-scan processing such as exports. UI/CLI layers call into
//! this module to keep responsibilities separated.

mod controller;
mod lifecycle;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use lifecycle::ScanController;
pub(crate) use post_process::{process_scan_completion, PostProcess};
