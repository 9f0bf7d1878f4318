//! Shared integration-test helpers: fixture paths, a binary runner and
//! stage builders.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use scrollstage::config::schema::StageConfig;
use scrollstage::stage::{HeadlessHost, Orchestrator, Section};

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs the `scrollstage` binary to completion.
#[allow(clippy::missing_panics_doc)]
pub fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scrollstage"))
        .args(args)
        .env_remove("SCROLLSTAGE_CONFIG")
        .env_remove("SCROLLSTAGE_LOG_LEVEL")
        .output()
        .expect("failed to spawn scrollstage")
}

/// A stage of `count` untitled sections with default tunables
/// (1600-unit spans, no lead-in, 0.2/0.8 windows, 900 ms cooldown).
pub fn stage_config(count: usize) -> StageConfig {
    let sections = (0..count)
        .map(|i| Section::titled(format!("Section {i}")))
        .collect();
    StageConfig::with_sections("test", sections)
}

/// Mounted-ready orchestrator over a headless host with `missing` targets.
pub fn orchestrator(
    config: StageConfig,
    missing: &[usize],
) -> Orchestrator<HeadlessHost> {
    Orchestrator::new(
        Arc::new(config),
        HeadlessHost::with_missing(missing.iter().copied()),
    )
}
