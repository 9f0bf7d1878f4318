//! `simulate` command
//!
//! Loads a stage, mounts it against a headless host and replays a scroll
//! trace (from a file or an inline offset list) on a virtual clock.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::cli::args::{OutputFormat, SimulateArgs};
use crate::config::loader::ConfigLoader;
use crate::error::ScrollStageError;
use crate::observability::events::EventEmitter;
use crate::simulation::{self, ScrollTrace, SimulationReport};
use crate::stage::host::HeadlessHost;
use crate::stage::orchestrator::Orchestrator;
use crate::stage::pin::PinChange;

/// Replay a scroll trace and print every sampled frame.
///
/// # Errors
///
/// Returns a config error if the stage does not load, an I/O error if the
/// trace, events file or metrics listener cannot be opened, or a stage
/// error if the trace is malformed.
#[allow(clippy::unused_async)] // runs inside the CLI runtime; the metrics listener needs it
pub async fn run(args: &SimulateArgs) -> Result<(), ScrollStageError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    tracing::info!(config = %args.config.display(), "loading stage");
    let load_result = ConfigLoader::with_defaults().load(&args.config)?;
    super::log_warnings(&load_result.warnings);

    let trace = if let Some(ref path) = args.trace {
        tracing::info!(trace = %path.display(), "loading scroll trace");
        ScrollTrace::load(path)?
    } else {
        super::check_viewport(args.viewport)?;
        ScrollTrace::from_offsets(args.viewport, &args.offsets, args.interval)
    };

    let events = if let Some(ref path) = args.events {
        EventEmitter::from_file(path)?
    } else {
        EventEmitter::noop()
    };

    let host = HeadlessHost::with_missing(args.missing.iter().copied());
    let mut stage = Orchestrator::new(load_result.config, host).with_events(Arc::new(events));
    let report = simulation::run(&mut stage, &trace)?;

    match args.format {
        OutputFormat::Human => print!("{}", render_human(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn render_human(report: &SimulationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "stage: {}", report.stage);
    for mount in &report.mounts {
        let _ = writeln!(
            out,
            "mount {}: {} sections, {} triggers{}",
            mount.mount_id,
            mount.sections,
            mount.triggers,
            if mount.skipped.is_empty() {
                String::new()
            } else {
                format!(", skipped {:?}", mount.skipped)
            }
        );
    }

    let _ = writeln!(
        out,
        "{:>5} {:>8} {:>9} {:>8} {:>9} {:>8} {:>7}  events",
        "step", "clock", "offset", "section", "phase", "progress", "pinned"
    );
    for sample in &report.samples {
        let frame = &sample.frame;
        let (section, phase, progress) = frame.active_section().map_or_else(
            || {
                let label = match frame.position {
                    crate::stage::ScrollPosition::PreHero => "pre-hero",
                    _ => "final",
                };
                ("-".to_string(), label.to_string(), "-".to_string())
            },
            |index| {
                let state = frame.phases[index];
                (
                    index.to_string(),
                    state.phase.to_string(),
                    format!("{:.3}", state.local_progress),
                )
            },
        );
        let pinned = frame
            .pinned
            .map_or_else(|| "-".to_string(), |s| s.to_string());

        let mut events = Vec::new();
        for crossing in &frame.crossings {
            events.push(format!(
                "cross {} {}",
                crossing.boundary,
                crossing.direction.as_str()
            ));
        }
        for boundary in &frame.overlays_fired {
            events.push(format!("overlay {boundary}"));
        }
        for change in &frame.pin_changes {
            events.push(match change {
                PinChange::Acquired { section, .. } => format!("pin {section}"),
                PinChange::Released { section, .. } => format!("unpin {section}"),
            });
        }

        let _ = writeln!(
            out,
            "{:>5} {:>6}ms {:>9.1} {:>8} {:>9} {:>8} {:>7}  {}",
            sample.step,
            sample.clock_ms,
            frame.offset,
            section,
            phase,
            progress,
            pinned,
            events.join(", ")
        );
    }

    let totals = &report.totals;
    let _ = writeln!(
        out,
        "totals: {} crossings, {} overlays fired, {} suppressed, {} pins",
        totals.crossings, totals.overlays_fired, totals.overlays_suppressed, totals.pin_acquisitions
    );
    out
}
