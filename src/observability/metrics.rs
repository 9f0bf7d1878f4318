//! Metrics collection.
//!
//! Prometheus-compatible metrics with typed recording helpers. Every helper
//! is a no-op until [`init_metrics`] installs a recorder.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ScrollStageError;
use crate::stage::pin::PinChange;
use crate::stage::trigger::Direction;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`; otherwise the recorder is installed without an
/// endpoint.
///
/// # Errors
///
/// Returns `ScrollStageError::Io` if the recorder or listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), ScrollStageError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| ScrollStageError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "scrollstage_boundary_crossings_total",
        "Boundary crossings by direction"
    );
    describe_counter!(
        "scrollstage_overlays_fired_total",
        "Overlay activations accepted by the cooldown"
    );
    describe_counter!(
        "scrollstage_overlays_suppressed_total",
        "Overlay requests dropped by the cooldown"
    );
    describe_counter!("scrollstage_pin_changes_total", "Pin acquisitions and releases");
    describe_gauge!(
        "scrollstage_active_section",
        "Index of the active section (-1 before the stage, section count after it)"
    );
    describe_counter!(
        "scrollstage_spans_recomputed_total",
        "Span recomputations after resize"
    );
    describe_counter!("scrollstage_mounts_total", "Stage mounts");
    describe_gauge!(
        "scrollstage_triggers_registered",
        "Boundary triggers currently registered"
    );
}

/// Records a boundary crossing.
pub fn record_crossing(direction: Direction) {
    counter!("scrollstage_boundary_crossings_total", "direction" => direction.as_str())
        .increment(1);
}

/// Records an accepted overlay.
pub fn record_overlay_fired() {
    counter!("scrollstage_overlays_fired_total").increment(1);
}

/// Records an overlay request dropped by the cooldown.
pub fn record_overlay_suppressed() {
    counter!("scrollstage_overlays_suppressed_total").increment(1);
}

/// Records a pin acquisition or release.
pub fn record_pin_change(change: &PinChange) {
    let kind = match change {
        PinChange::Acquired { .. } => "acquired",
        PinChange::Released { .. } => "released",
    };
    counter!("scrollstage_pin_changes_total", "kind" => kind).increment(1);
}

/// Sets the active section gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_section(value: i64) {
    gauge!("scrollstage_active_section").set(value as f64);
}

/// Records a span recomputation.
pub fn record_spans_recomputed() {
    counter!("scrollstage_spans_recomputed_total").increment(1);
}

/// Records a mount.
pub fn record_mount() {
    counter!("scrollstage_mounts_total").increment(1);
}

/// Sets the registered trigger gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_triggers_registered(count: usize) {
    gauge!("scrollstage_triggers_registered").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::pin::PinEdge;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_crossing(Direction::Forward);
        record_crossing(Direction::Backward);
        record_overlay_fired();
        record_overlay_suppressed();
        record_pin_change(&PinChange::Acquired {
            section: 1,
            local_progress: 0.0,
        });
        record_pin_change(&PinChange::Released {
            section: 1,
            edge: PinEdge::End,
        });
        set_active_section(-1);
        record_spans_recomputed();
        record_mount();
        set_triggers_registered(4);
    }

    #[test]
    fn init_metrics_is_idempotent() {
        assert!(init_metrics(None).is_ok());
        assert!(init_metrics(None).is_ok());
    }
}
