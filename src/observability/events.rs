//! Structured event stream.
//!
//! Discrete, typed stage events serialized as newline-delimited JSON
//! (JSONL), each carrying a monotonically increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stage::pin::PinEdge;
use crate::stage::trigger::Direction;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted while a stage runs.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StageEvent {
    /// The stage was mounted.
    Mounted {
        /// When mounting finished.
        timestamp: DateTime<Utc>,
        /// Mount identifier.
        mount_id: String,
        /// Stage name from configuration.
        stage: String,
        /// Number of sections.
        sections: usize,
        /// Number of boundary triggers registered.
        triggers: usize,
        /// Viewport height used for span layout.
        viewport: f64,
    },

    /// The stage was unmounted.
    Unmounted {
        /// When teardown finished.
        timestamp: DateTime<Utc>,
        /// Mount identifier.
        mount_id: String,
        /// Triggers removed by teardown.
        triggers_removed: usize,
    },

    /// A section boundary was crossed.
    BoundaryCrossed {
        /// When the crossing was observed.
        timestamp: DateTime<Utc>,
        /// Section whose start was crossed.
        section: usize,
        /// Crossing direction.
        direction: Direction,
    },

    /// An overlay (flash + sweep) fired.
    OverlayFired {
        /// When the overlay fired.
        timestamp: DateTime<Utc>,
        /// Boundary that fired it.
        boundary: usize,
    },

    /// A section acquired the viewport pin.
    PinAcquired {
        /// When the pin was taken.
        timestamp: DateTime<Utc>,
        /// Pinned section.
        section: usize,
        /// Local progress at acquisition.
        local_progress: f64,
    },

    /// A section released the viewport pin.
    PinReleased {
        /// When the pin was released.
        timestamp: DateTime<Utc>,
        /// Released section.
        section: usize,
        /// Edge the scroll left through.
        edge: PinEdge,
    },

    /// Spans were recomputed after a resize settled.
    SpansRecomputed {
        /// When recomputation finished.
        timestamp: DateTime<Utc>,
        /// New viewport height.
        viewport: f64,
        /// End of the last span.
        total_length: f64,
    },

    /// A section was skipped because its host target is missing.
    TargetSkipped {
        /// When the section was skipped.
        timestamp: DateTime<Utc>,
        /// Skipped section.
        section: usize,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps a [`StageEvent`] with a sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: StageEvent,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are dropped; events never abort a run.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: StageEvent) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output.
    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn crossing() -> StageEvent {
        StageEvent::BoundaryCrossed {
            timestamp: DateTime::parse_from_rfc3339("2026-03-01T10:15:30Z")
                .unwrap()
                .with_timezone(&Utc),
            section: 2,
            direction: Direction::Forward,
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_string(&crossing()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "BoundaryCrossed");
        assert_eq!(parsed["direction"], "forward");
        assert_eq!(parsed["section"], 2);
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(crossing());
        emitter.emit(StageEvent::PinReleased {
            timestamp: Utc::now(),
            section: 1,
            edge: PinEdge::End,
        });

        assert_eq!(emitter.event_count(), 2);
        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["edge"], "end");
    }

    #[test]
    fn envelope_flattens_event_fields() {
        let envelope = EventEnvelope {
            sequence: 7,
            event: crossing(),
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(parsed["sequence"], 7);
        assert_eq!(parsed["type"], "BoundaryCrossed");
        assert!(parsed.get("event").is_none());
    }

    #[test]
    fn every_variant_has_a_type_tag() {
        let now = Utc::now();
        let variants = vec![
            StageEvent::Mounted {
                timestamp: now,
                mount_id: "m".to_owned(),
                stage: "demo".to_owned(),
                sections: 5,
                triggers: 4,
                viewport: 900.0,
            },
            StageEvent::Unmounted {
                timestamp: now,
                mount_id: "m".to_owned(),
                triggers_removed: 4,
            },
            crossing(),
            StageEvent::OverlayFired {
                timestamp: now,
                boundary: 2,
            },
            StageEvent::PinAcquired {
                timestamp: now,
                section: 1,
                local_progress: 0.25,
            },
            StageEvent::SpansRecomputed {
                timestamp: now,
                viewport: 700.0,
                total_length: 8000.0,
            },
            StageEvent::TargetSkipped {
                timestamp: now,
                section: 3,
            },
        ];
        for variant in &variants {
            let json = serde_json::to_string(variant).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(parsed.get("type").is_some(), "missing type tag: {json}");
        }
    }
}
