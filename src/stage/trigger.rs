//! Boundary triggers
//!
//! An explicit, instance-owned registry of scroll boundary triggers. Each
//! trigger watches the start offset of one section and fires `on_enter`
//! when the scroll crosses it forward and `on_enter_back` when it crosses
//! it backward, exactly once per crossing.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, trace};

// ============================================================================
// Types
// ============================================================================

/// Direction of a boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Scrolling down past the boundary
    Forward,
    /// Scrolling up past the boundary
    Backward,
}

impl Direction {
    /// Label used for metrics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// A single dispatched crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryCrossing {
    /// Section whose start boundary was crossed
    pub section: usize,
    /// Boundary offset
    pub boundary: f64,
    /// Crossing direction
    pub direction: Direction,
    /// Whether the section is pinned while active
    pub pinned: bool,
}

/// Opaque reference to a registered trigger.
///
/// Handles from before a [`TriggerRegistry::teardown_all`] are stale and
/// ignored by [`TriggerRegistry::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerHandle {
    id: u64,
    generation: u64,
}

impl TriggerHandle {
    /// Registry generation the handle belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a trigger watches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerSpec {
    /// Section index
    pub section: usize,
    /// Boundary offset (the section's span start)
    pub start: f64,
    /// Whether the section pins while active
    pub pinned: bool,
}

/// Boxed crossing callback.
pub type TriggerCallback = Box<dyn FnMut(&BoundaryCrossing)>;

/// Callbacks for one trigger; either side may be absent.
#[derive(Default)]
pub struct TriggerCallbacks {
    on_enter: Option<TriggerCallback>,
    on_enter_back: Option<TriggerCallback>,
}

impl TriggerCallbacks {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the forward-crossing callback.
    #[must_use]
    pub fn on_enter(mut self, callback: impl FnMut(&BoundaryCrossing) + 'static) -> Self {
        self.on_enter = Some(Box::new(callback));
        self
    }

    /// Sets the backward-crossing callback.
    #[must_use]
    pub fn on_enter_back(mut self, callback: impl FnMut(&BoundaryCrossing) + 'static) -> Self {
        self.on_enter_back = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for TriggerCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_enter_back", &self.on_enter_back.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct Trigger {
    id: u64,
    spec: TriggerSpec,
    callbacks: TriggerCallbacks,
}

impl Trigger {
    fn dispatch(&mut self, direction: Direction) {
        let crossing = BoundaryCrossing {
            section: self.spec.section,
            boundary: self.spec.start,
            direction,
            pinned: self.spec.pinned,
        };
        let callback = match direction {
            Direction::Forward => self.callbacks.on_enter.as_mut(),
            Direction::Backward => self.callbacks.on_enter_back.as_mut(),
        };
        if let Some(callback) = callback {
            callback(&crossing);
        }
    }
}

// ============================================================================
// TriggerRegistry
// ============================================================================

/// Owns every boundary trigger of one orchestrator.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
    next_id: u64,
    generation: u64,
    last_offset: Option<f64>,
}

impl TriggerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Whether no triggers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Current generation; bumped by every non-empty teardown.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Last observed offset.
    #[must_use]
    pub const fn last_offset(&self) -> Option<f64> {
        self.last_offset
    }

    /// Sections with a live trigger, in registration order.
    #[must_use]
    pub fn sections(&self) -> Vec<usize> {
        self.triggers.iter().map(|t| t.spec.section).collect()
    }

    /// Registers a trigger.
    pub fn register(&mut self, spec: TriggerSpec, callbacks: TriggerCallbacks) -> TriggerHandle {
        let id = self.next_id;
        self.next_id += 1;
        trace!(section = spec.section, start = spec.start, id, "trigger registered");
        self.triggers.push(Trigger {
            id,
            spec,
            callbacks,
        });
        TriggerHandle {
            id,
            generation: self.generation,
        }
    }

    /// Removes one trigger. Returns `false` for unknown or stale handles.
    pub fn unregister(&mut self, handle: TriggerHandle) -> bool {
        if handle.generation != self.generation {
            return false;
        }
        let before = self.triggers.len();
        self.triggers.retain(|t| t.id != handle.id);
        before != self.triggers.len()
    }

    /// Removes every trigger and forgets the baseline.
    ///
    /// Returns the number of triggers removed. A no-op on an empty registry.
    pub fn teardown_all(&mut self) -> usize {
        if self.triggers.is_empty() {
            self.last_offset = None;
            return 0;
        }
        let removed = self.triggers.len();
        self.triggers.clear();
        self.generation += 1;
        self.last_offset = None;
        debug!(removed, generation = self.generation, "triggers torn down");
        removed
    }

    /// Moves the boundary of every trigger watching `section`.
    ///
    /// See [`Self::move_boundaries`]. Returns the number of crossings.
    pub fn update_boundary(&mut self, section: usize, start: f64) -> usize {
        self.move_boundaries([(section, start)])
    }

    /// Moves boundaries as `(section, start)` pairs.
    ///
    /// A boundary that moves to the other side of the last observed offset
    /// counts as crossed: moving to or below it dispatches `on_enter`,
    /// moving above it dispatches `on_enter_back`. Without a baseline
    /// nothing dispatches. Returns the number of crossings.
    pub fn move_boundaries(&mut self, moves: impl IntoIterator<Item = (usize, f64)>) -> usize {
        let last = self.last_offset;
        let mut forward = Vec::new();
        let mut backward = Vec::new();

        for (section, start) in moves {
            for (index, trigger) in self.triggers.iter_mut().enumerate() {
                if trigger.spec.section != section {
                    continue;
                }
                let old = std::mem::replace(&mut trigger.spec.start, start);
                let Some(last) = last else {
                    continue;
                };
                if old > last && start <= last {
                    forward.push(index);
                } else if old <= last && start > last {
                    backward.push(index);
                }
            }
        }

        let triggers = &self.triggers;
        forward.sort_by(|&a, &b| crossing_order(&triggers[a].spec, &triggers[b].spec));
        backward.sort_by(|&a, &b| crossing_order(&triggers[b].spec, &triggers[a].spec));

        let mut dispatched = 0;
        for (indices, direction) in [(backward, Direction::Backward), (forward, Direction::Forward)] {
            for index in indices {
                let trigger = &mut self.triggers[index];
                debug!(
                    section = trigger.spec.section,
                    direction = direction.as_str(),
                    "boundary moved across offset"
                );
                trigger.dispatch(direction);
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Feeds a new scroll offset and dispatches every crossing since the
    /// previous one.
    ///
    /// The first observed offset only sets the baseline. Crossings of a
    /// multi-boundary jump dispatch in the order the scroll passed them.
    /// `NaN` offsets are ignored. Returns the number of crossings.
    pub fn observe(&mut self, offset: f64) -> usize {
        if offset.is_nan() {
            return 0;
        }
        let Some(previous) = self.last_offset.replace(offset) else {
            return 0;
        };

        let direction = if offset > previous {
            Direction::Forward
        } else if offset < previous {
            Direction::Backward
        } else {
            return 0;
        };

        let mut crossed: Vec<usize> = self
            .triggers
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                let start = t.spec.start;
                match direction {
                    Direction::Forward => previous < start && start <= offset,
                    Direction::Backward => offset < start && start <= previous,
                }
            })
            .map(|(i, _)| i)
            .collect();

        crossed.sort_by(|&a, &b| {
            let order = crossing_order(&self.triggers[a].spec, &self.triggers[b].spec);
            match direction {
                Direction::Forward => order,
                Direction::Backward => order.reverse(),
            }
        });

        for &index in &crossed {
            let trigger = &mut self.triggers[index];
            debug!(
                section = trigger.spec.section,
                direction = direction.as_str(),
                "boundary crossed"
            );
            trigger.dispatch(direction);
        }

        crossed.len()
    }
}

/// Ascending boundary order; ties break on section index.
fn crossing_order(a: &TriggerSpec, b: &TriggerSpec) -> Ordering {
    a.start.total_cmp(&b.start).then(a.section.cmp(&b.section))
}
