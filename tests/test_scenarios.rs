//! End-to-end stage behavior through the public library API.

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;

use scrollstage::config::schema::EffectConfig;
use scrollstage::stage::trigger::{TriggerCallbacks, TriggerSpec};
use scrollstage::stage::{
    Direction, EffectBroadcaster, HeadlessHost, Phase, PinChange, ScrollHost, ScrollPosition,
    ScrollProgressMapper, SpanLayout, TriggerRegistry,
};

use common::{orchestrator, stage_config};

fn five_spans() -> ScrollProgressMapper {
    let layout = stage_config(5).layout.span_layout();
    ScrollProgressMapper::new(layout.uniform(5, 900.0))
}

// ============================================================================
// Mapping and phases
// ============================================================================

#[test]
fn offset_800_holds_the_first_section_at_half() {
    let mapper = five_spans();
    let position = mapper.map(800.0);
    assert_eq!(position.active_section(), Some(0));
    assert!((position.local_progress().unwrap() - 0.5).abs() < 1e-9);

    let mut stage = orchestrator(stage_config(5), &[]);
    stage.mount(900.0, 0.0);
    let frame = stage.on_scroll(800.0, Instant::now()).unwrap();
    assert_eq!(frame.phases[0].phase, Phase::Holding);
    assert!(frame.phases[1..].iter().all(|s| s.phase == Phase::Before));

    // Spans start at zero, so the first span is index 0; index 1 is
    // half way at 2400.
    let position = mapper.map(2400.0);
    assert_eq!(position.active_section(), Some(1));
    assert!((position.local_progress().unwrap() - 0.5).abs() < 1e-9);
    let frame = stage.on_scroll(2400.0, Instant::now()).unwrap();
    assert_eq!(frame.phases[1].phase, Phase::Holding);
}

#[test]
fn ten_percent_into_section_one_is_entering() {
    let mut stage = orchestrator(stage_config(5), &[]);
    stage.mount(900.0, 0.0);
    let frame = stage.on_scroll(1760.0, Instant::now()).unwrap();

    assert_eq!(frame.active_section(), Some(1));
    let state = frame.phases[1];
    assert_eq!(state.phase, Phase::Entering);
    assert!((state.local_progress - 0.10).abs() < 1e-9);

    let active = frame.active.expect("active section frame");
    assert_eq!(active.section, 1);
    assert!((active.text.opacity - 0.5).abs() < 1e-9);
    assert_eq!(frame.phases[0].phase, Phase::After);
}

#[test]
fn before_first_span_is_pre_hero() {
    let mut config = stage_config(3);
    config.layout.lead_in = 400.0;
    let mut stage = orchestrator(config, &[]);
    stage.mount(900.0, 0.0);

    let frame = stage.on_scroll(100.0, Instant::now()).unwrap();
    assert_eq!(frame.position, ScrollPosition::PreHero);
    assert!(frame.active_section().is_none());
    assert!(frame.active.is_none());
    assert!(frame.phases.iter().all(|s| s.phase == Phase::Before));
    assert!(frame.pinned.is_none());
}

#[test]
fn past_the_last_span_is_final() {
    let mut stage = orchestrator(stage_config(3), &[]);
    stage.mount(900.0, 0.0);
    let frame = stage.on_scroll(1.0e6, Instant::now()).unwrap();
    assert_eq!(frame.position, ScrollPosition::Final);
    assert!(frame.phases.iter().all(|s| s.phase == Phase::After));
}

// ============================================================================
// Overlay debounce
// ============================================================================

#[test]
fn rapid_reentry_fires_once_per_cooldown() {
    let mut effects = EffectBroadcaster::new(EffectConfig::default());
    let t0 = Instant::now();

    assert!(effects.notify_enter(2, t0).is_some());
    assert!(effects.notify_enter(2, t0 + Duration::from_millis(500)).is_none());
    assert!(effects.notify_enter(2, t0 + Duration::from_millis(1000)).is_some());
    assert_eq!(effects.fired(), 2);
    assert_eq!(effects.suppressed(), 1);
}

#[test]
fn boundaries_do_not_share_cooldown() {
    let mut effects = EffectBroadcaster::new(EffectConfig::default());
    let t0 = Instant::now();
    assert!(effects.notify_enter(1, t0).is_some());
    assert!(effects.notify_enter(2, t0 + Duration::from_millis(10)).is_some());
}

#[test]
fn cooldown_does_not_survive_remount() {
    let mut stage = orchestrator(stage_config(3), &[]);
    let t0 = Instant::now();

    stage.mount(900.0, 0.0);
    let frame = stage.on_scroll(1700.0, t0).unwrap();
    assert_eq!(frame.overlays_fired, vec![1]);

    stage.unmount();
    stage.mount(900.0, 0.0);
    let frame = stage.on_scroll(1700.0, t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(frame.overlays_fired, vec![1]);
}

// ============================================================================
// Mount lifecycle
// ============================================================================

#[test]
fn empty_stage_mounts_and_tears_down() {
    let mut stage = orchestrator(stage_config(0), &[]);
    let summary = stage.mount(900.0, 0.0);
    assert_eq!(summary.triggers, 0);
    assert!(summary.spans.is_empty());

    let frame = stage.on_scroll(500.0, Instant::now()).unwrap();
    assert!(frame.crossings.is_empty());
    assert!(stage.unmount());
    assert!(!stage.unmount());

    let mut registry = TriggerRegistry::new();
    assert_eq!(registry.teardown_all(), 0);
    assert_eq!(registry.teardown_all(), 0);
}

#[test]
fn single_section_has_no_boundaries() {
    let mut stage = orchestrator(stage_config(1), &[]);
    let summary = stage.mount(900.0, 0.0);
    assert_eq!(summary.triggers, 0);
    let frame = stage.on_scroll(800.0, Instant::now()).unwrap();
    assert_eq!(frame.active_section(), Some(0));
    assert!(frame.pinned.is_none());
}

#[test]
fn missing_target_is_skipped_not_fatal() {
    let mut stage = orchestrator(stage_config(4), &[2]);
    let summary = stage.mount(900.0, 0.0);
    assert_eq!(summary.skipped, vec![2]);
    assert_eq!(summary.triggers, 2);

    let frame = stage.on_scroll(3300.0, Instant::now()).unwrap();
    assert_eq!(frame.active_section(), Some(2));
    assert!(frame.crossings.iter().all(|c| c.section != 2));
    assert!(frame.pinned.is_none());
    assert!(!stage.host().has_target(2));
}

#[test]
fn remount_does_not_leak_triggers() {
    let mut stage = orchestrator(stage_config(4), &[]);
    for _ in 0..3 {
        stage.mount(900.0, 0.0);
        assert_eq!(stage.trigger_count(), 3);
    }
    let frame = stage.on_scroll(1700.0, Instant::now()).unwrap();
    assert_eq!(frame.crossings.len(), 1);
}

// ============================================================================
// Crossings and pins
// ============================================================================

#[test]
fn fast_scroll_delivers_every_skipped_crossing_in_order() {
    let mut stage = orchestrator(stage_config(5), &[]);
    stage.mount(900.0, 0.0);
    let t0 = Instant::now();

    let frame = stage.on_scroll(7000.0, t0).unwrap();
    let sections: Vec<_> = frame.crossings.iter().map(|c| c.section).collect();
    assert_eq!(sections, vec![1, 2, 3, 4]);
    assert!(frame.crossings.iter().all(|c| c.direction == Direction::Forward));

    let frame = stage.on_scroll(0.0, t0 + Duration::from_secs(5)).unwrap();
    let sections: Vec<_> = frame.crossings.iter().map(|c| c.section).collect();
    assert_eq!(sections, vec![4, 3, 2, 1]);
    assert!(frame.crossings.iter().all(|c| c.direction == Direction::Backward));
}

#[test]
fn reentry_repins_with_current_progress() {
    let mut stage = orchestrator(stage_config(4), &[]);
    stage.mount(900.0, 0.0);
    let t0 = Instant::now();

    stage.on_scroll(2000.0, t0).unwrap();
    assert_eq!(stage.host().pinned(), Some(1));

    let frame = stage.on_scroll(3300.0, t0 + Duration::from_secs(1)).unwrap();
    assert_eq!(frame.pinned, Some(2));

    let frame = stage.on_scroll(2800.0, t0 + Duration::from_secs(2)).unwrap();
    assert_eq!(frame.pinned, Some(1));
    let acquired = frame.pin_changes.iter().find_map(|c| match c {
        PinChange::Acquired {
            section,
            local_progress,
        } => Some((*section, *local_progress)),
        PinChange::Released { .. } => None,
    });
    let (section, progress) = acquired.expect("pin reacquired");
    assert_eq!(section, 1);
    assert!((progress - 0.75).abs() < 1e-9);
}

#[test]
fn teardown_silences_every_callback() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = TriggerRegistry::new();
    for section in 1..4 {
        let sink = Rc::clone(&log);
        registry.register(
            TriggerSpec {
                section,
                start: 1600.0 * section as f64,
                pinned: true,
            },
            TriggerCallbacks::new().on_enter(move |c| sink.borrow_mut().push(c.section)),
        );
    }
    registry.observe(0.0);
    assert_eq!(registry.observe(5000.0), 3);
    assert_eq!(registry.teardown_all(), 3);

    registry.observe(0.0);
    assert_eq!(registry.observe(6000.0), 0);
    assert_eq!(*log.borrow(), vec![1, 2, 3]);
}

#[test]
fn resize_keeps_old_spans_until_settled() {
    let mut config = stage_config(3);
    config.layout.span_viewports = Some(2.0);
    let mut stage = orchestrator(config, &[]);
    stage.mount(800.0, 0.0);
    assert!((stage.spans()[1].start - 1600.0).abs() < f64::EPSILON);

    stage.on_resize(1000.0);
    assert!(stage.spans_stale());
    assert!((stage.spans()[1].start - 1600.0).abs() < f64::EPSILON);

    let spans = stage.on_resize_settled().unwrap();
    assert!(!stage.spans_stale());
    assert!((spans[1].start - 2000.0).abs() < f64::EPSILON);

    let frame = stage.on_scroll(1800.0, Instant::now()).unwrap();
    assert_eq!(frame.active_section(), Some(0));
}

#[test]
fn headless_host_records_pin_calls() {
    let mut host = HeadlessHost::new();
    let span = SpanLayout::default().uniform(2, 900.0)[1];
    host.pin(1, &span);
    host.unpin(1);
    assert_eq!(host.calls().len(), 2);
    assert_eq!(host.pin_count(), 1);
    assert!(host.pinned().is_none());
}
