#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use scrollstage::config::schema::StageConfig;
use scrollstage::simulation::{self, ScrollTrace};
use scrollstage::stage::{HeadlessHost, Orchestrator, Section};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(trace) = ScrollTrace::from_yaml(text) else {
        return;
    };
    // Keep replays bounded
    if trace.steps.len() > 512 {
        return;
    }

    let sections = (0..5).map(|i| Section::titled(format!("Section {i}"))).collect();
    let config = Arc::new(StageConfig::with_sections("fuzz", sections));
    let mut stage = Orchestrator::new(config, HeadlessHost::with_missing([2]));
    let _ = simulation::run(&mut stage, &trace);
});
