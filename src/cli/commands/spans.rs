//! `spans` command
//!
//! Prints the scroll range each section owns for a given viewport height.

use serde_json::json;

use crate::cli::args::{OutputFormat, SpansArgs};
use crate::config::loader::ConfigLoader;
use crate::config::schema::StageConfig;
use crate::error::ScrollStageError;
use crate::stage::section::SectionRegistry;
use crate::stage::span::ScrollSpan;

/// Print the span layout of a stage.
///
/// # Errors
///
/// Returns a config error if the stage does not load or the viewport is
/// not a positive height.
pub fn run(args: &SpansArgs) -> Result<(), ScrollStageError> {
    super::check_viewport(args.viewport)?;
    let load_result = ConfigLoader::with_defaults().load(&args.config)?;
    super::log_warnings(&load_result.warnings);

    let config = &load_result.config;
    let spans = layout(config, args.viewport);

    match args.format {
        OutputFormat::Human => {
            println!("stage: {} (viewport {})", config.stage.name, args.viewport);
            println!("{:>3} {:>10} {:>10} {:>8}  title", "#", "start", "end", "length");
            for (span, section) in spans.iter().zip(&config.sections) {
                println!(
                    "{:>3} {:>10.1} {:>10.1} {:>8.1}  {}",
                    span.section,
                    span.start,
                    span.end,
                    span.len(),
                    section.title
                );
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = spans
                .iter()
                .zip(&config.sections)
                .map(|(span, section)| {
                    json!({
                        "section": span.section,
                        "title": section.title,
                        "start": span.start,
                        "end": span.end,
                    })
                })
                .collect();
            let doc = json!({
                "stage": config.stage.name,
                "viewport": args.viewport,
                "total_length": spans.last().map_or(0.0, |s| s.end),
                "spans": rows,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}

fn layout(config: &StageConfig, viewport: f64) -> Vec<ScrollSpan> {
    let registry = SectionRegistry::new(config.sections.clone());
    config
        .layout
        .span_layout()
        .compute(&registry.distance_overrides(), viewport)
}
