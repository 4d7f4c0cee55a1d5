use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::stages::PipelineOutcome;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn outcome_cell(outcome: &PipelineOutcome) -> Cell {
    let cell = Cell::new(outcome.label());
    match outcome {
        PipelineOutcome::Updated => cell.fg(TableColor::Green),
        PipelineOutcome::DryRun => cell.fg(TableColor::Cyan),
        PipelineOutcome::SourceStageMissing | PipelineOutcome::TargetStageExists => {
            cell.fg(TableColor::Yellow)
        }
        PipelineOutcome::FetchFailed(_) | PipelineOutcome::UpdateFailed(_) => {
            cell.fg(TableColor::Red)
        }
    }
}
