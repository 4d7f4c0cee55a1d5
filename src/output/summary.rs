use std::fmt::Write;

use comfy_table::Cell;

use crate::notes::ReleaseNotes;
use crate::stages::{PipelineReport, StageRunReport};

use super::styling::{blue_bold, bright, dim};
use super::tables::{create_table, cyan_header, outcome_cell};

/// Prints the per-pipeline outcome table for an `add-stage` run to stderr.
pub fn print_stage_summary(report: &StageRunReport) {
    eprintln!("{}", render_stage_summary(report));
}

pub fn render_stage_summary(report: &StageRunReport) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🚀", "Stage Injection");

    let _ = writeln!(
        output,
        "  {} {}  {} '{}' → '{}'{}",
        dim("Project:"),
        report.project,
        dim("Plan:"),
        report.plan.source,
        report.plan.target,
        if report.dry_run { " (dry run)" } else { "" }
    );

    if report.pipelines.is_empty() {
        let _ = writeln!(output, "  {}", dim("No classic release pipelines processed"));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["ID", "Pipeline", "Stages", "Result"]));
    for pipeline in &report.pipelines {
        table.add_row(pipeline_row(pipeline));
    }
    let _ = writeln!(output, "{table}");

    let failures = report.failures();
    if failures > 0 {
        let _ = writeln!(output, "  {} pipeline(s) failed", blue_bold(failures));
    }

    output
}

/// Prints counts for a release notes run to stderr.
pub fn print_notes_summary(notes: &ReleaseNotes) {
    let mut output = String::new();
    add_section_header(&mut output, "📝", "Release Notes");
    let _ = writeln!(output, "  {} {}", dim("Branch:"), notes.branch);
    let _ = writeln!(output, "  {} {}", dim("Since:"), notes.reference);
    let _ = writeln!(
        output,
        "  {} commits, {} work items, {} pull requests",
        blue_bold(notes.commit_count),
        blue_bold(notes.work_items.len()),
        blue_bold(notes.pull_requests.len())
    );
    eprintln!("{output}");
}

fn pipeline_row(pipeline: &PipelineReport) -> Vec<Cell> {
    vec![
        Cell::new(pipeline.pipeline_id),
        Cell::new(&pipeline.name),
        Cell::new(pipeline.stages.join(" → ")),
        outcome_cell(&pipeline.outcome),
    ]
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{PipelineOutcome, StagePlan};
    use chrono::Utc;

    fn report(pipelines: Vec<PipelineReport>) -> StageRunReport {
        StageRunReport {
            project: "web".to_string(),
            processed_at: Utc::now(),
            plan: StagePlan {
                source: "Pre-Prod".to_string(),
                target: "PROD".to_string(),
                approver: None,
            },
            dry_run: false,
            pipelines,
        }
    }

    #[test]
    fn test_render_stage_summary_lists_pipelines() {
        let rendered = render_stage_summary(&report(vec![
            PipelineReport {
                pipeline_id: 4,
                name: "checkout-api".to_string(),
                stages: vec!["Pre-Prod".to_string(), "PROD".to_string()],
                outcome: PipelineOutcome::Updated,
            },
            PipelineReport {
                pipeline_id: 5,
                name: "search".to_string(),
                stages: vec![],
                outcome: PipelineOutcome::UpdateFailed("status 400".to_string()),
            },
        ]));

        assert!(rendered.contains("checkout-api"));
        assert!(rendered.contains("Pre-Prod → PROD"));
        assert!(rendered.contains("update failed"));
        assert!(rendered.contains("pipeline(s) failed"));
    }

    #[test]
    fn test_render_stage_summary_without_pipelines() {
        let rendered = render_stage_summary(&report(vec![]));
        assert!(rendered.contains("No classic release pipelines processed"));
    }
}
