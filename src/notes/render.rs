use std::fmt::Write;

use serde::Serialize;

use super::history::ReferencePoint;
use crate::azure::types::{PullRequest, WorkItem};

pub const NO_WORK_ITEMS: &str = "No work items found.";
pub const NO_PULL_REQUESTS: &str = "No pull requests found.";

/// Everything that goes into the report, already deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseNotes {
    pub branch: String,
    pub reference: ReferencePoint,
    pub commit_count: usize,
    pub work_items: Vec<WorkItem>,
    pub pull_requests: Vec<PullRequest>,
}

impl ReleaseNotes {
    pub fn render(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# Release Notes for Branch: {}\n", self.branch);
        let _ = writeln!(output, "## Changes since {}\n", self.reference);

        output.push_str("### Associated Work Items\n");
        if self.work_items.is_empty() {
            let _ = writeln!(output, "{NO_WORK_ITEMS}");
        }
        for item in &self.work_items {
            let _ = writeln!(
                output,
                "- {}: {} ({})",
                item.id, item.fields.title, item.fields.work_item_type
            );
        }

        output.push_str("\n### Associated Pull Requests\n");
        if self.pull_requests.is_empty() {
            let _ = writeln!(output, "{NO_PULL_REQUESTS}");
        }
        for pr in &self.pull_requests {
            let _ = writeln!(output, "- PR {}: {}", pr.pull_request_id, pr.title);
        }

        output
    }
}
