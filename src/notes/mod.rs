mod collect;
mod history;
mod publish;
mod render;

pub use collect::NotesCollector;
pub use history::resolve_reference_point;
pub use publish::{publish, report_targets, write_reports, GitIdentity, PublishOutcome};
pub use render::ReleaseNotes;

const HEADS_PREFIX: &str = "refs/heads/";

/// A branch known both by its full ref and its short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    full: String,
}

impl BranchRef {
    /// Accepts `refs/heads/release/v1` or `release/v1`.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let full = if name.starts_with("refs/") {
            name.to_owned()
        } else {
            format!("{HEADS_PREFIX}{name}")
        };
        Self { full }
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn short(&self) -> &str {
        self.full.strip_prefix(HEADS_PREFIX).unwrap_or(&self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_ref_from_full_name() {
        let branch = BranchRef::new("refs/heads/release/v1.1.0");
        assert_eq!(branch.full(), "refs/heads/release/v1.1.0");
        assert_eq!(branch.short(), "release/v1.1.0");
    }

    #[test]
    fn test_branch_ref_from_short_name() {
        let branch = BranchRef::new("main");
        assert_eq!(branch.full(), "refs/heads/main");
        assert_eq!(branch.short(), "main");
    }
}
