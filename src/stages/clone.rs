use serde::Serialize;

use crate::azure::types::{ApprovalBlock, Environment};

/// Which stage to copy, what to call the copy, and who signs it off.
#[derive(Debug, Clone, Serialize)]
pub struct StagePlan {
    pub source: String,
    pub target: String,
    pub approver: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// The clone now sits at `index` in the stage list.
    Inserted { index: usize },
    SourceMissing,
    TargetExists,
}

impl StagePlan {
    pub fn approval_block(&self) -> ApprovalBlock {
        match self.approver.as_deref().map(str::trim) {
            Some(approver) if !approver.is_empty() => ApprovalBlock::manual(approver),
            _ => ApprovalBlock::automated(),
        }
    }

    /// Clones the source stage into a new stage right after it and re-ranks
    /// the whole list. `environments` is left untouched unless the result is
    /// `Inserted`.
    pub fn apply(&self, environments: &mut Vec<Environment>) -> Insertion {
        let Some(source_index) = environments.iter().position(|env| env.is_named(&self.source))
        else {
            return Insertion::SourceMissing;
        };

        if environments.iter().any(|env| env.is_named(&self.target)) {
            return Insertion::TargetExists;
        }

        let mut stage = environments[source_index].clone();
        stage.name = self.target.clone();
        // id 0 makes the service allocate a new environment
        stage.id = 0;
        stage.pre_deploy_approvals = Some(self.approval_block());

        let index = source_index + 1;
        environments.insert(index, stage);
        rerank(environments);

        Insertion::Inserted { index }
    }
}

/// Assigns ranks 1..=n in list order.
pub fn rerank(environments: &mut [Environment]) {
    for (rank, env) in (1..).zip(environments.iter_mut()) {
        env.rank = rank;
    }
}

pub fn stage_names(environments: &[Environment]) -> Vec<String> {
    environments.iter().map(|env| env.name.clone()).collect()
}
