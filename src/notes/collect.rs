use indexmap::IndexMap;
use log::{debug, info};

use super::history::ReferencePoint;
use super::render::ReleaseNotes;
use super::BranchRef;
use crate::azure::types::{PullRequest, WorkItem};
use crate::azure::AzureDevOpsClient;
use crate::output::vso;

/// Gathers commits, work items and pull requests for one branch.
///
/// Every remote failure degrades to "nothing found" and is reported as a
/// pipeline warning or error; collection itself never fails.
pub struct NotesCollector<'a> {
    client: &'a AzureDevOpsClient,
    repository: String,
}

impl<'a> NotesCollector<'a> {
    pub fn new(client: &'a AzureDevOpsClient, repository: impl Into<String>) -> Self {
        Self {
            client,
            repository: repository.into(),
        }
    }

    pub async fn collect(&self, branch: &BranchRef, reference: ReferencePoint) -> ReleaseNotes {
        let commit_ids = self.commits_since(branch, &reference).await;
        let work_items = self.work_items_for(&commit_ids).await;
        let pull_requests = self.pull_requests_into(branch).await;

        info!(
            "Collected {} commits, {} work items, {} pull requests",
            commit_ids.len(),
            work_items.len(),
            pull_requests.len()
        );

        ReleaseNotes {
            branch: branch.full().to_owned(),
            reference,
            commit_count: commit_ids.len(),
            work_items,
            pull_requests,
        }
    }

    async fn commits_since(&self, branch: &BranchRef, reference: &ReferencePoint) -> Vec<String> {
        let result = self
            .client
            .list_commits_since(
                &self.repository,
                branch.short(),
                reference.version(),
                reference.version_type(),
            )
            .await;

        match result {
            Ok(commits) if !commits.is_empty() => {
                commits.into_iter().map(|commit| commit.commit_id).collect()
            }
            Ok(_) => {
                vso::warning(format!(
                    "No commits found since the latest release: {reference}"
                ));
                Vec::new()
            }
            Err(e) => {
                vso::error(format!("Failed to fetch commits since {reference}: {e}"));
                vso::warning(format!(
                    "No commits found since the latest release: {reference}"
                ));
                Vec::new()
            }
        }
    }

    /// Work items linked to any of `commit_ids`, one entry per id, in order
    /// of first appearance.
    pub async fn work_items_for(&self, commit_ids: &[String]) -> Vec<WorkItem> {
        let mut unique: IndexMap<i64, WorkItem> = IndexMap::new();

        for commit_id in commit_ids {
            match self.client.commit_work_items(&self.repository, commit_id).await {
                Ok(items) if !items.is_empty() => {
                    debug!("Commit {commit_id} has {} work items", items.len());
                    for item in items {
                        unique.insert(item.id, item);
                    }
                }
                Ok(_) => {
                    vso::warning(format!("No work items found for commit: {commit_id}"));
                }
                Err(e) => {
                    vso::error(format!(
                        "Failed to fetch work items for commit {commit_id}: {e}"
                    ));
                }
            }
        }

        unique.into_values().collect()
    }

    async fn pull_requests_into(&self, branch: &BranchRef) -> Vec<PullRequest> {
        match self
            .client
            .list_pull_requests(&self.repository, branch.full())
            .await
        {
            Ok(pull_requests) => pull_requests,
            Err(e) => {
                vso::error(format!(
                    "Failed to fetch pull requests targeting {}: {e}",
                    branch.full()
                ));
                Vec::new()
            }
        }
    }
}
