use log::debug;

use super::core::AzureDevOpsClient;
use crate::azure::types::{GitCommitRef, ListResponse, PullRequest, WorkItem};
use crate::error::Result;

pub const COMMIT_PAGE_SIZE: usize = 100;

/// How the repository API should interpret a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionType {
    Branch,
    Tag,
    Commit,
}

impl VersionType {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionType::Branch => "branch",
            VersionType::Tag => "tag",
            VersionType::Commit => "commit",
        }
    }
}

impl AzureDevOpsClient {
    /// Commits reachable from `branch` that are not reachable from `compare_version`.
    ///
    /// The service caps each response, so pages of `COMMIT_PAGE_SIZE` are
    /// requested until a short page comes back.
    pub async fn list_commits_since(
        &self,
        repository: &str,
        branch: &str,
        compare_version: &str,
        compare_type: VersionType,
    ) -> Result<Vec<GitCommitRef>> {
        let mut commits = Vec::new();

        loop {
            let mut url = self.repository_api_url(repository, &["commits"])?;
            url.query_pairs_mut()
                .append_pair("searchCriteria.itemVersion.version", branch)
                .append_pair(
                    "searchCriteria.itemVersion.versionType",
                    VersionType::Branch.as_str(),
                )
                .append_pair("searchCriteria.compareVersion.version", compare_version)
                .append_pair(
                    "searchCriteria.compareVersion.versionType",
                    compare_type.as_str(),
                )
                .append_pair("searchCriteria.$top", &COMMIT_PAGE_SIZE.to_string())
                .append_pair("searchCriteria.$skip", &commits.len().to_string())
                .append_pair("api-version", self.git_api_version());

            let page: ListResponse<GitCommitRef> = self.get_json(url).await?;
            let page_len = page.value.len();
            commits.extend(page.value);
            debug!("Fetched {page_len} commits ({} so far)", commits.len());

            if page_len < COMMIT_PAGE_SIZE {
                return Ok(commits);
            }
        }
    }

    pub async fn commit_work_items(
        &self,
        repository: &str,
        commit_id: &str,
    ) -> Result<Vec<WorkItem>> {
        let mut url =
            self.repository_api_url(repository, &["commits", commit_id, "workItems"])?;
        url.query_pairs_mut()
            .append_pair("api-version", self.git_api_version());

        let response: ListResponse<WorkItem> = self.get_json(url).await?;
        Ok(response.value)
    }

    /// Pull requests whose target is `target_ref` (a full `refs/heads/...` name).
    pub async fn list_pull_requests(
        &self,
        repository: &str,
        target_ref: &str,
    ) -> Result<Vec<PullRequest>> {
        let mut url = self.repository_api_url(repository, &["pullrequests"])?;
        url.query_pairs_mut()
            .append_pair("searchCriteria.targetRefName", target_ref)
            .append_pair("api-version", self.git_api_version());

        let response: ListResponse<PullRequest> = self.get_json(url).await?;
        Ok(response.value)
    }
}
