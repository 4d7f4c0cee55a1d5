use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::BranchRef;
use crate::error::Result;
use crate::git::GitRepo;
use crate::output::vso;

pub const REMOTE: &str = "origin";

/// Author recorded on the release notes commit.
#[derive(Debug, Clone)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Pushed,
    /// The committed report already matched; nothing was committed or pushed.
    Unchanged,
}

pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    info!("Release notes saved to: {}", path.display());
    Ok(())
}

/// The report inside the repository, plus a copy in the staging directory
/// when one is given.
pub fn report_targets(repo_path: &Path, staging_dir: Option<&Path>, file_name: &Path) -> Vec<PathBuf> {
    let mut targets = vec![repo_path.join(file_name)];
    if let Some(staging_dir) = staging_dir {
        targets.push(staging_dir.join(file_name));
    }
    targets
}

/// Writes `contents` to every target, stopping at the first one that fails.
pub fn write_reports(targets: &[PathBuf], contents: &str) -> Result<()> {
    for target in targets {
        if let Err(e) = write_report(target, contents) {
            vso::error(format!(
                "Failed to save release notes to: {}: {e}",
                target.display()
            ));
            return Err(e);
        }
    }
    Ok(())
}

pub fn commit_message(branch: &BranchRef) -> String {
    format!(
        "Automated update: Added release notes for branch {} [skip ci]",
        branch.full()
    )
}

/// Commits `report` (relative to the repository root) on `branch` and
/// force-pushes it with lease.
pub fn publish(
    repo: &GitRepo,
    branch: &BranchRef,
    report: &Path,
    identity: &GitIdentity,
) -> Result<PublishOutcome> {
    repo.set_local_config("user.name", &identity.name)?;
    repo.set_local_config("user.email", &identity.email)?;

    let current = repo.current_branch()?;
    if current != branch.short() {
        info!("Checking out {} (was {current})", branch.short());
        repo.checkout_branch_at_head(branch.short())?;
    }

    repo.fetch_branch(REMOTE, branch.short())?;

    repo.add(report)?;
    if !repo.has_staged_changes(report)? {
        info!("Release notes unchanged; nothing to commit");
        return Ok(PublishOutcome::Unchanged);
    }

    repo.commit(&commit_message(branch))?;
    repo.push_force_with_lease(REMOTE, branch.short())?;
    info!("Release notes pushed to {REMOTE}/{}", branch.short());

    Ok(PublishOutcome::Pushed)
}
