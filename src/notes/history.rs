use std::fmt;

use log::info;
use serde::Serialize;

use crate::azure::VersionType;
use crate::error::Result;
use crate::git::GitRepo;
use crate::output::vso;

/// Lower bound for "commits since the last release".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReferencePoint {
    Tag(String),
    RootCommit(String),
}

impl ReferencePoint {
    pub fn version(&self) -> &str {
        match self {
            ReferencePoint::Tag(tag) => tag,
            ReferencePoint::RootCommit(sha) => sha,
        }
    }

    pub fn version_type(&self) -> VersionType {
        match self {
            ReferencePoint::Tag(_) => VersionType::Tag,
            ReferencePoint::RootCommit(_) => VersionType::Commit,
        }
    }
}

impl fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

/// Latest reachable tag, falling back to the repository's root commit.
///
/// A failed tag fetch is only a warning: local tags are still consulted.
pub fn resolve_reference_point(repo: &GitRepo, fetch_tags: bool) -> Result<ReferencePoint> {
    if fetch_tags {
        if let Err(e) = repo.fetch_tags() {
            vso::warning(format!("Failed to fetch tags: {e}"));
        }
    }

    if let Some(tag) = repo.latest_tag() {
        info!("Latest release tag: {tag}");
        return Ok(ReferencePoint::Tag(tag));
    }

    vso::warning("No release tags found. Using initial commit.");
    let root = repo.root_commit()?;
    info!("Using initial commit: {root}");
    Ok(ReferencePoint::RootCommit(root))
}
