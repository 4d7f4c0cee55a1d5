//! Thin wrapper over the `git` command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::auth::Token;
use crate::error::{AzReleaseError, Result};

pub struct GitRepo {
    root: PathBuf,
    /// `Authorization` header value for remote operations.
    auth_header: Option<String>,
}

impl GitRepo {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            auth_header: None,
        }
    }

    /// Sends `token` on fetch and push via `http.extraheader`, which keeps
    /// it out of `.git/config`.
    pub fn with_token(mut self, token: &Token) -> Self {
        self.auth_header = Some(token.basic_header());
        self
    }

    /// Runs `git <args>` in the repository and returns trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        self.exec(args, false)
    }

    fn run_remote(&self, args: &[&str]) -> Result<String> {
        self.exec(args, true)
    }

    fn exec(&self, args: &[&str], authenticated: bool) -> Result<String> {
        let mut command = Command::new("git");
        command.current_dir(&self.root);
        if authenticated {
            if let Some(header) = &self.auth_header {
                command
                    .arg("-c")
                    .arg(format!("http.extraheader=AUTHORIZATION: {header}"));
            }
        }
        command.args(args);

        debug!("git {}", args.join(" "));
        let output = command.output()?;

        if !output.status.success() {
            return Err(AzReleaseError::Git {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn fetch_tags(&self) -> Result<()> {
        self.run_remote(&["fetch", "--tags"]).map(|_| ())
    }

    /// Most recent tag reachable from HEAD, or `None` when there is none.
    pub fn latest_tag(&self) -> Option<String> {
        self.run(&["describe", "--tags", "--abbrev=0"])
            .ok()
            .filter(|tag| !tag.is_empty())
    }

    /// First parentless commit reachable from HEAD.
    pub fn root_commit(&self) -> Result<String> {
        let output = self.run(&["rev-list", "--max-parents=0", "HEAD"])?;
        output
            .lines()
            .next()
            .map(str::to_owned)
            .ok_or_else(|| AzReleaseError::Git {
                command: "rev-list --max-parents=0 HEAD".into(),
                stderr: "no root commit".into(),
            })
    }

    pub fn set_local_config(&self, key: &str, value: &str) -> Result<()> {
        self.run(&["config", "--local", key, value]).map(|_| ())
    }

    pub fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Points `branch` at HEAD and checks it out.
    pub fn checkout_branch_at_head(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-B", branch]).map(|_| ())
    }

    pub fn fetch_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_remote(&["fetch", remote, branch]).map(|_| ())
    }

    pub fn add(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.run(&["add", "--", &path]).map(|_| ())
    }

    pub fn has_staged_changes(&self, path: &Path) -> Result<bool> {
        let path = path.to_string_lossy();
        let status = self.run(&["status", "--porcelain", "--", &path])?;
        Ok(!status.is_empty())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message]).map(|_| ())
    }

    pub fn push_force_with_lease(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_remote(&["push", "--set-upstream", remote, branch, "--force-with-lease"])
            .map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::Path;
    use std::process::Command;

    use tempfile::TempDir;

    pub fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Repository on `main` with one commit and a local identity.
    pub fn setup_git_repo() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        git(dir, &["init", "--quiet"]);
        git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
        git(dir, &["config", "tag.gpgsign", "false"]);

        fs::write(dir.join("README.md"), "# Test").unwrap();
        git(dir, &["add", "."]);
        git(dir, &["commit", "--quiet", "-m", "Initial commit"]);

        temp_dir
    }

    pub fn commit_file(dir: &Path, name: &str, contents: &str) -> String {
        fs::write(dir.join(name), contents).unwrap();
        git(dir, &["add", name]);
        git(dir, &["commit", "--quiet", "-m", &format!("Update {name}")]);
        git(dir, &["rev-parse", "HEAD"])
    }
}
