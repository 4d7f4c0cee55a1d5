use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::azure::{AzureDevOpsClient, ClientSettings};
use crate::config::{AzureDevOpsConfig, Config};
use crate::git::GitRepo;
use crate::notes::{self, BranchRef, GitIdentity, NotesCollector, PublishOutcome};
use crate::output::{self, vso, PhaseProgress};
use crate::stages::{StageInjector, StagePlan};

/// Second place the token is looked up: the pipeline's own access token.
const PIPELINE_TOKEN_ENV: &str = "SYSTEM_ACCESSTOKEN";

#[derive(Parser)]
#[command(name = "azrelease")]
#[command(author, version, about = "Azure DevOps release automation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write the JSON run report to this file instead of stdout.
    ///
    /// Pipeline log markers (`##vso[...]`) share stdout, so pass this
    /// whenever the report is read by another tool.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Configuration file (defaults to ./azrelease.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Args)]
struct ConnectionArgs {
    #[arg(short, long, env = "AZURE_DEVOPS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "SYSTEM_TEAMFOUNDATIONCOLLECTIONURI")]
    collection_url: Option<String>,

    /// Organization name, shorthand for https://dev.azure.com/<org>/
    #[arg(long)]
    organization: Option<String>,

    /// Release management URL; derived from the collection URL by default
    #[arg(long)]
    release_url: Option<String>,

    #[arg(short = 'P', long, env = "SYSTEM_TEAMPROJECT")]
    project: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a stage of every classic release pipeline into a new gated stage
    AddStage {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Stage to clone [default: Pre-Prod]
        #[arg(long)]
        source_stage: Option<String>,

        /// Name of the new stage [default: PROD]
        #[arg(long)]
        target_stage: Option<String>,

        /// Identity that approves deployments to the new stage
        #[arg(long, env = "AZRELEASE_APPROVER")]
        approver: Option<String>,

        /// Only process these release definitions
        #[arg(long = "pipeline-id")]
        pipeline_ids: Vec<i64>,

        /// Compute the change without updating any definition
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Generate release notes since the last tag and push them to the branch
    ReleaseNotes {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(short, long, env = "BUILD_REPOSITORY_ID")]
        repository: String,

        /// Branch, e.g. refs/heads/release/v1.1.0
        #[arg(short, long, env = "BUILD_SOURCEBRANCH")]
        branch: String,

        #[arg(long, env = "BUILD_SOURCESDIRECTORY", default_value = ".")]
        repo_path: PathBuf,

        /// Also copy the report here
        #[arg(long, env = "BUILD_ARTIFACTSTAGINGDIRECTORY")]
        staging_dir: Option<PathBuf>,

        #[arg(long, env = "BUILD_REQUESTEDFOR")]
        git_user_name: Option<String>,

        #[arg(long, env = "BUILD_REQUESTEDFOREMAIL")]
        git_user_email: Option<String>,

        /// Write the report but do not commit or push it
        #[arg(long, default_value_t = false)]
        no_push: bool,

        /// Skip `git fetch --tags`
        #[arg(long, default_value_t = false)]
        no_fetch_tags: bool,
    },
}

impl ConnectionArgs {
    fn token(&self) -> Result<Token> {
        self.token
            .clone()
            .or_else(|| std::env::var(PIPELINE_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
            .map(Token::from)
            .ok_or_else(|| {
                anyhow!("An access token is required (--token, AZURE_DEVOPS_TOKEN or {PIPELINE_TOKEN_ENV})")
            })
    }

    fn settings(&self, config: &AzureDevOpsConfig) -> Result<ClientSettings> {
        let collection_url = self
            .collection_url
            .clone()
            .or_else(|| {
                self.organization
                    .as_ref()
                    .map(|org| format!("https://dev.azure.com/{org}/"))
            })
            .or_else(|| config.resolved_collection_url())
            .context("A collection URL or organization is required")?;
        let project = self
            .project
            .clone()
            .or_else(|| config.project.clone())
            .context("A project is required")?;

        let mut settings = ClientSettings::new(&collection_url, &project)?;
        if let Some(release_url) = self.release_url.as_ref().or(config.release_url.as_ref()) {
            settings = settings.with_release_url(release_url)?;
        }
        settings.release_api_version = config.release_api_version.clone();
        settings.git_api_version = config.git_api_version.clone();

        Ok(settings)
    }

    fn client(&self, config: &AzureDevOpsConfig) -> Result<(AzureDevOpsClient, Token)> {
        let token = self.token()?;
        let client = AzureDevOpsClient::new(self.settings(config)?, token.clone())?;
        Ok((client, token))
    }
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Run report written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_add_stage(
        &self,
        config: &Config,
        connection: &ConnectionArgs,
        source_stage: Option<&str>,
        target_stage: Option<&str>,
        approver: Option<&str>,
        pipeline_ids: &[i64],
        dry_run: bool,
    ) -> Result<()> {
        let (client, _) = connection.client(&config.azure_devops)?;

        let plan = StagePlan {
            source: source_stage.unwrap_or(&config.stage.source).to_owned(),
            target: target_stage.unwrap_or(&config.stage.target).to_owned(),
            approver: approver
                .map(str::to_owned)
                .or_else(|| config.stage.approver.clone()),
        };
        info!(
            "Adding stage '{}' after '{}' in project {}",
            plan.target,
            plan.source,
            client.settings().project
        );

        let report = StageInjector::new(&client, plan, dry_run)
            .run(pipeline_ids)
            .await;

        output::print_stage_summary(&report);
        self.emit_json(&report)?;

        let failures = report.failures();
        if failures > 0 {
            bail!("{failures} release pipeline(s) could not be updated");
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_release_notes(
        &self,
        config: &Config,
        connection: &ConnectionArgs,
        repository: &str,
        branch: &str,
        repo_path: &Path,
        staging_dir: Option<&Path>,
        identity: GitIdentity,
        no_push: bool,
        fetch_tags: bool,
    ) -> Result<()> {
        let (client, token) = connection.client(&config.azure_devops)?;
        let branch = BranchRef::new(branch);
        let repo = GitRepo::open(repo_path).with_token(&token);
        info!("Generating release notes for {} in {}", branch.full(), repo_path.display());

        let progress = PhaseProgress::start(3, "Resolving reference point");
        let reference = match notes::resolve_reference_point(&repo, fetch_tags) {
            Ok(reference) => reference,
            Err(e) => {
                progress.abandon();
                vso::error(format!("Failed to resolve a reference point: {e}"));
                return Err(e.into());
            }
        };

        let progress = progress.advance(
            &format!("Changes since {reference}"),
            "Collecting work items and pull requests",
        );
        let release_notes = NotesCollector::new(&client, repository)
            .collect(&branch, reference)
            .await;
        let rendered = release_notes.render();

        let progress = progress.advance("Collected release notes", "Writing release notes");
        let report_name = Path::new(&config.notes.file_name);
        let targets = notes::report_targets(repo_path, staging_dir, report_name);
        if let Err(e) = notes::write_reports(&targets, &rendered) {
            progress.abandon();
            return Err(e.into());
        }
        progress.finish("Release notes written");

        output::print_notes_summary(&release_notes);
        println!("{rendered}");
        if self.output.is_some() {
            self.emit_json(&release_notes)?;
        }

        if no_push {
            info!("--no-push given; leaving {} uncommitted", report_name.display());
            return Ok(());
        }

        match notes::publish(&repo, &branch, report_name, &identity) {
            Ok(PublishOutcome::Pushed) => info!("Release notes pushed to repository."),
            Ok(PublishOutcome::Unchanged) => info!("Release notes already up to date."),
            Err(e) => {
                vso::error(format!("Failed to push release notes to repository: {e}"));
                return Err(e.into());
            }
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::AddStage {
                connection,
                source_stage,
                target_stage,
                approver,
                pipeline_ids,
                dry_run,
            } => {
                self.execute_add_stage(
                    &config,
                    connection,
                    source_stage.as_deref(),
                    target_stage.as_deref(),
                    approver.as_deref(),
                    pipeline_ids,
                    *dry_run,
                )
                .await
            }
            Commands::ReleaseNotes {
                connection,
                repository,
                branch,
                repo_path,
                staging_dir,
                git_user_name,
                git_user_email,
                no_push,
                no_fetch_tags,
            } => {
                let identity = GitIdentity {
                    name: git_user_name
                        .clone()
                        .unwrap_or_else(|| config.notes.git_user_name.clone()),
                    email: git_user_email
                        .clone()
                        .unwrap_or_else(|| config.notes.git_user_email.clone()),
                };
                let fetch_tags = config.notes.fetch_tags && !*no_fetch_tags;

                self.execute_release_notes(
                    &config,
                    connection,
                    repository,
                    branch,
                    repo_path,
                    staging_dir.as_deref(),
                    identity,
                    *no_push,
                    fetch_tags,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_help_mentions_pipeline_markers() {
        use clap::CommandFactory;
        let command = Cli::command();
        let output = command
            .get_arguments()
            .find(|arg| arg.get_id() == "output")
            .unwrap();
        let help = output.get_long_help().unwrap().to_string();
        assert!(help.contains("##vso"));
        assert!(help.contains("read by another tool"));
    }

    #[test]
    fn test_parse_add_stage() {
        let cli = Cli::try_parse_from([
            "azrelease",
            "add-stage",
            "--organization",
            "contoso",
            "-P",
            "web",
            "--pipeline-id",
            "3",
            "--pipeline-id",
            "8",
            "--dry-run",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose());
        match cli.command {
            Commands::AddStage {
                connection,
                pipeline_ids,
                dry_run,
                ..
            } => {
                assert_eq!(pipeline_ids, vec![3, 8]);
                assert!(dry_run);
                let settings = connection.settings(&AzureDevOpsConfig::default()).unwrap();
                assert_eq!(settings.project, "web");
                assert_eq!(
                    settings.release_url.as_str(),
                    "https://vsrm.dev.azure.com/contoso/"
                );
            }
            Commands::ReleaseNotes { .. } => panic!("expected add-stage"),
        }
    }

    #[test]
    fn test_settings_fall_back_to_config() {
        let connection = ConnectionArgs {
            token: None,
            collection_url: None,
            organization: None,
            release_url: None,
            project: None,
        };
        let config = AzureDevOpsConfig {
            collection_url: Some("https://tfs.example.com/tfs/DefaultCollection/".into()),
            project: Some("web".into()),
            ..AzureDevOpsConfig::default()
        };

        let settings = connection.settings(&config).unwrap();
        assert_eq!(settings.collection_url, settings.release_url);
        assert_eq!(settings.project, "web");
    }

    #[test]
    fn test_settings_require_project() {
        let connection = ConnectionArgs {
            token: None,
            collection_url: Some("https://dev.azure.com/contoso/".into()),
            organization: None,
            release_url: None,
            project: None,
        };
        let err = connection
            .settings(&AzureDevOpsConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("project"));
    }

    mod release_notes_run {
        use std::path::{Path, PathBuf};

        use clap::Parser;

        use crate::cli::Cli;
        use crate::git::test_support::{git, setup_git_repo};
        use mockito::{Matcher, Server, ServerGuard};
        use serde_json::json;
        use tempfile::TempDir;

        const REPO_PATH: &str = "/web/_apis/git/repositories/repo-1";

        async fn mock_repository(server: &mut ServerGuard, root: &str) -> Vec<mockito::Mock> {
            vec![
                server
                    .mock("GET", format!("{REPO_PATH}/commits").as_str())
                    .match_query(Matcher::AllOf(vec![
                        Matcher::UrlEncoded("searchCriteria.compareVersion.version".into(), root.into()),
                        Matcher::UrlEncoded("searchCriteria.compareVersion.versionType".into(), "commit".into()),
                    ]))
                    .with_status(200)
                    .with_body(json!({"value": [{"commitId": "aaa"}]}).to_string())
                    .create_async()
                    .await,
                server
                    .mock("GET", format!("{REPO_PATH}/commits/aaa/workItems").as_str())
                    .match_query(Matcher::Any)
                    .with_status(200)
                    .with_body(
                        json!({"value": [{"id": 5, "fields": {"System.Title": "Login", "System.WorkItemType": "User Story"}}]})
                            .to_string(),
                    )
                    .create_async()
                    .await,
                server
                    .mock("GET", format!("{REPO_PATH}/pullrequests").as_str())
                    .match_query(Matcher::Any)
                    .with_status(200)
                    .with_body(json!({"value": []}).to_string())
                    .create_async()
                    .await,
            ]
        }

        fn cli(server: &ServerGuard, config: &Path, repo: &Path, staging: &Path) -> Cli {
            Cli::try_parse_from([
                "azrelease",
                "release-notes",
                "--config",
                &config.to_string_lossy(),
                "--token",
                "pat",
                "--collection-url",
                &server.url(),
                "-P",
                "web",
                "--repository",
                "repo-1",
                "--branch",
                "refs/heads/main",
                "--repo-path",
                &repo.to_string_lossy(),
                "--staging-dir",
                &staging.to_string_lossy(),
                "--no-fetch-tags",
                "--no-push",
            ])
            .unwrap()
        }

        fn empty_config(dir: &TempDir) -> PathBuf {
            let path = dir.path().join("azrelease.toml");
            std::fs::write(&path, "").unwrap();
            path
        }

        #[tokio::test]
        async fn test_no_push_writes_reports_and_leaves_head() {
            let repo = setup_git_repo();
            let root = git(repo.path(), &["rev-parse", "HEAD"]);
            let staging = TempDir::new().unwrap();
            let config_dir = TempDir::new().unwrap();
            let mut server = Server::new_async().await;
            let _mocks = mock_repository(&mut server, &root).await;

            cli(&server, &empty_config(&config_dir), repo.path(), staging.path())
                .execute()
                .await
                .unwrap();

            let in_repo = std::fs::read_to_string(repo.path().join("ReleaseNotes.md")).unwrap();
            let staged = std::fs::read_to_string(staging.path().join("ReleaseNotes.md")).unwrap();
            assert_eq!(in_repo, staged);
            assert!(in_repo.contains("- 5: Login (User Story)"));
            assert_eq!(git(repo.path(), &["rev-parse", "HEAD"]), root);
            assert_eq!(
                git(repo.path(), &["status", "--porcelain"]),
                "?? ReleaseNotes.md"
            );
        }

        #[tokio::test]
        async fn test_failed_staging_write_fails_the_run() {
            let repo = setup_git_repo();
            let root = git(repo.path(), &["rev-parse", "HEAD"]);
            let staging_parent = TempDir::new().unwrap();
            let staging = staging_parent.path().join("staging");
            std::fs::write(&staging, "not a directory").unwrap();
            let config_dir = TempDir::new().unwrap();
            let mut server = Server::new_async().await;
            let _mocks = mock_repository(&mut server, &root).await;

            let result = cli(&server, &empty_config(&config_dir), repo.path(), &staging)
                .execute()
                .await;

            assert!(result.is_err());
            assert_eq!(git(repo.path(), &["rev-parse", "HEAD"]), root);
        }
    }
}
