use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use super::clone::{stage_names, Insertion, StagePlan};
use crate::azure::types::{ReleaseDefinition, ReleaseDefinitionRef};
use crate::azure::AzureDevOpsClient;
use crate::output::vso;

/// What happened to one release definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Updated,
    DryRun,
    SourceStageMissing,
    TargetStageExists,
    FetchFailed(String),
    UpdateFailed(String),
}

impl PipelineOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PipelineOutcome::FetchFailed(_) | PipelineOutcome::UpdateFailed(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::Updated => "updated",
            PipelineOutcome::DryRun => "dry run",
            PipelineOutcome::SourceStageMissing => "skipped: no source stage",
            PipelineOutcome::TargetStageExists => "skipped: stage exists",
            PipelineOutcome::FetchFailed(_) => "fetch failed",
            PipelineOutcome::UpdateFailed(_) => "update failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub pipeline_id: i64,
    pub name: String,
    /// Stage order after the run (unchanged order when nothing was inserted).
    pub stages: Vec<String>,
    pub outcome: PipelineOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRunReport {
    pub project: String,
    pub processed_at: DateTime<Utc>,
    pub plan: StagePlan,
    pub dry_run: bool,
    pub pipelines: Vec<PipelineReport>,
}

impl StageRunReport {
    pub fn failures(&self) -> usize {
        self.pipelines
            .iter()
            .filter(|p| p.outcome.is_failure())
            .count()
    }
}

/// Adds the planned stage to release definitions, one definition at a time.
pub struct StageInjector<'a> {
    client: &'a AzureDevOpsClient,
    plan: StagePlan,
    dry_run: bool,
}

impl<'a> StageInjector<'a> {
    pub fn new(client: &'a AzureDevOpsClient, plan: StagePlan, dry_run: bool) -> Self {
        Self {
            client,
            plan,
            dry_run,
        }
    }

    /// Lists the project's release definitions.
    ///
    /// A failed listing is logged and treated as an empty project.
    pub async fn enumerate_pipelines(&self) -> Vec<ReleaseDefinitionRef> {
        match self.client.list_release_definitions().await {
            Ok(pipelines) => {
                info!("Found {} release pipelines", pipelines.len());
                for pipeline in &pipelines {
                    debug!("Release pipeline {}: {}", pipeline.id, pipeline.name);
                }
                pipelines
            }
            Err(e) => {
                vso::error(format!("Failed to fetch release pipelines: {e}"));
                Vec::new()
            }
        }
    }

    /// Processes the given definition ids, or every definition when `ids` is empty.
    pub async fn run(&self, ids: &[i64]) -> StageRunReport {
        let targets: Vec<i64> = if ids.is_empty() {
            self.enumerate_pipelines()
                .await
                .into_iter()
                .map(|p| p.id)
                .collect()
        } else {
            ids.to_vec()
        };

        if targets.is_empty() {
            warn!("No classic release pipelines found");
        }

        let mut pipelines = Vec::with_capacity(targets.len());
        for id in targets {
            pipelines.push(self.process_pipeline(id).await);
        }

        StageRunReport {
            project: self.client.settings().project.clone(),
            processed_at: Utc::now(),
            plan: self.plan.clone(),
            dry_run: self.dry_run,
            pipelines,
        }
    }

    /// Fetches, mutates and writes back one definition. Never fails: every
    /// problem is folded into the returned outcome.
    pub async fn process_pipeline(&self, pipeline_id: i64) -> PipelineReport {
        let mut definition = match self.client.get_release_definition(pipeline_id).await {
            Ok(definition) => definition,
            Err(e) => {
                vso::error(format!("Failed to fetch pipeline {pipeline_id}: {e}"));
                return PipelineReport {
                    pipeline_id,
                    name: String::new(),
                    stages: Vec::new(),
                    outcome: PipelineOutcome::FetchFailed(e.to_string()),
                };
            }
        };

        debug!(
            "Pipeline {pipeline_id} stages before modification: {:?}",
            stage_names(&definition.environments)
        );

        let outcome = match self.plan.apply(&mut definition.environments) {
            Insertion::SourceMissing => {
                warn!(
                    "No '{}' stage found in pipeline {pipeline_id}. Skipping...",
                    self.plan.source
                );
                PipelineOutcome::SourceStageMissing
            }
            Insertion::TargetExists => {
                warn!(
                    "Pipeline {pipeline_id} already has a '{}' stage. Skipping...",
                    self.plan.target
                );
                PipelineOutcome::TargetStageExists
            }
            Insertion::Inserted { index } => {
                let gated = definition.environments[index]
                    .pre_deploy_approvals
                    .as_ref()
                    .is_some_and(|approvals| approvals.requires_manual_approval());
                if !gated {
                    warn!(
                        "No approver configured; '{}' in pipeline {pipeline_id} will deploy without approval",
                        self.plan.target
                    );
                }
                debug!(
                    "Pipeline {pipeline_id} stages after modification: {:?}",
                    stage_names(&definition.environments)
                );
                self.submit(&definition).await
            }
        };

        PipelineReport {
            pipeline_id,
            name: definition.name.clone(),
            stages: stage_names(&definition.environments),
            outcome,
        }
    }

    async fn submit(&self, definition: &ReleaseDefinition) -> PipelineOutcome {
        if self.dry_run {
            info!(
                "Dry run: not updating pipeline {} with stage '{}'",
                definition.id, self.plan.target
            );
            return PipelineOutcome::DryRun;
        }

        match self.client.update_release_definition(definition).await {
            Ok(_) => {
                info!(
                    "'{}' stage added successfully to pipeline {}",
                    self.plan.target, definition.id
                );
                PipelineOutcome::Updated
            }
            Err(e) => {
                vso::error(format!("Failed to update pipeline {}: {e}", definition.id));
                PipelineOutcome::UpdateFailed(e.to_string())
            }
        }
    }
}
