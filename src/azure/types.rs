use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope used by every Azure DevOps list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Entry returned by the release definitions list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDefinitionRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Classic release pipeline definition.
///
/// Only the fields the tool touches are modelled; everything else lands in
/// `extra` and is written back verbatim on update, since the update
/// endpoint replaces the whole definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDefinition {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stage of a release pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub rank: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_deploy_approvals: Option<ApprovalBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Environment {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalBlock {
    #[serde(default)]
    pub approvals: Vec<ApprovalStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_options: Option<ApprovalOptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApprovalBlock {
    /// One manual sign-off by `approver_id`.
    pub fn manual(approver_id: &str) -> Self {
        Self {
            approvals: vec![ApprovalStep {
                rank: 1,
                is_automated: false,
                approver: Some(IdentityRef {
                    id: approver_id.to_owned(),
                    extra: Map::new(),
                }),
                extra: Map::new(),
            }],
            approval_options: Some(ApprovalOptions {
                release_creator_can_be_approver: false,
                auto_triggered_and_previous_environment_approved_can_be_skipped: false,
                enforce_identity_revalidation: true,
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    /// No approvals; deployments proceed automatically.
    pub fn automated() -> Self {
        Self {
            approvals: Vec::new(),
            approval_options: Some(ApprovalOptions {
                release_creator_can_be_approver: false,
                auto_triggered_and_previous_environment_approved_can_be_skipped: true,
                enforce_identity_revalidation: false,
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    pub fn requires_manual_approval(&self) -> bool {
        self.approvals.iter().any(|step| !step.is_automated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStep {
    pub rank: i64,
    pub is_automated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<IdentityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRef {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOptions {
    #[serde(default)]
    pub release_creator_can_be_approver: bool,
    #[serde(default)]
    pub auto_triggered_and_previous_environment_approved_can_be_skipped: bool,
    #[serde(default)]
    pub enforce_identity_revalidation: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRef {
    pub commit_id: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    pub fields: WorkItemFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemFields {
    #[serde(rename = "System.Title")]
    pub title: String,
    #[serde(rename = "System.WorkItemType")]
    pub work_item_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: i64,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_keeps_unknown_fields() {
        let raw = json!({
            "id": 7,
            "name": "web",
            "revision": 12,
            "environments": [{
                "id": 31,
                "name": "Pre-Prod",
                "rank": 1,
                "deployPhases": [{"name": "Agent job"}],
                "preDeployApprovals": {
                    "approvals": [{"rank": 1, "isAutomated": true, "id": 90}],
                    "approvalOptions": {"timeoutInMinutes": 0}
                }
            }]
        });

        let definition: ReleaseDefinition = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(definition.extra["revision"], json!(12));
        assert_eq!(definition.environments[0].extra["deployPhases"][0]["name"], "Agent job");

        let back = serde_json::to_value(&definition).unwrap();
        assert_eq!(back["revision"], json!(12));
        assert_eq!(back["environments"][0]["preDeployApprovals"]["approvals"][0]["id"], 90);
        assert_eq!(
            back["environments"][0]["preDeployApprovals"]["approvalOptions"]["timeoutInMinutes"],
            0
        );
    }

    #[test]
    fn test_manual_approval_block_shape() {
        let value = serde_json::to_value(ApprovalBlock::manual("release-approver@example.com")).unwrap();
        assert_eq!(
            value,
            json!({
                "approvals": [{
                    "rank": 1,
                    "isAutomated": false,
                    "approver": {"id": "release-approver@example.com"}
                }],
                "approvalOptions": {
                    "releaseCreatorCanBeApprover": false,
                    "autoTriggeredAndPreviousEnvironmentApprovedCanBeSkipped": false,
                    "enforceIdentityRevalidation": true
                }
            })
        );
    }

    #[test]
    fn test_automated_approval_block_has_no_steps() {
        let block = ApprovalBlock::automated();
        assert!(block.approvals.is_empty());
        assert!(!block.requires_manual_approval());
        let options = block.approval_options.unwrap();
        assert!(options.auto_triggered_and_previous_environment_approved_can_be_skipped);
        assert!(!options.enforce_identity_revalidation);
    }

    #[test]
    fn test_work_item_fields() {
        let item: WorkItem = serde_json::from_value(json!({
            "id": 42,
            "rev": 3,
            "fields": {"System.Title": "Fix login", "System.WorkItemType": "Bug", "System.State": "Done"}
        }))
        .unwrap();
        assert_eq!(item.fields.title, "Fix login");
        assert_eq!(item.fields.work_item_type, "Bug");
    }

    #[test]
    fn test_work_item_missing_title_is_an_error() {
        let result: std::result::Result<WorkItem, _> =
            serde_json::from_value(json!({"id": 1, "fields": {"System.WorkItemType": "Bug"}}));
        assert!(result.is_err());
    }
}
