use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for azrelease.
///
/// Holds the non-secret settings shared by pipeline runs. Tokens are never
/// read from here; they come from the environment or the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub azure_devops: AzureDevOpsConfig,

    #[serde(default)]
    pub stage: StageConfig,

    #[serde(default)]
    pub notes: NotesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AzureDevOpsConfig {
    /// Organization collection URL (e.g., 'https://dev.azure.com/contoso/')
    pub collection_url: Option<String>,

    /// Organization name, used when no collection URL is given
    pub organization: Option<String>,

    /// Release management URL; derived from the collection URL when unset
    pub release_url: Option<String>,

    /// Project name
    pub project: Option<String>,

    /// api-version for release definition calls
    #[serde(default = "default_release_api_version")]
    pub release_api_version: String,

    /// api-version for repository calls
    #[serde(default = "default_git_api_version")]
    pub git_api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StageConfig {
    /// Stage to clone (matched case-insensitively)
    #[serde(default = "default_source_stage")]
    pub source: String,

    /// Name of the new stage
    #[serde(default = "default_target_stage")]
    pub target: String,

    /// Identity that must approve deployments to the new stage
    pub approver: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotesConfig {
    /// Report file name, written at the repository root
    #[serde(default = "default_notes_file_name")]
    pub file_name: String,

    /// Commit author name when the pipeline does not provide one
    #[serde(default = "default_git_user_name")]
    pub git_user_name: String,

    /// Commit author email when the pipeline does not provide one
    #[serde(default = "default_git_user_email")]
    pub git_user_email: String,

    /// Run `git fetch --tags` before looking for the latest tag
    #[serde(default = "default_true")]
    pub fetch_tags: bool,
}

impl Default for AzureDevOpsConfig {
    fn default() -> Self {
        Self {
            collection_url: None,
            organization: None,
            release_url: None,
            project: None,
            release_api_version: default_release_api_version(),
            git_api_version: default_git_api_version(),
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            source: default_source_stage(),
            target: default_target_stage(),
            approver: None,
        }
    }
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            file_name: default_notes_file_name(),
            git_user_name: default_git_user_name(),
            git_user_email: default_git_user_email(),
            fetch_tags: true,
        }
    }
}

fn default_release_api_version() -> String {
    crate::azure::DEFAULT_RELEASE_API_VERSION.to_string()
}

fn default_git_api_version() -> String {
    crate::azure::DEFAULT_GIT_API_VERSION.to_string()
}

fn default_source_stage() -> String {
    "Pre-Prod".to_string()
}

fn default_target_stage() -> String {
    "PROD".to_string()
}

fn default_notes_file_name() -> String {
    "ReleaseNotes.md".to_string()
}

fn default_git_user_name() -> String {
    "Azure Pipelines".to_string()
}

fn default_git_user_email() -> String {
    "azure-pipelines@noreply.invalid".to_string()
}

fn default_true() -> bool {
    true
}

impl AzureDevOpsConfig {
    /// Collection URL from the explicit setting, else built from the organization.
    pub fn resolved_collection_url(&self) -> Option<String> {
        self.collection_url.clone().or_else(|| {
            self.organization
                .as_ref()
                .map(|org| format!("https://dev.azure.com/{org}/"))
        })
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./azrelease.toml
    /// 3. ./azrelease.json
    /// 4. ./azrelease.yaml
    /// 5. ./azrelease.yml
    /// 6. `<user config dir>/azrelease/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = ["azrelease.toml", "azrelease.json", "azrelease.yaml", "azrelease.yml"]
            .iter()
            .map(PathBuf::from)
            .collect();

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("azrelease").join("config.toml"));
        }

        candidates
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension {
            "toml" => {
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
            }
            "json" => {
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
            }
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
            }
            _ => {
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stage.source, "Pre-Prod");
        assert_eq!(config.stage.target, "PROD");
        assert!(config.stage.approver.is_none());
        assert_eq!(config.notes.file_name, "ReleaseNotes.md");
        assert!(config.notes.fetch_tags);
        assert_eq!(config.azure_devops.release_api_version, "7.1-preview.4");
        assert_eq!(config.azure_devops.git_api_version, "7.1-preview.1");
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[azure-devops]
organization = "contoso"
project = "Web Platform"

[stage]
source = "Staging"
approver = "release-managers@contoso.com"

[notes]
fetch-tags = false
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(
            config.azure_devops.resolved_collection_url().as_deref(),
            Some("https://dev.azure.com/contoso/")
        );
        assert_eq!(config.azure_devops.project.as_deref(), Some("Web Platform"));
        assert_eq!(config.stage.source, "Staging");
        assert_eq!(config.stage.target, "PROD");
        assert_eq!(config.stage.approver.as_deref(), Some("release-managers@contoso.com"));
        assert!(!config.notes.fetch_tags);
        assert_eq!(config.notes.file_name, "ReleaseNotes.md");
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        let yaml_content = r#"
azure-devops:
  collection-url: https://tfs.example.com/tfs/DefaultCollection/
  release-api-version: "6.0"
notes:
  file-name: CHANGES.md
"#;
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(
            config.azure_devops.resolved_collection_url().as_deref(),
            Some("https://tfs.example.com/tfs/DefaultCollection/")
        );
        assert_eq!(config.azure_devops.release_api_version, "6.0");
        assert_eq!(config.notes.file_name, "CHANGES.md");
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, r#"{{"stage": {{"target": "Production"}}}}"#).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.stage.target, "Production");
        assert_eq!(config.stage.source, "Pre-Prod");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("does-not-exist.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[stage\nsource =").unwrap();

        let err = Config::load_from_path(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }
}
