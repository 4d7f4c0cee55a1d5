use log::debug;

use super::core::AzureDevOpsClient;
use crate::azure::types::{ListResponse, ReleaseDefinition, ReleaseDefinitionRef};
use crate::error::Result;

impl AzureDevOpsClient {
    /// Lists every classic release definition in the project.
    pub async fn list_release_definitions(&self) -> Result<Vec<ReleaseDefinitionRef>> {
        let url = self.release_api_url(&["definitions"])?;
        let response: ListResponse<ReleaseDefinitionRef> = self.get_json(url).await?;
        debug!("Found {} release definitions", response.value.len());
        Ok(response.value)
    }

    pub async fn get_release_definition(&self, definition_id: i64) -> Result<ReleaseDefinition> {
        let id = definition_id.to_string();
        let url = self.release_api_url(&["definitions", &id])?;
        self.get_json(url).await
    }

    /// Replaces the stored definition with `definition`.
    pub async fn update_release_definition(
        &self,
        definition: &ReleaseDefinition,
    ) -> Result<ReleaseDefinition> {
        let id = definition.id.to_string();
        let url = self.release_api_url(&["definitions", &id])?;
        self.put_json(url, definition).await
    }
}
