use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::Token;
use crate::error::{AzReleaseError, Result};

pub const DEFAULT_RELEASE_API_VERSION: &str = "7.1-preview.4";
pub const DEFAULT_GIT_API_VERSION: &str = "7.1-preview.1";

/// Where and how to reach one Azure DevOps project.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Organization collection URL, e.g. `https://dev.azure.com/contoso/`
    pub collection_url: Url,
    /// Release management URL, e.g. `https://vsrm.dev.azure.com/contoso/`
    pub release_url: Url,
    pub project: String,
    pub release_api_version: String,
    pub git_api_version: String,
}

impl ClientSettings {
    pub fn new(collection_url: &str, project: &str) -> Result<Self> {
        let collection_url = Url::parse(collection_url)
            .map_err(|e| AzReleaseError::Config(format!("Invalid collection URL: {e}")))?;
        let release_url = release_management_url(&collection_url)?;

        Ok(Self {
            collection_url,
            release_url,
            project: project.to_owned(),
            release_api_version: DEFAULT_RELEASE_API_VERSION.to_owned(),
            git_api_version: DEFAULT_GIT_API_VERSION.to_owned(),
        })
    }

    pub fn with_release_url(mut self, release_url: &str) -> Result<Self> {
        self.release_url = Url::parse(release_url)
            .map_err(|e| AzReleaseError::Config(format!("Invalid release URL: {e}")))?;
        Ok(self)
    }
}

/// Derives the release management host from the collection URL.
///
/// Release definitions live on a separate service (`vsrm`) next to the
/// collection. Hosts that match neither cloud pattern (on-premises servers)
/// serve both APIs from the collection URL itself.
pub fn release_management_url(collection_url: &Url) -> Result<Url> {
    let host = collection_url
        .host_str()
        .ok_or_else(|| AzReleaseError::Config("Collection URL has no host".into()))?;

    let release_host = if host.eq_ignore_ascii_case("dev.azure.com") {
        Some("vsrm.dev.azure.com".to_owned())
    } else if let Some(org) = host.strip_suffix(".visualstudio.com") {
        if org.ends_with(".vsrm") {
            None
        } else {
            Some(format!("{org}.vsrm.visualstudio.com"))
        }
    } else {
        None
    };

    let mut url = collection_url.clone();
    if let Some(release_host) = release_host {
        url.set_host(Some(&release_host))
            .map_err(|e| AzReleaseError::Config(format!("Invalid release URL: {e}")))?;
    }
    Ok(url)
}

pub struct AzureDevOpsClient {
    client: Client,
    settings: ClientSettings,
    token: Token,
}

impl AzureDevOpsClient {
    pub fn new(settings: ClientSettings, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("azrelease/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AzReleaseError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings,
            token,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, self.token.basic_header())
            .header(ACCEPT, "application/json")
    }

    /// `{release_url}/{project}/_apis/release/{segments...}?api-version=...`
    pub(super) fn release_api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut path = vec![self.settings.project.as_str(), "_apis", "release"];
        path.extend_from_slice(segments);
        let mut url = join_segments(&self.settings.release_url, &path)?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.settings.release_api_version);
        Ok(url)
    }

    /// `{collection_url}/{project}/_apis/git/repositories/{repository}/{segments...}`
    pub(super) fn repository_api_url(&self, repository: &str, segments: &[&str]) -> Result<Url> {
        let mut path = vec![
            self.settings.project.as_str(),
            "_apis",
            "git",
            "repositories",
            repository,
        ];
        path.extend_from_slice(segments);
        join_segments(&self.settings.collection_url, &path)
    }

    pub(super) fn git_api_version(&self) -> &str {
        &self.settings.git_api_version
    }

    pub(super) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {url}");
        let response = self.auth_request(self.client.get(url)).send().await?;
        Self::read_json(response).await
    }

    pub(super) async fn put_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("PUT {url}");
        let response = self
            .auth_request(self.client.put(url).json(body))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T>(response: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(AzReleaseError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| AzReleaseError::Config(format!("URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
