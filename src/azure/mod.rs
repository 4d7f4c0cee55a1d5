mod client;
pub mod types;

pub use client::{
    AzureDevOpsClient, ClientSettings, VersionType, DEFAULT_GIT_API_VERSION,
    DEFAULT_RELEASE_API_VERSION,
};
