mod core;
mod release;
mod repos;

pub use self::core::{
    AzureDevOpsClient, ClientSettings, DEFAULT_GIT_API_VERSION, DEFAULT_RELEASE_API_VERSION,
};
pub use self::repos::VersionType;
