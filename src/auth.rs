use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Azure DevOps personal access token (or the pipeline's `System.AccessToken`).
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Value for an `Authorization` header: Basic auth with an empty user name.
    pub fn basic_header(&self) -> String {
        let encoded = STANDARD.encode(format!(":{}", self.0));
        format!("Basic {encoded}")
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}
