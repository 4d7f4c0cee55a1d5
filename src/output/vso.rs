//! Azure Pipelines logging commands.
//!
//! The agent scans stdout for `##vso[...]` lines and turns them into
//! warnings and errors on the run summary.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Warning,
    Error,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Warning => f.write_str("warning"),
            IssueKind::Error => f.write_str("error"),
        }
    }
}

/// Escapes a message so the agent parses it as a single command payload.
pub fn escape_data(message: &str) -> String {
    let mut escaped = String::with_capacity(message.len());
    for ch in message.chars() {
        match ch {
            '%' => escaped.push_str("%AZP25"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            ']' => escaped.push_str("%5D"),
            ';' => escaped.push_str("%3B"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn format_issue(kind: IssueKind, message: &str) -> String {
    format!("##vso[task.logissue type={kind}]{}", escape_data(message))
}

pub fn log_issue(kind: IssueKind, message: &str) {
    println!("{}", format_issue(kind, message));
}

pub fn warning(message: impl AsRef<str>) {
    log::warn!("{}", message.as_ref());
    log_issue(IssueKind::Warning, message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    log::error!("{}", message.as_ref());
    log_issue(IssueKind::Error, message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_issue() {
        assert_eq!(
            format_issue(IssueKind::Warning, "No release tags found"),
            "##vso[task.logissue type=warning]No release tags found"
        );
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(
            escape_data("100% done; see [log]\nnext"),
            "100%AZP25 done%3B see [log%5D%0Anext"
        );
    }
}
