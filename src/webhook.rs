//! GitHub webhook payload structures

use serde::Deserialize;

/// Event type carried in the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Push,
    PullRequest,
    Unknown(String),
}

impl EventKind {
    /// Exact, case-sensitive match on the header value.
    pub fn parse(header: Option<&str>) -> Self {
        match header {
            Some("push") => EventKind::Push,
            Some("pull_request") => EventKind::PullRequest,
            Some(other) => EventKind::Unknown(other.to_string()),
            None => EventKind::Unknown(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Push => "push",
            EventKind::PullRequest => "pull_request",
            EventKind::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
}

/// Fields of a push delivery this service cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    pub repository: Repository,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub commits: Vec<serde_json::Value>,
}

impl PushEvent {
    /// Last `/`-delimited segment of the ref, e.g. `main` for `refs/heads/main`.
    pub fn branch_name(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or(&self.git_ref)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub message: String,
    pub author: Author,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_kind_is_case_sensitive() {
        assert_eq!(EventKind::parse(Some("push")), EventKind::Push);
        assert_eq!(EventKind::parse(Some("pull_request")), EventKind::PullRequest);
        assert_eq!(
            EventKind::parse(Some("Push")),
            EventKind::Unknown("Push".to_string())
        );
        assert_eq!(EventKind::parse(None), EventKind::Unknown(String::new()));
    }

    #[test]
    fn branch_name_is_last_ref_segment() {
        let event: PushEvent = serde_json::from_value(json!({
            "repository": {"name": "docs"},
            "ref": "refs/heads/feature/login",
            "commits": []
        }))
        .unwrap();
        assert_eq!(event.branch_name(), "login");

        let event = PushEvent {
            git_ref: "main".to_string(),
            ..event
        };
        assert_eq!(event.branch_name(), "main");
    }

    #[test]
    fn commit_file_lists_default_to_empty() {
        let commit: Commit = serde_json::from_value(json!({
            "message": "init",
            "author": {"name": "octocat", "email": "o@example.com"}
        }))
        .unwrap();
        assert!(commit.modified.is_empty());
        assert!(commit.added.is_empty());
        assert!(commit.removed.is_empty());
    }
}
