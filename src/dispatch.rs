//! Routes a validated delivery to its event handler.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::WebhookError;
use crate::report::{check_commit_count, format_report};
use crate::schema::{self, PUSH_EVENT};
use crate::webhook::{Commit, EventKind, PushEvent};
use crate::AppState;

/// Handles one delivery. Unknown event types are acknowledged, not rejected.
pub async fn dispatch(
    state: &AppState,
    event: &EventKind,
    payload: Value,
) -> Result<(), WebhookError> {
    match event {
        EventKind::Push => handle_push(state, payload).await,
        EventKind::PullRequest => handle_pull_request(&payload),
        EventKind::Unknown(name) => {
            warn!("未知GitHub事件类型: {:?}", name);
            Ok(())
        }
    }
}

/// Formats the pushed commits and hands the report to both sinks.
/// The first failing step aborts the rest.
pub async fn handle_push(state: &AppState, payload: Value) -> Result<(), WebhookError> {
    schema::validate(&payload, PUSH_EVENT).map_err(WebhookError::InvalidSchema)?;

    let push: PushEvent = serde_json::from_value(payload)
        .map_err(|e| WebhookError::InvalidSchema(e.to_string()))?;
    info!(
        "处理GitHub推送事件，仓库: {}，分支: {}",
        push.repository.name,
        push.branch_name()
    );

    check_commit_count(push.commits.len())?;

    let commits = push
        .commits
        .into_iter()
        .enumerate()
        .map(|(index, raw)| parse_commit(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let report = format_report(&commits)?;

    state.notifier.create_post(&report).await?;
    state.push_sink.append(&report).await?;

    info!(
        "Relayed {} commit(s) from {}",
        commits.len(),
        push.repository.name
    );
    Ok(())
}

/// An absent `message`, `author` or `author.name` is `KeyMissing`; any other
/// shape problem (wrong types, `null` file lists) is `MalformedCommit`.
fn parse_commit(index: usize, raw: Value) -> Result<Commit, WebhookError> {
    if let Some(commit) = raw.as_object() {
        let author = commit.get("author");
        let missing = if !commit.contains_key("message") {
            Some("message")
        } else if author.is_none() {
            Some("author")
        } else if author
            .and_then(Value::as_object)
            .is_some_and(|a| !a.contains_key("name"))
        {
            Some("author.name")
        } else {
            None
        };
        if let Some(key) = missing {
            return Err(WebhookError::KeyMissing(format!(
                "commits[{}]: '{}'",
                index, key
            )));
        }
    }

    serde_json::from_value(raw)
        .map_err(|e| WebhookError::MalformedCommit(format!("commits[{}]: {}", index, e)))
}

fn handle_pull_request(payload: &Value) -> Result<(), WebhookError> {
    let action = payload.get("action").and_then(Value::as_str);
    let number = payload.get("number").and_then(Value::as_u64);
    info!(
        "处理GitHub Pull Request事件: action={:?}, number={:?}",
        action, number
    );
    debug!("Pull request payload: {}", payload);
    Ok(())
}
