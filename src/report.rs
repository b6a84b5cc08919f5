//! Builds the text posted for a batch of commits.

use crate::error::WebhookError;
use crate::webhook::Commit;

/// Largest batch of commits a single push may carry.
pub const MAX_COMMITS: usize = 100;

const WAITING_NOTICE: &str = "文档已更新～构建可能还需要一段时间，请耐心等待完成，预计1~5分钟:x11:";
const FILE_CHANGES_HEADER: &str = "文件变化（该提交中修改、新增和删除的文件）:";

const TAG_MODIFIED: &str = "[修改]";
const TAG_ADDED: &str = "[新增]";
const TAG_REMOVED: &str = "[删除]";

/// Fails if `count` is above [`MAX_COMMITS`].
pub fn check_commit_count(count: usize) -> Result<(), WebhookError> {
    if count > MAX_COMMITS {
        return Err(WebhookError::TooManyCommits {
            count,
            limit: MAX_COMMITS,
        });
    }
    Ok(())
}

/// Renders one block per commit, in input order.
pub fn format_report(commits: &[Commit]) -> Result<String, WebhookError> {
    check_commit_count(commits.len())?;

    let mut report = String::new();
    for commit in commits {
        write_commit(&mut report, commit);
    }
    Ok(report)
}

fn write_commit(out: &mut String, commit: &Commit) {
    out.push_str(WAITING_NOTICE);
    out.push_str("\n\n");
    out.push_str(&format!("更新日志: {}\n", commit.message));
    out.push_str(&format!("更新作者: {}\n", commit.author.name));
    out.push_str(FILE_CHANGES_HEADER);
    out.push_str("\n```\n");
    for (tag, files) in [
        (TAG_MODIFIED, &commit.modified),
        (TAG_ADDED, &commit.added),
        (TAG_REMOVED, &commit.removed),
    ] {
        for file in files {
            out.push_str(&format!("  {} {}\n", tag, file));
        }
    }
    out.push_str("```\n");
}
