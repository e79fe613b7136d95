//! Tracking issues for expired findings.
//!
//! Issues are deduplicated through the content-based identifier of each
//! finding, which survives line moves. A failure on one issue is logged and
//! does not stop the others.

use std::collections::HashSet;

use todo_expiry_core::Finding;
use tracing::{debug, error, info, warn};

use crate::RepoContext;
use crate::http::{GithubClient, Issue, NewIssue};

pub const DEFAULT_LABEL: &str = "expired-todo";

/// Counts from one [`IssueCreator::create_for_expired`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IssueSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct IssueCreator<'a> {
    client: &'a GithubClient,
    context: &'a RepoContext,
    labels: Vec<String>,
}

impl<'a> IssueCreator<'a> {
    /// Empty `labels` falls back to [`DEFAULT_LABEL`].
    pub fn new(client: &'a GithubClient, context: &'a RepoContext, labels: Vec<String>) -> Self {
        let labels = if labels.is_empty() {
            vec![DEFAULT_LABEL.to_string()]
        } else {
            labels
        };
        Self {
            client,
            context,
            labels,
        }
    }

    pub async fn create_for_expired(&self, findings: &[Finding]) -> IssueSummary {
        let mut summary = IssueSummary::default();
        let expired: Vec<&Finding> = findings.iter().filter(|f| f.is_expired).collect();
        if expired.is_empty() {
            info!("no expired TODOs found");
            return summary;
        }
        info!(count = expired.len(), "found expired TODOs");

        let open = match self.client.list_open_issues().await {
            Ok(issues) => issues,
            Err(e) => {
                warn!(error = %e, "failed to check existing issues");
                Vec::new()
            }
        };

        let mut seen: HashSet<String> = HashSet::new();
        for finding in expired {
            let identifier = finding.identifier();
            if already_tracked(&open, &seen, &identifier) {
                info!(identifier = %identifier, "issue already exists; skipping");
                summary.skipped += 1;
                continue;
            }

            match self.create_one(finding, &identifier).await {
                Ok(issue) => {
                    info!(identifier = %identifier, number = issue.number, "created issue");
                    summary.created += 1;
                    seen.insert(identifier);
                }
                Err(e) => {
                    error!(identifier = %identifier, error = %e, "failed to create issue");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn create_one(&self, finding: &Finding, identifier: &str) -> Result<Issue, crate::GithubError> {
        let login = match self
            .client
            .commit_author_login(&finding.attribution.revision_id)
            .await
        {
            Ok(login) => login,
            Err(e) => {
                debug!(revision = %finding.attribution.revision_id, error = %e, "no GitHub login for commit");
                None
            }
        };

        let issue = NewIssue {
            title: issue_title(finding),
            body: render_issue_body(finding, identifier, &mention(login.as_deref(), finding), self.context),
            labels: self.labels.clone(),
            assignees: login.into_iter().collect(),
        };
        self.client.create_issue(&issue).await
    }
}

fn already_tracked(open: &[Issue], seen: &HashSet<String>, identifier: &str) -> bool {
    seen.contains(identifier) || open.iter().any(|issue| issue.mentions(identifier))
}

/// `@login` when the commit maps to an account, else the blame author.
pub fn mention(login: Option<&str>, finding: &Finding) -> String {
    match login {
        Some(login) => format!("@{login}"),
        None if !finding.attribution.author_name.is_empty() => finding.attribution.author_name.clone(),
        None => "Unknown".to_string(),
    }
}

pub fn issue_title(finding: &Finding) -> String {
    format!("[TODO] Expired: {}:{}", finding.file, finding.line)
}

pub fn render_issue_body(
    finding: &Finding,
    identifier: &str,
    mention: &str,
    context: &RepoContext,
) -> String {
    let ann = &finding.annotation;
    let due = ann
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let full_comment = match ann.due_date {
        Some(_) => format!("{} [{}]: {}", ann.kind, due, ann.body),
        None => format!("{}: {}", ann.kind, ann.body),
    };

    format!(
        "## Expired TODO Comment

**Identifier**: `{identifier}`

### Details
- **Type**: {kind}
- **Comment**: {body}
- **Due Date**: {due}
- **File**: [{file}:{line}]({blob})
- **Last Updated**: [{updated}]({commit})
- **Author**: {mention}

### Full Comment
```
{full_comment}
```

---
*This issue was generated automatically from an expired TODO comment.*
*The identifier is derived from the file, type and comment, so moving the line does not open a duplicate.*
",
        kind = ann.kind,
        body = ann.body,
        file = finding.file,
        line = finding.line,
        blob = context.blob_url(&finding.file, finding.line),
        updated = finding.attribution.commit_date.format("%Y-%m-%d"),
        commit = context.commit_url(&finding.attribution.revision_id),
    )
}
