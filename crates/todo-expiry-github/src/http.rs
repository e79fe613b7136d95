//! Minimal GitHub REST client: open issues, commit authors, issue creation.

use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{GithubError, RepoContext};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const PAGE_SIZE: u32 = 100;

/// Bot account GitHub uses as committer for web-UI commits.
const WEB_FLOW: &str = "web-flow";

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub body: Option<String>,
}

impl Issue {
    /// Whether the title or body mentions `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.body.as_deref().is_some_and(|b| b.contains(needle))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    author: Option<Account>,
    committer: Option<Account>,
}

impl CommitResponse {
    /// Linked author account, else the committer unless it is `web-flow`.
    fn login(self) -> Option<String> {
        if let Some(author) = self.author {
            return Some(author.login);
        }
        self.committer
            .map(|c| c.login)
            .filter(|login| login != WEB_FLOW)
    }
}

/// HTTP client scoped to one repository.
pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl GithubClient {
    /// `api_url` is like `https://api.github.com` (no trailing slash needed).
    pub fn new(api_url: String, token: String, context: &RepoContext) -> Result<Self, GithubError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("todo-expiry/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            owner: context.owner.clone(),
            repo: context.repo.clone(),
        })
    }

    fn repo_endpoint(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, path)
    }

    /// First page (up to 100) of open issues.
    pub async fn list_open_issues(&self) -> Result<Vec<Issue>, GithubError> {
        let url = self.repo_endpoint(&format!("issues?state=open&per_page={PAGE_SIZE}"));
        debug!(url = %url, "listing open issues");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;
        let issues: Vec<Issue> = check(resp).await?.json().await?;
        info!(count = issues.len(), "fetched open issues");
        Ok(issues)
    }

    /// GitHub login associated with a commit, if the author or committer is
    /// linked to an account.
    pub async fn commit_author_login(&self, sha: &str) -> Result<Option<String>, GithubError> {
        let url = self.repo_endpoint(&format!("commits/{sha}"));
        debug!(url = %url, "fetching commit author");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;
        let commit: CommitResponse = check(resp).await?.json().await?;
        Ok(commit.login())
    }

    pub async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, GithubError> {
        let url = self.repo_endpoint("issues");
        debug!(url = %url, title = %issue.title, "creating issue");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .json(issue)
            .send()
            .await?;
        let created: Issue = check(resp).await?.json().await?;
        Ok(created)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GithubError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GithubError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> GithubClient {
        let ctx = RepoContext::new("https://github.com", "aki/todo-expiry", "abc").unwrap();
        GithubClient::new(api_url.into(), "token".into(), &ctx).unwrap()
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = client("https://api.github.com/");
        assert_eq!(client.api_url, "https://api.github.com");
        assert_eq!(
            client.repo_endpoint("issues"),
            "https://api.github.com/repos/aki/todo-expiry/issues"
        );
    }

    #[test]
    fn author_login_preferred() {
        let json = r#"{"author": {"login": "aki"}, "committer": {"login": "web-flow"}}"#;
        let commit: CommitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(commit.login().as_deref(), Some("aki"));
    }

    #[test]
    fn committer_login_used_when_author_unlinked() {
        let json = r#"{"author": null, "committer": {"login": "bot-user"}}"#;
        let commit: CommitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(commit.login().as_deref(), Some("bot-user"));
    }

    #[test]
    fn web_flow_committer_is_ignored() {
        let json = r#"{"author": null, "committer": {"login": "web-flow"}}"#;
        let commit: CommitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(commit.login(), None);
    }

    #[test]
    fn issue_mentions_identifier_in_title_or_body() {
        let json = r#"[
            {"number": 1, "title": "[TODO] Expired: a.rb:3", "body": "**Identifier**: `TODO-1a2b3c4d`"},
            {"number": 2, "title": "TODO-deadbeef in title", "body": null}
        ]"#;
        let issues: Vec<Issue> = serde_json::from_str(json).unwrap();
        assert!(issues[0].mentions("TODO-1a2b3c4d"));
        assert!(issues[1].mentions("TODO-deadbeef"));
        assert!(!issues[1].mentions("TODO-1a2b3c4d"));
    }

    #[test]
    fn new_issue_omits_empty_assignees() {
        let issue = NewIssue {
            title: "t".into(),
            body: "b".into(),
            labels: vec!["expired-todo".into()],
            assignees: vec![],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json.get("assignees").is_none());
        assert_eq!(json["labels"][0], "expired-todo");
    }
}
