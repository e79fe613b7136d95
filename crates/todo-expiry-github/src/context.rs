use crate::GithubError;

/// Where links in reports and issues point to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub server_url: String,
    pub owner: String,
    pub repo: String,
    /// Commit the scan ran against.
    pub sha: String,
}

impl RepoContext {
    /// `repository` is `owner/name`, as in `GITHUB_REPOSITORY`.
    pub fn new(server_url: &str, repository: &str, sha: &str) -> Result<Self, GithubError> {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| GithubError::InvalidRepository(repository.to_string()))?;
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            sha: sha.to_string(),
        })
    }

    pub fn repo_url(&self) -> String {
        format!("{}/{}/{}", self.server_url, self.owner, self.repo)
    }

    pub fn blob_url(&self, file: &str, line: u32) -> String {
        format!("{}/blob/{}/{}#L{}", self.repo_url(), self.sha, file, line)
    }

    pub fn commit_url(&self, revision: &str) -> String {
        format!("{}/commit/{}", self.repo_url(), revision)
    }
}
