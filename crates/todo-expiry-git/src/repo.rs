//! Subprocess wrapper around a git working tree.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use todo_expiry_core::{CandidateLine, HistoryLookup};
use tokio::process::Command;
use tracing::{debug, info};

use crate::GitError;
use crate::grep::parse_grep_output;

/// Cheap pre-filter; the comment classifier and annotation parser make the
/// authoritative decision.
const GREP_PATTERN: &str = "(TODO|FIXME)";

/// A git working tree. All commands run with the tree root as working
/// directory, so paths are relative to it.
///
/// Child processes are killed when their future is dropped, which makes an
/// abandoned run leave nothing behind.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, GitError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(GitError::RootNotFound(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every tracked, non-binary line that mentions TODO/FIXME inside a
    /// comment.
    pub async fn list_candidates(&self) -> Result<Vec<CandidateLine>, GitError> {
        let args = [
            "grep",
            "-I",
            "-n",
            "-z",
            "-i",
            "-E",
            "--no-color",
            "-e",
            GREP_PATTERN,
        ];
        let output = self.git(&args).await?;

        // `git grep` exits 1 when nothing matched.
        let no_matches = output.status.code() == Some(1) && output.stderr.is_empty();
        if !output.status.success() && !no_matches {
            return Err(command_failed(&args, &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let candidates = parse_grep_output(&stdout);
        info!(count = candidates.len(), root = %self.root.display(), "enumerated candidate lines");
        Ok(candidates)
    }

    /// Raw `--line-porcelain` blame for exactly one line.
    pub async fn blame_line(&self, file: &str, line: u32) -> Result<String, GitError> {
        let range = format!("{line},{line}");
        let args = ["blame", "--line-porcelain", "-L", range.as_str(), "--", file];
        let output = self.git(&args).await?;
        if !output.status.success() {
            return Err(command_failed(&args, &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(file, line, output = %stdout, "git blame output");
        Ok(stdout)
    }

    async fn git(&self, args: &[&str]) -> Result<Output, GitError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(output)
    }
}

#[async_trait]
impl HistoryLookup for GitRepo {
    type Error = GitError;

    async fn lookup(&self, file: &str, line: u32) -> Result<String, GitError> {
        self.blame_line(file, line).await
    }
}

fn command_failed(args: &[&str], output: &Output) -> GitError {
    GitError::CommandFailed {
        command: args.join(" "),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_expiry_core::{Pipeline, parse_attribution};

    /// Initialise a throwaway repository with one committed file, or `None`
    /// when no usable `git` binary is available.
    fn init_repo(files: &[(&str, &str)]) -> Option<tempfile::TempDir> {
        let dir = tempfile::tempdir().ok()?;
        let run = |args: &[&str]| {
            std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
                .ok()
                .filter(|o| o.status.success())
        };
        run(&["init", "-q"])?;
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).ok()?;
        }
        run(&["add", "."])?;
        run(&[
            "-c",
            "user.name=aki",
            "-c",
            "user.email=aki@example.com",
            "commit",
            "-q",
            "-m",
            "initial",
        ])?;
        Some(dir)
    }

    #[test]
    fn open_rejects_missing_root() {
        let err = GitRepo::open("/definitely/not/a/dir").unwrap_err();
        assert!(matches!(err, GitError::RootNotFound(_)));
    }

    #[tokio::test]
    async fn grep_and_blame_against_real_repository() {
        let Some(dir) = init_repo(&[
            ("app.py", "x = 1\n# TODO [2021-10-10]: Add tests\n"),
            ("notes.txt", "TODO: not code\n"),
        ]) else {
            eprintln!("git unavailable; skipping");
            return;
        };
        let repo = GitRepo::open(dir.path()).unwrap();

        let candidates = repo.list_candidates().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].file, "app.py");
        assert_eq!(candidates[0].line, 2);

        let raw = repo.blame_line("app.py", 2).await.unwrap();
        let blame = parse_attribution(&raw).unwrap();
        assert_eq!(blame.author_name, "aki");
        assert_eq!(blame.author_contact.as_deref(), Some("aki@example.com"));
        assert_eq!(blame.revision_id.len(), 40);

        let findings = Pipeline::new().run(candidates, &repo).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_expired);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn paths_git_would_quote_are_blamed() {
        let name = "we\"ird\\name.rb";
        let Some(dir) = init_repo(&[(name, "# TODO [2021-10-10]: quote me\n")]) else {
            eprintln!("git unavailable; skipping");
            return;
        };
        let repo = GitRepo::open(dir.path()).unwrap();

        let candidates = repo.list_candidates().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].file, name);

        let findings = Pipeline::new().run(candidates, &repo).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file, name);
    }

    #[tokio::test]
    async fn no_matches_is_empty_not_an_error() {
        let Some(dir) = init_repo(&[("app.py", "x = 1\n")]) else {
            eprintln!("git unavailable; skipping");
            return;
        };
        let repo = GitRepo::open(dir.path()).unwrap();
        assert!(repo.list_candidates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blame_of_untracked_file_fails() {
        let Some(dir) = init_repo(&[("app.py", "x = 1\n")]) else {
            eprintln!("git unavailable; skipping");
            return;
        };
        let repo = GitRepo::open(dir.path()).unwrap();
        let err = repo.blame_line("missing.py", 1).await.unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { .. }));
    }
}
