//! Git collaborators: candidate enumeration via `git grep`, per-line history
//! via `git blame --line-porcelain`.

mod error;
pub use error::GitError;

mod grep;
pub use grep::parse_grep_output;

mod repo;
pub use repo::GitRepo;
