//! GitHub integration: repository links, REST client and issue creation for
//! expired TODOs.

mod context;
mod error;

pub use context::RepoContext;
pub use error::GithubError;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub mod issues;

#[cfg(feature = "http")]
pub use http::GithubClient;
#[cfg(feature = "http")]
pub use issues::{IssueCreator, IssueSummary};
