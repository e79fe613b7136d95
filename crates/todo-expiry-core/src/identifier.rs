//! Content-based identifiers for expired findings.
//!
//! The identifier depends on the file, the kind and the comment body but not
//! on the line number, so moving a TODO around does not open a new issue.

use ring::digest::{SHA256, digest};

use crate::annotation::AnnotationKind;

const PREFIX: &str = "TODO-";
const HASH_CHARS: usize = 8;

/// `TODO-` followed by the first 8 hex digits of
/// `sha256("{file}:{kind}:{body}")`, with `body` trimmed.
pub fn issue_identifier(file: &str, kind: AnnotationKind, body: &str) -> String {
    let content = format!("{}:{}:{}", file, kind, body.trim());
    let hash = digest(&SHA256, content.as_bytes());
    let hex: String = hash
        .as_ref()
        .iter()
        .take(HASH_CHARS / 2)
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("{PREFIX}{hex}")
}
