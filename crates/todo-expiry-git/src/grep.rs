//! `git grep -n -z` output → candidate lines.
//!
//! Each match is `path NUL line NUL text LF`. Paths are printed verbatim, so
//! names containing `"`, `\` or `:` need no unquoting.

use todo_expiry_core::{CandidateLine, is_comment};
use tracing::debug;

/// Parse `git grep -n -z` output, keeping only lines that are comments in
/// their file's language. Text is trimmed.
pub fn parse_grep_output(output: &str) -> Vec<CandidateLine> {
    output
        .lines()
        .filter_map(|record| {
            let mut fields = record.splitn(3, '\0');
            let file = fields.next().filter(|f| !f.is_empty())?;
            let line: u32 = fields.next()?.parse().ok().filter(|n| *n > 0)?;
            let text = fields.next()?;

            if !is_comment(file, text) {
                debug!(file, line, "match is not a comment; skipping");
                return None;
            }

            Some(CandidateLine {
                file: file.to_string(),
                line,
                text: text.trim().to_string(),
            })
        })
        .collect()
}
