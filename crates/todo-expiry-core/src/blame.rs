//! Parser for `git blame --line-porcelain` output covering a single line.
//!
//! ```text
//! b0546e57f74ec824e6c5cd8601808bd54d6b141e 40 40 1
//! author aki
//! author-mail <aki@example.com>
//! author-time 1683849528
//! committer-time 1683849528
//! ...
//! <TAB>// TODO [2021-10-10]: Add tests
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const REVISION_LEN: usize = 40;

/// Commit metadata for the line carrying an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    /// Full 40-hex-digit commit id.
    pub revision_id: String,
    pub author_name: String,
    /// `author-mail` without the angle brackets.
    pub author_contact: Option<String>,
    /// UTC calendar day of `committer-time`.
    pub commit_date: NaiveDate,
}

/// Parse porcelain blame output. Returns `None` unless the revision header,
/// a non-blank `author` and `committer-time` are all present.
pub fn parse_attribution(raw: &str) -> Option<Attribution> {
    let mut lines = raw.lines().skip_while(|l| l.trim().is_empty());

    let header = lines.next()?;
    let revision_id = header.split_whitespace().next()?;
    if !is_revision_id(revision_id) {
        return None;
    }

    let mut author_name = None;
    let mut author_contact = None;
    let mut committer_time = None;

    for line in lines {
        // The blamed source line itself; never metadata.
        if line.starts_with('\t') {
            continue;
        }
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "author" if author_name.is_none() => {
                if !value.trim().is_empty() {
                    author_name = Some(value.to_string());
                }
            }
            "author-mail" if author_contact.is_none() => {
                let mail = value.trim().trim_start_matches('<').trim_end_matches('>');
                if !mail.is_empty() {
                    author_contact = Some(mail.to_string());
                }
            }
            "committer-time" if committer_time.is_none() => {
                committer_time = value.trim().parse::<i64>().ok();
            }
            _ => {}
        }
    }

    Some(Attribution {
        revision_id: revision_id.to_ascii_lowercase(),
        author_name: author_name?,
        author_contact,
        commit_date: utc_date(committer_time?)?,
    })
}

/// UTC calendar day containing the given Unix timestamp.
pub fn utc_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

fn is_revision_id(s: &str) -> bool {
    s.len() == REVISION_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
