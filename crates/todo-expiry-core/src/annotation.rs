//! TODO/FIXME annotation grammar.
//!
//! ```text
//! <ws> TODO|FIXME [modifier] [ "[" YYYY-MM-DD "]" ] [modifier] ":" body
//! ```
//!
//! `modifier` is either `(free text)` or `@name`; at most one is accepted, on
//! either side of the date. It is recognised and dropped.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static ANNOTATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let modifier = r"(?:\([^)]*\)|@\w+)";
    let date = r"\[([0-9]{4}-[0-9]{2}-[0-9]{2})\]";
    Regex::new(&format!(
        r"(?i)\s(TODO|FIXME)\s*(?:{modifier}\s*(?:{date}\s*)?|{date}\s*(?:{modifier}\s*)?)?:\s*(.*)$"
    ))
    .unwrap()
});

/// Annotation marker, normalised to upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnotationKind {
    Todo,
    Fixme,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::Fixme => "FIXME",
        }
    }
}

impl FromStr for AnnotationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TODO" => Ok(Self::Todo),
            "FIXME" => Ok(Self::Fixme),
            _ => Err(format!("unknown annotation kind: {s}")),
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A structured TODO/FIXME extracted from a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub due_date: Option<NaiveDate>,
    /// Trimmed text after the colon. May be empty.
    pub body: String,
}

/// Extract an annotation from comment text, or `None` when the text does not
/// follow the grammar.
pub fn parse_annotation(text: &str) -> Option<Annotation> {
    let caps = ANNOTATION_PATTERN.captures(text)?;

    let kind = caps.get(1)?.as_str().parse::<AnnotationKind>().ok()?;

    let due_date = match caps.get(2).or_else(|| caps.get(3)) {
        Some(m) => match NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => {
                debug!(date = m.as_str(), error = %e, "rejecting annotation with invalid due date");
                return None;
            }
        },
        None => None,
    };

    let body = caps.get(4).map_or("", |m| m.as_str()).trim().to_string();

    Some(Annotation {
        kind,
        due_date,
        body,
    })
}
