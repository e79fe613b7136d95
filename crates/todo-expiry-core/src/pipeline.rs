//! Annotation + attribution → ordered, expiry-classified findings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::PipelineError;
use crate::annotation::{Annotation, parse_annotation};
use crate::blame::{Attribution, parse_attribution};
use crate::identifier::issue_identifier;
use crate::sort_key::finding_key;

/// Lookups in flight at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// A source line pre-selected as possibly carrying an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub file: String,
    /// 1-based.
    pub line: u32,
    pub text: String,
}

/// Fetches raw per-line history (porcelain blame) for a file and line.
#[async_trait]
pub trait HistoryLookup: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn lookup(&self, file: &str, line: u32) -> Result<String, Self::Error>;
}

/// An annotated, attributed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    pub line: u32,
    #[serde(flatten)]
    pub annotation: Annotation,
    pub attribution: Attribution,
    pub is_expired: bool,
}

impl Finding {
    /// Stable identifier used to deduplicate tracking issues.
    pub fn identifier(&self) -> String {
        issue_identifier(&self.file, self.annotation.kind, &self.annotation.body)
    }
}

/// `true` iff a due date is present and strictly before `today`.
pub fn is_expired(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    due.is_some_and(|d| d < today)
}

pub fn any_expired(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.is_expired)
}

/// Single-run orchestrator. `today` is fixed at construction and shared by
/// every line of the batch.
#[derive(Debug, Clone)]
pub struct Pipeline {
    today: NaiveDate,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Capture today's UTC date.
    pub fn new() -> Self {
        Self {
            today: Utc::now().date_naive(),
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Abort the whole run if it has not finished after `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Run the batch. Per-line failures drop the line; only an elapsed
    /// deadline fails the run, in which case no partial result is returned.
    pub async fn run<L>(
        &self,
        candidates: Vec<CandidateLine>,
        lookup: &L,
    ) -> Result<Vec<Finding>, PipelineError>
    where
        L: HistoryLookup + ?Sized,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.collect(candidates, lookup))
                .await
                .map_err(|_| PipelineError::DeadlineElapsed(deadline)),
            None => Ok(self.collect(candidates, lookup).await),
        }
    }

    async fn collect<L>(&self, candidates: Vec<CandidateLine>, lookup: &L) -> Vec<Finding>
    where
        L: HistoryLookup + ?Sized,
    {
        let candidate_count = candidates.len();
        let annotated: Vec<(CandidateLine, Annotation)> = candidates
            .into_iter()
            .filter_map(|candidate| match parse_annotation(&candidate.text) {
                Some(annotation) => Some((candidate, annotation)),
                None => {
                    debug!(file = %candidate.file, line = candidate.line, "no annotation; skipping");
                    None
                }
            })
            .collect();

        info!(
            candidates = candidate_count,
            annotated = annotated.len(),
            concurrency = self.concurrency,
            "looking up history"
        );

        // `buffered` yields in input order, so the stable sort below keeps
        // input order for equal keys.
        let attributed: Vec<Option<Finding>> = stream::iter(annotated)
            .map(|(candidate, annotation)| self.attribute(candidate, annotation, lookup))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut findings: Vec<Finding> = attributed.into_iter().flatten().collect();
        findings.sort_by_cached_key(|f| finding_key(f.annotation.due_date, f.attribution.commit_date));

        info!(
            findings = findings.len(),
            expired = findings.iter().filter(|f| f.is_expired).count(),
            today = %self.today,
            "pipeline complete"
        );
        findings
    }

    async fn attribute<L>(
        &self,
        candidate: CandidateLine,
        annotation: Annotation,
        lookup: &L,
    ) -> Option<Finding>
    where
        L: HistoryLookup + ?Sized,
    {
        let raw = match lookup.lookup(&candidate.file, candidate.line).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(file = %candidate.file, line = candidate.line, error = %e, "history lookup failed; dropping line");
                return None;
            }
        };

        let Some(attribution) = parse_attribution(&raw) else {
            warn!(file = %candidate.file, line = candidate.line, "history output has no attribution; dropping line");
            return None;
        };

        let is_expired = is_expired(annotation.due_date, self.today);
        Some(Finding {
            file: candidate.file,
            line: candidate.line,
            annotation,
            attribution,
            is_expired,
        })
    }
}

/// Run a batch with default settings and today's UTC date.
pub async fn build_results<L>(candidates: Vec<CandidateLine>, lookup: &L) -> Vec<Finding>
where
    L: HistoryLookup + ?Sized,
{
    Pipeline::new().collect(candidates, lookup).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::annotation::AnnotationKind;

    #[derive(Debug, thiserror::Error)]
    #[error("no history for {0}:{1}")]
    struct Untracked(String, u32);

    /// Porcelain keyed by `(file, line)`; anything else is untracked.
    #[derive(Default)]
    struct FakeHistory {
        entries: HashMap<(String, u32), String>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeHistory {
        fn with(mut self, file: &str, line: u32, committer_time: i64) -> Self {
            self.entries.insert(
                (file.to_string(), line),
                porcelain("b0546e57f74ec824e6c5cd8601808bd54d6b141e", "aki", committer_time),
            );
            self
        }

        fn raw(mut self, file: &str, line: u32, raw: &str) -> Self {
            self.entries.insert((file.to_string(), line), raw.to_string());
            self
        }
    }

    #[async_trait]
    impl HistoryLookup for FakeHistory {
        type Error = Untracked;

        async fn lookup(&self, file: &str, line: u32) -> Result<String, Untracked> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.entries
                .get(&(file.to_string(), line))
                .cloned()
                .ok_or_else(|| Untracked(file.to_string(), line))
        }
    }

    fn porcelain(rev: &str, author: &str, committer_time: i64) -> String {
        format!("{rev} 1 1 1\nauthor {author}\nauthor-mail <{author}@example.com>\ncommitter-time {committer_time}\n")
    }

    fn candidate(file: &str, line: u32, text: &str) -> CandidateLine {
        CandidateLine {
            file: file.into(),
            line,
            text: text.into(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new().with_today(date("2025-01-01"))
    }

    #[tokio::test]
    async fn end_to_end_expired() {
        let history = FakeHistory::default().with("src/main.ts", 3, 1683849528);
        let findings = pipeline()
            .run(
                vec![candidate("src/main.ts", 3, "// TODO [2021-10-10]: Add tests")],
                &history,
            )
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.annotation.kind, AnnotationKind::Todo);
        assert_eq!(f.annotation.due_date, Some(date("2021-10-10")));
        assert_eq!(f.annotation.body, "Add tests");
        assert_eq!(f.attribution.revision_id, "b0546e57f74ec824e6c5cd8601808bd54d6b141e");
        assert_eq!(f.attribution.author_name, "aki");
        assert_eq!(f.attribution.commit_date, date("2023-05-11"));
        assert!(f.is_expired);
    }

    #[tokio::test]
    async fn due_today_or_later_is_not_expired() {
        let history = FakeHistory::default()
            .with("a.py", 1, 0)
            .with("a.py", 2, 0)
            .with("a.py", 3, 0);
        let findings = pipeline()
            .run(
                vec![
                    candidate("a.py", 1, "# TODO [2025-01-01]: today"),
                    candidate("a.py", 2, "# TODO [2024-12-31]: yesterday"),
                    candidate("a.py", 3, "# TODO: whenever"),
                ],
                &history,
            )
            .await
            .unwrap();

        let expired: Vec<&str> = findings
            .iter()
            .filter(|f| f.is_expired)
            .map(|f| f.annotation.body.as_str())
            .collect();
        assert_eq!(expired, vec!["yesterday"]);
        assert!(any_expired(&findings));
    }

    #[tokio::test]
    async fn sorted_by_due_then_commit_date() {
        let history = FakeHistory::default()
            .with("a.js", 1, 1_700_000_000)
            .with("a.js", 2, 1_600_000_000)
            .with("a.js", 3, 1_600_000_000)
            .with("a.js", 4, 1_500_000_000);
        let findings = pipeline()
            .run(
                vec![
                    candidate("a.js", 1, "// TODO: undated newer"),
                    candidate("a.js", 2, "// TODO [2200-12-12]: far"),
                    candidate("a.js", 3, "// TODO [2021-10-10]: near"),
                    candidate("a.js", 4, "// TODO: undated older"),
                ],
                &history,
            )
            .await
            .unwrap();

        let bodies: Vec<&str> = findings.iter().map(|f| f.annotation.body.as_str()).collect();
        assert_eq!(bodies, vec!["near", "far", "undated older", "undated newer"]);
    }

    #[tokio::test]
    async fn equal_keys_keep_input_order() {
        let history = FakeHistory::default()
            .with("b.go", 9, 0)
            .with("a.go", 1, 0)
            .with("c.go", 5, 0);
        let findings = pipeline()
            .run(
                vec![
                    candidate("b.go", 9, "// TODO: first"),
                    candidate("a.go", 1, "// TODO: second"),
                    candidate("c.go", 5, "// TODO: third"),
                ],
                &history,
            )
            .await
            .unwrap();

        let bodies: Vec<&str> = findings.iter().map(|f| f.annotation.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn per_line_failures_drop_only_that_line() {
        let history = FakeHistory::default()
            .with("ok.rb", 1, 0)
            .raw("garbled.rb", 1, "not porcelain at all");
        let findings = pipeline()
            .run(
                vec![
                    candidate("ok.rb", 1, "# TODO: kept"),
                    candidate("untracked.rb", 1, "# TODO: lookup fails"),
                    candidate("garbled.rb", 1, "# TODO: unparseable history"),
                    candidate("ok.rb", 2, "# just a comment"),
                ],
                &history,
            )
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].annotation.body, "kept");
    }

    #[tokio::test]
    async fn malformed_annotations_skip_history_lookup() {
        let history = FakeHistory::default();
        let findings = pipeline()
            .run(vec![candidate("a.rs", 1, "// TODO add a colon")], &history)
            .await
            .unwrap();
        assert!(findings.is_empty());
        assert_eq!(history.max_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookups_fan_out_up_to_the_limit() {
        let mut history = FakeHistory {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let mut candidates = Vec::new();
        for line in 1..=8 {
            history = history.with("a.c", line, 0);
            candidates.push(candidate("a.c", line, "// TODO: parallel"));
        }

        let findings = pipeline()
            .with_concurrency(4)
            .run(candidates, &history)
            .await
            .unwrap();

        assert_eq!(findings.len(), 8);
        let max = history.max_in_flight.load(Ordering::SeqCst);
        assert!(max > 1 && max <= 4, "max in flight was {max}");
    }

    #[tokio::test]
    async fn elapsed_deadline_fails_the_whole_run() {
        let history = FakeHistory {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        }
        .with("a.c", 1, 0);

        let err = pipeline()
            .with_deadline(Duration::from_millis(20))
            .run(vec![candidate("a.c", 1, "// TODO: slow")], &history)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DeadlineElapsed(_)));
    }

    #[tokio::test]
    async fn build_results_uses_defaults() {
        let history = FakeHistory::default().with("a.sql", 2, 0);
        let findings =
            build_results(vec![candidate("a.sql", 2, "SELECT 1; -- FIXME: index")], &history).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].annotation.kind, AnnotationKind::Fixme);
        assert!(!findings[0].is_expired);
    }

    #[test]
    fn is_expired_boundaries() {
        let today = date("2025-01-01");
        assert!(is_expired(Some(date("2024-12-31")), today));
        assert!(!is_expired(Some(date("2025-01-01")), today));
        assert!(!is_expired(Some(date("2025-01-02")), today));
        assert!(!is_expired(None, today));
    }

    #[test]
    fn finding_serialises_flat() {
        let finding = Finding {
            file: "a.py".into(),
            line: 4,
            annotation: Annotation {
                kind: AnnotationKind::Todo,
                due_date: None,
                body: "later".into(),
            },
            attribution: Attribution {
                revision_id: "b0546e57f74ec824e6c5cd8601808bd54d6b141e".into(),
                author_name: "aki".into(),
                author_contact: None,
                commit_date: date("2023-05-11"),
            },
            is_expired: false,
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "TODO");
        assert_eq!(json["body"], "later");
        assert!(json["due_date"].is_null());
        assert_eq!(json["attribution"]["commit_date"], "2023-05-11");
        assert_eq!(finding.identifier(), issue_identifier("a.py", AnnotationKind::Todo, "later"));
    }
}
