//! Scan pipeline: enumerate candidates → attribute via blame → classify.

use std::time::Instant;

use todo_expiry_core::{CandidateLine, Finding, HistoryLookup, Pipeline, PipelineError, any_expired};
use todo_expiry_git::GitRepo;
use tracing::debug;

pub struct ScanStats {
    pub findings: Vec<Finding>,
    pub elapsed_secs: f64,
}

impl ScanStats {
    pub fn expired_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_expired).count()
    }

    pub fn has_expired(&self) -> bool {
        any_expired(&self.findings)
    }
}

/// Run the full scan against a working tree. Enumeration failure and an
/// elapsed deadline are fatal; everything else drops single lines.
pub async fn run_scan(repo: &GitRepo, pipeline: &Pipeline) -> Result<ScanStats, PipelineError> {
    let candidates = repo
        .list_candidates()
        .await
        .map_err(|e| PipelineError::Enumeration(Box::new(e)))?;
    attribute(candidates, repo, pipeline).await
}

async fn attribute<L>(
    candidates: Vec<CandidateLine>,
    lookup: &L,
    pipeline: &Pipeline,
) -> Result<ScanStats, PipelineError>
where
    L: HistoryLookup + ?Sized,
{
    let start = Instant::now();
    let findings = pipeline.run(candidates, lookup).await?;
    let elapsed_secs = start.elapsed().as_secs_f64();

    if let Ok(json) = serde_json::to_string(&findings) {
        debug!(findings = %json, "sorted results");
    }

    Ok(ScanStats {
        findings,
        elapsed_secs,
    })
}
