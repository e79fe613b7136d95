//! Rendering of findings: terminal table, markdown job summary, JSON.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use todo_expiry_core::Finding;
use todo_expiry_github::RepoContext;

const MAX_COMMENT_CHARS: usize = 60;

// ── Terminal ──

/// Fixed-width table, one finding per row. Expired deadlines carry a `!`.
pub fn render_table(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No TODO comments found.\n".to_string();
    }

    let mut out = format!(
        "{:<12} {:<5} {:<40} {:<10} {:<16} {}\n",
        "Deadline", "Type", "Location", "Updated", "Author", "Comment"
    );
    for f in findings {
        let deadline = match f.annotation.due_date {
            Some(d) if f.is_expired => format!("!{}", d.format("%Y-%m-%d")),
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "{:<12} {:<5} {:<40} {:<10} {:<16} {}\n",
            deadline,
            f.annotation.kind,
            format!("{}:{}", f.file, f.line),
            f.attribution.commit_date.format("%Y-%m-%d").to_string(),
            author(f),
            shorten(&f.annotation.body),
        ));
    }
    out
}

fn shorten(text: &str) -> String {
    if text.chars().count() > MAX_COMMENT_CHARS {
        let head: String = text.chars().take(MAX_COMMENT_CHARS - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn author(f: &Finding) -> &str {
    if f.attribution.author_name.is_empty() {
        "-"
    } else {
        &f.attribution.author_name
    }
}

// ── Markdown ──

/// Job-summary markdown. Links are emitted only when `context` is known.
pub fn render_markdown(findings: &[Finding], context: Option<&RepoContext>) -> String {
    let mut out = String::from("## :heavy_check_mark: TODO Comments\n\n");
    out.push_str(
        "| Deadline :alarm_clock: | Type :pencil2: | Comment :memo: | File :link: | Updated :date: | Author :sunglasses: |\n",
    );
    out.push_str("| --- | --- | --- | --- | --- | --- |\n");

    for f in findings {
        let deadline = match f.annotation.due_date {
            Some(d) if f.is_expired => format!(":bomb: {}", d.format("%Y-%m-%d")),
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => String::new(),
        };
        let location = format!("{}:{}", f.file, f.line);
        let updated = f.attribution.commit_date.format("%Y-%m-%d").to_string();
        let (file_cell, updated_cell) = match context {
            Some(ctx) => (
                format!("[{}]({})", location, ctx.blob_url(&f.file, f.line)),
                format!("[{}]({})", updated, ctx.commit_url(&f.attribution.revision_id)),
            ),
            None => (location, updated),
        };
        let author = if f.attribution.author_name.is_empty() {
            ":ghost:"
        } else {
            f.attribution.author_name.as_str()
        };

        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            deadline,
            f.annotation.kind,
            escape_cell(&f.annotation.body),
            file_cell,
            updated_cell,
            escape_cell(author),
        ));
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Append `markdown` to the summary file, creating it if needed.
pub fn append_summary(path: &Path, markdown: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening summary file {}", path.display()))?;
    file.write_all(markdown.as_bytes())
        .with_context(|| format!("writing summary file {}", path.display()))?;
    Ok(())
}

// ── JSON ──

pub fn render_json(findings: &[Finding]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(findings).context("serialising findings")
}
