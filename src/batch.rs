//! Process JSON-lines files of rich text records on the rayon thread pool.

use std::io::{BufRead, Write};

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::plain_text::to_plain_text;
use crate::post::PostDraft;
use crate::sanitizer::sanitize;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Clean rich text markup
    Sanitize,
    /// Reduce markup to plain text
    PlainText,
    /// Validate and prepare a blog post draft
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

#[derive(Serialize)]
struct FailedLine {
    line: usize,
    error: String,
}

/// Run one record through `mode`, returning the JSON to write for it
pub fn process_record(record: &str, mode: Mode) -> Result<String, String> {
    match mode {
        Mode::Sanitize | Mode::PlainText => {
            let mut record: ContentRecord =
                serde_json::from_str(record).map_err(|e| e.to_string())?;
            record.content = match mode {
                Mode::PlainText => to_plain_text(&record.content),
                _ => sanitize(&record.content),
            };
            serde_json::to_string(&record).map_err(|e| e.to_string())
        }
        Mode::Post => {
            let draft: PostDraft = serde_json::from_str(record).map_err(|e| e.to_string())?;
            let prepared = draft.prepare().map_err(|e| e.to_string())?;
            serde_json::to_string(&prepared).map_err(|e| e.to_string())
        }
    }
}

/// Every non-blank line of `reader` is one record. Output lines follow input order; a record that
/// fails becomes a `{"line", "error"}` object instead of stopping the batch.
pub fn process_lines<R, W>(reader: R, mut writer: W, mode: Mode) -> Result<BatchSummary, BatchError>
where
    R: BufRead,
    W: Write,
{
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push((idx + 1, line));
        }
    }

    let results: Vec<(usize, Result<String, String>)> = lines
        .par_iter()
        .map(|(line_number, line)| (*line_number, process_record(line, mode)))
        .collect();

    let mut summary = BatchSummary::default();
    for (line, result) in results {
        let output = match result {
            Ok(output) => {
                summary.processed += 1;
                output
            }
            Err(error) => {
                warn!("line {}: {}", line, error);
                summary.failed += 1;
                serde_json::to_string(&FailedLine { line, error })?
            }
        };
        writeln!(writer, "{}", output)?;
    }
    writer.flush()?;

    Ok(summary)
}
