//! CSV output of an evaluation run.
//!
//! UTF-8 with a byte order mark, `;` separated and CRLF terminated so the file
//! opens cleanly in spreadsheet tools with a German locale.

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use groundqa_core::{Error, Result};

use crate::harness::EvalReport;

const BOM: &[u8] = b"\xEF\xBB\xBF";
const HEADER: [&str; 6] = ["question", "rag_answer", "rag_abstain", "rag_sources", "no_rag_answer", "no_rag_abstain"];

pub fn report_file_name(at: &DateTime<Local>) -> String {
    format!("mini_eval_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

const MAX_NAME_ATTEMPTS: usize = 100;

/// Create a fresh report file, suffixing `_1`, `_2`, ... when a run in the
/// same second already took the plain name. Existing files are never truncated.
fn create_report_file(out_dir: &Path, at: &DateTime<Local>) -> Result<(File, PathBuf)> {
    let name = report_file_name(at);
    let stem = name.trim_end_matches(".csv");
    for n in 0..MAX_NAME_ATTEMPTS {
        let path = if n == 0 { out_dir.join(&name) } else { out_dir.join(format!("{stem}_{n}.csv")) };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::Operation(format!("no free report name for {name} in {}", out_dir.display())))
}

fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn csv_error(e: csv::Error) -> Error {
    Error::Operation(format!("failed to write evaluation CSV: {e}"))
}

/// Write `report` to a new timestamped file in `out_dir` and return its path.
pub fn write_report(report: &EvalReport, out_dir: &Path, at: &DateTime<Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let (mut file, path) = create_report_file(out_dir, at)?;
    file.write_all(BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);
    writer.write_record(HEADER).map_err(csv_error)?;
    for row in &report.rows {
        writer
            .write_record([
                row.question.as_str(),
                row.rag_answer.as_str(),
                flag(row.rag_abstain),
                row.rag_sources.as_str(),
                row.no_rag_answer.as_str(),
                flag(row.no_rag_abstain),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = report.rows.len(), "wrote evaluation report");
    Ok(path)
}
