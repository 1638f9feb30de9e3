//! Comma-delimited text output, one file per currency.
//!
//! File name: `{currency}_{start}_{end}.txt`. First line is the header (the
//! first seven header fields), then one line per row. A currency without
//! records gets a single sentinel line. Files are always rewritten from
//! scratch.

use crate::error::{ScrapeError, ScrapeResult};
use crate::model::{CurrencyResult, Extraction, Query};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Receives finished extractions.
pub trait ResultSink {
    /// Persist one currency's result and report where it went.
    fn write(&mut self, extraction: &Extraction) -> ScrapeResult<PathBuf>;
}

/// Writes each extraction to a text file in a directory.
#[derive(Debug, Clone)]
pub struct TextFileSink {
    dir: PathBuf,
    columns: usize,
    sentinel: String,
}

impl TextFileSink {
    /// Create the sink, creating the output directory if needed.
    pub fn create(
        dir: impl Into<PathBuf>,
        columns: usize,
        sentinel: impl Into<String>,
    ) -> ScrapeResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            columns,
            sentinel: sentinel.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, query: &Query) -> PathBuf {
        self.dir.join(file_name(query))
    }
}

impl ResultSink for TextFileSink {
    fn write(&mut self, extraction: &Extraction) -> ScrapeResult<PathBuf> {
        let path = self.path_for(&extraction.query);
        let body = render(&extraction.result, self.columns, &self.sentinel)?;
        let mut file = std::fs::File::create(&path)?;
        file.write_all(body.as_bytes())?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Keeps extractions in memory instead of writing files.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub extractions: Vec<Extraction>,
}

impl ResultSink for MemorySink {
    fn write(&mut self, extraction: &Extraction) -> ScrapeResult<PathBuf> {
        self.extractions.push(extraction.clone());
        Ok(PathBuf::from(file_name(&extraction.query)))
    }
}

/// `{currency}_{start}_{end}.txt`
pub fn file_name(query: &Query) -> String {
    format!(
        "{}_{}_{}.txt",
        query.currency,
        query.start_text(),
        query.end_text()
    )
}

/// Render a result as file contents.
pub fn render(result: &CurrencyResult, columns: usize, sentinel: &str) -> ScrapeResult<String> {
    match result {
        CurrencyResult::NoRecords => Ok(format!("{sentinel}\n")),
        CurrencyResult::Records { header, rows } => {
            if header.len() < columns {
                return Err(ScrapeError::MalformedHeader {
                    fields: header.len(),
                });
            }
            let mut out = header[..columns].join(",");
            out.push('\n');
            for row in rows.rows() {
                out.push_str(&row.join(","));
                out.push('\n');
            }
            Ok(out)
        }
    }
}
