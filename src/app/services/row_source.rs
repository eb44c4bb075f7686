//! Line sources for the parsers
//!
//! Parsers read their input through the [`RowSource`] trait so the same
//! parsing code runs against files on disk and in-memory fixtures. Line
//! filtering is a free function composed with the source, not a property of
//! it.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the raw lines of one input
pub trait RowSource: Send + Sync {
    /// Read all lines, in order, without filtering
    fn read_rows(&self) -> Result<Vec<String>>;

    /// Human-readable origin used in log and error messages
    fn describe(&self) -> String;
}

/// Lines read from a file on disk
#[derive(Debug, Clone)]
pub struct FileRowSource {
    path: PathBuf,
}

impl FileRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for FileRowSource {
    fn read_rows(&self) -> Result<Vec<String>> {
        let text = read_text(&self.path)?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lines held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticRowSource {
    rows: Vec<String>,
}

impl StaticRowSource {
    pub fn new<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a block of text into lines
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }
}

impl RowSource for StaticRowSource {
    fn read_rows(&self) -> Result<Vec<String>> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        format!("<{} static rows>", self.rows.len())
    }
}

/// Drop lines that are empty or whitespace only
pub fn filter_blank_lines(rows: Vec<String>) -> Vec<String> {
    rows.into_iter().filter(|row| !row.trim().is_empty()).collect()
}

/// Drop blank lines and `;` / `#` comment lines (leading whitespace ignored)
pub fn filter_comment_lines(rows: Vec<String>) -> Vec<String> {
    rows.into_iter()
        .filter(|row| {
            let trimmed = row.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with(';') && !trimmed.starts_with('#')
        })
        .collect()
}

/// Read a text file, honouring a UTF-8 or UTF-16 byte order mark
///
/// Files without a BOM are decoded as UTF-8, replacing invalid sequences.
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("Failed to read file {}", path.display()), e))?;

    let (encoding, bom_length) =
        encoding_rs::Encoding::for_bom(&bytes).unwrap_or((encoding_rs::UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_length..]);

    if had_errors {
        debug!(
            "Replaced malformed {} sequences while reading {}",
            encoding.name(),
            path.display()
        );
    }

    Ok(text.into_owned())
}
