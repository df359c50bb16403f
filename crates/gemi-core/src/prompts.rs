//! System prompt table.
//!
//! Maps a leading query keyword to a system message. The table is loaded from a
//! CSV file with a `Keyword,System Message` header and re-read whenever the
//! launcher reopens the plugin.

use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, info, warn};

const KEYWORD_COLUMN: &str = "Keyword";
const MESSAGE_COLUMN: &str = "System Message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRow {
    pub keyword: String,
    pub message: String,
}

/// Keyword to system message lookup. First matching row wins.
#[derive(Debug, Clone, Default)]
pub struct PromptTable {
    rows: Vec<PromptRow>,
}

impl PromptTable {
    #[must_use]
    pub fn new(rows: Vec<PromptRow>) -> Self {
        Self { rows }
    }

    /// Build a table from `(keyword, message)` pairs
    #[must_use]
    pub fn from_pairs<K, M>(pairs: impl IntoIterator<Item = (K, M)>) -> Self
    where
        K: Into<String>,
        M: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(keyword, message)| PromptRow {
                    keyword: keyword.into(),
                    message: message.into(),
                })
                .collect(),
        )
    }

    /// Load the table from a CSV file.
    ///
    /// A missing file disables prompt selection. A malformed file is logged and
    /// also yields an empty table.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No prompt table at {}", path.display());
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|content| Self::parse(&content));

        match parsed {
            Ok(table) => {
                info!(
                    "Loaded {} system prompts from {}",
                    table.len(),
                    path.display()
                );
                table
            }
            Err(e) => {
                warn!("Ignoring prompt table at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse CSV content with a `Keyword,System Message` header.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the header is missing either column.
    pub fn parse(content: &str) -> Result<Self> {
        let mut records = parse_csv(content.trim_start_matches('\u{feff}')).into_iter();

        let header = records
            .next()
            .ok_or_else(|| Error::Config("prompt table is empty".to_string()))?;
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::Config(format!("prompt table has no '{name}' column")))
        };
        let keyword_idx = column(KEYWORD_COLUMN)?;
        let message_idx = column(MESSAGE_COLUMN)?;

        let rows = records
            .filter_map(|record| {
                let keyword = record.get(keyword_idx)?.trim();
                if keyword.is_empty() {
                    return None;
                }
                Some(PromptRow {
                    keyword: keyword.to_string(),
                    message: record.get(message_idx).cloned().unwrap_or_default(),
                })
            })
            .collect();

        Ok(Self { rows })
    }

    /// Message for `keyword`, compared case-insensitively
    #[must_use]
    pub fn lookup(&self, keyword: &str) -> Option<&str> {
        let keyword = keyword.to_lowercase();
        self.rows
            .iter()
            .find(|row| row.keyword.to_lowercase() == keyword)
            .map(|row| row.message.as_str())
    }

    #[must_use]
    pub(crate) fn rows(&self) -> &[PromptRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split CSV text into records.
///
/// Handles quoted fields with doubled quotes, and commas or newlines inside
/// quotes. Blank lines are skipped.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}
