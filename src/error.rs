//! Error types for pagetex.
//!
//! Two layers live here. [`Error`] is the `Result` error of library calls.
//! [`Issue`] is one actionable finding (schema violation, markdown
//! contamination, missing file, ...) tagged with an [`ErrorCode`] and a
//! [`Location`]; issues are collected into validation reports rather than
//! returned one at a time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagetex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while validating or assembling pages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON input or output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table row does not have as many cells as the first row.
    #[error("{location}: table row {row} has {found} cells, expected {expected}")]
    InconsistentTable {
        /// Where the table block lives
        location: Location,
        /// Row index (0-based)
        row: usize,
        /// Column count of the first row
        expected: usize,
        /// Column count of the offending row
        found: usize,
    },

    /// Cross-page conflicts that make the document unassemblable.
    #[error("assembly aborted by {} conflict(s): {}", .0.len(), summarize(.0))]
    Conflicts(Vec<Issue>),

    /// The project has no pages directory.
    #[error("No pages directory found at {0}")]
    PagesNotFound(PathBuf),

    /// Invalid page selection specification.
    #[error("Invalid page selection: {0}")]
    InvalidPageSelection(String),

    /// Invalid document configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The taxonomy code of this error, if it belongs to the taxonomy.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::InconsistentTable { .. } => Some(ErrorCode::InconsistentTable),
            Error::Conflicts(issues) => issues.first().map(|i| i.code),
            _ => None,
        }
    }

    /// Issues carried by this error (empty unless it is a conflict error).
    pub fn issues(&self) -> &[Issue] {
        match self {
            Error::Conflicts(issues) => issues,
            _ => &[],
        }
    }

    /// Convert a page-local error into an issue for that page's report.
    ///
    /// Returns `None` for errors that are not scoped to a single page.
    pub fn page_issue(&self) -> Option<Issue> {
        match self {
            Error::InconsistentTable {
                location,
                row,
                expected,
                found,
            } => Some(Issue::new(
                ErrorCode::InconsistentTable,
                location.clone(),
                format!("row {} has {} cells, expected {}", row, found, expected),
            )),
            _ => None,
        }
    }
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error taxonomy shared by reports and assembly errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Structural JSON violation
    SchemaError,
    /// Markdown contamination in plain text
    TextPolicyError,
    /// Referenced text or image file is absent or unreadable
    MissingFile,
    /// Ragged table data
    InconsistentTable,
    /// The same label is used by two blocks
    DuplicateLabel,
    /// A citation id is reused with a different body
    CitationConflict,
    /// Two pages share a page number
    DuplicatePageNumber,
}

impl ErrorCode {
    /// The canonical upper-case name (e.g. `SCHEMA_ERROR`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchemaError => "SCHEMA_ERROR",
            ErrorCode::TextPolicyError => "TEXT_POLICY_ERROR",
            ErrorCode::MissingFile => "MISSING_FILE",
            ErrorCode::InconsistentTable => "INCONSISTENT_TABLE",
            ErrorCode::DuplicateLabel => "DUPLICATE_LABEL",
            ErrorCode::CitationConflict => "CITATION_CONFLICT",
            ErrorCode::DuplicatePageNumber => "DUPLICATE_PAGE_NUMBER",
        }
    }

    /// Whether this code is only detectable across pages.
    pub fn is_cross_page(&self) -> bool {
        matches!(
            self,
            ErrorCode::DuplicateLabel
                | ErrorCode::CitationConflict
                | ErrorCode::DuplicatePageNumber
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an issue was found.
///
/// Every part is optional; the display form lists whatever is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Page number of the page the issue belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    /// File the issue was found in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Content block index (0-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<usize>,

    /// JSON pointer of the offending field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Line number within `file` (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Location {
    /// Create an empty location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page number.
    pub fn page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Set the page number if one is known.
    pub fn page_or_none(mut self, page_number: Option<u32>) -> Self {
        self.page_number = page_number;
        self
    }

    /// Set the file.
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the block index.
    pub fn block(mut self, index: usize) -> Self {
        self.block = Some(index);
        self
    }

    /// Set the field pointer.
    pub fn field(mut self, pointer: impl Into<String>) -> Self {
        self.field = Some(pointer.into());
        self
    }

    /// Set the line number.
    pub fn line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Fill in page and file where they are not already set.
    pub fn or_context(mut self, page_number: Option<u32>, file: &std::path::Path) -> Self {
        if self.page_number.is_none() {
            self.page_number = page_number;
        }
        if self.file.is_none() {
            self.file = Some(file.to_path_buf());
        }
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(page) = self.page_number {
            parts.push(format!("page {}", page));
        }
        if let Some(ref file) = self.file {
            parts.push(file.display().to_string());
        }
        if let Some(block) = self.block {
            parts.push(format!("block {}", block));
        }
        if let Some(ref field) = self.field {
            parts.push(field.clone());
        }
        if let Some(line) = self.line {
            parts.push(format!("line {}", line));
        }
        if parts.is_empty() {
            f.write_str("<document>")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// A single actionable finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Taxonomy code
    pub code: ErrorCode,

    /// Where it was found
    pub location: Location,

    /// Human-readable explanation
    pub message: String,
}

impl Issue {
    /// Create a new issue.
    pub fn new(code: ErrorCode, location: Location, message: impl Into<String>) -> Self {
        Self {
            code,
            location,
            message: message.into(),
        }
    }

    /// Create a schema issue.
    pub fn schema(location: Location, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SchemaError, location, message)
    }

    /// Create a missing-file issue.
    pub fn missing_file(location: Location, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingFile, location, message)
    }

    /// Attach page number and file where the location lacks them.
    pub fn in_page(mut self, page_number: Option<u32>, file: &std::path::Path) -> Self {
        self.location = self.location.or_context(page_number, file);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.location, self.message)
    }
}
