//! Per-page validation report.

use crate::error::{ErrorCode, Issue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of validating one page.
///
/// `valid` is true exactly when `errors` is empty; use [`push`](Self::push)
/// to add issues so the flag stays in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// The page's `content.json`
    pub source: PathBuf,

    /// Page number, when the document declares a usable one
    pub page_number: Option<u32>,

    /// Set when `page_number` comes from the directory name because the
    /// document could not be read
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub page_number_inferred: bool,

    /// Whether the page passed every check
    pub valid: bool,

    /// Issues in discovery order
    pub errors: Vec<Issue>,
}

impl ValidationReport {
    /// Create a report from a list of issues.
    pub fn new(source: impl Into<PathBuf>, page_number: Option<u32>, errors: Vec<Issue>) -> Self {
        Self {
            source: source.into(),
            page_number,
            page_number_inferred: false,
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Create a passing report.
    pub fn success(source: impl Into<PathBuf>, page_number: Option<u32>) -> Self {
        Self::new(source, page_number, Vec::new())
    }

    /// Mark the page number as taken from the directory name.
    pub fn with_inferred_page_number(mut self) -> Self {
        self.page_number_inferred = true;
        self
    }

    /// The page number, if the document itself declares it.
    pub fn declared_page_number(&self) -> Option<u32> {
        self.page_number.filter(|_| !self.page_number_inferred)
    }

    /// Add an issue, marking the report invalid.
    pub fn push(&mut self, issue: Issue) {
        self.errors.push(issue);
        self.valid = false;
    }

    /// Check if the page passed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of issues.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Check if any issue has the given code.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Issue codes in order, for quick assertions and summaries.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;

    #[test]
    fn test_report_validity_tracks_errors() {
        let mut report = ValidationReport::success("pages/01/content.json", Some(1));
        assert!(report.is_valid());
        assert_eq!(report.error_count(), 0);

        report.push(Issue::missing_file(
            Location::new().page(1).block(0),
            "text file `a.txt` does not exist",
        ));
        assert!(!report.is_valid());
        assert!(report.has_code(ErrorCode::MissingFile));
        assert_eq!(report.codes(), vec![ErrorCode::MissingFile]);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ValidationReport::success("content.json", Some(4));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pageNumber"], 4);
        assert_eq!(json["valid"], true);
        assert!(json.get("pageNumberInferred").is_none());
    }

    #[test]
    fn test_inferred_page_number_is_not_declared() {
        let report = ValidationReport::success("pages/3/content.json", Some(3));
        assert_eq!(report.declared_page_number(), Some(3));

        let report = report.with_inferred_page_number();
        assert_eq!(report.page_number, Some(3));
        assert_eq!(report.declared_page_number(), None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pageNumberInferred"], true);
    }
}
