//! Document assembly.
//!
//! [`AssemblyContext`] is threaded through rendering and records every
//! page number, label and citation it sees. Conflicts are collected rather
//! than raised, so a single [`finish`](AssemblyContext::finish) call reports
//! all of them at once.

mod bibliography;
mod document;

pub use bibliography::{BibEntry, Bibliography, Insertion};
pub use document::{Document, DocumentOptions, ManifestEntry, BIBLIOGRAPHY_FILE};

use crate::error::{Error, ErrorCode, Issue, Location, Result};
use crate::render::Fragment;
use crate::validate::LoadedPage;
use std::collections::HashMap;
use std::path::PathBuf;

/// Where a label was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSite {
    /// Page number
    pub page_number: u32,

    /// Page document
    pub file: PathBuf,

    /// Block index
    pub block: usize,
}

impl LabelSite {
    fn location(&self) -> Location {
        Location::new()
            .page(self.page_number)
            .file(&self.file)
            .block(self.block)
    }
}

/// Accumulator of cross-page state.
#[derive(Debug, Default)]
pub struct AssemblyContext {
    pages: HashMap<u32, PathBuf>,
    labels: HashMap<String, LabelSite>,
    bibliography: Bibliography,
    issues: Vec<Issue>,
}

impl AssemblyContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rendered page: its number, labels and references.
    pub fn record_page(&mut self, page: &LoadedPage) {
        let number = page.number();
        if let Some(previous) = self.pages.get(&number) {
            let message = format!(
                "page number {} is also used by {}",
                number,
                previous.display()
            );
            self.issues.push(Issue::new(
                ErrorCode::DuplicatePageNumber,
                Location::new().page(number).file(&page.source),
                message,
            ));
        } else {
            self.pages.insert(number, page.source.clone());
        }

        for (block, label) in page.page.labels() {
            self.record_label(
                label,
                LabelSite {
                    page_number: number,
                    file: page.source.clone(),
                    block,
                },
            );
        }

        for (i, reference) in page.page.references.iter().enumerate() {
            let location = Location::new()
                .page(number)
                .file(&page.source)
                .field(format!("/references/{}", i));
            self.record_citation(&reference.id, &reference.citation, location);
        }
    }

    /// Record a label definition.
    pub fn record_label(&mut self, label: &str, site: LabelSite) {
        match self.labels.get(label) {
            Some(first) => {
                let message = format!(
                    "label `{}` is already defined on page {} (block {})",
                    label, first.page_number, first.block
                );
                self.issues.push(Issue::new(
                    ErrorCode::DuplicateLabel,
                    site.location().field(format!("/content/{}/data/label", site.block)),
                    message,
                ));
            }
            None => {
                self.labels.insert(label.to_string(), site);
            }
        }
    }

    /// Record a citation; identical bodies for one id merge.
    pub fn record_citation(&mut self, id: &str, citation: &str, location: Location) {
        let page = location.page_number.unwrap_or_default();
        if let Insertion::Conflict(existing) = self.bibliography.insert(id, citation, page) {
            self.issues.push(Issue::new(
                ErrorCode::CitationConflict,
                location,
                format!(
                    "citation `{}` differs from the one introduced on page {}",
                    id, existing.first_page
                ),
            ));
        }
    }

    /// Where a label was first defined.
    pub fn label(&self, label: &str) -> Option<&LabelSite> {
        self.labels.get(label)
    }

    /// Number of distinct pages recorded.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The bibliography collected so far.
    pub fn bibliography(&self) -> &Bibliography {
        &self.bibliography
    }

    /// Conflicts collected so far.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Check if any conflict was recorded.
    pub fn has_conflicts(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Merge fragments into a document.
    ///
    /// Fails with every recorded conflict if there is any.
    pub fn finish(self, mut fragments: Vec<Fragment>) -> Result<Document> {
        if !self.issues.is_empty() {
            return Err(Error::Conflicts(self.issues));
        }
        fragments.sort_by_key(|f| f.page_number);
        log::debug!(
            "Assembling {} fragment(s) with {} bibliography entries",
            fragments.len(),
            self.bibliography.len()
        );
        Ok(Document::from_fragments(&fragments, self.bibliography))
    }
}
