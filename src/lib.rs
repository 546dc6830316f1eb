//! # pagetex
//!
//! Validate per-page JSON content descriptions and assemble them into a
//! single LaTeX document.
//!
//! A project keeps one directory per page under `pages/`, each with a
//! `content.json` describing the page's title and an ordered list of typed
//! content blocks (text, images, tables, code, equations, listings) plus the
//! references it cites.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagetex::Pagetex;
//!
//! fn main() -> pagetex::Result<()> {
//!     let output = Pagetex::new("thesis").assemble()?;
//!     println!("{} pages -> {}", output.page_count(), output.document.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Schema**: every page is checked against the content model and every
//!   issue is reported with its JSON field path.
//! - **Text policy**: plain text must not contain markdown (headings, list
//!   markers, emphasis, code fences); math and LaTeX macros are exempt.
//! - **Rendering**: valid pages become LaTeX fragments; labels and captions
//!   are emitted exactly as written.
//! - **Assembly**: fragments are ordered by page number, labels and
//!   citations are checked across pages, and `main.tex`, `references.bib`
//!   and `manifest.json` are written only when nothing conflicts.

pub mod assemble;
pub mod error;
pub mod model;
pub mod policy;
pub mod project;
pub mod render;
pub mod schema;
pub mod validate;

// Re-export commonly used types
pub use assemble::{AssemblyContext, Bibliography, Document, DocumentOptions, ManifestEntry};
pub use error::{Error, ErrorCode, Issue, Location, Result};
pub use model::{ContentBlock, Page, Reference, SectionLevel};
pub use policy::{check_plain_text, PolicyRule, Violation};
pub use project::{AssembleOutput, CleanSummary, Manifest, PageSource, ProjectLayout};
pub use render::{Fragment, LatexRenderer, PageSelection, RenderOptions, RenderStats};
pub use validate::{LoadedPage, PageValidator, ValidationReport};

use std::path::{Path, PathBuf};
use validate::{check_page_numbers, PageOutcome};

/// Validate every page of the project at `root`.
///
/// # Example
///
/// ```no_run
/// let reports = pagetex::validate("thesis").unwrap();
/// let failed = reports.iter().filter(|r| !r.is_valid()).count();
/// println!("{} of {} pages failed", failed, reports.len());
/// ```
pub fn validate<P: AsRef<Path>>(root: P) -> Result<Vec<ValidationReport>> {
    Pagetex::new(root.as_ref()).validate()
}

/// Validate and assemble the project at `root`.
pub fn assemble<P: AsRef<Path>>(root: P) -> Result<AssembleOutput> {
    Pagetex::new(root.as_ref()).assemble()
}

/// Remove build artifacts of the project at `root`.
pub fn clean<P: AsRef<Path>>(root: P) -> Result<CleanSummary> {
    Pagetex::new(root.as_ref()).clean()
}

/// Validate a single page document outside any project.
///
/// Relative text and image paths resolve against the file's directory.
pub fn validate_file<P: AsRef<Path>>(path: P) -> ValidationReport {
    let path = path.as_ref();
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut source = PageSource::new(&dir, dir.clone());
    source.json_path = path.to_path_buf();
    PageValidator::new().validate(&source).report
}

/// Builder for validating and assembling a project.
///
/// # Example
///
/// ```no_run
/// use pagetex::{Pagetex, PageSelection};
///
/// let reports = Pagetex::new("thesis")
///     .with_pages(PageSelection::parse("1-10")?)
///     .sequential()
///     .validate()?;
/// # Ok::<(), pagetex::Error>(())
/// ```
pub struct Pagetex {
    layout: ProjectLayout,
    selection: PageSelection,
    parallel: bool,
    validator: PageValidator,
    render_options: RenderOptions,
    document_options: Option<DocumentOptions>,
}

impl Pagetex {
    /// Create a builder for the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: ProjectLayout::new(root),
            selection: PageSelection::All,
            parallel: true,
            validator: PageValidator::new(),
            render_options: RenderOptions::default(),
            document_options: None,
        }
    }

    /// Restrict processing to the selected page numbers.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Disable parallel validation.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable image existence checks.
    pub fn with_image_checks(mut self, check: bool) -> Self {
        self.validator = self.validator.with_image_checks(check);
        self
    }

    /// Set render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Set document options, overriding `pagetex.json`.
    pub fn with_document_options(mut self, options: DocumentOptions) -> Self {
        self.document_options = Some(options);
        self
    }

    /// The project layout.
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Validate the selected pages.
    ///
    /// Reports are ordered by page number. Pages sharing a page number all
    /// carry a `DUPLICATE_PAGE_NUMBER` issue.
    pub fn validate(&self) -> Result<Vec<ValidationReport>> {
        let (mut reports, _) = self.load()?;
        check_page_numbers(&mut reports);
        let failed = reports.iter().filter(|r| !r.is_valid()).count();
        log::info!(
            "Validated {} page(s): {} valid, {} invalid",
            reports.len(),
            reports.len() - failed,
            failed
        );
        Ok(reports)
    }

    /// Validate, render and assemble the selected pages.
    ///
    /// Invalid pages are skipped and keep their reports. Duplicate page
    /// numbers, duplicate labels and conflicting citations abort the
    /// assembly before anything is written.
    pub fn assemble(&self) -> Result<AssembleOutput> {
        let document_options = match self.document_options {
            Some(ref options) => options.clone(),
            None => self.layout.document_options()?,
        };

        let (mut reports, pages) = self.load()?;
        let duplicates = check_page_numbers(&mut reports);
        if !duplicates.is_empty() {
            return Err(Error::Conflicts(duplicates));
        }

        let mut renderer = LatexRenderer::new(self.render_options.clone());
        let mut ctx = AssemblyContext::new();
        let mut fragments = Vec::new();

        for (report, page) in reports.iter_mut().zip(pages) {
            let Some(page) = page else {
                log::warn!(
                    "Skipping {}: {} issue(s)",
                    report.source.display(),
                    report.error_count()
                );
                continue;
            };
            match renderer.render_page(&page, &mut ctx) {
                Ok(fragment) => fragments.push(fragment),
                Err(e) => match e.page_issue() {
                    Some(issue) => {
                        log::warn!("Skipping page {}: {}", page.number(), issue);
                        report.push(issue);
                    }
                    None => return Err(e),
                },
            }
        }

        let document = ctx.finish(fragments.clone())?;
        let artifacts = self
            .layout
            .write_artifacts(&fragments, &document, &document_options)?;

        log::info!(
            "Assembled {} page(s) into {}",
            document.entries.len(),
            artifacts.document.display()
        );

        Ok(AssembleOutput {
            reports,
            fragments: artifacts.fragments,
            bibliography: artifacts.bibliography,
            document: artifacts.document,
            manifest: artifacts.manifest,
            stats: renderer.into_stats(),
        })
    }

    /// Remove build artifacts.
    pub fn clean(&self) -> Result<CleanSummary> {
        let summary = self.layout.clean()?;
        log::info!("Removed {} build director(ies)", summary.removed.len());
        Ok(summary)
    }

    /// Discover, filter and validate pages.
    fn load(&self) -> Result<(Vec<ValidationReport>, Vec<Option<LoadedPage>>)> {
        let mut sources = self.layout.discover_pages()?;
        if !self.selection.is_all() {
            sources.retain(|s| {
                s.peek_page_number()
                    .is_some_and(|n| self.selection.includes(n))
            });
        }
        log::debug!("Validating {} page(s)", sources.len());

        let outcomes = self.validator.validate_all(&sources, self.parallel);
        Ok(outcomes
            .into_iter()
            .map(|PageOutcome { report, page }| (report, page))
            .unzip())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_page(root: &Path, dir: &str, json: &str) {
        let dir = root.join("pages").join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("content.json"), json).unwrap();
    }

    #[test]
    fn test_builder_defaults() {
        let builder = Pagetex::new("thesis");
        assert!(builder.parallel);
        assert!(builder.selection.is_all());
        assert_eq!(builder.layout().tex_dir(), PathBuf::from("thesis/build/tex"));

        let builder = builder.sequential().with_pages(PageSelection::Pages(vec![2]));
        assert!(!builder.parallel);
        assert!(builder.selection.includes(2));
    }

    #[test]
    fn test_validate_filters_pages() {
        let root = TempDir::new().unwrap();
        write_page(root.path(), "01", r#"{"title": "A", "pageNumber": 1}"#);
        write_page(root.path(), "02", r#"{"title": "B", "pageNumber": 2}"#);
        write_page(root.path(), "03", r#"{"title": "C"}"#);

        let reports = Pagetex::new(root.path())
            .with_pages(PageSelection::parse("2-3").unwrap())
            .validate()
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_valid());
        // Selected through its directory name, but the document itself
        // declares no page number.
        assert!(!reports[1].is_valid());
        assert_eq!(reports[1].page_number, None);
    }

    #[test]
    fn test_validate_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.json");
        fs::write(
            &path,
            r#"{"title": "T", "pageNumber": 1, "content": [{"type": "text", "data": {"textPath": "a.txt"}}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("a.txt"), "Plain.").unwrap();
        assert!(validate_file(&path).is_valid());

        fs::write(dir.path().join("a.txt"), "- item").unwrap();
        assert!(validate_file(&path).has_code(ErrorCode::TextPolicyError));
    }

    #[test]
    fn test_assemble_skips_ragged_table_page() {
        let root = TempDir::new().unwrap();
        write_page(root.path(), "01", r#"{"title": "A", "pageNumber": 1}"#);
        write_page(
            root.path(),
            "02",
            r#"{"title": "B", "pageNumber": 2, "content": [
                {"type": "table", "data": {"tableData": [["a", "b", "c"], ["1", "2", "3"], ["4", "5"]]}}
            ]}"#,
        );

        let output = assemble(root.path()).unwrap();
        assert_eq!(output.page_count(), 1);
        let skipped: Vec<_> = output.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].has_code(ErrorCode::InconsistentTable));
        assert!(!root.path().join("build/tex/page_2.tex").exists());
    }
}
