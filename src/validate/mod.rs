//! Page validation.
//!
//! [`PageValidator`] runs the schema model first, then the text policy on
//! every text block whose shape is valid, then file-existence checks. All
//! issues are aggregated into one [`ValidationReport`] per page; a page that
//! passes is returned as a [`LoadedPage`] ready for rendering.

mod report;

pub use report::ValidationReport;

use crate::error::{ErrorCode, Issue, Location, Result};
use crate::model::{Page, TextData};
use crate::policy;
use crate::project::PageSource;
use crate::schema;
use rayon::prelude::*;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// A page that passed validation, together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// The typed page
    pub page: Page,

    /// Path of the page document
    pub source: PathBuf,

    /// Page directory on disk; relative paths resolve against it
    pub dir: PathBuf,

    /// Page directory as seen from the project root, used for image paths
    pub asset_dir: PathBuf,

    /// Contents of `textPath` files read during validation, by block index
    pub texts: HashMap<usize, String>,
}

impl LoadedPage {
    /// Wrap a page living in `dir`.
    pub fn new(page: Page, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            page,
            source: dir.join(crate::project::PAGE_FILE),
            asset_dir: dir.clone(),
            dir,
            texts: HashMap::new(),
        }
    }

    /// Set the project-relative directory used for image paths.
    pub fn with_asset_dir(mut self, asset_dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = asset_dir.into();
        self
    }

    /// Page number shortcut.
    pub fn number(&self) -> u32 {
        self.page.page_number
    }

    /// The text of a text block, reading its file if it was not preloaded.
    pub fn resolve_text<'a>(&'a self, index: usize, data: &'a TextData) -> Result<Cow<'a, str>> {
        match data {
            TextData::Inline { text } => Ok(Cow::Borrowed(text.as_str())),
            TextData::File { text_path } => match self.texts.get(&index) {
                Some(text) => Ok(Cow::Borrowed(text.as_str())),
                None => Ok(Cow::Owned(fs::read_to_string(self.dir.join(text_path))?)),
            },
        }
    }
}

/// Outcome of validating one page source.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    /// The report, valid or not
    pub report: ValidationReport,

    /// The loaded page, present only when the report is valid
    pub page: Option<LoadedPage>,
}

impl PageOutcome {
    fn rejected(report: ValidationReport) -> Self {
        Self { report, page: None }
    }
}

/// Validates page documents against the schema and text policy.
#[derive(Debug, Clone)]
pub struct PageValidator {
    check_images: bool,
}

impl PageValidator {
    /// Create a validator with all checks enabled.
    pub fn new() -> Self {
        Self { check_images: true }
    }

    /// Enable or disable image existence checks.
    pub fn with_image_checks(mut self, check: bool) -> Self {
        self.check_images = check;
        self
    }

    /// Validate many pages, optionally in parallel.
    ///
    /// Outcomes are ordered by page number, then by source path; pages
    /// without a usable page number come last.
    pub fn validate_all(&self, sources: &[PageSource], parallel: bool) -> Vec<PageOutcome> {
        let mut outcomes: Vec<PageOutcome> = if parallel {
            sources.par_iter().map(|s| self.validate(s)).collect()
        } else {
            sources.iter().map(|s| self.validate(s)).collect()
        };
        outcomes.sort_by(|a, b| {
            let key = |o: &PageOutcome| (o.report.page_number.unwrap_or(u32::MAX), o.report.source.clone());
            key(a).cmp(&key(b))
        });
        outcomes
    }

    /// Read and validate one page source.
    pub fn validate(&self, source: &PageSource) -> PageOutcome {
        log::debug!("Validating {}", source.json_path.display());
        match read_page_json(&source.json_path) {
            Ok(value) => self.validate_value(&value, source),
            Err(issue) => PageOutcome::rejected(
                ValidationReport::new(source.json_path.clone(), source.fallback_number(), vec![issue])
                    .with_inferred_page_number(),
            ),
        }
    }

    /// Validate an already-parsed page document.
    pub fn validate_value(&self, value: &Value, source: &PageSource) -> PageOutcome {
        let file = source.json_path.as_path();
        let page_number = schema::page_number_of(value);

        let mut issues: Vec<Issue> = schema::validate_page(value)
            .into_iter()
            .map(|issue| issue.in_page(page_number, file))
            .collect();

        // Blocks with a broken shape get no further checks.
        let broken: HashSet<usize> = issues.iter().filter_map(|i| i.location.block).collect();
        let mut texts = HashMap::new();

        let blocks = value
            .get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (index, block) in blocks.iter().enumerate() {
            if broken.contains(&index) {
                continue;
            }
            let data = &block["data"];
            match block["type"].as_str() {
                Some("text") => match check_text(index, data, source, page_number) {
                    Ok(Some(text)) => {
                        texts.insert(index, text);
                    }
                    Ok(None) => {}
                    Err(found) => issues.extend(found),
                },
                Some("image") if self.check_images => {
                    if let Some(issue) = check_image(index, data, source, page_number) {
                        issues.push(issue);
                    }
                }
                _ => {}
            }
        }

        let mut report = ValidationReport::new(file, page_number, issues);
        if !report.is_valid() {
            log::debug!(
                "{} failed validation with {} issue(s)",
                file.display(),
                report.error_count()
            );
            return PageOutcome::rejected(report);
        }

        match schema::parse_page(value) {
            Ok(page) => PageOutcome {
                report,
                page: Some(LoadedPage {
                    page,
                    source: file.to_path_buf(),
                    dir: source.dir.clone(),
                    asset_dir: source.relative_dir.clone(),
                    texts,
                }),
            },
            Err(e) => {
                report.push(Issue::schema(
                    Location::new().page_or_none(page_number).file(file),
                    format!("page does not match the content model: {}", e),
                ));
                PageOutcome::rejected(report)
            }
        }
    }
}

impl Default for PageValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn read_page_json(path: &Path) -> std::result::Result<Value, Issue> {
    let raw = fs::read_to_string(path).map_err(|e| {
        Issue::missing_file(
            Location::new().file(path),
            format!("cannot read page document: {}", e),
        )
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        Issue::schema(
            Location::new().file(path).line(e.line()),
            format!("invalid JSON: {}", e),
        )
    })
}

/// Run the text policy on a shape-valid text block.
///
/// Returns the file contents for `textPath` blocks so rendering does not
/// read the file again.
fn check_text(
    index: usize,
    data: &Value,
    source: &PageSource,
    page_number: Option<u32>,
) -> std::result::Result<Option<String>, Vec<Issue>> {
    let base = Location::new()
        .page_or_none(page_number)
        .block(index);

    let (content, origin, owned) = if let Some(text) = data["text"].as_str() {
        let origin = base
            .clone()
            .file(&source.json_path)
            .field(format!("/content/{}/data/text", index));
        (text.to_string(), origin, false)
    } else if let Some(rel) = data["textPath"].as_str() {
        let path = source.dir.join(rel);
        let origin = base
            .clone()
            .file(&path)
            .field(format!("/content/{}/data/textPath", index));
        match fs::read_to_string(&path) {
            Ok(text) => (text, origin, true),
            Err(e) => {
                let reason = if path.exists() {
                    format!("text file `{}` cannot be read: {}", rel, e)
                } else {
                    format!("text file `{}` does not exist", rel)
                };
                return Err(vec![Issue::missing_file(origin, reason)]);
            }
        }
    } else {
        return Ok(None);
    };

    let violations = policy::check_plain_text(&content);
    if violations.is_empty() {
        return Ok(owned.then_some(content));
    }

    Err(violations
        .into_iter()
        .map(|v| {
            Issue::new(
                ErrorCode::TextPolicyError,
                origin.clone().line(v.line),
                format!("{} ({}): `{}`", v.rule.description(), v.rule, v.excerpt),
            )
        })
        .collect())
}

fn check_image(
    index: usize,
    data: &Value,
    source: &PageSource,
    page_number: Option<u32>,
) -> Option<Issue> {
    let rel = data["imagePath"].as_str()?;
    let path = source.dir.join(rel);
    if path.is_file() {
        return None;
    }
    Some(Issue::missing_file(
        Location::new()
            .page_or_none(page_number)
            .file(&path)
            .block(index)
            .field(format!("/content/{}/data/imagePath", index)),
        format!("image file `{}` does not exist", rel),
    ))
}

/// Flag page numbers declared by more than one report.
///
/// Every affected report gets a `DUPLICATE_PAGE_NUMBER` issue naming the
/// other sources; all added issues are returned, ordered by page number.
/// Numbers inferred from directory names are not declarations and never
/// collide.
pub fn check_page_numbers(reports: &mut [ValidationReport]) -> Vec<Issue> {
    let mut by_number: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, report) in reports.iter().enumerate() {
        if let Some(number) = report.declared_page_number() {
            by_number.entry(number).or_default().push(i);
        }
    }

    let mut found = Vec::new();
    for (number, indices) in by_number {
        if indices.len() < 2 {
            continue;
        }
        for &i in &indices {
            let others = indices
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| reports[j].source.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let issue = Issue::new(
                ErrorCode::DuplicatePageNumber,
                Location::new().page(number).file(&reports[i].source),
                format!("page number {} is also used by {}", number, others),
            );
            reports[i].push(issue.clone());
            found.push(issue);
        }
    }
    found
}
