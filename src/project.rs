//! On-disk project layout.
//!
//! ```text
//! <root>/pages/<dir>/content.json     one page per directory
//! <root>/pagetex.json                 optional document configuration
//! <root>/build/tex/                   fragments, main.tex, references.bib, manifest.json
//! <root>/build/pdf/, build/logs/      owned by the PDF toolchain, removed by clean
//! ```

use crate::assemble::{Document, DocumentOptions, ManifestEntry, BIBLIOGRAPHY_FILE};
use crate::error::{Error, Result};
use crate::render::{Fragment, RenderStats};
use crate::schema;
use crate::validate::ValidationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the page document inside a page directory.
pub const PAGE_FILE: &str = "content.json";

/// Name of the document configuration at the project root.
pub const CONFIG_FILE: &str = "pagetex.json";

/// Name of the assembled document.
pub const MAIN_FILE: &str = "main.tex";

/// Name of the manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Paths of a project rooted at one directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Create a layout for the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `pages/`
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    /// `build/`
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// `build/tex/`
    pub fn tex_dir(&self) -> PathBuf {
        self.build_dir().join("tex")
    }

    /// `build/pdf/`
    pub fn pdf_dir(&self) -> PathBuf {
        self.build_dir().join("pdf")
    }

    /// `build/logs/`
    pub fn logs_dir(&self) -> PathBuf {
        self.build_dir().join("logs")
    }

    /// `pagetex.json`
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Load the document configuration, or defaults if there is none.
    pub fn document_options(&self) -> Result<DocumentOptions> {
        DocumentOptions::load(self.config_path())
    }

    /// Every page directory under `pages/`, sorted by name.
    ///
    /// Hidden directories are skipped. A directory without `content.json`
    /// is still returned so validation can report it.
    pub fn discover_pages(&self) -> Result<Vec<PageSource>> {
        let pages_dir = self.pages_dir();
        if !pages_dir.is_dir() {
            return Err(Error::PagesNotFound(pages_dir));
        }

        let mut sources = Vec::new();
        for entry in fs::read_dir(&pages_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }
            sources.push(PageSource::new(&self.root, entry.path()));
        }
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!("Discovered {} page directories", sources.len());
        Ok(sources)
    }

    /// Write every build artifact.
    ///
    /// Stale `page_*.tex` files from earlier runs are removed first, so the
    /// build directory always matches the current document.
    pub fn write_artifacts(
        &self,
        fragments: &[Fragment],
        document: &Document,
        options: &DocumentOptions,
    ) -> Result<Artifacts> {
        let tex_dir = self.tex_dir();
        fs::create_dir_all(&tex_dir)?;
        remove_stale_fragments(&tex_dir)?;

        let mut fragment_paths = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let path = tex_dir.join(fragment.file_name());
            fs::write(&path, fragment.to_latex())?;
            fragment_paths.push(path);
        }

        let bib_path = tex_dir.join(BIBLIOGRAPHY_FILE);
        let bibliography = if document.bibliography.is_empty() {
            if bib_path.exists() {
                fs::remove_file(&bib_path)?;
            }
            None
        } else {
            fs::write(&bib_path, document.bibliography.to_bibtex())?;
            Some(bib_path)
        };

        let document_path = tex_dir.join(MAIN_FILE);
        fs::write(&document_path, document.to_latex(options))?;

        let manifest = Manifest {
            generated_at: Utc::now(),
            document: document_path.clone(),
            bibliography: bibliography.clone(),
            pages: document.entries.clone(),
        };
        fs::write(
            tex_dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        Ok(Artifacts {
            fragments: fragment_paths,
            bibliography,
            document: document_path,
            manifest,
        })
    }

    /// Remove `build/tex`, `build/pdf` and `build/logs`.
    pub fn clean(&self) -> Result<CleanSummary> {
        let mut summary = CleanSummary::default();
        for dir in [self.tex_dir(), self.pdf_dir(), self.logs_dir()] {
            if dir.is_dir() {
                fs::remove_dir_all(&dir)?;
                log::debug!("Removed {}", dir.display());
                summary.removed.push(dir);
            }
        }
        Ok(summary)
    }
}

fn remove_stale_fragments(tex_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(tex_dir)? {
        let path = entry?.path();
        let is_fragment = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("page_") && n.ends_with(".tex"));
        if is_fragment {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// One page directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    /// Directory name
    pub name: String,

    /// Directory path
    pub dir: PathBuf,

    /// Directory path relative to the project root
    pub relative_dir: PathBuf,

    /// Path of `content.json`
    pub json_path: PathBuf,
}

impl PageSource {
    /// Describe the page directory `dir` of the project at `root`.
    pub fn new(root: impl AsRef<Path>, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative_dir = dir
            .strip_prefix(root.as_ref())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| dir.clone());
        Self {
            name,
            json_path: dir.join(PAGE_FILE),
            relative_dir,
            dir,
        }
    }

    /// The directory name as a page number, if it is numeric.
    pub fn fallback_number(&self) -> Option<u32> {
        self.name.parse().ok()
    }

    /// The page number declared in `content.json`, falling back to the
    /// directory name when the document cannot be read.
    pub fn peek_page_number(&self) -> Option<u32> {
        fs::read_to_string(&self.json_path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .and_then(|value| schema::page_number_of(&value))
            .or_else(|| self.fallback_number())
    }
}

/// Paths written by an assembly.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// Fragment files in page order
    pub fragments: Vec<PathBuf>,

    /// `references.bib`, when the bibliography is non-empty
    pub bibliography: Option<PathBuf>,

    /// `main.tex`
    pub document: PathBuf,

    /// The manifest that was written
    pub manifest: Manifest,
}

/// Record of one assembly, written as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// When the assembly ran
    pub generated_at: DateTime<Utc>,

    /// Path of `main.tex`
    pub document: PathBuf,

    /// Path of `references.bib`, if written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bibliography: Option<PathBuf>,

    /// Page entries in body order
    pub pages: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read a manifest written by an earlier assembly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Everything `assemble` produced.
#[derive(Debug, Clone)]
pub struct AssembleOutput {
    /// One report per selected page, including pages skipped at render time
    pub reports: Vec<ValidationReport>,

    /// Fragment files in page order
    pub fragments: Vec<PathBuf>,

    /// `references.bib`, when written
    pub bibliography: Option<PathBuf>,

    /// `main.tex`
    pub document: PathBuf,

    /// The manifest
    pub manifest: Manifest,

    /// Rendering statistics over all pages
    pub stats: RenderStats,
}

impl AssembleOutput {
    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.manifest.pages.len()
    }

    /// Reports of pages that were left out.
    pub fn skipped(&self) -> impl Iterator<Item = &ValidationReport> {
        self.reports.iter().filter(|r| !r.is_valid())
    }
}

/// Directories removed by `clean`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    /// Removed directories
    pub removed: Vec<PathBuf>,
}

impl CleanSummary {
    /// Check if nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}
