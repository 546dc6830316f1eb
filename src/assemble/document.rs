//! The assembled document and its LaTeX skeleton.

use super::Bibliography;
use crate::error::{Error, Result};
use crate::render::{escape_text, Fragment};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::Path;

/// The merged body of every rendered page plus its bibliography.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Body lines in page order
    pub body: Vec<String>,

    /// Deduplicated bibliography
    pub bibliography: Bibliography,

    /// Where each page landed in the body
    pub entries: Vec<ManifestEntry>,
}

impl Document {
    /// Concatenate fragments, which must already be in page order.
    pub(crate) fn from_fragments(fragments: &[Fragment], bibliography: Bibliography) -> Self {
        let mut body = Vec::new();
        let mut entries = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let start = body.len();
            body.extend(fragment.lines.iter().cloned());
            entries.push(ManifestEntry {
                page_number: fragment.page_number,
                title: fragment.title.clone(),
                fragment: fragment.file_name(),
                start_line: start,
                end_line: body.len(),
            });
        }
        Self {
            body,
            bibliography,
            entries,
        }
    }

    /// Page numbers in body order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.page_number).collect()
    }

    /// Body line range of a page.
    pub fn lines_of(&self, page_number: u32) -> Option<Range<usize>> {
        self.entries
            .iter()
            .find(|e| e.page_number == page_number)
            .map(ManifestEntry::lines)
    }

    /// The body alone, without preamble.
    pub fn body_latex(&self) -> String {
        let mut out = self.body.join("\n");
        out.push('\n');
        out
    }

    /// The complete LaTeX document.
    pub fn to_latex(&self, options: &DocumentOptions) -> String {
        let mut out = String::new();
        let push = |out: &mut String, line: &str| {
            out.push_str(line);
            out.push('\n');
        };

        push(
            &mut out,
            &format!(
                "\\documentclass[{}]{{{}}}",
                options.class_options, options.document_class
            ),
        );
        push(&mut out, "");
        push(&mut out, "\\usepackage[utf8]{inputenc}");
        push(&mut out, "\\usepackage[T1]{fontenc}");
        if let Some(ref language) = options.language {
            push(&mut out, &format!("\\usepackage[{}]{{babel}}", language));
        }
        for package in ["graphicx", "float", "amsmath", "amssymb", "minted", "csquotes"] {
            push(&mut out, &format!("\\usepackage{{{}}}", package));
        }
        push(
            &mut out,
            "\\usepackage[backend=biber, sorting=none, style=numeric]{biblatex}",
        );
        // hyperref goes last.
        push(&mut out, "\\usepackage{hyperref}");
        push(&mut out, "");
        push(&mut out, &format!("\\graphicspath{{{{{}}}}}", options.graphics_path));
        if !self.bibliography.is_empty() {
            push(&mut out, &format!("\\addbibresource{{{}}}", BIBLIOGRAPHY_FILE));
        }
        push(&mut out, "");
        push(&mut out, &format!("\\title{{{}}}", escape_text(&options.title)));
        push(&mut out, &format!("\\author{{{}}}", escape_text(&options.author)));
        push(&mut out, &format!("\\date{{{}}}", options.date));
        push(&mut out, "");
        push(&mut out, "\\begin{document}");
        push(&mut out, "");
        push(&mut out, "\\maketitle");
        push(&mut out, "\\tableofcontents");
        push(&mut out, "");
        out.push_str(&self.body_latex());
        if !self.bibliography.is_empty() {
            let command = match options.bibliography_title {
                Some(ref title) => format!("\\printbibliography[title={{{}}}]", title),
                None => "\\printbibliography".to_string(),
            };
            push(&mut out, &command);
            push(&mut out, "");
        }
        push(&mut out, "\\end{document}");
        out
    }
}

/// File name of the bibliography next to `main.tex`.
pub const BIBLIOGRAPHY_FILE: &str = "references.bib";

/// Where one page landed in the assembled body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Page number
    pub page_number: u32,

    /// Page title
    pub title: String,

    /// Fragment file name in the build directory
    pub fragment: String,

    /// First body line of the page (0-based)
    pub start_line: usize,

    /// One past the last body line
    pub end_line: usize,
}

impl ManifestEntry {
    /// The half-open body line range.
    pub fn lines(&self) -> Range<usize> {
        self.start_line..self.end_line
    }
}

/// Document-level settings for the LaTeX skeleton.
///
/// Read from `pagetex.json` at the project root; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentOptions {
    /// Document class
    pub document_class: String,

    /// Class options
    pub class_options: String,

    /// Document title
    pub title: String,

    /// Author line
    pub author: String,

    /// Date line, emitted as written
    pub date: String,

    /// Babel language, if any
    pub language: Option<String>,

    /// Heading of the printed bibliography
    pub bibliography_title: Option<String>,

    /// Image search path as seen from `build/tex`
    pub graphics_path: String,
}

impl DocumentOptions {
    /// Create new document options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file, falling back to defaults when it
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No document configuration at {}", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the date line.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Set the babel language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the document class and its options.
    pub fn with_class(mut self, class: impl Into<String>, options: impl Into<String>) -> Self {
        self.document_class = class.into();
        self.class_options = options.into();
        self
    }
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            document_class: "report".to_string(),
            class_options: "a4paper, 12pt".to_string(),
            title: "Untitled".to_string(),
            author: String::new(),
            date: "\\today".to_string(),
            language: None,
            bibliography_title: None,
            graphics_path: "../../".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderStats;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fragment(page_number: u32, lines: &[&str]) -> Fragment {
        Fragment {
            page_number,
            title: format!("Page {}", page_number),
            source: PathBuf::from(format!("pages/{}/content.json", page_number)),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            labels: Vec::new(),
            references: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    #[test]
    fn test_manifest_ranges() {
        let fragments = vec![
            fragment(1, &["\\chapter{A}", ""]),
            fragment(2, &["\\chapter{B}", "", "text", ""]),
        ];
        let doc = Document::from_fragments(&fragments, Bibliography::new());
        assert_eq!(doc.page_numbers(), vec![1, 2]);
        assert_eq!(doc.lines_of(1), Some(0..2));
        assert_eq!(doc.lines_of(2), Some(2..6));
        assert_eq!(doc.entries[1].fragment, "page_2.tex");
        assert_eq!(doc.body[doc.lines_of(2).unwrap()][0], "\\chapter{B}");
        assert_eq!(doc.lines_of(9), None);
    }

    #[test]
    fn test_skeleton_without_bibliography() {
        let doc = Document::from_fragments(&[fragment(1, &["\\chapter{A}"])], Bibliography::new());
        let latex = doc.to_latex(&DocumentOptions::new().with_title("My Thesis").with_author("A. B."));
        assert!(latex.starts_with("\\documentclass[a4paper, 12pt]{report}\n"));
        assert!(latex.contains("\\usepackage{minted}"));
        assert!(latex.contains("\\usepackage[backend=biber, sorting=none, style=numeric]{biblatex}"));
        assert!(latex.contains("\\graphicspath{{../../}}"));
        assert!(latex.contains("\\title{My Thesis}\n\\author{A. B.}\n\\date{\\today}"));
        assert!(latex.contains("\\maketitle\n\\tableofcontents\n\n\\chapter{A}\n"));
        assert!(!latex.contains("\\addbibresource"));
        assert!(!latex.contains("\\printbibliography"));
        assert!(latex.ends_with("\\end{document}\n"));
    }

    #[test]
    fn test_skeleton_with_bibliography_and_language() {
        let mut bib = Bibliography::new();
        bib.insert("knuth", "@book{knuth}", 1);
        let doc = Document::from_fragments(&[fragment(1, &["x"])], bib);
        let options = DocumentOptions {
            bibliography_title: Some("Sources".to_string()),
            ..DocumentOptions::new().with_language("polish")
        };
        let latex = doc.to_latex(&options);
        assert!(latex.contains("\\usepackage[polish]{babel}"));
        assert!(latex.contains("\\addbibresource{references.bib}"));
        assert!(latex.contains("\\printbibliography[title={Sources}]"));
    }

    #[test]
    fn test_load_options() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pagetex.json");

        assert_eq!(DocumentOptions::load(&path).unwrap(), DocumentOptions::default());

        fs::write(&path, r#"{"title": "Thesis", "language": "english"}"#).unwrap();
        let options = DocumentOptions::load(&path).unwrap();
        assert_eq!(options.title, "Thesis");
        assert_eq!(options.language.as_deref(), Some("english"));
        assert_eq!(options.document_class, "report");

        fs::write(&path, r#"{"title": 3}"#).unwrap();
        assert!(matches!(DocumentOptions::load(&path), Err(Error::Config(_))));
    }
}
