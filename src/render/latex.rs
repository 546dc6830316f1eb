//! LaTeX rendering for validated pages.

use crate::assemble::AssemblyContext;
use crate::error::{Error, Location, Result};
use crate::model::{CodeData, ContentBlock, EquationData, ImageData, TableData};
use crate::validate::LoadedPage;
use std::path::{Component, Path};

use super::{escape_text, Fragment, RenderOptions, RenderStats};

/// Render one page on its own, without cross-page bookkeeping.
pub fn render_fragment(page: &LoadedPage, options: &RenderOptions) -> Result<Fragment> {
    let mut renderer = LatexRenderer::new(options.clone());
    renderer.render_page(page, &mut AssemblyContext::new())
}

/// LaTeX renderer.
///
/// Holds options and the statistics accumulated over every page it renders.
pub struct LatexRenderer {
    options: RenderOptions,
    stats: RenderStats,
}

impl LatexRenderer {
    /// Create a new LaTeX renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            stats: RenderStats::new(),
        }
    }

    /// Statistics over every page rendered so far.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Consume the renderer, returning its statistics.
    pub fn into_stats(self) -> RenderStats {
        self.stats
    }

    /// Render a page into a fragment.
    ///
    /// Labels, citations and the page number are recorded in `ctx` only
    /// when the whole page renders; a page that fails leaves `ctx`
    /// untouched.
    pub fn render_page(&mut self, page: &LoadedPage, ctx: &mut AssemblyContext) -> Result<Fragment> {
        let number = page.number();
        log::debug!("Rendering page {} ({})", number, page.source.display());

        let mut out = Output::default();
        let mut stats = RenderStats::new();
        stats.add_page();

        let level = page.page.section_level;
        out.line(format!("\\{}{{{}}}", level.command(), escape_text(&page.page.title)));
        out.blank();

        for (index, block) in page.page.content.iter().enumerate() {
            match block {
                ContentBlock::Text(data) => {
                    let text = page.resolve_text(index, data)?;
                    stats.count_text(&text);
                    self.render_text(&mut out, &text);
                }
                ContentBlock::Image(data) => self.render_image(&mut out, page, data),
                ContentBlock::Table(data) => {
                    let location = Location::new().page(number).file(&page.source).block(index);
                    self.render_table(&mut out, data, location)?;
                }
                ContentBlock::Code(data) => self.render_code(&mut out, data),
                ContentBlock::Listing(data) => self.render_listing(&mut out, data),
                ContentBlock::Equation(data) => self.render_equation(&mut out, data),
            }
            stats.add_block(block.kind());
        }

        let labels: Vec<String> = page.page.labels().map(|(_, l)| l.to_string()).collect();
        let references: Vec<String> = page.page.references.iter().map(|r| r.id.clone()).collect();
        stats.label_count = labels.len() as u32;
        stats.reference_count = references.len() as u32;

        if self.options.reference_comment && !references.is_empty() {
            out.line(format!("% references: {}", references.join(", ")));
            out.blank();
        }

        ctx.record_page(page);
        self.stats.merge(&stats);

        Ok(Fragment {
            page_number: number,
            title: page.page.title.clone(),
            source: page.source.clone(),
            lines: out.lines,
            labels,
            references,
            stats,
        })
    }

    fn render_text(&self, out: &mut Output, text: &str) {
        let text = text.trim_end_matches(['\n', '\r']);
        if text.is_empty() {
            return;
        }
        out.verbatim(text);
        out.blank();
    }

    fn render_image(&self, out: &mut Output, page: &LoadedPage, data: &ImageData) {
        let path = latex_path(&page.asset_dir.join(&data.image_path));
        out.line(format!("\\begin{{figure}}[{}]", self.options.float_placement));
        out.line("  \\centering");
        out.line(format!(
            "  \\includegraphics[width={}]{{{}}}",
            self.options.image_width, path
        ));
        caption_and_label(out, data.caption.as_deref(), data.label.as_deref());
        out.line("\\end{figure}");
        out.blank();
    }

    fn render_table(&self, out: &mut Output, data: &TableData, location: Location) -> Result<()> {
        let expected = data.column_count();
        if let Some((row, found)) = data.first_ragged_row() {
            return Err(Error::InconsistentTable {
                location,
                row,
                expected,
                found,
            });
        }

        out.line(format!("\\begin{{table}}[{}]", self.options.float_placement));
        out.line("  \\centering");
        caption_and_label(out, data.caption.as_deref(), data.label.as_deref());
        out.line(format!("  \\begin{{tabular}}{{|{}|}}", vec!["c"; expected].join("|")));
        out.line("    \\hline");
        for row in &data.table_data {
            let cells: Vec<String> = row.iter().map(|c| escape_text(c)).collect();
            out.line(format!("    {} \\\\", cells.join(" & ")));
            out.line("    \\hline");
        }
        out.line("  \\end{tabular}");
        out.line("\\end{table}");
        out.blank();
        Ok(())
    }

    fn render_code(&self, out: &mut Output, data: &CodeData) {
        let floating = data.caption.is_some() || data.label.is_some();
        if floating {
            out.line("\\begin{listing}[H]");
        }
        self.render_minted(out, data, false);
        if floating {
            caption_and_label(out, data.caption.as_deref(), data.label.as_deref());
            out.line("\\end{listing}");
        }
        out.blank();
    }

    fn render_listing(&self, out: &mut Output, data: &CodeData) {
        out.line(format!("\\begin{{listing}}[{}]", self.options.float_placement));
        self.render_minted(out, data, self.options.listing_line_numbers);
        caption_and_label(out, data.caption.as_deref(), data.label.as_deref());
        out.line("\\end{listing}");
        out.blank();
    }

    fn render_minted(&self, out: &mut Output, data: &CodeData, line_numbers: bool) {
        out.line(format!(
            "\\begin{{minted}}{}{{{}}}",
            self.options.minted_args(line_numbers),
            data.language
        ));
        // Verbatim: one trailing newline belongs to the environment.
        let code = data.code.strip_suffix('\n').unwrap_or(&data.code);
        if !code.is_empty() {
            out.verbatim(code);
        }
        out.line("\\end{minted}");
    }

    fn render_equation(&self, out: &mut Output, data: &EquationData) {
        out.line("\\begin{equation}");
        if let Some(ref label) = data.label {
            out.line(format!("  \\label{{{}}}", label));
        }
        out.verbatim(data.equation.trim_matches(['\n', '\r']));
        out.line("\\end{equation}");
        out.blank();
    }
}

fn caption_and_label(out: &mut Output, caption: Option<&str>, label: Option<&str>) {
    if let Some(caption) = caption {
        out.line(format!("  \\caption{{{}}}", caption));
    }
    if let Some(label) = label {
        out.line(format!("  \\label{{{}}}", label));
    }
}

/// A path in the form LaTeX expects: forward slashes, no `.` segments.
fn latex_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            c => Some(c.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Default)]
struct Output {
    lines: Vec<String>,
}

impl Output {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Push text exactly as given, split at newlines.
    fn verbatim(&mut self, text: &str) {
        self.lines.extend(text.split('\n').map(str::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::{Page, Reference, SectionLevel};

    fn loaded(page: Page) -> LoadedPage {
        LoadedPage::new(page, "/tmp/project/pages/01").with_asset_dir("pages/01")
    }

    fn render(page: Page) -> Result<Fragment> {
        render_fragment(&loaded(page), &RenderOptions::default())
    }

    /// Arguments of every `\name{...}` directive, honoring nested braces.
    fn directives(latex: &str, name: &str) -> Vec<String> {
        let needle = format!("\\{}{{", name);
        let mut found = Vec::new();
        let mut rest = latex;
        while let Some(pos) = rest.find(&needle) {
            let body = &rest[pos + needle.len()..];
            let mut depth = 1;
            let mut end = 0;
            for (i, c) in body.char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = i;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            found.push(body[..end].to_string());
            rest = &body[end..];
        }
        found
    }

    fn table(rows: &[&[&str]]) -> ContentBlock {
        ContentBlock::Table(TableData {
            table_data: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            caption: None,
            label: None,
        })
    }

    #[test]
    fn test_title_and_section_level() {
        let page = Page::new(1, "Costs & Benefits").with_level(SectionLevel::Subsection);
        let fragment = render(page).unwrap();
        assert_eq!(fragment.lines[0], "\\subsection{Costs \\& Benefits}");
        assert_eq!(fragment.file_name(), "page_1.tex");
    }

    #[test]
    fn test_text_is_verbatim() {
        let mut page = Page::new(1, "Intro");
        page.add_block(ContentBlock::text("Energy is $E=mc^2$ & 50% of \\ref{eq:x}.\n"));
        let fragment = render(page).unwrap();
        assert_eq!(fragment.lines[2], "Energy is $E=mc^2$ & 50% of \\ref{eq:x}.");
        assert_eq!(fragment.stats.text_count, 1);
    }

    #[test]
    fn test_ragged_table_is_rejected() {
        let mut page = Page::new(3, "Data");
        page.add_block(ContentBlock::text("Before."));
        page.add_block(table(&[&["a", "b", "c"], &["1", "2", "3"], &["4", "5"]]));

        let err = render(page).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentTable {
                row: 2,
                expected: 3,
                found: 2,
                ..
            }
        ));
        let issue = err.page_issue().unwrap();
        assert_eq!(issue.code, ErrorCode::InconsistentTable);
        assert_eq!(issue.location.block, Some(1));
        assert_eq!(issue.location.page_number, Some(3));
    }

    #[test]
    fn test_table_layout() {
        let mut page = Page::new(1, "T");
        page.add_block(table(&[&["x_1", "y"], &["1", "2"]]));
        let latex = render(page).unwrap().to_latex();
        assert!(latex.contains("\\begin{tabular}{|c|c|}"));
        assert!(latex.contains("    x\\_1 & y \\\\\n    \\hline\n    1 & 2 \\\\"));
    }

    #[test]
    fn test_caption_and_label_round_trip() {
        let caption = "Growth of $f_n$ with {nested} \\emph{groups} & 100%";
        let label = "fig:growth_rate";
        let mut page = Page::new(1, "Figures");
        page.add_block(ContentBlock::Image(ImageData {
            image_path: "img/growth.png".into(),
            caption: Some(caption.to_string()),
            label: Some(label.to_string()),
        }));
        page.add_block(ContentBlock::Listing(CodeData {
            code: "fn main() {}\n".to_string(),
            language: "rust".to_string(),
            caption: Some("Entry point".to_string()),
            label: Some("lst:main".to_string()),
        }));

        let latex = render(page).unwrap().to_latex();
        assert_eq!(directives(&latex, "caption"), vec![caption, "Entry point"]);
        assert_eq!(directives(&latex, "label"), vec![label, "lst:main"]);
        assert!(latex.contains("\\includegraphics[width=0.8\\textwidth]{pages/01/img/growth.png}"));
    }

    #[test]
    fn test_code_preserves_whitespace() {
        let code = "def f(x):\n    if x:\n\t\treturn x * 2  \n\n    return {'%': '$'}\n";
        let mut page = Page::new(1, "Code");
        page.add_block(ContentBlock::Code(CodeData {
            code: code.to_string(),
            language: "python".to_string(),
            caption: None,
            label: None,
        }));

        let fragment = render(page).unwrap();
        let latex = fragment.to_latex();
        let begin = "\\begin{minted}[breaklines]{python}\n";
        let start = latex.find(begin).unwrap() + begin.len();
        let end = latex.find("\\end{minted}").unwrap();
        assert_eq!(&latex[start..end], code);
        assert!(!latex.contains("\\begin{listing}"));
    }

    #[test]
    fn test_code_with_label_uses_nonfloating_listing() {
        let mut page = Page::new(1, "Code");
        page.add_block(ContentBlock::Code(CodeData {
            code: "x".to_string(),
            language: "text".to_string(),
            caption: None,
            label: Some("lst:x".to_string()),
        }));
        let latex = render(page).unwrap().to_latex();
        assert!(latex.contains("\\begin{listing}[H]\n\\begin{minted}[breaklines]{text}\nx\n\\end{minted}\n  \\label{lst:x}\n\\end{listing}"));
    }

    #[test]
    fn test_listing_is_floating_with_line_numbers() {
        let mut page = Page::new(1, "Code");
        page.add_block(ContentBlock::Listing(CodeData {
            code: "SELECT 1;".to_string(),
            language: "sql".to_string(),
            caption: None,
            label: None,
        }));
        let latex = render(page).unwrap().to_latex();
        assert!(latex.contains("\\begin{listing}[htbp]\n\\begin{minted}[breaklines, linenos]{sql}\nSELECT 1;\n\\end{minted}\n\\end{listing}"));
    }

    #[test]
    fn test_equation_with_label() {
        let mut page = Page::new(1, "Math");
        page.add_block(ContentBlock::Equation(EquationData {
            equation: "E = mc^2".to_string(),
            label: Some("eq:energy".to_string()),
        }));
        let latex = render(page).unwrap().to_latex();
        assert!(latex.contains("\\begin{equation}\n  \\label{eq:energy}\nE = mc^2\n\\end{equation}"));
    }

    #[test]
    fn test_reference_comment_and_stats() {
        let mut page = Page::new(2, "Refs");
        page.add_block(ContentBlock::text("See \\cite{knuth}."));
        page.add_reference(Reference::new("knuth", "@book{knuth, title={TAOCP}}"));
        page.add_reference(Reference::new("lamport", "LaTeX manual"));

        let fragment = render(page).unwrap();
        assert!(fragment.lines.contains(&"% references: knuth, lamport".to_string()));
        assert_eq!(fragment.references, vec!["knuth", "lamport"]);
        assert_eq!(fragment.stats.reference_count, 2);

        let mut page = Page::new(2, "Refs");
        page.add_reference(Reference::new("knuth", "x"));
        let options = RenderOptions::new().with_reference_comment(false);
        let fragment = render_fragment(&loaded(page), &options).unwrap();
        assert!(!fragment.to_latex().contains("% references"));
    }

    #[test]
    fn test_renderer_accumulates_stats_and_context() {
        let mut renderer = LatexRenderer::new(RenderOptions::default());
        let mut ctx = AssemblyContext::new();

        let mut first = Page::new(1, "A");
        first.add_block(ContentBlock::text("one two"));
        let mut second = Page::new(2, "B");
        second.add_block(table(&[&["a"], &["b", "c"]]));

        renderer.render_page(&loaded(first), &mut ctx).unwrap();
        assert!(renderer.render_page(&loaded(second), &mut ctx).is_err());

        assert_eq!(renderer.stats().page_count, 1);
        assert_eq!(renderer.stats().word_count, 2);
        assert_eq!(ctx.page_count(), 1);
    }

    #[test]
    fn test_latex_path() {
        assert_eq!(latex_path(Path::new("pages/01/./img/a.png")), "pages/01/img/a.png");
    }
}
