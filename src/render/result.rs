//! Rendered page fragments and rendering statistics.

use crate::model::BlockKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The LaTeX produced for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Page number of the source page
    pub page_number: u32,

    /// Page title as written in the source
    pub title: String,

    /// The page's `content.json`
    pub source: PathBuf,

    /// LaTeX source, one entry per line
    pub lines: Vec<String>,

    /// Labels defined by this page, in block order
    pub labels: Vec<String>,

    /// Reference ids cited by this page, in source order
    pub references: Vec<String>,

    /// Statistics for this page alone
    pub stats: RenderStats,
}

impl Fragment {
    /// File name of the fragment in the build directory.
    pub fn file_name(&self) -> String {
        format!("page_{}.tex", self.page_number)
    }

    /// The fragment as a LaTeX source file.
    pub fn to_latex(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Statistics collected during rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Pages rendered
    pub page_count: u32,

    /// Text blocks
    pub text_count: u32,

    /// Figures
    pub image_count: u32,

    /// Tables
    pub table_count: u32,

    /// Inline code blocks
    pub code_count: u32,

    /// Display equations
    pub equation_count: u32,

    /// Floating listings
    pub listing_count: u32,

    /// Labels defined
    pub label_count: u32,

    /// References cited
    pub reference_count: u32,

    /// Approximate word count of text blocks
    pub word_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Increment the counter for a block kind.
    pub fn add_block(&mut self, kind: BlockKind) {
        let counter = match kind {
            BlockKind::Text => &mut self.text_count,
            BlockKind::Image => &mut self.image_count,
            BlockKind::Table => &mut self.table_count,
            BlockKind::Code => &mut self.code_count,
            BlockKind::Equation => &mut self.equation_count,
            BlockKind::Listing => &mut self.listing_count,
        };
        *counter += 1;
    }

    /// Add whitespace-separated tokens of `text` to the word count.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
    }

    /// Total number of blocks of any kind.
    pub fn block_count(&self) -> u32 {
        self.text_count
            + self.image_count
            + self.table_count
            + self.code_count
            + self.equation_count
            + self.listing_count
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.page_count += other.page_count;
        self.text_count += other.text_count;
        self.image_count += other.image_count;
        self.table_count += other.table_count;
        self.code_count += other.code_count;
        self.equation_count += other.equation_count;
        self.listing_count += other.listing_count;
        self.label_count += other.label_count;
        self.reference_count += other.reference_count;
        self.word_count += other.word_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_text() {
        let mut stats = RenderStats::new();
        stats.count_text("Hello, world! This is a test.");
        assert_eq!(stats.word_count, 6);
    }

    #[test]
    fn test_stats_merge() {
        let mut stats1 = RenderStats::new();
        stats1.add_block(BlockKind::Text);
        stats1.add_block(BlockKind::Table);

        let stats2 = RenderStats {
            text_count: 3,
            image_count: 4,
            page_count: 1,
            ..Default::default()
        };

        stats1.merge(&stats2);

        assert_eq!(stats1.text_count, 4);
        assert_eq!(stats1.table_count, 1);
        assert_eq!(stats1.image_count, 4);
        assert_eq!(stats1.page_count, 1);
        assert_eq!(stats1.block_count(), 9);
    }

    #[test]
    fn test_fragment_file_name_and_latex() {
        let fragment = Fragment {
            page_number: 12,
            title: "Results".to_string(),
            source: PathBuf::from("pages/12/content.json"),
            lines: vec!["\\section{Results}".to_string(), String::new()],
            labels: Vec::new(),
            references: Vec::new(),
            stats: RenderStats::default(),
        };
        assert_eq!(fragment.file_name(), "page_12.tex");
        assert_eq!(fragment.to_latex(), "\\section{Results}\n\n");
        assert_eq!(fragment.line_count(), 2);
    }
}
