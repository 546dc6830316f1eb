//! Page-level types.

use super::ContentBlock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of document content, read from a page's `content.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page title, emitted as a sectioning command
    pub title: String,

    /// Ordering key, unique across the collection
    pub page_number: u32,

    /// Sectioning depth of the title
    #[serde(default)]
    pub section_level: SectionLevel,

    /// Content blocks in rendering order
    #[serde(default)]
    pub content: Vec<ContentBlock>,

    /// Bibliography entries cited by this page
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Page {
    /// Create an empty chapter-level page.
    pub fn new(page_number: u32, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page_number,
            section_level: SectionLevel::default(),
            content: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Set the section level and return self.
    pub fn with_level(mut self, level: SectionLevel) -> Self {
        self.section_level = level;
        self
    }

    /// Add a block to the page.
    pub fn add_block(&mut self, block: ContentBlock) {
        self.content.push(block);
    }

    /// Add a reference to the page.
    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    /// Labels declared by the page's blocks, with block index.
    pub fn labels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content
            .iter()
            .enumerate()
            .filter_map(|(i, block)| block.label().map(|l| (i, l)))
    }

    /// Check if the page has no content blocks.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Get the number of blocks on the page.
    pub fn block_count(&self) -> usize {
        self.content.len()
    }
}

/// A bibliography entry declared by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Citation key, unique per page
    pub id: String,

    /// Raw bibliography-entry source
    pub citation: String,
}

impl Reference {
    /// Create a new reference.
    pub fn new(id: impl Into<String>, citation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            citation: citation.into(),
        }
    }
}

/// Sectioning depth of a page title (1 = chapter ... 5 = paragraph).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SectionLevel {
    /// Level 1
    #[default]
    Chapter,
    /// Level 2
    Section,
    /// Level 3
    Subsection,
    /// Level 4
    Subsubsection,
    /// Level 5
    Paragraph,
}

impl SectionLevel {
    /// Smallest valid level.
    pub const MIN: u8 = 1;

    /// Largest valid level.
    pub const MAX: u8 = 5;

    /// Convert a numeric level.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(SectionLevel::Chapter),
            2 => Some(SectionLevel::Section),
            3 => Some(SectionLevel::Subsection),
            4 => Some(SectionLevel::Subsubsection),
            5 => Some(SectionLevel::Paragraph),
            _ => None,
        }
    }

    /// Numeric level.
    pub fn level(&self) -> u8 {
        match self {
            SectionLevel::Chapter => 1,
            SectionLevel::Section => 2,
            SectionLevel::Subsection => 3,
            SectionLevel::Subsubsection => 4,
            SectionLevel::Paragraph => 5,
        }
    }

    /// The LaTeX sectioning command name (without backslash).
    pub fn command(&self) -> &'static str {
        match self {
            SectionLevel::Chapter => "chapter",
            SectionLevel::Section => "section",
            SectionLevel::Subsection => "subsection",
            SectionLevel::Subsubsection => "subsubsection",
            SectionLevel::Paragraph => "paragraph",
        }
    }
}

impl TryFrom<u8> for SectionLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_level(level).ok_or_else(|| {
            format!(
                "section level {} out of range {}..={}",
                level,
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<SectionLevel> for u8 {
    fn from(level: SectionLevel) -> Self {
        level.level()
    }
}

impl fmt::Display for SectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}
