//! Rendering options and page selection.

use crate::error::{Error, Result};
use std::ops::RangeInclusive;

/// Options for rendering pages to LaTeX.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Width passed to `\includegraphics` (e.g. `0.8\textwidth`)
    pub image_width: String,

    /// Placement specifier for floating figures, tables and listings
    pub float_placement: String,

    /// Options for every `minted` environment
    pub minted_options: Vec<String>,

    /// Number lines of `listing` blocks
    pub listing_line_numbers: bool,

    /// Emit a `% references: ...` comment after each page
    pub reference_comment: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image width.
    pub fn with_image_width(mut self, width: impl Into<String>) -> Self {
        self.image_width = width.into();
        self
    }

    /// Set the float placement (without brackets).
    pub fn with_float_placement(mut self, placement: impl Into<String>) -> Self {
        self.float_placement = placement.into();
        self
    }

    /// Add a `minted` option.
    pub fn with_minted_option(mut self, option: impl Into<String>) -> Self {
        self.minted_options.push(option.into());
        self
    }

    /// Enable or disable line numbers on listings.
    pub fn with_listing_line_numbers(mut self, enabled: bool) -> Self {
        self.listing_line_numbers = enabled;
        self
    }

    /// Enable or disable the trailing reference comment.
    pub fn with_reference_comment(mut self, enabled: bool) -> Self {
        self.reference_comment = enabled;
        self
    }

    /// The bracketed option list for a `minted` environment.
    pub(crate) fn minted_args(&self, line_numbers: bool) -> String {
        let mut opts = self.minted_options.clone();
        if line_numbers && !opts.iter().any(|o| o == "linenos") {
            opts.push("linenos".to_string());
        }
        if opts.is_empty() {
            String::new()
        } else {
            format!("[{}]", opts.join(", "))
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_width: "0.8\\textwidth".to_string(),
            float_placement: "htbp".to_string(),
            minted_options: vec!["breaklines".to_string()],
            listing_line_numbers: true,
            reference_comment: true,
        }
    }
}

/// Selection of pages by page number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// An inclusive range of page numbers
    Range(RangeInclusive<u32>),
    /// Specific page numbers, sorted and deduplicated
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.binary_search(&page).is_ok(),
        }
    }

    /// Check if this selection is `All`.
    pub fn is_all(&self) -> bool {
        matches!(self, PageSelection::All)
    }

    /// Parse a page selection string (e.g. "all", "3", "1-10", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                return Ok(PageSelection::Range(parse_range(s, start, end)?));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                pages.extend(parse_range(part, start, end)?);
            } else {
                pages.push(parse_number(part)?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_number(s: &str) -> Result<u32> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidPageSelection(format!("`{}` is not a page number", s.trim())))
}

fn parse_range(part: &str, start: &str, end: &str) -> Result<RangeInclusive<u32>> {
    let start = parse_number(start)?;
    let end = parse_number(end)?;
    if start > end {
        return Err(Error::InvalidPageSelection(format!(
            "range `{}` ends before it starts",
            part
        )));
    }
    Ok(start..=end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_image_width("\\linewidth")
            .with_float_placement("H")
            .with_reference_comment(false);

        assert_eq!(options.image_width, "\\linewidth");
        assert_eq!(options.float_placement, "H");
        assert!(!options.reference_comment);
    }

    #[test]
    fn test_minted_args() {
        let options = RenderOptions::new();
        assert_eq!(options.minted_args(false), "[breaklines]");
        assert_eq!(options.minted_args(true), "[breaklines, linenos]");

        let bare = RenderOptions {
            minted_options: Vec::new(),
            ..Default::default()
        };
        assert_eq!(bare.minted_args(false), "");
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
        assert!(pages.includes(3));
    }

    #[test]
    fn test_page_selection_parse() {
        assert!(PageSelection::parse("all").unwrap().is_all());
        assert!(PageSelection::parse("").unwrap().is_all());

        assert_eq!(
            PageSelection::parse("1-10").unwrap(),
            PageSelection::Range(1..=10)
        );
        assert_eq!(PageSelection::parse("3").unwrap(), PageSelection::Pages(vec![3]));
        assert_eq!(
            PageSelection::parse("7,1,3,5-7").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7])
        );
    }

    #[test]
    fn test_page_selection_parse_errors() {
        assert!(matches!(
            PageSelection::parse("x"),
            Err(Error::InvalidPageSelection(_))
        ));
        assert!(PageSelection::parse("9-2").is_err());
        assert!(PageSelection::parse("1,,2").is_err());
    }
}
