//! Content block types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A typed unit of page content.
///
/// Serialized as `{"type": "...", "data": {...}}`; each variant carries only
/// the fields its type allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text, inline or from a file
    Text(TextData),

    /// An image with optional caption and label
    Image(ImageData),

    /// A table of string cells
    Table(TableData),

    /// A code block rendered in place
    Code(CodeData),

    /// A numbered equation
    Equation(EquationData),

    /// A code block rendered as a floating listing
    Listing(CodeData),
}

impl ContentBlock {
    /// The kind of this block.
    pub fn kind(&self) -> BlockKind {
        match self {
            ContentBlock::Text(_) => BlockKind::Text,
            ContentBlock::Image(_) => BlockKind::Image,
            ContentBlock::Table(_) => BlockKind::Table,
            ContentBlock::Code(_) => BlockKind::Code,
            ContentBlock::Equation(_) => BlockKind::Equation,
            ContentBlock::Listing(_) => BlockKind::Listing,
        }
    }

    /// The cross-reference label, if the block has one.
    pub fn label(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(_) => None,
            ContentBlock::Image(d) => d.label.as_deref(),
            ContentBlock::Table(d) => d.label.as_deref(),
            ContentBlock::Code(d) | ContentBlock::Listing(d) => d.label.as_deref(),
            ContentBlock::Equation(d) => d.label.as_deref(),
        }
    }

    /// The caption, if the block has one.
    pub fn caption(&self) -> Option<&str> {
        match self {
            ContentBlock::Image(d) => d.caption.as_deref(),
            ContentBlock::Table(d) => d.caption.as_deref(),
            ContentBlock::Code(d) | ContentBlock::Listing(d) => d.caption.as_deref(),
            ContentBlock::Text(_) | ContentBlock::Equation(_) => None,
        }
    }

    /// Create an inline text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(TextData::Inline { text: text.into() })
    }

    /// Create a text block backed by a file.
    pub fn text_file(path: impl Into<PathBuf>) -> Self {
        ContentBlock::Text(TextData::File {
            text_path: path.into(),
        })
    }
}

/// Block type names as they appear in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// `text`
    Text,
    /// `image`
    Image,
    /// `table`
    Table,
    /// `code`
    Code,
    /// `equation`
    Equation,
    /// `listing`
    Listing,
}

impl BlockKind {
    /// All known kinds.
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Text,
        BlockKind::Image,
        BlockKind::Table,
        BlockKind::Code,
        BlockKind::Equation,
        BlockKind::Listing,
    ];

    /// Look up a kind by its `type` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// The `type` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
            BlockKind::Code => "code",
            BlockKind::Equation => "equation",
            BlockKind::Listing => "listing",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a text block: exactly one of inline text or a file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextData {
    /// Inline text
    Inline {
        /// The text itself
        text: String,
    },

    /// Text read from a file relative to the page directory
    File {
        /// Relative path of the text file
        #[serde(rename = "textPath")]
        text_path: PathBuf,
    },
}

/// Image block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Image path relative to the page directory
    pub image_path: PathBuf,

    /// Figure caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Cross-reference label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Table block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    /// Rows of string cells
    pub table_data: Vec<Vec<String>>,

    /// Table caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Cross-reference label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TableData {
    /// Number of columns, taken from the first row.
    pub fn column_count(&self) -> usize {
        self.table_data.first().map(Vec::len).unwrap_or(0)
    }

    /// Index and length of the first row whose length differs from the first row.
    pub fn first_ragged_row(&self) -> Option<(usize, usize)> {
        let expected = self.column_count();
        self.table_data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
            .map(|(i, row)| (i, row.len()))
    }
}

/// Payload shared by `code` and `listing` blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeData {
    /// Source code, emitted verbatim
    pub code: String,

    /// Highlighting language
    #[serde(default = "default_language")]
    pub language: String,

    /// Listing caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Cross-reference label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_language() -> String {
    "text".to_string()
}

/// Equation block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationData {
    /// LaTeX math source
    pub equation: String,

    /// Cross-reference label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_kind_names() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(BlockKind::from_name("video"), None);
    }

    #[test]
    fn test_deserialize_code_default_language() {
        let block: ContentBlock =
            serde_json::from_value(json!({"type": "code", "data": {"code": "x = 1"}})).unwrap();
        match block {
            ContentBlock::Code(data) => {
                assert_eq!(data.language, "text");
                assert_eq!(data.code, "x = 1");
            }
            other => panic!("Expected code block, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_text_sources() {
        let inline: ContentBlock =
            serde_json::from_value(json!({"type": "text", "data": {"text": "Hello"}})).unwrap();
        assert_eq!(inline, ContentBlock::text("Hello"));

        let file: ContentBlock =
            serde_json::from_value(json!({"type": "text", "data": {"textPath": "intro.txt"}}))
                .unwrap();
        assert_eq!(file, ContentBlock::text_file("intro.txt"));
    }

    #[test]
    fn test_label_and_caption_accessors() {
        let block: ContentBlock = serde_json::from_value(json!({
            "type": "image",
            "data": {"imagePath": "a.png", "caption": "A figure", "label": "fig:a"}
        }))
        .unwrap();
        assert_eq!(block.kind(), BlockKind::Image);
        assert_eq!(block.label(), Some("fig:a"));
        assert_eq!(block.caption(), Some("A figure"));
        assert_eq!(ContentBlock::text("x").label(), None);
    }

    #[test]
    fn test_first_ragged_row() {
        let table = TableData {
            table_data: vec![
                vec!["a".into(), "b".into(), "c".into()],
                vec!["d".into(), "e".into(), "f".into()],
                vec!["g".into(), "h".into()],
            ],
            caption: None,
            label: None,
        };
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.first_ragged_row(), Some((2, 2)));
    }
}
