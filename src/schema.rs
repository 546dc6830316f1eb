//! Schema model for page documents.
//!
//! The schema is checked against the raw JSON value rather than through
//! serde, so that every violation in a page is reported at once with the
//! exact field it concerns, instead of stopping at the first deserialization
//! error.

use crate::error::{Error, Issue, Location, Result};
use crate::model::{BlockKind, Page, SectionLevel};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Primitive type of a data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string
    String,
    /// Array of arrays of strings
    StringTable,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::StringTable => value.as_array().is_some_and(|rows| {
                rows.iter().all(|row| {
                    row.as_array()
                        .is_some_and(|cells| cells.iter().all(Value::is_string))
                })
            }),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::StringTable => "an array of arrays of strings",
        }
    }
}

/// One field of a block's `data` object.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name as it appears in JSON
    pub name: &'static str,
    /// Expected type
    pub ty: FieldType,
    /// Whether the field must be present
    pub required: bool,
}

const fn required(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: true,
    }
}

const fn optional(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: false,
    }
}

// `text` and `textPath` are both optional here; the exactly-one rule is
// checked separately.
const TEXT_FIELDS: &[FieldSpec] = &[
    optional("text", FieldType::String),
    optional("textPath", FieldType::String),
];

const IMAGE_FIELDS: &[FieldSpec] = &[
    required("imagePath", FieldType::String),
    optional("caption", FieldType::String),
    optional("label", FieldType::String),
];

const TABLE_FIELDS: &[FieldSpec] = &[
    required("tableData", FieldType::StringTable),
    optional("caption", FieldType::String),
    optional("label", FieldType::String),
];

const CODE_FIELDS: &[FieldSpec] = &[
    required("code", FieldType::String),
    optional("language", FieldType::String),
    optional("caption", FieldType::String),
    optional("label", FieldType::String),
];

const EQUATION_FIELDS: &[FieldSpec] = &[
    required("equation", FieldType::String),
    optional("label", FieldType::String),
];

/// Verbatim environment terminator that code may not contain.
pub const CODE_TERMINATOR: &str = "\\end{minted}";

/// The `data` fields allowed for a block kind.
pub fn fields_for(kind: BlockKind) -> &'static [FieldSpec] {
    match kind {
        BlockKind::Text => TEXT_FIELDS,
        BlockKind::Image => IMAGE_FIELDS,
        BlockKind::Table => TABLE_FIELDS,
        BlockKind::Code | BlockKind::Listing => CODE_FIELDS,
        BlockKind::Equation => EQUATION_FIELDS,
    }
}

/// Validate a whole page document.
///
/// Issues carry block index and field pointer; page number and file are
/// filled in by the caller.
pub fn validate_page(value: &Value) -> Vec<Issue> {
    let mut issues = Vec::new();

    let Some(obj) = value.as_object() else {
        issues.push(Issue::schema(
            Location::new().field(""),
            "page document must be a JSON object",
        ));
        return issues;
    };

    match obj.get("title") {
        None => issues.push(missing_field("/title", "title")),
        Some(v) if !v.is_string() => issues.push(wrong_type("/title", "title", FieldType::String)),
        Some(_) => {}
    }

    match obj.get("pageNumber") {
        None => issues.push(missing_field("/pageNumber", "pageNumber")),
        Some(v) => {
            if v.as_u64().and_then(|n| u32::try_from(n).ok()).is_none() {
                issues.push(Issue::schema(
                    Location::new().field("/pageNumber"),
                    format!("`pageNumber` must be a non-negative integer, got {}", v),
                ));
            }
        }
    }

    if let Some(v) = obj.get("sectionLevel") {
        let in_range = v
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(SectionLevel::from_level)
            .is_some();
        if !in_range {
            issues.push(Issue::schema(
                Location::new().field("/sectionLevel"),
                format!(
                    "`sectionLevel` must be an integer in {}..={}, got {}",
                    SectionLevel::MIN,
                    SectionLevel::MAX,
                    v
                ),
            ));
        }
    }

    match obj.get("content") {
        None => {}
        Some(Value::Array(blocks)) => {
            for (index, block) in blocks.iter().enumerate() {
                issues.extend(validate_block(index, block));
            }
        }
        Some(_) => issues.push(Issue::schema(
            Location::new().field("/content"),
            "`content` must be an array of content blocks",
        )),
    }

    match obj.get("references") {
        None => {}
        Some(Value::Array(refs)) => issues.extend(validate_references(refs)),
        Some(_) => issues.push(Issue::schema(
            Location::new().field("/references"),
            "`references` must be an array",
        )),
    }

    issues
}

/// Validate one content block at position `index`.
pub fn validate_block(index: usize, block: &Value) -> Vec<Issue> {
    let mut issues = Vec::new();
    let base = format!("/content/{}", index);
    let at = |suffix: &str| Location::new().block(index).field(format!("{}{}", base, suffix));

    let Some(obj) = block.as_object() else {
        issues.push(Issue::schema(at(""), "content block must be a JSON object"));
        return issues;
    };

    let kind = match obj.get("type") {
        None => {
            issues.push(Issue::schema(at("/type"), "missing required field `type`"));
            return issues;
        }
        Some(Value::String(name)) => match BlockKind::from_name(name) {
            Some(kind) => kind,
            None => {
                issues.push(Issue::schema(
                    at("/type"),
                    format!(
                        "unknown block type `{}` (expected one of: {})",
                        name,
                        BlockKind::ALL.map(|k| k.as_str()).join(", ")
                    ),
                ));
                return issues;
            }
        },
        Some(_) => {
            issues.push(Issue::schema(at("/type"), "`type` must be a string"));
            return issues;
        }
    };

    let data = match obj.get("data") {
        None => {
            issues.push(Issue::schema(
                at("/data"),
                format!("missing required field `data` for `{}` block", kind),
            ));
            return issues;
        }
        Some(Value::Object(data)) => data,
        Some(_) => {
            issues.push(Issue::schema(at("/data"), "`data` must be a JSON object"));
            return issues;
        }
    };

    issues.extend(validate_data(kind, data, &base, index));
    issues
}

fn validate_data(kind: BlockKind, data: &Map<String, Value>, base: &str, index: usize) -> Vec<Issue> {
    let mut issues = Vec::new();
    let specs = fields_for(kind);
    let at = |name: &str| {
        Location::new()
            .block(index)
            .field(format!("{}/data/{}", base, name))
    };

    for spec in specs {
        match data.get(spec.name) {
            None if spec.required => issues.push(Issue::schema(
                at(spec.name),
                format!("missing required field `{}` for `{}` block", spec.name, kind),
            )),
            None => {}
            Some(v) if !spec.ty.matches(v) => issues.push(Issue::schema(
                at(spec.name),
                format!("`{}` must be {}", spec.name, spec.ty.describe()),
            )),
            Some(_) => {}
        }
    }

    for key in data.keys() {
        if !specs.iter().any(|s| s.name == key) {
            issues.push(Issue::schema(
                at(key),
                format!("field `{}` is not allowed on a `{}` block", key, kind),
            ));
        }
    }

    match kind {
        BlockKind::Text => {
            let has_text = data.contains_key("text");
            let has_path = data.contains_key("textPath");
            if has_text == has_path {
                let problem = if has_text { "both" } else { "neither" };
                issues.push(Issue::schema(
                    Location::new().block(index).field(format!("{}/data", base)),
                    format!(
                        "text block must have exactly one of `text` or `textPath`, found {}",
                        problem
                    ),
                ));
            }
        }
        BlockKind::Table => {
            if let Some(Value::Array(rows)) = data.get("tableData") {
                let first_len = rows.first().and_then(Value::as_array).map(Vec::len);
                if matches!(first_len, None | Some(0)) {
                    issues.push(Issue::schema(
                        at("tableData"),
                        "`tableData` must contain at least one row with at least one cell",
                    ));
                }
            }
        }
        BlockKind::Code | BlockKind::Listing => {
            if let Some(Value::String(code)) = data.get("code") {
                if code.contains(CODE_TERMINATOR) {
                    issues.push(Issue::schema(
                        at("code"),
                        format!("`code` must not contain `{}`", CODE_TERMINATOR),
                    ));
                }
            }
        }
        BlockKind::Image | BlockKind::Equation => {}
    }

    issues
}

fn validate_references(refs: &[Value]) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (i, reference) in refs.iter().enumerate() {
        let at = |suffix: &str| Location::new().field(format!("/references/{}{}", i, suffix));
        let Some(obj) = reference.as_object() else {
            issues.push(Issue::schema(at(""), "reference must be a JSON object"));
            continue;
        };

        for name in ["id", "citation"] {
            match obj.get(name) {
                None => issues.push(Issue::schema(
                    at(&format!("/{}", name)),
                    format!("missing required field `{}` in reference", name),
                )),
                Some(v) if !v.is_string() => issues.push(Issue::schema(
                    at(&format!("/{}", name)),
                    format!("`{}` must be a string", name),
                )),
                Some(_) => {}
            }
        }

        let Some(id) = obj.get("id").and_then(Value::as_str) else {
            continue;
        };
        if !is_citation_key(id) {
            issues.push(Issue::schema(
                at("/id"),
                format!("reference id `{}` is not a valid citation key", id.escape_debug()),
            ));
        }
        if !seen.insert(id) {
            issues.push(Issue::schema(
                at("/id"),
                format!("reference id `{}` is declared more than once on this page", id),
            ));
        }

        if let Some(citation) = obj.get("citation").and_then(Value::as_str) {
            if let Some(message) = check_citation(id, citation.trim()) {
                issues.push(Issue::schema(at("/citation"), message));
            }
        }
    }

    issues
}

fn bib_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r#"^[^\s,{}#%"'()=\\~]+$"#).expect("valid regex"),
            Regex::new(r"^@\s*[A-Za-z]+\s*[{(]\s*([^,\s{}()]*)").expect("valid regex"),
        )
    })
}

/// Whether `id` can be used as a BibTeX key and in `\cite{}`.
pub fn is_citation_key(id: &str) -> bool {
    bib_patterns().0.is_match(id)
}

/// The key of a BibTeX entry such as `@book{knuth, ...}`.
pub fn bibtex_entry_key(citation: &str) -> Option<&str> {
    bib_patterns()
        .1
        .captures(citation)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|key| !key.is_empty())
}

/// Whether every `{` in `text` has a matching `}`.
pub fn braces_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

fn check_citation(id: &str, citation: &str) -> Option<String> {
    if !braces_balanced(citation) {
        return Some("citation has unbalanced braces".to_string());
    }
    if !citation.starts_with('@') {
        return None;
    }
    match bibtex_entry_key(citation) {
        Some(key) if key == id => None,
        Some(key) => Some(format!(
            "BibTeX entry key `{}` does not match reference id `{}`",
            key, id
        )),
        None => Some("citation starts with `@` but is not a BibTeX entry with a key".to_string()),
    }
}

/// Read the page number of a raw page document, if it is well-formed.
pub fn page_number_of(value: &Value) -> Option<u32> {
    value
        .get("pageNumber")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

/// Convert a schema-clean value into the typed model.
pub fn parse_page(value: &Value) -> Result<Page> {
    Page::deserialize(value).map_err(Error::Json)
}

fn missing_field(pointer: &str, name: &str) -> Issue {
    Issue::schema(
        Location::new().field(pointer),
        format!("missing required field `{}`", name),
    )
}

fn wrong_type(pointer: &str, name: &str, ty: FieldType) -> Issue {
    Issue::schema(
        Location::new().field(pointer),
        format!("`{}` must be {}", name, ty.describe()),
    )
}
