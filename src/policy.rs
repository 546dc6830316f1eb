//! Plain-text policy: detect markdown contamination.
//!
//! Text blocks are emitted into LaTeX verbatim, so markdown markers in them
//! either show up literally or clash with LaTeX control characters. The
//! checker is a conservative line-based heuristic:
//!
//! - `HEADING`: a line starting with `#` (after optional whitespace).
//! - `LIST_MARKER`: a line starting with `1.`, `-` or `*` followed by
//!   whitespace (after optional indentation).
//! - `EMPHASIS_MARK`: `**`, `__`, `~~`, or any single `*` outside math.
//! - `CODE_FENCE`: a line made of three or more backticks and an optional
//!   info string.
//!
//! Before emphasis scanning, escaped characters (`\*`, `\$`) and `$...$`
//! and `$$...$$` math spans are blanked out, so `$a*b$` is never flagged.
//! Reference macros (`\ref`, `\label`, `\cite` and friends) lose their
//! arguments too, since keys like `fig:__init__` are not prose. Any other
//! macro only loses its name: `\footnote{**x**}` is still flagged. A single
//! `*` outside math is flagged even when meant as multiplication; write it
//! as `$a*b$` or `\*` instead.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A markdown rule that text may violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyRule {
    /// Markdown heading
    Heading,
    /// Markdown list item
    ListMarker,
    /// Markdown emphasis or strikethrough
    EmphasisMark,
    /// Fenced code block delimiter
    CodeFence,
}

impl PolicyRule {
    /// Reason code (e.g. `LIST_MARKER`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyRule::Heading => "HEADING",
            PolicyRule::ListMarker => "LIST_MARKER",
            PolicyRule::EmphasisMark => "EMPHASIS_MARK",
            PolicyRule::CodeFence => "CODE_FENCE",
        }
    }

    /// Short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            PolicyRule::Heading => "markdown heading",
            PolicyRule::ListMarker => "markdown list marker",
            PolicyRule::EmphasisMark => "markdown emphasis marker",
            PolicyRule::CodeFence => "markdown code fence",
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One policy violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Line number (1-based)
    pub line: usize,

    /// Violated rule
    pub rule: PolicyRule,

    /// The offending line, trimmed and shortened
    pub excerpt: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} ({}): `{}`",
            self.line,
            self.rule.description(),
            self.rule,
            self.excerpt
        )
    }
}

const EXCERPT_CHARS: usize = 60;

struct Patterns {
    heading: Regex,
    list_marker: Regex,
    code_fence: Regex,
    escaped_char: Regex,
    math_span: Regex,
    control_sequence: Regex,
    strong: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        heading: Regex::new(r"^\s*#").expect("valid regex"),
        list_marker: Regex::new(r"^\s*(?:\d+\.|[-*])\s").expect("valid regex"),
        code_fence: Regex::new(r"^\s*`{3,}[\w+#.-]*\s*$").expect("valid regex"),
        escaped_char: Regex::new(r"\\[^A-Za-z@]").expect("valid regex"),
        math_span: Regex::new(r"\$\$[^$]*\$\$|\$[^$]*\$").expect("valid regex"),
        control_sequence: Regex::new(
            r"\\([A-Za-z@]+)\*?((?:\[[^\]]*\])?(?:\{[^{}]*\})*)",
        )
        .expect("valid regex"),
        strong: Regex::new(r"\*\*|__|~~").expect("valid regex"),
    })
}

/// Check text for markdown contamination.
///
/// Returns violations in line order; a line yields at most one violation per
/// rule.
pub fn check_plain_text(content: &str) -> Vec<Violation> {
    let p = patterns();
    let mut violations = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let mut push = |rule| {
            violations.push(Violation {
                line: line_no,
                rule,
                excerpt: excerpt(line),
            })
        };

        if p.code_fence.is_match(line) {
            push(PolicyRule::CodeFence);
            continue;
        }
        if p.heading.is_match(line) {
            push(PolicyRule::Heading);
        }

        // The list marker itself is not emphasis; scan only what follows it.
        let body = match p.list_marker.find(line) {
            Some(m) => {
                push(PolicyRule::ListMarker);
                &line[m.end()..]
            }
            None => line,
        };

        if has_emphasis(body) {
            push(PolicyRule::EmphasisMark);
        }
    }

    violations
}

/// Whether `text` passes the policy.
pub fn is_plain_text(content: &str) -> bool {
    check_plain_text(content).is_empty()
}

fn has_emphasis(line: &str) -> bool {
    let scan = strip_exempt(line);
    patterns().strong.is_match(&scan) || scan.contains('*')
}

/// Macros whose arguments are keys rather than text.
const REFERENCE_MACROS: &[&str] = &[
    "ref", "eqref", "pageref", "autoref", "nameref", "cref", "Cref", "label",
];

fn is_reference_macro(name: &str) -> bool {
    REFERENCE_MACROS.contains(&name) || name.starts_with("cite") || name.ends_with("cite")
}

/// Blank out escapes, math spans and macro names.
///
/// Arguments of reference macros are blanked with the name; the arguments
/// of every other macro stay in place to be scanned.
fn strip_exempt(line: &str) -> String {
    let p = patterns();
    let without_escapes = p.escaped_char.replace_all(line, " ");
    let without_math = p.math_span.replace_all(&without_escapes, " ");
    p.control_sequence
        .replace_all(&without_math, |caps: &Captures<'_>| {
            if is_reference_macro(&caps[1]) {
                " ".to_string()
            } else {
                format!(" {}", &caps[2])
            }
        })
        .into_owned()
}

fn excerpt(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}
