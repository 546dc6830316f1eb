//! Deduplicated bibliography.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// One bibliography entry, attributed to the first page citing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    /// Citation key
    pub id: String,

    /// Raw citation source
    pub citation: String,

    /// Page that introduced the entry
    pub first_page: u32,
}

impl BibEntry {
    /// The entry as BibTeX.
    ///
    /// A citation that already is a BibTeX entry (starts with `@`) is kept
    /// as written; anything else becomes a `@misc` entry with the citation
    /// as its note. Unmatched braces in a note are dropped.
    pub fn to_bibtex(&self) -> String {
        let citation = self.citation.trim();
        if citation.starts_with('@') {
            citation.to_string()
        } else {
            format!(
                "@misc{{{},\n  note = {{{}}}\n}}",
                self.id,
                balance_braces(citation)
            )
        }
    }
}

/// Remove braces without a partner, keeping balanced groups intact.
fn balance_braces(text: &str) -> Cow<'_, str> {
    let mut open = Vec::new();
    let mut unmatched = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '{' => open.push(i),
            '}' => {
                if open.pop().is_none() {
                    unmatched.push(i);
                }
            }
            _ => {}
        }
    }
    unmatched.extend(open);
    if unmatched.is_empty() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.char_indices()
            .filter(|(i, _)| !unmatched.contains(i))
            .map(|(_, c)| c)
            .collect(),
    )
}

/// Outcome of adding a citation to a [`Bibliography`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// First time the id was seen
    Added,
    /// Same id, identical body
    Merged,
    /// Same id, different body; carries the existing entry
    Conflict(BibEntry),
}

/// Bibliography entries in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bibliography {
    entries: Vec<BibEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Bibliography {
    /// Create an empty bibliography.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a citation cited on `page`.
    ///
    /// Bodies are compared after trimming surrounding whitespace.
    pub fn insert(&mut self, id: &str, citation: &str, page: u32) -> Insertion {
        if let Some(&i) = self.index.get(id) {
            let existing = &self.entries[i];
            return if existing.citation.trim() == citation.trim() {
                Insertion::Merged
            } else {
                Insertion::Conflict(existing.clone())
            };
        }
        self.index.insert(id.to_string(), self.entries.len());
        self.entries.push(BibEntry {
            id: id.to_string(),
            citation: citation.to_string(),
            first_page: page,
        });
        Insertion::Added
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&BibEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Entries in order of first appearance.
    pub fn entries(&self) -> &[BibEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole bibliography as a `.bib` file.
    pub fn to_bibtex(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_bibtex());
            out.push_str("\n\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_merge_and_conflict() {
        let mut bib = Bibliography::new();
        assert_eq!(bib.insert("knuth", "@book{knuth}", 1), Insertion::Added);
        assert_eq!(bib.insert("knuth", " @book{knuth}\n", 4), Insertion::Merged);
        match bib.insert("knuth", "@book{knuth, year=1968}", 5) {
            Insertion::Conflict(existing) => assert_eq!(existing.first_page, 1),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(bib.len(), 1);
        assert_eq!(bib.get("knuth").map(|e| e.first_page), Some(1));
    }

    #[test]
    fn test_first_appearance_order() {
        let mut bib = Bibliography::new();
        bib.insert("b", "B", 1);
        bib.insert("a", "A", 2);
        bib.insert("b", "B", 3);
        let ids: Vec<_> = bib.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_to_bibtex() {
        let mut bib = Bibliography::new();
        bib.insert("knuth", "@book{knuth,\n  title = {TAOCP}\n}", 1);
        bib.insert("web", "Project website, 2024", 1);
        assert_eq!(
            bib.to_bibtex(),
            "@book{knuth,\n  title = {TAOCP}\n}\n\n@misc{web,\n  note = {Project website, 2024}\n}\n\n"
        );
        assert!(Bibliography::new().to_bibtex().is_empty());
    }

    #[test]
    fn test_note_braces_stay_balanced() {
        let mut bib = Bibliography::new();
        bib.insert("smith", "Smith, J. {draft} } 2020", 1);
        bib.insert("jones", "Jones {and {Co} 1999", 2);
        let out = bib.to_bibtex();
        assert_eq!(out.matches('{').count(), out.matches('}').count());
        assert!(out.contains("note = {Smith, J. {draft}  2020}"));
        assert!(out.contains("note = {Jones and {Co} 1999}"));
    }
}
