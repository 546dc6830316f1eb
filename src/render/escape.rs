//! LaTeX escaping for titles and table cells.

/// Escape LaTeX special characters in `text`.
///
/// `$...$` math spans, control sequences with their brace arguments
/// (`\emph{x}`) and already escaped characters (`\%`) pass through
/// unchanged. An unterminated `$` is escaped.
pub fn escape_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '$' => match chars[i + 1..].iter().position(|&c| c == '$') {
                Some(offset) => {
                    let end = i + 1 + offset;
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                }
                None => {
                    out.push_str("\\$");
                    i += 1;
                }
            },
            '\\' => {
                let start = i;
                i += 1;
                match chars.get(i) {
                    Some(c) if c.is_ascii_alphabetic() || *c == '@' => {
                        while i < chars.len() && (chars[i].is_ascii_alphabetic() || chars[i] == '@')
                        {
                            i += 1;
                        }
                        if chars.get(i) == Some(&'*') {
                            i += 1;
                        }
                        while chars.get(i) == Some(&'{') {
                            match group_end(&chars, i) {
                                Some(end) => i = end + 1,
                                None => break,
                            }
                        }
                        out.extend(&chars[start..i]);
                    }
                    Some(_) => {
                        out.extend(&chars[start..=i]);
                        i += 1;
                    }
                    None => out.push_str("\\textbackslash{}"),
                }
            }
            c => {
                push_escaped(&mut out, c);
                i += 1;
            }
        }
    }

    out
}

/// Index of the `}` closing the group opened at `open`.
fn group_end(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' | '%' | '#' | '_' | '{' | '}' => {
            out.push('\\');
            out.push(c);
        }
        '~' => out.push_str("\\textasciitilde{}"),
        '^' => out.push_str("\\textasciicircum{}"),
        _ => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape_text("R&D 100% #1"), "R\\&D 100\\% \\#1");
        assert_eq!(escape_text("snake_case {x}"), "snake\\_case \\{x\\}");
        assert_eq!(escape_text("a~b^c"), "a\\textasciitilde{}b\\textasciicircum{}c");
    }

    #[test]
    fn test_math_and_macros_pass_through() {
        assert_eq!(escape_text("Cost of $O(n_1)$"), "Cost of $O(n_1)$");
        assert_eq!(escape_text("The \\emph{big_idea} & more"), "The \\emph{big_idea} \\& more");
        assert_eq!(escape_text("Already \\% escaped"), "Already \\% escaped");
        assert_eq!(escape_text("\\LaTeX{} rocks"), "\\LaTeX{} rocks");
    }

    #[test]
    fn test_unbalanced_input() {
        assert_eq!(escape_text("costs $5"), "costs \\$5");
        assert_eq!(escape_text("trailing \\"), "trailing \\textbackslash{}");
        assert_eq!(escape_text("\\textbf{open"), "\\textbf\\{open");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_text("Introduction"), "Introduction");
        assert_eq!(escape_text("Ünïcode"), "Ünïcode");
    }
}
