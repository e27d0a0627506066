//! Tokenizer for RFC 1035 presentation format
//!
//! Splits zone text into logical entries: one per line, except that
//! parentheses join lines together. Comments are dropped; quoted strings are
//! kept as single tokens with their escapes intact.

use crate::error::{Error, Result};
use std::path::Path;

/// A single word of zone text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// Token text; for quoted strings, the content between the quotes
    pub text: String,
    pub quoted: bool,
}

/// One logical zone file entry (a directive or a resource record)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    /// Line the entry starts on
    pub line: usize,
    /// Entry began with whitespace, so it inherits the previous owner
    pub indented: bool,
    pub tokens: Vec<Token>,
}

pub(crate) fn tokenize(input: &str, path: &Path) -> Result<Vec<Entry>> {
    let chars: Vec<char> = input.chars().collect();
    let mut entries = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();

    let mut line = 1;
    let mut entry_line = 1;
    let mut depth = 0usize;
    let mut paren_line = 0;
    let mut indented = false;
    let mut line_start = true;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                if depth == 0 {
                    if !tokens.is_empty() {
                        entries.push(Entry {
                            line: entry_line,
                            indented,
                            tokens: std::mem::take(&mut tokens),
                        });
                    }
                    indented = false;
                    line_start = true;
                }
                line += 1;
                i += 1;
                continue;
            }
            ' ' | '\t' | '\r' => {
                if line_start && depth == 0 && tokens.is_empty() {
                    indented = true;
                }
                i += 1;
            }
            ';' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '(' => {
                if depth == 0 {
                    paren_line = line;
                }
                depth += 1;
                i += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(Error::zone_parse(path, line, "unbalanced ')'"));
                }
                depth -= 1;
                i += 1;
            }
            '"' => {
                if tokens.is_empty() {
                    entry_line = line;
                }
                let start_line = line;
                let mut text = String::new();
                i += 1;
                loop {
                    let Some(&q) = chars.get(i) else {
                        return Err(Error::zone_parse(
                            path,
                            start_line,
                            "unterminated quoted string",
                        ));
                    };
                    match q {
                        '"' => {
                            i += 1;
                            break;
                        }
                        '\\' => {
                            text.push(q);
                            if let Some(&escaped) = chars.get(i + 1) {
                                text.push(escaped);
                                if escaped == '\n' {
                                    line += 1;
                                }
                            }
                            i += 2;
                        }
                        '\n' => {
                            return Err(Error::zone_parse(
                                path,
                                start_line,
                                "unterminated quoted string",
                            ));
                        }
                        _ => {
                            text.push(q);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token { text, quoted: true });
            }
            _ => {
                if tokens.is_empty() {
                    entry_line = line;
                }
                let mut text = String::new();
                while let Some(&b) = chars.get(i) {
                    if b.is_whitespace() || matches!(b, '(' | ')' | ';' | '"') {
                        break;
                    }
                    if b == '\\' {
                        text.push(b);
                        if let Some(&escaped) = chars.get(i + 1) {
                            text.push(escaped);
                        }
                        i += 2;
                        continue;
                    }
                    text.push(b);
                    i += 1;
                }
                tokens.push(Token {
                    text,
                    quoted: false,
                });
            }
        }
        line_start = false;
    }

    if depth > 0 {
        return Err(Error::zone_parse(path, paren_line, "unterminated '('"));
    }
    if !tokens.is_empty() {
        entries.push(Entry {
            line: entry_line,
            indented,
            tokens,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(entry: &Entry) -> Vec<&str> {
        entry.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_lines_and_drops_comments() {
        let entries = tokenize(
            "www 300 IN A 10.0.0.1 ; web\n; full line comment\n\nmail IN A 10.0.0.2\n",
            Path::new("t"),
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(texts(&entries[0]), ["www", "300", "IN", "A", "10.0.0.1"]);
        assert_eq!(entries[1].line, 4);
    }

    #[test]
    fn parentheses_join_lines() {
        let zone = "@ IN SOA ns1 admin (\n  2024010101 ; serial\n  3600 600 86400 300 )\nwww A 10.0.0.1\n";
        let entries = tokenize(zone, Path::new("t")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tokens.len(), 10);
        assert_eq!(entries[1].line, 4);
    }

    #[test]
    fn quoted_strings_keep_spaces_and_escapes() {
        let entries =
            tokenize(r#"txt TXT "v=spf1 -all" "say \"hi\"""#, Path::new("t")).unwrap();
        let tokens = &entries[0].tokens;
        assert_eq!(tokens[2].text, "v=spf1 -all");
        assert!(tokens[2].quoted);
        assert_eq!(tokens[3].text, r#"say \"hi\""#);
    }

    #[test]
    fn leading_whitespace_marks_owner_inheritance() {
        let entries = tokenize("www A 10.0.0.1\n    A 10.0.0.2\n", Path::new("t")).unwrap();
        assert!(!entries[0].indented);
        assert!(entries[1].indented);
    }

    #[test]
    fn unterminated_constructs_report_their_line() {
        let err = tokenize("a A 1.2.3.4\nb TXT \"open\n", Path::new("z")).unwrap_err();
        assert_eq!(err.to_string(), "z:2: unterminated quoted string");

        let err = tokenize("a A 1.2.3.4\n@ SOA ns admin (1 2\n", Path::new("z")).unwrap_err();
        assert_eq!(err.to_string(), "z:2: unterminated '('");

        let err = tokenize("a A 1.2.3.4 )\n", Path::new("z")).unwrap_err();
        assert_eq!(err.to_string(), "z:1: unbalanced ')'");
    }
}
