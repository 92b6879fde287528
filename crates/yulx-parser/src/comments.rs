//! Comment-aware pre-pass: blanks every comment while preserving line
//! numbers and collects doc comments (`///` lines, `/** */` blocks) into a
//! line-keyed map.

use std::collections::BTreeMap;
use yulx_core::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct Stripped {
    pub code: String,
    /// Doc comment text keyed by the line it ends on. Adjacent `///` lines
    /// coalesce into the entry of the last line.
    pub docs: BTreeMap<usize, String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    None,
    Slash,
    Line,
    Multi,
    Star,
    Quote,
    Back,
}

pub fn strip(source: &str, file: &str) -> Result<Stripped> {
    let source: String = source.chars().filter(|&c| c != '\r').collect();
    let mut code = String::with_capacity(source.len());
    let mut docs: BTreeMap<usize, String> = BTreeMap::new();

    let mut state = State::None;
    let mut line = 1usize;
    let mut comment = String::new();
    let mut doc = false;
    let mut quote_line = 0usize;
    let mut last_doc_line = 0usize;

    let chars: Vec<char> = source.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        match state {
            State::None => match c {
                '/' => {
                    state = State::Slash;
                }
                '"' => {
                    state = State::Quote;
                    quote_line = line;
                    code.push(c);
                }
                _ => code.push(c),
            },
            State::Slash => match c {
                '/' => {
                    state = State::Line;
                    doc = i + 1 < chars.len() && chars[i + 1] == '/';
                    if doc {
                        i += 1;
                        code.push(' ');
                    }
                    comment.clear();
                    code.push_str("  ");
                }
                '*' => {
                    state = State::Multi;
                    // `/**/` is an empty plain comment, not a doc block.
                    doc = i + 2 < chars.len() && chars[i + 1] == '*' && chars[i + 2] != '/';
                    if doc {
                        i += 1;
                        code.push(' ');
                    }
                    comment.clear();
                    code.push_str("  ");
                }
                _ => {
                    state = State::None;
                    code.push('/');
                    // Reprocess this character outside the comment machine.
                    continue;
                }
            },
            State::Line => {
                if c == '\n' {
                    state = State::None;
                    if doc {
                        let text = comment.trim().to_string();
                        if last_doc_line + 1 == line {
                            let merged = docs.remove(&last_doc_line).unwrap_or_default();
                            docs.insert(line, format!("{}\n{}", merged, text));
                        } else {
                            docs.insert(line, text);
                        }
                        last_doc_line = line;
                    }
                    code.push('\n');
                } else {
                    comment.push(c);
                    code.push(' ');
                }
            }
            State::Multi => {
                if c == '*' {
                    state = State::Star;
                    code.push(' ');
                } else {
                    if c == '\n' {
                        code.push('\n');
                    } else {
                        code.push(' ');
                    }
                    comment.push(c);
                }
            }
            State::Star => {
                if c == '/' {
                    state = State::None;
                    if doc {
                        docs.insert(line, tidy_block(&comment));
                        last_doc_line = line;
                    }
                    code.push(' ');
                } else {
                    state = State::Multi;
                    if c == '\n' {
                        code.push('\n');
                    } else {
                        code.push(' ');
                    }
                    comment.push('*');
                    comment.push(c);
                }
            }
            State::Quote => match c {
                '\\' => {
                    state = State::Back;
                    code.push(c);
                }
                '"' => {
                    state = State::None;
                    code.push(c);
                }
                '\n' => {
                    return Err(unterminated(file, quote_line, &source));
                }
                _ => code.push(c),
            },
            State::Back => {
                state = State::Quote;
                code.push(c);
            }
        }
        if c == '\n' {
            line += 1;
        }
        i += 1;
    }

    match state {
        State::Quote | State::Back => Err(unterminated(file, quote_line, &source)),
        State::Multi | State::Star => Err(Error::Parse {
            file: file.to_string(),
            line,
            column: 1,
            message: "unterminated block comment".into(),
            snippet: String::new(),
        }),
        State::Line => {
            // File ended inside a line comment: close it out.
            if doc {
                docs.insert(line, comment.trim().to_string());
            }
            Ok(Stripped { code, docs })
        }
        State::Slash => {
            code.push('/');
            Ok(Stripped { code, docs })
        }
        State::None => Ok(Stripped { code, docs }),
    }
}

fn tidy_block(comment: &str) -> String {
    comment
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unterminated(file: &str, line: usize, source: &str) -> Error {
    let snippet = source.lines().nth(line.saturating_sub(1)).unwrap_or("").to_string();
    Error::Parse {
        file: file.to_string(),
        line,
        column: 1,
        message: "unterminated string literal".into(),
        snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_become_spaces_and_lines_survive() {
        let src = "let a := 1 // trailing\nlet b := 2 /* x\ny */ let c := 3\n";
        let out = strip(src, "t.yulx").unwrap();
        assert_eq!(out.code.lines().count(), src.lines().count());
        assert!(out.code.contains("let a := 1"));
        assert!(out.code.contains("let c := 3"));
        assert!(!out.code.contains("trailing"));
        assert!(out.docs.is_empty());
    }

    #[test]
    fn doc_lines_coalesce() {
        let src = "/// first\n/// second\nlet a := 1\n";
        let out = strip(src, "t.yulx").unwrap();
        assert_eq!(out.docs.len(), 1);
        assert_eq!(out.docs.get(&2).unwrap(), "first\nsecond");
    }

    #[test]
    fn doc_blocks_are_kept_and_plain_blocks_dropped() {
        let src = "/** packed output */\nstruct s { }\n/* nope */\n";
        let out = strip(src, "t.yulx").unwrap();
        assert_eq!(out.docs.get(&1).unwrap(), "packed output");
        assert_eq!(out.docs.len(), 1);
    }

    #[test]
    fn strings_shield_comment_markers() {
        let src = "let s := \"// not a comment\"\n";
        let out = strip(src, "t.yulx").unwrap();
        assert!(out.code.contains("// not a comment"));
    }

    #[test]
    fn escaped_quotes_stay_in_the_string() {
        let src = "let s := \"a\\\"b\"  // gone\n";
        let out = strip(src, "t.yulx").unwrap();
        assert!(out.code.contains("a\\\"b"));
        assert!(!out.code.contains("gone"));
    }

    #[test]
    fn unterminated_string_names_its_opening_line() {
        let src = "let a := 1\nlet s := \"broken\n";
        let err = strip(src, "t.yulx").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
