//! Character cursor with positions and caret diagnostics.

use yulx_core::errors::Error;

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
}

#[derive(Debug)]
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
    pub file: String,
    /// Byte-free char offsets where each line begins.
    line_starts: Vec<usize>,
}

impl Cursor {
    pub fn new(source: &str, file: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut line_starts = vec![0usize];
        for (i, &c) in chars.iter().enumerate() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            chars,
            pos: 0,
            file: file.to_string(),
            line_starts,
        }
    }

    pub fn save(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r') | Some('\n')) {
            self.pos += 1;
        }
    }

    /// Match a literal token (after whitespace); consumes on success.
    pub fn try_tag(&mut self, tag: &str) -> bool {
        self.skip_whitespace();
        let end = self.pos + tag.chars().count();
        if end <= self.chars.len() && self.chars[self.pos..end].iter().collect::<String>() == tag {
            self.pos = end;
            true
        } else {
            false
        }
    }

    /// Match a keyword: the literal followed by a non-identifier character.
    pub fn try_keyword(&mut self, kw: &str) -> bool {
        self.skip_whitespace();
        let end = self.pos + kw.chars().count();
        if end > self.chars.len() || self.chars[self.pos..end].iter().collect::<String>() != kw {
            return false;
        }
        if let Some(&next) = self.chars.get(end) {
            if is_ident_char(next) {
                return false;
            }
        }
        self.pos = end;
        true
    }

    pub fn peek_keyword(&mut self, kw: &str) -> bool {
        let save = self.pos;
        let hit = self.try_keyword(kw);
        self.pos = save;
        hit
    }

    /// Maximal-munch identifier `[A-Za-z_$][A-Za-z0-9_$.]*`.
    pub fn ident(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => self.pos += 1,
            _ => return None,
        }
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    pub fn peek_ident_start(&mut self) -> bool {
        self.skip_whitespace();
        matches!(self.peek(), Some(c) if is_ident_start(c))
    }

    pub fn line(&self) -> usize {
        match self.line_starts.binary_search(&self.pos) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }

    pub fn column(&self) -> usize {
        let line = self.line();
        self.pos - self.line_starts[line - 1] + 1
    }

    fn source_line(&self, line: usize) -> String {
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.chars.len());
        self.chars[start..end.max(start)].iter().collect()
    }

    /// A parse error at the current position with the offending line and a
    /// caret under the column.
    pub fn err(&self, message: impl Into<String>) -> Error {
        let line = self.line();
        let column = self.column();
        let text = self.source_line(line);
        let caret = format!("{}^", " ".repeat(column.saturating_sub(1)));
        Error::Parse {
            file: self.file.clone(),
            line,
            column,
            message: message.into(),
            snippet: format!("{}\n{}", text, caret),
        }
    }

    pub fn expect_tag(&mut self, tag: &str) -> Result<(), Error> {
        if self.try_tag(tag) {
            Ok(())
        } else {
            Err(self.err(format!("expected `{}`", tag)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_maximal_and_dotted() {
        let mut c = Cursor::new("  calldata.id(", "t");
        assert_eq!(c.ident().unwrap(), "calldata.id");
        assert_eq!(c.peek(), Some('('));
    }

    #[test]
    fn keywords_respect_the_boundary_rule() {
        let mut c = Cursor::new("lettuce", "t");
        assert!(!c.try_keyword("let"));
        assert_eq!(c.ident().unwrap(), "lettuce");

        let mut c = Cursor::new("let x", "t");
        assert!(c.try_keyword("let"));
        assert_eq!(c.ident().unwrap(), "x");

        // A dot continues the identifier, so the keyword does not match.
        let mut c = Cursor::new("case.x", "t");
        assert!(!c.try_keyword("case"));
    }

    #[test]
    fn positions_and_caret() {
        let mut c = Cursor::new("let a\nlet ?", "t.yulx");
        while c.peek() != Some('?') {
            c.bump();
        }
        let err = c.err("expected identifier");
        match err {
            Error::Parse {
                line,
                column,
                snippet,
                ..
            } => {
                assert_eq!((line, column), (2, 5));
                assert!(snippet.ends_with("    ^"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
