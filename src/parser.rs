// src/parser.rs

/// Byte cursor over the inner text of one accessor token.
///
/// Accessor text never fails to parse: every helper degrades to "take what is
/// there" instead of returning an error.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Split on `sep`, ignoring separators inside `[...]`.
    ///
    /// `a.b:c[x=1.5].d` yields `a`, `b:c[x=1.5]`, `d`.
    pub fn split_top_level(mut self, sep: char) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut start = self.i;
        let mut depth = 0usize;
        while let Some(c) = self.peek_char() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                c if c == sep && depth == 0 => {
                    out.push(&self.s[start..self.i]);
                    start = self.i + c.len_utf8();
                }
                _ => {}
            }
            self.i += c.len_utf8();
        }
        out.push(&self.s[start..]);
        out
    }

    /// Text up to (not including) `end`, leaving the cursor on `end`.
    /// Without `end` the rest of the input is taken.
    pub fn capture_until(&mut self, end: char) -> &'a str {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == end {
                break;
            }
            self.i += c.len_utf8();
        }
        &self.s[start..self.i]
    }

    /// Contents of a trailing `[...]` group: everything after the opening bracket
    /// up to the last `]`, inner brackets kept verbatim. A missing closing bracket
    /// takes the rest of the input.
    pub fn capture_bracketed(&mut self) -> Option<&'a str> {
        if !self.consume_char('[') {
            return None;
        }
        let rest = self.rest();
        self.i = self.s.len();
        Some(match rest.rfind(']') {
            Some(end) => &rest[..end],
            None => rest,
        })
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.i += lit.len();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }
}
