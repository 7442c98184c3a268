//! Recursive-descent JSON parser producing a span arena.
//!
//! The parser walks the source bytes once.  It never copies text; nodes hold
//! spans into the source.  The first error aborts the parse and reports the
//! byte offset of the offending character.

use crate::error::{JsonError, JsonErrorKind};

use super::node::{Mode, Node, NodeId, NodeKind, Quote, Span};

/// Containers nested deeper than this are rejected.
pub const MAX_NESTING: usize = 512;

/// Parse a whole document into its node arena (root = node 0).
pub(crate) fn parse(src: &str, mode: Mode) -> Result<Vec<Node>, JsonError> {
    let mut p = Parser { src: src.as_bytes(), pos: 0, mode, nodes: Vec::new(), depth: 0 };
    p.skip_ws();
    p.value(None)?;
    p.skip_ws();
    if p.pos < p.src.len() {
        return Err(p.err(JsonErrorKind::TrailingCharacters));
    }
    Ok(p.nodes)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    mode: Mode,
    nodes: Vec<Node>,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn relaxed(&self) -> bool {
        self.mode == Mode::Relaxed
    }

    fn err(&self, kind: JsonErrorKind) -> JsonError {
        JsonError::new(self.pos, kind)
    }

    /// `UnexpectedEnd` at end of input, otherwise `kind`.
    fn err_here(&self, kind: JsonErrorKind) -> JsonError {
        if self.pos >= self.src.len() {
            self.err(JsonErrorKind::UnexpectedEnd)
        } else {
            self.err(kind)
        }
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    // ── Values ────────────────────────────────────────────────────────────────

    fn value(&mut self, name: Option<(Span, Quote)>) -> Result<NodeId, JsonError> {
        match self.peek() {
            None => Err(self.err(JsonErrorKind::UnexpectedEnd)),
            Some(b'{') => self.container(NodeKind::Object, name),
            Some(b'[') => self.container(NodeKind::Array, name),
            Some(b'"') => self.string_node(name),
            Some(b'\'') if self.relaxed() => self.string_node(name),
            Some(b'\\') if self.relaxed() && matches!(self.peek_at(1), Some(b'"' | b'\'')) => {
                self.string_node(name)
            }
            Some(b'-' | b'0'..=b'9') => self.number(name),
            Some(b't') => self.literal("true", NodeKind::Boolean, name),
            Some(b'f') => self.literal("false", NodeKind::Boolean, name),
            Some(b'n') => self.literal("null", NodeKind::Null, name),
            Some(_) => Err(self.err(JsonErrorKind::UnexpectedChar)),
        }
    }

    fn container(&mut self, kind: NodeKind, name: Option<(Span, Quote)>) -> Result<NodeId, JsonError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err(JsonErrorKind::TooDeep));
        }
        let start = self.pos;
        let close = if kind == NodeKind::Object { b'}' } else { b']' };
        let id = self.alloc(Node::new(kind, start, name));
        self.depth += 1;
        self.pos += 1;
        self.skip_ws();

        if self.peek() == Some(close) {
            self.pos += 1;
        } else {
            loop {
                self.skip_ws();
                let child = if kind == NodeKind::Object {
                    let member = self.name()?;
                    self.skip_ws();
                    if self.peek() != Some(b':') {
                        return Err(self.err_here(JsonErrorKind::UnexpectedChar));
                    }
                    self.pos += 1;
                    self.skip_ws();
                    self.value(Some(member))?
                } else {
                    self.value(None)?
                };
                self.nodes[id].children.push(child);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(c) if c == close => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.err_here(JsonErrorKind::UnexpectedChar)),
                }
            }
        }

        self.depth -= 1;
        self.nodes[id].span = Span::between(start, self.pos);
        Ok(id)
    }

    fn name(&mut self) -> Result<(Span, Quote), JsonError> {
        match self.peek() {
            Some(b'"') => self.quoted(),
            Some(b'\'') if self.relaxed() => self.quoted(),
            Some(b'\\') if self.relaxed() && matches!(self.peek_at(1), Some(b'"' | b'\'')) => {
                self.quoted()
            }
            Some(c) if self.relaxed() && is_ident_byte(c) => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if is_ident_byte(c)) {
                    self.pos += 1;
                }
                Ok((Span::between(start, self.pos), Quote::None))
            }
            _ => Err(self.err_here(JsonErrorKind::UnexpectedChar)),
        }
    }

    fn string_node(&mut self, name: Option<(Span, Quote)>) -> Result<NodeId, JsonError> {
        let start = self.pos;
        let (span, quote) = self.quoted()?;
        let mut node = Node::new(NodeKind::String, start, name);
        node.span = span;
        node.quote = quote;
        Ok(self.alloc(node))
    }

    /// Scan a delimited string starting at its opening delimiter.  Returns
    /// the span of the (still escaped) contents.
    fn quoted(&mut self) -> Result<(Span, Quote), JsonError> {
        let (delim, quote, escaped) = match self.peek() {
            Some(b'\\') => (self.peek_at(1).unwrap_or(b'"'), Quote::Escaped, true),
            Some(b'\'') => (b'\'', Quote::Single, false),
            _ => (b'"', Quote::Double, false),
        };
        self.pos += if escaped { 2 } else { 1 };
        let start = self.pos;

        loop {
            let Some(b) = self.peek() else {
                return Err(self.err(JsonErrorKind::UnexpectedEnd));
            };
            match b {
                b'\\' if escaped && self.peek_at(1) == Some(delim) => {
                    let span = Span::between(start, self.pos);
                    self.pos += 2;
                    return Ok((span, quote));
                }
                c if c == delim && !escaped => {
                    let span = Span::between(start, self.pos);
                    self.pos += 1;
                    return Ok((span, quote));
                }
                b'\\' => self.escape()?,
                c if c < 0x20 => return Err(self.err(JsonErrorKind::ControlCharacter)),
                _ => self.pos += 1,
            }
        }
    }

    /// Validate one escape sequence at `pos` (which holds the backslash).
    fn escape(&mut self) -> Result<(), JsonError> {
        self.pos += 1;
        match self.peek() {
            None => Err(self.err(JsonErrorKind::UnexpectedEnd)),
            Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                self.pos += 1;
                Ok(())
            }
            Some(b'\'') if self.relaxed() => {
                self.pos += 1;
                Ok(())
            }
            Some(b'u') => {
                self.pos += 1;
                for _ in 0..4 {
                    match self.peek() {
                        Some(h) if h.is_ascii_hexdigit() => self.pos += 1,
                        _ => return Err(self.err_here(JsonErrorKind::InvalidEscape)),
                    }
                }
                Ok(())
            }
            Some(_) => Err(self.err(JsonErrorKind::InvalidEscape)),
        }
    }

    fn number(&mut self, name: Option<(Span, Quote)>) -> Result<NodeId, JsonError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(self.err(JsonErrorKind::InvalidNumber)),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err(JsonErrorKind::InvalidNumber));
            }
            self.digits();
        }
        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err(JsonErrorKind::InvalidNumber));
            }
            self.digits();
        }
        let mut node = Node::new(NodeKind::Number, start, name);
        node.span = Span::between(start, self.pos);
        Ok(self.alloc(node))
    }

    fn digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    fn literal(
        &mut self,
        word: &str,
        kind: NodeKind,
        name: Option<(Span, Quote)>,
    ) -> Result<NodeId, JsonError> {
        let start = self.pos;
        for &expected in word.as_bytes() {
            match self.peek() {
                Some(b) if b == expected => self.pos += 1,
                _ => return Err(self.err_here(JsonErrorKind::UnexpectedChar)),
            }
        }
        let mut node = Node::new(kind, start, name);
        node.span = Span::between(start, self.pos);
        Ok(self.alloc(node))
    }
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn err_at(src: &str) -> (usize, JsonErrorKind) {
        let e = parse(src, Mode::Strict).expect_err("expected parse failure");
        (e.offset, e.kind)
    }

    #[test]
    fn valid_numbers() {
        for src in ["0", "-0", "3.14", "1e10", "-2.5E-3", "10", "0.5e+2"] {
            assert!(parse(src, Mode::Strict).is_ok(), "{src} should parse");
        }
    }

    #[test]
    fn invalid_numbers_report_offsets() {
        assert_eq!(err_at("01"), (1, JsonErrorKind::TrailingCharacters));
        assert_eq!(err_at("1."), (2, JsonErrorKind::InvalidNumber));
        assert_eq!(err_at(".5"), (0, JsonErrorKind::UnexpectedChar));
        assert_eq!(err_at("1e"), (2, JsonErrorKind::InvalidNumber));
        assert_eq!(err_at("--1"), (1, JsonErrorKind::InvalidNumber));
        assert_eq!(err_at("[1.e5]"), (3, JsonErrorKind::InvalidNumber));
    }

    #[test]
    fn empty_containers() {
        let nodes = parse("{ }", Mode::Strict).unwrap();
        assert_eq!(nodes[0].kind, NodeKind::Object);
        assert!(nodes[0].children.is_empty());
        let nodes = parse("[]", Mode::Strict).unwrap();
        assert_eq!(nodes[0].kind, NodeKind::Array);
    }

    #[test]
    fn member_order_is_preserved() {
        let src = r#"{"b":1,"a":2,"b":3}"#;
        let nodes = parse(src, Mode::Strict).unwrap();
        let names: Vec<_> = nodes[0]
            .children
            .iter()
            .map(|&c| nodes[c].name.unwrap().0.slice(src))
            .collect();
        assert_eq!(names, ["b", "a", "b"]);
    }

    #[test]
    fn strict_rejects_relaxed_syntax() {
        assert_eq!(err_at("{a:1}"), (1, JsonErrorKind::UnexpectedChar));
        assert_eq!(err_at("['x']"), (1, JsonErrorKind::UnexpectedChar));
    }

    #[test]
    fn relaxed_names_and_strings() {
        let src = r#"{bare_$1: 'one', 'single': "two", \"esc\": \'three\'}"#;
        let nodes = parse(src, Mode::Relaxed).unwrap();
        assert_eq!(nodes[0].children.len(), 3);
        let names: Vec<_> = nodes[0]
            .children
            .iter()
            .map(|&c| nodes[c].name.unwrap().0.slice(src))
            .collect();
        assert_eq!(names, ["bare_$1", "single", "esc"]);
        assert_eq!(nodes[3].span.slice(src), "three");
        assert_eq!(nodes[3].quote, Quote::Escaped);
    }

    #[test]
    fn string_escapes() {
        assert!(parse(r#""a\"\\\/\b\f\n\r\t\u00e9""#, Mode::Strict).is_ok());
        assert_eq!(err_at(r#""\x""#), (2, JsonErrorKind::InvalidEscape));
        assert_eq!(err_at(r#""\u12G4""#), (5, JsonErrorKind::InvalidEscape));
        assert_eq!(err_at(r#""\u12"#), (5, JsonErrorKind::UnexpectedEnd));
    }

    #[test]
    fn control_characters_rejected() {
        assert_eq!(err_at("\"a\nb\""), (2, JsonErrorKind::ControlCharacter));
    }

    #[test]
    fn structural_errors() {
        assert_eq!(err_at(""), (0, JsonErrorKind::UnexpectedEnd));
        assert_eq!(err_at("{\"a\" 1}"), (5, JsonErrorKind::UnexpectedChar));
        assert_eq!(err_at("[1,]"), (3, JsonErrorKind::UnexpectedChar));
        assert_eq!(err_at("[1 2]"), (3, JsonErrorKind::UnexpectedChar));
        assert_eq!(err_at("{\"a\":1"), (6, JsonErrorKind::UnexpectedEnd));
        assert_eq!(err_at("tru"), (3, JsonErrorKind::UnexpectedEnd));
        assert_eq!(err_at("nul1"), (3, JsonErrorKind::UnexpectedChar));
        assert_eq!(err_at("true false"), (5, JsonErrorKind::TrailingCharacters));
    }

    #[test]
    fn nesting_limit() {
        let deep = "[".repeat(MAX_NESTING + 1);
        assert_eq!(err_at(&deep), (MAX_NESTING, JsonErrorKind::TooDeep));
    }
}
