//! Span-based JSON property tree.
//!
//! A [`Document`] borrows its source text and never copies out of it while
//! parsing: every node records an (offset, length) [`Span`].  Strings are
//! un-escaped lazily, when a caller asks for their text.

use std::borrow::Cow;

use crate::error::JsonError;

use super::parse;

/// Which grammar the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// RFC 8259: double-quoted names and strings only.
    #[default]
    Strict,
    /// Also bare/single-quoted/backslash-quoted names and single-quoted strings.
    Relaxed,
}

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn between(start: usize, end: usize) -> Self {
        Self { offset: start, len: end - start }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn slice<'a>(&self, src: &'a str) -> &'a str {
        &src[self.offset..self.end()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl NodeKind {
    /// One-letter code used to prefix XML tag names.
    pub fn type_code(self) -> char {
        match self {
            NodeKind::Object => 'o',
            NodeKind::Array => 'a',
            NodeKind::String => 's',
            NodeKind::Number => 'n',
            NodeKind::Boolean => 'b',
            NodeKind::Null => 'z',
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

/// How a name or string was delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// Bare identifier (relaxed names) or non-string node.
    None,
    Double,
    Single,
    /// `\"…\"` or `\'…\'`.
    Escaped,
}

/// Index of a node in its document's arena.
pub type NodeId = usize;

/// One property of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Containers: the whole `{…}`/`[…]` text.  Strings: the contents
    /// between the delimiters, still escaped.  Other leaves: their literal.
    pub span: Span,
    pub quote: Quote,
    /// Member name (contents only) when this node is an object member.
    pub name: Option<(Span, Quote)>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, offset: usize, name: Option<(Span, Quote)>) -> Self {
        Self {
            kind,
            span: Span::new(offset, 0),
            quote: Quote::None,
            name,
            children: Vec::new(),
        }
    }
}

/// A parsed JSON document.  The root is always node 0.
#[derive(Debug, Clone)]
pub struct Document<'src> {
    src: &'src str,
    nodes: Vec<Node>,
    mode: Mode,
}

impl<'src> Document<'src> {
    /// Parse `src`.  On failure nothing of the tree is kept.
    pub fn parse(src: &'src str, mode: Mode) -> Result<Self, JsonError> {
        let nodes = parse::parse(src, mode)?;
        Ok(Self { src, nodes, mode })
    }

    pub fn parse_strict(src: &'src str) -> Result<Self, JsonError> {
        Self::parse(src, Mode::Strict)
    }

    pub fn parse_relaxed(src: &'src str) -> Result<Self, JsonError> {
        Self::parse(src, Mode::Relaxed)
    }

    pub fn src(&self) -> &'src str {
        self.src
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // Ids below only ever come from this document's own traversal.

    pub(crate) fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Verbatim source text of a node.
    pub(crate) fn raw(&self, id: NodeId) -> &'src str {
        self.nodes[id].span.slice(self.src)
    }

    /// Un-escaped member name, if the node is an object member.
    pub(crate) fn name(&self, id: NodeId) -> Option<Cow<'src, str>> {
        self.nodes[id].name.map(|(span, _)| unescape(span.slice(self.src)))
    }

    /// Scalar text: un-escaped for strings, verbatim for everything else.
    pub(crate) fn text(&self, id: NodeId) -> Cow<'src, str> {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::String => unescape(node.span.slice(self.src)),
            _ => Cow::Borrowed(node.span.slice(self.src)),
        }
    }
}

// ── Escapes ───────────────────────────────────────────────────────────────────

/// Resolve backslash escapes.  Borrows when there is nothing to resolve.
///
/// The parser has already validated every escape; anything unexpected here
/// is passed through unchanged.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hi = read_hex4(&mut chars);
                let ch = match hi {
                    Some(h @ 0xD800..=0xDBFF) => {
                        let mut look = chars.clone();
                        let lo = match (look.next(), look.next()) {
                            (Some('\\'), Some('u')) => read_hex4(&mut look),
                            _ => None,
                        };
                        match lo {
                            Some(l @ 0xDC00..=0xDFFF) => {
                                chars = look;
                                char::from_u32(0x10000 + ((h - 0xD800) << 10) + (l - 0xDC00))
                            }
                            _ => None,
                        }
                    }
                    Some(cp) => char::from_u32(cp),
                    None => None,
                };
                out.push(ch.unwrap_or('\u{FFFD}'));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut v = 0u32;
    for _ in 0..4 {
        v = v * 16 + chars.next()?.to_digit(16)?;
    }
    Some(v)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
