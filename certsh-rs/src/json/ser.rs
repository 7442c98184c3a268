//! Serialization: normalized JSON (with scalar overrides) and XML projection.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::node::{Document, NodeId, NodeKind};

/// Replacement literals for scalar leaves, keyed by full dotted path
/// (`a.b[2].c`; root-array elements as `[i]`).
///
/// Overrides are applied while serializing; the parsed tree is never touched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    map: HashMap<String, String>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the leaf at `path` with `literal`, emitted verbatim.
    pub fn set(&mut self, path: impl Into<String>, literal: impl Into<String>) {
        self.map.insert(path.into(), literal.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.map.get(path).map(String::as_str)
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.map.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<'src> Document<'src> {
    /// Rebuild compact JSON from the tree.
    pub fn dump(&self, overrides: &Overrides) -> String {
        let mut out = String::with_capacity(self.src().len());
        let mut path = String::new();
        self.write_json(self.root(), &mut path, overrides, &mut out);
        out
    }

    fn write_json(&self, id: NodeId, path: &mut String, ov: &Overrides, out: &mut String) {
        let base = path.len();
        match self.kind(id) {
            NodeKind::Object => {
                out.push('{');
                for (i, &child) in self.children(id).iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let name = self.name(child).unwrap_or_default();
                    write_json_string(&name, out);
                    out.push(':');
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(&name);
                    self.write_json(child, path, ov, out);
                    path.truncate(base);
                }
                out.push('}');
            }
            NodeKind::Array => {
                out.push('[');
                for (i, &child) in self.children(id).iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(path, "[{i}]");
                    self.write_json(child, path, ov, out);
                    path.truncate(base);
                }
                out.push(']');
            }
            kind => match ov.get(path.as_str()) {
                Some(literal) => out.push_str(literal),
                None if kind == NodeKind::String => write_json_string(&self.text(id), out),
                None => out.push_str(self.raw(id)),
            },
        }
    }

    /// Project the tree to XML, one tag per node.
    ///
    /// Member tags are the node's type letter followed by its name; array
    /// elements use the letter alone.  The outermost tag is `root_tag`, or
    /// the type letter followed by `root`.
    pub fn to_xml(&self, root_tag: Option<&str>) -> String {
        let root = self.root();
        let tag = match root_tag {
            Some(t) => sanitize_tag(t),
            None => format!("{}root", self.kind(root).type_code()),
        };
        let mut out = String::new();
        self.write_xml(root, &tag, &mut out);
        out
    }

    fn write_xml(&self, id: NodeId, tag: &str, out: &mut String) {
        let _ = write!(out, "<{tag}>");
        match self.kind(id) {
            NodeKind::Object | NodeKind::Array => {
                for &child in self.children(id) {
                    let mut child_tag = self.kind(child).type_code().to_string();
                    if let Some(name) = self.name(child) {
                        child_tag.push_str(&sanitize_tag(&name));
                    }
                    self.write_xml(child, &child_tag, out);
                }
            }
            _ => xml_escape(&self.text(id), out),
        }
        let _ = write!(out, "</{tag}>");
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn xml_escape(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

/// Replace characters that cannot appear in an XML name with `_`.
fn sanitize_tag(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
