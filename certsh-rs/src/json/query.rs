//! Dotted-path queries over a parsed [`Document`].
//!
//! | Path          | Meaning                                        |
//! |---------------|------------------------------------------------|
//! | `""`          | the root                                       |
//! | `a.b`         | member `b` of member `a`                       |
//! | `a[1].k`      | member `k` of element 1 of array `a`           |
//! | `[0].k`       | member `k` of element 0 of a root array        |
//! | `m[0][2]`     | nested array subscripts                        |
//!
//! Member lookup and index resolution are linear scans; with duplicate
//! member names the first one wins.

use std::borrow::Cow;

use super::node::{Document, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step<'p> {
    Member(&'p str),
    Index(usize),
}

/// Split a path into steps.  `None` if it is malformed.
fn parse_path(path: &str) -> Option<Vec<Step<'_>>> {
    let mut steps = Vec::new();
    if path.is_empty() {
        return Some(steps);
    }
    for seg in path.split('.') {
        let (name, mut rest) = match seg.find('[') {
            Some(i) => (&seg[..i], &seg[i..]),
            None => (seg, ""),
        };
        if !name.is_empty() {
            steps.push(Step::Member(name));
        } else if rest.is_empty() {
            return None;
        }
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[')?;
            let close = inner.find(']')?;
            let index = inner[..close].trim().parse().ok()?;
            steps.push(Step::Index(index));
            rest = &inner[close + 1..];
        }
    }
    Some(steps)
}

impl<'src> Document<'src> {
    /// First member of object `id` named `name`.
    pub(crate) fn member(&self, id: NodeId, name: &str) -> Option<NodeId> {
        if self.kind(id) != NodeKind::Object {
            return None;
        }
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.name(c).is_some_and(|n| n == name))
    }

    /// Element `index` of array `id`.
    pub(crate) fn element(&self, id: NodeId, index: usize) -> Option<NodeId> {
        if self.kind(id) != NodeKind::Array {
            return None;
        }
        self.children(id).get(index).copied()
    }

    /// Resolve `path` to a node.
    pub(crate) fn lookup(&self, path: &str) -> Option<NodeId> {
        let steps = parse_path(path)?;
        steps.iter().try_fold(self.root(), |id, step| match *step {
            Step::Member(name) => self.member(id, name),
            Step::Index(i) => self.element(id, i),
        })
    }

    /// Query `path`.  Leaves yield their un-escaped text, containers their
    /// verbatim source.  `None` means the path does not exist.
    pub fn get(&self, path: &str) -> Option<Cow<'src, str>> {
        let id = self.lookup(path)?;
        Some(self.text(id))
    }

    /// Search the array-of-objects named by `spec` (`path[].member`) for the
    /// first element in `start .. start + count` that has `member`.
    pub fn find_key(&self, spec: &str, start: usize, count: usize) -> Option<usize> {
        let (array_path, member) = spec.rsplit_once("[].")?;
        let array = self.lookup(array_path)?;
        if self.kind(array) != NodeKind::Array {
            return None;
        }
        self.children(array)
            .iter()
            .enumerate()
            .skip(start)
            .take(count)
            .find(|&(_, &el)| self.member(el, member).is_some())
            .map(|(i, _)| i)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
