//! Variable tables.
//!
//! One [`VarTable`] lives in every call-stack frame (locals) and one is
//! shared process-wide behind the lock in [`crate::events::Shared`]
//! (globals).  Values are plain strings; a variable may additionally carry
//! the byte length of a raw buffer it stands for.

use std::collections::BTreeMap;

/// Where a write goes, or where a lookup found its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The active (topmost) frame's private table.
    Local,
    /// The table shared by the whole process.
    Global,
    /// Update an existing local, else an existing global, else create a local.
    Auto,
}

/// A single variable value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarEntry {
    pub value: String,
    /// Size of the raw buffer this value is a handle for, if any.
    pub byte_len: Option<usize>,
}

impl VarEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), byte_len: None }
    }
}

/// Key/value variable store.  Iteration is in key order.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    vars: BTreeMap<String, VarEntry>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable's value.  Existing byte-length metadata
    /// is kept.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let entry = self.vars.entry(name.into()).or_default();
        entry.value = value.into();
    }

    /// Attach byte-length metadata.  Returns `false` if the variable is unset.
    pub fn set_byte_len(&mut self, name: &str, len: usize) -> bool {
        match self.vars.get_mut(name) {
            Some(e) => {
                e.byte_len = Some(len);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&VarEntry> {
        self.vars.get(name)
    }

    /// Get the value of a variable.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|e| e.value.as_str())
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VarEntry)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut vars = VarTable::new();
        vars.set("handle", "0x10");
        assert_eq!(vars.value("handle"), Some("0x10"));
    }

    #[test]
    fn overwrite_keeps_byte_len() {
        let mut vars = VarTable::new();
        vars.set("buf", "old");
        assert!(vars.set_byte_len("buf", 64));
        vars.set("buf", "new");
        assert_eq!(vars.get("buf"), Some(&VarEntry { value: "new".into(), byte_len: Some(64) }));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn byte_len_requires_existing_var() {
        let mut vars = VarTable::new();
        assert!(!vars.set_byte_len("nope", 4));
    }

    #[test]
    fn unset() {
        let mut vars = VarTable::new();
        vars.set("gone", "bye");
        assert!(vars.unset("gone"));
        assert_eq!(vars.value("gone"), None);
        assert!(!vars.unset("gone"));
    }

    #[test]
    fn iteration_is_sorted() {
        let mut vars = VarTable::new();
        vars.set("b", "2");
        vars.set("a", "1");
        let keys: Vec<_> = vars.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
