//! Call stack and activation frames.

use std::path::Path;
use std::sync::Arc;

use crate::error::ScriptError;

use super::vars::VarTable;

// ── Script ────────────────────────────────────────────────────────────────────

/// A script's source lines plus a name used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub lines: Vec<String>,
}

impl Script {
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self { name: name.into(), lines }
    }

    /// Split `src` into lines (`\n` or `\r\n`).
    pub fn from_source(name: impl Into<String>, src: &str) -> Self {
        Self::new(name, src.lines().map(str::to_owned).collect())
    }

    /// Read a script file.  The script is named `name` in diagnostics.
    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self, ScriptError> {
        let src = std::fs::read_to_string(path)
            .map_err(|source| ScriptError::Io { path: path.to_path_buf(), source })?;
        Ok(Self::from_source(name, &src))
    }

    /// Index of the line whose trimmed text is exactly `:label`.
    ///
    /// Case-sensitive; the first match wins.
    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.lines.iter().position(|l| {
            l.trim().strip_prefix(':').is_some_and(|name| name == label)
        })
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One activation record.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// `None` for the base (interactive) frame.
    pub script: Option<Arc<Script>>,
    /// Index of the line being executed.
    pub line: usize,
    pub status: i64,
    pub ret: String,
    pub locals: VarTable,
    /// `args[0]` is the script or label name; the rest are user arguments.
    pub args: Vec<String>,
}

impl Frame {
    /// The base frame, holding the program's own arguments.
    pub fn base(args: Vec<String>) -> Self {
        Self { args, ..Self::default() }
    }

    pub fn for_script(script: Arc<Script>, start: usize, args: Vec<String>) -> Self {
        Self { script: Some(script), line: start, args, ..Self::default() }
    }

    /// Number of user arguments (excluding `args[0]`).
    pub fn user_arg_count(&self) -> usize {
        self.args.len().saturating_sub(1)
    }

    /// Source name for diagnostics, if this frame runs a script.
    pub fn source_name(&self) -> Option<&str> {
        self.script.as_deref().map(|s| s.name.as_str())
    }
}

// ── CallStack ─────────────────────────────────────────────────────────────────

/// Stack of frames.  The base frame is created up front and never popped.
#[derive(Debug, Clone)]
pub struct CallStack {
    base: Frame,
    above: Vec<Frame>,
}

impl CallStack {
    pub fn new(program_args: Vec<String>) -> Self {
        Self { base: Frame::base(program_args), above: Vec::new() }
    }

    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }

    pub fn push(&mut self, frame: Frame) {
        self.above.push(frame);
    }

    /// Pop the top frame.  Returns `None` (and leaves the stack alone) when
    /// only the base frame remains.
    pub fn pop(&mut self) -> Option<Frame> {
        self.above.pop()
    }

    pub fn top(&self) -> &Frame {
        self.above.last().unwrap_or(&self.base)
    }

    pub fn top_mut(&mut self) -> &mut Frame {
        match self.above.last_mut() {
            Some(f) => f,
            None => &mut self.base,
        }
    }

    /// Frame by index from the bottom (0 = base), clamped to a valid index.
    pub fn frame_clamped(&self, index: i64) -> &Frame {
        let i = index.clamp(0, self.above.len() as i64) as usize;
        match i.checked_sub(1) {
            Some(j) => &self.above[j],
            None => &self.base,
        }
    }

    /// Drop frames above `depth`.  The base frame always stays.
    pub fn truncate(&mut self, depth: usize) {
        self.above.truncate(depth.saturating_sub(1));
    }

    pub fn base(&self) -> &Frame {
        &self.base
    }

    /// Frames from the base up.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        std::iter::once(&self.base).chain(self.above.iter())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
