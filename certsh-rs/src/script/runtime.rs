//! Interpreter state visible to verb handlers and resolvers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ScriptError;
use crate::events::Shared;

use super::expand::ExpandContext;
use super::frame::{CallStack, Frame, Script};
use super::resolve::{resolve_builtin, Resolvers};
use super::vars::{Scope, VarEntry};

// ── Host interfaces ───────────────────────────────────────────────────────────

/// Where printed lines and diagnostics go.
pub trait Console: Send {
    fn print(&mut self, line: &str);
    fn diagnostic(&mut self, line: &str);
}

/// Resolves a script name given to `run` into its source.
pub type ScriptLoader = Arc<dyn Fn(&str) -> Result<Script, ScriptError> + Send + Sync>;

/// A loader reading `name` as a path, falling back to `script_dir/name`.
pub fn file_loader(script_dir: Option<PathBuf>) -> ScriptLoader {
    Arc::new(move |name: &str| {
        let direct = PathBuf::from(name);
        let path = match &script_dir {
            _ if direct.is_file() => direct,
            Some(dir) if dir.join(name).is_file() => dir.join(name),
            _ => return Err(ScriptError::NotFound(name.to_owned())),
        };
        tracing::debug!(script = name, path = %path.display(), "loading script");
        Script::load(name, &path)
    })
}

// ── Tally ─────────────────────────────────────────────────────────────────────

/// Running count of `expect` outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: u64,
    pub failed: u64,
}

impl Tally {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }
}

// ── Runtime ───────────────────────────────────────────────────────────────────

pub struct Runtime {
    pub stack: CallStack,
    pub shared: Arc<Shared>,
    pub resolvers: Resolvers,
    pub loader: Option<ScriptLoader>,
    pub console: Option<Box<dyn Console>>,
    /// Printed lines, when no console is attached.
    pub output: Vec<String>,
    /// Diagnostics, when no console is attached.
    pub diagnostics: Vec<String>,
    pub tally: Tally,
    /// Set by `exit`.
    pub exit_code: Option<i32>,
    /// Print each command before it runs.
    pub echo: bool,
    /// Registered verb names, in registration order.
    pub verb_names: Vec<String>,
    started: Instant,
}

impl Runtime {
    pub fn new(shared: Arc<Shared>, program_args: Vec<String>) -> Self {
        Runtime {
            stack: CallStack::new(program_args),
            shared,
            resolvers: Resolvers::default(),
            loader: None,
            console: None,
            output: Vec::new(),
            diagnostics: Vec::new(),
            tally: Tally::default(),
            exit_code: None,
            echo: false,
            verb_names: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn top(&self) -> &Frame {
        self.stack.top()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    // ── Variables ─────────────────────────────────────────────────────────────

    pub fn set_var(&mut self, scope: Scope, name: &str, value: impl Into<String>) {
        let scope = match scope {
            Scope::Auto if self.stack.top().locals.contains(name) => Scope::Local,
            Scope::Auto if self.shared.has_global(name) => Scope::Global,
            Scope::Auto => Scope::Local,
            s => s,
        };
        match scope {
            Scope::Global => self.shared.set_global(name, value),
            _ => self.stack.top_mut().locals.set(name, value),
        }
    }

    /// Look `name` up in the top frame, then the globals.
    pub fn lookup(&self, name: &str) -> Option<(Scope, VarEntry)> {
        if let Some(e) = self.stack.top().locals.get(name) {
            return Some((Scope::Local, e.clone()));
        }
        self.shared.global(name).map(|e| (Scope::Global, e))
    }

    pub fn var(&self, name: &str) -> Option<String> {
        self.lookup(name).map(|(_, e)| e.value)
    }

    /// Remove a local, else a global.  `false` if neither existed.
    pub fn unset_var(&mut self, name: &str) -> bool {
        self.stack.top_mut().locals.unset(name) || self.shared.unset_global(name)
    }

    pub fn set_byte_len(&mut self, name: &str, len: usize) -> bool {
        self.stack.top_mut().locals.set_byte_len(name, len)
            || self.shared.set_global_byte_len(name, len)
    }

    // ── Output ────────────────────────────────────────────────────────────────

    pub fn print(&mut self, line: impl Into<String>) {
        let line = line.into();
        match self.console.as_mut() {
            Some(c) => c.print(&line),
            None => self.output.push(line),
        }
    }

    pub fn diagnostic(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!("{msg}");
        match self.console.as_mut() {
            Some(c) => c.diagnostic(&msg),
            None => self.diagnostics.push(msg),
        }
    }

    // ── Placeholders ──────────────────────────────────────────────────────────

    /// Resolve one placeholder: host resolvers first, then the built-ins.
    pub fn resolve(&self, source: &str, arg: &str) -> Option<String> {
        let source = source.to_ascii_lowercase();
        match self.resolvers.get(&source) {
            Some(f) => Some(f(arg).unwrap_or_default()),
            None => resolve_builtin(self, &source, arg),
        }
    }
}

impl ExpandContext for Runtime {
    fn resolve(&mut self, source: &str, arg: &str) -> Option<String> {
        Runtime::resolve(self, source, arg)
    }

    fn diagnostic(&mut self, msg: String) {
        Runtime::diagnostic(self, msg);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
