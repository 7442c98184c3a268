//! Verb dispatch.
//!
//! A [`Dispatcher`] is an ordered list of (verb names, handler) pairs.  The
//! first pair whose names contain `tokens[0]` (case-insensitively) runs.

use super::runtime::Runtime;

// ── Flow ──────────────────────────────────────────────────────────────────────

/// What the interpreter does after a handler returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Flow {
    /// Fall through to the next line.
    #[default]
    Next,
    /// Continue after `:label` in the current script.
    Goto(String),
    /// Push a frame on the current script, starting after `:label`.
    Call { label: String, args: Vec<String> },
    /// Push a frame for another script, starting at its first line.
    Run { script: String, args: Vec<String> },
    /// Pop the current frame; the caller sees `value` as its return value.
    Return(String),
}

// ── CommandContext ────────────────────────────────────────────────────────────

/// Per-command state handed to a handler.
///
/// `status` and `ret` start out as the frame's current values and are
/// written back after the handler returns.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub status: i64,
    pub ret: String,
    pub flow: Flow,
    /// 1-based line in the running script.
    pub line: Option<usize>,
    pub source: Option<String>,
}

impl CommandContext {
    /// Prefix `msg` with `source:line` when running inside a script.
    pub fn located(&self, msg: impl std::fmt::Display) -> String {
        match (&self.source, self.line) {
            (Some(src), Some(line)) => format!("{src}:{line}: {msg}"),
            _ => msg.to_string(),
        }
    }

    /// Report a failure: emit a diagnostic and set status 1.
    pub fn fail(&mut self, rt: &mut Runtime, msg: impl std::fmt::Display) {
        rt.diagnostic(self.located(msg));
        self.status = 1;
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// A verb handler.  Returns `true` to terminate the program.
pub type Handler = Box<dyn Fn(&mut Runtime, &[String], &mut CommandContext) -> bool + Send + Sync>;

struct Entry {
    names: Vec<String>,
    handler: Handler,
}

#[derive(Default)]
pub struct Dispatcher {
    entries: Vec<Entry>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `names`.
    pub fn register<F>(&mut self, names: &[&str], handler: F)
    where
        F: Fn(&mut Runtime, &[String], &mut CommandContext) -> bool + Send + Sync + 'static,
    {
        self.entries.push(Self::entry(names, handler));
    }

    /// Insert a handler ahead of every existing one, overriding them.
    pub fn register_front<F>(&mut self, names: &[&str], handler: F)
    where
        F: Fn(&mut Runtime, &[String], &mut CommandContext) -> bool + Send + Sync + 'static,
    {
        self.entries.insert(0, Self::entry(names, handler));
    }

    fn entry<F>(names: &[&str], handler: F) -> Entry
    where
        F: Fn(&mut Runtime, &[String], &mut CommandContext) -> bool + Send + Sync + 'static,
    {
        Entry {
            names: names.iter().map(|n| n.to_ascii_lowercase()).collect(),
            handler: Box::new(handler),
        }
    }

    /// Run the handler for `tokens[0]`.  `None` when no handler matches.
    pub fn dispatch(
        &self,
        rt: &mut Runtime,
        tokens: &[String],
        ctx: &mut CommandContext,
    ) -> Option<bool> {
        let verb = tokens.first()?.to_ascii_lowercase();
        let entry = self.entries.iter().find(|e| e.names.iter().any(|n| *n == verb))?;
        tracing::debug!(verb = %verb, args = ?&tokens[1..], "dispatch");
        Some((entry.handler)(rt, tokens, ctx))
    }

    /// Every registered verb name, in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().flat_map(|e| e.names.iter().map(String::as_str))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::Shared;

    fn rt() -> Runtime {
        Runtime::new(Arc::new(Shared::new()), vec!["certsh".into()])
    }

    fn toks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn case_insensitive_match() {
        let mut d = Dispatcher::new();
        d.register(&["hello", "hi"], |rt, t, _| {
            rt.print(format!("hello {}", t.len()));
            false
        });
        let mut rt = rt();
        let mut ctx = CommandContext::default();
        assert_eq!(d.dispatch(&mut rt, &toks(&["HI", "x"]), &mut ctx), Some(false));
        assert_eq!(rt.output, ["hello 2"]);
        assert_eq!(d.dispatch(&mut rt, &toks(&["nope"]), &mut ctx), None);
    }

    #[test]
    fn front_registration_overrides() {
        let mut d = Dispatcher::new();
        d.register(&["echo"], |rt, _, _| {
            rt.print("core");
            false
        });
        d.register_front(&["echo"], |rt, _, _| {
            rt.print("host");
            true
        });
        let mut rt = rt();
        let mut ctx = CommandContext::default();
        assert_eq!(d.dispatch(&mut rt, &toks(&["echo"]), &mut ctx), Some(true));
        assert_eq!(rt.output, ["host"]);
        assert_eq!(d.names().collect::<Vec<_>>(), ["echo", "echo"]);
    }

    #[test]
    fn located_messages() {
        let mut ctx = CommandContext::default();
        assert_eq!(ctx.located("bad"), "bad");
        ctx.source = Some("boot.cs".into());
        ctx.line = Some(7);
        assert_eq!(ctx.located("bad"), "boot.cs:7: bad");
    }
}
