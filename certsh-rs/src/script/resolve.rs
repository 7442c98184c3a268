//! Placeholder sources.
//!
//! [`resolve_builtin`] implements the sources every interpreter has; hosts add
//! their own through [`Resolvers`], which are consulted first.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::json::{Document, Mode};

use super::cond::parse_int;
use super::frame::Frame;
use super::runtime::Runtime;
use super::tokenize::tokenize;

/// A host-provided source.  Receives the placeholder argument.
pub type ResolverFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Host resolvers by lower-cased source name.
#[derive(Default)]
pub struct Resolvers {
    map: HashMap<String, ResolverFn>,
}

impl Resolvers {
    /// Register (or replace) the source `name`.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.map.insert(name.to_ascii_lowercase(), Box::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&ResolverFn> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

/// Resolve a built-in source (already lower-cased).  `None` when the source
/// is unknown or the argument does not resolve.
pub fn resolve_builtin(rt: &Runtime, source: &str, arg: &str) -> Option<String> {
    Some(match source {
        // ── Frames ───────────────────────────────────────────────────────────
        "arg" => {
            let (frame, which) = match arg.split_once(':') {
                Some((f, w)) => (frame_at(rt, f), w),
                None => (rt.stack.top(), arg),
            };
            if which.trim() == "#" {
                frame.user_arg_count().to_string()
            } else {
                let n = usize::try_from(parse_int(which)?).ok()?;
                frame.args.get(n)?.clone()
            }
        }
        "args" => frame_at(rt, arg).args.get(1..).unwrap_or_default().join(" "),
        "ret" => frame_at(rt, arg).ret.clone(),
        "status" => frame_at(rt, arg).status.to_string(),
        "depth" => rt.stack.depth().to_string(),
        "line" => {
            let top = rt.stack.top();
            if top.script.is_some() { (top.line + 1).to_string() } else { "0".to_owned() }
        }
        "script" => rt.stack.top().source_name().unwrap_or_default().to_owned(),

        // ── Variables ────────────────────────────────────────────────────────
        "get" => rt.var(arg)?,
        "geti" => {
            let (name, index) = arg.rsplit_once(':')?;
            let index = usize::try_from(parse_int(index)?).ok()?;
            tokenize(&rt.var(name)?).into_iter().nth(index)?
        }
        "size" => {
            let (_, entry) = rt.lookup(arg)?;
            entry.byte_len.unwrap_or(entry.value.len()).to_string()
        }
        "defined" => u8::from(rt.lookup(arg).is_some()).to_string(),

        // ── Clock and identity ───────────────────────────────────────────────
        "time" => {
            let fmt = if arg.is_empty() { "%H:%M:%S" } else { arg };
            let mut out = String::new();
            write!(out, "{}", chrono::Local::now().format(fmt)).ok()?;
            out
        }
        "date" => chrono::Local::now().format("%Y-%m-%d").to_string(),
        "ticks" => rt.elapsed().as_millis().to_string(),
        "env" => std::env::var(arg).ok()?,
        "user" => std::env::var("USER").or_else(|_| std::env::var("USERNAME")).ok()?,
        "host" => hostname()?,
        "pid" => std::process::id().to_string(),

        // ── Text ─────────────────────────────────────────────────────────────
        "len" => arg.chars().count().to_string(),
        "upper" => arg.to_uppercase(),
        "lower" => arg.to_lowercase(),

        // ── JSON ─────────────────────────────────────────────────────────────
        "json" => {
            let (name, path) = arg.split_once(':').unwrap_or((arg, ""));
            let text = rt.var(name)?;
            let doc = Document::parse(&text, Mode::Relaxed).ok()?;
            doc.get(path)?.into_owned()
        }
        "jsonkey" => {
            let mut parts = arg.splitn(4, ':');
            let name = parts.next()?;
            let spec = parts.next()?;
            let start = match parts.next() {
                Some(s) => usize::try_from(parse_int(s)?).ok()?,
                None => 0,
            };
            let count = match parts.next() {
                Some(c) => usize::try_from(parse_int(c)?).ok()?,
                None => usize::MAX,
            };
            let text = rt.var(name)?;
            let doc = Document::parse(&text, Mode::Relaxed).ok()?;
            match doc.find_key(spec, start, count) {
                Some(i) => i.to_string(),
                None => "-1".to_owned(),
            }
        }

        "tally" => {
            let n = match arg {
                "passed" => rt.tally.passed,
                "failed" => rt.tally.failed,
                "total" | "" => rt.tally.total(),
                _ => return None,
            };
            n.to_string()
        }

        _ => return None,
    })
}

/// Frame named by a placeholder argument; empty means the top frame.
fn frame_at<'a>(rt: &'a Runtime, arg: &str) -> &'a Frame {
    match parse_int(arg) {
        Some(i) => rt.stack.frame_clamped(i),
        None => rt.stack.top(),
    }
}

fn hostname() -> Option<String> {
    if let Ok(h) = std::env::var("HOSTNAME") {
        return Some(h);
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::Shared;
    use crate::script::frame::{Frame, Script};
    use crate::script::vars::Scope;

    fn rt() -> Runtime {
        Runtime::new(Arc::new(Shared::new()), vec!["certsh".into(), "-x".into()])
    }

    fn res(rt: &Runtime, source: &str, arg: &str) -> Option<String> {
        resolve_builtin(rt, source, arg)
    }

    #[test]
    fn arguments_of_frames() {
        let mut rt = rt();
        let script = Arc::new(Script::from_source("s", "echo\n"));
        rt.stack.push(Frame::for_script(script, 0, vec!["lbl".into(), "a".into(), "b c".into()]));
        assert_eq!(res(&rt, "arg", "0").as_deref(), Some("lbl"));
        assert_eq!(res(&rt, "arg", "2").as_deref(), Some("b c"));
        assert_eq!(res(&rt, "arg", "#").as_deref(), Some("2"));
        assert_eq!(res(&rt, "arg", "9"), None);
        assert_eq!(res(&rt, "arg", "0:1").as_deref(), Some("-x"));
        assert_eq!(res(&rt, "arg", "-5:#").as_deref(), Some("1"));
        assert_eq!(res(&rt, "args", "").as_deref(), Some("a b c"));
        assert_eq!(res(&rt, "depth", "").as_deref(), Some("2"));
        assert_eq!(res(&rt, "line", "").as_deref(), Some("1"));
        assert_eq!(res(&rt, "script", "").as_deref(), Some("s"));
    }

    #[test]
    fn ret_and_status_default_to_top() {
        let mut rt = rt();
        rt.stack.top_mut().ret = "base-ret".into();
        rt.stack.push(Frame { status: 3, ..Frame::default() });
        assert_eq!(res(&rt, "status", "").as_deref(), Some("3"));
        assert_eq!(res(&rt, "ret", "").as_deref(), Some(""));
        assert_eq!(res(&rt, "ret", "0").as_deref(), Some("base-ret"));
    }

    #[test]
    fn variable_sources() {
        let mut rt = rt();
        rt.set_var(Scope::Local, "list", "one 'two three' four");
        assert_eq!(res(&rt, "geti", "list:1").as_deref(), Some("two three"));
        assert_eq!(res(&rt, "geti", "list:7"), None);
        assert_eq!(res(&rt, "defined", "list").as_deref(), Some("1"));
        assert_eq!(res(&rt, "defined", "nope").as_deref(), Some("0"));
        assert_eq!(res(&rt, "size", "list").as_deref(), Some("20"));
        rt.set_byte_len("list", 4096);
        assert_eq!(res(&rt, "size", "list").as_deref(), Some("4096"));
    }

    #[test]
    fn text_sources() {
        let rt = rt();
        assert_eq!(res(&rt, "len", "h\u{e9}llo").as_deref(), Some("5"));
        assert_eq!(res(&rt, "upper", "abc").as_deref(), Some("ABC"));
        assert_eq!(res(&rt, "lower", "ABC").as_deref(), Some("abc"));
        assert_eq!(res(&rt, "pid", "").as_deref(), Some(std::process::id().to_string().as_str()));
        assert_eq!(res(&rt, "nosuch", ""), None);
    }

    #[test]
    fn time_with_bad_format_is_unresolved() {
        let rt = rt();
        assert_eq!(res(&rt, "time", "%Y").map(|s| s.len()), Some(4));
        assert_eq!(res(&rt, "time", "%Q"), None);
    }

    #[test]
    fn json_sources() {
        let mut rt = rt();
        rt.set_var(Scope::Local, "doc", "{list:[{a:1},{b:2},{b:3}], name:'dev'}");
        assert_eq!(res(&rt, "json", "doc:name").as_deref(), Some("dev"));
        assert_eq!(res(&rt, "json", "doc:list[2].b").as_deref(), Some("3"));
        assert_eq!(res(&rt, "json", "doc:missing"), None);
        assert_eq!(res(&rt, "jsonkey", "doc:list[].b").as_deref(), Some("1"));
        assert_eq!(res(&rt, "jsonkey", "doc:list[].b:2").as_deref(), Some("2"));
        assert_eq!(res(&rt, "jsonkey", "doc:list[].a:1:2").as_deref(), Some("-1"));
    }

    #[test]
    fn tally_source() {
        let mut rt = rt();
        rt.tally.record(false);
        assert_eq!(res(&rt, "tally", "failed").as_deref(), Some("1"));
        assert_eq!(res(&rt, "tally", "total").as_deref(), Some("1"));
        assert_eq!(res(&rt, "tally", "bogus"), None);
    }
}
