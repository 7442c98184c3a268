//! Core verbs.
//!
//! Every handler receives the expanded token list (`tokens[0]` is the verb)
//! and reports through the [`CommandContext`]: `status`/`ret` are written back
//! to the frame and `flow` moves execution.  Bad usage is a diagnostic plus
//! status 1, never a hard error.

use std::time::Duration;

use crate::events::{WaitMode, WaitOutcome};
use crate::json::{Document, Mode, Overrides};

use super::cond::{self, parse_int};
use super::dispatch::{CommandContext, Flow};
use super::interp::Interpreter;
use super::runtime::Runtime;
use super::vars::Scope;

/// Install the core verbs.
pub fn register_core(interp: &mut Interpreter) {
    // ── Output ───────────────────────────────────────────────────────────────
    interp.register(&["echo"], |rt, t, _| {
        rt.print(t[1..].join(" "));
        false
    });

    // ── Variables ────────────────────────────────────────────────────────────
    interp.register(&["set"], |rt, t, ctx| assign(rt, t, ctx, Scope::Auto));
    interp.register(&["setlocal"], |rt, t, ctx| assign(rt, t, ctx, Scope::Local));
    interp.register(&["setglobal"], |rt, t, ctx| assign(rt, t, ctx, Scope::Global));
    interp.register(&["unset"], |rt, t, ctx| {
        let Some(name) = t.get(1) else {
            ctx.fail(rt, "usage: unset name");
            return false;
        };
        ctx.status = i64::from(!rt.unset_var(name));
        false
    });
    interp.register(&["setsize"], |rt, t, ctx| {
        let (Some(name), Some(n)) = (t.get(1), t.get(2).and_then(|s| parse_int(s))) else {
            ctx.fail(rt, "usage: setsize name bytes");
            return false;
        };
        let Ok(n) = usize::try_from(n) else {
            ctx.fail(rt, format!("setsize: negative size {n}"));
            return false;
        };
        if rt.set_byte_len(name, n) {
            ctx.status = 0;
        } else {
            ctx.fail(rt, format!("setsize: no variable '{name}'"));
        }
        false
    });
    interp.register(&["vars"], |rt, _, _| {
        let locals: Vec<String> = rt
            .top()
            .locals
            .iter()
            .map(|(k, e)| format!("local {k}={}", e.value))
            .collect();
        let globals = rt.shared.globals_snapshot();
        for line in locals {
            rt.print(line);
        }
        for (k, e) in globals.iter() {
            rt.print(format!("global {k}={}", e.value));
        }
        false
    });

    // ── Control flow ─────────────────────────────────────────────────────────
    interp.register(&["goto"], |rt, t, ctx| {
        match t.get(1) {
            Some(label) => ctx.flow = Flow::Goto(label.clone()),
            None => ctx.fail(rt, "usage: goto label"),
        }
        false
    });
    interp.register(&["call"], |rt, t, ctx| {
        match t.get(1) {
            Some(label) => ctx.flow = Flow::Call { label: label.clone(), args: t[2..].to_vec() },
            None => ctx.fail(rt, "usage: call label [args...]"),
        }
        false
    });
    interp.register(&["run"], |rt, t, ctx| {
        match t.get(1) {
            Some(script) => ctx.flow = Flow::Run { script: script.clone(), args: t[2..].to_vec() },
            None => ctx.fail(rt, "usage: run script [args...]"),
        }
        false
    });
    interp.register(&["return"], |_, t, ctx| {
        ctx.flow = Flow::Return(t[1..].join(" "));
        false
    });
    interp.register(&["if"], builtin_if);
    interp.register(&["exit", "quit"], |rt, t, ctx| {
        let code = match t.get(1) {
            None => 0,
            Some(s) => match parse_int(s).and_then(|n| i32::try_from(n).ok()) {
                Some(n) => n,
                None => {
                    ctx.fail(rt, format!("exit: bad code '{s}'"));
                    return false;
                }
            },
        };
        rt.exit_code = Some(code);
        true
    });
    interp.register(&["status"], |rt, t, ctx| {
        match t.get(1).and_then(|s| parse_int(s)) {
            Some(n) => ctx.status = n,
            None => ctx.fail(rt, "usage: status code"),
        }
        false
    });
    interp.register(&["expect"], builtin_expect);

    // ── Events ───────────────────────────────────────────────────────────────
    interp.register(&["wait"], |rt, t, ctx| {
        let Some(ms) = t.get(1).and_then(|s| millis(s)) else {
            ctx.fail(rt, "usage: wait timeout_ms [peek]");
            return false;
        };
        let mode = match t.get(2).map(|s| s.to_ascii_lowercase()) {
            Some(m) if m == "peek" => WaitMode::Peek,
            _ => WaitMode::Take,
        };
        let outcome = rt.shared.wait(ms, mode);
        ctx.ret = outcome.to_ret();
        ctx.status = match outcome {
            WaitOutcome::Events(_) => 0,
            WaitOutcome::Timeout => 1,
        };
        false
    });
    interp.register(&["sleep"], |rt, t, ctx| {
        match t.get(1).and_then(|s| millis(s)) {
            Some(d) => std::thread::sleep(d),
            None => ctx.fail(rt, "usage: sleep ms"),
        }
        false
    });
    interp.register(&["reset"], |rt, _, _| {
        rt.shared.reset();
        false
    });

    // ── JSON ─────────────────────────────────────────────────────────────────
    interp.register(&["jsondump"], builtin_jsondump);
    interp.register(&["jsonxml"], builtin_jsonxml);

    interp.register(&["help"], |rt, _, _| {
        let names = rt.verb_names.join(" ");
        rt.print(names);
        false
    });
}

// ── Handlers ──────────────────────────────────────────────────────────────────

fn assign(rt: &mut Runtime, t: &[String], ctx: &mut CommandContext, scope: Scope) -> bool {
    let Some(name) = t.get(1) else {
        ctx.fail(rt, format!("usage: {} name [value...]", t[0]));
        return false;
    };
    rt.set_var(scope, name, t[2..].join(" "));
    false
}

/// `if lhs [op rhs] goto label` / `if lhs [op rhs] call label args...`
fn builtin_if(rt: &mut Runtime, t: &[String], ctx: &mut CommandContext) -> bool {
    let Some(at) = t
        .iter()
        .skip(1)
        .position(|s| s.eq_ignore_ascii_case("goto") || s.eq_ignore_ascii_case("call"))
        .map(|i| i + 1)
    else {
        ctx.fail(rt, "if: expected 'goto' or 'call'");
        return false;
    };
    let Some(label) = t.get(at + 1) else {
        ctx.fail(rt, format!("if: missing label after '{}'", t[at]));
        return false;
    };
    match cond::eval(&t[1..at]) {
        Ok(true) => {
            ctx.flow = if t[at].eq_ignore_ascii_case("goto") {
                Flow::Goto(label.clone())
            } else {
                Flow::Call { label: label.clone(), args: t[at + 2..].to_vec() }
            };
        }
        Ok(false) => {}
        Err(e) => ctx.fail(rt, format!("if: {e}")),
    }
    false
}

/// `expect lhs op rhs [message...]`
fn builtin_expect(rt: &mut Runtime, t: &[String], ctx: &mut CommandContext) -> bool {
    if t.len() < 4 {
        ctx.fail(rt, "usage: expect lhs op rhs [message...]");
        return false;
    }
    let condition = &t[1..4];
    let ok = match cond::eval(condition) {
        Ok(ok) => ok,
        Err(e) => {
            ctx.fail(rt, format!("expect: {e}"));
            return false;
        }
    };
    rt.tally.record(ok);
    let message = if t.len() > 4 { t[4..].join(" ") } else { condition.join(" ") };
    if ok {
        rt.print(format!("PASS: {message}"));
        ctx.status = 0;
    } else {
        rt.print(format!("FAIL: {message} (got '{}')", t[1]));
        ctx.status = 1;
    }
    false
}

/// `jsondump out src [path=literal...]`
fn builtin_jsondump(rt: &mut Runtime, t: &[String], ctx: &mut CommandContext) -> bool {
    let (Some(out), Some(src)) = (t.get(1), t.get(2)) else {
        ctx.fail(rt, "usage: jsondump out src [path=literal...]");
        return false;
    };
    let mut overrides = Overrides::new();
    for spec in &t[3..] {
        match spec.split_once('=') {
            Some((path, literal)) => overrides.set(path, literal),
            None => {
                ctx.fail(rt, format!("jsondump: bad override '{spec}'"));
                return false;
            }
        }
    }
    let Some(text) = json_source(rt, src, ctx) else {
        return false;
    };
    let dumped = match Document::parse(&text, Mode::Relaxed) {
        Ok(doc) => doc.dump(&overrides),
        Err(e) => {
            ctx.fail(rt, format!("jsondump: {src}: {e}"));
            return false;
        }
    };
    rt.set_var(Scope::Auto, out, dumped);
    ctx.status = 0;
    false
}

/// `jsonxml out src [roottag]`
fn builtin_jsonxml(rt: &mut Runtime, t: &[String], ctx: &mut CommandContext) -> bool {
    let (Some(out), Some(src)) = (t.get(1), t.get(2)) else {
        ctx.fail(rt, "usage: jsonxml out src [roottag]");
        return false;
    };
    let Some(text) = json_source(rt, src, ctx) else {
        return false;
    };
    let xml = match Document::parse(&text, Mode::Relaxed) {
        Ok(doc) => doc.to_xml(t.get(3).map(String::as_str)),
        Err(e) => {
            ctx.fail(rt, format!("jsonxml: {src}: {e}"));
            return false;
        }
    };
    rt.set_var(Scope::Auto, out, xml);
    ctx.status = 0;
    false
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn json_source(rt: &mut Runtime, name: &str, ctx: &mut CommandContext) -> Option<String> {
    let text = rt.var(name);
    if text.is_none() {
        ctx.fail(rt, format!("no variable '{name}'"));
    }
    text
}

fn millis(s: &str) -> Option<Duration> {
    let n = u64::try_from(parse_int(s)?).ok()?;
    Some(Duration::from_millis(n))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
