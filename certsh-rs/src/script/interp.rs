//! Script interpreter.
//!
//! The [`Interpreter`] owns the [`Runtime`] and the verb [`Dispatcher`].  Each
//! command line is tokenized, expanded and dispatched; the handler's
//! [`Flow`] then moves the current frame's line pointer or pushes and pops
//! frames.

use std::sync::Arc;

use crate::error::ScriptError;
use crate::events::Shared;

use super::builtins::register_core;
use super::dispatch::{CommandContext, Dispatcher, Flow};
use super::expand::expand_tokens;
use super::frame::{Frame, Script};
use super::runtime::{Console, Runtime, ScriptLoader};
use super::tokenize::tokenize;

// ── Interpreter ───────────────────────────────────────────────────────────────

pub struct Interpreter {
    pub rt: Runtime,
    dispatcher: Dispatcher,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_shared(Arc::new(Shared::new()), vec!["certsh".to_owned()])
    }

    /// An interpreter over existing shared state.  `program_args[0]` names
    /// the program; the rest become the base frame's user arguments.
    pub fn with_shared(shared: Arc<Shared>, program_args: Vec<String>) -> Self {
        let mut interp = Interpreter {
            rt: Runtime::new(shared, program_args),
            dispatcher: Dispatcher::new(),
        };
        register_core(&mut interp);
        interp
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.rt.shared
    }

    // ── Host registration ─────────────────────────────────────────────────────

    pub fn register<F>(&mut self, names: &[&str], handler: F)
    where
        F: Fn(&mut Runtime, &[String], &mut CommandContext) -> bool + Send + Sync + 'static,
    {
        self.dispatcher.register(names, handler);
        self.rt.verb_names.extend(names.iter().map(|n| n.to_ascii_lowercase()));
    }

    /// Register ahead of the built-ins, overriding verbs of the same name.
    pub fn register_front<F>(&mut self, names: &[&str], handler: F)
    where
        F: Fn(&mut Runtime, &[String], &mut CommandContext) -> bool + Send + Sync + 'static,
    {
        self.dispatcher.register_front(names, handler);
        for n in names {
            let n = n.to_ascii_lowercase();
            if !self.rt.verb_names.contains(&n) {
                self.rt.verb_names.push(n);
            }
        }
    }

    pub fn register_resolver<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.rt.resolvers.register(name, f);
    }

    pub fn set_loader(&mut self, loader: ScriptLoader) {
        self.rt.loader = Some(loader);
    }

    pub fn set_console(&mut self, console: Box<dyn Console>) {
        self.rt.console = Some(console);
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Execute one command line in the current frame, then run any frames it
    /// pushed to completion.  Returns `true` when the program should exit.
    pub fn execute_line(&mut self, line: &str) -> bool {
        let floor = self.rt.stack.depth();
        if self.step(line) {
            self.rt.stack.truncate(floor);
            return true;
        }
        self.run_until(floor)
    }

    /// Run `script` in a new frame until it returns.
    pub fn run_script(&mut self, script: Script, args: Vec<String>) -> bool {
        let floor = self.rt.stack.depth();
        let mut frame_args = Vec::with_capacity(args.len() + 1);
        frame_args.push(script.name.clone());
        frame_args.extend(args);
        self.rt.stack.push(Frame::for_script(Arc::new(script), 0, frame_args));
        self.run_until(floor)
    }

    pub fn run_source(&mut self, name: &str, src: &str, args: Vec<String>) -> bool {
        self.run_script(Script::from_source(name, src), args)
    }

    /// Load `name` through the script loader and run it.
    pub fn run_named(&mut self, name: &str, args: Vec<String>) -> Result<bool, ScriptError> {
        let loader = self.rt.loader.clone().ok_or(ScriptError::NoLoader)?;
        let script = loader(name)?;
        Ok(self.run_script(script, args))
    }

    /// Execute lines until the stack drops back to `floor` frames.
    fn run_until(&mut self, floor: usize) -> bool {
        while self.rt.stack.depth() > floor {
            let top = self.rt.stack.top();
            let Some(script) = top.script.clone() else {
                break;
            };
            let Some(line) = script.lines.get(top.line) else {
                // Off the end: implicit return.
                self.apply_flow(Flow::Return(String::new()));
                continue;
            };
            if self.step(line) {
                self.rt.stack.truncate(floor);
                return true;
            }
        }
        false
    }

    /// Tokenize, expand and dispatch one line, then apply its flow.
    fn step(&mut self, line: &str) -> bool {
        let mut tokens = tokenize(line);
        if tokens[0].is_empty() {
            self.apply_flow(Flow::Next);
            return false;
        }
        expand_tokens(&mut tokens, &mut self.rt);
        if self.rt.echo {
            self.rt.print(format!("+ {}", tokens.join(" ")));
        }

        let top = self.rt.stack.top();
        let mut ctx = CommandContext {
            status: top.status,
            ret: top.ret.clone(),
            flow: Flow::Next,
            line: top.script.as_ref().map(|_| top.line + 1),
            source: top.source_name().map(str::to_owned),
        };

        let terminate = match self.dispatcher.dispatch(&mut self.rt, &tokens, &mut ctx) {
            Some(t) => t,
            None => {
                let msg = ctx.located(format!("unrecognized command '{}'", tokens[0]));
                self.rt.diagnostic(msg);
                false
            }
        };

        let top = self.rt.stack.top_mut();
        top.status = ctx.status;
        top.ret = ctx.ret;
        if terminate {
            return true;
        }
        self.apply_flow(ctx.flow);
        false
    }

    fn advance(&mut self) {
        let top = self.rt.stack.top_mut();
        if top.script.is_some() {
            top.line += 1;
        }
    }

    fn apply_flow(&mut self, flow: Flow) {
        match flow {
            Flow::Next => self.advance(),
            Flow::Goto(label) => match self.label_target(&label, "goto") {
                Some((_, line)) => self.rt.stack.top_mut().line = line,
                None => self.advance(),
            },
            Flow::Call { label, args } => match self.label_target(&label, "call") {
                Some((script, line)) => {
                    let mut frame_args = vec![label];
                    frame_args.extend(args);
                    self.rt.stack.push(Frame::for_script(script, line, frame_args));
                }
                None => self.advance(),
            },
            Flow::Run { script, args } => match self.load(&script) {
                Some(loaded) => {
                    let mut frame_args = vec![script];
                    frame_args.extend(args);
                    self.rt.stack.push(Frame::for_script(Arc::new(loaded), 0, frame_args));
                }
                None => self.advance(),
            },
            Flow::Return(value) => {
                let Some(callee) = self.rt.stack.pop() else {
                    self.rt.diagnostic("return outside of a call");
                    return;
                };
                let caller = self.rt.stack.top_mut();
                caller.ret = value;
                caller.status = callee.status;
                self.advance();
            }
        }
    }

    /// Script and line just after `:label` in the top frame's script.
    fn label_target(&mut self, label: &str, verb: &str) -> Option<(Arc<Script>, usize)> {
        let top = self.rt.stack.top();
        let Some(script) = top.script.clone() else {
            self.rt.diagnostic(format!("{verb} {label}: not inside a script"));
            return None;
        };
        match script.find_label(label) {
            Some(i) => Some((script, i + 1)),
            None => {
                let at = top.line + 1;
                self.rt.diagnostic(format!("{}:{at}: label '{label}' not found", script.name));
                None
            }
        }
    }

    fn load(&mut self, name: &str) -> Option<Script> {
        let Some(loader) = self.rt.loader.clone() else {
            self.rt.diagnostic(format!("run {name}: {}", ScriptError::NoLoader));
            return None;
        };
        match loader(name) {
            Ok(script) => Some(script),
            Err(e) => {
                self.rt.diagnostic(format!("run {name}: {e}"));
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
