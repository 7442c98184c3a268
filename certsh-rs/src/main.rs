use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use certsh::cli::{self, ConfigFile};
use certsh::config::{self, Config, ConfigError};
use certsh::driver::LoopbackDriver;
use certsh::events::Shared;
use certsh::script::runtime::file_loader;
use certsh::script::{Console, Interpreter};
use tracing_subscriber::EnvFilter;

/// Prints to stdout, diagnostics to stderr.
struct StdConsole;

impl Console for StdConsole {
    fn print(&mut self, line: &str) {
        println!("{line}");
    }

    fn diagnostic(&mut self, line: &str) {
        eprintln!("certsh: {line}");
    }
}

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("certsh: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    // ── Configuration and logging ─────────────────────────────────────────────
    let (config, config_errors) = load_config(&args.config);
    init_tracing(args.debug, config.log_level.as_deref());
    for e in &config_errors {
        tracing::warn!(error = %e, "config");
        eprintln!("certsh: config {e}");
    }

    // ── Background runtime for the driver ─────────────────────────────────────
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("certsh-driver")
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("certsh: cannot start driver runtime: {e}");
            std::process::exit(1);
        }
    };

    // ── Interpreter ───────────────────────────────────────────────────────────
    let shared = Arc::new(Shared::new());
    for (name, entry) in config.globals.iter() {
        shared.set_global(name.clone(), entry.value.clone());
    }

    let mut program_args = vec![args.script.clone().unwrap_or_else(|| "certsh".to_owned())];
    program_args.extend(args.script_args.iter().cloned());

    let mut interp = Interpreter::with_shared(Arc::clone(&shared), program_args);
    interp.set_console(Box::new(StdConsole));
    interp.set_loader(file_loader(config.script_dir.clone()));
    interp.rt.echo = config.echo;
    Arc::new(LoopbackDriver::new(config.driver.clone(), runtime.handle().clone(), shared))
        .install(&mut interp);

    // ── Run ───────────────────────────────────────────────────────────────────
    let mut done = false;
    if let Some(cmd) = &args.command {
        done = interp.execute_line(cmd);
    }
    if !done {
        match &args.script {
            Some(name) => {
                if let Err(e) = interp.run_named(name, args.script_args.clone()) {
                    eprintln!("certsh: {e}");
                    std::process::exit(1);
                }
            }
            None if args.command.is_none() => interactive(&mut interp, args.quiet),
            None => {}
        }
    }

    let tally = interp.rt.tally;
    if tally.total() > 0 && !args.quiet {
        eprintln!("certsh: {} passed, {} failed", tally.passed, tally.failed);
    }
    let code = interp.rt.exit_code.unwrap_or(i32::from(tally.failed > 0));

    drop(interp);
    runtime.shutdown_timeout(Duration::from_millis(100));
    std::process::exit(code);
}

fn load_config(choice: &ConfigFile) -> (Config, Vec<ConfigError>) {
    let path = match choice {
        ConfigFile::Skip => return (Config::new(), Vec::new()),
        ConfigFile::Explicit(p) => config::find_config(Some(p.as_path())),
        ConfigFile::Search => config::find_config(None),
    };
    let Some(path) = path else {
        return (Config::new(), Vec::new());
    };
    match Config::load_file(&path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("certsh: warning: {}: {e}", path.display());
            (Config::new(), Vec::new())
        }
    }
}

/// `-d` wins, then `RUST_LOG`, then the config's `log_level`.
fn init_tracing(debug: bool, configured: Option<&str>) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or("error")))
            .unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn interactive(interp: &mut Interpreter, quiet: bool) {
    if !quiet {
        println!("certsh {} - type 'help' for verbs, 'exit' to quit", env!("CARGO_PKG_VERSION"));
    }
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if !quiet {
            print!("certsh> ");
            let _ = io::stdout().flush();
        }
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        if interp.execute_line(&line) {
            break;
        }
    }
}
