//! Runs the `certsh` binary end to end.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_certsh"))
}

fn write_script(dir: &Path, name: &str, src: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, src).unwrap();
    path
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout).lines().map(str::to_owned).collect()
}

fn run(args: &[&str], cwd: &Path) -> Output {
    Command::new(binary())
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("cannot run {}: {e}", binary().display()))
}

// ── Scripts ───────────────────────────────────────────────────────────────────

#[test]
fn runs_script_with_arguments() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "hello.cs",
        "; greet\necho hello ${arg:1}\ncall twice ${arg:2}\necho ${ret:}\nexit\n:twice\nreturn ${arg:1}${arg:1}\n",
    );
    let out = run(&["-qf", "hello.cs", "world", "ab"], dir.path());
    assert_eq!(stdout_lines(&out), ["hello world", "abab"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn exit_code_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "bye.cs", "echo leaving\nexit 7\necho unreachable\n");
    let out = run(&["-qf", "bye.cs"], dir.path());
    assert_eq!(stdout_lines(&out), ["leaving"]);
    assert_eq!(out.status.code(), Some(7));
}

#[test]
fn failed_expectation_sets_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "check.cs",
        "setlocal v 3\nexpect ${get:v} == 3 three\nexpect ${get:v} > 5 big\n",
    );
    let out = run(&["-qf", "check.cs"], dir.path());
    assert_eq!(stdout_lines(&out), ["PASS: three", "FAIL: big (got '3')"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&["-qf", "absent.cs"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("absent.cs"));
}

#[test]
fn bad_option_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&["-z"], dir.path());
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage:"));
}

// ── Commands and config ───────────────────────────────────────────────────────

#[test]
fn command_flag_runs_before_exit() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&["-qf", "-c", "echo ${upper:cmd}"], dir.path());
    assert_eq!(stdout_lines(&out), ["CMD"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn config_presets_globals_and_script_dir() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    std::fs::create_dir(&scripts).unwrap();
    write_script(&scripts, "show.cs", "echo ${get:greeting} from ${driver:}\n");
    let conf = write_script(
        dir.path(),
        "test.conf",
        &format!("script_dir = {}\ndriver = bench\nset greeting 'hi there'\n", scripts.display()),
    );

    let flag = format!("-f{}", conf.display());
    let out = run(&["-q", &flag, "show.cs"], dir.path());
    assert_eq!(stdout_lines(&out), ["hi there from bench"]);
}

#[test]
fn local_config_is_found_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "certsh.conf", "set who local\n");
    let out = run(&["-q", "-c", "echo ${get:who}"], dir.path());
    assert_eq!(stdout_lines(&out), ["local"]);
}

// ── Interactive ───────────────────────────────────────────────────────────────

#[test]
fn reads_commands_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(binary())
        .args(["-qf"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"setglobal n 4\necho n=${get:n}\npost READY\nwait 1000\necho ${ret:}\nexit 3\necho never\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert_eq!(stdout_lines(&out), ["n=4", "READY"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn notify_from_driver_wakes_script() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "events.cs",
        "notify DATA_READY 30\nwait 5000\nexpect ${ret:} == DATA_READY event\n",
    );
    let out = run(&["-qf", "events.cs"], dir.path());
    assert_eq!(stdout_lines(&out), ["PASS: event"]);
    assert_eq!(out.status.code(), Some(0));
}
