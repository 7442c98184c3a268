//! `certsh.conf` configuration file parser.
//!
//! | Line | Action |
//! |------|--------|
//! | `log_level = <filter>` | default tracing filter (overridden by `RUST_LOG`) |
//! | `script_dir = <dir>` | where `run` and the command line look for scripts |
//! | `driver = <name>` | name reported by the driver (default `loopback`) |
//! | `echo = on\|off` | print each command before it runs |
//! | `set <name>=<value>` or `set <name> <value>` | preset a global variable |
//! | Lines starting with `;` | comment, ignored |
//!
//! Problems are collected as [`ConfigError`]s; the rest of the file still
//! loads.

use std::path::{Path, PathBuf};

pub use crate::error::ConfigError;
use crate::script::tokenize::tokenize;
use crate::script::vars::VarTable;

/// File name looked up in the working directory and the config directory.
pub const CONFIG_FILE_NAME: &str = "certsh.conf";

// ── Public API ────────────────────────────────────────────────────────────────

/// Parsed settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: Option<String>,
    pub script_dir: Option<PathBuf>,
    pub driver: String,
    pub echo: bool,
    /// Global variables preset by `set` lines.
    pub globals: VarTable,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: None,
            script_dir: None,
            driver: "loopback".to_owned(),
            echo: false,
            globals: VarTable::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.  Returns the config and any per-line errors.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let result = match line.strip_prefix("set") {
                Some(rest) if rest.starts_with(|c: char| c.is_ascii_whitespace()) => {
                    parse_set(&tokenize(rest), &mut config.globals)
                }
                _ => config.apply_setting(line),
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    fn apply_setting(&mut self, line: &str) -> Result<(), String> {
        let Some((key, value)) = line.split_once('=') else {
            return Err(format!("expected 'key = value', got '{line}'"));
        };
        let key = key.trim();
        let value = unquote(value.trim());
        match key {
            "log_level" => self.log_level = Some(value.to_owned()),
            "script_dir" => self.script_dir = Some(PathBuf::from(value)),
            "driver" => {
                if value.is_empty() {
                    return Err("driver: name cannot be empty".into());
                }
                self.driver = value.to_owned();
            }
            "echo" => {
                self.echo =
                    parse_bool(value).ok_or_else(|| format!("echo: not a boolean: '{value}'"))?;
            }
            _ => return Err(format!("unknown setting '{key}'")),
        }
        Ok(())
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Locate the config file: the explicit path, else `./certsh.conf`, else the
/// per-user config directory.  Returns the first path that exists.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    directories::ProjectDirs::from("", "", "certsh")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
}

// ── Value helpers ─────────────────────────────────────────────────────────────

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "on" | "yes" | "true" => Some(true),
        "0" | "off" | "no" | "false" => Some(false),
        _ => None,
    }
}

// ── set ──────────────────────────────────────────────────────────────────────

/// Parse `set <name>=<value>` or `set <name> <value>`.
fn parse_set(tokens: &[String], vars: &mut VarTable) -> Result<(), String> {
    let Some(first) = tokens.first().filter(|t| !t.is_empty()) else {
        return Err("set: requires an argument".into());
    };

    let (name, value) = if let Some((name, value)) = first.split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (first.clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("set: missing value for '{first}'"));
    };

    if name.is_empty() {
        return Err("set: variable name cannot be empty".into());
    }

    vars.set(name, value);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- settings -------------------------------------------------------------

    #[test]
    fn defaults() {
        let cfg = Config::new();
        assert_eq!(cfg.driver, "loopback");
        assert!(!cfg.echo);
        assert!(cfg.log_level.is_none());
    }

    #[test]
    fn key_value_settings() {
        let (cfg, errs) = Config::load_str(
            "log_level = certsh=debug\nscript_dir=/opt/scripts\ndriver = \"bench rig\"\necho = on",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.log_level.as_deref(), Some("certsh=debug"));
        assert_eq!(cfg.script_dir, Some(PathBuf::from("/opt/scripts")));
        assert_eq!(cfg.driver, "bench rig");
        assert!(cfg.echo);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (cfg, errs) = Config::load_str("colour = red\necho = maybe\njust words\ndriver = x");
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].line, 1);
        assert!(errs[0].message.contains("colour"));
        assert_eq!(errs[1].line, 2);
        assert_eq!(errs[2].line, 3);
        assert_eq!(cfg.driver, "x");
    }

    // -- set ------------------------------------------------------------------

    #[test]
    fn set_equals_syntax() {
        let (cfg, errs) = Config::load_str("set board=rev2");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.globals.value("board"), Some("rev2"));
    }

    #[test]
    fn set_space_syntax() {
        let (cfg, errs) = Config::load_str("set timeout 500");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.globals.value("timeout"), Some("500"));
    }

    #[test]
    fn set_value_with_spaces() {
        let (cfg, errs) = Config::load_str("set greeting 'hello world' again");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.globals.value("greeting"), Some("hello world again"));
    }

    #[test]
    fn set_errors() {
        let (_, errs) = Config::load_str("set\nset lonely\nset =x");
        assert_eq!(errs.len(), 3, "{errs:?}");
    }

    // -- comments -------------------------------------------------------------

    #[test]
    fn semicolon_comments_ignored() {
        let (cfg, errs) = Config::load_str(
            ";; This is a comment\n\
             ; Also a comment\n\
             \n\
             set real=yes",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.globals.value("real"), Some("yes"));
        assert_eq!(cfg.globals.len(), 1);
    }

    #[test]
    fn settings_named_like_set_are_not_set_lines() {
        let (_, errs) = Config::load_str("settle = 1");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("settle"));
    }

    #[test]
    fn explicit_config_path_wins() {
        let p = Path::new("/nonexistent/custom.conf");
        assert_eq!(find_config(Some(p)), Some(p.to_path_buf()));
    }
}
