//! Pattern matching for conditions: regex and glob modes.
//!
//! | Mode | Operator | Description |
//! |------|----------|-------------|
//! | [`MatchMode::Regexp`] | `=~` | [`regex`] crate; case-sensitive (a leading `(?i)` makes it insensitive) |
//! | [`MatchMode::Glob`]   | `~`  | `*`, `?`, `[…]`, `[^…]`, `\x`; case-insensitive, whole-string, per character |

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Regexp,
    Glob,
}

/// Error returned when a pattern cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("regex error: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("glob error: {0}")]
    InvalidGlob(String),
}

#[derive(Debug, Clone)]
enum Compiled {
    Regex(Regex),
    Glob(Vec<GlobTok>),
}

/// A compiled pattern ready for matching.
#[derive(Debug, Clone)]
pub struct Pattern {
    src: String,
    compiled: Compiled,
}

impl Pattern {
    pub fn new(src: &str, mode: MatchMode) -> Result<Self, PatternError> {
        let compiled = match mode {
            MatchMode::Regexp => Compiled::Regex(compile_regex(src)?),
            MatchMode::Glob => Compiled::Glob(compile_glob(src).map_err(PatternError::InvalidGlob)?),
        };
        Ok(Self { src: src.to_owned(), compiled })
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn mode(&self) -> MatchMode {
        match self.compiled {
            Compiled::Regex(_) => MatchMode::Regexp,
            Compiled::Glob(_) => MatchMode::Glob,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.compiled {
            Compiled::Regex(re) => re.is_match(text),
            Compiled::Glob(toks) => glob_tokens_match(toks, text),
        }
    }
}

// ── Regex compilation ─────────────────────────────────────────────────────────

fn compile_regex(pattern: &str) -> Result<Regex, PatternError> {
    Ok(regex::RegexBuilder::new(pattern).dot_matches_new_line(true).build()?)
}

// ── Glob matching ─────────────────────────────────────────────────────────────

/// One glob element.  Literal and class characters are stored case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GlobTok {
    Star,
    Any,
    Lit(char),
    Class { negate: bool, items: Vec<(char, char)> },
}

impl GlobTok {
    /// Whether this single-character element accepts the folded char `c`.
    fn accepts(&self, c: char) -> bool {
        match self {
            GlobTok::Star | GlobTok::Any => true,
            GlobTok::Lit(l) => *l == c,
            GlobTok::Class { negate, items } => {
                items.iter().any(|&(lo, hi)| lo <= c && c <= hi) != *negate
            }
        }
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn compile_glob(pat: &str) -> Result<Vec<GlobTok>, String> {
    let mut toks: Vec<GlobTok> = Vec::new();
    let mut chars = pat.chars().peekable();
    while let Some(c) = chars.next() {
        let tok = match c {
            '*' => {
                if toks.last() == Some(&GlobTok::Star) {
                    continue;
                }
                GlobTok::Star
            }
            '?' => GlobTok::Any,
            '\\' => GlobTok::Lit(fold(chars.next().unwrap_or('\\'))),
            '[' => {
                let negate = chars.next_if_eq(&'^').is_some();
                let mut items = Vec::new();
                loop {
                    let Some(first) = chars.next() else {
                        return Err(format!("unmatched '[' in {pat:?}"));
                    };
                    if first == ']' {
                        break;
                    }
                    let lo = fold(first);
                    let mut ahead = chars.clone();
                    match (ahead.next(), ahead.next()) {
                        (Some('-'), Some(hi)) if hi != ']' => {
                            chars.next();
                            chars.next();
                            items.push((lo, fold(hi)));
                        }
                        _ => items.push((lo, lo)),
                    }
                }
                GlobTok::Class { negate, items }
            }
            lit => GlobTok::Lit(fold(lit)),
        };
        toks.push(tok);
    }
    Ok(toks)
}

/// Case-insensitive whole-string glob match.  A malformed pattern never
/// matches.
pub fn glob_match(pat: &str, text: &str) -> bool {
    compile_glob(pat).is_ok_and(|toks| glob_tokens_match(&toks, text))
}

/// Linear-backtracking match: only the most recent `*` is ever retried.
fn glob_tokens_match(toks: &[GlobTok], text: &str) -> bool {
    let text: Vec<char> = text.chars().map(fold).collect();
    let (mut p, mut t) = (0, 0);
    let mut retry: Option<(usize, usize)> = None;
    while t < text.len() {
        match toks.get(p) {
            Some(GlobTok::Star) => {
                retry = Some((p + 1, t));
                p += 1;
                continue;
            }
            Some(tok) if tok.accepts(text[t]) => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }
        let Some((sp, st)) = retry else {
            return false;
        };
        p = sp;
        t = st + 1;
        retry = Some((sp, st + 1));
    }
    toks[p..].iter().all(|tok| *tok == GlobTok::Star)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
