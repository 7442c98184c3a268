//! Command-line tokenizer.
//!
//! Splits one line of script text into an ordered token list.  Element 0 is
//! the verb.  The result always has at least one element; comment and label
//! lines produce a single empty token.
//!
//! | Input                      | Tokens                                   |
//! |----------------------------|------------------------------------------|
//! | `call foo 'has space' bar` | `call`, `foo`, `has space`, `bar`        |
//! | `echo "it's"`              | `echo`, `it's`                           |
//! | `set x a'b c'd`            | `set`, `x`, `ab cd`                      |
//! | `echo 'a\' b`              | `echo`, `a`, `b`                         |
//! | `echo hi ; trailing`       | `echo`, `hi`                             |
//! | `; comment` / `:label`     | `""`                                     |

/// Tokenize one line of script text.
pub fn tokenize(line: &str) -> Vec<String> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    if trimmed.starts_with(';') || trimmed.starts_with(':') {
        return vec![String::new()];
    }

    let mut tokens: Vec<String> = Vec::new();
    let mut cur = String::new();
    // A token has started even if empty (`''` yields an empty token).
    let mut started = false;
    let mut quote: Option<char> = None;
    let mut chars = trimmed.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            match ch {
                // `\q` closes the span like a bare `q`.
                '\\' if chars.peek() == Some(&q) => {
                    chars.next();
                    quote = None;
                }
                c if c == q => quote = None,
                c => cur.push(c),
            }
            continue;
        }

        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                started = true;
            }
            '\\' => match chars.peek().copied() {
                Some(c @ ('\'' | '"' | ';' | '\\')) => {
                    chars.next();
                    cur.push(c);
                    started = true;
                }
                _ => {
                    cur.push('\\');
                    started = true;
                }
            },
            ';' => break,
            ' ' | '\t' => {
                if started {
                    tokens.push(std::mem::take(&mut cur));
                    started = false;
                }
            }
            c => {
                cur.push(c);
                started = true;
            }
        }
    }

    if quote.is_some() {
        tracing::debug!(line, "unterminated quote closed at end of line");
    }
    if started {
        tokens.push(cur);
    }
    if tokens.is_empty() {
        tokens.push(String::new());
    }
    tokens
}

/// Quote a single token so that [`tokenize`] reads it back unchanged.
///
/// Tokens without whitespace, quotes, `;` or backslashes are returned as-is.
/// Everything else becomes adjacent quoted spans, each using whichever quote
/// kind it does not contain, with every backslash written as an unquoted
/// `\\`.  No span ever needs an escaped quote.
pub fn quote_token(token: &str) -> String {
    if token.is_empty() {
        return "''".to_owned();
    }
    let plain = !token.starts_with(':')
        && !token
            .chars()
            .any(|c| matches!(c, ' ' | '\t' | '\'' | '"' | ';' | '\\'));
    if plain {
        return token.to_owned();
    }
    let mut out = String::with_capacity(token.len() + 2);
    let mut open: Option<char> = None;
    for (i, c) in token.char_indices() {
        if c == '\\' {
            if let Some(q) = open.take() {
                out.push(q);
            }
            out.push_str("\\\\");
            continue;
        }
        if open == Some(c) {
            out.push(c);
            open = None;
        }
        if open.is_none() {
            let q = span_quote(&token[i..]);
            out.push(q);
            open = Some(q);
        }
        out.push(c);
    }
    if let Some(q) = open {
        out.push(q);
    }
    out
}

/// The quote kind that can enclose the most of `rest`.
fn span_quote(rest: &str) -> char {
    match (rest.find('\''), rest.find('"')) {
        (None, _) => '\'',
        (_, None) => '"',
        (Some(single), Some(double)) if single > double => '\'',
        _ => '"',
    }
}

/// Re-join a token list into one line, quoting where necessary.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| quote_token(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
