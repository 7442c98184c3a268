//! Placeholder expansion.
//!
//! Replaces every `${source:argument}` in a token before the verb runs:
//!
//! | Text                    | Result                                           |
//! |-------------------------|--------------------------------------------------|
//! | `${get:x}`              | value of variable `x` (empty if unset)           |
//! | `${arg:1}` / `${arg:#}` | first user argument / number of user arguments   |
//! | `${A:${B:k}}`           | `${B:k}` is resolved first, then fed to `A`      |
//! | `pre${get:x}post`       | placeholders may sit inside a larger token       |
//! | `${get:x`               | unterminated: left as written                    |
//!
//! Inner placeholders are expanded before the outer source is dispatched, and
//! a resolved value is itself rescanned until no top-level placeholder
//! remains.  Both kinds of recursion are bounded.

/// Nested `${…}` levels resolved before giving up.
pub const MAX_EXPANSION_DEPTH: usize = 32;

/// Placeholder substitutions allowed in one token at one level.
pub const MAX_SUBSTITUTIONS: usize = 1024;

/// What the expander needs from its host.
pub trait ExpandContext {
    /// Resolve `source` with `arg`; `None` when not resolvable.
    fn resolve(&mut self, source: &str, arg: &str) -> Option<String>;

    /// Report a non-fatal problem.
    fn diagnostic(&mut self, msg: String);
}

/// Expand every token in place.
pub fn expand_tokens(tokens: &mut [String], ctx: &mut dyn ExpandContext) {
    for tok in tokens.iter_mut() {
        if tok.contains("${") {
            *tok = expand_token(tok, ctx);
        }
    }
}

/// Expand all top-level placeholders in `src`.
pub fn expand_token(src: &str, ctx: &mut dyn ExpandContext) -> String {
    expand_at(src, ctx, 0)
}

fn expand_at(src: &str, ctx: &mut dyn ExpandContext, depth: usize) -> String {
    if depth >= MAX_EXPANSION_DEPTH {
        ctx.diagnostic(format!("placeholder nesting deeper than {MAX_EXPANSION_DEPTH}: {src}"));
        return src.to_owned();
    }

    let mut out = src.to_owned();
    let mut pos = 0;
    let mut budget = MAX_SUBSTITUTIONS;

    while let Some(rel) = out[pos..].find("${") {
        let start = pos + rel;
        let Some(end) = find_closer(&out, start + 2) else {
            // Unterminated: keep it verbatim and look further on.
            pos = start + 2;
            continue;
        };
        if budget == 0 {
            ctx.diagnostic(format!("too many substitutions in: {src}"));
            break;
        }
        budget -= 1;

        let inner = expand_at(&out[start + 2..end], ctx, depth + 1);
        let (source, arg) = inner.split_once(':').unwrap_or((inner.as_str(), ""));
        let value = ctx.resolve(source, arg).unwrap_or_default();
        tracing::trace!(source, arg, value = %value, "placeholder resolved");

        out.replace_range(start..=end, &value);
        pos = start;
    }
    out
}

/// Byte index of the `}` closing a placeholder whose body starts at `from`.
///
/// Nested `${` raise the depth; every `}` lowers it.
fn find_closer(s: &str, from: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 1usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
