//! Condition evaluation for `if` and `expect`.
//!
//! A condition is either a single operand (true when non-empty and not `0`)
//! or `lhs op rhs`:
//!
//! | Operator | Comparison |
//! |----------|------------|
//! | `==` `!=` `<` `>` `<=` `>=` | numeric when both sides are integers (decimal or `0x` hex), else string |
//! | `=~` | `rhs` is a case-sensitive regular expression searched in `lhs` (`(?i)` opts out) |
//! | `~`  | `rhs` is a case-insensitive glob matched against all of `lhs` |

use std::cmp::Ordering;

use crate::pattern::{MatchMode, Pattern};

/// Parsed comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Regex,
    Glob,
}

impl Op {
    pub fn parse(s: &str) -> Option<Op> {
        Some(match s {
            "==" => Op::Eq,
            "!=" => Op::Ne,
            "<" => Op::Lt,
            ">" => Op::Gt,
            "<=" => Op::Le,
            ">=" => Op::Ge,
            "=~" => Op::Regex,
            "~" => Op::Glob,
            _ => return None,
        })
    }
}

/// Parse an integer the way scripts write them: decimal or `0x` hex, with an
/// optional sign.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    // At most one sign.
    let v = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if digits.bytes().all(|b| b.is_ascii_digit()) => digits.parse::<i64>().ok()?,
        None => return None,
    };
    Some(if neg { -v } else { v })
}

fn truthy(s: &str) -> bool {
    !s.is_empty() && s != "0"
}

/// Compare two operands with `op`.
pub fn compare(lhs: &str, op: Op, rhs: &str) -> Result<bool, String> {
    let ord = || match (parse_int(lhs), parse_int(rhs)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => lhs.cmp(rhs),
    };
    Ok(match op {
        Op::Eq => ord() == Ordering::Equal,
        Op::Ne => ord() != Ordering::Equal,
        Op::Lt => ord() == Ordering::Less,
        Op::Gt => ord() == Ordering::Greater,
        Op::Le => ord() != Ordering::Greater,
        Op::Ge => ord() != Ordering::Less,
        Op::Regex => Pattern::new(rhs, MatchMode::Regexp)
            .map_err(|e| e.to_string())?
            .matches(lhs),
        Op::Glob => Pattern::new(rhs, MatchMode::Glob)
            .map_err(|e| e.to_string())?
            .matches(lhs),
    })
}

/// Evaluate a condition of one operand or `lhs op rhs`.
pub fn eval(operands: &[String]) -> Result<bool, String> {
    match operands {
        [single] => Ok(truthy(single)),
        [lhs, op, rhs] => {
            let op = Op::parse(op).ok_or_else(|| format!("unknown operator '{op}'"))?;
            compare(lhs, op, rhs)
        }
        [] => Err("missing condition".to_owned()),
        _ => Err(format!("malformed condition: {}", operands.join(" "))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
