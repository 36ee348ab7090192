//! Operand values: symbol lookup first, numeric literal second.

use crate::intern::{Interner, Token};
use crate::symbols::SymbolTable;

/// Returned for operands that cannot be resolved.
pub const INVALID: i32 = -1;

/// Parses a numeric literal: `0x` hex, `0b` binary with `_` separators, or
/// decimal with an optional sign. The whole text must be consumed.
pub fn parse_literal(text: &str) -> Option<i32> {
    let value = if let Some(hex) = text.strip_prefix("0x") {
        digits(hex, 16, false)?
    } else if let Some(bin) = text.strip_prefix("0b") {
        digits(bin, 2, true)?
    } else {
        let (neg, rest) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let mag = digits(rest, 10, false)?;
        if neg {
            -mag
        } else {
            mag
        }
    };
    i32::try_from(value).ok()
}

fn digits(text: &str, radix: u32, separators: bool) -> Option<i64> {
    let mut value: i64 = 0;
    let mut seen = false;
    for c in text.chars() {
        if separators && c == '_' {
            continue;
        }
        let d = c.to_digit(radix)?;
        value = value.checked_mul(radix as i64)?.checked_add(d as i64)?;
        seen = true;
    }
    seen.then_some(value)
}

/// Resolves `tok` against `table`, falling back to a literal.
pub fn resolve(table: &SymbolTable, interner: &Interner, tok: Token) -> Option<i32> {
    table
        .lookup(tok)
        .or_else(|| parse_literal(interner.resolve(tok)))
}
