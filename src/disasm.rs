use bitvec::prelude::*;

use crate::encoding::{CommandLayout, Execution, Fields, Operand};

/// Binary rendering of `word`, MSB first, with `_` between fields.
pub fn fmt_bits(word: u16, widths: &[u32]) -> String {
    let bits = word.view_bits::<Msb0>();
    let mut out = String::from("0b");
    let mut boundary = widths.iter().scan(0u32, |acc, w| {
        *acc += w;
        Some(*acc)
    });
    let mut next = boundary.next();
    for (i, bit) in bits.iter().by_vals().enumerate() {
        if next == Some(i as u32) {
            out.push('_');
            next = boundary.next();
        }
        out.push(if bit { '1' } else { '0' });
    }
    out
}

fn operand(op: Operand) -> String {
    if op.options == 0 {
        format!("{}", op.port)
    } else {
        format!("{} {:#x}", op.port, op.options)
    }
}

/// Source-like text for decoded fields, using numbers for every name.
/// Feeding the text back to the assembler reproduces the word.
pub fn fmt_fields(fields: &Fields) -> String {
    match fields {
        Fields::Port(p) => {
            let op = match p.execution {
                Execution::Tested => "=",
                Execution::Unconditional => "=?",
            };
            format!("{} {op} {}", operand(p.dest), operand(p.source))
        }
        Fields::Immediate(i) => format!("{} =# {:#04x}", operand(i.dest), i.value),
    }
}

pub fn fmt_word(layout: &dyn CommandLayout, word: u16) -> String {
    fmt_fields(&layout.decode(word))
}
