use crate::encoding::{
    mask, CommandLayout, Execution, Fields, ImmediateCommand, Kind, Operand, PortCommand,
};

/// Narrower operand model used by earlier control units.
///
/// ```text
///   iDDDDdddbSSsssss   (port, i = 0)
///   iDDDDdddvvvvvvvv   (immediate, i = 1)
/// ```
///
/// Ports do not spill into option bits here; every field is masked to its own
/// width. A resolved label lands in the low nibble of the value.
pub struct NarrowLayout;

pub const IMMEDIATE_BIT: u32 = 15;
pub const DEST_OPT_SHIFT: u32 = 11;
pub const DEST_OPT_BITS: u32 = 4;
pub const DEST_PORT_SHIFT: u32 = 8;
pub const DEST_PORT_BITS: u32 = 3;
pub const BRANCH_SHIFT: u32 = 7;
pub const SRC_OPT_SHIFT: u32 = 5;
pub const SRC_OPT_BITS: u32 = 2;
pub const SRC_PORT_BITS: u32 = 5;
pub const VALUE_BITS: u32 = 8;
pub const LABEL_BITS: u32 = 4;

fn dest_bits(op: Operand) -> u16 {
    ((op.options & mask(DEST_OPT_BITS)) << DEST_OPT_SHIFT)
        | ((op.port & mask(DEST_PORT_BITS)) << DEST_PORT_SHIFT)
}

pub fn is_immediate(word: u16) -> bool {
    (word >> IMMEDIATE_BIT) & 1 == 1
}

pub fn dest_options(word: u16) -> u16 {
    (word >> DEST_OPT_SHIFT) & mask(DEST_OPT_BITS)
}

pub fn dest_port(word: u16) -> u16 {
    (word >> DEST_PORT_SHIFT) & mask(DEST_PORT_BITS)
}

pub fn execution(word: u16) -> Execution {
    Execution::from_bit(word >> BRANCH_SHIFT)
}

pub fn source_options(word: u16) -> u16 {
    (word >> SRC_OPT_SHIFT) & mask(SRC_OPT_BITS)
}

pub fn source_port(word: u16) -> u16 {
    word & mask(SRC_PORT_BITS)
}

pub fn value(word: u16) -> u16 {
    word & mask(VALUE_BITS)
}

impl CommandLayout for NarrowLayout {
    fn name(&self) -> &'static str {
        "narrow"
    }

    fn encode_port(&self, cmd: &PortCommand) -> u16 {
        dest_bits(cmd.dest)
            | (cmd.execution.bit() << BRANCH_SHIFT)
            | ((cmd.source.options & mask(SRC_OPT_BITS)) << SRC_OPT_SHIFT)
            | (cmd.source.port & mask(SRC_PORT_BITS))
    }

    fn encode_immediate(&self, cmd: &ImmediateCommand) -> u16 {
        (1 << IMMEDIATE_BIT) | dest_bits(cmd.dest) | (cmd.value & mask(VALUE_BITS))
    }

    fn kind(&self, word: u16) -> Kind {
        if is_immediate(word) {
            Kind::Immediate
        } else {
            Kind::Port
        }
    }

    fn decode(&self, word: u16) -> Fields {
        let dest = Operand::new(dest_port(word), dest_options(word));
        match self.kind(word) {
            Kind::Port => Fields::Port(PortCommand {
                dest,
                execution: execution(word),
                source: Operand::new(source_port(word), source_options(word)),
            }),
            Kind::Immediate => Fields::Immediate(ImmediateCommand {
                dest,
                value: value(word),
            }),
        }
    }

    fn patch_label(&self, word: u16, index: usize) -> u16 {
        (word & !mask(LABEL_BITS)) | (index as u16 & mask(LABEL_BITS))
    }

    fn field_widths(&self, kind: Kind) -> &'static [u32] {
        match kind {
            Kind::Port => &[1, 4, 3, 1, 2, 5],
            Kind::Immediate => &[1, 4, 3, 8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_bit_marks_immediates() {
        let imm = NarrowLayout.encode_immediate(&ImmediateCommand { dest: Operand::new(2, 0), value: 9 });
        assert_eq!(imm, 0b1_0000_010_0000_1001);
        let p = NarrowLayout.encode_port(&PortCommand {
            dest: Operand::new(2, 1),
            execution: Execution::Unconditional,
            source: Operand::new(0x1F, 0b10),
        });
        assert_eq!(p, 0b0_0001_010_1_10_11111);
    }

    #[test]
    fn fields_do_not_spill() {
        let p = NarrowLayout.encode_port(&PortCommand {
            dest: Operand::new(0xF, 0),
            execution: Execution::Tested,
            source: Operand::new(0x3F, 0x7),
        });
        assert_eq!(dest_options(p), 0);
        assert_eq!(dest_port(p), 0x7);
        assert_eq!(source_port(p), 0x1F);
        assert_eq!(source_options(p), 0x3);
    }

    #[test]
    fn decode_inverts_encode_within_field_widths() {
        for dest_opt in 0..16 {
            for dest_port in 0..8 {
                let dest = Operand::new(dest_port, dest_opt);
                for execution in [Execution::Tested, Execution::Unconditional] {
                    for src_opt in 0..4 {
                        for src_port in 0..32 {
                            let cmd = PortCommand {
                                dest,
                                execution,
                                source: Operand::new(src_port, src_opt),
                            };
                            let w = NarrowLayout.encode_port(&cmd);
                            assert_eq!(NarrowLayout.kind(w), Kind::Port);
                            assert_eq!(NarrowLayout.decode(w), Fields::Port(cmd));
                        }
                    }
                }
                for value in 0..=255 {
                    let imm = ImmediateCommand { dest, value };
                    let w = NarrowLayout.encode_immediate(&imm);
                    assert_eq!(NarrowLayout.kind(w), Kind::Immediate);
                    assert_eq!(NarrowLayout.decode(w), Fields::Immediate(imm));
                }
            }
        }
    }

    #[test]
    fn label_patch_uses_the_low_nibble() {
        let base = NarrowLayout.encode_immediate(&ImmediateCommand { dest: Operand::new(7, 0xF), value: 0xF0 });
        let w = NarrowLayout.patch_label(base, 0x1B);
        assert_eq!(w, base | 0xB);
        assert_eq!(w & !0xF, base & !0xF);
    }
}
