use bitflags::bitflags;

use crate::encoding::{
    mask, CommandLayout, Execution, Fields, ImmediateCommand, Kind, Operand, PortCommand,
};

/// Default control-store word layout.
///
/// ```text
///   iDDDDdddtSSSSsss
/// i    0 => immediate; the low byte tSSSSsss is a constant
/// DDDD destination option
/// ddd  destination port
/// t    0 => test and conditionally execute
/// SSSS source option
/// sss  source port
/// ```
///
/// Destination and source are 7-bit specs, `option << 3 | port`. A port value
/// wider than three bits spills into the option bits.
pub struct RichLayout;

pub const OPT_BITS: u32 = 4;
pub const PORT_BITS: u32 = 3;
pub const SPEC_BITS: u32 = OPT_BITS + PORT_BITS;
pub const VALUE_BITS: u32 = 8;
pub const SOURCE_SELECT_BITS: u32 = 5;

pub const DEST_SHIFT: u32 = 8;
pub const DEST_OPT_SHIFT: u32 = DEST_SHIFT + PORT_BITS;
pub const EXEC_SHIFT: u32 = 7;
pub const SRC_SHIFT: u32 = 0;
pub const SRC_OPT_SHIFT: u32 = SRC_SHIFT + PORT_BITS;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u16 {
        /// Port-routed command; clear for immediates.
        const PORT = 1 << 15;
        /// Execute without testing (port commands only).
        const UNCONDITIONAL = 1 << EXEC_SHIFT;
    }
}

pub fn spec(op: Operand) -> u16 {
    (((op.options & mask(OPT_BITS)) << PORT_BITS) | (op.port & mask(SPEC_BITS))) & mask(SPEC_BITS)
}

pub fn is_port(word: u16) -> bool {
    Control::from_bits_truncate(word).contains(Control::PORT)
}

pub fn dest_spec(word: u16) -> u16 {
    (word >> DEST_SHIFT) & mask(SPEC_BITS)
}

pub fn dest_options(word: u16) -> u16 {
    (word >> DEST_OPT_SHIFT) & mask(OPT_BITS)
}

pub fn dest_port(word: u16) -> u16 {
    (word >> DEST_SHIFT) & mask(PORT_BITS)
}

pub fn execution(word: u16) -> Execution {
    Execution::from_bit(word >> EXEC_SHIFT)
}

pub fn source_spec(word: u16) -> u16 {
    (word >> SRC_SHIFT) & mask(SPEC_BITS)
}

pub fn source_options(word: u16) -> u16 {
    (word >> SRC_OPT_SHIFT) & mask(OPT_BITS)
}

pub fn source_port(word: u16) -> u16 {
    (word >> SRC_SHIFT) & mask(PORT_BITS)
}

/// The low five bits of a port word, the source select as the hardware
/// decodes it: the 3-bit port plus the two low option bits.
pub fn source_select(word: u16) -> u16 {
    word & mask(SOURCE_SELECT_BITS)
}

pub fn value(word: u16) -> u16 {
    word & mask(VALUE_BITS)
}

impl CommandLayout for RichLayout {
    fn name(&self) -> &'static str {
        "rich"
    }

    fn encode_port(&self, cmd: &PortCommand) -> u16 {
        let mut ctl = Control::PORT;
        ctl.set(Control::UNCONDITIONAL, cmd.execution == Execution::Unconditional);
        ctl.bits() | (spec(cmd.dest) << DEST_SHIFT) | (spec(cmd.source) << SRC_SHIFT)
    }

    fn encode_immediate(&self, cmd: &ImmediateCommand) -> u16 {
        (spec(cmd.dest) << DEST_SHIFT) | (cmd.value & mask(VALUE_BITS))
    }

    fn kind(&self, word: u16) -> Kind {
        if is_port(word) {
            Kind::Port
        } else {
            Kind::Immediate
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
        (word & !mask(VALUE_BITS)) | (index as u16 & mask(VALUE_BITS))
    }

    fn field_widths(&self, kind: Kind) -> &'static [u32] {
        match kind {
            Kind::Port => &[1, 4, 3, 1, 4, 3],
            Kind::Immediate => &[1, 4, 3, 8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(dest: (u16, u16), execution: Execution, source: (u16, u16)) -> PortCommand {
        PortCommand {
            dest: Operand::new(dest.0, dest.1),
            execution,
            source: Operand::new(source.0, source.1),
        }
    }

    #[test]
    fn port_word_bit_positions() {
        let w = RichLayout.encode_port(&port((3, 0b1010), Execution::Unconditional, (5, 0b0110)));
        assert_eq!(w, 0b1_1010_011_1_0110_101);
        let w = RichLayout.encode_port(&port((1, 0), Execution::Tested, (2, 0)));
        assert_eq!(w, 0b1_0000_001_0_0000_010);
    }

    #[test]
    fn immediate_word_bit_positions() {
        let w = RichLayout.encode_immediate(&ImmediateCommand { dest: Operand::new(6, 0b0001), value: 0xA5 });
        assert_eq!(w, 0b0_0001_110_1010_0101);
    }

    #[test]
    fn decode_inverts_encode_within_field_widths() {
        for opt in 0..16 {
            for p in 0..8 {
                for exec in [Execution::Tested, Execution::Unconditional] {
                    let cmd = port((p, opt), exec, (7 - p, 15 - opt));
                    assert_eq!(RichLayout.decode(RichLayout.encode_port(&cmd)), Fields::Port(cmd));
                }
                let imm = ImmediateCommand { dest: Operand::new(p, opt), value: (opt << 4) | p };
                assert_eq!(RichLayout.decode(RichLayout.encode_immediate(&imm)), Fields::Immediate(imm));
            }
        }
    }

    #[test]
    fn wide_values_are_masked() {
        // port 0x85 keeps its low seven bits and spills into the option field
        let w = RichLayout.encode_immediate(&ImmediateCommand { dest: Operand::new(0x85, 0x13), value: 0x1FF });
        assert_eq!(dest_spec(w), ((0x3 << 3) | 0x05) & 0x7F);
        assert_eq!(value(w), 0xFF);
        assert!(!is_port(w));
        // an unresolved operand (-1) fills its field with ones
        let w = RichLayout.encode_port(&port((u16::MAX, 0), Execution::Tested, (0, 0)));
        assert_eq!(dest_spec(w), 0x7F);
        assert_eq!(source_spec(w), 0);
    }

    #[test]
    fn source_select_spans_five_bits() {
        let w = RichLayout.encode_port(&port((1, 0), Execution::Tested, (0x1D, 0)));
        assert_eq!(source_select(w), 0x1D);
        assert_eq!(source_port(w), 0x5);
        assert_eq!(source_options(w) & 0b11, 0b11);
        let w = RichLayout.encode_port(&port((1, 0), Execution::Tested, (2, 0b1010)));
        assert_eq!(source_select(w), 0b10_010);
    }

    #[test]
    fn patch_label_only_touches_the_value() {
        let base = RichLayout.encode_immediate(&ImmediateCommand { dest: Operand::new(5, 9), value: 0 });
        for idx in [0usize, 1, 7, 15, 255, 256 + 3] {
            let w = RichLayout.patch_label(base, idx);
            assert_eq!(w & 0xFF00, base & 0xFF00);
            assert_eq!(value(w), (idx & 0xFF) as u16);
        }
        assert_eq!(RichLayout.patch_label(0xFFFF, 2), 0xFF02);
    }
}
