use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::isa::{narrow::NarrowLayout, rich::RichLayout};

/// Words in one command group.
pub const CMDS_PER_GRP: usize = 16;

/// Extra identifiers allowed after a destination or source.
pub const MAX_OPTIONS: usize = 4;

/// A port together with the options OR'd onto it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    pub port: u16,
    pub options: u16,
}

impl Operand {
    pub fn new(port: u16, options: u16) -> Self {
        Self { port, options }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    /// Test and conditionally execute (`=`).
    Tested,
    /// Always execute (`=?`).
    Unconditional,
}

impl Execution {
    pub fn bit(self) -> u16 {
        match self {
            Execution::Tested => 0,
            Execution::Unconditional => 1,
        }
    }

    pub fn from_bit(bit: u16) -> Self {
        if bit & 1 == 0 {
            Execution::Tested
        } else {
            Execution::Unconditional
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCommand {
    pub dest: Operand,
    pub execution: Execution,
    pub source: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmediateCommand {
    pub dest: Operand,
    pub value: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Port,
    Immediate,
}

/// Logical content of a command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fields {
    Port(PortCommand),
    Immediate(ImmediateCommand),
}

/// Bit arrangement of a 16-bit command word.
///
/// Encoders mask every field to its width; they never reject a value.
pub trait CommandLayout: Sync {
    fn name(&self) -> &'static str;

    fn encode_port(&self, cmd: &PortCommand) -> u16;

    fn encode_immediate(&self, cmd: &ImmediateCommand) -> u16;

    fn kind(&self, word: u16) -> Kind;

    fn decode(&self, word: u16) -> Fields;

    /// Rewrites the label sub-field of an immediate word, keeping every other bit.
    fn patch_label(&self, word: u16, index: usize) -> u16;

    /// Field widths from bit 15 downwards, for grouped binary listings.
    fn field_widths(&self, kind: Kind) -> &'static [u32];

    fn encode(&self, fields: &Fields) -> u16 {
        match fields {
            Fields::Port(p) => self.encode_port(p),
            Fields::Immediate(i) => self.encode_immediate(i),
        }
    }
}

static RICH: RichLayout = RichLayout;
static NARROW: NarrowLayout = NarrowLayout;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// `iDDDDdddtSSSSsss`: 7-bit destination/source specs, 0 = immediate.
    #[default]
    Rich,
    /// 3-bit destination, 5-bit source port, 1 = immediate.
    Narrow,
}

impl LayoutKind {
    pub fn layout(self) -> &'static dyn CommandLayout {
        match self {
            LayoutKind::Rich => &RICH,
            LayoutKind::Narrow => &NARROW,
        }
    }
}

/// Value with the low `bits` bits set.
pub const fn mask(bits: u32) -> u16 {
    ((1u32 << bits) - 1) as u16
}
