pub mod assembler;
pub mod config;
pub mod diag;
pub mod disasm;
pub mod encoding;
pub mod error;
pub mod image;
pub mod intern;
pub mod lexer;
pub mod symbols;
pub mod value;

mod group;
mod parser;

pub mod isa {
    pub mod narrow; // 3-bit destination, 5-bit source port
    pub mod rich; // iDDDDdddtSSSSsss
}

pub use assembler::{Assembler, ExportedSymbol};
pub use config::AsmConfig;
pub use diag::{Diagnostic, Reporter, Severity};
pub use encoding::{CommandLayout, LayoutKind};
pub use error::AsmError;
pub use image::{RomGeometry, RomImage};
