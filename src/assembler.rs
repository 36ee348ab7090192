use std::path::Path;

use serde::Serialize;

use crate::config::AsmConfig;
use crate::diag::{Location, Reporter, Severity};
use crate::encoding::{CommandLayout, CMDS_PER_GRP};
use crate::error::AsmError;
use crate::image::{Coord, RomImage};
use crate::intern::Interner;
use crate::parser::Session;
use crate::symbols::{Registry, Scope};

/// A binding made while `export on` was in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedSymbol {
    pub name: String,
    pub value: i32,
    pub scope: Scope,
}

/// All state of one assembler run.
///
/// Symbols, ports, the current cmdSet/page and the export flag persist across
/// every source handed to the same `Assembler`, so later files see what
/// earlier ones defined.
pub struct Assembler {
    pub(crate) config: AsmConfig,
    pub(crate) layout: &'static dyn CommandLayout,
    pub(crate) interner: Interner,
    pub(crate) registry: Registry,
    pub(crate) cmd_set: u32,
    pub(crate) page: u32,
    pub(crate) export: bool,
    pub(crate) image: RomImage,
    pub(crate) reporter: Reporter,
}

impl Assembler {
    /// Fails when the geometry cannot address an image.
    pub fn new(config: AsmConfig, mut reporter: Reporter) -> Result<Self, AsmError> {
        config.geometry.validate()?;
        if config.trace {
            reporter.set_trace(true);
        }
        Ok(Self {
            layout: config.layout.layout(),
            interner: Interner::new(),
            registry: Registry::new(),
            cmd_set: 0,
            page: 0,
            export: false,
            image: RomImage::new(config.geometry.image_size),
            reporter,
            config,
        })
    }

    pub fn config(&self) -> &AsmConfig {
        &self.config
    }

    pub fn layout(&self) -> &'static dyn CommandLayout {
        self.layout
    }

    pub fn set_trace(&mut self, on: bool) {
        self.reporter.set_trace(on);
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// True once any error was reported during the run.
    pub fn failed(&self) -> bool {
        self.reporter.failed()
    }

    pub fn cmd_set(&self) -> u32 {
        self.cmd_set
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn export(&self) -> bool {
        self.export
    }

    pub fn image(&self) -> &RomImage {
        &self.image
    }

    /// Hands out the current image and starts a fresh, zeroed one.
    pub fn take_image(&mut self) -> RomImage {
        let fresh = RomImage::new(self.config.geometry.image_size);
        std::mem::replace(&mut self.image, fresh)
    }

    pub fn lookup(&self, scope: Scope, name: &str) -> Option<i32> {
        let tok = self.interner.get(name)?;
        self.registry.lookup(scope, tok)
    }

    pub fn exported_symbols(&self) -> Vec<ExportedSymbol> {
        [Scope::Symbol, Scope::Port]
            .into_iter()
            .flat_map(|scope| {
                self.registry
                    .table(scope)
                    .iter()
                    .filter(|b| b.exported)
                    .map(move |b| ExportedSymbol {
                        name: self.interner.resolve(b.name).to_owned(),
                        value: b.value,
                        scope,
                    })
            })
            .collect()
    }

    /// Assembles one source file. Only an unreadable file is fatal; every
    /// other problem is reported and parsing carries on.
    pub fn assemble_file(&mut self, path: &Path) -> Result<(), AsmError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                return Err(self
                    .reporter
                    .fatal(None, format!("Can't read {}: {e}", path.display())))
            }
        };
        tracing::debug!(file = %path.display(), bytes = bytes.len(), "assembling");
        let text = String::from_utf8_lossy(&bytes);
        self.assemble_str(&path.display().to_string(), &text);
        Ok(())
    }

    /// Assembles source text; `name` is used in diagnostics.
    pub fn assemble_str(&mut self, name: &str, src: &str) {
        Session::new(self, name, src).run();
    }

    /// Writes the words of one group at the address of its coordinates.
    /// Out-of-range coordinates are reported and replaced by 0.
    pub fn write_group(
        &mut self,
        cmd_set: u32,
        page: u32,
        group: u32,
        words: &[u16; CMDS_PER_GRP],
        location: Option<Location>,
    ) {
        let geometry = self.config.geometry;
        let mut coords = [(Coord::CmdSet, cmd_set), (Coord::Page, page), (Coord::Group, group)];
        for (coord, value) in coords.iter_mut() {
            if !geometry.in_range(*coord, *value as i64) {
                self.reporter.report(
                    Severity::Error,
                    location.clone(),
                    format!(
                        "{}, {}, is out of range 0..{}; using 0",
                        coord.label(),
                        value,
                        geometry.max(*coord)
                    ),
                );
                *value = 0;
            }
        }
        let [(_, cmd_set), (_, page), (_, group)] = coords;
        let addr = geometry.address(cmd_set, page, group);
        let size = self.image.len();
        let lost = words
            .iter()
            .enumerate()
            .filter(|(i, w)| **w != 0 && addr as usize + 2 * i + 2 > size)
            .count();
        if lost > 0 {
            self.reporter.report(
                Severity::Error,
                location,
                format!("group at {addr:#06x} runs past the {size}-byte image; {lost} commands lost"),
            );
        }
        let dropped = self.image.write_words(addr, words);
        tracing::debug!(cmd_set, page, group, addr, dropped, "group written");
    }
}
