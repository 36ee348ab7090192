use serde::Serialize;

use mcasm::disasm::{fmt_bits, fmt_fields};
use mcasm::encoding::{CommandLayout, Fields, CMDS_PER_GRP};
use mcasm::image::Coord;
use mcasm::{RomGeometry, RomImage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOut {
    pub slot: usize,
    pub word: u16,
    pub bits: String,
    pub fields: Fields,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOut {
    pub cmd_set: u32,
    pub page: u32,
    pub group: u32,
    pub addr: u32,
    /// Non-zero slots only.
    pub commands: Vec<CommandOut>,
}

/// Reads the group at the given coordinates. Slots past the end of the
/// image read as zero.
pub fn read_group(
    image: &RomImage,
    geometry: &RomGeometry,
    layout: &dyn CommandLayout,
    cmd_set: u32,
    page: u32,
    group: u32,
) -> GroupOut {
    let addr = geometry.address(cmd_set, page, group);
    let commands = (0..CMDS_PER_GRP)
        .filter_map(|slot| {
            let word = image.read_u16(addr + 2 * slot as u32).unwrap_or(0);
            if word == 0 {
                return None;
            }
            let fields = layout.decode(word);
            Some(CommandOut {
                slot,
                word,
                bits: fmt_bits(word, layout.field_widths(layout.kind(word))),
                text: fmt_fields(&fields),
                fields,
            })
        })
        .collect();
    GroupOut {
        cmd_set,
        page,
        group,
        addr,
        commands,
    }
}

/// Every group with at least one non-zero word, in address order.
///
/// With the default geometry a group spans 32 bytes but groups start 16
/// bytes apart, so a word can show up in two neighbouring groups.
pub fn scan_groups(image: &RomImage, geometry: &RomGeometry, layout: &dyn CommandLayout) -> Vec<GroupOut> {
    let mut out = Vec::new();
    for cs in 0..=geometry.max(Coord::CmdSet) {
        for pg in 0..=geometry.max(Coord::Page) {
            for id in 0..=geometry.max(Coord::Group) {
                let g = read_group(image, geometry, layout, cs, pg, id);
                if !g.commands.is_empty() {
                    out.push(g);
                }
            }
        }
    }
    out
}

pub fn render_text(groups: &[GroupOut]) -> String {
    use std::fmt::Write as _;
    let mut buf = String::new();
    for g in groups {
        let _ = writeln!(buf, "grp {}:{}:{} @ {:#06x}", g.cmd_set, g.page, g.group, g.addr);
        for c in &g.commands {
            let _ = writeln!(buf, "  {:>2}  {:#06x}  {:<22}  {}", c.slot, c.word, c.bits, c.text);
        }
    }
    buf
}
