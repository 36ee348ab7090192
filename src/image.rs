use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AsmError;

/// Size of every microcode image.
pub const IMAGE_SIZE: usize = 64 * 1024;

/// How (cmdSet, page, group id) concatenate into a byte address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomGeometry {
    pub cmd_set_bits: u32,
    pub page_bits: u32,
    pub cmd_bits: u32,
    /// Low address bits left for the words inside a group.
    pub step_bits: u32,
    pub image_size: usize,
}

impl Default for RomGeometry {
    fn default() -> Self {
        Self {
            cmd_set_bits: 3,
            page_bits: 1,
            cmd_bits: 8,
            step_bits: 4,
            image_size: IMAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coord {
    CmdSet,
    Page,
    Group,
}

impl Coord {
    pub fn label(self) -> &'static str {
        match self {
            Coord::CmdSet => "Command Set",
            Coord::Page => "Page",
            Coord::Group => "Command Id",
        }
    }
}

impl RomGeometry {
    pub fn max(&self, coord: Coord) -> u32 {
        let bits = match coord {
            Coord::CmdSet => self.cmd_set_bits,
            Coord::Page => self.page_bits,
            Coord::Group => self.cmd_bits,
        };
        ((1u64 << bits) - 1) as u32
    }

    pub fn in_range(&self, coord: Coord, value: i64) -> bool {
        (0..=self.max(coord) as i64).contains(&value)
    }

    /// Byte address of a group. Coordinates are expected to be in range.
    pub fn address(&self, cmd_set: u32, page: u32, group: u32) -> u32 {
        ((((cmd_set << self.page_bits) | page) << self.cmd_bits) | group) << self.step_bits
    }

    pub fn validate(&self) -> Result<(), AsmError> {
        let total = self.cmd_set_bits + self.page_bits + self.cmd_bits + self.step_bits;
        if total > 31 {
            return Err(AsmError::Config(format!(
                "address needs {total} bits, at most 31 are supported"
            )));
        }
        if self.image_size < 2 {
            return Err(AsmError::Config(format!(
                "image size {} cannot hold a command word",
                self.image_size
            )));
        }
        Ok(())
    }
}

/// Zero-initialised ROM image addressed in bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RomImage {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for RomImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.bytes.iter().filter(|&&b| b != 0).count();
        f.debug_struct("RomImage")
            .field("size", &self.bytes.len())
            .field("nonzero", &used)
            .finish()
    }
}

impl Default for RomImage {
    fn default() -> Self {
        Self::new(IMAGE_SIZE)
    }
}

impl RomImage {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn load(path: &Path) -> Result<Self, AsmError> {
        let bytes = std::fs::read(path).map_err(|source| AsmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read_u16(&self, addr: u32) -> Option<u16> {
        let off = addr as usize;
        let b = self.bytes.get(off..off.checked_add(2)?)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Stores `words` little-endian from `addr` on. Bytes beyond the end of
    /// the image are dropped; returns how many were.
    pub fn write_words(&mut self, addr: u32, words: &[u16]) -> usize {
        let mut dropped = 0;
        let mut off = addr as usize;
        for w in words {
            for b in w.to_le_bytes() {
                match self.bytes.get_mut(off) {
                    Some(slot) => *slot = b,
                    None => dropped += 1,
                }
                off += 1;
            }
        }
        dropped
    }

    pub fn save(&self, path: &Path) -> Result<(), AsmError> {
        std::fs::write(path, &self.bytes).map_err(|source| AsmError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_concatenates_coordinates() {
        let g = RomGeometry::default();
        assert_eq!(g.address(2, 1, 5), ((((2 << 1) | 1) << 8) | 5) << 4);
        assert_eq!(g.address(2, 1, 5), 0x5050);
        assert_eq!(g.address(0, 0, 0), 0);
        assert_eq!(g.address(7, 1, 255), 0xFFF0);
    }

    #[test]
    fn coordinate_ranges() {
        let g = RomGeometry::default();
        assert_eq!(g.max(Coord::CmdSet), 7);
        assert_eq!(g.max(Coord::Page), 1);
        assert_eq!(g.max(Coord::Group), 255);
        assert!(g.in_range(Coord::Page, 1));
        assert!(!g.in_range(Coord::Page, 2));
        assert!(!g.in_range(Coord::CmdSet, -1));
    }

    #[test]
    fn words_are_little_endian() {
        let mut img = RomImage::new(16);
        assert_eq!(img.write_words(4, &[0x8302, 0x00FF]), 0);
        assert_eq!(&img.as_bytes()[4..8], &[0x02, 0x83, 0xFF, 0x00]);
        assert_eq!(img.read_u16(4), Some(0x8302));
        assert_eq!(img.read_u16(15), None);
    }

    #[test]
    fn writes_past_the_end_are_dropped() {
        let mut img = RomImage::new(8);
        assert_eq!(img.write_words(6, &[0x1122, 0x3344, 0x5566]), 4);
        assert_eq!(img.as_bytes(), &[0, 0, 0, 0, 0, 0, 0x22, 0x11]);
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        let g = RomGeometry { cmd_bits: 24, ..RomGeometry::default() };
        assert!(g.validate().is_err());
        assert!(RomGeometry::default().validate().is_ok());
    }
}
