//! Mapper trait: cartridge address decoding and mirroring.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers, chosen once at load time. Covers the CPU
/// side ($4020–$FFFF) and the PPU pattern-table side ($0000–$1FFF).
pub trait Mapper {
    /// Read from PRG ROM ($8000–$FFFF) or CHR ROM/RAM ($0000–$1FFF).
    fn read(&self, addr: u16) -> u8;
    /// Write to CHR RAM (PRG ROM and CHR ROM are read-only).
    fn write(&mut self, addr: u16, data: u8);
    /// Nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;
}
