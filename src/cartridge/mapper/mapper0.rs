//! Mapper 0 (NROM): no bank switching.
//!
//! The first 16 KiB PRG bank sits at $8000–$BFFF and the last at $C000–$FFFF;
//! with a single bank both windows show it. One 8 KiB CHR bank (ROM, or RAM
//! when the image ships none) covers the pattern tables.

use crate::cartridge::mapper::{Mapper, Mirroring};

pub struct Mapper0 {
    prg_banks: Vec<Vec<u8>>,
    chr: Vec<u8>,
    chr_writable: bool,
    mirroring: Mirroring,
}

impl Mapper0 {
    pub fn new(
        prg_banks: Vec<Vec<u8>>,
        chr: Vec<u8>,
        chr_writable: bool,
        mirroring: Mirroring,
    ) -> Self {
        Self {
            prg_banks,
            chr,
            chr_writable,
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            // Pattern tables
            0x0000..=0x1FFF => self.chr[addr as usize],
            // Fixed first bank
            0x8000..=0xBFFF => self.prg_banks[0][(addr - 0x8000) as usize],
            // Fixed last bank
            0xC000..=0xFFFF => {
                self.prg_banks[self.prg_banks.len() - 1][(addr - 0xC000) as usize]
            }
            // NROM decodes nothing below $8000; reads float
            _ => {
                log::trace!("open cartridge read at ${:04X}", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF if self.chr_writable => self.chr[addr as usize] = data,
            _ => log::warn!("ignored mapper write of ${:02X} to ${:04X}", data, addr),
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
