//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte
//! header (magic "NES\x1A", PRG size in 16 KiB units, CHR size in 8 KiB units,
//! flags 6–7 for mirroring/mapper, PRG-RAM and TV-system bytes), an optional
//! 512-byte trainer, then PRG ROM, then CHR ROM. Malformed or unsupported
//! images are load errors, never runtime guesses.

use std::error::Error;
use std::fmt;

use crate::cartridge::mapper::{Mapper, Mirroring, mapper0::Mapper0};

/// Why an iNES image could not be loaded.
#[derive(Debug, PartialEq, Eq)]
pub enum CartridgeError {
    InvalidHeader(&'static str),
    /// The header is well-formed but describes something out of scope
    /// (NES 2.0).
    UnsupportedFormat(&'static str),
    UnsupportedMapper(u8),
    /// Header and payload disagree (truncated PRG/CHR data).
    InvalidData(&'static str),
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::InvalidHeader(msg) => write!(f, "invalid iNES header: {}", msg),
            CartridgeError::UnsupportedFormat(msg) => write!(f, "unsupported format: {}", msg),
            CartridgeError::UnsupportedMapper(id) => write!(f, "unsupported mapper {}", id),
            CartridgeError::InvalidData(msg) => write!(f, "invalid iNES data: {}", msg),
        }
    }
}

impl Error for CartridgeError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TvSystem {
    Ntsc,
    Pal,
}

/// Decoded iNES header fields.
#[derive(Clone, Debug)]
pub struct RomHeader {
    /// PRG ROM size in 16 KiB banks.
    pub prg_banks: u8,
    /// CHR ROM size in 8 KiB banks; 0 means the board has CHR RAM instead.
    pub chr_banks: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    /// Battery-backed PRG RAM present (flags 6 bit 1).
    pub battery: bool,
    /// 512-byte trainer between header and PRG data (flags 6 bit 2).
    pub trainer: bool,
    /// PRG RAM size in 8 KiB banks; the on-disk 0 means 1 for compatibility.
    pub prg_ram_banks: u8,
    pub tv_system: TvSystem,
}

impl RomHeader {
    /// Parse the 16-byte iNES header at the front of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < 16 {
            return Err(CartridgeError::InvalidHeader(
                "image shorter than the 16-byte header",
            ));
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::InvalidHeader("bad magic"));
        }

        let flags6 = data[6];
        let flags7 = data[7];
        // NES 2.0 is signalled by bits 2-3 of flags 7 reading binary 10
        if flags7 & 0x0C == 0x08 {
            return Err(CartridgeError::UnsupportedFormat("NES 2.0 header"));
        }

        // Four-screen overrides the H/V solder-pad bit
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_id: (flags6 >> 4) | (flags7 & 0xF0),
            mirroring,
            battery: flags6 & 0x02 != 0,
            trainer: flags6 & 0x04 != 0,
            prg_ram_banks: if data[8] == 0 { 1 } else { data[8] },
            tv_system: if data[9] & 0x01 != 0 {
                TvSystem::Pal
            } else {
                TvSystem::Ntsc
            },
        })
    }
}

/// Cartridge: decoded header plus the mapper that implements address decoding
/// and nametable mirroring. CPU reads PRG via the bus at $8000–$FFFF; the PPU
/// reads CHR at $0000–$1FFF (pattern tables).
pub struct Cartridge {
    pub header: RomHeader,
    pub mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Decode an iNES image. PRG is kept as ordered 16 KiB banks; a CHR bank
    /// count of 0 provides one writable 8 KiB CHR RAM bank instead.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = RomHeader::parse(data)?;
        if header.prg_banks == 0 {
            return Err(CartridgeError::InvalidData("no PRG banks"));
        }

        let prg_len = header.prg_banks as usize * 16 * 1024;
        let chr_len = header.chr_banks as usize * 8 * 1024;
        let prg_start = 16 + if header.trainer { 512 } else { 0 };
        let chr_start = prg_start + prg_len;
        if data.len() < chr_start + chr_len {
            return Err(CartridgeError::InvalidData("image truncated"));
        }

        let prg_banks: Vec<Vec<u8>> = data[prg_start..chr_start]
            .chunks(16 * 1024)
            .map(|bank| bank.to_vec())
            .collect();
        let (chr, chr_writable) = if chr_len > 0 {
            (data[chr_start..chr_start + chr_len].to_vec(), false)
        } else {
            (vec![0; 8 * 1024], true)
        };

        let mapper: Box<dyn Mapper> = match header.mapper_id {
            0 => Box::new(Mapper0::new(prg_banks, chr, chr_writable, header.mirroring)),
            id => return Err(CartridgeError::UnsupportedMapper(id)),
        };

        log::debug!(
            "loaded iNES image: mapper {}, {}x16K PRG, {}x8K CHR, {:?} mirroring{}{}",
            header.mapper_id,
            header.prg_banks,
            header.chr_banks,
            header.mirroring,
            if header.battery { ", battery" } else { "" },
            if header.trainer { ", trainer" } else { "" },
        );

        Ok(Self { header, mapper })
    }

    /// Read: PRG space ($4020–$FFFF) or CHR ($0000–$1FFF). Mapper dispatches.
    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    /// Write: CHR RAM if present; everything else is read-only on NROM.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }

    /// Current nametable mirroring for the PPU.
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let trainer = if flags6 & 0x04 != 0 { 512 } else { 0 };
        let len = 16 + trainer + prg_banks as usize * 16 * 1024 + chr_banks as usize * 8 * 1024;
        let mut data = vec![0u8; len];
        data[0..4].copy_from_slice(b"NES\x1A");
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = flags6;
        data[7] = flags7;
        data
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = image(1, 1, 0, 0);
        data[0] = b'X';
        assert_eq!(
            Cartridge::from_bytes(&data).err(),
            Some(CartridgeError::InvalidHeader("bad magic"))
        );
    }

    #[test]
    fn rejects_truncated_image() {
        let mut data = image(1, 1, 0, 0);
        data.truncate(16 + 1000);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidData(_))
        ));
    }

    #[test]
    fn rejects_nes2_header() {
        let data = image(1, 1, 0, 0x08);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_unknown_mapper() {
        let data = image(1, 1, 0x10, 0); // mapper 1
        assert_eq!(
            Cartridge::from_bytes(&data).err(),
            Some(CartridgeError::UnsupportedMapper(1))
        );
    }

    #[test]
    fn header_fields_decode() {
        let mut data = image(2, 1, 0b0000_0111, 0);
        data[8] = 0; // PRG RAM: 0 on disk means one bank
        data[9] = 1; // PAL
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.prg_banks, 2);
        assert_eq!(header.chr_banks, 1);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert!(header.battery);
        assert!(header.trainer);
        assert_eq!(header.prg_ram_banks, 1);
        assert_eq!(header.tv_system, TvSystem::Pal);
    }

    #[test]
    fn four_screen_wins_over_solder_pad() {
        let data = image(1, 1, 0b0000_1001, 0);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn trainer_shifts_prg_data() {
        let mut data = image(1, 1, 0x04, 0);
        data[16 + 512] = 0xAA; // first PRG byte sits after the trainer
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.read(0x8000), 0xAA);
    }

    #[test]
    fn nrom_mirrors_single_prg_bank() {
        let mut data = image(1, 1, 0, 0);
        data[16] = 0x11; // offset 0 of the only bank
        data[16 + 0x3FFF] = 0x22; // last byte of the only bank
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.read(0x8000), 0x11);
        assert_eq!(cart.read(0xC000), 0x11);
        assert_eq!(cart.read(0xFFFF), 0x22);
    }

    #[test]
    fn nrom_fixes_first_and_last_of_two_banks() {
        let mut data = image(2, 1, 0, 0);
        data[16] = 0x11; // bank 0
        data[16 + 0x4000] = 0x22; // bank 1
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.read(0x8000), 0x11);
        assert_eq!(cart.read(0xC000), 0x22);
    }

    #[test]
    fn chr_ram_is_writable_chr_rom_is_not() {
        let mut ram_cart = Cartridge::from_bytes(&image(1, 0, 0, 0)).unwrap();
        ram_cart.write(0x1000, 0x5A);
        assert_eq!(ram_cart.read(0x1000), 0x5A);

        let mut rom_cart = Cartridge::from_bytes(&image(1, 1, 0, 0)).unwrap();
        rom_cart.write(0x1000, 0x5A);
        assert_eq!(rom_cart.read(0x1000), 0x00);
    }
}
