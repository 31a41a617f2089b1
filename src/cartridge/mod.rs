//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Parses iNES (.nes) images, holds the decoded header and mapper.
//! - **mapper**: NROM (0); PRG/CHR address decoding and nametable mirroring.

pub mod cartridge;
pub mod mapper;
