//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM) and common types.

/// Nametable mirroring mode for the PPU, fixed by board wiring on NROM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    /// Four-screen boards carry their own VRAM; folded onto the console's
    /// 2 KiB here since no supported mapper provides the extra memory.
    FourScreen,
}

mod mapper;
pub mod mapper0;

pub use mapper::Mapper;
