//! famicore: a cycle-counting NES (Nintendo Entertainment System) core.
//!
//! Implements the console as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): 6502 CPU,
//! 2C02 PPU, the CPU/PPU memory maps, iNES cartridges, and controller I/O,
//! clocked at the NTSC 1:3 CPU:PPU ratio.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) and
//!   [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map): RAM/VRAM mirroring,
//!   PPU registers, OAM DMA, controllers, cartridge
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 strobe, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU): documented opcodes via a descriptor table,
//!   cycle-granular stepping, [NMI](https://www.nesdev.org/wiki/NMI) and [DMA](https://www.nesdev.org/wiki/DMA)
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers),
//!   dot-stepped timing, background rendering, OAM, 256×240 RGBA frames
//! - **system** – the console: load, power on, step, frames

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod ppu;
pub mod system;
