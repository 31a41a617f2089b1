//! 6502 CPU emulation for the NES.
//!
//! Cycle-stepped engine over a descriptor table of the 151 documented opcodes;
//! NMI and OAM DMA enter as fixed-cost pseudo-instructions at instruction
//! boundaries. Bus trait used for memory and I/O (PPU, cartridge, controller).

pub mod cpu;
pub mod flags;
pub mod instructions;
