//! Console orchestration: one CPU cycle, three PPU dots.
//!
//! [`Nes`] is the library's front door: load an iNES image, apply power-on
//! state, and step the master clock. Frames come out as RGBA8 buffers via
//! [`consume_frame`](Nes::consume_frame).

use crate::{
    bus::NesBus,
    cartridge::cartridge::{Cartridge, CartridgeError},
    cpu::cpu::CPU,
    ppu::frame::Frame,
};

/// The console: CPU wired to the main bus, which owns PPU, cartridge, RAM,
/// and controllers.
pub struct Nes {
    pub cpu: CPU<NesBus>,
}

impl Nes {
    /// Build a console around an iNES image. Malformed or unsupported images
    /// fail here; nothing later second-guesses the cartridge.
    pub fn load_cartridge(data: &[u8]) -> Result<Self, CartridgeError> {
        let cart = Cartridge::from_bytes(data)?;
        Ok(Self {
            cpu: CPU::new(NesBus::new(cart)),
        })
    }

    /// Apply the documented power-on state and load PC from the reset vector.
    pub fn power_on(&mut self) {
        self.cpu.power_on();
    }

    /// Advance the master clock: one CPU cycle, then three PPU dots.
    pub fn step(&mut self) {
        self.cpu.step();
        for _ in 0..3 {
            self.cpu.bus.tick_ppu();
        }
    }

    /// True once the PPU has completed a frame that has not been consumed.
    pub fn is_frame_ready(&self) -> bool {
        self.cpu.bus.ppu.frame_ready
    }

    /// Take the completed frame, clearing the ready flag. The buffer stays
    /// valid until the PPU next renders over it.
    pub fn consume_frame(&mut self) -> &Frame {
        self.cpu.bus.ppu.frame_ready = false;
        &self.cpu.bus.ppu.frame
    }

    /// Run until the next frame completes and return it.
    pub fn frame(&mut self) -> &Frame {
        while !self.is_frame_ready() {
            self.step();
        }
        self.consume_frame()
    }

    /// Set the button state for a controller port (0 or 1).
    pub fn set_controller(&mut self, port: usize, state: u8) {
        self.cpu.bus.controllers[port].state = state;
    }
}
