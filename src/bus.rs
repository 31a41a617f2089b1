//! Memory bus and address decoding for the NES.
//!
//! Two views of one address space: [`NesBus`] decodes CPU addresses to work
//! RAM, PPU registers, DMA/controller I/O, and the cartridge, while
//! [`VideoBus`] decodes PPU addresses to pattern tables and mirrored
//! nametable VRAM. The bus owns both RAMs; the PPU borrows its view per dot.

use crate::{cartridge::cartridge::Cartridge, controller::Controller, ppu::ppu::PPU};

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Consume a pending NMI, if any.
    fn poll_nmi(&mut self) -> bool {
        false
    }

    /// Consume a pending OAM DMA request; returns the source page.
    fn poll_dma(&mut self) -> Option<u8> {
        None
    }

    /// Push one byte into sprite memory during OAM DMA.
    fn push_oam(&mut self, _data: u8) {}
}

/// Main NES bus: work RAM, video RAM, PPU, cartridge, and controllers.
pub struct NesBus {
    pub ram: [u8; 2048],
    pub vram: [u8; 2048],
    pub cart: Cartridge,
    pub ppu: PPU,
    pub controllers: [Controller; 2],
    /// Source page latched by a $4014 write; consumed by the CPU at its next
    /// instruction boundary.
    pub dma_page: Option<u8>,
}

/// The PPU's window onto bus-owned memory: pattern tables via the mapper,
/// nametables in the bus's 2 KiB VRAM with cartridge-controlled mirroring.
pub struct VideoBus<'a> {
    pub cart: &'a mut Cartridge,
    pub vram: &'a mut [u8; 2048],
}

impl NesBus {
    /// Create a new bus with the given cartridge.
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            vram: [0; 2048],
            cart,
            ppu: PPU::new(),
            controllers: [Controller::new(), Controller::new()],
            dma_page: None,
        }
    }

    /// Advance the PPU one dot, lending it the video view of the bus.
    pub fn tick_ppu(&mut self) {
        let mut vbus = VideoBus {
            cart: &mut self.cart,
            vram: &mut self.vram,
        };
        self.ppu.step(&mut vbus);
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // 2 KiB work RAM, mirrored across the whole window
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers, mirrored every 8 bytes
            0x2000..=0x3FFF => {
                let reg = (addr & 0x0007) as u8;
                let mut vbus = VideoBus {
                    cart: &mut self.cart,
                    vram: &mut self.vram,
                };
                self.ppu.read_register(reg, &mut vbus)
            }
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),
            // APU and $4014 are write-only or unimplemented: open bus
            0x4000..=0x401F => 0x40,
            // Cartridge space
            0x4020..=0xFFFF => self.cart.read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => {
                let reg = (addr & 0x0007) as u8;
                let mut vbus = VideoBus {
                    cart: &mut self.cart,
                    vram: &mut self.vram,
                };
                self.ppu.write_register(reg, data, &mut vbus);
            }
            // OAM DMA trigger: latch the source page for the CPU to service
            0x4014 => self.dma_page = Some(data),
            // Strobe goes to both controllers
            0x4016 => {
                self.controllers[0].write(data);
                self.controllers[1].write(data);
            }
            // APU and disabled I/O: no-op
            0x4000..=0x4013 | 0x4015 | 0x4017..=0x401F => {}
            // NROM has no registers; PRG ROM is read-only
            0x4020..=0xFFFF => {
                log::warn!("ignored write of ${:02X} to cartridge space ${:04X}", data, addr);
            }
        }
    }

    fn poll_nmi(&mut self) -> bool {
        if self.ppu.nmi {
            self.ppu.nmi = false;
            true
        } else {
            false
        }
    }

    fn poll_dma(&mut self) -> Option<u8> {
        self.dma_page.take()
    }

    fn push_oam(&mut self, data: u8) {
        self.ppu.write_oam_data(data);
    }
}

impl VideoBus<'_> {
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => self.cart.read(addr & 0x1FFF),
            // $3000-$3EFF mirrors the nametables
            0x2000..=0x3EFF => self.vram[self.nametable_index(addr)],
            // Palette addresses are resolved by the PPU before they get here
            _ => 0,
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        match addr & 0x3FFF {
            // CHR RAM if the cartridge has it; writes to CHR ROM are dropped
            0x0000..=0x1FFF => self.cart.write(addr & 0x1FFF, data),
            0x2000..=0x3EFF => {
                let index = self.nametable_index(addr);
                self.vram[index] = data;
            }
            _ => {}
        }
    }

    /// Map a nametable address ($2000-$3EFF) onto the 2 KiB VRAM according to
    /// the cartridge's mirroring. Four-screen folds onto the same 2 KiB since
    /// NROM boards carry no extra VRAM.
    fn nametable_index(&self, addr: u16) -> usize {
        let addr = addr & 0x0FFF;
        let table = addr / 0x400;
        let offset = (addr & 0x3FF) as usize;

        use crate::cartridge::mapper::Mirroring;
        let bank = match self.cart.mirroring() {
            Mirroring::Vertical | Mirroring::FourScreen => match table {
                0 | 2 => 0,
                _ => 1,
            },
            Mirroring::Horizontal => match table {
                0 | 1 => 0,
                _ => 1,
            },
        };
        bank * 0x400 + offset
    }
}
