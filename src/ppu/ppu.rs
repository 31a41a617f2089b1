//! NES PPU (Picture Processing Unit) implementation.
//!
//! Dot-stepped state machine: 341 dots per scanline, 262 scanlines per frame
//! with the pre-render line counted as -1. Vblank is raised at dot 1 of
//! scanline 241 (NMI if enabled) and cleared on the pre-render line; visible
//! dots run the background pipeline into the frame buffer. CPU-facing
//! registers $2000–$2007 carry their documented side effects.

use crate::bus::VideoBus;
use crate::ppu::frame::{Frame, MASTER_PALETTE};

/// PPU state: registers, counters, OAM, palette RAM, and the frame sink.
/// Nametable VRAM and pattern tables are reached through [`VideoBus`].
pub struct PPU {
    pub ctrl: u8,
    pub mask: u8,
    /// Vblank flag (PPUSTATUS bit 7); cleared by reading $2002.
    pub vblank: bool,
    /// NMI latch, consumed by the CPU at an instruction boundary.
    pub nmi: bool,
    pub oam_addr: u8,
    /// 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or DMA.
    pub oam: [u8; 256],
    /// Palette RAM $3F00–$3F1F, with the backdrop-mirror fold on access.
    pub palette: [u8; 32],
    /// 15-bit VRAM address latch for $2006/$2007.
    pub vram_addr: u16,
    /// First/second-write toggle shared by $2005 and $2006.
    pub write_toggle: bool,
    pub scroll_x: u8,
    pub scroll_y: u8,
    /// Dot within the scanline, 0-340.
    pub cycle: u16,
    /// Scanline, -1 (pre-render) through 260.
    pub scanline: i16,
    /// Set when a frame completes (counters wrap to the pre-render line);
    /// cleared by the consumer.
    pub frame_ready: bool,
    /// Frame parity, toggled at each wrap.
    pub odd_frame: bool,
    pub frame: Frame,
}

impl PPU {
    /// Create PPU in initial state (pre-render scanline -1, dot 0).
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            vblank: false,
            nmi: false,
            oam_addr: 0,
            oam: [0; 256],
            palette: [0; 32],
            vram_addr: 0,
            write_toggle: false,
            scroll_x: 0,
            scroll_y: 0,
            cycle: 0,
            scanline: -1,
            frame_ready: false,
            odd_frame: false,
            frame: Frame::new(),
        }
    }

    /// Advance one dot: handle the current (dot, scanline) position, then
    /// bump the counters.
    pub fn step(&mut self, vbus: &mut VideoBus) {
        if self.scanline == 241 && self.cycle == 1 {
            self.vblank = true;
            if self.ctrl & 0x80 != 0 {
                self.nmi = true;
            }
        }
        if self.scanline == -1 && self.cycle == 1 {
            self.vblank = false;
            self.nmi = false;
        }

        if (0..240).contains(&self.scanline) && self.cycle < 256 {
            self.render_dot(vbus);
        }

        self.cycle += 1;
        if self.cycle > 340 {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > 260 {
                self.scanline = -1;
                self.frame_ready = true;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// CPU read of register `reg` (0-7, pre-masked by the bus). Reads of
    /// write-only registers and out-of-range indices abort the run.
    pub fn read_register(&mut self, reg: u8, vbus: &mut VideoBus) -> u8 {
        match reg {
            2 => self.read_status(),
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_data(vbus),
            0 | 1 | 3 | 5 | 6 => panic!(
                "read of write-only PPU register {} (dot {}, scanline {})",
                reg, self.cycle, self.scanline
            ),
            _ => panic!(
                "PPU register index {} out of range (dot {}, scanline {})",
                reg, self.cycle, self.scanline
            ),
        }
    }

    /// CPU write to register `reg` (0-7). Writing the read-only status
    /// register aborts the run.
    pub fn write_register(&mut self, reg: u8, data: u8, vbus: &mut VideoBus) {
        match reg {
            0 => self.ctrl = data,
            1 => self.mask = data,
            3 => self.oam_addr = data,
            4 => self.write_oam_data(data),
            5 => self.write_scroll(data),
            6 => self.write_addr(data),
            7 => self.write_data(vbus, data),
            2 => panic!(
                "write to read-only PPUSTATUS (dot {}, scanline {})",
                self.cycle, self.scanline
            ),
            _ => panic!(
                "PPU register index {} out of range (dot {}, scanline {})",
                reg, self.cycle, self.scanline
            ),
        }
    }

    /// Read PPUSTATUS ($2002): returns the vblank bit, then clears it, the
    /// NMI latch, and the shared write toggle.
    pub fn read_status(&mut self) -> u8 {
        let status = if self.vblank { 0x80 } else { 0x00 };
        self.vblank = false;
        self.nmi = false;
        self.write_toggle = false;
        status
    }

    /// Write OAMDATA ($2004): store and post-increment OAMADDR (wrapping).
    /// Also the sink for DMA pushes.
    pub fn write_oam_data(&mut self, data: u8) {
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Write PPUSCROLL ($2005): X offset on the first write, Y on the second.
    fn write_scroll(&mut self, data: u8) {
        if !self.write_toggle {
            self.scroll_x = data;
        } else {
            self.scroll_y = data;
        }
        self.write_toggle = !self.write_toggle;
    }

    /// Write PPUADDR ($2006): high 6 bits first, low byte second, sharing the
    /// toggle with $2005. The latch is 15 bits wide.
    fn write_addr(&mut self, data: u8) {
        if !self.write_toggle {
            self.vram_addr = ((data & 0x3F) as u16) << 8 | (self.vram_addr & 0x00FF);
        } else {
            self.vram_addr = (self.vram_addr & 0x7F00) | data as u16;
        }
        self.write_toggle = !self.write_toggle;
    }

    /// Read PPUDATA ($2007); auto-increments the VRAM address by 1 or 32.
    fn read_data(&mut self, vbus: &mut VideoBus) -> u8 {
        let addr = self.vram_addr & 0x3FFF;
        let data = match addr {
            0x3F00..=0x3FFF => self.palette[Self::palette_index(addr)],
            _ => vbus.read(addr),
        };
        self.increment_addr();
        data
    }

    /// Write PPUDATA ($2007); auto-increments the VRAM address by 1 or 32.
    fn write_data(&mut self, vbus: &mut VideoBus, data: u8) {
        let addr = self.vram_addr & 0x3FFF;
        match addr {
            // Upper two bits are not stored by palette RAM
            0x3F00..=0x3FFF => self.palette[Self::palette_index(addr)] = data & 0x3F,
            _ => vbus.write(addr, data),
        }
        self.increment_addr();
    }

    fn increment_addr(&mut self) {
        let inc = if self.ctrl & 0x04 != 0 { 32 } else { 1 };
        self.vram_addr = self.vram_addr.wrapping_add(inc) & 0x7FFF;
    }

    /// Resolve a palette address ($3F00–$3FFF mirrors) to the 32-byte index.
    /// $3F10/$3F14/$3F18/$3F1C alias the backdrop entries at $3F00/04/08/0C.
    fn palette_index(addr: u16) -> usize {
        let i = (addr & 0x1F) as usize;
        if i >= 16 && i % 4 == 0 { i - 16 } else { i }
    }

    /// Produce the background pixel for the current visible dot: nametable
    /// byte, attribute quadrant, pattern bit-planes, palette entry, RGBA.
    fn render_dot(&mut self, vbus: &mut VideoBus) {
        let x = self.cycle as u32;
        let y = self.scanline as u32;

        let base_nt = (self.ctrl & 0x03) as u32;
        let world_x = (x + self.scroll_x as u32 + (base_nt & 1) * 256) % 512;
        let world_y = (y + self.scroll_y as u32 + (base_nt >> 1) * 240) % 480;

        let nt = world_x / 256 + (world_y / 240) * 2;
        let tile_x = (world_x % 256) / 8;
        let tile_y = (world_y % 240) / 8;
        let nt_base = 0x2000 + nt as u16 * 0x400;

        let tile_id = vbus.read(nt_base + (tile_y * 32 + tile_x) as u16);
        let attr = vbus.read(nt_base + 0x3C0 + (tile_y / 4 * 8 + tile_x / 4) as u16);
        // Attribute byte holds four 2x2-tile quadrants, two bits each
        let shift = ((tile_y & 2) << 1 | (tile_x & 2)) as u8;
        let palette_group = (attr >> shift) & 0x03;

        let pattern_base = if self.ctrl & 0x10 != 0 { 0x1000 } else { 0x0000 };
        let row = (world_y % 8) as u16;
        let tile_addr = pattern_base + tile_id as u16 * 16 + row;
        let lo = vbus.read(tile_addr);
        let hi = vbus.read(tile_addr + 8);
        let bit = 7 - (world_x % 8);
        let pixel = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);

        // Pixel value 0 always shows the backdrop color
        let palette_addr = if pixel == 0 {
            0x3F00
        } else {
            0x3F00 + palette_group as u16 * 4 + pixel as u16
        };
        let color_idx = self.palette[Self::palette_index(palette_addr)] & 0x3F;
        self.frame
            .set_pixel(x as usize, y as usize, MASTER_PALETTE[color_idx as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::VideoBus;
    use crate::cartridge::cartridge::Cartridge;

    fn test_cart() -> Cartridge {
        let mut image = vec![0u8; 16 + 16 * 1024 + 8 * 1024];
        image[0..4].copy_from_slice(b"NES\x1A");
        image[4] = 1;
        image[5] = 0; // CHR RAM so tests can write pattern data
        image[6] = 0x01;
        Cartridge::from_bytes(&image).unwrap()
    }

    struct Fixture {
        ppu: PPU,
        cart: Cartridge,
        vram: [u8; 2048],
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                ppu: PPU::new(),
                cart: test_cart(),
                vram: [0; 2048],
            }
        }

        fn step(&mut self) {
            let mut vbus = VideoBus {
                cart: &mut self.cart,
                vram: &mut self.vram,
            };
            self.ppu.step(&mut vbus);
        }

        fn write_reg(&mut self, reg: u8, data: u8) {
            let mut vbus = VideoBus {
                cart: &mut self.cart,
                vram: &mut self.vram,
            };
            self.ppu.write_register(reg, data, &mut vbus);
        }

        fn read_reg(&mut self, reg: u8) -> u8 {
            let mut vbus = VideoBus {
                cart: &mut self.cart,
                vram: &mut self.vram,
            };
            self.ppu.read_register(reg, &mut vbus)
        }
    }

    #[test]
    fn vblank_raises_at_dot_1_of_scanline_241() {
        let mut f = Fixture::new();
        while !f.ppu.vblank {
            f.step();
        }
        // Position just after the raising dot was processed
        assert_eq!((f.ppu.scanline, f.ppu.cycle), (241, 2));
    }

    #[test]
    fn nmi_latches_only_when_enabled() {
        let mut f = Fixture::new();
        while !f.ppu.vblank {
            f.step();
        }
        assert!(!f.ppu.nmi);

        let mut f = Fixture::new();
        f.write_reg(0, 0x80);
        while !f.ppu.vblank {
            f.step();
        }
        assert!(f.ppu.nmi);
    }

    #[test]
    fn frame_ready_and_parity_at_wrap() {
        let mut f = Fixture::new();
        while !f.ppu.frame_ready {
            f.step();
        }
        assert_eq!((f.ppu.scanline, f.ppu.cycle), (-1, 0));
        assert!(f.ppu.odd_frame);

        f.ppu.frame_ready = false;
        while !f.ppu.frame_ready {
            f.step();
        }
        assert!(!f.ppu.odd_frame);
    }

    #[test]
    fn pre_render_line_clears_vblank_and_nmi() {
        let mut f = Fixture::new();
        f.write_reg(0, 0x80);
        while !f.ppu.vblank {
            f.step();
        }
        while f.ppu.vblank {
            f.step();
        }
        assert!(!f.ppu.nmi);
        assert_eq!((f.ppu.scanline, f.ppu.cycle), (-1, 2));
    }

    #[test]
    fn status_read_clears_vblank_and_write_toggle() {
        let mut f = Fixture::new();
        f.ppu.vblank = true;
        f.ppu.nmi = true;
        f.write_reg(6, 0x20); // first write flips the toggle

        let status = f.read_reg(2);
        assert_eq!(status & 0x80, 0x80);
        assert!(!f.ppu.nmi);
        assert!(!f.ppu.write_toggle);
        assert_eq!(f.read_reg(2) & 0x80, 0);
    }

    #[test]
    fn scroll_and_addr_share_the_write_toggle() {
        let mut f = Fixture::new();
        f.write_reg(5, 0x12); // first write: X scroll
        f.write_reg(6, 0x3C); // toggle is set, so this lands as the LOW byte
        assert_eq!(f.ppu.scroll_x, 0x12);
        assert_eq!(f.ppu.vram_addr & 0x00FF, 0x3C);
        assert!(!f.ppu.write_toggle);
    }

    #[test]
    fn addr_writes_high_then_low_masked_to_15_bits() {
        let mut f = Fixture::new();
        f.write_reg(6, 0xFF); // top bits beyond the latch width drop
        f.write_reg(6, 0x10);
        assert_eq!(f.ppu.vram_addr, 0x3F10);
    }

    #[test]
    fn data_port_increments_by_1_or_32() {
        let mut f = Fixture::new();
        f.write_reg(6, 0x20);
        f.write_reg(6, 0x00);
        f.write_reg(7, 0xAA);
        assert_eq!(f.ppu.vram_addr, 0x2001);

        f.write_reg(0, 0x04); // increment mode 32
        f.write_reg(7, 0xBB);
        assert_eq!(f.ppu.vram_addr, 0x2021);
    }

    #[test]
    fn oam_data_write_increments_address_read_does_not() {
        let mut f = Fixture::new();
        f.write_reg(3, 0xFE);
        f.write_reg(4, 0x11);
        f.write_reg(4, 0x22);
        assert_eq!(f.ppu.oam[0xFE], 0x11);
        assert_eq!(f.ppu.oam[0xFF], 0x22);
        // OAMADDR wrapped to 0
        assert_eq!(f.ppu.oam_addr, 0x00);

        f.write_reg(3, 0xFE);
        assert_eq!(f.read_reg(4), 0x11);
        assert_eq!(f.read_reg(4), 0x11); // no increment on read
    }

    #[test]
    fn palette_backdrop_mirrors() {
        let mut f = Fixture::new();
        f.write_reg(6, 0x3F);
        f.write_reg(6, 0x10);
        f.write_reg(7, 0x2A); // $3F10 aliases $3F00

        f.write_reg(6, 0x3F);
        f.write_reg(6, 0x00);
        assert_eq!(f.read_reg(7), 0x2A);
    }

    #[test]
    fn background_pipeline_draws_a_tile_row() {
        let mut f = Fixture::new();
        // Tile 1, row 0: both bit-planes set -> pixel value 3
        f.write_reg(6, 0x00);
        f.write_reg(6, 0x10); // pattern $0010 = tile 1 plane 0
        f.write_reg(7, 0xFF);
        f.write_reg(6, 0x00);
        f.write_reg(6, 0x18); // plane 1
        f.write_reg(7, 0xFF);

        // Nametable entry (0,0) = tile 1
        f.write_reg(6, 0x20);
        f.write_reg(6, 0x00);
        f.write_reg(7, 0x01);

        // Palette: group 0 entry 3 = master index 0x20 (white)
        f.write_reg(6, 0x3F);
        f.write_reg(6, 0x03);
        f.write_reg(7, 0x20);

        // Run to the end of scanline 0
        while !(f.ppu.scanline == 1 && f.ppu.cycle == 0) {
            f.step();
        }
        assert_eq!(f.ppu.frame.pixel(0, 0), [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(f.ppu.frame.pixel(7, 0), [0xFF, 0xFF, 0xFF, 0xFF]);
        // Tile (1,0) is tile 0 (blank): backdrop color 0
        let backdrop = MASTER_PALETTE[0];
        assert_eq!(
            f.ppu.frame.pixel(8, 0),
            [
                (backdrop >> 16) as u8,
                (backdrop >> 8) as u8,
                backdrop as u8,
                0xFF
            ]
        );
    }

    #[test]
    #[should_panic(expected = "write-only")]
    fn reading_a_write_only_register_aborts() {
        let mut f = Fixture::new();
        f.read_reg(0);
    }

    #[test]
    #[should_panic(expected = "read-only")]
    fn writing_status_aborts() {
        let mut f = Fixture::new();
        f.write_reg(2, 0x00);
    }
}
