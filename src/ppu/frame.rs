//! 256×240 RGBA8 frame buffer and the NES master palette.

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

/// NES 2C02 64-color master palette (0xRRGGBB). Palette RAM stores indices
/// into this table.
pub const MASTER_PALETTE: [u32; 64] = [
    0x757575, 0x271B8F, 0x0000AB, 0x47009F, 0x8F0077, 0xAB0013, 0xA70000, 0x7F0B00,
    0x432F00, 0x004700, 0x005100, 0x003F17, 0x1B3F5F, 0x000000, 0x000000, 0x000000,
    0xBCBCBC, 0x0073EF, 0x233BEF, 0x8300F3, 0xBF00BF, 0xE7005B, 0xDB2B00, 0xCB4F0F,
    0x8B7300, 0x009700, 0x00AB00, 0x00933B, 0x00838B, 0x000000, 0x000000, 0x000000,
    0xFFFFFF, 0x3FBFFF, 0x5F97FF, 0xA78BFD, 0xF77BFF, 0xFF77B7, 0xFF7763, 0xFF9B3B,
    0xF3BF3F, 0x83D313, 0x4FDF4B, 0x58F898, 0x00EBDB, 0x000000, 0x000000, 0x000000,
    0xFFFFFF, 0xABE7FF, 0xC7D7FF, 0xD7CBFF, 0xFFC7FF, 0xFFC7DB, 0xFFBFB3, 0xFFDBAB,
    0xFFE7A3, 0xE3FFA3, 0xABF3BF, 0xB3FFCF, 0x9FFFF3, 0x000000, 0x000000, 0x000000,
];

/// One video frame: RGBA8, row-major, top-left origin.
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            data: vec![0; WIDTH * HEIGHT * 4],
        }
    }

    /// Write one pixel from a packed 0xRRGGBB color; alpha is always opaque.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: u32) {
        let i = (y * WIDTH + x) * 4;
        self.data[i] = (rgb >> 16) as u8;
        self.data[i + 1] = (rgb >> 8) as u8;
        self.data[i + 2] = rgb as u8;
        self.data[i + 3] = 0xFF;
    }

    /// RGBA bytes of one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * WIDTH + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Raw RGBA8 buffer, `WIDTH * HEIGHT * 4` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Repack into 0RGB words for display backends that want them (minifb).
    pub fn to_0rgb(&self) -> Vec<u32> {
        self.data
            .chunks_exact(4)
            .map(|px| (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32)
            .collect()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
