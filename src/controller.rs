//! NES controller input handling.
//!
//! Standard controller shift-register protocol: write $01 then $00 to $4016
//! to latch the current state into both ports; reads of $4016/$4017 then
//! shift out one bit per read (A, B, Select, Start, Up, Down, Left, Right).

/// One controller port.
pub struct Controller {
    /// Current button states: bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    pub state: u8,
    /// Shift register: latched from `state` on strobe; shifted out LSB-first on read.
    pub shift: u8,
}

impl Controller {
    /// Create a controller with no buttons pressed.
    pub fn new() -> Self {
        Controller { state: 0, shift: 0 }
    }

    /// Read one button bit. Returns the LSB of the shift register OR'd with
    /// the open-bus value ($40); each read advances to the next button.
    pub fn read(&mut self) -> u8 {
        let bit = self.shift & 1;
        self.shift >>= 1;
        bit | 0x40
    }

    /// Strobe write. While bit 0 is 1, the shift register tracks the current
    /// button state; dropping it to 0 freezes the latch for reading.
    pub fn write(&mut self, data: u8) {
        if data & 1 != 0 {
            self.shift = self.state;
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
