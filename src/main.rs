//! NES emulator entry point.
//!
//! Loads a cartridge and runs the console with a display window.
//! Usage: famicore path/to/game.nes

use std::env;
use std::process;
use std::time::{Duration, Instant};

use famicore::system::Nes;
use minifb::{Key, Window, WindowOptions};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

fn main() {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: famicore <rom.nes>");
            process::exit(2);
        }
    };

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            process::exit(1);
        }
    };
    let mut nes = match Nes::load_cartridge(&data) {
        Ok(nes) => nes,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            process::exit(1);
        }
    };
    nes.power_on();

    let mut window = Window::new(
        "famicore",
        256,
        240,
        WindowOptions {
            resize: true,
            scale: minifb::Scale::FitScreen,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )
    .expect("Failed to create window");

    window.set_target_fps(60);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        nes.set_controller(0, read_buttons(&window));

        let frame = nes.frame();
        window
            .update_with_buffer(&frame.to_0rgb(), 256, 240)
            .expect("Failed to update window");

        // Pace to ~60 fps so we don't burn CPU (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
}

/// Keyboard mapping: Z/X = A/B, RShift = Select, Enter = Start, arrows = D-pad.
fn read_buttons(window: &Window) -> u8 {
    let mut state = 0u8;
    let keys = [
        (Key::Z, 0),
        (Key::X, 1),
        (Key::RightShift, 2),
        (Key::Enter, 3),
        (Key::Up, 4),
        (Key::Down, 5),
        (Key::Left, 6),
        (Key::Right, 7),
    ];
    for (key, bit) in keys {
        if window.is_key_down(key) {
            state |= 1 << bit;
        }
    }
    state
}
