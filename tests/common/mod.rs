// Shared utilities for ROM-driven integration tests
//
// These harnesses run published test ROMs against the core. The ROMs are
// not distributed with the repository; drop them under tests/roms/ and run
// the ignored tests with `cargo test -- --ignored`.

#![allow(dead_code)]

use famicore::Emulator;
use std::path::Path;

/// Directory the harnesses look for test ROMs in
pub const ROM_DIR: &str = "tests/roms";

/// Upper bound on instructions before a harness declares a hang
pub const MAX_INSTRUCTIONS: u64 = 10_000_000;

/// Outcome of running a test ROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomResult {
    Passed,
    Failed(String),
    Timeout,
}

/// Whether a ROM (and optionally its golden log) is available
pub fn rom_available(name: &str) -> bool {
    Path::new(ROM_DIR).join(name).exists()
}

/// Load an emulator with a ROM from the test directory
pub fn load_rom(name: &str) -> Emulator {
    let path = Path::new(ROM_DIR).join(name);
    let mut emulator = Emulator::new();
    emulator
        .load_rom(&path)
        .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e));
    emulator
}

/// Run until the zero-page result bytes settle, blargg-style
///
/// Many published test ROMs report through $6000 (status) and $6004
/// (message); this simplified runner watches the $02/$03 pair the CPU
/// validation ROM uses in automation mode.
pub fn run_until_result(emulator: &mut Emulator) -> RomResult {
    for _ in 0..MAX_INSTRUCTIONS {
        emulator.step_instruction();

        let code_lo = emulator.bus().peek(0x0002);
        let code_hi = emulator.bus().peek(0x0003);
        if code_lo != 0 || code_hi != 0 {
            return RomResult::Failed(format!("error code {:02X}{:02X}", code_hi, code_lo));
        }
    }
    RomResult::Timeout
}
