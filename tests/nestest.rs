// CPU conformance against the nestest golden log
//
// Runs the well-known validation ROM in automation mode (PC forced to
// $C000) and compares every trace line - registers, PPU position, and
// cycle count included - against the reference log. Both files live under
// tests/roms/: nestest.nes and nestest.log.

mod common;

use common::{load_rom, rom_available};
use std::fs;
use std::path::Path;

/// Instructions covered by the golden log
const TRACE_LINES: usize = 8991;

#[test]
#[ignore] // needs tests/roms/nestest.nes; run with: cargo test -- --ignored
fn nestest_trace_matches_golden_log() {
    if !rom_available("nestest.nes") || !rom_available("nestest.log") {
        panic!("place nestest.nes and nestest.log under tests/roms/");
    }

    let golden = fs::read_to_string(Path::new(common::ROM_DIR).join("nestest.log"))
        .expect("golden log reads");
    let golden_lines: Vec<&str> = golden.lines().collect();

    let mut emulator = load_rom("nestest.nes");

    // Automation mode: execution starts at $C000 instead of the reset
    // vector, with the post-reset register file the log assumes
    emulator.cpu_mut().pc = 0xC000;

    let mut mismatches = 0;
    for (line_no, golden_line) in golden_lines.iter().enumerate().take(TRACE_LINES) {
        let trace_line = emulator.cpu().trace(emulator.bus());

        if trace_line.trim_end() != golden_line.trim_end() {
            mismatches += 1;
            if mismatches <= 10 {
                eprintln!("line {}:", line_no + 1);
                eprintln!("  expected: {}", golden_line);
                eprintln!("  got:      {}", trace_line);
            }
        }

        emulator.step_instruction();

        // The ROM reports failures through $02/$03
        let code_lo = emulator.bus().peek(0x0002);
        let code_hi = emulator.bus().peek(0x0003);
        assert_eq!(
            (code_lo, code_hi),
            (0, 0),
            "validation ROM flagged an error at line {}",
            line_no + 1
        );
    }

    assert_eq!(mismatches, 0, "{} trace lines diverged", mismatches);
}
