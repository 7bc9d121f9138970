// PPU test suite

mod memory;
mod rendering;

use super::Ppu;
use crate::cartridge::{mappers, Cartridge, Mirroring};
use std::cell::RefCell;
use std::rc::Rc;

/// PPU wired to an NROM cartridge with writable CHR-RAM
pub(super) fn ppu_with_chr_ram(mirroring: Mirroring) -> Ppu {
    let cartridge = Cartridge {
        prg_rom: vec![0xEA; 16 * 1024],
        chr_mem: vec![0; 8 * 1024],
        chr_is_ram: true,
        prg_ram: vec![0; 8 * 1024],
        mapper_id: 0,
        mirroring,
        has_battery: false,
    };
    let mapper = mappers::create_mapper(cartridge).expect("NROM is supported");

    let mut ppu = Ppu::new();
    ppu.attach_mapper(Rc::new(RefCell::new(mapper)));
    ppu
}

/// Tick until the PPU sits at the given position
pub(super) fn tick_to(ppu: &mut Ppu, scanline: u16, dot: u16) {
    // Bounded by two frames so a broken sequencer fails loudly
    for _ in 0..2 * 341 * 262 {
        if ppu.scanline() == scanline && ppu.dot() == dot {
            return;
        }
        ppu.tick();
    }
    panic!("PPU never reached ({}, {})", scanline, dot);
}

/// Run complete frames, returning after the nth frame-ready signal
pub(super) fn run_frames(ppu: &mut Ppu, frames: u32) {
    for _ in 0..frames {
        for _ in 0..2 * 341 * 262 {
            if ppu.take_frame_ready() {
                break;
            }
            ppu.tick();
        }
    }
}

/// Write one byte through the ADDR/DATA register protocol
pub(super) fn write_vram(ppu: &mut Ppu, addr: u16, data: u8) {
    ppu.write_register(6, (addr >> 8) as u8);
    ppu.write_register(6, (addr & 0xFF) as u8);
    ppu.write_register(7, data);
}
