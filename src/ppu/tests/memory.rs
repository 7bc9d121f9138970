// Internal memory map tests

use super::{ppu_with_chr_ram, write_vram};
use crate::cartridge::Mirroring;

#[test]
fn test_horizontal_mirroring_pairs() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);

    ppu.write_memory(0x2000, 0x11);
    assert_eq!(ppu.read_memory(0x2400), 0x11, "$2000 and $2400 share a bank");

    ppu.write_memory(0x2800, 0x22);
    assert_eq!(ppu.read_memory(0x2C00), 0x22, "$2800 and $2C00 share a bank");

    assert_ne!(
        ppu.read_memory(0x2000),
        ppu.read_memory(0x2800),
        "the two banks are distinct"
    );
}

#[test]
fn test_vertical_mirroring_pairs() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Vertical);

    ppu.write_memory(0x2000, 0x33);
    assert_eq!(ppu.read_memory(0x2800), 0x33, "$2000 and $2800 share a bank");

    ppu.write_memory(0x2400, 0x44);
    assert_eq!(ppu.read_memory(0x2C00), 0x44, "$2400 and $2C00 share a bank");
}

#[test]
fn test_nametable_space_masks_to_14_bits() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.write_memory(0x2005, 0x66);
    assert_eq!(
        ppu.read_memory(0x3005),
        0x66,
        "$3000-$3EFF mirrors $2000-$2EFF"
    );
}

#[test]
fn test_pattern_tables_reach_chr_ram() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.write_memory(0x1234, 0x5A);
    assert_eq!(ppu.read_memory(0x1234), 0x5A);
}

#[test]
fn test_palette_aliases_both_directions() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);

    for (alias, base) in [(0x3F10u16, 0x3F00u16), (0x3F14, 0x3F04), (0x3F18, 0x3F08), (0x3F1C, 0x3F0C)] {
        ppu.write_memory(alias, 0x2A);
        assert_eq!(ppu.read_memory(base), 0x2A, "write {alias:04X} read {base:04X}");

        ppu.write_memory(base, 0x15);
        assert_eq!(ppu.read_memory(alias), 0x15, "write {base:04X} read {alias:04X}");
    }
}

#[test]
fn test_non_aliased_sprite_palette_entries_are_distinct() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.write_memory(0x3F01, 0x01);
    ppu.write_memory(0x3F11, 0x02);
    assert_eq!(ppu.read_memory(0x3F01), 0x01, "$3F11 is its own byte");
    assert_eq!(ppu.read_memory(0x3F11), 0x02);
}

#[test]
fn test_palette_mirror_through_register_protocol() {
    // End-to-end: write $3F10 through ADDR/DATA, read back at $3F00
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    write_vram(&mut ppu, 0x3F10, 0x11);

    ppu.write_register(6, 0x3F);
    ppu.write_register(6, 0x00);
    assert_eq!(
        ppu.read_register(7),
        0x11,
        "palette reads are immediate, not buffered"
    );
}
