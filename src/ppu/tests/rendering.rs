// Background pipeline, scroll automaton, and sprite tests

use super::super::palette;
use super::{ppu_with_chr_ram, run_frames, tick_to, write_vram};
use crate::cartridge::Mirroring;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

// ========================================
// Scroll Counter Updates
// ========================================

#[test]
fn test_coarse_x_wrap_flips_nametable() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.v = 31; // last tile column, nametable 0

    ppu.increment_coarse_x();
    assert_eq!(ppu.v & 0x001F, 0, "coarse X wraps to 0");
    assert_eq!(ppu.v & 0x0400, 0x0400, "horizontal nametable flips");
}

#[test]
fn test_fine_y_rolls_into_coarse_y() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.v = 0x7000; // fine Y = 7, coarse Y = 0

    ppu.increment_fine_y();
    assert_eq!(ppu.v & 0x7000, 0, "fine Y wraps");
    assert_eq!((ppu.v >> 5) & 0x1F, 1, "coarse Y steps");
}

#[test]
fn test_coarse_y_29_wraps_with_nametable_flip() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.v = 0x7000 | (29 << 5);

    ppu.increment_fine_y();
    assert_eq!((ppu.v >> 5) & 0x1F, 0, "row 29 wraps to 0");
    assert_eq!(ppu.v & 0x0800, 0x0800, "vertical nametable flips");
}

#[test]
fn test_coarse_y_31_wraps_without_flip() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.v = 0x7000 | (31 << 5);

    ppu.increment_fine_y();
    assert_eq!((ppu.v >> 5) & 0x1F, 0);
    assert_eq!(ppu.v & 0x0800, 0, "attribute-row wrap keeps the nametable");
}

#[test]
fn test_horizontal_copy_at_dot_257() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.write_register(1, 0x08); // rendering must be on
    ppu.t = 0x041F; // coarse X = 31, nametable X = 1
    ppu.v = 0;

    tick_to(&mut ppu, 0, 257);
    assert_eq!(ppu.v & 0x041F, 0x041F, "X bits recopied from t");
}

#[test]
fn test_vertical_copy_on_prerender() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    ppu.write_register(1, 0x08);
    ppu.t = 0x7BE0; // fine Y, nametable Y, coarse Y all set

    tick_to(&mut ppu, 261, 304);
    assert_eq!(ppu.v & 0x7BE0, 0x7BE0, "Y bits recopied from t");
}

// ========================================
// Background Output
// ========================================

/// Paint nametable 0 with tile 1, tile 1 solid color 3, palette entry set
fn solid_background(ppu: &mut crate::ppu::Ppu, color: u8) {
    // Tile 1: both bitplanes all ones -> every pixel is color 3
    for row in 0..8 {
        write_vram(ppu, 0x0010 + row, 0xFF);
        write_vram(ppu, 0x0018 + row, 0xFF);
    }
    // All of nametable 0 points at tile 1
    for offset in 0..960 {
        write_vram(ppu, 0x2000 + offset, 0x01);
    }
    // Attributes select palette 0
    for offset in 0..64 {
        write_vram(ppu, 0x23C0 + offset, 0x00);
    }
    // Background palette 0, color 3
    write_vram(ppu, 0x3F03, color);
    // Scroll home position
    ppu.write_register(6, 0x00);
    ppu.write_register(6, 0x00);
    ppu.write_register(5, 0x00);
    ppu.write_register(5, 0x00);
}

#[test]
fn test_solid_background_fills_framebuffer() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    solid_background(&mut ppu, 0x21);
    ppu.write_register(1, 0x0A); // background + left column

    run_frames(&mut ppu, 2);

    let frame = ppu.frame();
    assert_eq!(frame.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
    assert_eq!(frame[10 * SCREEN_WIDTH + 100], palette::argb(0x21));
    assert_eq!(frame[100 * SCREEN_WIDTH + 4], palette::argb(0x21));
    assert_eq!(frame[239 * SCREEN_WIDTH + 255], palette::argb(0x21));
}

#[test]
fn test_disabled_rendering_shows_backdrop() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    write_vram(&mut ppu, 0x3F00, 0x0F);

    run_frames(&mut ppu, 1);
    assert_eq!(
        ppu.frame()[120 * SCREEN_WIDTH + 128],
        palette::argb(0x0F),
        "both sources off yields the universal background"
    );
}

#[test]
fn test_left_column_clip_masks_background() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    solid_background(&mut ppu, 0x21);
    write_vram(&mut ppu, 0x3F00, 0x0F);
    ppu.write_register(1, 0x08); // background on, left column off

    run_frames(&mut ppu, 2);

    let frame = ppu.frame();
    let y = 100;
    assert_eq!(
        frame[y * SCREEN_WIDTH + 4],
        palette::argb(0x0F),
        "clipped columns show the backdrop"
    );
    assert_eq!(frame[y * SCREEN_WIDTH + 12], palette::argb(0x21));
}

// ========================================
// Sprites
// ========================================

#[test]
fn test_sprite_renders_one_line_below_oam_y() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    // Tile 2: solid color 3
    for row in 0..8 {
        write_vram(&mut ppu, 0x0020 + row, 0xFF);
        write_vram(&mut ppu, 0x0028 + row, 0xFF);
    }
    // Sprite palette 4, color 3
    write_vram(&mut ppu, 0x3F13, 0x16);
    write_vram(&mut ppu, 0x3F00, 0x0F);

    // Sprite 0 at (x=100, OAM y=50)
    ppu.write_register(3, 0x00);
    for byte in [50u8, 0x02, 0x00, 100] {
        ppu.write_register(4, byte);
    }
    ppu.write_register(1, 0x14); // sprites on + left column

    run_frames(&mut ppu, 2);

    let frame = ppu.frame();
    assert_eq!(
        frame[51 * SCREEN_WIDTH + 100],
        palette::argb(0x16),
        "sprite pixels start at OAM Y + 1"
    );
    assert_eq!(
        frame[50 * SCREEN_WIDTH + 100],
        palette::argb(0x0F),
        "the OAM Y line itself is empty"
    );
}

#[test]
fn test_sprite_zero_hit_sets_status_bit() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    solid_background(&mut ppu, 0x21);
    for row in 0..8 {
        write_vram(&mut ppu, 0x0020 + row, 0xFF);
        write_vram(&mut ppu, 0x0028 + row, 0xFF);
    }
    ppu.write_register(3, 0x00);
    for byte in [50u8, 0x02, 0x00, 100] {
        ppu.write_register(4, byte);
    }
    ppu.write_register(1, 0x1E); // background + sprites + both left columns

    // The hit lands on scanline 51; check before VBlank clears nothing
    tick_to(&mut ppu, 60, 0);
    assert_ne!(ppu.status & 0x40, 0, "sprite 0 over opaque background hits");
}

#[test]
fn test_no_sprite_zero_hit_without_background() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    for row in 0..8 {
        write_vram(&mut ppu, 0x0020 + row, 0xFF);
        write_vram(&mut ppu, 0x0028 + row, 0xFF);
    }
    ppu.write_register(3, 0x00);
    for byte in [50u8, 0x02, 0x00, 100] {
        ppu.write_register(4, byte);
    }
    ppu.write_register(1, 0x14); // sprites only

    tick_to(&mut ppu, 60, 0);
    assert_eq!(ppu.status & 0x40, 0, "no hit without an opaque background");
}

#[test]
fn test_sprite_overflow_on_ninth_candidate() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    // Nine sprites share scanline coverage
    ppu.write_register(3, 0x00);
    for sprite in 0..9u8 {
        for byte in [80u8, 0x02, 0x00, sprite * 16] {
            ppu.write_register(4, byte);
        }
    }
    ppu.write_register(1, 0x10); // sprites on

    tick_to(&mut ppu, 90, 0);
    assert_ne!(ppu.status & 0x20, 0, "ninth candidate sets overflow");
}

#[test]
fn test_behind_background_priority() {
    let mut ppu = ppu_with_chr_ram(Mirroring::Horizontal);
    solid_background(&mut ppu, 0x21);
    for row in 0..8 {
        write_vram(&mut ppu, 0x0020 + row, 0xFF);
        write_vram(&mut ppu, 0x0028 + row, 0xFF);
    }
    write_vram(&mut ppu, 0x3F13, 0x16);

    // Sprite 1 (not sprite 0) with the behind-background attribute bit
    ppu.write_register(3, 0x04);
    for byte in [50u8, 0x02, 0x20, 100] {
        ppu.write_register(4, byte);
    }
    ppu.write_register(1, 0x1E);

    run_frames(&mut ppu, 2);
    assert_eq!(
        ppu.frame()[51 * SCREEN_WIDTH + 100],
        palette::argb(0x21),
        "back-priority sprite loses to opaque background"
    );
}
