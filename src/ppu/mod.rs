// PPU module - Picture Processing Unit (2C02) implementation
//
// A dot-sequenced PPU: `tick` advances exactly one dot of the 341 x 262
// NTSC frame and performs whatever that dot does on hardware - background
// fetches, scroll counter updates, sprite evaluation, pixel composition,
// VBlank signaling.
//
// # Frame geometry
//
// - Scanlines 0-239: visible, pixels composite to the framebuffer
// - Scanline 240: idle
// - Scanlines 241-260: VBlank; the flag and NMI rise at (241, 1)
// - Scanline 261: pre-render; flags clear at dot 1, vertical scroll
//   recopies during dots 280-304, and one dot is skipped on odd frames
//   when rendering is enabled
//
// # Register map (mirrored every 8 bytes through $2000-$3FFF)
//
// | Offset | Name      | Access  |
// |--------|-----------|---------|
// | 0      | CTRL      | write   |
// | 1      | MASK      | write   |
// | 2      | STATUS    | read    |
// | 3      | OAM ADDR  | write   |
// | 4      | OAM DATA  | r/w     |
// | 5      | SCROLL    | write x2|
// | 6      | ADDR      | write x2|
// | 7      | DATA      | r/w     |

mod constants;
mod memory;
pub mod palette;
mod registers;
mod rendering;

pub use constants::{SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::cartridge::{Mapper, Mirroring};
use constants::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// One of the eight sprite slots filled for the upcoming scanline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub(crate) struct SpriteSlot {
    /// Pattern bitplanes, bit-reversed when the sprite is h-flipped
    pattern_lo: u8,
    pattern_hi: u8,
    /// Screen X of the sprite's left edge
    x: u8,
    /// Attribute byte (palette, priority, flips)
    attr: u8,
    /// Original OAM index, for sprite-0 hit detection
    index: u8,
    /// OAM Y coordinate, kept for the pattern fetch
    y: u8,
    /// OAM tile index
    tile: u8,
}

/// PPU structure holding registers, memories, and pipeline state
pub struct Ppu {
    // ========================================
    // Registers
    // ========================================
    /// $2000 CTRL: NMI output, sprite size, pattern bases, increment mode
    pub(crate) ctrl: u8,
    /// $2001 MASK: rendering enables, left-column enables, emphasis
    pub(crate) mask: u8,
    /// $2002 STATUS: VBlank, sprite 0 hit, overflow (bits 7-5)
    pub(crate) status: u8,
    /// $2003 OAM address
    pub(crate) oam_addr: u8,

    // ========================================
    // Scroll / Address Automaton (loopy v/t/x/w)
    // ========================================
    /// Current VRAM address (15 bits); also the live scroll position
    pub(crate) v: u16,
    /// Temporary VRAM address: the top-left scroll the registers describe
    pub(crate) t: u16,
    /// Fine X scroll (3 bits)
    pub(crate) fine_x: u8,
    /// Shared write toggle for SCROLL and ADDR
    pub(crate) write_latch: bool,
    /// $2007 read buffer
    pub(crate) read_buffer: u8,

    // ========================================
    // Memories
    // ========================================
    /// 2KB of nametable RAM, mapped through the cartridge's mirroring
    pub(crate) nametables: [u8; NAMETABLE_SIZE * 2],
    /// 32 bytes of palette RAM with the $3F10/$14/$18/$1C aliases
    pub(crate) palette_ram: [u8; PALETTE_SIZE],
    /// Object attribute memory: 64 sprites x (Y, tile, attribute, X)
    pub(crate) oam: [u8; OAM_SIZE],
    /// Secondary OAM, filled by evaluation for the next scanline
    pub(crate) secondary_oam: [u8; SECONDARY_OAM_SIZE],

    /// Fallback mirroring used before a cartridge is attached
    pub(crate) mirroring: Mirroring,
    /// Pattern table access and A12 observation go through the mapper
    pub(crate) mapper: Option<Rc<RefCell<Box<dyn Mapper>>>>,

    // ========================================
    // Timing
    // ========================================
    /// Current scanline (0-261)
    pub(crate) scanline: u16,
    /// Current dot within the scanline (0-340)
    pub(crate) dot: u16,
    /// Frames completed since power-on
    pub(crate) frame: u64,
    /// Odd-frame toggle for the pre-render dot skip
    pub(crate) odd_frame: bool,
    /// Raised at (241, 1) when NMI output is enabled; taken by the runner
    pub(crate) nmi_pending: bool,
    /// Raised when a frame wraps; taken by the runner
    pub(crate) frame_ready: bool,

    // ========================================
    // Background Pipeline
    // ========================================
    /// Per-tile fetch latches
    pub(crate) nt_latch: u8,
    pub(crate) at_latch: u8,
    pub(crate) pattern_lo_latch: u8,
    pub(crate) pattern_hi_latch: u8,
    /// 16-bit pattern shifters; pixel bits exit at bit (15 - fine_x)
    pub(crate) bg_shift_lo: u16,
    pub(crate) bg_shift_hi: u16,
    /// 8-bit attribute shifters fed from the 1-bit latches below
    pub(crate) at_shift_lo: u8,
    pub(crate) at_shift_hi: u8,
    pub(crate) at_latch_lo: u8,
    pub(crate) at_latch_hi: u8,

    // ========================================
    // Sprite Pipeline
    // ========================================
    /// Slots for the line being prepared, built from secondary OAM
    pub(crate) sprite_slots: [SpriteSlot; 8],
    /// Number of live slots
    pub(crate) sprite_count: usize,

    /// Output framebuffer, 256 x 240 ARGB
    frame_buffer: Vec<u32>,
}

impl Ppu {
    /// Create a PPU in its power-on state
    pub fn new() -> Self {
        Ppu {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            read_buffer: 0,
            nametables: [0; NAMETABLE_SIZE * 2],
            palette_ram: [0; PALETTE_SIZE],
            oam: [0; OAM_SIZE],
            secondary_oam: [0xFF; SECONDARY_OAM_SIZE],
            mirroring: Mirroring::Horizontal,
            mapper: None,
            scanline: 0,
            dot: 0,
            frame: 0,
            odd_frame: false,
            nmi_pending: false,
            frame_ready: false,
            nt_latch: 0,
            at_latch: 0,
            pattern_lo_latch: 0,
            pattern_hi_latch: 0,
            bg_shift_lo: 0,
            bg_shift_hi: 0,
            at_shift_lo: 0,
            at_shift_hi: 0,
            at_latch_lo: 0,
            at_latch_hi: 0,
            sprite_slots: [SpriteSlot::default(); 8],
            sprite_count: 0,
            frame_buffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Reset to power-on state, keeping the attached mapper
    pub fn reset(&mut self) {
        let mapper = self.mapper.take();
        let mirroring = self.mirroring;
        *self = Self::new();
        self.mapper = mapper;
        self.mirroring = mirroring;
    }

    /// Attach the cartridge mapper for pattern table access
    pub fn attach_mapper(&mut self, mapper: Rc<RefCell<Box<dyn Mapper>>>) {
        self.mirroring = mapper.borrow().mirroring();
        self.mapper = Some(mapper);
    }

    /// Bulk-load object memory (the OAM-DMA path)
    ///
    /// Bytes land starting at the current OAM address, which wraps, exactly
    /// as 256 writes through the OAM data register would.
    pub fn oam_dma(&mut self, page: &[u8; OAM_SIZE]) {
        for &byte in page.iter() {
            self.oam[self.oam_addr as usize] = byte;
            self.oam_addr = self.oam_addr.wrapping_add(1);
        }
    }

    // ========================================
    // Dot Sequencing
    // ========================================

    /// Advance one dot
    ///
    /// Moves to the next (scanline, dot) position - honoring the odd-frame
    /// skip - and performs that dot's work.
    pub fn tick(&mut self) {
        // Odd frames skip (261, 340) when rendering is enabled
        let skip_tail = self.scanline == PRERENDER_SCANLINE
            && self.dot == DOTS_PER_SCANLINE - 2
            && self.odd_frame
            && self.rendering_enabled();

        if skip_tail {
            self.finish_frame();
        } else {
            self.dot += 1;
            if self.dot >= DOTS_PER_SCANLINE {
                self.dot = 0;
                self.scanline += 1;
                if self.scanline >= SCANLINES_PER_FRAME {
                    self.finish_frame();
                }
            }
        }

        self.process_dot();
    }

    /// Wrap to (0, 0) and publish the completed frame
    fn finish_frame(&mut self) {
        self.scanline = 0;
        self.dot = 0;
        self.frame += 1;
        self.frame_ready = true;
        self.odd_frame = !self.odd_frame;
    }

    /// Perform the work of the current (scanline, dot)
    fn process_dot(&mut self) {
        match self.scanline {
            0..=LAST_VISIBLE_SCANLINE => self.visible_dot(),
            VBLANK_SCANLINE => {
                if self.dot == 1 {
                    self.status |= status::VBLANK;
                    if self.ctrl & ctrl::NMI_OUTPUT != 0 {
                        self.nmi_pending = true;
                    }
                }
            }
            PRERENDER_SCANLINE => self.prerender_dot(),
            _ => {} // 240 and 242-260 are idle
        }
    }

    /// One dot of a visible scanline
    fn visible_dot(&mut self) {
        if (1..=256).contains(&self.dot) {
            self.composite_pixel();
        }
        if self.rendering_enabled() {
            self.run_fetch_machine();
            if self.dot == 257 {
                self.evaluate_sprites();
            }
            if (257..=320).contains(&self.dot) {
                self.fetch_sprite_patterns();
            }
        }
    }

    /// One dot of the pre-render scanline
    fn prerender_dot(&mut self) {
        if self.dot == 1 {
            self.status &= !(status::VBLANK | status::SPRITE_ZERO_HIT | status::OVERFLOW);
        }

        if self.rendering_enabled() {
            self.run_fetch_machine();
            if self.dot == 257 {
                // No evaluation here; the first visible line gets no sprites
                self.sprite_count = 0;
                self.secondary_oam = [0xFF; SECONDARY_OAM_SIZE];
            }
            if (280..=304).contains(&self.dot) {
                self.copy_vertical_scroll();
            }
        }
    }

    /// Whether background or sprite rendering is enabled
    pub(crate) fn rendering_enabled(&self) -> bool {
        self.mask & (mask::BACKGROUND | mask::SPRITES) != 0
    }

    // ========================================
    // Runner Interface
    // ========================================

    /// Take the frame-ready flag, clearing it
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    /// Take the pending-NMI flag, clearing it
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// The completed framebuffer: 256 x 240 pixels, ARGB, alpha 0xFF
    pub fn frame(&self) -> &[u32] {
        &self.frame_buffer
    }

    /// Mutable framebuffer access for the compositor
    pub(crate) fn frame_mut(&mut self) -> &mut [u32] {
        &mut self.frame_buffer
    }

    /// Current scanline (0-261)
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// Current dot (0-340)
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Frames completed since power-on
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Direct OAM read, for DMA verification and debugging
    pub fn read_oam(&self, addr: u8) -> u8 {
        self.oam[addr as usize]
    }
}

/// Serializable snapshot of the PPU
///
/// The framebuffer is output, not state, and the mapper back-reference
/// must survive a restore untouched; neither is captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpuState {
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,
    v: u16,
    t: u16,
    fine_x: u8,
    write_latch: bool,
    read_buffer: u8,
    nametables: Vec<u8>,
    palette_ram: Vec<u8>,
    oam: Vec<u8>,
    secondary_oam: Vec<u8>,
    scanline: u16,
    dot: u16,
    frame: u64,
    odd_frame: bool,
    nmi_pending: bool,
    nt_latch: u8,
    at_latch: u8,
    pattern_lo_latch: u8,
    pattern_hi_latch: u8,
    bg_shift_lo: u16,
    bg_shift_hi: u16,
    at_shift_lo: u8,
    at_shift_hi: u8,
    at_latch_lo: u8,
    at_latch_hi: u8,
    sprite_slots: [SpriteSlot; 8],
    sprite_count: usize,
}

impl Ppu {
    /// Snapshot everything a restore needs to reproduce identical output
    pub fn snapshot(&self) -> PpuState {
        PpuState {
            ctrl: self.ctrl,
            mask: self.mask,
            status: self.status,
            oam_addr: self.oam_addr,
            v: self.v,
            t: self.t,
            fine_x: self.fine_x,
            write_latch: self.write_latch,
            read_buffer: self.read_buffer,
            nametables: self.nametables.to_vec(),
            palette_ram: self.palette_ram.to_vec(),
            oam: self.oam.to_vec(),
            secondary_oam: self.secondary_oam.to_vec(),
            scanline: self.scanline,
            dot: self.dot,
            frame: self.frame,
            odd_frame: self.odd_frame,
            nmi_pending: self.nmi_pending,
            nt_latch: self.nt_latch,
            at_latch: self.at_latch,
            pattern_lo_latch: self.pattern_lo_latch,
            pattern_hi_latch: self.pattern_hi_latch,
            bg_shift_lo: self.bg_shift_lo,
            bg_shift_hi: self.bg_shift_hi,
            at_shift_lo: self.at_shift_lo,
            at_shift_hi: self.at_shift_hi,
            at_latch_lo: self.at_latch_lo,
            at_latch_hi: self.at_latch_hi,
            sprite_slots: self.sprite_slots,
            sprite_count: self.sprite_count,
        }
    }

    /// Restore a snapshot; returns false when the memory sizes disagree
    ///
    /// The mapper wiring and the framebuffer are left as they are.
    pub fn restore(&mut self, state: &PpuState) -> bool {
        if state.nametables.len() != self.nametables.len()
            || state.palette_ram.len() != self.palette_ram.len()
            || state.oam.len() != self.oam.len()
            || state.secondary_oam.len() != self.secondary_oam.len()
        {
            return false;
        }

        self.ctrl = state.ctrl;
        self.mask = state.mask;
        self.status = state.status;
        self.oam_addr = state.oam_addr;
        self.v = state.v;
        self.t = state.t;
        self.fine_x = state.fine_x;
        self.write_latch = state.write_latch;
        self.read_buffer = state.read_buffer;
        self.nametables.copy_from_slice(&state.nametables);
        self.palette_ram.copy_from_slice(&state.palette_ram);
        self.oam.copy_from_slice(&state.oam);
        self.secondary_oam.copy_from_slice(&state.secondary_oam);
        self.scanline = state.scanline;
        self.dot = state.dot;
        self.frame = state.frame;
        self.odd_frame = state.odd_frame;
        self.nmi_pending = state.nmi_pending;
        self.frame_ready = false;
        self.nt_latch = state.nt_latch;
        self.at_latch = state.at_latch;
        self.pattern_lo_latch = state.pattern_lo_latch;
        self.pattern_hi_latch = state.pattern_hi_latch;
        self.bg_shift_lo = state.bg_shift_lo;
        self.bg_shift_hi = state.bg_shift_hi;
        self.at_shift_lo = state.at_shift_lo;
        self.at_shift_hi = state.at_shift_hi;
        self.at_latch_lo = state.at_latch_lo;
        self.at_latch_hi = state.at_latch_hi;
        self.sprite_slots = state.sprite_slots;
        self.sprite_count = state.sprite_count;
        true
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
