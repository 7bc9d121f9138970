// PPU internal memory map
//
// Addresses mask to 14 bits:
// - $0000-$1FFF: pattern tables, through the mapper
// - $2000-$3EFF: nametable RAM behind the cartridge's mirroring
// - $3F00-$3FFF: palette RAM with the $3F10/$14/$18/$1C aliases
//
// Every access notifies the mapper with the raw address and the current
// frame-dot counter so A12-watching mappers can clock their IRQ counters.

use super::constants::{DOTS_PER_SCANLINE, NAMETABLE_SIZE};
use super::Ppu;
use crate::cartridge::Mirroring;

impl Ppu {
    /// Map a nametable address ($2000-$3EFF) into the 2KB of console RAM
    pub(crate) fn mirror_nametable_addr(&self, addr: u16) -> usize {
        let addr = (addr & 0x0FFF) as usize;
        let table = addr / NAMETABLE_SIZE;
        let offset = addr % NAMETABLE_SIZE;

        let bank = match self.current_mirroring() {
            // Horizontal: tables 0,1 share bank 0; tables 2,3 share bank 1
            Mirroring::Horizontal => table / 2,
            // Vertical: tables 0,2 share bank 0; tables 1,3 share bank 1
            Mirroring::Vertical => table % 2,
        };

        bank * NAMETABLE_SIZE + offset
    }

    /// Map a palette address ($3F00-$3FFF) into the 32 bytes of palette RAM
    ///
    /// Entries $10/$14/$18/$1C alias $00/$04/$08/$0C: sprite palette slot 0
    /// is physically the backdrop color.
    pub(crate) fn mirror_palette_addr(addr: u16) -> usize {
        let index = (addr & 0x001F) as usize;
        if index >= 0x10 && index % 4 == 0 {
            index - 0x10
        } else {
            index
        }
    }

    /// Live mirroring: mappers may override the header value at runtime
    fn current_mirroring(&self) -> Mirroring {
        match &self.mapper {
            Some(mapper) => mapper.borrow().mirroring(),
            None => self.mirroring,
        }
    }

    /// Report this access to the mapper's A12 watcher
    fn observe_address(&self, addr: u16) {
        if let Some(mapper) = &self.mapper {
            let frame_dot = self.scanline as u32 * DOTS_PER_SCANLINE as u32 + self.dot as u32;
            mapper.borrow_mut().ppu_address_observed(addr, frame_dot);
        }
    }

    /// Read PPU memory (14-bit address space)
    pub(crate) fn read_memory(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        self.observe_address(addr);

        match addr {
            0x0000..=0x1FFF => match &self.mapper {
                Some(mapper) => mapper.borrow().ppu_read(addr),
                None => 0,
            },
            0x2000..=0x3EFF => self.nametables[self.mirror_nametable_addr(addr)],
            _ => self.palette_ram[Self::mirror_palette_addr(addr)],
        }
    }

    /// Read PPU memory without notifying the mapper (trace/debug path)
    pub(crate) fn peek_memory(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => match &self.mapper {
                Some(mapper) => mapper.borrow().ppu_read(addr),
                None => 0,
            },
            0x2000..=0x3EFF => self.nametables[self.mirror_nametable_addr(addr)],
            _ => self.palette_ram[Self::mirror_palette_addr(addr)],
        }
    }

    /// Write PPU memory (14-bit address space)
    pub(crate) fn write_memory(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        self.observe_address(addr);

        match addr {
            0x0000..=0x1FFF => {
                if let Some(mapper) = &self.mapper {
                    mapper.borrow_mut().ppu_write(addr, data);
                }
            }
            0x2000..=0x3EFF => {
                let index = self.mirror_nametable_addr(addr);
                self.nametables[index] = data;
            }
            _ => self.palette_ram[Self::mirror_palette_addr(addr)] = data,
        }
    }

    /// Read a palette entry for the compositor (no mapper notification)
    pub(crate) fn palette_entry(&self, index: u16) -> u8 {
        self.palette_ram[Self::mirror_palette_addr(0x3F00 | (index & 0x1F))]
    }
}
