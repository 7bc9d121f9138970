// Mapper 0 (NROM) - no bank switching
//
// Memory layout:
// - CPU $6000-$7FFF: 8KB PRG-RAM
// - CPU $8000-$FFFF: PRG-ROM; a single 16KB bank mirrors to fill 32KB
// - PPU $0000-$1FFF: 8KB CHR-ROM or CHR-RAM, mapped linearly
//
// NROM-128 carries 16KB of PRG-ROM (mirrored), NROM-256 carries 32KB.

use crate::cartridge::{Cartridge, Mapper, Mirroring};

/// Mapper 0 implementation (NROM)
///
/// The simplest mapper: fixed PRG, fixed CHR, mirroring straight from the
/// header. Used by early titles (Super Mario Bros., Donkey Kong, nestest).
pub struct Mapper0 {
    cartridge: Cartridge,
}

impl Mapper0 {
    /// Create a new NROM mapper owning the decoded cartridge
    pub fn new(cartridge: Cartridge) -> Self {
        Mapper0 { cartridge }
    }
}

impl Mapper for Mapper0 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                let index = (addr - 0x6000) as usize;
                self.cartridge.prg_ram[index]
            }
            0x8000..=0xFFFF => {
                // Modulo folds a 16KB image into the 32KB window
                let index = (addr - 0x8000) as usize % self.cartridge.prg_rom.len();
                self.cartridge.prg_rom[index]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            let index = (addr - 0x6000) as usize;
            self.cartridge.prg_ram[index] = value;
        }
        // NROM has no registers; PRG-ROM writes are dropped
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.cartridge.chr_mem[addr as usize],
            _ => 0,
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if let 0x0000..=0x1FFF = addr {
            if self.cartridge.chr_is_ram {
                self.cartridge.chr_mem[addr as usize] = value;
            }
            // CHR-ROM writes are dropped
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.cartridge.mirroring
    }

    fn serialize_state(&self) -> Vec<u8> {
        // PRG-RAM plus CHR-RAM contents when writable; ROM never travels
        let mut bytes = self.cartridge.prg_ram.clone();
        if self.cartridge.chr_is_ram {
            bytes.extend_from_slice(&self.cartridge.chr_mem);
        }
        bytes
    }

    fn deserialize_state(&mut self, bytes: &[u8]) -> bool {
        let prg_ram_len = self.cartridge.prg_ram.len();
        let expected = if self.cartridge.chr_is_ram {
            prg_ram_len + self.cartridge.chr_mem.len()
        } else {
            prg_ram_len
        };
        if bytes.len() != expected {
            return false;
        }
        self.cartridge.prg_ram.copy_from_slice(&bytes[..prg_ram_len]);
        if self.cartridge.chr_is_ram {
            self.cartridge.chr_mem.copy_from_slice(&bytes[prg_ram_len..]);
        }
        true
    }
}
