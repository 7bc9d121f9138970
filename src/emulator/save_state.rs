// Save states: full-machine snapshots with pointer-preserving restore
//
// The snapshot carries CPU registers, PPU and APU state, bus RAM,
// controller latches, and the mapper's opaque state blob. Restoring writes
// values into the live objects; the back-references between subsystems and
// the cartridge (the shared mapper cell) are never replaced, so a restored
// machine keeps its wiring.

use crate::apu::ApuState;
use crate::ppu::PpuState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for save-state operations
#[derive(Debug)]
pub enum SaveStateError {
    /// Slot file could not be read or written
    Io(io::Error),
    /// The snapshot did not serialize or parse
    Serialization(serde_json::Error),
    /// No cartridge is loaded, so there is no machine to snapshot
    NoCartridge,
    /// The snapshot does not fit the loaded cartridge or core version
    IncompatibleState,
}

impl fmt::Display for SaveStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStateError::Io(e) => write!(f, "save state I/O error: {}", e),
            SaveStateError::Serialization(e) => write!(f, "save state serialization error: {}", e),
            SaveStateError::NoCartridge => write!(f, "no cartridge loaded"),
            SaveStateError::IncompatibleState => {
                write!(f, "save state does not match the loaded cartridge")
            }
        }
    }
}

impl std::error::Error for SaveStateError {}

impl From<io::Error> for SaveStateError {
    fn from(e: io::Error) -> Self {
        SaveStateError::Io(e)
    }
}

impl From<serde_json::Error> for SaveStateError {
    fn from(e: serde_json::Error) -> Self {
        SaveStateError::Serialization(e)
    }
}

/// CPU register snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: u64,
    pub nmi_pending: bool,
    pub irq_pending: bool,
}

/// Complete machine snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    cpu: CpuState,
    ppu: PpuState,
    apu: ApuState,
    ram: Vec<u8>,
    controller_latches: [u8; 2],
    /// Opaque mapper-private blob from `Mapper::serialize_state`
    mapper: Vec<u8>,
}

impl SaveState {
    /// Capture the emulator's current state
    ///
    /// # Errors
    /// `NoCartridge` when nothing is loaded.
    pub fn from_emulator(emulator: &super::Emulator) -> Result<Self, SaveStateError> {
        let mapper = emulator.mapper().ok_or(SaveStateError::NoCartridge)?;
        let cpu = emulator.cpu();

        Ok(SaveState {
            cpu: CpuState {
                a: cpu.a,
                x: cpu.x,
                y: cpu.y,
                sp: cpu.sp,
                pc: cpu.pc,
                status: cpu.status,
                cycles: cpu.cycles,
                nmi_pending: cpu.nmi_pending,
                irq_pending: cpu.irq_pending,
            },
            ppu: emulator.bus().ppu().snapshot(),
            apu: emulator.bus().apu().snapshot(),
            ram: emulator.bus().ram().to_vec(),
            controller_latches: emulator.bus().controllers().latches(),
            mapper: mapper.borrow().serialize_state(),
        })
    }

    /// Write this snapshot back into a live emulator
    ///
    /// # Errors
    /// `NoCartridge` without a loaded cartridge; `IncompatibleState` when
    /// any component rejects the snapshot's shape.
    pub fn restore_to_emulator(&self, emulator: &mut super::Emulator) -> Result<(), SaveStateError> {
        let mapper = emulator
            .mapper()
            .ok_or(SaveStateError::NoCartridge)?
            .clone();

        if self.ram.len() != emulator.bus().ram().len() {
            return Err(SaveStateError::IncompatibleState);
        }
        if !mapper.borrow_mut().deserialize_state(&self.mapper) {
            return Err(SaveStateError::IncompatibleState);
        }
        if !emulator.bus_mut().ppu_mut().restore(&self.ppu) {
            return Err(SaveStateError::IncompatibleState);
        }
        emulator.bus_mut().apu_mut().restore(self.apu.clone());

        emulator.bus_mut().ram_mut().copy_from_slice(&self.ram);
        emulator
            .bus_mut()
            .controllers_mut()
            .set_latches(self.controller_latches);

        let cpu = emulator.cpu_mut();
        cpu.a = self.cpu.a;
        cpu.x = self.cpu.x;
        cpu.y = self.cpu.y;
        cpu.sp = self.cpu.sp;
        cpu.pc = self.cpu.pc;
        cpu.status = self.cpu.status;
        cpu.cycles = self.cpu.cycles;
        cpu.nmi_pending = self.cpu.nmi_pending;
        cpu.irq_pending = self.cpu.irq_pending;

        Ok(())
    }

    /// Path for a numbered slot, anchored beside the ROM when possible
    fn slot_path(slot: u8, rom_path: Option<&Path>) -> PathBuf {
        match rom_path {
            Some(rom) => {
                let stem = rom
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "famicore".to_string());
                rom.with_file_name(format!("{}.state{}.json", stem, slot))
            }
            None => PathBuf::from(format!("famicore.state{}.json", slot)),
        }
    }

    /// Persist to a numbered slot file
    pub fn save_to_file(&self, slot: u8, rom_path: Option<&Path>) -> Result<(), SaveStateError> {
        let json = serde_json::to_string(self)?;
        std::fs::write(Self::slot_path(slot, rom_path), json)?;
        Ok(())
    }

    /// Load from a numbered slot file
    pub fn load_from_file(slot: u8, rom_path: Option<&Path>) -> Result<Self, SaveStateError> {
        let json = std::fs::read_to_string(Self::slot_path(slot, rom_path))?;
        Ok(serde_json::from_str(&json)?)
    }
}
