// Emulator module - the frame runner
//
// Owns the CPU and the bus (which owns PPU, APU, and controller state) and
// sequences the machine: one CPU instruction, the 3:1/1:1 clock fan-out,
// OAM-DMA stalls, and interrupt delivery at instruction boundaries. The
// shared mapper cell wires the cartridge into the bus (CPU side), the PPU
// (pattern tables), and the APU (DMC fetches).

mod config;
mod save_state;

pub use config::EmulatorConfig;
pub use save_state::{SaveState, SaveStateError};

use crate::bus::Bus;
use crate::cartridge::mappers::{create_mapper, MapperError};
use crate::cartridge::{Cartridge, INesError, Mapper};
use crate::cpu::{flags, Cpu};
use crate::input::Controller;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Base OAM-DMA stall; one more cycle when the transfer starts on an odd
/// CPU cycle
const DMA_STALL_CYCLES: u64 = 513;

/// Main emulator structure
pub struct Emulator {
    cpu: Cpu,
    bus: Bus,
    /// Shared cartridge mapper, present once a ROM is loaded
    mapper: Option<Rc<RefCell<Box<dyn Mapper>>>>,
    config: EmulatorConfig,
    rom_path: Option<PathBuf>,
    paused: bool,
}

impl Emulator {
    /// Create an emulator with no cartridge loaded
    pub fn new() -> Self {
        let config = EmulatorConfig::load_or_default();
        let mut bus = Bus::new();
        bus.apu_mut().set_sample_rate(config.audio_sample_rate);

        Emulator {
            cpu: Cpu::new(),
            bus,
            mapper: None,
            config,
            rom_path: None,
            paused: false,
        }
    }

    /// Load a ROM file and reset the machine
    ///
    /// # Errors
    /// Returns an `INesError` for unreadable or malformed images and for
    /// unsupported mappers.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<(), INesError> {
        let path = path.as_ref();
        let cartridge = Cartridge::from_ines_file(path)?;
        self.insert_cartridge(cartridge)?;
        self.rom_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Load a ROM from an in-memory iNES image
    pub fn load_rom_bytes(&mut self, bytes: &[u8]) -> Result<(), INesError> {
        let cartridge = Cartridge::from_ines_bytes(bytes)?;
        self.insert_cartridge(cartridge)?;
        self.rom_path = None;
        Ok(())
    }

    fn insert_cartridge(&mut self, cartridge: Cartridge) -> Result<(), INesError> {
        let mapper = create_mapper(cartridge).map_err(|e| match e {
            MapperError::UnsupportedMapper(id) => INesError::UnsupportedMapper(id),
        })?;

        let mapper = Rc::new(RefCell::new(mapper));
        self.bus.attach_mapper(mapper.clone());
        self.mapper = Some(mapper);
        self.reset();
        Ok(())
    }

    /// Reset all four subsystems, keeping cartridge memory intact
    ///
    /// After the CPU's 7-cycle reset sequence the PPU sits at dot 21 of
    /// scanline 0, matching the reference trace's starting position.
    pub fn reset(&mut self) {
        self.bus.ppu_mut().reset();
        self.bus.apu_mut().reset();
        if let Some(mapper) = &self.mapper {
            mapper.borrow_mut().reset();
        }
        self.cpu.reset(&mut self.bus);
        self.bus.tick(self.cpu.cycles);
        self.paused = false;
    }

    // ========================================
    // Execution
    // ========================================

    /// Run one CPU instruction and everything it drags along
    ///
    /// Order per the timing contract: the instruction executes, the PPU
    /// and APU catch up through the bus, a latched OAM-DMA stalls the CPU
    /// for 513/514 cycles while the page copies, and interrupts raised by
    /// the ticked hardware are delivered so the next boundary services
    /// them.
    ///
    /// # Returns
    /// Cycles consumed by the instruction itself (not the DMA stall).
    pub fn step_instruction(&mut self) -> u8 {
        let cycles = self.cpu.step(&mut self.bus);
        self.bus.tick(cycles as u64);

        if let Some(page) = self.bus.take_dma_request() {
            self.run_oam_dma(page);
        }

        self.deliver_interrupts();
        cycles
    }

    /// Copy one CPU page into PPU object memory, stalling the CPU
    ///
    /// The stall is 513 cycles, or 514 when the transfer begins on an odd
    /// CPU cycle. NMIs raised while the PPU runs through the stall are
    /// observed at the next instruction boundary as usual.
    fn run_oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut buffer = [0u8; 256];
        for (offset, byte) in buffer.iter_mut().enumerate() {
            *byte = self.bus.read(base + offset as u16);
        }
        self.bus.ppu_mut().oam_dma(&buffer);

        let stall = DMA_STALL_CYCLES + (self.cpu.cycles & 1);
        self.cpu.cycles = self.cpu.cycles.wrapping_add(stall);
        self.bus.tick(stall);
    }

    /// Deliver boundary-observable interrupts to the CPU
    fn deliver_interrupts(&mut self) {
        if self.bus.ppu_mut().take_nmi() {
            self.cpu.nmi();
        }

        // IRQ is a level: sources are re-polled every boundary and only
        // forwarded while the CPU would accept them
        if !self.cpu.get_flag(flags::INTERRUPT_DISABLE) {
            if self.bus.mapper_irq_pending() {
                self.cpu.irq();
                self.bus.acknowledge_mapper_irq();
            }
            if self.bus.apu().frame_irq_pending() {
                self.cpu.irq();
            }
        }
    }

    /// Run instructions until the PPU completes a frame
    ///
    /// On return the framebuffer holds the finished picture and the APU
    /// buffer holds the frame's samples. Returns the CPU cycles consumed.
    pub fn run_frame(&mut self) -> u64 {
        let start_cycles = self.cpu.cycles;
        loop {
            self.step_instruction();
            if self.bus.ppu_mut().take_frame_ready() {
                break;
            }
        }
        self.cpu.cycles - start_cycles
    }

    // ========================================
    // Collaborator Surface
    // ========================================

    /// The completed framebuffer: 256 x 240 ARGB pixels
    pub fn frame(&self) -> &[u32] {
        self.bus.ppu().frame()
    }

    /// Drain the audio samples produced since the last call
    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        self.bus.apu_mut().take_samples()
    }

    /// Update controller 1's button state
    pub fn set_controller1(&mut self, controller: Controller) {
        self.bus.set_controller(0, controller);
    }

    /// Update controller 2's button state
    pub fn set_controller2(&mut self, controller: Controller) {
        self.bus.set_controller(1, controller);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ========================================
    // Save States
    // ========================================

    /// Save the machine state to a numbered slot file
    pub fn save_state(&self, slot: u8) -> Result<(), SaveStateError> {
        let state = SaveState::from_emulator(self)?;
        state.save_to_file(slot, self.rom_path.as_deref())
    }

    /// Restore the machine state from a numbered slot file
    pub fn load_state(&mut self, slot: u8) -> Result<(), SaveStateError> {
        let state = SaveState::load_from_file(slot, self.rom_path.as_deref())?;
        state.restore_to_emulator(self)
    }

    // ========================================
    // Component Access
    // ========================================

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub(crate) fn mapper(&self) -> Option<&Rc<RefCell<Box<dyn Mapper>>>> {
        self.mapper.as_ref()
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn rom_path(&self) -> Option<&Path> {
        self.rom_path.as_deref()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::PRG_BANK_SIZE;

    /// Minimal NROM image: reset vector at $8000, an infinite JMP loop
    pub(crate) fn test_rom() -> Vec<u8> {
        let mut prg = vec![0xEA; PRG_BANK_SIZE];
        // $8000: JMP $8000
        prg[0x0000] = 0x4C;
        prg[0x0001] = 0x00;
        prg[0x0002] = 0x80;
        prg[0x3FFC] = 0x00; // reset vector -> $8000
        prg[0x3FFD] = 0x80;

        let mut image = vec![b'N', b'E', b'S', 0x1A, 1, 0, 0, 0];
        image.extend_from_slice(&[0u8; 8]);
        image.extend_from_slice(&prg);
        image
    }

    #[test]
    fn test_reset_timing_contract() {
        let mut emulator = Emulator::new();
        emulator.load_rom_bytes(&test_rom()).expect("ROM loads");

        assert_eq!(emulator.cpu().pc, 0x8000);
        assert_eq!(emulator.cpu().cycles, 7);
        assert_eq!(
            emulator.bus().ppu_position(),
            (0, 21),
            "PPU runs 21 dots during the reset sequence"
        );
    }

    #[test]
    fn test_nrom_16k_mirrors() {
        let mut emulator = Emulator::new();
        emulator.load_rom_bytes(&test_rom()).expect("ROM loads");

        let lo = emulator.bus_mut().read(0x8000);
        let hi = emulator.bus_mut().read(0xC000);
        assert_eq!(lo, hi, "a single 16KB bank fills the 32KB window");
    }

    #[test]
    fn test_run_frame_produces_a_frame() {
        let mut emulator = Emulator::new();
        emulator.load_rom_bytes(&test_rom()).expect("ROM loads");

        let cycles = emulator.run_frame();
        // One NTSC frame is 341 * 262 / 3 CPU cycles, give or take the
        // final instruction
        assert!((29_000..31_000).contains(&cycles), "cycles: {}", cycles);
        assert_eq!(emulator.bus().ppu().frame_count(), 1);
        assert_eq!(emulator.frame().len(), 256 * 240);
    }

    #[test]
    fn test_oam_dma_copies_and_stalls() {
        let mut emulator = Emulator::new();
        emulator.load_rom_bytes(&test_rom()).expect("ROM loads");

        // Fill page $02 with a pattern
        for i in 0..256u16 {
            emulator.bus_mut().write(0x0200 + i, i as u8);
        }

        let cycles_before = emulator.cpu().cycles;
        emulator.bus_mut().write(0x4014, 0x02);
        emulator.step_instruction();

        assert_eq!(emulator.bus().ppu().read_oam(0), 0);
        assert_eq!(emulator.bus().ppu().read_oam(0x80), 0x80);
        assert_eq!(emulator.bus().ppu().read_oam(0xFF), 0xFF);

        let consumed = emulator.cpu().cycles - cycles_before;
        assert!(
            consumed >= 513,
            "DMA stalls at least 513 cycles, consumed {}",
            consumed
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut emulator = Emulator::new();
        emulator.load_rom_bytes(&test_rom()).expect("ROM loads");
        for _ in 0..500 {
            emulator.step_instruction();
        }

        emulator.reset();
        let pc_once = emulator.cpu().pc;
        let cycles_once = emulator.cpu().cycles;
        let ppu_once = emulator.bus().ppu_position();

        emulator.reset();
        assert_eq!(emulator.cpu().pc, pc_once);
        assert_eq!(emulator.cpu().cycles, cycles_once);
        assert_eq!(emulator.bus().ppu_position(), ppu_once);
        assert_eq!(emulator.cpu().status, 0x24);
        assert_eq!(emulator.cpu().sp, 0xFD);
    }

    #[test]
    fn test_unsupported_mapper_rejected() {
        let mut image = test_rom();
        image[6] = 0x30; // mapper low nibble 3

        let mut emulator = Emulator::new();
        assert!(matches!(
            emulator.load_rom_bytes(&image),
            Err(INesError::UnsupportedMapper(3))
        ));
    }

    #[test]
    fn test_vblank_nmi_reaches_the_cpu() {
        let mut emulator = Emulator::new();
        let mut image = test_rom();
        // NMI vector -> $8000 as well
        image[16 + 0x3FFA] = 0x00;
        image[16 + 0x3FFB] = 0x80;
        emulator.load_rom_bytes(&image).expect("ROM loads");

        // Enable NMI output, then run a frame; the CPU must have taken
        // the NMI (stack pointer moved by the interrupt push)
        emulator.bus_mut().write(0x2000, 0x80);
        let sp_before = emulator.cpu().sp;
        emulator.run_frame();
        assert_ne!(emulator.cpu().sp, sp_before, "NMI pushed PC and P");
    }
}
