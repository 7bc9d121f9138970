// famicore - a cycle-accurate NES emulation core
//
// The crate couples a 6502 interpreter, a dot-sequenced picture processor,
// a five-channel audio processor, an address-decoding bus, and a pluggable
// cartridge mapper layer behind one frame-stepped `Emulator` surface.
// Window creation, input decoding, and audio device queueing are the
// collaborator's business: the core hands out a 256x240 ARGB framebuffer
// per frame and mono f32 samples at the configured rate.

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod input;
pub mod ppu;

// Re-export the main types for convenience
pub use apu::Apu;
pub use bus::Bus;
pub use cartridge::{Cartridge, INesError, INesHeader, Mapper, Mirroring};
pub use cpu::Cpu;
pub use emulator::{Emulator, EmulatorConfig, SaveState, SaveStateError};
pub use input::{Controller, ControllerIO};
pub use ppu::{Ppu, SCREEN_HEIGHT, SCREEN_WIDTH};
