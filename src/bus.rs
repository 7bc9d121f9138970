// Bus module - CPU-side memory bus
//
// Routes every CPU read and write to internal RAM, the PPU register file,
// the APU, the controller ports, or the cartridge, and fans CPU time out to
// the PPU (3 dots per cycle) and the APU (1 cycle per cycle).
//
// # CPU Memory Map
//
// ```text
// $0000-$07FF: 2KB internal RAM
// $0800-$1FFF: RAM mirrors (three more images)
// $2000-$2007: PPU registers
// $2008-$3FFF: PPU register mirrors (every 8 bytes)
// $4000-$4013: APU channel registers
// $4014:       OAM DMA trigger (write latches a pending transfer)
// $4015:       APU status
// $4016:       controller strobe (write) / controller 1 data (read)
// $4017:       APU frame counter (write) / controller 2 data (read)
// $4018-$401F: undecoded; reads return the open-bus byte
// $4020-$FFFF: cartridge space, through the mapper
// ```

use crate::apu::Apu;
use crate::cartridge::Mapper;
use crate::input::{Controller, ControllerIO};
use crate::ppu::Ppu;
use std::cell::RefCell;
use std::rc::Rc;

/// Internal RAM size (2KB, mirrored to fill $0000-$1FFF)
const RAM_SIZE: usize = 2048;

/// A latched OAM-DMA request: source page and pending flag
#[derive(Debug, Clone, Copy, Default)]
pub struct DmaRequest {
    /// High byte of the source address
    pub page: u8,
    /// Whether a transfer is waiting for the frame runner
    pub pending: bool,
}

/// The CPU-side bus, owner of RAM, PPU, APU, and controller state
pub struct Bus {
    /// 2KB internal RAM
    ram: [u8; RAM_SIZE],
    /// Picture processor, advanced 3 dots per CPU cycle
    ppu: Ppu,
    /// Audio processor, advanced 1 cycle per CPU cycle
    apu: Apu,
    /// Controller ports at $4016/$4017
    controllers: ControllerIO,
    /// Cartridge access, shared with the PPU and the APU's DMC
    mapper: Option<Rc<RefCell<Box<dyn Mapper>>>>,
    /// Last byte seen on the data bus; undecoded reads return it
    open_bus: u8,
    /// Latched OAM-DMA request
    dma: DmaRequest,
}

impl Bus {
    /// Create a bus with no cartridge attached
    ///
    /// The open-bus byte starts at 0xFF, the cold-start value undecoded
    /// reads observe.
    pub fn new() -> Self {
        Bus {
            ram: [0; RAM_SIZE],
            ppu: Ppu::new(),
            apu: Apu::new(),
            controllers: ControllerIO::new(),
            mapper: None,
            open_bus: 0xFF,
            dma: DmaRequest::default(),
        }
    }

    /// Attach a cartridge mapper, wiring it into the PPU and the DMC
    pub fn attach_mapper(&mut self, mapper: Rc<RefCell<Box<dyn Mapper>>>) {
        self.ppu.attach_mapper(mapper.clone());
        self.apu.attach_mapper(mapper.clone());
        self.mapper = Some(mapper);
    }

    /// Whether a cartridge is attached
    pub fn has_mapper(&self) -> bool {
        self.mapper.is_some()
    }

    // ========================================
    // Read / Write
    // ========================================

    /// Read a byte, with full side effects
    pub fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr & 0x0007),
            0x4015 => self.apu.read_status(),
            // Controller reads carry the port's open-bus high bits
            0x4016 => self.controllers.read(0) | 0x40,
            0x4017 => self.controllers.read(1) | 0x40,
            // Write-only APU range and the undecoded window
            0x4000..=0x401F => self.open_bus,
            0x4020..=0xFFFF => match &self.mapper {
                Some(mapper) => mapper.borrow().cpu_read(addr),
                None => self.open_bus,
            },
        };
        self.open_bus = value;
        value
    }

    /// Read a byte with no side effects (trace and debug surfaces)
    ///
    /// PPU flags stay set, $2007 does not advance v, controller shifters
    /// hold, and the APU frame IRQ is not acknowledged.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.peek_register(addr & 0x0007),
            0x4015 => self.apu.peek_status(),
            0x4016 => self.controllers.peek(0) | 0x40,
            0x4017 => self.controllers.peek(1) | 0x40,
            0x4000..=0x401F => self.open_bus,
            0x4020..=0xFFFF => match &self.mapper {
                Some(mapper) => mapper.borrow().cpu_read(addr),
                None => self.open_bus,
            },
        }
    }

    /// Write a byte
    pub fn write(&mut self, addr: u16, data: u8) {
        self.open_bus = data;
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => self.ppu.write_register(addr & 0x0007, data),
            0x4014 => {
                self.dma = DmaRequest {
                    page: data,
                    pending: true,
                };
            }
            0x4016 => self.controllers.write_strobe(data),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, data),
            0x4018..=0x401F => {} // undecoded
            0x4020..=0xFFFF => {
                if let Some(mapper) = &self.mapper {
                    mapper.borrow_mut().cpu_write(addr, data);
                }
            }
        }
    }

    /// Little-endian 16-bit read
    pub fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian 16-bit write
    pub fn write_u16(&mut self, addr: u16, data: u16) {
        self.write(addr, (data & 0xFF) as u8);
        self.write(addr.wrapping_add(1), (data >> 8) as u8);
    }

    // ========================================
    // Clock Fan-Out
    // ========================================

    /// Advance the PPU by 3 dots and the APU by 1 cycle per CPU cycle
    pub fn tick(&mut self, cpu_cycles: u64) {
        for _ in 0..cpu_cycles {
            self.ppu.tick();
            self.ppu.tick();
            self.ppu.tick();
            self.apu.tick();
        }
    }

    /// Current PPU (scanline, dot), for the trace formatter
    pub fn ppu_position(&self) -> (u16, u16) {
        (self.ppu.scanline(), self.ppu.dot())
    }

    // ========================================
    // Interrupt and DMA Plumbing
    // ========================================

    /// Whether the mapper's IRQ line is asserted
    pub fn mapper_irq_pending(&self) -> bool {
        match &self.mapper {
            Some(mapper) => mapper.borrow().irq_pending(),
            None => false,
        }
    }

    /// Acknowledge the mapper's IRQ line
    pub fn acknowledge_mapper_irq(&mut self) {
        if let Some(mapper) = &self.mapper {
            mapper.borrow_mut().irq_acknowledge();
        }
    }

    /// Take the latched DMA request, if any
    pub fn take_dma_request(&mut self) -> Option<u8> {
        if self.dma.pending {
            self.dma.pending = false;
            Some(self.dma.page)
        } else {
            None
        }
    }

    // ========================================
    // Component Access
    // ========================================

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }

    /// Update a controller's live button state (port 0 or 1)
    pub fn set_controller(&mut self, port: usize, controller: Controller) {
        self.controllers.set_controller(port, controller);
    }

    /// Raw RAM access for save states
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    /// Controller I/O access for save states
    pub fn controllers(&self) -> &ControllerIO {
        &self.controllers
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerIO {
        &mut self.controllers
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Bus {
    /// Bus with a minimal NROM cartridge whose interrupt vectors are set
    ///
    /// The PRG bank is NOP-filled; tests place their code in RAM and only
    /// need the vectors to resolve.
    pub(crate) fn with_vectors(nmi: u16, reset: u16, irq: u16) -> Self {
        use crate::cartridge::{mappers, Cartridge, Mirroring};

        let mut prg_rom = vec![0xEA; 16 * 1024];
        for (vector, value) in [(0x3FFA, nmi), (0x3FFC, reset), (0x3FFE, irq)] {
            prg_rom[vector] = (value & 0xFF) as u8;
            prg_rom[vector + 1] = (value >> 8) as u8;
        }

        let cartridge = Cartridge {
            prg_rom,
            chr_mem: vec![0; 8 * 1024],
            chr_is_ram: true,
            prg_ram: vec![0; 8 * 1024],
            mapper_id: 0,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
        };
        let mapper = mappers::create_mapper(cartridge).expect("NROM is supported");

        let mut bus = Bus::new();
        bus.attach_mapper(Rc::new(RefCell::new(mapper)));
        bus
    }
}
