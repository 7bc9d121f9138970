// APU module - Audio Processing Unit (2A03) implementation
//
// Five channels (two pulses, triangle, noise, DMC), the ~240 Hz frame
// counter, and a non-linear mixer producing mono f32 samples at the host
// rate. `tick` is called once per CPU cycle by the bus.
//
// # Register Map
//
// | Address | Channel  | Purpose                             |
// |---------|----------|-------------------------------------|
// | $4000-03| Pulse 1  | duty/envelope, sweep, timer, length |
// | $4004-07| Pulse 2  | duty/envelope, sweep, timer, length |
// | $4008-0B| Triangle | linear counter, timer, length       |
// | $400C-0F| Noise    | envelope, mode/period, length       |
// | $4010-13| DMC      | rate/loop, level, address, length   |
// | $4015   | Status   | channel enables / length status     |
// | $4017   | Frame    | sequencer mode, IRQ inhibit         |

pub mod channels;
pub mod components;
pub mod constants;

use crate::cartridge::Mapper;
use channels::{DmcChannel, NoiseChannel, PulseChannel, TriangleChannel};
use components::FrameCounter;
use constants::CPU_CLOCK_HZ;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Default host sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Most samples buffered before the collaborator must drain
const SAMPLE_BUFFER_CAP: usize = 1024;

/// Serializable snapshot of the APU's channel and sequencer state
///
/// The sample buffer and the mapper wiring are deliberately absent: the
/// buffer is transient output and the mapper back-reference must survive a
/// restore untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApuState {
    pub pulse1: PulseChannel,
    pub pulse2: PulseChannel,
    pub triangle: TriangleChannel,
    pub noise: NoiseChannel,
    pub dmc: DmcChannel,
    pub frame_counter: FrameCounter,
    pub odd_cycle: bool,
    pub sample_accumulator: f64,
}

/// APU structure holding the five channels and the frame counter
pub struct Apu {
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,
    frame_counter: FrameCounter,

    /// Pulse/noise timers clock on every other CPU cycle
    odd_cycle: bool,

    /// Fractional CPU cycles accumulated toward the next host sample
    sample_accumulator: f64,
    /// CPU cycles per host sample
    sample_period: f64,
    /// Produced samples awaiting the collaborator
    sample_buffer: Vec<f32>,

    /// DMC sample fetches read cartridge space through the mapper
    mapper: Option<Rc<RefCell<Box<dyn Mapper>>>>,
}

impl Apu {
    /// Create an APU in its power-on state at the default sample rate
    pub fn new() -> Self {
        Apu {
            pulse1: PulseChannel::new(1),
            pulse2: PulseChannel::new(2),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            dmc: DmcChannel::new(),
            frame_counter: FrameCounter::new(),
            odd_cycle: false,
            sample_accumulator: 0.0,
            sample_period: CPU_CLOCK_HZ as f64 / DEFAULT_SAMPLE_RATE as f64,
            sample_buffer: Vec::with_capacity(SAMPLE_BUFFER_CAP),
            mapper: None,
        }
    }

    /// Reset to power-on state (noise LFSR back to 1), keeping the mapper
    /// and the configured sample rate
    pub fn reset(&mut self) {
        let mapper = self.mapper.take();
        let sample_period = self.sample_period;
        *self = Self::new();
        self.sample_period = sample_period;
        self.mapper = mapper;
    }

    /// Attach the cartridge mapper for DMC sample fetches
    pub fn attach_mapper(&mut self, mapper: Rc<RefCell<Box<dyn Mapper>>>) {
        self.mapper = Some(mapper);
    }

    /// Change the host sample rate
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_period = CPU_CLOCK_HZ as f64 / sample_rate as f64;
    }

    // ========================================
    // Clocking
    // ========================================

    /// Advance one CPU cycle
    pub fn tick(&mut self) {
        // Triangle and DMC timers run at CPU rate; pulse and noise at half
        self.triangle.clock_timer();
        self.dmc.clock_timer();
        if self.odd_cycle {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }
        self.odd_cycle = !self.odd_cycle;

        self.feed_dmc();

        let frame = self.frame_counter.tick();
        if frame.quarter {
            self.clock_quarter_frame();
        }
        if frame.half {
            self.clock_half_frame();
        }

        self.sample_accumulator += 1.0;
        if self.sample_accumulator >= self.sample_period {
            self.sample_accumulator -= self.sample_period;
            let sample = self.mix();
            if self.sample_buffer.len() < SAMPLE_BUFFER_CAP {
                self.sample_buffer.push(sample);
            }
        }
    }

    /// Fetch a sample byte for the DMC reader when it wants one
    fn feed_dmc(&mut self) {
        if !self.dmc.wants_sample() {
            return;
        }
        if let Some(mapper) = &self.mapper {
            let byte = mapper.borrow().cpu_read(self.dmc.fetch_address());
            self.dmc.load_sample(byte);
        }
    }

    /// Quarter-frame clock: envelopes and the triangle linear counter
    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_quarter();
        self.pulse2.clock_quarter();
        self.triangle.clock_quarter();
        self.noise.clock_quarter();
    }

    /// Half-frame clock: length counters and sweeps
    fn clock_half_frame(&mut self) {
        self.pulse1.clock_half();
        self.pulse2.clock_half();
        self.triangle.clock_half();
        self.noise.clock_half();
    }

    // ========================================
    // Mixer
    // ========================================

    /// Mix the five channel outputs into one sample
    ///
    /// The standard non-linear approximation of the 2A03's resistor
    /// ladder:
    ///   pulse = 95.88 / (8128 / (p1 + p2) + 100)
    ///   tnd   = 159.79 / (1 / (t/8227 + n/12241 + d/22638) + 100)
    fn mix(&self) -> f32 {
        let p1 = self.pulse1.output() as f64;
        let p2 = self.pulse2.output() as f64;
        let pulse_mix = if p1 + p2 > 0.0 {
            95.88 / (8128.0 / (p1 + p2) + 100.0)
        } else {
            0.0
        };

        let t = self.triangle.output() as f64 / 8227.0;
        let n = self.noise.output() as f64 / 12241.0;
        let d = self.dmc.output() as f64 / 22638.0;
        let tnd_mix = if t + n + d > 0.0 {
            159.79 / (1.0 / (t + n + d) + 100.0)
        } else {
            0.0
        };

        (pulse_mix + tnd_mix) as f32
    }

    /// Drain the produced samples; the internal buffer clears
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.sample_buffer)
    }

    /// Samples currently waiting (for pacing decisions)
    pub fn buffered_samples(&self) -> usize {
        self.sample_buffer.len()
    }

    // ========================================
    // Registers
    // ========================================

    /// $4015 read: channel length status and the frame IRQ flag
    ///
    /// Reading acknowledges the frame IRQ.
    pub fn read_status(&mut self) -> u8 {
        let value = self.peek_status();
        self.frame_counter.acknowledge_irq();
        value
    }

    /// $4015 without the acknowledge side effect
    pub fn peek_status(&self) -> u8 {
        let mut value = 0u8;
        if self.pulse1.length.is_active() {
            value |= 0x01;
        }
        if self.pulse2.length.is_active() {
            value |= 0x02;
        }
        if self.triangle.length.is_active() {
            value |= 0x04;
        }
        if self.noise.length.is_active() {
            value |= 0x08;
        }
        if self.dmc.is_active() {
            value |= 0x10;
        }
        if self.frame_counter.irq_pending() {
            value |= 0x40;
        }
        value
    }

    /// Write an APU register ($4000-$4013, $4015, $4017)
    pub fn write_register(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(data),
            0x4001 => self.pulse1.write_sweep(data),
            0x4002 => self.pulse1.write_timer_low(data),
            0x4003 => self.pulse1.write_length(data),

            0x4004 => self.pulse2.write_control(data),
            0x4005 => self.pulse2.write_sweep(data),
            0x4006 => self.pulse2.write_timer_low(data),
            0x4007 => self.pulse2.write_length(data),

            0x4008 => self.triangle.write_control(data),
            0x400A => self.triangle.write_timer_low(data),
            0x400B => self.triangle.write_length(data),

            0x400C => self.noise.write_control(data),
            0x400E => self.noise.write_mode_period(data),
            0x400F => self.noise.write_length(data),

            0x4010 => self.dmc.write_control(data),
            0x4011 => self.dmc.write_direct_load(data),
            0x4012 => self.dmc.write_sample_address(data),
            0x4013 => self.dmc.write_sample_length(data),

            0x4015 => {
                self.pulse1.length.set_enabled(data & 0x01 != 0);
                self.pulse2.length.set_enabled(data & 0x02 != 0);
                self.triangle.length.set_enabled(data & 0x04 != 0);
                self.noise.length.set_enabled(data & 0x08 != 0);
                self.dmc.set_enabled(data & 0x10 != 0);
            }

            0x4017 => {
                if self.frame_counter.write_control(data) {
                    // Five-step mode clocks the units immediately
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }

            _ => {} // $4009, $400D, $4014, $4016 are not APU registers
        }
    }

    /// Whether the frame counter is asserting an IRQ
    pub fn frame_irq_pending(&self) -> bool {
        self.frame_counter.irq_pending()
    }

    // ========================================
    // Save-State Hooks
    // ========================================

    /// Snapshot the channel and sequencer state
    pub fn snapshot(&self) -> ApuState {
        ApuState {
            pulse1: self.pulse1.clone(),
            pulse2: self.pulse2.clone(),
            triangle: self.triangle.clone(),
            noise: self.noise.clone(),
            dmc: self.dmc.clone(),
            frame_counter: self.frame_counter.clone(),
            odd_cycle: self.odd_cycle,
            sample_accumulator: self.sample_accumulator,
        }
    }

    /// Restore a snapshot; the mapper wiring and sample buffer are kept
    pub fn restore(&mut self, state: ApuState) {
        self.pulse1 = state.pulse1;
        self.pulse2 = state.pulse2;
        self.triangle = state.triangle;
        self.noise = state.noise;
        self.dmc = state.dmc;
        self.frame_counter = state.frame_counter;
        self.odd_cycle = state.odd_cycle;
        self.sample_accumulator = state.sample_accumulator;
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
