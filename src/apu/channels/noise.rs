//! Noise channel

use crate::apu::components::{Envelope, LengthCounter, Timer};
use crate::apu::constants::NOISE_PERIOD_TABLE;
use serde::{Deserialize, Serialize};

/// Noise channel: a 15-bit LFSR keyed by a table-driven timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseChannel {
    /// 15-bit linear-feedback shift register; never zero
    lfsr: u16,
    /// Mode bit: feedback taps bit 6 instead of bit 1
    mode: bool,
    pub(crate) envelope: Envelope,
    pub(crate) length: LengthCounter,
    pub(crate) timer: Timer,
}

impl NoiseChannel {
    pub fn new() -> Self {
        Self {
            lfsr: 1,
            mode: false,
            envelope: Envelope::new(),
            length: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// $400C: halt + envelope
    pub fn write_control(&mut self, data: u8) {
        self.length.set_halt(data & 0x20 != 0);
        self.envelope.write_control(data);
    }

    /// $400E: mode bit and timer period from the lookup table
    pub fn write_mode_period(&mut self, data: u8) {
        self.mode = data & 0x80 != 0;
        self.timer
            .set_period(NOISE_PERIOD_TABLE[(data & 0x0F) as usize]);
    }

    /// $400F: length load; restarts the envelope
    pub fn write_length(&mut self, data: u8) {
        self.length.load(data >> 3);
        self.envelope.restart();
    }

    /// Timer clock (every other CPU cycle); underflow shifts the LFSR
    ///
    /// Feedback is bit 0 XOR bit 6 (mode) or bit 1, fed into bit 14 after
    /// the right shift. Seeding with 1 keeps the register nonzero forever.
    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            let tap = if self.mode { 6 } else { 1 };
            let feedback = (self.lfsr & 1) ^ ((self.lfsr >> tap) & 1);
            self.lfsr = (self.lfsr >> 1) | (feedback << 14);
        }
    }

    /// Quarter-frame clock
    pub fn clock_quarter(&mut self) {
        self.envelope.clock();
    }

    /// Half-frame clock
    pub fn clock_half(&mut self) {
        self.length.clock();
    }

    /// Current output level (0-15); silent when LFSR bit 0 is set or the
    /// length has expired
    pub fn output(&self) -> u8 {
        if self.lfsr & 1 != 0 || !self.length.is_active() {
            0
        } else {
            self.envelope.volume()
        }
    }

    #[cfg(test)]
    pub(crate) fn lfsr(&self) -> u16 {
        self.lfsr
    }
}

impl Default for NoiseChannel {
    fn default() -> Self {
        Self::new()
    }
}
