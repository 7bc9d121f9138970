//! Pulse wave channel (both pulse 1 and pulse 2)

use crate::apu::components::{Envelope, LengthCounter, Sweep, Timer};
use crate::apu::constants::DUTY_PATTERNS;
use serde::{Deserialize, Serialize};

/// Pulse channel: duty sequencer + envelope + sweep + length counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseChannel {
    /// Duty cycle select (0-3)
    duty: u8,
    /// Position in the 8-step duty sequence
    duty_position: u8,
    pub(crate) envelope: Envelope,
    pub(crate) sweep: Sweep,
    pub(crate) length: LengthCounter,
    pub(crate) timer: Timer,
}

impl PulseChannel {
    /// `channel_number` is 1 or 2; it selects the sweep's negate flavor
    pub fn new(channel_number: u8) -> Self {
        Self {
            duty: 0,
            duty_position: 0,
            envelope: Envelope::new(),
            sweep: Sweep::new(channel_number),
            length: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// $4000/$4004: duty, halt, envelope
    pub fn write_control(&mut self, data: u8) {
        self.duty = data >> 6;
        self.length.set_halt(data & 0x20 != 0);
        self.envelope.write_control(data);
    }

    /// $4001/$4005: sweep
    pub fn write_sweep(&mut self, data: u8) {
        self.sweep.write_control(data);
    }

    /// $4002/$4006: timer low
    pub fn write_timer_low(&mut self, data: u8) {
        self.timer.set_period_low(data);
    }

    /// $4003/$4007: length load + timer high; restarts envelope and duty
    pub fn write_length(&mut self, data: u8) {
        self.timer.set_period_high(data & 0x07);
        self.length.load(data >> 3);
        self.envelope.restart();
        self.duty_position = 0;
    }

    /// Timer clock (every other CPU cycle)
    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.duty_position = (self.duty_position + 1) % 8;
        }
    }

    /// Quarter-frame clock
    pub fn clock_quarter(&mut self) {
        self.envelope.clock();
    }

    /// Half-frame clock: length and sweep (committing period updates)
    pub fn clock_half(&mut self) {
        self.length.clock();
        if let Some(period) = self.sweep.clock(self.timer.period) {
            self.timer.set_period(period);
        }
    }

    /// Current output level (0-15)
    ///
    /// Silent when the length has expired, the timer period is under 8,
    /// the sweep target overflows, or the duty sequence is low.
    pub fn output(&self) -> u8 {
        if !self.length.is_active()
            || self.timer.period < 8
            || self.sweep.mutes(self.timer.period)
            || DUTY_PATTERNS[self.duty as usize][self.duty_position as usize] == 0
        {
            0
        } else {
            self.envelope.volume()
        }
    }
}
