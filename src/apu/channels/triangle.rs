//! Triangle wave channel

use crate::apu::components::{LengthCounter, LinearCounter, Timer};
use crate::apu::constants::TRIANGLE_SEQUENCE;
use serde::{Deserialize, Serialize};

/// Triangle channel: 32-step sequencer gated by both the length and the
/// linear counter. The timer clocks every CPU cycle, an octave below the
/// pulse channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleChannel {
    /// Position in the 32-step sequence
    sequence_position: u8,
    pub(crate) linear: LinearCounter,
    pub(crate) length: LengthCounter,
    pub(crate) timer: Timer,
}

impl TriangleChannel {
    pub fn new() -> Self {
        Self {
            sequence_position: 0,
            linear: LinearCounter::new(),
            length: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// $4008: linear counter control; bit 7 doubles as the length halt
    pub fn write_control(&mut self, data: u8) {
        self.linear.write_control(data);
        self.length.set_halt(data & 0x80 != 0);
    }

    /// $400A: timer low
    pub fn write_timer_low(&mut self, data: u8) {
        self.timer.set_period_low(data);
    }

    /// $400B: length load + timer high; arms the linear reload
    pub fn write_length(&mut self, data: u8) {
        self.timer.set_period_high(data & 0x07);
        self.length.load(data >> 3);
        self.linear.arm_reload();
    }

    /// Timer clock (every CPU cycle); the sequencer only advances while
    /// both counters gate it on
    pub fn clock_timer(&mut self) {
        if self.timer.clock() && self.length.is_active() && self.linear.is_active() {
            self.sequence_position = (self.sequence_position + 1) % 32;
        }
    }

    /// Quarter-frame clock
    pub fn clock_quarter(&mut self) {
        self.linear.clock();
    }

    /// Half-frame clock
    pub fn clock_half(&mut self) {
        self.length.clock();
    }

    /// Current output level (0-15); the sequencer holds its last value
    /// while gated off rather than dropping to zero
    pub fn output(&self) -> u8 {
        TRIANGLE_SEQUENCE[self.sequence_position as usize]
    }
}

impl Default for TriangleChannel {
    fn default() -> Self {
        Self::new()
    }
}
