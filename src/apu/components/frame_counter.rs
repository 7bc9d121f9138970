//! Frame counter: the ~240 Hz sequencer driving envelopes, lengths, and
//! sweeps
//!
//! Four-step mode cycles Q, Q+H, Q, Q+H and raises the frame IRQ on its
//! last step unless inhibited. Five-step mode cycles Q, Q+H, Q, -, Q+H
//! with no IRQ. A $4017 write resets the sequence; selecting five-step
//! mode clocks a quarter and a half frame immediately.

use crate::apu::constants::FRAME_QUARTER_CYCLES;
use serde::{Deserialize, Serialize};

/// Events produced by one CPU cycle of frame-counter time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTick {
    /// Clock envelopes and the triangle linear counter
    pub quarter: bool,
    /// Clock length counters and sweeps
    pub half: bool,
    /// Raise the frame IRQ
    pub irq: bool,
}

/// The frame counter itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameCounter {
    /// CPU cycles into the current quarter step
    cycle: u32,
    /// Current step in the sequence
    step: u8,
    /// Five-step mode flag ($4017 bit 7)
    five_step: bool,
    /// IRQ inhibit flag ($4017 bit 6)
    irq_inhibit: bool,
    /// Frame IRQ line; cleared by a $4015 read or by inhibiting
    irq_pending: bool,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self {
            cycle: 0,
            step: 0,
            five_step: false,
            irq_inhibit: false,
            irq_pending: false,
        }
    }

    /// Advance one CPU cycle
    pub fn tick(&mut self) -> FrameTick {
        self.cycle += 1;
        if self.cycle < FRAME_QUARTER_CYCLES {
            return FrameTick::default();
        }
        self.cycle = 0;

        let steps = if self.five_step { 5 } else { 4 };
        let step = self.step;
        self.step = (self.step + 1) % steps;

        let mut tick = FrameTick::default();
        if self.five_step {
            match step {
                0 | 2 => tick.quarter = true,
                1 | 4 => {
                    tick.quarter = true;
                    tick.half = true;
                }
                _ => {} // step 3 is silent
            }
        } else {
            tick.quarter = true;
            if step == 1 || step == 3 {
                tick.half = true;
            }
            if step == 3 && !self.irq_inhibit {
                self.irq_pending = true;
                tick.irq = true;
            }
        }
        tick
    }

    /// $4017 write; returns true when the caller should clock an
    /// immediate quarter + half frame (five-step mode selected)
    pub fn write_control(&mut self, data: u8) -> bool {
        self.five_step = data & 0x80 != 0;
        self.irq_inhibit = data & 0x40 != 0;
        self.cycle = 0;
        self.step = 0;
        if self.irq_inhibit {
            self.irq_pending = false;
        }
        self.five_step
    }

    /// Frame IRQ line
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// $4015 read acknowledges the frame IRQ
    pub fn acknowledge_irq(&mut self) {
        self.irq_pending = false;
    }
}
