//! Linear counter: the triangle channel's fine-grained duration gate

use serde::{Deserialize, Serialize};

/// Linear counter, clocked on quarter frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearCounter {
    /// Current count
    counter: u8,
    /// Reload value (control register bits 0-6)
    reload_value: u8,
    /// Control flag (bit 7); while set the reload flag never clears
    control_flag: bool,
    /// Reload flag, armed by a write to the triangle length register
    reload_flag: bool,
}

impl LinearCounter {
    pub fn new() -> Self {
        Self {
            counter: 0,
            reload_value: 0,
            control_flag: false,
            reload_flag: false,
        }
    }

    /// Quarter-frame clock
    pub fn clock(&mut self) {
        if self.reload_flag {
            self.counter = self.reload_value;
        } else if self.counter > 0 {
            self.counter -= 1;
        }

        if !self.control_flag {
            self.reload_flag = false;
        }
    }

    pub fn write_control(&mut self, data: u8) {
        self.control_flag = data & 0x80 != 0;
        self.reload_value = data & 0x7F;
    }

    /// Arm the reload flag (triangle length register written)
    pub fn arm_reload(&mut self) {
        self.reload_flag = true;
    }

    pub fn is_active(&self) -> bool {
        self.counter > 0
    }
}
