//! Envelope generator shared by the pulse and noise channels

use serde::{Deserialize, Serialize};

/// Envelope generator: a divider-driven decay from 15 to 0, optionally
/// looping, or a constant volume taken straight from the period field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Start flag, set by a write to the channel's length register
    start: bool,
    /// Divider counter
    divider: u8,
    /// Decay level (0-15)
    decay_level: u8,
    /// Divider period; doubles as the volume in constant mode
    period: u8,
    /// Loop flag (register bit 5)
    loop_flag: bool,
    /// Constant volume flag (register bit 4)
    constant_volume: bool,
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            start: false,
            divider: 0,
            decay_level: 0,
            period: 0,
            loop_flag: false,
            constant_volume: false,
        }
    }

    /// Quarter-frame clock
    ///
    /// A pending start reloads the decay to 15; otherwise the divider
    /// counts down and, on underflow, steps the decay (wrapping to 15 when
    /// looping).
    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay_level = 15;
            self.divider = self.period;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.period;
            if self.decay_level > 0 {
                self.decay_level -= 1;
            } else if self.loop_flag {
                self.decay_level = 15;
            }
        }
    }

    /// Current volume (0-15)
    pub fn volume(&self) -> u8 {
        if self.constant_volume {
            self.period
        } else {
            self.decay_level
        }
    }

    /// Decode the envelope fields of a channel's control register
    pub fn write_control(&mut self, data: u8) {
        self.period = data & 0x0F;
        self.constant_volume = data & 0x10 != 0;
        self.loop_flag = data & 0x20 != 0;
    }

    /// Arm the start flag (a write to the channel's length register)
    pub fn restart(&mut self) {
        self.start = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_reloads_to_fifteen() {
        let mut envelope = Envelope::new();
        envelope.write_control(0x02);
        envelope.restart();

        envelope.clock();
        assert_eq!(envelope.volume(), 15);
    }

    #[test]
    fn test_decay_steps_on_divider_underflow() {
        let mut envelope = Envelope::new();
        envelope.write_control(0x00); // period 0: decay every clock
        envelope.restart();
        envelope.clock(); // start -> 15

        envelope.clock();
        assert_eq!(envelope.volume(), 14);
    }

    #[test]
    fn test_loop_wraps_decay() {
        let mut envelope = Envelope::new();
        envelope.write_control(0x20); // loop, period 0
        envelope.restart();
        envelope.clock(); // 15

        for _ in 0..15 {
            envelope.clock();
        }
        assert_eq!(envelope.volume(), 0);
        envelope.clock();
        assert_eq!(envelope.volume(), 15, "loop flag wraps the decay");
    }

    #[test]
    fn test_constant_volume_uses_period() {
        let mut envelope = Envelope::new();
        envelope.write_control(0x17); // constant, volume 7
        assert_eq!(envelope.volume(), 7);
    }
}
