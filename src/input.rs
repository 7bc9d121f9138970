// Input module - standard controller handling
//
// Two controller ports surface at $4016/$4017. Writing bit 0 of $4016
// drives the strobe line; on its falling edge the current button states
// latch into per-controller shift registers. Each read then returns one
// bit (A, B, Select, Start, Up, Down, Left, Right) and shifts, topping the
// register up with 1s so reads past the eighth return 1.
//
// | Address | Access | Purpose                        |
// |---------|--------|--------------------------------|
// | $4016   | write  | strobe (bit 0)                 |
// | $4016   | read   | controller 1 serial data       |
// | $4017   | read   | controller 2 serial data       |

use serde::{Deserialize, Serialize};

/// Button state of one standard controller
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Controller {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Controller {
    /// All buttons released
    pub fn new() -> Self {
        Self::default()
    }

    /// Pack into the wire layout: bit 0 = A through bit 7 = Right
    pub fn to_bits(self) -> u8 {
        (self.a as u8)
            | (self.b as u8) << 1
            | (self.select as u8) << 2
            | (self.start as u8) << 3
            | (self.up as u8) << 4
            | (self.down as u8) << 5
            | (self.left as u8) << 6
            | (self.right as u8) << 7
    }

    /// Unpack from the wire layout
    pub fn from_bits(bits: u8) -> Self {
        Self {
            a: bits & 0x01 != 0,
            b: bits & 0x02 != 0,
            select: bits & 0x04 != 0,
            start: bits & 0x08 != 0,
            up: bits & 0x10 != 0,
            down: bits & 0x20 != 0,
            left: bits & 0x40 != 0,
            right: bits & 0x80 != 0,
        }
    }
}

/// Latch, strobe, and shift state for both controller ports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerIO {
    /// Live button states, written by the collaborator
    input_latches: [u8; 2],
    /// Serial shift registers, loaded on the strobe's falling edge
    shift_registers: [u8; 2],
    /// Strobe line (bit 0 of the last $4016 write)
    strobe: bool,
}

impl ControllerIO {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.shift_registers = [0; 2];
        self.strobe = false;
    }

    /// Update a controller's live button state (port 0 or 1)
    pub fn set_controller(&mut self, port: usize, controller: Controller) {
        self.input_latches[port] = controller.to_bits();
    }

    /// Raw latch access for save states
    pub fn latches(&self) -> [u8; 2] {
        self.input_latches
    }

    pub fn set_latches(&mut self, latches: [u8; 2]) {
        self.input_latches = latches;
    }

    /// $4016 write: strobe. The falling edge copies both input latches
    /// into the shift registers.
    pub fn write_strobe(&mut self, data: u8) {
        let new_strobe = data & 0x01 != 0;
        if self.strobe && !new_strobe {
            self.shift_registers = self.input_latches;
        }
        self.strobe = new_strobe;
    }

    /// Serial read for one port
    ///
    /// With the strobe held high the live A button is visible; otherwise
    /// the low bit shifts out and a 1 shifts in from the top.
    pub fn read(&mut self, port: usize) -> u8 {
        if self.strobe {
            self.input_latches[port] & 0x01
        } else {
            let bit = self.shift_registers[port] & 0x01;
            self.shift_registers[port] = (self.shift_registers[port] >> 1) | 0x80;
            bit
        }
    }

    /// Read without shifting (trace/debug path)
    pub fn peek(&self, port: usize) -> u8 {
        if self.strobe {
            self.input_latches[port] & 0x01
        } else {
            self.shift_registers[port] & 0x01
        }
    }
}
