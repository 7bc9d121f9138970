// Shift and rotate instructions
//
// Each operation works either on the accumulator or on memory, selected by
// the decoded addressing mode. Memory targets use the single-write model:
// the shifted value is stored once.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// Fetch the shift target value
    #[inline]
    fn shift_input(&self, bus: &mut Bus, target: &AddressingResult, accumulator: bool) -> u8 {
        if accumulator {
            self.a
        } else {
            bus.read(target.address)
        }
    }

    /// Store the shift result and update Z/N
    #[inline]
    fn shift_output(
        &mut self,
        bus: &mut Bus,
        target: &AddressingResult,
        accumulator: bool,
        result: u8,
    ) {
        if accumulator {
            self.a = result;
        } else {
            bus.write(target.address, result);
        }
        self.update_zero_and_negative(result);
    }

    /// ASL - Arithmetic Shift Left
    ///
    /// C takes the old bit 7. Flags affected: C, Z, N
    pub fn asl(&mut self, bus: &mut Bus, target: &AddressingResult, accumulator: bool) {
        let value = self.shift_input(bus, target, accumulator);
        self.update_flag(flags::CARRY, value & 0x80 != 0);
        self.shift_output(bus, target, accumulator, value << 1);
    }

    /// LSR - Logical Shift Right
    ///
    /// C takes the old bit 0. Flags affected: C, Z, N
    pub fn lsr(&mut self, bus: &mut Bus, target: &AddressingResult, accumulator: bool) {
        let value = self.shift_input(bus, target, accumulator);
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        self.shift_output(bus, target, accumulator, value >> 1);
    }

    /// ROL - Rotate Left through Carry
    ///
    /// Flags affected: C, Z, N
    pub fn rol(&mut self, bus: &mut Bus, target: &AddressingResult, accumulator: bool) {
        let value = self.shift_input(bus, target, accumulator);
        let carry_in = self.get_flag(flags::CARRY) as u8;
        self.update_flag(flags::CARRY, value & 0x80 != 0);
        self.shift_output(bus, target, accumulator, (value << 1) | carry_in);
    }

    /// ROR - Rotate Right through Carry
    ///
    /// Flags affected: C, Z, N
    pub fn ror(&mut self, bus: &mut Bus, target: &AddressingResult, accumulator: bool) {
        let value = self.shift_input(bus, target, accumulator);
        let carry_in = (self.get_flag(flags::CARRY) as u8) << 7;
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        self.shift_output(bus, target, accumulator, (value >> 1) | carry_in);
    }
}
