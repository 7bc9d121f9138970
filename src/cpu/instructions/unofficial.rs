// Unofficial opcodes exercised by the CPU validation trace
//
// These are combinations the 6502 decodes by accident: most fuse a
// read-modify-write with an ALU operation on the intermediate value. Their
// semantics follow the public 6502 reference and are pinned down by the
// nestest golden log.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// LAX - Load Accumulator and X
    ///
    /// A = X = M. Flags affected: Z, N
    pub fn lax(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        self.a = value;
        self.x = value;
        self.update_zero_and_negative(value);
    }

    /// SAX - Store Accumulator AND X
    ///
    /// M = A & X. Flags affected: none
    pub fn sax(&mut self, bus: &mut Bus, target: &AddressingResult) {
        bus.write(target.address, self.a & self.x);
    }

    /// DCP - Decrement then Compare
    ///
    /// M = M - 1, then CMP A with the result.
    pub fn dcp(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let result = bus.read(target.address).wrapping_sub(1);
        bus.write(target.address, result);
        self.compare(self.a, result);
    }

    /// ISB - Increment then Subtract (also known as ISC)
    ///
    /// M = M + 1, then SBC the result from A.
    pub fn isb(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let result = bus.read(target.address).wrapping_add(1);
        bus.write(target.address, result);
        self.add_to_accumulator(!result);
    }

    /// SLO - Shift Left then OR
    ///
    /// M = M << 1 (C from old bit 7), then A |= M.
    pub fn slo(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = bus.read(target.address);
        self.update_flag(flags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        bus.write(target.address, result);
        self.a |= result;
        self.update_zero_and_negative(self.a);
    }

    /// RLA - Rotate Left then AND
    ///
    /// M = ROL M, then A &= M.
    pub fn rla(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = bus.read(target.address);
        let carry_in = self.get_flag(flags::CARRY) as u8;
        self.update_flag(flags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        bus.write(target.address, result);
        self.a &= result;
        self.update_zero_and_negative(self.a);
    }

    /// SRE - Shift Right then EOR
    ///
    /// M = M >> 1 (C from old bit 0), then A ^= M.
    pub fn sre(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = bus.read(target.address);
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        bus.write(target.address, result);
        self.a ^= result;
        self.update_zero_and_negative(self.a);
    }

    /// RRA - Rotate Right then Add
    ///
    /// M = ROR M, then ADC the result.
    pub fn rra(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = bus.read(target.address);
        let carry_in = (self.get_flag(flags::CARRY) as u8) << 7;
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        bus.write(target.address, result);
        self.add_to_accumulator(result);
    }

    /// ANC - AND then copy N into C
    pub fn anc(&mut self, bus: &mut Bus, target: &AddressingResult) {
        self.a &= self.read_operand(bus, target);
        self.update_zero_and_negative(self.a);
        self.update_flag(flags::CARRY, self.a & 0x80 != 0);
    }

    /// ALR - AND then Logical Shift Right on A
    pub fn alr(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.a & self.read_operand(bus, target);
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        self.a = value >> 1;
        self.update_zero_and_negative(self.a);
    }

    /// ARR - AND then Rotate Right on A
    ///
    /// After the rotate, C comes from result bit 6 and V from bit 6 XOR
    /// bit 5. The odd flag routing is what the adder's internal carries
    /// expose on real silicon.
    pub fn arr(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let and = self.a & self.read_operand(bus, target);
        let carry_in = (self.get_flag(flags::CARRY) as u8) << 7;
        let result = (and >> 1) | carry_in;

        self.a = result;
        self.update_zero_and_negative(result);
        self.update_flag(flags::CARRY, result & 0x40 != 0);
        self.update_flag(
            flags::OVERFLOW,
            ((result >> 6) ^ (result >> 5)) & 0x01 != 0,
        );
    }

    /// AXS - (A AND X) minus operand into X (also known as SBX)
    ///
    /// X = (A & X) - M without borrow; C set when no borrow occurred.
    pub fn axs(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        let base = self.a & self.x;
        self.update_flag(flags::CARRY, base >= value);
        self.x = base.wrapping_sub(value);
        self.update_zero_and_negative(self.x);
    }
}
