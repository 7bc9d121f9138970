// Arithmetic instructions

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// Core of ADC, shared with SBC and the unofficial RRA/ISB
    ///
    /// A = A + value + C. Carry is set when the unsigned 9-bit sum exceeds
    /// 0xFF. Overflow follows the sign rule: it is set when both inputs
    /// share a sign that the result does not, i.e.
    /// `(~(A ^ M) & (A ^ result)) & 0x80`.
    ///
    /// Decimal mode is tracked in P but never alters the arithmetic; the
    /// 2A03 has BCD disabled in silicon.
    pub(crate) fn add_to_accumulator(&mut self, value: u8) {
        let carry_in = self.get_flag(flags::CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry_in;
        let result = sum as u8;

        self.update_flag(flags::CARRY, sum > 0xFF);
        self.update_flag(
            flags::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0,
        );
        self.a = result;
        self.update_zero_and_negative(result);
    }

    /// ADC - Add with Carry
    ///
    /// Flags affected: C, Z, V, N
    pub fn adc(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        self.add_to_accumulator(value);
    }

    /// SBC - Subtract with Carry
    ///
    /// SBC is ADC with the operand complemented: A - M - (1-C) equals
    /// A + ~M + C. Carry ends up set when the subtraction does not borrow.
    ///
    /// Flags affected: C, Z, V, N
    pub fn sbc(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        self.add_to_accumulator(!value);
    }

    /// INC - Increment Memory
    ///
    /// Flags affected: Z, N
    pub fn inc(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let result = bus.read(target.address).wrapping_add(1);
        bus.write(target.address, result);
        self.update_zero_and_negative(result);
    }

    /// DEC - Decrement Memory
    ///
    /// Flags affected: Z, N
    pub fn dec(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let result = bus.read(target.address).wrapping_sub(1);
        bus.write(target.address, result);
        self.update_zero_and_negative(result);
    }

    /// INX - Increment X
    pub fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.update_zero_and_negative(self.x);
    }

    /// INY - Increment Y
    pub fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        self.update_zero_and_negative(self.y);
    }

    /// DEX - Decrement X
    pub fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.update_zero_and_negative(self.x);
    }

    /// DEY - Decrement Y
    pub fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        self.update_zero_and_negative(self.y);
    }
}
