// Load and store instructions

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;

impl Cpu {
    /// LDA - Load Accumulator
    ///
    /// Flags affected: Z, N
    pub fn lda(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        self.a = value;
        self.update_zero_and_negative(value);
    }

    /// LDX - Load X Register
    ///
    /// Flags affected: Z, N
    pub fn ldx(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        self.x = value;
        self.update_zero_and_negative(value);
    }

    /// LDY - Load Y Register
    ///
    /// Flags affected: Z, N
    pub fn ldy(&mut self, bus: &mut Bus, target: &AddressingResult) {
        let value = self.read_operand(bus, target);
        self.y = value;
        self.update_zero_and_negative(value);
    }

    /// STA - Store Accumulator
    ///
    /// Flags affected: none
    pub fn sta(&mut self, bus: &mut Bus, target: &AddressingResult) {
        bus.write(target.address, self.a);
    }

    /// STX - Store X Register
    ///
    /// Flags affected: none
    pub fn stx(&mut self, bus: &mut Bus, target: &AddressingResult) {
        bus.write(target.address, self.x);
    }

    /// STY - Store Y Register
    ///
    /// Flags affected: none
    pub fn sty(&mut self, bus: &mut Bus, target: &AddressingResult) {
        bus.write(target.address, self.y);
    }
}
