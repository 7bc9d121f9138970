// Flag set and clear instructions

use crate::cpu::{flags, Cpu};

impl Cpu {
    /// CLC - Clear Carry
    pub fn clc(&mut self) {
        self.update_flag(flags::CARRY, false);
    }

    /// SEC - Set Carry
    pub fn sec(&mut self) {
        self.update_flag(flags::CARRY, true);
    }

    /// CLI - Clear Interrupt Disable
    pub fn cli(&mut self) {
        self.update_flag(flags::INTERRUPT_DISABLE, false);
    }

    /// SEI - Set Interrupt Disable
    pub fn sei(&mut self) {
        self.update_flag(flags::INTERRUPT_DISABLE, true);
    }

    /// CLD - Clear Decimal Mode
    pub fn cld(&mut self) {
        self.update_flag(flags::DECIMAL, false);
    }

    /// SED - Set Decimal Mode (tracked but inert on this target)
    pub fn sed(&mut self) {
        self.update_flag(flags::DECIMAL, true);
    }

    /// CLV - Clear Overflow
    pub fn clv(&mut self) {
        self.update_flag(flags::OVERFLOW, false);
    }
}
