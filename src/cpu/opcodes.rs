// Opcode decode table for the 6502 CPU
//
// A fixed 256-entry table keyed by the opcode byte, covering every
// documented instruction plus the unofficial opcodes the validation trace
// exercises (NOP variants, LAX, SAX, DCP, ISB, SLO, RLA, SRE, RRA, ANC,
// ALR, ARR, AXS, and the redundant SBC). Jammed opcodes are decoded as
// two-cycle no-ops so a stray fetch cannot wedge the interpreter.
//
// Branch instructions carry their taken/page-cross extras in the branch
// handlers, so their table entries hold the base two cycles with no page
// penalty flag.

use crate::cpu::addressing::AddressingMode;

/// Decoded properties of one opcode
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Instruction mnemonic, as printed by the trace formatter
    pub mnemonic: &'static str,
    /// Addressing mode
    pub mode: AddressingMode,
    /// Total instruction length in bytes (opcode + operands)
    pub bytes: u8,
    /// Base cycle count
    pub cycles: u8,
    /// Whether a crossed page boundary costs one extra cycle
    pub page_cycle: bool,
    /// Whether this is an unofficial opcode (trace prefixes these with '*')
    pub unofficial: bool,
}

use AddressingMode::*;

/// Shared constructor behind the four entry kinds below
const fn entry(
    mnemonic: &'static str,
    mode: AddressingMode,
    bytes: u8,
    cycles: u8,
    page_cycle: bool,
    unofficial: bool,
) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        bytes,
        cycles,
        page_cycle,
        unofficial,
    }
}

/// Official opcode entry
const fn op(mnemonic: &'static str, mode: AddressingMode, bytes: u8, cycles: u8) -> OpcodeInfo {
    entry(mnemonic, mode, bytes, cycles, false, false)
}

/// Official opcode entry with a page-cross penalty
const fn opp(mnemonic: &'static str, mode: AddressingMode, bytes: u8, cycles: u8) -> OpcodeInfo {
    entry(mnemonic, mode, bytes, cycles, true, false)
}

/// Unofficial opcode entry
const fn uo(mnemonic: &'static str, mode: AddressingMode, bytes: u8, cycles: u8) -> OpcodeInfo {
    entry(mnemonic, mode, bytes, cycles, false, true)
}

/// Unofficial opcode entry with a page-cross penalty
const fn uop(mnemonic: &'static str, mode: AddressingMode, bytes: u8, cycles: u8) -> OpcodeInfo {
    entry(mnemonic, mode, bytes, cycles, true, true)
}

/// The 256-entry opcode lookup table, indexed by the opcode byte
#[rustfmt::skip]
pub const OPCODE_TABLE: [OpcodeInfo; 256] = [
    // 0x00-0x0F
    op("BRK", Implied, 1, 7),          op("ORA", IndexedIndirect, 2, 6),
    uo("JAM", Implied, 1, 2),          uo("SLO", IndexedIndirect, 2, 8),
    uo("NOP", ZeroPage, 2, 3),         op("ORA", ZeroPage, 2, 3),
    op("ASL", ZeroPage, 2, 5),         uo("SLO", ZeroPage, 2, 5),
    op("PHP", Implied, 1, 3),          op("ORA", Immediate, 2, 2),
    op("ASL", Accumulator, 1, 2),      uo("ANC", Immediate, 2, 2),
    uo("NOP", Absolute, 3, 4),         op("ORA", Absolute, 3, 4),
    op("ASL", Absolute, 3, 6),         uo("SLO", Absolute, 3, 6),
    // 0x10-0x1F
    op("BPL", Relative, 2, 2),         opp("ORA", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uo("SLO", IndirectIndexed, 2, 8),
    uo("NOP", ZeroPageX, 2, 4),        op("ORA", ZeroPageX, 2, 4),
    op("ASL", ZeroPageX, 2, 6),        uo("SLO", ZeroPageX, 2, 6),
    op("CLC", Implied, 1, 2),          opp("ORA", AbsoluteY, 3, 4),
    uo("NOP", Implied, 1, 2),          uo("SLO", AbsoluteY, 3, 7),
    uop("NOP", AbsoluteX, 3, 4),       opp("ORA", AbsoluteX, 3, 4),
    op("ASL", AbsoluteX, 3, 7),        uo("SLO", AbsoluteX, 3, 7),
    // 0x20-0x2F
    op("JSR", Absolute, 3, 6),         op("AND", IndexedIndirect, 2, 6),
    uo("JAM", Implied, 1, 2),          uo("RLA", IndexedIndirect, 2, 8),
    op("BIT", ZeroPage, 2, 3),         op("AND", ZeroPage, 2, 3),
    op("ROL", ZeroPage, 2, 5),         uo("RLA", ZeroPage, 2, 5),
    op("PLP", Implied, 1, 4),          op("AND", Immediate, 2, 2),
    op("ROL", Accumulator, 1, 2),      uo("ANC", Immediate, 2, 2),
    op("BIT", Absolute, 3, 4),         op("AND", Absolute, 3, 4),
    op("ROL", Absolute, 3, 6),         uo("RLA", Absolute, 3, 6),
    // 0x30-0x3F
    op("BMI", Relative, 2, 2),         opp("AND", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uo("RLA", IndirectIndexed, 2, 8),
    uo("NOP", ZeroPageX, 2, 4),        op("AND", ZeroPageX, 2, 4),
    op("ROL", ZeroPageX, 2, 6),        uo("RLA", ZeroPageX, 2, 6),
    op("SEC", Implied, 1, 2),          opp("AND", AbsoluteY, 3, 4),
    uo("NOP", Implied, 1, 2),          uo("RLA", AbsoluteY, 3, 7),
    uop("NOP", AbsoluteX, 3, 4),       opp("AND", AbsoluteX, 3, 4),
    op("ROL", AbsoluteX, 3, 7),        uo("RLA", AbsoluteX, 3, 7),
    // 0x40-0x4F
    op("RTI", Implied, 1, 6),          op("EOR", IndexedIndirect, 2, 6),
    uo("JAM", Implied, 1, 2),          uo("SRE", IndexedIndirect, 2, 8),
    uo("NOP", ZeroPage, 2, 3),         op("EOR", ZeroPage, 2, 3),
    op("LSR", ZeroPage, 2, 5),         uo("SRE", ZeroPage, 2, 5),
    op("PHA", Implied, 1, 3),          op("EOR", Immediate, 2, 2),
    op("LSR", Accumulator, 1, 2),      uo("ALR", Immediate, 2, 2),
    op("JMP", Absolute, 3, 3),         op("EOR", Absolute, 3, 4),
    op("LSR", Absolute, 3, 6),         uo("SRE", Absolute, 3, 6),
    // 0x50-0x5F
    op("BVC", Relative, 2, 2),         opp("EOR", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uo("SRE", IndirectIndexed, 2, 8),
    uo("NOP", ZeroPageX, 2, 4),        op("EOR", ZeroPageX, 2, 4),
    op("LSR", ZeroPageX, 2, 6),        uo("SRE", ZeroPageX, 2, 6),
    op("CLI", Implied, 1, 2),          opp("EOR", AbsoluteY, 3, 4),
    uo("NOP", Implied, 1, 2),          uo("SRE", AbsoluteY, 3, 7),
    uop("NOP", AbsoluteX, 3, 4),       opp("EOR", AbsoluteX, 3, 4),
    op("LSR", AbsoluteX, 3, 7),        uo("SRE", AbsoluteX, 3, 7),
    // 0x60-0x6F
    op("RTS", Implied, 1, 6),          op("ADC", IndexedIndirect, 2, 6),
    uo("JAM", Implied, 1, 2),          uo("RRA", IndexedIndirect, 2, 8),
    uo("NOP", ZeroPage, 2, 3),         op("ADC", ZeroPage, 2, 3),
    op("ROR", ZeroPage, 2, 5),         uo("RRA", ZeroPage, 2, 5),
    op("PLA", Implied, 1, 4),          op("ADC", Immediate, 2, 2),
    op("ROR", Accumulator, 1, 2),      uo("ARR", Immediate, 2, 2),
    op("JMP", Indirect, 3, 5),         op("ADC", Absolute, 3, 4),
    op("ROR", Absolute, 3, 6),         uo("RRA", Absolute, 3, 6),
    // 0x70-0x7F
    op("BVS", Relative, 2, 2),         opp("ADC", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uo("RRA", IndirectIndexed, 2, 8),
    uo("NOP", ZeroPageX, 2, 4),        op("ADC", ZeroPageX, 2, 4),
    op("ROR", ZeroPageX, 2, 6),        uo("RRA", ZeroPageX, 2, 6),
    op("SEI", Implied, 1, 2),          opp("ADC", AbsoluteY, 3, 4),
    uo("NOP", Implied, 1, 2),          uo("RRA", AbsoluteY, 3, 7),
    uop("NOP", AbsoluteX, 3, 4),       opp("ADC", AbsoluteX, 3, 4),
    op("ROR", AbsoluteX, 3, 7),        uo("RRA", AbsoluteX, 3, 7),
    // 0x80-0x8F
    uo("NOP", Immediate, 2, 2),        op("STA", IndexedIndirect, 2, 6),
    uo("NOP", Immediate, 2, 2),        uo("SAX", IndexedIndirect, 2, 6),
    op("STY", ZeroPage, 2, 3),         op("STA", ZeroPage, 2, 3),
    op("STX", ZeroPage, 2, 3),         uo("SAX", ZeroPage, 2, 3),
    op("DEY", Implied, 1, 2),          uo("NOP", Immediate, 2, 2),
    op("TXA", Implied, 1, 2),          uo("XAA", Immediate, 2, 2),
    op("STY", Absolute, 3, 4),         op("STA", Absolute, 3, 4),
    op("STX", Absolute, 3, 4),         uo("SAX", Absolute, 3, 4),
    // 0x90-0x9F
    op("BCC", Relative, 2, 2),         op("STA", IndirectIndexed, 2, 6),
    uo("JAM", Implied, 1, 2),          uo("SHA", IndirectIndexed, 2, 6),
    op("STY", ZeroPageX, 2, 4),        op("STA", ZeroPageX, 2, 4),
    op("STX", ZeroPageY, 2, 4),        uo("SAX", ZeroPageY, 2, 4),
    op("TYA", Implied, 1, 2),          op("STA", AbsoluteY, 3, 5),
    op("TXS", Implied, 1, 2),          uo("TAS", AbsoluteY, 3, 5),
    uo("SHY", AbsoluteX, 3, 5),        op("STA", AbsoluteX, 3, 5),
    uo("SHX", AbsoluteY, 3, 5),        uo("SHA", AbsoluteY, 3, 5),
    // 0xA0-0xAF
    op("LDY", Immediate, 2, 2),        op("LDA", IndexedIndirect, 2, 6),
    op("LDX", Immediate, 2, 2),        uo("LAX", IndexedIndirect, 2, 6),
    op("LDY", ZeroPage, 2, 3),         op("LDA", ZeroPage, 2, 3),
    op("LDX", ZeroPage, 2, 3),         uo("LAX", ZeroPage, 2, 3),
    op("TAY", Implied, 1, 2),          op("LDA", Immediate, 2, 2),
    op("TAX", Implied, 1, 2),          uo("LAX", Immediate, 2, 2),
    op("LDY", Absolute, 3, 4),         op("LDA", Absolute, 3, 4),
    op("LDX", Absolute, 3, 4),         uo("LAX", Absolute, 3, 4),
    // 0xB0-0xBF
    op("BCS", Relative, 2, 2),         opp("LDA", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uop("LAX", IndirectIndexed, 2, 5),
    op("LDY", ZeroPageX, 2, 4),        op("LDA", ZeroPageX, 2, 4),
    op("LDX", ZeroPageY, 2, 4),        uo("LAX", ZeroPageY, 2, 4),
    op("CLV", Implied, 1, 2),          opp("LDA", AbsoluteY, 3, 4),
    op("TSX", Implied, 1, 2),          uop("LAS", AbsoluteY, 3, 4),
    opp("LDY", AbsoluteX, 3, 4),       opp("LDA", AbsoluteX, 3, 4),
    opp("LDX", AbsoluteY, 3, 4),       uop("LAX", AbsoluteY, 3, 4),
    // 0xC0-0xCF
    op("CPY", Immediate, 2, 2),        op("CMP", IndexedIndirect, 2, 6),
    uo("NOP", Immediate, 2, 2),        uo("DCP", IndexedIndirect, 2, 8),
    op("CPY", ZeroPage, 2, 3),         op("CMP", ZeroPage, 2, 3),
    op("DEC", ZeroPage, 2, 5),         uo("DCP", ZeroPage, 2, 5),
    op("INY", Implied, 1, 2),          op("CMP", Immediate, 2, 2),
    op("DEX", Implied, 1, 2),          uo("AXS", Immediate, 2, 2),
    op("CPY", Absolute, 3, 4),         op("CMP", Absolute, 3, 4),
    op("DEC", Absolute, 3, 6),         uo("DCP", Absolute, 3, 6),
    // 0xD0-0xDF
    op("BNE", Relative, 2, 2),         opp("CMP", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uo("DCP", IndirectIndexed, 2, 8),
    uo("NOP", ZeroPageX, 2, 4),        op("CMP", ZeroPageX, 2, 4),
    op("DEC", ZeroPageX, 2, 6),        uo("DCP", ZeroPageX, 2, 6),
    op("CLD", Implied, 1, 2),          opp("CMP", AbsoluteY, 3, 4),
    uo("NOP", Implied, 1, 2),          uo("DCP", AbsoluteY, 3, 7),
    uop("NOP", AbsoluteX, 3, 4),       opp("CMP", AbsoluteX, 3, 4),
    op("DEC", AbsoluteX, 3, 7),        uo("DCP", AbsoluteX, 3, 7),
    // 0xE0-0xEF
    op("CPX", Immediate, 2, 2),        op("SBC", IndexedIndirect, 2, 6),
    uo("NOP", Immediate, 2, 2),        uo("ISB", IndexedIndirect, 2, 8),
    op("CPX", ZeroPage, 2, 3),         op("SBC", ZeroPage, 2, 3),
    op("INC", ZeroPage, 2, 5),         uo("ISB", ZeroPage, 2, 5),
    op("INX", Implied, 1, 2),          op("SBC", Immediate, 2, 2),
    op("NOP", Implied, 1, 2),          uo("SBC", Immediate, 2, 2),
    op("CPX", Absolute, 3, 4),         op("SBC", Absolute, 3, 4),
    op("INC", Absolute, 3, 6),         uo("ISB", Absolute, 3, 6),
    // 0xF0-0xFF
    op("BEQ", Relative, 2, 2),         opp("SBC", IndirectIndexed, 2, 5),
    uo("JAM", Implied, 1, 2),          uo("ISB", IndirectIndexed, 2, 8),
    uo("NOP", ZeroPageX, 2, 4),        op("SBC", ZeroPageX, 2, 4),
    op("INC", ZeroPageX, 2, 6),        uo("ISB", ZeroPageX, 2, 6),
    op("SED", Implied, 1, 2),          opp("SBC", AbsoluteY, 3, 4),
    uo("NOP", Implied, 1, 2),          uo("ISB", AbsoluteY, 3, 7),
    uop("NOP", AbsoluteX, 3, 4),       opp("SBC", AbsoluteX, 3, 4),
    op("INC", AbsoluteX, 3, 7),        uo("ISB", AbsoluteX, 3, 7),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_all_opcodes() {
        assert_eq!(OPCODE_TABLE.len(), 256);
        for info in OPCODE_TABLE.iter() {
            assert!(!info.mnemonic.is_empty());
            assert!((1..=3).contains(&info.bytes));
            assert!(info.cycles >= 2 && info.cycles <= 8);
        }
    }

    #[test]
    fn test_byte_length_matches_mode() {
        for (opcode, info) in OPCODE_TABLE.iter().enumerate() {
            let expected = match info.mode {
                AddressingMode::Implied | AddressingMode::Accumulator => 1,
                AddressingMode::Absolute
                | AddressingMode::AbsoluteX
                | AddressingMode::AbsoluteY
                | AddressingMode::Indirect => 3,
                _ => 2,
            };
            assert_eq!(
                info.bytes, expected,
                "opcode {:02X} byte length disagrees with its mode",
                opcode
            );
        }
    }

    #[test]
    fn test_known_entries() {
        assert_eq!(OPCODE_TABLE[0xA9].mnemonic, "LDA");
        assert_eq!(OPCODE_TABLE[0xA9].mode, AddressingMode::Immediate);
        assert_eq!(OPCODE_TABLE[0x4C].cycles, 3, "JMP absolute takes 3 cycles");
        assert_eq!(OPCODE_TABLE[0x00].cycles, 7, "BRK takes 7 cycles");
        assert!(OPCODE_TABLE[0xEB].unofficial, "0xEB is the redundant SBC");
        assert!(OPCODE_TABLE[0xBD].page_cycle, "LDA abs,X pays on page cross");
        assert!(!OPCODE_TABLE[0x9D].page_cycle, "STA abs,X never pays");
    }
}
