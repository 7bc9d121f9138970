// CPU execution and trace formatting
//
// `step` runs the fetch-decode-execute sequence for one instruction after
// servicing any latched interrupt. Dispatch is a match over the opcode byte;
// the decode table supplies addressing mode, byte length, and cycle
// accounting.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::opcodes::{OpcodeInfo, OPCODE_TABLE};
use crate::cpu::Cpu;

impl Cpu {
    /// Execute one instruction
    ///
    /// A latched NMI (or an unmasked IRQ) is serviced first and consumes the
    /// boundary: the interrupt entry runs instead of an instruction.
    ///
    /// # Returns
    /// The number of CPU cycles consumed, for the bus to fan out as 3x PPU
    /// dots and 1x APU cycles.
    pub fn step(&mut self, bus: &mut Bus) -> u8 {
        let interrupt_cycles = self.service_interrupts(bus);
        if interrupt_cycles > 0 {
            self.cycles = self.cycles.wrapping_add(interrupt_cycles as u64);
            return interrupt_cycles;
        }

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        let info = &OPCODE_TABLE[opcode as usize];

        let target = self.resolve_operand(info.mode, bus);
        let extra = self.dispatch(opcode, &target, bus);

        let mut cycles = info.cycles;
        if info.page_cycle && target.page_crossed {
            cycles += 1;
        }
        cycles += extra;

        self.cycles = self.cycles.wrapping_add(cycles as u64);
        cycles
    }

    /// Execute the operation for `opcode`
    ///
    /// Returns extra cycles earned beyond the table's base count (branches
    /// only).
    #[allow(clippy::too_many_lines)]
    fn dispatch(
        &mut self,
        opcode: u8,
        target: &crate::cpu::addressing::AddressingResult,
        bus: &mut Bus,
    ) -> u8 {
        match opcode {
            // Loads and stores
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => self.lda(bus, target),
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => self.ldx(bus, target),
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => self.ldy(bus, target),
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => self.sta(bus, target),
            0x86 | 0x96 | 0x8E => self.stx(bus, target),
            0x84 | 0x94 | 0x8C => self.sty(bus, target),

            // Arithmetic
            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => self.adc(bus, target),
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 => self.sbc(bus, target),
            0xE6 | 0xF6 | 0xEE | 0xFE => self.inc(bus, target),
            0xC6 | 0xD6 | 0xCE | 0xDE => self.dec(bus, target),
            0xE8 => self.inx(),
            0xC8 => self.iny(),
            0xCA => self.dex(),
            0x88 => self.dey(),

            // Logic
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => self.and(bus, target),
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => self.ora(bus, target),
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => self.eor(bus, target),
            0x24 | 0x2C => self.bit(bus, target),

            // Shifts and rotates
            0x0A => self.asl(bus, target, true),
            0x06 | 0x16 | 0x0E | 0x1E => self.asl(bus, target, false),
            0x4A => self.lsr(bus, target, true),
            0x46 | 0x56 | 0x4E | 0x5E => self.lsr(bus, target, false),
            0x2A => self.rol(bus, target, true),
            0x26 | 0x36 | 0x2E | 0x3E => self.rol(bus, target, false),
            0x6A => self.ror(bus, target, true),
            0x66 | 0x76 | 0x6E | 0x7E => self.ror(bus, target, false),

            // Compares
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => self.cmp(bus, target),
            0xE0 | 0xE4 | 0xEC => self.cpx(bus, target),
            0xC0 | 0xC4 | 0xCC => self.cpy(bus, target),

            // Branches earn their own extra cycles
            0x90 => return self.bcc(target),
            0xB0 => return self.bcs(target),
            0xF0 => return self.beq(target),
            0xD0 => return self.bne(target),
            0x30 => return self.bmi(target),
            0x10 => return self.bpl(target),
            0x50 => return self.bvc(target),
            0x70 => return self.bvs(target),

            // Jumps and subroutines
            0x4C | 0x6C => self.jmp(target),
            0x20 => self.jsr(bus, target),
            0x60 => self.rts(bus),

            // Stack
            0x48 => self.pha(bus),
            0x68 => self.pla(bus),
            0x08 => self.php(bus),
            0x28 => self.plp(bus),

            // Transfers
            0xAA => self.tax(),
            0xA8 => self.tay(),
            0x8A => self.txa(),
            0x98 => self.tya(),
            0xBA => self.tsx(),
            0x9A => self.txs(),

            // Flag operations
            0x18 => self.clc(),
            0x38 => self.sec(),
            0x58 => self.cli(),
            0x78 => self.sei(),
            0xD8 => self.cld(),
            0xF8 => self.sed(),
            0xB8 => self.clv(),

            // Control
            0x00 => self.brk(bus),
            0x40 => self.rti(bus),
            0xEA => self.nop(),

            // Unofficial opcodes
            0xA3 | 0xA7 | 0xAF | 0xB3 | 0xB7 | 0xBF | 0xAB => self.lax(bus, target),
            0x83 | 0x87 | 0x8F | 0x97 => self.sax(bus, target),
            0xC3 | 0xC7 | 0xCF | 0xD3 | 0xD7 | 0xDB | 0xDF => self.dcp(bus, target),
            0xE3 | 0xE7 | 0xEF | 0xF3 | 0xF7 | 0xFB | 0xFF => self.isb(bus, target),
            0x03 | 0x07 | 0x0F | 0x13 | 0x17 | 0x1B | 0x1F => self.slo(bus, target),
            0x23 | 0x27 | 0x2F | 0x33 | 0x37 | 0x3B | 0x3F => self.rla(bus, target),
            0x43 | 0x47 | 0x4F | 0x53 | 0x57 | 0x5B | 0x5F => self.sre(bus, target),
            0x63 | 0x67 | 0x6F | 0x73 | 0x77 | 0x7B | 0x7F => self.rra(bus, target),
            0x0B | 0x2B => self.anc(bus, target),
            0x4B => self.alr(bus, target),
            0x6B => self.arr(bus, target),
            0xCB => self.axs(bus, target),
            0xEB => self.sbc(bus, target),

            // Remaining unofficial NOPs, SHA/SHX/SHY/TAS/LAS/XAA oddities,
            // and jammed opcodes: operand bytes were consumed during
            // resolution, nothing else happens
            _ => self.nop(),
        }
        0
    }

    /// Render one reference trace line for the instruction at PC
    ///
    /// Layout matches the well-known CPU-validation log:
    /// `PC  bytes  *DISASM  A:.. X:.. Y:.. P:.. SP:.. PPU:sss,ddd CYC:n`
    /// with the `*` present only on unofficial opcodes. All memory reads go
    /// through `Bus::peek` so tracing never perturbs emulation state.
    pub fn trace(&self, bus: &Bus) -> String {
        let pc = self.pc;
        let opcode = bus.peek(pc);
        let info = &OPCODE_TABLE[opcode as usize];

        let operand_lo = bus.peek(pc.wrapping_add(1));
        let operand_hi = bus.peek(pc.wrapping_add(2));

        let raw_bytes = match info.bytes {
            1 => format!("{:02X}", opcode),
            2 => format!("{:02X} {:02X}", opcode, operand_lo),
            _ => format!("{:02X} {:02X} {:02X}", opcode, operand_lo, operand_hi),
        };

        let marker = if info.unofficial { '*' } else { ' ' };
        let disasm = self.disassemble(pc, bus, info, operand_lo, operand_hi);

        let (scanline, dot) = bus.ppu_position();

        format!(
            "{:04X}  {:<8} {}{:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PPU:{:>3},{:>3} CYC:{}",
            pc,
            raw_bytes,
            marker,
            disasm,
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            scanline,
            dot,
            self.cycles
        )
    }

    /// Disassemble the instruction at `pc` in the reference log's format
    fn disassemble(&self, pc: u16, bus: &Bus, info: &OpcodeInfo, lo: u8, hi: u8) -> String {
        let mnemonic = info.mnemonic;

        match info.mode {
            AddressingMode::Implied => mnemonic.to_string(),
            AddressingMode::Accumulator => format!("{} A", mnemonic),
            AddressingMode::Immediate => format!("{} #${:02X}", mnemonic, lo),

            AddressingMode::ZeroPage => {
                format!("{} ${:02X} = {:02X}", mnemonic, lo, bus.peek(lo as u16))
            }
            AddressingMode::ZeroPageX => {
                let addr = lo.wrapping_add(self.x);
                format!(
                    "{} ${:02X},X @ {:02X} = {:02X}",
                    mnemonic,
                    lo,
                    addr,
                    bus.peek(addr as u16)
                )
            }
            AddressingMode::ZeroPageY => {
                let addr = lo.wrapping_add(self.y);
                format!(
                    "{} ${:02X},Y @ {:02X} = {:02X}",
                    mnemonic,
                    lo,
                    addr,
                    bus.peek(addr as u16)
                )
            }

            AddressingMode::Relative => {
                let target = pc.wrapping_add(2).wrapping_add_signed(lo as i8 as i16);
                format!("{} ${:04X}", mnemonic, target)
            }

            AddressingMode::Absolute => {
                let addr = u16::from_le_bytes([lo, hi]);
                // Jumps show only the target address
                if mnemonic == "JMP" || mnemonic == "JSR" {
                    format!("{} ${:04X}", mnemonic, addr)
                } else {
                    format!("{} ${:04X} = {:02X}", mnemonic, addr, bus.peek(addr))
                }
            }
            AddressingMode::AbsoluteX => {
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(self.x as u16);
                format!(
                    "{} ${:04X},X @ {:04X} = {:02X}",
                    mnemonic,
                    base,
                    addr,
                    bus.peek(addr)
                )
            }
            AddressingMode::AbsoluteY => {
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(self.y as u16);
                format!(
                    "{} ${:04X},Y @ {:04X} = {:02X}",
                    mnemonic,
                    base,
                    addr,
                    bus.peek(addr)
                )
            }

            AddressingMode::Indirect => {
                let ptr = u16::from_le_bytes([lo, hi]);
                let target_lo = bus.peek(ptr);
                let hi_addr = if ptr & 0x00FF == 0x00FF {
                    ptr & 0xFF00
                } else {
                    ptr + 1
                };
                let target = u16::from_le_bytes([target_lo, bus.peek(hi_addr)]);
                format!("{} (${:04X}) = {:04X}", mnemonic, ptr, target)
            }

            AddressingMode::IndexedIndirect => {
                let ptr = lo.wrapping_add(self.x);
                let addr = u16::from_le_bytes([
                    bus.peek(ptr as u16),
                    bus.peek(ptr.wrapping_add(1) as u16),
                ]);
                format!(
                    "{} (${:02X},X) @ {:02X} = {:04X} = {:02X}",
                    mnemonic,
                    lo,
                    ptr,
                    addr,
                    bus.peek(addr)
                )
            }
            AddressingMode::IndirectIndexed => {
                let base = u16::from_le_bytes([
                    bus.peek(lo as u16),
                    bus.peek(lo.wrapping_add(1) as u16),
                ]);
                let addr = base.wrapping_add(self.y as u16);
                format!(
                    "{} (${:02X}),Y = {:04X} @ {:04X} = {:02X}",
                    mnemonic,
                    lo,
                    base,
                    addr,
                    bus.peek(addr)
                )
            }
        }
    }
}
