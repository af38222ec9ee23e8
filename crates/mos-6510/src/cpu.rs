//! 6510 instruction interpreter.
//!
//! Executes one complete instruction per `step()` and adds the opcode's
//! nominal cycle cost to the cycle counter. Extra cycles for page-boundary
//! crossings are deliberately not modelled; raster-level timing only needs
//! the nominal budget.
//!
//! Read-modify-write instructions with a memory operand (ASL/LSR/ROL/ROR/
//! INC/DEC) perform one read and two writes: the unmodified value is
//! written back before the result. C64 programs rely on the first write —
//! `ASL $D019` acknowledges a VIC interrupt with it — so the double write
//! is part of the contract, not an implementation detail.

use std::error::Error;
use std::fmt;

use crate::flags::{B, C, D, I, N, V, Z};
use crate::{Bus, Registers, Status};

/// Reset vector address.
const RESET_VECTOR: u16 = 0xFFFC;

/// IRQ/BRK vector address.
const IRQ_VECTOR: u16 = 0xFFFE;

/// NMI vector address.
const NMI_VECTOR: u16 = 0xFFFA;

/// Fatal decode failure: an opcode outside the documented 6502 set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalOpcode {
    /// The undecodable opcode byte.
    pub opcode: u8,
    /// Address the opcode was fetched from.
    pub pc: u16,
}

impl fmt::Display for IllegalOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal opcode ${:02X} at ${:04X}",
            self.opcode, self.pc
        )
    }
}

impl Error for IllegalOpcode {}

/// The MOS 6510 CPU.
pub struct Mos6510 {
    /// CPU registers.
    pub regs: Registers,
    /// Monotonic cycle counter. The rest of the machine clocks off this.
    cycles: u64,
}

impl Default for Mos6510 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6510 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            cycles: 0,
        }
    }

    /// Total cycles executed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Cold reset: zero the registers, clear the flags, load PC from the
    /// reset vector. The reset sequence itself costs 6 cycles.
    pub fn reset<M: Bus>(&mut self, bus: &mut M) {
        self.regs = Registers::new();
        self.regs.pc = bus.read_word(RESET_VECTOR);
        self.cycles = 6;
    }

    /// Execute one instruction.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalOpcode`] for any opcode outside the documented set;
    /// the CPU state is left as it was after the opcode fetch.
    pub fn step<M: Bus>(&mut self, bus: &mut M) -> Result<(), IllegalOpcode> {
        let opcode_pc = self.regs.pc;
        let opcode = self.fetch_op(bus);

        match opcode {
            // BRK - 7 cycles
            0x00 => self.brk(bus),
            // ORA (zp,X) - 6 cycles
            0x01 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                self.ora(v, 6);
            }
            // ORA zp - 3 cycles
            0x05 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.ora(v, 3);
            }
            // ASL zp - 5 cycles
            0x06 => {
                let addr = self.addr_zero(bus);
                self.asl_mem(bus, addr, 5);
            }
            // PHP - 3 cycles
            0x08 => {
                let v = self.regs.p.to_pushed();
                self.push(bus, v);
                self.tick(3);
            }
            // ORA #imm - 2 cycles
            0x09 => {
                let v = self.fetch_op(bus);
                self.ora(v, 2);
            }
            // ASL A - 2 cycles
            0x0A => {
                self.regs.a = self.asl(self.regs.a);
                self.tick(2);
            }
            // ORA abs - 4 cycles
            0x0D => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.ora(v, 4);
            }
            // ASL abs - 6 cycles
            0x0E => {
                let addr = self.addr_abs(bus);
                self.asl_mem(bus, addr, 6);
            }
            // BPL rel - 2 cycles
            0x10 => {
                let taken = !self.regs.p.is_set(N);
                self.branch(bus, taken);
            }
            // ORA (zp),Y - 5 cycles
            0x11 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                self.ora(v, 5);
            }
            // ORA zp,X - 4 cycles
            0x15 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.ora(v, 4);
            }
            // ASL zp,X - 6 cycles
            0x16 => {
                let addr = self.addr_zero_x(bus);
                self.asl_mem(bus, addr, 6);
            }
            // CLC - 2 cycles
            0x18 => {
                self.regs.p.clear(C);
                self.tick(2);
            }
            // ORA abs,Y - 4 cycles
            0x19 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.ora(v, 4);
            }
            // ORA abs,X - 4 cycles
            0x1D => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.ora(v, 4);
            }
            // ASL abs,X - 7 cycles
            0x1E => {
                let addr = self.addr_abs_x(bus);
                self.asl_mem(bus, addr, 7);
            }
            // JSR abs - 6 cycles
            0x20 => self.jsr(bus),
            // AND (zp,X) - 6 cycles
            0x21 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                self.and_a(v, 6);
            }
            // BIT zp - 3 cycles
            0x24 => {
                let addr = self.addr_zero(bus);
                self.bit(bus, addr, 3);
            }
            // AND zp - 3 cycles
            0x25 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.and_a(v, 3);
            }
            // ROL zp - 5 cycles
            0x26 => {
                let addr = self.addr_zero(bus);
                self.rol_mem(bus, addr, 5);
            }
            // PLP - 4 cycles
            0x28 => {
                let v = self.pop(bus);
                self.regs.p = Status::from_pulled(v);
                self.tick(4);
            }
            // AND #imm - 2 cycles
            0x29 => {
                let v = self.fetch_op(bus);
                self.and_a(v, 2);
            }
            // ROL A - 2 cycles
            0x2A => {
                self.regs.a = self.rol(self.regs.a);
                self.tick(2);
            }
            // BIT abs - 4 cycles
            0x2C => {
                let addr = self.addr_abs(bus);
                self.bit(bus, addr, 4);
            }
            // AND abs - 4 cycles
            0x2D => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.and_a(v, 4);
            }
            // ROL abs - 6 cycles
            0x2E => {
                let addr = self.addr_abs(bus);
                self.rol_mem(bus, addr, 6);
            }
            // BMI rel - 2 cycles
            0x30 => {
                let taken = self.regs.p.is_set(N);
                self.branch(bus, taken);
            }
            // AND (zp),Y - 5 cycles
            0x31 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                self.and_a(v, 5);
            }
            // AND zp,X - 4 cycles
            0x35 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.and_a(v, 4);
            }
            // ROL zp,X - 6 cycles
            0x36 => {
                let addr = self.addr_zero_x(bus);
                self.rol_mem(bus, addr, 6);
            }
            // SEC - 2 cycles
            0x38 => {
                self.regs.p.set(C);
                self.tick(2);
            }
            // AND abs,Y - 4 cycles
            0x39 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.and_a(v, 4);
            }
            // AND abs,X - 4 cycles
            0x3D => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.and_a(v, 4);
            }
            // ROL abs,X - 7 cycles
            0x3E => {
                let addr = self.addr_abs_x(bus);
                self.rol_mem(bus, addr, 7);
            }
            // RTI - 7 cycles
            0x40 => self.rti(bus),
            // EOR (zp,X) - 6 cycles
            0x41 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                self.eor(v, 6);
            }
            // EOR zp - 3 cycles
            0x45 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.eor(v, 3);
            }
            // LSR zp - 5 cycles
            0x46 => {
                let addr = self.addr_zero(bus);
                self.lsr_mem(bus, addr, 5);
            }
            // PHA - 3 cycles
            0x48 => {
                let v = self.regs.a;
                self.push(bus, v);
                self.tick(3);
            }
            // EOR #imm - 2 cycles
            0x49 => {
                let v = self.fetch_op(bus);
                self.eor(v, 2);
            }
            // LSR A - 2 cycles
            0x4A => {
                self.regs.a = self.lsr(self.regs.a);
                self.tick(2);
            }
            // JMP abs - 3 cycles
            0x4C => {
                let addr = self.addr_abs(bus);
                self.regs.pc = addr;
                self.tick(3);
            }
            // EOR abs - 4 cycles
            0x4D => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.eor(v, 4);
            }
            // LSR abs - 6 cycles
            0x4E => {
                let addr = self.addr_abs(bus);
                self.lsr_mem(bus, addr, 6);
            }
            // BVC rel - 2 cycles
            0x50 => {
                let taken = !self.regs.p.is_set(V);
                self.branch(bus, taken);
            }
            // EOR (zp),Y - 5 cycles
            0x51 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                self.eor(v, 5);
            }
            // EOR zp,X - 4 cycles
            0x55 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.eor(v, 4);
            }
            // LSR zp,X - 6 cycles
            0x56 => {
                let addr = self.addr_zero_x(bus);
                self.lsr_mem(bus, addr, 6);
            }
            // CLI - 2 cycles
            0x58 => {
                self.regs.p.clear(I);
                self.tick(2);
            }
            // EOR abs,Y - 4 cycles
            0x59 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.eor(v, 4);
            }
            // EOR abs,X - 4 cycles
            0x5D => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.eor(v, 4);
            }
            // LSR abs,X - 7 cycles
            0x5E => {
                let addr = self.addr_abs_x(bus);
                self.lsr_mem(bus, addr, 7);
            }
            // RTS - 6 cycles
            0x60 => self.rts(bus),
            // ADC (zp,X) - 6 cycles
            0x61 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                self.adc(v, 6);
            }
            // ADC zp - 3 cycles
            0x65 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.adc(v, 3);
            }
            // ROR zp - 5 cycles
            0x66 => {
                let addr = self.addr_zero(bus);
                self.ror_mem(bus, addr, 5);
            }
            // PLA - 4 cycles
            0x68 => {
                let v = self.pop(bus);
                self.regs.a = v;
                self.regs.p.update_nz(v);
                self.tick(4);
            }
            // ADC #imm - 2 cycles
            0x69 => {
                let v = self.fetch_op(bus);
                self.adc(v, 2);
            }
            // ROR A - 2 cycles
            0x6A => {
                self.regs.a = self.ror(self.regs.a);
                self.tick(2);
            }
            // JMP (ind) - 3 cycles
            0x6C => {
                let ptr = self.addr_abs(bus);
                self.regs.pc = bus.read_word(ptr);
                self.tick(3);
            }
            // ADC abs - 4 cycles
            0x6D => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.adc(v, 4);
            }
            // ROR abs - 6 cycles
            0x6E => {
                let addr = self.addr_abs(bus);
                self.ror_mem(bus, addr, 6);
            }
            // BVS rel - 2 cycles
            0x70 => {
                let taken = self.regs.p.is_set(V);
                self.branch(bus, taken);
            }
            // ADC (zp),Y - 5 cycles
            0x71 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                self.adc(v, 5);
            }
            // ADC zp,X - 4 cycles
            0x75 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.adc(v, 4);
            }
            // ROR zp,X - 6 cycles
            0x76 => {
                let addr = self.addr_zero_x(bus);
                self.ror_mem(bus, addr, 6);
            }
            // SEI - 2 cycles
            0x78 => {
                self.regs.p.set(I);
                self.tick(2);
            }
            // ADC abs,Y - 4 cycles
            0x79 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.adc(v, 4);
            }
            // ADC abs,X - 4 cycles
            0x7D => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.adc(v, 4);
            }
            // ROR abs,X - 7 cycles
            0x7E => {
                let addr = self.addr_abs_x(bus);
                self.ror_mem(bus, addr, 7);
            }
            // STA (zp,X) - 6 cycles
            0x81 => {
                let addr = self.addr_ind_x(bus);
                bus.write(addr, self.regs.a);
                self.tick(6);
            }
            // STY zp - 3 cycles
            0x84 => {
                let addr = self.addr_zero(bus);
                bus.write(addr, self.regs.y);
                self.tick(3);
            }
            // STA zp - 3 cycles
            0x85 => {
                let addr = self.addr_zero(bus);
                bus.write(addr, self.regs.a);
                self.tick(3);
            }
            // STX zp - 3 cycles
            0x86 => {
                let addr = self.addr_zero(bus);
                bus.write(addr, self.regs.x);
                self.tick(3);
            }
            // DEY - 2 cycles
            0x88 => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                let y = self.regs.y;
                self.regs.p.update_nz(y);
                self.tick(2);
            }
            // TXA - 2 cycles
            0x8A => {
                self.regs.a = self.regs.x;
                let a = self.regs.a;
                self.regs.p.update_nz(a);
                self.tick(2);
            }
            // STY abs - 4 cycles
            0x8C => {
                let addr = self.addr_abs(bus);
                bus.write(addr, self.regs.y);
                self.tick(4);
            }
            // STA abs - 4 cycles
            0x8D => {
                let addr = self.addr_abs(bus);
                bus.write(addr, self.regs.a);
                self.tick(4);
            }
            // STX abs - 4 cycles
            0x8E => {
                let addr = self.addr_abs(bus);
                bus.write(addr, self.regs.x);
                self.tick(4);
            }
            // BCC rel - 2 cycles
            0x90 => {
                let taken = !self.regs.p.is_set(C);
                self.branch(bus, taken);
            }
            // STA (zp),Y - 6 cycles
            0x91 => {
                let addr = self.addr_ind_y(bus);
                bus.write(addr, self.regs.a);
                self.tick(6);
            }
            // STY zp,X - 4 cycles
            0x94 => {
                let addr = self.addr_zero_x(bus);
                bus.write(addr, self.regs.y);
                self.tick(4);
            }
            // STA zp,X - 4 cycles
            0x95 => {
                let addr = self.addr_zero_x(bus);
                bus.write(addr, self.regs.a);
                self.tick(4);
            }
            // STX zp,Y - 4 cycles
            0x96 => {
                let addr = self.addr_zero_y(bus);
                bus.write(addr, self.regs.x);
                self.tick(4);
            }
            // TYA - 2 cycles
            0x98 => {
                self.regs.a = self.regs.y;
                let a = self.regs.a;
                self.regs.p.update_nz(a);
                self.tick(2);
            }
            // STA abs,Y - 5 cycles
            0x99 => {
                let addr = self.addr_abs_y(bus);
                bus.write(addr, self.regs.a);
                self.tick(5);
            }
            // TXS - 2 cycles (no flags)
            0x9A => {
                self.regs.s = self.regs.x;
                self.tick(2);
            }
            // STA abs,X - 5 cycles
            0x9D => {
                let addr = self.addr_abs_x(bus);
                bus.write(addr, self.regs.a);
                self.tick(5);
            }
            // LDY #imm - 2 cycles
            0xA0 => {
                let v = self.fetch_op(bus);
                self.ldy(v, 2);
            }
            // LDA (zp,X) - 6 cycles
            0xA1 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                self.lda(v, 6);
            }
            // LDX #imm - 2 cycles
            0xA2 => {
                let v = self.fetch_op(bus);
                self.ldx(v, 2);
            }
            // LDY zp - 3 cycles
            0xA4 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.ldy(v, 3);
            }
            // LDA zp - 3 cycles
            0xA5 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.lda(v, 3);
            }
            // LDX zp - 3 cycles
            0xA6 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.ldx(v, 3);
            }
            // TAY - 2 cycles
            0xA8 => {
                self.regs.y = self.regs.a;
                let y = self.regs.y;
                self.regs.p.update_nz(y);
                self.tick(2);
            }
            // LDA #imm - 2 cycles
            0xA9 => {
                let v = self.fetch_op(bus);
                self.lda(v, 2);
            }
            // TAX - 2 cycles
            0xAA => {
                self.regs.x = self.regs.a;
                let x = self.regs.x;
                self.regs.p.update_nz(x);
                self.tick(2);
            }
            // LDY abs - 4 cycles
            0xAC => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.ldy(v, 4);
            }
            // LDA abs - 4 cycles
            0xAD => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.lda(v, 4);
            }
            // LDX abs - 4 cycles
            0xAE => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.ldx(v, 4);
            }
            // BCS rel - 2 cycles
            0xB0 => {
                let taken = self.regs.p.is_set(C);
                self.branch(bus, taken);
            }
            // LDA (zp),Y - 5 cycles
            0xB1 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                self.lda(v, 5);
            }
            // LDY zp,X - 3 cycles
            0xB4 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.ldy(v, 3);
            }
            // LDA zp,X - 3 cycles
            0xB5 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.lda(v, 3);
            }
            // LDX zp,Y - 3 cycles
            0xB6 => {
                let addr = self.addr_zero_y(bus);
                let v = bus.read(addr);
                self.ldx(v, 3);
            }
            // CLV - 2 cycles
            0xB8 => {
                self.regs.p.clear(V);
                self.tick(2);
            }
            // LDA abs,Y - 4 cycles
            0xB9 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.lda(v, 4);
            }
            // TSX - 2 cycles
            0xBA => {
                self.regs.x = self.regs.s;
                let x = self.regs.x;
                self.regs.p.update_nz(x);
                self.tick(2);
            }
            // LDY abs,X - 4 cycles
            0xBC => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.ldy(v, 4);
            }
            // LDA abs,X - 4 cycles
            0xBD => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.lda(v, 4);
            }
            // LDX abs,Y - 4 cycles
            0xBE => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.ldx(v, 4);
            }
            // CPY #imm - 2 cycles
            0xC0 => {
                let v = self.fetch_op(bus);
                let y = self.regs.y;
                self.compare(y, v, 2);
            }
            // CMP (zp,X) - 6 cycles
            0xC1 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 6);
            }
            // CPY zp - 3 cycles
            0xC4 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                let y = self.regs.y;
                self.compare(y, v, 3);
            }
            // CMP zp - 3 cycles
            0xC5 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 3);
            }
            // DEC zp - 5 cycles
            0xC6 => {
                let addr = self.addr_zero(bus);
                self.dec_mem(bus, addr, 5);
            }
            // INY - 2 cycles
            0xC8 => {
                self.regs.y = self.regs.y.wrapping_add(1);
                let y = self.regs.y;
                self.regs.p.update_nz(y);
                self.tick(2);
            }
            // CMP #imm - 2 cycles
            0xC9 => {
                let v = self.fetch_op(bus);
                let a = self.regs.a;
                self.compare(a, v, 2);
            }
            // DEX - 2 cycles
            0xCA => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                let x = self.regs.x;
                self.regs.p.update_nz(x);
                self.tick(2);
            }
            // CPY abs - 4 cycles
            0xCC => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                let y = self.regs.y;
                self.compare(y, v, 4);
            }
            // CMP abs - 4 cycles
            0xCD => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 4);
            }
            // DEC abs - 6 cycles
            0xCE => {
                let addr = self.addr_abs(bus);
                self.dec_mem(bus, addr, 6);
            }
            // BNE rel - 2 cycles
            0xD0 => {
                let taken = !self.regs.p.is_set(Z);
                self.branch(bus, taken);
            }
            // CMP (zp),Y - 5 cycles
            0xD1 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 5);
            }
            // CMP zp,X - 4 cycles
            0xD5 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 4);
            }
            // DEC zp,X - 6 cycles
            0xD6 => {
                let addr = self.addr_zero_x(bus);
                self.dec_mem(bus, addr, 6);
            }
            // CLD - 2 cycles
            0xD8 => {
                self.regs.p.clear(D);
                self.tick(2);
            }
            // CMP abs,Y - 4 cycles
            0xD9 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 4);
            }
            // CMP abs,X - 4 cycles
            0xDD => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                let a = self.regs.a;
                self.compare(a, v, 4);
            }
            // DEC abs,X - 7 cycles
            0xDE => {
                let addr = self.addr_abs_x(bus);
                self.dec_mem(bus, addr, 7);
            }
            // CPX #imm - 2 cycles
            0xE0 => {
                let v = self.fetch_op(bus);
                let x = self.regs.x;
                self.compare(x, v, 2);
            }
            // SBC (zp,X) - 6 cycles
            0xE1 => {
                let addr = self.addr_ind_x(bus);
                let v = bus.read(addr);
                self.sbc(v, 6);
            }
            // CPX zp - 3 cycles
            0xE4 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                let x = self.regs.x;
                self.compare(x, v, 3);
            }
            // SBC zp - 3 cycles
            0xE5 => {
                let addr = self.addr_zero(bus);
                let v = bus.read(addr);
                self.sbc(v, 3);
            }
            // INC zp - 5 cycles
            0xE6 => {
                let addr = self.addr_zero(bus);
                self.inc_mem(bus, addr, 5);
            }
            // INX - 2 cycles
            0xE8 => {
                self.regs.x = self.regs.x.wrapping_add(1);
                let x = self.regs.x;
                self.regs.p.update_nz(x);
                self.tick(2);
            }
            // SBC #imm - 2 cycles
            0xE9 => {
                let v = self.fetch_op(bus);
                self.sbc(v, 2);
            }
            // NOP - 2 cycles
            0xEA => self.tick(2),
            // CPX abs - 4 cycles
            0xEC => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                let x = self.regs.x;
                self.compare(x, v, 4);
            }
            // SBC abs - 4 cycles
            0xED => {
                let addr = self.addr_abs(bus);
                let v = bus.read(addr);
                self.sbc(v, 4);
            }
            // INC abs - 6 cycles
            0xEE => {
                let addr = self.addr_abs(bus);
                self.inc_mem(bus, addr, 6);
            }
            // BEQ rel - 2 cycles
            0xF0 => {
                let taken = self.regs.p.is_set(Z);
                self.branch(bus, taken);
            }
            // SBC (zp),Y - 5 cycles
            0xF1 => {
                let addr = self.addr_ind_y(bus);
                let v = bus.read(addr);
                self.sbc(v, 5);
            }
            // SBC zp,X - 4 cycles
            0xF5 => {
                let addr = self.addr_zero_x(bus);
                let v = bus.read(addr);
                self.sbc(v, 4);
            }
            // INC zp,X - 6 cycles
            0xF6 => {
                let addr = self.addr_zero_x(bus);
                self.inc_mem(bus, addr, 6);
            }
            // SED - 2 cycles
            0xF8 => {
                self.regs.p.set(D);
                self.tick(2);
            }
            // SBC abs,Y - 4 cycles
            0xF9 => {
                let addr = self.addr_abs_y(bus);
                let v = bus.read(addr);
                self.sbc(v, 4);
            }
            // SBC abs,X - 4 cycles
            0xFD => {
                let addr = self.addr_abs_x(bus);
                let v = bus.read(addr);
                self.sbc(v, 4);
            }
            // INC abs,X - 7 cycles
            0xFE => {
                let addr = self.addr_abs_x(bus);
                self.inc_mem(bus, addr, 7);
            }
            // Undocumented opcodes are a hard stop.
            _ => {
                return Err(IllegalOpcode {
                    opcode,
                    pc: opcode_pc,
                })
            }
        }

        Ok(())
    }

    /// Maskable interrupt request. Ignored while the I flag is set;
    /// otherwise pushes PC and flags (break clear) and vectors via $FFFE.
    pub fn irq<M: Bus>(&mut self, bus: &mut M) {
        if self.regs.p.is_set(I) {
            return;
        }
        let pc = self.regs.pc;
        self.push(bus, (pc >> 8) as u8);
        self.push(bus, (pc & 0xFF) as u8);
        let flags = self.regs.p.to_pushed_irq();
        self.push(bus, flags);
        self.regs.pc = bus.read_word(IRQ_VECTOR);
        self.regs.p.set(I);
        self.tick(7);
    }

    /// Non-maskable interrupt: pushes PC and flags (break clear) and
    /// vectors via $FFFA regardless of the I flag.
    pub fn nmi<M: Bus>(&mut self, bus: &mut M) {
        let pc = self.regs.pc;
        self.push(bus, (pc >> 8) as u8);
        self.push(bus, (pc & 0xFF) as u8);
        let flags = self.regs.p.to_pushed_irq();
        self.push(bus, flags);
        self.regs.pc = bus.read_word(NMI_VECTOR);
        self.tick(7);
    }

    // Fetch and addressing ---------------------------------------------

    fn tick(&mut self, cycles: u64) {
        self.cycles += cycles;
    }

    fn fetch_op<M: Bus>(&mut self, bus: &mut M) -> u8 {
        let v = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        v
    }

    fn fetch_word<M: Bus>(&mut self, bus: &mut M) -> u16 {
        let v = bus.read_word(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(2);
        v
    }

    fn addr_zero<M: Bus>(&mut self, bus: &mut M) -> u16 {
        u16::from(self.fetch_op(bus))
    }

    /// Zero page indexed by X; the sum wraps within page zero.
    fn addr_zero_x<M: Bus>(&mut self, bus: &mut M) -> u16 {
        u16::from(self.fetch_op(bus).wrapping_add(self.regs.x))
    }

    /// Zero page indexed by Y; the sum wraps within page zero.
    fn addr_zero_y<M: Bus>(&mut self, bus: &mut M) -> u16 {
        u16::from(self.fetch_op(bus).wrapping_add(self.regs.y))
    }

    fn addr_abs<M: Bus>(&mut self, bus: &mut M) -> u16 {
        self.fetch_word(bus)
    }

    fn addr_abs_x<M: Bus>(&mut self, bus: &mut M) -> u16 {
        let x = self.regs.x;
        self.fetch_word(bus).wrapping_add(u16::from(x))
    }

    fn addr_abs_y<M: Bus>(&mut self, bus: &mut M) -> u16 {
        let y = self.regs.y;
        self.fetch_word(bus).wrapping_add(u16::from(y))
    }

    /// (zp,X): the pointer base wraps in page zero before the word fetch.
    fn addr_ind_x<M: Bus>(&mut self, bus: &mut M) -> u16 {
        let ptr = u16::from(self.fetch_op(bus).wrapping_add(self.regs.x));
        bus.read_word(ptr)
    }

    /// (zp),Y: word fetch from the zero-page pointer, then index by Y.
    fn addr_ind_y<M: Bus>(&mut self, bus: &mut M) -> u16 {
        let ptr = u16::from(self.fetch_op(bus));
        bus.read_word(ptr).wrapping_add(u16::from(self.regs.y))
    }

    // Stack ------------------------------------------------------------

    fn push<M: Bus>(&mut self, bus: &mut M, value: u8) {
        let addr = self.regs.push_addr();
        bus.write(addr, value);
    }

    fn pop<M: Bus>(&mut self, bus: &mut M) -> u8 {
        let addr = self.regs.pop_addr();
        bus.read(addr)
    }

    // Loads, logic and arithmetic --------------------------------------

    fn lda(&mut self, value: u8, cycles: u64) {
        self.regs.a = value;
        self.regs.p.update_nz(value);
        self.tick(cycles);
    }

    fn ldx(&mut self, value: u8, cycles: u64) {
        self.regs.x = value;
        self.regs.p.update_nz(value);
        self.tick(cycles);
    }

    fn ldy(&mut self, value: u8, cycles: u64) {
        self.regs.y = value;
        self.regs.p.update_nz(value);
        self.tick(cycles);
    }

    fn ora(&mut self, value: u8, cycles: u64) {
        self.regs.a |= value;
        let a = self.regs.a;
        self.regs.p.update_nz(a);
        self.tick(cycles);
    }

    fn and_a(&mut self, value: u8, cycles: u64) {
        self.regs.a &= value;
        let a = self.regs.a;
        self.regs.p.update_nz(a);
        self.tick(cycles);
    }

    fn eor(&mut self, value: u8, cycles: u64) {
        self.regs.a ^= value;
        let a = self.regs.a;
        self.regs.p.update_nz(a);
        self.tick(cycles);
    }

    fn bit<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let t = bus.read(addr);
        self.regs.p.set_if(V, t & 0x40 != 0);
        self.regs.p.set_if(N, t & 0x80 != 0);
        let masked = t & self.regs.a;
        self.regs.p.set_if(Z, masked == 0);
        self.tick(cycles);
    }

    /// Add with carry. In decimal mode the low and high nibbles are fixed
    /// up separately; N/Z come from the corrected result (the real NMOS
    /// part leaves them undefined in decimal mode).
    fn adc(&mut self, value: u8, cycles: u64) {
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let carry_in = u16::from(self.regs.p.is_set(C));

        let mut t;
        if self.regs.p.is_set(D) {
            t = (a & 0x0F) + (v & 0x0F) + carry_in;
            if t > 0x09 {
                t += 0x06;
            }
            t += (a & 0xF0) + (v & 0xF0);
            if (t & 0x1F0) > 0x90 {
                t += 0x60;
            }
        } else {
            t = a + v + carry_in;
        }

        self.regs.p.set_if(C, t > 0xFF);
        let t = (t & 0xFF) as u8;
        let overflow = (a as u8 ^ value) & 0x80 == 0 && (a as u8 ^ t) & 0x80 != 0;
        self.regs.p.set_if(V, overflow);
        self.regs.p.update_nz(t);
        self.regs.a = t;
        self.tick(cycles);
    }

    /// Subtract with carry (carry clear = borrow). Decimal mode fixes up
    /// each nibble on borrow, mirroring the ADC correction.
    fn sbc(&mut self, value: u8, cycles: u64) {
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let borrow = u16::from(!self.regs.p.is_set(C));

        let mut t;
        if self.regs.p.is_set(D) {
            t = (a & 0x0F).wrapping_sub(v & 0x0F).wrapping_sub(borrow);
            if t & 0x10 != 0 {
                t = (t.wrapping_sub(0x06) & 0x0F)
                    | (a & 0xF0).wrapping_sub(v & 0xF0).wrapping_sub(0x10);
            } else {
                t = (t & 0x0F) | (a & 0xF0).wrapping_sub(v & 0xF0);
            }
            if t & 0x100 != 0 {
                t = t.wrapping_sub(0x60);
            }
        } else {
            t = a.wrapping_sub(v).wrapping_sub(borrow);
        }

        self.regs.p.set_if(C, t < 0x100);
        let t = (t & 0xFF) as u8;
        let overflow = (a as u8 ^ t) & 0x80 != 0 && (a as u8 ^ value) & 0x80 != 0;
        self.regs.p.set_if(V, overflow);
        self.regs.p.update_nz(t);
        self.regs.a = t;
        self.tick(cycles);
    }

    fn compare(&mut self, reg: u8, value: u8, cycles: u64) {
        let t = u16::from(reg).wrapping_sub(u16::from(value));
        self.regs.p.set_if(C, t < 0x100);
        self.regs.p.update_nz((t & 0xFF) as u8);
        self.tick(cycles);
    }

    // Shifts and rotates -----------------------------------------------

    fn asl(&mut self, value: u8) -> u8 {
        let t = value << 1;
        self.regs.p.set_if(C, value & 0x80 != 0);
        self.regs.p.update_nz(t);
        t
    }

    fn lsr(&mut self, value: u8) -> u8 {
        let t = value >> 1;
        self.regs.p.set_if(C, value & 0x01 != 0);
        self.regs.p.update_nz(t);
        t
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u16::from(self.regs.p.is_set(C));
        let t = (u16::from(value) << 1) | carry_in;
        self.regs.p.set_if(C, t & 0x100 != 0);
        let t = (t & 0xFF) as u8;
        self.regs.p.update_nz(t);
        t
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.is_set(C)) << 7;
        let t = (value >> 1) | carry_in;
        self.regs.p.set_if(C, value & 0x01 != 0);
        self.regs.p.update_nz(t);
        t
    }

    // Read-modify-write memory operands: read, write back the unmodified
    // value, then write the result.

    fn asl_mem<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let v = bus.read(addr);
        bus.write(addr, v);
        let r = self.asl(v);
        bus.write(addr, r);
        self.tick(cycles);
    }

    fn lsr_mem<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let v = bus.read(addr);
        bus.write(addr, v);
        let r = self.lsr(v);
        bus.write(addr, r);
        self.tick(cycles);
    }

    fn rol_mem<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let v = bus.read(addr);
        bus.write(addr, v);
        let r = self.rol(v);
        bus.write(addr, r);
        self.tick(cycles);
    }

    fn ror_mem<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let v = bus.read(addr);
        bus.write(addr, v);
        let r = self.ror(v);
        bus.write(addr, r);
        self.tick(cycles);
    }

    fn inc_mem<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let v = bus.read(addr);
        bus.write(addr, v);
        let r = v.wrapping_add(1);
        bus.write(addr, r);
        self.regs.p.update_nz(r);
        self.tick(cycles);
    }

    fn dec_mem<M: Bus>(&mut self, bus: &mut M, addr: u16, cycles: u64) {
        let v = bus.read(addr);
        bus.write(addr, v);
        let r = v.wrapping_sub(1);
        bus.write(addr, r);
        self.regs.p.update_nz(r);
        self.tick(cycles);
    }

    // Control flow -----------------------------------------------------

    /// Conditional relative branch. The signed offset is applied to PC
    /// after the operand fetch.
    fn branch<M: Bus>(&mut self, bus: &mut M, taken: bool) {
        let offset = self.fetch_op(bus) as i8;
        let target = self.regs.pc.wrapping_add(offset as u16);
        if taken {
            self.regs.pc = target;
        }
        self.tick(2);
    }

    /// JSR pushes the address of its own last byte (PC - 1), not the next
    /// instruction; RTS compensates by adding 1.
    fn jsr<M: Bus>(&mut self, bus: &mut M) {
        let addr = self.addr_abs(bus);
        let ret = self.regs.pc.wrapping_sub(1);
        self.push(bus, (ret >> 8) as u8);
        self.push(bus, (ret & 0xFF) as u8);
        self.regs.pc = addr;
        self.tick(6);
    }

    fn rts<M: Bus>(&mut self, bus: &mut M) {
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        self.regs.pc = (lo | (hi << 8)).wrapping_add(1);
        self.tick(6);
    }

    /// BRK pushes PC + 1 (skipping the padding byte) and the flags with
    /// the break bit forced set, then vectors via $FFFE with I set.
    fn brk<M: Bus>(&mut self, bus: &mut M) {
        let pc = self.regs.pc.wrapping_add(1);
        self.push(bus, (pc >> 8) as u8);
        self.push(bus, (pc & 0xFF) as u8);
        let flags = self.regs.p.to_pushed();
        self.push(bus, flags);
        self.regs.pc = bus.read_word(IRQ_VECTOR);
        self.regs.p.set(I);
        self.regs.p.set(B);
        self.tick(7);
    }

    fn rti<M: Bus>(&mut self, bus: &mut M) {
        let flags = self.pop(bus);
        self.regs.p = Status::from_pulled(flags);
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        self.regs.pc = lo | (hi << 8);
        self.tick(7);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatRam;

    /// Run `program` placed at $0200 until `steps` instructions complete.
    fn run(program: &[u8], steps: usize) -> (Mos6510, FlatRam) {
        let mut bus = FlatRam::new();
        bus.load(0x0200, program);
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        for _ in 0..steps {
            cpu.step(&mut bus).expect("legal program");
        }
        (cpu, bus)
    }

    #[test]
    fn reset_loads_vector_and_costs_six_cycles() {
        let mut bus = FlatRam::new();
        bus.write(0xFFFC, 0x00);
        bus.write(0xFFFD, 0xE0);
        let mut cpu = Mos6510::new();
        cpu.reset(&mut bus);
        assert_eq!(cpu.regs.pc, 0xE000);
        assert_eq!(cpu.cycles(), 6);
        assert_eq!(cpu.regs.a, 0);
        assert_eq!(cpu.regs.s, 0);
    }

    #[test]
    fn illegal_opcode_reports_fetch_address() {
        let mut bus = FlatRam::new();
        bus.write(0x0200, 0x02); // JAM on real silicon
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        let err = cpu.step(&mut bus).unwrap_err();
        assert_eq!(err.opcode, 0x02);
        assert_eq!(err.pc, 0x0200);
    }

    #[test]
    fn lda_sets_nz() {
        let (cpu, _) = run(&[0xA9, 0x00], 1); // LDA #$00
        assert!(cpu.regs.p.is_set(Z));
        let (cpu, _) = run(&[0xA9, 0x80], 1); // LDA #$80
        assert!(cpu.regs.p.is_set(N));
        assert!(!cpu.regs.p.is_set(Z));
    }

    #[test]
    fn binary_adc_carry_and_overflow() {
        // LDA #$7F; ADC #$01 -> $80, V set, C clear
        let (cpu, _) = run(&[0xA9, 0x7F, 0x69, 0x01], 2);
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.p.is_set(V));
        assert!(!cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));

        // LDA #$FF; ADC #$01 -> $00, C set, Z set, V clear
        let (cpu, _) = run(&[0xA9, 0xFF, 0x69, 0x01], 2);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(Z));
        assert!(!cpu.regs.p.is_set(V));
    }

    #[test]
    fn decimal_adc() {
        // SED; LDA #$15; ADC #$27 -> $42, C clear
        let (cpu, _) = run(&[0xF8, 0xA9, 0x15, 0x69, 0x27], 3);
        assert_eq!(cpu.regs.a, 0x42);
        assert!(!cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(Z));
        assert!(!cpu.regs.p.is_set(N));

        // SED; LDA #$58; ADC #$46 -> $04, C set
        let (cpu, _) = run(&[0xF8, 0xA9, 0x58, 0x69, 0x46], 3);
        assert_eq!(cpu.regs.a, 0x04);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn decimal_sbc() {
        // SED; SEC; LDA #$42; SBC #$27 -> $15, C set (no borrow)
        let (cpu, _) = run(&[0xF8, 0x38, 0xA9, 0x42, 0xE9, 0x27], 4);
        assert_eq!(cpu.regs.a, 0x15);
        assert!(cpu.regs.p.is_set(C));

        // SED; SEC; LDA #$12; SBC #$21 -> $91, borrow (C clear)
        let (cpu, _) = run(&[0xF8, 0x38, 0xA9, 0x12, 0xE9, 0x21], 4);
        assert_eq!(cpu.regs.a, 0x91);
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn binary_sbc_borrow() {
        // SEC; LDA #$05; SBC #$0A -> $FB, C clear (borrow)
        let (cpu, _) = run(&[0x38, 0xA9, 0x05, 0xE9, 0x0A], 3);
        assert_eq!(cpu.regs.a, 0xFB);
        assert!(!cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn jsr_rts_symmetry() {
        let mut bus = FlatRam::new();
        // $1000: JSR $2000; NOP
        bus.load(0x1000, &[0x20, 0x00, 0x20]);
        // $2000: RTS
        bus.write(0x2000, 0x60);
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x1000;
        cpu.regs.s = 0xFF;
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, 0x2000);
        assert_eq!(cpu.regs.s, 0xFD);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, 0x1003);
        assert_eq!(cpu.regs.s, 0xFF);
    }

    #[test]
    fn compare_sets_carry_on_greater_equal() {
        let (cpu, _) = run(&[0xA9, 0x40, 0xC9, 0x40], 2); // LDA #$40; CMP #$40
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(Z));

        let (cpu, _) = run(&[0xA9, 0x40, 0xC9, 0x41], 2); // CMP #$41
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn branch_applies_signed_offset() {
        // LDA #$00; BEQ +1 (skips the first INX)
        let (cpu, _) = run(&[0xA9, 0x00, 0xF0, 0x01, 0xE8, 0xE8, 0xEA], 3);
        assert_eq!(cpu.regs.pc, 0x0206);
        assert_eq!(cpu.regs.x, 1); // only the second INX ran

        // Backward branch: BNE -2 spins on itself
        let mut bus = FlatRam::new();
        bus.load(0x0200, &[0xA9, 0x01, 0xD0, 0xFE]);
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, 0x0202);
    }

    #[test]
    fn zero_page_indexed_wraps() {
        let mut bus = FlatRam::new();
        bus.write(0x0004, 0x77); // ($FF + $05) & $FF = $04
        bus.load(0x0200, &[0xA2, 0x05, 0xB5, 0xFF]); // LDX #$05; LDA $FF,X
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a, 0x77);
    }

    #[test]
    fn indexed_indirect_pointer_wraps_in_zero_page() {
        let mut bus = FlatRam::new();
        bus.write(0x0004, 0x34); // pointer lo at ($FF + $05) & $FF
        bus.write(0x0005, 0x12); // pointer hi
        bus.write(0x1234, 0x99);
        bus.load(0x0200, &[0xA2, 0x05, 0xA1, 0xFF]); // LDX #$05; LDA ($FF,X)
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a, 0x99);
    }

    #[test]
    fn indirect_indexed_adds_y() {
        let mut bus = FlatRam::new();
        bus.write(0x0080, 0x00);
        bus.write(0x0081, 0x40);
        bus.write(0x4003, 0x55);
        bus.load(0x0200, &[0xA0, 0x03, 0xB1, 0x80]); // LDY #$03; LDA ($80),Y
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a, 0x55);
    }

    #[test]
    fn asl_rol_carry_chain() {
        // SEC; LDA #$80; ROL A -> $01, C set (bit 7 out, carry in)
        let (cpu, _) = run(&[0x38, 0xA9, 0x80, 0x2A], 3);
        assert_eq!(cpu.regs.a, 0x01);
        assert!(cpu.regs.p.is_set(C));

        // LDA #$01; LSR A -> $00, C set, Z set
        let (cpu, _) = run(&[0xA9, 0x01, 0x4A], 2);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(Z));
    }

    #[test]
    fn bit_copies_operand_flags() {
        let mut bus = FlatRam::new();
        bus.write(0x0010, 0xC0); // N and V source bits set
        bus.load(0x0200, &[0xA9, 0x00, 0x24, 0x10]); // LDA #$00; BIT $10
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert!(cpu.regs.p.is_set(N));
        assert!(cpu.regs.p.is_set(V));
        assert!(cpu.regs.p.is_set(Z)); // A & operand == 0
    }

    /// Bus that records every write for RMW double-write verification.
    struct RecordingBus {
        ram: FlatRam,
        writes: Vec<(u16, u8)>,
    }

    impl Bus for RecordingBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.ram.read(addr)
        }
        fn write(&mut self, addr: u16, value: u8) {
            self.writes.push((addr, value));
            self.ram.write(addr, value);
        }
    }

    #[test]
    fn rmw_writes_unmodified_then_modified() {
        let mut bus = RecordingBus {
            ram: FlatRam::new(),
            writes: Vec::new(),
        };
        bus.ram.write(0x1234, 0x41);
        bus.ram.load(0x0200, &[0x0E, 0x34, 0x12]); // ASL $1234
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.writes, vec![(0x1234, 0x41), (0x1234, 0x82)]);
    }

    #[test]
    fn inc_dec_are_double_write_too() {
        let mut bus = RecordingBus {
            ram: FlatRam::new(),
            writes: Vec::new(),
        };
        bus.ram.write(0x0040, 0x10);
        bus.ram.load(0x0200, &[0xE6, 0x40, 0xC6, 0x40]); // INC $40; DEC $40
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(
            bus.writes,
            vec![(0x40, 0x10), (0x40, 0x11), (0x40, 0x11), (0x40, 0x10)]
        );
    }

    #[test]
    fn brk_and_rti_round_trip() {
        let mut bus = FlatRam::new();
        bus.write(0xFFFE, 0x00);
        bus.write(0xFFFF, 0x30); // IRQ vector -> $3000
        bus.write(0x3000, 0x40); // RTI
        bus.load(0x0200, &[0x00, 0xEA, 0xEA]); // BRK; (padding); NOP
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.regs.s = 0xFF;

        cpu.step(&mut bus).unwrap(); // BRK
        assert_eq!(cpu.regs.pc, 0x3000);
        assert!(cpu.regs.p.is_set(I));
        assert_eq!(cpu.regs.s, 0xFC);

        cpu.step(&mut bus).unwrap(); // RTI
        assert_eq!(cpu.regs.pc, 0x0202); // BRK pushes PC+1
        assert_eq!(cpu.regs.s, 0xFF);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        let mut bus = FlatRam::new();
        bus.write(0xFFFE, 0x00);
        bus.write(0xFFFF, 0x30);
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.regs.s = 0xFF;

        cpu.regs.p.set(I);
        cpu.irq(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0200); // deferred

        cpu.regs.p.clear(I);
        cpu.irq(&mut bus);
        assert_eq!(cpu.regs.pc, 0x3000);
        assert!(cpu.regs.p.is_set(I));
        // PC and flags pushed
        assert_eq!(cpu.regs.s, 0xFC);
    }

    #[test]
    fn nmi_ignores_interrupt_disable() {
        let mut bus = FlatRam::new();
        bus.write(0xFFFA, 0x00);
        bus.write(0xFFFB, 0x40);
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.regs.s = 0xFF;
        cpu.regs.p.set(I);
        cpu.nmi(&mut bus);
        assert_eq!(cpu.regs.pc, 0x4000);
    }

    #[test]
    fn irq_pushes_break_clear_php_pushes_break_set() {
        let mut bus = FlatRam::new();
        bus.write(0xFFFE, 0x00);
        bus.write(0xFFFF, 0x30);
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.regs.s = 0xFF;
        cpu.irq(&mut bus);
        let pushed_flags = bus.read(0x01FD);
        assert_eq!(pushed_flags & B, 0);

        // PHP at the handler pushes break + unused set
        bus.write(0x3000, 0x08);
        cpu.step(&mut bus).unwrap();
        let pushed = bus.read(0x01FC);
        assert_ne!(pushed & B, 0);
        assert_ne!(pushed & 0x20, 0);
    }

    #[test]
    fn nominal_cycle_costs_accumulate() {
        // LDA #imm (2) + STA abs (4) + NOP (2) = 8
        let (cpu, _) = run(&[0xA9, 0x01, 0x8D, 0x00, 0x10, 0xEA], 3);
        assert_eq!(cpu.cycles(), 8);
    }

    #[test]
    fn transfers_and_stack_ops() {
        // LDX #$FF; TXS; LDA #$AA; PHA; LDA #$00; PLA
        let (cpu, bus) = run(&[0xA2, 0xFF, 0x9A, 0xA9, 0xAA, 0x48, 0xA9, 0x00, 0x68], 6);
        let _ = bus;
        assert_eq!(cpu.regs.a, 0xAA);
        assert_eq!(cpu.regs.s, 0xFF);
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn jmp_indirect_follows_pointer() {
        let mut bus = FlatRam::new();
        bus.write(0x1000, 0x34);
        bus.write(0x1001, 0x12);
        bus.load(0x0200, &[0x6C, 0x00, 0x10]); // JMP ($1000)
        let mut cpu = Mos6510::new();
        cpu.regs.pc = 0x0200;
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, 0x1234);
    }
}
