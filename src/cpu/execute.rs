//! Instruction semantics.
//!
//! `execute` receives an already-resolved operand, so every arm here only
//! describes what the instruction does to registers and memory, plus the
//! cycle adjustments that depend on the outcome (page crossing, branches).

use super::addressing::{Operand, Resolved};
use super::interrupts::Interrupt;
use super::opcodes::{Mnemonic, Opcode};
use super::{Cpu, StatusFlags};
use crate::cpu_bus::CpuBus;

/// Magic constant ANDed into A by the unstable XAA/LXA opcodes.
const UNSTABLE_MAGIC: u8 = 0xEE;

impl Cpu {
    pub(crate) fn execute(&mut self, bus: &mut dyn CpuBus, opcode: Opcode, r: Resolved) -> u8 {
        use Mnemonic::*;

        let mut cycles = opcode.cycles;
        if r.page_crossed && opcode.mode.is_indexed() && opcode.mnemonic.pays_page_penalty() {
            cycles += 1;
        }

        match opcode.mnemonic {
            // Loads and stores
            LDA => {
                self.a = self.load(bus, r);
                self.set_zero_negative_flags(self.a);
            }
            LDX => {
                self.x = self.load(bus, r);
                self.set_zero_negative_flags(self.x);
            }
            LDY => {
                self.y = self.load(bus, r);
                self.set_zero_negative_flags(self.y);
            }
            LAX => {
                let value = self.load(bus, r);
                self.a = value;
                self.x = value;
                self.set_zero_negative_flags(value);
            }
            STA => bus.write(target(r), self.a),
            STX => bus.write(target(r), self.x),
            STY => bus.write(target(r), self.y),
            SAX => bus.write(target(r), self.a & self.x),

            // Register transfers
            TAX => {
                self.x = self.a;
                self.set_zero_negative_flags(self.x);
            }
            TAY => {
                self.y = self.a;
                self.set_zero_negative_flags(self.y);
            }
            TXA => {
                self.a = self.x;
                self.set_zero_negative_flags(self.a);
            }
            TYA => {
                self.a = self.y;
                self.set_zero_negative_flags(self.a);
            }
            TSX => {
                self.x = self.sp;
                self.set_zero_negative_flags(self.x);
            }
            TXS => self.sp = self.x,

            // Stack
            PHA => self.push(bus, self.a),
            PHP => {
                let pushed = self.status.pushed(true);
                self.push(bus, pushed);
            }
            PLA => {
                self.a = self.pull(bus);
                self.set_zero_negative_flags(self.a);
            }
            PLP => {
                let bits = self.pull(bus);
                self.status = StatusFlags::pulled(bits);
            }

            // Arithmetic and logic
            ADC => {
                let value = self.load(bus, r);
                self.adc(value);
            }
            SBC => {
                let value = self.load(bus, r);
                self.sbc(value);
            }
            AND => {
                let value = self.load(bus, r);
                self.a &= value;
                self.set_zero_negative_flags(self.a);
            }
            ORA => {
                let value = self.load(bus, r);
                self.a |= value;
                self.set_zero_negative_flags(self.a);
            }
            EOR => {
                let value = self.load(bus, r);
                self.a ^= value;
                self.set_zero_negative_flags(self.a);
            }
            CMP => {
                let value = self.load(bus, r);
                self.compare(self.a, value);
            }
            CPX => {
                let value = self.load(bus, r);
                self.compare(self.x, value);
            }
            CPY => {
                let value = self.load(bus, r);
                self.compare(self.y, value);
            }
            BIT => {
                let value = self.load(bus, r);
                self.status.set(StatusFlags::ZERO, self.a & value == 0);
                self.status.set(StatusFlags::OVERFLOW, value & 0x40 != 0);
                self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
            }

            // Increments and decrements
            INC => {
                self.modify(bus, r, |cpu, v| {
                    let result = v.wrapping_add(1);
                    cpu.set_zero_negative_flags(result);
                    result
                });
            }
            DEC => {
                self.modify(bus, r, |cpu, v| {
                    let result = v.wrapping_sub(1);
                    cpu.set_zero_negative_flags(result);
                    result
                });
            }
            INX => {
                self.x = self.x.wrapping_add(1);
                self.set_zero_negative_flags(self.x);
            }
            INY => {
                self.y = self.y.wrapping_add(1);
                self.set_zero_negative_flags(self.y);
            }
            DEX => {
                self.x = self.x.wrapping_sub(1);
                self.set_zero_negative_flags(self.x);
            }
            DEY => {
                self.y = self.y.wrapping_sub(1);
                self.set_zero_negative_flags(self.y);
            }

            // Shifts and rotates
            ASL => {
                self.modify(bus, r, Cpu::asl);
            }
            LSR => {
                self.modify(bus, r, Cpu::lsr);
            }
            ROL => {
                self.modify(bus, r, Cpu::rol);
            }
            ROR => {
                self.modify(bus, r, Cpu::ror);
            }

            // Control flow
            JMP => self.pc = target(r),
            JSR => {
                // Return address convention: last byte of the JSR instruction.
                let return_addr = self.pc.wrapping_sub(1);
                self.push_word(bus, return_addr);
                self.pc = target(r);
            }
            RTS => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            RTI => {
                let bits = self.pull(bus);
                self.status = StatusFlags::pulled(bits);
                self.pc = self.pull_word(bus);
            }
            BRK => {
                // The byte after BRK is padding.
                self.pc = self.pc.wrapping_add(1);
                cycles = self.enter_interrupt(bus, Interrupt::Brk);
            }
            BCC => cycles += self.branch(r, !self.status.contains(StatusFlags::CARRY)),
            BCS => cycles += self.branch(r, self.status.contains(StatusFlags::CARRY)),
            BNE => cycles += self.branch(r, !self.status.contains(StatusFlags::ZERO)),
            BEQ => cycles += self.branch(r, self.status.contains(StatusFlags::ZERO)),
            BPL => cycles += self.branch(r, !self.status.contains(StatusFlags::NEGATIVE)),
            BMI => cycles += self.branch(r, self.status.contains(StatusFlags::NEGATIVE)),
            BVC => cycles += self.branch(r, !self.status.contains(StatusFlags::OVERFLOW)),
            BVS => cycles += self.branch(r, self.status.contains(StatusFlags::OVERFLOW)),

            // Flag instructions
            CLC => self.status.remove(StatusFlags::CARRY),
            SEC => self.status.insert(StatusFlags::CARRY),
            CLI => self.status.remove(StatusFlags::INTERRUPT_DISABLE),
            SEI => self.status.insert(StatusFlags::INTERRUPT_DISABLE),
            CLD => self.status.remove(StatusFlags::DECIMAL),
            SED => self.status.insert(StatusFlags::DECIMAL),
            CLV => self.status.remove(StatusFlags::OVERFLOW),

            NOP => {
                // Undocumented NOPs still perform their operand read.
                if let Operand::Address(addr) = r.operand {
                    bus.read(addr);
                }
            }
            KIL => self.halted = true,

            // Undocumented read-modify-write combinations
            SLO => {
                let result = self.modify(bus, r, Cpu::asl);
                self.a |= result;
                self.set_zero_negative_flags(self.a);
            }
            RLA => {
                let result = self.modify(bus, r, Cpu::rol);
                self.a &= result;
                self.set_zero_negative_flags(self.a);
            }
            SRE => {
                let result = self.modify(bus, r, Cpu::lsr);
                self.a ^= result;
                self.set_zero_negative_flags(self.a);
            }
            RRA => {
                let result = self.modify(bus, r, Cpu::ror);
                self.adc(result);
            }
            DCP => {
                let result = self.modify(bus, r, |_, v| v.wrapping_sub(1));
                self.compare(self.a, result);
            }
            ISC => {
                let result = self.modify(bus, r, |_, v| v.wrapping_add(1));
                self.sbc(result);
            }

            // Undocumented immediate combinations
            ANC => {
                let value = self.load(bus, r);
                self.a &= value;
                self.set_zero_negative_flags(self.a);
                self.status
                    .set(StatusFlags::CARRY, self.status.contains(StatusFlags::NEGATIVE));
            }
            ALR => {
                let value = self.load(bus, r);
                let anded = self.a & value;
                self.a = self.lsr(anded);
            }
            ARR => {
                let value = self.load(bus, r);
                let carry_in = (self.status.contains(StatusFlags::CARRY) as u8) << 7;
                let result = ((self.a & value) >> 1) | carry_in;
                self.a = result;
                self.set_zero_negative_flags(result);
                self.status.set(StatusFlags::CARRY, result & 0x40 != 0);
                self.status.set(
                    StatusFlags::OVERFLOW,
                    ((result >> 6) ^ (result >> 5)) & 0x01 != 0,
                );
            }
            AXS => {
                let value = self.load(bus, r);
                let and_result = self.a & self.x;
                self.status.set(StatusFlags::CARRY, and_result >= value);
                self.x = and_result.wrapping_sub(value);
                self.set_zero_negative_flags(self.x);
            }
            XAA => {
                let value = self.load(bus, r);
                self.a = (self.a | UNSTABLE_MAGIC) & self.x & value;
                self.set_zero_negative_flags(self.a);
            }
            LXA => {
                let value = self.load(bus, r);
                let result = (self.a | UNSTABLE_MAGIC) & value;
                self.a = result;
                self.x = result;
                self.set_zero_negative_flags(result);
            }
            LAS => {
                let value = self.load(bus, r) & self.sp;
                self.a = value;
                self.x = value;
                self.sp = value;
                self.set_zero_negative_flags(value);
            }

            // Undocumented high-byte stores
            SHY => self.store_high_and(bus, r, self.y, self.x),
            SHX => self.store_high_and(bus, r, self.x, self.y),
            AHX => self.store_high_and(bus, r, self.a & self.x, self.y),
            TAS => {
                self.sp = self.a & self.x;
                self.store_high_and(bus, r, self.sp, self.y);
            }
        }

        cycles
    }

    /// Fetches the operand value for read instructions.
    fn load(&mut self, bus: &mut dyn CpuBus, r: Resolved) -> u8 {
        match r.operand {
            Operand::Immediate(value) => value,
            Operand::Address(addr) => bus.read(addr),
            Operand::Accumulator => self.a,
            Operand::Implied => unreachable!("read instruction decoded with implied operand"),
        }
    }

    /// Read-modify-write on the accumulator or on memory. Memory targets see
    /// the unmodified value written back before the result, as on hardware.
    fn modify(
        &mut self,
        bus: &mut dyn CpuBus,
        r: Resolved,
        op: impl FnOnce(&mut Cpu, u8) -> u8,
    ) -> u8 {
        match r.operand {
            Operand::Accumulator => {
                let result = op(self, self.a);
                self.a = result;
                result
            }
            Operand::Address(addr) => {
                let value = bus.read(addr);
                bus.write(addr, value);
                let result = op(self, value);
                bus.write(addr, result);
                result
            }
            other => unreachable!("read-modify-write on {:?}", other),
        }
    }

    fn adc(&mut self, value: u8) {
        let carry = self.status.contains(StatusFlags::CARRY) as u16;
        let result = self.a as u16 + value as u16 + carry;

        self.status.set(StatusFlags::CARRY, result > 0xFF);
        self.status.set(
            StatusFlags::OVERFLOW,
            (self.a ^ result as u8) & (value ^ result as u8) & 0x80 != 0,
        );

        self.a = result as u8;
        self.set_zero_negative_flags(self.a);
    }

    /// A - M - !C is A + !M + C; Carry ends up as "no borrow".
    fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    fn compare(&mut self, reg: u8, value: u8) {
        self.status.set(StatusFlags::CARRY, reg >= value);
        self.set_zero_negative_flags(reg.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.set_zero_negative_flags(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.set_zero_negative_flags(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status.contains(StatusFlags::CARRY) as u8;
        self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_zero_negative_flags(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.status.contains(StatusFlags::CARRY) as u8) << 7;
        self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.set_zero_negative_flags(result);
        result
    }

    /// Extra cycles for a branch: +1 when taken, +1 more across a page.
    fn branch(&mut self, r: Resolved, condition: bool) -> u8 {
        if !condition {
            return 0;
        }
        self.pc = target(r);
        if r.page_crossed {
            2
        } else {
            1
        }
    }

    /// SHY/SHX/AHX/TAS: store `value & (base high byte + 1)`. When indexing
    /// carried into the next page, the stored value also replaces the high
    /// byte of the effective address.
    fn store_high_and(&mut self, bus: &mut dyn CpuBus, r: Resolved, value: u8, index: u8) {
        let addr = target(r);
        let base = addr.wrapping_sub(index as u16);
        let high = ((base >> 8) as u8).wrapping_add(1);
        let result = value & high;
        let addr = if r.page_crossed {
            ((result as u16) << 8) | (addr & 0x00FF)
        } else {
            addr
        };
        bus.write(addr, result);
    }
}

/// The effective address of a memory operand. The opcode table guarantees
/// that instructions calling this were resolved to an address.
fn target(r: Resolved) -> u16 {
    match r.address() {
        Some(addr) => addr,
        None => unreachable!("instruction needs an address, got {:?}", r.operand),
    }
}
