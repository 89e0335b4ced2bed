//! Operand resolution for the thirteen addressing modes.

use super::opcodes::AddressingMode;
use super::Cpu;
use crate::cpu_bus::CpuBus;

/// Where an instruction finds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    Address(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub operand: Operand,
    /// Indexing (or a branch target) landed on a different page than its base.
    pub page_crossed: bool,
}

impl Resolved {
    fn at(addr: u16, page_crossed: bool) -> Self {
        Self {
            operand: Operand::Address(addr),
            page_crossed,
        }
    }

    pub fn address(&self) -> Option<u16> {
        match self.operand {
            Operand::Address(addr) => Some(addr),
            _ => None,
        }
    }
}

#[inline]
pub(crate) fn crosses_page(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

impl Cpu {
    pub(crate) fn read_byte(&mut self, bus: &mut dyn CpuBus) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    pub(crate) fn read_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.read_byte(bus) as u16;
        let high = self.read_byte(bus) as u16;
        (high << 8) | low
    }

    /// Consumes the operand bytes for `mode` and returns the operand locus.
    /// `program_counter` ends up on the next instruction.
    pub(crate) fn resolve(&mut self, bus: &mut dyn CpuBus, mode: AddressingMode) -> Resolved {
        match mode {
            AddressingMode::Implied => Resolved {
                operand: Operand::Implied,
                page_crossed: false,
            },
            AddressingMode::Accumulator => Resolved {
                operand: Operand::Accumulator,
                page_crossed: false,
            },
            AddressingMode::Immediate => Resolved {
                operand: Operand::Immediate(self.read_byte(bus)),
                page_crossed: false,
            },
            AddressingMode::ZeroPage => {
                let addr = self.read_byte(bus) as u16;
                Resolved::at(addr, false)
            }
            AddressingMode::ZeroPageX => {
                let base = self.read_byte(bus);
                Resolved::at(base.wrapping_add(self.x) as u16, false)
            }
            AddressingMode::ZeroPageY => {
                let base = self.read_byte(bus);
                Resolved::at(base.wrapping_add(self.y) as u16, false)
            }
            AddressingMode::Absolute => {
                let addr = self.read_word(bus);
                Resolved::at(addr, false)
            }
            AddressingMode::AbsoluteX => {
                let base = self.read_word(bus);
                let addr = base.wrapping_add(self.x as u16);
                Resolved::at(addr, crosses_page(base, addr))
            }
            AddressingMode::AbsoluteY => {
                let base = self.read_word(bus);
                let addr = base.wrapping_add(self.y as u16);
                Resolved::at(addr, crosses_page(base, addr))
            }
            AddressingMode::Indirect => {
                // The high byte is fetched without carrying into the next page.
                let pointer = self.read_word(bus);
                Resolved::at(bus.read_u16_wrapped_page(pointer), false)
            }
            AddressingMode::IndirectX => {
                let pointer = self.read_byte(bus).wrapping_add(self.x);
                Resolved::at(bus.read_u16_wrapped_page(pointer as u16), false)
            }
            AddressingMode::IndirectY => {
                let pointer = self.read_byte(bus);
                let base = bus.read_u16_wrapped_page(pointer as u16);
                let addr = base.wrapping_add(self.y as u16);
                Resolved::at(addr, crosses_page(base, addr))
            }
            AddressingMode::Relative => {
                let offset = self.read_byte(bus) as i8;
                let target = self.pc.wrapping_add(offset as u16);
                Resolved::at(target, crosses_page(self.pc, target))
            }
        }
    }
}
