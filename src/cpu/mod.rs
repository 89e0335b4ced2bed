//! Ricoh 2A03 CPU core (NMOS 6502 without decimal arithmetic).
//!
//! `Cpu::update` runs either one instruction or one interrupt entry and
//! returns the CPU cycles it took. The owning machine uses that count to
//! clock the pixel and audio units and then feeds their interrupt lines back
//! through `raise_nmi` / `set_irq_line`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cpu_bus::CpuBus;
use crate::debug_flags;

pub mod addressing;
mod execute;
mod interrupts;
pub mod opcodes;

pub use interrupts::{Sequence, INTERRUPT_CYCLES, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};


bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const CARRY = 0b00000001;
        const ZERO = 0b00000010;
        const INTERRUPT_DISABLE = 0b00000100;
        const DECIMAL = 0b00001000;
        const BREAK = 0b00010000;
        const UNUSED = 0b00100000;
        const OVERFLOW = 0b01000000;
        const NEGATIVE = 0b10000000;
    }
}

impl StatusFlags {
    /// Value written to the stack: Unused always set, Break only for BRK/PHP.
    pub fn pushed(self, brk: bool) -> u8 {
        let mut bits = self.bits() | StatusFlags::UNUSED.bits();
        if brk {
            bits |= StatusFlags::BREAK.bits();
        } else {
            bits &= !StatusFlags::BREAK.bits();
        }
        bits
    }

    /// Value loaded from the stack by PLP/RTI. Break is not a real latch.
    pub fn pulled(bits: u8) -> Self {
        let mut flags = StatusFlags::from_bits_truncate(bits);
        flags.remove(StatusFlags::BREAK);
        flags.insert(StatusFlags::UNUSED);
        flags
    }
}

pub const POWER_UP_STATUS: u8 = 0x24;
pub const POWER_UP_SP: u8 = 0xFD;
const STACK_PAGE: u16 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Cold start: registers cleared, fixed flags and stack pointer.
    PowerUp,
    /// Reset button: A/X/Y kept, stack pointer moved down by three.
    Warm,
}

pub struct Cpu {
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    pc: u16,
    status: StatusFlags,
    cycles: u32,
    halted: bool,
    nmi_pending: bool,
    nmi_line: bool,
    irq_pending: bool,
    sequence: Sequence,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: POWER_UP_SP,
            pc: 0,
            status: StatusFlags::from_bits_truncate(POWER_UP_STATUS),
            cycles: 0,
            halted: false,
            nmi_pending: false,
            nmi_line: false,
            irq_pending: false,
            sequence: Sequence::Running,
        }
    }

    pub fn reset(&mut self, bus: &mut dyn CpuBus, kind: ResetKind) {
        match kind {
            ResetKind::PowerUp => {
                self.a = 0;
                self.x = 0;
                self.y = 0;
                self.sp = POWER_UP_SP;
                self.status = StatusFlags::from_bits_truncate(POWER_UP_STATUS);
                self.cycles = 0;
            }
            ResetKind::Warm => {
                self.sp = self.sp.wrapping_sub(3);
                self.status.insert(StatusFlags::INTERRUPT_DISABLE);
            }
        }
        self.halted = false;
        self.nmi_pending = false;
        self.nmi_line = false;
        self.irq_pending = false;
        self.pc = bus.read_u16(RESET_VECTOR);
        self.cycles = self.cycles.wrapping_add(INTERRUPT_CYCLES as u32);
        self.sequence = Sequence::ServicingReset;

        if debug_flags::interrupts() {
            log::debug!("RESET ({:?}) -> ${:04X}", kind, self.pc);
        }
    }

    /// Runs one instruction, or one interrupt entry, and returns its cycle cost.
    /// A halted CPU consumes nothing.
    pub fn update(&mut self, bus: &mut dyn CpuBus) -> u8 {
        if self.halted {
            self.sequence = Sequence::Halted;
            return 0;
        }

        // Latches are sampled once, before the fetch.
        if let Some(cycles) = self.poll_interrupts(bus) {
            self.cycles = self.cycles.wrapping_add(cycles as u32);
            return cycles;
        }

        let pc = self.pc;
        let byte = bus.read(pc);
        let opcode = opcodes::decode(byte);
        // Checked before any register changes.
        if let Err(err) = opcode.validate(byte) {
            panic!("corrupt opcode table at ${:04X}: {}", pc, err);
        }
        self.pc = pc.wrapping_add(1);

        if debug_flags::cpu_trace() {
            log::trace!(
                "{:04X}  {:02X}  {:<4} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
                pc,
                byte,
                opcode.mnemonic,
                self.a,
                self.x,
                self.y,
                self.status.bits(),
                self.sp,
                self.cycles
            );
        }

        let resolved = self.resolve(bus, opcode.mode);
        let cycles = self.execute(bus, opcode, resolved);
        self.sequence = if self.halted {
            log::warn!("CPU halted by {} (${:02X}) at ${:04X}", opcode.mnemonic, byte, pc);
            Sequence::Halted
        } else {
            Sequence::Running
        };
        self.cycles = self.cycles.wrapping_add(cycles as u32);
        cycles
    }

    /// Latches one NMI. Edge-triggered: serviced exactly once.
    pub fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Feeds the NMI line level; a low-to-high transition latches an NMI.
    pub fn set_nmi_line(&mut self, level: bool) {
        if level && !self.nmi_line {
            self.raise_nmi();
        }
        self.nmi_line = level;
    }

    /// Asserts the IRQ line. It stays asserted until `clear_irq`.
    pub fn raise_irq(&mut self) {
        self.irq_pending = true;
    }

    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }

    pub fn set_irq_line(&mut self, level: bool) {
        self.irq_pending = level;
    }

    /// Debugger override of the program counter, e.g. to start a test ROM
    /// somewhere other than its reset vector.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// External halt request. Only a reset resumes execution.
    pub fn halt(&mut self) {
        self.halted = true;
        self.sequence = Sequence::Halted;
    }

    // Read-only introspection

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn status(&self) -> StatusFlags {
        self.status
    }

    pub fn flag(&self, flag: StatusFlags) -> bool {
        self.status.contains(flag)
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycles
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// What the most recent `update` (or reset) did.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn snapshot(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            pc: self.pc,
            status: self.status.bits(),
            cycles: self.cycles,
            halted: self.halted,
            nmi_pending: self.nmi_pending,
            irq_pending: self.irq_pending,
        }
    }

    /// Restores a snapshot taken by `snapshot`. The sampled NMI line level is
    /// kept: it follows the wiring, not the saved state.
    pub fn restore(&mut self, state: &CpuState) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.sp = state.sp;
        self.pc = state.pc;
        self.status = StatusFlags::pulled(state.status);
        self.cycles = state.cycles;
        self.halted = state.halted;
        self.nmi_pending = state.nmi_pending;
        self.irq_pending = state.irq_pending;
        self.sequence = if state.halted {
            Sequence::Halted
        } else {
            Sequence::Running
        };
    }

    // Stack helpers. The stack lives in page 1 and S wraps within it.

    fn push(&mut self, bus: &mut dyn CpuBus, value: u8) {
        bus.write(STACK_PAGE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_PAGE | self.sp as u16)
    }

    fn push_word(&mut self, bus: &mut dyn CpuBus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pull_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.pull(bus) as u16;
        let high = self.pull(bus) as u16;
        (high << 8) | low
    }

    fn set_zero_negative_flags(&mut self, value: u8) {
        self.status.set(StatusFlags::ZERO, value == 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }
}

/// Plain copy of the register file, used for dumps and save states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: u32,
    pub halted: bool,
    pub nmi_pending: bool,
    pub irq_pending: bool,
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [char; 8] = ['N', 'V', 'U', 'B', 'D', 'I', 'Z', 'C'];
        let flags: String = NAMES
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if self.status & (0x80 >> i) != 0 {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        write!(
            f,
            "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} [{}] SP:{:02X} CYC:{}",
            self.pc, self.a, self.x, self.y, self.status, flags, self.sp, self.cycles
        )?;
        if self.halted {
            f.write_str(" HALTED")?;
        }
        if self.nmi_pending {
            f.write_str(" NMI")?;
        }
        if self.irq_pending {
            f.write_str(" IRQ")?;
        }
        Ok(())
    }
}
