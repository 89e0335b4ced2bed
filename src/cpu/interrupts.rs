use super::{Cpu, StatusFlags};
use crate::cpu_bus::CpuBus;
use crate::debug_flags;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cost of an interrupt entry (NMI, IRQ, BRK) and of the reset sequence.
pub const INTERRUPT_CYCLES: u8 = 7;

/// Interrupt sequencer state, as left by the most recent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Running,
    ServicingReset,
    ServicingNmi,
    ServicingIrq,
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Nmi,
    Irq,
    Brk,
}

impl Interrupt {
    fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq | Interrupt::Brk => IRQ_VECTOR,
        }
    }
}

impl Cpu {
    /// Services a pending interrupt instead of fetching, if one is due.
    /// NMI wins over IRQ; IRQ is ignored while InterruptDisable is set.
    pub(crate) fn poll_interrupts(&mut self, bus: &mut dyn CpuBus) -> Option<u8> {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.sequence = Sequence::ServicingNmi;
            return Some(self.enter_interrupt(bus, Interrupt::Nmi));
        }
        // Level-triggered: the latch is left set for the source to drop.
        if self.irq_pending && !self.status.contains(StatusFlags::INTERRUPT_DISABLE) {
            self.sequence = Sequence::ServicingIrq;
            return Some(self.enter_interrupt(bus, Interrupt::Irq));
        }
        None
    }

    /// Pushes PC and P, sets InterruptDisable and jumps through the vector.
    /// `self.pc` must already hold the return address.
    pub(crate) fn enter_interrupt(&mut self, bus: &mut dyn CpuBus, kind: Interrupt) -> u8 {
        let return_pc = self.pc;
        self.push_word(bus, return_pc);
        let pushed = self.status.pushed(kind == Interrupt::Brk);
        self.push(bus, pushed);
        self.status.insert(StatusFlags::INTERRUPT_DISABLE);
        self.pc = bus.read_u16(kind.vector());

        if debug_flags::interrupts() {
            log::debug!(
                "{:?}: return ${:04X}, P=${:02X} -> ${:04X}",
                kind,
                return_pc,
                pushed,
                self.pc
            );
        }
        INTERRUPT_CYCLES
    }
}
