//! The owning machine: one CPU, one bus, and the scheduler that keeps the
//! other units in lockstep with the CPU's cycle count.

use crate::bus::Bus;
use crate::cpu::{Cpu, ResetKind};
use crate::debugger::{Debugger, TraceEntry};
use crate::error::{ImageError, StateError};
use crate::mapper::Nrom;
use crate::save_state::SaveState;

/// Why a bounded run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted { pc: u16 },
    Breakpoint { pc: u16 },
    StepLimit,
    CycleBudget,
}

pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    debugger: Debugger,
    halt_reported: bool,
}

impl Machine {
    /// Builds a machine around `bus`. Call `power_on` before stepping.
    pub fn new(bus: Bus) -> Self {
        Machine {
            cpu: Cpu::new(),
            bus,
            debugger: Debugger::new(),
            halt_reported: false,
        }
    }

    /// A powered-on machine running a raw program image from `load_addr`.
    pub fn with_program(program: &[u8], load_addr: u16) -> Result<Self, ImageError> {
        let bus = Bus::new(Box::new(Nrom::with_program(program, load_addr)?));
        let mut machine = Machine::new(bus);
        machine.power_on();
        Ok(machine)
    }

    pub fn power_on(&mut self) {
        self.bus.ram_mut().fill(0);
        self.cpu.reset(&mut self.bus, ResetKind::PowerUp);
        self.halt_reported = false;
        log::info!(
            "Power on: mapper {}, PC=${:04X}",
            self.bus.mapper().name(),
            self.cpu.pc()
        );
    }

    /// Reset button.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus, ResetKind::Warm);
        self.halt_reported = false;
    }

    /// Runs one CPU step, clocks the other units for the same span and feeds
    /// their interrupt lines back. Returns the CPU cycles consumed (0 while
    /// halted).
    pub fn step(&mut self) -> u8 {
        if self.cpu.is_halted() {
            return 0;
        }

        if self.debugger.is_tracing() {
            let entry = TraceEntry::capture(&self.cpu, &self.bus);
            self.debugger.record(entry);
        }

        let cycles = self.cpu.update(&mut self.bus);
        let signals = self.bus.clock(cycles as u32);
        self.cpu.set_nmi_line(signals.nmi);
        self.cpu.set_irq_line(signals.irq);

        if self.cpu.is_halted() && !self.halt_reported {
            self.halt_reported = true;
            log::info!(
                "CPU halted at ${:04X} after {} cycles",
                self.cpu.pc(),
                self.cpu.cycle_count()
            );
        }
        cycles
    }

    /// Steps until at least `budget` cycles have run or the CPU halts.
    /// Returns the cycles actually consumed.
    pub fn run_cycles(&mut self, budget: u64) -> u64 {
        let mut spent = 0u64;
        while spent < budget && !self.cpu.is_halted() {
            spent += self.step() as u64;
        }
        spent
    }

    pub fn run_until_halt(&mut self, max_steps: u64) -> RunOutcome {
        for _ in 0..max_steps {
            if self.cpu.is_halted() {
                return RunOutcome::Halted { pc: self.cpu.pc() };
            }
            self.step();
        }
        if self.cpu.is_halted() {
            RunOutcome::Halted { pc: self.cpu.pc() }
        } else {
            RunOutcome::StepLimit
        }
    }

    /// Like `run_until_halt`, but stops in front of an enabled breakpoint.
    /// The instruction at the starting PC always runs, so repeated calls
    /// continue past the breakpoint just hit.
    pub fn run_until_break(&mut self, max_steps: u64) -> RunOutcome {
        for i in 0..max_steps {
            if self.cpu.is_halted() {
                return RunOutcome::Halted { pc: self.cpu.pc() };
            }
            let pc = self.cpu.pc();
            if i > 0 && self.debugger.should_break(pc) {
                return RunOutcome::Breakpoint { pc };
            }
            self.step();
        }
        RunOutcome::StepLimit
    }

    pub fn save_state(&self) -> SaveState {
        SaveState::new(self.cpu.snapshot(), self.bus.ram().as_slice().to_vec())
    }

    pub fn load_state(&mut self, state: &SaveState) -> Result<(), StateError> {
        let expected = self.bus.ram().len();
        if state.ram.len() != expected {
            return Err(StateError::RamSize {
                found: state.ram.len(),
                expected,
            });
        }
        self.bus
            .ram_mut()
            .load(0, &state.ram)
            .map_err(|_| StateError::RamSize {
                found: state.ram.len(),
                expected,
            })?;
        self.cpu.restore(&state.cpu);
        self.halt_reported = state.cpu.halted;
        Ok(())
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Disconnected, Peripheral, Signals};
    use crate::cpu::Sequence;
    use crate::cpu_bus::CpuBus;
    use crate::mapper::Mapper;

    /// Holds its NMI line high once `after` dots have elapsed.
    struct VblankAfter {
        after: u32,
        dots: u32,
    }

    impl Peripheral for VblankAfter {
        fn read(&mut self, _addr: u16) -> u8 {
            0
        }

        fn write(&mut self, _addr: u16, _data: u8) {}

        fn clock(&mut self, cycles: u32) -> Signals {
            self.dots += cycles;
            Signals {
                nmi: self.dots >= self.after,
                irq: false,
            }
        }
    }

    /// Never releases its NMI line.
    struct StuckNmi;

    impl Peripheral for StuckNmi {
        fn read(&mut self, _addr: u16) -> u8 {
            0
        }

        fn write(&mut self, _addr: u16, _data: u8) {}

        fn clock(&mut self, _cycles: u32) -> Signals {
            Signals {
                nmi: true,
                irq: false,
            }
        }
    }

    /// NROM plus an IRQ line raised at power-on and acknowledged by any
    /// write to $E000.
    struct IrqCart {
        inner: Nrom,
        irq: bool,
    }

    impl Mapper for IrqCart {
        fn cpu_read(&self, addr: u16) -> Option<u8> {
            self.inner.cpu_read(addr)
        }

        fn cpu_write(&mut self, addr: u16, data: u8) {
            if addr == 0xE000 {
                self.irq = false;
            }
            self.inner.cpu_write(addr, data);
        }

        fn irq_pending(&self) -> bool {
            self.irq
        }

        fn name(&self) -> &'static str {
            "IRQ test"
        }
    }

    /// 32 KiB image: `main` at $8000, `handler` at $9000, with NMI and IRQ
    /// vectors pointing at the handler.
    fn image(main: &[u8], handler: &[u8]) -> Vec<u8> {
        let mut prg = vec![0; 0x8000];
        prg[..main.len()].copy_from_slice(main);
        prg[0x1000..0x1000 + handler.len()].copy_from_slice(handler);
        for vector in [0x7FFA, 0x7FFC, 0x7FFE] {
            prg[vector] = 0x00;
            prg[vector + 1] = if vector == 0x7FFC { 0x80 } else { 0x90 };
        }
        prg
    }

    // JMP $8000
    const SPIN: &[u8] = &[0x4C, 0x00, 0x80];
    // INC $10; RTI
    const COUNT_AND_RETURN: &[u8] = &[0xE6, 0x10, 0x40];

    #[test]
    fn test_step_runs_program() {
        // LDA #$42, STA $0200, KIL
        let mut machine =
            Machine::with_program(&[0xA9, 0x42, 0x8D, 0x00, 0x02, 0x02], 0x8000).unwrap();

        assert_eq!(machine.step(), 2);
        assert_eq!(machine.step(), 4);
        assert_eq!(machine.bus().peek(0x0200), 0x42);
        assert_eq!(machine.run_until_halt(10), RunOutcome::Halted { pc: 0x8006 });
        assert_eq!(machine.step(), 0);
        assert_eq!(machine.cpu().sequence(), Sequence::Halted);
    }

    #[test]
    fn test_vblank_nmi_serviced_once() {
        let prg = image(SPIN, COUNT_AND_RETURN);
        let bus = Bus::with_peripherals(
            Box::new(Nrom::new(prg)),
            Box::new(VblankAfter { after: 90, dots: 0 }),
            Box::new(Disconnected),
        );
        let mut machine = Machine::new(bus);
        machine.power_on();

        machine.run_until_halt(200);

        assert_eq!(machine.bus().peek(0x0010), 1);
    }

    #[test]
    fn test_held_nmi_not_serviced_again_after_load_state() {
        let bus = Bus::with_peripherals(
            Box::new(Nrom::new(image(SPIN, COUNT_AND_RETURN))),
            Box::new(StuckNmi),
            Box::new(Disconnected),
        );
        let mut machine = Machine::new(bus);
        machine.power_on();
        machine.run_until_halt(20);
        assert_eq!(machine.bus().peek(0x0010), 1);

        let saved = machine.save_state();
        machine.load_state(&saved).unwrap();
        machine.run_until_halt(20);

        assert_eq!(machine.bus().peek(0x0010), 1);
        assert!(!machine.cpu().nmi_pending());
    }

    #[test]
    fn test_mapper_irq_is_level_triggered() {
        // CLI, then spin. Handler: INC $10; STA $E000 (ack); RTI
        let prg = image(&[0x58, 0x4C, 0x01, 0x80], &[0xE6, 0x10, 0x8D, 0x00, 0xE0, 0x40]);
        let cart = IrqCart {
            inner: Nrom::new(prg),
            irq: true,
        };
        let mut machine = Machine::new(Bus::new(Box::new(cart)));
        machine.power_on();

        machine.run_until_halt(200);

        assert_eq!(machine.bus().peek(0x0010), 1);
        assert!(!machine.cpu().irq_pending());
    }

    #[test]
    fn test_run_cycles_respects_budget() {
        let mut machine = Machine::with_program(SPIN, 0x8000).unwrap();
        let start = machine.cpu().cycle_count();

        let spent = machine.run_cycles(30);

        assert_eq!(spent, 30);
        assert_eq!(machine.cpu().cycle_count(), start + 30);
    }

    #[test]
    fn test_run_until_break() {
        // NOP, NOP, NOP, JMP $8000
        let mut machine =
            Machine::with_program(&[0xEA, 0xEA, 0xEA, 0x4C, 0x00, 0x80], 0x8000).unwrap();
        machine.debugger_mut().add_breakpoint(0x8002);

        assert_eq!(machine.run_until_break(100), RunOutcome::Breakpoint { pc: 0x8002 });
        assert_eq!(machine.cpu().pc(), 0x8002);

        // Continuing runs past the current breakpoint and loops back to it
        assert_eq!(machine.run_until_break(100), RunOutcome::Breakpoint { pc: 0x8002 });
        assert_eq!(machine.debugger().breakpoints().next().unwrap().hit_count, 2);

        machine.debugger_mut().toggle_breakpoint(0x8002);
        assert_eq!(machine.run_until_break(10), RunOutcome::StepLimit);
    }

    #[test]
    fn test_tracing_records_executed_instructions() {
        let mut machine = Machine::with_program(&[0xA9, 0x01, 0xAA, 0x02], 0x8000).unwrap();
        machine.debugger_mut().set_tracing(true);

        machine.run_until_halt(10);

        let lines: Vec<String> = machine
            .debugger()
            .trace()
            .map(|e| e.disassembly.clone())
            .collect();
        assert_eq!(lines, vec!["LDA #$01", "TAX", "*KIL"]);
    }

    #[test]
    fn test_reset_resumes_after_halt() {
        let mut machine = Machine::with_program(&[0x02], 0x8000).unwrap();
        machine.run_until_halt(5);
        assert!(machine.cpu().is_halted());

        machine.reset();

        assert!(!machine.cpu().is_halted());
        assert_eq!(machine.cpu().pc(), 0x8000);
        assert_eq!(machine.cpu().sp(), 0xFA);
    }

    #[test]
    fn test_save_and_load_state() {
        // INX; STX $20; JMP $8000
        let mut machine =
            Machine::with_program(&[0xE8, 0x86, 0x20, 0x4C, 0x00, 0x80], 0x8000).unwrap();
        machine.run_cycles(40);
        let saved = machine.save_state();

        machine.run_cycles(40);
        assert_ne!(machine.cpu().snapshot(), saved.cpu);

        machine.load_state(&saved).unwrap();
        assert_eq!(machine.cpu().snapshot(), saved.cpu);
        assert_eq!(machine.bus().ram().as_slice(), saved.ram.as_slice());
        assert_eq!(machine.bus().peek(0x0020), saved.cpu.x);
    }

    #[test]
    fn test_load_state_rejects_wrong_ram_size() {
        let mut machine = Machine::with_program(SPIN, 0x8000).unwrap();
        let mut state = machine.save_state();
        state.ram.truncate(16);

        assert!(matches!(
            machine.load_state(&state),
            Err(StateError::RamSize {
                found: 16,
                expected: 0x800
            })
        ));
    }

    #[test]
    fn test_bus_writes_reach_ram_through_machine() {
        let mut machine = Machine::with_program(SPIN, 0x8000).unwrap();

        machine.bus_mut().write(0x0805, 0x77);

        assert_eq!(machine.bus().ram().read(0x005), Ok(0x77));
    }

    #[test]
    fn test_with_program_rejects_images_that_do_not_fit() {
        assert!(matches!(
            Machine::with_program(&[0xA9, 0x42, 0x02], 0x0600),
            Err(ImageError::LoadAddressBelowPrg { load_addr: 0x0600 })
        ));
        assert!(matches!(
            Machine::with_program(&[0xEA; 16], 0xFFF0),
            Err(ImageError::ProgramTooLarge {
                len: 16,
                available: 10
            })
        ));

        let mut machine = Machine::with_program(&[0xA9, 0x42, 0x02], 0xC000).unwrap();
        assert_eq!(machine.run_until_halt(10), RunOutcome::Halted { pc: 0xC003 });
        assert_eq!(machine.cpu().a(), 0x42);
    }
}
