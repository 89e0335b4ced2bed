use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::bus::Bus;
use crate::cpu::opcodes::{self, AddressingMode};
use crate::cpu::{Cpu, CpuState};
use crate::debug_flags;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub address: u16,
    pub enabled: bool,
    pub hit_count: u32,
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Instruction length in bytes.
    pub len: u8,
    /// Mnemonic and operand, e.g. `LDA ($20),Y`. Undocumented opcodes carry
    /// a leading `*`.
    pub text: String,
}

/// Decodes the instruction starting at `bytes[0]`, located at `pc`.
/// Missing operand bytes read as zero.
pub fn disassemble(bytes: &[u8], pc: u16) -> Disassembly {
    let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
    let opcode = opcodes::decode(byte(0));
    let lo = byte(1);
    let word = u16::from_le_bytes([lo, byte(2)]);

    let operand = match opcode.mode {
        AddressingMode::Implied => String::new(),
        AddressingMode::Accumulator => "A".to_string(),
        AddressingMode::Immediate => format!("#${:02X}", lo),
        AddressingMode::ZeroPage => format!("${:02X}", lo),
        AddressingMode::ZeroPageX => format!("${:02X},X", lo),
        AddressingMode::ZeroPageY => format!("${:02X},Y", lo),
        AddressingMode::Absolute => format!("${:04X}", word),
        AddressingMode::AbsoluteX => format!("${:04X},X", word),
        AddressingMode::AbsoluteY => format!("${:04X},Y", word),
        AddressingMode::Indirect => format!("(${:04X})", word),
        AddressingMode::IndirectX => format!("(${:02X},X)", lo),
        AddressingMode::IndirectY => format!("(${:02X}),Y", lo),
        AddressingMode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
            format!("${:04X}", target)
        }
    };

    let undocumented = opcodes::is_undocumented(byte(0));
    let marker = if undocumented { "*" } else { "" };
    let text = if operand.is_empty() {
        format!("{}{}", marker, opcode.mnemonic)
    } else {
        format!("{}{} {}", marker, opcode.mnemonic, operand)
    };
    Disassembly {
        len: opcode.len(),
        text,
    }
}

/// Disassembles a contiguous block loaded at `start`.
pub fn disassemble_block(bytes: &[u8], start: u16) -> Vec<(u16, Disassembly)> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let pc = start.wrapping_add(offset as u16);
        let line = disassemble(&bytes[offset..], pc);
        offset += line.len as usize;
        out.push((pc, line));
    }
    out
}

/// A traced instruction: where it was, what it was, and the registers before
/// it executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub pc: u16,
    pub bytes: Vec<u8>,
    pub disassembly: String,
    pub state: CpuState,
}

impl TraceEntry {
    /// Captures the instruction at the CPU's PC without touching the machine.
    pub fn capture(cpu: &Cpu, bus: &Bus) -> Self {
        let pc = cpu.pc();
        let window = bus.peek_range(pc, 3);
        let line = disassemble(&window, pc);
        TraceEntry {
            pc,
            bytes: window[..line.len as usize].to_vec(),
            disassembly: line.text,
            state: cpu.snapshot(),
        }
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes: Vec<String> = self.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        write!(
            f,
            "{:04X}  {:<8} {:<32} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            bytes.join(" "),
            self.disassembly,
            self.state.a,
            self.state.x,
            self.state.y,
            self.state.status,
            self.state.sp,
            self.state.cycles
        )
    }
}

/// Breakpoints plus a bounded ring of recently executed instructions. Only
/// observes; never changes CPU state.
pub struct Debugger {
    breakpoints: BTreeMap<u16, Breakpoint>,
    trace: VecDeque<TraceEntry>,
    trace_capacity: usize,
    tracing: bool,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}

impl Debugger {
    pub fn new() -> Self {
        Self::with_trace_capacity(debug_flags::trace_depth())
    }

    pub fn with_trace_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Debugger {
            breakpoints: BTreeMap::new(),
            trace: VecDeque::with_capacity(capacity),
            trace_capacity: capacity,
            tracing: false,
        }
    }

    pub fn add_breakpoint(&mut self, address: u16) {
        self.breakpoints.insert(
            address,
            Breakpoint {
                address,
                enabled: true,
                hit_count: 0,
            },
        );
        log::debug!("Breakpoint added at ${:04X}", address);
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> bool {
        let removed = self.breakpoints.remove(&address).is_some();
        if removed {
            log::debug!("Breakpoint removed from ${:04X}", address);
        }
        removed
    }

    /// Flips a breakpoint on or off. Returns the new state, or `None` if no
    /// breakpoint exists at `address`.
    pub fn toggle_breakpoint(&mut self, address: u16) -> Option<bool> {
        let bp = self.breakpoints.get_mut(&address)?;
        bp.enabled = !bp.enabled;
        Some(bp.enabled)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.values()
    }

    /// True if an enabled breakpoint sits at `pc`; counts the hit.
    pub fn should_break(&mut self, pc: u16) -> bool {
        match self.breakpoints.get_mut(&pc) {
            Some(bp) if bp.enabled => {
                bp.hit_count += 1;
                log::info!("Breakpoint hit at ${:04X} (hit count: {})", pc, bp.hit_count);
                true
            }
            _ => false,
        }
    }

    pub fn set_tracing(&mut self, enabled: bool) {
        self.tracing = enabled;
    }

    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Appends to the trace ring, dropping the oldest entry when full.
    pub fn record(&mut self, entry: TraceEntry) {
        if self.trace.len() == self.trace_capacity {
            self.trace.pop_front();
        }
        self.trace.push_back(entry);
    }

    /// Oldest first.
    pub fn trace(&self) -> impl Iterator<Item = &TraceEntry> {
        self.trace.iter()
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }
}
