//! Ricoh 2A03 (NMOS 6502) CPU core with the bus, scheduler and debugging
//! surfaces needed to run it headless.

pub mod bus;
pub mod cpu;
pub mod cpu_bus;
pub mod debug_flags;
pub mod debugger;
pub mod emulator;
pub mod error;
pub mod mapper;
pub mod memory;
pub mod save_state;

pub use bus::{Bus, Peripheral, Signals};
pub use cpu::{Cpu, CpuState, ResetKind, Sequence, StatusFlags};
pub use cpu_bus::CpuBus;
pub use emulator::{Machine, RunOutcome};
pub use error::{CpuError, ImageError, MemoryError, StateError};
pub use mapper::{Mapper, Nrom};
pub use save_state::SaveState;
