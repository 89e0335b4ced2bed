use std::fmt;

use crate::cpu::opcodes::{AddressingMode, Mnemonic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// The opcode table paired a mnemonic with a mode the executor cannot run.
    UnsupportedCombination {
        opcode: u8,
        mnemonic: Mnemonic,
        mode: AddressingMode,
    },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuError::UnsupportedCombination {
                opcode,
                mnemonic,
                mode,
            } => write!(
                f,
                "opcode 0x{:02X}: {} does not support {:?} addressing",
                opcode,
                mnemonic.name(),
                mode
            ),
        }
    }
}

impl std::error::Error for CpuError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    AddressOutOfRange { index: usize, size: usize },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AddressOutOfRange { index, size } => write!(
                f,
                "address 0x{:04X} out of range for {} byte memory",
                index, size
            ),
        }
    }
}

impl std::error::Error for MemoryError {}

/// A raw program that does not fit the cartridge window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    LoadAddressBelowPrg { load_addr: u16 },
    ProgramTooLarge { len: usize, available: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::LoadAddressBelowPrg { load_addr } => write!(
                f,
                "load address ${:04X} is below the PRG ROM window at $8000",
                load_addr
            ),
            ImageError::ProgramTooLarge { len, available } => write!(
                f,
                "program is {} bytes but only {} fit before the vectors",
                len, available
            ),
        }
    }
}

impl std::error::Error for ImageError {}

#[derive(Debug)]
pub enum StateError {
    Io(std::io::Error),
    Encoding(bincode::Error),
    UnsupportedVersion { found: u32, current: u32 },
    RamSize { found: usize, expected: usize },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Io(e) => write!(f, "save state I/O failed: {}", e),
            StateError::Encoding(e) => write!(f, "save state encoding failed: {}", e),
            StateError::UnsupportedVersion { found, current } => write!(
                f,
                "save state version {} is not supported (current: {})",
                found, current
            ),
            StateError::RamSize { found, expected } => write!(
                f,
                "save state RAM is {} bytes, expected {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Io(e) => Some(e),
            StateError::Encoding(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(e: std::io::Error) -> Self {
        StateError::Io(e)
    }
}

impl From<bincode::Error> for StateError {
    fn from(e: bincode::Error) -> Self {
        StateError::Encoding(e)
    }
}
