use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cpu::CpuState;
use crate::error::StateError;

pub const SAVE_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub version: u32,
    pub cpu: CpuState,
    // Internal work RAM
    pub ram: Vec<u8>,
}

impl SaveState {
    pub fn new(cpu: CpuState, ram: Vec<u8>) -> Self {
        SaveState {
            version: SAVE_STATE_VERSION,
            cpu,
            ram,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<SaveState, StateError> {
        let state: SaveState = bincode::deserialize(data)?;
        if state.version > SAVE_STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                current: SAVE_STATE_VERSION,
            });
        }
        Ok(state)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StateError> {
        let data = self.to_bytes()?;
        std::fs::write(path.as_ref(), data)?;
        log::info!("Save state written to: {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<SaveState, StateError> {
        let data = std::fs::read(path.as_ref())?;
        let state = SaveState::from_bytes(&data)?;
        log::info!("Save state loaded from: {}", path.as_ref().display());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveState {
        let cpu = CpuState {
            a: 0x12,
            x: 0x34,
            y: 0x56,
            sp: 0xF0,
            pc: 0xC123,
            status: 0xA5,
            cycles: 123_456,
            halted: false,
            nmi_pending: true,
            irq_pending: false,
        };
        SaveState::new(cpu, (0..=255).collect())
    }

    #[test]
    fn test_bytes_round_trip() {
        let state = sample();

        let bytes = state.to_bytes().unwrap();

        assert_eq!(SaveState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn test_rejects_newer_version() {
        let mut state = sample();
        state.version = SAVE_STATE_VERSION + 1;
        let bytes = state.to_bytes().unwrap();

        match SaveState::from_bytes(&bytes) {
            Err(StateError::UnsupportedVersion { found, current }) => {
                assert_eq!(found, SAVE_STATE_VERSION + 1);
                assert_eq!(current, SAVE_STATE_VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_data_is_an_encoding_error() {
        let bytes = sample().to_bytes().unwrap();

        let result = SaveState::from_bytes(&bytes[..bytes.len() / 2]);

        assert!(matches!(result, Err(StateError::Encoding(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("nes-cpu-core-{}.state", std::process::id()));
        let state = sample();

        state.save_to_file(&path).unwrap();
        let loaded = SaveState::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, state);
    }
}
