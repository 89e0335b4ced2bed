//! Cartridge capability seen from the CPU bus.
//!
//! Bank-switching internals belong to each mapper; the bus only needs reads,
//! writes and the IRQ line a mapper may hold asserted.

use crate::error::ImageError;

/// Start of the cartridge PRG ROM window.
pub const PRG_START: u16 = 0x8000;
const PRG_RAM_START: u16 = 0x6000;
const PRG_RAM_SIZE: usize = 0x2000;
/// Offset of the NMI vector in a 32 KiB image; programs must end before it.
const VECTORS_OFFSET: usize = 0x7FFA;

pub trait Mapper {
    /// Reads cartridge space (0x4020-0xFFFF). `None` leaves the open-bus value.
    fn cpu_read(&self, addr: u16) -> Option<u8>;
    fn cpu_write(&mut self, addr: u16, data: u8);

    /// Level of the cartridge IRQ line.
    fn irq_pending(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Mapper 0: fixed PRG ROM mirrored across 0x8000-0xFFFF, 8 KiB PRG RAM at
/// 0x6000-0x7FFF.
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
}

impl Nrom {
    /// An empty image is replaced by a single zero-filled 16 KiB bank.
    pub fn new(prg_rom: Vec<u8>) -> Self {
        let prg_rom = if prg_rom.is_empty() {
            vec![0; 0x4000]
        } else {
            prg_rom
        };
        Nrom {
            prg_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
        }
    }

    /// A 32 KiB image with `program` placed at `load_addr` and the reset vector
    /// pointing at it. The program must sit in $8000-$FFF9.
    pub fn with_program(program: &[u8], load_addr: u16) -> Result<Self, ImageError> {
        if load_addr < PRG_START {
            return Err(ImageError::LoadAddressBelowPrg { load_addr });
        }
        let start = (load_addr - PRG_START) as usize;
        let available = VECTORS_OFFSET.saturating_sub(start);
        if program.len() > available {
            return Err(ImageError::ProgramTooLarge {
                len: program.len(),
                available,
            });
        }

        let mut prg_rom = vec![0; 0x8000];
        prg_rom[start..start + program.len()].copy_from_slice(program);
        prg_rom[0x7FFC] = load_addr as u8;
        prg_rom[0x7FFD] = (load_addr >> 8) as u8;
        Ok(Nrom::new(prg_rom))
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }
}

impl Mapper for Nrom {
    fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[(addr - PRG_RAM_START) as usize]),
            0x8000..=0xFFFF => {
                let offset = (addr - PRG_START) as usize % self.prg_rom.len();
                Some(self.prg_rom[offset])
            }
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8) {
        // PRG ROM ignores writes
        if let 0x6000..=0x7FFF = addr {
            self.prg_ram[(addr - PRG_RAM_START) as usize] = data;
        }
    }

    fn name(&self) -> &'static str {
        "NROM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_16k_image_is_mirrored() {
        let mut prg = vec![0; 0x4000];
        prg[0] = 0xAA;
        prg[0x3FFF] = 0xBB;
        let nrom = Nrom::new(prg);

        assert_eq!(nrom.cpu_read(0x8000), Some(0xAA));
        assert_eq!(nrom.cpu_read(0xC000), Some(0xAA));
        assert_eq!(nrom.cpu_read(0xFFFF), Some(0xBB));
    }

    #[test]
    fn test_prg_ram_and_rom_writes() {
        let mut nrom = Nrom::new(vec![0x11; 0x8000]);

        nrom.cpu_write(0x6005, 0x42);
        nrom.cpu_write(0x8000, 0x99);

        assert_eq!(nrom.cpu_read(0x6005), Some(0x42));
        assert_eq!(nrom.cpu_read(0x8000), Some(0x11));
        assert_eq!(nrom.cpu_read(0x5000), None);
        assert!(!nrom.irq_pending());
    }

    #[test]
    fn test_with_program_sets_reset_vector() {
        let nrom = Nrom::with_program(&[0xA9, 0x01], 0xC000).unwrap();

        assert_eq!(nrom.cpu_read(0xC000), Some(0xA9));
        assert_eq!(nrom.cpu_read(0xFFFC), Some(0x00));
        assert_eq!(nrom.cpu_read(0xFFFD), Some(0xC0));
    }

    #[test]
    fn test_with_program_rejects_low_load_address() {
        assert_eq!(
            Nrom::with_program(&[0xA9, 0x42, 0x02], 0x0600).err(),
            Some(ImageError::LoadAddressBelowPrg { load_addr: 0x0600 })
        );
    }

    #[test]
    fn test_with_program_rejects_program_over_vectors() {
        // Fits exactly up to $FFF9
        assert!(Nrom::with_program(&[0xEA; 0x7A], 0xFF80).is_ok());

        assert_eq!(
            Nrom::with_program(&[0xEA; 0x7B], 0xFF80).err(),
            Some(ImageError::ProgramTooLarge {
                len: 0x7B,
                available: 0x7A
            })
        );
        assert!(matches!(
            Nrom::with_program(&vec![0; 0x8000], PRG_START),
            Err(ImageError::ProgramTooLarge { .. })
        ));
    }
}
