use crate::error::MemoryError;

/// Size of the console's internal work RAM.
pub const INTERNAL_RAM_SIZE: usize = 0x800;

/// A fixed-size RAM block. Direct indexing is bounds-checked; the bus uses the
/// mirrored accessors, which fold any address into the block.
pub struct Memory {
    ram: Vec<u8>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self::with_size(INTERNAL_RAM_SIZE)
    }

    /// `size` must be a power of two for mirroring to cover the block evenly.
    pub fn with_size(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Memory { ram: vec![0; size] }
    }

    pub fn len(&self) -> usize {
        self.ram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ram.is_empty()
    }

    pub fn read(&self, index: usize) -> Result<u8, MemoryError> {
        self.ram
            .get(index)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange {
                index,
                size: self.ram.len(),
            })
    }

    pub fn write(&mut self, index: usize, data: u8) -> Result<(), MemoryError> {
        let size = self.ram.len();
        match self.ram.get_mut(index) {
            Some(byte) => {
                *byte = data;
                Ok(())
            }
            None => Err(MemoryError::AddressOutOfRange { index, size }),
        }
    }

    pub fn read_mirrored(&self, addr: u16) -> u8 {
        self.ram[addr as usize & (self.ram.len() - 1)]
    }

    pub fn write_mirrored(&mut self, addr: u16, data: u8) {
        let mask = self.ram.len() - 1;
        self.ram[addr as usize & mask] = data;
    }

    /// Copies `data` in at `offset`; fails without writing if it would not fit.
    pub fn load(&mut self, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        let end = offset.saturating_add(data.len());
        if end > self.ram.len() {
            return Err(MemoryError::AddressOutOfRange {
                index: end.saturating_sub(1),
                size: self.ram.len(),
            });
        }
        self.ram[offset..end].copy_from_slice(data);
        Ok(())
    }

    // Save state methods
    pub fn as_slice(&self) -> &[u8] {
        &self.ram
    }

    pub fn fill(&mut self, value: u8) {
        self.ram.fill(value);
    }
}
