use crate::cpu_bus::CpuBus;
use crate::mapper::Mapper;
use crate::memory::Memory;

/// Pixel-unit cycles per CPU cycle (NTSC).
pub const PPU_CYCLES_PER_CPU_CYCLE: u32 = 3;

/// Interrupt lines reported by the units clocked alongside the CPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// NMI line level; the CPU latches rising edges.
    pub nmi: bool,
    /// IRQ line level.
    pub irq: bool,
}

/// A register-mapped unit living on the CPU bus (pixel or audio processor).
pub trait Peripheral {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Side-effect free read for debuggers. Defaults to open bus.
    fn peek(&self, _addr: u16) -> Option<u8> {
        None
    }

    /// Advances the unit by `cycles` of its own clock.
    fn clock(&mut self, cycles: u32) -> Signals;
}

/// Stand-in for an absent unit: reads float, writes vanish, never interrupts.
#[derive(Debug, Default)]
pub struct Disconnected;

impl Peripheral for Disconnected {
    fn read(&mut self, _addr: u16) -> u8 {
        0
    }

    fn write(&mut self, _addr: u16, _data: u8) {}

    fn clock(&mut self, _cycles: u32) -> Signals {
        Signals::default()
    }
}

pub struct Bus {
    ram: Memory,
    ppu: Box<dyn Peripheral>,
    apu: Box<dyn Peripheral>,
    mapper: Box<dyn Mapper>,
    // Last value driven on the data bus
    open_bus: u8,
}

impl Bus {
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        Bus {
            ram: Memory::new(),
            ppu: Box::new(Disconnected),
            apu: Box::new(Disconnected),
            mapper,
            open_bus: 0,
        }
    }

    pub fn with_peripherals(
        mapper: Box<dyn Mapper>,
        ppu: Box<dyn Peripheral>,
        apu: Box<dyn Peripheral>,
    ) -> Self {
        Bus {
            ppu,
            apu,
            ..Bus::new(mapper)
        }
    }

    pub fn ram(&self) -> &Memory {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut Memory {
        &mut self.ram
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    /// Clocks the pixel and audio units for `cpu_cycles` CPU cycles and
    /// returns the combined interrupt lines.
    pub fn clock(&mut self, cpu_cycles: u32) -> Signals {
        let ppu = self.ppu.clock(cpu_cycles * PPU_CYCLES_PER_CPU_CYCLE);
        let apu = self.apu.clock(cpu_cycles);
        Signals {
            nmi: ppu.nmi,
            irq: ppu.irq || apu.irq || self.mapper.irq_pending(),
        }
    }

    /// Reads without side effects: no register reads, no open-bus update.
    pub fn peek(&self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => Some(self.ram.read_mirrored(addr)),
            0x2000..=0x3FFF => self.ppu.peek(ppu_register(addr)),
            0x4000..=0x401F => self.apu.peek(addr),
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
        };
        value.unwrap_or(self.open_bus)
    }

    pub fn peek_range(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.peek(addr.wrapping_add(i as u16)))
            .collect()
    }
}

fn ppu_register(addr: u16) -> u16 {
    0x2000 | (addr & 0x0007)
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        let data = match addr {
            0x0000..=0x1FFF => self.ram.read_mirrored(addr),
            0x2000..=0x3FFF => self.ppu.read(ppu_register(addr)),
            0x4000..=0x401F => self.apu.read(addr),
            0x4020..=0xFFFF => self.mapper.cpu_read(addr).unwrap_or(self.open_bus),
        };
        self.open_bus = data;
        data
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.open_bus = data;
        match addr {
            0x0000..=0x1FFF => self.ram.write_mirrored(addr, data),
            0x2000..=0x3FFF => self.ppu.write(ppu_register(addr), data),
            0x4000..=0x401F => self.apu.write(addr, data),
            0x4020..=0xFFFF => self.mapper.cpu_write(addr, data),
        }
    }
}
