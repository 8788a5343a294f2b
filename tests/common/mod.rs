#![allow(dead_code)]

use gbsync::interconnect::Interconnect;
use gbsync::{Cartridge, GameBoy};

pub const ROM_SIZE: usize = 0x8000;
pub const ENTRY: usize = 0x100;
const CGB_FLAG: usize = 0x143;

/// Builds a 32 KiB ROM-only image.
pub struct RomBuilder {
    rom: Vec<u8>,
}

impl RomBuilder {
    pub fn new() -> RomBuilder {
        RomBuilder {
            rom: vec![0; ROM_SIZE],
        }
    }

    /// Places `bytes` at `addr`.
    pub fn at(mut self, addr: usize, bytes: &[u8]) -> RomBuilder {
        self.rom[addr..addr + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Places the main program at the entry point.
    pub fn program(self, bytes: &[u8]) -> RomBuilder {
        self.at(ENTRY, bytes)
    }

    pub fn cgb(mut self) -> RomBuilder {
        self.rom[CGB_FLAG] = 0x80;
        self
    }

    pub fn build(self) -> Cartridge {
        Cartridge::new(self.rom).expect("test ROM is a valid cartridge")
    }
}

pub fn gameboy(program: &[u8]) -> GameBoy {
    GameBoy::new(RomBuilder::new().program(program).build())
}

pub fn bus(cgb: bool) -> Interconnect {
    let mut rom = RomBuilder::new();
    if cgb {
        rom = rom.cgb();
    }
    Interconnect::new(rom.build(), cgb)
}

/// Ticks the bus for `m` machine cycles the way the CPU does.
pub fn run_cycles(bus: &mut Interconnect, m: u32) {
    for _ in 0..m {
        for _ in 0..4 {
            bus.tick();
        }
        bus.step_dma();
    }
}
