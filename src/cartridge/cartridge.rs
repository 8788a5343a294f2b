use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::interconnect::MemoryMapped;

const ROM_BANK_SZ: usize = 0x4000;
const RAM_BANK_SZ: usize = 0x2000;

const TITLE: std::ops::Range<usize> = 0x134..0x143;
const CGB_FLAG: usize = 0x143;
const CART_TYPE: usize = 0x147;
const RAM_SIZE: usize = 0x149;
const HEADER_END: usize = 0x150;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("ROM image is {0} bytes, too small to hold a header")]
    TooSmall(usize),
    #[error("unsupported cartridge type 0x{0:02x}")]
    UnsupportedMbc(u8),
    #[error("unsupported RAM size code 0x{0:02x}")]
    UnsupportedRamSize(u8),
    #[error("failed to read ROM: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mbc {
    None,
    One,
}

pub struct Cartridge {
    mbc: Mbc,
    rom: Vec<u8>,
    rom_bank: u8,
    ram: Vec<u8>,
    ram_bank: u8,
    ram_enable: bool,
    // MBC1 banking mode: false = ROM, true = RAM.
    ram_mode: bool,
}

impl Cartridge {
    pub fn new(buf: Vec<u8>) -> Result<Cartridge, CartridgeError> {
        if buf.len() < HEADER_END {
            return Err(CartridgeError::TooSmall(buf.len()));
        }

        let mbc = match buf[CART_TYPE] {
            0x00 => Mbc::None,
            0x01..=0x03 => Mbc::One,
            inv => return Err(CartridgeError::UnsupportedMbc(inv)),
        };

        let ram_sz = match buf[RAM_SIZE] {
            0x00 => 0,
            0x01 => 0x800,
            0x02 => RAM_BANK_SZ,
            0x03 => RAM_BANK_SZ * 4,
            0x04 => RAM_BANK_SZ * 16,
            0x05 => RAM_BANK_SZ * 8,
            inv => return Err(CartridgeError::UnsupportedRamSize(inv)),
        };

        let cart = Cartridge {
            mbc: mbc,
            rom: buf,
            rom_bank: 1,
            ram: vec![0; ram_sz],
            ram_bank: 0,
            ram_enable: false,
            ram_mode: false,
        };

        info!("cartridge \"{}\": {:?} mbc, {} KiB ROM, {} KiB RAM, cgb: {}",
              cart.title(),
              cart.mbc,
              cart.rom.len() / 1024,
              cart.ram.len() / 1024,
              cart.supports_cgb());
        Ok(cart)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Cartridge, CartridgeError> {
        let buf = fs::read(path)?;
        Cartridge::new(buf)
    }

    pub fn title(&self) -> String {
        self.rom[TITLE]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    /// Whether the header asks for color hardware.
    pub fn supports_cgb(&self) -> bool {
        self.rom[CGB_FLAG] & 0x80 != 0
    }

    fn rom_offset(&self, addr: u16) -> usize {
        let addr = addr as usize;
        match self.mbc {
            Mbc::None => addr,
            Mbc::One => {
                if addr < ROM_BANK_SZ {
                    addr
                } else {
                    let bank = match self.rom_bank & 0x1F {
                        0 => self.rom_bank | 1,
                        _ => self.rom_bank,
                    };
                    (addr - ROM_BANK_SZ) + bank as usize * ROM_BANK_SZ
                }
            }
        }
    }

    fn ram_offset(&self, addr: u16) -> Option<usize> {
        if !self.ram_enable || self.ram.is_empty() {
            return None;
        }
        let bank = if self.ram_mode { self.ram_bank as usize } else { 0 };
        Some(((addr as usize & (RAM_BANK_SZ - 1)) + bank * RAM_BANK_SZ) % self.ram.len())
    }

    fn write_mbc1(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enable = val & 0x0F == 0x0A,
            0x2000..=0x3FFF => self.rom_bank = (self.rom_bank & 0x60) | (val & 0x1F),
            0x4000..=0x5FFF => {
                if self.ram_mode {
                    self.ram_bank = val & 0x03;
                } else {
                    self.rom_bank = (self.rom_bank & 0x1F) | ((val & 0x03) << 5);
                }
            }
            _ => self.ram_mode = val & 0x01 != 0,
        }
    }
}

impl MemoryMapped for Cartridge {
    fn readb(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => {
                let offset = self.rom_offset(addr);
                self.rom.get(offset % self.rom.len()).copied().unwrap_or(0xFF)
            }
            0xA000..=0xBFFF => self.ram_offset(addr).map_or(0xFF, |offset| self.ram[offset]),
            _ => panic!("Cartridge can't read 0x{:04x}", addr),
        }
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF => {
                if self.mbc == Mbc::One {
                    self.write_mbc1(addr, val);
                }
            }
            0xA000..=0xBFFF => {
                if let Some(offset) = self.ram_offset(addr) {
                    self.ram[offset] = val;
                }
            }
            _ => panic!("Cartridge can't write to 0x{:04x}", addr),
        }
    }
}

/// Builds a ROM-only image with `program` placed at the entry point.
#[cfg(test)]
pub(crate) fn test_rom(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0; 0x8000];
    rom[0x100..0x100 + program.len()].copy_from_slice(program);
    rom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mbc1_rom(banks: usize) -> Vec<u8> {
        let mut rom = vec![0; banks * ROM_BANK_SZ];
        for bank in 0..banks {
            rom[bank * ROM_BANK_SZ] = bank as u8;
        }
        rom[CART_TYPE] = 0x03;
        rom[RAM_SIZE] = 0x03;
        rom
    }

    #[test]
    fn rejects_short_and_unknown_images() {
        assert!(matches!(Cartridge::new(vec![0; 0x10]), Err(CartridgeError::TooSmall(0x10))));

        let mut rom = test_rom(&[]);
        rom[CART_TYPE] = 0x19;
        assert!(matches!(Cartridge::new(rom), Err(CartridgeError::UnsupportedMbc(0x19))));
    }

    #[test]
    fn rom_only_reads_flat_and_ignores_writes() {
        let mut cart = Cartridge::new(test_rom(&[0x3E, 0x42])).unwrap();
        assert_eq!(cart.readb(0x0100), 0x3E);
        cart.writeb(0x2000, 0x05);
        assert_eq!(cart.readb(0x0101), 0x42);
        assert_eq!(cart.readb(0xA000), 0xFF);
    }

    #[test]
    fn mbc1_switches_rom_banks() {
        let mut cart = Cartridge::new(mbc1_rom(8)).unwrap();
        assert_eq!(cart.readb(0x4000), 1);
        cart.writeb(0x2000, 0x05);
        assert_eq!(cart.readb(0x4000), 5);
        cart.writeb(0x2000, 0x00);
        assert_eq!(cart.readb(0x4000), 1);
    }

    #[test]
    fn mbc1_ram_needs_enable() {
        let mut cart = Cartridge::new(mbc1_rom(2)).unwrap();
        cart.writeb(0xA000, 0x12);
        assert_eq!(cart.readb(0xA000), 0xFF);

        cart.writeb(0x0000, 0x0A);
        cart.writeb(0xA000, 0x12);
        assert_eq!(cart.readb(0xA000), 0x12);

        cart.writeb(0x6000, 0x01);
        cart.writeb(0x4000, 0x02);
        assert_eq!(cart.readb(0xA000), 0x00);
        cart.writeb(0x4000, 0x00);
        assert_eq!(cart.readb(0xA000), 0x12);
    }

    #[test]
    fn header_fields() {
        let mut rom = test_rom(&[]);
        rom[0x134..0x138].copy_from_slice(b"TEST");
        rom[CGB_FLAG] = 0x80;
        let cart = Cartridge::new(rom).unwrap();
        assert_eq!(cart.title(), "TEST");
        assert!(cart.supports_cgb());
    }
}
