use std::fmt;

use crate::interconnect::MemoryMapped;

pub const SVBK: u16 = 0xFF70;

const WRAM_SZ: usize = 0x8000;
const WRAM_BANK_SZ: usize = 0x1000;
const ZRAM_SZ: usize = 0x7F;

pub struct Ram {
    wram: [u8; WRAM_SZ], // 0xC000 -> 0xDFFF, 0xD000 -> 0xDFFF banked on CGB
    zram: [u8; ZRAM_SZ], // 0xFF80 -> 0xFFFE
    wram_bank: u8,
    cgb: bool,
}

impl Ram {
    pub fn new(cgb: bool) -> Ram {
        Ram {
            wram: [0; WRAM_SZ],
            zram: [0; ZRAM_SZ],
            wram_bank: 1,
            cgb: cgb,
        }
    }

    fn wram_offset(&self, addr: u16) -> usize {
        match addr {
            0xC000..=0xCFFF => addr as usize - 0xC000,
            0xD000..=0xDFFF => self.wram_bank as usize * WRAM_BANK_SZ + (addr as usize - 0xD000),
            _ => panic!("0x{:04x} isn't in work RAM", addr),
        }
    }
}

impl MemoryMapped for Ram {
    fn readb(&self, addr: u16) -> u8 {
        match addr {
            0xC000..=0xDFFF => self.wram[self.wram_offset(addr)],
            0xFF80..=0xFFFE => self.zram[addr as usize - 0xFF80],
            SVBK => self.wram_bank | 0xF8,
            _ => panic!("RAM can't read 0x{:04x}", addr),
        }
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        match addr {
            0xC000..=0xDFFF => {
                let offset = self.wram_offset(addr);
                self.wram[offset] = val;
            }
            0xFF80..=0xFFFE => self.zram[addr as usize - 0xFF80] = val,
            SVBK => {
                if self.cgb {
                    // Bank 0 can't be mapped at 0xD000.
                    self.wram_bank = match val & 0x07 {
                        0 => 1,
                        n => n,
                    };
                }
            }
            _ => panic!("RAM can't write to 0x{:04x}", addr),
        }
    }
}

impl fmt::Debug for Ram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "ram: wram_bank: {} cgb: {}", self.wram_bank, self.cgb)
    }
}
