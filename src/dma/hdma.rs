use tracing::debug;

pub const HDMA1: u16 = 0xFF51;
pub const HDMA2: u16 = 0xFF52;
pub const HDMA3: u16 = 0xFF53;
pub const HDMA4: u16 = 0xFF54;
pub const HDMA5: u16 = 0xFF55;

/// Bytes moved per HBlank in HBlank mode.
pub const HDMA_BLOCK: u16 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdmaTransfer {
    pub source: u16,
    pub dest: u16,
}

/// What the bus should do after an HDMA5 write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdmaStart {
    /// Copy everything now.
    General,
    /// Copy a block at each HBlank.
    HBlank,
    Aborted,
}

#[derive(Debug, Default)]
pub struct Hdma {
    active: bool,
    hblank_mode: bool,
    aborted: bool,
    source: u16,
    dest: u16,
    remaining: u16,
    hdma1: u8,
    hdma2: u8,
    hdma3: u8,
    hdma4: u8,
}

impl Hdma {
    pub fn new() -> Hdma {
        Hdma::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn in_hblank_mode(&self) -> bool {
        self.active && self.hblank_mode
    }

    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            HDMA1 => self.hdma1,
            HDMA2 => self.hdma2,
            HDMA3 => self.hdma3,
            HDMA4 => self.hdma4,
            HDMA5 => {
                let blocks = (self.remaining / HDMA_BLOCK).wrapping_sub(1) as u8 & 0x7F;
                if self.active {
                    blocks
                } else if self.aborted {
                    0x80 | blocks
                } else {
                    0xFF
                }
            }
            _ => panic!("Invalid HDMA read 0x{:04x}", addr),
        }
    }

    /// Latches a source/destination register. HDMA5 goes through `start`.
    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            HDMA1 => self.hdma1 = val,
            HDMA2 => self.hdma2 = val & 0xF0,
            HDMA3 => self.hdma3 = val & 0x1F,
            HDMA4 => self.hdma4 = val & 0xF0,
            _ => panic!("Invalid HDMA write 0x{:04x}", addr),
        }
    }

    pub fn start(&mut self, val: u8) -> HdmaStart {
        let hblank = val & 0x80 != 0;
        if self.active && self.hblank_mode && !hblank {
            debug!(remaining = self.remaining, "hdma aborted");
            self.active = false;
            self.aborted = true;
            return HdmaStart::Aborted;
        }

        self.source = ((self.hdma1 as u16) << 8 | self.hdma2 as u16) & 0xFFF0;
        self.dest = (((self.hdma3 as u16) << 8 | self.hdma4 as u16) & 0x1FF0) | 0x8000;
        self.remaining = ((val & 0x7F) as u16 + 1) * HDMA_BLOCK;
        self.hblank_mode = hblank;
        self.aborted = false;
        self.active = true;

        debug!("hdma start 0x{:04x} -> 0x{:04x}, {} bytes, hblank: {}",
               self.source,
               self.dest,
               self.remaining,
               hblank);

        if hblank {
            HdmaStart::HBlank
        } else {
            HdmaStart::General
        }
    }

    /// Yields the next byte to copy and advances the pointers.
    pub fn step(&mut self) -> Option<HdmaTransfer> {
        if !self.active || self.remaining == 0 {
            return None;
        }

        let transfer = HdmaTransfer {
            source: self.source,
            dest: self.dest,
        };
        self.source = self.source.wrapping_add(1);
        // The destination never leaves VRAM.
        self.dest = 0x8000 | (self.dest.wrapping_add(1) & 0x1FFF);
        self.remaining -= 1;

        if self.remaining == 0 {
            self.active = false;
        }
        Some(transfer)
    }
}
