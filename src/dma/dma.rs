pub const DMA: u16 = 0xFF46;

pub const OAM_DMA_LEN: u8 = 0xA0;
const START_DELAY: u8 = 2;

/// One byte the OAM DMA wants moved this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaTransfer {
    pub source: u16,
    pub oam_offset: u8,
}

#[derive(Debug, Default)]
pub struct Dma {
    active: bool,
    start_delay: u8,
    page: u8,
    byte: u8,
}

impl Dma {
    pub fn new() -> Dma {
        Dma::default()
    }

    /// Latches the source page; copying begins after the start delay.
    pub fn start(&mut self, page: u8) {
        self.byte = 0;
        self.active = true;
        self.start_delay = START_DELAY;
        self.page = page;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last value written to the trigger register.
    pub fn page(&self) -> u8 {
        self.page
    }

    /// Advances the transfer by one machine cycle and returns the byte to
    /// copy, if any.
    pub fn step(&mut self) -> Option<DmaTransfer> {
        if !self.active {
            return None;
        }
        if self.start_delay > 0 {
            self.start_delay -= 1;
            return None;
        }

        let transfer = DmaTransfer {
            source: (self.page as u16) << 8 | self.byte as u16,
            oam_offset: self.byte,
        };
        self.byte += 1;
        self.active = self.byte < OAM_DMA_LEN;
        Some(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_then_sequential_bytes() {
        let mut dma = Dma::new();
        dma.start(0xC1);
        assert_eq!(dma.step(), None);
        assert_eq!(dma.step(), None);

        for i in 0..OAM_DMA_LEN {
            assert!(dma.is_active());
            let t = dma.step().expect("transfer in flight");
            assert_eq!(t.source, 0xC100 + i as u16);
            assert_eq!(t.oam_offset, i);
        }
        assert!(!dma.is_active());
        assert_eq!(dma.step(), None);
    }

    #[test]
    fn restart_resets_cursor() {
        let mut dma = Dma::new();
        dma.start(0x80);
        for _ in 0..10 {
            dma.step();
        }
        dma.start(0x90);
        assert_eq!(dma.page(), 0x90);
        dma.step();
        dma.step();
        assert_eq!(dma.step().map(|t| t.source), Some(0x9000));
    }
}
