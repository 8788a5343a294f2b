use std::fmt;

use crate::interconnect::MemoryMapped;

pub const IF_ADDR: u16 = 0xFF0F;
pub const IE_ADDR: u16 = 0xFFFF;

const INTERRUPT_MASK: u8 = 0x1F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 1,
    LCDCStat = 1 << 1,
    Timer = 1 << 2,
    Serial = 1 << 3,
    Joypad = 1 << 4,
}

impl Interrupt {
    pub fn get_addr(&self) -> u16 {
        use self::Interrupt::*;
        match *self {
            VBlank => 0x0040,
            LCDCStat => 0x0048,
            Timer => 0x0050,
            Serial => 0x0058,
            Joypad => 0x0060,
        }
    }
}

pub struct InterruptController {
    pub ime: bool,
    pub iflag: u8,
    pub ie: u8,
}

impl fmt::Debug for InterruptController {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f,
                 "int ctrl: ime: {} ie: 0x{:08b} iflag 0x{:08b}",
                 self.ime,
                 self.ie,
                 self.iflag)
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    pub fn new() -> InterruptController {
        InterruptController {
            ime: false,
            iflag: 0,
            ie: 0,
        }
    }

    /// Requests that are both raised and enabled, ignoring IME.
    pub fn pending(&self) -> u8 {
        self.iflag & self.ie & INTERRUPT_MASK
    }

    /// The highest priority interrupt that would be dispatched right now.
    pub fn get_interrupt(&self) -> Option<Interrupt> {
        use self::Interrupt::*;
        let interrupt = self.pending();

        if interrupt == 0x0 || !self.ime {
            return None;
        }

        [VBlank, LCDCStat, Timer, Serial, Joypad]
            .into_iter()
            .find(|int| interrupt & (*int as u8) != 0)
    }

    pub fn reset_interrupt(&mut self, int: Interrupt) {
        self.iflag &= !(int as u8);
    }

    pub fn request_interrupt(&mut self, int: Interrupt) {
        self.iflag |= int as u8;
    }
}

impl MemoryMapped for InterruptController {
    fn readb(&self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => self.iflag | 0xE0,
            IE_ADDR => self.ie,
            _ => panic!("Interrupt controller can't read 0x{:04x}", addr),
        }
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        match addr {
            IF_ADDR => self.iflag = val & INTERRUPT_MASK,
            IE_ADDR => self.ie = val,
            _ => panic!("Interrupt controller can't write to 0x{:04x}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vblank_beats_timer() {
        let mut ic = InterruptController::new();
        ic.ime = true;
        ic.ie = 0x1F;
        ic.request_interrupt(Interrupt::Timer);
        ic.request_interrupt(Interrupt::VBlank);

        assert_eq!(ic.get_interrupt(), Some(Interrupt::VBlank));
        ic.reset_interrupt(Interrupt::VBlank);
        assert_eq!(ic.get_interrupt(), Some(Interrupt::Timer));
        assert_eq!(ic.iflag, Interrupt::Timer as u8);
    }

    #[test]
    fn nothing_dispatched_without_ime_or_enable() {
        let mut ic = InterruptController::new();
        ic.request_interrupt(Interrupt::Joypad);
        ic.ie = Interrupt::Joypad as u8;
        assert_eq!(ic.get_interrupt(), None);
        assert_eq!(ic.pending(), Interrupt::Joypad as u8);

        ic.ime = true;
        ic.ie = Interrupt::Serial as u8;
        assert_eq!(ic.get_interrupt(), None);
    }

    #[test]
    fn if_reads_with_upper_bits_set() {
        let mut ic = InterruptController::new();
        ic.writeb(IF_ADDR, 0xFF);
        assert_eq!(ic.iflag, 0x1F);
        assert_eq!(ic.readb(IF_ADDR), 0xFF);
        ic.writeb(IF_ADDR, 0x05);
        assert_eq!(ic.readb(IF_ADDR), 0xE5);

        ic.writeb(IE_ADDR, 0xAB);
        assert_eq!(ic.readb(IE_ADDR), 0xAB);
    }
}
