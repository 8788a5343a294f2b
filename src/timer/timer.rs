use std::fmt;

use crate::interconnect::MemoryMapped;
use crate::interrupt::{Interrupt, InterruptController};

pub const DIV: u16 = 0xFF04;
pub const TIMA: u16 = 0xFF05;
pub const TMA: u16 = 0xFF06;
pub const TAC: u16 = 0xFF07;

const TAC_ENABLE: u8 = 1 << 2;
// Divider value the boot ROM leaves behind.
const DIV_POWER_ON: u16 = 0xAC00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputClockFreq {
    Freq4096,
    Freq262144,
    Freq65536,
    Freq16384,
}

impl InputClockFreq {
    fn from_tac(tac: u8) -> InputClockFreq {
        use self::InputClockFreq::*;
        match tac & 0b11 {
            0b00 => Freq4096,
            0b01 => Freq262144,
            0b10 => Freq65536,
            _ => Freq16384,
        }
    }

    /// The divider bit whose falling edge clocks TIMA.
    fn div_bit(&self) -> u16 {
        use self::InputClockFreq::*;
        match *self {
            Freq4096 => 1 << 9,
            Freq262144 => 1 << 3,
            Freq65536 => 1 << 5,
            Freq16384 => 1 << 7,
        }
    }
}

pub struct Timer {
    div: u16,
    counter: u8,
    modulo: u8,
    tac: u8,
    // Overflow from a DIV write that had no controller to report to.
    irq_pending: bool,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Timer")
            .field("enabled", &self.enabled())
            .field("div", &format_args!("0x{:04x}", self.div))
            .field("counter", &format_args!("0x{:02x}", self.counter))
            .field("modulo", &format_args!("0x{:02x}", self.modulo))
            .field("input_freq", &InputClockFreq::from_tac(self.tac))
            .finish()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            div: DIV_POWER_ON,
            counter: 0,
            modulo: 0,
            tac: 0,
            irq_pending: false,
        }
    }

    pub fn get_div(&self) -> u8 {
        (self.div >> 8) as u8
    }

    /// Any write to DIV clears the whole internal counter.
    pub fn set_div(&mut self, ic: &mut InterruptController) {
        if self.reset_div() {
            ic.request_interrupt(Interrupt::Timer);
        }
    }

    /// Clears the divider. Returns true if the edge this caused overflowed TIMA.
    fn reset_div(&mut self) -> bool {
        let prev = self.div;
        self.div = 0;
        self.falling_edge(prev, self.div) && self.increment()
    }

    pub fn get_tima(&self) -> u8 {
        self.counter
    }

    pub fn set_tima(&mut self, val: u8) {
        self.counter = val;
    }

    pub fn get_tma(&self) -> u8 {
        self.modulo
    }

    pub fn set_tma(&mut self, val: u8) {
        self.modulo = val;
    }

    pub fn get_tac(&self) -> u8 {
        self.tac | 0xF8
    }

    pub fn set_tac(&mut self, val: u8) {
        self.tac = val & 0x07;
    }

    fn enabled(&self) -> bool {
        self.tac & TAC_ENABLE != 0
    }

    fn falling_edge(&self, prev: u16, now: u16) -> bool {
        let bit = InputClockFreq::from_tac(self.tac).div_bit();
        self.enabled() && (prev & bit) != 0 && (now & bit) == 0
    }

    /// Bumps TIMA, reloading from TMA on overflow. Returns true on overflow.
    fn increment(&mut self) -> bool {
        let (counter, overflow) = self.counter.overflowing_add(1);
        self.counter = if overflow { self.modulo } else { counter };
        overflow
    }

    /// Advances the divider by a single tick.
    pub fn tick(&mut self, ic: &mut InterruptController) {
        let prev = self.div;
        self.div = self.div.wrapping_add(1);

        let overflow = self.falling_edge(prev, self.div) && self.increment();
        if overflow || self.irq_pending {
            self.irq_pending = false;
            ic.request_interrupt(Interrupt::Timer);
        }
    }
}

// The bus routes DIV writes through `set_div`. A DIV write that arrives here
// has no controller, so an overflow it causes is raised on the next tick.
impl MemoryMapped for Timer {
    fn readb(&self, addr: u16) -> u8 {
        match addr {
            DIV => self.get_div(),
            TIMA => self.get_tima(),
            TMA => self.get_tma(),
            TAC => self.get_tac(),
            _ => panic!("Invalid timer read 0x{:04x}", addr),
        }
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        match addr {
            DIV => {
                if self.reset_div() {
                    self.irq_pending = true;
                }
            }
            TIMA => self.set_tima(val),
            TMA => self.set_tma(val),
            TAC => self.set_tac(val),
            _ => panic!("Invalid timer write 0x{:04x}", addr),
        }
    }
}
