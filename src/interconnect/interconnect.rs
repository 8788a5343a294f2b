use std::cell::Cell;
use std::fmt;

use tracing::{debug, warn};

use crate::cartridge::Cartridge;
use crate::dma::{Dma, Hdma, HdmaStart, DMA, HDMA1, HDMA5};
use crate::gpu::{self, Gpu, Mode, VBK};
use crate::interrupt::{Interrupt, InterruptController, IE_ADDR, IF_ADDR};
use crate::joypad::{Joypad, P1};
use crate::ram::{Ram, SVBK};
use crate::serial::{Serial, SB, SC};
use crate::timer::{Timer, DIV, TAC, TIMA};
use super::MemoryMapped;

const SOUND_BASE: u16 = 0xFF10;
const SOUND_END: u16 = 0xFF3F;
const BOOT: u16 = 0xFF50;
const PALETTES: u16 = 0xFF68;
const OPRI: u16 = 0xFF6C;
const UNDOC_BASE: u16 = 0xFF72;
const UNDOC_END: u16 = 0xFF75;
const IO_BASE: u16 = 0xFF00;

/// Bytes moved by each HBlank in HBlank HDMA mode.
const HDMA_HBLANK_BYTES: usize = 16;

pub struct Interconnect {
    cart: Cartridge, // 0x0000 -> 0x7FFF, 0xA000 -> 0xBFFF
    ram: Ram, // 0xC000 -> 0xDFFF, 0xFF80 -> 0xFFFE
    pub gpu: Gpu,
    pub timer: Timer,
    pub dma: Dma,
    pub hdma: Hdma,
    pub ic: InterruptController,
    pub joypad: Joypad,
    pub serial: Serial,
    sound: [u8; (SOUND_END - SOUND_BASE + 1) as usize],
    cgb: bool,
    // One bit per I/O register that has already been reported as unmapped.
    warned: Cell<u128>,
}

impl Interconnect {
    pub fn new(cart: Cartridge, cgb: bool) -> Interconnect {
        Interconnect {
            cart: cart,
            ram: Ram::new(cgb),
            gpu: Gpu::new(cgb),
            timer: Timer::new(),
            dma: Dma::new(),
            hdma: Hdma::new(),
            ic: InterruptController::new(),
            joypad: Joypad::new(),
            serial: Serial::new(),
            sound: [0; (SOUND_END - SOUND_BASE + 1) as usize],
            cgb: cgb,
            warned: Cell::new(0),
        }
    }

    pub fn is_cgb(&self) -> bool {
        self.cgb
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    /// One dot of timer and PPU. HBlank HDMA blocks run as the PPU enters
    /// HBlank on a visible line.
    pub fn tick(&mut self) {
        self.timer.tick(&mut self.ic);

        if let Some(Mode::HBlank) = self.gpu.tick(&mut self.ic) {
            if self.hdma.in_hblank_mode() && (self.gpu.ly() as usize) < gpu::SCREEN_H {
                for _ in 0..HDMA_HBLANK_BYTES {
                    self.hdma_step();
                }
            }
        }
    }

    /// One machine cycle of OAM DMA.
    pub fn step_dma(&mut self) {
        if let Some(transfer) = self.dma.step() {
            let val = self.readb(transfer.source);
            self.gpu.dma_write_oam(transfer.oam_offset as u16, val);
        }
    }

    fn hdma_step(&mut self) {
        if let Some(transfer) = self.hdma.step() {
            let val = self.readb(transfer.source);
            self.gpu.write_vram(transfer.dest, val);
        }
    }

    fn start_hdma(&mut self, val: u8) {
        match self.hdma.start(val) {
            HdmaStart::General => {
                while self.hdma.is_active() {
                    self.hdma_step();
                }
            }
            HdmaStart::HBlank | HdmaStart::Aborted => {}
        }
    }

    fn unmapped_io(&self, addr: u16) {
        let bit = 1u128 << (addr - IO_BASE);
        let warned = self.warned.get();
        if warned & bit == 0 {
            warn!("unimplemented I/O register 0x{:04x}", addr);
            self.warned.set(warned | bit);
        }
    }

    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            P1 => self.joypad.readb(addr),
            SB | SC => self.serial.read(addr),
            DIV..=TAC => self.timer.readb(addr),
            IF_ADDR => self.ic.readb(addr),
            SOUND_BASE..=SOUND_END => self.sound[(addr - SOUND_BASE) as usize],
            gpu::LCDC..=0xFF4B => self.gpu.readb(addr),
            BOOT => 0xFF,
            VBK | PALETTES..=OPRI | UNDOC_BASE..=UNDOC_END if self.cgb => self.gpu.readb(addr),
            HDMA1..=HDMA5 if self.cgb => self.hdma.read(addr),
            SVBK if self.cgb => self.ram.readb(addr),
            _ => {
                self.unmapped_io(addr);
                0
            }
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        match addr {
            P1 => self.joypad.writeb(addr, val),
            SB | SC => {
                if self.serial.write(addr, val) {
                    self.ic.request_interrupt(Interrupt::Serial);
                }
            }
            DIV => self.timer.set_div(&mut self.ic),
            TIMA..=TAC => self.timer.writeb(addr, val),
            IF_ADDR => self.ic.writeb(addr, val),
            SOUND_BASE..=SOUND_END => self.sound[(addr - SOUND_BASE) as usize] = val,
            DMA => {
                debug!("oam dma from 0x{:02x}00", val);
                self.gpu.writeb(addr, val);
                self.dma.start(val);
            }
            gpu::LCDC..=0xFF4B => self.gpu.writeb(addr, val),
            BOOT => {}
            VBK | PALETTES..=OPRI | UNDOC_BASE..=UNDOC_END if self.cgb => {
                self.gpu.writeb(addr, val)
            }
            HDMA5 if self.cgb => self.start_hdma(val),
            HDMA1..=0xFF54 if self.cgb => self.hdma.write(addr, val),
            SVBK if self.cgb => self.ram.writeb(addr, val),
            _ => self.unmapped_io(addr),
        }
    }
}

impl MemoryMapped for Interconnect {
    fn readb(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.cart.readb(addr),
            0x8000..=0x9FFF => self.gpu.readb(addr),
            0xA000..=0xBFFF => self.cart.readb(addr),
            0xC000..=0xDFFF => self.ram.readb(addr),
            0xE000..=0xFDFF => 0, // Echo RAM isn't mirrored
            0xFE00..=0xFE9F => self.gpu.readb(addr),
            0xFEA0..=0xFEFF => 0,
            0xFF00..=0xFF7F => self.read_io(addr),
            0xFF80..=0xFFFE => self.ram.readb(addr),
            IE_ADDR => self.ic.readb(addr),
        }
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF => self.cart.writeb(addr, val),
            0x8000..=0x9FFF => self.gpu.writeb(addr, val),
            0xA000..=0xBFFF => self.cart.writeb(addr, val),
            0xC000..=0xDFFF => self.ram.writeb(addr, val),
            0xE000..=0xFDFF => {}
            0xFE00..=0xFE9F => self.gpu.writeb(addr, val),
            0xFEA0..=0xFEFF => {}
            0xFF00..=0xFF7F => self.write_io(addr, val),
            0xFF80..=0xFFFE => self.ram.writeb(addr, val),
            IE_ADDR => self.ic.writeb(addr, val),
        }
    }
}

impl fmt::Debug for Interconnect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "interconnect: cgb: {}", self.cgb)?;
        write!(f, "{:?}{:?}", self.gpu, self.ic)?;
        writeln!(f, "{:?}", self.timer)
    }
}
