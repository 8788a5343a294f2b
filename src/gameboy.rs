use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::cartridge::Cartridge;
use crate::cpu::{Cpu, Registers};
use crate::gpu::{LINES_PER_FRAME, LINE_TICKS};
use crate::interconnect::Interconnect;
use crate::joypad::Button;
use crate::interrupt::Interrupt;

pub use crate::gpu::{SCREEN_H, SCREEN_W};

pub const CPU_HZ: u32 = 4_194_304;
/// Dots in one full frame, LCD on.
pub const FRAME_TICKS: u32 = LINE_TICKS * LINES_PER_FRAME as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareMode {
    Dmg,
    Cgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hardware mode \"{0}\"")]
pub struct ParseModeError(String);

impl FromStr for HardwareMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<HardwareMode, ParseModeError> {
        match s {
            "dmg" => Ok(HardwareMode::Dmg),
            "cgb" => Ok(HardwareMode::Cgb),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct GameBoy {
    cpu: Cpu,
    mode: HardwareMode,
}

impl GameBoy {
    /// Picks the hardware mode from the cartridge header.
    pub fn new(cart: Cartridge) -> GameBoy {
        let mode = if cart.supports_cgb() { HardwareMode::Cgb } else { HardwareMode::Dmg };
        GameBoy::with_mode(cart, mode)
    }

    pub fn with_mode(cart: Cartridge, mode: HardwareMode) -> GameBoy {
        info!("running as {:?}", mode);
        let ic = Interconnect::new(cart, mode == HardwareMode::Cgb);
        GameBoy {
            cpu: Cpu::new(ic),
            mode: mode,
        }
    }

    pub fn mode(&self) -> HardwareMode {
        self.mode
    }

    /// Runs one instruction (or one halted cycle). Returns the dots spent.
    pub fn step(&mut self) -> u32 {
        self.cpu.step()
    }

    pub fn run(&mut self, timeslice: u32) -> u32 {
        let mut ticks = 0;
        loop {
            ticks += self.cpu.step();
            if ticks >= timeslice {
                return ticks;
            }
        }
    }

    /// Runs until the PPU finishes a frame. With the LCD off no frame ever
    /// completes, so this gives up after one frame's worth of dots.
    pub fn run_frame(&mut self) -> u32 {
        let frame = self.frame_count();
        let mut ticks = 0;
        while self.frame_count() == frame && ticks < FRAME_TICKS {
            ticks += self.cpu.step();
        }
        ticks
    }

    pub fn frame_count(&self) -> u64 {
        self.cpu.interconnect.gpu.frame()
    }

    pub fn back_buffer(&self) -> &[u32] {
        self.cpu.interconnect.gpu.back_buffer()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        let ic = &mut self.cpu.interconnect;
        if ic.joypad.set(button, pressed) {
            ic.ic.request_interrupt(Interrupt::Joypad);
        }
    }

    /// Bytes the program has shifted out of the serial port.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.cpu.interconnect.serial.take_output()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn registers(&self) -> &Registers {
        self.cpu.regs()
    }
}
