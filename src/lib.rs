pub mod cartridge;
pub mod cpu;
pub mod dma;
pub mod gameboy;
pub mod gpu;
pub mod interconnect;
pub mod interrupt;
pub mod joypad;
pub mod ram;
pub mod serial;
pub mod timer;

pub use crate::cartridge::{Cartridge, CartridgeError};
pub use crate::gameboy::{GameBoy, HardwareMode, CPU_HZ, FRAME_TICKS, SCREEN_H, SCREEN_W};
pub use crate::interconnect::MemoryMapped;
pub use crate::joypad::Button;
