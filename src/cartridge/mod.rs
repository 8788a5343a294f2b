mod cartridge;

pub use self::cartridge::{Cartridge, CartridgeError};

#[cfg(test)]
pub(crate) use self::cartridge::test_rom;
