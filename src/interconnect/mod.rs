mod interconnect;

pub use self::interconnect::Interconnect;

/// A device that sits on the memory bus.
///
/// Addresses passed in are absolute; each device decodes the range it was
/// mapped at.
pub trait MemoryMapped {
    fn readb(&self, addr: u16) -> u8;

    fn writeb(&mut self, addr: u16, val: u8);

    fn readw(&self, addr: u16) -> u16 {
        (self.readb(addr) as u16) | ((self.readb(addr.wrapping_add(1)) as u16) << 8)
    }

    fn writew(&mut self, addr: u16, val: u16) {
        self.writeb(addr, (val & 0xFF) as u8);
        self.writeb(addr.wrapping_add(1), (val >> 8) as u8);
    }
}
