use tracing::trace;

pub const SB: u16 = 0xFF01;
pub const SC: u16 = 0xFF02;

const TRANSFER_START: u8 = 0x80;
const INTERNAL_CLOCK: u8 = 0x01;

/// Serial port with no link partner.
///
/// Transfers on the internal clock complete instantly and shift in 0xFF.
/// Outgoing bytes are kept so a host can read what a program printed.
#[derive(Debug, Default)]
pub struct Serial {
    data: u8,
    control: u8,
    output: Vec<u8>,
}

impl Serial {
    pub fn new() -> Serial {
        Serial::default()
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            SB => self.data,
            SC => self.control | 0x7E,
            _ => panic!("Invalid serial read 0x{:04x}", addr),
        }
    }

    /// Returns true when the write finished a transfer.
    pub fn write(&mut self, addr: u16, val: u8) -> bool {
        match addr {
            SB => {
                self.data = val;
                false
            }
            SC => {
                self.control = val & (TRANSFER_START | INTERNAL_CLOCK);
                if self.control == TRANSFER_START | INTERNAL_CLOCK {
                    trace!("serial out 0x{:02x}", self.data);
                    self.output.push(self.data);
                    self.data = 0xFF;
                    self.control &= !TRANSFER_START;
                    true
                } else {
                    false
                }
            }
            _ => panic!("Invalid serial write 0x{:04x}", addr),
        }
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_clock_transfer_completes() {
        let mut serial = Serial::new();
        serial.write(SB, b'h');
        assert!(serial.write(SC, 0x81));
        assert_eq!(serial.read(SB), 0xFF);
        assert_eq!(serial.read(SC), 0x7F);
        assert_eq!(serial.take_output(), b"h".to_vec());
        assert!(serial.take_output().is_empty());
    }

    #[test]
    fn external_clock_waits() {
        let mut serial = Serial::new();
        serial.write(SB, 0x42);
        assert!(!serial.write(SC, 0x80));
        assert_eq!(serial.read(SC), 0xFE);
        assert_eq!(serial.read(SB), 0x42);
    }
}
