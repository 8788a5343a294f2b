mod serial;

pub use self::serial::{Serial, SB, SC};
