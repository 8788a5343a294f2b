mod ram;

pub use self::ram::{Ram, SVBK};
