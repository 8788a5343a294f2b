mod timer;

pub use self::timer::{Timer, DIV, TAC, TIMA, TMA};
