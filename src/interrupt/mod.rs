mod interrupt;

pub use self::interrupt::{Interrupt, InterruptController, IE_ADDR, IF_ADDR};
