mod clk;
mod cpu;
mod execute;
mod instructions;
mod registers;

pub use self::cpu::Cpu;
pub use self::instructions::{AddrMode, Cond, Instruction, Kind, CB_INSTRUCTIONS, INSTRUCTIONS};
pub use self::registers::{Flags, Registers, Regs};
