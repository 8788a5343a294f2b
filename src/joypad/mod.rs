mod joypad;

pub use self::joypad::{Button, Joypad, P1};
