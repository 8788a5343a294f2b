use crate::interconnect::MemoryMapped;

pub const P1: u16 = 0xFF00;

const SELECT_BUTTONS: u8 = 1 << 5;
const SELECT_DIRECTIONS: u8 = 1 << 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    fn is_direction(&self) -> bool {
        matches!(*self, Button::Right | Button::Left | Button::Up | Button::Down)
    }

    fn line(&self) -> u8 {
        use self::Button::*;
        match *self {
            Right | A => 1 << 0,
            Left | B => 1 << 1,
            Up | Select => 1 << 2,
            Down | Start => 1 << 3,
        }
    }
}

#[derive(Debug)]
pub struct Joypad {
    select: u8,
    buttons: u8,
    directions: u8,
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Joypad {
    pub fn new() -> Joypad {
        Joypad {
            select: SELECT_BUTTONS | SELECT_DIRECTIONS,
            buttons: 0,
            directions: 0,
        }
    }

    /// Updates a key. Returns true on a new press, which should raise the
    /// joypad interrupt.
    pub fn set(&mut self, button: Button, pressed: bool) -> bool {
        let group = if button.is_direction() {
            &mut self.directions
        } else {
            &mut self.buttons
        };
        let was_pressed = *group & button.line() != 0;

        if pressed {
            *group |= button.line();
        } else {
            *group &= !button.line();
        }
        pressed && !was_pressed
    }
}

impl MemoryMapped for Joypad {
    fn readb(&self, addr: u16) -> u8 {
        assert_eq!(addr, P1, "joypad only decodes P1");

        // Keys are active low.
        let mut out = 0xC0 | self.select | 0x0F;
        if self.select & SELECT_BUTTONS == 0 {
            out &= !self.buttons;
        }
        if self.select & SELECT_DIRECTIONS == 0 {
            out &= !self.directions;
        }
        out
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        assert_eq!(addr, P1, "joypad only decodes P1");
        self.select = val & (SELECT_BUTTONS | SELECT_DIRECTIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_selected_reads_high() {
        let mut pad = Joypad::new();
        pad.set(Button::A, true);
        assert_eq!(pad.readb(P1), 0xFF);
    }

    #[test]
    fn groups_are_selected_independently() {
        let mut pad = Joypad::new();
        assert!(pad.set(Button::Start, true));
        assert!(pad.set(Button::Left, true));
        assert!(!pad.set(Button::Left, true));

        pad.writeb(P1, 0x10);
        assert_eq!(pad.readb(P1), 0xD7);

        pad.writeb(P1, 0x20);
        assert_eq!(pad.readb(P1), 0xED);

        pad.set(Button::Left, false);
        assert_eq!(pad.readb(P1), 0xEF);
    }
}
