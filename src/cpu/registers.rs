use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        const C = 0x10;
        const H = 0x20;
        const N = 0x40;
        const Z = 0x80;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regs {
    // 8 bit
    A,
    B,
    C,
    D,
    E,
    F,
    H,
    L,
    // 16 bit
    PC,
    SP,
    // Pairs
    AF,
    BC,
    DE,
    HL,
}

impl Regs {
    pub fn is_wide(&self) -> bool {
        use self::Regs::*;
        matches!(*self, PC | SP | AF | BC | DE | HL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    pub a: u8,
    f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub pc: u16,
    pub sp: u16,
}

impl Registers {
    /// Register state left behind by the boot ROM.
    pub fn post_boot(cgb: bool) -> Registers {
        let mut regs = Registers {
            sp: 0xFFFE,
            pc: 0x0100,
            ..Registers::default()
        };
        if cgb {
            regs.writew(Regs::AF, 0x1180);
            regs.writew(Regs::BC, 0x0000);
            regs.writew(Regs::DE, 0xFF56);
            regs.writew(Regs::HL, 0x000D);
        } else {
            regs.writew(Regs::AF, 0x01B0);
            regs.writew(Regs::BC, 0x0013);
            regs.writew(Regs::DE, 0x00D8);
            regs.writew(Regs::HL, 0x014D);
        }
        regs
    }

    pub fn readb(&self, reg: Regs) -> u8 {
        use self::Regs::*;
        match reg {
            A => self.a,
            B => self.b,
            C => self.c,
            D => self.d,
            E => self.e,
            F => self.f,
            H => self.h,
            L => self.l,
            _ => panic!("{:?} isn't an 8 bit register", reg),
        }
    }

    pub fn writeb(&mut self, reg: Regs, val: u8) {
        use self::Regs::*;
        match reg {
            A => self.a = val,
            B => self.b = val,
            C => self.c = val,
            D => self.d = val,
            E => self.e = val,
            F => self.f = val & 0xF0,
            H => self.h = val,
            L => self.l = val,
            _ => panic!("{:?} isn't an 8 bit register", reg),
        }
    }

    pub fn readw(&self, reg: Regs) -> u16 {
        use self::Regs::*;
        match reg {
            PC => self.pc,
            SP => self.sp,
            AF => ((self.a as u16) << 8) | (self.f as u16),
            BC => ((self.b as u16) << 8) | (self.c as u16),
            DE => ((self.d as u16) << 8) | (self.e as u16),
            HL => ((self.h as u16) << 8) | (self.l as u16),
            _ => panic!("{:?} isn't a 16 bit register", reg),
        }
    }

    pub fn writew(&mut self, reg: Regs, val: u16) {
        use self::Regs::*;
        match reg {
            PC => self.pc = val,
            SP => self.sp = val,
            AF => {
                self.a = (val >> 8) as u8;
                self.f = val as u8 & 0xF0;
            }
            BC => {
                self.b = (val >> 8) as u8;
                self.c = val as u8;
            }
            DE => {
                self.d = (val >> 8) as u8;
                self.e = val as u8;
            }
            HL => {
                self.h = (val >> 8) as u8;
                self.l = val as u8;
            }
            _ => panic!("{:?} isn't a 16 bit register", reg),
        }
    }

    /// Reads either width, zero extending 8 bit registers.
    pub fn read(&self, reg: Regs) -> u16 {
        if reg.is_wide() {
            self.readw(reg)
        } else {
            self.readb(reg) as u16
        }
    }

    pub fn write(&mut self, reg: Regs, val: u16) {
        if reg.is_wide() {
            self.writew(reg, val)
        } else {
            self.writeb(reg, val as u8)
        }
    }

    pub fn flags(&self) -> Flags {
        Flags::from_bits_truncate(self.f)
    }

    pub fn flag(&self, flag: Flags) -> bool {
        self.flags().contains(flag)
    }

    pub fn set_flag(&mut self, flag: Flags, on: bool) {
        let mut flags = self.flags();
        flags.set(flag, on);
        self.f = flags.bits();
    }

    pub fn set_znhc(&mut self, z: bool, n: bool, h: bool, c: bool) {
        let mut flags = Flags::empty();
        flags.set(Flags::Z, z);
        flags.set(Flags::N, n);
        flags.set(Flags::H, h);
        flags.set(Flags::C, c);
        self.f = flags.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dmg_post_boot_state() {
        let regs = Registers::post_boot(false);
        assert_eq!(regs.readw(Regs::AF), 0x01B0);
        assert_eq!(regs.readw(Regs::BC), 0x0013);
        assert_eq!(regs.readw(Regs::DE), 0x00D8);
        assert_eq!(regs.readw(Regs::HL), 0x014D);
        assert_eq!(regs.sp, 0xFFFE);
        assert_eq!(regs.pc, 0x0100);
        assert!(regs.flag(Flags::Z));
        assert!(!regs.flag(Flags::N));
    }

    #[test]
    fn cgb_post_boot_state() {
        let regs = Registers::post_boot(true);
        assert_eq!(regs.readw(Regs::AF), 0x1180);
        assert_eq!(regs.readw(Regs::DE), 0xFF56);
        assert_eq!(regs.readw(Regs::HL), 0x000D);
    }

    #[test]
    fn flag_updates_leave_others_alone() {
        let mut regs = Registers::default();
        regs.set_znhc(true, false, true, false);
        regs.set_flag(Flags::C, true);
        assert_eq!(regs.flags(), Flags::Z | Flags::H | Flags::C);
        regs.set_flag(Flags::Z, false);
        assert_eq!(regs.readb(Regs::F), 0x30);
    }

    proptest! {
        #[test]
        fn pairs_compose_halves(val in any::<u16>()) {
            let mut regs = Registers::default();
            for &(pair, hi, lo) in [(Regs::BC, Regs::B, Regs::C),
                                     (Regs::DE, Regs::D, Regs::E),
                                     (Regs::HL, Regs::H, Regs::L)].iter() {
                regs.writew(pair, val);
                prop_assert_eq!(regs.readb(hi), (val >> 8) as u8);
                prop_assert_eq!(regs.readb(lo), val as u8);
                prop_assert_eq!(regs.readw(pair), val);
            }
        }

        #[test]
        fn f_low_nibble_is_always_zero(val in any::<u16>(), byte in any::<u8>()) {
            let mut regs = Registers::default();
            regs.writew(Regs::AF, val);
            prop_assert_eq!(regs.readw(Regs::AF), val & 0xFFF0);
            regs.writeb(Regs::F, byte);
            prop_assert_eq!(regs.readb(Regs::F) & 0x0F, 0);
        }
    }
}
