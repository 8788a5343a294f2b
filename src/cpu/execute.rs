use tracing::debug;

use super::cpu::{Cpu, Operands};
use super::instructions::{AddrMode, Cond, Instruction, Kind};
use super::registers::{Flags, Regs};

impl Cpu {
    fn check_cond(&self, cond: Cond) -> bool {
        match cond {
            Cond::Always => true,
            Cond::NZ => !self.regs.flag(Flags::Z),
            Cond::Z => self.regs.flag(Flags::Z),
            Cond::NC => !self.regs.flag(Flags::C),
            Cond::C => self.regs.flag(Flags::C),
        }
    }

    /// Stores an 8 bit result to memory or to the first operand register.
    fn store(&mut self, inst: &Instruction, ops: &Operands, val: u8) {
        match ops.dest {
            Some(addr) => self.writeb(addr, val),
            None => {
                if let Some(reg) = inst.reg1 {
                    self.regs.writeb(reg, val);
                }
            }
        }
    }

    pub(super) fn execute(&mut self, inst: &Instruction, ops: Operands) {
        match inst.kind {
            Kind::Nop => {}
            Kind::Ld => self.ld(inst, &ops),
            Kind::Ldh => self.ldh(inst, &ops),
            Kind::Inc => self.inc_dec(inst, &ops, true),
            Kind::Dec => self.inc_dec(inst, &ops, false),
            Kind::Add => self.add(inst, &ops),
            Kind::Adc | Kind::Sub | Kind::Sbc | Kind::And | Kind::Xor | Kind::Or | Kind::Cp => {
                self.alu(inst.kind, ops.data as u8)
            }
            Kind::Rlca | Kind::Rrca | Kind::Rla | Kind::Rra => {
                let kind = match inst.kind {
                    Kind::Rlca => Kind::Rlc,
                    Kind::Rrca => Kind::Rrc,
                    Kind::Rla => Kind::Rl,
                    _ => Kind::Rr,
                };
                let a = self.regs.a;
                self.regs.a = self.rotate(kind, a);
                self.regs.set_flag(Flags::Z, false);
            }
            Kind::Daa => self.daa(),
            Kind::Cpl => {
                self.regs.a = !self.regs.a;
                self.regs.set_flag(Flags::N, true);
                self.regs.set_flag(Flags::H, true);
            }
            Kind::Scf => {
                self.regs.set_flag(Flags::N, false);
                self.regs.set_flag(Flags::H, false);
                self.regs.set_flag(Flags::C, true);
            }
            Kind::Ccf => {
                let c = self.regs.flag(Flags::C);
                self.regs.set_flag(Flags::N, false);
                self.regs.set_flag(Flags::H, false);
                self.regs.set_flag(Flags::C, !c);
            }
            Kind::Stop => debug!("STOP at 0x{:04x}", self.regs.pc.wrapping_sub(1)),
            Kind::Halt => self.halted = true,
            Kind::Jr => {
                if self.check_cond(inst.cond) {
                    let offset = ops.data as u8 as i8;
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    self.cycles(1);
                }
            }
            Kind::Jp => {
                if self.check_cond(inst.cond) {
                    self.regs.pc = ops.data;
                    self.cycles(1);
                }
            }
            Kind::JpHl => self.regs.pc = self.regs.readw(Regs::HL),
            Kind::Call => {
                if self.check_cond(inst.cond) {
                    self.cycles(1);
                    let pc = self.regs.pc;
                    self.push(pc);
                    self.regs.pc = ops.data;
                }
            }
            Kind::Ret => {
                if inst.cond != Cond::Always {
                    self.cycles(1);
                }
                if self.check_cond(inst.cond) {
                    self.regs.pc = self.pop();
                    self.cycles(1);
                }
            }
            Kind::Reti => {
                self.interconnect.ic.ime = true;
                self.regs.pc = self.pop();
                self.cycles(1);
            }
            Kind::Rst => {
                self.cycles(1);
                let pc = self.regs.pc;
                self.push(pc);
                self.regs.pc = inst.param as u16;
            }
            Kind::Push => {
                self.cycles(1);
                self.push(ops.data);
            }
            Kind::Pop => {
                let val = self.pop();
                if let Some(reg) = inst.reg1 {
                    self.regs.writew(reg, val);
                }
            }
            Kind::Di => {
                self.interconnect.ic.ime = false;
                self.enabling_ime = false;
            }
            Kind::Ei => self.enabling_ime = true,
            Kind::Cb => self.cb(ops.data as u8),
            Kind::Rlc | Kind::Rrc | Kind::Rl | Kind::Rr | Kind::Sla | Kind::Sra | Kind::Swap |
            Kind::Srl => {
                let val = self.rotate(inst.kind, ops.data as u8);
                self.store(inst, &ops, val);
            }
            Kind::Bit => {
                let set = (ops.data as u8 >> inst.param) & 1 != 0;
                self.regs.set_flag(Flags::Z, !set);
                self.regs.set_flag(Flags::N, false);
                self.regs.set_flag(Flags::H, true);
            }
            Kind::Res => {
                let val = ops.data as u8 & !(1 << inst.param);
                self.store(inst, &ops, val);
            }
            Kind::Set => {
                let val = ops.data as u8 | (1 << inst.param);
                self.store(inst, &ops, val);
            }
        }
    }

    fn cb(&mut self, op: u8) {
        let inst = match super::instructions::CB_INSTRUCTIONS[op as usize] {
            Some(inst) => inst,
            None => panic!("The instruction 0xcb 0x{:02x} isn't implemented", op),
        };
        let ops = self.fetch_operands(&inst);
        self.execute(&inst, ops);
    }

    fn ld(&mut self, inst: &Instruction, ops: &Operands) {
        if let Some(addr) = ops.dest {
            // LD (a16),SP stores both bytes.
            if inst.reg2 == Some(Regs::SP) {
                self.writew(addr, ops.data);
            } else {
                self.writeb(addr, ops.data as u8);
            }
            return;
        }

        let reg = match inst.reg1 {
            Some(reg) => reg,
            None => panic!("{:?} has nowhere to load into", inst),
        };

        match inst.mode {
            AddrMode::HlSpe8 => {
                let val = self.add_sp_e8(ops.data as u8);
                self.regs.writew(Regs::HL, val);
                self.cycles(1);
            }
            AddrMode::RegReg if reg == Regs::SP => {
                self.regs.sp = ops.data;
                self.cycles(1);
            }
            _ => self.regs.write(reg, ops.data),
        }
    }

    fn ldh(&mut self, inst: &Instruction, ops: &Operands) {
        match ops.dest {
            Some(addr) => self.writeb(addr, ops.data as u8),
            None => {
                let val = self.readb(0xFF00 | ops.data);
                if let Some(reg) = inst.reg1 {
                    self.regs.writeb(reg, val);
                }
            }
        }
    }

    fn inc_dec(&mut self, inst: &Instruction, ops: &Operands, inc: bool) {
        let reg = inst.reg1.unwrap_or(Regs::HL);

        if reg.is_wide() && ops.dest.is_none() {
            let val = if inc { ops.data.wrapping_add(1) } else { ops.data.wrapping_sub(1) };
            self.regs.writew(reg, val);
            self.cycles(1);
            return;
        }

        let val = ops.data as u8;
        let res = if inc { val.wrapping_add(1) } else { val.wrapping_sub(1) };
        self.regs.set_flag(Flags::Z, res == 0);
        self.regs.set_flag(Flags::N, !inc);
        let half = if inc { val & 0x0F == 0x0F } else { val & 0x0F == 0 };
        self.regs.set_flag(Flags::H, half);
        self.store(inst, ops, res);
    }

    fn add(&mut self, inst: &Instruction, ops: &Operands) {
        match inst.reg1 {
            Some(Regs::HL) => {
                let hl = self.regs.readw(Regs::HL);
                let val = ops.data;
                let (res, carry) = hl.overflowing_add(val);
                self.regs.set_flag(Flags::N, false);
                self.regs.set_flag(Flags::H, (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF);
                self.regs.set_flag(Flags::C, carry);
                self.regs.writew(Regs::HL, res);
                self.cycles(1);
            }
            Some(Regs::SP) => {
                self.regs.sp = self.add_sp_e8(ops.data as u8);
                self.cycles(2);
            }
            _ => self.alu(Kind::Add, ops.data as u8),
        }
    }

    /// SP plus a signed offset, with Z and N cleared and H/C taken from the
    /// unsigned low byte addition.
    fn add_sp_e8(&mut self, e8: u8) -> u16 {
        let sp = self.regs.sp;
        let res = sp.wrapping_add(e8 as i8 as u16);
        let h = (sp & 0x0F) + (e8 as u16 & 0x0F) > 0x0F;
        let c = (sp & 0xFF) + e8 as u16 > 0xFF;
        self.regs.set_znhc(false, false, h, c);
        res
    }

    pub(super) fn alu(&mut self, kind: Kind, val: u8) {
        let a = self.regs.a;
        let carry = self.regs.flag(Flags::C) as u8;

        match kind {
            Kind::Add | Kind::Adc => {
                let c = if kind == Kind::Adc { carry } else { 0 };
                let sum = a as u16 + val as u16 + c as u16;
                let res = sum as u8;
                let h = (a & 0x0F) + (val & 0x0F) + c > 0x0F;
                self.regs.set_znhc(res == 0, false, h, sum > 0xFF);
                self.regs.a = res;
            }
            Kind::Sub | Kind::Sbc | Kind::Cp => {
                let c = if kind == Kind::Sbc { carry } else { 0 };
                let res = a.wrapping_sub(val).wrapping_sub(c);
                let h = (a & 0x0F) < (val & 0x0F) + c;
                let borrow = (a as u16) < val as u16 + c as u16;
                self.regs.set_znhc(res == 0, true, h, borrow);
                if kind != Kind::Cp {
                    self.regs.a = res;
                }
            }
            Kind::And => {
                self.regs.a = a & val;
                self.regs.set_znhc(a & val == 0, false, true, false);
            }
            Kind::Xor => {
                self.regs.a = a ^ val;
                self.regs.set_znhc(a ^ val == 0, false, false, false);
            }
            Kind::Or => {
                self.regs.a = a | val;
                self.regs.set_znhc(a | val == 0, false, false, false);
            }
            _ => panic!("{:?} isn't an ALU operation", kind),
        }
    }

    /// CB rotates and shifts. Sets Z from the result.
    fn rotate(&mut self, kind: Kind, val: u8) -> u8 {
        let carry = self.regs.flag(Flags::C) as u8;
        let (res, c) = match kind {
            Kind::Rlc => (val.rotate_left(1), val & 0x80 != 0),
            Kind::Rrc => (val.rotate_right(1), val & 0x01 != 0),
            Kind::Rl => ((val << 1) | carry, val & 0x80 != 0),
            Kind::Rr => ((val >> 1) | (carry << 7), val & 0x01 != 0),
            Kind::Sla => (val << 1, val & 0x80 != 0),
            Kind::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
            Kind::Swap => (val.rotate_left(4), false),
            Kind::Srl => (val >> 1, val & 0x01 != 0),
            _ => panic!("{:?} isn't a rotate", kind),
        };
        self.regs.set_znhc(res == 0, false, false, c);
        res
    }

    fn daa(&mut self) {
        let mut a = self.regs.a;
        let n = self.regs.flag(Flags::N);
        let mut adjust = 0;
        let mut carry = false;

        if self.regs.flag(Flags::H) || (!n && a & 0x0F > 0x09) {
            adjust |= 0x06;
        }
        if self.regs.flag(Flags::C) || (!n && a > 0x99) {
            adjust |= 0x60;
            carry = true;
        }
        a = if n { a.wrapping_sub(adjust) } else { a.wrapping_add(adjust) };

        self.regs.a = a;
        self.regs.set_flag(Flags::Z, a == 0);
        self.regs.set_flag(Flags::H, false);
        self.regs.set_flag(Flags::C, carry);
    }
}
