use std::fmt;

use tracing::trace;

use crate::interconnect::{Interconnect, MemoryMapped};
use super::clk::Clock;
use super::instructions::{Instruction, INSTRUCTIONS};
use super::registers::{Registers, Regs};

/// Operands gathered before execution.
#[derive(Debug, Clone, Copy)]
pub(super) struct Operands {
    pub data: u16,
    pub dest: Option<u16>,
}

pub struct Cpu {
    pub(super) regs: Registers,
    pub interconnect: Interconnect,
    clock: Clock,
    pub(super) halted: bool,
    pub(super) enabling_ime: bool,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f,
                 "cpu: pc: 0x{:04x} sp: 0x{:04x} af: 0x{:04x} bc: 0x{:04x} de: 0x{:04x} \
                  hl: 0x{:04x} halted: {}",
                 self.regs.pc,
                 self.regs.sp,
                 self.regs.readw(Regs::AF),
                 self.regs.readw(Regs::BC),
                 self.regs.readw(Regs::DE),
                 self.regs.readw(Regs::HL),
                 self.halted)?;
        write!(f, "{:?}", self.interconnect)
    }
}

impl Cpu {
    pub fn new(interconnect: Interconnect) -> Cpu {
        let cgb = interconnect.is_cgb();
        Cpu {
            regs: Registers::post_boot(cgb),
            interconnect: interconnect,
            clock: Clock::default(),
            halted: false,
            enabling_ime: false,
        }
    }

    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Dots elapsed since power on.
    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    /// Runs `n` machine cycles worth of hardware: four dots of timer and
    /// PPU each, then one DMA step.
    pub fn cycles(&mut self, n: u32) {
        for _ in 0..n {
            for _ in 0..4 {
                self.clock.tick();
                self.interconnect.tick();
            }
            self.interconnect.step_dma();
        }
    }

    pub(super) fn readb(&mut self, addr: u16) -> u8 {
        let val = self.interconnect.readb(addr);
        self.cycles(1);
        val
    }

    pub(super) fn writeb(&mut self, addr: u16, val: u8) {
        self.interconnect.writeb(addr, val);
        self.cycles(1);
    }

    pub(super) fn writew(&mut self, addr: u16, val: u16) {
        self.writeb(addr, val as u8);
        self.writeb(addr.wrapping_add(1), (val >> 8) as u8);
    }

    pub fn fetchb(&mut self) -> u8 {
        let pc = self.regs.pc;
        self.regs.pc = pc.wrapping_add(1);
        self.readb(pc)
    }

    pub fn fetchw(&mut self) -> u16 {
        let lo = self.fetchb() as u16;
        let hi = self.fetchb() as u16;
        lo | (hi << 8)
    }

    pub(super) fn push(&mut self, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        let sp = self.regs.sp;
        self.writeb(sp, (val >> 8) as u8);
        self.regs.sp = sp.wrapping_sub(1);
        let sp = self.regs.sp;
        self.writeb(sp, val as u8);
    }

    pub(super) fn pop(&mut self) -> u16 {
        let sp = self.regs.sp;
        let lo = self.readb(sp) as u16;
        let hi = self.readb(sp.wrapping_add(1)) as u16;
        self.regs.sp = sp.wrapping_add(2);
        lo | (hi << 8)
    }

    /// Executes one instruction, or idles one cycle while halted, then
    /// services interrupts. Returns the number of dots that took.
    pub fn step(&mut self) -> u32 {
        let start = self.clock.ticks();

        if self.halted {
            self.cycles(1);
            if self.interconnect.ic.pending() != 0 {
                self.halted = false;
            }
        } else {
            self.dexec();
        }

        if self.interconnect.ic.ime {
            self.handle_interrupts();
        }

        if self.enabling_ime {
            self.interconnect.ic.ime = true;
            self.enabling_ime = false;
        }

        (self.clock.ticks() - start) as u32
    }

    // Decode and execute.
    fn dexec(&mut self) {
        let pc = self.regs.pc;
        let op = self.fetchb();
        let inst = match INSTRUCTIONS[op as usize] {
            Some(inst) => inst,
            None => panic!("The instruction 0x{:02x}@0x{:04x} isn't implemented", op, pc),
        };

        trace!("{:04x}: {:02x} {:?} a: {:02x} f: {:02x} bc: {:04x} de: {:04x} hl: {:04x} \
                sp: {:04x}",
               pc,
               op,
               inst.kind,
               self.regs.a,
               self.regs.readb(Regs::F),
               self.regs.readw(Regs::BC),
               self.regs.readw(Regs::DE),
               self.regs.readw(Regs::HL),
               self.regs.sp);

        let ops = self.fetch_operands(&inst);
        self.execute(&inst, ops);
    }

    fn reg1(inst: &Instruction) -> Regs {
        match inst.reg1 {
            Some(reg) => reg,
            None => panic!("{:?} has no first operand", inst),
        }
    }

    fn reg2(inst: &Instruction) -> Regs {
        match inst.reg2 {
            Some(reg) => reg,
            None => panic!("{:?} has no second operand", inst),
        }
    }

    /// Address held in a register; C addresses the I/O page.
    fn indirect(&self, reg: Regs) -> u16 {
        match reg {
            Regs::C => 0xFF00 | self.regs.c as u16,
            reg => self.regs.readw(reg),
        }
    }

    pub(super) fn fetch_operands(&mut self, inst: &Instruction) -> Operands {
        use super::instructions::AddrMode::*;

        let mut ops = Operands {
            data: 0,
            dest: None,
        };

        match inst.mode {
            Implied => {}
            Reg => ops.data = self.regs.read(Cpu::reg1(inst)),
            RegReg => ops.data = self.regs.read(Cpu::reg2(inst)),
            RegD8 | D8 | HlSpe8 | RegA8 => ops.data = self.fetchb() as u16,
            RegD16 | D16 => ops.data = self.fetchw(),
            MemReg => {
                ops.data = self.regs.read(Cpu::reg2(inst));
                ops.dest = Some(self.indirect(Cpu::reg1(inst)));
            }
            RegMem => {
                let addr = self.indirect(Cpu::reg2(inst));
                ops.data = self.readb(addr) as u16;
            }
            RegHli | RegHld => {
                let hl = self.regs.readw(Regs::HL);
                ops.data = self.readb(hl) as u16;
                self.step_hl(hl, inst.mode == RegHli);
            }
            HliReg | HldReg => {
                let hl = self.regs.readw(Regs::HL);
                ops.data = self.regs.read(Cpu::reg2(inst));
                ops.dest = Some(hl);
                self.step_hl(hl, inst.mode == HliReg);
            }
            A8Reg => {
                ops.dest = Some(0xFF00 | self.fetchb() as u16);
                ops.data = self.regs.read(Cpu::reg2(inst));
            }
            MemD8 => {
                ops.data = self.fetchb() as u16;
                ops.dest = Some(self.regs.readw(Cpu::reg1(inst)));
            }
            Mem => {
                let addr = self.regs.readw(Cpu::reg1(inst));
                ops.data = self.readb(addr) as u16;
                ops.dest = Some(addr);
            }
            A16Reg => {
                ops.dest = Some(self.fetchw());
                ops.data = self.regs.read(Cpu::reg2(inst));
            }
            RegA16 => {
                let addr = self.fetchw();
                ops.data = self.readb(addr) as u16;
            }
        }
        ops
    }

    fn step_hl(&mut self, hl: u16, increment: bool) {
        let hl = if increment { hl.wrapping_add(1) } else { hl.wrapping_sub(1) };
        self.regs.writew(Regs::HL, hl);
    }

    fn handle_interrupts(&mut self) {
        let int = match self.interconnect.ic.get_interrupt() {
            Some(int) => int,
            None => return,
        };

        trace!("dispatching {:?} from 0x{:04x}", int, self.regs.pc);
        self.cycles(2);
        let pc = self.regs.pc;
        self.push(pc);
        self.interconnect.ic.reset_interrupt(int);
        self.regs.pc = int.get_addr();
        self.cycles(1);

        self.interconnect.ic.ime = false;
        self.halted = false;
    }
}
