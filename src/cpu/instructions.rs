use super::registers::Regs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Nop,
    Ld,
    Ldh,
    Inc,
    Dec,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Stop,
    Halt,
    Jr,
    Jp,
    JpHl,
    Call,
    Ret,
    Reti,
    Rst,
    Push,
    Pop,
    Di,
    Ei,
    Cb,
    // CB prefixed
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
}

/// Where an instruction's operands come from and where the result goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    /// reg1
    Reg,
    /// reg1 <- reg2
    RegReg,
    /// reg1 <- imm8
    RegD8,
    /// reg1 <- imm16
    RegD16,
    /// (reg1) <- reg2
    MemReg,
    /// reg1 <- (reg2)
    RegMem,
    /// reg1 <- (HL+)
    RegHli,
    /// reg1 <- (HL-)
    RegHld,
    /// (HL+) <- reg2
    HliReg,
    /// (HL-) <- reg2
    HldReg,
    /// reg1 <- (0xFF00 + imm8)
    RegA8,
    /// (0xFF00 + imm8) <- reg2
    A8Reg,
    /// HL <- SP + signed imm8
    HlSpe8,
    D8,
    D16,
    /// (reg1) <- imm8
    MemD8,
    /// (reg1) read-modify-write
    Mem,
    /// (imm16) <- reg2
    A16Reg,
    /// reg1 <- (imm16)
    RegA16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    NZ,
    Z,
    NC,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub kind: Kind,
    pub mode: AddrMode,
    pub reg1: Option<Regs>,
    pub reg2: Option<Regs>,
    pub cond: Cond,
    /// RST vector or bit index.
    pub param: u8,
}

impl Instruction {
    const fn new(kind: Kind, mode: AddrMode) -> Instruction {
        Instruction {
            kind: kind,
            mode: mode,
            reg1: None,
            reg2: None,
            cond: Cond::Always,
            param: 0,
        }
    }

    const fn r1(mut self, reg: Regs) -> Instruction {
        self.reg1 = Some(reg);
        self
    }

    const fn r2(mut self, reg: Regs) -> Instruction {
        self.reg2 = Some(reg);
        self
    }

    const fn cond(mut self, cond: Cond) -> Instruction {
        self.cond = cond;
        self
    }

    const fn param(mut self, param: u8) -> Instruction {
        self.param = param;
        self
    }
}

// Operand order used by the opcode encoding. Index 6 is (HL).
const R: [Regs; 8] = [Regs::B, Regs::C, Regs::D, Regs::E, Regs::H, Regs::L, Regs::HL, Regs::A];
const RP: [Regs; 4] = [Regs::BC, Regs::DE, Regs::HL, Regs::SP];
const RP2: [Regs; 4] = [Regs::BC, Regs::DE, Regs::HL, Regs::AF];
const CC: [Cond; 4] = [Cond::NZ, Cond::Z, Cond::NC, Cond::C];
const ALU: [Kind; 8] = [Kind::Add, Kind::Adc, Kind::Sub, Kind::Sbc, Kind::And, Kind::Xor, Kind::Or,
                        Kind::Cp];
const ROT: [Kind; 8] = [Kind::Rlc, Kind::Rrc, Kind::Rl, Kind::Rr, Kind::Sla, Kind::Sra, Kind::Swap,
                        Kind::Srl];
const ACC: [Kind; 8] = [Kind::Rlca, Kind::Rrca, Kind::Rla, Kind::Rra, Kind::Daa, Kind::Cpl,
                        Kind::Scf, Kind::Ccf];

/// Decoded main opcode table. Unused opcodes are `None`.
pub static INSTRUCTIONS: [Option<Instruction>; 0x100] = build_main();

/// Decoded 0xCB prefixed table.
pub static CB_INSTRUCTIONS: [Option<Instruction>; 0x100] = build_cb();

const fn build_main() -> [Option<Instruction>; 0x100] {
    let mut table = [None; 0x100];
    let mut op = 0;
    while op < 0x100 {
        table[op] = decode(op as u8);
        op += 1;
    }
    table
}

const fn build_cb() -> [Option<Instruction>; 0x100] {
    let mut table = [None; 0x100];
    let mut op = 0;
    while op < 0x100 {
        table[op] = Some(decode_cb(op as u8));
        op += 1;
    }
    table
}

/// Operand for an `r[n]` slot: a plain register or (HL).
const fn reg_operand(kind: Kind, n: usize) -> Instruction {
    if n == 6 {
        Instruction::new(kind, AddrMode::Mem).r1(Regs::HL)
    } else {
        Instruction::new(kind, AddrMode::Reg).r1(R[n])
    }
}

const fn decode(op: u8) -> Option<Instruction> {
    use self::AddrMode::*;

    let x = (op >> 6) as usize;
    let y = ((op >> 3) & 7) as usize;
    let z = (op & 7) as usize;
    let p = y >> 1;
    let q = y & 1;

    let inst = match (x, z) {
        (0, 0) => match y {
            0 => Instruction::new(Kind::Nop, Implied),
            1 => Instruction::new(Kind::Ld, A16Reg).r2(Regs::SP),
            2 => Instruction::new(Kind::Stop, Implied),
            3 => Instruction::new(Kind::Jr, D8),
            _ => Instruction::new(Kind::Jr, D8).cond(CC[y - 4]),
        },
        (0, 1) => {
            if q == 0 {
                Instruction::new(Kind::Ld, RegD16).r1(RP[p])
            } else {
                Instruction::new(Kind::Add, RegReg).r1(Regs::HL).r2(RP[p])
            }
        }
        (0, 2) => match (q, p) {
            (0, 0) => Instruction::new(Kind::Ld, MemReg).r1(Regs::BC).r2(Regs::A),
            (0, 1) => Instruction::new(Kind::Ld, MemReg).r1(Regs::DE).r2(Regs::A),
            (0, 2) => Instruction::new(Kind::Ld, HliReg).r1(Regs::HL).r2(Regs::A),
            (0, _) => Instruction::new(Kind::Ld, HldReg).r1(Regs::HL).r2(Regs::A),
            (_, 0) => Instruction::new(Kind::Ld, RegMem).r1(Regs::A).r2(Regs::BC),
            (_, 1) => Instruction::new(Kind::Ld, RegMem).r1(Regs::A).r2(Regs::DE),
            (_, 2) => Instruction::new(Kind::Ld, RegHli).r1(Regs::A).r2(Regs::HL),
            (_, _) => Instruction::new(Kind::Ld, RegHld).r1(Regs::A).r2(Regs::HL),
        },
        (0, 3) => {
            let kind = if q == 0 { Kind::Inc } else { Kind::Dec };
            Instruction::new(kind, Reg).r1(RP[p])
        }
        (0, 4) => reg_operand(Kind::Inc, y),
        (0, 5) => reg_operand(Kind::Dec, y),
        (0, 6) => {
            if y == 6 {
                Instruction::new(Kind::Ld, MemD8).r1(Regs::HL)
            } else {
                Instruction::new(Kind::Ld, RegD8).r1(R[y])
            }
        }
        (0, _) => Instruction::new(ACC[y], Implied),
        (1, _) => {
            if y == 6 && z == 6 {
                Instruction::new(Kind::Halt, Implied)
            } else if y == 6 {
                Instruction::new(Kind::Ld, MemReg).r1(Regs::HL).r2(R[z])
            } else if z == 6 {
                Instruction::new(Kind::Ld, RegMem).r1(R[y]).r2(Regs::HL)
            } else {
                Instruction::new(Kind::Ld, RegReg).r1(R[y]).r2(R[z])
            }
        }
        (2, _) => {
            if z == 6 {
                Instruction::new(ALU[y], RegMem).r1(Regs::A).r2(Regs::HL)
            } else {
                Instruction::new(ALU[y], RegReg).r1(Regs::A).r2(R[z])
            }
        }
        (_, 0) => match y {
            0..=3 => Instruction::new(Kind::Ret, Implied).cond(CC[y]),
            4 => Instruction::new(Kind::Ldh, A8Reg).r2(Regs::A),
            5 => Instruction::new(Kind::Add, RegD8).r1(Regs::SP),
            6 => Instruction::new(Kind::Ldh, RegA8).r1(Regs::A),
            _ => Instruction::new(Kind::Ld, HlSpe8).r1(Regs::HL).r2(Regs::SP),
        },
        (_, 1) => match (q, p) {
            (0, _) => Instruction::new(Kind::Pop, Reg).r1(RP2[p]),
            (_, 0) => Instruction::new(Kind::Ret, Implied),
            (_, 1) => Instruction::new(Kind::Reti, Implied),
            (_, 2) => Instruction::new(Kind::JpHl, Implied).r1(Regs::HL),
            (_, _) => Instruction::new(Kind::Ld, RegReg).r1(Regs::SP).r2(Regs::HL),
        },
        (_, 2) => match y {
            0..=3 => Instruction::new(Kind::Jp, D16).cond(CC[y]),
            4 => Instruction::new(Kind::Ld, MemReg).r1(Regs::C).r2(Regs::A),
            5 => Instruction::new(Kind::Ld, A16Reg).r2(Regs::A),
            6 => Instruction::new(Kind::Ld, RegMem).r1(Regs::A).r2(Regs::C),
            _ => Instruction::new(Kind::Ld, RegA16).r1(Regs::A),
        },
        (_, 3) => match y {
            0 => Instruction::new(Kind::Jp, D16),
            1 => Instruction::new(Kind::Cb, D8),
            6 => Instruction::new(Kind::Di, Implied),
            7 => Instruction::new(Kind::Ei, Implied),
            _ => return None,
        },
        (_, 4) => match y {
            0..=3 => Instruction::new(Kind::Call, D16).cond(CC[y]),
            _ => return None,
        },
        (_, 5) => match (q, p) {
            (0, _) => Instruction::new(Kind::Push, Reg).r1(RP2[p]),
            (_, 0) => Instruction::new(Kind::Call, D16),
            (_, _) => return None,
        },
        (_, 6) => Instruction::new(ALU[y], RegD8).r1(Regs::A),
        (_, _) => Instruction::new(Kind::Rst, Implied).param(y as u8 * 8),
    };
    Some(inst)
}

const fn decode_cb(op: u8) -> Instruction {
    let x = (op >> 6) as usize;
    let y = ((op >> 3) & 7) as usize;
    let z = (op & 7) as usize;

    match x {
        0 => reg_operand(ROT[y], z),
        1 => reg_operand(Kind::Bit, z).param(y as u8),
        2 => reg_operand(Kind::Res, z).param(y as u8),
        _ => reg_operand(Kind::Set, z).param(y as u8),
    }
}
