use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const HLT: u8 = 0b0000_0001;
pub const LDI: u8 = 0b1000_0010;
pub const PRN: u8 = 0b0100_0111;
pub const ADD: u8 = 0b1010_0000;
pub const MUL: u8 = 0b1010_0010;
pub const CMP: u8 = 0b1010_0111;
pub const PSH: u8 = 0b0100_0101;
pub const POP: u8 = 0b0100_0110;
pub const CALL: u8 = 0b0101_0000;
pub const RET: u8 = 0b0001_0001;
pub const JMP: u8 = 0b0101_0100;
pub const JEQ: u8 = 0b0101_0101;
pub const JNE: u8 = 0b0101_0110;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Hlt,
    Ldi,
    Prn,
    Add,
    Mul,
    Cmp,
    Psh,
    Pop,
    Call,
    Ret,
    Jmp,
    Jeq,
    Jne,
}

pub struct OpCode {
    pub code: u8,
    pub mnemonic: &'static str,
    pub op: Op,
}

impl OpCode {
    const fn new(code: u8, mnemonic: &'static str, op: Op) -> Self {
        OpCode { code, mnemonic, op }
    }

    pub fn operand_count(&self) -> u8 {
        operand_count(self.code)
    }

    pub fn is_alu_op(&self) -> bool {
        is_alu_op(self.code)
    }
}

/// Bits 7-6 of the instruction byte.
pub fn operand_count(code: u8) -> u8 {
    code >> 6
}

/// Bit 5 of the instruction byte.
pub fn is_alu_op(code: u8) -> bool {
    (code >> 5) & 1 == 1
}

pub static CPU_OPS_CODES: [OpCode; 13] = [
    OpCode::new(HLT, "HLT", Op::Hlt),
    OpCode::new(LDI, "LDI", Op::Ldi),
    OpCode::new(PRN, "PRN", Op::Prn),
    OpCode::new(ADD, "ADD", Op::Add),
    OpCode::new(MUL, "MUL", Op::Mul),
    OpCode::new(CMP, "CMP", Op::Cmp),
    OpCode::new(PSH, "PUSH", Op::Psh),
    OpCode::new(POP, "POP", Op::Pop),
    OpCode::new(CALL, "CALL", Op::Call),
    OpCode::new(RET, "RET", Op::Ret),
    OpCode::new(JMP, "JMP", Op::Jmp),
    OpCode::new(JEQ, "JEQ", Op::Jeq),
    OpCode::new(JNE, "JNE", Op::Jne),
];

pub static OPCODES_MAP: Lazy<HashMap<u8, &'static OpCode>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for cpuop in CPU_OPS_CODES.iter() {
        map.insert(cpuop.code, cpuop);
    }
    map
});
