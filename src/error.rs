use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Ls8Error>;

#[derive(Debug, Error)]
pub enum Ls8Error {
    #[error("missing program file argument")]
    MissingArgument,
    #[error("{} not found", .path.display())]
    ProgramNotFound { path: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed instruction {token:?}")]
    MalformedInstruction { line: usize, token: String },
    #[error("program is {len} bytes, memory holds 256")]
    ProgramTooLarge { len: usize },
    #[error("unknown opcode {opcode:#010b} at {address:#04x}")]
    UnknownOpcode { opcode: u8, address: u8 },
    #[error("unsupported ALU operation {opcode:#010b}")]
    UnsupportedAluOperation { opcode: u8 },
    #[error("invalid register R{register}")]
    InvalidRegister { register: u8 },
}
