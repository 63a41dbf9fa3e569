pub mod bus;
pub mod cpu;
pub mod error;
pub mod flags;
pub mod opcodes;
pub mod program;
pub mod trace;

pub use bus::Bus;
pub use cpu::{Mem, CPU};
pub use error::{Ls8Error, Result};
