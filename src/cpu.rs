use crate::bus::{Bus, RAM_SIZE};
use crate::error::{Ls8Error, Result};
use crate::flags::CpuFlags;
use crate::opcodes::{self, Op, OPCODES_MAP};
use log::debug;

pub const REGISTER_COUNT: usize = 8;
/// R7 holds the stack pointer.
pub const SP: u8 = 7;
pub const STACK_TOP: u8 = 0xf4;

pub trait Mem {
    fn mem_read(&mut self, addr: u8) -> u8;

    fn mem_write(&mut self, addr: u8, data: u8);
}

impl Mem for CPU<'_> {
    fn mem_read(&mut self, addr: u8) -> u8 {
        self.bus.mem_read(addr)
    }

    fn mem_write(&mut self, addr: u8, data: u8) {
        self.bus.mem_write(addr, data)
    }
}

pub struct CPU<'a> {
    pub registers: [u8; REGISTER_COUNT],
    pub flags: CpuFlags,
    pub program_counter: u8,
    pub running: bool,
    pub bus: Bus<'a>,
}

impl<'a> CPU<'a> {
    pub fn new<'b>(bus: Bus<'b>) -> CPU<'b> {
        let mut registers = [0; REGISTER_COUNT];
        registers[SP as usize] = STACK_TOP;
        CPU {
            registers: registers,
            flags: CpuFlags::new(),
            program_counter: 0,
            running: true,
            bus: bus,
        }
    }

    pub fn stack_pointer(&self) -> u8 {
        self.registers[SP as usize]
    }

    fn register(&self, index: u8) -> Result<u8> {
        self.registers
            .get(index as usize)
            .copied()
            .ok_or(Ls8Error::InvalidRegister { register: index })
    }

    fn set_register(&mut self, index: u8, value: u8) -> Result<()> {
        let slot = self
            .registers
            .get_mut(index as usize)
            .ok_or(Ls8Error::InvalidRegister { register: index })?;
        *slot = value;
        Ok(())
    }

    fn push_stack(&mut self, data: u8) {
        let sp = self.stack_pointer().wrapping_sub(1);
        self.registers[SP as usize] = sp;
        self.mem_write(sp, data);
    }

    fn pop_stack(&mut self) -> u8 {
        let sp = self.stack_pointer();
        let data = self.mem_read(sp);
        self.registers[SP as usize] = sp.wrapping_add(1);
        data
    }

    /// `reg_a` and `reg_b` are register indices, not values.
    pub fn alu(&mut self, op: u8, reg_a: u8, reg_b: u8) -> Result<()> {
        match op {
            opcodes::MUL => {
                let value = self.register(reg_a)?.wrapping_mul(self.register(reg_b)?);
                self.set_register(reg_a, value)
            }
            opcodes::ADD => {
                let value = self.register(reg_a)?.wrapping_add(self.register(reg_b)?);
                self.set_register(reg_a, value)
            }
            opcodes::CMP => {
                let a = self.register(reg_a)?;
                let b = self.register(reg_b)?;
                self.flags.update(a.cmp(&b));
                Ok(())
            }
            _ => Err(Ls8Error::UnsupportedAluOperation { opcode: op }),
        }
    }

    fn hlt(&mut self) {
        debug!("halt at {:#04x}", self.program_counter);
        self.running = false;
    }

    fn ldi(&mut self, reg: u8, value: u8) -> Result<()> {
        self.set_register(reg, value)
    }

    fn prn(&mut self, reg: u8) -> Result<()> {
        let value = self.register(reg)?;
        self.bus.print(value);
        Ok(())
    }

    fn psh(&mut self, reg: u8) -> Result<()> {
        let value = self.register(reg)?;
        self.push_stack(value);
        Ok(())
    }

    fn pop(&mut self, reg: u8) -> Result<()> {
        // validate before touching SP so a bad operand leaves the stack intact
        self.register(reg)?;
        let value = self.pop_stack();
        self.set_register(reg, value)
    }

    fn call(&mut self, reg: u8) -> Result<()> {
        let target = self.register(reg)?;
        // program_counter already points past the CALL
        self.push_stack(self.program_counter);
        self.program_counter = target;
        Ok(())
    }

    fn ret(&mut self) {
        self.program_counter = self.pop_stack();
    }

    fn jmp(&mut self, reg: u8) -> Result<()> {
        self.program_counter = self.register(reg)?;
        Ok(())
    }

    fn jeq(&mut self, reg: u8) -> Result<()> {
        self.branch(self.flags.is_equal(), reg)
    }

    fn jne(&mut self, reg: u8) -> Result<()> {
        self.branch(!self.flags.is_equal(), reg)
    }

    fn branch(&mut self, condition: bool, reg: u8) -> Result<()> {
        if condition {
            self.jmp(reg)?;
        }
        Ok(())
    }

    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > RAM_SIZE {
            return Err(Ls8Error::ProgramTooLarge { len: program.len() });
        }
        for (addr, byte) in program.iter().enumerate() {
            self.mem_write(addr as u8, *byte);
        }
        debug!("loaded {} bytes", program.len());
        Ok(())
    }

    /// Fetch, decode and execute a single instruction.
    pub fn step(&mut self) -> Result<()> {
        let address = self.program_counter;
        let code = self.mem_read(address);
        let operand_a = self.mem_read(address.wrapping_add(1));
        let operand_b = self.mem_read(address.wrapping_add(2));

        // default advance; jumps, CALL and RET overwrite it
        self.program_counter = address.wrapping_add(1 + opcodes::operand_count(code));

        if opcodes::is_alu_op(code) {
            return self.alu(code, operand_a, operand_b);
        }

        let opcode = OPCODES_MAP
            .get(&code)
            .ok_or(Ls8Error::UnknownOpcode { opcode: code, address })?;

        match opcode.op {
            Op::Hlt => {
                self.hlt();
                Ok(())
            }
            Op::Ldi => self.ldi(operand_a, operand_b),
            Op::Prn => self.prn(operand_a),
            Op::Psh => self.psh(operand_a),
            Op::Pop => self.pop(operand_a),
            Op::Call => self.call(operand_a),
            Op::Ret => {
                self.ret();
                Ok(())
            }
            Op::Jmp => self.jmp(operand_a),
            Op::Jeq => self.jeq(operand_a),
            Op::Jne => self.jne(operand_a),
            // routed through is_alu_op above
            Op::Add | Op::Mul | Op::Cmp => self.alu(code, operand_a, operand_b),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.run_with_callback(|_| {})
    }

    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(&mut CPU),
    {
        while self.running {
            callback(self);
            if let Err(err) = self.step() {
                self.running = false;
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opcodes::*;

    fn with_cpu<T>(program: &[u8], f: impl FnOnce(&mut CPU) -> T) -> (T, Vec<u8>) {
        let mut output = Vec::new();
        let result = {
            let bus = Bus::new(|value| output.push(value));
            let mut cpu = CPU::new(bus);
            cpu.load(program).unwrap();
            f(&mut cpu)
        };
        (result, output)
    }

    fn run_program(program: &[u8]) -> Vec<u8> {
        let (result, output) = with_cpu(program, |cpu| cpu.run());
        result.unwrap();
        output
    }

    #[test]
    fn test_new_cpu_state() {
        let cpu = CPU::new(Bus::new(|_| {}));
        assert_eq!(cpu.stack_pointer(), 0xf4);
        assert_eq!(cpu.program_counter, 0);
        assert!(cpu.running);
        assert!(cpu.flags.is_empty());
        assert_eq!(&cpu.registers[..7], &[0; 7]);
    }

    #[test]
    fn test_ldi_then_prn_every_value() {
        for value in 0..=255u8 {
            let output = run_program(&[LDI, 0, value, PRN, 0, HLT]);
            assert_eq!(output, vec![value]);
        }
    }

    #[test]
    fn test_mul_program_prints_72() {
        let program = [LDI, 0, 8, LDI, 1, 9, MUL, 0, 1, PRN, 0, HLT];
        let ((), output) = with_cpu(&program, |cpu| {
            cpu.run().unwrap();
            assert!(!cpu.running);
            assert_eq!(cpu.program_counter, 12);
        });
        assert_eq!(output, vec![72]);
    }

    #[test]
    fn test_add_and_mul_wrap() {
        let output = run_program(&[LDI, 0, 200, LDI, 1, 100, ADD, 0, 1, PRN, 0, HLT]);
        assert_eq!(output, vec![44]);

        let output = run_program(&[LDI, 0, 16, LDI, 1, 17, MUL, 0, 1, PRN, 0, HLT]);
        assert_eq!(output, vec![16]);
    }

    #[test]
    fn test_cmp_matrix() {
        let cases = [
            (0, 0, CpuFlags::EQUAL),
            (255, 255, CpuFlags::EQUAL),
            (42, 42, CpuFlags::EQUAL),
            (0, 255, CpuFlags::LESS),
            (255, 0, CpuFlags::GREATER),
            (1, 0, CpuFlags::GREATER),
            (254, 255, CpuFlags::LESS),
            (128, 127, CpuFlags::GREATER),
            (3, 8, CpuFlags::LESS),
        ];
        for (a, b, expected) in cases {
            let program = [LDI, 0, a, LDI, 1, b, CMP, 0, 1, HLT];
            let (flags, _) = with_cpu(&program, |cpu| {
                cpu.run().unwrap();
                cpu.flags
            });
            assert_eq!(flags, expected, "cmp {} {}", a, b);
        }
    }

    #[test]
    fn test_cmp_advances_by_three() {
        let (pc, _) = with_cpu(&[CMP, 0, 1], |cpu| {
            cpu.step().unwrap();
            cpu.program_counter
        });
        assert_eq!(pc, 3);
    }

    #[test]
    fn test_conditional_jumps() {
        let cases = [
            (JEQ, CpuFlags::EQUAL, true),
            (JEQ, CpuFlags::LESS, false),
            (JEQ, CpuFlags::GREATER, false),
            (JEQ, CpuFlags::empty(), false),
            (JNE, CpuFlags::EQUAL, false),
            (JNE, CpuFlags::LESS, true),
            (JNE, CpuFlags::GREATER, true),
            (JNE, CpuFlags::empty(), true),
        ];
        for (code, flags, jumps) in cases {
            let (pc, _) = with_cpu(&[code, 2], |cpu| {
                cpu.registers[2] = 0x40;
                cpu.flags = flags;
                cpu.step().unwrap();
                cpu.program_counter
            });
            let expected = if jumps { 0x40 } else { 2 };
            assert_eq!(pc, expected, "{:#010b} with {:?}", code, flags);
        }
    }

    #[test]
    fn test_jmp_replaces_pc() {
        let output = run_program(&[LDI, 1, 7, JMP, 1, HLT, HLT, LDI, 0, 5, PRN, 0, HLT]);
        assert_eq!(output, vec![5]);
    }

    #[test]
    fn test_push_then_pop_into_other_register() {
        let program = [LDI, 0, 42, PSH, 0, POP, 1, HLT];
        let ((), _) = with_cpu(&program, |cpu| {
            cpu.step().unwrap();
            cpu.step().unwrap();
            assert_eq!(cpu.stack_pointer(), 0xf3);
            assert_eq!(cpu.mem_read(0xf3), 42);
            assert_eq!(cpu.program_counter, 5);

            cpu.run().unwrap();
            assert_eq!(cpu.registers[1], 42);
            assert_eq!(cpu.registers[0], 42);
            assert_eq!(cpu.stack_pointer(), 0xf4);
        });
    }

    #[test]
    fn test_stack_pointer_wraps() {
        let ((), _) = with_cpu(&[PSH, 0, POP, 1], |cpu| {
            cpu.registers[0] = 9;
            cpu.registers[SP as usize] = 0x00;
            cpu.step().unwrap();
            assert_eq!(cpu.stack_pointer(), 0xff);
            assert_eq!(cpu.mem_read(0xff), 9);
            cpu.step().unwrap();
            assert_eq!(cpu.stack_pointer(), 0x00);
            assert_eq!(cpu.registers[1], 9);
        });
    }

    #[test]
    fn test_call_then_ret_resumes_after_call() {
        let program = [
            LDI, 0, 99, // 0
            LDI, 1, 9, // 3
            CALL, 1, // 6
            HLT, // 8
            PRN, 0, // 9
            RET, // 11
        ];
        let ((), output) = with_cpu(&program, |cpu| {
            cpu.step().unwrap();
            cpu.step().unwrap();
            cpu.step().unwrap();
            assert_eq!(cpu.program_counter, 9);
            assert_eq!(cpu.stack_pointer(), 0xf3);
            assert_eq!(cpu.mem_read(0xf3), 8);

            cpu.step().unwrap();
            cpu.step().unwrap();
            assert_eq!(cpu.program_counter, 8);
            assert_eq!(cpu.stack_pointer(), 0xf4);

            cpu.run().unwrap();
            assert!(!cpu.running);
        });
        assert_eq!(output, vec![99]);
    }

    #[test]
    fn test_unknown_opcode_is_fatal() {
        let (result, output) = with_cpu(&[LDI, 0, 1, 0b0000_0000, PRN, 0, HLT], |cpu| {
            let result = cpu.run();
            assert!(!cpu.running);
            result
        });
        assert!(matches!(
            result,
            Err(Ls8Error::UnknownOpcode {
                opcode: 0,
                address: 3
            })
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn test_unsupported_alu_operation() {
        let (result, _) = with_cpu(&[0b1010_1011, 0, 1], |cpu| cpu.step());
        assert!(matches!(
            result,
            Err(Ls8Error::UnsupportedAluOperation {
                opcode: 0b1010_1011
            })
        ));

        let (result, _) = with_cpu(&[], |cpu| cpu.alu(LDI, 0, 1));
        assert!(matches!(
            result,
            Err(Ls8Error::UnsupportedAluOperation { opcode: LDI })
        ));
    }

    #[test]
    fn test_invalid_register() {
        let (result, _) = with_cpu(&[LDI, 8, 1, HLT], |cpu| cpu.run());
        assert!(matches!(
            result,
            Err(Ls8Error::InvalidRegister { register: 8 })
        ));

        let (sp, _) = with_cpu(&[POP, 9, HLT], |cpu| {
            assert!(cpu.run().is_err());
            cpu.stack_pointer()
        });
        assert_eq!(sp, 0xf4);
    }

    #[test]
    fn test_load_rejects_oversized_program() {
        let mut cpu = CPU::new(Bus::new(|_| {}));
        assert!(cpu.load(&[HLT; 256]).is_ok());
        assert!(matches!(
            cpu.load(&[HLT; 257]),
            Err(Ls8Error::ProgramTooLarge { len: 257 })
        ));
    }

    #[test]
    fn test_callback_sees_each_instruction() {
        let mut seen = Vec::new();
        let ((), _) = with_cpu(&[LDI, 0, 1, PRN, 0, HLT], |cpu| {
            cpu.run_with_callback(|cpu| seen.push(cpu.program_counter))
                .unwrap();
        });
        assert_eq!(seen, vec![0, 3, 5]);
    }
}
