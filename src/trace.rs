use crate::cpu::{Mem, CPU};
use crate::opcodes::{self, Op, OPCODES_MAP};

/// One line per instruction: address, raw bytes, disassembly, register file and FL.
pub fn trace(cpu: &mut CPU) -> String {
    let address = cpu.program_counter;
    let code = cpu.mem_read(address);
    let operand_a = cpu.mem_read(address.wrapping_add(1));
    let operand_b = cpu.mem_read(address.wrapping_add(2));

    let len = 1 + opcodes::operand_count(code);
    let hex = [code, operand_a, operand_b][..len.min(3) as usize]
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<String>>()
        .join(" ");

    let asm = match OPCODES_MAP.get(&code) {
        Some(opcode) => {
            let operands = match (opcode.op, opcode.operand_count()) {
                (Op::Ldi, _) => format!("R{},{}", operand_a, operand_b),
                (_, 1) => format!("R{}", operand_a),
                (_, 2) => format!("R{},R{}", operand_a, operand_b),
                _ => String::new(),
            };
            format!("{} {}", opcode.mnemonic, operands)
        }
        None => "???".to_string(),
    };

    let registers = cpu
        .registers
        .iter()
        .enumerate()
        .map(|(index, value)| format!("R{}:{:02X}", index, value))
        .collect::<Vec<String>>()
        .join(" ");

    format!(
        "{:02X}  {:8}  {:10} {} FL:{:03b}",
        address,
        hex,
        asm.trim_end(),
        registers,
        cpu.flags.bits()
    )
}
