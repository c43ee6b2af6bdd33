use super::OperandKind::*;
use super::{Instruction, Opcode, Operands};
use crate::emulator::Cpu;

pub const CALL: &[Instruction] = &[
    Instruction {
        opcode: Opcode::CalLit,
        name: "CAL_LIT",
        keyword: "call",
        schema: &[Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| cpu.call(ops.value(0)),
    },
    Instruction {
        opcode: Opcode::CalReg,
        name: "CAL_REG",
        keyword: "call",
        schema: &[Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let target = cpu.reg(ops.reg(0));
            cpu.call(target)
        },
    },
    Instruction {
        opcode: Opcode::Ret,
        name: "RET",
        keyword: "ret",
        schema: &[],
        execute: |cpu: &mut Cpu, _ops: &Operands| cpu.ret(),
    },
];
