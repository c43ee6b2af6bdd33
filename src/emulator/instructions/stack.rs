use super::OperandKind::*;
use super::{Instruction, Opcode, Operands};
use crate::emulator::Cpu;

pub const STACK: &[Instruction] = &[
    Instruction {
        opcode: Opcode::PshLit,
        name: "PSH_LIT",
        keyword: "push",
        schema: &[Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| cpu.push(ops.value(0)),
    },
    Instruction {
        opcode: Opcode::PshReg,
        name: "PSH_REG",
        keyword: "push",
        schema: &[Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            cpu.push(value)
        },
    },
    Instruction {
        opcode: Opcode::Pop,
        name: "POP",
        keyword: "pop",
        schema: &[Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.pop()?;
            cpu.set_reg(ops.reg(0), value);
            Ok(())
        },
    },
];
