//! 条件跳转指令
//!
//! 操作数的值与 acc 比较（无符号，操作数在左）：`JLT v, addr` 在 `v < acc` 时跳转。
//! 不跳转时 ip 停在下一条指令。

use super::OperandKind::*;
use super::{Instruction, Opcode, Operands};
use crate::emulator::{Cpu, Exception, Register};

#[inline(always)]
fn branch(
    cpu: &mut Cpu,
    value: u16,
    target: u16,
    taken: fn(u16, u16) -> bool,
) -> Result<(), Exception> {
    let acc = cpu.reg(Register::Acc);
    if taken(value, acc) {
        cpu.jump(target);
    }
    Ok(())
}

pub const JUMP: &[Instruction] = &[
    Instruction {
        opcode: Opcode::JeqReg,
        name: "JEQ_REG",
        keyword: "jeq",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            branch(cpu, value, ops.value(1), |v, acc| v == acc)
        },
    },
    Instruction {
        opcode: Opcode::JeqLit,
        name: "JEQ_LIT",
        keyword: "jeq",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v == acc)
        },
    },
    Instruction {
        opcode: Opcode::JneReg,
        name: "JNE_REG",
        keyword: "jne",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            branch(cpu, value, ops.value(1), |v, acc| v != acc)
        },
    },
    Instruction {
        opcode: Opcode::JneLit,
        name: "JNE_LIT",
        keyword: "jne",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v != acc)
        },
    },
    Instruction {
        opcode: Opcode::JltReg,
        name: "JLT_REG",
        keyword: "jlt",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            branch(cpu, value, ops.value(1), |v, acc| v < acc)
        },
    },
    Instruction {
        opcode: Opcode::JltLit,
        name: "JLT_LIT",
        keyword: "jlt",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v < acc)
        },
    },
    Instruction {
        opcode: Opcode::JgtReg,
        name: "JGT_REG",
        keyword: "jgt",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            branch(cpu, value, ops.value(1), |v, acc| v > acc)
        },
    },
    Instruction {
        opcode: Opcode::JgtLit,
        name: "JGT_LIT",
        keyword: "jgt",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v > acc)
        },
    },
    Instruction {
        opcode: Opcode::JleReg,
        name: "JLE_REG",
        keyword: "jle",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            branch(cpu, value, ops.value(1), |v, acc| v <= acc)
        },
    },
    Instruction {
        opcode: Opcode::JleLit,
        name: "JLE_LIT",
        keyword: "jle",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v <= acc)
        },
    },
    Instruction {
        opcode: Opcode::JgeReg,
        name: "JGE_REG",
        keyword: "jge",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            branch(cpu, value, ops.value(1), |v, acc| v >= acc)
        },
    },
    Instruction {
        opcode: Opcode::JgeLit,
        name: "JGE_LIT",
        keyword: "jge",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v >= acc)
        },
    },
    Instruction {
        opcode: Opcode::JmpNotEq,
        name: "JMP_NOT_EQ",
        keyword: "jmp_not_eq",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            branch(cpu, ops.value(0), ops.value(1), |v, acc| v != acc)
        },
    },
];
