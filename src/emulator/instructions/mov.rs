use super::OperandKind::*;
use super::{Instruction, Opcode, Operands};
use crate::emulator::Cpu;

pub const MOV: &[Instruction] = &[
    Instruction {
        opcode: Opcode::MovLitReg,
        name: "MOV_LIT_REG",
        keyword: "mov",
        schema: &[Lit16, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            cpu.set_reg(ops.reg(1), ops.value(0));
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::MovRegReg,
        name: "MOV_REG_REG",
        keyword: "mov",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            cpu.set_reg(ops.reg(1), value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::MovRegMem,
        name: "MOV_REG_MEM",
        keyword: "mov",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0));
            cpu.write16(ops.value(1), value)
        },
    },
    Instruction {
        opcode: Opcode::MovMemReg,
        name: "MOV_MEM_REG",
        keyword: "mov",
        schema: &[Addr16, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.read16(ops.value(0))?;
            cpu.set_reg(ops.reg(1), value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::MovLitMem,
        name: "MOV_LIT_MEM",
        keyword: "mov",
        schema: &[Lit16, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| cpu.write16(ops.value(1), ops.value(0)),
    },
    Instruction {
        opcode: Opcode::MovRegPtrReg,
        name: "MOV_REG_PTR_REG",
        keyword: "mov",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            // 源寄存器的值作为地址
            let ptr = cpu.reg(ops.reg(0));
            let value = cpu.read16(ptr)?;
            cpu.set_reg(ops.reg(1), value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::MovLitOffReg,
        name: "MOV_LIT_OFF_REG",
        keyword: "mov",
        schema: &[Addr16, Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let offset = cpu.reg(ops.reg(1));
            let value = cpu.read16(ops.value(0).wrapping_add(offset))?;
            cpu.set_reg(ops.reg(2), value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::Mov8RegMem,
        name: "MOV8_REG_MEM",
        keyword: "mov8",
        schema: &[Reg, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) as u8;
            cpu.write8(ops.value(1), value)
        },
    },
    Instruction {
        opcode: Opcode::Mov8MemReg,
        name: "MOV8_MEM_REG",
        keyword: "mov8",
        schema: &[Addr16, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.read8(ops.value(0))?;
            cpu.set_reg(ops.reg(1), value as u16);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::Mov8LitMem,
        name: "MOV8_LIT_MEM",
        keyword: "mov8",
        schema: &[Lit8, Addr16],
        execute: |cpu: &mut Cpu, ops: &Operands| cpu.write8(ops.value(1), ops.value(0) as u8),
    },
];
