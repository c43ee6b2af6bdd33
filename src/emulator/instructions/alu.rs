//! 算术与逻辑指令
//!
//! 二元运算的结果一律写入 acc；移位、自增、自减直接修改操作数寄存器。
//! 所有运算按 16 位回绕。

use super::OperandKind::*;
use super::{Instruction, Opcode, Operands};
use crate::emulator::{Cpu, Register};

/// 左移，移位量不小于 16 时结果为 0
#[inline(always)]
fn shl(value: u16, amount: u16) -> u16 {
    value.checked_shl(amount as u32).unwrap_or(0)
}

/// 逻辑右移，移位量不小于 16 时结果为 0
#[inline(always)]
fn shr(value: u16, amount: u16) -> u16 {
    value.checked_shr(amount as u32).unwrap_or(0)
}

pub const ALU: &[Instruction] = &[
    Instruction {
        opcode: Opcode::AddLitReg,
        name: "ADD_LIT_REG",
        keyword: "add",
        schema: &[Lit16, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = ops.value(0).wrapping_add(cpu.reg(ops.reg(1)));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::AddRegReg,
        name: "ADD_REG_REG",
        keyword: "add",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)).wrapping_add(cpu.reg(ops.reg(1)));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::SubLitReg,
        name: "SUB_LIT_REG",
        keyword: "sub",
        schema: &[Lit16, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            // 寄存器减去立即数
            let value = cpu.reg(ops.reg(1)).wrapping_sub(ops.value(0));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::SubRegLit,
        name: "SUB_REG_LIT",
        keyword: "sub",
        schema: &[Reg, Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)).wrapping_sub(ops.value(1));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::SubRegReg,
        name: "SUB_REG_REG",
        keyword: "sub",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)).wrapping_sub(cpu.reg(ops.reg(1)));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::MulLitReg,
        name: "MUL_LIT_REG",
        keyword: "mul",
        schema: &[Lit16, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = ops.value(0).wrapping_mul(cpu.reg(ops.reg(1)));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::MulRegReg,
        name: "MUL_REG_REG",
        keyword: "mul",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)).wrapping_mul(cpu.reg(ops.reg(1)));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::LshRegLit,
        name: "LSH_REG_LIT",
        keyword: "lsh",
        schema: &[Reg, Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let r = ops.reg(0);
            let value = shl(cpu.reg(r), ops.value(1));
            cpu.set_reg(r, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::LshRegReg,
        name: "LSH_REG_REG",
        keyword: "lsh",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let r = ops.reg(0);
            let value = shl(cpu.reg(r), cpu.reg(ops.reg(1)));
            cpu.set_reg(r, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::RshRegLit,
        name: "RSH_REG_LIT",
        keyword: "rsh",
        schema: &[Reg, Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let r = ops.reg(0);
            let value = shr(cpu.reg(r), ops.value(1));
            cpu.set_reg(r, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::RshRegReg,
        name: "RSH_REG_REG",
        keyword: "rsh",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let r = ops.reg(0);
            let value = shr(cpu.reg(r), cpu.reg(ops.reg(1)));
            cpu.set_reg(r, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::AndRegLit,
        name: "AND_REG_LIT",
        keyword: "and",
        schema: &[Reg, Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) & ops.value(1);
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::AndRegReg,
        name: "AND_REG_REG",
        keyword: "and",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) & cpu.reg(ops.reg(1));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::OrRegLit,
        name: "OR_REG_LIT",
        keyword: "or",
        schema: &[Reg, Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) | ops.value(1);
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::OrRegReg,
        name: "OR_REG_REG",
        keyword: "or",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) | cpu.reg(ops.reg(1));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::XorRegLit,
        name: "XOR_REG_LIT",
        keyword: "xor",
        schema: &[Reg, Lit16],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) ^ ops.value(1);
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::XorRegReg,
        name: "XOR_REG_REG",
        keyword: "xor",
        schema: &[Reg, Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = cpu.reg(ops.reg(0)) ^ cpu.reg(ops.reg(1));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::Not,
        name: "NOT",
        keyword: "not",
        schema: &[Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let value = !cpu.reg(ops.reg(0));
            cpu.set_reg(Register::Acc, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::IncReg,
        name: "INC_REG",
        keyword: "inc",
        schema: &[Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let r = ops.reg(0);
            let value = cpu.reg(r).wrapping_add(1);
            cpu.set_reg(r, value);
            Ok(())
        },
    },
    Instruction {
        opcode: Opcode::DecReg,
        name: "DEC_REG",
        keyword: "dec",
        schema: &[Reg],
        execute: |cpu: &mut Cpu, ops: &Operands| {
            let r = ops.reg(0);
            let value = cpu.reg(r).wrapping_sub(1);
            cpu.set_reg(r, value);
            Ok(())
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::instructions::encode::{Operand, Program};
    use crate::emulator::test_util::cpu_with_program;

    fn load(r: Register, value: u16) -> (Opcode, [Operand; 2]) {
        (Opcode::MovLitReg, [Operand::Lit16(value), Operand::Reg(r)])
    }

    fn run(setup: &[(Register, u16)], opcode: Opcode, operands: &[Operand]) -> Cpu {
        let mut prog = Program::new();
        for &(r, value) in setup {
            let (op, args) = load(r, value);
            prog.push(op, &args).unwrap();
        }
        prog.push(opcode, operands).unwrap();
        let mut cpu = cpu_with_program(&prog);
        cpu.steps(setup.len() + 1).unwrap();
        cpu
    }

    #[test]
    fn test_add_reg_reg() {
        let cpu = run(
            &[(Register::R1, 2), (Register::R2, 3)],
            Opcode::AddRegReg,
            &[Operand::Reg(Register::R1), Operand::Reg(Register::R2)],
        );
        assert_eq!(cpu.reg(Register::Acc), 5);
        assert_eq!(cpu.reg(Register::R1), 2);
    }

    #[test]
    fn test_add_wraps() {
        let cpu = run(
            &[(Register::R1, 0xffff)],
            Opcode::AddLitReg,
            &[Operand::Lit16(2), Operand::Reg(Register::R1)],
        );
        assert_eq!(cpu.reg(Register::Acc), 1);
    }

    #[test]
    fn test_sub_operand_order() {
        let cpu = run(
            &[(Register::R1, 10)],
            Opcode::SubLitReg,
            &[Operand::Lit16(3), Operand::Reg(Register::R1)],
        );
        assert_eq!(cpu.reg(Register::Acc), 7);

        let cpu = run(
            &[(Register::R1, 10)],
            Opcode::SubRegLit,
            &[Operand::Reg(Register::R1), Operand::Lit16(3)],
        );
        assert_eq!(cpu.reg(Register::Acc), 7);

        let cpu = run(
            &[(Register::R1, 3), (Register::R2, 10)],
            Opcode::SubRegReg,
            &[Operand::Reg(Register::R1), Operand::Reg(Register::R2)],
        );
        assert_eq!(cpu.reg(Register::Acc), 3u16.wrapping_sub(10));
    }

    #[test]
    fn test_mul() {
        let cpu = run(
            &[(Register::R3, 0x0100)],
            Opcode::MulLitReg,
            &[Operand::Lit16(0x0101), Operand::Reg(Register::R3)],
        );
        assert_eq!(cpu.reg(Register::Acc), 0x0100);

        let cpu = run(
            &[(Register::R1, 7), (Register::R2, 6)],
            Opcode::MulRegReg,
            &[Operand::Reg(Register::R1), Operand::Reg(Register::R2)],
        );
        assert_eq!(cpu.reg(Register::Acc), 42);
    }

    #[test]
    fn test_shifts_modify_register() {
        let cpu = run(
            &[(Register::R1, 0x0003)],
            Opcode::LshRegLit,
            &[Operand::Reg(Register::R1), Operand::Lit16(4)],
        );
        assert_eq!(cpu.reg(Register::R1), 0x0030);
        assert_eq!(cpu.reg(Register::Acc), 0);

        let cpu = run(
            &[(Register::R1, 0x8000), (Register::R2, 15)],
            Opcode::RshRegReg,
            &[Operand::Reg(Register::R1), Operand::Reg(Register::R2)],
        );
        assert_eq!(cpu.reg(Register::R1), 1);
    }

    #[test]
    fn test_shift_by_sixteen_or_more() {
        let cpu = run(
            &[(Register::R1, 0xffff)],
            Opcode::LshRegLit,
            &[Operand::Reg(Register::R1), Operand::Lit16(16)],
        );
        assert_eq!(cpu.reg(Register::R1), 0);

        let cpu = run(
            &[(Register::R1, 0xffff), (Register::R2, 40)],
            Opcode::RshRegReg,
            &[Operand::Reg(Register::R1), Operand::Reg(Register::R2)],
        );
        assert_eq!(cpu.reg(Register::R1), 0);
    }

    #[test]
    fn test_bitwise() {
        let setup = [(Register::R1, 0b1100), (Register::R2, 0b1010)];
        let regs = [Operand::Reg(Register::R1), Operand::Reg(Register::R2)];
        assert_eq!(run(&setup, Opcode::AndRegReg, &regs).reg(Register::Acc), 0b1000);
        assert_eq!(run(&setup, Opcode::OrRegReg, &regs).reg(Register::Acc), 0b1110);
        assert_eq!(run(&setup, Opcode::XorRegReg, &regs).reg(Register::Acc), 0b0110);

        let lit = [Operand::Reg(Register::R1), Operand::Lit16(0x00ff)];
        let setup = [(Register::R1, 0x0ff0)];
        assert_eq!(run(&setup, Opcode::AndRegLit, &lit).reg(Register::Acc), 0x00f0);
        assert_eq!(run(&setup, Opcode::OrRegLit, &lit).reg(Register::Acc), 0x0fff);
        assert_eq!(run(&setup, Opcode::XorRegLit, &lit).reg(Register::Acc), 0x0f0f);
    }

    #[test]
    fn test_not_writes_acc() {
        let cpu = run(&[(Register::R1, 0x00ff)], Opcode::Not, &[Operand::Reg(Register::R1)]);
        assert_eq!(cpu.reg(Register::Acc), 0xff00);
        assert_eq!(cpu.reg(Register::R1), 0x00ff);
    }

    #[test]
    fn test_inc_dec_wrap() {
        let cpu = run(&[(Register::R1, 0xffff)], Opcode::IncReg, &[Operand::Reg(Register::R1)]);
        assert_eq!(cpu.reg(Register::R1), 0);

        let cpu = run(&[], Opcode::DecReg, &[Operand::Reg(Register::R2)]);
        assert_eq!(cpu.reg(Register::R2), 0xffff);
    }
}
