use super::{Instruction, Opcode, Operands};
use crate::emulator::{Cpu, Event};

pub const CONTROL: &[Instruction] = &[
    Instruction {
        opcode: Opcode::NoOp,
        name: "NO_OP",
        keyword: "nop",
        schema: &[],
        execute: |_cpu: &mut Cpu, _ops: &Operands| Ok(()),
    },
    Instruction {
        opcode: Opcode::Hlt,
        name: "HLT",
        keyword: "hlt",
        schema: &[],
        execute: |cpu: &mut Cpu, _ops: &Operands| {
            cpu.raise(Event::Halted);
            Ok(())
        },
    },
];
