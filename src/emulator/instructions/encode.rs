//! 指令编码
//!
//! 汇编器等前端产生指令流的出口：按操作码的操作数模式校验并生成大端字节。

use thiserror::Error;

use super::{Opcode, OperandKind};
use crate::emulator::Register;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{opcode} 需要 {expected} 个操作数, 实际为 {found}")]
    OperandCount {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },
    #[error("{opcode} 第 {index} 个操作数应为 {expected:?}, 实际为 {found:?}")]
    OperandKind {
        opcode: Opcode,
        index: usize,
        expected: OperandKind,
        found: OperandKind,
    },
    #[error("填充目标 {target:#06x} 小于当前长度 {len:#06x}")]
    PadBackwards { target: usize, len: usize },
}

/// 带值的操作数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(Register),
    Lit8(u8),
    Lit16(u16),
    Addr8(u8),
    Addr16(u16),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Reg(_) => OperandKind::Reg,
            Operand::Lit8(_) => OperandKind::Lit8,
            Operand::Lit16(_) => OperandKind::Lit16,
            Operand::Addr8(_) => OperandKind::Addr8,
            Operand::Addr16(_) => OperandKind::Addr16,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match *self {
            Operand::Reg(r) => out.push(r.index() as u8),
            Operand::Lit8(v) | Operand::Addr8(v) => out.push(v),
            Operand::Lit16(v) | Operand::Addr16(v) => out.extend_from_slice(&v.to_be_bytes()),
        }
    }
}

/// 编码单条指令
pub fn encode(opcode: Opcode, operands: &[Operand]) -> Result<Vec<u8>, EncodeError> {
    let inst = opcode.instruction();
    if operands.len() != inst.schema.len() {
        return Err(EncodeError::OperandCount {
            opcode,
            expected: inst.schema.len(),
            found: operands.len(),
        });
    }

    let mut out = Vec::with_capacity(inst.size());
    out.push(opcode.code());
    for (index, (operand, &expected)) in operands.iter().zip(inst.schema).enumerate() {
        if operand.kind() != expected {
            return Err(EncodeError::OperandKind {
                opcode,
                index,
                expected,
                found: operand.kind(),
            });
        }
        operand.write_to(&mut out);
    }
    Ok(out)
}

/// 程序映像构建器
#[derive(Debug, Clone, Default)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条指令
    pub fn push(&mut self, opcode: Opcode, operands: &[Operand]) -> Result<&mut Self, EncodeError> {
        let encoded = encode(opcode, operands)?;
        self.bytes.extend_from_slice(&encoded);
        Ok(self)
    }

    /// 用 NO_OP 填充到绝对偏移 `offset`
    pub fn pad_to(&mut self, offset: usize) -> Result<&mut Self, EncodeError> {
        if offset < self.bytes.len() {
            return Err(EncodeError::PadBackwards {
                target: offset,
                len: self.bytes.len(),
            });
        }
        self.bytes.resize(offset, Opcode::NoOp.code());
        Ok(self)
    }

    /// 追加原始字节
    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(data);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
