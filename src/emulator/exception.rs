//! 异常处理模块

use thiserror::Error;

use super::{MemoryError, RegisterError};

/// 指令执行过程中产生的异常，全部从 `Cpu::step` 向外传播
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Exception {
    #[error("内存访问错误: {0}")]
    Memory(#[from] MemoryError),

    #[error("寄存器访问错误: {0}")]
    Register(#[from] RegisterError),

    #[error("未知操作码: {opcode:#04x} at {addr:#06x}")]
    UnknownOpcode { opcode: u8, addr: u16 },

    #[error("栈溢出: sp = {sp:#06x}")]
    StackOverflow { sp: u16 },

    #[error("栈下溢: sp = {sp:#06x}")]
    StackUnderflow { sp: u16 },

    #[error("程序映像超出地址空间: 起始 {origin:#06x}, 长度 {len:#x}")]
    ImageTooLarge { origin: u16, len: usize },
}
