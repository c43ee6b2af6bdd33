//! 寄存器堆
//!
//! 12 个 16 位寄存器，按下标保存在一块专用的小内存中（每个寄存器 2 字节，大端）。

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::memory::Memory;

/// 寄存器数量
pub const REGISTER_COUNT: usize = 12;

/// 通用寄存器数量（r1..r8）
pub const GENERAL_REGISTER_COUNT: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("无效的寄存器下标: {0}")]
    InvalidIndex(usize),
    #[error("没有名为 '{0}' 的寄存器")]
    UnknownName(String),
}

/// 寄存器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    Ip = 0,
    Acc = 1,
    R1 = 2,
    R2 = 3,
    R3 = 4,
    R4 = 5,
    R5 = 6,
    R6 = 7,
    R7 = 8,
    R8 = 9,
    Sp = 10,
    Fp = 11,
}

impl Register {
    /// 按下标排列的全部寄存器
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::Ip,
        Register::Acc,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
        Register::Sp,
        Register::Fp,
    ];

    /// 调用约定中需要保存的通用寄存器，按压栈顺序排列
    pub const GENERAL: [Register; GENERAL_REGISTER_COUNT] = [
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 指令流中寄存器字节的解码：任何字节都对 REGISTER_COUNT 取模
    #[inline(always)]
    pub const fn decode(byte: u8) -> Register {
        Register::ALL[byte as usize % REGISTER_COUNT]
    }

    pub fn from_index(index: usize) -> Result<Register, RegisterError> {
        Register::ALL
            .get(index)
            .copied()
            .ok_or(RegisterError::InvalidIndex(index))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Ip => "ip",
            Register::Acc => "acc",
            Register::R1 => "r1",
            Register::R2 => "r2",
            Register::R3 => "r3",
            Register::R4 => "r4",
            Register::R5 => "r5",
            Register::R6 => "r6",
            Register::R7 => "r7",
            Register::R8 => "r8",
            Register::Sp => "sp",
            Register::Fp => "fp",
        }
    }
}

impl FromStr for Register {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .iter()
            .copied()
            .find(|r| r.name() == s)
            .ok_or_else(|| RegisterError::UnknownName(s.to_string()))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 寄存器堆
#[derive(Debug, Clone)]
pub struct RegisterFile {
    storage: Memory,
    /// 名字到下标的映射，构造时建立一次
    names: FxHashMap<&'static str, usize>,
}

impl RegisterFile {
    pub fn new() -> Self {
        let names = Register::ALL
            .iter()
            .map(|r| (r.name(), r.index()))
            .collect();
        Self {
            storage: Memory::new(REGISTER_COUNT * 2),
            names,
        }
    }

    /// 按下标读取寄存器
    #[inline(always)]
    pub fn read(&self, idx: usize) -> Result<u16, RegisterError> {
        if idx >= REGISTER_COUNT {
            return Err(RegisterError::InvalidIndex(idx));
        }
        self.storage
            .get16((idx * 2) as u16)
            .map_err(|_| RegisterError::InvalidIndex(idx))
    }

    /// 按下标写入寄存器
    #[inline(always)]
    pub fn write(&mut self, idx: usize, value: u16) -> Result<(), RegisterError> {
        if idx >= REGISTER_COUNT {
            return Err(RegisterError::InvalidIndex(idx));
        }
        self.storage
            .set16((idx * 2) as u16, value)
            .map_err(|_| RegisterError::InvalidIndex(idx))
    }

    /// 按寄存器读取，下标总是有效的
    #[inline(always)]
    pub fn get(&self, reg: Register) -> u16 {
        self.read(reg.index()).unwrap_or_default()
    }

    #[inline(always)]
    pub fn set(&mut self, reg: Register, value: u16) {
        let result = self.write(reg.index(), value);
        debug_assert!(result.is_ok(), "寄存器 {} 写入失败", reg);
    }

    /// 名字查找下标
    pub fn index_of(&self, name: &str) -> Result<usize, RegisterError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| RegisterError::UnknownName(name.to_string()))
    }

    pub fn read_by_name(&self, name: &str) -> Result<u16, RegisterError> {
        self.read(self.index_of(name)?)
    }

    pub fn write_by_name(&mut self, name: &str, value: u16) -> Result<(), RegisterError> {
        let idx = self.index_of(name)?;
        self.write(idx, value)
    }

    /// 所有寄存器的快照，按下标排列
    pub fn snapshot(&self) -> [u16; REGISTER_COUNT] {
        let mut out = [0; REGISTER_COUNT];
        for reg in Register::ALL {
            out[reg.index()] = self.get(reg);
        }
        out
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
