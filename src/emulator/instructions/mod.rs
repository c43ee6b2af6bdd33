//! 操作码表
//!
//! 每条指令: 操作码字节、助记符、操作数模式（按顺序排列的操作数种类）以及执行函数。
//! 各指令族分别定义在子模块中，编译期汇总成按操作码索引的查找表。

mod alu;
mod call;
mod control;
pub mod encode;
mod jump;
mod mov;
mod stack;

use std::fmt;

use super::{Cpu, Exception, Register};

/// 单条指令最多的操作数个数
pub const MAX_OPERANDS: usize = 3;

/// 操作数种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// 寄存器下标（1 字节）
    Reg,
    /// 8 位立即数
    Lit8,
    /// 16 位立即数（大端）
    Lit16,
    /// 8 位地址
    Addr8,
    /// 16 位地址（大端）
    Addr16,
}

impl OperandKind {
    /// 编码宽度（字节）
    pub const fn width(self) -> usize {
        match self {
            OperandKind::Reg | OperandKind::Lit8 | OperandKind::Addr8 => 1,
            OperandKind::Lit16 | OperandKind::Addr16 => 2,
        }
    }
}

/// 指令编码长度 = 1 字节操作码 + 各操作数宽度之和
pub const fn instruction_size(schema: &[OperandKind]) -> usize {
    let mut size = 1;
    let mut i = 0;
    while i < schema.len() {
        size += schema[i].width();
        i += 1;
    }
    size
}

/// 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    NoOp = 0x00,

    MovLitReg = 0x10,
    MovRegReg = 0x11,
    MovRegMem = 0x12,
    MovMemReg = 0x13,
    MovLitMem = 0x14,
    MovRegPtrReg = 0x15,
    MovLitOffReg = 0x16,

    PshLit = 0x17,
    PshReg = 0x18,
    Pop = 0x1a,

    AddLitReg = 0x1b,
    AddRegReg = 0x1c,
    SubLitReg = 0x1d,
    SubRegLit = 0x1e,
    SubRegReg = 0x1f,
    MulLitReg = 0x20,
    MulRegReg = 0x21,

    LshRegLit = 0x26,
    LshRegReg = 0x27,
    RshRegLit = 0x2a,
    RshRegReg = 0x2b,

    AndRegLit = 0x2e,
    AndRegReg = 0x2f,
    OrRegLit = 0x30,
    OrRegReg = 0x31,
    XorRegLit = 0x32,
    XorRegReg = 0x33,
    Not = 0x34,
    IncReg = 0x35,
    DecReg = 0x36,

    JeqReg = 0x3e,
    JeqLit = 0x3f,
    JneReg = 0x40,
    JneLit = 0x41,
    JltReg = 0x42,
    JltLit = 0x43,
    JgtReg = 0x44,
    JgtLit = 0x45,
    JleReg = 0x46,
    JleLit = 0x47,
    JgeReg = 0x48,
    JgeLit = 0x49,
    JmpNotEq = 0x4a,

    CalLit = 0x5e,
    CalReg = 0x5f,
    Ret = 0x60,

    Mov8RegMem = 0x72,
    Mov8MemReg = 0x73,
    Mov8LitMem = 0x74,

    Hlt = 0xff,
}

impl Opcode {
    pub const ALL: &'static [Opcode] = &[
        Opcode::NoOp,
        Opcode::MovLitReg,
        Opcode::MovRegReg,
        Opcode::MovRegMem,
        Opcode::MovMemReg,
        Opcode::MovLitMem,
        Opcode::MovRegPtrReg,
        Opcode::MovLitOffReg,
        Opcode::PshLit,
        Opcode::PshReg,
        Opcode::Pop,
        Opcode::AddLitReg,
        Opcode::AddRegReg,
        Opcode::SubLitReg,
        Opcode::SubRegLit,
        Opcode::SubRegReg,
        Opcode::MulLitReg,
        Opcode::MulRegReg,
        Opcode::LshRegLit,
        Opcode::LshRegReg,
        Opcode::RshRegLit,
        Opcode::RshRegReg,
        Opcode::AndRegLit,
        Opcode::AndRegReg,
        Opcode::OrRegLit,
        Opcode::OrRegReg,
        Opcode::XorRegLit,
        Opcode::XorRegReg,
        Opcode::Not,
        Opcode::IncReg,
        Opcode::DecReg,
        Opcode::JeqReg,
        Opcode::JeqLit,
        Opcode::JneReg,
        Opcode::JneLit,
        Opcode::JltReg,
        Opcode::JltLit,
        Opcode::JgtReg,
        Opcode::JgtLit,
        Opcode::JleReg,
        Opcode::JleLit,
        Opcode::JgeReg,
        Opcode::JgeLit,
        Opcode::JmpNotEq,
        Opcode::CalLit,
        Opcode::CalReg,
        Opcode::Ret,
        Opcode::Mov8RegMem,
        Opcode::Mov8MemReg,
        Opcode::Mov8LitMem,
        Opcode::Hlt,
    ];

    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// 操作码字节解码，不在表中的字节返回 None
    #[inline(always)]
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        lookup(byte).map(|inst| inst.opcode)
    }

    /// 按助记符名查找（如 `MOV_LIT_REG`）
    pub fn from_name(name: &str) -> Option<Opcode> {
        TABLE.iter().flatten().find(|inst| inst.name == name).map(|inst| inst.opcode)
    }

    /// 指令元数据；每个操作码在表中都有条目（编译期检查）
    #[inline(always)]
    pub fn instruction(self) -> &'static Instruction {
        match TABLE[self as usize] {
            Some(inst) => inst,
            None => unreachable!("操作码 {:#04x} 缺少指令表条目", self as u8),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instruction().name)
    }
}

/// 指令执行函数
pub type Handler = fn(cpu: &mut Cpu, ops: &Operands) -> Result<(), Exception>;

/// 指令元数据
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub opcode: Opcode,
    pub name: &'static str,
    /// 汇编关键字，同一关键字可对应多种操作数形式
    pub keyword: &'static str,
    pub schema: &'static [OperandKind],
    pub execute: Handler,
}

impl Instruction {
    /// 编码长度（字节）
    pub const fn size(&self) -> usize {
        instruction_size(self.schema)
    }
}

/// 已取出的操作数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operands {
    values: [u16; MAX_OPERANDS],
    len: usize,
}

impl Operands {
    pub(crate) fn push(&mut self, value: u16) {
        self.values[self.len] = value;
        self.len += 1;
    }

    /// 第 i 个操作数的原始值（立即数或地址）
    #[inline(always)]
    pub fn value(&self, i: usize) -> u16 {
        self.values[i]
    }

    /// 第 i 个操作数作为寄存器
    #[inline(always)]
    pub fn reg(&self, i: usize) -> Register {
        Register::decode(self.values[i] as u8)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.values[..self.len]
    }
}

const FAMILIES: [&[Instruction]; 6] = [
    control::CONTROL,
    mov::MOV,
    stack::STACK,
    alu::ALU,
    jump::JUMP,
    call::CALL,
];

const fn build_table() -> [Option<&'static Instruction>; 256] {
    let mut table: [Option<&'static Instruction>; 256] = [None; 256];
    let mut f = 0;
    while f < FAMILIES.len() {
        let family = FAMILIES[f];
        let mut i = 0;
        while i < family.len() {
            let code = family[i].opcode as usize;
            if table[code].is_some() {
                panic!("重复的操作码");
            }
            table[code] = Some(&family[i]);
            i += 1;
        }
        f += 1;
    }

    let mut i = 0;
    while i < Opcode::ALL.len() {
        if table[Opcode::ALL[i] as usize].is_none() {
            panic!("操作码缺少指令表条目");
        }
        i += 1;
    }
    table
}

/// 按操作码字节索引的指令表
static TABLE: [Option<&'static Instruction>; 256] = build_table();

/// 查找操作码字节对应的指令
#[inline(always)]
pub fn lookup(byte: u8) -> Option<&'static Instruction> {
    TABLE[byte as usize]
}

/// 全部指令，按操作码排序
pub fn instructions() -> impl Iterator<Item = &'static Instruction> {
    TABLE.iter().flatten().copied()
}
