//! 反汇编模块
//!
//! 按操作码表中的操作数模式解析字节流，和执行引擎共用同一张表。

use crate::emulator::instructions::{self, Instruction, OperandKind};
use crate::emulator::{MemoryError, MemoryMapper, Register};

/// 一条指令最长的编码字节数
pub const MAX_INSTRUCTION_SIZE: usize = 5;

/// 十六进制字节列的宽度
const HEX_COLUMN: usize = MAX_INSTRUCTION_SIZE * 3 - 1;

fn format_operands(inst: &Instruction, operands: &[u8]) -> String {
    let mut parts = Vec::with_capacity(inst.schema.len());
    let mut offset = 0;
    for kind in inst.schema {
        let text = match kind {
            OperandKind::Reg => Register::decode(operands[offset]).name().to_string(),
            OperandKind::Lit8 | OperandKind::Addr8 => format!("{:#04x}", operands[offset]),
            OperandKind::Lit16 | OperandKind::Addr16 => {
                let value = u16::from_be_bytes([operands[offset], operands[offset + 1]]);
                format!("{:#06x}", value)
            }
        };
        parts.push(text);
        offset += kind.width();
    }
    parts.join(", ")
}

fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 反汇编一条指令，返回文本和消耗的字节数
///
/// 未知操作码按单字节 `.byte` 输出，字节不足时输出 `<truncated>` 并消耗剩余全部字节。
pub fn disasm_instruction(bytes: &[u8]) -> (String, usize) {
    let Some(&opcode) = bytes.first() else {
        return ("<empty>".to_string(), 0);
    };
    let Some(inst) = instructions::lookup(opcode) else {
        return (format!(".byte {:#04x}", opcode), 1);
    };
    let size = inst.size();
    if bytes.len() < size {
        return (format!("{} <truncated>", inst.name), bytes.len());
    }

    let text = if inst.schema.is_empty() {
        inst.name.to_string()
    } else {
        format!("{} {}", inst.name, format_operands(inst, &bytes[1..size]))
    };
    (text, size)
}

/// 带地址和机器码的一行反汇编，返回文本和消耗的字节数
pub fn disasm_with_details(bytes: &[u8], addr: u16) -> (String, usize) {
    let (text, size) = disasm_instruction(bytes);
    let line = format!(
        "{:#06x}: {:<width$}  {}",
        addr,
        format_bytes(&bytes[..size]),
        text,
        width = HEX_COLUMN
    );
    (line, size)
}

/// 反汇编一段程序映像
pub fn disasm_buffer(code: &[u8], start: u16) -> Vec<String> {
    let mut lines = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let (line, size) = disasm_with_details(&code[offset..], start.wrapping_add(offset as u16));
        lines.push(line);
        offset += size;
    }
    lines
}

/// 从地址空间中读取并反汇编 `addr` 处的指令
pub fn disasm_at(mapper: &MemoryMapper, addr: u16) -> Result<String, MemoryError> {
    let opcode = mapper.get8(addr)?;
    let size = instructions::lookup(opcode).map_or(1, |inst| inst.size());
    let mut bytes = Vec::with_capacity(size);
    bytes.push(opcode);
    for i in 1..size {
        bytes.push(mapper.get8(addr.wrapping_add(i as u16))?);
    }
    Ok(disasm_with_details(&bytes, addr).0)
}
