//! 测试辅助函数

use std::cell::RefCell;
use std::rc::Rc;

use super::instructions::encode::Program;
use super::{Cpu, Memory, MemoryMapper, SharedMapper};

/// 在 0 处映射一块 `size` 字节内存的地址空间
pub fn shared_mapper(size: usize) -> SharedMapper {
    let mut mapper = MemoryMapper::new();
    let end = (size - 1) as u16;
    mapper
        .map(Rc::new(RefCell::new(Memory::new(size))), 0, end, true)
        .unwrap();
    Rc::new(RefCell::new(mapper))
}

/// `size` 字节内存，程序加载到 `origin`，ip 指向 `origin`
pub fn cpu_at(size: usize, origin: u16, program: &Program) -> Cpu {
    let mut cpu = Cpu::new(shared_mapper(size));
    cpu.load_program(origin, program.bytes()).unwrap();
    cpu
}

/// 64K 内存，程序加载到 0
pub fn cpu_with_program(program: &Program) -> Cpu {
    cpu_at(0x10000, 0, program)
}
