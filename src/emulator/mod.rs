//! 模拟器核心模块

pub mod device_manager;
mod exception;
mod frame;
pub mod instructions;
mod mapper;
mod memory;
mod registers;
pub mod state;
#[cfg(feature = "tracer")]
pub mod tracer;

#[cfg(test)]
pub(crate) mod test_util;

use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use tracing::trace;

use crate::const_values::{ADDRESS_SPACE_SIZE, CpuConfig};
use crate::utils::{disasm, dump};
pub use exception::Exception;
use instructions::{OperandKind, Operands};
pub use mapper::{MemoryError, MemoryMapper, MemoryRegion, RegionId, SharedDevice};
pub use memory::Memory;
pub use registers::{GENERAL_REGISTER_COUNT, REGISTER_COUNT, Register, RegisterError, RegisterFile};
pub use state::{Event, ExecState};

/// 共享的内存映射器
pub type SharedMapper = Rc<RefCell<MemoryMapper>>;

/// 处理器
pub struct Cpu {
    registers: RegisterFile,
    /// 地址空间，与宿主共享（宿主可在两次执行之间映射或移除区域）
    mapper: SharedMapper,
    /// 自上次调用/返回以来压栈的字节数
    frame_bytes: u16,
    stack_guard: bool,
    exec_state: ExecState,
    event: Event,
    /// 寄存器差异输出使用的上一次快照
    prev_registers: Option<[u16; REGISTER_COUNT]>,
}

impl Cpu {
    /// 创建处理器：`sp = fp = 地址空间长度 - 2`，`ip = 0`
    pub fn new(mapper: SharedMapper) -> Self {
        Self::with_config(mapper, &CpuConfig::default())
    }

    pub fn with_config(mapper: SharedMapper, config: &CpuConfig) -> Self {
        let mut registers = RegisterFile::new();
        let top = (mapper.borrow().byte_length() as u32).wrapping_sub(2) as u16;
        registers.set(Register::Sp, top);
        registers.set(Register::Fp, top);
        Self {
            registers,
            mapper,
            frame_bytes: 0,
            stack_guard: config.stack_guard,
            exec_state: ExecState::Idle,
            event: Event::None,
            prev_registers: None,
        }
    }

    /// 把程序映像逐字节写入地址空间，并把 ip 指向 `origin`
    ///
    /// `origin + len` 超过 16 位地址空间时不写入任何字节
    pub fn load_program(&mut self, origin: u16, image: &[u8]) -> Result<(), Exception> {
        if origin as usize + image.len() > ADDRESS_SPACE_SIZE {
            return Err(Exception::ImageTooLarge {
                origin,
                len: image.len(),
            });
        }
        for (offset, &byte) in image.iter().enumerate() {
            self.write8(origin.wrapping_add(offset as u16), byte)?;
        }
        self.registers.set(Register::Ip, origin);
        Ok(())
    }

    #[inline(always)]
    fn fetch8(&mut self) -> Result<u8, Exception> {
        let ip = self.registers.get(Register::Ip);
        let value = self.read8(ip)?;
        self.registers.set(Register::Ip, ip.wrapping_add(1));
        Ok(value)
    }

    #[inline(always)]
    fn fetch16(&mut self) -> Result<u16, Exception> {
        let ip = self.registers.get(Register::Ip);
        let value = self.read16(ip)?;
        self.registers.set(Register::Ip, ip.wrapping_add(2));
        Ok(value)
    }

    #[inline(always)]
    fn step_internal(&mut self) -> Result<(), Exception> {
        let pc = self.registers.get(Register::Ip);
        let opcode = self.fetch8()?;
        let inst =
            instructions::lookup(opcode).ok_or(Exception::UnknownOpcode { opcode, addr: pc })?;

        let mut ops = Operands::default();
        for kind in inst.schema {
            let value = match kind {
                OperandKind::Reg => Register::decode(self.fetch8()?).index() as u16,
                OperandKind::Lit8 | OperandKind::Addr8 => self.fetch8()? as u16,
                OperandKind::Lit16 | OperandKind::Addr16 => self.fetch16()?,
            };
            ops.push(value);
        }

        trace!("{:#06x}: {} {:x?}", pc, inst.name, ops.as_slice());
        (inst.execute)(self, &ops)
    }

    /// 执行单条指令，返回是否应当停机
    #[inline(always)]
    pub fn step(&mut self) -> Result<bool, Exception> {
        self.exec_state = ExecState::Running;
        self.event = Event::None;

        #[cfg(feature = "tracer")]
        tracer::global_trace(self);

        let result = self.step_internal();
        self.exec_state = match (&result, self.event) {
            (Ok(()), Event::Halted) => ExecState::End,
            _ => ExecState::Idle,
        };
        result.map(|()| self.event == Event::Halted)
    }

    /// 最多执行 `n` 条指令，遇到停机提前结束；返回实际执行的条数
    pub fn steps(&mut self, n: usize) -> Result<usize, Exception> {
        for count in 1..=n {
            if self.step()? {
                return Ok(count);
            }
        }
        Ok(n)
    }

    /// 运行直到停机，返回执行的指令条数
    pub fn run(&mut self) -> Result<u64, Exception> {
        let mut count = 0u64;
        loop {
            count += 1;
            if self.step()? {
                return Ok(count);
            }
        }
    }

    /// 运行直到停机或观察者返回 `Break`；观察者在每两条指令之间被调用
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<u64, Exception>
    where
        F: FnMut(&mut Cpu) -> ControlFlow<()>,
    {
        let mut count = 0u64;
        loop {
            if observer(&mut *self).is_break() {
                return Ok(count);
            }
            count += 1;
            if self.step()? {
                return Ok(count);
            }
        }
    }

    /// 把 ip 设为 `target`
    #[inline(always)]
    pub(crate) fn jump(&mut self, target: u16) {
        self.registers.set(Register::Ip, target);
    }

    #[inline(always)]
    pub(crate) fn raise(&mut self, event: Event) {
        self.event = event;
    }

    #[inline(always)]
    pub fn reg(&self, reg: Register) -> u16 {
        self.registers.get(reg)
    }

    #[inline(always)]
    pub fn set_reg(&mut self, reg: Register, value: u16) {
        self.registers.set(reg, value);
    }

    /// 按名字读取寄存器
    pub fn get_register(&self, name: &str) -> Result<u16, Exception> {
        Ok(self.registers.read_by_name(name)?)
    }

    /// 按名字写入寄存器
    pub fn set_register(&mut self, name: &str, value: u16) -> Result<(), Exception> {
        Ok(self.registers.write_by_name(name, value)?)
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    #[inline(always)]
    pub fn read8(&self, addr: u16) -> Result<u8, Exception> {
        Ok(self.mapper.borrow().get8(addr)?)
    }

    #[inline(always)]
    pub fn read16(&self, addr: u16) -> Result<u16, Exception> {
        Ok(self.mapper.borrow().get16(addr)?)
    }

    #[inline(always)]
    pub fn write8(&self, addr: u16, value: u8) -> Result<(), Exception> {
        Ok(self.mapper.borrow().set8(addr, value)?)
    }

    #[inline(always)]
    pub fn write16(&self, addr: u16, value: u16) -> Result<(), Exception> {
        Ok(self.mapper.borrow().set16(addr, value)?)
    }

    pub fn mapper(&self) -> &SharedMapper {
        &self.mapper
    }

    pub fn frame_bytes(&self) -> u16 {
        self.frame_bytes
    }

    pub fn stack_guard(&self) -> bool {
        self.stack_guard
    }

    #[inline(always)]
    pub fn exec_state(&self) -> ExecState {
        self.exec_state
    }

    #[inline(always)]
    pub fn event(&self) -> Event {
        self.event
    }

    /// 与上一次调用时的寄存器快照做差异对比
    ///
    /// 第一次调用只记录快照；寄存器没有变化时返回 None
    pub fn debug_diff(&mut self, unchanged: dump::Unchanged) -> Option<String> {
        let current = self.registers.snapshot();
        let prev = self.prev_registers.replace(current)?;
        (prev != current).then(|| dump::register_diff(&prev, &current, unchanged))
    }

    /// 从 `addr` 开始查看 `length` 个字节
    pub fn view_memory_at(&self, addr: u16, length: usize) -> Result<String, Exception> {
        let mut bytes = Vec::with_capacity(length);
        for i in 0..length {
            bytes.push(self.read8(addr.wrapping_add(i as u16))?);
        }
        Ok(dump::memory_view(addr, &bytes))
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", dump::register_table(&self.registers.snapshot()))?;
        let ip = self.reg(Register::Ip);
        match disasm::disasm_at(&self.mapper.borrow(), ip) {
            Ok(line) => write!(f, "=> {}", line),
            Err(e) => write!(f, "=> {:#06x}: <{}>", ip, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::instructions::Opcode;
    use crate::emulator::instructions::encode::{Operand, Program};
    use crate::utils::dump::Unchanged;
    use test_util::{cpu_at, cpu_with_program, shared_mapper};

    #[test]
    fn test_initial_stack_pointer() {
        let cpu = Cpu::new(shared_mapper(0x10000));
        assert_eq!(cpu.reg(Register::Sp), 0xfffe);
        assert_eq!(cpu.reg(Register::Fp), 0xfffe);
        assert_eq!(cpu.reg(Register::Ip), 0);
        assert_eq!(cpu.exec_state(), ExecState::Idle);

        let cpu = Cpu::new(shared_mapper(0x200));
        assert_eq!(cpu.reg(Register::Sp), 0x01fe);
    }

    #[test]
    fn test_empty_address_space_wraps_stack() {
        let cpu = Cpu::new(Rc::new(RefCell::new(MemoryMapper::new())));
        assert_eq!(cpu.reg(Register::Sp), 0xfffe);
    }

    #[test]
    fn test_unknown_opcode() {
        let mut prog = Program::new();
        prog.push(Opcode::NoOp, &[]).unwrap().raw(&[0x01]);
        let mut cpu = cpu_with_program(&prog);
        cpu.step().unwrap();
        assert_eq!(
            cpu.step().unwrap_err(),
            Exception::UnknownOpcode { opcode: 0x01, addr: 0x0001 }
        );
    }

    #[test]
    fn test_fetch_from_unmapped_memory() {
        let prog = Program::new();
        let mut cpu = cpu_at(0x100, 0, &prog);
        cpu.jump(0x0100);
        assert_eq!(
            cpu.step().unwrap_err(),
            Exception::Memory(MemoryError::NoRegion { addr: 0x0100 })
        );
    }

    #[test]
    fn test_register_byte_wraps() {
        let mut prog = Program::new();
        // 寄存器字节 14 解码为 r1
        prog.raw(&[Opcode::MovLitReg.code(), 0x12, 0x34, 14]);
        let mut cpu = cpu_with_program(&prog);
        cpu.step().unwrap();
        assert_eq!(cpu.reg(Register::R1), 0x1234);
    }

    #[test]
    fn test_run_until_halt() {
        let mut prog = Program::new();
        prog.push(Opcode::MovLitReg, &[Operand::Lit16(3), Operand::Reg(Register::R1)])
            .unwrap()
            .push(Opcode::DecReg, &[Operand::Reg(Register::R1)])
            .unwrap()
            .push(Opcode::JneReg, &[Operand::Reg(Register::R1), Operand::Addr16(4)])
            .unwrap()
            .push(Opcode::Hlt, &[])
            .unwrap();
        let mut cpu = cpu_with_program(&prog);
        // 1 + 3 * 2 + 1
        assert_eq!(cpu.run().unwrap(), 8);
        assert_eq!(cpu.reg(Register::R1), 0);
        assert_eq!(cpu.exec_state(), ExecState::End);
    }

    #[test]
    fn test_steps_stops_on_halt() {
        let mut prog = Program::new();
        prog.push(Opcode::NoOp, &[]).unwrap().push(Opcode::Hlt, &[]).unwrap();
        let mut cpu = cpu_with_program(&prog);
        assert_eq!(cpu.steps(10).unwrap(), 2);
        assert_eq!(cpu.reg(Register::Ip), 2);
    }

    #[test]
    fn test_run_with_observer_break() {
        let mut prog = Program::new();
        for _ in 0..8 {
            prog.push(Opcode::IncReg, &[Operand::Reg(Register::R2)]).unwrap();
        }
        prog.push(Opcode::Hlt, &[]).unwrap();
        let mut cpu = cpu_with_program(&prog);

        let executed = cpu
            .run_with(|cpu| {
                if cpu.reg(Register::R2) == 5 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(executed, 5);
        assert_eq!(cpu.exec_state(), ExecState::Idle);

        let rest = cpu.run_with(|_| ControlFlow::Continue(())).unwrap();
        assert_eq!(rest, 4);
        assert_eq!(cpu.reg(Register::R2), 8);
    }

    #[test]
    fn test_named_register_access() {
        let mut cpu = cpu_with_program(&Program::new());
        cpu.set_register("r5", 0x5555).unwrap();
        assert_eq!(cpu.get_register("r5").unwrap(), 0x5555);
        assert!(matches!(
            cpu.get_register("x1"),
            Err(Exception::Register(RegisterError::UnknownName(_)))
        ));
    }

    #[test]
    fn test_region_mapped_between_steps() {
        let mut prog = Program::new();
        prog.push(Opcode::MovLitMem, &[Operand::Lit16(0x1111), Operand::Addr16(0x3000)])
            .unwrap()
            .push(Opcode::MovLitMem, &[Operand::Lit16(0x2222), Operand::Addr16(0x3000)])
            .unwrap();
        let mut cpu = cpu_with_program(&prog);
        cpu.step().unwrap();

        let overlay: SharedDevice = Rc::new(RefCell::new(Memory::new(0x100)));
        let id = cpu.mapper().borrow_mut().map(overlay.clone(), 0x3000, 0x30ff, true).unwrap();
        cpu.step().unwrap();
        assert_eq!(overlay.borrow_mut().get16(0).unwrap(), 0x2222);

        cpu.mapper().borrow_mut().unmap(id);
        assert_eq!(cpu.read16(0x3000).unwrap(), 0x1111);
    }

    #[test]
    fn test_display_shows_next_instruction() {
        let mut prog = Program::new();
        prog.push(Opcode::MovLitReg, &[Operand::Lit16(0xabcd), Operand::Reg(Register::R1)])
            .unwrap();
        let cpu = cpu_with_program(&prog);
        let text = format!("{}", cpu);
        assert!(text.contains("=> 0x0000: 10 ab cd 02"));
        assert!(text.contains("MOV_LIT_REG 0xabcd, r1"));
    }

    #[test]
    fn test_view_memory() {
        let mut prog = Program::new();
        prog.raw(b"Hi");
        let cpu = cpu_at(0x10, 0, &prog);
        let view = cpu.view_memory_at(0, 4).unwrap();
        assert!(view.contains("|Hi..|"));
        assert!(cpu.view_memory_at(0x0e, 4).is_err());
    }

    #[test]
    fn test_load_program_rejects_image_past_address_space() {
        let mut cpu = cpu_with_program(&Program::new());
        let image = [0xaa; 0x20];
        assert_eq!(
            cpu.load_program(0xfff0, &image),
            Err(Exception::ImageTooLarge { origin: 0xfff0, len: 0x20 })
        );
        // 不写入任何字节，低地址不被覆盖
        assert_eq!(cpu.read8(0x0000).unwrap(), 0);
        assert_eq!(cpu.read8(0x000f).unwrap(), 0);
        assert_eq!(cpu.read8(0xfff0).unwrap(), 0);
        assert_eq!(cpu.reg(Register::Ip), 0);
    }

    #[test]
    fn test_load_program_up_to_last_byte() {
        let mut cpu = cpu_with_program(&Program::new());
        cpu.load_program(0xfff0, &[0x55; 0x10]).unwrap();
        assert_eq!(cpu.read8(0xffff).unwrap(), 0x55);
        assert_eq!(cpu.reg(Register::Ip), 0xfff0);
    }

    #[test]
    fn test_operand_fetch_failure_keeps_partial_state() {
        let mut prog = Program::new();
        prog.push(Opcode::MovLitReg, &[Operand::Lit16(0x1234), Operand::Reg(Register::R2)])
            .unwrap()
            // 操作码在 0xfe，16 位立即数跨过内存末尾
            .raw(&[Opcode::MovLitReg.code(), 0x12]);
        let mut cpu = cpu_at(0x100, 0xfa, &prog);
        cpu.step().unwrap();
        let err = cpu.step().unwrap_err();
        assert_eq!(
            err,
            Exception::Memory(MemoryError::Device(device_trait::DeviceError::OutOfRange {
                addr: 0xff,
                width: 2,
                size: 0x100,
            }))
        );
        // 操作码已取出，ip 停在操作数处
        assert_eq!(cpu.reg(Register::Ip), 0xff);
        assert_eq!(cpu.reg(Register::R2), 0x1234);
        assert_eq!(cpu.exec_state(), ExecState::Idle);
    }

    #[test]
    fn test_operand_fetch_from_unmapped_address() {
        let mut prog = Program::new();
        prog.raw(&[Opcode::IncReg.code()]);
        let mut cpu = cpu_at(0x100, 0xff, &prog);
        assert_eq!(
            cpu.step().unwrap_err(),
            Exception::Memory(MemoryError::NoRegion { addr: 0x0100 })
        );
        assert_eq!(cpu.reg(Register::Ip), 0x0100);
    }

    #[test]
    fn test_debug_diff_modes() {
        let mut prog = Program::new();
        prog.push(Opcode::MovLitReg, &[Operand::Lit16(5), Operand::Reg(Register::R1)])
            .unwrap()
            .push(Opcode::IncReg, &[Operand::Reg(Register::R1)])
            .unwrap()
            .push(Opcode::IncReg, &[Operand::Reg(Register::R1)])
            .unwrap();
        let mut cpu = cpu_with_program(&prog);

        // 第一次只记录快照
        assert_eq!(cpu.debug_diff(Unchanged::Hide), None);
        assert_eq!(cpu.debug_diff(Unchanged::Hide), None);

        cpu.step().unwrap();
        let hidden = cpu.debug_diff(Unchanged::Hide).unwrap();
        assert!(hidden.contains("0x0005"));
        assert!(!hidden.contains("r8"));

        cpu.step().unwrap();
        let dimmed = cpu.debug_diff(Unchanged::Dim).unwrap();
        assert!(dimmed.contains("0x0006"));
        assert!(dimmed.contains("r8"));

        cpu.step().unwrap();
        let shown = cpu.debug_diff(Unchanged::Show).unwrap();
        assert!(shown.contains("0x0007"));
        assert!(shown.contains("acc"));
    }

    #[test]
    fn test_run_with_observer_can_inspect_mutably() {
        let mut prog = Program::new();
        prog.push(Opcode::IncReg, &[Operand::Reg(Register::R3)])
            .unwrap()
            .push(Opcode::Hlt, &[])
            .unwrap();
        let mut cpu = cpu_with_program(&prog);
        let mut diffs = Vec::new();
        cpu.run_with(|cpu| {
            diffs.extend(cpu.debug_diff(Unchanged::Hide));
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].contains("r3"));
    }
}
