//! 栈与调用帧
//!
//! 满递减栈：压栈先写 `sp` 再减 2，出栈先加 2 再读。
//! 调用帧布局（自 fp 起向高地址）：`fp + 2` 帧大小，`fp + 4` 返回地址，
//! `fp + 6 ..= fp + 20` 保存的 r8..r1，其上是参数个数和调用者压入的参数。

use tracing::debug;

use super::{Cpu, Exception, Register};

impl Cpu {
    /// 压入一个字
    pub fn push(&mut self, value: u16) -> Result<(), Exception> {
        let sp = self.registers.get(Register::Sp);
        if self.stack_guard && sp < 2 {
            return Err(Exception::StackOverflow { sp });
        }
        self.write16(sp, value)?;
        self.registers.set(Register::Sp, sp.wrapping_sub(2));
        self.frame_bytes = self.frame_bytes.wrapping_add(2);
        Ok(())
    }

    /// 弹出一个字
    pub fn pop(&mut self) -> Result<u16, Exception> {
        let sp = self.registers.get(Register::Sp);
        if self.stack_guard && sp > 0xfffd {
            return Err(Exception::StackUnderflow { sp });
        }
        let next = sp.wrapping_add(2);
        self.registers.set(Register::Sp, next);
        self.frame_bytes = self.frame_bytes.wrapping_sub(2);
        self.read16(next)
    }

    /// 保存调用者状态并跳转到 `target`
    pub(crate) fn call(&mut self, target: u16) -> Result<(), Exception> {
        for reg in Register::GENERAL {
            self.push(self.registers.get(reg))?;
        }
        self.push(self.registers.get(Register::Ip))?;
        self.push(self.frame_bytes.wrapping_add(2))?;

        let sp = self.registers.get(Register::Sp);
        self.registers.set(Register::Fp, sp);
        self.frame_bytes = 0;
        debug!(
            "调用 {:#06x}, 返回地址 {:#06x}, fp = {:#06x}",
            target,
            self.registers.get(Register::Ip),
            sp
        );
        self.jump(target);
        Ok(())
    }

    /// 丢弃被调用者的局部数据，恢复调用者状态并清理参数
    pub(crate) fn ret(&mut self) -> Result<(), Exception> {
        let base = self.registers.get(Register::Fp);
        self.registers.set(Register::Sp, base);

        let frame_size = self.pop()?;
        self.frame_bytes = frame_size;

        let ip = self.pop()?;
        self.jump(ip);

        for reg in Register::GENERAL.into_iter().rev() {
            let value = self.pop()?;
            self.registers.set(reg, value);
        }

        let args = self.pop()?;
        for _ in 0..args {
            self.pop()?;
        }

        let fp = base.wrapping_add(frame_size);
        self.registers.set(Register::Fp, fp);
        debug!("返回 {:#06x}, 清理 {} 个参数, fp = {:#06x}", ip, args, fp);
        Ok(())
    }
}
