//! 内存管理模块

use device_trait::{Device, DeviceError};

/// 平坦内存
///
/// 固定长度的字节缓冲区，创建后不再改变大小。
/// 所有访问先做边界检查，16 位访问为大端序。
#[derive(Debug, Clone)]
pub struct Memory {
    /// 内存数据
    data: Vec<u8>,
}

impl Memory {
    /// 创建新的内存实例
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// 内存字节长度
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 检查地址有效性，返回缓冲区下标
    #[inline(always)]
    fn check_range(&self, addr: u16, width: usize) -> Result<usize, DeviceError> {
        let start = addr as usize;
        if start + width > self.data.len() {
            return Err(DeviceError::OutOfRange {
                addr,
                width,
                size: self.data.len(),
            });
        }
        Ok(start)
    }

    /// 读取字节
    #[inline(always)]
    pub fn get8(&self, addr: u16) -> Result<u8, DeviceError> {
        let start = self.check_range(addr, 1)?;
        Ok(self.data[start])
    }

    /// 写入字节
    #[inline(always)]
    pub fn set8(&mut self, addr: u16, value: u8) -> Result<(), DeviceError> {
        let start = self.check_range(addr, 1)?;
        self.data[start] = value;
        Ok(())
    }

    /// 读取 16 位字（大端）
    #[inline(always)]
    pub fn get16(&self, addr: u16) -> Result<u16, DeviceError> {
        let start = self.check_range(addr, 2)?;
        Ok(u16::from_be_bytes([self.data[start], self.data[start + 1]]))
    }

    /// 写入 16 位字（大端）
    #[inline(always)]
    pub fn set16(&mut self, addr: u16, value: u16) -> Result<(), DeviceError> {
        let start = self.check_range(addr, 2)?;
        self.data[start..start + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

impl Device for Memory {
    fn get8(&mut self, addr: u16) -> Result<u8, DeviceError> {
        Memory::get8(self, addr)
    }

    fn set8(&mut self, addr: u16, value: u8) -> Result<(), DeviceError> {
        Memory::set8(self, addr, value)
    }

    fn get16(&mut self, addr: u16) -> Result<u16, DeviceError> {
        Memory::get16(self, addr)
    }

    fn set16(&mut self, addr: u16, value: u16) -> Result<(), DeviceError> {
        Memory::set16(self, addr, value)
    }

    fn name(&self) -> &str {
        "ram"
    }
}
