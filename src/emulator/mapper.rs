//! 内存映射模块
//!
//! 把 16 位地址空间划分为若干个（可以相互重叠的）区域，每个区域由一个设备支撑。
//! 区域按添加顺序倒序保存：发生重叠时，最近映射的区域优先。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use device_trait::{Device, DeviceError};
use thiserror::Error;
use tracing::debug;

/// 可共享的设备句柄
pub type SharedDevice = Rc<RefCell<dyn Device>>;

/// 内存错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("地址 {addr:#06x} 没有对应的内存区域")]
    NoRegion { addr: u16 },
    #[error("无效的区域范围: {start:#06x}..={end:#06x}")]
    InvalidRange { start: u16, end: u16 },
    #[error("设备错误: {0}")]
    Device(#[from] DeviceError),
}

/// `map` 返回的区域句柄，用于之后精确移除该区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(u64);

/// 内存区域
pub struct MemoryRegion {
    id: RegionId,
    pub device: SharedDevice,
    pub start: u16,
    pub end: u16,
    /// 为 true 时设备看到的是 `addr - start`，否则是原始地址
    pub remap: bool,
}

impl MemoryRegion {
    #[inline(always)]
    pub fn contains(&self, addr: u16) -> bool {
        addr >= self.start && addr <= self.end
    }

    #[inline(always)]
    fn to_device_addr(&self, addr: u16) -> u16 {
        if self.remap { addr - self.start } else { addr }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("start", &format_args!("{:#06x}", self.start))
            .field("end", &format_args!("{:#06x}", self.end))
            .field("remap", &self.remap)
            .field("device", &self.device.borrow().name())
            .finish()
    }
}

/// 内存映射器
#[derive(Debug, Default)]
pub struct MemoryMapper {
    /// 最近添加的区域在前
    regions: Vec<MemoryRegion>,
    next_id: u64,
}

impl MemoryMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// 映射设备到 `[start, end]`，覆盖所有与之重叠的已有区域
    pub fn map(
        &mut self,
        device: SharedDevice,
        start: u16,
        end: u16,
        remap: bool,
    ) -> Result<RegionId, MemoryError> {
        if start > end {
            return Err(MemoryError::InvalidRange { start, end });
        }
        let id = RegionId(self.next_id);
        self.next_id += 1;

        debug!(
            device = device.borrow().name(),
            remap,
            "映射内存区域 {:#06x}..={:#06x}",
            start,
            end
        );
        self.regions.insert(
            0,
            MemoryRegion {
                id,
                device,
                start,
                end,
                remap,
            },
        );
        Ok(id)
    }

    /// 移除 `map` 返回的区域，区域不存在时返回 false
    pub fn unmap(&mut self, id: RegionId) -> bool {
        if let Some(index) = self.regions.iter().position(|r| r.id == id) {
            let region = self.regions.remove(index);
            debug!("移除内存区域 {:#06x}..={:#06x}", region.start, region.end);
            true
        } else {
            false
        }
    }

    /// 查找覆盖指定地址的区域（最近映射的优先）
    #[inline(always)]
    pub fn find_region(&self, addr: u16) -> Result<&MemoryRegion, MemoryError> {
        self.regions
            .iter()
            .find(|region| region.contains(addr))
            .ok_or(MemoryError::NoRegion { addr })
    }

    /// 地址空间字节长度：所有区域 `end + 1` 的最大值，没有区域时为 0
    pub fn byte_length(&self) -> usize {
        self.regions
            .iter()
            .map(|r| r.end as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// 已映射的区域，最近映射的在前
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// 读取字节
    #[inline(always)]
    pub fn get8(&self, addr: u16) -> Result<u8, MemoryError> {
        let region = self.find_region(addr)?;
        let dev_addr = region.to_device_addr(addr);
        Ok(region.device.borrow_mut().get8(dev_addr)?)
    }

    /// 写入字节
    #[inline(always)]
    pub fn set8(&self, addr: u16, value: u8) -> Result<(), MemoryError> {
        let region = self.find_region(addr)?;
        let dev_addr = region.to_device_addr(addr);
        Ok(region.device.borrow_mut().set8(dev_addr, value)?)
    }

    /// 读取 16 位字
    #[inline(always)]
    pub fn get16(&self, addr: u16) -> Result<u16, MemoryError> {
        let region = self.find_region(addr)?;
        let dev_addr = region.to_device_addr(addr);
        Ok(region.device.borrow_mut().get16(dev_addr)?)
    }

    /// 写入 16 位字
    #[inline(always)]
    pub fn set16(&self, addr: u16, value: u16) -> Result<(), MemoryError> {
        let region = self.find_region(addr)?;
        let dev_addr = region.to_device_addr(addr);
        Ok(region.device.borrow_mut().set16(dev_addr, value)?)
    }
}
