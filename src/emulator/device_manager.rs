//! 设备管理模块
//! 负责根据配置文件创建设备并组装地址空间

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

use super::{Memory, MemoryMapper, RegionId, SharedDevice, SharedMapper};
use crate::const_values::{DeviceConfig, EmuConfig};

/// 设备工厂错误
#[derive(Debug, thiserror::Error)]
pub enum DeviceFactoryError {
    #[error("未知设备类型: {0}")]
    UnknownDeviceType(String),
}

/// 设备工厂
pub struct DeviceFactory;

impl DeviceFactory {
    /// 根据配置创建设备
    pub fn create_device(config: &DeviceConfig) -> Result<SharedDevice, DeviceFactoryError> {
        match config.device_type.as_str() {
            "ram" => {
                // 不重映射时设备看到的是原始地址，需要覆盖到 end
                let size = if config.remap {
                    config.end.saturating_sub(config.start) as usize + 1
                } else {
                    config.end as usize + 1
                };
                Ok(Rc::new(RefCell::new(Memory::new(size))))
            }
            "screen" => Ok(Rc::new(RefCell::new(screen::Screen::stdout(
                config.name.clone(),
            )))),
            _ => Err(DeviceFactoryError::UnknownDeviceType(config.device_type.clone())),
        }
    }
}

/// 设备管理器
pub struct DeviceManager;

impl DeviceManager {
    /// 按配置顺序映射所有启用的设备，返回各区域句柄
    pub fn initialize_devices(
        mapper: &mut MemoryMapper,
        device_configs: &[DeviceConfig],
    ) -> Result<Vec<RegionId>> {
        let mut regions = Vec::new();
        for config in device_configs {
            if !config.enabled {
                warn!("跳过禁用的设备: {}", config.name);
                continue;
            }

            info!(
                "初始化设备: {} (类型: {}, 地址: {:#06x}..={:#06x})",
                config.name, config.device_type, config.start, config.end
            );

            let device = DeviceFactory::create_device(config)
                .with_context(|| format!("创建设备 {} 失败", config.name))?;
            let id = mapper
                .map(device, config.start, config.end, config.remap)
                .with_context(|| format!("映射设备 {} 失败", config.name))?;
            regions.push(id);
        }
        Ok(regions)
    }

    /// 组装地址空间：主内存映射到 0，之后依次映射配置中的设备
    pub fn build_address_space(config: &EmuConfig) -> Result<SharedMapper> {
        let mut mapper = MemoryMapper::new();
        let size = config.memory.size;
        let end = size
            .checked_sub(1)
            .and_then(|last| u16::try_from(last).ok())
            .with_context(|| format!("主内存大小 {:#x} 超出 16 位地址空间", size))?;
        mapper
            .map(Rc::new(RefCell::new(Memory::new(size))), 0, end, true)
            .context("映射主内存失败")?;
        info!("主内存: {:#06x}..={:#06x}", 0, end);

        Self::initialize_devices(&mut mapper, &config.devices)?;
        Ok(Rc::new(RefCell::new(mapper)))
    }
}
