//! 配置文件与默认值

use anyhow::{self, Context};
use serde::Deserialize;
use std::path::Path;

/// 16 位地址空间的大小
pub const ADDRESS_SPACE_SIZE: usize = 0x10000;

/// 配置中没有屏幕设备时演示程序使用的屏幕地址
pub const DEFAULT_SCREEN_BASE: u16 = 0x3000;

/// 指令追踪器默认保留的记录条数
pub const DEFAULT_TRACE_SIZE: usize = 32;

fn default_memory_size() -> usize {
    ADDRESS_SPACE_SIZE
}

fn default_trace_size() -> usize {
    DEFAULT_TRACE_SIZE
}

fn default_true() -> bool {
    true
}

/// 主内存
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    /// 映射到 0 处的主内存字节数
    #[serde(default = "default_memory_size")]
    pub size: usize,
    /// 程序加载地址，也是 ip 的初值
    #[serde(default)]
    pub origin: u16,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: default_memory_size(),
            origin: 0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuConfig {
    /// 压栈越过 0x0000 或出栈越过 0xffff 时报错，而不是回绕
    #[serde(default)]
    pub stack_guard: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    #[serde(default = "default_trace_size")]
    pub trace_size: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            trace_size: default_trace_size(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub start: u16,
    pub end: u16,
    #[serde(default = "default_true")]
    pub remap: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// 主模拟器配置（profile/config.toml）
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EmuConfig {
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub cpu: CpuConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    /// 按文件顺序映射，靠后的设备覆盖靠前的
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl EmuConfig {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<EmuConfig> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取主配置文件: {:?}", &path.as_ref().as_os_str()))?;
        Self::parse(&toml_str)
            .with_context(|| format!("无法解析主配置文件: {:?}", &path.as_ref().as_os_str()))
    }

    pub fn parse(toml_str: &str) -> anyhow::Result<EmuConfig> {
        let config: EmuConfig = toml::from_str(toml_str)?;
        config.validate()?;
        anyhow::Ok(config)
    }

    /// 第一个启用的屏幕设备的起始地址
    pub fn screen_base(&self) -> Option<u16> {
        self.devices
            .iter()
            .find(|dev| dev.enabled && dev.device_type == "screen")
            .map(|dev| dev.start)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.memory.size == 0 || self.memory.size > ADDRESS_SPACE_SIZE {
            anyhow::bail!(
                "主内存大小 {:#x} 超出范围 (1..={:#x})",
                self.memory.size,
                ADDRESS_SPACE_SIZE
            );
        }
        for dev in &self.devices {
            if dev.start > dev.end {
                anyhow::bail!(
                    "设备 {} 的地址范围无效: {:#06x}..={:#06x}",
                    dev.name,
                    dev.start,
                    dev.end
                );
            }
        }
        Ok(())
    }
}
