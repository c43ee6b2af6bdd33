//! 原始程序映像加载

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::emulator::Cpu;

/// 把映像文件逐字节写入地址空间的 `origin` 处，并把 ip 指向 `origin`
///
/// 映像超出 `origin` 之后的地址空间时报错，不写入任何字节；返回写入的字节数
pub fn load_image(cpu: &mut Cpu, path: impl AsRef<Path>, origin: u16) -> Result<usize> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("无法读取程序映像 '{}'", path.display()))?;

    cpu.load_program(origin, &data).with_context(|| {
        format!(
            "无法把 '{}' 写入地址 {:#06x} ({} 字节)",
            path.display(),
            origin,
            data.len()
        )
    })?;
    info!(path = %path.display(), size = data.len(), "加载程序映像到 {:#06x}", origin);
    Ok(data.len())
}
