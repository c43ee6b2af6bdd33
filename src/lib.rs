//! 16 位寄存器机模拟器库
pub mod const_values;
pub mod emulator;
pub mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use const_values::{DEFAULT_SCREEN_BASE, EmuConfig};
use emulator::device_manager::DeviceManager;
use emulator::instructions::Opcode;
use emulator::instructions::encode::{EncodeError, Operand, Program};
use emulator::{Cpu, ExecState, Register};
use utils::dump;

#[cfg(feature = "tracer")]
use emulator::tracer::TracerArgs;

/// 16 位寄存器机模拟器
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 程序映像路径（原始字节），不指定时运行内置的屏幕演示
    #[arg(short, long)]
    pub image: Option<String>,

    /// 配置文件地址
    #[arg(short, long, default_value = "profile/config.toml")]
    pub config: String,

    /// 加载地址，覆盖配置文件中的 memory.origin（支持 0x 前缀）
    #[arg(short, long, value_parser = parse_addr)]
    pub origin: Option<u16>,

    /// 最多执行的指令条数
    #[arg(short, long)]
    pub max_steps: Option<usize>,

    /// 每条指令后打印寄存器差异
    #[arg(long, default_value_t = false)]
    pub dump_regs: bool,

    /// 追踪器参数
    #[cfg(feature = "tracer")]
    #[command(flatten)]
    pub tracer: TracerArgs,
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("无效的地址 '{}': {}", s, e))
}

/// 相对路径按 crate 目录解析
fn resolve_config_path(path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
    }
}

/// 内置演示：清屏后用红蓝交替的 `*` 填满 16x16 的屏幕
pub fn screen_demo(screen_base: u16) -> Result<Program, EncodeError> {
    let mut prog = Program::new();
    let put = |prog: &mut Program, cmd: u8, ch: u8, position: u8| -> Result<(), EncodeError> {
        let word = u16::from_be_bytes([cmd, ch]);
        let addr = screen_base.wrapping_add(position as u16);
        prog.push(Opcode::MovLitReg, &[Operand::Lit16(word), Operand::Reg(Register::R1)])?
            .push(Opcode::MovRegMem, &[Operand::Reg(Register::R1), Operand::Addr16(addr)])?;
        Ok(())
    };

    put(&mut prog, 0xff, b' ', 0)?;
    for position in 0..=0xffu8 {
        let cmd = if position % 2 == 0 { 0x03 } else { 0x04 };
        put(&mut prog, cmd, b'*', position)?;
    }
    prog.push(Opcode::Hlt, &[])?;
    Ok(prog)
}

pub fn build_emu_run_blocking(args: Args) -> Result<()> {
    let config_path = resolve_config_path(&args.config);
    let config = EmuConfig::new(&config_path)?;
    info!(path = %config_path.display(), "加载配置文件");

    let mapper = DeviceManager::build_address_space(&config)?;
    let mut cpu = Cpu::with_config(mapper, &config.cpu);
    info!(stack_guard = cpu.stack_guard(), "创建处理器");
    let origin = args.origin.unwrap_or(config.memory.origin);

    if let Some(image) = &args.image {
        info!(path = %image, "加载程序映像");
        utils::load_image(&mut cpu, image, origin)?;
    } else {
        let screen_base = config.screen_base().unwrap_or_else(|| {
            warn!("配置中没有启用的屏幕设备，演示程序写入 {:#06x}", DEFAULT_SCREEN_BASE);
            DEFAULT_SCREEN_BASE
        });
        info!("未指定程序映像，运行内置屏幕演示 (屏幕地址 {:#06x})", screen_base);
        let demo = screen_demo(screen_base).context("无法生成演示程序")?;
        cpu.load_program(origin, demo.bytes())
            .with_context(|| format!("无法把演示程序写入地址 {:#06x}", origin))?;
    }

    // 初始化全局追踪器
    #[cfg(feature = "tracer")]
    emulator::tracer::init_global_tracer(args.tracer.clone(), config.debug.trace_size);

    let limit = args.max_steps.unwrap_or(usize::MAX);
    let mut executed = 0usize;
    let result = cpu.run_with(|cpu| {
        if args.dump_regs {
            if let Some(diff) = cpu.debug_diff(dump::Unchanged::Hide) {
                println!("{}", diff);
            }
        }
        if executed >= limit {
            return ControlFlow::Break(());
        }
        executed += 1;
        ControlFlow::Continue(())
    });

    #[cfg(feature = "tracer")]
    {
        use crate::emulator::tracer::destroy_global_tracer;
        if let Some(log) = emulator::tracer::global_get_log() {
            info!("追踪日志:\n{}", log);
        } else {
            info!("没有追踪日志");
        }
        destroy_global_tracer();
    }

    match result {
        Ok(count) => {
            if cpu.exec_state() != ExecState::End {
                warn!("达到最大执行条数 {}, 未遇到 HLT", limit);
            }
            info!(instructions = count, "执行结束");
            info!("最终寄存器状态:\n{}", cpu);
            Ok(())
        }
        Err(e) => {
            error!("执行过程中出现错误: {}", e);
            error!("CPU状态:\n{}", cpu);
            Err(e).context("模拟器执行失败")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::test_util::cpu_with_program;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("0x0100"), Ok(0x0100));
        assert_eq!(parse_addr("256"), Ok(256));
        assert!(parse_addr("0x10000").is_err());
        assert!(parse_addr("zz").is_err());
    }

    #[test]
    fn test_screen_demo_runs_to_halt() {
        let demo = screen_demo(0x3000).unwrap();
        // 257 次写屏，每次 8 字节，外加 HLT
        assert_eq!(demo.len(), 257 * 8 + 1);
        let mut cpu = cpu_with_program(&demo);
        assert_eq!(cpu.run().unwrap(), 257 * 2 + 1);
        // 这里没有映射屏幕设备，最后一次写入落在内存里
        assert_eq!(cpu.read16(0x30ff).unwrap(), 0x042a);
    }

    #[test]
    fn test_screen_demo_follows_configured_base() {
        let config = EmuConfig::parse(
            r#"
[[devices]]
name = "screen"
type = "screen"
start = 0x4000
end = 0x40ff
"#,
        )
        .unwrap();
        let base = config.screen_base().unwrap_or(DEFAULT_SCREEN_BASE);
        let mut cpu = cpu_with_program(&screen_demo(base).unwrap());
        cpu.run().unwrap();
        assert_eq!(cpu.read16(0x40ff).unwrap(), 0x042a);
        assert_eq!(cpu.read16(0x30ff).unwrap(), 0);
    }

    #[test]
    fn test_default_profile_parses() {
        let config = EmuConfig::new(resolve_config_path("profile/config.toml")).unwrap();
        assert_eq!(config.memory.size, 0x10000);
        assert_eq!(config.screen_base(), Some(DEFAULT_SCREEN_BASE));
    }
}
