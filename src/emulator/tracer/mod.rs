//! 执行追踪（`tracer` feature）

mod itracer;

pub use itracer::ITracer;

use clap::Args;
use std::sync::{Mutex, OnceLock};

use super::Cpu;

static GLOBAL_TRACER: OnceLock<Mutex<Option<Tracer>>> = OnceLock::new();

/// 初始化全局追踪器，`capacity` 为每个追踪器保留的记录条数
pub fn init_global_tracer(args: TracerArgs, capacity: usize) {
    GLOBAL_TRACER.get_or_init(|| {
        let mut tracer = Tracer::new();
        tracer.add_tracers(args, capacity);
        Mutex::new(Some(tracer))
    });
}

/// 全局追踪入口，在每条指令执行前调用；未初始化时什么也不做
pub fn global_trace(cpu: &Cpu) {
    if let Some(tracer) = GLOBAL_TRACER.get() {
        if let Ok(mut tracer) = tracer.lock() {
            if let Some(ref mut t) = *tracer {
                t.trace(cpu);
            }
        }
    }
}

/// 获取全局追踪日志
pub fn global_get_log() -> Option<String> {
    match GLOBAL_TRACER.get() {
        Some(tracer) => {
            if let Ok(tracer) = tracer.lock() {
                if let Some(ref t) = *tracer {
                    return Some(t.print_log());
                }
            }
        }
        None => {
            tracing::warn!("全局追踪器未初始化，请先调用 init_global_tracer");
        }
    }
    None
}

/// 销毁全局追踪器
pub fn destroy_global_tracer() {
    if let Some(tracer) = GLOBAL_TRACER.get() {
        if let Ok(mut tracer) = tracer.lock() {
            *tracer = None;
        }
    } else {
        tracing::warn!("全局追踪器未初始化，无法销毁");
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TracerArgs {
    /// 启用指令追踪器
    #[arg(long, default_value_t = false)]
    pub enable_itracer: bool,
}

/// 统一的追踪器入口
#[derive(Default)]
pub struct Tracer {
    tracers: Vec<Box<dyn TracerTrace>>,
}

trait TracerTrace: Send + Sync {
    /// 追踪器名称
    fn name(&self) -> &'static str;

    /// 记录即将执行的指令
    fn trace(&mut self, cpu: &Cpu);

    /// 追踪日志
    fn log(&self) -> String;
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tracers(&mut self, args: TracerArgs, capacity: usize) {
        if args.enable_itracer {
            self.tracers.push(Box::new(ITracer::new(capacity)));
        }
    }

    pub fn trace(&mut self, cpu: &Cpu) {
        for tracer in &mut self.tracers {
            tracer.trace(cpu);
        }
    }

    pub fn print_log(&self) -> String {
        let mut log = String::new();
        for tracer in &self.tracers {
            log += &format!("Tracer: {}\n", tracer.name());
            log += &tracer.log();
        }
        log
    }
}
