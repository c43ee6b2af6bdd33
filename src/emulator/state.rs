//! 执行状态

/// 执行引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecState {
    /// 空闲，等待下一次执行
    #[default]
    Idle,
    /// 正在执行
    Running,
    /// 执行结束（遇到 HLT）
    End,
}

/// 单条指令产生的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Event {
    #[default]
    None,
    /// HLT
    Halted,
}
