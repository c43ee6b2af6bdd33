//! 调试输出：寄存器表、寄存器差异、内存视图

use colored::Colorize;

use crate::emulator::{REGISTER_COUNT, Register};

/// 差异输出中未变化寄存器的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unchanged {
    #[default]
    Hide,
    Dim,
    Show,
}

const NAME_WIDTH: usize = 3;

/// 全部寄存器，每行四个
pub fn register_table(snapshot: &[u16; REGISTER_COUNT]) -> String {
    let mut out = String::new();
    for (i, reg) in Register::ALL.iter().enumerate() {
        out += &format!("{:>w$}: {:#06x}", reg.name(), snapshot[i], w = NAME_WIDTH);
        out += if (i + 1) % 4 == 0 { "\n" } else { "    " };
    }
    out.trim_end().to_string()
}

/// 类似 unified diff 的寄存器差异：旧值红色 `-`，新值绿色 `+`
pub fn register_diff(
    prev: &[u16; REGISTER_COUNT],
    curr: &[u16; REGISTER_COUNT],
    unchanged: Unchanged,
) -> String {
    let mut lines = vec![
        "--- prev".bold().bright_black().to_string(),
        "+++ curr".bold().bright_black().to_string(),
    ];
    for reg in Register::ALL {
        let (old, new) = (prev[reg.index()], curr[reg.index()]);
        let name = format!("{:<w$}", reg.name(), w = NAME_WIDTH);
        if old == new {
            let line = format!(" {}: {:#06x}", name, new);
            match unchanged {
                Unchanged::Hide => {}
                Unchanged::Dim => lines.push(line.dimmed().to_string()),
                Unchanged::Show => lines.push(line),
            }
            continue;
        }
        lines.push(format!("-{}: {:#06x}", name, old).red().to_string());
        lines.push(format!("+{}: {:#06x}", name, new).green().to_string());
    }
    lines.join("\n")
}

/// 一行内存视图：地址、十六进制字节、可打印 ASCII
pub fn memory_view(addr: u16, bytes: &[u8]) -> String {
    let hex_col = bytes
        .iter()
        .map(|&b| {
            let text = hex::encode([b]);
            if b == 0 { text.dimmed().to_string() } else { text.green().to_string() }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let ascii_col: String = bytes
        .iter()
        .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
        .collect();
    format!(
        "{}: {}  {}",
        format!("{:#06x}", addr).blue(),
        hex_col,
        format!("|{}|", ascii_col).dimmed()
    )
}
