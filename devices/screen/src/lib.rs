//! 终端屏幕设备实现
//!
//! 16 列的字符网格。按字写入时：
//! - 高字节: 命令（0xFF 清屏, 0x01 粗体, 0x02 复位属性, 0x03 蓝色, 0x04 红色）
//! - 低字节: 要显示的字符
//!
//! 读操作恒返回 0，按字节写入被忽略。

use device_trait::{Device, DeviceError};
use std::io::{self, Write};

const SCREEN_COLUMNS: u16 = 16;

const CMD_ERASE: u8 = 0xff;
const CMD_BOLD: u8 = 0x01;
const CMD_RESET: u8 = 0x02;
const CMD_BLUE: u8 = 0x03;
const CMD_RED: u8 = 0x04;

const ANSI_ERASE: &str = "\x1b[2J";
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_BLUE: &str = "\x1b[34m";
const ANSI_RED: &str = "\x1b[31m";

/// 屏幕设备
pub struct Screen<W: Write> {
    name: String,
    out: W,
}

impl Screen<io::Stdout> {
    /// 创建输出到标准输出的屏幕设备
    pub fn stdout(name: String) -> Self {
        Self::new(name, io::stdout())
    }
}

impl<W: Write> Screen<W> {
    /// 创建输出到任意 Write 的屏幕设备
    pub fn new(name: String, out: W) -> Self {
        Self { name, out }
    }

    /// 取回输出端
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, s: &str) -> Result<(), DeviceError> {
        self.out
            .write_all(s.as_bytes())
            .map_err(|e| DeviceError::Internal(format!("屏幕输出错误: {}", e)))
    }
}

impl<W: Write> Device for Screen<W> {
    fn get8(&mut self, _addr: u16) -> Result<u8, DeviceError> {
        Ok(0)
    }

    fn set8(&mut self, _addr: u16, _value: u8) -> Result<(), DeviceError> {
        Ok(())
    }

    fn get16(&mut self, _addr: u16) -> Result<u16, DeviceError> {
        Ok(0)
    }

    fn set16(&mut self, addr: u16, value: u16) -> Result<(), DeviceError> {
        let cmd = (value >> 8) as u8;
        let ch = (value & 0x00ff) as u8;

        match cmd {
            CMD_ERASE => self.emit(ANSI_ERASE)?,
            CMD_BOLD => self.emit(ANSI_BOLD)?,
            CMD_RESET => self.emit(ANSI_RESET)?,
            CMD_BLUE => self.emit(ANSI_BLUE)?,
            CMD_RED => self.emit(ANSI_RED)?,
            _ => {}
        }

        let x = (addr % SCREEN_COLUMNS + 1) * 2;
        let y = addr / SCREEN_COLUMNS + 1;
        self.emit(&format!("\x1b[{};{}H", y, x))?;
        self.emit(&char::from(ch).to_string())?;
        self.out
            .flush()
            .map_err(|e| DeviceError::Internal(format!("屏幕刷新错误: {}", e)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
