//! 内存映射设备 trait 定义

use thiserror::Error;

/// 设备错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("访问越界: 地址 {addr:#06x}, 宽度 {width}, 设备大小 {size:#x}")]
    OutOfRange { addr: u16, width: usize, size: usize },
    #[error("设备内部错误: {0}")]
    Internal(String),
}

/// 设备 trait
/// 所有可以挂到内存映射器上的部件（普通内存、外设）都必须实现此 trait
///
/// 地址均为设备本地地址（映射器完成地址转换之后的地址），
/// 16 位访问一律按大端序（高字节在低地址）。
pub trait Device {
    /// 读取一个字节
    fn get8(&mut self, addr: u16) -> Result<u8, DeviceError>;

    /// 写入一个字节
    fn set8(&mut self, addr: u16, value: u8) -> Result<(), DeviceError>;

    /// 读取一个 16 位字
    fn get16(&mut self, addr: u16) -> Result<u16, DeviceError>;

    /// 写入一个 16 位字
    fn set16(&mut self, addr: u16, value: u16) -> Result<(), DeviceError>;

    /// 获取设备名称（用于调试）
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Latch {
        value: u16,
    }

    impl Device for Latch {
        fn get8(&mut self, _addr: u16) -> Result<u8, DeviceError> {
            Ok(self.value as u8)
        }

        fn set8(&mut self, _addr: u16, value: u8) -> Result<(), DeviceError> {
            self.value = value as u16;
            Ok(())
        }

        fn get16(&mut self, _addr: u16) -> Result<u16, DeviceError> {
            Ok(self.value)
        }

        fn set16(&mut self, _addr: u16, value: u16) -> Result<(), DeviceError> {
            self.value = value;
            Ok(())
        }
    }

    #[test]
    fn test_default_name() {
        let latch = Latch { value: 0 };
        assert_eq!(latch.name(), "unknown");
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut dev: Box<dyn Device> = Box::new(Latch { value: 0 });
        dev.set16(0, 0xbeef).unwrap();
        assert_eq!(dev.get16(0).unwrap(), 0xbeef);
        assert_eq!(dev.get8(0).unwrap(), 0xef);
    }

    #[test]
    fn test_out_of_range_message() {
        let err = DeviceError::OutOfRange { addr: 0xffff, width: 2, size: 0x10000 };
        let msg = err.to_string();
        assert!(msg.contains("0xffff"));
        assert!(msg.contains("宽度 2"));
    }
}
