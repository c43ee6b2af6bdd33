//! 工具模块

pub mod disasm;
pub mod dump;
mod image;
pub mod ringbuf;

pub use disasm::{disasm_at, disasm_buffer, disasm_instruction, disasm_with_details};
pub use image::load_image;
