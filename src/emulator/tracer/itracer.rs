use crate::emulator::instructions;
use crate::emulator::tracer::TracerTrace;
use crate::emulator::{Cpu, Register};
use crate::utils::disasm::{MAX_INSTRUCTION_SIZE, disasm_with_details};
use crate::utils::ringbuf::RingBuffer;

/// 一条被追踪的指令
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    pc: u16,
    bytes: [u8; MAX_INSTRUCTION_SIZE],
    len: usize,
}

/// 指令追踪器，保留最近执行的若干条指令
pub struct ITracer {
    entries: RingBuffer<Entry>,
}

impl ITracer {
    pub fn new(capacity: usize) -> Self {
        ITracer {
            entries: RingBuffer::new(capacity),
        }
    }
}

impl TracerTrace for ITracer {
    fn name(&self) -> &'static str {
        "ITracer"
    }

    fn trace(&mut self, cpu: &Cpu) {
        let pc = cpu.reg(Register::Ip);
        let Ok(opcode) = cpu.read8(pc) else {
            return;
        };
        let size = instructions::lookup(opcode).map_or(1, |inst| inst.size());

        let mut entry = Entry { pc, ..Default::default() };
        entry.bytes[0] = opcode;
        entry.len = 1;
        for i in 1..size {
            match cpu.read8(pc.wrapping_add(i as u16)) {
                Ok(byte) => {
                    entry.bytes[i] = byte;
                    entry.len += 1;
                }
                Err(_) => break,
            }
        }
        self.entries.push_overwrite(entry);
    }

    fn log(&self) -> String {
        let mut log = String::new();
        for entry in self.entries.iter() {
            let (line, _) = disasm_with_details(&entry.bytes[..entry.len], entry.pc);
            log += &line;
            log.push('\n');
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::instructions::Opcode;
    use crate::emulator::instructions::encode::{Operand, Program};
    use crate::emulator::test_util::cpu_with_program;

    #[test]
    fn test_keeps_last_instructions() {
        let mut prog = Program::new();
        for value in 0..4 {
            prog.push(Opcode::PshLit, &[Operand::Lit16(value)]).unwrap();
        }
        let mut cpu = cpu_with_program(&prog);
        let mut tracer = ITracer::new(2);
        for _ in 0..4 {
            tracer.trace(&cpu);
            cpu.step().unwrap();
        }

        let log = tracer.log();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x0006"));
        assert!(lines[0].ends_with("PSH_LIT 0x0002"));
        assert!(lines[1].ends_with("PSH_LIT 0x0003"));
    }
}
