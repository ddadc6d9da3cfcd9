// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Firmware-visible instruction trace, emitted by the debug shell while
//! `debug` is set.
//!
//! The format is `0x<pc>: \t<mnemonic>\t<operands>` followed by a
//! right-aligned annotation that starts with the ANSI cursor-positioning
//! sequence `\033[100D\033[65C` — move left 100 columns, then right 65 —
//! which lands the annotation in a fixed column regardless of how long the
//! disassembled line is.

use super::{Cpu, Disassembler};
use crate::core::memory::Bus;
use std::io::{self, Write};

/// Writes the cursor-positioning prefix used to right-align trace
/// annotations at a fixed column.
const ANNOTATION_PREFIX: &str = "\u{1b}[100D\u{1b}[65C";

/// Firmware execution tracer.
///
/// Writes one line per traced instruction to an arbitrary [`Write`] sink —
/// normally [`io::stdout`], but tests redirect it to an in-memory buffer.
pub struct CpuTracer<W: Write> {
    enabled: bool,
    output: W,
}

impl CpuTracer<io::Stdout> {
    /// Tracer that writes to the process's standard output, matching the
    /// console the rest of the firmware's UART output goes to.
    pub fn stdout() -> Self {
        Self {
            enabled: true,
            output: io::stdout(),
        }
    }
}

impl<W: Write> CpuTracer<W> {
    pub fn new(output: W) -> Self {
        Self {
            enabled: true,
            output,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disassemble and print the instruction at the CPU's current `pc`.
    /// Does not advance the CPU or touch the bus beyond the single fetch.
    pub fn trace(&mut self, cpu: &Cpu, bus: &mut Bus, annotation: &str) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let pc = cpu.pc();
        let instruction = bus.load_word(pc);
        let disasm = Disassembler::disassemble(instruction, pc);
        let mut mnemonic = disasm.as_str();
        let mut operands = "";
        if let Some(space) = disasm.find(' ') {
            mnemonic = &disasm[..space];
            operands = disasm[space + 1..].trim_start();
        }

        writeln!(
            self.output,
            "0x{:08x}: \t{}\t{}{}{}",
            pc, mnemonic, operands, ANNOTATION_PREFIX, annotation
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction_buf(cpu: &Cpu, bus: &mut Bus, annotation: &str) -> String {
        let mut out = Vec::new();
        let mut tracer = CpuTracer::new(&mut out);
        tracer.trace(cpu, bus, annotation).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nop_trace_contains_pc_and_mnemonic() {
        let cpu = Cpu::new();
        let mut bus = Bus::new();
        let line = instruction_buf(&cpu, &mut bus, "");
        assert!(line.starts_with("0x9fc00000: \tnop"));
    }

    #[test]
    fn annotation_is_appended_after_the_ansi_prefix() {
        let cpu = Cpu::new();
        let mut bus = Bus::new();
        let line = instruction_buf(&cpu, &mut bus, "r1=00000000");
        assert!(line.contains("\u{1b}[100D\u{1b}[65Cr1=00000000"));
    }

    #[test]
    fn disabled_tracer_writes_nothing() {
        let cpu = Cpu::new();
        let mut bus = Bus::new();
        let mut out = Vec::new();
        let mut tracer = CpuTracer::new(&mut out);
        tracer.set_enabled(false);
        tracer.trace(&cpu, &mut bus, "").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn splits_mnemonic_from_operands() {
        let mut bus = Bus::new();
        bus.store_word(0x9FC0_0000, 0x3C01_1234); // LUI r1, 0x1234
        let cpu = Cpu::new();
        let line = instruction_buf(&cpu, &mut bus, "");
        assert!(line.contains("\tlui\tr1, 0x1234"));
    }
}
