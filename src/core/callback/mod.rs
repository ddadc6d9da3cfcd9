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

//! PC-indexed firmware hooks and debug breakpoints.
//!
//! Entries are appended to a vector rather than a linked list — the model
//! calls for O(1) insert and an O(n) scan per step over an expected
//! population under 16, which a `Vec` satisfies without the indirection a
//! real linked list would add. Lookup walks the vector back-to-front so
//! the most recently inserted entry for a given address fires first,
//! preserving insertion-reverse dispatch order.

use std::io::Write as _;

use crate::core::cpu::Cpu;
use crate::core::memory::Bus;

/// A firmware-side hook or debug breakpoint, keyed by address in
/// [`CallbackTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Emit the NUL-terminated string at `GPR[5]`.
    PrintString,
    /// Emit a formatted string: `fmt` at `GPR[4]`, up to three arguments at
    /// `GPR[5]..GPR[7]`.
    PrintfString,
    /// Emit the low byte of `GPR[4]`.
    PrintChar,
    /// Pause the machine and enter the debug shell every time this address
    /// is hit.
    Breakpoint,
    /// Pause the machine once, then remove itself.
    OneShotBreakpoint,
}

/// Outcome of dispatching callbacks for one step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// At least one hook at this address requests the debug shell.
    pub enter_shell: bool,
}

pub struct CallbackTable {
    entries: Vec<(u32, Hook)>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, address: u32, hook: Hook) {
        self.entries.push((address, hook));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke every hook registered at `pc`, most-recently-inserted first.
    /// One-shot breakpoints are removed after firing.
    pub fn dispatch(&mut self, pc: u32, cpu: &Cpu, bus: &mut Bus) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let mut fired_one_shots = Vec::new();

        for idx in (0..self.entries.len()).rev() {
            let (address, hook) = self.entries[idx];
            if address != pc {
                continue;
            }
            match hook {
                Hook::PrintString => print_string(cpu, bus),
                Hook::PrintfString => printf_string(cpu, bus),
                Hook::PrintChar => print_char(cpu),
                Hook::Breakpoint => outcome.enter_shell = true,
                Hook::OneShotBreakpoint => {
                    outcome.enter_shell = true;
                    fired_one_shots.push(idx);
                }
            }
        }

        for idx in fired_one_shots {
            self.entries.remove(idx);
        }

        outcome
    }
}

impl Default for CallbackTable {
    fn default() -> Self {
        Self::new()
    }
}

fn read_c_string(bus: &mut Bus, mut addr: u32) -> String {
    let mut bytes = Vec::new();
    loop {
        let b = bus.load_byte(addr);
        if b == 0 || bytes.len() > 4096 {
            break;
        }
        bytes.push(b);
        addr = addr.wrapping_add(1);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn print_string(cpu: &Cpu, bus: &mut Bus) {
    let s = read_c_string(bus, cpu.reg(5));
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(s.as_bytes());
    let _ = stdout.flush();
}

fn print_char(cpu: &Cpu) {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(&[cpu.reg(4) as u8]);
    let _ = stdout.flush();
}

/// Walks `fmt` one byte at a time, substituting `%d`/`%u`/`%x`/%s`/`%c`/`%%`
/// from `GPR[5]..GPR[7]` in order. Every pointer argument is read through
/// the bus rather than cast directly, so malformed firmware pointers can
/// only ever read zeros, never crash the host process.
fn printf_string(cpu: &Cpu, bus: &mut Bus) {
    let fmt = read_c_string(bus, cpu.reg(4));
    let args = [cpu.reg(5), cpu.reg(6), cpu.reg(7)];
    let mut arg_idx = 0;
    let mut out = String::new();
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d') => {
                let v = args.get(arg_idx).copied().unwrap_or(0) as i32;
                out.push_str(&v.to_string());
                arg_idx += 1;
            }
            Some('u') => {
                let v = args.get(arg_idx).copied().unwrap_or(0);
                out.push_str(&v.to_string());
                arg_idx += 1;
            }
            Some('x') => {
                let v = args.get(arg_idx).copied().unwrap_or(0);
                out.push_str(&format!("{:x}", v));
                arg_idx += 1;
            }
            Some('c') => {
                let v = args.get(arg_idx).copied().unwrap_or(0) as u8 as char;
                out.push(v);
                arg_idx += 1;
            }
            Some('s') => {
                let addr = args.get(arg_idx).copied().unwrap_or(0);
                out.push_str(&read_c_string(bus, addr));
                arg_idx += 1;
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }

    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(out.as_bytes());
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_string_hook_reads_through_bus() {
        let mut bus = Bus::new();
        let msg = b"hi\0";
        for (i, b) in msg.iter().enumerate() {
            bus.store_byte(0x8000_0000 + i as u32, *b);
        }
        let mut cpu = Cpu::new();
        cpu.set_reg(5, 0x8000_0000);

        let mut table = CallbackTable::new();
        table.insert(cpu.pc(), Hook::PrintString);
        let outcome = table.dispatch(cpu.pc(), &cpu, &mut bus);
        assert!(!outcome.enter_shell);
    }

    #[test]
    fn one_shot_breakpoint_fires_once_then_is_removed() {
        let mut bus = Bus::new();
        let cpu = Cpu::new();
        let mut table = CallbackTable::new();
        table.insert(cpu.pc(), Hook::OneShotBreakpoint);

        let first = table.dispatch(cpu.pc(), &cpu, &mut bus);
        assert!(first.enter_shell);
        assert!(table.is_empty());

        let second = table.dispatch(cpu.pc(), &cpu, &mut bus);
        assert!(!second.enter_shell);
    }

    #[test]
    fn insertion_reverse_order_dispatches_most_recent_first() {
        let mut bus = Bus::new();
        let cpu = Cpu::new();
        let mut table = CallbackTable::new();
        table.insert(cpu.pc(), Hook::Breakpoint);
        table.insert(cpu.pc(), Hook::OneShotBreakpoint);

        let outcome = table.dispatch(cpu.pc(), &cpu, &mut bus);
        assert!(outcome.enter_shell);
        // The one-shot (inserted last, dispatched first) is gone; the
        // standing breakpoint remains.
        assert_eq!(table.len(), 1);
    }
}
