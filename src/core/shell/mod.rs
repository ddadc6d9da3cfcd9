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

//! The interactive debug REPL entered whenever the machine is paused.
//!
//! Prompts with `MIPS> `, reads one line from standard input and returns a
//! [`ShellCommand`] for the machine loop to apply. The shell itself never
//! touches CPU or bus state beyond the one trace line `debug` asks for —
//! it only decides what the next step of the loop should do.

use std::io::{self, BufRead, Write};

/// One parsed line from the debug prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `run`: resume without tracing.
    Run,
    /// `drun`: resume with tracing.
    DebugRun,
    /// `step` / `s`: execute exactly one instruction, staying paused.
    Step,
    /// `next`: run until `pc + 4` of the current instruction is reached.
    Next,
    /// `bp <addr>`: pause whenever `addr` is reached.
    Breakpoint(u32),
    /// Anything else: the reference firmware shell treats this as fatal.
    Unrecognized(String),
}

pub struct Shell<R, W> {
    input: R,
    output: W,
}

impl Shell<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: io::BufReader::new(io::stdin()),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print the `MIPS> ` prompt and read one command line. Returns `Ok(None)`
    /// on EOF (the host closed stdin), matching a clean shutdown rather than
    /// a parse failure.
    pub fn read_command(&mut self) -> io::Result<Option<ShellCommand>> {
        write!(self.output, "MIPS> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(parse_command(line.trim())))
    }
}

fn parse_command(line: &str) -> ShellCommand {
    if line == "run" {
        return ShellCommand::Run;
    }
    if line == "drun" {
        return ShellCommand::DebugRun;
    }
    if line == "step" || line == "s" {
        return ShellCommand::Step;
    }
    if line == "next" {
        return ShellCommand::Next;
    }
    if let Some(rest) = line.strip_prefix("bp ") {
        return match parse_c_long(rest.trim()) {
            Some(addr) => ShellCommand::Breakpoint(addr),
            None => ShellCommand::Unrecognized(line.to_string()),
        };
    }
    ShellCommand::Unrecognized(line.to_string())
}

/// Mimics C's `strtol(s, NULL, 0)`: a `0x`/`0X` prefix selects hex, a bare
/// leading `0` selects octal, anything else is decimal.
fn parse_c_long(s: &str) -> Option<u32> {
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if s.len() > 1 && s.starts_with('0') {
        u32::from_str_radix(&s[1..], 8).ok()?
    } else {
        s.parse::<u32>().ok()?
    };
    Some(if negative { value.wrapping_neg() } else { value })
}
