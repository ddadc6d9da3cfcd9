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

//! The top-level owner of every emulated component and its
//! fetch-execute-retire loop.
//!
//! Per step, in order: interrupt evaluation, callback dispatch, shell
//! interaction (only while paused), fetch/decode/execute via [`Cpu::step`],
//! then the CP0 `Count` tick. This ordering decides whether an exception
//! is taken before or after the instruction that would have faulted, and
//! is load-bearing for the timer-interrupt scenario in the test suite.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::callback::{CallbackTable, Hook};
use crate::core::cpu::{Cpu, CpuTracer, RESET_PC};
use crate::core::error::{EmulatorError, Result};
use crate::core::interrupt::InterruptEngine;
use crate::core::memory::Bus;
use crate::core::shell::{Shell, ShellCommand};

/// Startup configuration. The reference takes no command-line flags at
/// all; every field here defaults to its literal startup value and is
/// only ever overridden by an optional `mips-emu.toml` next to `fw.bin`
/// (see [`Self::load`]), never by `argv`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Firmware image loaded at reset, matching the hardcoded `fw.bin` the
    /// reference reads from the working directory.
    pub firmware_path: PathBuf,
    /// Initial program counter, normally the start of flash in kseg1.
    pub reset_pc: u32,
    /// RAM window size in bytes, normally 32 MiB.
    pub ram_size: usize,
    /// Enter the debug shell immediately instead of running free.
    #[serde(skip)]
    pub start_paused: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            firmware_path: PathBuf::from("fw.bin"),
            reset_pc: RESET_PC,
            ram_size: 0x0200_0000,
            start_paused: false,
        }
    }
}

impl MachineConfig {
    /// Reads `mips-emu.toml` from `dir` if present, falling back to
    /// [`Default::default`] when it is absent — the same
    /// discover-then-fallback shape the teacher crate uses for its own
    /// environment configuration, just sourced from a file instead of
    /// `.env`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("mips-emu.toml");
        match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|err| EmulatorError::InvalidConfig(err.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(EmulatorError::Io(err)),
        }
    }
}

pub struct Machine {
    config: MachineConfig,
    cpu: Cpu,
    bus: Bus,
    interrupts: InterruptEngine,
    callbacks: CallbackTable,
    shell: Shell<io::BufReader<io::Stdin>, io::Stdout>,
    tracer: CpuTracer<io::Stdout>,
    run: bool,
    debug: bool,
    step: bool,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Result<Self> {
        let run = !config.start_paused;
        let cpu = Cpu::with_reset_pc(config.reset_pc);
        let bus = Bus::with_ram_size(config.ram_size);
        Ok(Self {
            config,
            cpu,
            bus,
            interrupts: InterruptEngine::new(),
            callbacks: CallbackTable::new(),
            shell: Shell::stdio(),
            tracer: CpuTracer::stdout(),
            run,
            debug: false,
            step: false,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Wire a firmware-side hook at a fixed address — the only way
    /// `print_string`/`printf_string`/`print_char`/breakpoint entry points
    /// get registered before [`Self::run`] starts.
    pub fn register_hook(&mut self, address: u32, hook: Hook) {
        self.callbacks.insert(address, hook);
    }

    pub fn load_firmware_from_path(&mut self, path: &Path) -> Result<()> {
        let data = std::fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => EmulatorError::FirmwareNotFound(path.to_path_buf()),
            _ => EmulatorError::Io(err),
        })?;
        self.bus.load_firmware(&data);
        Ok(())
    }

    fn annotation(&self) -> String {
        format!(
            "hi={:08x} lo={:08x} cause={:08x}",
            self.cpu.hi(),
            self.cpu.lo(),
            self.cpu.cause()
        )
    }

    /// Run until the debug shell sees EOF on standard input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.interrupts.evaluate(&mut self.cpu, &mut self.bus);

            let pc = self.cpu.pc();
            let outcome = self.callbacks.dispatch(pc, &self.cpu, &mut self.bus);
            if outcome.enter_shell {
                self.run = false;
            }

            if !self.run {
                if self.debug {
                    let annotation = self.annotation();
                    self.tracer.trace(&self.cpu, &mut self.bus, &annotation)?;
                }
                match self.shell.read_command()? {
                    None => return Ok(()),
                    Some(command) => {
                        if !self.apply_command(command) {
                            continue;
                        }
                    }
                }
            } else if self.debug {
                let annotation = self.annotation();
                self.tracer.trace(&self.cpu, &mut self.bus, &annotation)?;
            }

            self.cpu.step(&mut self.bus);

            let timer_matched = self.cpu.tick_timer();
            self.interrupts.notify_timer_match(timer_matched);
            if timer_matched {
                self.bus.mmio_mut().notify_timer_tick();
            }

            if self.step {
                self.step = false;
                self.run = false;
            }
        }
    }

    /// Apply a parsed shell command. Returns whether the loop should go on
    /// to fetch this iteration (`false` re-prompts without stepping, the
    /// behavior `bp` wants).
    fn apply_command(&mut self, command: ShellCommand) -> bool {
        match command {
            ShellCommand::Run => {
                self.run = true;
                self.debug = false;
                true
            }
            ShellCommand::DebugRun => {
                self.run = true;
                self.debug = true;
                true
            }
            ShellCommand::Step => {
                self.step = true;
                self.debug = true;
                true
            }
            ShellCommand::Next => {
                let target = self.cpu.pc().wrapping_add(4);
                self.callbacks.insert(target, Hook::OneShotBreakpoint);
                self.run = true;
                true
            }
            ShellCommand::Breakpoint(addr) => {
                self.callbacks.insert(addr, Hook::OneShotBreakpoint);
                false
            }
            ShellCommand::Unrecognized(cmd) => {
                log::error!("unrecognized shell command: {:?}", cmd);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_fw_bin() {
        let config = MachineConfig::default();
        assert_eq!(config.firmware_path, PathBuf::from("fw.bin"));
        assert!(!config.start_paused);
    }

    #[test]
    fn missing_firmware_reports_not_found() {
        let mut machine = Machine::new(MachineConfig::default()).unwrap();
        let err = machine
            .load_firmware_from_path(Path::new("/nonexistent/does-not-exist.bin"))
            .unwrap_err();
        assert!(matches!(err, EmulatorError::FirmwareNotFound(_)));
    }

    #[test]
    fn reset_state_matches_flash_entry_point() {
        let machine = Machine::new(MachineConfig::default()).unwrap();
        assert_eq!(machine.cpu().pc(), crate::core::cpu::RESET_PC);
    }

    #[test]
    fn load_reads_overrides_from_toml_next_to_firmware() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mips-emu.toml"),
            "firmware_path = \"alt.bin\"\nreset_pc = 0x80001000\nram_size = 4194304\n",
        )
        .unwrap();

        let config = MachineConfig::load(dir.path()).unwrap();

        assert_eq!(config.firmware_path, PathBuf::from("alt.bin"));
        assert_eq!(config.reset_pc, 0x8000_1000);
        assert_eq!(config.ram_size, 0x0040_0000);
    }

    #[test]
    fn load_falls_back_to_defaults_without_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = MachineConfig::load(dir.path()).unwrap();
        assert_eq!(config.firmware_path, MachineConfig::default().firmware_path);
    }

    #[test]
    fn load_reports_invalid_config_on_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mips-emu.toml"), "not valid toml {{{").unwrap();
        let err = MachineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EmulatorError::InvalidConfig(_)));
    }
}
