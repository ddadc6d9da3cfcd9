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

//! mips-emu: a user-space functional emulator for a 32-bit big-endian
//! MIPS CPU core running legacy cable-modem firmware images.
//!
//! # Architecture
//!
//! - [`core::memory`]: physical address bus — RAM, flash, fake-flash,
//!   MMIO dispatch, endian normalization.
//! - [`core::flash`]: the CFI + AMD auto-select flash command state machine.
//! - [`core::mmio`]: the fixed peripheral register map.
//! - [`core::cpu`]: the MIPS32 interpreter — GPR/HI/LO/PC, CP0, dispatch.
//! - [`core::interrupt`]: per-step IRQ aggregation and exception delivery.
//! - [`core::callback`]: the PC-indexed hook table backing breakpoints and
//!   firmware-side `puts`/`printf` interception.
//! - [`core::shell`]: the interactive debug REPL.
//! - [`core::machine`]: the top-level owner of every component above and
//!   its fetch-execute-retire loop.
//!
//! # Example
//!
//! ```no_run
//! use mips_emu::core::machine::{Machine, MachineConfig};
//!
//! let mut machine = Machine::new(MachineConfig::default())?;
//! let firmware_path = machine.config().firmware_path.clone();
//! machine.load_firmware_from_path(&firmware_path)?;
//! machine.run()?;
//! # Ok::<(), mips_emu::EmulatorError>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`], an alias for
//! `Result<T, EmulatorError>`. Most bus-level anomalies are not errors —
//! see [`core::error`] for the boundary between hard failures and the
//! diagnostics-only conditions the reference firmware expects to survive.

pub mod core;

pub use core::error::{EmulatorError, Result};
