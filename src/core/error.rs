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

//! Crate-wide error type
//!
//! Only conditions that must actually terminate the emulator are
//! represented here. Soft bus diagnostics (unmapped access, misaligned
//! access, an out-of-sequence flash command) are not errors — the
//! interpreter logs them and continues, exactly as the firmware expects.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Conditions that stop the emulator outright.
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// `fw.bin` (or the configured firmware path) does not exist.
    #[error("firmware image not found: {0}")]
    FirmwareNotFound(PathBuf),

    /// The configured firmware path named a file larger than the flash window.
    #[error("firmware image too large: flash window holds {max} bytes, got {got}")]
    InvalidFirmwareSize { max: usize, got: usize },

    /// COP1/COP2, an unknown major opcode, or an unimplemented SPECIAL2
    /// subfunction. This is fatal per the reference implementation.
    #[error("unimplemented instruction 0x{word:08x} at pc 0x{pc:08x}")]
    UnimplementedInstruction { pc: u32, word: u32 },

    /// The debug shell read a line it can't parse while single-stepping.
    #[error("unrecognized shell command: {0:?}")]
    UnrecognizedShellCommand(String),

    /// Malformed `mips-emu.toml`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Propagated from firmware load, shell stdin, or stdout flush.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
