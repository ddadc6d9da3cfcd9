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

//! mips-emu entry point.
//!
//! Takes no command-line flags: the firmware image is `fw.bin` in the
//! working directory, optionally overridden by a `mips-emu.toml` next to
//! it (see [`mips_emu::core::machine::MachineConfig::load`]).

use mips_emu::core::machine::{Machine, MachineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cwd = std::env::current_dir()?;
    let config = MachineConfig::load(&cwd)?;

    log::info!("loading firmware from {}", config.firmware_path.display());

    let mut machine = Machine::new(config)?;
    let firmware_path = machine.config().firmware_path.clone();
    machine.load_firmware_from_path(&firmware_path)?;

    machine.run()?;

    Ok(())
}
