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

//! Address decoding for the physical memory bus.
//!
//! Decoding order (applied before every access, see [`Bus::identify_region`]):
//! MMIO is checked against the raw virtual address first, since its range
//! sits entirely above the kseg fold bit; everything else is checked after
//! folding kseg1 onto kseg0 by clearing bit `0x2000_0000`.

use super::Bus;

/// Which backing store an address resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM.
    Ram,
    /// Flash, addressed directly.
    Flash,
    /// The fake-flash alias window — routes to flash with a translated offset.
    FakeFlash,
    /// Memory-mapped peripheral registers.
    Mmio,
    /// No backing device; loads read 0, stores are dropped.
    Unmapped,
}

impl Bus {
    /// Clear the kseg0/kseg1 fold bit. MMIO addresses are decoded before
    /// this is applied since their range lies above the bit entirely.
    pub(super) fn fold_kseg(vaddr: u32) -> u32 {
        vaddr & !0x2000_0000
    }

    /// Identify which region a virtual address belongs to.
    ///
    /// ```
    /// use mips_emu::core::memory::{Bus, MemoryRegion};
    ///
    /// let bus = Bus::new();
    /// assert_eq!(bus.identify_region(0xFFFE_0000), MemoryRegion::Mmio);
    /// assert_eq!(bus.identify_region(0x9FC0_0000), MemoryRegion::Flash);
    /// assert_eq!(bus.identify_region(0x8000_0000), MemoryRegion::Ram);
    /// assert_eq!(bus.identify_region(0x9A00_0000), MemoryRegion::FakeFlash);
    /// ```
    pub fn identify_region(&self, vaddr: u32) -> MemoryRegion {
        if (Self::MMIO_START..=Self::MMIO_END).contains(&vaddr) {
            return MemoryRegion::Mmio;
        }
        let folded = Self::fold_kseg(vaddr);
        let ram_end = Self::RAM_START + self.ram.len() as u32;
        if (Self::FLASH_START..Self::FLASH_END).contains(&folded) {
            MemoryRegion::Flash
        } else if (Self::RAM_START..ram_end).contains(&folded) {
            MemoryRegion::Ram
        } else if (Self::FAKE_FLASH_START..Self::FAKE_FLASH_END).contains(&folded) {
            MemoryRegion::FakeFlash
        } else {
            MemoryRegion::Unmapped
        }
    }
}
