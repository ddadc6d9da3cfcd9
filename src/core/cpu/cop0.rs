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

//! Coprocessor 0: the system control subset this interpreter models.
//!
//! Only the registers the boot code and interrupt path touch are backed by
//! real state — `Status`, `Cause`, `EPC`, `Count` and `Compare`. Every other
//! COP0 register reads back as whatever was last written to its slot, with
//! no side effects, since nothing in this firmware's boot path depends on
//! them behaving like real hardware.
//!
//! The register file is addressed as `(rd, sel)`, `rd` the 5-bit field
//! `MFC0`/`MTC0` decode from `instr[15:11]` and `sel` the 3-bit field from
//! `instr[2:0]`, matching real COP0 addressing. The second dimension is
//! sized past the 3-bit `sel` range to also hold `(9, 10)`, a second
//! free-running counter that isn't reachable from `MFC0`/`MTC0` at all —
//! `tick` alone advances it — used by the reference's own trace output
//! rather than by firmware.

/// Interrupt vector all taken exceptions jump to (no bootstrap-exception
/// vector switching is modelled; `Status.BEV` is read but not honored).
pub const EXCEPTION_VECTOR: u32 = 0x8000_0180;

/// `sel` values a real `MFC0`/`MTC0` can address, plus room for the
/// trace-only `(9, 10)` counter cell.
const SEL_SLOTS: usize = 11;

pub(super) struct Cop0 {
    regs: [[u32; SEL_SLOTS]; 32],
    /// Mirrors the reference firmware's `in_irq` global: sticky until
    /// `eret`, and checked independently of `Status.EXL` so the delivery
    /// gate matches the source's two-flag scheme exactly.
    in_irq: bool,
}

impl Cop0 {
    pub const INDEX: usize = 0;
    pub const ENTRYLO: usize = 2;
    pub const ENTRYHI: usize = 10;
    pub const COUNT: usize = 9;
    pub const COMPARE: usize = 11;
    pub const STATUS: usize = 12;
    pub const CAUSE: usize = 13;
    pub const EPC: usize = 14;
    pub const PRID: usize = 15;

    pub const STATUS_IE: u32 = 1 << 0;
    pub const STATUS_EXL: u32 = 1 << 1;
    pub const STATUS_IM_SHIFT: u32 = 8;
    pub const STATUS_IM_MASK: u32 = 0xFF << Self::STATUS_IM_SHIFT;

    pub const CAUSE_IP_SHIFT: u32 = 8;
    pub const CAUSE_IP_MASK: u32 = 0xFF << Self::CAUSE_IP_SHIFT;
    pub const CAUSE_EXCCODE_SHIFT: u32 = 2;
    pub const CAUSE_EXCCODE_MASK: u32 = 0x1F << Self::CAUSE_EXCCODE_SHIFT;
    pub const CAUSE_BD: u32 = 1 << 31;

    /// `(9, 10)` is the trace-only second counter: unreachable through
    /// `MFC0`/`MTC0`'s 3-bit `sel` field, advanced only by `tick`.
    const SECOND_COUNTER_SEL: usize = 10;

    pub(super) fn new() -> Self {
        let mut regs = [[0u32; SEL_SLOTS]; 32];
        regs[Self::PRID][0] = 0x0001_8000;
        Self {
            regs,
            in_irq: false,
        }
    }

    pub(super) fn reset(&mut self) {
        *self = Self::new();
    }

    fn cell(&self, rd: u8, sel: u8) -> u32 {
        self.regs[(rd & 0x1F) as usize][(sel as usize) % SEL_SLOTS]
    }

    fn set_cell(&mut self, rd: u8, sel: u8, value: u32) {
        self.regs[(rd & 0x1F) as usize][(sel as usize) % SEL_SLOTS] = value;
    }

    pub(super) fn read(&self, index: u8, sel: u8) -> u32 {
        self.cell(index, sel)
    }

    /// `MTC0` is a deliberate no-op: the firmware this crate targets never
    /// relies on a COP0 register round-tripping a value written to it
    /// (TLB setup and cache-isolation toggles from the reference boot code
    /// are skipped, not modelled as misbehaving hardware). See DESIGN.md's
    /// Open Question log. [`Cop0::force_write`] exists for tests that need
    /// to observe what firmware attempted to write, and is never reachable
    /// from instruction execution.
    pub(super) fn write(&mut self, index: u8, sel: u8, value: u32) {
        log::trace!(
            "cop0: mtc0 $%{} sel {} <- 0x{:08x} ignored (no-op register file)",
            index,
            sel,
            value
        );
    }

    /// Loads a register directly, bypassing the `MTC0` no-op policy.
    /// Firmware can never reach this path; it exists for host-side state
    /// setup (scenario tests, a future "set register" debug command).
    /// Always targets `sel` 0, the only selector the named register
    /// constants below use.
    pub(super) fn force_write(&mut self, index: u8, value: u32) {
        self.set_cell(index, 0, value);
    }

    pub(super) fn status(&self) -> u32 {
        self.cell(Self::STATUS as u8, 0)
    }

    pub(super) fn set_status(&mut self, value: u32) {
        self.set_cell(Self::STATUS as u8, 0, value);
    }

    pub(super) fn cause(&self) -> u32 {
        self.cell(Self::CAUSE as u8, 0)
    }

    pub(super) fn set_cause(&mut self, value: u32) {
        self.set_cell(Self::CAUSE as u8, 0, value);
    }

    pub(super) fn epc(&self) -> u32 {
        self.cell(Self::EPC as u8, 0)
    }

    pub(super) fn set_epc(&mut self, value: u32) {
        self.set_cell(Self::EPC as u8, 0, value);
    }

    pub(super) fn count(&self) -> u32 {
        self.cell(Self::COUNT as u8, 0)
    }

    pub(super) fn set_count(&mut self, value: u32) {
        self.set_cell(Self::COUNT as u8, 0, value);
    }

    pub(super) fn compare(&self) -> u32 {
        self.cell(Self::COMPARE as u8, 0)
    }

    /// Advance the free-running cycle counter by one step and report
    /// whether it just reached `Compare` (the compare-match timer tick).
    /// Also advances the trace-only `(9, 10)` second counter in lockstep.
    pub(super) fn tick(&mut self) -> bool {
        let next = self.count().wrapping_add(1);
        self.set_count(next);
        let second = self.cell(Self::COUNT as u8, Self::SECOND_COUNTER_SEL as u8).wrapping_add(1);
        self.set_cell(Self::COUNT as u8, Self::SECOND_COUNTER_SEL as u8, second);
        next == self.compare()
    }

    /// `TLBWI`: no TLB is modelled, so this only retires the instruction.
    pub(super) fn tlbwi(&self) {
        log::trace!("cop0: tlbwi ignored (no TLB modelled)");
    }

    /// Vector into the fixed exception handler, recording `EPC`, the
    /// exception code and the branch-delay flag in `Cause`, and setting
    /// `Status.EXL` so nested exceptions don't re-vector. `EPC` is backed
    /// off by 4 when the faulting instruction was itself a delay slot, so
    /// `eret` resumes at the branch rather than past it.
    pub(super) fn enter_exception(&mut self, exc_code: u32, epc: u32, in_branch_delay: bool) {
        self.set_epc(if in_branch_delay {
            epc.wrapping_sub(4)
        } else {
            epc
        });
        let mut cause = self.cause() & !Self::CAUSE_EXCCODE_MASK;
        cause |= (exc_code << Self::CAUSE_EXCCODE_SHIFT) & Self::CAUSE_EXCCODE_MASK;
        if in_branch_delay {
            cause |= Self::CAUSE_BD;
        } else {
            cause &= !Self::CAUSE_BD;
        }
        self.set_cause(cause);
        self.set_status(self.status() | Self::STATUS_EXL);
        self.in_irq = true;
    }

    pub(super) fn in_irq(&self) -> bool {
        self.in_irq
    }

    /// `ERET`: clear `Status.EXL` and `in_irq`, and report the PC to
    /// resume at.
    pub(super) fn eret(&mut self) -> u32 {
        self.set_status(self.status() & !Self::STATUS_EXL);
        self.in_irq = false;
        self.epc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mtc0_is_a_no_op() {
        let mut cop0 = Cop0::new();
        let before = cop0.read(Cop0::STATUS as u8, 0);
        cop0.write(Cop0::STATUS as u8, 0, 0xFFFF_FFFF);
        assert_eq!(cop0.read(Cop0::STATUS as u8, 0), before);
    }

    #[test]
    fn sel_selects_a_distinct_cell_from_sel_zero() {
        let mut cop0 = Cop0::new();
        cop0.set_cell(Cop0::STATUS as u8, 3, 0xAAAA_AAAA);
        assert_eq!(cop0.read(Cop0::STATUS as u8, 3), 0xAAAA_AAAA);
        assert_ne!(cop0.read(Cop0::STATUS as u8, 3), cop0.read(Cop0::STATUS as u8, 0));
    }

    #[test]
    fn tick_advances_the_second_counter_alongside_count() {
        let mut cop0 = Cop0::new();
        cop0.tick();
        cop0.tick();
        cop0.tick();
        assert_eq!(cop0.count(), 3);
        assert_eq!(cop0.cell(Cop0::COUNT as u8, Cop0::SECOND_COUNTER_SEL as u8), 3);
    }

    #[test]
    fn count_tick_reports_compare_match() {
        let mut cop0 = Cop0::new();
        cop0.force_write(Cop0::COMPARE as u8, 3);
        assert!(!cop0.tick()); // count -> 1
        assert!(!cop0.tick()); // count -> 2
        assert!(cop0.tick()); // count -> 3, matches compare
        assert!(!cop0.tick()); // count -> 4
    }

    #[test]
    fn enter_exception_in_delay_slot_backs_epc_off_by_four() {
        let mut cop0 = Cop0::new();
        cop0.enter_exception(0, 0x8000_1004, true);
        assert_eq!(cop0.epc(), 0x8000_1000);
        assert_eq!(cop0.cause() & Cop0::CAUSE_BD, Cop0::CAUSE_BD);
        assert_eq!(cop0.status() & Cop0::STATUS_EXL, Cop0::STATUS_EXL);
        assert!(cop0.in_irq());
    }

    #[test]
    fn eret_clears_exl_and_in_irq_and_returns_epc() {
        let mut cop0 = Cop0::new();
        cop0.enter_exception(0, 0x8000_2000, false);
        let pc = cop0.eret();
        assert_eq!(pc, 0x8000_2000);
        assert_eq!(cop0.status() & Cop0::STATUS_EXL, 0);
        assert!(!cop0.in_irq());
    }
}
