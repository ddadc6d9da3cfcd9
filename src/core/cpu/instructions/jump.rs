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

//! Unconditional jumps.
//!
//! `JR`/`JALR` mask off bit `0x2000_0000` of the register-sourced target,
//! folding a kseg1 address onto kseg0 the same way the bus does — matching
//! the reference firmware's jump-table entries, which are sometimes built
//! from kseg1 addresses.

use super::super::Cpu;

const KSEG_FOLD_BIT: u32 = 0x2000_0000;

impl Cpu {
    /// J: `PC <- (PC_delay_slot & 0xF000_0000) | (target << 2)`.
    pub(crate) fn op_j(&mut self, target: u32) {
        let base = self.pc().wrapping_add(4) & 0xF000_0000;
        self.schedule_branch(base | (target << 2));
    }

    /// JAL: like J, but `$ra` gets the address after the delay slot.
    pub(crate) fn op_jal(&mut self, target: u32) {
        let base = self.pc().wrapping_add(4) & 0xF000_0000;
        self.set_reg(31, self.pc().wrapping_add(8));
        self.schedule_branch(base | (target << 2));
    }

    pub(crate) fn op_jr(&mut self, rs: u8) {
        self.schedule_branch(self.reg(rs) & !KSEG_FOLD_BIT);
    }

    pub(crate) fn op_jalr(&mut self, rs: u8, rd: u8) {
        let target = self.reg(rs) & !KSEG_FOLD_BIT;
        self.set_reg(rd, self.pc().wrapping_add(8));
        self.schedule_branch(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jal_links_past_the_delay_slot() {
        let mut cpu = Cpu::new();
        cpu.set_pc_for_test(0x9FC0_0000);
        cpu.op_jal(0x0300_0000 >> 2);
        assert_eq!(cpu.reg(31), 0x9FC0_0008);
        assert_eq!(cpu.take_branch_target(), Some(0x9000_0000 | 0x0300_0000));
    }

    #[test]
    fn jr_folds_kseg1_onto_kseg0() {
        let mut cpu = Cpu::new();
        cpu.set_reg(4, 0xBFC0_1234);
        cpu.op_jr(4);
        assert_eq!(cpu.take_branch_target(), Some(0x9FC0_1234));
    }
}
