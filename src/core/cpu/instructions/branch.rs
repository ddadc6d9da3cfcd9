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

//! Conditional branches, including the "likely" family that nullifies its
//! delay slot instead of executing it when the branch is not taken.

use super::super::Cpu;

impl Cpu {
    fn branch_target(&self, offset: u16) -> u32 {
        let offset = (offset as i16 as i32) << 2;
        self.pc().wrapping_add(4).wrapping_add(offset as u32)
    }

    fn take_or_skip(&mut self, taken: bool, offset: u16) {
        if taken {
            let target = self.branch_target(offset);
            self.schedule_branch(target);
        }
    }

    /// Likely branches nullify the delay slot entirely when not taken,
    /// instead of letting it execute unconditionally.
    fn take_or_nullify(&mut self, taken: bool, offset: u16) {
        if taken {
            let target = self.branch_target(offset);
            self.schedule_branch(target);
        } else {
            self.schedule_skip();
        }
    }

    pub(crate) fn op_beq(&mut self, rs: u8, rt: u8, offset: u16) {
        self.take_or_skip(self.reg(rs) == self.reg(rt), offset);
    }

    pub(crate) fn op_bne(&mut self, rs: u8, rt: u8, offset: u16) {
        self.take_or_skip(self.reg(rs) != self.reg(rt), offset);
    }

    pub(crate) fn op_blez(&mut self, rs: u8, offset: u16) {
        self.take_or_skip((self.reg(rs) as i32) <= 0, offset);
    }

    pub(crate) fn op_bgtz(&mut self, rs: u8, offset: u16) {
        self.take_or_skip((self.reg(rs) as i32) > 0, offset);
    }

    pub(crate) fn op_beql(&mut self, rs: u8, rt: u8, offset: u16) {
        self.take_or_nullify(self.reg(rs) == self.reg(rt), offset);
    }

    pub(crate) fn op_bnel(&mut self, rs: u8, rt: u8, offset: u16) {
        self.take_or_nullify(self.reg(rs) != self.reg(rt), offset);
    }

    pub(crate) fn op_blezl(&mut self, rs: u8, offset: u16) {
        self.take_or_nullify((self.reg(rs) as i32) <= 0, offset);
    }

    pub(crate) fn op_bgtzl(&mut self, rs: u8, offset: u16) {
        self.take_or_nullify((self.reg(rs) as i32) > 0, offset);
    }

    /// REGIMM branches (`BLTZ`/`BGEZ`/`BLTZAL`/`BGEZAL` and their likely
    /// forms), dispatched on the flattened opcode's low bits the same way
    /// the reference decoder tests them: bit 0 of `rt` selects `>=` vs
    /// `<`, bit 4 selects the link (`$ra`-setting) variant.
    pub(crate) fn op_regimm(&mut self, rs: u8, rt: u8, offset: u16) {
        let is_bgez = rt & 0x01 != 0;
        let is_link = rt & 0x10 != 0;
        let is_likely = rt & 0x02 != 0;

        let value = self.reg(rs) as i32;
        let taken = if is_bgez { value >= 0 } else { value < 0 };

        if is_link {
            self.set_reg(31, self.pc().wrapping_add(8));
        }

        if is_likely {
            self.take_or_nullify(taken, offset);
        } else {
            self.take_or_skip(taken, offset);
        }
    }
}
