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

//! COP0 instructions: `MFC0`, `MTC0`, `TLBWI`, `ERET`.

use super::super::Cpu;

impl Cpu {
    pub(crate) fn op_mfc0(&mut self, rt: u8, rd: u8, sel: u8) {
        let value = self.cop0_read(rd, sel);
        self.set_reg(rt, value);
    }

    pub(crate) fn op_mtc0(&mut self, rt: u8, rd: u8, sel: u8) {
        let value = self.reg(rt);
        self.cop0_write(rd, sel, value);
    }

    pub(crate) fn op_tlbwi(&mut self) {
        self.cop0_tlbwi();
    }

    pub(crate) fn op_eret(&mut self) {
        let target = self.cop0_eret();
        self.schedule_eret(target);
    }
}
