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

//! Arithmetic and comparison instructions.
//!
//! Neither `ADD`/`ADDI` traps on signed overflow here: this interpreter
//! never raises the integer-overflow exception, wrapping instead like
//! `ADDU`/`ADDIU`. Firmware built for this target never depends on the
//! trap (see DESIGN.md's Open Question log).

use super::super::Cpu;

impl Cpu {
    pub(crate) fn op_add(&mut self, rs: u8, rt: u8, rd: u8) {
        let (result, overflow) = (self.reg(rs) as i32).overflowing_add(self.reg(rt) as i32);
        if overflow {
            log::trace!("add: signed overflow at pc 0x{:08x}, not trapped", self.pc());
        }
        self.set_reg(rd, result as u32);
    }

    pub(crate) fn op_addu(&mut self, rs: u8, rt: u8, rd: u8) {
        self.set_reg(rd, self.reg(rs).wrapping_add(self.reg(rt)));
    }

    pub(crate) fn op_addi(&mut self, rs: u8, rt: u8, imm: u16) {
        let imm = imm as i16 as i32;
        let (result, overflow) = (self.reg(rs) as i32).overflowing_add(imm);
        if overflow {
            log::trace!("addi: signed overflow at pc 0x{:08x}, not trapped", self.pc());
        }
        self.set_reg(rt, result as u32);
    }

    pub(crate) fn op_addiu(&mut self, rs: u8, rt: u8, imm: u16) {
        let imm = imm as i16 as i32 as u32;
        self.set_reg(rt, self.reg(rs).wrapping_add(imm));
    }

    pub(crate) fn op_sub(&mut self, rs: u8, rt: u8, rd: u8) {
        let (result, overflow) = (self.reg(rs) as i32).overflowing_sub(self.reg(rt) as i32);
        if overflow {
            log::trace!("sub: signed overflow at pc 0x{:08x}, not trapped", self.pc());
        }
        self.set_reg(rd, result as u32);
    }

    pub(crate) fn op_subu(&mut self, rs: u8, rt: u8, rd: u8) {
        self.set_reg(rd, self.reg(rs).wrapping_sub(self.reg(rt)));
    }

    /// SLT: signed less-than compare.
    pub(crate) fn op_slt(&mut self, rs: u8, rt: u8, rd: u8) {
        let result = (self.reg(rs) as i32) < (self.reg(rt) as i32);
        self.set_reg(rd, result as u32);
    }

    /// SLTU: unsigned less-than compare.
    pub(crate) fn op_sltu(&mut self, rs: u8, rt: u8, rd: u8) {
        let result = self.reg(rs) < self.reg(rt);
        self.set_reg(rd, result as u32);
    }

    /// SLTI: the immediate is sign-extended, but the compare itself is
    /// *unsigned* — reproducing the reference's `cpu->reg[rs] < (uint32_t)(int32_t)im16`,
    /// which promotes the signed left-hand side to unsigned instead of
    /// comparing signed against signed.
    pub(crate) fn op_slti(&mut self, rs: u8, rt: u8, imm: u16) {
        let imm = imm as i16 as i32 as u32;
        let result = self.reg(rs) < imm;
        self.set_reg(rt, result as u32);
    }

    /// SLTIU: the immediate is zero-extended, not sign-extended, and the
    /// compare is signed — the reference casts it as `(int32_t)(uint16_t)im16`
    /// and compares signed against signed. The name promises an unsigned
    /// compare against a sign-extended immediate; the reference delivers
    /// neither.
    pub(crate) fn op_sltiu(&mut self, rs: u8, rt: u8, imm: u16) {
        let imm = imm as i32;
        let result = (self.reg(rs) as i32) < imm;
        self.set_reg(rt, result as u32);
    }
}
