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

//! Bitwise logical instructions.

use super::super::Cpu;

impl Cpu {
    pub(crate) fn op_and(&mut self, rs: u8, rt: u8, rd: u8) {
        self.set_reg(rd, self.reg(rs) & self.reg(rt));
    }

    pub(crate) fn op_or(&mut self, rs: u8, rt: u8, rd: u8) {
        self.set_reg(rd, self.reg(rs) | self.reg(rt));
    }

    pub(crate) fn op_xor(&mut self, rs: u8, rt: u8, rd: u8) {
        self.set_reg(rd, self.reg(rs) ^ self.reg(rt));
    }

    pub(crate) fn op_nor(&mut self, rs: u8, rt: u8, rd: u8) {
        self.set_reg(rd, !(self.reg(rs) | self.reg(rt)));
    }

    /// ANDI: immediate is zero-extended, not sign-extended.
    pub(crate) fn op_andi(&mut self, rs: u8, rt: u8, imm: u16) {
        self.set_reg(rt, self.reg(rs) & imm as u32);
    }

    pub(crate) fn op_ori(&mut self, rs: u8, rt: u8, imm: u16) {
        self.set_reg(rt, self.reg(rs) | imm as u32);
    }

    pub(crate) fn op_xori(&mut self, rs: u8, rt: u8, imm: u16) {
        self.set_reg(rt, self.reg(rs) ^ imm as u32);
    }

    /// LUI: load the immediate into the upper halfword, zeroing the lower.
    pub(crate) fn op_lui(&mut self, rt: u8, imm: u16) {
        self.set_reg(rt, (imm as u32) << 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn andi_zero_extends() {
        let mut cpu = Cpu::new();
        cpu.set_reg(1, 0xFFFF_FFFF);
        cpu.op_andi(1, 2, 0x00FF);
        assert_eq!(cpu.reg(2), 0x0000_00FF);
    }

    #[test]
    fn lui_fills_upper_half() {
        let mut cpu = Cpu::new();
        cpu.op_lui(1, 0x9FC0);
        assert_eq!(cpu.reg(1), 0x9FC0_0000);
    }

    #[test]
    fn nor_is_bitwise_not_or() {
        let mut cpu = Cpu::new();
        cpu.set_reg(1, 0x0F0F_0F0F);
        cpu.set_reg(2, 0xF0F0_F0F0);
        cpu.op_nor(1, 2, 3);
        assert_eq!(cpu.reg(3), 0);
    }
}
