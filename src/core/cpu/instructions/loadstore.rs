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

//! Load/store instructions, including the unaligned `LWL`/`LWR`/`SWL`/`SWR`
//! family. There is no alignment trap anywhere in this module — every
//! address the bus is handed resolves to *something*, per
//! [`crate::core::memory::Bus`]'s infallible contract. `LH`/`LHU`/`SH` and
//! `LW`/`SW` hand their raw, possibly-misaligned address straight to the
//! bus, which logs an "address error" diagnostic on the way rather than
//! rejecting the access.

use super::super::Cpu;
use crate::core::memory::Bus;

fn sign_extend_byte(b: u8) -> u32 {
    b as i8 as i32 as u32
}

fn sign_extend_half(h: u16) -> u32 {
    h as i16 as i32 as u32
}

fn addr(rs_val: u32, offset: u16) -> u32 {
    rs_val.wrapping_add(offset as i16 as i32 as u32)
}

impl Cpu {
    pub(crate) fn op_lb(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        let value = sign_extend_byte(bus.load_byte(a));
        self.set_reg(rt, value);
    }

    pub(crate) fn op_lbu(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        self.set_reg(rt, bus.load_byte(a) as u32);
    }

    pub(crate) fn op_lh(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        let value = sign_extend_half(bus.load_halfword(a));
        self.set_reg(rt, value);
    }

    pub(crate) fn op_lhu(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        self.set_reg(rt, bus.load_halfword(a) as u32);
    }

    pub(crate) fn op_lw(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        self.set_reg(rt, bus.load_word(a));
    }

    pub(crate) fn op_sb(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        bus.store_byte(a, self.reg(rt) as u8);
    }

    pub(crate) fn op_sh(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        bus.store_halfword(a, self.reg(rt) as u16);
    }

    pub(crate) fn op_sw(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        bus.store_word(a, self.reg(rt));
    }

    pub(crate) fn op_lwl(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        let merged = bus.load_word_left(self.reg(rt), a);
        self.set_reg(rt, merged);
    }

    pub(crate) fn op_lwr(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        let merged = bus.load_word_right(self.reg(rt), a);
        self.set_reg(rt, merged);
    }

    pub(crate) fn op_swl(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        bus.store_word_left(self.reg(rt), a);
    }

    pub(crate) fn op_swr(&mut self, bus: &mut Bus, rs: u8, rt: u8, offset: u16) {
        let a = addr(self.reg(rs), offset);
        bus.store_word_right(self.reg(rt), a);
    }

    /// CACHE: no cache hierarchy is modelled, so this only retires.
    pub(crate) fn op_cache(&mut self) {
        log::trace!("cache: ignored (no cache hierarchy modelled)");
    }
}
