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

//! End-to-end scenarios exercising the CPU, bus and interrupt engine
//! together, each built from a literal byte-level fixture rather than a
//! loaded firmware image.

use mips_emu::core::cpu::{Cpu, EXCEPTION_VECTOR};
use mips_emu::core::interrupt::InterruptEngine;
use mips_emu::core::memory::Bus;

const COP0_COMPARE: u8 = 11;
const COP0_STATUS: u8 = 12;

#[test]
fn reset_fetch_loads_lui_into_k0() {
    let mut bus = Bus::new();
    // lui $k0, 0x9fc0
    bus.load_firmware(&[0x3C, 0x1A, 0x9F, 0xC0]);
    let mut cpu = Cpu::new();

    cpu.step(&mut bus);

    assert_eq!(cpu.reg(26), 0x9FC0_0000);
    assert_eq!(cpu.pc(), 0x9FC0_0004);
}

#[test]
fn branch_delay_slot_executes_before_the_branch_lands() {
    let mut bus = Bus::new();
    // 0x00: beq  $0, $0, 3      ; target = 0x00 + 4 + (3<<2) = 0x10
    // 0x04: addiu $t0, $0, 1    ; delay slot, retires before the branch lands
    // 0x08: nop                 ; skipped over, branch already redirected pc
    // 0x0C: nop                 ; skipped over
    // 0x10: addiu $t1, $0, 2
    bus.load_firmware(&[
        0x10, 0x00, 0x00, 0x03, 0x24, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x24, 0x09, 0x00, 0x02,
    ]);
    let mut cpu = Cpu::new();

    cpu.step(&mut bus); // beq: schedules the branch, lands on the delay slot
    cpu.step(&mut bus); // addiu $t0, 1 (delay slot)
    cpu.step(&mut bus); // addiu $t1, 2 (branch target)

    assert_eq!(cpu.reg(8), 1);
    assert_eq!(cpu.reg(9), 2);
    assert_eq!(cpu.pc(), 0x9FC0_0014);
}

#[test]
fn uart_tx_write_sets_the_tx_empty_interrupt_bit() {
    let mut bus = Bus::new();

    bus.store_byte(0xFFFE_0317, b'H');

    // bit 21 of uart0_ir == bit 5 of its upper halfword.
    let upper = bus.load_halfword(0xFFFE_0312);
    assert_eq!(upper & (1 << 5), 1 << 5);
}

#[test]
fn timer_compare_match_vectors_and_eret_restores_pc() {
    let mut cpu = Cpu::with_reset_pc(0x8000_0000);
    let mut bus = Bus::new();
    let mut interrupts = InterruptEngine::new();

    for i in 0..100u32 {
        bus.store_word(0x8000_0000 + i * 4, 0); // nop
    }
    bus.store_word(EXCEPTION_VECTOR, 0x4200_0018); // eret

    cpu.poke_cop0(COP0_COMPARE, 100);
    cpu.poke_cop0(COP0_STATUS, 0x0000_8001); // IE | IM7

    for _ in 0..100 {
        interrupts.evaluate(&mut cpu, &mut bus);
        cpu.step(&mut bus);
        let matched = cpu.tick_timer();
        interrupts.notify_timer_match(matched);
    }

    let saved_pc = cpu.pc();
    assert_eq!(saved_pc, 0x8000_0000 + 100 * 4);

    let taken = interrupts.evaluate(&mut cpu, &mut bus);
    assert!(taken, "compare match with IE|IM7 set must deliver");
    assert_eq!(cpu.pc(), EXCEPTION_VECTOR);

    cpu.step(&mut bus); // executes eret
    assert_eq!(cpu.pc(), saved_pc);
}

#[test]
fn cfi_probe_enters_and_exits_query_mode() {
    let mut bus = Bus::new();

    bus.store_halfword(0x9FC0_00AA, 0x98); // enter CFI query
    assert_eq!(bus.load_halfword(0x9FC0_0020), 0x5100);
    assert_eq!(bus.load_halfword(0x9FC0_0022), 0x5200);
    assert_eq!(bus.load_halfword(0x9FC0_0024), 0x5900);

    bus.store_halfword(0x9FC0_0000, 0xF0); // reset to normal
    assert_eq!(bus.load_halfword(0x9FC0_0020), 0x0000);
}

#[test]
fn unaligned_lwl_lwr_reconstruct_the_big_endian_word() {
    let mut bus = Bus::new();
    bus.store_byte(0x8000_0000, 0x11);
    bus.store_byte(0x8000_0001, 0x22);
    bus.store_byte(0x8000_0002, 0x33);
    bus.store_byte(0x8000_0003, 0x44);
    bus.store_byte(0x8000_0004, 0x55);
    bus.store_byte(0x8000_0005, 0x66);
    bus.store_byte(0x8000_0006, 0x77);
    bus.store_byte(0x8000_0007, 0x88);

    let rt = bus.load_word_left(0, 0x8000_0001);
    let rt = bus.load_word_right(rt, 0x8000_0004);

    assert_eq!(rt, 0x2233_4455);
}
