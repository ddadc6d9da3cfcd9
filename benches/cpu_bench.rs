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

//! Sustained `Cpu::step` throughput over a synthetic instruction stream
//! that never branches out of the benchmarked window, so every call
//! measures decode + execute cost rather than I/O or bus routing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mips_emu::core::cpu::Cpu;
use mips_emu::core::memory::Bus;

const RAM_BASE: u32 = 0x8000_0000;

fn build_arithmetic_stream(bus: &mut Bus, words: u32) {
    for i in 0..words {
        // addiu $t0, $t0, 1 — cheap, side-effect-free beyond one register.
        bus.store_word(RAM_BASE + i * 4, 0x2108_0001);
    }
}

fn build_branchy_stream(bus: &mut Bus, words: u32) {
    let mut addr = RAM_BASE;
    while addr < RAM_BASE + words * 4 {
        // beq $0, $0, 1 (always taken, target = addr + 8, the next pair)
        // followed by a nop delay slot — walks the whole buffer instead of
        // spinning on one instruction pair.
        bus.store_word(addr, 0x1000_0001);
        bus.store_word(addr + 4, 0x0000_0000);
        addr += 8;
    }
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step_arithmetic");
    for &words in &[256u32, 4096, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(words), &words, |b, &words| {
            let mut bus = Bus::new();
            build_arithmetic_stream(&mut bus, words);
            b.iter(|| {
                let mut cpu = Cpu::with_reset_pc(RAM_BASE);
                for _ in 0..words {
                    cpu.step(black_box(&mut bus));
                }
                black_box(cpu.reg(8));
            });
        });
    }
    group.finish();
}

fn bench_branch_delay_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step_branch_delay_slots");
    for &words in &[256u32, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(words), &words, |b, &words| {
            let mut bus = Bus::new();
            build_branchy_stream(&mut bus, words);
            b.iter(|| {
                let mut cpu = Cpu::with_reset_pc(RAM_BASE);
                for _ in 0..words {
                    cpu.step(black_box(&mut bus));
                }
                black_box(cpu.pc());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_arithmetic, bench_branch_delay_slots);
criterion_main!(benches);
