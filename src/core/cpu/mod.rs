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

//! MIPS32 big-endian interpreter core.
//!
//! `Cpu::step` fetches one instruction, dispatches it through the
//! flattened opcode table built by [`decode::flatten_opcode`], and leaves
//! the branch-delay-slot bookkeeping to a small state machine: a taken
//! branch records its target in `next_pc` while letting the delay slot
//! execute normally; a not-taken "likely" branch nullifies the delay slot
//! instead of executing it.
//!
//! # Example
//!
//! ```
//! use mips_emu::core::cpu::Cpu;
//! use mips_emu::core::memory::Bus;
//!
//! let mut cpu = Cpu::new();
//! let mut bus = Bus::new();
//! assert_eq!(cpu.reg(0), 0); // r0 is hardwired to zero
//! cpu.step(&mut bus);
//! ```

mod cop0;
mod decode;
mod disassembler;
mod instructions;
mod tracer;

pub use cop0::EXCEPTION_VECTOR;
use cop0::Cop0;
pub use disassembler::Disassembler;
pub use tracer::CpuTracer;

use crate::core::memory::Bus;

/// Virtual address the CPU starts execution from on reset.
pub const RESET_PC: u32 = 0x9FC0_0000;

/// Exception cause codes this interpreter actually raises. Most MIPS
/// exception classes (TLB miss, coprocessor-unusable, bus error) have no
/// path to being raised since nothing in this crate models a TLB or a bus
/// that can fault; `Interrupt` is the only cause the CPU itself delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionCause {
    Interrupt = 0,
}

pub struct Cpu {
    regs: [u32; 32],
    pc: u32,
    next_pc: u32,
    hi: u32,
    lo: u32,
    cop0: Cop0,

    /// Set by a branch/jump op during `execute`; consumed at the end of
    /// the step that scheduled it.
    branch_target: Option<u32>,
    /// Set by a not-taken "likely" branch; causes the *next* step to be
    /// treated as a NOP instead of fetching and executing its instruction.
    skip_flag: bool,
    /// Consumed at the top of `step`: true if this step's instruction
    /// should be nullified (the previous step was a not-taken likely
    /// branch).
    nullify_next: bool,
    /// True if the instruction about to be fetched is a branch delay slot
    /// — checked by [`Cpu::maybe_take_interrupt`] so `Cause.BD`/`EPC` land
    /// on the branch rather than the slot when an interrupt preempts it.
    pending_delay_slot: bool,
    /// Set by `ERET` during `execute`; consumed at the end of the same
    /// step it was scheduled in, ahead of `branch_target`, since `ERET`
    /// has no delay slot for the ordinary branch path to defer through.
    eret_target: Option<u32>,
}

impl Cpu {
    pub fn new() -> Self {
        Self::with_reset_pc(RESET_PC)
    }

    /// Builds a CPU whose initial `pc`/`next_pc` come from a configured
    /// reset vector rather than the fixed flash entry point.
    pub fn with_reset_pc(pc: u32) -> Self {
        Self {
            regs: [0; 32],
            pc,
            next_pc: pc.wrapping_add(4),
            hi: 0,
            lo: 0,
            cop0: Cop0::new(),
            branch_target: None,
            skip_flag: false,
            nullify_next: false,
            pending_delay_slot: false,
            eret_target: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn reg(&self, index: u8) -> u32 {
        self.regs[(index & 0x1F) as usize]
    }

    /// Writes to `$0` are dropped — it is hardwired to zero.
    pub(crate) fn set_reg(&mut self, index: u8, value: u32) {
        let index = (index & 0x1F) as usize;
        if index != 0 {
            self.regs[index] = value;
        }
    }

    pub(crate) fn hi(&self) -> u32 {
        self.hi
    }

    pub(crate) fn lo(&self) -> u32 {
        self.lo
    }

    pub(crate) fn set_hi_lo(&mut self, hi: u32, lo: u32) {
        self.hi = hi;
        self.lo = lo;
    }

    pub(crate) fn schedule_branch(&mut self, target: u32) {
        self.branch_target = Some(target);
    }

    pub(crate) fn schedule_skip(&mut self) {
        self.skip_flag = true;
    }

    pub(crate) fn take_branch_target(&mut self) -> Option<u32> {
        self.branch_target.take()
    }

    pub(crate) fn take_skip_flag(&mut self) -> bool {
        std::mem::take(&mut self.skip_flag)
    }

    pub(crate) fn cop0_read(&self, index: u8, sel: u8) -> u32 {
        self.cop0.read(index, sel)
    }

    pub(crate) fn cop0_write(&mut self, index: u8, sel: u8, value: u32) {
        self.cop0.write(index, sel, value);
    }

    pub(crate) fn cop0_tlbwi(&self) {
        self.cop0.tlbwi();
    }

    /// `ERET` has no delay slot of its own: the target takes effect
    /// immediately, bypassing the branch-scheduling machinery entirely.
    pub(crate) fn cop0_eret(&mut self) -> u32 {
        self.cop0.eret()
    }

    /// Used by `op_eret`, called from inside `execute`: the target must
    /// win over `step`'s ordinary post-execute `pc`/`next_pc` advance,
    /// which is why it goes through a dedicated field instead of
    /// `schedule_branch`.
    pub(crate) fn schedule_eret(&mut self, target: u32) {
        self.eret_target = Some(target);
    }

    /// Vectors into the exception handler immediately. Called by
    /// [`Cpu::maybe_take_interrupt`], outside of `step`'s execute/advance
    /// cycle, so there is no later post-execute advance to collide with.
    pub(crate) fn schedule_branch_now(&mut self, target: u32) {
        self.pc = target;
        self.next_pc = target.wrapping_add(4);
    }

    pub fn status(&self) -> u32 {
        self.cop0.status()
    }

    pub fn cause(&self) -> u32 {
        self.cop0.cause()
    }

    pub fn set_cause(&mut self, value: u32) {
        self.cop0.set_cause(value);
    }

    /// Directly loads a COP0 register, bypassing the `MTC0` no-op policy —
    /// for host-side scenario setup (preloading `Status`/`Compare` before a
    /// run), never reachable from instruction execution.
    pub fn poke_cop0(&mut self, index: u8, value: u32) {
        self.cop0.force_write(index, value);
    }

    /// Raise an interrupt if `Status.IE` is set, the requested pending mask
    /// intersects `Status.IM`, `Status.EXL` is clear, and no handler is
    /// already running. Called once per step by the machine's interrupt
    /// engine, after it has folded UART/timer state into `Cause.IP`.
    pub fn maybe_take_interrupt(&mut self) -> bool {
        let status = self.cop0.status();
        let ie = status & Cop0::STATUS_IE != 0;
        let exl = status & Cop0::STATUS_EXL != 0;
        let pending = self.cop0.cause() & status & Cop0::STATUS_IM_MASK;
        if ie && !exl && !self.cop0.in_irq() && pending != 0 {
            self.cop0.enter_exception(
                ExceptionCause::Interrupt as u32,
                self.pc,
                self.pending_delay_slot,
            );
            self.pending_delay_slot = false;
            self.schedule_branch_now(EXCEPTION_VECTOR);
            true
        } else {
            false
        }
    }

    /// Advance the free-running `Count` register by one tick, returning
    /// whether it just reached `Compare`.
    pub fn tick_timer(&mut self) -> bool {
        self.cop0.tick()
    }

    /// Fetch, decode and execute one instruction, advancing `pc`/`next_pc`
    /// according to the branch-delay-slot state machine described in the
    /// module docs.
    pub fn step(&mut self, bus: &mut Bus) {
        self.pending_delay_slot = false;

        if self.nullify_next {
            self.nullify_next = false;
        } else {
            let instr = bus.load_word(self.pc);
            self.branch_target = None;
            self.skip_flag = false;
            self.execute(instr, bus);
        }

        if let Some(target) = self.eret_target.take() {
            self.pc = target;
            self.next_pc = target.wrapping_add(4);
        } else if let Some(target) = self.branch_target.take() {
            self.pc = self.next_pc;
            self.next_pc = target;
            self.pending_delay_slot = true;
        } else if self.skip_flag {
            self.skip_flag = false;
            self.pc = self.next_pc;
            self.next_pc = self.next_pc.wrapping_add(4);
            self.nullify_next = true;
        } else {
            self.pc = self.next_pc;
            self.next_pc = self.next_pc.wrapping_add(4);
        }
    }

    fn execute(&mut self, instr: u32, bus: &mut Bus) {
        let opcode = decode::flatten_opcode(instr);
        let (rs, rt, rd, shamt, _funct) = decode::decode_r_type(instr);
        let (_, _, _, imm) = decode::decode_i_type(instr);
        let (_, target) = decode::decode_j_type(instr);

        match opcode {
            // SPECIAL (flattened 0x40 | funct)
            0x40 => self.op_sll(rt, rd, shamt), // all-zero encoding is NOP
            0x42 => self.op_srl(rt, rd, shamt),
            0x43 => self.op_sra(rt, rd, shamt),
            0x44 => self.op_sllv(rs, rt, rd),
            0x46 => self.op_srlv(rs, rt, rd),
            0x47 => self.op_srav(rs, rt, rd),
            0x48 => self.op_jr(rs),
            0x49 => self.op_jalr(rs, rd),
            0x4C => self.op_mfhi(rd),
            0x4D => self.op_mthi(rs),
            0x4E => self.op_mflo(rd),
            0x4F => self.op_mtlo(rs),
            0x58 => self.op_mult(rs, rt),
            0x59 => self.op_multu(rs, rt),
            0x5A => self.op_div(rs, rt),
            0x5B => self.op_divu(rs, rt),
            0x60 => self.op_add(rs, rt, rd),
            0x61 => self.op_addu(rs, rt, rd),
            0x62 => self.op_sub(rs, rt, rd),
            0x63 => self.op_subu(rs, rt, rd),
            0x64 => self.op_and(rs, rt, rd),
            0x65 => self.op_or(rs, rt, rd),
            0x66 => self.op_xor(rs, rt, rd),
            0x67 => self.op_nor(rs, rt, rd),
            0x6A => self.op_slt(rs, rt, rd),
            0x6B => self.op_sltu(rs, rt, rd),

            // REGIMM (flattened 0x80 | rt): BLTZ/BGEZ/BLTZL/BGEZL/BLTZAL/BGEZAL
            0x80..=0x93 => self.op_regimm(rs, rt, imm),

            0x01 => unreachable!("REGIMM major folded into 0x80..=0x93"),
            0x02 => self.op_j(target),
            0x03 => self.op_jal(target),
            0x04 => self.op_beq(rs, rt, imm),
            0x05 => self.op_bne(rs, rt, imm),
            0x06 => self.op_blez(rs, imm),
            0x07 => self.op_bgtz(rs, imm),
            0x08 => self.op_addi(rs, rt, imm),
            0x09 => self.op_addiu(rs, rt, imm),
            0x0A => self.op_slti(rs, rt, imm),
            0x0B => self.op_sltiu(rs, rt, imm),
            0x0C => self.op_andi(rs, rt, imm),
            0x0D => self.op_ori(rs, rt, imm),
            0x0E => self.op_xori(rs, rt, imm),
            0x0F => self.op_lui(rt, imm),

            // COP0: rs selects MF/MT (0/4) vs the CO-format sub-function.
            0x10 => match rs {
                0x00 => self.op_mfc0(rt, rd, (instr & 0x7) as u8),
                0x04 => self.op_mtc0(rt, rd, (instr & 0x7) as u8),
                0x10 => match instr & 0x3F {
                    0x02 => self.op_tlbwi(),
                    0x18 => self.op_eret(),
                    _ => self.unimplemented(instr),
                },
                _ => self.unimplemented(instr),
            },

            0x14 => self.op_beql(rs, rt, imm),
            0x15 => self.op_bnel(rs, rt, imm),
            0x16 => self.op_blezl(rs, imm),
            0x17 => self.op_bgtzl(rs, imm),

            // SPECIAL2: only MUL (funct 0x02) is implemented.
            0x1C => match instr & 0x3F {
                0x02 => self.op_mul(rs, rt, rd),
                _ => self.unimplemented(instr),
            },

            0x20 => self.op_lb(bus, rs, rt, imm),
            0x21 => self.op_lh(bus, rs, rt, imm),
            0x22 => self.op_lwl(bus, rs, rt, imm),
            0x23 => self.op_lw(bus, rs, rt, imm),
            0x24 => self.op_lbu(bus, rs, rt, imm),
            0x25 => self.op_lhu(bus, rs, rt, imm),
            0x26 => self.op_lwr(bus, rs, rt, imm),
            0x28 => self.op_sb(bus, rs, rt, imm),
            0x29 => self.op_sh(bus, rs, rt, imm),
            0x2A => self.op_swl(bus, rs, rt, imm),
            0x2B => self.op_sw(bus, rs, rt, imm),
            0x2E => self.op_swr(bus, rs, rt, imm),
            0x2F => self.op_cache(),

            _ => self.unimplemented(instr),
        }
    }

    /// Logs the offending word and PC, then terminates the process. Two
    /// spec passages disagree on the exit status for a truly unrecognized
    /// major opcode versus a reserved sub-opcode within a known one (one
    /// says "non-zero", the other says 0); this interpreter exits 1 for
    /// both, matching the uniform fatal-error convention used elsewhere
    /// (see DESIGN.md).
    fn unimplemented(&self, instr: u32) -> ! {
        log::error!(
            "unimplemented instruction 0x{:08x} at pc 0x{:08x}",
            instr,
            self.pc
        );
        std::process::exit(1);
    }

    #[cfg(test)]
    pub(crate) fn set_pc_for_test(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
    }

    #[cfg(test)]
    pub(crate) fn set_status_for_test(&mut self, value: u32) {
        self.cop0.set_status(value);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
