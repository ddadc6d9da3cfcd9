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

//! Per-step interrupt line aggregation.
//!
//! Two device lines feed CP0 `Cause.IP`: the system timer's compare match
//! (`IP7`) and the UART0 TX-empty line (`IP2`). Both are folded into
//! `Cause` before [`Cpu::maybe_take_interrupt`] is consulted, every step,
//! ahead of fetch.

use bitflags::bitflags;

use crate::core::cpu::Cpu;
use crate::core::memory::Bus;

bitflags! {
    /// The subset of `Cause.IP` this engine drives. Each bit is an
    /// independent device line, which is what makes a bitflags type a
    /// better fit here than a couple of loose `u32` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct CauseIp: u32 {
        /// UART0 TX-empty.
        const IP2 = 1 << 10;
        /// System timer compare match.
        const IP7 = 1 << 15;
    }
}

/// Folds timer and UART0 state into CP0 `Cause` and attempts delivery.
pub struct InterruptEngine {
    timer_pending: bool,
}

impl InterruptEngine {
    pub fn new() -> Self {
        Self {
            timer_pending: false,
        }
    }

    /// Record a timer compare match for the next [`Self::evaluate`] call.
    /// Called by the machine loop right after [`Cpu::tick_timer`].
    pub fn notify_timer_match(&mut self, matched: bool) {
        self.timer_pending = matched;
    }

    /// Returns `true` if an interrupt was taken this step — the caller's
    /// fetch will read from the exception vector instead of `pc`.
    pub fn evaluate(&mut self, cpu: &mut Cpu, bus: &mut Bus) -> bool {
        let mut cause = CauseIp::from_bits_truncate(cpu.cause());

        cause.set(CauseIp::IP7, self.timer_pending);

        let uart_pending = bus.mmio_mut().uart0_tx_irq_pending();
        bus.mmio_mut().set_uart_irq_status(uart_pending);
        cause.set(CauseIp::IP2, uart_pending);

        let preserved = cpu.cause() & !CauseIp::all().bits();
        cpu.set_cause(preserved | cause.bits());
        cpu.maybe_take_interrupt()
    }
}

impl Default for InterruptEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cpu::EXCEPTION_VECTOR;

    const STATUS_IE: u32 = 1;
    const STATUS_IM_MASK: u32 = 0xFF << 8;

    fn irq_ready_cpu() -> Cpu {
        let mut cpu = Cpu::new();
        cpu.set_cause(0);
        cpu.set_status_for_test(STATUS_IE | STATUS_IM_MASK);
        cpu
    }

    #[test]
    fn timer_match_sets_ip7_and_vectors() {
        let mut engine = InterruptEngine::new();
        let mut bus = Bus::new();
        let mut cpu = irq_ready_cpu();

        engine.notify_timer_match(true);
        let taken = engine.evaluate(&mut cpu, &mut bus);

        assert!(taken);
        assert_eq!(cpu.pc(), EXCEPTION_VECTOR);
        assert_eq!(cpu.cause() & CauseIp::IP7.bits(), CauseIp::IP7.bits());
    }

    #[test]
    fn uart_tx_empty_sets_ip2_and_irq_status() {
        let mut engine = InterruptEngine::new();
        let mut bus = Bus::new();
        let mut cpu = irq_ready_cpu();

        bus.mmio_mut().write_halfword(0xFFFE_0310, 0x0020);
        bus.mmio_mut().write_byte(0xFFFE_0317, b'H');

        let taken = engine.evaluate(&mut cpu, &mut bus);

        assert!(taken);
        assert_eq!(cpu.cause() & CauseIp::IP2.bits(), CauseIp::IP2.bits());
        assert_eq!(bus.mmio_mut().read_word(0xFFFE_0010) & 0x4, 0x4);
    }

    #[test]
    fn no_pending_lines_clears_cause_bits_without_delivery() {
        let mut engine = InterruptEngine::new();
        let mut bus = Bus::new();
        let mut cpu = irq_ready_cpu();
        cpu.set_cause((CauseIp::IP2 | CauseIp::IP7).bits());

        let taken = engine.evaluate(&mut cpu, &mut bus);

        assert!(!taken);
        assert_eq!(cpu.cause() & CauseIp::all().bits(), 0);
    }
}
