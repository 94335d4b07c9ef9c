//! Property-based tests for ALU and sequencer invariants.

use emu_core::{Cpu, SimpleBus};
use mos_6502::addressing::index_address;
use mos_6502::{Mos6502, Mos6502Config, Registers, alu};
use proptest::prelude::*;

/// Core parked at `pc` with `program` loaded there.
fn parked(pc: u16, program: &[u8], regs: Registers) -> (Mos6502, SimpleBus) {
    let mut bus = SimpleBus::new();
    for (i, &byte) in program.iter().enumerate() {
        bus.poke(pc.wrapping_add(i as u16), byte);
    }
    let cpu = Mos6502::with_registers(Mos6502Config::default(), Registers { pc, ..regs });
    (cpu, bus)
}

fn count_cycles(cpu: &mut Mos6502, bus: &mut SimpleBus) -> usize {
    cpu.tick(bus);
    let mut cycles = 1;
    while !cpu.is_instruction_complete() {
        cpu.tick(bus);
        cycles += 1;
    }
    cycles
}

proptest! {
    /// Property: ADC agrees with 9-bit arithmetic and signed overflow
    #[test]
    fn prop_add_matches_wide_arithmetic(a in any::<u8>(), b in any::<u8>(), carry in any::<bool>()) {
        let result = alu::add(a, b, carry);
        let wide = u16::from(a) + u16::from(b) + u16::from(carry);
        let signed = i16::from(a as i8) + i16::from(b as i8) + i16::from(carry);

        prop_assert_eq!(result.value, wide as u8);
        prop_assert_eq!(result.carry, wide > 0xFF);
        prop_assert_eq!(result.overflow, !(-128..=127).contains(&signed));
        prop_assert_eq!(result.zero, result.value == 0);
        prop_assert_eq!(result.negative, result.value >= 0x80);
    }

    /// Property: SBC carry-out is "no borrow" and overflow is signed overflow
    #[test]
    fn prop_subtract_matches_wide_arithmetic(a in any::<u8>(), b in any::<u8>(), carry in any::<bool>()) {
        let result = alu::subtract(a, b, carry);
        let borrow = i16::from(!carry);
        let wide = i16::from(a) - i16::from(b) - borrow;
        let signed = i16::from(a as i8) - i16::from(b as i8) - borrow;

        prop_assert_eq!(result.value, wide as u8);
        prop_assert_eq!(result.carry, wide >= 0);
        prop_assert_eq!(result.overflow, !(-128..=127).contains(&signed));
    }

    /// Property: subtraction is addition of the one's complement
    #[test]
    fn prop_subtract_is_add_of_complement(a in any::<u8>(), b in any::<u8>(), carry in any::<bool>()) {
        prop_assert_eq!(alu::subtract(a, b, carry), alu::add(a, !b, carry));
    }

    /// Property: CMP sets C exactly when register >= operand
    #[test]
    fn prop_compare_orders(r in any::<u8>(), m in any::<u8>()) {
        let result = alu::compare(r, m);
        prop_assert_eq!(result.carry, r >= m);
        prop_assert_eq!(result.zero, r == m);
        prop_assert!(!result.overflow);
    }

    /// Property: LDA abs,X takes 4 cycles, or 5 exactly when the index crosses a page
    #[test]
    fn prop_absolute_x_cycles_follow_page_cross(base in 0x0400u16..0xF000, x in any::<u8>()) {
        let [lo, hi] = base.to_le_bytes();
        let regs = Registers { x, ..Registers::new() };
        let (mut cpu, mut bus) = parked(0x0200, &[0xBD, lo, hi], regs);
        let crossed = index_address(base, x).page_crossed;

        let cycles = count_cycles(&mut cpu, &mut bus);
        prop_assert_eq!(cycles, if crossed { 5 } else { 4 });
        prop_assert_eq!(crossed, (base & 0xFF00) != (base.wrapping_add(u16::from(x)) & 0xFF00));
    }

    /// Property: STA abs,X always takes 5 cycles
    #[test]
    fn prop_store_absolute_x_is_fixed(base in 0x0400u16..0xF000, x in any::<u8>()) {
        let [lo, hi] = base.to_le_bytes();
        let regs = Registers { x, a: 0x5A, ..Registers::new() };
        let (mut cpu, mut bus) = parked(0x0200, &[0x9D, lo, hi], regs);

        prop_assert_eq!(count_cycles(&mut cpu, &mut bus), 5);
        prop_assert_eq!(bus.peek(base.wrapping_add(u16::from(x))), 0x5A);
    }

    /// Property: JSR then RTS returns to the byte after the JSR, with S restored
    #[test]
    fn prop_jsr_rts_round_trip(pc in 0x0200u16..0x7FF0, s in 0x02u8..=0xFF) {
        let target = 0x8000;
        let regs = Registers { s, ..Registers::new() };
        let (mut cpu, mut bus) = parked(pc, &[0x20, 0x00, 0x80], regs);
        bus.poke(target, 0x60);

        prop_assert_eq!(count_cycles(&mut cpu, &mut bus), 6);
        prop_assert_eq!(cpu.pc(), target);
        prop_assert_eq!(count_cycles(&mut cpu, &mut bus), 6);
        prop_assert_eq!(cpu.pc(), pc.wrapping_add(3));
        prop_assert_eq!(cpu.regs.s, s);
    }

    /// Property: a taken branch lands on PC + 2 + offset, costing one extra cycle per page change
    #[test]
    fn prop_branch_target_and_cycles(pc in 0x0200u16..0xFD00, offset in any::<u8>()) {
        // BCC with carry clear is always taken
        let (mut cpu, mut bus) = parked(pc, &[0x90, offset], Registers::new());
        let next = pc.wrapping_add(2);
        let target = next.wrapping_add(i16::from(offset as i8) as u16);

        let cycles = count_cycles(&mut cpu, &mut bus);
        prop_assert_eq!(cpu.pc(), target);
        prop_assert_eq!(cycles, if (next ^ target) & 0xFF00 == 0 { 3 } else { 4 });
    }
}
