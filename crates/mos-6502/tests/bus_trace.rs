//! Bit-exact bus traces for each instruction class.
//!
//! Every test boots through the reset vector and then records the pins of
//! each cycle returned by `tick()`.

use emu_core::{BusCycle, Cpu, ReadWrite, SimpleBus};
use mos_6502::Mos6502;

/// Load `program` at `origin`, point the reset vector there and run reset.
fn boot_at(origin: u16, program: &[u8]) -> (Mos6502, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(origin, program);
    bus.poke_word(0xFFFC, origin);
    let mut cpu = Mos6502::new();
    for _ in 0..7 {
        cpu.tick(&mut bus);
    }
    assert_eq!(cpu.pc(), origin);
    (cpu, bus)
}

fn boot(program: &[u8]) -> (Mos6502, SimpleBus) {
    boot_at(0x0200, program)
}

/// Run one instruction and return every cycle it took.
fn trace_instruction(cpu: &mut Mos6502, bus: &mut SimpleBus) -> Vec<BusCycle> {
    let mut trace = vec![cpu.tick(bus)];
    while !cpu.is_instruction_complete() {
        trace.push(cpu.tick(bus));
        assert!(trace.len() <= 8, "instruction did not complete: {trace:?}");
    }
    trace
}

fn addresses(trace: &[BusCycle]) -> Vec<u16> {
    trace.iter().map(|c| c.address).collect()
}

/// R/W pin sequence as a string, e.g. "RRRW".
fn directions(trace: &[BusCycle]) -> String {
    trace
        .iter()
        .map(|c| match c.read_write {
            ReadWrite::Read => 'R',
            ReadWrite::Write => 'W',
        })
        .collect()
}

fn syncs(trace: &[BusCycle]) -> Vec<bool> {
    trace.iter().map(|c| c.sync).collect()
}

#[test]
fn reset_sequence_from_power_on() {
    let mut bus = SimpleBus::new();
    bus.poke_word(0xFFFC, 0x8000);
    let mut cpu = Mos6502::new();

    let trace: Vec<_> = (0..7).map(|_| cpu.tick(&mut bus)).collect();
    assert_eq!(
        addresses(&trace),
        [0x0000, 0x0000, 0x01FF, 0x01FE, 0x01FD, 0xFFFC, 0xFFFD]
    );
    assert_eq!(directions(&trace), "RRRRRRR");
    assert_eq!(trace[5].data, 0x00);
    assert_eq!(trace[6].data, 0x80);
    assert_eq!(cpu.regs.s, 0xFD);
    assert_eq!(cpu.regs.p.bits(), 0x24);

    let fetch = cpu.tick(&mut bus);
    assert_eq!(fetch.address, 0x8000);
    assert!(fetch.sync);
}

#[test]
fn reset_keeps_accumulator_and_index_registers() {
    let (mut cpu, mut bus) = boot(&[0xA9, 0x11, 0xA2, 0x22, 0xA0, 0x33]);
    for _ in 0..3 {
        trace_instruction(&mut cpu, &mut bus);
    }
    cpu.reset();
    let trace: Vec<_> = (0..7).map(|_| cpu.tick(&mut bus)).collect();
    assert_eq!(addresses(&trace)[2..5], [0x01FC, 0x01FB, 0x01FA]);
    assert_eq!((cpu.regs.a, cpu.regs.x, cpu.regs.y), (0x11, 0x22, 0x33));
    assert_eq!(cpu.regs.s, 0xFA);
    assert_eq!(cpu.pc(), 0x0200);
}

#[test]
fn implied_takes_two_cycles() {
    let (mut cpu, mut bus) = boot(&[0xEA]);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201]);
    assert_eq!(syncs(&trace), [true, false]);
    assert_eq!(cpu.pc(), 0x0201);
}

#[test]
fn lda_immediate() {
    let (mut cpu, mut bus) = boot(&[0xA9, 0x42]);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201]);
    assert_eq!(directions(&trace), "RR");
    assert_eq!(cpu.regs.a, 0x42);
}

#[test]
fn lda_absolute_reads_effective_address_on_fourth_cycle() {
    let (mut cpu, mut bus) = boot(&[0xAD, 0x34, 0x12]);
    bus.poke(0x1234, 0x99);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0x1234]);
    assert_eq!(trace[3].data, 0x99);
    assert_eq!(cpu.regs.a, 0x99);
}

#[test]
fn zero_page_indexed_wraps() {
    let (mut cpu, mut bus) = boot(&[0xB5, 0xF0]);
    cpu.regs.x = 0x20;
    bus.poke(0x0010, 0x77);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x00F0, 0x0010]);
    assert_eq!(cpu.regs.a, 0x77);
}

#[test]
fn absolute_x_without_page_cross() {
    let (mut cpu, mut bus) = boot(&[0xBD, 0xF0, 0x12]);
    cpu.regs.x = 0x0F;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0x12FF]);
}

#[test]
fn absolute_x_page_cross_reads_wrong_page_first() {
    let (mut cpu, mut bus) = boot(&[0xBD, 0xF0, 0x12]);
    cpu.regs.x = 0x10;
    bus.poke(0x1300, 0x5A);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0x1200, 0x1300]);
    assert_eq!(cpu.regs.a, 0x5A);
}

#[test]
fn absolute_y_page_cross() {
    let (mut cpu, mut bus) = boot(&[0xB9, 0xFF, 0x20]);
    cpu.regs.y = 0x01;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0x2000, 0x2100]);
}

#[test]
fn store_absolute_x_always_takes_the_fixup_read() {
    let (mut cpu, mut bus) = boot(&[0x9D, 0x34, 0x12]);
    cpu.regs.a = 0xAB;
    cpu.regs.x = 0x01;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0x1235, 0x1235]);
    assert_eq!(directions(&trace), "RRRRW");
    assert_eq!(trace[4].data, 0xAB);
    assert_eq!(bus.peek(0x1235), 0xAB);
}

#[test]
fn store_zero_page_is_three_cycles() {
    let (mut cpu, mut bus) = boot(&[0x86, 0x10]);
    cpu.regs.x = 0x3C;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0010]);
    assert_eq!(directions(&trace), "RRW");
    assert_eq!(trace[2], BusCycle::write(0x0010, 0x3C));
}

#[test]
fn stores_drive_the_selected_register() {
    // STY $1234; STX $20,Y
    let (mut cpu, mut bus) = boot(&[0x8C, 0x34, 0x12, 0x96, 0x20]);
    cpu.regs.a = 0x11;
    cpu.regs.x = 0x22;
    cpu.regs.y = 0x05;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(trace[3], BusCycle::write(0x1234, 0x05));

    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0203, 0x0204, 0x0020, 0x0025]);
    assert_eq!(trace[3], BusCycle::write(0x0025, 0x22));
}

#[test]
fn indexed_fixup_wraps_at_top_of_memory() {
    let (mut cpu, mut bus) = boot(&[0xBD, 0xFF, 0xFF]);
    cpu.regs.x = 0x01;
    bus.poke(0xFF00, 0x11);
    bus.poke(0x0000, 0x77);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0xFF00, 0x0000]);
    assert_eq!(cpu.regs.a, 0x77);
}

#[test]
fn indexed_indirect() {
    let (mut cpu, mut bus) = boot(&[0xA1, 0x20]);
    cpu.regs.x = 0x04;
    bus.poke_word(0x0024, 0x3456);
    bus.poke(0x3456, 0x01);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&trace),
        [0x0200, 0x0201, 0x0020, 0x0024, 0x0025, 0x3456]
    );
    assert_eq!(cpu.regs.a, 0x01);
}

#[test]
fn indexed_indirect_pointer_wraps_in_page_zero() {
    let (mut cpu, mut bus) = boot(&[0xA1, 0xFE]);
    cpu.regs.x = 0x01;
    bus.poke(0x00FF, 0x34);
    bus.poke(0x0000, 0x12);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&trace),
        [0x0200, 0x0201, 0x00FE, 0x00FF, 0x0000, 0x1234]
    );
}

#[test]
fn indirect_indexed_without_and_with_page_cross() {
    let (mut cpu, mut bus) = boot(&[0xB1, 0x10, 0xB1, 0x10]);
    bus.poke_word(0x0010, 0x12F0);
    cpu.regs.y = 0x05;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0010, 0x0011, 0x12F5]);

    cpu.regs.y = 0x20;
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&trace),
        [0x0202, 0x0203, 0x0010, 0x0011, 0x1210, 0x1310]
    );
}

#[test]
fn read_modify_write_writes_original_then_result() {
    let (mut cpu, mut bus) = boot(&[0xEE, 0x34, 0x12]);
    bus.poke(0x1234, 0x41);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&trace),
        [0x0200, 0x0201, 0x0202, 0x1234, 0x1234, 0x1234]
    );
    assert_eq!(directions(&trace), "RRRRWW");
    assert_eq!(trace[3].data, 0x41);
    assert_eq!(trace[4].data, 0x41, "dummy write repeats the original value");
    assert_eq!(trace[5].data, 0x42);
}

#[test]
fn read_modify_write_absolute_x_is_seven_cycles() {
    let (mut cpu, mut bus) = boot(&[0x1E, 0x00, 0x12]);
    cpu.regs.x = 0x02;
    bus.poke(0x1202, 0x81);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&trace),
        [0x0200, 0x0201, 0x0202, 0x1202, 0x1202, 0x1202, 0x1202]
    );
    assert_eq!(directions(&trace), "RRRRRWW");
    assert_eq!(trace[5].data, 0x81);
    assert_eq!(trace[6].data, 0x02);
    assert!(cpu.regs.p.is_set(mos_6502::flags::C));
}

#[test]
fn read_modify_write_zero_page_is_five_cycles() {
    let (mut cpu, mut bus) = boot(&[0xC6, 0x80]);
    bus.poke(0x0080, 0x01);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0080, 0x0080, 0x0080]);
    assert_eq!(directions(&trace), "RRRWW");
    assert!(cpu.regs.p.is_set(mos_6502::flags::Z));
}

#[test]
fn branch_not_taken_is_two_cycles() {
    // After reset Z is clear
    let (mut cpu, mut bus) = boot(&[0xF0, 0x05]);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201]);
    assert_eq!(cpu.pc(), 0x0202);
}

#[test]
fn branch_taken_same_page_is_three_cycles() {
    let (mut cpu, mut bus) = boot(&[0xD0, 0x05]);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202]);
    assert_eq!(cpu.pc(), 0x0207);
}

#[test]
fn branch_taken_across_page_is_four_cycles() {
    let (mut cpu, mut bus) = boot_at(0x02FD, &[0xD0, 0x10]);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x02FD, 0x02FE, 0x02FF, 0x020F]);
    assert_eq!(cpu.pc(), 0x030F);
}

#[test]
fn branch_backward_across_page() {
    let (mut cpu, mut bus) = boot_at(0x0300, &[0xD0, 0xFC]);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0300, 0x0301, 0x0302, 0x03FE]);
    assert_eq!(cpu.pc(), 0x02FE);
}

#[test]
fn jsr_and_rts() {
    let (mut cpu, mut bus) = boot(&[0x20, 0x00, 0x03]);
    bus.poke(0x0300, 0x60);

    let jsr = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&jsr),
        [0x0200, 0x0201, 0x01FD, 0x01FD, 0x01FC, 0x0202]
    );
    assert_eq!(directions(&jsr), "RRRWWR");
    assert_eq!(jsr[3].data, 0x02);
    assert_eq!(jsr[4].data, 0x02);
    assert_eq!(cpu.pc(), 0x0300);
    assert_eq!(cpu.regs.s, 0xFB);

    let rts = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&rts),
        [0x0300, 0x0301, 0x01FB, 0x01FC, 0x01FD, 0x0202]
    );
    assert_eq!(directions(&rts), "RRRRRR");
    assert_eq!(cpu.pc(), 0x0203);
    assert_eq!(cpu.regs.s, 0xFD);
}

#[test]
fn jmp_indirect_wraps_within_pointer_page() {
    let (mut cpu, mut bus) = boot(&[0x6C, 0xFF, 0x10]);
    bus.poke(0x10FF, 0x34);
    bus.poke(0x1000, 0x12);
    bus.poke(0x1100, 0x56);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&trace), [0x0200, 0x0201, 0x0202, 0x10FF, 0x1000]);
    assert_eq!(cpu.pc(), 0x1234);
}

#[test]
fn stack_push_and_pull() {
    let (mut cpu, mut bus) = boot(&[0x48, 0x68]);
    cpu.regs.a = 0x5E;

    let pha = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&pha), [0x0200, 0x0201, 0x01FD]);
    assert_eq!(directions(&pha), "RRW");

    let pla = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(addresses(&pla), [0x0201, 0x0202, 0x01FC, 0x01FD]);
    assert_eq!(directions(&pla), "RRRR");
    assert_eq!(cpu.regs.a, 0x5E);
}

#[test]
fn brk_pushes_state_and_reads_vector() {
    let (mut cpu, mut bus) = boot(&[0x00, 0xEA]);
    bus.poke_word(0xFFFE, 0x0400);
    let trace = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&trace),
        [0x0200, 0x0201, 0x01FD, 0x01FC, 0x01FB, 0xFFFE, 0xFFFF]
    );
    assert_eq!(directions(&trace), "RRWWWRR");
    assert!(trace[0].sync);
    assert_eq!(trace[2].data, 0x02);
    assert_eq!(trace[3].data, 0x02, "return address skips the padding byte");
    assert_eq!(trace[4].data, 0x34, "pushed P carries B and U");
    assert_eq!(cpu.pc(), 0x0400);
    assert_eq!(cpu.regs.p.bits(), 0x24, "B is not a register bit");
}

#[test]
fn rti_pulls_status_then_pc() {
    let (mut cpu, mut bus) = boot(&[0x58, 0x00, 0xEA]);
    bus.poke_word(0xFFFE, 0x0400);
    bus.poke(0x0400, 0x40);
    trace_instruction(&mut cpu, &mut bus);
    trace_instruction(&mut cpu, &mut bus);

    let rti = trace_instruction(&mut cpu, &mut bus);
    assert_eq!(
        addresses(&rti),
        [0x0400, 0x0401, 0x01FA, 0x01FB, 0x01FC, 0x01FD]
    );
    assert_eq!(directions(&rti), "RRRRRR");
    assert_eq!(cpu.pc(), 0x0203);
    assert!(!cpu.regs.p.is_set(mos_6502::flags::I));
    assert_eq!(cpu.regs.p.bits(), 0x20);
}

#[test]
fn t_state_counts_within_instruction() {
    let (mut cpu, mut bus) = boot(&[0xAD, 0x00, 0x10]);
    assert_eq!(cpu.t_state(), 0);
    cpu.tick(&mut bus);
    assert_eq!(cpu.t_state(), 1);
    cpu.tick(&mut bus);
    assert_eq!(cpu.t_state(), 2);
    cpu.tick(&mut bus);
    cpu.tick(&mut bus);
    assert_eq!(cpu.t_state(), 0);
}
