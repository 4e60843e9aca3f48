use super::*;
use crate::{
    cpu,
    cpu::cop0,
    dma, gpu, gte, interrupts,
    mem::{Address, Memory, PrimitiveRw},
    scheduler::Scheduler,
    sio0, spu, timers,
};

fn psx_with_program(words: &[u32]) -> PSX {
    let mut memory = Memory::with_bios(vec![0; 512 * 1024]).unwrap();
    for (i, word) in words.iter().enumerate() {
        memory.bios[i * 4..][..4].copy_from_slice(&word.to_le_bytes());
    }

    PSX {
        scheduler: Scheduler::new(),
        memory,
        cpu: cpu::Cpu::default(),
        cop0: cpu::cop0::Cop0::default(),
        gte: gte::Gte::default(),
        interrupts: interrupts::Controller::default(),
        dma: dma::State::default(),
        timers: timers::Timers::default(),
        gpu: gpu::Gpu::default(),
        cdrom: crate::cdrom::Controller::new(None),
        sio0: sio0::Controller::default(),
        spu: spu::Spu::default(),
    }
}

/// Builds a harness and retires the reset pipeline bubble, so the next `exec_next` executes the
/// first program instruction.
fn harness(words: &[u32]) -> (Interpreter, PSX) {
    let mut psx = psx_with_program(words);
    let mut interpreter = Interpreter::default();
    interpreter.exec_next(&mut psx);
    (interpreter, psx)
}

fn step(interpreter: &mut Interpreter, psx: &mut PSX, count: usize) {
    for _ in 0..count {
        interpreter.exec_next(psx);
    }
}

#[test]
fn register_zero_is_hardwired() {
    // ORI R0, R0, 0xFFFF ; ADDIU R0, R0, 1
    let (mut i, mut psx) = harness(&[0x3400_FFFF, 0x2400_0001]);
    step(&mut i, &mut psx, 2);

    assert_eq!(psx.cpu.regs.read(Reg::ZERO), 0);
}

#[test]
fn pc_stays_aligned_through_a_tight_loop() {
    // E1: J 0xBFC00000 at the reset vector, looping forever
    let (mut i, mut psx) = harness(&[0x0BF0_0000]);
    for _ in 0..1000 {
        i.exec_next(&mut psx);
        assert_eq!(psx.cpu.regs.read_pc() % 4, 0);
    }

    // even instruction counts leave the loop at its entry
    i.exec_next(&mut psx);
    assert_eq!(psx.cpu.regs.read_pc(), 0xBFC0_0000);
}

#[test]
fn branch_delay_slot_executes_before_the_jump_lands() {
    let (mut i, mut psx) = harness(&[
        0x0BF0_0005, // J 0xBFC00014
        0x3409_0002, // ORI R9, R0, 2 (delay slot, executes)
        0x340A_0003, // ORI R10, R0, 3 (skipped)
        0x340B_0004, // ORI R11, R0, 4 (skipped)
        0x340C_0005, // ORI R12, R0, 5 (branch target)
    ]);

    step(&mut i, &mut psx, 3);

    assert_eq!(psx.cpu.regs.read(Reg::R9), 2);
    assert_eq!(psx.cpu.regs.read(Reg::R12), 5);
    assert_eq!(psx.cpu.regs.read(Reg::R10), 0);
    assert_eq!(psx.cpu.regs.read(Reg::R11), 0);
}

#[test]
fn conditional_branch_offsets_are_relative_to_the_delay_slot() {
    let (mut i, mut psx) = harness(&[
        0x1000_0002, // BEQ R0, R0, +2
        0x0000_0000, // delay slot
        0x3409_0001, // ORI R9, R0, 1 (skipped)
        0x340A_0002, // ORI R10, R0, 2 (target)
    ]);

    step(&mut i, &mut psx, 3);

    assert_eq!(psx.cpu.regs.read(Reg::R9), 0);
    assert_eq!(psx.cpu.regs.read(Reg::R10), 2);
}

#[test]
fn loads_commit_one_instruction_late() {
    // LW R9, 0(R8) ; OR R10, R9, R0 ; OR R11, R9, R0
    let (mut i, mut psx) = harness(&[0x8D09_0000, 0x0120_5025, 0x0120_5825]);

    psx.memory.ram[0x100..].write(0xAAAA_5555u32);
    psx.cpu.regs.write(Reg::R8, 0x0000_0100);
    psx.cpu.regs.write(Reg::R9, 7);

    step(&mut i, &mut psx, 3);

    // the delay slot still observed the old value
    assert_eq!(psx.cpu.regs.read(Reg::R10), 7);
    assert_eq!(psx.cpu.regs.read(Reg::R11), 0xAAAA_5555);
    assert_eq!(psx.cpu.regs.read(Reg::R9), 0xAAAA_5555);
}

#[test]
fn writes_override_an_in_flight_load() {
    // LW R9, 0(R8) ; ORI R9, R0, 0x1234 ; NOP
    let (mut i, mut psx) = harness(&[0x8D09_0000, 0x3409_1234, 0x0000_0000]);

    psx.memory.ram[0x100..].write(0xAAAA_5555u32);
    psx.cpu.regs.write(Reg::R8, 0x0000_0100);

    step(&mut i, &mut psx, 3);

    // the explicit write wins over the cancelled load
    assert_eq!(psx.cpu.regs.read(Reg::R9), 0x1234);
}

#[test]
fn signed_overflow_traps_without_writing() {
    // E2 variant: ADD R9, R8, R8 with R8 = i32::MAX
    let (mut i, mut psx) = harness(&[0x0108_4820]);
    psx.cpu.regs.write(Reg::R8, 0x7FFF_FFFF);
    psx.cpu.regs.write(Reg::R9, 0xDEAD);

    step(&mut i, &mut psx, 1);

    assert_eq!(psx.cpu.regs.read(Reg::R9), 0xDEAD);
    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::ArithmeticOverflow)
    );
    assert_eq!(psx.cop0.regs.read(cop0::Reg::EPC), 0xBFC0_0000);
    // BEV is set out of reset: the ROM vector is used
    assert_eq!(psx.cpu.regs.read_pc(), 0xBFC0_0180);
}

#[test]
fn addi_minus_one_plus_itself_does_not_trap() {
    // E2: ADDI V0, R0, -1 ; ADD V0, V0, V0 ; NOP
    let (mut i, mut psx) = harness(&[0x2002_FFFF, 0x0042_1020, 0x0000_0000]);
    step(&mut i, &mut psx, 3);

    assert_eq!(psx.cpu.regs.read(Reg::V0), 0xFFFF_FFFE);
    assert_eq!(psx.cop0.regs.cause().exception(), None);
}

#[test]
fn lui_ori_lw_reads_ram_through_kseg0() {
    // E3: LUI A0, 0x8000 ; ORI A0, A0, 0x0100 ; LW V0, 0(A0) ; NOP
    let (mut i, mut psx) = harness(&[0x3C04_8000, 0x3484_0100, 0x8C82_0000, 0x0000_0000]);
    psx.memory.ram[0x100..].write(0xDEAD_BEEFu32);

    step(&mut i, &mut psx, 4);
    assert_eq!(psx.cpu.regs.read(Reg::V0), 0xDEAD_BEEF);
}

#[test]
fn misaligned_loads_fault_with_bad_vaddr() {
    // LW R9, 2(R0)
    let (mut i, mut psx) = harness(&[0x8C09_0002]);
    psx.cpu.regs.write(Reg::R9, 0x1111);

    step(&mut i, &mut psx, 1);

    assert_eq!(psx.cpu.regs.read(Reg::R9), 0x1111);
    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::AddressErrorLoad)
    );
    assert_eq!(psx.cop0.regs.read(cop0::Reg::BAD_VADDR), 2);
}

#[test]
fn isolated_cache_swallows_rom_stores_without_faulting() {
    // SW R9, 0(R8) aimed at the ROM, with the cache isolated
    let (mut i, mut psx) = harness(&[0xAD09_0000]);
    psx.cop0.regs.system_status_mut().set_isolate_cache(true);
    psx.cpu.regs.write(Reg::R8, 0xBFC0_0000);
    psx.cpu.regs.write(Reg::R9, 0x1234_5678);

    step(&mut i, &mut psx, 1);

    assert_eq!(psx.cop0.regs.cause().exception(), None);
    assert_eq!(
        psx.read::<u32, true>(Address(0xBFC0_0000)).unwrap(),
        0xAD09_0000
    );
}

#[test]
fn rom_stores_fault_when_the_cache_is_not_isolated() {
    // the same SW, but without cache isolation: a store error, not a silent drop
    let (mut i, mut psx) = harness(&[0xAD09_0000]);
    psx.cpu.regs.write(Reg::R8, 0xBFC0_0000);
    psx.cpu.regs.write(Reg::R9, 0x1234_5678);

    step(&mut i, &mut psx, 1);

    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::AddressErrorStore)
    );
    assert_eq!(psx.cop0.regs.read(cop0::Reg::BAD_VADDR), 0xBFC0_0000);
    assert_eq!(psx.cpu.regs.read_pc(), 0xBFC0_0180);
    assert_eq!(
        psx.read::<u32, true>(Address(0xBFC0_0000)).unwrap(),
        0xAD09_0000
    );
}

#[test]
fn misaligned_stores_fault_without_writing() {
    // SH R9, 1(R0)
    let (mut i, mut psx) = harness(&[0xA409_0001]);
    psx.cpu.regs.write(Reg::R9, 0x5678);

    step(&mut i, &mut psx, 1);

    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::AddressErrorStore)
    );
    assert_eq!(psx.memory.ram[1], 0);
}

#[test]
fn lwl_lwr_assemble_an_unaligned_word() {
    // LWL R9, 4(R8) ; LWR R9, 1(R8) ; NOP
    let (mut i, mut psx) = harness(&[0x8909_0004, 0x9909_0001, 0x0000_0000]);

    psx.memory.ram[0x100..].write(0x4433_2211u32);
    psx.memory.ram[0x104..].write(0x8877_6655u32);
    psx.cpu.regs.write(Reg::R8, 0x0000_0100);

    step(&mut i, &mut psx, 3);

    // word starting at 0x101: bytes 22 33 44 55
    assert_eq!(psx.cpu.regs.read(Reg::R9), 0x5544_3322);
}

#[test]
fn syscall_vectors_through_the_exception_handler() {
    let (mut i, mut psx) = harness(&[0x0000_000C]);
    step(&mut i, &mut psx, 1);

    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::SystemCall)
    );
    assert!(!psx.cop0.regs.cause().branch_delay());
    assert_eq!(psx.cpu.regs.read_pc(), 0xBFC0_0180);

    // the KU/IE stack was pushed
    assert!(!psx.cop0.regs.system_status().system_interrupts_enabled());
}

#[test]
fn exception_in_a_delay_slot_reports_the_branch() {
    let (mut i, mut psx) = harness(&[
        0x0BF0_0004, // J ahead
        0x0000_000C, // SYSCALL in the delay slot
    ]);

    step(&mut i, &mut psx, 2);

    assert!(psx.cop0.regs.cause().branch_delay());
    // EPC points at the branch, not the faulting slot
    assert_eq!(psx.cop0.regs.read(cop0::Reg::EPC), 0xBFC0_0000);
}

#[test]
fn masked_interrupts_fire_between_instructions() {
    let (mut i, mut psx) = harness(&[0x0000_0000, 0x0000_0000, 0x0000_0000]);

    // enable the external line in both the controller and COP0
    psx.interrupts.mask = interrupts::Mask::from_bits(0x7FF);
    psx.cop0.regs.write(cop0::Reg::SR, (1 << 22) | 0x0401);
    psx.interrupts.request(interrupts::Interrupt::VBlank);

    step(&mut i, &mut psx, 1);

    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::Interrupt)
    );
    assert_eq!(psx.cpu.regs.read_pc(), 0xBFC0_0180);
    // EPC resumes at the instruction that was displaced
    assert_eq!(psx.cop0.regs.read(cop0::Reg::EPC), 0xBFC0_0000);
}

#[test]
fn pending_interrupts_do_not_fire_while_ie_is_clear() {
    let (mut i, mut psx) = harness(&[0x0000_0000]);

    psx.interrupts.mask = interrupts::Mask::from_bits(0x7FF);
    psx.cop0.regs.write(cop0::Reg::SR, 1 << 22); // IE off
    psx.interrupts.request(interrupts::Interrupt::VBlank);

    step(&mut i, &mut psx, 1);
    assert_eq!(psx.cop0.regs.cause().exception(), None);

    // but the pending line is visible in CAUSE
    assert_ne!(psx.cop0.regs.read(cop0::Reg::CAUSE) & (1 << 10), 0);
}

#[test]
fn rfe_restores_the_interrupt_stack() {
    // SYSCALL ; ... handler at 0xBFC00180: RFE
    let mut words = vec![0x0000_000C];
    words.resize(0x180 / 4, 0);
    words.push(0x42000010); // RFE
    let (mut i, mut psx) = harness(&words);

    psx.cop0.regs.write(cop0::Reg::SR, (1 << 22) | 0x0401);

    step(&mut i, &mut psx, 1); // syscall
    assert!(!psx.cop0.regs.system_status().system_interrupts_enabled());

    // pipeline bubble after the vector, then the RFE
    step(&mut i, &mut psx, 2);
    assert!(psx.cop0.regs.system_status().system_interrupts_enabled());
}

#[test]
fn division_edge_cases_follow_the_hardware() {
    let (mut i, mut psx) = harness(&[0x0109_001A, 0x0000_0000]); // DIV R8, R9

    // positive / zero
    psx.cpu.regs.write(Reg::R8, 1234);
    psx.cpu.regs.write(Reg::R9, 0);
    step(&mut i, &mut psx, 1);
    assert_eq!(psx.cpu.regs.read_lo(), 0xFFFF_FFFF);
    assert_eq!(psx.cpu.regs.read_hi(), 1234);

    // MIN / -1
    let (mut i, mut psx) = harness(&[0x0109_001A]);
    psx.cpu.regs.write(Reg::R8, 0x8000_0000);
    psx.cpu.regs.write(Reg::R9, 0xFFFF_FFFF);
    step(&mut i, &mut psx, 1);
    assert_eq!(psx.cpu.regs.read_lo(), 0x8000_0000);
    assert_eq!(psx.cpu.regs.read_hi(), 0);
}

#[test]
fn mult_splits_the_product_across_hi_and_lo() {
    let (mut i, mut psx) = harness(&[0x0109_0018]); // MULT R8, R9
    psx.cpu.regs.write(Reg::R8, 0xFFFF_FFFF); // -1
    psx.cpu.regs.write(Reg::R9, 16);

    step(&mut i, &mut psx, 1);

    assert_eq!(psx.cpu.regs.read_lo(), (-16i64) as u32);
    assert_eq!(psx.cpu.regs.read_hi(), ((-16i64) >> 32) as u32);
}

#[test]
fn gte_transfers_move_data_both_ways() {
    let (mut i, mut psx) = harness(&[
        0x48C9_0800, // CTC2 R9 -> GTE control 1 (R33)
        0x4809_3000, // MFC2 R9 <- GTE data 6 (RGBC)
        0x0000_0000,
    ]);

    // COP2 usable
    psx.cop0.regs.write(cop0::Reg::SR, (1 << 30) | (1 << 22));
    psx.cpu.regs.write(Reg::R9, 0x1234_5678);
    psx.gte.regs.write(gte::Reg::RGBC, 0xCAFE_BABE);

    step(&mut i, &mut psx, 3);

    assert_eq!(psx.gte.regs.read(gte::Reg::RT_13_21), 0x1234_5678);
    assert_eq!(psx.cpu.regs.read(Reg::R9), 0xCAFE_BABE);
}

#[test]
fn cop2_is_unusable_until_enabled() {
    let (mut i, mut psx) = harness(&[0x4809_3000]); // MFC2
    step(&mut i, &mut psx, 1);

    assert_eq!(
        psx.cop0.regs.cause().exception(),
        Some(Exception::CopUnusable)
    );
}

#[test]
fn kernel_putchar_collects_stdout() {
    // the B0 gate with T1 = 0x3D prints A0
    let (mut i, mut psx) = harness(&[0x0000_0000]);

    psx.cpu.regs.write(Reg::T1, 0x3D);
    psx.cpu.regs.write(Reg::A0, u32::from(b'H'));
    psx.cpu.regs.write_pc(0xB0);
    psx.cpu.instr_delay_slot = (crate::cpu::instr::Instruction::NOP, crate::mem::Address(0xB0));

    // RAM is zeroed: executing the NOP at 0xB0 triggers the hook
    i.exec_next(&mut psx);

    assert_eq!(psx.memory.kernel_stdout, "H");
}
