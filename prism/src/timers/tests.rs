use super::*;

fn controller() -> InterruptController {
    let mut controller = InterruptController::default();
    controller.mask = crate::interrupts::Mask::from_bits(0x7FF);
    controller
}

#[test]
fn timer2_divides_by_eight_with_a_nonzero_clock_source() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    timers.write(2, Reg::Mode, 0x0100);
    timers.write(2, Reg::Target, 0x0008);

    timers.step(80, &mut interrupts);

    assert_eq!(timers.read(2, Reg::Count), 10);
    // IRQ at target is off, so nothing fires even though the target was crossed
    assert_eq!(interrupts.pending(), None);
}

#[test]
fn timer2_counts_raw_cycles_by_default() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    timers.write(2, Reg::Mode, 0x0000);
    timers.step(100, &mut interrupts);

    assert_eq!(timers.read(2, Reg::Count), 100);
}

#[test]
fn target_interrupt_is_edge_triggered() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    // IRQ at target, reset at target, repeat off
    timers.write(2, Reg::Mode, 0x0018);
    timers.write(2, Reg::Target, 5);

    timers.step(5, &mut interrupts);
    assert_eq!(interrupts.pending(), Some(Interrupt::Timer2));
    assert_eq!(timers.read(2, Reg::Count), 0);

    // acknowledge and run to the target again: one-shot, no second edge
    interrupts.acknowledge(0);
    timers.step(5, &mut interrupts);
    assert_eq!(interrupts.pending(), None);
}

#[test]
fn mode_read_clears_the_sticky_flags() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    timers.write(2, Reg::Mode, 0x0018);
    timers.write(2, Reg::Target, 3);
    timers.step(3, &mut interrupts);

    let mode = timers.read(2, Reg::Mode);
    assert_ne!(mode & (1 << 11), 0);

    let mode = timers.read(2, Reg::Mode);
    assert_eq!(mode & (1 << 11), 0);
}

#[test]
fn overflow_sets_the_flag_and_wraps() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    timers.write(2, Reg::Mode, 0x0020); // IRQ at overflow
    timers.write(2, Reg::Count, 0xFFFE);

    timers.step(3, &mut interrupts);

    assert_eq!(timers.read(2, Reg::Count), 1);
    assert_eq!(interrupts.pending(), Some(Interrupt::Timer2));
    assert_ne!(timers.read(2, Reg::Mode) & (1 << 12), 0);
}

#[test]
fn timer1_in_scanline_mode_only_counts_hblanks() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    timers.write(1, Reg::Mode, 0x0100); // clock source 1: HBLANK
    timers.step(1000, &mut interrupts);
    assert_eq!(timers.read(1, Reg::Count), 0);

    for _ in 0..7 {
        timers.tick_hblank(&mut interrupts);
    }
    assert_eq!(timers.read(1, Reg::Count), 7);
}

#[test]
fn vblank_gate_pauses_timer1() {
    let mut timers = Timers::default();
    let mut interrupts = controller();

    timers.write(1, Reg::Mode, 0x0001); // gate on, mode 0: pause during blank
    timers.step(10, &mut interrupts);
    assert_eq!(timers.read(1, Reg::Count), 10);

    timers.gate_vblank_start();
    timers.step(10, &mut interrupts);
    assert_eq!(timers.read(1, Reg::Count), 10);

    timers.gate_vblank_end();
    timers.step(5, &mut interrupts);
    assert_eq!(timers.read(1, Reg::Count), 15);
}
