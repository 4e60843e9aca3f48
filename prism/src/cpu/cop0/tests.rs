use super::*;

#[test]
fn exception_entry_pushes_the_ku_ie_stack() {
    let mut status = SystemStatus::from_bits(0x0000_0001); // kernel mode, interrupts on

    status.start_exception();
    assert!(!status.system_interrupts_enabled());
    assert!(status.previous_interrupts_enabled());

    status.start_exception();
    assert!(!status.system_interrupts_enabled());
    assert!(!status.previous_interrupts_enabled());
    assert!(status.old_interrupts_enabled());

    status.restore_from_exception();
    status.restore_from_exception();
    assert!(status.system_interrupts_enabled());
}

#[test]
fn rfe_preserves_the_old_entry() {
    let mut status = SystemStatus::from_bits(0b11_0000);
    status.restore_from_exception();
    assert_eq!(status.to_bits() & 0x3F, 0b11_1100);
}

#[test]
fn cause_writes_only_touch_software_interrupt_bits() {
    let mut regs = Registers::default();
    regs.cause_mut().set_exception(Some(Exception::SystemCall));
    regs.cause_mut().set_branch_delay(true);

    regs.write(Reg::CAUSE, 0xFFFF_FFFF);
    let cause = regs.cause();
    assert_eq!(cause.exception(), Some(Exception::SystemCall));
    assert!(cause.branch_delay());
    assert_eq!(cause.interrupt_pending() & 0x03, 0x03);
}

#[test]
fn prid_and_bad_vaddr_are_read_only() {
    let mut regs = Registers::default();
    regs.write(Reg::PRID, 0xDEAD);
    assert_eq!(regs.read(Reg::PRID), 0x0000_0002);

    regs.write_bad_vaddr(0x1234_5678);
    regs.write(Reg::BAD_VADDR, 0);
    assert_eq!(regs.read(Reg::BAD_VADDR), 0x1234_5678);
}

#[test]
fn external_interrupt_line_maps_to_ip2() {
    let mut cause = Cause::default();
    cause.set_external_interrupt(true);
    assert_eq!(cause.to_bits() & (1 << 10), 1 << 10);

    cause.set_external_interrupt(false);
    assert_eq!(cause.to_bits() & (1 << 10), 0);
}
