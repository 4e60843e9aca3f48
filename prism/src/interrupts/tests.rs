use super::*;

#[test]
fn masked_sources_do_not_assert_the_line() {
    let mut controller = Controller::default();
    controller.request(Interrupt::Cdrom);
    assert_eq!(controller.pending(), None);

    controller.mask = Mask::from_bits(1 << Interrupt::Cdrom as u16);
    assert_eq!(controller.pending(), Some(Interrupt::Cdrom));
}

#[test]
fn acknowledge_keeps_only_written_bits() {
    let mut controller = Controller::default();
    controller.request(Interrupt::VBlank);
    controller.request(Interrupt::Timer2);
    controller.mask = Mask::from_bits(0x7FF);

    // ack VBLANK, keep timer 2
    controller.acknowledge(!(1 << Interrupt::VBlank as u16));
    assert_eq!(controller.pending(), Some(Interrupt::Timer2));

    controller.acknowledge(0);
    assert_eq!(controller.pending(), None);
}

#[test]
fn request_is_sticky_and_idempotent() {
    let mut controller = Controller::default();
    controller.mask = Mask::from_bits(0x7FF);

    controller.request(Interrupt::Dma);
    let before = controller.status;
    controller.request(Interrupt::Dma);
    assert_eq!(controller.status, before);
}

#[test]
fn lowest_pending_source_wins() {
    let mut controller = Controller::default();
    controller.mask = Mask::from_bits(0x7FF);
    controller.request(Interrupt::Spu);
    controller.request(Interrupt::Gpu);

    assert_eq!(controller.pending(), Some(Interrupt::Gpu));
}
