use super::*;
use crate::{
    interrupts::{Controller as InterruptController, Interrupt, Mask},
    scheduler::{Event, Scheduler},
};

fn harness() -> (Controller, Scheduler, InterruptController) {
    let mut sio = Controller::default();
    // tx enabled, slot 1 selected, acknowledge interrupts on
    sio.write_control(0x1003);

    let mut interrupts = InterruptController::default();
    interrupts.mask = Mask::from_bits(0x7FF);

    (sio, Scheduler::new(), interrupts)
}

/// Drives the scheduler until the pending acknowledge fires.
fn pump(sio: &mut Controller, scheduler: &mut Scheduler, interrupts: &mut InterruptController) {
    scheduler.merge();
    scheduler.advance(ACK_DELAY);
    while let Some((event, _)) = scheduler.pop_due() {
        if let Event::SioAck(payload) = event {
            sio.ack_event(interrupts, payload);
        }
    }
}

#[test]
fn pad_exchange_delivers_id_and_buttons() {
    let (mut sio, mut scheduler, mut interrupts) = harness();
    sio.set_input(!0x0010); // "up" held

    for tx in [0x01, 0x42, 0x00, 0x00] {
        sio.write_tx(&mut scheduler, tx);
        pump(&mut sio, &mut scheduler, &mut interrupts);
    }

    let replies: Vec<u8> = std::iter::from_fn(|| {
        sio.status.rx_ready().then(|| sio.read_rx())
    })
    .collect();

    assert_eq!(replies, [0xFF, 0x5A, 0xEF, 0xFF]);
}

#[test]
fn acknowledge_raises_the_receive_interrupt() {
    let (mut sio, mut scheduler, mut interrupts) = harness();

    sio.write_tx(&mut scheduler, 0x01);
    assert_eq!(interrupts.pending(), None); // nothing until the ack fires

    pump(&mut sio, &mut scheduler, &mut interrupts);
    assert_eq!(interrupts.pending(), Some(Interrupt::SioReceive));
    assert!(sio.status.ack());
    assert!(sio.status.interrupt());

    // control acknowledge clears the port-side flags
    sio.write_control(0x1013);
    assert!(!sio.status.interrupt());
    assert!(!sio.status.ack());
}

#[test]
fn unknown_bytes_reset_the_exchange() {
    let (mut sio, mut scheduler, mut interrupts) = harness();

    sio.write_tx(&mut scheduler, 0x01);
    pump(&mut sio, &mut scheduler, &mut interrupts);
    sio.write_tx(&mut scheduler, 0x99);
    pump(&mut sio, &mut scheduler, &mut interrupts);

    let _ = sio.read_rx();
    assert_eq!(sio.read_rx(), 0xFF);

    // the machine is back at idle: 0x42 does not answer with the pad id
    sio.write_tx(&mut scheduler, 0x42);
    pump(&mut sio, &mut scheduler, &mut interrupts);
    assert_eq!(sio.read_rx(), 0xFF);
}

#[test]
fn slot_2_has_no_device() {
    let (mut sio, mut scheduler, mut interrupts) = harness();
    sio.write_control(0x2003); // slot 2 selected

    sio.write_tx(&mut scheduler, 0x01);
    pump(&mut sio, &mut scheduler, &mut interrupts);
    assert_eq!(sio.read_rx(), 0xFF);

    sio.write_tx(&mut scheduler, 0x42);
    pump(&mut sio, &mut scheduler, &mut interrupts);
    assert_eq!(sio.read_rx(), 0xFF);
}

#[test]
fn empty_rx_fifo_reads_high() {
    let (mut sio, _, _) = harness();
    assert_eq!(sio.read_rx(), 0xFF);
    assert!(!sio.status.rx_ready());
}
