//! The SIO0 pad exchange.

use super::{ACK_DELAY, Controller, Exchange};
use crate::{
    interrupts::{Controller as InterruptController, Interrupt},
    scheduler::{Event, Scheduler},
};
use log::{debug, trace};

impl Controller {
    /// Handles a byte written to the TX FIFO, advancing the pad exchange. The reply arrives
    /// through a scheduled acknowledge event.
    pub fn write_tx(&mut self, scheduler: &mut Scheduler, value: u8) {
        if !self.control.tx_enable() {
            return;
        }

        // only a pad in slot 1 is connected
        if !self.control.select() || self.control.slot_2() {
            self.exchange = Exchange::Idle;
            scheduler.schedule(Event::SioAck(0xFF), ACK_DELAY);
            return;
        }

        let (next, reply) = match (self.exchange, value) {
            (Exchange::Idle, 0x01) => (Exchange::SendId, 0xFF),
            (Exchange::SendId, 0x42) => (Exchange::SendButtonsLow, 0x5A),
            (Exchange::SendButtonsLow, _) => (Exchange::SendButtonsHigh, self.buttons as u8),
            (Exchange::SendButtonsHigh, _) => (Exchange::Idle, (self.buttons >> 8) as u8),
            // anything else aborts the exchange
            _ => (Exchange::Idle, 0xFF),
        };

        trace!(target: "sio", "tx 0x{value:02X}, reply 0x{reply:02X} ({next:?})");

        self.exchange = next;
        scheduler.schedule(Event::SioAck(reply), ACK_DELAY);
    }

    /// Finishes an exchange step: the device pulses acknowledge and the reply byte lands in the
    /// RX FIFO.
    pub fn ack_event(&mut self, interrupts: &mut InterruptController, payload: u8) {
        self.rx_fifo.push_back(payload);

        self.status.set_rx_ready(true);
        self.status.set_ack(true);
        self.status.set_tx_finished(true);

        if self.control.ack_interrupt_enable() && !self.status.interrupt() {
            debug!(target: "sio", "acknowledge interrupt");
            self.status.set_interrupt(true);
            interrupts.request(Interrupt::SioReceive);
        }
    }

    /// Handles a write to `JOY_CTRL`.
    pub fn write_control(&mut self, value: u16) {
        // acknowledge and reset are momentary; they do not read back
        self.control = super::Control::from_bits(value & !0x50);

        // acknowledge clears the status interrupt and error flags
        if value & (1 << 4) != 0 {
            self.status.set_interrupt(false);
            self.status.set_ack(false);
        }

        if value & (1 << 6) != 0 {
            debug!(target: "sio", "port reset");
            self.exchange = Exchange::Idle;
            self.rx_fifo.clear();
            self.status = super::Status::default()
                .with_tx_ready(true)
                .with_tx_finished(true);
        }

        if !self.control.select() {
            self.exchange = Exchange::Idle;
        }
    }
}
