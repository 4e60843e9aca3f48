//! SIO0, the controller and memory card port.
//!
//! Only a digital pad in slot 1 is wired up. The pad protocol is a half-duplex exchange: every
//! byte the CPU transmits is answered, one acknowledge pulse later, by a byte in the RX FIFO.

mod interpreter;

use bitos::{bitos, integer::u2};
use std::collections::VecDeque;

/// Cycles between a TX write and the device acknowledge.
pub const ACK_DELAY: i64 = 1088;

/// `JOY_STAT`.
#[bitos(16)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Status {
    /// TX FIFO not full; always true, bytes are consumed immediately.
    #[bits(0)]
    pub tx_ready: bool,
    /// RX FIFO not empty.
    #[bits(1)]
    pub rx_ready: bool,
    /// Transmission finished.
    #[bits(2)]
    pub tx_finished: bool,
    /// The device acknowledge line.
    #[bits(7)]
    pub ack: bool,
    /// Interrupt pending.
    #[bits(9)]
    pub interrupt: bool,
}

/// `JOY_CTRL`.
#[bitos(16)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Control {
    /// Allow transmissions.
    #[bits(0)]
    pub tx_enable: bool,
    /// Assert the select line of the active slot.
    #[bits(1)]
    pub select: bool,
    /// Receive even without a selected device.
    #[bits(2)]
    pub rx_enable: bool,
    /// RX interrupt FIFO threshold.
    #[bits(8..10)]
    pub rx_interrupt_mode: u2,
    /// Interrupt when a byte is transmitted.
    #[bits(10)]
    pub tx_interrupt_enable: bool,
    /// Interrupt when a byte is received.
    #[bits(11)]
    pub rx_interrupt_enable: bool,
    /// Interrupt on the acknowledge pulse.
    #[bits(12)]
    pub ack_interrupt_enable: bool,
    /// Which slot the select line addresses: slot 1 when clear, slot 2 when set.
    #[bits(13)]
    pub slot_2: bool,
}

/// `JOY_MODE`.
#[bitos(16)]
#[derive(Debug, Clone, Copy, Default)]
pub struct JoyMode {
    #[bits(0..2)]
    pub baudrate_factor: u2,
    #[bits(2..4)]
    pub character_length: u2,
    #[bits(4)]
    pub parity_enable: bool,
    #[bits(5)]
    pub parity_odd: bool,
    #[bits(8)]
    pub clock_polarity: bool,
}

/// The pad exchange state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Exchange {
    /// Waiting for the `0x01` controller address byte.
    #[default]
    Idle,
    /// Addressed; waiting for the `0x42` read command.
    SendId,
    /// The next TX clocks out the low button byte.
    SendButtonsLow,
    /// The next TX clocks out the high button byte.
    SendButtonsHigh,
}

/// The state of SIO0.
#[derive(Debug, Clone)]
pub struct Controller {
    pub status: Status,
    pub control: Control,
    pub mode: JoyMode,
    pub baud: u16,

    pub rx_fifo: VecDeque<u8>,

    exchange: Exchange,
    /// Inverted button bitmap from the host; a zero bit means pressed.
    buttons: u16,
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            status: Status::default().with_tx_ready(true).with_tx_finished(true),
            control: Control::default(),
            mode: JoyMode::default(),
            baud: 0,
            rx_fifo: VecDeque::new(),
            exchange: Exchange::default(),
            buttons: 0xFFFF,
        }
    }
}

impl Controller {
    /// Latches the current input state; called by the host at VBLANK.
    pub fn set_input(&mut self, buttons: u16) {
        self.buttons = buttons;
    }

    /// Pops a byte from the RX FIFO; an empty FIFO reads as all ones.
    pub fn read_rx(&mut self) -> u8 {
        let value = self.rx_fifo.pop_front().unwrap_or(0xFF);
        self.status.set_rx_ready(!self.rx_fifo.is_empty());
        value
    }
}

#[cfg(test)]
mod tests;
