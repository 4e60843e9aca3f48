//! The CDROM command processor.
//!
//! A command acknowledges with INT3 after a model delay; commands with a second phase schedule a
//! follow-up INT2 (or INT1 for sector reads). An interrupt that fires while the previous one is
//! still unacknowledged is parked and delivered when the guest writes the acknowledge pattern to
//! the interrupt flag register.

use super::{Command, Controller, DriveMode, Reg, SeekTarget};
use crate::{
    cpu,
    interrupts::{Controller as InterruptController, Interrupt},
    scheduler::{Event, Scheduler},
};
use log::{debug, info, trace, warn};

const ACK_GET_STAT: i64 = 20_000;
const ACK_DEFAULT: i64 = 30_000;
const ACK_INIT: i64 = 80_000;

const COMPLETE_PAUSE: i64 = 120_000;
const COMPLETE_INIT: i64 = 110_000;
const COMPLETE_GET_ID: i64 = 50_000;
const COMPLETE_SEEK: i64 = 120_000;
const COMPLETE_READ_TOC: i64 = 1_000_000;

/// Cycles between sectors at single speed (75 sectors per second).
const SECTOR_DELAY: i64 = (cpu::FREQUENCY / 75) as i64;

impl Controller {
    /// Handles a write to one of the four registers.
    pub fn write(
        &mut self,
        scheduler: &mut Scheduler,
        interrupts: &mut InterruptController,
        reg: Reg,
        value: u8,
    ) {
        match (reg, self.bank) {
            (Reg::Reg0, _) => {
                self.bank = value & 0b11;
                trace!(target: "cdrom", "switched to bank {}", self.bank);
            }

            // the command register responds on every bank
            (Reg::Reg1, _) => self.command(scheduler, value),

            (Reg::Reg2, 0) => {
                trace!(target: "cdrom", "parameter 0x{value:02X}");
                if self.parameter_fifo.len() < 16 {
                    self.parameter_fifo.push_back(value);
                }
            }
            (Reg::Reg2, 1) => self.int_enable = value & 0x1F,

            (Reg::Reg3, 0) => {
                // request register; only the data-request bit matters and data is always
                // prepared eagerly
                trace!(target: "cdrom", "request register 0x{value:02X}");
            }
            (Reg::Reg3, 1) => self.acknowledge(scheduler, interrupts, value),

            (reg, bank) => {
                warn!(target: "cdrom", "ignoring write to {reg:?} bank {bank}: 0x{value:02X}");
            }
        }
    }

    /// Acknowledge write to the interrupt flag register: clears the written bits and delivers the
    /// next parked interrupt, if any.
    fn acknowledge(
        &mut self,
        scheduler: &mut Scheduler,
        interrupts: &mut InterruptController,
        value: u8,
    ) {
        trace!(target: "cdrom", "acknowledging 0x{value:02X} (flags 0x{:02X})", self.int_flags);
        self.int_flags &= !value & 0x1F;

        if value & 0x40 != 0 {
            self.parameter_fifo.clear();
        }

        if self.int_flags & 0x7 == 0
            && let Some(level) = self.pending_irqs.pop_front()
        {
            self.deliver_irq(scheduler, interrupts, level);
        }
    }

    /// Handles a scheduled interrupt becoming due. Defers it if the previous one has not been
    /// acknowledged yet.
    pub fn irq_event(
        &mut self,
        scheduler: &mut Scheduler,
        interrupts: &mut InterruptController,
        level: u8,
    ) {
        if self.int_flags & 0x7 != 0 {
            self.pending_irqs.push_back(level);
            return;
        }

        self.deliver_irq(scheduler, interrupts, level);
    }

    fn deliver_irq(
        &mut self,
        scheduler: &mut Scheduler,
        interrupts: &mut InterruptController,
        level: u8,
    ) {
        debug!(target: "cdrom", "INT{level}");

        if level == 2 && self.complete_clears != 0 {
            let status = self.status.to_bits() & !self.complete_clears;
            self.status = super::DriveStatus::from_bits(status);
            self.complete_clears = 0;
        }

        // a data-ready INT streams the next sector and paces the one after it
        if level == 1 {
            self.load_sector();
            self.response_fifo.push_back(self.status.to_bits());

            let delay = if self.mode.double_speed() {
                SECTOR_DELAY / 2
            } else {
                SECTOR_DELAY
            };
            scheduler.schedule(Event::CdromIrq(1), delay);
        }

        self.int_flags |= level;
        if self.int_enable & self.int_flags != 0 {
            interrupts.request(Interrupt::Cdrom);
        }
    }

    fn pop_parameter(&mut self) -> u8 {
        self.parameter_fifo.pop_front().unwrap_or_default()
    }

    /// Dispatches a command written to register 1.
    fn command(&mut self, scheduler: &mut Scheduler, value: u8) {
        let Some(command) = Command::new(value) else {
            panic!("unhandled CDROM command 0x{value:02X}");
        };

        debug!(target: "cdrom", "command {command:?}");

        let ack = |scheduler: &mut Scheduler, delay| {
            scheduler.schedule(Event::CdromIrq(3), delay);
        };

        match command {
            Command::GetStat => {
                self.response_fifo.push_back(self.status.to_bits());
                self.status.set_shell_open(false);
                ack(scheduler, ACK_GET_STAT);
            }
            Command::SetLoc => {
                self.response_fifo.push_back(self.status.to_bits());

                self.target = SeekTarget {
                    minutes: self.pop_parameter(),
                    seconds: self.pop_parameter(),
                    sector: self.pop_parameter(),
                };

                info!(
                    target: "cdrom",
                    "seek target [{:02X}:{:02X}:{:02X}]",
                    self.target.minutes, self.target.seconds, self.target.sector
                );

                ack(scheduler, ACK_DEFAULT);
            }
            Command::ReadN => {
                self.response_fifo.push_back(self.status.to_bits());
                self.status.set_reading(true);

                ack(scheduler, ACK_DEFAULT);

                let delay = if self.mode.double_speed() {
                    SECTOR_DELAY / 2
                } else {
                    SECTOR_DELAY
                };
                scheduler.schedule(Event::CdromIrq(1), ACK_DEFAULT + delay);
            }
            Command::Pause => {
                // reads stop dead: every queued CDROM interrupt dies with them
                scheduler.retain(|event| !matches!(event, Event::CdromIrq(_)));
                self.pending_irqs.clear();

                self.response_fifo.push_back(self.status.to_bits());
                ack(scheduler, ACK_GET_STAT);

                self.status.set_reading(false);
                self.status.set_playing(false);

                self.response_fifo.push_back(self.status.to_bits());
                scheduler.schedule(Event::CdromIrq(2), COMPLETE_PAUSE);
            }
            Command::Init => {
                self.response_fifo.push_back(self.mode.to_bits());
                ack(scheduler, ACK_INIT);

                self.status.set_motor_on(true);
                self.mode = DriveMode::default().with_full_sector(true);

                self.response_fifo.push_back(self.mode.to_bits());
                scheduler.schedule(Event::CdromIrq(2), COMPLETE_INIT);
            }
            Command::Mute | Command::Demute => {
                self.response_fifo.push_back(self.status.to_bits());
                ack(scheduler, ACK_GET_STAT);
            }
            Command::SetMode => {
                self.response_fifo.push_back(self.status.to_bits());
                self.mode = DriveMode::from_bits(self.pop_parameter());
                info!(target: "cdrom", "mode 0x{:02X}", self.mode.to_bits());
                ack(scheduler, ACK_DEFAULT);
            }
            Command::GetTN => {
                // single-track image: first and last track are both 1
                self.response_fifo.push_back(self.status.to_bits());
                self.response_fifo.push_back(0x01);
                self.response_fifo.push_back(0x01);
                ack(scheduler, ACK_GET_STAT);
            }
            Command::GetTD => {
                let _track = self.pop_parameter();

                // data starts right after the two second lead-in
                self.response_fifo.push_back(self.status.to_bits());
                self.response_fifo.push_back(0x00);
                self.response_fifo.push_back(0x02);
                ack(scheduler, ACK_GET_STAT);
            }
            Command::SeekL => {
                self.response_fifo.push_back(self.status.to_bits());
                ack(scheduler, ACK_DEFAULT);

                self.status.set_seeking(true);
                self.complete_clears = 1 << 6; // seek finishes when INT2 lands

                self.response_fifo.push_back(self.status.to_bits());
                scheduler.schedule(Event::CdromIrq(2), COMPLETE_SEEK);
            }
            Command::Test => {
                let sub = self.pop_parameter();
                match sub {
                    // GetBIOSDate
                    0x20 => {
                        self.response_fifo.extend([0x94, 0x09, 0x19, 0xC0]);
                        ack(scheduler, ACK_GET_STAT);
                    }
                    _ => panic!("unhandled CDROM test subcommand 0x{sub:02X}"),
                }
            }
            Command::GetID => {
                self.response_fifo.push_back(self.status.to_bits());
                ack(scheduler, ACK_DEFAULT);

                // licensed, mode 2
                self.response_fifo
                    .extend([0x02, 0x00, 0x20, 0x00, b'M', b'A', b'R', b'I']);
                scheduler.schedule(Event::CdromIrq(2), COMPLETE_GET_ID);
            }
            Command::ReadTOC => {
                self.response_fifo.push_back(self.status.to_bits());
                ack(scheduler, ACK_DEFAULT);

                self.response_fifo.push_back(self.status.to_bits());
                scheduler.schedule(Event::CdromIrq(2), COMPLETE_READ_TOC);
            }
        }
    }
}
