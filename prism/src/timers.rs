//! The three hardware timers.
//!
//! Timers on the system clock are stepped once per quantum through [`Timers::step`]; timer 1 in
//! HBLANK mode is instead fed one tick per scanline by the GPU. Timer IRQs are edge triggered:
//! the `intf` arm bit fires once and must be re-armed by a MODE write, except in repeat+toggle
//! mode where it toggles.

use crate::interrupts::{Controller as InterruptController, Interrupt};
use bitos::{bitos, integer::u2};
use log::warn;

/// A timer register, selected by bits 2..4 of the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Count,
    Mode,
    Target,
}

/// The `T_MODE` register of a timer.
#[bitos(16)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Mode {
    /// Whether the gate input affects counting.
    #[bits(0)]
    pub gate: bool,
    /// What the gate does: pause during blank, reset at blank, reset and pause outside, or pause
    /// until the first blank.
    #[bits(1..3)]
    pub gate_mode: u2,
    /// Return the counter to zero when it reaches the target.
    #[bits(3)]
    pub reset_at_target: bool,
    /// Raise an interrupt when the counter reaches the target.
    #[bits(4)]
    pub irq_at_target: bool,
    /// Raise an interrupt when the counter overflows.
    #[bits(5)]
    pub irq_at_overflow: bool,
    /// Repeat interrupts instead of firing once.
    #[bits(6)]
    pub irq_repeat: bool,
    /// Toggle the arm bit on each interrupt instead of pulsing it.
    #[bits(7)]
    pub irq_toggle: bool,
    /// Clock source selector. Sources other than the system clock depend on the channel.
    #[bits(8..10)]
    pub clock_source: u2,
    /// Interrupt arm flag. Set on MODE write; interrupts only go through while it is set.
    #[bits(10)]
    pub irq_armed: bool,
    /// The counter reached the target since MODE was last read.
    #[bits(11)]
    pub reached_target: bool,
    /// The counter overflowed since MODE was last read.
    #[bits(12)]
    pub overflowed: bool,
}

/// A single 16 bit timer channel.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    pub mode: Mode,
    /// Current count. Kept one bit wider than the register so overflow is observable.
    count: u32,
    target: u16,

    /// Input clock divider and the cycles accumulated towards the next tick.
    prescaler: u16,
    subcount: u16,

    paused: bool,
}

/// Approximate CPU cycles per dot clock tick in the common 320 pixel mode.
const DOTCLOCK_PRESCALER: u16 = 5;

impl Timer {
    /// Applies one tick worth of counting, returning whether an interrupt should be delivered.
    fn tick(&mut self) -> bool {
        let mut irq = false;
        self.count += 1;

        if self.count & (1 << 16) != 0 {
            // edge triggered: only the first overflow since the flag was read counts
            if self.mode.irq_at_overflow() && !self.mode.overflowed() {
                self.mode.set_overflowed(true);
                irq = true;
            }
        }

        if self.count == u32::from(self.target) {
            if self.mode.irq_at_target() && !self.mode.reached_target() {
                self.mode.set_reached_target(true);
                irq = true;
            }

            if self.mode.reset_at_target() {
                self.count = 0;
            }
        }

        self.count &= 0xFFFF;
        irq
    }
}

/// The state of the three timers.
#[derive(Debug, Clone)]
pub struct Timers {
    timers: [Timer; 3],
}

impl Default for Timers {
    fn default() -> Self {
        let mut timers: [Timer; 3] = Default::default();
        for timer in &mut timers {
            timer.prescaler = 1;
        }

        Self { timers }
    }
}

impl Timers {
    /// Delivers a timer interrupt edge and updates the arm flag according to the repeat/toggle
    /// mode.
    fn send_interrupt(timer: &mut Timer, channel: usize, interrupts: &mut InterruptController) {
        if timer.mode.irq_armed() {
            let source = match channel {
                0 => Interrupt::Timer0,
                1 => Interrupt::Timer1,
                _ => Interrupt::Timer2,
            };
            interrupts.request(source);
        }

        if timer.mode.irq_repeat() && timer.mode.irq_toggle() {
            timer.mode.set_irq_armed(!timer.mode.irq_armed());
        } else {
            timer.mode.set_irq_armed(false);
        }
    }

    /// Steps every timer clocked from the system clock by `cycles`.
    pub fn step(&mut self, cycles: i64, interrupts: &mut InterruptController) {
        for channel in 0..3 {
            let timer = &mut self.timers[channel];

            // timer 1 with an odd clock source counts scanlines instead
            if channel == 1 && timer.mode.clock_source().value() & 1 != 0 {
                continue;
            }

            if timer.paused {
                continue;
            }

            timer.subcount += cycles as u16;
            while timer.subcount >= timer.prescaler {
                timer.subcount -= timer.prescaler;
                if timer.tick() {
                    Self::send_interrupt(timer, channel, interrupts);
                }
            }
        }
    }

    /// Feeds one HBLANK tick to timer 1 when it is in scanline mode.
    pub fn tick_hblank(&mut self, interrupts: &mut InterruptController) {
        let timer = &mut self.timers[1];
        if timer.mode.clock_source().value() & 1 == 0 || timer.paused {
            return;
        }

        if timer.tick() {
            Self::send_interrupt(timer, 1, interrupts);
        }
    }

    /// Applies the timer 1 gate at the start of the vertical blank.
    pub fn gate_vblank_start(&mut self) {
        let timer = &mut self.timers[1];
        if !timer.mode.gate() {
            return;
        }

        match timer.mode.gate_mode().value() {
            0 => timer.paused = true,
            1 => timer.count = 0,
            2 => {
                timer.count = 0;
                timer.paused = false;
            }
            _ => timer.paused = false,
        }
    }

    /// Applies the timer 1 gate at the end of the vertical blank.
    pub fn gate_vblank_end(&mut self) {
        let timer = &mut self.timers[1];
        if !timer.mode.gate() {
            return;
        }

        match timer.mode.gate_mode().value() {
            0 => timer.paused = false,
            2 => timer.paused = true,
            _ => (),
        }
    }

    pub fn read(&mut self, channel: usize, reg: Reg) -> u16 {
        let timer = &mut self.timers[channel];
        match reg {
            Reg::Count => timer.count as u16,
            Reg::Mode => {
                let bits = timer.mode.to_bits();

                // the sticky flags clear on read
                timer.mode.set_reached_target(false);
                timer.mode.set_overflowed(false);

                bits
            }
            Reg::Target => timer.target,
        }
    }

    pub fn write(&mut self, channel: usize, reg: Reg, value: u16) {
        let timer = &mut self.timers[channel];
        match reg {
            Reg::Count => timer.count = u32::from(value),
            Reg::Mode => {
                timer.mode = Mode::from_bits(value);
                timer.mode.set_irq_armed(true);
                timer.paused = false;
                timer.subcount = 0;
                timer.count = 0;

                if timer.mode.gate() {
                    match channel {
                        0 => {
                            // HBLANK gating is far finer grained than the scanline event;
                            // the counter free-runs instead
                            warn!(target: "timer", "ignoring timer 0 gate configuration");
                        }
                        1 => {
                            if matches!(timer.mode.gate_mode().value(), 2 | 3) {
                                timer.paused = true;
                            }
                        }
                        _ => {
                            if matches!(timer.mode.gate_mode().value(), 0 | 3) {
                                timer.paused = true;
                            }
                        }
                    }
                }

                timer.prescaler = match (channel, timer.mode.clock_source().value()) {
                    // timer 2 either counts raw cycles or divides them by eight
                    (2, source) => {
                        if source == 0 {
                            1
                        } else {
                            8
                        }
                    }
                    // timer 0 on the dot clock approximates the common 320 pixel mode
                    (0, source) if source & 1 != 0 => DOTCLOCK_PRESCALER,
                    _ => 1,
                };
            }
            Reg::Target => {
                timer.target = value;

                if !timer.mode.irq_toggle() {
                    timer.mode.set_irq_armed(true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
