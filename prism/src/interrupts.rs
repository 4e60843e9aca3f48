//! Items related to the system interrupt controller.

use bitos::bitos;
use strum::FromRepr;

/// A system interrupt source. All eleven lines are edge triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum Interrupt {
    VBlank = 0x0,
    Gpu = 0x1,
    Cdrom = 0x2,
    Dma = 0x3,
    Timer0 = 0x4,
    Timer1 = 0x5,
    Timer2 = 0x6,
    /// Controller and memory card byte received.
    SioReceive = 0x7,
    Sio = 0x8,
    Spu = 0x9,
    Pio = 0xA,
}

/// `I_STAT`: which system interrupts are currently pending. Bits are sticky; software clears them
/// by writing a mask with the bit low (`I_STAT &= written`).
#[bitos(16)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    #[bits(0..11)]
    pending: [bool; 11],
}

impl std::fmt::Debug for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(
                self.pending()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, set)| set.then(|| Interrupt::from_repr(i).unwrap())),
            )
            .finish()
    }
}

/// `I_MASK`: which system interrupts are allowed through to the CPU. Write-through.
#[bitos(16)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Mask {
    #[bits(0..11)]
    enabled: [bool; 11],
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(
                self.enabled()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, set)| set.then(|| Interrupt::from_repr(i).unwrap())),
            )
            .finish()
    }
}

/// The state of the interrupt controller.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    pub status: Status,
    pub mask: Mask,
}

impl Controller {
    /// Latches the given interrupt into `I_STAT`. A source that is already pending stays pending;
    /// COP0 only observes the combined line, so no second edge is produced.
    #[inline(always)]
    pub fn request(&mut self, interrupt: Interrupt) {
        self.status.set_pending_at(interrupt as usize, true);
    }

    /// Acknowledge write to `I_STAT`: keeps only the bits the written value leaves high.
    pub fn acknowledge(&mut self, written: u16) {
        self.status = Status::from_bits(self.status.to_bits() & written);
    }

    /// The external interrupt line COP0 samples at instruction boundaries: the lowest requested
    /// interrupt that is both pending and unmasked, if any.
    #[inline(always)]
    pub fn pending(&self) -> Option<Interrupt> {
        let masked = self.status.to_bits() & self.mask.to_bits();
        let trailing = masked.trailing_zeros() as usize;
        (trailing < 11).then(|| Interrupt::from_repr(trailing).unwrap())
    }
}

#[cfg(test)]
mod tests;
