//! The event scheduler of the [`PSX`](super::PSX).

use crate::dma;

/// Maximum amount of cycles the CPU is allowed to run before the queue is drained.
const MAX_RUN_CYCLES: i64 = 64;

/// Possible schedule events.
///
/// Peripherals make progress exclusively through these: there are no callbacks, just data. The
/// emulator matches on the popped variant and dispatches to the owning subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Advance the GPU by one scanline.
    Scanline,
    /// Make a CDROM interrupt of the given class (INT1..INT5) pending.
    CdromIrq(u8),
    /// Finish a controller exchange by pushing the payload into the RX queue.
    SioAck(u8),
    /// Mix one stereo sample pair on the SPU.
    SpuSample,
    /// Finish the DMA transfer on the given channel.
    DmaEnd(dma::Channel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    event: Event,
    /// Cycles left until this entry fires. Never negative while it sits in the live queue.
    remaining: i64,
}

/// The event scheduler of the [`PSX`](super::PSX).
///
/// Deadlines are relative: every live entry counts down as the CPU consumes cycles and fires when
/// it reaches zero. Events scheduled while the queue is being drained land in a staging queue
/// first and are merged in afterwards, so a handler can never invalidate the drain it is running
/// under. Simultaneous events fire in insertion order.
#[derive(Debug)]
pub struct Scheduler {
    live: Vec<Scheduled>,
    staged: Vec<Scheduled>,
    /// Events that have reached their deadline during [`advance`](Self::advance), paired with
    /// their (non-positive) overshoot.
    due: Vec<(Event, i64)>,
    /// Cached distance to the earliest live deadline.
    until_next: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            live: Vec::with_capacity(16),
            staged: Vec::with_capacity(16),
            due: Vec::with_capacity(8),
            until_next: i64::MAX,
        }
    }

    /// Enqueues `event` to fire after `after` cycles. May be called from within an event handler;
    /// the entry only becomes visible once the current drain finishes.
    pub fn schedule(&mut self, event: Event, after: i64) {
        assert!(after >= 0, "scheduled {event:?} in the past ({after})");
        self.staged.push(Scheduled {
            event,
            remaining: after,
        });
    }

    /// Drops every pending event that does not satisfy `keep`, staged ones included. The entry
    /// currently being handled is unaffected.
    pub fn retain(&mut self, keep: impl Fn(&Event) -> bool) {
        self.live.retain(|s| keep(&s.event));
        self.staged.retain(|s| keep(&s.event));
    }

    /// How many cycles the CPU may run before the next deadline, capped to the quantum size.
    pub fn run_cycles(&self) -> i64 {
        MAX_RUN_CYCLES.min(self.until_next).max(1)
    }

    /// Consumes `elapsed` cycles: every live entry counts down and entries that reach their
    /// deadline become due, preserving insertion order. Retrieve them with
    /// [`pop_due`](Self::pop_due) and finish with [`merge`](Self::merge).
    pub fn advance(&mut self, elapsed: i64) {
        self.until_next = self.until_next.saturating_sub(elapsed);

        let mut i = 0;
        while i < self.live.len() {
            self.live[i].remaining -= elapsed;

            if self.live[i].remaining <= 0 {
                let fired = self.live.remove(i);
                self.due.push((fired.event, fired.remaining));
            } else {
                i += 1;
            }
        }
    }

    /// Pops the next due event along with its overshoot (zero when the decrement landed exactly
    /// on the deadline, negative when it was skipped past).
    pub fn pop_due(&mut self) -> Option<(Event, i64)> {
        if self.due.is_empty() {
            None
        } else {
            Some(self.due.remove(0))
        }
    }

    /// Merges the staging queue into the live queue and recomputes the next deadline. Must run
    /// after every drain.
    pub fn merge(&mut self) {
        self.live.append(&mut self.staged);
        self.until_next = self
            .live
            .iter()
            .map(|s| s.remaining)
            .min()
            .unwrap_or(i64::MAX);
    }

    /// Amount of pending events, staged ones included.
    pub fn len(&self) -> usize {
        self.live.len() + self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.staged.is_empty()
    }

    /// Cycles until the earliest live deadline.
    pub fn until_next(&self) -> i64 {
        self.until_next
    }

    /// True if any pending entry satisfies `pred`.
    pub fn has(&self, pred: impl Fn(&Event) -> bool) -> bool {
        self.live.iter().chain(&self.staged).any(|s| pred(&s.event))
    }
}

#[cfg(test)]
mod tests;
