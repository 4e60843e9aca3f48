//! DMA controller register state.
//!
//! The controller moves bulk data between RAM and a peripheral without the CPU. A channel runs
//! when its `CHCR.start` bit is set, the channel is enabled in `DPCR` and either the peripheral
//! asserts its request line or the forced-start bit is set. The transfer itself is performed by
//! [`executor`](crate::dma::executor); completion is signalled by a scheduled
//! [`DmaEnd`](crate::scheduler::Event::DmaEnd) event which clears the start bit and raises the
//! DMA interrupt through `DICR`.

pub mod executor;

use arrayvec::ArrayVec;
use bitos::{
    bitos,
    integer::{u3, u7, u24},
};
use strum::FromRepr;

/// A DMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum Channel {
    MdecIn = 0,
    MdecOut = 1,
    Gpu = 2,
    Cdrom = 3,
    Spu = 4,
    Pio = 5,
    /// Ordering table clear: writes a backwards linked list into RAM.
    Otc = 6,
}

#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    DeviceToRam = 0x0,
    RamToDevice = 0x1,
}

#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Forward = 0x0,
    Backward = 0x1,
}

#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// All words at once.
    Burst = 0x0,
    /// `BCR.count` blocks of `BCR.len` words.
    Slice = 0x1,
    /// Follow `{next:24, count:8}` node headers through RAM.
    LinkedList = 0x2,
}

/// `D_MADR`: where in RAM the transfer starts.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelBase {
    #[bits(0..24)]
    pub addr: u24,
}

/// `D_BCR`: block length and count.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelBlockControl {
    /// The size of a single block, in words. Zero means `0x10000` for burst transfers.
    #[bits(0..16)]
    pub len: u16,
    /// The amount of blocks to transfer in slice mode.
    #[bits(16..32)]
    pub count: u16,
}

/// `D_CHCR`: channel control.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelControl {
    #[bits(0..1)]
    pub transfer_direction: TransferDirection,
    #[bits(1..2)]
    pub step: Step,
    /// Chopping: yield the bus to the CPU periodically. Ignored by the whole-transfer executor.
    #[bits(8..9)]
    pub chopping: bool,
    #[bits(9..11)]
    pub transfer_mode: Option<TransferMode>,
    #[bits(16..19)]
    pub chopping_dma_window: u3,
    #[bits(20..23)]
    pub chopping_cpu_window: u3,
    /// Whether a transfer is requested or in progress.
    #[bits(24..25)]
    pub start: bool,
    /// Forces the transfer to begin without waiting for the peripheral request line.
    #[bits(28..29)]
    pub force_start: bool,
}

impl ChannelControl {
    /// Only direction, start and forced-start are writable on the OTC channel; everything else
    /// is hardwired.
    pub const OTC_WRITE_MASK: u32 = 0x5100_0000;
}

/// Per-channel state: the three registers plus the peripheral request line.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    pub base: ChannelBase,
    pub block_control: ChannelBlockControl,
    pub control: ChannelControl,
    /// The DRQ line. Peripherals that are always ready keep it asserted.
    pub request: bool,
}

#[bitos(4)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStatus {
    #[bits(0..3)]
    pub priority: u3,
    #[bits(3..4)]
    pub enabled: bool,
}

/// `DPCR`: which channels are enabled and their priorities.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Control {
    #[bits(0..28)]
    pub channel_status: [ChannelStatus; 7],
    #[bits(28..31)]
    pub cpu_priority: u3,
}

impl Control {
    /// Enabled channels, highest priority first.
    pub fn enabled_channels(&self) -> ArrayVec<Channel, 7> {
        let mut channels: ArrayVec<(Channel, u8), 7> = self
            .channel_status()
            .into_iter()
            .enumerate()
            .filter_map(|(i, status)| {
                status
                    .enabled()
                    .then(|| (Channel::from_repr(i as u8).unwrap(), status.priority().value()))
            })
            .collect();

        channels.sort_unstable_by_key(|(_, priority)| std::cmp::Reverse(*priority));
        channels.into_iter().map(|(channel, _)| channel).collect()
    }
}

/// `DICR`: DMA interrupt control.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptControl {
    /// Raises the master flag unconditionally.
    #[bits(15..16)]
    pub force_interrupt: bool,
    /// Which channels may raise an interrupt on completion.
    #[bits(16..23)]
    pub channel_mask: u7,
    /// Master enable for the channel completion interrupts.
    #[bits(23..24)]
    pub master_enable: bool,
    /// Per-channel completion flags. Writing 1 clears them.
    #[bits(24..31)]
    pub channel_flags: u7,
    /// Asserted whenever forced or any masked-in channel flag is set. The DMA interrupt fires on
    /// its rising edge.
    #[bits(31..32)]
    pub master_flag: bool,
}

impl InterruptControl {
    /// Bits the guest can write; the flag bits are write-1-to-clear and the master flag is
    /// derived.
    pub const WRITE_MASK: u32 = 0x00FF_8000;

    /// Applies a guest write: control bits are copied, flag bits written as 1 are acknowledged.
    pub fn write(&mut self, value: u32) {
        let control = value & Self::WRITE_MASK;
        let kept_flags = self.channel_flags().value() & !((value >> 24) as u8 & 0x7F);

        let bits = (self.to_bits() & !Self::WRITE_MASK) | control;
        *self = Self::from_bits(bits);
        self.set_channel_flags(u7::new(kept_flags));
        self.update_master_flag();
    }

    /// Marks the completion flag for `channel` if its mask bit allows it.
    pub fn flag_completion(&mut self, channel: Channel) {
        if self.channel_mask().value() & (1 << channel as u8) != 0 {
            let flags = self.channel_flags().value() | (1 << channel as u8);
            self.set_channel_flags(u7::new(flags));
        }
    }

    /// Recomputes the master flag. Returns `true` on a rising edge, which is when the DMA
    /// interrupt must be sent.
    pub fn update_master_flag(&mut self) -> bool {
        let old = self.master_flag();
        let new = self.force_interrupt()
            || (self.master_enable()
                && self.channel_mask().value() & self.channel_flags().value() != 0);

        self.set_master_flag(new);
        !old && new
    }
}

/// The state of the DMA controller.
#[derive(Debug, Clone)]
pub struct State {
    pub control: Control,
    pub interrupt_control: InterruptControl,
    pub channels: [ChannelState; 7],
}

impl Default for State {
    fn default() -> Self {
        let mut channels: [ChannelState; 7] = Default::default();

        // peripherals that are always ready to transfer
        for channel in [Channel::MdecIn, Channel::Gpu, Channel::Spu, Channel::Otc] {
            channels[channel as usize].request = true;
        }

        Self {
            control: Control::default(),
            interrupt_control: InterruptControl::default(),
            channels,
        }
    }
}
