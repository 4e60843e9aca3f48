//! Execution of DMA transfers.
//!
//! Transfers run to completion in one go; the bus-arbitration granularity the hardware has is
//! approximated by the completion event, which fires one cycle per transferred word later and
//! performs the interrupt bookkeeping.

use super::{Channel, ChannelControl, Step, TransferDirection, TransferMode};
use crate::{PSX, interrupts::Interrupt, mem::Address, scheduler::Event};
use bitos::integer::u24;
use log::{debug, info, warn};

/// Checks every enabled channel and starts the highest priority one that is requesting a
/// transfer. Runs after every DMA register write.
pub fn update(psx: &mut PSX) {
    for channel in psx.dma.control.enabled_channels() {
        let state = &psx.dma.channels[channel as usize];
        if !state.control.start() {
            continue;
        }

        // a transfer already performed is only waiting for its completion event
        if psx.scheduler.has(|e| matches!(e, Event::DmaEnd(c) if *c == channel)) {
            continue;
        }

        let request = match channel {
            Channel::Cdrom => psx.cdrom.data_ready(),
            _ => state.request,
        };

        if !request && !state.control.force_start() {
            debug!(target: "dma", "{channel:?} started without DRQ, waiting");
            continue;
        }

        run_channel(psx, channel);
    }
}

/// Handles a transfer-end event: releases the channel and raises the DMA interrupt if allowed.
pub fn transfer_end(psx: &mut PSX, channel: Channel) {
    info!(target: "dma", "{channel:?} transfer end");

    let control = &mut psx.dma.channels[channel as usize].control;
    control.set_start(false);
    control.set_force_start(false);

    psx.dma.interrupt_control.flag_completion(channel);
    if psx.dma.interrupt_control.update_master_flag() {
        psx.interrupts.request(Interrupt::Dma);
    }
}

fn run_channel(psx: &mut PSX, channel: Channel) {
    let state = &psx.dma.channels[channel as usize];
    let control = state.control;
    let mode = control.transfer_mode().unwrap_or(TransferMode::Burst);

    info!(
        target: "dma",
        "starting {mode:?} transfer on {channel:?} (madr = {}, bcr = 0x{:08X})",
        Address(state.base.addr().value()),
        state.block_control.to_bits(),
    );

    let words = match mode {
        TransferMode::Burst => transfer_burst(psx, channel),
        TransferMode::Slice => transfer_slice(psx, channel, control),
        TransferMode::LinkedList => transfer_linked(psx, channel),
    };

    // one cycle per word is the pacing budget for the completion interrupt
    psx.scheduler
        .schedule(Event::DmaEnd(channel), words.max(1) as i64);

    // BCR reads back consumed
    let state = &mut psx.dma.channels[channel as usize];
    state.block_control.set_len(0);
    state.block_control.set_count(0);
}

fn transfer_burst(psx: &mut PSX, channel: Channel) -> u32 {
    let state = &psx.dma.channels[channel as usize];
    let base = state.base.addr().value() & !0b11;
    let words = match state.block_control.len() {
        0 => 0x1_0000,
        len => u32::from(len),
    };

    match channel {
        Channel::Otc => {
            // backwards linked clear list: every slot points at the previous one
            let mut addr = base;
            for _ in 1..words {
                let prev = addr.wrapping_sub(4) & 0x00FF_FFFF;
                psx.write::<_, true>(Address(addr), prev).unwrap();
                addr = prev;
            }

            psx.write::<u32, true>(Address(addr), 0x00FF_FFFF).unwrap();
        }
        Channel::Cdrom => {
            let mut addr = base;
            for _ in 0..words {
                let data = psx.cdrom.dma_word();
                psx.write::<_, true>(Address(addr), data).unwrap();
                addr = addr.wrapping_add(4);
            }
        }
        _ => {
            warn!(target: "dma", "unimplemented burst transfer on {channel:?}");
        }
    }

    words
}

fn transfer_slice(psx: &mut PSX, channel: Channel, control: ChannelControl) -> u32 {
    let state = &psx.dma.channels[channel as usize];
    let len = u32::from(state.block_control.len());
    let count = u32::from(state.block_control.count());
    let words = len * count;

    let increment: i32 = match control.step() {
        Step::Forward => 4,
        Step::Backward => -4,
    };

    let mut addr = state.base.addr().value() & !0b11;
    for _ in 0..words {
        match (channel, control.transfer_direction()) {
            (Channel::Gpu, TransferDirection::RamToDevice) => {
                let word = psx.read::<u32, true>(Address(addr)).unwrap();
                psx.gpu.gp0_write(word);
            }
            (Channel::Gpu, TransferDirection::DeviceToRam) => {
                let word = psx.gpu.gpuread();
                psx.write::<_, true>(Address(addr), word).unwrap();
            }
            (Channel::Spu, TransferDirection::RamToDevice) => {
                let word = psx.read::<u32, true>(Address(addr)).unwrap();
                psx.spu.dma_write(word as u16);
                psx.spu.dma_write((word >> 16) as u16);
            }
            (Channel::Spu, TransferDirection::DeviceToRam) => {
                let low = u32::from(psx.spu.dma_read());
                let high = u32::from(psx.spu.dma_read());
                psx.write::<_, true>(Address(addr), low | (high << 16))
                    .unwrap();
            }
            _ => {
                warn!(target: "dma", "unimplemented slice transfer on {channel:?}");
                return words;
            }
        }

        addr = addr.wrapping_add_signed(increment);
    }

    // the address register tracks the transfer
    psx.dma.channels[channel as usize]
        .base
        .set_addr(u24::new(addr & 0x00FF_FFFF));

    words
}

fn transfer_linked(psx: &mut PSX, channel: Channel) -> u32 {
    if channel != Channel::Gpu {
        warn!(target: "dma", "linked list transfer on {channel:?}");
        return 1;
    }

    let mut words = 0u32;
    let mut addr = psx.dma.channels[channel as usize].base.addr().value() & !0b11;

    loop {
        let header = psx.read::<u32, true>(Address(addr)).unwrap();
        let count = header >> 24;
        words += count + 1;

        for i in 0..count {
            let word = psx
                .read::<u32, true>(Address(addr + (i + 1) * 4))
                .unwrap();
            psx.gpu.gp0_write(word);
        }

        // bit 23 terminates the list
        if header & (1 << 23) != 0 {
            break;
        }

        addr = header & 0x001F_FFFC;

        // runaway lists would spin forever; bail out after more nodes than RAM could hold
        if words > 0x20_0000 {
            warn!(target: "dma", "linked list transfer did not terminate");
            break;
        }
    }

    psx.dma.channels[channel as usize]
        .base
        .set_addr(u24::new(0x00FF_FFFF));

    words
}
