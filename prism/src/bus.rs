//! Address decoding and peripheral dispatch.
//!
//! All CPU and DMA traffic funnels through [`PSX::read`] and [`PSX::write`]. The region bits of
//! the virtual address are masked off, the physical region selected, and IO port accesses routed
//! to the owning peripheral. The `SILENT` parameter suppresses access logging for DMA traffic.

use crate::{
    PSX,
    dma::{self, executor},
    interrupts::Interrupt,
    mem::{Address, Primitive, PrimitiveRw, Region, io},
};
use log::{debug, trace, warn};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error)]
#[error("address {addr} is misaligned (expected alignment of {alignment})")]
pub struct MisalignedAddressErr {
    pub addr: Address,
    pub alignment: u32,
}

/// A failed bus write. The CPU turns both cases into a store address error.
#[derive(Debug, Clone, Copy, Error)]
pub enum BusWriteErr {
    #[error(transparent)]
    Misaligned(MisalignedAddressErr),
    /// Store to read-only memory. Only legal while the cache is isolated, in which case it is
    /// swallowed instead of reported.
    #[error("write to BIOS ROM at {addr}")]
    Rom { addr: Address },
}

/// Splices a primitive into a register value at a byte offset, little endian.
#[inline(always)]
fn merge<P: Primitive>(current: u32, offset: usize, value: P) -> u32 {
    let mut bytes = current.to_le_bytes();
    value.write_to(&mut bytes[offset..]);
    u32::from_le_bytes(bytes)
}

/// Extracts a primitive from a register value at a byte offset, little endian.
#[inline(always)]
fn extract<P: Primitive>(value: u32, offset: usize) -> P {
    P::read_from(&value.to_le_bytes()[offset..])
}

/// Start of the SPU register window, relative to the IO port base.
const SPU_WINDOW: std::ops::Range<u32> = 0xC00..0xE80;

impl PSX {
    fn read_io_ports<P, const SILENT: bool>(&mut self, addr: Address) -> P
    where
        P: Primitive,
    {
        let phys = addr.physical().unwrap();
        let io_offset = phys.value() - Region::IOPorts.start().value();

        // the SPU register file is dense and regular; decode it arithmetically
        if SPU_WINDOW.contains(&io_offset) {
            let offset = io_offset - SPU_WINDOW.start;
            let value = match size_of::<P>() {
                4 => {
                    let low = u32::from(self.spu.read(offset));
                    let high = u32::from(self.spu.read(offset + 2));
                    low | (high << 16)
                }
                _ => u32::from(self.spu.read(offset & !1)) >> (8 * (offset & 1)),
            };
            return extract(value, 0);
        }

        let Some((reg, offset)) = io::Reg::reg_and_offset(addr) else {
            if !SILENT {
                warn!(
                    target: "bus",
                    "{} byte read from unknown IO port {addr}",
                    size_of::<P>(),
                );
            }

            return self.memory.io_stubs[io_offset as usize..].read();
        };

        if !SILENT {
            trace!(target: "bus", "{} byte read from {reg:?}+{offset} ({addr})", size_of::<P>());
        }

        match reg {
            io::Reg::InterruptStatus => {
                extract(u32::from(self.interrupts.status.to_bits()), offset)
            }
            io::Reg::InterruptMask => extract(u32::from(self.interrupts.mask.to_bits()), offset),

            io::Reg::JoyData => {
                let data = [self.sio0.read_rx(), 0xFF, 0xFF, 0xFF];
                P::read_from(&data[offset..])
            }
            io::Reg::JoyStat => extract(u32::from(self.sio0.status.to_bits()), offset),
            io::Reg::JoyMode => extract(u32::from(self.sio0.mode.to_bits()), offset),
            io::Reg::JoyControl => extract(u32::from(self.sio0.control.to_bits()), offset),
            io::Reg::JoyBaud => extract(u32::from(self.sio0.baud), offset),

            _ if reg.dma_channel().is_some() => {
                let channel = &self.dma.channels[reg.dma_channel().unwrap() as usize];
                let value = match reg {
                    io::Reg::Dma0Base
                    | io::Reg::Dma1Base
                    | io::Reg::Dma2Base
                    | io::Reg::Dma3Base
                    | io::Reg::Dma4Base
                    | io::Reg::Dma5Base
                    | io::Reg::Dma6Base => channel.base.to_bits(),
                    io::Reg::Dma0BlockControl
                    | io::Reg::Dma1BlockControl
                    | io::Reg::Dma2BlockControl
                    | io::Reg::Dma3BlockControl
                    | io::Reg::Dma4BlockControl
                    | io::Reg::Dma5BlockControl
                    | io::Reg::Dma6BlockControl => channel.block_control.to_bits(),
                    _ => channel.control.to_bits(),
                };

                extract(value, offset)
            }
            io::Reg::DmaControl => extract(self.dma.control.to_bits(), offset),
            io::Reg::DmaInterrupt => extract(self.dma.interrupt_control.to_bits(), offset),

            _ if reg.timer().is_some() => {
                let channel = reg.timer().unwrap();
                let value = self.timers.read(channel, reg.timer_reg().unwrap());
                extract(u32::from(value), offset)
            }

            io::Reg::Cdrom0 | io::Reg::Cdrom1 | io::Reg::Cdrom2 | io::Reg::Cdrom3 => {
                let value = self.cdrom.read(reg.cdrom_reg().unwrap());
                P::read_from(&[value])
            }

            io::Reg::Gp0 => extract(self.gpu.gpuread(), offset),
            io::Reg::Gp1 => extract(self.gpu.status.to_bits(), offset),

            // no MDEC core: report idle with empty FIFOs
            io::Reg::MdecStatus => extract(0x8004_0000, offset),

            _ => self.memory.io_stubs[io_offset as usize..].read(),
        }
    }

    fn write_io_ports<P, const SILENT: bool>(&mut self, addr: Address, value: P)
    where
        P: Primitive,
    {
        let phys = addr.physical().unwrap();
        let io_offset = phys.value() - Region::IOPorts.start().value();

        if SPU_WINDOW.contains(&io_offset) {
            let offset = io_offset - SPU_WINDOW.start;
            match size_of::<P>() {
                2 => self.spu.write(offset, merge(0, 0, value) as u16),
                4 => {
                    let word = merge(0, 0, value);
                    self.spu.write(offset, word as u16);
                    self.spu.write(offset + 2, (word >> 16) as u16);
                }
                _ => warn!(target: "spu", "ignoring byte write to SPU register {addr}"),
            }
            return;
        }

        let Some((reg, offset)) = io::Reg::reg_and_offset(addr) else {
            if !SILENT {
                warn!(
                    target: "bus",
                    "{} byte write to unknown IO port {addr}: 0x{value:X}",
                    size_of::<P>(),
                );
            }

            self.memory.io_stubs[io_offset as usize..].write(value);
            return;
        };

        if !SILENT {
            debug!(
                target: "bus",
                "{} byte write to {reg:?}+{offset} ({addr}): 0x{value:X}",
                size_of::<P>(),
            );
        }

        match reg {
            io::Reg::InterruptStatus => {
                // bytes not covered by the write keep their bits
                let keep = merge(0xFFFF_FFFF, offset, value) as u16;
                self.interrupts.acknowledge(keep);
            }
            io::Reg::InterruptMask => {
                let current = u32::from(self.interrupts.mask.to_bits());
                self.interrupts.mask =
                    crate::interrupts::Mask::from_bits(merge(current, offset, value) as u16);
            }

            io::Reg::JoyData => {
                let byte = merge(0, 0, value) as u8;
                let PSX {
                    sio0, scheduler, ..
                } = self;
                sio0.write_tx(scheduler, byte);
            }
            io::Reg::JoyStat => (), // read only
            io::Reg::JoyMode => {
                let current = u32::from(self.sio0.mode.to_bits());
                self.sio0.mode =
                    crate::sio0::JoyMode::from_bits(merge(current, offset, value) as u16);
            }
            io::Reg::JoyControl => {
                let current = u32::from(self.sio0.control.to_bits());
                self.sio0.write_control(merge(current, offset, value) as u16);
            }
            io::Reg::JoyBaud => {
                self.sio0.baud = merge(u32::from(self.sio0.baud), offset, value) as u16;
            }

            _ if reg.dma_channel().is_some() => {
                let channel = reg.dma_channel().unwrap();
                let state = &mut self.dma.channels[channel as usize];

                match reg {
                    io::Reg::Dma0Base
                    | io::Reg::Dma1Base
                    | io::Reg::Dma2Base
                    | io::Reg::Dma3Base
                    | io::Reg::Dma4Base
                    | io::Reg::Dma5Base
                    | io::Reg::Dma6Base => {
                        let merged = merge(state.base.to_bits(), offset, value);
                        state.base = dma::ChannelBase::from_bits(merged & 0x00FF_FFFC);
                    }
                    io::Reg::Dma0BlockControl
                    | io::Reg::Dma1BlockControl
                    | io::Reg::Dma2BlockControl
                    | io::Reg::Dma3BlockControl
                    | io::Reg::Dma4BlockControl
                    | io::Reg::Dma5BlockControl
                    | io::Reg::Dma6BlockControl => {
                        let merged = merge(state.block_control.to_bits(), offset, value);
                        state.block_control = dma::ChannelBlockControl::from_bits(merged);
                    }
                    io::Reg::Dma6Control => {
                        // OTC is hardwired to a backwards burst
                        let merged = merge(state.control.to_bits(), offset, value);
                        state.control = dma::ChannelControl::from_bits(
                            (merged & dma::ChannelControl::OTC_WRITE_MASK) | (1 << 1),
                        );
                    }
                    _ => {
                        let merged = merge(state.control.to_bits(), offset, value);
                        state.control = dma::ChannelControl::from_bits(merged);
                    }
                }

                executor::update(self);
            }
            io::Reg::DmaControl => {
                let merged = merge(self.dma.control.to_bits(), offset, value);
                self.dma.control = dma::Control::from_bits(merged);
                executor::update(self);
            }
            io::Reg::DmaInterrupt => {
                // unwritten flag bytes must not self-acknowledge
                let base = self.dma.interrupt_control.to_bits()
                    & dma::InterruptControl::WRITE_MASK;
                let merged = merge(base, offset, value);
                self.dma.interrupt_control.write(merged);

                if self.dma.interrupt_control.update_master_flag() {
                    self.interrupts.request(Interrupt::Dma);
                }
            }

            _ if reg.timer().is_some() => {
                let channel = reg.timer().unwrap();
                let kind = reg.timer_reg().unwrap();
                self.timers
                    .write(channel, kind, merge(0, offset, value) as u16);
            }

            io::Reg::Cdrom0 | io::Reg::Cdrom1 | io::Reg::Cdrom2 | io::Reg::Cdrom3 => {
                let byte = merge(0, 0, value) as u8;
                let PSX {
                    cdrom,
                    scheduler,
                    interrupts,
                    ..
                } = self;
                cdrom.write(scheduler, interrupts, reg.cdrom_reg().unwrap(), byte);
            }

            io::Reg::Gp0 => {
                let word = merge(0, offset, value);
                self.gpu.gp0_write(word);

                if std::mem::take(&mut self.gpu.irq_pending) {
                    self.interrupts.request(Interrupt::Gpu);
                }
            }
            io::Reg::Gp1 => {
                let word = merge(0, offset, value);
                self.gpu.gp1_write(word);
            }

            io::Reg::MdecCommand | io::Reg::MdecStatus => {
                warn!(target: "bus", "ignoring MDEC write: 0x{value:X}");
            }

            _ => self.memory.io_stubs[io_offset as usize..].write(value),
        }
    }

    /// Reads a primitive without checking alignment.
    pub fn read_unaligned<P, const SILENT: bool>(&mut self, addr: Address) -> P
    where
        P: Primitive,
    {
        let Some(phys) = addr.physical() else {
            // KSEG2 only holds the cache control register
            return extract(self.cpu.cache_control, 0);
        };

        let Some(region) = phys.region() else {
            if !SILENT {
                warn!(target: "bus", "read from unmapped address {addr} ({phys})");
            }

            return P::read_from(&[0, 0, 0, 0]);
        };

        let offset = (phys.value() - region.start().value()) as usize;
        match region {
            Region::Ram => self.memory.ram[offset..].read(),
            Region::RamMirror => self.memory.ram[offset & 0x001F_FFFF..].read(),
            Region::ScratchPad => self.memory.scratchpad[offset..].read(),
            Region::IOPorts => self.read_io_ports::<P, SILENT>(addr),
            Region::Expansion2 => self.memory.io_stubs[offset & 0xFFF..].read(),
            Region::Bios => self.memory.bios[offset..].read(),
        }
    }

    /// Reads a primitive, faulting on misaligned addresses.
    #[inline(always)]
    pub fn read<P, const SILENT: bool>(&mut self, addr: Address) -> Result<P, MisalignedAddressErr>
    where
        P: Primitive,
    {
        if addr.is_aligned(P::ALIGNMENT) {
            Ok(self.read_unaligned::<P, SILENT>(addr))
        } else {
            Err(MisalignedAddressErr {
                addr,
                alignment: P::ALIGNMENT,
            })
        }
    }

    /// Writes a primitive without checking alignment. Fails on stores to read-only memory.
    pub fn write_unaligned<P, const SILENT: bool>(
        &mut self,
        addr: Address,
        value: P,
    ) -> Result<(), BusWriteErr>
    where
        P: Primitive,
    {
        let Some(phys) = addr.physical() else {
            self.cpu.cache_control = merge(self.cpu.cache_control, 0, value);
            return Ok(());
        };

        let Some(region) = phys.region() else {
            if !SILENT {
                warn!(target: "bus", "write to unmapped address {addr} ({phys}): 0x{value:X}");
            }
            return Ok(());
        };

        let offset = (phys.value() - region.start().value()) as usize;
        match region {
            Region::Ram => self.memory.ram[offset..].write(value),
            Region::RamMirror => self.memory.ram[offset & 0x001F_FFFF..].write(value),
            Region::ScratchPad => self.memory.scratchpad[offset..].write(value),
            Region::IOPorts => self.write_io_ports::<P, SILENT>(addr, value),
            Region::Expansion2 => self.memory.io_stubs[offset & 0xFFF..].write(value),
            Region::Bios => {
                // ROM: stores disappear while the cache is isolated and fault otherwise
                if !self.cop0.regs.system_status().isolate_cache() {
                    return Err(BusWriteErr::Rom { addr });
                }
            }
        }

        Ok(())
    }

    /// Writes a primitive, faulting on misaligned addresses and stores to read-only memory.
    #[inline(always)]
    pub fn write<P, const SILENT: bool>(
        &mut self,
        addr: Address,
        value: P,
    ) -> Result<(), BusWriteErr>
    where
        P: Primitive,
    {
        if addr.is_aligned(P::ALIGNMENT) {
            self.write_unaligned::<P, SILENT>(addr, value)
        } else {
            Err(BusWriteErr::Misaligned(MisalignedAddressErr {
                addr,
                alignment: P::ALIGNMENT,
            }))
        }
    }
}

#[cfg(test)]
mod tests;
