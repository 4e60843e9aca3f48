//! Items related to memory mapped IO.
//!
//! The SPU window (`0x1F80_1C00..0x1F80_1E80`) is not listed here; its dense, regular register
//! file is decoded arithmetically by the SPU itself.

use super::{Address, PhysicalAddress};
use crate::{cdrom, dma, timers};
use strum::VariantArray;

/// A memory mapped register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, VariantArray)]
pub enum Reg {
    // Memory Control 1
    Expansion1Base = 0x1F80_1000,
    Expansion2Base = 0x1F80_1004,
    Expansion1Delay = 0x1F80_1008,
    Expansion3Delay = 0x1F80_100C,
    BiosDelay = 0x1F80_1010,
    SpuDelay = 0x1F80_1014,
    CdromDelay = 0x1F80_1018,
    Expansion2Delay = 0x1F80_101C,
    CommonDelay = 0x1F80_1020,

    // Peripheral IO
    JoyData = 0x1F80_1040,
    JoyStat = 0x1F80_1044,
    JoyMode = 0x1F80_1048,
    JoyControl = 0x1F80_104A,
    JoyBaud = 0x1F80_104E,

    // Memory Control 2
    RamSize = 0x1F80_1060,

    // Interrupt Controller
    InterruptStatus = 0x1F80_1070,
    InterruptMask = 0x1F80_1074,

    // DMA
    Dma0Base = 0x1F80_1080,
    Dma0BlockControl = 0x1F80_1084,
    Dma0Control = 0x1F80_1088,

    Dma1Base = 0x1F80_1090,
    Dma1BlockControl = 0x1F80_1094,
    Dma1Control = 0x1F80_1098,

    Dma2Base = 0x1F80_10A0,
    Dma2BlockControl = 0x1F80_10A4,
    Dma2Control = 0x1F80_10A8,

    Dma3Base = 0x1F80_10B0,
    Dma3BlockControl = 0x1F80_10B4,
    Dma3Control = 0x1F80_10B8,

    Dma4Base = 0x1F80_10C0,
    Dma4BlockControl = 0x1F80_10C4,
    Dma4Control = 0x1F80_10C8,

    Dma5Base = 0x1F80_10D0,
    Dma5BlockControl = 0x1F80_10D4,
    Dma5Control = 0x1F80_10D8,

    Dma6Base = 0x1F80_10E0,
    Dma6BlockControl = 0x1F80_10E4,
    Dma6Control = 0x1F80_10E8,

    DmaControl = 0x1F80_10F0,
    DmaInterrupt = 0x1F80_10F4,

    // Timers
    Timer0Count = 0x1F80_1100,
    Timer0Mode = 0x1F80_1104,
    Timer0Target = 0x1F80_1108,
    Timer1Count = 0x1F80_1110,
    Timer1Mode = 0x1F80_1114,
    Timer1Target = 0x1F80_1118,
    Timer2Count = 0x1F80_1120,
    Timer2Mode = 0x1F80_1124,
    Timer2Target = 0x1F80_1128,

    // CDROM
    Cdrom0 = 0x1F80_1800,
    Cdrom1 = 0x1F80_1801,
    Cdrom2 = 0x1F80_1802,
    Cdrom3 = 0x1F80_1803,

    // GPU
    Gp0 = 0x1F80_1810,
    Gp1 = 0x1F80_1814,

    // MDEC
    MdecCommand = 0x1F80_1820,
    MdecStatus = 0x1F80_1824,

    // Expansion Region 2
    Post = 0x1F80_2041,
}

impl Reg {
    /// Returns the address of this register.
    #[inline(always)]
    pub const fn address(self) -> PhysicalAddress {
        match PhysicalAddress::new(self as u32) {
            Some(addr) => addr,
            None => unreachable!(),
        }
    }

    /// Returns the width of this register, in bytes.
    pub const fn width(self) -> usize {
        match self {
            Reg::JoyMode | Reg::JoyControl | Reg::JoyBaud => 2,
            Reg::Cdrom0 | Reg::Cdrom1 | Reg::Cdrom2 | Reg::Cdrom3 | Reg::Post => 1,
            _ => 4,
        }
    }

    /// Returns the offset of the given address with respect to this register, but only if it is
    /// contained inside the register's range `addr..(addr + width)`.
    #[inline(always)]
    pub fn offset(self, addr: Address) -> Option<usize> {
        let reg_addr = self.address();
        addr.physical()?
            .value()
            .checked_sub(reg_addr.value())
            .and_then(|offset| {
                let offset = offset as usize;
                (offset < 4 && offset < self.width()).then_some(offset)
            })
    }

    /// The DMA channel this register belongs to, if any.
    pub fn dma_channel(&self) -> Option<dma::Channel> {
        Some(match self {
            Reg::Dma0Base | Reg::Dma0BlockControl | Reg::Dma0Control => dma::Channel::MdecIn,
            Reg::Dma1Base | Reg::Dma1BlockControl | Reg::Dma1Control => dma::Channel::MdecOut,
            Reg::Dma2Base | Reg::Dma2BlockControl | Reg::Dma2Control => dma::Channel::Gpu,
            Reg::Dma3Base | Reg::Dma3BlockControl | Reg::Dma3Control => dma::Channel::Cdrom,
            Reg::Dma4Base | Reg::Dma4BlockControl | Reg::Dma4Control => dma::Channel::Spu,
            Reg::Dma5Base | Reg::Dma5BlockControl | Reg::Dma5Control => dma::Channel::Pio,
            Reg::Dma6Base | Reg::Dma6BlockControl | Reg::Dma6Control => dma::Channel::Otc,
            _ => return None,
        })
    }

    /// The timer this register belongs to, if any.
    pub fn timer(&self) -> Option<usize> {
        Some(match self {
            Reg::Timer0Count | Reg::Timer0Mode | Reg::Timer0Target => 0,
            Reg::Timer1Count | Reg::Timer1Mode | Reg::Timer1Target => 1,
            Reg::Timer2Count | Reg::Timer2Mode | Reg::Timer2Target => 2,
            _ => return None,
        })
    }

    /// The timer register kind, if this is a timer register.
    pub fn timer_reg(&self) -> Option<timers::Reg> {
        Some(match self {
            Reg::Timer0Count | Reg::Timer1Count | Reg::Timer2Count => timers::Reg::Count,
            Reg::Timer0Mode | Reg::Timer1Mode | Reg::Timer2Mode => timers::Reg::Mode,
            Reg::Timer0Target | Reg::Timer1Target | Reg::Timer2Target => timers::Reg::Target,
            _ => return None,
        })
    }

    /// The CDROM register index, if this is a CDROM register.
    pub fn cdrom_reg(&self) -> Option<cdrom::Reg> {
        Some(match self {
            Reg::Cdrom0 => cdrom::Reg::Reg0,
            Reg::Cdrom1 => cdrom::Reg::Reg1,
            Reg::Cdrom2 => cdrom::Reg::Reg2,
            Reg::Cdrom3 => cdrom::Reg::Reg3,
            _ => return None,
        })
    }

    /// Returns the register a given address falls inside, if any, and the offset of the address
    /// within it.
    pub fn reg_and_offset(addr: Address) -> Option<(Reg, usize)> {
        for reg in Self::VARIANTS {
            if let Some(offset) = reg.offset(addr) {
                return Some((*reg, offset));
            }
        }

        None
    }
}
