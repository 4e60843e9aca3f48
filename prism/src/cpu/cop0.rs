//! The system control coprocessor, COP0.

use bitos::bitos;
use strum::IntoStaticStr;

/// A COP0 exception kind, as written to `CAUSE.ExcCode`.
#[bitos(5)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoStaticStr)]
pub enum Exception {
    #[default]
    Interrupt = 0x00,
    /// Misaligned or unmapped load (also instruction fetch).
    AddressErrorLoad = 0x04,
    /// Misaligned or unmapped store.
    AddressErrorStore = 0x05,
    SystemCall = 0x08,
    Breakpoint = 0x09,
    ReservedInstruction = 0x0A,
    CopUnusable = 0x0B,
    ArithmeticOverflow = 0x0C,
}

/// A register of COP0.
#[bitos(5)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    R16,
    R17,
    R18,
    R19,
    R20,
    R21,
    R22,
    R23,
    R24,
    R25,
    R26,
    R27,
    R28,
    R29,
    R30,
    R31,
}

impl Reg {
    pub const BPC: Reg = Reg::R3;
    pub const BDA: Reg = Reg::R5;
    pub const JUMPDEST: Reg = Reg::R6;
    pub const DCIC: Reg = Reg::R7;
    pub const BAD_VADDR: Reg = Reg::R8;
    pub const BDAM: Reg = Reg::R9;
    pub const BPCM: Reg = Reg::R11;
    pub const SR: Reg = Reg::R12;
    pub const CAUSE: Reg = Reg::R13;
    pub const EPC: Reg = Reg::R14;
    pub const PRID: Reg = Reg::R15;
}

/// The `SR` system status register.
///
/// The interrupt-enable/kernel-user pair is a three entry hardware stack in the low six bits:
/// exception entry pushes it (new mode = kernel with interrupts disabled), `RFE` pops it.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStatus {
    /// `IEc`: are interrupts enabled right now?
    #[bits(0)]
    pub system_interrupts_enabled: bool,
    /// `KUc`: is the CPU in user mode right now?
    #[bits(1)]
    pub user_mode: bool,

    #[bits(2)]
    pub previous_interrupts_enabled: bool,
    #[bits(3)]
    pub previous_user_mode: bool,
    #[bits(4)]
    pub old_interrupts_enabled: bool,
    #[bits(5)]
    pub old_user_mode: bool,

    /// Per-source interrupt mask for the eight `CAUSE.IP` bits.
    #[bits(8..16)]
    pub interrupt_mask: u8,

    /// While set, stores bypass memory entirely. The BIOS uses this to flush the instruction
    /// cache.
    #[bits(16)]
    pub isolate_cache: bool,
    /// Swap instruction and data caches.
    #[bits(17)]
    pub swap_caches: bool,

    /// `BEV`: take exceptions through the BIOS ROM vector instead of the RAM one.
    #[bits(22)]
    pub boot_exception_vectors_in_kseg1: bool,

    /// COP0 usable in user mode.
    #[bits(28)]
    pub cop0_enabled_in_user_mode: bool,
    #[bits(29)]
    pub cop1_enabled: bool,
    #[bits(30)]
    pub cop2_enabled: bool,
    #[bits(31)]
    pub cop3_enabled: bool,
}

impl SystemStatus {
    /// Pushes the KU/IE stack: current and previous shift up, the new mode is kernel with
    /// interrupts disabled.
    pub fn start_exception(&mut self) {
        let bits = self.to_bits();
        *self = Self::from_bits((bits & !0x3F) | ((bits << 2) & 0x3F));
    }

    /// Pops the KU/IE stack, restoring the pre-exception mode. The old entry is left in place.
    pub fn restore_from_exception(&mut self) {
        let bits = self.to_bits();
        *self = Self::from_bits((bits & !0x0F) | ((bits >> 2) & 0x0F));
    }
}

/// The `CAUSE` exception cause register.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Cause {
    /// What caused the latest exception. [`None`] for ExcCode values the PSX never produces.
    #[bits(2..7)]
    pub exception: Option<Exception>,
    /// Per-source interrupt pending bits. Bit 10 mirrors the external line driven by the
    /// interrupt controller.
    #[bits(8..16)]
    pub interrupt_pending: u8,
    /// The coprocessor addressed by a failed coprocessor instruction.
    #[bits(28..30)]
    pub cop_number: bitos::integer::u2,
    /// Whether the exception was taken in a branch delay slot. `EPC` then points at the branch.
    #[bits(31)]
    pub branch_delay: bool,
}

impl Cause {
    /// Drives the external interrupt line (`IP` bit 10, mask bit `0x400`).
    #[inline(always)]
    pub fn set_external_interrupt(&mut self, asserted: bool) {
        self.set_interrupt_pending((self.interrupt_pending() & !0x04) | ((asserted as u8) << 2));
    }
}

/// The value `PRID` reads as: revision 2 of the CPU control chip.
const PRID_VALUE: u32 = 0x0000_0002;

/// A pending COP0 register load (MTC0 commits one instruction late, like memory loads).
#[derive(Debug, Clone, Copy)]
pub struct RegLoad {
    pub reg: Reg,
    pub value: u32,
}

/// The registers of COP0.
#[derive(Debug, Clone)]
pub struct Registers {
    system_status: SystemStatus,
    cause: Cause,
    epc: u32,
    bad_vaddr: u32,
    /// Breakpoint and misc registers the BIOS pokes but the core does not act on.
    scratch: [u32; 16],
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            // out of reset, exceptions vector through the BIOS ROM
            system_status: SystemStatus::default().with_boot_exception_vectors_in_kseg1(true),
            cause: Cause::default(),
            epc: 0,
            bad_vaddr: 0,
            scratch: [0; 16],
        }
    }
}

impl Registers {
    #[inline(always)]
    pub fn system_status(&self) -> SystemStatus {
        self.system_status
    }

    #[inline(always)]
    pub fn system_status_mut(&mut self) -> &mut SystemStatus {
        &mut self.system_status
    }

    #[inline(always)]
    pub fn cause(&self) -> Cause {
        self.cause
    }

    #[inline(always)]
    pub fn cause_mut(&mut self) -> &mut Cause {
        &mut self.cause
    }

    pub fn read(&self, reg: Reg) -> u32 {
        match reg {
            Reg::SR => self.system_status.to_bits(),
            Reg::CAUSE => self.cause.to_bits(),
            Reg::EPC => self.epc,
            Reg::BAD_VADDR => self.bad_vaddr,
            Reg::PRID => PRID_VALUE,
            _ => self.scratch[reg as usize & 0xF],
        }
    }

    pub fn write(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::SR => self.system_status = SystemStatus::from_bits(value),
            Reg::CAUSE => {
                // only the software interrupt bits are writable
                let writable = 0x0000_0300;
                let bits = (self.cause.to_bits() & !writable) | (value & writable);
                self.cause = Cause::from_bits(bits);
            }
            Reg::EPC => self.epc = value,
            // read only
            Reg::BAD_VADDR | Reg::PRID => (),
            _ => self.scratch[reg as usize & 0xF] = value,
        }
    }

    #[inline(always)]
    pub fn write_epc(&mut self, value: u32) {
        self.epc = value;
    }

    #[inline(always)]
    pub fn write_bad_vaddr(&mut self, value: u32) {
        self.bad_vaddr = value;
    }
}

/// The state of COP0.
#[derive(Debug, Clone, Default)]
pub struct Cop0 {
    pub regs: Registers,
    pub load_delay_slot: Option<RegLoad>,
}

#[cfg(test)]
mod tests;
