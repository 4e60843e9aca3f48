//! Items related to the CPU of the PSX, the R3000.

pub mod cop0;
pub mod instr;
pub mod interpreter;

use crate::mem::Address;
use bitos::bitos;
use instr::Instruction;
use strum::IntoStaticStr;

/// The frequency of the CPU, in Hz.
pub const FREQUENCY: u32 = 33_868_800;

/// Address execution starts at after reset.
pub const RESET_VECTOR: Address = Address(0xBFC0_0000);

/// A CPU coprocessor kind.
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum COP {
    /// System control coprocessor.
    COP0,
    /// Floating point unit, absent in the PSX.
    COP1,
    /// The GTE.
    COP2,
    /// Absent in the PSX.
    COP3,
}

/// A general purpose register of the CPU.
///
/// `R0` is the only register with special behaviour: it always evaluates to zero, and writes to
/// it are dropped. Every other variant is plain storage; the conventional ABI names are exposed
/// as associated constants and through [`alt_name`](Reg::alt_name).
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
    pub const ZERO: Reg = Reg::R0;
    pub const AT: Reg = Reg::R1;

    pub const V0: Reg = Reg::R2;
    pub const V1: Reg = Reg::R3;

    pub const A0: Reg = Reg::R4;
    pub const A1: Reg = Reg::R5;
    pub const A2: Reg = Reg::R6;
    pub const A3: Reg = Reg::R7;

    pub const T0: Reg = Reg::R8;
    pub const T1: Reg = Reg::R9;

    pub const S0: Reg = Reg::R16;

    pub const K0: Reg = Reg::R26;
    pub const K1: Reg = Reg::R27;

    pub const GP: Reg = Reg::R28;
    pub const SP: Reg = Reg::R29;
    pub const FP: Reg = Reg::R30;
    pub const RA: Reg = Reg::R31;

    /// The conventional ABI name of this register.
    pub fn alt_name(&self) -> &'static str {
        REG_NAMES[*self as usize]
    }
}

const REG_NAMES: [&str; 32] = [
    "00", "AT", "V0", "V1", "A0", "A1", "A2", "A3", "T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7",
    "S0", "S1", "S2", "S3", "S4", "S5", "S6", "S7", "T8", "T9", "K0", "K1", "GP", "SP", "FP", "RA",
];

/// The registers of the CPU.
#[derive(Clone)]
pub struct Registers {
    gp: [u32; 32],
    hi: u32,
    lo: u32,
    pc: u32,
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Registers");
        for i in 1..32 {
            if self.gp[i] != 0 {
                s.field(REG_NAMES[i], &format_args!("0x{:08X}", self.gp[i]));
            }
        }

        s.field("hi", &format_args!("0x{:08X}", self.hi))
            .field("lo", &format_args!("0x{:08X}", self.lo))
            .field("pc", &format_args!("0x{:08X}", self.pc))
            .finish()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            gp: Default::default(),
            hi: Default::default(),
            lo: Default::default(),
            pc: RESET_VECTOR.value(),
        }
    }
}

impl Registers {
    #[inline(always)]
    pub fn read(&self, reg: Reg) -> u32 {
        self.gp[reg as usize]
    }

    #[inline(always)]
    pub fn write(&mut self, reg: Reg, value: u32) {
        if reg != Reg::R0 {
            self.gp[reg as usize] = value;
        }
    }

    #[inline(always)]
    pub fn read_pc(&self) -> u32 {
        self.pc
    }

    #[inline(always)]
    pub fn write_pc(&mut self, value: u32) {
        self.pc = value;
    }

    #[inline(always)]
    pub fn read_lo(&self) -> u32 {
        self.lo
    }

    #[inline(always)]
    pub fn write_lo(&mut self, value: u32) {
        self.lo = value;
    }

    #[inline(always)]
    pub fn read_hi(&self) -> u32 {
        self.hi
    }

    #[inline(always)]
    pub fn write_hi(&mut self, value: u32) {
        self.hi = value;
    }
}

/// A pending load operation, sitting in the load delay slot.
#[derive(Debug, Clone, Copy)]
pub struct RegLoad {
    pub reg: Reg,
    pub value: u32,
}

/// The state of the CPU.
///
/// `instr_delay_slot` models the fetch pipeline: it holds the already fetched instruction that
/// executes next, along with its address. Taken branches overwrite the PC *behind* it, which is
/// what makes the instruction after a branch execute before the jump lands.
#[derive(Debug, Clone)]
pub struct Cpu {
    pub regs: Registers,
    pub instr_delay_slot: (Instruction, Address),
    pub load_delay_slot: Option<RegLoad>,
    pub cache_control: u32,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            regs: Registers::default(),
            instr_delay_slot: (Instruction::NOP, RESET_VECTOR),
            load_delay_slot: None,
            cache_control: 0,
        }
    }
}
