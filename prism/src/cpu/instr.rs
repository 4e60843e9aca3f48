//! [`Instruction`], which represents a single MIPS I instruction, and related items.

use super::{COP, Reg};
use bitos::{
    bitos,
    integer::{u5, u20, u25, u26},
};
use strum::IntoStaticStr;

/// The primary opcode of an [`Instruction`].
#[bitos(6)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Opcode {
    SPECIAL = 0x00,
    BZ = 0x01,
    JMP = 0x02,
    JAL = 0x03,
    BEQ = 0x04,
    BNE = 0x05,
    BLEZ = 0x06,
    BGTZ = 0x07,
    ADDI = 0x08,
    ADDIU = 0x09,
    SLTI = 0x0A,
    SLTIU = 0x0B,
    ANDI = 0x0C,
    ORI = 0x0D,
    XORI = 0x0E,
    LUI = 0x0F,
    COP0 = 0x10,
    COP1 = 0x11,
    COP2 = 0x12,
    COP3 = 0x13,
    LB = 0x20,
    LH = 0x21,
    LWL = 0x22,
    LW = 0x23,
    LBU = 0x24,
    LHU = 0x25,
    LWR = 0x26,
    SB = 0x28,
    SH = 0x29,
    SWL = 0x2A,
    SW = 0x2B,
    SWR = 0x2E,
    LWC0 = 0x30,
    LWC1 = 0x31,
    LWC2 = 0x32,
    LWC3 = 0x33,
    SWC0 = 0x38,
    SWC1 = 0x39,
    SWC2 = 0x3A,
    SWC3 = 0x3B,
}

/// The `REGIMM` kind of an [`Instruction`] whose primary opcode is [`Opcode::BZ`]. On hardware,
/// bit 16 selects the direction and bits 17..21 must be `0b1000` for the and-link forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum BZKind {
    BLTZ,
    BGEZ,
    BLTZAL,
    BGEZAL,
}

/// The special opcode of an [`Instruction`] whose primary opcode is [`Opcode::SPECIAL`].
#[bitos(6)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum SpecialOpcode {
    SLL = 0x00,
    SRL = 0x02,
    SRA = 0x03,
    SLLV = 0x04,
    SRLV = 0x06,
    SRAV = 0x07,
    JR = 0x08,
    JALR = 0x09,
    SYSCALL = 0x0C,
    BREAK = 0x0D,
    MFHI = 0x10,
    MTHI = 0x11,
    MFLO = 0x12,
    MTLO = 0x13,
    MULT = 0x18,
    MULTU = 0x19,
    DIV = 0x1A,
    DIVU = 0x1B,
    ADD = 0x20,
    ADDU = 0x21,
    SUB = 0x22,
    SUBU = 0x23,
    AND = 0x24,
    OR = 0x25,
    XOR = 0x26,
    NOR = 0x27,
    SLT = 0x2A,
    SLTU = 0x2B,
}

/// The coprocessor transfer opcode, in bits 21..25 of a `COPn` instruction.
#[bitos(4)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum CopOpcode {
    MFC = 0x00,
    CFC = 0x02,
    MTC = 0x04,
    CTC = 0x06,
    BRANCH = 0x08,
}

/// The opcode of a `CO`-form COP0 instruction, in its low 6 bits.
#[bitos(6)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum SpecialCop0Opcode {
    RFE = 0x10,
}

/// A MIPS I instruction.
///
/// Every field overlay is always present; which ones are meaningful depends on the opcode.
#[bitos(32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// The operation executed by this instruction.
    #[bits(26..32)]
    pub op: Option<Opcode>,

    /// Direction bit of the `REGIMM` family (`0` = BLTZ, `1` = BGEZ).
    #[bits(16)]
    pub bz_ge: bool,

    /// And-link selector bits of the `REGIMM` family.
    #[bits(17..21)]
    pub bz_link: bitos::integer::u4,

    /// The operation executed by this instruction if its primary opcode is [`Opcode::SPECIAL`].
    #[bits(0..6)]
    pub special_op: Option<SpecialOpcode>,

    /// The coprocessor this instruction addresses.
    #[bits(26..28)]
    pub cop: COP,

    /// Whether this is a coprocessor command (`CO`) form.
    #[bits(25)]
    pub cop_cmd: bool,

    /// The coprocessor transfer operation.
    #[bits(21..25)]
    pub cop_op: Option<CopOpcode>,

    /// The operation of a `CO`-form COP0 instruction.
    #[bits(0..6)]
    pub cop0_special_op: Option<SpecialCop0Opcode>,

    /// The destination register of this instruction.
    #[bits(11..16)]
    pub rd: Reg,

    /// The destination register as a COP0 register.
    #[bits(11..16)]
    pub cop0_rd: crate::cpu::cop0::Reg,

    /// The destination register as a GTE data register.
    #[bits(11..16)]
    pub gte_data_rd: crate::gte::DataReg,

    /// The destination register as a GTE control register.
    #[bits(11..16)]
    pub gte_control_rd: crate::gte::ControlReg,

    /// The target register of this instruction.
    #[bits(16..21)]
    pub rt: Reg,

    /// The target register as a GTE data register.
    #[bits(16..21)]
    pub gte_data_rt: crate::gte::DataReg,

    /// The source register of this instruction.
    #[bits(21..26)]
    pub rs: Reg,

    /// The shift amount of this instruction.
    #[bits(6..11)]
    pub imm5: u5,

    /// The unsigned 16 bit immediate value of this instruction.
    #[bits(0..16)]
    pub imm16: u16,

    /// The signed 16 bit immediate value of this instruction.
    #[bits(0..16)]
    pub signed_imm16: i16,

    /// The 20 bit immediate value of this instruction (SYSCALL/BREAK code).
    #[bits(6..26)]
    pub imm20: u20,

    /// The 25 bit immediate value of this instruction. Used only by COP2 commands.
    #[bits(0..25)]
    pub imm25: u25,

    /// The 26 bit immediate value of this instruction (jump target).
    #[bits(0..26)]
    pub imm26: u26,
}

impl Instruction {
    pub const NOP: Self = Instruction(0x0000_0000);

    /// Decodes the `REGIMM` kind: bit 16 gives the direction, bits 17..21 equal to `0b1000`
    /// select the and-link forms.
    pub fn bz_kind(&self) -> BZKind {
        match (self.bz_ge(), self.bz_link().value() == 0b1000) {
            (true, true) => BZKind::BGEZAL,
            (true, false) => BZKind::BGEZ,
            (false, true) => BZKind::BLTZAL,
            (false, false) => BZKind::BLTZ,
        }
    }

    /// Returns the mnemonic of this instruction, if it is a legal one.
    pub fn mnemonic(&self) -> Option<&'static str> {
        match self.op()? {
            Opcode::SPECIAL => self.special_op().map(<&'static str>::from),
            Opcode::BZ => Some(self.bz_kind().into()),
            op => Some(op.into()),
        }
    }

    pub fn is_illegal(&self) -> bool {
        match (self.op(), self.special_op(), self.cop_op()) {
            (None, _, _) => true,
            (Some(Opcode::SPECIAL), None, _) => true,
            (Some(Opcode::COP0 | Opcode::COP2), _, None) => !self.cop_cmd(),
            _ => false,
        }
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::NOP
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => write!(f, "{mnemonic}"),
            None => write!(f, "ILLEGAL"),
        }
    }
}
