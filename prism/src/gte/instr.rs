//! GTE command word decoding.

use bitos::{bitos, integer::u6};

/// The opcode of a GTE [`Instruction`].
#[bitos(6)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Perspective transformation, single vector.
    RTPS = 0x01,
    /// Normal clipping (winding of the screen XY FIFO).
    NCLIP = 0x06,
    /// Cross product of IR with the rotation matrix diagonal pairs.
    OP = 0x0C,
    /// Depth cueing, single color.
    DPCS = 0x10,
    /// Interpolation between IR and the far color.
    INTPL = 0x11,
    /// Multiply vector by matrix and add offset vector.
    MVMVA = 0x12,
    /// Normal color depth cue, single vector.
    NCDS = 0x13,
    /// Normal color color, single vector.
    NCCS = 0x1B,
    /// Square of IR.
    SQR = 0x28,
    /// Average of three screen Z values.
    AVSZ3 = 0x2D,
    /// Average of four screen Z values.
    AVSZ4 = 0x2E,
    /// Perspective transformation, triple.
    RTPT = 0x30,
    /// General purpose interpolation (IR0 * IR).
    GPF = 0x3D,
    /// General purpose interpolation with base (MAC + IR0 * IR).
    GPL = 0x3E,
    /// Normal color color, triple.
    NCCT = 0x3F,
}

/// Matrix selector of [`Opcode::MVMVA`].
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulMatrix {
    Rotation,
    Light,
    Color,
    Reserved,
}

/// Vector selector of [`Opcode::MVMVA`].
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulVector {
    Vector0,
    Vector1,
    Vector2,
    IR,
}

/// Offset vector selector of [`Opcode::MVMVA`].
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffVector {
    Translation,
    BackgroundColor,
    FarColor,
    None,
}

/// A GTE command word, the low 25 bits of a `COP2` `CO`-form instruction.
#[bitos(32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// The operation executed by this command.
    #[bits(0..6)]
    pub op: Option<Opcode>,

    /// The raw opcode bits, for diagnostics.
    #[bits(0..6)]
    pub op_raw: u6,

    /// `lm`: clamp IR results to non-negative values.
    #[bits(10)]
    pub no_neg: bool,

    #[bits(13..15)]
    pub offset_vector: OffVector,

    #[bits(15..17)]
    pub multiply_vector: MulVector,

    #[bits(17..19)]
    pub multiply_matrix: MulMatrix,

    /// `sf`: shift MAC results down by 12 fractional bits.
    #[bits(19)]
    pub shift: bool,
}
