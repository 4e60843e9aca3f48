//! Rendering command packets.

use crate::gpu::texture::{Clut, TexPage};
use bitos::{bitos, integer::i11};

/// A framebuffer transfer coordinate packet.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordPacket {
    #[bits(0..16)]
    pub x: u16,
    #[bits(16..32)]
    pub y: u16,
}

/// A framebuffer transfer dimensions packet.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SizePacket {
    #[bits(0..16)]
    pub width: u16,
    #[bits(16..32)]
    pub height: u16,
}

/// Whether texels are modulated by the vertex color or taken raw.
#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMode {
    Modulated = 0,
    Raw = 1,
}

/// Whether pixels blend with the background.
#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendingMode {
    Opaque = 0,
    SemiTransparent = 1,
}

/// How vertex colors are applied.
#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    Flat = 0,
    Gouraud = 1,
}

/// A vertex color packet, also the low 24 bits of most command words.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexColorPacket {
    #[bits(0..8)]
    pub r: u8,
    #[bits(8..16)]
    pub g: u8,
    #[bits(16..24)]
    pub b: u8,
}

/// A vertex position packet. Coordinates are 11 bit signed.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexPositionPacket {
    #[bits(0..11)]
    pub x: i11,
    #[bits(16..27)]
    pub y: i11,
}

/// A vertex UV packet. The attribute halfword is the CLUT on the first vertex and the texture
/// page on the second.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexUVPacket {
    #[bits(0..8)]
    pub u: u8,
    #[bits(8..16)]
    pub v: u8,
    #[bits(16..32)]
    pub clut: Clut,
    #[bits(16..25)]
    pub texpage: TexPage,
}

/// Triangle or quadrilateral.
#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Triangle = 0,
    Rectangle = 1,
}

/// A polygon rendering command word.
#[bitos(32)]
#[derive(Debug, Clone, Copy)]
pub struct PolygonCmd {
    #[bits(0..8)]
    pub r: u8,
    #[bits(8..16)]
    pub g: u8,
    #[bits(16..24)]
    pub b: u8,
    #[bits(24)]
    pub texture_mode: TextureMode,
    #[bits(25)]
    pub blending_mode: BlendingMode,
    #[bits(26)]
    pub textured: bool,
    #[bits(27)]
    pub polygon_mode: PolygonMode,
    #[bits(28)]
    pub shading_mode: ShadingMode,
}

impl PolygonCmd {
    pub fn vertices(&self) -> usize {
        match self.polygon_mode() {
            PolygonMode::Triangle => 3,
            PolygonMode::Rectangle => 4,
        }
    }
}

/// Single segment or polyline.
#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Single = 0,
    Poly = 1,
}

/// A line rendering command word.
#[bitos(32)]
#[derive(Debug, Clone, Copy)]
pub struct LineCmd {
    #[bits(0..8)]
    pub r: u8,
    #[bits(8..16)]
    pub g: u8,
    #[bits(16..24)]
    pub b: u8,
    #[bits(25)]
    pub blending_mode: BlendingMode,
    #[bits(27)]
    pub line_mode: LineMode,
    #[bits(28)]
    pub shading_mode: ShadingMode,
}

/// The size class of a rectangle command.
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectangleKind {
    Variable = 0,
    SinglePixel = 1,
    Sprite8 = 2,
    Sprite16 = 3,
}

/// A rectangle rendering command word.
#[bitos(32)]
#[derive(Debug, Clone, Copy)]
pub struct RectangleCmd {
    #[bits(0..8)]
    pub r: u8,
    #[bits(8..16)]
    pub g: u8,
    #[bits(16..24)]
    pub b: u8,
    #[bits(24)]
    pub texture_mode: TextureMode,
    #[bits(25)]
    pub blending_mode: BlendingMode,
    #[bits(26)]
    pub textured: bool,
    #[bits(27..29)]
    pub kind: RectangleKind,
}
