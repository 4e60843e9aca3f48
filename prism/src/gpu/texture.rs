//! Texture page and palette addressing.

use bitos::{
    bitos,
    integer::{u1, u4, u6, u9},
};

/// The pixel depth of a texture page.
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexturePageDepth {
    #[default]
    Nibble = 0,
    Byte = 1,
    Full = 2,
}

/// How semi-transparent pixels blend with the background.
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SemiTransparencyMode {
    /// `background / 2 + foreground / 2`
    #[default]
    Average = 0,
    /// `background + foreground`
    Add = 1,
    /// `background - foreground`
    Subtract = 2,
    /// `background + foreground / 4`
    AddQuarter = 3,
}

/// A texture page: a 256x256 window into VRAM, addressed in 64-halfword macroblocks.
#[bitos(9)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TexPage {
    /// X base, in units of 64 pixels.
    #[bits(0..4)]
    pub x_base: u4,
    /// Y base, in units of 256 lines.
    #[bits(4..5)]
    pub y_base: u1,
    #[bits(5..7)]
    pub semi_transparency_mode: SemiTransparencyMode,
    #[bits(7..9)]
    pub depth: Option<TexturePageDepth>,
}

impl TexPage {
    /// The VRAM X coordinate of the page origin.
    #[inline(always)]
    pub fn x(&self) -> u16 {
        u16::from(self.x_base().value()) * 64
    }

    /// The VRAM Y coordinate of the page origin.
    #[inline(always)]
    pub fn y(&self) -> u16 {
        u16::from(self.y_base().value()) * 256
    }
}

/// A color look-up table: a row of 16 or 256 palette entries in VRAM.
#[bitos(16)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clut {
    /// X position, in units of 16 pixels.
    #[bits(0..6)]
    pub x_by_16: u6,
    /// Y position, in lines.
    #[bits(6..15)]
    pub y: u9,
}

impl Clut {
    #[inline(always)]
    pub fn x(&self) -> u16 {
        u16::from(self.x_by_16().value()) * 16
    }
}

/// The texture window: a mask/offset pair applied to texcoords before sampling, in units of 8
/// pixels.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureWindow {
    #[bits(0..5)]
    pub mask_x: bitos::integer::u5,
    #[bits(5..10)]
    pub mask_y: bitos::integer::u5,
    #[bits(10..15)]
    pub offset_x: bitos::integer::u5,
    #[bits(15..20)]
    pub offset_y: bitos::integer::u5,
}

impl TextureWindow {
    /// Applies the window to a texcoord: `texcoord = (texcoord & !(mask * 8)) | ((offset & mask) * 8)`.
    #[inline(always)]
    pub fn apply(&self, u: u8, v: u8) -> (u8, u8) {
        let mask_x = self.mask_x().value() * 8;
        let mask_y = self.mask_y().value() * 8;
        let offset_x = self.offset_x().value() * 8;
        let offset_y = self.offset_y().value() * 8;

        (
            (u & !mask_x) | (offset_x & mask_x),
            (v & !mask_y) | (offset_y & mask_y),
        )
    }
}
