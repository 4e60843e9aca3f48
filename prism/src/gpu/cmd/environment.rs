//! Drawing environment command packets.

use crate::gpu::texture::{SemiTransparencyMode, TexPage, TexturePageDepth};
use bitos::{
    bitos,
    integer::{i11, u1, u4, u9, u10},
};

/// GP0(E1): the draw mode, mostly the active texture page.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawingSettingsCmd {
    #[bits(0..4)]
    pub texpage_x_base: u4,
    #[bits(4..5)]
    pub texpage_y_base: u1,
    #[bits(5..7)]
    pub semi_transparency_mode: SemiTransparencyMode,
    #[bits(7..9)]
    pub texpage_depth: Option<TexturePageDepth>,
    #[bits(9..10)]
    pub compression_mode: bool,
    #[bits(10..11)]
    pub enable_drawing_to_display: bool,
    #[bits(11..12)]
    pub texture_disable: bool,
    #[bits(12..13)]
    pub textured_rect_flip_x: bool,
    #[bits(13..14)]
    pub textured_rect_flip_y: bool,
}

impl DrawingSettingsCmd {
    /// The active texture page; its bits coincide with the low nine bits of this command.
    pub fn texpage(&self) -> TexPage {
        TexPage::from_bits((self.to_bits() & 0x1FF) as u16)
    }
}

/// GP0(E3)/GP0(E4): one corner of the drawing area, inclusive.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawingAreaCornerCmd {
    #[bits(0..10)]
    pub x: u10,
    #[bits(10..19)]
    pub y: u9,
}

/// GP0(E5): the offset added to every vertex before rasterization.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawingOffsetCmd {
    #[bits(0..11)]
    pub x: i11,
    #[bits(11..22)]
    pub y: i11,
}

/// GP0(E6): mask bit behaviour.
#[bitos(32)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskSettingsCmd {
    /// Set bit 15 on every written pixel.
    #[bits(0..1)]
    pub write_to_mask: bool,
    /// Refuse to overwrite pixels with bit 15 set.
    #[bits(1..2)]
    pub check_mask: bool,
}
