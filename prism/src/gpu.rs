//! The GPU: command FIFO, drawing environment, VRAM and scanline pacing.

pub mod cmd;
pub mod texture;

mod interpreter;
mod rasterizer;

use crate::util;
use bitos::{
    bitos,
    integer::{u1, u4},
};
use cmd::{
    environment::{DrawingSettingsCmd, MaskSettingsCmd},
    rendering::{CoordPacket, SizePacket},
};
use std::collections::VecDeque;
use texture::{SemiTransparencyMode, TextureWindow, TexturePageDepth};

pub const VRAM_WIDTH: usize = 1024;
pub const VRAM_HEIGHT: usize = 512;

/// Cycles per scanline (NTSC).
pub const CYCLES_PER_SCANLINE: i64 = 3413;
/// Scanline at which the vertical blank begins.
pub const SCANLINES_PER_VDRAW: u32 = 240;
/// Total scanlines per frame (NTSC).
pub const SCANLINES_PER_FRAME: u32 = 262;

#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalResolution {
    R256 = 0,
    R320 = 1,
    R512 = 2,
    R640 = 3,
}

#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalResolution {
    R240 = 0,
    R480 = 1,
}

#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    /// 60Hz
    Ntsc = 0,
    /// 50Hz
    Pal = 1,
}

#[bitos(1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayDepth {
    /// 15 bit
    Limited = 0,
    /// 24 bit
    Full = 1,
}

#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaDirection {
    Off = 0,
    Fifo = 1,
    CpuToGp0 = 2,
    GpuToCpu = 3,
}

/// `GPUSTAT`, read through GP1.
#[bitos(32)]
#[derive(Debug, Clone, Copy)]
pub struct GpuStatus {
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
    /// If enabled, drawing sets the mask bit on pixels.
    #[bits(11..12)]
    pub write_to_mask: bool,
    /// If enabled, pixels can only be drawn to non-masked areas.
    #[bits(12..13)]
    pub enable_mask: bool,
    #[bits(13..14)]
    pub interlace: bool,
    #[bits(14..15)]
    pub flip_screen_x: bool,
    #[bits(16..18)]
    pub horizontal_resolution: HorizontalResolution,
    #[bits(18..19)]
    pub force_horizontal_368: bool,
    #[bits(19..20)]
    pub vertical_resolution: VerticalResolution,
    #[bits(20..21)]
    pub video_mode: VideoMode,
    #[bits(21..22)]
    pub display_depth: DisplayDepth,
    #[bits(22..23)]
    pub vertical_interlace: bool,
    #[bits(23..24)]
    pub disable_display: bool,
    #[bits(24..25)]
    pub interrupt_request: bool,
    #[bits(25..26)]
    pub dma_request: bool,
    #[bits(26..27)]
    pub ready_to_receive_packet: bool,
    #[bits(27..28)]
    pub ready_to_send_vram: bool,
    #[bits(28..29)]
    pub ready_to_receive_block: bool,
    #[bits(29..31)]
    pub dma_direction: DmaDirection,
    #[bits(31..32)]
    pub interlace_odd: bool,
}

impl Default for GpuStatus {
    fn default() -> Self {
        Self::from_bits(0x1480_2000)
    }
}

/// The drawing environment, set through the GP0(E1)..GP0(E6) commands.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub settings: DrawingSettingsCmd,
    pub texture_window: TextureWindow,
    pub mask: MaskSettingsCmd,
    /// Inclusive drawing area bounds.
    pub area_left: i32,
    pub area_top: i32,
    pub area_right: i32,
    pub area_bottom: i32,
    /// Offset added to every vertex.
    pub offset_x: i32,
    pub offset_y: i32,
}

/// The command FIFO state machine.
#[derive(Debug, Clone, Default)]
enum State {
    /// The next GP0 word starts a new command.
    #[default]
    ReceiveCommand,
    /// Collecting the argument words of the current command.
    ReceiveArguments { remaining: usize },
    /// Streaming pixel data into VRAM.
    CopyToVram {
        dest: CoordPacket,
        size: SizePacket,
        remaining: usize,
    },
    /// Consuming polyline vertices until the terminator.
    PolyLine {
        received: u32,
        last_color: u32,
        last_vertex: u32,
        /// In gouraud mode, the color word waiting for its vertex.
        pending_color: Option<u32>,
    },
}

/// The state of the GPU.
pub struct Gpu {
    pub status: GpuStatus,
    /// 1024x512 halfwords, row major. BGR555 as a framebuffer, packed texels as a texture source.
    pub vram: Box<[u16; VRAM_WIDTH * VRAM_HEIGHT]>,
    pub environment: Environment,

    /// Words readable through GPUREAD (VRAM readbacks and register reads).
    pub response_queue: VecDeque<u32>,
    /// Set when GP0(1F) requests the GPU interrupt; drained by the bus.
    pub irq_pending: bool,

    state: State,
    /// The command currently collecting arguments.
    command: u32,
    args: VecDeque<u32>,

    /// Current scanline, in `0..SCANLINES_PER_FRAME`.
    pub line: u32,
    /// Frames completed since power on.
    pub frame: u64,

    /// Raw display setting words, kept for GP1(10) readback.
    display_area: u32,
    horizontal_range: u32,
    vertical_range: u32,
}

impl Default for Gpu {
    fn default() -> Self {
        Self {
            status: GpuStatus::default(),
            vram: util::boxed_array(0),
            environment: Environment::default(),
            response_queue: VecDeque::new(),
            irq_pending: false,
            state: State::default(),
            command: 0,
            args: VecDeque::new(),
            line: 0,
            frame: 0,
            display_area: 0,
            horizontal_range: 0,
            vertical_range: 0,
        }
    }
}

impl Gpu {
    /// Reads the GPUREAD port.
    pub fn gpuread(&mut self) -> u32 {
        let value = self.response_queue.pop_front().unwrap_or(0);
        if self.response_queue.is_empty() {
            self.status.set_ready_to_send_vram(false);
        }

        value
    }

    /// Reads a pixel from VRAM, wrapping coordinates.
    #[inline(always)]
    pub fn vram_pixel(&self, x: u16, y: u16) -> u16 {
        self.vram[(x as usize & (VRAM_WIDTH - 1)) + VRAM_WIDTH * (y as usize & (VRAM_HEIGHT - 1))]
    }

    /// Writes a pixel to VRAM, wrapping coordinates. Does not apply the drawing environment.
    #[inline(always)]
    pub fn set_vram_pixel(&mut self, x: u16, y: u16, value: u16) {
        self.vram
            [(x as usize & (VRAM_WIDTH - 1)) + VRAM_WIDTH * (y as usize & (VRAM_HEIGHT - 1))] =
            value;
    }
}

#[cfg(test)]
mod tests;
