//! GP0/GP1 command word decoding.

pub mod environment;
pub mod rendering;

use bitos::bitos;
use rendering::{LineCmd, PolygonCmd, RectangleCmd, RectangleKind, ShadingMode};

/// The primary opcode of a [`RenderingCommand`], in its top three bits.
#[bitos(3)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingOpcode {
    Misc = 0x0,
    Polygon = 0x1,
    Line = 0x2,
    Rectangle = 0x3,
    VramToVramBlit = 0x4,
    CpuToVramBlit = 0x5,
    VramToCpuBlit = 0x6,
    Environment = 0x7,
}

/// The misc opcode of a [`RenderingCommand`].
#[bitos(5)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscOpcode {
    Nop = 0x00,
    /// Clear the texture cache. The software rasterizer has no cache; this is a no-op.
    ClearCache = 0x01,
    /// Fill a rectangle in VRAM with a solid color, ignoring the drawing environment.
    QuickRectangleFill = 0x02,
    InterruptRequest = 0x1F,
}

/// The environment opcode of a [`RenderingCommand`].
#[bitos(3)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentOpcode {
    DrawingSettings = 0x1,
    TexWindowSettings = 0x2,
    DrawingAreaTopLeft = 0x3,
    DrawingAreaBottomRight = 0x4,
    DrawingOffset = 0x5,
    MaskSettings = 0x6,
}

/// A rendering command, received through GP0. The top byte selects the operation; the low 24
/// bits usually carry the first argument.
#[bitos(32)]
#[derive(Clone, Copy)]
pub struct RenderingCommand {
    #[bits(29..32)]
    pub opcode: RenderingOpcode,
    #[bits(24..29)]
    pub misc_opcode: Option<MiscOpcode>,
    #[bits(24..27)]
    pub environment_opcode: Option<EnvironmentOpcode>,

    #[bits(..)]
    pub polygon_cmd: PolygonCmd,
    #[bits(..)]
    pub line_cmd: LineCmd,
    #[bits(..)]
    pub rectangle_cmd: RectangleCmd,
}

impl std::fmt::Debug for RenderingCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.opcode() {
            RenderingOpcode::Misc => match self.misc_opcode() {
                Some(op) => write!(f, "{op:?}"),
                None => write!(f, "UnknownMisc"),
            },
            RenderingOpcode::Polygon => write!(f, "{:?}", self.polygon_cmd()),
            RenderingOpcode::Line => write!(f, "{:?}", self.line_cmd()),
            RenderingOpcode::Rectangle => write!(f, "{:?}", self.rectangle_cmd()),
            RenderingOpcode::Environment => match self.environment_opcode() {
                Some(op) => write!(f, "{op:?}"),
                None => write!(f, "UnknownEnvironment"),
            },
            op => write!(f, "{op:?}"),
        }
    }
}

impl RenderingCommand {
    /// How many argument words this command needs before it can execute.
    pub fn args(&self) -> usize {
        match self.opcode() {
            RenderingOpcode::Misc => match self.misc_opcode() {
                Some(MiscOpcode::QuickRectangleFill) => 2,
                _ => 0,
            },
            RenderingOpcode::Polygon => {
                let cmd = self.polygon_cmd();
                let vertices = cmd.vertices();
                let colors = (vertices - 1)
                    * match cmd.shading_mode() {
                        ShadingMode::Flat => 0,
                        ShadingMode::Gouraud => 1,
                    };
                let uvs = vertices * usize::from(cmd.textured());

                vertices + colors + uvs
            }
            RenderingOpcode::Line => match self.line_cmd().shading_mode() {
                // polylines receive further vertices through their own state
                ShadingMode::Flat => 2,
                ShadingMode::Gouraud => 3,
            },
            RenderingOpcode::Rectangle => {
                let cmd = self.rectangle_cmd();
                let uv = usize::from(cmd.textured());
                let dimensions = match cmd.kind() {
                    RectangleKind::Variable => 1,
                    _ => 0,
                };

                1 + uv + dimensions
            }
            RenderingOpcode::VramToVramBlit => 3,
            RenderingOpcode::CpuToVramBlit => 2,
            RenderingOpcode::VramToCpuBlit => 2,
            RenderingOpcode::Environment => 0,
        }
    }
}

/// The opcode of a [`DisplayCommand`].
#[bitos(6)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOpcode {
    ResetGpu = 0x00,
    ResetCommandBuffer = 0x01,
    AcknowledgeGpuInterrupt = 0x02,
    DisplayEnabled = 0x03,
    DmaDirection = 0x04,
    DisplayArea = 0x05,
    HorizontalDisplayRange = 0x06,
    VerticalDisplayRange = 0x07,
    DisplayMode = 0x08,
    ReadGpuRegister = 0x10,
}

/// A display control command, received through GP1.
#[bitos(32)]
#[derive(Clone, Copy)]
pub struct DisplayCommand {
    #[bits(24..30)]
    pub opcode: Option<DisplayOpcode>,
    /// The argument of most display commands.
    #[bits(0..24)]
    pub param: bitos::integer::u24,
}

impl std::fmt::Debug for DisplayCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.opcode() {
            Some(op) => write!(f, "{:?}(0x{:06X})", op, self.param().value()),
            None => write!(f, "UnknownDisplay"),
        }
    }
}
