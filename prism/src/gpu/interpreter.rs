//! The GP0/GP1 command state machine.

use super::{Gpu, GpuStatus, State};
use crate::gpu::{
    cmd::{
        DisplayCommand, DisplayOpcode, EnvironmentOpcode, MiscOpcode, RenderingCommand,
        RenderingOpcode,
        rendering::{
            CoordPacket, LineMode, PolygonMode, RectangleKind, ShadingMode, SizePacket,
            VertexColorPacket, VertexPositionPacket, VertexUVPacket,
        },
    },
    rasterizer::{ShadedVertex, TextureSampler},
};
use log::{debug, trace, warn};

impl Gpu {
    /// Handles a word written to GP0.
    pub fn gp0_write(&mut self, word: u32) {
        match &mut self.state {
            State::ReceiveCommand => {
                let cmd = RenderingCommand::from_bits(word);
                let args = cmd.args();

                trace!(target: "gpu", "GP0 command {cmd:?} ({args} args)");

                self.command = word;
                self.args.clear();

                if args == 0 {
                    self.exec_command();
                } else {
                    self.state = State::ReceiveArguments { remaining: args };
                }
            }
            State::ReceiveArguments { remaining } => {
                self.args.push_back(word);
                *remaining -= 1;

                if *remaining == 0 {
                    self.state = State::ReceiveCommand;
                    self.exec_command();
                }
            }
            State::CopyToVram {
                dest,
                size,
                remaining,
            } => {
                let (dest, size, left) = (*dest, *size, *remaining);
                self.copy_word_to_vram(dest, size, left, word);

                match &mut self.state {
                    State::CopyToVram { remaining, .. } => {
                        *remaining -= 1;
                        if *remaining == 0 {
                            self.state = State::ReceiveCommand;
                        }
                    }
                    _ => unreachable!(),
                }
            }
            State::PolyLine {
                received,
                last_color,
                last_vertex,
                pending_color,
            } => {
                // two vertices in, a 0x5XXX5XXX word terminates the polyline
                if *received >= 2 && word & 0xF000_F000 == 0x5000_5000 {
                    debug!(target: "gpu", "polyline terminated");
                    self.state = State::ReceiveCommand;
                    return;
                }

                let cmd = RenderingCommand::from_bits(self.command).line_cmd();
                let segment = match cmd.shading_mode() {
                    ShadingMode::Flat => {
                        let from = (*last_color, *last_vertex);
                        *last_vertex = word;
                        *received += 1;
                        Some((from, (from.0, word)))
                    }
                    ShadingMode::Gouraud => match pending_color.take() {
                        // gouraud segments arrive as (color, vertex) pairs
                        None => {
                            *pending_color = Some(word);
                            None
                        }
                        Some(color) => {
                            let from = (*last_color, *last_vertex);
                            *last_color = color;
                            *last_vertex = word;
                            *received += 1;
                            Some((from, (color, word)))
                        }
                    },
                };

                if let Some(((c0, v0), (c1, v1))) = segment {
                    let blending = cmd.blending_mode();
                    self.draw_line(
                        ShadedVertex::new(
                            VertexPositionPacket::from_bits(v0),
                            VertexColorPacket::from_bits(c0),
                            VertexUVPacket::default(),
                        ),
                        ShadedVertex::new(
                            VertexPositionPacket::from_bits(v1),
                            VertexColorPacket::from_bits(c1),
                            VertexUVPacket::default(),
                        ),
                        blending,
                    );
                }
            }
        }
    }

    /// Executes the command in `self.command` now that its arguments are available.
    fn exec_command(&mut self) {
        let cmd = RenderingCommand::from_bits(self.command);

        match cmd.opcode() {
            RenderingOpcode::Misc => match cmd.misc_opcode() {
                Some(MiscOpcode::Nop) | Some(MiscOpcode::ClearCache) => (),
                Some(MiscOpcode::QuickRectangleFill) => self.quick_fill(),
                Some(MiscOpcode::InterruptRequest) => {
                    self.status.set_interrupt_request(true);
                    self.irq_pending = true;
                }
                None => {
                    warn!(target: "gpu", "unhandled misc GP0 command 0x{:08X}", self.command);
                }
            },
            RenderingOpcode::Polygon => self.draw_polygon(cmd),
            RenderingOpcode::Line => self.draw_line_cmd(cmd),
            RenderingOpcode::Rectangle => self.draw_rectangle_cmd(cmd),
            RenderingOpcode::VramToVramBlit => self.vram_to_vram(),
            RenderingOpcode::CpuToVramBlit => self.begin_cpu_to_vram(),
            RenderingOpcode::VramToCpuBlit => self.vram_to_cpu(),
            RenderingOpcode::Environment => self.set_environment(cmd),
        }
    }

    fn set_environment(&mut self, cmd: RenderingCommand) {
        let Some(op) = cmd.environment_opcode() else {
            warn!(target: "gpu", "unhandled environment GP0 command 0x{:08X}", self.command);
            return;
        };

        let env = &mut self.environment;
        match op {
            EnvironmentOpcode::DrawingSettings => {
                let settings =
                    super::cmd::environment::DrawingSettingsCmd::from_bits(self.command);

                // the low ten bits mirror into GPUSTAT
                let status = self.status.to_bits() & !0x7FF;
                self.status = GpuStatus::from_bits(status | (self.command & 0x7FF));

                env.settings = settings;
            }
            EnvironmentOpcode::TexWindowSettings => {
                env.texture_window = super::texture::TextureWindow::from_bits(self.command);
            }
            EnvironmentOpcode::DrawingAreaTopLeft => {
                let corner =
                    super::cmd::environment::DrawingAreaCornerCmd::from_bits(self.command);
                env.area_left = i32::from(corner.x().value());
                env.area_top = i32::from(corner.y().value());
            }
            EnvironmentOpcode::DrawingAreaBottomRight => {
                let corner =
                    super::cmd::environment::DrawingAreaCornerCmd::from_bits(self.command);
                env.area_right = i32::from(corner.x().value());
                env.area_bottom = i32::from(corner.y().value());
            }
            EnvironmentOpcode::DrawingOffset => {
                let offset = super::cmd::environment::DrawingOffsetCmd::from_bits(self.command);
                env.offset_x = i32::from(offset.x().value());
                env.offset_y = i32::from(offset.y().value());
            }
            EnvironmentOpcode::MaskSettings => {
                let mask = super::cmd::environment::MaskSettingsCmd::from_bits(self.command);
                env.mask = mask;
                self.status.set_write_to_mask(mask.write_to_mask());
                self.status.set_enable_mask(mask.check_mask());
            }
        }
    }

    /// GP0(02): fill a rectangle with a solid color. Bypasses the drawing environment; positions
    /// snap to multiples of 16 pixels.
    fn quick_fill(&mut self) {
        let color = VertexColorPacket::from_bits(self.command);
        let color = super::rasterizer::bgr555(color.r(), color.g(), color.b());

        let coords = CoordPacket::from_bits(self.args.pop_front().unwrap());
        let size = SizePacket::from_bits(self.args.pop_front().unwrap());

        let x = coords.x() & 0x3F0;
        let y = coords.y() & 0x1FF;
        let width = (size.width() & 0x3FF).div_ceil(16) * 16;
        let height = size.height() & 0x1FF;

        for dy in 0..height {
            for dx in 0..width {
                self.set_vram_pixel(x + dx, y + dy, color);
            }
        }
    }

    fn draw_polygon(&mut self, cmd: RenderingCommand) {
        let cmd = cmd.polygon_cmd();
        let gouraud = cmd.shading_mode() == ShadingMode::Gouraud;

        let mut vertices = [ShadedVertex::default(); 4];
        let mut uv_attrs = [VertexUVPacket::default(); 4];

        for i in 0..cmd.vertices() {
            let color = if i == 0 || !gouraud {
                VertexColorPacket::from_bits(self.command)
            } else {
                VertexColorPacket::from_bits(self.args.pop_front().unwrap())
            };

            let position = VertexPositionPacket::from_bits(self.args.pop_front().unwrap());

            let uv = if cmd.textured() {
                VertexUVPacket::from_bits(self.args.pop_front().unwrap())
            } else {
                VertexUVPacket::default()
            };

            vertices[i] = ShadedVertex::new(position, color, uv);
            uv_attrs[i] = uv;
        }

        let sampler = cmd.textured().then(|| TextureSampler {
            clut: uv_attrs[0].clut(),
            page: uv_attrs[1].texpage(),
            mode: cmd.texture_mode(),
        });

        self.draw_triangle(
            [vertices[0], vertices[1], vertices[2]],
            gouraud,
            sampler,
            cmd.blending_mode(),
        );

        if cmd.polygon_mode() == PolygonMode::Rectangle {
            self.draw_triangle(
                [vertices[1], vertices[2], vertices[3]],
                gouraud,
                sampler,
                cmd.blending_mode(),
            );
        }
    }

    fn draw_line_cmd(&mut self, cmd: RenderingCommand) {
        let line = cmd.line_cmd();

        let c0 = VertexColorPacket::from_bits(self.command);
        let v0 = VertexPositionPacket::from_bits(self.args.pop_front().unwrap());
        let (c1, v1) = match line.shading_mode() {
            ShadingMode::Flat => (
                c0,
                VertexPositionPacket::from_bits(self.args.pop_front().unwrap()),
            ),
            ShadingMode::Gouraud => (
                VertexColorPacket::from_bits(self.args.pop_front().unwrap()),
                VertexPositionPacket::from_bits(self.args.pop_front().unwrap()),
            ),
        };

        self.draw_line(
            ShadedVertex::new(v0, c0, VertexUVPacket::default()),
            ShadedVertex::new(v1, c1, VertexUVPacket::default()),
            line.blending_mode(),
        );

        if line.line_mode() == LineMode::Poly {
            // keep the last endpoint around for the next segment
            self.state = State::PolyLine {
                received: 2,
                last_color: c1.to_bits(),
                last_vertex: v1.to_bits(),
                pending_color: None,
            };
        }
    }

    fn draw_rectangle_cmd(&mut self, cmd: RenderingCommand) {
        let rect = cmd.rectangle_cmd();

        let color = VertexColorPacket::from_bits(self.command);
        let position = VertexPositionPacket::from_bits(self.args.pop_front().unwrap());

        let uv = if rect.textured() {
            VertexUVPacket::from_bits(self.args.pop_front().unwrap())
        } else {
            VertexUVPacket::default()
        };

        let (width, height) = match rect.kind() {
            RectangleKind::Variable => {
                let size = SizePacket::from_bits(self.args.pop_front().unwrap());
                (i32::from(size.width()), i32::from(size.height()))
            }
            RectangleKind::SinglePixel => (1, 1),
            RectangleKind::Sprite8 => (8, 8),
            RectangleKind::Sprite16 => (16, 16),
        };

        let sampler = rect.textured().then(|| TextureSampler {
            clut: uv.clut(),
            // rectangles sample the page set through GP0(E1)
            page: self.environment.settings.texpage(),
            mode: rect.texture_mode(),
        });

        self.draw_rectangle(
            ShadedVertex::new(position, color, uv),
            width,
            height,
            sampler,
            rect.blending_mode(),
        );
    }

    /// GP0(80): VRAM to VRAM copy.
    fn vram_to_vram(&mut self) {
        let src = CoordPacket::from_bits(self.args.pop_front().unwrap());
        let dest = CoordPacket::from_bits(self.args.pop_front().unwrap());
        let size = SizePacket::from_bits(self.args.pop_front().unwrap());

        let (width, height) = effective_dimensions(size);
        for dy in 0..height {
            for dx in 0..width {
                let value = self.vram_pixel(src.x().wrapping_add(dx), src.y().wrapping_add(dy));
                self.store_pixel(dest.x().wrapping_add(dx), dest.y().wrapping_add(dy), value);
            }
        }
    }

    /// GP0(A0): start collecting pixel data written through GP0.
    fn begin_cpu_to_vram(&mut self) {
        let dest = CoordPacket::from_bits(self.args.pop_front().unwrap());
        let size = SizePacket::from_bits(self.args.pop_front().unwrap());

        let (width, height) = effective_dimensions(size);
        let words = (u32::from(width) * u32::from(height)).div_ceil(2);

        debug!(
            target: "gpu",
            "CPU->VRAM blit to ({}, {}), {width}x{height}",
            dest.x(), dest.y()
        );

        self.state = State::CopyToVram {
            dest,
            size,
            remaining: words as usize,
        };
    }

    /// Stores one data word of an ongoing CPU to VRAM blit.
    fn copy_word_to_vram(
        &mut self,
        dest: CoordPacket,
        size: SizePacket,
        remaining: usize,
        word: u32,
    ) {
        let (width, height) = effective_dimensions(size);
        let total = u32::from(width) * u32::from(height);

        // pixel index of the low halfword of this data word
        let done = total.div_ceil(2) as usize - remaining;
        let index = done as u32 * 2;

        for (i, pixel) in [(word & 0xFFFF) as u16, (word >> 16) as u16].into_iter().enumerate() {
            let index = index + i as u32;
            if index >= total {
                break;
            }

            let x = dest.x().wrapping_add((index % u32::from(width)) as u16);
            let y = dest.y().wrapping_add((index / u32::from(width)) as u16);
            self.store_pixel(x, y, pixel);
        }
    }

    /// GP0(C0): read a rectangle back, two pixels per GPUREAD word.
    fn vram_to_cpu(&mut self) {
        let src = CoordPacket::from_bits(self.args.pop_front().unwrap());
        let size = SizePacket::from_bits(self.args.pop_front().unwrap());

        let (width, height) = effective_dimensions(size);
        let total = u32::from(width) * u32::from(height);

        let pixel_at = |gpu: &Gpu, index: u32| -> u32 {
            let x = src.x().wrapping_add((index % u32::from(width)) as u16);
            let y = src.y().wrapping_add((index / u32::from(width)) as u16);
            u32::from(gpu.vram_pixel(x, y))
        };

        for i in (0..total).step_by(2) {
            let low = pixel_at(self, i);
            let high = if i + 1 < total {
                pixel_at(self, i + 1)
            } else {
                0
            };
            self.response_queue.push_back(low | (high << 16));
        }

        self.status.set_ready_to_send_vram(true);
    }

    /// Handles a word written to GP1.
    pub fn gp1_write(&mut self, word: u32) {
        let cmd = DisplayCommand::from_bits(word);
        trace!(target: "gpu", "GP1 command {cmd:?}");

        let Some(opcode) = cmd.opcode() else {
            warn!(target: "gpu", "unhandled GP1 command 0x{word:08X}");
            return;
        };

        let param = cmd.param().value();
        match opcode {
            DisplayOpcode::ResetGpu => {
                self.status = GpuStatus::default();
                self.environment = Default::default();
                self.state = State::ReceiveCommand;
                self.args.clear();
                self.response_queue.clear();
            }
            DisplayOpcode::ResetCommandBuffer => {
                self.state = State::ReceiveCommand;
                self.args.clear();
            }
            DisplayOpcode::AcknowledgeGpuInterrupt => {
                self.status.set_interrupt_request(false);
            }
            DisplayOpcode::DisplayEnabled => {
                self.status.set_disable_display(param & 1 != 0);
            }
            DisplayOpcode::DmaDirection => {
                let direction = match param & 0b11 {
                    0 => super::DmaDirection::Off,
                    1 => super::DmaDirection::Fifo,
                    2 => super::DmaDirection::CpuToGp0,
                    _ => super::DmaDirection::GpuToCpu,
                };
                self.status.set_dma_direction(direction);
                // DREQ mirrors whichever direction is active
                self.status.set_dma_request(param & 0b11 != 0);
            }
            DisplayOpcode::DisplayArea => self.display_area = param,
            DisplayOpcode::HorizontalDisplayRange => self.horizontal_range = param,
            DisplayOpcode::VerticalDisplayRange => self.vertical_range = param,
            DisplayOpcode::DisplayMode => {
                let status = self.status.to_bits() & !0x7F_0000;
                let bits = (param & 0x3F) << 17 | ((param >> 6) & 1) << 16;
                self.status = GpuStatus::from_bits(status | bits);
            }
            DisplayOpcode::ReadGpuRegister => {
                let value = match param & 0x7 {
                    2 => self.environment.texture_window.to_bits(),
                    3 => {
                        (self.environment.area_top as u32) << 10
                            | self.environment.area_left as u32
                    }
                    4 => {
                        (self.environment.area_bottom as u32) << 10
                            | self.environment.area_right as u32
                    }
                    5 => {
                        ((self.environment.offset_y as u32) & 0x7FF) << 11
                            | (self.environment.offset_x as u32) & 0x7FF
                    }
                    _ => 0,
                };
                self.response_queue.push_back(value);
            }
        }
    }
}

/// Blit dimensions: zero means the maximum, and values are otherwise masked to the VRAM size.
fn effective_dimensions(size: SizePacket) -> (u16, u16) {
    let width = if size.width() == 0 {
        0x400
    } else {
        ((size.width() - 1) & 0x3FF) + 1
    };

    let height = if size.height() == 0 {
        0x200
    } else {
        ((size.height() - 1) & 0x1FF) + 1
    };

    (width, height)
}
