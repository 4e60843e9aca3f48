use super::*;

fn gpu_with_open_area() -> Gpu {
    let mut gpu = Gpu::default();
    gpu.gp0_write(0xE300_0000); // drawing area top left (0, 0)
    gpu.gp0_write(0xE400_0000 | (511 << 10) | 1023); // drawing area bottom right
    gpu.gp0_write(0xE500_0000); // drawing offset (0, 0)
    gpu
}

#[test]
fn quick_fill_paints_the_rectangle() {
    let mut gpu = Gpu::default();

    // fill 32x16 at (16, 0) with pure red
    gpu.gp0_write(0x0200_00FF);
    gpu.gp0_write(0x0000_0010);
    gpu.gp0_write(0x0010_0020);

    assert_eq!(gpu.vram_pixel(16, 0), 0x001F);
    assert_eq!(gpu.vram_pixel(47, 15), 0x001F);
    assert_eq!(gpu.vram_pixel(48, 0), 0);
    assert_eq!(gpu.vram_pixel(15, 0), 0);
}

#[test]
fn gouraud_quad_covers_the_draw_area() {
    let mut gpu = gpu_with_open_area();

    // shaded quad over 640x480, all red
    gpu.gp0_write(0x3800_00FF);
    gpu.gp0_write(0x0000_0000); // v0 = (0, 0)
    gpu.gp0_write(0x0000_00FF);
    gpu.gp0_write(0x0000_0280); // v1 = (640, 0)
    gpu.gp0_write(0x0000_00FF);
    gpu.gp0_write(0x01E0_0000); // v2 = (0, 480)
    gpu.gp0_write(0x0000_00FF);
    gpu.gp0_write(0x01E0_0280); // v3 = (640, 480)

    for (x, y) in [(0, 0), (320, 240), (639, 479), (100, 400)] {
        assert_eq!(gpu.vram_pixel(x, y), 0x001F, "pixel at ({x}, {y})");
    }
}

#[test]
fn no_pixel_escapes_the_clip_window() {
    let mut gpu = Gpu::default();
    gpu.gp0_write(0xE300_0000 | (10 << 10) | 10); // top left (10, 10)
    gpu.gp0_write(0xE400_0000 | (20 << 10) | 20); // bottom right (20, 20)
    gpu.gp0_write(0xE500_0000);

    // flat triangle far larger than the window
    gpu.gp0_write(0x2000_00FF);
    gpu.gp0_write(0x0000_0000);
    gpu.gp0_write(0x0000_0100);
    gpu.gp0_write(0x0100_0000);

    for y in 0..64u16 {
        for x in 0..64u16 {
            let inside = (10..=20).contains(&x) && (10..=20).contains(&y);
            if !inside {
                assert_eq!(gpu.vram_pixel(x, y), 0, "pixel at ({x}, {y})");
            }
        }
    }

    assert_ne!(gpu.vram_pixel(12, 12), 0);
}

#[test]
fn drawing_offset_translates_primitives() {
    let mut gpu = gpu_with_open_area();
    gpu.gp0_write(0xE500_0000 | (100 << 11) | 50); // offset (50, 100)

    // 1x1 rectangle at (0, 0)
    gpu.gp0_write(0x6800_00FF);
    gpu.gp0_write(0x0000_0000);

    assert_eq!(gpu.vram_pixel(50, 100), 0x001F);
    assert_eq!(gpu.vram_pixel(0, 0), 0);
}

#[test]
fn cpu_to_vram_blit_round_trips_through_readback() {
    let mut gpu = gpu_with_open_area();

    // upload 4x2 pixels to (100, 200)
    gpu.gp0_write(0xA000_0000);
    gpu.gp0_write((200 << 16) | 100);
    gpu.gp0_write((2 << 16) | 4);
    gpu.gp0_write(0x2222_1111);
    gpu.gp0_write(0x4444_3333);
    gpu.gp0_write(0x6666_5555);
    gpu.gp0_write(0x8888_7777);

    assert_eq!(gpu.vram_pixel(100, 200), 0x1111);
    assert_eq!(gpu.vram_pixel(103, 200), 0x4444);
    assert_eq!(gpu.vram_pixel(100, 201), 0x5555);
    assert_eq!(gpu.vram_pixel(103, 201), 0x8888);

    // read the same rectangle back
    gpu.gp0_write(0xC000_0000);
    gpu.gp0_write((200 << 16) | 100);
    gpu.gp0_write((2 << 16) | 4);

    let words: Vec<u32> = std::iter::from_fn(|| Some(gpu.gpuread())).take(4).collect();
    assert_eq!(words, vec![0x2222_1111, 0x4444_3333, 0x6666_5555, 0x8888_7777]);

    // the word count is exact: the queue is drained afterwards
    assert!(gpu.response_queue.is_empty());
}

#[test]
fn vram_to_vram_blit_copies_pixels() {
    let mut gpu = gpu_with_open_area();
    gpu.set_vram_pixel(10, 10, 0xABCD & 0x7FFF);
    gpu.set_vram_pixel(11, 10, 0x1234);

    gpu.gp0_write(0x8000_0000);
    gpu.gp0_write((10 << 16) | 10);
    gpu.gp0_write((300 << 16) | 400);
    gpu.gp0_write((1 << 16) | 2);

    assert_eq!(gpu.vram_pixel(400, 300), 0xABCD & 0x7FFF);
    assert_eq!(gpu.vram_pixel(401, 300), 0x1234);
}

#[test]
fn textured_rectangle_samples_the_clut() {
    let mut gpu = gpu_with_open_area();

    // texture page at (0, 0), 4 bit depth
    gpu.gp0_write(0xE100_0000);

    // nibble texture: texel row with indices 1, 2, 3, 4 packed into one halfword
    gpu.set_vram_pixel(0, 0, 0x4321);

    // palette row at (0, 500): entries 0..=4
    for (i, entry) in [0u16, 0x001F, 0x03E0, 0x7C00, 0x7FFF].into_iter().enumerate() {
        gpu.set_vram_pixel(i as u16, 500, entry);
    }

    // raw textured 4x1 sprite at (600, 100), clut at (0, 500)
    gpu.gp0_write(0x6500_0000);
    gpu.gp0_write((100 << 16) | 600);
    gpu.gp0_write(((500 << 6) as u32) << 16); // clut attribute, uv = (0, 0)
    gpu.gp0_write((1 << 16) | 4);

    assert_eq!(gpu.vram_pixel(600, 100), 0x001F);
    assert_eq!(gpu.vram_pixel(601, 100), 0x03E0);
    assert_eq!(gpu.vram_pixel(602, 100), 0x7C00);
    assert_eq!(gpu.vram_pixel(603, 100), 0x7FFF);
}

#[test]
fn mask_bit_blocks_overwrites() {
    let mut gpu = gpu_with_open_area();

    // draw with mask writing on
    gpu.gp0_write(0xE600_0001);
    gpu.gp0_write(0x6800_00FF);
    gpu.gp0_write(0x0000_0000);
    assert_eq!(gpu.vram_pixel(0, 0), 0x801F);

    // enable the mask check and try to overwrite with green
    gpu.gp0_write(0xE600_0002);
    gpu.gp0_write(0x6800_FF00);
    gpu.gp0_write(0x0000_0000);
    assert_eq!(gpu.vram_pixel(0, 0), 0x801F);
}

#[test]
fn gp1_reset_clears_pending_state() {
    let mut gpu = Gpu::default();

    gpu.gp0_write(0xA000_0000); // blit expecting arguments
    gpu.gp1_write(0x0100_0000); // reset command buffer

    // a nop must now be interpreted as a fresh command
    gpu.gp0_write(0x0000_0000);
    assert!(matches!(gpu.state, State::ReceiveCommand));
}

#[test]
fn gp1_display_mode_updates_status() {
    let mut gpu = Gpu::default();
    gpu.gp1_write(0x0800_0003); // 640 wide

    assert_eq!(
        gpu.status.horizontal_resolution(),
        HorizontalResolution::R640
    );
    assert_eq!(gpu.status.video_mode(), VideoMode::Ntsc);
}
