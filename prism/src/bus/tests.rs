use super::BusWriteErr;
use crate::{
    PSX, cpu, dma, gpu, gte, interrupts,
    mem::{Address, Memory},
    scheduler::Scheduler,
    sio0, spu, timers,
};

fn psx() -> PSX {
    PSX {
        scheduler: Scheduler::new(),
        memory: Memory::with_bios(vec![0; 512 * 1024]).unwrap(),
        cpu: cpu::Cpu::default(),
        cop0: cpu::cop0::Cop0::default(),
        gte: gte::Gte::default(),
        interrupts: interrupts::Controller::default(),
        dma: dma::State::default(),
        timers: timers::Timers::default(),
        gpu: gpu::Gpu::default(),
        cdrom: crate::cdrom::Controller::new(None),
        sio0: sio0::Controller::default(),
        spu: spu::Spu::default(),
    }
}

#[test]
fn ram_round_trips_at_every_width() {
    let mut psx = psx();

    // a sample of addresses across the 2 MiB, at each alignment
    for base in (0..0x20_0000u32).step_by(0x1_0000) {
        psx.write::<u8, false>(Address(base + 1), 0xAB).unwrap();
        assert_eq!(psx.read::<u8, false>(Address(base + 1)).unwrap(), 0xAB);

        psx.write::<u16, false>(Address(base + 2), 0xBEEF).unwrap();
        assert_eq!(psx.read::<u16, false>(Address(base + 2)).unwrap(), 0xBEEF);

        psx.write::<u32, false>(Address(base + 4), 0xDEAD_BEEF).unwrap();
        assert_eq!(
            psx.read::<u32, false>(Address(base + 4)).unwrap(),
            0xDEAD_BEEF
        );
    }
}

#[test]
fn ram_is_mirrored_through_every_segment() {
    let mut psx = psx();

    psx.write::<u32, false>(Address(0x0000_0100), 0x1234_5678).unwrap();
    assert_eq!(
        psx.read::<u32, false>(Address(0x8000_0100)).unwrap(),
        0x1234_5678
    );
    assert_eq!(
        psx.read::<u32, false>(Address(0xA000_0100)).unwrap(),
        0x1234_5678
    );
    // and through the 2 MiB mirror inside the 8 MiB window
    assert_eq!(
        psx.read::<u32, false>(Address(0x0020_0100)).unwrap(),
        0x1234_5678
    );
}

#[test]
fn bios_writes_are_swallowed_only_while_the_cache_is_isolated() {
    let mut psx = psx();
    psx.memory.bios[0..4].copy_from_slice(&0x0BF0_0000u32.to_le_bytes());

    assert_eq!(
        psx.read::<u32, false>(Address(0xBFC0_0000)).unwrap(),
        0x0BF0_0000
    );

    // isolated: the store vanishes without failing
    psx.cop0.regs.system_status_mut().set_isolate_cache(true);
    psx.write::<u32, false>(Address(0xBFC0_0000), 0).unwrap();
    assert_eq!(
        psx.read::<u32, false>(Address(0xBFC0_0000)).unwrap(),
        0x0BF0_0000
    );

    // not isolated: a ROM store is an error the CPU must turn into a fault
    psx.cop0.regs.system_status_mut().set_isolate_cache(false);
    assert!(matches!(
        psx.write::<u32, false>(Address(0xBFC0_0000), 0),
        Err(BusWriteErr::Rom { .. })
    ));
    assert_eq!(
        psx.read::<u32, false>(Address(0xBFC0_0000)).unwrap(),
        0x0BF0_0000
    );
}

#[test]
fn misaligned_accesses_are_rejected() {
    let mut psx = psx();

    assert!(psx.read::<u32, false>(Address(0x2)).is_err());
    assert!(psx.read::<u16, false>(Address(0x1)).is_err());
    assert!(psx.write::<u32, false>(Address(0x6), 0).is_err());
    assert!(psx.read::<u8, false>(Address(0x3)).is_ok());
}

#[test]
fn interrupt_status_acknowledge_through_the_bus() {
    let mut psx = psx();
    psx.interrupts.request(interrupts::Interrupt::VBlank);
    psx.interrupts.request(interrupts::Interrupt::Cdrom);

    let stat = psx.read::<u16, false>(Address(0x1F80_1070)).unwrap();
    assert_eq!(stat, 0b101);

    // writing 1s keeps, writing 0s acknowledges
    psx.write::<u16, false>(Address(0x1F80_1070), !0b001).unwrap();
    let stat = psx.read::<u16, false>(Address(0x1F80_1070)).unwrap();
    assert_eq!(stat, 0b100);
}

#[test]
fn interrupt_mask_is_write_through() {
    let mut psx = psx();

    psx.write::<u16, false>(Address(0x1F80_1074), 0x5A5).unwrap();
    assert_eq!(
        psx.read::<u16, false>(Address(0x1F80_1074)).unwrap(),
        0x5A5 & 0x7FF
    );
}

#[test]
fn timer_registers_route_to_the_right_channel() {
    let mut psx = psx();

    psx.write::<u16, false>(Address(0x1F80_1120), 0x0042).unwrap();
    assert_eq!(
        psx.read::<u16, false>(Address(0x1F80_1120)).unwrap(),
        0x0042
    );
    assert_eq!(psx.read::<u16, false>(Address(0x1F80_1100)).unwrap(), 0);
}

#[test]
fn gpu_ports_accept_commands_and_report_status() {
    let mut psx = psx();

    let stat = psx.read::<u32, false>(Address(0x1F80_1814)).unwrap();
    assert_ne!(stat & (1 << 26), 0); // ready to receive a command

    // drawing area + a quick fill through GP0
    psx.write::<u32, false>(Address(0x1F80_1810), 0x0200_00FF).unwrap();
    psx.write::<u32, false>(Address(0x1F80_1810), 0).unwrap();
    psx.write::<u32, false>(Address(0x1F80_1810), 0x0001_0010).unwrap();

    assert_eq!(psx.gpu.vram_pixel(0, 0), 0x001F);
}

#[test]
fn spu_window_round_trips_voice_registers() {
    let mut psx = psx();

    // voice 3 pitch
    psx.write::<u16, false>(Address(0x1F80_1C34), 0x1000).unwrap();
    assert_eq!(psx.spu.voices[3].pitch, 0x1000);
    assert_eq!(
        psx.read::<u16, false>(Address(0x1F80_1C34)).unwrap(),
        0x1000
    );

    // 32 bit write covers two halfword registers
    psx.write::<u32, false>(Address(0x1F80_1C30), 0x2222_1111).unwrap();
    assert_eq!(psx.spu.voices[3].volume_left, 0x1111);
    assert_eq!(psx.spu.voices[3].volume_right, 0x2222);
}

#[test]
fn otc_dma_builds_a_reverse_clear_list() {
    let mut psx = psx();

    // enable DMA channel 6, MADR at 0x1080, 8 entries, start burst
    psx.write::<u32, false>(Address(0x1F80_10F0), 0x0800_0000).unwrap();
    psx.write::<u32, false>(Address(0x1F80_10E0), 0x0000_1080).unwrap();
    psx.write::<u32, false>(Address(0x1F80_10E4), 8).unwrap();
    psx.write::<u32, false>(Address(0x1F80_10E8), 0x1100_0000).unwrap();

    for k in 0..7u32 {
        let addr = 0x1080 - 4 * k;
        let value = psx.read::<u32, false>(Address(addr)).unwrap();
        assert_eq!(value, addr - 4, "entry {k}");
    }
    let terminator = psx.read::<u32, false>(Address(0x1080 - 4 * 7)).unwrap();
    assert_eq!(terminator, 0x00FF_FFFF);
}

#[test]
fn dma_completion_raises_the_interrupt_on_a_rising_edge() {
    let mut psx = psx();
    psx.interrupts.mask = interrupts::Mask::from_bits(0x7FF);

    // master enable + channel 6 mask
    psx.write::<u32, false>(Address(0x1F80_10F4), 0x0040_0000 | 0x0080_0000)
        .unwrap();
    psx.write::<u32, false>(Address(0x1F80_10F0), 0x0800_0000).unwrap();
    psx.write::<u32, false>(Address(0x1F80_10E0), 0x0000_0100).unwrap();
    psx.write::<u32, false>(Address(0x1F80_10E4), 4).unwrap();
    psx.write::<u32, false>(Address(0x1F80_10E8), 0x1100_0000).unwrap();

    // the completion event is pending; fire it
    psx.scheduler.merge();
    psx.scheduler.advance(16);
    let mut fired = false;
    while let Some((event, _)) = psx.scheduler.pop_due() {
        if let crate::scheduler::Event::DmaEnd(channel) = event {
            dma::executor::transfer_end(&mut psx, channel);
            fired = true;
        }
    }

    assert!(fired);
    assert_eq!(psx.interrupts.pending(), Some(interrupts::Interrupt::Dma));

    // CHCR start bit dropped, DICR pending + master flag set
    let chcr = psx.read::<u32, false>(Address(0x1F80_10E8)).unwrap();
    assert_eq!(chcr & (1 << 24), 0);
    let dicr = psx.read::<u32, false>(Address(0x1F80_10F4)).unwrap();
    assert_ne!(dicr & (1 << 30), 0);
    assert_ne!(dicr & (1 << 31), 0);
}

#[test]
fn cdrom_ports_are_byte_wide() {
    let mut psx = psx();

    psx.write::<u8, false>(Address(0x1F80_1800), 0x01).unwrap();
    assert_eq!(psx.cdrom.bank, 1);

    let status = psx.read::<u8, false>(Address(0x1F80_1800)).unwrap();
    assert_eq!(status & 0b11, 1);
}

#[test]
fn kseg2_holds_the_cache_control_register() {
    let mut psx = psx();

    psx.write::<u32, false>(Address(0xFFFE_0130), 0x0001_E988).unwrap();
    assert_eq!(
        psx.read::<u32, false>(Address(0xFFFE_0130)).unwrap(),
        0x0001_E988
    );
    assert_eq!(psx.cpu.cache_control, 0x0001_E988);
}
