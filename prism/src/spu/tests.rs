use super::*;

/// Writes a simple ADPCM block at `addr`: shift 0, filter 0, all nibbles `value`, given flags.
fn write_block(spu: &mut Spu, addr: usize, value: u8, flags: u8) {
    spu.ram[addr] = 0x00;
    spu.ram[addr + 1] = flags;
    for i in 2..16 {
        spu.ram[addr + i] = value | (value << 4);
    }
}

fn keyed_voice(spu: &mut Spu) {
    spu.write(0x1AA, 0xC000); // SPU enabled, unmuted
    spu.write(0x180, 0x3FFF); // master volumes
    spu.write(0x182, 0x3FFF);

    // voice 0: full volume, pitch 1.0, sample at 0x100 bytes
    spu.write(0x0, 0x3FFF);
    spu.write(0x2, 0x3FFF);
    spu.write(0x4, 0x1000);
    spu.write(0x6, (0x100 / 8) as u16);
    // instant attack, max sustain
    spu.write(0x8, 0x000F);
    spu.write(0xA, 0x0000);

    // key on voice 0
    spu.write(0x188, 0x0001);
    spu.write(0x18A, 0x0000);
}

#[test]
fn key_on_is_latched_by_the_high_half_write() {
    let mut spu = Spu::default();
    spu.write(0x188, 0x0001);
    assert_eq!(spu.voices[0].envelope.phase, Phase::Off);

    spu.write(0x18A, 0x0000);
    assert_eq!(spu.voices[0].envelope.phase, Phase::Attack);
}

#[test]
fn key_off_moves_voices_to_release() {
    let mut spu = Spu::default();
    spu.write(0x188, 0x0001);
    spu.write(0x18A, 0x0000);

    spu.write(0x18C, 0x0001);
    spu.write(0x18E, 0x0000);
    assert_eq!(spu.voices[0].envelope.phase, Phase::Release);
}

#[test]
fn muted_spu_outputs_silence() {
    let mut spu = Spu::default();
    keyed_voice(&mut spu);
    spu.write(0x1AA, 0x8000); // enabled but muted

    spu.sample_event();
    assert_eq!(spu.output.pop_front(), Some((0, 0)));
}

#[test]
fn a_keyed_voice_produces_samples() {
    let mut spu = Spu::default();
    write_block(&mut spu, 0x100, 0x7, 0x00);
    write_block(&mut spu, 0x110, 0x7, 0x03); // loop end + repeat
    keyed_voice(&mut spu);

    let mut heard = false;
    for _ in 0..256 {
        spu.sample_event();
    }
    while let Some((left, right)) = spu.output.pop_front() {
        if left != 0 || right != 0 {
            heard = true;
            assert_eq!(left, right);
        }
    }

    assert!(heard, "voice never produced a nonzero sample");
}

#[test]
fn loop_end_without_repeat_releases_the_voice() {
    let mut spu = Spu::default();
    write_block(&mut spu, 0x100, 0x7, 0x01); // loop end, no repeat
    keyed_voice(&mut spu);

    for _ in 0..64 {
        spu.sample_event();
    }

    assert_eq!(spu.voices[0].envelope.phase, Phase::Off);
    assert_eq!(spu.voices[0].envelope.level, 0);
}

#[test]
fn envelope_level_clamps_to_the_positive_range() {
    let mut envelope = Envelope {
        phase: Phase::Release,
        level: 3,
        counter: 0,
    };

    // fastest release: shift 0
    let config = AdsrConfig::from_bits(0);
    for _ in 0..16 {
        envelope.step(config);
    }

    assert_eq!(envelope.level, 0);
    assert_eq!(envelope.phase, Phase::Off);
}

#[test]
fn attack_reaches_full_scale_then_decays() {
    let mut envelope = Envelope {
        phase: Phase::Attack,
        level: 0,
        counter: 0,
    };

    // attack shift 0, step 0 (+7 per tick), linear
    let config = AdsrConfig::from_bits(0);
    for _ in 0..10_000 {
        envelope.step(config);
        assert!((0..=0x7FFF).contains(&envelope.level));
    }

    assert_ne!(envelope.phase, Phase::Attack);
}

#[test]
fn transfer_port_writes_land_in_sound_ram() {
    let mut spu = Spu::default();

    spu.write(0x1A6, 0x0020); // transfer address: 0x100 bytes
    spu.write(0x1A8, 0xBEEF);
    spu.write(0x1A8, 0xCAFE);

    assert_eq!(&spu.ram[0x100..0x104], &[0xEF, 0xBE, 0xFE, 0xCA]);

    // DMA reads start where the address register pointed
    spu.write(0x1A6, 0x0020);
    assert_eq!(spu.dma_read(), 0xBEEF);
    assert_eq!(spu.dma_read(), 0xCAFE);
}
