use super::*;

#[test]
fn segment_mirrors_share_the_physical_map() {
    for offset in [0x0000_0000u32, 0x0010_0000, 0x1F80_0000, 0x1FC0_0000] {
        let kuseg = Address(offset).physical().unwrap();
        let kseg0 = Address(0x8000_0000 | offset).physical().unwrap();
        let kseg1 = Address(0xA000_0000 | offset).physical().unwrap();

        assert_eq!(kuseg, kseg0);
        assert_eq!(kuseg, kseg1);
    }
}

#[test]
fn kseg2_has_no_physical_mapping() {
    assert_eq!(Address(0xFFFE_0130).physical(), None);
    assert_eq!(Address(0xFFFE_0130).segment(), Segment::KSEG2);
}

#[test]
fn region_decode() {
    let region = |addr: u32| Address(addr).physical().unwrap().region();

    assert_eq!(region(0x0000_0000), Some(Region::Ram));
    assert_eq!(region(0x001F_FFFF), Some(Region::Ram));
    assert_eq!(region(0x0020_0000), Some(Region::RamMirror));
    assert_eq!(region(0x1F80_0000), Some(Region::ScratchPad));
    assert_eq!(region(0x1F80_03FF), Some(Region::ScratchPad));
    assert_eq!(region(0x1F80_1070), Some(Region::IOPorts));
    assert_eq!(region(0x1F80_2041), Some(Region::Expansion2));
    assert_eq!(region(0xBFC0_0000 & 0x1FFF_FFFF), Some(Region::Bios));
    assert_eq!(region(0x1F00_0000), None);
}

#[test]
fn primitives_round_trip_little_endian() {
    let mut buf = [0u8; 8];
    buf.write(0xDEAD_BEEFu32);
    assert_eq!(buf[..4], [0xEF, 0xBE, 0xAD, 0xDE]);

    let word: u32 = buf.read();
    assert_eq!(word, 0xDEAD_BEEF);

    let half: u16 = buf.read();
    assert_eq!(half, 0xBEEF);

    buf[..2].write(0x1234u16);
    let word: u32 = buf.read();
    assert_eq!(word, 0xDEAD_1234);
}

#[test]
fn short_buffers_read_zero_padded_and_drop_writes() {
    let mut buf = [0xAAu8; 2];
    let word: u32 = buf.as_slice().read();
    assert_eq!(word, 0x0000_AAAA);

    buf.as_mut_slice().write(0x1122_3344u32);
    assert_eq!(buf, [0x44, 0x33]);
}

#[test]
fn bios_must_be_exactly_512_kib() {
    assert!(Memory::with_bios(vec![0; 1024]).is_err());
    assert!(Memory::with_bios(vec![0; 512 * 1024]).is_ok());
}

#[test]
fn io_reg_offsets_respect_width() {
    use io::Reg;

    assert_eq!(
        Reg::reg_and_offset(Address(0x1F80_1070)),
        Some((Reg::InterruptStatus, 0))
    );
    assert_eq!(
        Reg::reg_and_offset(Address(0x1F80_1072)),
        Some((Reg::InterruptStatus, 2))
    );
    // JoyControl is only 2 bytes wide, so 0x104C belongs to nothing
    assert_eq!(Reg::reg_and_offset(Address(0x1F80_104C)), None);
    assert_eq!(
        Reg::reg_and_offset(Address(0x1F80_1801)),
        Some((Reg::Cdrom1, 0))
    );
}
