//! The `PS-X EXE` executable format.

use crate::mem::Address;
use binrw::BinRead;

/// Header of a PSX executable.
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = b"PS-X EXE\0\0\0\0\0\0\0\0")]
pub struct Header {
    pub initial_pc: Address,
    pub initial_gp: u32,

    /// Where the body is copied to in RAM.
    pub destination: Address,
    /// Length of the body, in bytes.
    pub length: u32,

    pub data_start: Address,
    pub data_length: u32,

    pub bss_start: Address,
    pub bss_length: u32,

    pub initial_sp_base: u32,
    pub initial_sp_offset: u32,

    #[br(pad_before = 20, count = 0x7B4)]
    pub marker: Vec<u8>,
}

/// A PSX executable.
#[derive(Debug, Clone, BinRead)]
#[br(little)]
pub struct Executable {
    pub header: Header,
    #[br(count = header.length)]
    pub program: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::BinRead;
    use std::io::Cursor;

    fn image(body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"PS-X EXE\0\0\0\0\0\0\0\0");
        data.extend_from_slice(&0x8001_0000u32.to_le_bytes()); // initial pc
        data.extend_from_slice(&0x8002_0000u32.to_le_bytes()); // initial gp
        data.extend_from_slice(&0x8001_0000u32.to_le_bytes()); // destination
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend_from_slice(&[0; 16]); // data/bss ranges
        data.extend_from_slice(&0x801F_F000u32.to_le_bytes()); // sp base
        data.extend_from_slice(&0u32.to_le_bytes()); // sp offset
        data.extend_from_slice(&[0; 20 + 0x7B4]);
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn parses_a_minimal_executable() {
        let body = [0x0Du8, 0x00, 0x02, 0x24]; // ADDIU V0, R0, 13
        let exe = Executable::read(&mut Cursor::new(image(&body))).unwrap();

        assert_eq!(exe.header.initial_pc, Address(0x8001_0000));
        assert_eq!(exe.header.length, 4);
        assert_eq!(exe.program, body);
    }

    #[test]
    fn rejects_a_bad_magic() {
        let mut data = image(&[]);
        data[0] = b'Q';
        assert!(Executable::read(&mut Cursor::new(data)).is_err());
    }
}
