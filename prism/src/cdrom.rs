//! The CDROM drive controller.

mod interpreter;

use bitos::bitos;
use log::warn;
use std::collections::VecDeque;
use std::io::{Read, Seek, SeekFrom};

/// Bytes per raw sector.
pub const SECTOR_SIZE: usize = 2352;

/// One of the four byte-wide controller registers. What they do depends on the current bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Reg0,
    Reg1,
    Reg2,
    Reg3,
}

/// A drive command, written to register 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetStat,
    SetLoc,
    ReadN,
    Pause,
    Init,
    Mute,
    Demute,
    SetMode,
    GetTN,
    GetTD,
    SeekL,
    Test,
    GetID,
    ReadTOC,
}

impl Command {
    pub fn new(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::GetStat,
            0x02 => Self::SetLoc,
            0x06 => Self::ReadN,
            0x09 => Self::Pause,
            0x0A => Self::Init,
            0x0B => Self::Mute,
            0x0C => Self::Demute,
            0x0E => Self::SetMode,
            0x13 => Self::GetTN,
            0x14 => Self::GetTD,
            0x15 => Self::SeekL,
            0x19 => Self::Test,
            0x1A => Self::GetID,
            0x1E => Self::ReadTOC,
            _ => return None,
        })
    }
}

/// The drive status byte, first response of most commands.
#[bitos(8)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveStatus {
    #[bits(0)]
    pub error: bool,
    #[bits(1)]
    pub motor_on: bool,
    #[bits(2)]
    pub seek_error: bool,
    #[bits(3)]
    pub id_error: bool,
    #[bits(4)]
    pub shell_open: bool,
    #[bits(5)]
    pub reading: bool,
    #[bits(6)]
    pub seeking: bool,
    #[bits(7)]
    pub playing: bool,
}

/// The drive mode byte, set through `SetMode`.
#[bitos(8)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveMode {
    #[bits(0)]
    pub cdda: bool,
    #[bits(1)]
    pub auto_pause: bool,
    #[bits(2)]
    pub report: bool,
    #[bits(3)]
    pub xa_filter: bool,
    #[bits(4)]
    pub ignore_bit: bool,
    /// Deliver whole 0x924-byte sectors instead of the 0x800 data area.
    #[bits(5)]
    pub full_sector: bool,
    #[bits(6)]
    pub xa_adpcm: bool,
    /// Read at 2x (150 sectors per second).
    #[bits(7)]
    pub double_speed: bool,
}

/// A seek target in BCD minutes/seconds/sector form, as given to `SetLoc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekTarget {
    pub minutes: u8,
    pub seconds: u8,
    pub sector: u8,
}

impl SeekTarget {
    /// The absolute sector number on the disc image: BCD-decoded and rebased past the two second
    /// lead-in.
    pub fn lba(&self) -> u64 {
        fn from_bcd(value: u8) -> u64 {
            u64::from(value / 16) * 10 + u64::from(value % 16)
        }

        from_bcd(self.minutes) * 60 * 75 + from_bcd(self.seconds) * 75 + from_bcd(self.sector)
            - 150
    }

    /// Advances to the next sector, carrying BCD digits at 0x75 sectors and 0x60 seconds.
    pub fn advance(&mut self) {
        self.sector += 1;

        if self.sector & 0xF == 10 {
            self.sector += 0x10 - 10;
        }

        if self.sector == 0x75 {
            self.sector = 0;
            self.seconds += 1;

            if self.seconds & 0xF == 10 {
                self.seconds += 0x10 - 10;
            }

            if self.seconds == 0x60 {
                self.seconds = 0;
                self.minutes += 1;

                if self.minutes & 0xF == 10 {
                    self.minutes += 0x10 - 10;
                }
            }
        }
    }
}

/// A backing disc image: raw 2352-byte sectors (BIN format).
pub trait Disc {
    /// Fetches the sector at `lba` into `buf`.
    fn read_sector(&mut self, lba: u64, buf: &mut [u8; SECTOR_SIZE]) -> std::io::Result<()>;
}

impl<R> Disc for R
where
    R: Read + Seek,
{
    fn read_sector(&mut self, lba: u64, buf: &mut [u8; SECTOR_SIZE]) -> std::io::Result<()> {
        self.seek(SeekFrom::Start(lba * SECTOR_SIZE as u64))?;
        self.read_exact(buf)
    }
}

/// The state of the CDROM controller.
pub struct Controller {
    /// Current register bank, in `0..4`.
    pub bank: u8,
    pub status: DriveStatus,
    pub mode: DriveMode,

    /// Interrupt enable mask, low five bits.
    pub int_enable: u8,
    /// Interrupt flags; the low three bits encode the pending INT class.
    pub int_flags: u8,
    /// Interrupt classes waiting for the current one to be acknowledged.
    pending_irqs: VecDeque<u8>,
    /// Status bits to drop when the next INT2 is delivered.
    complete_clears: u8,

    pub parameter_fifo: VecDeque<u8>,
    pub response_fifo: VecDeque<u8>,

    pub target: SeekTarget,
    /// The most recently read raw sector.
    sector: Box<[u8; SECTOR_SIZE]>,
    /// Next byte handed out of the sector buffer. Starts past the sync/header area.
    read_index: usize,

    disc: Option<Box<dyn Disc>>,
}

impl Controller {
    pub fn new(disc: Option<Box<dyn Disc>>) -> Self {
        Self {
            bank: 0,
            status: DriveStatus::default(),
            mode: DriveMode::default(),
            int_enable: 0,
            int_flags: 0,
            pending_irqs: VecDeque::new(),
            complete_clears: 0,
            parameter_fifo: VecDeque::new(),
            response_fifo: VecDeque::new(),
            target: SeekTarget::default(),
            sector: crate::util::boxed_array(0),
            read_index: SECTOR_SIZE,
            disc,
        }
    }

    /// Reads one of the four registers.
    pub fn read(&mut self, reg: Reg) -> u8 {
        match reg {
            Reg::Reg0 => {
                let mut value = self.bank & 0b11;
                value |= u8::from(self.parameter_fifo.is_empty()) << 3;
                value |= u8::from(self.parameter_fifo.len() != 16) << 4;
                value |= u8::from(!self.response_fifo.is_empty()) << 5;
                value |= u8::from(self.data_ready()) << 6;
                value
            }
            Reg::Reg1 => self.response_fifo.pop_front().unwrap_or_else(|| {
                warn!(target: "cdrom", "read from empty response FIFO");
                0
            }),
            Reg::Reg2 => self.data_byte(),
            Reg::Reg3 => match self.bank & 1 {
                0 => self.int_enable,
                _ => self.int_flags | 0xE0,
            },
        }
    }

    /// Whether sector data is available for register or DMA reads.
    pub fn data_ready(&self) -> bool {
        self.read_index < self.data_end()
    }

    /// One past the last byte the guest may read from the current sector.
    fn data_end(&self) -> usize {
        if self.mode.full_sector() {
            12 + 0x924
        } else {
            24 + 0x800
        }
    }

    /// Reads the next byte out of the sector buffer.
    pub fn data_byte(&mut self) -> u8 {
        if !self.data_ready() {
            warn!(target: "cdrom", "sector buffer exhausted");
            return 0;
        }

        let value = self.sector[self.read_index];
        self.read_index += 1;
        value
    }

    /// Reads the next word out of the sector buffer, for DMA.
    pub fn dma_word(&mut self) -> u32 {
        u32::from_le_bytes([
            self.data_byte(),
            self.data_byte(),
            self.data_byte(),
            self.data_byte(),
        ])
    }

    /// Fetches the sector at the current target into the buffer and advances the target. A read
    /// failure produces a zeroed sector and flags a seek error, which the guest can observe in
    /// the status byte.
    fn load_sector(&mut self) {
        let lba = self.target.lba();

        let ok = match &mut self.disc {
            Some(disc) => disc.read_sector(lba, &mut self.sector).is_ok(),
            None => false,
        };

        if !ok {
            warn!(target: "cdrom", "sector {lba} unreadable, returning zeroes");
            self.sector.fill(0);
            self.status.set_seek_error(true);
        }

        self.read_index = if self.mode.full_sector() { 12 } else { 24 };
        self.target.advance();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("bank", &self.bank)
            .field("status", &self.status)
            .field("mode", &self.mode)
            .field("int_enable", &self.int_enable)
            .field("int_flags", &self.int_flags)
            .finish_non_exhaustive()
    }
}
