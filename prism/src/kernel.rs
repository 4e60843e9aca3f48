//! Names for the BIOS kernel call gates, used purely for tracing.

/// One of the three kernel function tables, selected by the call gate address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    A0,
    B0,
    C0,
}

/// A kernel function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    AddCdromDevice,
    AddDrv,
    AddMemCardDevice,
    AddNullconDriver,
    AdjustA0Table,
    AllocKernelMemory,
    BZero,
    ChangeClearPad,
    ChangeClearRCnt,
    CharToUpper,
    CloseEvent,
    DeliverEvent,
    DequeueCdIntr,
    DequeueInterruptRP,
    EnableEvent,
    EnqueueInterruptRP,
    EnqueueSyscallHandler,
    EnqueueTimerAndVblankIrqs,
    FlushCache,
    HookEntryInt,
    InitDefInt,
    InitHeap,
    InitPad,
    InstallDevices,
    InstallExceptionHandlers,
    Malloc,
    Memcpy,
    OpenEvent,
    Printf,
    PutChar,
    Rand,
    Remove96,
    ResetEntryInt,
    ReturnFromException,
    SendGpuCommandWord,
    SetJmp,
    StartPad,
    Strcmp,
    Strlen,
    Strncat,
    SysInitMemory,
    TestEvent,
    Write,
}

impl Function {
    /// Decodes a function selector from the given table.
    pub fn decode(table: Table, code: u8) -> Option<Self> {
        match table {
            Table::A0 => Self::a0(code),
            Table::B0 => Self::b0(code),
            Table::C0 => Self::c0(code),
        }
    }

    /// Functions called so often that logging them would drown everything else.
    pub fn noisy(&self) -> bool {
        matches!(
            self,
            Self::Rand | Self::ReturnFromException | Self::TestEvent | Self::PutChar
        )
    }

    fn a0(code: u8) -> Option<Self> {
        Some(match code {
            0x03 => Self::Write,
            0x13 => Self::SetJmp,
            0x16 => Self::Strncat,
            0x17 => Self::Strcmp,
            0x1B => Self::Strlen,
            0x25 => Self::CharToUpper,
            0x28 => Self::BZero,
            0x2A => Self::Memcpy,
            0x2F => Self::Rand,
            0x33 => Self::Malloc,
            0x39 => Self::InitHeap,
            0x3B => Self::PutChar,
            0x3F => Self::Printf,
            0x44 => Self::FlushCache,
            0x49 => Self::SendGpuCommandWord,
            0x56 | 0x72 => Self::Remove96,
            0x96 => Self::AddCdromDevice,
            0x97 => Self::AddMemCardDevice,
            0x99 => Self::AddNullconDriver,
            0xA3 => Self::DequeueCdIntr,
            _ => return None,
        })
    }

    fn b0(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::AllocKernelMemory,
            0x07 => Self::DeliverEvent,
            0x08 => Self::OpenEvent,
            0x09 => Self::CloseEvent,
            0x0B => Self::TestEvent,
            0x0C => Self::EnableEvent,
            0x12 => Self::InitPad,
            0x13 => Self::StartPad,
            0x17 => Self::ReturnFromException,
            0x18 => Self::ResetEntryInt,
            0x19 => Self::HookEntryInt,
            0x35 => Self::Write,
            0x3D => Self::PutChar,
            0x47 => Self::AddDrv,
            0x5B => Self::ChangeClearPad,
            _ => return None,
        })
    }

    fn c0(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::EnqueueTimerAndVblankIrqs,
            0x01 => Self::EnqueueSyscallHandler,
            0x02 => Self::EnqueueInterruptRP,
            0x03 => Self::DequeueInterruptRP,
            0x07 => Self::InstallExceptionHandlers,
            0x08 => Self::SysInitMemory,
            0x0A => Self::ChangeClearRCnt,
            0x0C => Self::InitDefInt,
            0x12 => Self::InstallDevices,
            0x1C => Self::AdjustA0Table,
            _ => return None,
        })
    }
}
