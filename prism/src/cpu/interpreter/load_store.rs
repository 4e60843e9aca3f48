use super::Interpreter;
use crate::{
    PSX,
    cpu::{RegLoad, instr::Instruction},
    mem::Address,
};

impl Interpreter {
    #[inline(always)]
    pub(super) fn effective_addr(&self, psx: &PSX, instr: Instruction) -> Address {
        let rs = psx.cpu.regs.read(instr.rs());
        Address(rs.wrapping_add_signed(i32::from(instr.signed_imm16())))
    }

    /// `rt = signext((byte)[rs + signed_imm16])`, committed one instruction late
    pub(super) fn lb(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);

        match psx.read::<i8, false>(addr) {
            Ok(value) => {
                self.cancel_load(instr.rt());
                psx.cpu.load_delay_slot = Some(RegLoad {
                    reg: instr.rt(),
                    value: i32::from(value) as u32,
                });
            }
            Err(_) => self.trigger_address_error(psx, addr, false),
        }
    }

    /// `rt = zeroext((byte)[rs + signed_imm16])`, committed one instruction late
    pub(super) fn lbu(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);

        match psx.read::<u8, false>(addr) {
            Ok(value) => {
                self.cancel_load(instr.rt());
                psx.cpu.load_delay_slot = Some(RegLoad {
                    reg: instr.rt(),
                    value: u32::from(value),
                });
            }
            Err(_) => self.trigger_address_error(psx, addr, false),
        }
    }

    /// `rt = signext((half)[rs + signed_imm16])`, committed one instruction late
    pub(super) fn lh(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);

        match psx.read::<i16, false>(addr) {
            Ok(value) => {
                self.cancel_load(instr.rt());
                psx.cpu.load_delay_slot = Some(RegLoad {
                    reg: instr.rt(),
                    value: i32::from(value) as u32,
                });
            }
            Err(_) => self.trigger_address_error(psx, addr, false),
        }
    }

    /// `rt = zeroext((half)[rs + signed_imm16])`, committed one instruction late
    pub(super) fn lhu(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);

        match psx.read::<u16, false>(addr) {
            Ok(value) => {
                self.cancel_load(instr.rt());
                psx.cpu.load_delay_slot = Some(RegLoad {
                    reg: instr.rt(),
                    value: u32::from(value),
                });
            }
            Err(_) => self.trigger_address_error(psx, addr, false),
        }
    }

    /// `rt = [rs + signed_imm16]`, committed one instruction late
    pub(super) fn lw(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);

        match psx.read::<u32, false>(addr) {
            Ok(value) => {
                self.cancel_load(instr.rt());
                psx.cpu.load_delay_slot = Some(RegLoad {
                    reg: instr.rt(),
                    value,
                });
            }
            Err(_) => self.trigger_address_error(psx, addr, false),
        }
    }

    /// `(byte)[rs + signed_imm16] = rt`
    pub(super) fn sb(&mut self, psx: &mut PSX, instr: Instruction) {
        if psx.cop0.regs.system_status().isolate_cache() {
            return;
        }

        let rt = psx.cpu.regs.read(instr.rt());
        let addr = self.effective_addr(psx, instr);

        if psx.write::<u8, false>(addr, rt as u8).is_err() {
            self.trigger_address_error(psx, addr, true);
        }
    }

    /// `(half)[rs + signed_imm16] = rt`
    pub(super) fn sh(&mut self, psx: &mut PSX, instr: Instruction) {
        if psx.cop0.regs.system_status().isolate_cache() {
            return;
        }

        let rt = psx.cpu.regs.read(instr.rt());
        let addr = self.effective_addr(psx, instr);

        if psx.write::<u16, false>(addr, rt as u16).is_err() {
            self.trigger_address_error(psx, addr, true);
        }
    }

    /// `[rs + signed_imm16] = rt`
    pub(super) fn sw(&mut self, psx: &mut PSX, instr: Instruction) {
        if psx.cop0.regs.system_status().isolate_cache() {
            return;
        }

        let rt = psx.cpu.regs.read(instr.rt());
        let addr = self.effective_addr(psx, instr);

        if psx.write::<u32, false>(addr, rt).is_err() {
            self.trigger_address_error(psx, addr, true);
        }
    }

    /// Unaligned load, left (most significant) part. Merges with an in-flight load of `rt`.
    pub(super) fn lwl(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);
        let rt = match self.pending_load {
            Some(load) if load.reg == instr.rt() => load.value,
            _ => psx.cpu.regs.read(instr.rt()),
        };

        let len = addr.value() % 4 + 1;
        let mut result = rt.to_be_bytes();
        for (i, byte) in (0..len).zip(result.iter_mut()) {
            *byte = psx.read_unaligned::<u8, false>(addr - i);
        }

        self.cancel_load(instr.rt());
        psx.cpu.load_delay_slot = Some(RegLoad {
            reg: instr.rt(),
            value: u32::from_be_bytes(result),
        });
    }

    /// Unaligned load, right (least significant) part. Merges with an in-flight load of `rt`.
    pub(super) fn lwr(&mut self, psx: &mut PSX, instr: Instruction) {
        let addr = self.effective_addr(psx, instr);
        let rt = match self.pending_load {
            Some(load) if load.reg == instr.rt() => load.value,
            _ => psx.cpu.regs.read(instr.rt()),
        };

        let len = 4 - addr.value() % 4;
        let mut result = rt.to_le_bytes();
        for (i, byte) in (0..len).zip(result.iter_mut()) {
            *byte = psx.read_unaligned::<u8, false>(addr + i);
        }

        self.cancel_load(instr.rt());
        psx.cpu.load_delay_slot = Some(RegLoad {
            reg: instr.rt(),
            value: u32::from_le_bytes(result),
        });
    }

    /// Unaligned store, left (most significant) part.
    pub(super) fn swl(&mut self, psx: &mut PSX, instr: Instruction) {
        if psx.cop0.regs.system_status().isolate_cache() {
            return;
        }

        let addr = self.effective_addr(psx, instr);
        let len = addr.value() % 4 + 1;

        let value = psx.cpu.regs.read(instr.rt()).to_be_bytes();
        for (i, byte) in (0..len).zip(value.iter()) {
            if psx.write_unaligned::<u8, false>(addr - i, *byte).is_err() {
                self.trigger_address_error(psx, addr, true);
                return;
            }
        }
    }

    /// Unaligned store, right (least significant) part.
    pub(super) fn swr(&mut self, psx: &mut PSX, instr: Instruction) {
        if psx.cop0.regs.system_status().isolate_cache() {
            return;
        }

        let addr = self.effective_addr(psx, instr);
        let len = 4 - addr.value() % 4;

        let value = psx.cpu.regs.read(instr.rt()).to_le_bytes();
        for (i, byte) in (0..len).zip(value.iter()) {
            if psx.write_unaligned::<u8, false>(addr + i, *byte).is_err() {
                self.trigger_address_error(psx, addr, true);
                return;
            }
        }
    }
}
