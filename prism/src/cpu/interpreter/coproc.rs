use super::Interpreter;
use crate::{
    PSX,
    cpu::{
        RegLoad, cop0,
        cop0::Exception,
        instr::Instruction,
    },
    gte,
};

impl Interpreter {
    /// `rt = cop0[rd]`, committed one instruction late
    pub(super) fn mfc0(&mut self, psx: &mut PSX, instr: Instruction) {
        let value = psx.cop0.regs.read(instr.cop0_rd());

        self.cancel_load(instr.rt());
        psx.cpu.load_delay_slot = Some(RegLoad {
            reg: instr.rt(),
            value,
        });
    }

    /// `cop0[rd] = rt`, committed one instruction late
    pub(super) fn mtc0(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cop0.load_delay_slot = Some(cop0::RegLoad {
            reg: instr.cop0_rd(),
            value: rt,
        });
    }

    /// Pops the KU/IE stack, returning from an exception.
    pub(super) fn rfe(&mut self, psx: &mut PSX, _instr: Instruction) {
        psx.cop0.regs.system_status_mut().restore_from_exception();
    }

    /// `rt = gte_data[rd]`, committed one instruction late
    pub(super) fn mfc2(&mut self, psx: &mut PSX, instr: Instruction) {
        let value = psx.gte.regs.read(instr.gte_data_rd().into());

        self.cancel_load(instr.rt());
        psx.cpu.load_delay_slot = Some(RegLoad {
            reg: instr.rt(),
            value,
        });
    }

    /// `rt = gte_control[rd]`, committed one instruction late
    pub(super) fn cfc2(&mut self, psx: &mut PSX, instr: Instruction) {
        let value = psx.gte.regs.read(instr.gte_control_rd().into());

        self.cancel_load(instr.rt());
        psx.cpu.load_delay_slot = Some(RegLoad {
            reg: instr.rt(),
            value,
        });
    }

    /// `gte_data[rd] = rt`
    pub(super) fn mtc2(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        psx.gte.regs.write(instr.gte_data_rd().into(), rt);
    }

    /// `gte_control[rd] = rt`
    pub(super) fn ctc2(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        psx.gte.regs.write(instr.gte_control_rd().into(), rt);
    }

    /// `gte_data[rt] = [rs + signed_imm16]`
    pub(super) fn lwc2(&mut self, psx: &mut PSX, instr: Instruction) {
        if !psx.cop0.regs.system_status().cop2_enabled() {
            self.trigger_exception(psx, Exception::CopUnusable);
            return;
        }

        let addr = self.effective_addr(psx, instr);
        match psx.read::<u32, false>(addr) {
            Ok(value) => {
                let reg: gte::Reg = instr.gte_data_rt().into();
                psx.gte.regs.write(reg, value);
            }
            Err(_) => self.trigger_address_error(psx, addr, false),
        }
    }

    /// `[rs + signed_imm16] = gte_data[rt]`
    pub(super) fn swc2(&mut self, psx: &mut PSX, instr: Instruction) {
        if !psx.cop0.regs.system_status().cop2_enabled() {
            self.trigger_exception(psx, Exception::CopUnusable);
            return;
        }

        let reg: gte::Reg = instr.gte_data_rt().into();
        let value = psx.gte.regs.read(reg);

        let addr = self.effective_addr(psx, instr);
        if psx.write::<u32, false>(addr, value).is_err() {
            self.trigger_address_error(psx, addr, true);
        }
    }
}
