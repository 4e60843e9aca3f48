use super::Interpreter;
use crate::{
    PSX,
    cpu::{Reg, instr::Instruction},
};

impl Interpreter {
    /// Redirects execution to `target` after the already-fetched delay slot instruction runs.
    ///
    /// A control transfer inside a delay slot has undefined behaviour on hardware; here it means
    /// the interpreter state is corrupt, so it is treated as fatal.
    #[inline(always)]
    fn transfer(&mut self, psx: &mut PSX, target: u32) {
        assert!(
            !self.in_branch_delay(psx),
            "branch inside a branch delay slot at {}",
            self.current_addr
        );

        psx.cpu.regs.write_pc(target);
    }

    /// Branch target relative to the delay slot address.
    #[inline(always)]
    fn branch(&mut self, psx: &mut PSX, offset: i16) {
        let target = psx
            .cpu
            .instr_delay_slot
            .1
            .value()
            .wrapping_add_signed(i32::from(offset) << 2);

        self.transfer(psx, target);
    }

    /// Jump target: the delay slot's 256 MiB region plus `imm26 << 2`.
    #[inline(always)]
    fn jump_target(&self, psx: &PSX, instr: Instruction) -> u32 {
        let high = psx.cpu.instr_delay_slot.1.value() & (0b1111 << 28);
        high | (instr.imm26().value() << 2)
    }

    /// `pc = jump_target`
    pub(super) fn jmp(&mut self, psx: &mut PSX, instr: Instruction) {
        let target = self.jump_target(psx, instr);
        self.transfer(psx, target);
    }

    /// `RA = pc + 8; pc = jump_target`
    pub(super) fn jal(&mut self, psx: &mut PSX, instr: Instruction) {
        let target = self.jump_target(psx, instr);
        psx.cpu.regs.write(Reg::RA, psx.cpu.regs.read_pc());
        self.cancel_load(Reg::RA);
        self.transfer(psx, target);
    }

    /// `pc = rs`
    pub(super) fn jr(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        self.transfer(psx, rs);
    }

    /// `rd = pc + 8; pc = rs`
    pub(super) fn jalr(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rd(), psx.cpu.regs.read_pc());
        self.cancel_load(instr.rd());
        self.transfer(psx, rs);
    }

    /// `if rs == rt, branch`
    pub(super) fn beq(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());

        if rs == rt {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `if rs != rt, branch`
    pub(super) fn bne(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());

        if rs != rt {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `if rs <= 0, branch`
    pub(super) fn blez(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        if rs <= 0 {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `if rs > 0, branch`
    pub(super) fn bgtz(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        if rs > 0 {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `if rs < 0, branch`
    pub(super) fn bltz(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        if rs < 0 {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `if rs >= 0, branch`
    pub(super) fn bgez(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        if rs >= 0 {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `RA = pc + 8; if rs < 0, branch`. The link happens whether or not the branch is taken.
    pub(super) fn bltzal(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        psx.cpu.regs.write(Reg::RA, psx.cpu.regs.read_pc());
        self.cancel_load(Reg::RA);

        if rs < 0 {
            self.branch(psx, instr.signed_imm16());
        }
    }

    /// `RA = pc + 8; if rs >= 0, branch`. The link happens whether or not the branch is taken.
    pub(super) fn bgezal(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        psx.cpu.regs.write(Reg::RA, psx.cpu.regs.read_pc());
        self.cancel_load(Reg::RA);

        if rs >= 0 {
            self.branch(psx, instr.signed_imm16());
        }
    }
}
