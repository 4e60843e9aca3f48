//! Implementation of the R3000 interpreter.

mod arith_logic;
mod coproc;
mod jump_branch;
mod load_store;

use super::{
    Reg, RegLoad,
    cop0::Exception,
    instr::{BZKind, CopOpcode, Instruction, Opcode, SpecialCop0Opcode, SpecialOpcode},
};
use crate::{
    PSX, kernel,
    mem::{Address, Region},
    util::cold_path,
};
use log::{debug, info, trace, warn};

// only the general exception vectors; the others are unreachable in practice
const EXCEPTION_VECTOR_KSEG0: Address = Address(0x8000_0080);
const EXCEPTION_VECTOR_KSEG1: Address = Address(0xBFC0_0180);

/// Address the BIOS shell jumps to; reaching it is the hook point for sideloaded executables.
const SHELL_ENTRY: Address = Address(0x8003_0000);

/// Fixed instruction cost. The bus does not model wait states, so a flat two clocks per
/// instruction is the cycle budget the whole machine is paced by.
pub const CYCLES_PER_INSTRUCTION: i64 = 2;

/// An interpreter of the R3000.
#[derive(Debug, Default)]
pub struct Interpreter {
    /// Address of the currently executing instruction.
    current_addr: Address,
    /// Load about to be committed after the current instruction.
    pending_load: Option<RegLoad>,
}

impl Interpreter {
    /// Executes `count` instructions.
    pub fn step(&mut self, psx: &mut PSX, count: i64) {
        for _ in 0..count {
            self.exec_next(psx);
        }
    }

    /// Executes the next instruction.
    pub fn exec_next(&mut self, psx: &mut PSX) {
        if psx.cpu.instr_delay_slot.1 == SHELL_ENTRY.value() && psx.memory.sideload.is_some() {
            cold_path();
            self.sideload(psx);
        }

        let pc = Address(psx.cpu.regs.read_pc());
        let Ok(fetched) = psx.read::<u32, true>(pc) else {
            if let Some(load) = psx.cpu.load_delay_slot.take() {
                psx.cpu.regs.write(load.reg, load.value);
            }
            if let Some(load) = psx.cop0.load_delay_slot.take() {
                psx.cop0.regs.write(load.reg, load.value);
            }

            psx.cop0.regs.write_bad_vaddr(pc.value());
            self.trigger_exception_at(
                psx,
                psx.cpu.instr_delay_slot.1,
                pc,
                Exception::AddressErrorLoad,
            );
            return;
        };

        let (current_instr, current_addr) = std::mem::replace(
            &mut psx.cpu.instr_delay_slot,
            (Instruction::from_bits(fetched), pc),
        );

        self.current_addr = current_addr;
        psx.cpu.regs.write_pc(pc.value().wrapping_add(4));

        self.kernel_hook(psx);

        self.pending_load = psx.cpu.load_delay_slot.take();
        let pending_load_cop0 = psx.cop0.load_delay_slot.take();

        if !self.check_interrupts(psx) {
            self.exec(psx, current_instr);
        }

        if let Some(load) = self.pending_load.take() {
            psx.cpu.regs.write(load.reg, load.value);
        }

        if let Some(load) = pending_load_cop0 {
            psx.cop0.regs.write(load.reg, load.value);
        }
    }

    /// Whether the instruction at `current_addr` sits in the delay slot of a taken branch.
    #[inline(always)]
    fn in_branch_delay(&self, psx: &PSX) -> bool {
        self.current_addr.value().wrapping_add(4) != psx.cpu.instr_delay_slot.1.value()
    }

    fn trigger_exception_at(
        &mut self,
        psx: &mut PSX,
        address: Address,
        next: Address,
        exception: Exception,
    ) {
        let in_branch_delay = address.value().wrapping_add(4) != next.value();
        psx.cop0.regs.write_epc(if in_branch_delay {
            address.value().wrapping_sub(4)
        } else {
            address.value()
        });

        if exception == Exception::Interrupt {
            trace!(target: "cpu", "interrupt taken at {address}");
        } else {
            info!(
                target: "cpu",
                "exception {exception:?} at {address} (delay slot: {in_branch_delay})"
            );
        }

        // flush the fetched instruction; the handler starts with a clean pipeline
        psx.cpu.instr_delay_slot = (Instruction::NOP, self.current_addr);

        psx.cop0.regs.system_status_mut().start_exception();

        let cause = psx.cop0.regs.cause_mut();
        cause.set_exception(Some(exception));
        cause.set_branch_delay(in_branch_delay);

        let vector = if psx
            .cop0
            .regs
            .system_status()
            .boot_exception_vectors_in_kseg1()
        {
            EXCEPTION_VECTOR_KSEG1
        } else {
            EXCEPTION_VECTOR_KSEG0
        };

        psx.cpu.regs.write_pc(vector.value());
    }

    /// Triggers an exception attributed to the currently executing instruction.
    fn trigger_exception(&mut self, psx: &mut PSX, exception: Exception) {
        self.trigger_exception_at(
            psx,
            self.current_addr,
            psx.cpu.instr_delay_slot.1,
            exception,
        );
    }

    /// Triggers an address error, recording the faulting address in `BadVaddr`.
    fn trigger_address_error(&mut self, psx: &mut PSX, addr: Address, store: bool) {
        psx.cop0.regs.write_bad_vaddr(addr.value());
        self.trigger_exception(
            psx,
            if store {
                Exception::AddressErrorStore
            } else {
                Exception::AddressErrorLoad
            },
        );
    }

    /// Cancels a pending load to the given register, if any. Any instruction that writes a
    /// register overrides an in-flight load of the same register.
    fn cancel_load(&mut self, reg: Reg) {
        if self.pending_load.is_some_and(|load| load.reg == reg) {
            self.pending_load = None;
        }
    }

    /// Samples the external interrupt line. Returns `true` if an interrupt exception was taken in
    /// place of the current instruction.
    fn check_interrupts(&mut self, psx: &mut PSX) -> bool {
        let requested = psx.interrupts.pending();
        psx.cop0
            .regs
            .cause_mut()
            .set_external_interrupt(requested.is_some());

        let Some(requested) = requested else {
            return false;
        };

        let status = psx.cop0.regs.system_status();
        if !status.system_interrupts_enabled() || status.interrupt_mask() & 0x04 == 0 {
            return false;
        }

        if requested != crate::interrupts::Interrupt::VBlank {
            debug!(
                target: "cpu",
                "servicing interrupt {requested:?} at {}", psx.cpu.instr_delay_slot.1
            );
        }

        self.trigger_exception(psx, Exception::Interrupt);
        true
    }

    fn exec(&mut self, psx: &mut PSX, instr: Instruction) {
        let Some(op) = instr.op() else {
            self.trigger_exception(psx, Exception::ReservedInstruction);
            return;
        };

        match op {
            Opcode::SPECIAL => {
                let Some(op) = instr.special_op() else {
                    self.trigger_exception(psx, Exception::ReservedInstruction);
                    return;
                };

                match op {
                    SpecialOpcode::SLL => self.sll(psx, instr),
                    SpecialOpcode::SRL => self.srl(psx, instr),
                    SpecialOpcode::SRA => self.sra(psx, instr),
                    SpecialOpcode::SLLV => self.sllv(psx, instr),
                    SpecialOpcode::SRLV => self.srlv(psx, instr),
                    SpecialOpcode::SRAV => self.srav(psx, instr),
                    SpecialOpcode::JR => self.jr(psx, instr),
                    SpecialOpcode::JALR => self.jalr(psx, instr),
                    SpecialOpcode::SYSCALL => self.trigger_exception(psx, Exception::SystemCall),
                    SpecialOpcode::BREAK => self.trigger_exception(psx, Exception::Breakpoint),
                    SpecialOpcode::MFHI => self.mfhi(psx, instr),
                    SpecialOpcode::MTHI => self.mthi(psx, instr),
                    SpecialOpcode::MFLO => self.mflo(psx, instr),
                    SpecialOpcode::MTLO => self.mtlo(psx, instr),
                    SpecialOpcode::MULT => self.mult(psx, instr),
                    SpecialOpcode::MULTU => self.multu(psx, instr),
                    SpecialOpcode::DIV => self.div(psx, instr),
                    SpecialOpcode::DIVU => self.divu(psx, instr),
                    SpecialOpcode::ADD => self.add(psx, instr),
                    SpecialOpcode::ADDU => self.addu(psx, instr),
                    SpecialOpcode::SUB => self.sub(psx, instr),
                    SpecialOpcode::SUBU => self.subu(psx, instr),
                    SpecialOpcode::AND => self.and(psx, instr),
                    SpecialOpcode::OR => self.or(psx, instr),
                    SpecialOpcode::XOR => self.xor(psx, instr),
                    SpecialOpcode::NOR => self.nor(psx, instr),
                    SpecialOpcode::SLT => self.slt(psx, instr),
                    SpecialOpcode::SLTU => self.sltu(psx, instr),
                }
            }
            Opcode::BZ => self.bz(psx, instr),
            Opcode::JMP => self.jmp(psx, instr),
            Opcode::JAL => self.jal(psx, instr),
            Opcode::BEQ => self.beq(psx, instr),
            Opcode::BNE => self.bne(psx, instr),
            Opcode::BLEZ => self.blez(psx, instr),
            Opcode::BGTZ => self.bgtz(psx, instr),
            Opcode::ADDI => self.addi(psx, instr),
            Opcode::ADDIU => self.addiu(psx, instr),
            Opcode::SLTI => self.slti(psx, instr),
            Opcode::SLTIU => self.sltiu(psx, instr),
            Opcode::ANDI => self.andi(psx, instr),
            Opcode::ORI => self.ori(psx, instr),
            Opcode::XORI => self.xori(psx, instr),
            Opcode::LUI => self.lui(psx, instr),
            Opcode::COP0 => self.cop0(psx, instr),
            Opcode::COP2 => self.cop2(psx, instr),
            Opcode::COP1 | Opcode::COP3 => {
                self.trigger_exception(psx, Exception::CopUnusable);
            }
            Opcode::LB => self.lb(psx, instr),
            Opcode::LH => self.lh(psx, instr),
            Opcode::LWL => self.lwl(psx, instr),
            Opcode::LW => self.lw(psx, instr),
            Opcode::LBU => self.lbu(psx, instr),
            Opcode::LHU => self.lhu(psx, instr),
            Opcode::LWR => self.lwr(psx, instr),
            Opcode::SB => self.sb(psx, instr),
            Opcode::SH => self.sh(psx, instr),
            Opcode::SWL => self.swl(psx, instr),
            Opcode::SW => self.sw(psx, instr),
            Opcode::SWR => self.swr(psx, instr),
            Opcode::LWC2 => self.lwc2(psx, instr),
            Opcode::SWC2 => self.swc2(psx, instr),
            Opcode::LWC0 | Opcode::LWC1 | Opcode::LWC3 | Opcode::SWC0 | Opcode::SWC1
            | Opcode::SWC3 => {
                self.trigger_exception(psx, Exception::CopUnusable);
            }
        }
    }

    /// Dispatches on the `REGIMM` family.
    fn bz(&mut self, psx: &mut PSX, instr: Instruction) {
        match instr.bz_kind() {
            BZKind::BLTZ => self.bltz(psx, instr),
            BZKind::BGEZ => self.bgez(psx, instr),
            BZKind::BLTZAL => self.bltzal(psx, instr),
            BZKind::BGEZAL => self.bgezal(psx, instr),
        }
    }

    fn cop0(&mut self, psx: &mut PSX, instr: Instruction) {
        if instr.cop_cmd() {
            match instr.cop0_special_op() {
                Some(SpecialCop0Opcode::RFE) => self.rfe(psx, instr),
                None => self.trigger_exception(psx, Exception::ReservedInstruction),
            }
            return;
        }

        match instr.cop_op() {
            Some(CopOpcode::MFC) => self.mfc0(psx, instr),
            Some(CopOpcode::MTC) => self.mtc0(psx, instr),
            Some(CopOpcode::CFC) | Some(CopOpcode::CTC) => {
                // COP0 has no control registers
                self.trigger_exception(psx, Exception::ReservedInstruction);
            }
            Some(CopOpcode::BRANCH) | None => {
                self.trigger_exception(psx, Exception::ReservedInstruction);
            }
        }
    }

    fn cop2(&mut self, psx: &mut PSX, instr: Instruction) {
        if !psx.cop0.regs.system_status().cop2_enabled() {
            self.trigger_exception(psx, Exception::CopUnusable);
            return;
        }

        if instr.cop_cmd() {
            let command = crate::gte::instr::Instruction::from_bits(instr.imm25().value());
            crate::gte::interpreter::execute(&mut psx.gte, command);
            return;
        }

        match instr.cop_op() {
            Some(CopOpcode::MFC) => self.mfc2(psx, instr),
            Some(CopOpcode::CFC) => self.cfc2(psx, instr),
            Some(CopOpcode::MTC) => self.mtc2(psx, instr),
            Some(CopOpcode::CTC) => self.ctc2(psx, instr),
            Some(CopOpcode::BRANCH) | None => {
                warn!(target: "cpu", "unsupported COP2 transfer at {}", self.current_addr);
                self.trigger_exception(psx, Exception::ReservedInstruction);
            }
        }
    }

    /// Observes execution reaching the kernel call gates at `0xA0`, `0xB0` and `0xC0`.
    fn kernel_hook(&mut self, psx: &mut PSX) {
        let table = match self.current_addr.value() {
            0xA0 => kernel::Table::A0,
            0xB0 => kernel::Table::B0,
            0xC0 => kernel::Table::C0,
            _ => return,
        };

        cold_path();
        let code = psx.cpu.regs.read(Reg::T1) as u8;

        if table == kernel::Table::A0 && code == 0x40 {
            // SystemErrorUnresolvedException: the guest is wedged beyond recovery
            panic!(
                "guest called SystemErrorUnresolvedException (pc = {}, ra = 0x{:08X})",
                self.current_addr,
                psx.cpu.regs.read(Reg::RA)
            );
        }

        if table == kernel::Table::B0 && code == 0x3D {
            let char = psx.cpu.regs.read(Reg::A0);
            if let Ok(char) = char::try_from(char) {
                print!("{char}");
                if char == '\r' {
                    psx.memory.kernel_stdout.push('\n');
                } else {
                    psx.memory.kernel_stdout.push(char);
                }
            }
            return;
        }

        match kernel::Function::decode(table, code) {
            Some(func) => {
                if !func.noisy() {
                    debug!(
                        target: "kernel",
                        "{func:?}(0x{:08X}, 0x{:08X}, ...)",
                        psx.cpu.regs.read(Reg::A0),
                        psx.cpu.regs.read(Reg::A1),
                    );
                }
            }
            None => {
                warn!(
                    target: "kernel",
                    "unknown kernel function {:?}:0x{code:02X} at {}",
                    table, self.current_addr
                );
            }
        }
    }

    /// Copies an armed sideload executable into RAM and redirects execution into it.
    #[cold]
    #[inline(never)]
    fn sideload(&mut self, psx: &mut PSX) {
        let Some(exe) = psx.memory.sideload.take() else {
            return;
        };

        psx.cpu.instr_delay_slot = (Instruction::NOP, exe.header.initial_pc);
        psx.cpu.regs.write_pc(exe.header.initial_pc.value());
        psx.cpu.regs.write(Reg::GP, exe.header.initial_gp);

        let destination =
            exe.header.destination.physical().unwrap().value() - Region::Ram.start().value();
        psx.memory.ram[destination as usize..][..exe.header.length as usize]
            .copy_from_slice(&exe.program);

        if exe.header.initial_sp_base != 0 {
            let initial_sp = exe
                .header
                .initial_sp_base
                .wrapping_add(exe.header.initial_sp_offset);
            psx.cpu.regs.write(Reg::SP, initial_sp);
        }

        info!(target: "cpu", "sideloaded executable, entry at {}", exe.header.initial_pc);
    }
}

#[cfg(test)]
mod tests;
