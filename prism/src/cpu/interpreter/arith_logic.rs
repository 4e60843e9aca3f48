use super::Interpreter;
use crate::{
    PSX,
    cpu::{cop0::Exception, instr::Instruction},
};

impl Interpreter {
    /// `rt = imm16 << 16`
    pub(super) fn lui(&mut self, psx: &mut PSX, instr: Instruction) {
        let result = u32::from(instr.imm16()) << 16;
        psx.cpu.regs.write(instr.rt(), result);
        self.cancel_load(instr.rt());
    }

    /// `rt = rs | imm16`
    pub(super) fn ori(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rt(), rs | u32::from(instr.imm16()));
        self.cancel_load(instr.rt());
    }

    /// `rt = rs & imm16`
    pub(super) fn andi(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rt(), rs & u32::from(instr.imm16()));
        self.cancel_load(instr.rt());
    }

    /// `rt = rs ^ imm16`
    pub(super) fn xori(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rt(), rs ^ u32::from(instr.imm16()));
        self.cancel_load(instr.rt());
    }

    /// `rt = rs + signed_imm16`, wrapping
    pub(super) fn addiu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let result = rs.wrapping_add_signed(i32::from(instr.signed_imm16()));
        psx.cpu.regs.write(instr.rt(), result);
        self.cancel_load(instr.rt());
    }

    /// `rt = rs + signed_imm16`, trapping on signed overflow without writing `rt`
    pub(super) fn addi(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        match rs.checked_add(i32::from(instr.signed_imm16())) {
            Some(value) => {
                psx.cpu.regs.write(instr.rt(), value as u32);
                self.cancel_load(instr.rt());
            }
            None => self.trigger_exception(psx, Exception::ArithmeticOverflow),
        }
    }

    /// `rd = rs + rt`, trapping on signed overflow without writing `rd`
    pub(super) fn add(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        let rt = psx.cpu.regs.read(instr.rt()) as i32;

        match rs.checked_add(rt) {
            Some(value) => {
                psx.cpu.regs.write(instr.rd(), value as u32);
                self.cancel_load(instr.rd());
            }
            None => self.trigger_exception(psx, Exception::ArithmeticOverflow),
        }
    }

    /// `rd = rs + rt`, wrapping
    pub(super) fn addu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), rs.wrapping_add(rt));
        self.cancel_load(instr.rd());
    }

    /// `rd = rs - rt`, trapping on signed overflow without writing `rd`
    pub(super) fn sub(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        let rt = psx.cpu.regs.read(instr.rt()) as i32;

        match rs.checked_sub(rt) {
            Some(value) => {
                psx.cpu.regs.write(instr.rd(), value as u32);
                self.cancel_load(instr.rd());
            }
            None => self.trigger_exception(psx, Exception::ArithmeticOverflow),
        }
    }

    /// `rd = rs - rt`, wrapping
    pub(super) fn subu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), rs.wrapping_sub(rt));
        self.cancel_load(instr.rd());
    }

    /// `rd = rs & rt`
    pub(super) fn and(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), rs & rt);
        self.cancel_load(instr.rd());
    }

    /// `rd = rs | rt`
    pub(super) fn or(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), rs | rt);
        self.cancel_load(instr.rd());
    }

    /// `rd = rs ^ rt`
    pub(super) fn xor(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), rs ^ rt);
        self.cancel_load(instr.rd());
    }

    /// `rd = !(rs | rt)`
    pub(super) fn nor(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), !(rs | rt));
        self.cancel_load(instr.rd());
    }

    /// `rd = (rs as i32) < (rt as i32)`
    pub(super) fn slt(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        let rt = psx.cpu.regs.read(instr.rt()) as i32;
        psx.cpu.regs.write(instr.rd(), u32::from(rs < rt));
        self.cancel_load(instr.rd());
    }

    /// `rd = rs < rt`
    pub(super) fn sltu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu.regs.write(instr.rd(), u32::from(rs < rt));
        self.cancel_load(instr.rd());
    }

    /// `rt = (rs as i32) < signed_imm16`
    pub(super) fn slti(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        let result = rs < i32::from(instr.signed_imm16());
        psx.cpu.regs.write(instr.rt(), u32::from(result));
        self.cancel_load(instr.rt());
    }

    /// `rt = rs < signext(signed_imm16)`, compared unsigned
    pub(super) fn sltiu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let result = rs < (i32::from(instr.signed_imm16()) as u32);
        psx.cpu.regs.write(instr.rt(), u32::from(result));
        self.cancel_load(instr.rt());
    }

    /// `rd = rt << imm5`
    pub(super) fn sll(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu
            .regs
            .write(instr.rd(), rt << instr.imm5().value());
        self.cancel_load(instr.rd());
    }

    /// `rd = rt >> imm5`
    pub(super) fn srl(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        psx.cpu
            .regs
            .write(instr.rd(), rt >> instr.imm5().value());
        self.cancel_load(instr.rd());
    }

    /// `rd = (rt as i32) >> imm5`
    pub(super) fn sra(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt()) as i32;
        psx.cpu
            .regs
            .write(instr.rd(), (rt >> instr.imm5().value()) as u32);
        self.cancel_load(instr.rd());
    }

    /// `rd = rt << (rs & 0x1F)`
    pub(super) fn sllv(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rd(), rt << (rs & 0x1F));
        self.cancel_load(instr.rd());
    }

    /// `rd = rt >> (rs & 0x1F)`
    pub(super) fn srlv(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt());
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rd(), rt >> (rs & 0x1F));
        self.cancel_load(instr.rd());
    }

    /// `rd = (rt as i32) >> (rs & 0x1F)`
    pub(super) fn srav(&mut self, psx: &mut PSX, instr: Instruction) {
        let rt = psx.cpu.regs.read(instr.rt()) as i32;
        let rs = psx.cpu.regs.read(instr.rs());
        psx.cpu.regs.write(instr.rd(), (rt >> (rs & 0x1F)) as u32);
        self.cancel_load(instr.rd());
    }

    /// `(HI, LO) = (rs as i64) * (rt as i64)`
    pub(super) fn mult(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = i64::from(psx.cpu.regs.read(instr.rs()) as i32);
        let rt = i64::from(psx.cpu.regs.read(instr.rt()) as i32);
        let result = zerocopy::byteorder::little_endian::I64::new(rs.wrapping_mul(rt));
        let [low, high]: [zerocopy::byteorder::little_endian::U32; 2] = zerocopy::transmute!(result);

        psx.cpu.regs.write_lo(low.get());
        psx.cpu.regs.write_hi(high.get());
    }

    /// `(HI, LO) = (rs as u64) * (rt as u64)`
    pub(super) fn multu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = u64::from(psx.cpu.regs.read(instr.rs()));
        let rt = u64::from(psx.cpu.regs.read(instr.rt()));
        let result = zerocopy::byteorder::little_endian::U64::new(rs * rt);
        let [low, high]: [zerocopy::byteorder::little_endian::U32; 2] = zerocopy::transmute!(result);

        psx.cpu.regs.write_lo(low.get());
        psx.cpu.regs.write_hi(high.get());
    }

    /// `LO = rs / rt; HI = rs % rt`, signed, with the documented R3000 edge cases: division by
    /// zero yields `±1` with the numerator as remainder, and `MIN / -1` yields `MIN` remainder 0.
    pub(super) fn div(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs()) as i32;
        let rt = psx.cpu.regs.read(instr.rt()) as i32;
        let (div, rem) = match (rs, rt) {
            (0.., 0) => (-1, rs),
            (..0, 0) => (1, rs),
            (i32::MIN, -1) => (i32::MIN, 0),
            (rs, rt) => (rs / rt, rs % rt),
        };

        psx.cpu.regs.write_lo(div as u32);
        psx.cpu.regs.write_hi(rem as u32);
    }

    /// `LO = rs / rt; HI = rs % rt`, unsigned; division by zero yields all ones and the numerator.
    pub(super) fn divu(&mut self, psx: &mut PSX, instr: Instruction) {
        let rs = psx.cpu.regs.read(instr.rs());
        let rt = psx.cpu.regs.read(instr.rt());
        let (div, rem) = (
            rs.checked_div(rt).unwrap_or(!0),
            rs.checked_rem(rt).unwrap_or(rs),
        );

        psx.cpu.regs.write_lo(div);
        psx.cpu.regs.write_hi(rem);
    }

    /// `rd = LO`
    pub(super) fn mflo(&mut self, psx: &mut PSX, instr: Instruction) {
        psx.cpu.regs.write(instr.rd(), psx.cpu.regs.read_lo());
        self.cancel_load(instr.rd());
    }

    /// `rd = HI`
    pub(super) fn mfhi(&mut self, psx: &mut PSX, instr: Instruction) {
        psx.cpu.regs.write(instr.rd(), psx.cpu.regs.read_hi());
        self.cancel_load(instr.rd());
    }

    /// `LO = rs`
    pub(super) fn mtlo(&mut self, psx: &mut PSX, instr: Instruction) {
        psx.cpu.regs.write_lo(psx.cpu.regs.read(instr.rs()));
    }

    /// `HI = rs`
    pub(super) fn mthi(&mut self, psx: &mut PSX, instr: Instruction) {
        psx.cpu.regs.write_hi(psx.cpu.regs.read(instr.rs()));
    }
}
