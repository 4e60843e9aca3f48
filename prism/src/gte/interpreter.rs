//! Execution of GTE commands.
//!
//! Every command follows the same discipline: extend operands into [`Int44`], combine, shift by
//! the `sf` fraction, clip through the `set_mac*`/`set_ir*` helpers and push results into the
//! screen/color FIFOs. Nothing here has side effects outside the GTE register file.

use super::{
    Flag, Gte, Int44, Reg, Registers,
    instr::{Instruction, MulMatrix, MulVector, OffVector, Opcode},
};
use log::{debug, error};
use std::ops::{Add, Mul};
use zerocopy::transmute;

#[inline(always)]
fn i44(value: i64) -> Int44 {
    Int44::new(value)
}

/// Unsigned Newton-Raphson division, as performed by the hardware for perspective projection:
/// `(lhs * 0x20000 / rhs)` computed through a 257-entry reciprocal table. Returns the saturated
/// quotient and whether the division overflowed (`2 * rhs <= lhs`).
fn newton_raphson_div(lhs: u32, rhs: u32) -> (u32, bool) {
    fn reciprocal(divisor: u16) -> u32 {
        #[rustfmt::skip]
        static LUT: &[u8] = &[
            0xFF, 0xFD, 0xFB, 0xF9, 0xF7, 0xF5, 0xF3, 0xF1, 0xEF, 0xEE, 0xEC, 0xEA, 0xE8, 0xE6, 0xE4, 0xE3,
            0xE1, 0xDF, 0xDD, 0xDC, 0xDA, 0xD8, 0xD6, 0xD5, 0xD3, 0xD1, 0xD0, 0xCE, 0xCD, 0xCB, 0xC9, 0xC8,
            0xC6, 0xC5, 0xC3, 0xC1, 0xC0, 0xBE, 0xBD, 0xBB, 0xBA, 0xB8, 0xB7, 0xB5, 0xB4, 0xB2, 0xB1, 0xB0,
            0xAE, 0xAD, 0xAB, 0xAA, 0xA9, 0xA7, 0xA6, 0xA4, 0xA3, 0xA2, 0xA0, 0x9F, 0x9E, 0x9C, 0x9B, 0x9A,
            0x99, 0x97, 0x96, 0x95, 0x94, 0x92, 0x91, 0x90, 0x8F, 0x8D, 0x8C, 0x8B, 0x8A, 0x89, 0x87, 0x86,
            0x85, 0x84, 0x83, 0x82, 0x81, 0x7F, 0x7E, 0x7D, 0x7C, 0x7B, 0x7A, 0x79, 0x78, 0x77, 0x75, 0x74,
            0x73, 0x72, 0x71, 0x70, 0x6F, 0x6E, 0x6D, 0x6C, 0x6B, 0x6A, 0x69, 0x68, 0x67, 0x66, 0x65, 0x64,
            0x63, 0x62, 0x61, 0x60, 0x5F, 0x5E, 0x5D, 0x5D, 0x5C, 0x5B, 0x5A, 0x59, 0x58, 0x57, 0x56, 0x55,
            0x54, 0x53, 0x53, 0x52, 0x51, 0x50, 0x4F, 0x4E, 0x4D, 0x4D, 0x4C, 0x4B, 0x4A, 0x49, 0x48, 0x48,
            0x47, 0x46, 0x45, 0x44, 0x43, 0x43, 0x42, 0x41, 0x40, 0x3F, 0x3F, 0x3E, 0x3D, 0x3C, 0x3C, 0x3B,
            0x3A, 0x39, 0x39, 0x38, 0x37, 0x36, 0x36, 0x35, 0x34, 0x33, 0x33, 0x32, 0x31, 0x31, 0x30, 0x2F,
            0x2E, 0x2E, 0x2D, 0x2C, 0x2C, 0x2B, 0x2A, 0x2A, 0x29, 0x28, 0x28, 0x27, 0x26, 0x26, 0x25, 0x24,
            0x24, 0x23, 0x22, 0x22, 0x21, 0x20, 0x20, 0x1F, 0x1E, 0x1E, 0x1D, 0x1D, 0x1C, 0x1B, 0x1B, 0x1A,
            0x19, 0x19, 0x18, 0x18, 0x17, 0x16, 0x16, 0x15, 0x15, 0x14, 0x14, 0x13, 0x12, 0x12, 0x11, 0x11,
            0x10, 0x0F, 0x0F, 0x0E, 0x0E, 0x0D, 0x0D, 0x0C, 0x0C, 0x0B, 0x0A, 0x0A, 0x09, 0x09, 0x08, 0x08,
            0x07, 0x07, 0x06, 0x06, 0x05, 0x05, 0x04, 0x04, 0x03, 0x03, 0x02, 0x02, 0x01, 0x01, 0x00, 0x00,
            0x00
        ];

        let index = ((divisor & 0x7FFF) + 0x40) >> 7;
        let x = 0x101 + LUT[index as usize] as i32;
        let iter1 = (((divisor as i32) * -x) + 0x80) >> 8;
        let iter2 = ((x * (0x20000 + iter1)) + 0x80) >> 8;

        iter2 as u32
    }

    if 2 * rhs <= lhs {
        return (0x1FFFF, true);
    }

    let shift = (rhs as u16).leading_zeros();
    let (lhs, rhs) = (lhs << shift, rhs << shift);
    let reciprocal = reciprocal((rhs | 0x8000) as u16);
    let result = (((lhs as u64) * (reciprocal as u64) + 0x8000) >> 16) as u32;

    (result.min(0x1FFFF), false)
}

#[derive(Debug, Clone, Copy)]
struct Vector {
    x: Int44,
    y: Int44,
    z: Int44,
}

impl Vector {
    fn new(x: Int44, y: Int44, z: Int44) -> Self {
        Self { x, y, z }
    }

    fn zero() -> Self {
        Self::new(i44(0), i44(0), i44(0))
    }
}

impl Add for Vector {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Mul<Vector> for [[Int44; 3]; 3] {
    type Output = Vector;

    #[inline(always)]
    fn mul(self, v: Vector) -> Self::Output {
        Vector {
            x: self[0][0] * v.x + self[0][1] * v.y + self[0][2] * v.z,
            y: self[1][0] * v.x + self[1][1] * v.y + self[1][2] * v.z,
            z: self[2][0] * v.x + self[2][1] * v.y + self[2][2] * v.z,
        }
    }
}

fn matrix(regs: &Registers, base: [Reg; 5]) -> [[Int44; 3]; 3] {
    let r_11_12: [i16; 2] = transmute!(regs.read(base[0]));
    let r_13_21: [i16; 2] = transmute!(regs.read(base[1]));
    let r_22_23: [i16; 2] = transmute!(regs.read(base[2]));
    let r_31_32: [i16; 2] = transmute!(regs.read(base[3]));
    let r_33_ss: [i16; 2] = transmute!(regs.read(base[4]));

    [
        [r_11_12[0], r_11_12[1], r_13_21[0]],
        [r_13_21[1], r_22_23[0], r_22_23[1]],
        [r_31_32[0], r_31_32[1], r_33_ss[0]],
    ]
    .map(|row| row.map(|cell| i44(cell as i64)))
}

#[inline(always)]
fn rotation_matrix(regs: &Registers) -> [[Int44; 3]; 3] {
    matrix(
        regs,
        [
            Reg::RT_11_12,
            Reg::RT_13_21,
            Reg::RT_22_23,
            Reg::RT_31_32,
            Reg::RT_33_SS,
        ],
    )
}

#[inline(always)]
fn light_matrix(regs: &Registers) -> [[Int44; 3]; 3] {
    matrix(
        regs,
        [
            Reg::L_11_12,
            Reg::L_13_21,
            Reg::L_22_23,
            Reg::L_31_32,
            Reg::L_33_SS,
        ],
    )
}

#[inline(always)]
fn color_matrix(regs: &Registers) -> [[Int44; 3]; 3] {
    matrix(
        regs,
        [
            Reg::LC_R1_R2,
            Reg::LC_R3_G1,
            Reg::LC_G2_G3,
            Reg::LC_B1_B2,
            Reg::LC_B3_SS,
        ],
    )
}

/// Reads a 32 bit vector register triple shifted up into 12.12 fixed point.
fn wide_vector(regs: &Registers, x: Reg, y: Reg, z: Reg) -> Vector {
    Vector {
        x: i44((regs.read(x) as i32 as i64) << 12),
        y: i44((regs.read(y) as i32 as i64) << 12),
        z: i44((regs.read(z) as i32 as i64) << 12),
    }
}

#[inline(always)]
fn translation_vector(regs: &Registers) -> Vector {
    wide_vector(regs, Reg::TRX, Reg::TRY, Reg::TRZ)
}

#[inline(always)]
fn background_color_vector(regs: &Registers) -> Vector {
    wide_vector(regs, Reg::BCR, Reg::BCG, Reg::BCB)
}

#[inline(always)]
fn far_color_vector(regs: &Registers) -> Vector {
    wide_vector(regs, Reg::FCR, Reg::FCG, Reg::FCB)
}

/// Reads one of the three 16 bit input vectors.
fn input_vector(regs: &Registers, index: usize) -> Vector {
    let (vxy, vz) = match index {
        0 => (Reg::VXY0, Reg::VZ0),
        1 => (Reg::VXY1, Reg::VZ1),
        2 => (Reg::VXY2, Reg::VZ2),
        _ => unreachable!(),
    };

    let vxy: [i16; 2] = transmute!(regs.read(vxy));
    let vz: [i16; 2] = transmute!(regs.read(vz));

    Vector {
        x: i44(vxy[0] as i64),
        y: i44(vxy[1] as i64),
        z: i44(vz[0] as i64),
    }
}

fn ir_vector(regs: &Registers) -> Vector {
    Vector {
        x: i44(regs.read(Reg::IR1) as i32 as i64),
        y: i44(regs.read(Reg::IR2) as i32 as i64),
        z: i44(regs.read(Reg::IR3) as i32 as i64),
    }
}

fn rtps<const DEPTH_CUE: bool>(regs: &mut Registers, vector: Vector, instr: Instruction) {
    let rotation = rotation_matrix(regs);
    let translation = translation_vector(regs);
    let r = translation + rotation * vector;

    regs.set_mac_ir1(r.x, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(r.y, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(r.z, instr.shift(), instr.no_neg());
    regs.push_z(r.z);

    // IR3 quirk: the flag always checks the shifted value against the full clamping range
    let shifted_z = r.z.value() >> 12;
    let clamped_ir3 = !(-0x8000..=0x7FFF).contains(&shifted_z);
    regs.set_flag(Flag::ClampedIR3, clamped_ir3);

    // H reads back sign extended; the division wants the raw unsigned register
    let h = regs.read(Reg::H) as u16 as u32;
    let sz3 = regs.read(Reg::SZ3);

    let (h_by_sz3, overflow) = newton_raphson_div(h, sz3);
    regs.merge_flag(Flag::DivideOverflow, overflow);

    let h_by_sz3 = i44(h_by_sz3 as i64);
    let ir1 = i44(regs.read(Reg::IR1) as i32 as i64);
    let ir2 = i44(regs.read(Reg::IR2) as i32 as i64);
    let ofx = i44(regs.read(Reg::OFX) as i32 as i64);
    let ofy = i44(regs.read(Reg::OFY) as i32 as i64);
    let x = h_by_sz3 * ir1 + ofx;
    let y = h_by_sz3 * ir2 + ofy;
    regs.set_mac0(x);
    regs.set_mac0(y);
    regs.push_xy((x.value() >> 16) as i32, (y.value() >> 16) as i32);

    if DEPTH_CUE {
        let dqa = i44(regs.read(Reg::DQA) as i32 as i64);
        let dqb = i44(regs.read(Reg::DQB) as i32 as i64);

        let mac0 = h_by_sz3 * dqa + dqb;
        regs.set_mac0(mac0);
        regs.set_ir0((mac0.value() >> 12) as i32);
    }
}

fn rtpt(regs: &mut Registers, instr: Instruction) {
    let (v0, v1, v2) = (
        input_vector(regs, 0),
        input_vector(regs, 1),
        input_vector(regs, 2),
    );

    rtps::<false>(regs, v0, instr);
    rtps::<false>(regs, v1, instr);
    rtps::<true>(regs, v2, instr);
}

fn nclip(regs: &mut Registers) {
    let s0: [i16; 2] = transmute!(regs.read(Reg::SXY0));
    let s1: [i16; 2] = transmute!(regs.read(Reg::SXY1));
    let s2: [i16; 2] = transmute!(regs.read(Reg::SXY2));

    let (sx0, sy0) = (s0[0] as i64, s0[1] as i64);
    let (sx1, sy1) = (s1[0] as i64, s1[1] as i64);
    let (sx2, sy2) = (s2[0] as i64, s2[1] as i64);

    let result = sx0 * sy1 + sx1 * sy2 + sx2 * sy0 - sx0 * sy2 - sx1 * sy0 - sx2 * sy1;
    regs.set_mac0(i44(result));
}

fn avsz(regs: &mut Registers, factor: Reg, zs: &[Reg]) {
    let factor = i44(regs.read(factor) as i32 as i64);
    let sum = zs
        .iter()
        .fold(i44(0), |acc, z| acc + i44(regs.read(*z) as i32 as i64));
    let avg = factor * sum;
    regs.set_mac0(avg);

    let otz = (avg.value() >> 12) as i32;
    let (otz, clamped) = super::clamp(otz, 0, 0xFFFF);

    regs.merge_flag(Flag::ClampedZ, clamped);
    regs.write(Reg::OTZ, otz as u32);
}

fn cross(regs: &mut Registers, instr: Instruction) {
    let ir = ir_vector(regs);
    let d1 = i44(regs.read(Reg::RT_11_12) as i16 as i64);
    let d2 = i44(regs.read(Reg::RT_22_23) as i16 as i64);
    let d3 = i44(regs.read(Reg::RT_33_SS) as i16 as i64);

    regs.set_mac_ir1(ir.z * d2 - ir.y * d3, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(ir.x * d3 - ir.z * d1, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(ir.y * d1 - ir.x * d2, instr.shift(), instr.no_neg());
}

fn sqr(regs: &mut Registers, instr: Instruction) {
    let ir = ir_vector(regs);

    regs.set_mac_ir1(ir.x * ir.x, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(ir.y * ir.y, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(ir.z * ir.z, instr.shift(), instr.no_neg());
}

fn push_mac_color(regs: &mut Registers) {
    let mac1 = regs.read(Reg::MAC1) as i32;
    let mac2 = regs.read(Reg::MAC2) as i32;
    let mac3 = regs.read(Reg::MAC3) as i32;
    regs.push_color(mac1 >> 4, mac2 >> 4, mac3 >> 4);
}

/// The far color interpolation shared by DPCS, INTPL and NCDS:
/// `MAC = base + IR0 * clip(FC - base)`.
fn interpolate_color(
    regs: &mut Registers,
    mac1: Int44,
    mac2: Int44,
    mac3: Int44,
    shift: bool,
    no_neg: bool,
) {
    regs.set_mac1(mac1, false);
    regs.set_mac2(mac2, false);
    regs.set_mac3(mac3, false);

    let fc = far_color_vector(regs);
    regs.set_mac_ir1(fc.x - mac1, shift, false);
    regs.set_mac_ir2(fc.y - mac2, shift, false);
    regs.set_mac_ir3(fc.z - mac3, shift, false);

    let ir0 = i44(regs.read(Reg::IR0) as i32 as i64);
    let ir = ir_vector(regs);
    regs.set_mac_ir1(ir0 * ir.x + mac1, shift, no_neg);
    regs.set_mac_ir2(ir0 * ir.y + mac2, shift, no_neg);
    regs.set_mac_ir3(ir0 * ir.z + mac3, shift, no_neg);
}

fn rgbc_components(regs: &Registers) -> [u8; 4] {
    transmute!(regs.read(Reg::RGBC))
}

fn dpcs(regs: &mut Registers, instr: Instruction) {
    let [r, g, b, _] = rgbc_components(regs);
    let r = i44((r as i64) << 16);
    let g = i44((g as i64) << 16);
    let b = i44((b as i64) << 16);

    interpolate_color(regs, r, g, b, instr.shift(), instr.no_neg());
    push_mac_color(regs);
}

fn intpl(regs: &mut Registers, instr: Instruction) {
    let ir1 = i44((regs.read(Reg::IR1) as i64) << 12);
    let ir2 = i44((regs.read(Reg::IR2) as i64) << 12);
    let ir3 = i44((regs.read(Reg::IR3) as i64) << 12);

    interpolate_color(regs, ir1, ir2, ir3, instr.shift(), instr.no_neg());
    push_mac_color(regs);
}

fn mvmva(regs: &mut Registers, instr: Instruction) {
    let matrix = match instr.multiply_matrix() {
        MulMatrix::Rotation => rotation_matrix(regs),
        MulMatrix::Light => light_matrix(regs),
        MulMatrix::Color => color_matrix(regs),
        MulMatrix::Reserved => {
            // the garbage matrix the hardware produces for the reserved selector
            let r = ((regs.read(Reg::RGBC) as u8 as u16) << 4) as i64;
            let ir0 = i44(regs.read(Reg::IR0) as i16 as i64);
            let rot = rotation_matrix(regs);
            [[i44(-r), i44(r), ir0], [rot[0][2]; 3], [rot[1][1]; 3]]
        }
    };

    let vector = match instr.multiply_vector() {
        MulVector::Vector0 => input_vector(regs, 0),
        MulVector::Vector1 => input_vector(regs, 1),
        MulVector::Vector2 => input_vector(regs, 2),
        MulVector::IR => ir_vector(regs),
    };

    let offset = match instr.offset_vector() {
        OffVector::Translation => translation_vector(regs),
        OffVector::BackgroundColor => background_color_vector(regs),
        OffVector::FarColor => far_color_vector(regs),
        OffVector::None => Vector::zero(),
    };

    if instr.offset_vector() == OffVector::FarColor {
        // hardware bug: only the first column takes part in the offset; it still sets flags
        let flag = Vector {
            x: offset.x + matrix[0][0] * vector.x,
            y: offset.y + matrix[1][0] * vector.x,
            z: offset.z + matrix[2][0] * vector.x,
        };

        regs.set_mac_ir1(flag.x, instr.shift(), false);
        regs.set_mac_ir2(flag.y, instr.shift(), false);
        regs.set_mac_ir3(flag.z, instr.shift(), false);

        let r = Vector {
            x: matrix[0][1] * vector.y + matrix[0][2] * vector.z,
            y: matrix[1][1] * vector.y + matrix[1][2] * vector.z,
            z: matrix[2][1] * vector.y + matrix[2][2] * vector.z,
        };

        regs.set_mac_ir1(r.x, instr.shift(), instr.no_neg());
        regs.set_mac_ir2(r.y, instr.shift(), instr.no_neg());
        regs.set_mac_ir3(r.z, instr.shift(), instr.no_neg());
    } else {
        let r = offset + matrix * vector;
        regs.set_mac_ir1(r.x, instr.shift(), instr.no_neg());
        regs.set_mac_ir2(r.y, instr.shift(), instr.no_neg());
        regs.set_mac_ir3(r.z, instr.shift(), instr.no_neg());
    }
}

/// The shared front of the normal color commands: light matrix, then background color plus color
/// matrix, both through IR.
fn normal_color_front(regs: &mut Registers, vector: Vector, instr: Instruction) {
    let v = light_matrix(regs) * vector;
    regs.set_mac_ir1(v.x, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(v.y, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(v.z, instr.shift(), instr.no_neg());

    let ir = ir_vector(regs);
    let v = background_color_vector(regs) + color_matrix(regs) * ir;
    regs.set_mac_ir1(v.x, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(v.y, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(v.z, instr.shift(), instr.no_neg());
}

fn ncds(regs: &mut Registers, vector: Vector, instr: Instruction) {
    normal_color_front(regs, vector, instr);

    let [r, g, b, _] = rgbc_components(regs);
    let ir = ir_vector(regs);

    interpolate_color(
        regs,
        i44((r as i64) << 4) * ir.x,
        i44((g as i64) << 4) * ir.y,
        i44((b as i64) << 4) * ir.z,
        instr.shift(),
        instr.no_neg(),
    );
    push_mac_color(regs);
}

fn nccs(regs: &mut Registers, vector: Vector, instr: Instruction) {
    normal_color_front(regs, vector, instr);

    let [r, g, b, _] = rgbc_components(regs);
    let ir = ir_vector(regs);

    regs.set_mac_ir1(i44((r as i64) << 4) * ir.x, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(i44((g as i64) << 4) * ir.y, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(i44((b as i64) << 4) * ir.z, instr.shift(), instr.no_neg());
    push_mac_color(regs);
}

fn gpf(regs: &mut Registers, instr: Instruction) {
    let ir0 = i44(regs.read(Reg::IR0) as i32 as i64);
    let ir = ir_vector(regs);

    regs.set_mac_ir1(ir0 * ir.x, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(ir0 * ir.y, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(ir0 * ir.z, instr.shift(), instr.no_neg());
    push_mac_color(regs);
}

fn gpl(regs: &mut Registers, instr: Instruction) {
    let shift_amount = if instr.shift() { 12 } else { 0 };
    let mac1 = i44((regs.read(Reg::MAC1) as i32 as i64) << shift_amount);
    let mac2 = i44((regs.read(Reg::MAC2) as i32 as i64) << shift_amount);
    let mac3 = i44((regs.read(Reg::MAC3) as i32 as i64) << shift_amount);

    let ir0 = i44(regs.read(Reg::IR0) as i32 as i64);
    let ir = ir_vector(regs);

    regs.set_mac_ir1(ir0 * ir.x + mac1, instr.shift(), instr.no_neg());
    regs.set_mac_ir2(ir0 * ir.y + mac2, instr.shift(), instr.no_neg());
    regs.set_mac_ir3(ir0 * ir.z + mac3, instr.shift(), instr.no_neg());
    push_mac_color(regs);
}

/// Executes a single GTE command.
pub fn execute(gte: &mut Gte, instr: Instruction) {
    let Some(op) = instr.op() else {
        error!(
            target: "gte",
            "executing unknown command: 0x{:02X}",
            instr.op_raw().value()
        );
        return;
    };

    debug!(target: "gte", "executing {op:?}");

    let regs = &mut gte.regs;
    regs.write(Reg::FLAG, 0);
    match op {
        Opcode::RTPS => {
            let v0 = input_vector(regs, 0);
            rtps::<true>(regs, v0, instr);
        }
        Opcode::RTPT => rtpt(regs, instr),
        Opcode::NCLIP => nclip(regs),
        Opcode::AVSZ3 => avsz(regs, Reg::ZSF3, &[Reg::SZ1, Reg::SZ2, Reg::SZ3]),
        Opcode::AVSZ4 => avsz(regs, Reg::ZSF4, &[Reg::SZ0, Reg::SZ1, Reg::SZ2, Reg::SZ3]),
        Opcode::OP => cross(regs, instr),
        Opcode::SQR => sqr(regs, instr),
        Opcode::DPCS => dpcs(regs, instr),
        Opcode::INTPL => intpl(regs, instr),
        Opcode::MVMVA => mvmva(regs, instr),
        Opcode::NCDS => {
            let v0 = input_vector(regs, 0);
            ncds(regs, v0, instr);
        }
        Opcode::NCCS => {
            let v0 = input_vector(regs, 0);
            nccs(regs, v0, instr);
        }
        Opcode::NCCT => {
            for i in 0..3 {
                let v = input_vector(regs, i);
                nccs(regs, v, instr);
            }
        }
        Opcode::GPF => gpf(regs, instr),
        Opcode::GPL => gpl(regs, instr),
    }
}
