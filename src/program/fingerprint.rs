//! Content addressing for compiled programs.
//!
//! A program is serialized to a canonical byte string (tagged
//! instructions, little-endian operands, the exponent's big-endian bytes)
//! and hashed with BLAKE3. Two compilations of the same chain with the
//! same options give the same fingerprint, which makes regenerated code
//! diffable at a glance.

use super::{Instruction, Operand, Program};

// Version byte for hash stability
const FINGERPRINT_VERSION: u8 = 1;

const TAG_EXPONENT: u8 = 0x01;
const TAG_TEMPORARIES: u8 = 0x02;
const TAG_MUL: u8 = 0x10;
const TAG_SQUARE: u8 = 0x11;
const TAG_SQUARE_RUN: u8 = 0x12;

const TAG_INPUT: u8 = 0x20;
const TAG_ACC: u8 = 0x21;
const TAG_TEMP: u8 = 0x22;

/// A 256-bit BLAKE3 program hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Display as full hex.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// First 8 bytes as hex.
    pub fn to_short(&self) -> String {
        self.0[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

fn write_operand(buf: &mut Vec<u8>, operand: Operand) {
    match operand {
        Operand::Input => buf.push(TAG_INPUT),
        Operand::Acc => buf.push(TAG_ACC),
        Operand::Temp(i) => {
            buf.push(TAG_TEMP);
            buf.extend_from_slice(&i.to_le_bytes());
        }
    }
}

/// Canonical byte encoding hashed by [`fingerprint`].
pub fn canonical_bytes(program: &Program) -> Vec<u8> {
    let mut buf = vec![FINGERPRINT_VERSION, TAG_EXPONENT];
    let exponent = program.exponent().to_bytes_be();
    buf.extend_from_slice(&(exponent.len() as u32).to_le_bytes());
    buf.extend_from_slice(&exponent);
    buf.push(TAG_TEMPORARIES);
    buf.extend_from_slice(&(program.temporary_count() as u32).to_le_bytes());

    for inst in program.instructions() {
        match *inst {
            Instruction::Mul { out, x, y } => {
                buf.push(TAG_MUL);
                write_operand(&mut buf, out);
                write_operand(&mut buf, x);
                write_operand(&mut buf, y);
            }
            Instruction::Square { out, x } => {
                buf.push(TAG_SQUARE);
                write_operand(&mut buf, out);
                write_operand(&mut buf, x);
            }
            Instruction::SquareRun { out, x, count } => {
                buf.push(TAG_SQUARE_RUN);
                write_operand(&mut buf, out);
                write_operand(&mut buf, x);
                buf.extend_from_slice(&count.to_le_bytes());
            }
        }
    }
    buf
}

pub fn fingerprint(program: &Program) -> Fingerprint {
    Fingerprint(*blake3::hash(&canonical_bytes(program)).as_bytes())
}
