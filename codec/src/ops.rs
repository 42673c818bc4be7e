//! Field-path operations.
//!
//! Each record's field list is transmitted as a sequence of operations
//! that mutate a shared path cursor. Operation selection is entropy
//! coded (see [`crate::huffman`]); this module defines the operation
//! set, the per-operation frequency weights that shape the code, and
//! the cursor mutation each operation performs.

use bitstream::BitReader;
use schema::FieldPath;

use crate::error::{DecodeError, DecodeResult};

/// Number of distinct field-path operations.
pub const FIELD_OP_COUNT: usize = 40;

/// A single field-path operation.
///
/// Names describe the cursor mutation: `Plus*` advance the last
/// component, `Push*` descend, `Pop*` ascend, and `NonTopo*` rewrite
/// arbitrary components. [`FieldOp::FieldPathEncodeFinish`] terminates
/// the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldOp {
    PlusOne = 0,
    PlusTwo,
    PlusThree,
    PlusFour,
    PlusN,
    PushOneLeftDeltaZeroRightZero,
    PushOneLeftDeltaZeroRightNonZero,
    PushOneLeftDeltaOneRightZero,
    PushOneLeftDeltaOneRightNonZero,
    PushOneLeftDeltaNRightZero,
    PushOneLeftDeltaNRightNonZero,
    PushOneLeftDeltaNRightNonZeroPack6Bits,
    PushOneLeftDeltaNRightNonZeroPack8Bits,
    PushTwoLeftDeltaZero,
    PushTwoPack5LeftDeltaZero,
    PushThreeLeftDeltaZero,
    PushThreePack5LeftDeltaZero,
    PushTwoLeftDeltaOne,
    PushTwoPack5LeftDeltaOne,
    PushThreeLeftDeltaOne,
    PushThreePack5LeftDeltaOne,
    PushTwoLeftDeltaN,
    PushTwoPack5LeftDeltaN,
    PushThreeLeftDeltaN,
    PushThreePack5LeftDeltaN,
    PushN,
    PushNAndNonTopological,
    PopOnePlusOne,
    PopOnePlusN,
    PopAllButOnePlusOne,
    PopAllButOnePlusN,
    PopAllButOnePlusNPack3Bits,
    PopAllButOnePlusNPack6Bits,
    PopNPlusOne,
    PopNPlusN,
    PopNAndNonTopographical,
    NonTopoComplex,
    NonTopoPenultimatePlusOne,
    NonTopoComplexPack4Bits,
    FieldPathEncodeFinish,
}

/// All operations in discriminant order.
pub const ALL_FIELD_OPS: [FieldOp; FIELD_OP_COUNT] = [
    FieldOp::PlusOne,
    FieldOp::PlusTwo,
    FieldOp::PlusThree,
    FieldOp::PlusFour,
    FieldOp::PlusN,
    FieldOp::PushOneLeftDeltaZeroRightZero,
    FieldOp::PushOneLeftDeltaZeroRightNonZero,
    FieldOp::PushOneLeftDeltaOneRightZero,
    FieldOp::PushOneLeftDeltaOneRightNonZero,
    FieldOp::PushOneLeftDeltaNRightZero,
    FieldOp::PushOneLeftDeltaNRightNonZero,
    FieldOp::PushOneLeftDeltaNRightNonZeroPack6Bits,
    FieldOp::PushOneLeftDeltaNRightNonZeroPack8Bits,
    FieldOp::PushTwoLeftDeltaZero,
    FieldOp::PushTwoPack5LeftDeltaZero,
    FieldOp::PushThreeLeftDeltaZero,
    FieldOp::PushThreePack5LeftDeltaZero,
    FieldOp::PushTwoLeftDeltaOne,
    FieldOp::PushTwoPack5LeftDeltaOne,
    FieldOp::PushThreeLeftDeltaOne,
    FieldOp::PushThreePack5LeftDeltaOne,
    FieldOp::PushTwoLeftDeltaN,
    FieldOp::PushTwoPack5LeftDeltaN,
    FieldOp::PushThreeLeftDeltaN,
    FieldOp::PushThreePack5LeftDeltaN,
    FieldOp::PushN,
    FieldOp::PushNAndNonTopological,
    FieldOp::PopOnePlusOne,
    FieldOp::PopOnePlusN,
    FieldOp::PopAllButOnePlusOne,
    FieldOp::PopAllButOnePlusN,
    FieldOp::PopAllButOnePlusNPack3Bits,
    FieldOp::PopAllButOnePlusNPack6Bits,
    FieldOp::PopNPlusOne,
    FieldOp::PopNPlusN,
    FieldOp::PopNAndNonTopographical,
    FieldOp::NonTopoComplex,
    FieldOp::NonTopoPenultimatePlusOne,
    FieldOp::NonTopoComplexPack4Bits,
    FieldOp::FieldPathEncodeFinish,
];

impl FieldOp {
    /// Position of this operation in the weight table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name, matching the variant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PlusOne => "PlusOne",
            Self::PlusTwo => "PlusTwo",
            Self::PlusThree => "PlusThree",
            Self::PlusFour => "PlusFour",
            Self::PlusN => "PlusN",
            Self::PushOneLeftDeltaZeroRightZero => "PushOneLeftDeltaZeroRightZero",
            Self::PushOneLeftDeltaZeroRightNonZero => "PushOneLeftDeltaZeroRightNonZero",
            Self::PushOneLeftDeltaOneRightZero => "PushOneLeftDeltaOneRightZero",
            Self::PushOneLeftDeltaOneRightNonZero => "PushOneLeftDeltaOneRightNonZero",
            Self::PushOneLeftDeltaNRightZero => "PushOneLeftDeltaNRightZero",
            Self::PushOneLeftDeltaNRightNonZero => "PushOneLeftDeltaNRightNonZero",
            Self::PushOneLeftDeltaNRightNonZeroPack6Bits => {
                "PushOneLeftDeltaNRightNonZeroPack6Bits"
            }
            Self::PushOneLeftDeltaNRightNonZeroPack8Bits => {
                "PushOneLeftDeltaNRightNonZeroPack8Bits"
            }
            Self::PushTwoLeftDeltaZero => "PushTwoLeftDeltaZero",
            Self::PushTwoPack5LeftDeltaZero => "PushTwoPack5LeftDeltaZero",
            Self::PushThreeLeftDeltaZero => "PushThreeLeftDeltaZero",
            Self::PushThreePack5LeftDeltaZero => "PushThreePack5LeftDeltaZero",
            Self::PushTwoLeftDeltaOne => "PushTwoLeftDeltaOne",
            Self::PushTwoPack5LeftDeltaOne => "PushTwoPack5LeftDeltaOne",
            Self::PushThreeLeftDeltaOne => "PushThreeLeftDeltaOne",
            Self::PushThreePack5LeftDeltaOne => "PushThreePack5LeftDeltaOne",
            Self::PushTwoLeftDeltaN => "PushTwoLeftDeltaN",
            Self::PushTwoPack5LeftDeltaN => "PushTwoPack5LeftDeltaN",
            Self::PushThreeLeftDeltaN => "PushThreeLeftDeltaN",
            Self::PushThreePack5LeftDeltaN => "PushThreePack5LeftDeltaN",
            Self::PushN => "PushN",
            Self::PushNAndNonTopological => "PushNAndNonTopological",
            Self::PopOnePlusOne => "PopOnePlusOne",
            Self::PopOnePlusN => "PopOnePlusN",
            Self::PopAllButOnePlusOne => "PopAllButOnePlusOne",
            Self::PopAllButOnePlusN => "PopAllButOnePlusN",
            Self::PopAllButOnePlusNPack3Bits => "PopAllButOnePlusNPack3Bits",
            Self::PopAllButOnePlusNPack6Bits => "PopAllButOnePlusNPack6Bits",
            Self::PopNPlusOne => "PopNPlusOne",
            Self::PopNPlusN => "PopNPlusN",
            Self::PopNAndNonTopographical => "PopNAndNonTopographical",
            Self::NonTopoComplex => "NonTopoComplex",
            Self::NonTopoPenultimatePlusOne => "NonTopoPenultimatePlusOne",
            Self::NonTopoComplexPack4Bits => "NonTopoComplexPack4Bits",
            Self::FieldPathEncodeFinish => "FieldPathEncodeFinish",
        }
    }

    /// Empirical frequency of this operation, used to build the
    /// entropy code. Operations with weight zero are still assigned a
    /// (long) code.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::PlusOne => 36_271,
            Self::PlusTwo => 10_334,
            Self::PlusThree => 1_375,
            Self::PlusFour => 646,
            Self::PlusN => 4_128,
            Self::PushOneLeftDeltaZeroRightZero => 35,
            Self::PushOneLeftDeltaZeroRightNonZero => 3,
            Self::PushOneLeftDeltaOneRightZero => 521,
            Self::PushOneLeftDeltaOneRightNonZero => 2_942,
            Self::PushOneLeftDeltaNRightZero => 560,
            Self::PushOneLeftDeltaNRightNonZero => 471,
            Self::PushOneLeftDeltaNRightNonZeroPack6Bits => 10_530,
            Self::PushOneLeftDeltaNRightNonZeroPack8Bits => 251,
            Self::PushTwoLeftDeltaZero
            | Self::PushTwoPack5LeftDeltaZero
            | Self::PushThreeLeftDeltaZero
            | Self::PushThreePack5LeftDeltaZero
            | Self::PushTwoLeftDeltaOne
            | Self::PushTwoPack5LeftDeltaOne
            | Self::PushThreeLeftDeltaOne
            | Self::PushThreePack5LeftDeltaOne
            | Self::PushTwoLeftDeltaN
            | Self::PushTwoPack5LeftDeltaN
            | Self::PushThreeLeftDeltaN
            | Self::PushThreePack5LeftDeltaN
            | Self::PushN
            | Self::PopOnePlusN
            | Self::PopNPlusOne
            | Self::PopNPlusN => 0,
            Self::PushNAndNonTopological => 310,
            Self::PopOnePlusOne => 2,
            Self::PopAllButOnePlusOne => 1_837,
            Self::PopAllButOnePlusN => 149,
            Self::PopAllButOnePlusNPack3Bits => 300,
            Self::PopAllButOnePlusNPack6Bits => 634,
            Self::PopNAndNonTopographical => 1,
            Self::NonTopoComplex => 76,
            Self::NonTopoPenultimatePlusOne => 271,
            Self::NonTopoComplexPack4Bits => 99,
            Self::FieldPathEncodeFinish => 25_474,
        }
    }

    /// Returns `true` for the sequence terminator.
    #[must_use]
    pub const fn is_finish(self) -> bool {
        matches!(self, Self::FieldPathEncodeFinish)
    }

    /// Applies this operation: reads any operands from `reader` and
    /// mutates the path cursor.
    ///
    /// [`FieldOp::FieldPathEncodeFinish`] reads nothing and leaves the
    /// cursor untouched.
    pub fn execute(
        self,
        reader: &mut BitReader<'_>,
        fp: &mut FieldPath,
    ) -> DecodeResult<()> {
        match self {
            Self::PlusOne => fp.bump(fp.last(), 1),
            Self::PlusTwo => fp.bump(fp.last(), 2),
            Self::PlusThree => fp.bump(fp.last(), 3),
            Self::PlusFour => fp.bump(fp.last(), 4),
            Self::PlusN => {
                let n = read_ubitvar_fp(reader)? as i32;
                fp.bump(fp.last(), n + 5);
            }
            Self::PushOneLeftDeltaZeroRightZero => fp.push(0)?,
            Self::PushOneLeftDeltaZeroRightNonZero => {
                let v = read_ubitvar_fp(reader)? as i32;
                fp.push(v)?;
            }
            Self::PushOneLeftDeltaOneRightZero => {
                fp.bump(fp.last(), 1);
                fp.push(0)?;
            }
            Self::PushOneLeftDeltaOneRightNonZero => {
                fp.bump(fp.last(), 1);
                let v = read_ubitvar_fp(reader)? as i32;
                fp.push(v)?;
            }
            Self::PushOneLeftDeltaNRightZero => {
                let n = read_ubitvar_fp(reader)? as i32;
                fp.bump(fp.last(), n);
                fp.push(0)?;
            }
            Self::PushOneLeftDeltaNRightNonZero => {
                let n = read_ubitvar_fp(reader)? as i32;
                fp.bump(fp.last(), n + 2);
                let v = read_ubitvar_fp(reader)? as i32;
                fp.push(v + 1)?;
            }
            Self::PushOneLeftDeltaNRightNonZeroPack6Bits => {
                let n = reader.read_bits(3)? as i32;
                fp.bump(fp.last(), n + 2);
                let v = reader.read_bits(3)? as i32;
                fp.push(v + 1)?;
            }
            Self::PushOneLeftDeltaNRightNonZeroPack8Bits => {
                let n = reader.read_bits(4)? as i32;
                fp.bump(fp.last(), n + 2);
                let v = reader.read_bits(4)? as i32;
                fp.push(v + 1)?;
            }
            Self::PushTwoLeftDeltaZero => push_operands(reader, fp, 2)?,
            Self::PushTwoPack5LeftDeltaZero => push_packed5(reader, fp, 2)?,
            Self::PushThreeLeftDeltaZero => push_operands(reader, fp, 3)?,
            Self::PushThreePack5LeftDeltaZero => push_packed5(reader, fp, 3)?,
            Self::PushTwoLeftDeltaOne => {
                fp.bump(fp.last(), 1);
                push_operands(reader, fp, 2)?;
            }
            Self::PushTwoPack5LeftDeltaOne => {
                fp.bump(fp.last(), 1);
                push_packed5(reader, fp, 2)?;
            }
            Self::PushThreeLeftDeltaOne => {
                fp.bump(fp.last(), 1);
                push_operands(reader, fp, 3)?;
            }
            Self::PushThreePack5LeftDeltaOne => {
                fp.bump(fp.last(), 1);
                push_packed5(reader, fp, 3)?;
            }
            Self::PushTwoLeftDeltaN => {
                let n = reader.read_ubitvar()? as i32;
                fp.bump(fp.last(), n + 2);
                push_operands(reader, fp, 2)?;
            }
            Self::PushTwoPack5LeftDeltaN => {
                let n = reader.read_ubitvar()? as i32;
                fp.bump(fp.last(), n + 2);
                push_packed5(reader, fp, 2)?;
            }
            Self::PushThreeLeftDeltaN => {
                let n = reader.read_ubitvar()? as i32;
                fp.bump(fp.last(), n + 2);
                push_operands(reader, fp, 3)?;
            }
            Self::PushThreePack5LeftDeltaN => {
                let n = reader.read_ubitvar()? as i32;
                fp.bump(fp.last(), n + 2);
                push_packed5(reader, fp, 3)?;
            }
            Self::PushN => {
                let count = reader.read_ubitvar()? as usize;
                let n = reader.read_ubitvar()? as i32;
                fp.bump(fp.last(), n);
                push_operands(reader, fp, count)?;
            }
            Self::PushNAndNonTopological => {
                for i in 0..=fp.last() {
                    if reader.read_bit()? {
                        let delta = reader.read_vars32()?;
                        fp.bump(i, delta + 1);
                    }
                }
                let count = reader.read_ubitvar()? as usize;
                for _ in 0..count {
                    let v = read_ubitvar_fp(reader)? as i32;
                    fp.push(v)?;
                }
            }
            Self::PopOnePlusOne => {
                fp.pop(1)?;
                fp.bump(fp.last(), 1);
            }
            Self::PopOnePlusN => {
                fp.pop(1)?;
                let n = read_ubitvar_fp(reader)? as i32;
                fp.bump(fp.last(), n + 1);
            }
            Self::PopAllButOnePlusOne => {
                fp.pop(fp.last())?;
                fp.bump(0, 1);
            }
            Self::PopAllButOnePlusN => {
                fp.pop(fp.last())?;
                let n = read_ubitvar_fp(reader)? as i32;
                fp.bump(0, n + 1);
            }
            Self::PopAllButOnePlusNPack3Bits => {
                fp.pop(fp.last())?;
                let n = reader.read_bits(3)? as i32;
                fp.bump(0, n + 1);
            }
            Self::PopAllButOnePlusNPack6Bits => {
                fp.pop(fp.last())?;
                let n = reader.read_bits(6)? as i32;
                fp.bump(0, n + 1);
            }
            Self::PopNPlusOne => {
                let n = read_ubitvar_fp(reader)? as usize;
                fp.pop(n)?;
                fp.bump(fp.last(), 1);
            }
            Self::PopNPlusN => {
                let n = read_ubitvar_fp(reader)? as usize;
                fp.pop(n)?;
                let delta = reader.read_vars32()?;
                fp.bump(fp.last(), delta);
            }
            Self::PopNAndNonTopographical => {
                let n = read_ubitvar_fp(reader)? as usize;
                fp.pop(n)?;
                for i in 0..=fp.last() {
                    if reader.read_bit()? {
                        let delta = reader.read_vars32()?;
                        fp.bump(i, delta);
                    }
                }
            }
            Self::NonTopoComplex => {
                for i in 0..=fp.last() {
                    if reader.read_bit()? {
                        let delta = reader.read_vars32()?;
                        fp.bump(i, delta);
                    }
                }
            }
            Self::NonTopoPenultimatePlusOne => {
                if fp.last() == 0 {
                    return Err(DecodeError::PathUnderflow {
                        popped: 1,
                        depth: fp.depth(),
                    });
                }
                fp.bump(fp.last() - 1, 1);
            }
            Self::NonTopoComplexPack4Bits => {
                for i in 0..=fp.last() {
                    if reader.read_bit()? {
                        let delta = reader.read_bits(4)? as i32 - 7;
                        fp.bump(i, delta);
                    }
                }
            }
            Self::FieldPathEncodeFinish => {}
        }
        Ok(())
    }
}

fn push_operands(
    reader: &mut BitReader<'_>,
    fp: &mut FieldPath,
    count: usize,
) -> DecodeResult<()> {
    for _ in 0..count {
        let v = read_ubitvar_fp(reader)? as i32;
        fp.push(v)?;
    }
    Ok(())
}

fn push_packed5(
    reader: &mut BitReader<'_>,
    fp: &mut FieldPath,
    count: usize,
) -> DecodeResult<()> {
    for _ in 0..count {
        let v = reader.read_bits(5)? as i32;
        fp.push(v)?;
    }
    Ok(())
}

/// Reads a field-path operand with the graduated width prefix.
///
/// One selector bit per tier: 2, 4, 10, 17, then 31 value bits.
pub fn read_ubitvar_fp(reader: &mut BitReader<'_>) -> DecodeResult<u32> {
    if reader.read_bit()? {
        return Ok(reader.read_bits(2)? as u32);
    }
    if reader.read_bit()? {
        return Ok(reader.read_bits(4)? as u32);
    }
    if reader.read_bit()? {
        return Ok(reader.read_bits(10)? as u32);
    }
    if reader.read_bit()? {
        return Ok(reader.read_bits(17)? as u32);
    }
    Ok(reader.read_bits(31)? as u32)
}
