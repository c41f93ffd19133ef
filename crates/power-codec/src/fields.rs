//! Custom insert/extract functions for irregular fields.
//!
//! Each function pair owns the placement of one field shape the generic
//! mask/shift path cannot express: negated one-way immediates, a register
//! written to two positions, values split within a word or across the two
//! words of a prefixed container, and fields with encode-time warnings.

use crate::dialect::DialectSet;

// ---------------------------------------------------------------------------
//  NSI: negated 16-bit signed immediate
// ---------------------------------------------------------------------------

/// Negated immediate: `subi rt,ra,v` assembles as `addi rt,ra,-v`.
pub fn insert_nsi(
    bits: u64,
    value: i64,
    _dialect: DialectSet,
) -> Result<(u64, Option<&'static str>), &'static str> {
    Ok((bits | ((value.wrapping_neg() as u64) & 0xffff), None))
}

/// One-way: the plain-immediate form owns disassembly, so this always flags
/// the entry invalid for decode.
pub fn extract_nsi(bits: u64, _dialect: DialectSet, invalid: &mut bool) -> i64 {
    *invalid = true;
    let v = (bits & 0xffff) as i64;
    -((v ^ 0x8000) - 0x8000)
}

// ---------------------------------------------------------------------------
//  RSB: register placed in both the RS and RB fields
// ---------------------------------------------------------------------------

/// `mr ra,rs` is `or ra,rs,rs`: one symbolic register fills bits 21-25 and
/// 11-15.
pub fn insert_rsb(
    bits: u64,
    value: i64,
    _dialect: DialectSet,
) -> Result<(u64, Option<&'static str>), &'static str> {
    let v = (value as u64) & 0x1f;
    Ok((bits | (v << 21) | (v << 11), None))
}

/// Valid only when the two fields agree; otherwise the general form must
/// decode instead.
pub fn extract_rsb(bits: u64, _dialect: DialectSet, invalid: &mut bool) -> i64 {
    let rs = (bits >> 21) & 0x1f;
    let rb = (bits >> 11) & 0x1f;
    if rs != rb {
        *invalid = true;
    }
    rs as i64
}

// ---------------------------------------------------------------------------
//  SH6: 6-bit shift amount split 5+1 within one word
// ---------------------------------------------------------------------------

/// 64-bit rotate shift count: low five bits at bit 11, the sixth at bit 1.
pub fn insert_sh6(
    bits: u64,
    value: i64,
    _dialect: DialectSet,
) -> Result<(u64, Option<&'static str>), &'static str> {
    let v = value as u64;
    Ok((bits | ((v & 0x1f) << 11) | ((v & 0x20) >> 4), None))
}

pub fn extract_sh6(bits: u64, _dialect: DialectSet, _invalid: &mut bool) -> i64 {
    (((bits >> 11) & 0x1f) | ((bits << 4) & 0x20)) as i64
}

// ---------------------------------------------------------------------------
//  D34: 34-bit displacement split across a prefixed container
// ---------------------------------------------------------------------------

/// High 18 bits live in the prefix word (container bits 32-49), low 16 in
/// the suffix word (bits 0-15).
pub fn insert_d34(
    bits: u64,
    value: i64,
    _dialect: DialectSet,
) -> Result<(u64, Option<&'static str>), &'static str> {
    let v = value as u64;
    Ok((bits | ((v & 0x3_ffff_0000) << 16) | (v & 0xffff), None))
}

pub fn extract_d34(bits: u64, _dialect: DialectSet, _invalid: &mut bool) -> i64 {
    let raw = ((bits >> 16) & 0x3_ffff_0000) | (bits & 0xffff);
    ((raw ^ 0x2_0000_0000) as i64).wrapping_sub(0x2_0000_0000)
}

// ---------------------------------------------------------------------------
//  BO: branch condition field with deprecated encodings
// ---------------------------------------------------------------------------

/// BO combinations that set the decrement-and-test bits together are
/// historically accepted but architecturally reserved: encode anyway, warn.
pub fn insert_bo(
    bits: u64,
    value: i64,
    _dialect: DialectSet,
) -> Result<(u64, Option<&'static str>), &'static str> {
    let v = (value as u64) & 0x1f;
    let warning = if v & 0x14 == 0x14 && v & 0x0b != 0 {
        Some("deprecated branch-condition encoding (reserved hint bits set)")
    } else {
        None
    };
    Ok((bits | (v << 21), warning))
}

pub fn extract_bo(bits: u64, _dialect: DialectSet, _invalid: &mut bool) -> i64 {
    ((bits >> 21) & 0x1f) as i64
}

// ---------------------------------------------------------------------------
//  RTQ: even-odd register pair target
// ---------------------------------------------------------------------------

/// Quadword loads name the even register of a pair. Odd registers are a
/// hard error on encode and mark the encoding unrecognizable on decode.
pub fn insert_rtq(
    bits: u64,
    value: i64,
    _dialect: DialectSet,
) -> Result<(u64, Option<&'static str>), &'static str> {
    if value & 1 != 0 {
        return Err("target register pair must be even");
    }
    Ok((bits | (((value as u64) & 0x1f) << 21), None))
}

pub fn extract_rtq(bits: u64, _dialect: DialectSet, invalid: &mut bool) -> i64 {
    let v = (bits >> 21) & 0x1f;
    if v & 1 != 0 {
        *invalid = true;
    }
    v as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: DialectSet = DialectSet::NONE;

    #[test]
    fn test_nsi_negates_on_encode() {
        let (bits, warn) = insert_nsi(0, 100, D).unwrap();
        assert_eq!(bits, (-100i64 as u64) & 0xffff);
        assert!(warn.is_none());
    }

    #[test]
    fn test_nsi_extract_is_one_way() {
        let (bits, _) = insert_nsi(0, 100, D).unwrap();
        let mut invalid = false;
        let v = extract_nsi(bits, D, &mut invalid);
        assert_eq!(v, 100);
        assert!(invalid, "negated immediate must never be chosen for decode");
    }

    #[test]
    fn test_rsb_mirrors_register() {
        let (bits, _) = insert_rsb(0, 7, D).unwrap();
        assert_eq!(bits, (7 << 21) | (7 << 11));
        let mut invalid = false;
        assert_eq!(extract_rsb(bits, D, &mut invalid), 7);
        assert!(!invalid);
    }

    #[test]
    fn test_rsb_mismatch_invalid() {
        let bits = (7u64 << 21) | (8 << 11);
        let mut invalid = false;
        extract_rsb(bits, D, &mut invalid);
        assert!(invalid);
    }

    #[test]
    fn test_sh6_round_trip() {
        for sh in 0..64 {
            let (bits, _) = insert_sh6(0, sh, D).unwrap();
            let mut invalid = false;
            assert_eq!(extract_sh6(bits, D, &mut invalid), sh);
        }
    }

    #[test]
    fn test_d34_round_trip_and_sign() {
        for v in [0i64, 1, -1, 0x1_ffff_ffff, -0x2_0000_0000, -4096] {
            let (bits, _) = insert_d34(0, v, D).unwrap();
            let mut invalid = false;
            assert_eq!(extract_d34(bits, D, &mut invalid), v, "value {v}");
        }
    }

    #[test]
    fn test_d34_routes_to_both_halves() {
        let (bits, _) = insert_d34(0, 0x1_0000_1234, D).unwrap();
        // High bits in the prefix half, low 16 in the suffix half.
        assert_eq!(bits >> 32, 0x1_0000);
        assert_eq!(bits & 0xffff_ffff, 0x1234);
    }

    #[test]
    fn test_bo_warning() {
        let (_, warn) = insert_bo(0, 0x14, D).unwrap();
        assert!(warn.is_none());
        let (bits, warn) = insert_bo(0, 0x16, D).unwrap();
        assert!(warn.is_some());
        assert_eq!(bits, 0x16 << 21);
    }

    #[test]
    fn test_rtq_even_only() {
        assert!(insert_rtq(0, 4, D).is_ok());
        assert!(insert_rtq(0, 5, D).is_err());
        let mut invalid = false;
        extract_rtq(5 << 21, D, &mut invalid);
        assert!(invalid);
    }
}
