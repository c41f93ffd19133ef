//! Operand descriptors and the operand registry.
//!
//! An [`Operand`] describes one bit field of one instruction container: the
//! largest value the field can hold, where the field sits (or that a custom
//! function alone decides), optional custom insert/extract logic for
//! irregular fields, and semantic flags.
//!
//! Descriptors live in an [`OperandRegistry`]; opcode entries reference them
//! by index. A descriptor flagged [`OperandFlags::NEXT`] chains with the
//! following registry slot: the pair encodes one logical operand whose bits
//! are split across two placements.

use std::fmt;
use std::ops::{BitOr, BitOrAssign, Index};

use serde::{Deserialize, Serialize};

use crate::dialect::DialectSet;

// ---------------------------------------------------------------------------
//  Operand flags
// ---------------------------------------------------------------------------

/// Semantic flags on an operand descriptor.
///
/// The register-class tags (GPR, FPR, ...) are pass-through: the engine
/// ignores them, the surrounding symbolic parser uses them to validate and
/// print register names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperandFlags(u32);

impl OperandFlags {
    pub const NONE: OperandFlags = OperandFlags(0);
    /// Field value is sign-extended from its declared width.
    pub const SIGNED: OperandFlags = OperandFlags(1 << 0);
    /// Signed field that also accepts the positive unsigned range
    /// (historically tolerated high immediates). Used together with SIGNED.
    pub const SIGNOPT: OperandFlags = OperandFlags(1 << 1);
    /// Value is stored as its arithmetic negation.
    pub const NEGATIVE: OperandFlags = OperandFlags(1 << 2);
    /// Stored value is biased by -1; the legal symbolic range starts at 1.
    pub const NONZERO: OperandFlags = OperandFlags(1 << 3);
    /// Operand may be omitted in symbolic form; the descriptor default is
    /// encoded instead.
    pub const OPTIONAL: OperandFlags = OperandFlags(1 << 4);
    /// Address operand relative to the instruction address.
    pub const RELATIVE: OperandFlags = OperandFlags(1 << 5);
    /// Absolute address operand.
    pub const ABSOLUTE: OperandFlags = OperandFlags(1 << 6);
    /// Written in parentheses (indirect base register).
    pub const PARENS: OperandFlags = OperandFlags(1 << 7);
    /// Chains with the next registry slot: both slots place portions of one
    /// logical operand value.
    pub const NEXT: OperandFlags = OperandFlags(1 << 8);
    /// General-purpose register.
    pub const GPR: OperandFlags = OperandFlags(1 << 9);
    /// General-purpose register where register zero reads as literal 0.
    pub const GPR_0: OperandFlags = OperandFlags(1 << 10);
    /// Floating-point register.
    pub const FPR: OperandFlags = OperandFlags(1 << 11);
    /// Vector register.
    pub const VR: OperandFlags = OperandFlags(1 << 12);
    /// Vector-scalar register.
    pub const VSR: OperandFlags = OperandFlags(1 << 13);
    /// Condition register bit.
    pub const CR_BIT: OperandFlags = OperandFlags(1 << 14);
    /// Condition register field.
    pub const CR_REG: OperandFlags = OperandFlags(1 << 15);
    /// Special-purpose register number.
    pub const SPR: OperandFlags = OperandFlags(1 << 16);

    /// Whether every flag in `other` is set in `self`.
    pub const fn contains(self, other: OperandFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flag union, usable in constant context.
    pub const fn union(self, other: OperandFlags) -> OperandFlags {
        OperandFlags(self.0 | other.0)
    }
}

impl BitOr for OperandFlags {
    type Output = OperandFlags;

    fn bitor(self, rhs: OperandFlags) -> OperandFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for OperandFlags {
    fn bitor_assign(&mut self, rhs: OperandFlags) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for OperandFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperandFlags({:#x})", self.0)
    }
}

// ---------------------------------------------------------------------------
//  Field placement
// ---------------------------------------------------------------------------

/// Where the generic insert/extract path puts a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldShift {
    /// Field stored at bit position `n`: `bits |= (value & mask) << n`.
    Left(u32),
    /// Field value carries implied low bits; stored right-shifted:
    /// `bits |= (value & mask) >> n`.
    Right(u32),
    /// No generic placement. The custom insert/extract functions fully own
    /// placement (split fields, fields spanning the two words of a prefixed
    /// container).
    Custom,
}

// ---------------------------------------------------------------------------
//  Custom field hooks
// ---------------------------------------------------------------------------

/// Custom insert hook.
///
/// `Ok((bits, Some(msg)))` encodes anyway and reports `msg` as a warning
/// (the warn-but-encode convention for historically accepted values).
/// `Err(msg)` is a hard constraint violation and aborts the encode.
pub type InsertFn =
    fn(bits: u64, value: i64, dialect: DialectSet) -> Result<(u64, Option<&'static str>), &'static str>;

/// Custom extract hook.
///
/// Sets `invalid` instead of failing when the bit pattern cannot correspond
/// to a legal symbolic value; the decoder then rejects the candidate entry
/// and keeps scanning.
pub type ExtractFn = fn(bits: u64, dialect: DialectSet, invalid: &mut bool) -> i64;

// ---------------------------------------------------------------------------
//  Operand descriptor
// ---------------------------------------------------------------------------

/// One instruction field: width, placement, hooks, flags, optional default.
#[derive(Debug, Clone, Copy)]
pub struct Operand {
    /// Largest unsigned value representable in the field. Always a
    /// contiguous run of ones, possibly followed by implied low zeroes
    /// (e.g. `0xfffc` for a displacement in units of 4).
    pub mask: u64,
    /// Generic placement, or [`FieldShift::Custom`].
    pub shift: FieldShift,
    /// Custom insert logic. Takes precedence over the generic path.
    pub insert: Option<InsertFn>,
    /// Custom extract logic. Takes precedence over the generic path.
    pub extract: Option<ExtractFn>,
    /// Semantic flags.
    pub flags: OperandFlags,
    /// Value encoded when an OPTIONAL operand is omitted.
    pub default: i64,
}

impl Operand {
    /// A descriptor using the generic insert/extract path.
    pub const fn new(mask: u64, shift: FieldShift, flags: OperandFlags) -> Self {
        Operand { mask, shift, insert: None, extract: None, flags, default: 0 }
    }

    /// A descriptor whose placement is owned by custom hooks.
    pub const fn with_hooks(
        mask: u64,
        shift: FieldShift,
        flags: OperandFlags,
        insert: InsertFn,
        extract: ExtractFn,
    ) -> Self {
        Operand { mask, shift, insert: Some(insert), extract: Some(extract), flags, default: 0 }
    }

    /// Sets the value substituted for an omitted optional operand.
    pub const fn with_default(mut self, default: i64) -> Self {
        self.default = default;
        self
    }

    /// Legal symbolic value range derived from mask and flags.
    pub fn bounds(&self) -> (i64, i64) {
        bounds(self.mask, self.flags)
    }

    /// Field granularity: the value must be a multiple of this.
    pub fn granularity(&self) -> i64 {
        let m = self.mask as i64;
        m & m.wrapping_neg()
    }

    /// Symbolic value -> raw field value (negation and bias applied).
    pub(crate) fn adjust_encode(&self, value: i64) -> u64 {
        let mut v = value;
        if self.flags.contains(OperandFlags::NEGATIVE) {
            v = v.wrapping_neg();
        }
        if self.flags.contains(OperandFlags::NONZERO) {
            v = v.wrapping_sub(1);
        }
        v as u64
    }

    /// Raw field value -> symbolic value, sign-extending from `mask`'s width.
    ///
    /// `mask` is passed explicitly so a chained pair can extend from the
    /// combined field width.
    pub(crate) fn adjust_decode(&self, raw: u64, mask: u64) -> i64 {
        let mut v = raw as i64;
        if self.flags.contains(OperandFlags::NONZERO) {
            v += 1;
        }
        if self.flags.contains(OperandFlags::SIGNED) {
            // The mask is ones followed by implied zeroes; the sign bit is
            // the top of the filled-in run.
            let filled = mask | ((mask & mask.wrapping_neg()).wrapping_sub(1));
            let top = (filled >> 1) + 1;
            v = ((raw ^ top) as i64).wrapping_sub(top as i64);
        }
        if self.flags.contains(OperandFlags::NEGATIVE) {
            v = v.wrapping_neg();
        }
        v
    }

    /// OR a raw field value into the container at this slot's placement.
    pub(crate) fn place_raw(&self, bits: u64, raw: u64) -> u64 {
        match self.shift {
            FieldShift::Left(n) => bits | ((raw & self.mask) << n),
            FieldShift::Right(n) => bits | ((raw & self.mask) >> n),
            // Custom placement never reaches the generic path.
            FieldShift::Custom => bits,
        }
    }

    /// Pull this slot's raw field value out of the container.
    pub(crate) fn take_raw(&self, bits: u64) -> u64 {
        match self.shift {
            FieldShift::Left(n) => (bits >> n) & self.mask,
            FieldShift::Right(n) => (bits << n) & self.mask,
            FieldShift::Custom => 0,
        }
    }
}

/// Legal symbolic range for a field of width `mask` under `flags`.
///
/// Mirrors the assembler's range computation: SIGNOPT keeps the unsigned
/// maximum while extending the minimum to the signed one; SIGNED halves the
/// range; NONZERO shifts it up by one; NEGATIVE mirrors the interval.
pub(crate) fn bounds(mask: u64, flags: OperandFlags) -> (i64, i64) {
    let mut max = mask as i64;
    let right = max & max.wrapping_neg();
    let mut min = 0i64;
    if flags.contains(OperandFlags::SIGNOPT) {
        min = !(max >> 1) & -right;
    } else if flags.contains(OperandFlags::SIGNED) {
        max = (max >> 1) & -right;
        min = !max & -right;
    } else if flags.contains(OperandFlags::NONZERO) {
        min += 1;
        max += 1;
    }
    if flags.contains(OperandFlags::NEGATIVE) {
        let t = min;
        min = -max;
        max = -t;
    }
    (min, max)
}

// ---------------------------------------------------------------------------
//  Operand registry
// ---------------------------------------------------------------------------

/// Ordered, immutable collection of operand descriptors.
#[derive(Debug, Clone, Default)]
pub struct OperandRegistry {
    slots: Vec<Operand>,
}

impl OperandRegistry {
    pub fn new(slots: Vec<Operand>) -> Self {
        OperandRegistry { slots }
    }

    pub fn get(&self, index: usize) -> Option<&Operand> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operand> {
        self.slots.iter()
    }
}

impl Index<usize> for OperandRegistry {
    type Output = Operand;

    fn index(&self, index: usize) -> &Operand {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_unsigned() {
        // Plain 5-bit register field: [0, 31].
        assert_eq!(bounds(0x1f, OperandFlags::NONE), (0, 31));
    }

    #[test]
    fn test_bounds_signed() {
        assert_eq!(bounds(0xffff, OperandFlags::SIGNED), (-0x8000, 0x7fff));
    }

    #[test]
    fn test_bounds_signopt() {
        // addis-style: accepts [-32768, 65535].
        let f = OperandFlags::SIGNED | OperandFlags::SIGNOPT;
        assert_eq!(bounds(0xffff, f), (-0x8000, 0xffff));
    }

    #[test]
    fn test_bounds_signed_with_granularity() {
        // Branch displacement in units of 4: [-32768, 32764].
        assert_eq!(bounds(0xfffc, OperandFlags::SIGNED), (-0x8000, 0x7ffc));
    }

    #[test]
    fn test_bounds_nonzero() {
        assert_eq!(bounds(0x1f, OperandFlags::NONZERO), (1, 32));
    }

    #[test]
    fn test_bounds_negative() {
        let f = OperandFlags::SIGNED | OperandFlags::NEGATIVE;
        assert_eq!(bounds(0xffff, f), (-0x7fff, 0x8000));
    }

    #[test]
    fn test_place_take_left() {
        let op = Operand::new(0x1f, FieldShift::Left(21), OperandFlags::GPR);
        let bits = op.place_raw(0, 29);
        assert_eq!(bits, 29 << 21);
        assert_eq!(op.take_raw(bits), 29);
    }

    #[test]
    fn test_place_take_right() {
        // Value bits 16-19 stored at container bits 11-14.
        let op = Operand::new(0xf0000, FieldShift::Right(5), OperandFlags::NONE);
        let bits = op.place_raw(0, 0xa0000);
        assert_eq!(bits, 0xa0000 >> 5);
        assert_eq!(op.take_raw(bits), 0xa0000);
    }

    #[test]
    fn test_sign_extend_trailing_zero_mask() {
        let op = Operand::new(0xfffc, FieldShift::Left(0), OperandFlags::SIGNED);
        // Raw 0xfffc is -4 once sign-extended.
        assert_eq!(op.adjust_decode(0xfffc, 0xfffc), -4);
        assert_eq!(op.adjust_decode(0x7ffc, 0xfffc), 0x7ffc);
    }

    #[test]
    fn test_nonzero_round_trip() {
        let op = Operand::new(0x1f, FieldShift::Left(0), OperandFlags::NONZERO);
        for v in 1..=32 {
            let raw = op.adjust_encode(v) & op.mask;
            assert_eq!(op.adjust_decode(raw, op.mask), v);
        }
    }

    #[test]
    fn test_negative_round_trip() {
        let op = Operand::new(
            0xffff,
            FieldShift::Left(0),
            OperandFlags::SIGNED | OperandFlags::NEGATIVE,
        );
        for v in [-0x7fff, -1, 0, 1, 0x8000] {
            let raw = op.adjust_encode(v) & op.mask;
            assert_eq!(op.adjust_decode(raw, op.mask), v);
        }
    }
}
