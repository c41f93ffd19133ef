//! Opcode entries and the immutable opcode table.
//!
//! An [`OpcodeEntry`] is one instruction variant: mnemonic, container width,
//! fixed base pattern, the mask of bits that must match exactly, dialect
//! gating, and the ordered operand references into the registry.
//!
//! [`OpcodeTable::build`] validates every record once and freezes the result.
//! Lookup order is architecturally significant (most-specific-first within a
//! primary-opcode group, first match wins) and is never reordered; the
//! mnemonic and primary-opcode indexes are order-preserving accelerators
//! only.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dialect::DialectSet;
use crate::error::TableError;
use crate::operand::{FieldShift, Operand, OperandFlags, OperandRegistry};

// ---------------------------------------------------------------------------
//  Container width
// ---------------------------------------------------------------------------

/// Bytes occupied by one instruction encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerWidth {
    /// 2-byte compact form.
    Half,
    /// 4-byte standard form.
    Word,
    /// 8-byte prefixed form: `prefix_word << 32 | suffix_word`.
    Prefixed,
}

impl ContainerWidth {
    pub const fn bytes(self) -> usize {
        match self {
            ContainerWidth::Half => 2,
            ContainerWidth::Word => 4,
            ContainerWidth::Prefixed => 8,
        }
    }

    pub const fn bits(self) -> u32 {
        (self.bytes() * 8) as u32
    }

    /// All bits representable at this width.
    pub const fn value_mask(self) -> u64 {
        match self {
            ContainerWidth::Half => 0xffff,
            ContainerWidth::Word => 0xffff_ffff,
            ContainerWidth::Prefixed => u64::MAX,
        }
    }

    /// Primary opcode: the top six bits of the container (for prefixed
    /// instructions, the top six bits of the prefix word).
    pub const fn primary(self, bits: u64) -> u8 {
        ((bits >> (self.bits() - 6)) & 0x3f) as u8
    }

    /// Bit positions the primary opcode occupies.
    const fn primary_mask(self) -> u64 {
        0x3f << (self.bits() - 6)
    }
}

impl fmt::Display for ContainerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-byte", self.bytes())
    }
}

// ---------------------------------------------------------------------------
//  Opcode entry
// ---------------------------------------------------------------------------

/// One instruction variant's encoding rule.
#[derive(Debug, Clone)]
pub struct OpcodeEntry {
    /// Mnemonic, lower-case.
    pub mnemonic: &'static str,
    /// Container width of this variant.
    pub width: ContainerWidth,
    /// Fixed bit pattern. Invariant: `base & !mask == 0`.
    pub base: u64,
    /// Bits that must match exactly during decode.
    pub mask: u64,
    /// Dialect tags the active dialect must include.
    pub required: DialectSet,
    /// Dialect tags the active dialect must not include. Overrides
    /// `required` when both match.
    pub excluded: DialectSet,
    /// Ordered indices into the operand registry. A chained (NEXT)
    /// descriptor is referenced by its first slot only.
    pub operands: Vec<u8>,
}

impl OpcodeEntry {
    pub fn new(
        mnemonic: &'static str,
        width: ContainerWidth,
        base: u64,
        mask: u64,
        required: DialectSet,
        excluded: DialectSet,
        operands: Vec<u8>,
    ) -> Self {
        OpcodeEntry { mnemonic, width, base, mask, required, excluded, operands }
    }

    /// Dialect gate: required tags must all be active, excluded tags must
    /// all be inactive. Exclusion is checked first and always wins.
    pub fn dialect_ok(&self, active: DialectSet) -> bool {
        if !self.excluded.is_disjoint(active) {
            return false;
        }
        self.required.is_subset(active)
    }
}

// ---------------------------------------------------------------------------
//  Opcode table
// ---------------------------------------------------------------------------

/// The immutable table/registry pair used by encode and decode.
///
/// Construction happens once; encode/decode take `&self` only, so concurrent
/// reads from any number of threads are safe without locking.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    registry: OperandRegistry,
    entries: Vec<OpcodeEntry>,
    by_mnemonic: HashMap<&'static str, Vec<usize>>,
    by_group: HashMap<(ContainerWidth, u8), Vec<usize>>,
}

impl OpcodeTable {
    /// Validates the records and builds the frozen table.
    pub fn build(
        registry: OperandRegistry,
        entries: Vec<OpcodeEntry>,
    ) -> Result<OpcodeTable, TableError> {
        validate_registry(&registry)?;

        let mut last_primary: HashMap<ContainerWidth, u8> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            validate_entry(index, entry, &registry)?;

            // Within one width the table must stay grouped by primary
            // opcode, or the group index would change first-match order.
            let primary = entry.width.primary(entry.base);
            if let Some(&prev) = last_primary.get(&entry.width) {
                if primary < prev {
                    return Err(TableError::PrimaryOrder {
                        index,
                        mnemonic: entry.mnemonic.to_string(),
                    });
                }
            }
            last_primary.insert(entry.width, primary);
        }

        let mut by_mnemonic: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut by_group: HashMap<(ContainerWidth, u8), Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_mnemonic.entry(entry.mnemonic).or_default().push(index);
            by_group
                .entry((entry.width, entry.width.primary(entry.base)))
                .or_default()
                .push(index);
        }

        debug!(
            entries = entries.len(),
            descriptors = registry.len(),
            mnemonics = by_mnemonic.len(),
            "opcode table built"
        );

        Ok(OpcodeTable { registry, entries, by_mnemonic, by_group })
    }

    pub fn registry(&self) -> &OperandRegistry {
        &self.registry
    }

    pub fn entries(&self) -> &[OpcodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry indices for a mnemonic, in table order.
    pub(crate) fn mnemonic_group(&self, mnemonic: &str) -> Option<&[usize]> {
        self.by_mnemonic.get(mnemonic).map(Vec::as_slice)
    }

    /// Entry indices for a (width, primary opcode) group, in table order.
    pub(crate) fn primary_group(&self, width: ContainerWidth, primary: u8) -> Option<&[usize]> {
        self.by_group.get(&(width, primary)).map(Vec::as_slice)
    }

    /// Leading operand references that may not be omitted.
    pub(crate) fn required_operand_count(&self, entry: &OpcodeEntry) -> usize {
        entry
            .operands
            .iter()
            .take_while(|&&r| !self.registry[r as usize].flags.contains(OperandFlags::OPTIONAL))
            .count()
    }
}

// ---------------------------------------------------------------------------
//  Validation
// ---------------------------------------------------------------------------

fn validate_registry(registry: &OperandRegistry) -> Result<(), TableError> {
    for (index, op) in registry.iter().enumerate() {
        // Ones must be contiguous (implied low zeroes are allowed): adding
        // the rightmost bit must yield a power of two.
        let right = op.mask & op.mask.wrapping_neg();
        let filled = op.mask.wrapping_add(right);
        if op.mask == 0 || filled & filled.wrapping_sub(1) != 0 {
            return Err(TableError::NonContiguousMask { index, mask: op.mask });
        }

        if op.shift == FieldShift::Custom && (op.insert.is_none() || op.extract.is_none()) {
            return Err(TableError::MissingCustomHooks { index });
        }

        if op.flags.contains(OperandFlags::NEXT) {
            let Some(next) = registry.get(index + 1) else {
                return Err(TableError::ChainWithoutSuccessor { index });
            };
            // Chained pairs combine raw portions by OR; only the generic
            // placement path defines a portion.
            if op.insert.is_some() || next.insert.is_some() || next.shift == FieldShift::Custom {
                return Err(TableError::ChainedCustom { index });
            }
        }
    }
    Ok(())
}

fn validate_entry(
    index: usize,
    entry: &OpcodeEntry,
    registry: &OperandRegistry,
) -> Result<(), TableError> {
    let mnemonic = || entry.mnemonic.to_string();

    if entry.base & !entry.mask != 0 {
        return Err(TableError::MaskTrimsBase { index, mnemonic: mnemonic() });
    }

    let pmask = entry.width.primary_mask();
    if entry.mask & pmask != pmask {
        return Err(TableError::PrimaryNotInMask { index, mnemonic: mnemonic() });
    }

    // Operand fields must not overlap the fixed bits or each other, and
    // optional operands form the tail of the list.
    let mut covered = entry.mask;
    let mut seen_optional = false;
    for (position, &r) in entry.operands.iter().enumerate() {
        let slot = r as usize;
        let Some(op) = registry.get(slot) else {
            return Err(TableError::BadOperandIndex { index, mnemonic: mnemonic(), operand: r });
        };

        let mut fmask = field_placement_mask(op);
        if op.flags.contains(OperandFlags::NEXT) {
            fmask |= field_placement_mask(&registry[slot + 1]);
        }
        if covered & fmask != 0 {
            return Err(TableError::OperandOverlap { index, mnemonic: mnemonic(), position });
        }
        covered |= fmask;

        if op.flags.contains(OperandFlags::OPTIONAL) {
            seen_optional = true;
        } else if seen_optional {
            return Err(TableError::OptionalOrder { index, mnemonic: mnemonic(), position });
        }
    }

    Ok(())
}

/// Container bits a field occupies. Positionless fields are probed by
/// inserting an all-ones value (negated first for NEGATIVE fields, which
/// negate it back internally).
fn field_placement_mask(op: &Operand) -> u64 {
    match (op.shift, op.insert) {
        (FieldShift::Custom, Some(insert)) => {
            let probe = if op.flags.contains(OperandFlags::NEGATIVE) { 1 } else { -1 };
            match insert(0, probe, DialectSet::NONE) {
                Ok((bits, _)) => bits,
                Err(_) => op.mask,
            }
        }
        (FieldShift::Left(n), _) => op.mask << n,
        (FieldShift::Right(n), _) => op.mask >> n,
        // Unreachable: validate_registry already required hooks.
        (FieldShift::Custom, None) => op.mask,
    }
}
