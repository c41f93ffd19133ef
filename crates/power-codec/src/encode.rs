//! Symbolic form -> bits.
//!
//! One pass per instruction: pick the first form of the mnemonic that the
//! active dialect and the operand count accept, seed the accumulator with the
//! entry's base pattern, and fold every operand value through its
//! descriptor's insert operation. Soft diagnostics (deprecated forms,
//! historically accepted values) are collected and returned alongside the
//! result; hard failures abort with the offending operand identified.

use tracing::trace;

use crate::dialect::DialectSet;
use crate::error::EncodeError;
use crate::opcode::{ContainerWidth, OpcodeEntry, OpcodeTable};
use crate::operand::{bounds, OperandFlags};

/// A successful encode: the container bits, their width, and any warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bits: u64,
    pub width: ContainerWidth,
    pub warnings: Vec<String>,
}

impl OpcodeTable {
    /// Encodes `mnemonic` applied to `operands` under the active dialect.
    ///
    /// Trailing optional operands may be omitted; each omitted one encodes
    /// its descriptor's documented default.
    pub fn encode(
        &self,
        mnemonic: &str,
        operands: &[i64],
        active: DialectSet,
    ) -> Result<Encoded, EncodeError> {
        let name = mnemonic.to_ascii_lowercase();
        let candidates = self.mnemonic_group(&name).unwrap_or(&[]);

        let mut first_compatible: Option<&OpcodeEntry> = None;
        let mut selected: Option<&OpcodeEntry> = None;
        for &i in candidates {
            let entry = &self.entries()[i];
            if !entry.dialect_ok(active) {
                continue;
            }
            first_compatible.get_or_insert(entry);
            let total = entry.operands.len();
            let required = self.required_operand_count(entry);
            if operands.len() == total || (required..total).contains(&operands.len()) {
                selected = Some(entry);
                break;
            }
        }

        let entry = match selected {
            Some(entry) => entry,
            // The name exists but either no form passes the dialect gate, or
            // one does and the operand list does not fit it.
            None => {
                return Err(match first_compatible {
                    Some(e) => EncodeError::WrongOperandCount {
                        mnemonic: name,
                        expected: e.operands.len(),
                        got: operands.len(),
                    },
                    None => EncodeError::NoMatchingMnemonic { mnemonic: name },
                });
            }
        };

        trace!(mnemonic = entry.mnemonic, base = entry.base, "form selected");

        let mut bits = entry.base;
        let mut warnings = Vec::new();
        for (position, &r) in entry.operands.iter().enumerate() {
            let slot = r as usize;
            let value = operands
                .get(position)
                .copied()
                .unwrap_or(self.registry()[slot].default);
            bits = self.insert_operand(bits, position, slot, value, active, &mut warnings)?;
        }

        Ok(Encoded { bits, width: entry.width, warnings })
    }

    /// Range-checks one symbolic value and folds it into the accumulator
    /// through its descriptor (and the chained successor slot, if any).
    fn insert_operand(
        &self,
        bits: u64,
        position: usize,
        slot: usize,
        value: i64,
        active: DialectSet,
        warnings: &mut Vec<String>,
    ) -> Result<u64, EncodeError> {
        let registry = self.registry();
        let first = &registry[slot];
        let chained = first.flags.contains(OperandFlags::NEXT);

        // A chained pair is one logical field; bounds come from the
        // combined width under the first slot's flags.
        let value_mask = if chained { first.mask | registry[slot + 1].mask } else { first.mask };
        let (min, max) = bounds(value_mask, first.flags);
        let granularity = {
            let m = value_mask as i64;
            m & m.wrapping_neg()
        };
        if value < min || value > max || value & (granularity - 1) != 0 {
            return Err(EncodeError::OperandOutOfRange { operand: position, value, min, max });
        }

        let raw = first.adjust_encode(value);
        let last = if chained { slot + 1 } else { slot };
        let mut bits = bits;
        for s in slot..=last {
            let op = &registry[s];
            if let Some(insert) = op.insert {
                match insert(bits, value, active) {
                    Ok((next, warning)) => {
                        if let Some(msg) = warning {
                            warnings.push(msg.to_string());
                        }
                        bits = next;
                    }
                    Err(message) => {
                        return Err(EncodeError::FieldConstraintViolated {
                            operand: position,
                            message: message.to_string(),
                        });
                    }
                }
            } else {
                bits = op.place_raw(bits, raw);
            }
        }
        Ok(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_table;

    fn table() -> OpcodeTable {
        builtin_table().unwrap()
    }

    const BASE: DialectSet = DialectSet::BASE;

    #[test]
    fn test_encode_addi() {
        let enc = table().encode("addi", &[3, 1, 100], BASE).unwrap();
        assert_eq!(enc.bits, 0x3800_0000 | (3 << 21) | (1 << 16) | 100);
        assert_eq!(enc.width, ContainerWidth::Word);
        assert!(enc.warnings.is_empty());
    }

    #[test]
    fn test_encode_is_case_insensitive() {
        let t = table();
        assert_eq!(
            t.encode("ADDI", &[3, 1, 100], BASE).unwrap().bits,
            t.encode("addi", &[3, 1, 100], BASE).unwrap().bits
        );
    }

    #[test]
    fn test_encode_negative_immediate() {
        let enc = table().encode("addi", &[3, 1, -4], BASE).unwrap();
        assert_eq!(enc.bits & 0xffff, 0xfffc);
    }

    #[test]
    fn test_wrong_operand_count() {
        let err = table().encode("addi", &[3, 1], BASE).unwrap_err();
        assert_eq!(
            err,
            EncodeError::WrongOperandCount { mnemonic: "addi".into(), expected: 3, got: 2 }
        );
    }

    #[test]
    fn test_operand_out_of_range() {
        let err = table().encode("addi", &[3, 1, 0x9000], BASE).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::OperandOutOfRange { operand: 2, value: 0x9000, min: -0x8000, max: 0x7fff }
        ));
    }

    #[test]
    fn test_granularity_enforced() {
        // Branch displacements are in units of 4.
        let err = table().encode("bc", &[12, 0, 0x1002], BASE).unwrap_err();
        assert!(matches!(err, EncodeError::OperandOutOfRange { operand: 2, .. }));
        assert!(table().encode("bc", &[12, 0, 0x1000], BASE).is_ok());
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = table().encode("frobnicate", &[], BASE).unwrap_err();
        assert_eq!(err, EncodeError::NoMatchingMnemonic { mnemonic: "frobnicate".into() });
    }

    #[test]
    fn test_dialect_gated_mnemonic() {
        // rldicl is a 64-bit form.
        let t = table();
        assert!(matches!(
            t.encode("rldicl", &[1, 2, 3, 4], BASE),
            Err(EncodeError::NoMatchingMnemonic { .. })
        ));
        assert!(t.encode("rldicl", &[1, 2, 3, 4], BASE | DialectSet::PPC64).is_ok());
    }

    #[test]
    fn test_optional_operand_defaults() {
        let t = table();
        let omitted = t.encode("wait", &[], BASE).unwrap();
        let explicit = t.encode("wait", &[0], BASE).unwrap();
        assert_eq!(omitted.bits, explicit.bits);

        // rfebb's optional operand documents default 1.
        let p9 = BASE | DialectSet::POWER9;
        let omitted = t.encode("rfebb", &[], p9).unwrap();
        let explicit = t.encode("rfebb", &[1], p9).unwrap();
        assert_eq!(omitted.bits, explicit.bits);
    }

    #[test]
    fn test_soft_warning_still_encodes() {
        // BO = 0b10110 sets reserved hint bits: warn, encode anyway.
        let enc = table().encode("bc", &[0x16, 0, 8], BASE).unwrap();
        assert_eq!(enc.warnings.len(), 1);
        assert_eq!(enc.bits & (0x1f << 21), 0x16 << 21);
    }

    #[test]
    fn test_hard_field_constraint() {
        let t = table();
        let p64 = BASE | DialectSet::PPC64;
        let err = t.encode("lq", &[5, 0x40, 9], p64).unwrap_err();
        assert!(matches!(err, EncodeError::FieldConstraintViolated { operand: 0, .. }));
        assert!(t.encode("lq", &[6, 0x40, 9], p64).is_ok());
    }

    #[test]
    fn test_prefixed_width() {
        let enc = table()
            .encode("paddi", &[3, 1, 0x12345], BASE | DialectSet::POWER10)
            .unwrap();
        assert_eq!(enc.width, ContainerWidth::Prefixed);
        assert_eq!(enc.bits >> 32 & 0xfc00_0000, 0x0400_0000);
    }
}
