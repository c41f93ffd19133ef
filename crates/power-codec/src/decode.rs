//! Bits -> symbolic form (the disassembly matcher).
//!
//! Scans the primary-opcode group for the container width in table order:
//! fixed bits first, then the dialect gate, then every operand extraction.
//! An extraction that flags itself invalid rejects the candidate and the
//! scan continues: that is how extended mnemonics with field-equality
//! constraints and assembler-only forms lose to (or beat) the general form.
//! Only exhaustion of the table is an error; the caller may retry the raw
//! byte stream at a different container width.

use tracing::trace;

use crate::dialect::DialectSet;
use crate::error::DecodeError;
use crate::opcode::{ContainerWidth, OpcodeTable};
use crate::operand::OperandFlags;

/// A successful decode: the mnemonic and its operand values, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub mnemonic: &'static str,
    pub operands: Vec<i64>,
}

impl OpcodeTable {
    /// Decodes `bits` as one instruction of the given container width.
    pub fn decode(
        &self,
        bits: u64,
        width: ContainerWidth,
        active: DialectSet,
    ) -> Result<Decoded, DecodeError> {
        let bits = bits & width.value_mask();
        let group = self
            .primary_group(width, width.primary(bits))
            .unwrap_or(&[]);

        'candidates: for &i in group {
            let entry = &self.entries()[i];
            if bits & entry.mask != entry.base {
                continue;
            }
            if !entry.dialect_ok(active) {
                continue;
            }

            let mut operands = Vec::with_capacity(entry.operands.len());
            for &r in &entry.operands {
                match self.extract_operand(bits, r as usize, active) {
                    Some(value) => operands.push(value),
                    None => {
                        trace!(mnemonic = entry.mnemonic, "candidate rejected by field validity");
                        continue 'candidates;
                    }
                }
            }
            return Ok(Decoded { mnemonic: entry.mnemonic, operands });
        }

        Err(DecodeError::UnrecognizedEncoding { bits, width })
    }

    /// Extracts one logical operand, or `None` when the descriptor marks the
    /// pattern invalid for this entry.
    fn extract_operand(&self, bits: u64, slot: usize, active: DialectSet) -> Option<i64> {
        let registry = self.registry();
        let op = &registry[slot];

        if let Some(extract) = op.extract {
            let mut invalid = false;
            let value = extract(bits, active, &mut invalid);
            return (!invalid).then_some(value);
        }

        // Generic path; a chained pair ORs its raw portions before sign
        // handling over the combined width.
        let mut raw = op.take_raw(bits);
        let mut mask = op.mask;
        if op.flags.contains(OperandFlags::NEXT) {
            let next = &registry[slot + 1];
            raw |= next.take_raw(bits);
            mask |= next.mask;
        }
        Some(op.adjust_decode(raw, mask))
    }
}
