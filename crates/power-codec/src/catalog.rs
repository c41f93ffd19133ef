//! Built-in demonstration subset of the instruction table.
//!
//! The engine is data-driven and open-ended; production tables hold hundreds
//! of rows built exactly like these. This subset exercises every engine
//! feature and doubles as the usage example:
//!
//! - `addi` / `subi`: plain and negated one-way immediates
//! - `mr` / `or`: extended mnemonic with a field-equality constraint
//! - `bc`: relative displacement with granularity, warn-but-encode hints
//! - `rfebb`, `wait`: optional operands with documented defaults
//! - `rldicl`: split shift amount within one word (64-bit dialect)
//! - `lq`: even register pair (hard constraint both directions)
//! - `lwz`: base-register indirection tags
//! - `se_add`, `e_li`: 2-byte form and chained split immediate (VLE)
//! - `evaddw`: embedded signal-processing dialect
//! - `paddi`: 8-byte prefixed form with a field split across both words

use crate::dialect::DialectSet;
use crate::error::TableError;
use crate::fields;
use crate::opcode::{ContainerWidth, OpcodeEntry, OpcodeTable};
use crate::operand::{FieldShift, Operand, OperandFlags, OperandRegistry};

// ---------------------------------------------------------------------------
//  Registry slots
// ---------------------------------------------------------------------------

pub const RT: u8 = 0;
pub const RA: u8 = 1;
pub const RB: u8 = 2;
pub const RS: u8 = 3;
pub const SI: u8 = 4;
pub const NSI: u8 = 5;
pub const D: u8 = 6;
pub const RAP: u8 = 7;
pub const RSB: u8 = 8;
pub const SH6: u8 = 9;
pub const MB6: u8 = 10;
pub const D34: u8 = 11;
pub const BD: u8 = 12;
pub const BO: u8 = 13;
pub const BI: u8 = 14;
pub const WC: u8 = 15;
pub const SXL: u8 = 16;
pub const RTQ: u8 = 17;
pub const DQ: u8 = 18;
pub const RX: u8 = 19;
pub const RY: u8 = 20;
pub const LI20: u8 = 21;
// Slot 22 is LI20's chained successor and is never referenced directly.

/// The operand descriptors backing the built-in entries.
pub fn builtin_registry() -> OperandRegistry {
    use FieldShift::{Custom, Left};
    use OperandFlags as F;

    OperandRegistry::new(vec![
        // RT: target register at bits 21-25.
        Operand::new(0x1f, Left(21), F::GPR),
        // RA: source register at bits 16-20; register zero reads as 0.
        Operand::new(0x1f, Left(16), F::GPR.union(F::GPR_0)),
        // RB: source register at bits 11-15.
        Operand::new(0x1f, Left(11), F::GPR),
        // RS: source register sharing the RT position.
        Operand::new(0x1f, Left(21), F::GPR),
        // SI: 16-bit signed immediate.
        Operand::new(0xffff, Left(0), F::SIGNED),
        // NSI: negated SI; assembler-only.
        Operand::with_hooks(
            0xffff,
            Custom,
            F::SIGNED.union(F::NEGATIVE),
            fields::insert_nsi,
            fields::extract_nsi,
        ),
        // D: 16-bit signed displacement.
        Operand::new(0xffff, Left(0), F::SIGNED),
        // RAP: base register written in parentheses.
        Operand::new(0x1f, Left(16), F::GPR.union(F::GPR_0).union(F::PARENS)),
        // RSB: register stored in both the RS and RB fields (mr).
        Operand::with_hooks(0x1f, Custom, F::GPR, fields::insert_rsb, fields::extract_rsb),
        // SH6: 6-bit shift split 5+1 within the word.
        Operand::with_hooks(0x3f, Custom, F::NONE, fields::insert_sh6, fields::extract_sh6),
        // MB6: 6-bit mask begin at bits 5-10.
        Operand::new(0x3f, Left(5), F::NONE),
        // D34: 34-bit displacement split across a prefixed container.
        Operand::with_hooks(
            0x3_ffff_ffff,
            Custom,
            F::SIGNED,
            fields::insert_d34,
            fields::extract_d34,
        ),
        // BD: 16-bit branch displacement in units of 4.
        Operand::new(0xfffc, Left(0), F::SIGNED.union(F::RELATIVE)),
        // BO: branch condition field; reserved combinations warn.
        Operand::with_hooks(0x1f, Left(21), F::NONE, fields::insert_bo, fields::extract_bo),
        // BI: condition register bit at bits 16-20.
        Operand::new(0x1f, Left(16), F::CR_BIT),
        // WC: wait condition hint; omitted means "no hint".
        Operand::new(0x3, Left(21), F::OPTIONAL).with_default(0),
        // SXL: rfebb state bit; the documented default is 1.
        Operand::new(0x1, Left(11), F::OPTIONAL).with_default(1),
        // RTQ: even register of a target pair.
        Operand::with_hooks(0x1f, Left(21), F::GPR, fields::insert_rtq, fields::extract_rtq),
        // DQ: 16-byte-aligned 16-bit displacement (low four bits implied).
        Operand::new(0xfff0, Left(0), F::SIGNED),
        // RX / RY: 4-bit registers of the 2-byte forms.
        Operand::new(0xf, Left(0), F::GPR),
        Operand::new(0xf, Left(4), F::GPR),
        // LI20: signed 20-bit immediate; value bits 16-19 chain into the
        // next slot's placement at container bits 17-20.
        Operand::new(0xf0000, Left(1), F::SIGNED.union(F::NEXT)),
        Operand::new(0xffff, Left(0), F::NONE),
    ])
}

// ---------------------------------------------------------------------------
//  Entries
// ---------------------------------------------------------------------------

/// The built-in entries, grouped by container width and ordered by primary
/// opcode, most specific first within a group.
pub fn builtin_entries() -> Vec<OpcodeEntry> {
    use ContainerWidth::{Half, Prefixed, Word};
    use DialectSet as DS;

    let e = OpcodeEntry::new;
    vec![
        // -- 2-byte forms ----------------------------------------------------
        e("se_add", Half, 0x4400, 0xff00, DS::VLE, DS::NONE, vec![RX, RY]),
        // -- 4-byte forms ----------------------------------------------------
        e("evaddw", Word, 0x1000_0200, 0xfc00_07ff, DS::SPE, DS::NONE, vec![RT, RA, RB]),
        e("addi", Word, 0x3800_0000, 0xfc00_0000, DS::NONE, DS::NONE, vec![RT, RA, SI]),
        e("subi", Word, 0x3800_0000, 0xfc00_0000, DS::NONE, DS::NONE, vec![RT, RA, NSI]),
        e("bc", Word, 0x4000_0000, 0xfc00_0003, DS::NONE, DS::VLE, vec![BO, BI, BD]),
        e("rfebb", Word, 0x4c00_0124, 0xffff_f7ff, DS::POWER9, DS::NONE, vec![SXL]),
        e("e_li", Word, 0x7000_0000, 0xfc01_0000, DS::VLE, DS::NONE, vec![RT, LI20]),
        e("rldicl", Word, 0x7800_0000, 0xfc00_001d, DS::PPC64, DS::NONE, vec![RA, RS, SH6, MB6]),
        // mr precedes or: identical fixed bits, stricter field constraint.
        e("mr", Word, 0x7c00_0378, 0xfc00_07ff, DS::NONE, DS::NONE, vec![RA, RSB]),
        e("or", Word, 0x7c00_0378, 0xfc00_07ff, DS::NONE, DS::NONE, vec![RA, RS, RB]),
        e("wait", Word, 0x7c00_003c, 0xff9f_ffff, DS::NONE, DS::NONE, vec![WC]),
        e("lwz", Word, 0x8000_0000, 0xfc00_0000, DS::NONE, DS::VLE, vec![RT, D, RAP]),
        e("lq", Word, 0xe000_0000, 0xfc00_000f, DS::PPC64, DS::NONE, vec![RTQ, DQ, RAP]),
        // -- 8-byte prefixed forms -------------------------------------------
        e(
            "paddi",
            Prefixed,
            0x0600_0000_3800_0000,
            0xfffc_0000_fc00_0000,
            DS::POWER10,
            DS::NONE,
            vec![RT, RA, D34],
        ),
    ]
}

/// Builds the demonstration table.
pub fn builtin_table() -> Result<OpcodeTable, TableError> {
    OpcodeTable::build(builtin_registry(), builtin_entries())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_validates() {
        let table = builtin_table().unwrap();
        assert_eq!(table.len(), builtin_entries().len());
    }

    #[test]
    fn test_mask_invariant_holds_for_every_entry() {
        for (i, e) in builtin_entries().iter().enumerate() {
            assert_eq!(e.base & !e.mask, 0, "entry {i} ({})", e.mnemonic);
        }
    }
}
