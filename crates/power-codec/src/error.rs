//! Error taxonomy for table construction, encoding, and decoding.

use thiserror::Error;

use crate::opcode::ContainerWidth;

/// A table or registry record failed validation at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("descriptor {index}: mask {mask:#x} is not a contiguous bit run")]
    NonContiguousMask { index: usize, mask: u64 },

    #[error("descriptor {index}: positionless placement requires custom insert and extract")]
    MissingCustomHooks { index: usize },

    #[error("descriptor {index}: chained slot has no successor in the registry")]
    ChainWithoutSuccessor { index: usize },

    #[error("descriptor {index}: chained slots must use generic placement")]
    ChainedCustom { index: usize },

    #[error("entry {index} ({mnemonic}): mask trims base bits")]
    MaskTrimsBase { index: usize, mnemonic: String },

    #[error("entry {index} ({mnemonic}): operand index {operand} out of registry range")]
    BadOperandIndex { index: usize, mnemonic: String, operand: u8 },

    #[error("entry {index} ({mnemonic}): operand {position} overlaps fixed bits or another field")]
    OperandOverlap { index: usize, mnemonic: String, position: usize },

    #[error("entry {index} ({mnemonic}): non-optional operand {position} follows an optional one")]
    OptionalOrder { index: usize, mnemonic: String, position: usize },

    #[error("entry {index} ({mnemonic}): primary opcode bits not covered by mask")]
    PrimaryNotInMask { index: usize, mnemonic: String },

    #[error("entry {index} ({mnemonic}): primary opcode out of order for its container width")]
    PrimaryOrder { index: usize, mnemonic: String },
}

/// Hard failure while encoding one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{mnemonic} expects {expected} operand(s), got {got}")]
    WrongOperandCount { mnemonic: String, expected: usize, got: usize },

    #[error("operand {operand}: value {value} outside range [{min}, {max}]")]
    OperandOutOfRange { operand: usize, value: i64, min: i64, max: i64 },

    #[error("operand {operand}: {message}")]
    FieldConstraintViolated { operand: usize, message: String },

    #[error("no form of {mnemonic} is available in the active dialect")]
    NoMatchingMnemonic { mnemonic: String },
}

/// Decode scanned the whole table without a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized {width} encoding {bits:#x}")]
    UnrecognizedEncoding { bits: u64, width: ContainerWidth },
}
