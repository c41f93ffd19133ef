//! Table-driven instruction field codec for the Power instruction set.
//!
//! The crate splits the problem the way hardware manuals do:
//!
//! - [`operand`]: field descriptors (width, placement, custom hooks, flags)
//!   collected in a shared registry that opcode entries reference by index.
//! - [`opcode`]: instruction variants (base pattern, match mask, dialect
//!   gating, operand references) validated once and frozen into an
//!   [`OpcodeTable`].
//! - [`encode`] / [`decode`]: the two directions over the same table.
//!   Encoding folds symbolic operand values into the container; decoding
//!   scans the primary-opcode group first-match in table order.
//! - [`dialect`]: architecture-subset tags gating which entries exist.
//! - [`fields`]: custom insert/extract functions for irregular fields.
//! - [`catalog`]: a built-in demonstration table exercising every feature.
//!
//! The table is immutable after construction, so one table serves any number
//! of threads concurrently.

pub mod catalog;
pub mod decode;
pub mod dialect;
pub mod encode;
pub mod error;
pub mod fields;
pub mod opcode;
pub mod operand;

pub use decode::Decoded;
pub use dialect::DialectSet;
pub use encode::Encoded;
pub use error::{DecodeError, EncodeError, TableError};
pub use opcode::{ContainerWidth, OpcodeEntry, OpcodeTable};
pub use operand::{ExtractFn, FieldShift, InsertFn, Operand, OperandFlags, OperandRegistry};
