//! CPU dialect tags and dialect sets.
//!
//! A dialect is a named subset of the Power family (64-bit, VLE, a vector
//! facility, an embedded-controller variant, ...). Opcode entries carry two
//! dialect sets: tags the active dialect must include, and tags it must not.
//! Exclusion always wins over inclusion.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of dialect tags.
///
/// Built by OR-ing the named constants. The empty set as a requirement means
/// "available everywhere"; the empty set as an exclusion means "excluded
/// nowhere".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialectSet(u32);

impl DialectSet {
    /// The empty set.
    pub const NONE: DialectSet = DialectSet(0);
    /// Base 32-bit architecture, always active on real cores.
    pub const BASE: DialectSet = DialectSet(1 << 0);
    /// 64-bit architecture.
    pub const PPC64: DialectSet = DialectSet(1 << 1);
    /// Variable-length encoding (2-byte and VLE-specific 4-byte forms).
    pub const VLE: DialectSet = DialectSet(1 << 2);
    /// AltiVec vector facility.
    pub const ALTIVEC: DialectSet = DialectSet(1 << 3);
    /// Vector-scalar extension.
    pub const VSX: DialectSet = DialectSet(1 << 4);
    /// Signal-processing engine (embedded).
    pub const SPE: DialectSet = DialectSet(1 << 5);
    /// Book E embedded environment.
    pub const BOOKE: DialectSet = DialectSet(1 << 6);
    /// ISA 3.0 additions.
    pub const POWER9: DialectSet = DialectSet(1 << 7);
    /// ISA 3.1 additions (prefixed instructions).
    pub const POWER10: DialectSet = DialectSet(1 << 8);

    /// Whether every tag in `self` is also in `other`.
    pub const fn is_subset(self, other: DialectSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Whether `self` and `other` share no tag.
    pub const fn is_disjoint(self, other: DialectSet) -> bool {
        self.0 & other.0 == 0
    }

    /// Whether the set holds no tags.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set union, usable in constant context.
    pub const fn union(self, other: DialectSet) -> DialectSet {
        DialectSet(self.0 | other.0)
    }
}

impl BitOr for DialectSet {
    type Output = DialectSet;

    fn bitor(self, rhs: DialectSet) -> DialectSet {
        self.union(rhs)
    }
}

impl BitOrAssign for DialectSet {
    fn bitor_assign(&mut self, rhs: DialectSet) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for DialectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(DialectSet, &str)] = &[
            (DialectSet::BASE, "BASE"),
            (DialectSet::PPC64, "PPC64"),
            (DialectSet::VLE, "VLE"),
            (DialectSet::ALTIVEC, "ALTIVEC"),
            (DialectSet::VSX, "VSX"),
            (DialectSet::SPE, "SPE"),
            (DialectSet::BOOKE, "BOOKE"),
            (DialectSet::POWER9, "POWER9"),
            (DialectSet::POWER10, "POWER10"),
        ];
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let mut first = true;
        for (tag, name) in NAMES {
            if tag.is_subset(*self) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset() {
        let active = DialectSet::BASE | DialectSet::PPC64;
        assert!(DialectSet::NONE.is_subset(active));
        assert!(DialectSet::PPC64.is_subset(active));
        assert!(!(DialectSet::PPC64 | DialectSet::VLE).is_subset(active));
    }

    #[test]
    fn test_disjoint() {
        let active = DialectSet::BASE | DialectSet::SPE;
        assert!(DialectSet::VLE.is_disjoint(active));
        assert!(!DialectSet::SPE.is_disjoint(active));
        assert!(DialectSet::NONE.is_disjoint(active));
    }

    #[test]
    fn test_debug_names() {
        let s = DialectSet::BASE | DialectSet::VLE;
        assert_eq!(format!("{s:?}"), "BASE|VLE");
        assert_eq!(format!("{:?}", DialectSet::NONE), "NONE");
    }
}
