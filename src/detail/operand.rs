//! Operand building blocks shared by all architecture decoders.
//!
//! This module defines the pieces every architecture's operand model is assembled from:
//! access flags, resolved register references with their alias sets, and the common
//! memory-reference shape. The per-architecture operand types themselves live in the
//! sibling arch modules, since each architecture's payload set is closed and distinct.

use std::fmt;

use bitflags::bitflags;

use crate::registry::SymbolRegistry;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    /// How an instruction accesses one operand
    pub struct Access: u8 {
        /// Operand is read
        const READ = 0x01;
        /// Operand is written
        const WRITE = 0x02;
    }
}

impl Access {
    /// Extract access flags from the raw record byte.
    ///
    /// Unknown bits are dropped rather than rejected; access is display-oriented
    /// metadata, not a discriminant.
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        Self::from_bits_truncate(raw)
    }
}

/// A register operand resolved against its architecture's symbol registry.
///
/// Carries the raw numeric code together with the full alias set registered for it —
/// a code shared by an architectural name and a calling-convention alias yields both
/// (`r13`/`sp`), in table order. Unmapped codes resolve to the `{INVALID}` sentinel
/// set and id `0` means "no register" (an absent memory index, for example); neither
/// is an error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegisterRef {
    /// The numeric register code as read from the record
    pub id: u32,
    /// All symbolic names registered for the code, canonical name first
    pub names: &'static [&'static str],
}

impl RegisterRef {
    /// Resolve a raw register code through a soft registry lookup.
    #[must_use]
    pub fn resolve(id: u32, registry: &'static SymbolRegistry) -> Self {
        RegisterRef {
            id,
            names: registry.lookup_soft(id),
        }
    }

    /// The canonical (first-registered) name for this register.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    /// Returns `true` unless the code is the "no register" placeholder `0`.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.id != 0
    }
}

impl fmt::Display for RegisterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Condition code attached to a predicated ARM or AArch64 instruction.
///
/// Condition codes are display-oriented metadata, so resolution is soft: a raw value
/// outside the architectural set decodes to [`Condition::Invalid`] rather than failing
/// the record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
    /// No condition / value outside the architectural set
    Invalid,
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Unsigned higher or same (carry set)
    Hs,
    /// Unsigned lower (carry clear)
    Lo,
    /// Minus / negative
    Mi,
    /// Plus / positive or zero
    Pl,
    /// Overflow
    Vs,
    /// No overflow
    Vc,
    /// Unsigned higher
    Hi,
    /// Unsigned lower or same
    Ls,
    /// Signed greater than or equal
    Ge,
    /// Signed less than
    Lt,
    /// Signed greater than
    Gt,
    /// Signed less than or equal
    Le,
    /// Always
    Al,
}

impl Condition {
    /// Decode the condition-code byte of a detail record, soft.
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Condition::Eq,
            2 => Condition::Ne,
            3 => Condition::Hs,
            4 => Condition::Lo,
            5 => Condition::Mi,
            6 => Condition::Pl,
            7 => Condition::Vs,
            8 => Condition::Vc,
            9 => Condition::Hi,
            10 => Condition::Ls,
            11 => Condition::Ge,
            12 => Condition::Lt,
            13 => Condition::Gt,
            14 => Condition::Le,
            15 => Condition::Al,
            _ => Condition::Invalid,
        }
    }
}

/// A decoded memory operand: `[base + index * scale + displacement]`.
///
/// Absent base or index registers carry id `0`. Architectures without a scale field
/// report scale `1`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MemoryRef {
    /// Base register, id 0 if absent
    pub base: RegisterRef,
    /// Index register, id 0 if absent
    pub index: RegisterRef,
    /// Multiplier applied to the index register
    pub scale: i32,
    /// Constant displacement added to the address
    pub displacement: i64,
}

impl fmt::Display for MemoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut wrote = false;

        if self.base.is_present() {
            write!(f, "{}", self.base)?;
            wrote = true;
        }
        if self.index.is_present() {
            if wrote {
                write!(f, " + ")?;
            }
            write!(f, "{}", self.index)?;
            if self.scale != 1 {
                write!(f, "*{}", self.scale)?;
            }
            wrote = true;
        }
        if self.displacement != 0 || !wrote {
            if wrote {
                write!(f, " + ")?;
            }
            write!(f, "{:#x}", self.displacement)?;
        }

        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{SymbolRegistry, INVALID_SYMBOL};
    use std::sync::OnceLock;

    fn registry() -> &'static SymbolRegistry {
        static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
        REGISTRY
            .get_or_init(|| SymbolRegistry::from_pairs("test.reg", &[(13, "r13"), (13, "sp")]))
    }

    #[test]
    fn access_from_raw_drops_unknown_bits() {
        assert_eq!(Access::from_raw(0x01), Access::READ);
        assert_eq!(Access::from_raw(0x83), Access::READ | Access::WRITE);
        assert!(Access::from_raw(0x80).is_empty());
    }

    #[test]
    fn register_ref_resolves_alias_set() {
        let reg = RegisterRef::resolve(13, registry());
        assert_eq!(reg.names, &["r13", "sp"]);
        assert_eq!(reg.name(), "r13");
        assert_eq!(reg.to_string(), "r13");
    }

    #[test]
    fn register_ref_unmapped_is_invalid_not_error() {
        let reg = RegisterRef::resolve(400, registry());
        assert_eq!(reg.names, &[INVALID_SYMBOL]);
        assert!(reg.is_present());
    }

    #[test]
    fn register_ref_zero_is_absent() {
        let reg = RegisterRef::resolve(0, registry());
        assert!(!reg.is_present());
    }

    #[test]
    fn condition_soft_decode() {
        assert_eq!(Condition::from_raw(1), Condition::Eq);
        assert_eq!(Condition::from_raw(15), Condition::Al);
        assert_eq!(Condition::from_raw(0), Condition::Invalid);
        assert_eq!(Condition::from_raw(200), Condition::Invalid);
    }

    #[test]
    fn memory_ref_display() {
        let mem = MemoryRef {
            base: RegisterRef::resolve(13, registry()),
            index: RegisterRef::resolve(0, registry()),
            scale: 1,
            displacement: 8,
        };
        assert_eq!(mem.to_string(), "[r13 + 0x8]");
    }
}
