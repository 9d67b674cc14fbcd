//! Value-to-symbol registries with one-to-many aliasing.
//!
//! Architecture definitions supply thousands of numeric constants (registers, instruction
//! groups, condition codes) as flat `(value, name)` pairs. This module groups those pairs
//! into a [`crate::registry::SymbolRegistry`] once at construction time, so that every
//! lookup during decoding is a single hash probe — never a linear scan of the constant
//! table.
//!
//! A single numeric code may carry several names: the architectural register name plus a
//! calling-convention alias (`r13`/`sp` on ARM, `x30`/`lr` on AArch64). The registry
//! preserves all of them, in table order, as the code's *alias set*.
//!
//! # Lookup Policy
//!
//! Two resolution modes with deliberately different failure behavior:
//!
//! - [`crate::registry::SymbolRegistry::lookup_soft`] never fails. Unmapped codes resolve
//!   to the `{INVALID}` sentinel set — required for forward compatibility with register
//!   codes a newer engine emits that this build does not yet know.
//! - [`crate::registry::SymbolRegistry::lookup_hard`] fails loudly with
//!   [`crate::Error::UnknownDiscriminant`]. Reserved for values that select decode
//!   behavior, where guessing would corrupt the result.
//!
//! # Examples
//!
//! ```rust
//! use archscope::registry::{SymbolRegistry, INVALID_SYMBOL};
//!
//! let registry = SymbolRegistry::from_pairs("arm.reg", &[(13, "r13"), (13, "sp")]);
//!
//! assert_eq!(registry.lookup_soft(13), &["r13", "sp"]);
//! assert_eq!(registry.lookup_soft(99), &[INVALID_SYMBOL]);
//! assert_eq!(registry.lookup_hard(13)?, "r13");
//! assert!(registry.lookup_hard(99).is_err());
//! # Ok::<(), archscope::Error>(())
//! ```

use std::collections::HashMap;

use crate::{Error, Result};

/// The sentinel symbol returned by soft lookups for unmapped numeric codes.
pub const INVALID_SYMBOL: &str = "<invalid>";

/// The `{INVALID}` singleton alias set.
static INVALID_SYMBOLS: &[&str] = &[INVALID_SYMBOL];

/// A value-to-symbol-set lookup table supporting one-to-many aliasing.
///
/// Built once from the raw `(value, name)` pairs of an architecture definition and then
/// shared immutably by all decode calls (the per-architecture registries live behind
/// `OnceLock` statics in the arch modules).
///
/// # Examples
///
/// ```rust
/// use archscope::registry::SymbolRegistry;
///
/// let registry = SymbolRegistry::from_pairs("demo", &[(1, "a"), (2, "b"), (2, "b_alias")]);
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.lookup_soft(2), &["b", "b_alias"]);
/// ```
pub struct SymbolRegistry {
    /// Registry name, reported by hard-lookup failures
    name: &'static str,
    /// code -> alias set, aliases in table order
    symbols: HashMap<u32, Vec<&'static str>>,
}

impl SymbolRegistry {
    /// Build a registry by grouping raw `(value, name)` pairs into alias sets.
    ///
    /// Pairs sharing a value are grouped in table order; the first name registered for
    /// a value becomes its canonical symbol. Construction is the only pass over the
    /// full table — lookups afterwards are hash probes.
    ///
    /// # Arguments
    /// * `name` - Registry name, used as the schema name in hard-lookup errors
    /// * `pairs` - The raw constant table supplied by the architecture definition
    #[must_use]
    pub fn from_pairs(name: &'static str, pairs: &[(u32, &'static str)]) -> Self {
        let mut symbols: HashMap<u32, Vec<&'static str>> = HashMap::with_capacity(pairs.len());
        for &(value, symbol) in pairs {
            symbols.entry(value).or_default().push(symbol);
        }

        SymbolRegistry { name, symbols }
    }

    /// Resolve a numeric code to its full alias set, never failing.
    ///
    /// Returns every name registered for `code` in table order, or the `{INVALID}`
    /// singleton if the code is unmapped. Used for all display-oriented values
    /// (registers, groups, condition codes).
    #[must_use]
    pub fn lookup_soft(&self, code: u32) -> &[&'static str] {
        match self.symbols.get(&code) {
            Some(aliases) => aliases,
            None => INVALID_SYMBOLS,
        }
    }

    /// Resolve a numeric code to its canonical symbol, failing on unmapped codes.
    ///
    /// Used only for values with decode-selecting semantics; display-oriented values go
    /// through [`Self::lookup_soft`].
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownDiscriminant`] carrying the code and this
    /// registry's name if no symbol maps to `code`.
    pub fn lookup_hard(&self, code: u32) -> Result<&'static str> {
        match self.symbols.get(&code) {
            Some(aliases) => Ok(aliases[0]),
            None => Err(Error::UnknownDiscriminant {
                value: u64::from(code),
                schema: self.name,
            }),
        }
    }

    /// Returns `true` if a symbol is registered for `code`.
    #[must_use]
    pub fn contains(&self, code: u32) -> bool {
        self.symbols.contains_key(&code)
    }

    /// Number of distinct numeric codes in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the registry holds no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The registry's name as reported in hard-lookup errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SymbolRegistry {
        SymbolRegistry::from_pairs(
            "test.reg",
            &[(1, "r0"), (13, "r13"), (13, "sp"), (14, "r14"), (14, "lr")],
        )
    }

    #[test]
    fn soft_lookup_returns_full_alias_set() {
        let registry = sample();
        assert_eq!(registry.lookup_soft(13), &["r13", "sp"]);
        assert_eq!(registry.lookup_soft(14), &["r14", "lr"]);
    }

    #[test]
    fn soft_lookup_single_name() {
        let registry = sample();
        assert_eq!(registry.lookup_soft(1), &["r0"]);
    }

    #[test]
    fn soft_lookup_unmapped_yields_invalid_sentinel() {
        let registry = sample();
        assert_eq!(registry.lookup_soft(999), &[INVALID_SYMBOL]);
    }

    #[test]
    fn hard_lookup_returns_canonical_symbol() {
        let registry = sample();
        assert_eq!(registry.lookup_hard(13).unwrap(), "r13");
    }

    #[test]
    fn hard_lookup_unmapped_is_unknown_discriminant() {
        let registry = sample();
        match registry.lookup_hard(999) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 999);
                assert_eq!(schema, "test.reg");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn construction_groups_by_value() {
        let registry = sample();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(13));
        assert!(!registry.contains(2));
    }

    #[test]
    fn empty_registry() {
        let registry = SymbolRegistry::from_pairs("empty", &[]);
        assert!(registry.is_empty());
        assert_eq!(registry.lookup_soft(0), &[INVALID_SYMBOL]);
    }
}
