//! Ordered decoding of wide status-flag bitmasks into named flag sets.
//!
//! Architectures report the status bits an instruction reads or modifies as a wide
//! bitmask (x86 EFLAGS, ARM CPSR, AArch64 NZCV). A [`crate::flags::FlagTable`] pairs each
//! bit position with its symbolic name and extracts, for any mask, the subsequence of
//! names whose bit is set — always in ascending bit-position order.
//!
//! Flag decoding has no error path: an all-zero mask yields an empty set, and bits
//! without a table entry are simply not named.
//!
//! # Examples
//!
//! ```rust
//! use archscope::flags::FlagTable;
//!
//! static TABLE: FlagTable = FlagTable::new("demo", &[(0, "CF"), (2, "PF"), (6, "ZF")]);
//!
//! assert_eq!(TABLE.decode(0b0100_0101), vec!["CF", "PF", "ZF"]);
//! assert!(TABLE.decode(0).is_empty());
//! ```

/// A static table mapping bit positions of a status mask to flag names.
///
/// Entries must be listed in ascending bit-position order; [`FlagTable::decode`] walks
/// the table once, so the output order is the table order.
pub struct FlagTable {
    /// Table name, for diagnostics and Display purposes
    name: &'static str,
    /// (bit position, flag name), ascending by bit position
    entries: &'static [(u8, &'static str)],
}

impl FlagTable {
    /// Create a table over a static `(bit, name)` list sorted ascending by bit.
    #[must_use]
    pub const fn new(name: &'static str, entries: &'static [(u8, &'static str)]) -> Self {
        FlagTable { name, entries }
    }

    /// Extract the named flags set in `mask`, in ascending bit-position order.
    ///
    /// Bits above position 63 cannot occur in a `u64` mask; tables for wider
    /// architecture masks split them across multiple fields upstream.
    #[must_use]
    pub fn decode(&self, mask: u64) -> Vec<&'static str> {
        debug_assert!(
            self.entries.windows(2).all(|pair| pair[0].0 < pair[1].0),
            "flag table '{}' must be sorted ascending by bit position",
            self.name
        );

        self.entries
            .iter()
            .filter(|(bit, _)| mask & (1u64 << bit) != 0)
            .map(|&(_, name)| name)
            .collect()
    }

    /// The table's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of named bits in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table names no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
