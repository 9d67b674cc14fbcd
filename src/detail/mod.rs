//! Instruction-detail decoding for the supported architectures.
//!
//! This module turns one raw, fixed-layout detail record — the per-instruction metadata
//! block emitted by a native disassembly engine — into the safe, owned
//! [`InstructionDetail`] structure: register read/write sets, group membership, the
//! writeback flag, and the architecture-specific operand list.
//!
//! # Architecture
//!
//! Decoding is a single-pass, stateless transform:
//!
//! 1. The common header (register sets, groups, writeback) is read as plain bounded
//!    arrays — a declared count over the fixed capacity is malformed input
//! 2. The [`Arch`] tag selects the operand decoder through an exhaustive `match` over
//!    the closed architecture set — adding an architecture is a compile-time change
//! 3. Each architecture module decodes its scalar fields and operand slots, driving
//!    the tagged-union schemas in [`crate::schema`]
//!
//! # Key Types
//! - [`Arch`] - The closed set of supported architectures
//! - [`InstructionDetail`] - Decoded register sets, groups, and arch payload
//! - [`ArchDetail`] - Closed enum over the per-architecture detail structures
//!
//! # Main Functions
//! - [`decode_detail`] - Decode a single raw detail record
//!
//! # Example
//! ```rust,no_run
//! use archscope::{decode_detail, Arch};
//!
//! # let raw_record: Vec<u8> = Vec::new();
//! let detail = decode_detail(&raw_record, Arch::X86)?;
//! println!(
//!     "reads {} registers, writes {}",
//!     detail.regs_read.len(),
//!     detail.regs_write.len()
//! );
//! # Ok::<(), archscope::Error>(())
//! ```

pub mod aarch64;
pub mod arm;
mod operand;
pub mod x86;

use std::fmt;

use strum::{EnumCount, EnumIter};

use crate::{record::Record, Error, Result};

pub use aarch64::{
    Aarch64Detail, Aarch64Operand, Aarch64Payload, Aarch64Shift, Aarch64ShiftKind, Extender,
    PredicateOperand, SmeOperand, SmeSliceOffset, SysAliasCategory, SysOperand,
    VectorArrangement,
};
pub use arm::{ArmDetail, ArmEndian, ArmOperand, ArmPayload, ArmShift, ArmShiftKind, MemBarrier};
pub use operand::{Access, Condition, MemoryRef, RegisterRef};
pub use x86::{X86Detail, X86Operand, X86Payload};

/// Byte layout of the common detail header.
///
/// These offsets are the pinned wire contract shared with the disassembly engine; an
/// engine version that moves a field requires a new layout module, not a decode change.
/// The architecture payload described by the arch modules' own `layout` tables begins
/// at [`layout::ARCH_DETAIL`].
pub mod layout {
    /// Registers read, `u16` each
    pub const REGS_READ: usize = 0x00;
    /// Fixed capacity of the regs-read array
    pub const REGS_READ_CAPACITY: usize = 16;
    /// Declared regs-read count, `u8`
    pub const REGS_READ_COUNT: usize = 0x20;
    /// Registers written, `u16` each
    pub const REGS_WRITE: usize = 0x21;
    /// Fixed capacity of the regs-write array
    pub const REGS_WRITE_CAPACITY: usize = 20;
    /// Declared regs-write count, `u8`
    pub const REGS_WRITE_COUNT: usize = 0x49;
    /// Instruction groups, `u8` each
    pub const GROUPS: usize = 0x4A;
    /// Fixed capacity of the groups array
    pub const GROUPS_CAPACITY: usize = 8;
    /// Declared group count, `u8`
    pub const GROUPS_COUNT: usize = 0x52;
    /// Writeback flag, `u8` boolean
    pub const WRITEBACK: usize = 0x53;
    /// Start of the architecture-specific payload
    pub const ARCH_DETAIL: usize = 0x54;
}

/// The closed set of architectures this crate can decode detail records for.
///
/// Numeric tag values match the engine's architecture numbering; tags the engine
/// defines for architectures without a decoder here are rejected with
/// [`crate::Error::UnsupportedArchitecture`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount)]
#[repr(u32)]
pub enum Arch {
    /// ARM (A32/T32)
    Arm = 0,
    /// AArch64 (A64)
    Aarch64 = 1,
    /// x86 / x86-64
    X86 = 3,
}

impl Arch {
    /// Map the engine's numeric architecture tag onto the closed [`Arch`] set.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedArchitecture`] for tags without a decoder.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Arch::Arm),
            1 => Ok(Arch::Aarch64),
            3 => Ok(Arch::X86),
            _ => Err(Error::UnsupportedArchitecture(tag)),
        }
    }

    /// The engine's numeric tag for this architecture.
    #[must_use]
    pub fn tag(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
            Arch::X86 => "x86",
        })
    }
}

/// The architecture-specific half of a decoded detail record.
#[derive(Debug)]
pub enum ArchDetail {
    /// x86 / x86-64 detail
    X86(X86Detail),
    /// ARM detail
    Arm(ArmDetail),
    /// AArch64 detail
    Aarch64(Aarch64Detail),
}

impl ArchDetail {
    /// The architecture this payload was decoded for.
    #[must_use]
    pub fn arch(&self) -> Arch {
        match self {
            ArchDetail::X86(_) => Arch::X86,
            ArchDetail::Arm(_) => Arch::Arm,
            ArchDetail::Aarch64(_) => Arch::Aarch64,
        }
    }

    /// Number of decoded operands, regardless of architecture.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        match self {
            ArchDetail::X86(detail) => detail.operands.len(),
            ArchDetail::Arm(detail) => detail.operands.len(),
            ArchDetail::Aarch64(detail) => detail.operands.len(),
        }
    }
}

/// Everything a detail record says about one disassembled instruction.
///
/// All fields are plain owned values; nothing borrows the raw record the structure was
/// decoded from.
#[derive(Debug)]
pub struct InstructionDetail {
    /// Registers the instruction reads (implicit and explicit), engine register ids
    pub regs_read: Vec<u16>,
    /// Registers the instruction writes, engine register ids
    pub regs_write: Vec<u16>,
    /// Instruction group ids the instruction belongs to
    pub groups: Vec<u8>,
    /// Whether the instruction updates a base register after the access
    pub writeback: bool,
    /// The architecture-specific payload (operands and scalar fields)
    pub arch: ArchDetail,
}

/// Decode one raw detail record into an [`InstructionDetail`].
///
/// The record must be laid out per the versioned layout contract of [`layout`] and the
/// architecture modules; it is only read, never held onto — the returned structure owns
/// all of its data.
///
/// # Arguments
/// * `data` - The raw detail record for a single instruction
/// * `arch` - The architecture the record was produced for
///
/// # Errors
/// - [`crate::Error::Truncated`] if the record is shorter than its layout requires
/// - [`crate::Error::UnknownDiscriminant`] if an operand kind or sub-kind is unknown
/// - [`crate::Error::Malformed`] if a declared count exceeds its array capacity
///
/// # Examples
///
/// ```rust,no_run
/// use archscope::{decode_detail, Arch, ArchDetail};
///
/// # let raw_record: Vec<u8> = Vec::new();
/// let detail = decode_detail(&raw_record, Arch::Aarch64)?;
/// if let ArchDetail::Aarch64(aarch64) = &detail.arch {
///     println!("{} operands", aarch64.operands.len());
/// }
/// # Ok::<(), archscope::Error>(())
/// ```
pub fn decode_detail(data: &[u8], arch: Arch) -> Result<InstructionDetail> {
    let record = Record::new(data);

    let regs_read = read_bounded::<u16>(
        &record,
        layout::REGS_READ,
        layout::REGS_READ_COUNT,
        layout::REGS_READ_CAPACITY,
        "regs_read",
    )?;
    let regs_write = read_bounded::<u16>(
        &record,
        layout::REGS_WRITE,
        layout::REGS_WRITE_COUNT,
        layout::REGS_WRITE_CAPACITY,
        "regs_write",
    )?;
    let groups = read_bounded::<u8>(
        &record,
        layout::GROUPS,
        layout::GROUPS_COUNT,
        layout::GROUPS_CAPACITY,
        "groups",
    )?;
    let writeback = record.read::<u8>(layout::WRITEBACK)? != 0;

    let arch = match arch {
        Arch::X86 => ArchDetail::X86(x86::decode(&record, layout::ARCH_DETAIL)?),
        Arch::Arm => ArchDetail::Arm(arm::decode(&record, layout::ARCH_DETAIL)?),
        Arch::Aarch64 => ArchDetail::Aarch64(aarch64::decode(&record, layout::ARCH_DETAIL)?),
    };

    Ok(InstructionDetail {
        regs_read,
        regs_write,
        groups,
        writeback,
        arch,
    })
}

/// Read a fixed-capacity array bounded by its declared count.
///
/// Reads exactly `count` elements; slots past the declared count are never touched.
fn read_bounded<T: crate::record::LeValue>(
    record: &Record<'_>,
    array_offset: usize,
    count_offset: usize,
    capacity: usize,
    what: &str,
) -> Result<Vec<T>> {
    let count = record.read::<u8>(count_offset)? as usize;
    if count > capacity {
        return Err(malformed_error!(
            "declared {} count {} exceeds capacity {}",
            what,
            count,
            capacity
        ));
    }

    record.read_array::<T>(array_offset, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::DetailRecordBuilder;
    use strum::IntoEnumIterator;

    #[test]
    fn arch_tag_round_trip() {
        for arch in Arch::iter() {
            assert_eq!(Arch::from_tag(arch.tag()).unwrap(), arch);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        match Arch::from_tag(2) {
            Err(Error::UnsupportedArchitecture(tag)) => assert_eq!(tag, 2),
            other => panic!("Expected UnsupportedArchitecture, got {other:?}"),
        }
    }

    #[test]
    fn header_register_and_group_sets() {
        let data = DetailRecordBuilder::x86()
            .regs_read(&[8, 7])
            .regs_write(&[8])
            .groups(&[3])
            .writeback(true)
            .build();

        let detail = decode_detail(&data, Arch::X86).unwrap();
        assert_eq!(detail.regs_read, vec![8, 7]);
        assert_eq!(detail.regs_write, vec![8]);
        assert_eq!(detail.groups, vec![3]);
        assert!(detail.writeback);
    }

    #[test]
    fn declared_count_over_capacity_is_malformed() {
        let mut data = DetailRecordBuilder::x86().build();
        data[layout::REGS_READ_COUNT] = (layout::REGS_READ_CAPACITY + 1) as u8;

        assert!(matches!(
            decode_detail(&data, Arch::X86),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated_header_is_truncated_error() {
        let data = [0u8; 10];
        assert!(matches!(
            decode_detail(&data, Arch::X86),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn empty_operand_record_decodes_for_every_arch() {
        for arch in Arch::iter() {
            let data = match arch {
                Arch::X86 => DetailRecordBuilder::x86().build(),
                Arch::Arm => DetailRecordBuilder::arm().build(),
                Arch::Aarch64 => DetailRecordBuilder::aarch64().build(),
            };

            let detail = decode_detail(&data, arch).unwrap();
            assert_eq!(detail.arch.arch(), arch);
            assert_eq!(detail.arch.operand_count(), 0);
        }
    }
}
