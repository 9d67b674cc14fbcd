//! AArch64 (A64) operand and scalar-detail decoding.
//!
//! AArch64 has the deepest operand model of the supported architectures. Beyond
//! registers, immediates and memory references, a slot can hold a system operand (the
//! MSR/MRS/IC/DC/TLBI family), an SVE predicate, or an SME matrix operand — each of
//! which is itself a tagged union nested inside the operand union. The nesting is
//! expressed as nested [`crate::schema::TaggedSchema`] statics, so every level's
//! variant set is checked independently:
//!
//! - operand kind selects the payload ([`OPERAND_SCHEMA`])
//! - a system operand's sub-kind selects register, immediate, or alias form
//! - an alias system operand's category selects one of the fourteen alias namespaces
//! - an SME operand selects whole-tile or tile-slice form, and a tile slice selects
//!   an immediate or range slice offset
//!
//! # Key Types
//! - [`Aarch64Detail`] - Decoded scalar fields and operands
//! - [`Aarch64Operand`] / [`Aarch64Payload`] - One operand slot and its payload set
//! - [`SysOperand`] / [`SysAliasCategory`] - System-operand forms
//! - [`SmeOperand`] / [`SmeSliceOffset`] - SME matrix operand forms

use std::fmt;
use std::sync::OnceLock;

use strum::EnumIter;

use crate::{
    detail::operand::{Access, Condition, MemoryRef, RegisterRef},
    record::{FloatWidth, IntWidth, Record},
    registry::SymbolRegistry,
    schema::{DecodedVariant, Field, TaggedSchema, VariantLayout},
    Error, Result,
};

/// Byte layout of the AArch64 detail payload, relative to the payload base.
pub mod layout {
    /// Condition code, `u8`
    pub const CC: usize = 0x00;
    /// Updates-flags boolean, `u8`
    pub const UPDATE_FLAGS: usize = 0x01;
    /// Post-indexed addressing boolean, `u8`
    pub const POST_INDEX: usize = 0x02;
    /// Declared operand count, `u8`
    pub const OP_COUNT: usize = 0x04;
    /// First operand slot
    pub const OPERANDS: usize = 0x08;
    /// Bytes per operand slot
    pub const OPERAND_STRIDE: usize = 40;
    /// Fixed number of operand slots
    pub const OPERAND_CAPACITY: usize = 8;
    /// Total payload size in bytes
    pub const SIZE: usize = OPERANDS + OPERAND_CAPACITY * OPERAND_STRIDE;

    /// Operand slot: kind discriminant, `u8`
    pub const OP_KIND: usize = 0x00;
    /// Operand slot: access flags, `u8`
    pub const OP_ACCESS: usize = 0x01;
    /// Operand slot: vector-lane index, `i8` (-1 = none)
    pub const OP_VECTOR_INDEX: usize = 0x02;
    /// Operand slot: vector arrangement specifier, `u8` (0 = none)
    pub const OP_VAS: usize = 0x03;
    /// Operand slot: shift type, `u8` (0 = none)
    pub const OP_SHIFT_TYPE: usize = 0x04;
    /// Operand slot: extender, `u8` (0 = none)
    pub const OP_EXTENDER: usize = 0x05;
    /// Operand slot: shift amount, `u32`
    pub const OP_SHIFT_VALUE: usize = 0x08;
    /// Operand slot: start of the kind-selected payload
    pub const OP_PAYLOAD: usize = 0x0C;
    /// Operand slot: register code (REG kind), `u32`
    pub const OP_REG: usize = 0x0C;
    /// Operand slot: immediate (IMM/CIMM kinds), `i64`
    pub const OP_IMM: usize = 0x0C;
    /// Operand slot: float immediate (FP kind), `f64`
    pub const OP_FP: usize = 0x0C;
    /// Operand slot: base register (MEM kind), `u32`
    pub const OP_MEM_BASE: usize = 0x0C;
    /// Operand slot: index register (MEM kind), `u32`
    pub const OP_MEM_INDEX: usize = 0x10;
    /// Operand slot: displacement (MEM kind), `i32`
    pub const OP_MEM_DISP: usize = 0x14;
    /// System operand: sub-kind discriminant, relative to the payload
    pub const SYS_SUB_KIND: usize = 0x00;
    /// System operand: alias union, relative to the payload
    pub const SYS_ALIAS: usize = 0x01;
    /// System operand: register/immediate value, relative to the payload
    pub const SYS_VALUE: usize = 0x04;
    /// Alias system operand: category discriminant, relative to the alias union
    pub const SYS_ALIAS_CATEGORY: usize = 0x00;
    /// Alias system operand: operation value, relative to the alias union
    pub const SYS_ALIAS_VALUE: usize = 0x01;
    /// Predicate operand: predicate register, `u32`
    pub const PRED_REG: usize = 0x0C;
    /// Predicate operand: vector-select register, `u32`
    pub const PRED_VEC_SELECT: usize = 0x10;
    /// Predicate operand: element index, `i32` (-1 = none)
    pub const PRED_IMM_INDEX: usize = 0x14;
    /// SME operand: kind discriminant, relative to the payload
    pub const SME_KIND: usize = 0x00;
    /// SME operand: slice-offset kind discriminant, relative to the payload
    pub const SME_OFFSET_KIND: usize = 0x01;
    /// SME operand: tile register, relative to the payload, `u32`
    pub const SME_TILE: usize = 0x04;
    /// SME operand: slice index register, relative to the payload, `u32`
    pub const SME_SLICE_REG: usize = 0x08;
    /// SME operand: immediate slice offset, relative to the payload, `i8`
    pub const SME_OFFSET_IMM: usize = 0x0C;
    /// SME operand: range first element, relative to the payload, `i8`
    pub const SME_RANGE_FIRST: usize = 0x0D;
    /// SME operand: range offset, relative to the payload, `i8`
    pub const SME_RANGE_OFFSET: usize = 0x0E;
    /// SME operand: vertical-slice boolean, relative to the payload, `u8`
    pub const SME_VERTICAL: usize = 0x0F;
}

/// Operand kind discriminant: register
pub const KIND_REG: u32 = 1;
/// Operand kind discriminant: immediate
pub const KIND_IMM: u32 = 2;
/// Operand kind discriminant: memory reference
pub const KIND_MEM: u32 = 3;
/// Operand kind discriminant: floating-point immediate
pub const KIND_FP: u32 = 4;
/// Operand kind discriminant: C-immediate
pub const KIND_CIMM: u32 = 5;
/// Operand kind discriminant: system operand
pub const KIND_SYS: u32 = 6;
/// Operand kind discriminant: SVE predicate
pub const KIND_PRED: u32 = 7;
/// Operand kind discriminant: SME matrix operand
pub const KIND_SME: u32 = 8;

/// System-operand sub-kind: system register
pub const SYS_REG: u32 = 1;
/// System-operand sub-kind: immediate
pub const SYS_IMM: u32 = 2;
/// System-operand sub-kind: named alias operation
pub const SYS_ALIAS: u32 = 3;

/// SME operand kind: whole tile
pub const SME_TILE: u32 = 1;
/// SME operand kind: tile slice
pub const SME_TILE_SLICE: u32 = 2;

/// SME slice offset kind: single immediate
pub const SME_OFFSET_IMM: u32 = 1;
/// SME slice offset kind: element range
pub const SME_OFFSET_RANGE: u32 = 2;

/// Register symbol table. Engine code -> name, one row per alias; codes with two rows
/// carry both the architectural name and the procedure-call-standard alias.
const REGISTERS: &[(u32, &str)] = &[
    (1, "x0"),
    (2, "x1"),
    (3, "x2"),
    (4, "x3"),
    (5, "x4"),
    (6, "x5"),
    (7, "x6"),
    (8, "x7"),
    (9, "x8"),
    (10, "x9"),
    (11, "x10"),
    (12, "x11"),
    (13, "x12"),
    (14, "x13"),
    (15, "x14"),
    (16, "x15"),
    (17, "x16"),
    (18, "x17"),
    (19, "x18"),
    (20, "x19"),
    (21, "x20"),
    (22, "x21"),
    (23, "x22"),
    (24, "x23"),
    (25, "x24"),
    (26, "x25"),
    (27, "x26"),
    (28, "x27"),
    (29, "x28"),
    (30, "x29"),
    (30, "fp"),
    (31, "x30"),
    (31, "lr"),
    (32, "sp"),
    (33, "xzr"),
    (34, "wzr"),
    (35, "wsp"),
    (36, "nzcv"),
    (40, "v0"),
    (41, "v1"),
    (42, "v2"),
    (43, "v3"),
    (44, "v4"),
    (45, "v5"),
    (46, "v6"),
    (47, "v7"),
    (50, "z0"),
    (51, "z1"),
    (52, "z2"),
    (53, "z3"),
    (60, "p0"),
    (61, "p1"),
    (62, "p2"),
    (63, "p3"),
    (70, "za"),
    (71, "zab0"),
    (72, "zah0"),
    (73, "zah1"),
    (74, "zas0"),
    (75, "zas1"),
    (76, "zas2"),
    (77, "zas3"),
    (78, "zad0"),
    (79, "zad1"),
];

/// System register symbol table (MSR/MRS register space).
const SYS_REGISTERS: &[(u32, &str)] = &[
    (1, "midr_el1"),
    (2, "mpidr_el1"),
    (3, "sctlr_el1"),
    (4, "ttbr0_el1"),
    (5, "ttbr1_el1"),
    (6, "tcr_el1"),
    (7, "esr_el1"),
    (8, "far_el1"),
    (9, "vbar_el1"),
    (10, "spsr_el1"),
    (11, "elr_el1"),
    (12, "currentel"),
    (13, "tpidr_el0"),
    (14, "cntvct_el0"),
    (15, "cntfrq_el0"),
    (16, "dczid_el0"),
];

/// Instruction group symbol table.
const GROUPS: &[(u32, &str)] = &[
    (1, "jump"),
    (2, "call"),
    (3, "ret"),
    (4, "int"),
    (5, "privilege"),
    (6, "branch_relative"),
    (7, "neon"),
    (8, "fparmv8"),
    (9, "crypto"),
    (10, "sve"),
    (11, "sve2"),
    (12, "sme"),
    (13, "pauth"),
    (14, "mte"),
];

/// The AArch64 register registry (soft lookups, alias sets).
pub fn registers() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("aarch64.reg", REGISTERS))
}

/// The AArch64 system-register registry (soft lookups).
pub fn sys_registers() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("aarch64.sysreg", SYS_REGISTERS))
}

/// The AArch64 instruction-group registry (soft lookups).
pub fn groups() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("aarch64.group", GROUPS))
}

/// Inner union of an alias-form system operand: the category discriminant selects one
/// of the fourteen alias namespaces, each carrying the operation value.
static SYS_ALIAS_SCHEMA: TaggedSchema = TaggedSchema {
    name: "aarch64.sysop.alias",
    disc_offset: layout::SYS_ALIAS_CATEGORY,
    disc_width: IntWidth::W8,
    variants: &[
        (
            1,
            VariantLayout {
                name: "at",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            2,
            VariantLayout {
                name: "dc",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            3,
            VariantLayout {
                name: "ic",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            4,
            VariantLayout {
                name: "tlbi",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            5,
            VariantLayout {
                name: "tlbi_nxs",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            6,
            VariantLayout {
                name: "prfm",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            7,
            VariantLayout {
                name: "sve_prfm",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            8,
            VariantLayout {
                name: "barrier",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            9,
            VariantLayout {
                name: "dbnxs",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            10,
            VariantLayout {
                name: "isb",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            11,
            VariantLayout {
                name: "tsb",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            12,
            VariantLayout {
                name: "psb",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            13,
            VariantLayout {
                name: "bti",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
        (
            14,
            VariantLayout {
                name: "svc",
                fields: &[Field::uint("value", layout::SYS_ALIAS_VALUE, IntWidth::W16)],
            },
        ),
    ],
};

/// Union of the system-operand forms, nested inside the operand payload.
static SYS_SCHEMA: TaggedSchema = TaggedSchema {
    name: "aarch64.sysop",
    disc_offset: layout::SYS_SUB_KIND,
    disc_width: IntWidth::W8,
    variants: &[
        (
            SYS_REG,
            VariantLayout {
                name: "reg",
                fields: &[Field::uint("reg", layout::SYS_VALUE, IntWidth::W32)],
            },
        ),
        (
            SYS_IMM,
            VariantLayout {
                name: "imm",
                fields: &[Field::uint("imm", layout::SYS_VALUE, IntWidth::W32)],
            },
        ),
        (
            SYS_ALIAS,
            VariantLayout {
                name: "alias",
                fields: &[Field::nested("alias", layout::SYS_ALIAS, &SYS_ALIAS_SCHEMA)],
            },
        ),
    ],
};

/// Slice-offset union of an SME tile-slice operand. The discriminant sits one byte
/// past the SME kind byte, so the nested base is the SME payload itself.
static SME_OFFSET_SCHEMA: TaggedSchema = TaggedSchema {
    name: "aarch64.sme.offset",
    disc_offset: layout::SME_OFFSET_KIND,
    disc_width: IntWidth::W8,
    variants: &[
        (
            SME_OFFSET_IMM,
            VariantLayout {
                name: "imm",
                fields: &[Field::int("imm", layout::SME_OFFSET_IMM, IntWidth::W8)],
            },
        ),
        (
            SME_OFFSET_RANGE,
            VariantLayout {
                name: "range",
                fields: &[
                    Field::int("first", layout::SME_RANGE_FIRST, IntWidth::W8),
                    Field::int("offset", layout::SME_RANGE_OFFSET, IntWidth::W8),
                ],
            },
        ),
    ],
};

/// Union of the SME matrix operand forms, nested inside the operand payload.
static SME_SCHEMA: TaggedSchema = TaggedSchema {
    name: "aarch64.sme",
    disc_offset: layout::SME_KIND,
    disc_width: IntWidth::W8,
    variants: &[
        (
            SME_TILE,
            VariantLayout {
                name: "tile",
                fields: &[Field::uint("tile", layout::SME_TILE, IntWidth::W32)],
            },
        ),
        (
            SME_TILE_SLICE,
            VariantLayout {
                name: "tile_slice",
                fields: &[
                    Field::uint("tile", layout::SME_TILE, IntWidth::W32),
                    Field::uint("slice_reg", layout::SME_SLICE_REG, IntWidth::W32),
                    Field::nested("offset", 0, &SME_OFFSET_SCHEMA),
                    Field::uint("vertical", layout::SME_VERTICAL, IntWidth::W8),
                ],
            },
        ),
    ],
};

/// Tagged-union layout of one AArch64 operand slot.
static OPERAND_SCHEMA: TaggedSchema = TaggedSchema {
    name: "aarch64.operand",
    disc_offset: layout::OP_KIND,
    disc_width: IntWidth::W8,
    variants: &[
        (
            KIND_REG,
            VariantLayout {
                name: "reg",
                fields: &[Field::uint("reg", layout::OP_REG, IntWidth::W32)],
            },
        ),
        (
            KIND_IMM,
            VariantLayout {
                name: "imm",
                fields: &[Field::int("imm", layout::OP_IMM, IntWidth::W64)],
            },
        ),
        (
            KIND_MEM,
            VariantLayout {
                name: "mem",
                fields: &[
                    Field::uint("base", layout::OP_MEM_BASE, IntWidth::W32),
                    Field::uint("index", layout::OP_MEM_INDEX, IntWidth::W32),
                    Field::int("disp", layout::OP_MEM_DISP, IntWidth::W32),
                ],
            },
        ),
        (
            KIND_FP,
            VariantLayout {
                name: "fp",
                fields: &[Field::float("fp", layout::OP_FP, FloatWidth::F64)],
            },
        ),
        (
            KIND_CIMM,
            VariantLayout {
                name: "cimm",
                fields: &[Field::int("imm", layout::OP_IMM, IntWidth::W64)],
            },
        ),
        (
            KIND_SYS,
            VariantLayout {
                name: "sys",
                fields: &[Field::nested("sys", layout::OP_PAYLOAD, &SYS_SCHEMA)],
            },
        ),
        (
            KIND_PRED,
            VariantLayout {
                name: "pred",
                fields: &[
                    Field::uint("reg", layout::PRED_REG, IntWidth::W32),
                    Field::uint("vec_select", layout::PRED_VEC_SELECT, IntWidth::W32),
                    Field::int("imm_index", layout::PRED_IMM_INDEX, IntWidth::W32),
                ],
            },
        ),
        (
            KIND_SME,
            VariantLayout {
                name: "sme",
                fields: &[Field::nested("sme", layout::OP_PAYLOAD, &SME_SCHEMA)],
            },
        ),
    ],
};

/// Vector arrangement specifier attached to a NEON/SVE register operand.
///
/// Display-oriented, so resolution is soft: unknown specifiers decode to
/// [`VectorArrangement::Invalid`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VectorArrangement {
    /// Value outside the architectural set
    Invalid,
    /// 8 bytes
    B8,
    /// 16 bytes
    B16,
    /// 2 halfwords
    H2,
    /// 4 halfwords
    H4,
    /// 8 halfwords
    H8,
    /// 2 words
    S2,
    /// 4 words
    S4,
    /// 1 doubleword
    D1,
    /// 2 doublewords
    D2,
    /// 1 quadword
    Q1,
}

impl VectorArrangement {
    /// Decode the arrangement byte, soft. Returns `None` for 0 (no arrangement).
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => return None,
            1 => VectorArrangement::B8,
            2 => VectorArrangement::B16,
            3 => VectorArrangement::H2,
            4 => VectorArrangement::H4,
            5 => VectorArrangement::H8,
            6 => VectorArrangement::S2,
            7 => VectorArrangement::S4,
            8 => VectorArrangement::D1,
            9 => VectorArrangement::D2,
            10 => VectorArrangement::Q1,
            _ => VectorArrangement::Invalid,
        })
    }
}

/// Register extender applied to an operand (UXTB..SXTX family).
///
/// Display-oriented, so resolution is soft.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Extender {
    /// Value outside the architectural set
    Invalid,
    /// Unsigned extend byte
    Uxtb,
    /// Unsigned extend halfword
    Uxth,
    /// Unsigned extend word
    Uxtw,
    /// Unsigned extend doubleword
    Uxtx,
    /// Signed extend byte
    Sxtb,
    /// Signed extend halfword
    Sxth,
    /// Signed extend word
    Sxtw,
    /// Signed extend doubleword
    Sxtx,
}

impl Extender {
    /// Decode the extender byte, soft. Returns `None` for 0 (no extender).
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => return None,
            1 => Extender::Uxtb,
            2 => Extender::Uxth,
            3 => Extender::Uxtw,
            4 => Extender::Uxtx,
            5 => Extender::Sxtb,
            6 => Extender::Sxth,
            7 => Extender::Sxtw,
            8 => Extender::Sxtx,
            _ => Extender::Invalid,
        })
    }
}

/// Shift operation applied to an operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Aarch64ShiftKind {
    /// Logical shift left
    Lsl,
    /// Masking shift left (vector immediates)
    Msl,
    /// Logical shift right
    Lsr,
    /// Arithmetic shift right
    Asr,
    /// Rotate right
    Ror,
}

/// A decoded shift descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Aarch64Shift {
    /// The shift operation
    pub kind: Aarch64ShiftKind,
    /// Shift amount
    pub value: u32,
}

/// The fourteen alias namespaces an alias-form system operand can belong to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter)]
pub enum SysAliasCategory {
    /// Address translation operations
    At,
    /// Data cache maintenance operations
    Dc,
    /// Instruction cache maintenance operations
    Ic,
    /// TLB invalidate operations
    Tlbi,
    /// TLB invalidate, non-XS variants
    TlbiNxs,
    /// Prefetch memory operations
    Prfm,
    /// SVE prefetch operations
    SvePrfm,
    /// Barrier operations
    Barrier,
    /// Barrier operations, non-XS variants
    Dbnxs,
    /// Instruction synchronization barrier options
    Isb,
    /// Trace synchronization barrier options
    Tsb,
    /// Profiling synchronization barrier options
    Psb,
    /// Branch target identification hints
    Bti,
    /// Supervisor call immediates
    Svc,
}

impl SysAliasCategory {
    fn from_variant(name: &str) -> Result<Self> {
        Ok(match name {
            "at" => SysAliasCategory::At,
            "dc" => SysAliasCategory::Dc,
            "ic" => SysAliasCategory::Ic,
            "tlbi" => SysAliasCategory::Tlbi,
            "tlbi_nxs" => SysAliasCategory::TlbiNxs,
            "prfm" => SysAliasCategory::Prfm,
            "sve_prfm" => SysAliasCategory::SvePrfm,
            "barrier" => SysAliasCategory::Barrier,
            "dbnxs" => SysAliasCategory::Dbnxs,
            "isb" => SysAliasCategory::Isb,
            "tsb" => SysAliasCategory::Tsb,
            "psb" => SysAliasCategory::Psb,
            "bti" => SysAliasCategory::Bti,
            "svc" => SysAliasCategory::Svc,
            other => {
                return Err(malformed_error!(
                    "alias schema produced unhandled category variant '{}'",
                    other
                ))
            }
        })
    }
}

/// A decoded system operand.
#[derive(Debug, PartialEq)]
pub enum SysOperand {
    /// A system register, resolved against the system-register registry
    Register(RegisterRef),
    /// A raw system immediate
    Immediate(u32),
    /// A named operation alias within one of the alias categories
    Alias {
        /// The alias namespace the operation belongs to
        category: SysAliasCategory,
        /// The operation's value within its namespace
        value: u16,
    },
}

/// A decoded SVE predicate operand.
#[derive(Debug, PartialEq)]
pub struct PredicateOperand {
    /// The predicate register
    pub reg: RegisterRef,
    /// Vector-select register for predicate-as-counter forms, id 0 if absent
    pub vec_select: RegisterRef,
    /// Element index into the predicate, if present
    pub imm_index: Option<i32>,
}

/// Offset of an SME tile slice.
#[derive(Debug, PartialEq)]
pub enum SmeSliceOffset {
    /// A single slice element
    Immediate(i8),
    /// A contiguous element range
    Range {
        /// First element of the range
        first: i8,
        /// Distance to the last element
        offset: i8,
    },
}

/// A decoded SME matrix operand.
#[derive(Debug, PartialEq)]
pub enum SmeOperand {
    /// A whole ZA tile
    Tile(RegisterRef),
    /// A single slice (or slice range) of a tile
    TileSlice {
        /// The tile being sliced
        tile: RegisterRef,
        /// The slice index register
        slice_reg: RegisterRef,
        /// The slice offset
        offset: SmeSliceOffset,
        /// Whether the slice is vertical rather than horizontal
        vertical: bool,
    },
}

/// The payload of one AArch64 operand — a closed variant set.
#[derive(Debug, PartialEq)]
pub enum Aarch64Payload {
    /// A register with its resolved alias set
    Register(RegisterRef),
    /// An immediate value
    Immediate(i64),
    /// A C-immediate
    CImmediate(i64),
    /// A floating-point immediate
    FloatImmediate(f64),
    /// A memory reference
    Memory(MemoryRef),
    /// A system operand
    System(SysOperand),
    /// An SVE predicate operand
    Predicate(PredicateOperand),
    /// An SME matrix operand
    SmeMatrix(SmeOperand),
}

impl fmt::Display for Aarch64Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aarch64Payload::Register(reg) => write!(f, "{reg}"),
            Aarch64Payload::Immediate(imm) | Aarch64Payload::CImmediate(imm) => {
                write!(f, "#{imm}")
            }
            Aarch64Payload::FloatImmediate(fp) => write!(f, "#{fp}"),
            Aarch64Payload::Memory(mem) => write!(f, "{mem}"),
            Aarch64Payload::System(SysOperand::Register(reg)) => write!(f, "{reg}"),
            Aarch64Payload::System(SysOperand::Immediate(imm)) => write!(f, "#{imm}"),
            Aarch64Payload::System(SysOperand::Alias { category, value }) => {
                write!(f, "{category:?}:{value}")
            }
            Aarch64Payload::Predicate(pred) => write!(f, "{}", pred.reg),
            Aarch64Payload::SmeMatrix(SmeOperand::Tile(tile)) => write!(f, "{tile}"),
            Aarch64Payload::SmeMatrix(SmeOperand::TileSlice { tile, .. }) => {
                write!(f, "{tile}[..]")
            }
        }
    }
}

/// One decoded AArch64 operand slot.
#[derive(Debug, PartialEq)]
pub struct Aarch64Operand {
    /// How the instruction accesses the operand
    pub access: Access,
    /// Vector-lane index, if the operand addresses a single lane
    pub vector_index: Option<u8>,
    /// Vector arrangement specifier, if any
    pub arrangement: Option<VectorArrangement>,
    /// Shift descriptor, if any
    pub shift: Option<Aarch64Shift>,
    /// Register extender, if any
    pub extender: Option<Extender>,
    /// The operand's payload
    pub payload: Aarch64Payload,
}

/// Decoded AArch64 detail: predication scalars plus operands.
#[derive(Debug)]
pub struct Aarch64Detail {
    /// Condition code the instruction executes under
    pub cc: Condition,
    /// Whether the instruction updates the NZCV flags
    pub update_flags: bool,
    /// Whether the instruction uses post-indexed addressing
    pub post_index: bool,
    /// Decoded operands, exactly the declared count
    pub operands: Vec<Aarch64Operand>,
}

/// Decode the AArch64 payload of a detail record.
pub(crate) fn decode(record: &Record<'_>, base: usize) -> Result<Aarch64Detail> {
    Ok(Aarch64Detail {
        cc: Condition::from_raw(record.read::<u8>(base + layout::CC)?),
        update_flags: record.read::<u8>(base + layout::UPDATE_FLAGS)? != 0,
        post_index: record.read::<u8>(base + layout::POST_INDEX)? != 0,
        operands: decode_operands(record, base)?,
    })
}

fn decode_operands(record: &Record<'_>, base: usize) -> Result<Vec<Aarch64Operand>> {
    let count = record.read::<u8>(base + layout::OP_COUNT)? as usize;
    if count > layout::OPERAND_CAPACITY {
        return Err(malformed_error!(
            "aarch64 operand count {} exceeds capacity {}",
            count,
            layout::OPERAND_CAPACITY
        ));
    }

    let mut operands = Vec::with_capacity(count);
    for slot in 0..count {
        let slot_base = base + layout::OPERANDS + slot * layout::OPERAND_STRIDE;
        operands.push(decode_operand(record, slot_base)?);
    }

    Ok(operands)
}

#[allow(clippy::cast_possible_truncation)]
fn decode_operand(record: &Record<'_>, slot_base: usize) -> Result<Aarch64Operand> {
    let variant = OPERAND_SCHEMA.read(record, slot_base)?;

    let payload = match variant.discriminant() as u32 {
        KIND_REG => Aarch64Payload::Register(RegisterRef::resolve(
            variant.uint("reg")? as u32,
            registers(),
        )),
        KIND_IMM => Aarch64Payload::Immediate(variant.int("imm")?),
        KIND_CIMM => Aarch64Payload::CImmediate(variant.int("imm")?),
        KIND_FP => Aarch64Payload::FloatImmediate(variant.float("fp")?),
        KIND_MEM => Aarch64Payload::Memory(MemoryRef {
            base: RegisterRef::resolve(variant.uint("base")? as u32, registers()),
            index: RegisterRef::resolve(variant.uint("index")? as u32, registers()),
            scale: 1,
            displacement: variant.int("disp")?,
        }),
        KIND_SYS => Aarch64Payload::System(decode_sys(variant.nested("sys")?)?),
        KIND_PRED => Aarch64Payload::Predicate(PredicateOperand {
            reg: RegisterRef::resolve(variant.uint("reg")? as u32, registers()),
            vec_select: RegisterRef::resolve(variant.uint("vec_select")? as u32, registers()),
            imm_index: match variant.int("imm_index")? {
                index if index < 0 => None,
                index => Some(index as i32),
            },
        }),
        KIND_SME => Aarch64Payload::SmeMatrix(decode_sme(variant.nested("sme")?)?),
        other => {
            return Err(malformed_error!(
                "aarch64 operand schema produced unhandled variant {}",
                other
            ))
        }
    };

    // Shared slot metadata, present regardless of kind
    let access = Access::from_raw(record.read::<u8>(slot_base + layout::OP_ACCESS)?);
    let vector_index = match record.read::<i8>(slot_base + layout::OP_VECTOR_INDEX)? {
        index if index < 0 => None,
        index => Some(index as u8),
    };
    let arrangement = VectorArrangement::from_raw(record.read::<u8>(slot_base + layout::OP_VAS)?);
    let shift = decode_shift(record, slot_base)?;
    let extender = Extender::from_raw(record.read::<u8>(slot_base + layout::OP_EXTENDER)?);

    Ok(Aarch64Operand {
        access,
        vector_index,
        arrangement,
        shift,
        extender,
        payload,
    })
}

/// Decode the shift descriptor of an operand slot.
///
/// The shift type selects how the shift value is interpreted, so an unknown nonzero
/// type is a hard error.
fn decode_shift(record: &Record<'_>, slot_base: usize) -> Result<Option<Aarch64Shift>> {
    let raw = record.read::<u8>(slot_base + layout::OP_SHIFT_TYPE)?;
    let kind = match raw {
        0 => return Ok(None),
        1 => Aarch64ShiftKind::Lsl,
        2 => Aarch64ShiftKind::Msl,
        3 => Aarch64ShiftKind::Lsr,
        4 => Aarch64ShiftKind::Asr,
        5 => Aarch64ShiftKind::Ror,
        other => {
            return Err(Error::UnknownDiscriminant {
                value: u64::from(other),
                schema: "aarch64.shift",
            })
        }
    };

    Ok(Some(Aarch64Shift {
        kind,
        value: record.read::<u32>(slot_base + layout::OP_SHIFT_VALUE)?,
    }))
}

#[allow(clippy::cast_possible_truncation)]
fn decode_sys(sys: &DecodedVariant) -> Result<SysOperand> {
    Ok(match sys.discriminant() as u32 {
        SYS_REG => SysOperand::Register(RegisterRef::resolve(
            sys.uint("reg")? as u32,
            sys_registers(),
        )),
        SYS_IMM => SysOperand::Immediate(sys.uint("imm")? as u32),
        SYS_ALIAS => {
            let alias = sys.nested("alias")?;
            SysOperand::Alias {
                category: SysAliasCategory::from_variant(alias.variant())?,
                value: alias.uint("value")? as u16,
            }
        }
        other => {
            return Err(malformed_error!(
                "system-operand schema produced unhandled variant {}",
                other
            ))
        }
    })
}

#[allow(clippy::cast_possible_truncation)]
fn decode_sme(sme: &DecodedVariant) -> Result<SmeOperand> {
    Ok(match sme.discriminant() as u32 {
        SME_TILE => SmeOperand::Tile(RegisterRef::resolve(sme.uint("tile")? as u32, registers())),
        SME_TILE_SLICE => {
            let offset_variant = sme.nested("offset")?;
            let offset = match offset_variant.discriminant() as u32 {
                SME_OFFSET_IMM => SmeSliceOffset::Immediate(offset_variant.int("imm")? as i8),
                SME_OFFSET_RANGE => SmeSliceOffset::Range {
                    first: offset_variant.int("first")? as i8,
                    offset: offset_variant.int("offset")? as i8,
                },
                other => {
                    return Err(malformed_error!(
                        "sme-offset schema produced unhandled variant {}",
                        other
                    ))
                }
            };

            SmeOperand::TileSlice {
                tile: RegisterRef::resolve(sme.uint("tile")? as u32, registers()),
                slice_reg: RegisterRef::resolve(sme.uint("slice_reg")? as u32, registers()),
                offset,
                vertical: sme.uint("vertical")? != 0,
            }
        }
        other => {
            return Err(malformed_error!(
                "sme schema produced unhandled variant {}",
                other
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        detail::{decode_detail, Arch, ArchDetail},
        test::DetailRecordBuilder,
    };
    use strum::IntoEnumIterator;

    fn aarch64_detail(data: &[u8]) -> Aarch64Detail {
        match decode_detail(data, Arch::Aarch64).unwrap().arch {
            ArchDetail::Aarch64(detail) => detail,
            other => panic!("Expected AArch64 detail, got {other:?}"),
        }
    }

    #[test]
    fn register_operand_carries_alias_set() {
        let data = DetailRecordBuilder::aarch64()
            .a64_reg_op(0, 31, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::Register(reg) => assert_eq!(reg.names, &["x30", "lr"]),
            other => panic!("Expected register payload, got {other:?}"),
        }
    }

    #[test]
    fn memory_operand_has_unit_scale() {
        let data = DetailRecordBuilder::aarch64()
            .a64_mem_op(0, 32, 1, 16, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::Memory(mem) => {
                assert_eq!(mem.base.name(), "sp");
                assert_eq!(mem.index.name(), "x0");
                assert_eq!(mem.scale, 1);
                assert_eq!(mem.displacement, 16);
            }
            other => panic!("Expected memory payload, got {other:?}"),
        }
    }

    #[test]
    fn immediate_and_float_operands() {
        let data = DetailRecordBuilder::aarch64()
            .a64_imm_op(0, -64, Access::READ.bits())
            .a64_fp_op(1, 0.5, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        assert_eq!(detail.operands[0].payload, Aarch64Payload::Immediate(-64));
        assert_eq!(
            detail.operands[1].payload,
            Aarch64Payload::FloatImmediate(0.5)
        );
    }

    #[test]
    fn unknown_operand_kind_is_fatal() {
        let data = DetailRecordBuilder::aarch64()
            .a64_reg_op(0, 1, Access::READ.bits())
            .a64_kind(0, 200)
            .build();

        match decode_detail(&data, Arch::Aarch64) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 200);
                assert_eq!(schema, "aarch64.operand");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn sys_operand_immediate_form() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sys_imm_op(0, 5, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        assert_eq!(
            detail.operands[0].payload,
            Aarch64Payload::System(SysOperand::Immediate(5))
        );
    }

    #[test]
    fn sys_operand_register_form() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sys_reg_op(0, 3, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::System(SysOperand::Register(reg)) => {
                assert_eq!(reg.name(), "sctlr_el1");
            }
            other => panic!("Expected system register, got {other:?}"),
        }
    }

    #[test]
    fn sys_operand_alias_form() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sys_alias_op(0, 4, 0x1F, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        assert_eq!(
            detail.operands[0].payload,
            Aarch64Payload::System(SysOperand::Alias {
                category: SysAliasCategory::Tlbi,
                value: 0x1F,
            })
        );
    }

    #[test]
    fn every_alias_category_decodes() {
        for (raw, expected) in (1u8..=14).zip(SysAliasCategory::iter()) {
            let data = DetailRecordBuilder::aarch64()
                .a64_sys_alias_op(0, raw, 1, Access::READ.bits())
                .build();

            let detail = aarch64_detail(&data);
            match &detail.operands[0].payload {
                Aarch64Payload::System(SysOperand::Alias { category, .. }) => {
                    assert_eq!(*category, expected);
                }
                other => panic!("Expected alias operand, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_alias_category_is_fatal() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sys_alias_op(0, 15, 1, Access::READ.bits())
            .build();

        match decode_detail(&data, Arch::Aarch64) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 15);
                assert_eq!(schema, "aarch64.sysop.alias");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn unknown_sys_sub_kind_is_fatal() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sys_raw_op(0, 9, Access::READ.bits())
            .build();

        match decode_detail(&data, Arch::Aarch64) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 9);
                assert_eq!(schema, "aarch64.sysop");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn predicate_operand() {
        let data = DetailRecordBuilder::aarch64()
            .a64_pred_op(0, 60, 61, 2, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::Predicate(pred) => {
                assert_eq!(pred.reg.name(), "p0");
                assert_eq!(pred.vec_select.name(), "p1");
                assert_eq!(pred.imm_index, Some(2));
            }
            other => panic!("Expected predicate payload, got {other:?}"),
        }
    }

    #[test]
    fn sme_tile_operand() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sme_tile_op(0, 70, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::SmeMatrix(SmeOperand::Tile(tile)) => assert_eq!(tile.name(), "za"),
            other => panic!("Expected SME tile, got {other:?}"),
        }
    }

    #[test]
    fn sme_tile_slice_with_range_offset() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sme_slice_range_op(0, 74, 13, 0, 3, true, Access::WRITE.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::SmeMatrix(SmeOperand::TileSlice {
                tile,
                slice_reg,
                offset,
                vertical,
            }) => {
                assert_eq!(tile.name(), "zas0");
                assert_eq!(slice_reg.name(), "x12");
                assert_eq!(*offset, SmeSliceOffset::Range { first: 0, offset: 3 });
                assert!(*vertical);
            }
            other => panic!("Expected SME tile slice, got {other:?}"),
        }
    }

    #[test]
    fn sme_tile_slice_with_immediate_offset() {
        let data = DetailRecordBuilder::aarch64()
            .a64_sme_slice_imm_op(0, 72, 13, 5, false, Access::READ.bits())
            .build();

        let detail = aarch64_detail(&data);
        match &detail.operands[0].payload {
            Aarch64Payload::SmeMatrix(SmeOperand::TileSlice {
                offset, vertical, ..
            }) => {
                assert_eq!(*offset, SmeSliceOffset::Immediate(5));
                assert!(!*vertical);
            }
            other => panic!("Expected SME tile slice, got {other:?}"),
        }
    }

    #[test]
    fn shared_metadata_on_register_operand() {
        let data = DetailRecordBuilder::aarch64()
            .a64_reg_op(0, 40, Access::READ.bits())
            .a64_op_meta(0, 1, 6, 1, 3, 8)
            .build();

        let detail = aarch64_detail(&data);
        let operand = &detail.operands[0];
        assert_eq!(operand.vector_index, Some(1));
        assert_eq!(operand.arrangement, Some(VectorArrangement::S2));
        assert_eq!(
            operand.shift,
            Some(Aarch64Shift {
                kind: Aarch64ShiftKind::Lsl,
                value: 8
            })
        );
        assert_eq!(operand.extender, Some(Extender::Uxtw));
    }

    #[test]
    fn unknown_shift_type_is_fatal() {
        let data = DetailRecordBuilder::aarch64()
            .a64_reg_op(0, 1, Access::READ.bits())
            .a64_op_meta(0, -1, 0, 7, 0, 1)
            .build();

        match decode_detail(&data, Arch::Aarch64) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 7);
                assert_eq!(schema, "aarch64.shift");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn scalar_fields() {
        let data = DetailRecordBuilder::aarch64().a64_scalars(2, true, true).build();

        let detail = aarch64_detail(&data);
        assert_eq!(detail.cc, Condition::Ne);
        assert!(detail.update_flags);
        assert!(detail.post_index);
    }

    #[test]
    fn arrangement_and_extender_soft_decode() {
        assert_eq!(VectorArrangement::from_raw(0), None);
        assert_eq!(VectorArrangement::from_raw(2), Some(VectorArrangement::B16));
        assert_eq!(
            VectorArrangement::from_raw(200),
            Some(VectorArrangement::Invalid)
        );
        assert_eq!(Extender::from_raw(0), None);
        assert_eq!(Extender::from_raw(8), Some(Extender::Sxtx));
        assert_eq!(Extender::from_raw(99), Some(Extender::Invalid));
    }
}
