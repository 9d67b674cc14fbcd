//! ARM (A32/T32) operand and scalar-detail decoding.
//!
//! The ARM payload carries predication and processor-state scalars (condition code,
//! CPS mode/flag, memory-barrier kind) plus up to sixteen operand slots. Every slot
//! carries shared metadata — access flags, NEON vector-lane index, the subtracted flag
//! for pre-indexed addressing, and an optional barrel-shifter descriptor — alongside
//! its kind-selected payload.
//!
//! # Key Types
//! - [`ArmDetail`] - Decoded scalar fields and operands
//! - [`ArmOperand`] / [`ArmPayload`] - One operand slot and its closed payload set
//! - [`ArmShift`] - Barrel-shifter descriptor attached to an operand

use std::fmt;
use std::sync::OnceLock;

use crate::{
    detail::operand::{Access, Condition, MemoryRef, RegisterRef},
    record::{FloatWidth, IntWidth, Record},
    registry::SymbolRegistry,
    schema::{Field, TaggedSchema, VariantLayout},
    Error, Result,
};

/// Byte layout of the ARM detail payload, relative to the payload base.
pub mod layout {
    /// Condition code, `u8`
    pub const CC: usize = 0x00;
    /// Updates-flags boolean, `u8`
    pub const UPDATE_FLAGS: usize = 0x01;
    /// Usermode-registers boolean (LDM/STM `^` forms), `u8`
    pub const USERMODE: usize = 0x02;
    /// Memory barrier kind, `u8` (0 = none)
    pub const MEM_BARRIER: usize = 0x03;
    /// NEON vector element size, `i32`
    pub const VECTOR_SIZE: usize = 0x04;
    /// CPS mode field, `u32`
    pub const CPS_MODE: usize = 0x08;
    /// CPS flag field, `u32`
    pub const CPS_FLAG: usize = 0x0C;
    /// Declared operand count, `u8`
    pub const OP_COUNT: usize = 0x10;
    /// First operand slot
    pub const OPERANDS: usize = 0x14;
    /// Bytes per operand slot
    pub const OPERAND_STRIDE: usize = 28;
    /// Fixed number of operand slots
    pub const OPERAND_CAPACITY: usize = 16;
    /// Total payload size in bytes
    pub const SIZE: usize = OPERANDS + OPERAND_CAPACITY * OPERAND_STRIDE;

    /// Operand slot: kind discriminant, `u8`
    pub const OP_KIND: usize = 0x00;
    /// Operand slot: access flags, `u8`
    pub const OP_ACCESS: usize = 0x01;
    /// Operand slot: vector-lane index, `i8` (-1 = none)
    pub const OP_VECTOR_INDEX: usize = 0x02;
    /// Operand slot: subtracted boolean, `u8`
    pub const OP_SUBTRACTED: usize = 0x03;
    /// Operand slot: shift type, `u8` (0 = none)
    pub const OP_SHIFT_TYPE: usize = 0x04;
    /// Operand slot: shift amount or shift register code, `u32`
    pub const OP_SHIFT_VALUE: usize = 0x08;
    /// Operand slot: register code (REG/SYSREG kinds), `u32`
    pub const OP_REG: usize = 0x0C;
    /// Operand slot: immediate (IMM kind), `i32`
    pub const OP_IMM: usize = 0x0C;
    /// Operand slot: coprocessor immediate (CIMM/PIMM kinds), `u32`
    pub const OP_CIMM: usize = 0x0C;
    /// Operand slot: float immediate (FP kind), `f64`
    pub const OP_FP: usize = 0x0C;
    /// Operand slot: endianness selector (SETEND kind), `u8`
    pub const OP_SETEND: usize = 0x0C;
    /// Operand slot: base register (MEM kind), `u32`
    pub const OP_MEM_BASE: usize = 0x0C;
    /// Operand slot: index register (MEM kind), `u32`
    pub const OP_MEM_INDEX: usize = 0x10;
    /// Operand slot: index scale (MEM kind), `i32`
    pub const OP_MEM_SCALE: usize = 0x14;
    /// Operand slot: displacement (MEM kind), `i32`
    pub const OP_MEM_DISP: usize = 0x18;
}

/// Operand kind discriminant: register
pub const KIND_REG: u32 = 1;
/// Operand kind discriminant: immediate
pub const KIND_IMM: u32 = 2;
/// Operand kind discriminant: memory reference
pub const KIND_MEM: u32 = 3;
/// Operand kind discriminant: floating-point immediate
pub const KIND_FP: u32 = 4;
/// Operand kind discriminant: coprocessor register immediate
pub const KIND_CIMM: u32 = 5;
/// Operand kind discriminant: coprocessor number immediate
pub const KIND_PIMM: u32 = 6;
/// Operand kind discriminant: system register
pub const KIND_SYSREG: u32 = 7;
/// Operand kind discriminant: SETEND endianness selector
pub const KIND_SETEND: u32 = 8;

/// Register symbol table. Engine code -> name, one row per alias; codes with two rows
/// carry both the architectural name and the procedure-call-standard alias.
const REGISTERS: &[(u32, &str)] = &[
    (1, "r0"),
    (2, "r1"),
    (3, "r2"),
    (4, "r3"),
    (5, "r4"),
    (6, "r5"),
    (7, "r6"),
    (8, "r7"),
    (9, "r8"),
    (10, "r9"),
    (10, "sb"),
    (11, "r10"),
    (11, "sl"),
    (12, "r11"),
    (12, "fp"),
    (13, "r12"),
    (13, "ip"),
    (14, "r13"),
    (14, "sp"),
    (15, "r14"),
    (15, "lr"),
    (16, "r15"),
    (16, "pc"),
    (17, "cpsr"),
    (18, "spsr"),
    (19, "apsr"),
    (20, "fpscr"),
    (30, "s0"),
    (31, "s1"),
    (32, "s2"),
    (33, "s3"),
    (40, "d0"),
    (41, "d1"),
    (42, "d2"),
    (43, "d3"),
    (50, "q0"),
    (51, "q1"),
    (52, "q2"),
    (53, "q3"),
];

/// Instruction group symbol table.
const GROUPS: &[(u32, &str)] = &[
    (1, "jump"),
    (2, "call"),
    (3, "int"),
    (4, "privilege"),
    (5, "branch_relative"),
    (6, "arm"),
    (7, "thumb"),
    (8, "thumb2"),
    (9, "neon"),
    (10, "vfp2"),
    (11, "vfp3"),
    (12, "crypto"),
];

/// The ARM register registry (soft lookups, alias sets).
pub fn registers() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("arm.reg", REGISTERS))
}

/// The ARM instruction-group registry (soft lookups).
pub fn groups() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("arm.group", GROUPS))
}

/// Tagged-union layout of one ARM operand slot.
static OPERAND_SCHEMA: TaggedSchema = TaggedSchema {
    name: "arm.operand",
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
                fields: &[Field::int("imm", layout::OP_IMM, IntWidth::W32)],
            },
        ),
        (
            KIND_MEM,
            VariantLayout {
                name: "mem",
                fields: &[
                    Field::uint("base", layout::OP_MEM_BASE, IntWidth::W32),
                    Field::uint("index", layout::OP_MEM_INDEX, IntWidth::W32),
                    Field::int("scale", layout::OP_MEM_SCALE, IntWidth::W32),
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
                fields: &[Field::uint("imm", layout::OP_CIMM, IntWidth::W32)],
            },
        ),
        (
            KIND_PIMM,
            VariantLayout {
                name: "pimm",
                fields: &[Field::uint("imm", layout::OP_CIMM, IntWidth::W32)],
            },
        ),
        (
            KIND_SYSREG,
            VariantLayout {
                name: "sysreg",
                fields: &[Field::uint("reg", layout::OP_REG, IntWidth::W32)],
            },
        ),
        (
            KIND_SETEND,
            VariantLayout {
                name: "setend",
                fields: &[Field::uint("endian", layout::OP_SETEND, IntWidth::W8)],
            },
        ),
    ],
};

/// Endianness selected by a SETEND operand.
///
/// Display-oriented, so resolution is soft: values outside the two architectural
/// encodings decode to [`ArmEndian::Invalid`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArmEndian {
    /// Value outside the architectural set
    Invalid,
    /// Big-endian data accesses
    Be,
    /// Little-endian data accesses
    Le,
}

impl ArmEndian {
    /// Decode the SETEND selector byte, soft.
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            1 => ArmEndian::Be,
            2 => ArmEndian::Le,
            _ => ArmEndian::Invalid,
        }
    }
}

/// Memory barrier kind attached to DMB/DSB/ISB instructions.
///
/// Soft resolution; unknown encodings decode to [`MemBarrier::Invalid`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemBarrier {
    /// Value outside the architectural set
    Invalid,
    /// Full system, reads and writes
    Sy,
    /// Full system, writes only
    St,
    /// Full system, reads only
    Ld,
    /// Inner shareable, reads and writes
    Ish,
    /// Inner shareable, writes only
    Ishst,
    /// Inner shareable, reads only
    Ishld,
    /// Non-shareable, reads and writes
    Nsh,
    /// Non-shareable, writes only
    Nshst,
    /// Non-shareable, reads only
    Nshld,
    /// Outer shareable, reads and writes
    Osh,
    /// Outer shareable, writes only
    Oshst,
    /// Outer shareable, reads only
    Oshld,
}

impl MemBarrier {
    /// Decode the memory-barrier byte, soft. Returns `None` for 0 (no barrier).
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => return None,
            1 => MemBarrier::Sy,
            2 => MemBarrier::St,
            3 => MemBarrier::Ld,
            4 => MemBarrier::Ish,
            5 => MemBarrier::Ishst,
            6 => MemBarrier::Ishld,
            7 => MemBarrier::Nsh,
            8 => MemBarrier::Nshst,
            9 => MemBarrier::Nshld,
            10 => MemBarrier::Osh,
            11 => MemBarrier::Oshst,
            12 => MemBarrier::Oshld,
            _ => MemBarrier::Invalid,
        })
    }
}

/// Barrel-shifter operation applied to an operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArmShiftKind {
    /// Arithmetic shift right
    Asr,
    /// Logical shift left
    Lsl,
    /// Logical shift right
    Lsr,
    /// Rotate right
    Ror,
    /// Rotate right with extend
    Rrx,
}

/// A decoded barrel-shifter descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ArmShift {
    /// The shift operation
    pub kind: ArmShiftKind,
    /// Shift amount, or the shift register's code for register-shifted forms
    pub value: u32,
}

/// Decode the shift descriptor of an operand slot.
///
/// The shift type selects how the shift value is interpreted, so an unknown nonzero
/// type is a hard error — schema discriminant semantics, not display metadata.
fn decode_shift(record: &Record<'_>, slot_base: usize) -> Result<Option<ArmShift>> {
    let raw = record.read::<u8>(slot_base + layout::OP_SHIFT_TYPE)?;
    let kind = match raw {
        0 => return Ok(None),
        1 => ArmShiftKind::Asr,
        2 => ArmShiftKind::Lsl,
        3 => ArmShiftKind::Lsr,
        4 => ArmShiftKind::Ror,
        5 => ArmShiftKind::Rrx,
        other => {
            return Err(Error::UnknownDiscriminant {
                value: u64::from(other),
                schema: "arm.shift",
            })
        }
    };

    Ok(Some(ArmShift {
        kind,
        value: record.read::<u32>(slot_base + layout::OP_SHIFT_VALUE)?,
    }))
}

/// The payload of one ARM operand — a closed variant set.
#[derive(Debug, PartialEq)]
pub enum ArmPayload {
    /// A core/NEON register with its resolved alias set
    Register(RegisterRef),
    /// A system register (MSR/MRS forms)
    SystemRegister(RegisterRef),
    /// An immediate value
    Immediate(i64),
    /// A coprocessor register immediate (`c0`..`c15`)
    CImmediate(u32),
    /// A coprocessor number immediate (`p0`..`p15`)
    PImmediate(u32),
    /// A floating-point immediate
    FloatImmediate(f64),
    /// A memory reference
    Memory(MemoryRef),
    /// The endianness selected by SETEND
    Endianness(ArmEndian),
}

impl fmt::Display for ArmPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmPayload::Register(reg) | ArmPayload::SystemRegister(reg) => write!(f, "{reg}"),
            ArmPayload::Immediate(imm) => write!(f, "#{imm}"),
            ArmPayload::CImmediate(imm) => write!(f, "c{imm}"),
            ArmPayload::PImmediate(imm) => write!(f, "p{imm}"),
            ArmPayload::FloatImmediate(fp) => write!(f, "#{fp}"),
            ArmPayload::Memory(mem) => write!(f, "{mem}"),
            ArmPayload::Endianness(ArmEndian::Be) => f.write_str("be"),
            ArmPayload::Endianness(ArmEndian::Le) => f.write_str("le"),
            ArmPayload::Endianness(ArmEndian::Invalid) => f.write_str("<invalid>"),
        }
    }
}

/// One decoded ARM operand slot.
#[derive(Debug, PartialEq)]
pub struct ArmOperand {
    /// How the instruction accesses the operand
    pub access: Access,
    /// NEON vector-lane index, if the operand addresses a single lane
    pub vector_index: Option<u8>,
    /// Whether the index register is subtracted (pre-indexed `[rn, -rm]` forms)
    pub subtracted: bool,
    /// Barrel-shifter descriptor, if any
    pub shift: Option<ArmShift>,
    /// The operand's payload
    pub payload: ArmPayload,
}

/// Decoded ARM detail: predication and processor-state scalars plus operands.
#[derive(Debug)]
pub struct ArmDetail {
    /// Condition code the instruction executes under
    pub cc: Condition,
    /// Whether the instruction updates the status flags (`S` suffix)
    pub update_flags: bool,
    /// Whether LDM/STM transfer the user-mode register bank (`^` suffix)
    pub usermode: bool,
    /// Memory barrier kind, if the instruction is a barrier
    pub mem_barrier: Option<MemBarrier>,
    /// NEON vector element size in bits, 0 if not a vector form
    pub vector_size: i32,
    /// CPS instruction mode field
    pub cps_mode: u32,
    /// CPS instruction flag field
    pub cps_flag: u32,
    /// Decoded operands, exactly the declared count
    pub operands: Vec<ArmOperand>,
}

/// Decode the ARM payload of a detail record.
pub(crate) fn decode(record: &Record<'_>, base: usize) -> Result<ArmDetail> {
    Ok(ArmDetail {
        cc: Condition::from_raw(record.read::<u8>(base + layout::CC)?),
        update_flags: record.read::<u8>(base + layout::UPDATE_FLAGS)? != 0,
        usermode: record.read::<u8>(base + layout::USERMODE)? != 0,
        mem_barrier: MemBarrier::from_raw(record.read::<u8>(base + layout::MEM_BARRIER)?),
        vector_size: record.read::<i32>(base + layout::VECTOR_SIZE)?,
        cps_mode: record.read::<u32>(base + layout::CPS_MODE)?,
        cps_flag: record.read::<u32>(base + layout::CPS_FLAG)?,
        operands: decode_operands(record, base)?,
    })
}

fn decode_operands(record: &Record<'_>, base: usize) -> Result<Vec<ArmOperand>> {
    let count = record.read::<u8>(base + layout::OP_COUNT)? as usize;
    if count > layout::OPERAND_CAPACITY {
        return Err(malformed_error!(
            "arm operand count {} exceeds capacity {}",
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
fn decode_operand(record: &Record<'_>, slot_base: usize) -> Result<ArmOperand> {
    let variant = OPERAND_SCHEMA.read(record, slot_base)?;

    let payload = match variant.discriminant() as u32 {
        KIND_REG => ArmPayload::Register(RegisterRef::resolve(
            variant.uint("reg")? as u32,
            registers(),
        )),
        KIND_SYSREG => ArmPayload::SystemRegister(RegisterRef::resolve(
            variant.uint("reg")? as u32,
            registers(),
        )),
        KIND_IMM => ArmPayload::Immediate(variant.int("imm")?),
        KIND_CIMM => ArmPayload::CImmediate(variant.uint("imm")? as u32),
        KIND_PIMM => ArmPayload::PImmediate(variant.uint("imm")? as u32),
        KIND_FP => ArmPayload::FloatImmediate(variant.float("fp")?),
        KIND_SETEND => ArmPayload::Endianness(ArmEndian::from_raw(variant.uint("endian")?)),
        KIND_MEM => ArmPayload::Memory(MemoryRef {
            base: RegisterRef::resolve(variant.uint("base")? as u32, registers()),
            index: RegisterRef::resolve(variant.uint("index")? as u32, registers()),
            scale: variant.int("scale")? as i32,
            displacement: variant.int("disp")?,
        }),
        other => {
            return Err(malformed_error!(
                "arm operand schema produced unhandled variant {}",
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
    let subtracted = record.read::<u8>(slot_base + layout::OP_SUBTRACTED)? != 0;
    let shift = decode_shift(record, slot_base)?;

    Ok(ArmOperand {
        access,
        vector_index,
        subtracted,
        shift,
        payload,
    })
}
