//! x86 / x86-64 operand and scalar-detail decoding.
//!
//! The x86 payload of a detail record carries the instruction's encoding scalars
//! (prefixes, opcode bytes, REX, ModRM, SIB, displacement), the affected EFLAGS mask,
//! and up to eight operand slots. Each slot is a tagged union over the x86 operand
//! kinds; the layout is described by [`OPERAND_SCHEMA`] and pinned by [`layout`].
//!
//! # Key Types
//! - [`X86Detail`] - Decoded scalar fields, flag set, and operands
//! - [`X86Operand`] / [`X86Payload`] - One operand slot and its closed payload set
//!
//! Register and group codes resolve through the module's symbol registries
//! ([`registers`], [`groups`]) with soft lookup semantics: codes this build does not
//! know decode to the INVALID sentinel instead of failing the record.

use std::fmt;
use std::sync::OnceLock;

use crate::{
    detail::operand::{Access, MemoryRef, RegisterRef},
    flags::FlagTable,
    record::{FloatWidth, IntWidth, Record},
    registry::SymbolRegistry,
    schema::{Field, TaggedSchema, VariantLayout},
    Result,
};

/// Byte layout of the x86 detail payload, relative to the payload base.
pub mod layout {
    /// Instruction prefix bytes
    pub const PREFIX: usize = 0x00;
    /// Number of prefix bytes
    pub const PREFIX_LEN: usize = 4;
    /// Opcode bytes
    pub const OPCODE: usize = 0x04;
    /// Number of opcode bytes
    pub const OPCODE_LEN: usize = 4;
    /// REX byte (0 if absent)
    pub const REX: usize = 0x08;
    /// Effective address size in bytes
    pub const ADDR_SIZE: usize = 0x09;
    /// ModRM byte
    pub const MODRM: usize = 0x0A;
    /// SIB byte
    pub const SIB: usize = 0x0B;
    /// Displacement, `i64`
    pub const DISP: usize = 0x0C;
    /// Affected EFLAGS bitmask, `u64`
    pub const EFLAGS: usize = 0x14;
    /// Declared operand count, `u8`
    pub const OP_COUNT: usize = 0x1C;
    /// First operand slot
    pub const OPERANDS: usize = 0x20;
    /// Bytes per operand slot
    pub const OPERAND_STRIDE: usize = 32;
    /// Fixed number of operand slots
    pub const OPERAND_CAPACITY: usize = 8;
    /// Total payload size in bytes
    pub const SIZE: usize = OPERANDS + OPERAND_CAPACITY * OPERAND_STRIDE;

    /// Operand slot: kind discriminant, `u8`
    pub const OP_KIND: usize = 0x00;
    /// Operand slot: access flags, `u8`
    pub const OP_ACCESS: usize = 0x01;
    /// Operand slot: operand size in bytes, `u8`
    pub const OP_SIZE: usize = 0x02;
    /// Operand slot: register code (REG kind), `u32`
    pub const OP_REG: usize = 0x04;
    /// Operand slot: immediate (IMM kind), `i64`
    pub const OP_IMM: usize = 0x04;
    /// Operand slot: float immediate (FP kind), `f64`
    pub const OP_FP: usize = 0x04;
    /// Operand slot: segment register (MEM kind), `u32`
    pub const OP_MEM_SEGMENT: usize = 0x04;
    /// Operand slot: base register (MEM kind), `u32`
    pub const OP_MEM_BASE: usize = 0x08;
    /// Operand slot: index register (MEM kind), `u32`
    pub const OP_MEM_INDEX: usize = 0x0C;
    /// Operand slot: index scale (MEM kind), `i32`
    pub const OP_MEM_SCALE: usize = 0x10;
    /// Operand slot: displacement (MEM kind), `i64`
    pub const OP_MEM_DISP: usize = 0x14;
}

/// Operand kind discriminant: register
pub const KIND_REG: u32 = 1;
/// Operand kind discriminant: immediate
pub const KIND_IMM: u32 = 2;
/// Operand kind discriminant: memory reference
pub const KIND_MEM: u32 = 3;
/// Operand kind discriminant: floating-point immediate
pub const KIND_FP: u32 = 4;

/// Register symbol table. Engine code -> name, one row per alias.
const REGISTERS: &[(u32, &str)] = &[
    (1, "rax"),
    (2, "rbx"),
    (3, "rcx"),
    (4, "rdx"),
    (5, "rsi"),
    (6, "rdi"),
    (7, "rbp"),
    (8, "rsp"),
    (9, "r8"),
    (10, "r9"),
    (11, "r10"),
    (12, "r11"),
    (13, "r12"),
    (14, "r13"),
    (15, "r14"),
    (16, "r15"),
    (17, "rip"),
    (18, "eax"),
    (19, "ebx"),
    (20, "ecx"),
    (21, "edx"),
    (22, "esi"),
    (23, "edi"),
    (24, "ebp"),
    (25, "esp"),
    (26, "ax"),
    (27, "bx"),
    (28, "cx"),
    (29, "dx"),
    (30, "al"),
    (31, "ah"),
    (32, "bl"),
    (33, "bh"),
    (34, "cl"),
    (35, "ch"),
    (36, "dl"),
    (37, "dh"),
    (38, "es"),
    (39, "cs"),
    (40, "ss"),
    (41, "ds"),
    (42, "fs"),
    (43, "gs"),
    (44, "eflags"),
    (45, "xmm0"),
    (46, "xmm1"),
    (47, "xmm2"),
    (48, "xmm3"),
    (49, "xmm4"),
    (50, "xmm5"),
    (51, "xmm6"),
    (52, "xmm7"),
    (53, "st0"),
    (54, "st1"),
    (55, "st2"),
    (56, "st3"),
    (57, "st4"),
    (58, "st5"),
    (59, "st6"),
    (60, "st7"),
];

/// Instruction group symbol table.
const GROUPS: &[(u32, &str)] = &[
    (1, "jump"),
    (2, "call"),
    (3, "ret"),
    (4, "int"),
    (5, "iret"),
    (6, "privilege"),
    (7, "branch_relative"),
    (8, "vm"),
    (9, "sse1"),
    (10, "sse2"),
    (11, "avx"),
    (12, "mode32"),
    (13, "mode64"),
];

/// Names for the EFLAGS bits reported in the detail payload.
static EFLAGS_TABLE: FlagTable = FlagTable::new(
    "x86.eflags",
    &[
        (0, "CF"),
        (2, "PF"),
        (4, "AF"),
        (6, "ZF"),
        (7, "SF"),
        (8, "TF"),
        (9, "IF"),
        (10, "DF"),
        (11, "OF"),
    ],
);

/// The x86 register registry (soft lookups, alias sets).
pub fn registers() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("x86.reg", REGISTERS))
}

/// The x86 instruction-group registry (soft lookups).
pub fn groups() -> &'static SymbolRegistry {
    static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SymbolRegistry::from_pairs("x86.group", GROUPS))
}

/// The EFLAGS name table.
#[must_use]
pub fn eflags_table() -> &'static FlagTable {
    &EFLAGS_TABLE
}

/// Tagged-union layout of one x86 operand slot.
static OPERAND_SCHEMA: TaggedSchema = TaggedSchema {
    name: "x86.operand",
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
                    Field::uint("segment", layout::OP_MEM_SEGMENT, IntWidth::W32),
                    Field::uint("base", layout::OP_MEM_BASE, IntWidth::W32),
                    Field::uint("index", layout::OP_MEM_INDEX, IntWidth::W32),
                    Field::int("scale", layout::OP_MEM_SCALE, IntWidth::W32),
                    Field::int("disp", layout::OP_MEM_DISP, IntWidth::W64),
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
    ],
};

/// The payload of one x86 operand — a closed variant set.
#[derive(Debug, PartialEq)]
pub enum X86Payload {
    /// A register operand with its resolved alias set
    Register(RegisterRef),
    /// An immediate value
    Immediate(i64),
    /// A floating-point immediate
    FloatImmediate(f64),
    /// A memory reference with its segment override
    Memory {
        /// Segment register, id 0 if no override
        segment: RegisterRef,
        /// The addressing expression
        mem: MemoryRef,
    },
}

impl fmt::Display for X86Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            X86Payload::Register(reg) => write!(f, "{reg}"),
            X86Payload::Immediate(imm) => write!(f, "{imm:#x}"),
            X86Payload::FloatImmediate(fp) => write!(f, "{fp}"),
            X86Payload::Memory { segment, mem } => {
                if segment.is_present() {
                    write!(f, "{segment}:{mem}")
                } else {
                    write!(f, "{mem}")
                }
            }
        }
    }
}

/// One decoded x86 operand slot.
#[derive(Debug, PartialEq)]
pub struct X86Operand {
    /// How the instruction accesses the operand
    pub access: Access,
    /// Operand size in bytes
    pub size: u8,
    /// The operand's payload
    pub payload: X86Payload,
}

/// Decoded x86 detail: encoding scalars, flag effects, and operands.
#[derive(Debug)]
pub struct X86Detail {
    /// Instruction prefix bytes, zero-padded
    pub prefix: [u8; layout::PREFIX_LEN],
    /// Opcode bytes, zero-padded
    pub opcode: [u8; layout::OPCODE_LEN],
    /// REX byte, 0 if absent
    pub rex: u8,
    /// Effective address size in bytes
    pub addr_size: u8,
    /// ModRM byte
    pub modrm: u8,
    /// SIB byte
    pub sib: u8,
    /// Displacement value
    pub disp: i64,
    /// Names of the affected EFLAGS bits, ascending by bit position
    pub eflags: Vec<&'static str>,
    /// Decoded operands, exactly the declared count
    pub operands: Vec<X86Operand>,
}

/// Decode the x86 payload of a detail record.
pub(crate) fn decode(record: &Record<'_>, base: usize) -> Result<X86Detail> {
    let mut prefix = [0u8; layout::PREFIX_LEN];
    for (index, byte) in prefix.iter_mut().enumerate() {
        *byte = record.read::<u8>(base + layout::PREFIX + index)?;
    }

    let mut opcode = [0u8; layout::OPCODE_LEN];
    for (index, byte) in opcode.iter_mut().enumerate() {
        *byte = record.read::<u8>(base + layout::OPCODE + index)?;
    }

    Ok(X86Detail {
        prefix,
        opcode,
        rex: record.read::<u8>(base + layout::REX)?,
        addr_size: record.read::<u8>(base + layout::ADDR_SIZE)?,
        modrm: record.read::<u8>(base + layout::MODRM)?,
        sib: record.read::<u8>(base + layout::SIB)?,
        disp: record.read::<i64>(base + layout::DISP)?,
        eflags: EFLAGS_TABLE.decode(record.read::<u64>(base + layout::EFLAGS)?),
        operands: decode_operands(record, base)?,
    })
}

/// Decode the declared operand slots, and only those.
fn decode_operands(record: &Record<'_>, base: usize) -> Result<Vec<X86Operand>> {
    let count = record.read::<u8>(base + layout::OP_COUNT)? as usize;
    if count > layout::OPERAND_CAPACITY {
        return Err(malformed_error!(
            "x86 operand count {} exceeds capacity {}",
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
fn decode_operand(record: &Record<'_>, slot_base: usize) -> Result<X86Operand> {
    let variant = OPERAND_SCHEMA.read(record, slot_base)?;

    let payload = match variant.discriminant() as u32 {
        KIND_REG => X86Payload::Register(RegisterRef::resolve(
            variant.uint("reg")? as u32,
            registers(),
        )),
        KIND_IMM => X86Payload::Immediate(variant.int("imm")?),
        KIND_FP => X86Payload::FloatImmediate(variant.float("fp")?),
        KIND_MEM => X86Payload::Memory {
            segment: RegisterRef::resolve(variant.uint("segment")? as u32, registers()),
            mem: MemoryRef {
                base: RegisterRef::resolve(variant.uint("base")? as u32, registers()),
                index: RegisterRef::resolve(variant.uint("index")? as u32, registers()),
                scale: variant.int("scale")? as i32,
                displacement: variant.int("disp")?,
            },
        },
        other => {
            return Err(malformed_error!(
                "x86 operand schema produced unhandled variant {}",
                other
            ))
        }
    };

    // Shared slot metadata, present regardless of kind
    let access = Access::from_raw(record.read::<u8>(slot_base + layout::OP_ACCESS)?);
    let size = record.read::<u8>(slot_base + layout::OP_SIZE)?;

    Ok(X86Operand {
        access,
        size,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        detail::{decode_detail, Arch, ArchDetail},
        test::DetailRecordBuilder,
        Error,
    };

    fn x86_detail(data: &[u8]) -> X86Detail {
        match decode_detail(data, Arch::X86).unwrap().arch {
            ArchDetail::X86(detail) => detail,
            other => panic!("Expected x86 detail, got {other:?}"),
        }
    }

    #[test]
    fn register_operand() {
        let data = DetailRecordBuilder::x86()
            .x86_reg_op(0, 7, Access::READ.bits(), 8)
            .build();

        let detail = x86_detail(&data);
        assert_eq!(detail.operands.len(), 1);

        let operand = &detail.operands[0];
        assert_eq!(operand.access, Access::READ);
        assert_eq!(operand.size, 8);
        match &operand.payload {
            X86Payload::Register(reg) => assert_eq!(reg.name(), "rbp"),
            other => panic!("Expected register payload, got {other:?}"),
        }
    }

    #[test]
    fn immediate_operand() {
        let data = DetailRecordBuilder::x86()
            .x86_imm_op(0, -1234, Access::READ.bits(), 4)
            .build();

        let detail = x86_detail(&data);
        assert_eq!(detail.operands[0].payload, X86Payload::Immediate(-1234));
    }

    #[test]
    fn float_operand() {
        let data = DetailRecordBuilder::x86()
            .x86_fp_op(0, 2.5, Access::READ.bits(), 8)
            .build();

        let detail = x86_detail(&data);
        assert_eq!(detail.operands[0].payload, X86Payload::FloatImmediate(2.5));
    }

    #[test]
    fn memory_operand_full_form() {
        // fs:[rbp + rcx*4 - 8]
        let data = DetailRecordBuilder::x86()
            .x86_mem_op(0, 42, 7, 3, 4, -8, (Access::READ | Access::WRITE).bits(), 8)
            .build();

        let detail = x86_detail(&data);
        match &detail.operands[0].payload {
            X86Payload::Memory { segment, mem } => {
                assert_eq!(segment.name(), "fs");
                assert_eq!(mem.base.name(), "rbp");
                assert_eq!(mem.index.name(), "rcx");
                assert_eq!(mem.scale, 4);
                assert_eq!(mem.displacement, -8);
            }
            other => panic!("Expected memory payload, got {other:?}"),
        }
    }

    #[test]
    fn unknown_operand_kind_is_fatal() {
        let data = DetailRecordBuilder::x86()
            .x86_reg_op(0, 7, Access::READ.bits(), 8)
            .x86_kind(0, 99)
            .build();

        match decode_detail(&data, Arch::X86) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 99);
                assert_eq!(schema, "x86.operand");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn operand_count_over_capacity() {
        let data = DetailRecordBuilder::x86().x86_op_count(9).build();

        assert!(matches!(
            decode_detail(&data, Arch::X86),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn undeclared_slots_are_not_read() {
        // Truncate the record right after slot 0; decoding one operand must succeed.
        let full = DetailRecordBuilder::x86()
            .x86_reg_op(0, 1, Access::READ.bits(), 8)
            .build();
        let end_of_slot_0 =
            crate::detail::layout::ARCH_DETAIL + layout::OPERANDS + layout::OPERAND_STRIDE;

        let detail = x86_detail(&full[..end_of_slot_0]);
        assert_eq!(detail.operands.len(), 1);
    }

    #[test]
    fn scalar_fields_and_eflags() {
        let data = DetailRecordBuilder::x86()
            .x86_scalars(&[0x66, 0, 0, 0], &[0x55, 0, 0, 0], 0x48, 8, 0xE5, 0x24, -16)
            .x86_eflags(0b1000_0101) // CF, PF, SF
            .build();

        let detail = x86_detail(&data);
        assert_eq!(detail.prefix[0], 0x66);
        assert_eq!(detail.opcode[0], 0x55);
        assert_eq!(detail.rex, 0x48);
        assert_eq!(detail.addr_size, 8);
        assert_eq!(detail.modrm, 0xE5);
        assert_eq!(detail.sib, 0x24);
        assert_eq!(detail.disp, -16);
        assert_eq!(detail.eflags, vec!["CF", "PF", "SF"]);
    }

    #[test]
    fn unmapped_register_code_is_invalid_not_error() {
        let data = DetailRecordBuilder::x86()
            .x86_reg_op(0, 5000, Access::READ.bits(), 8)
            .build();

        let detail = x86_detail(&data);
        match &detail.operands[0].payload {
            X86Payload::Register(reg) => {
                assert_eq!(reg.names, &[crate::registry::INVALID_SYMBOL]);
            }
            other => panic!("Expected register payload, got {other:?}"),
        }
    }

    #[test]
    fn payload_display() {
        let reg = X86Payload::Register(RegisterRef::resolve(8, registers()));
        assert_eq!(reg.to_string(), "rsp");

        let mem = X86Payload::Memory {
            segment: RegisterRef::resolve(0, registers()),
            mem: MemoryRef {
                base: RegisterRef::resolve(7, registers()),
                index: RegisterRef::resolve(0, registers()),
                scale: 1,
                displacement: 16,
            },
        };
        assert_eq!(mem.to_string(), "[rbp + 0x10]");
    }
}
