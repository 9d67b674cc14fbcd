//! # archscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the archscope library. Import this module to get quick access to the essential
//! types for instruction-detail decoding.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all archscope operations
pub use crate::Error;

/// The result type used throughout archscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for decoding raw detail records
pub use crate::detail::decode_detail;

/// Architecture dispatch and the decoded detail structure
pub use crate::detail::{Arch, ArchDetail, InstructionDetail};

// ================================================================================================
// Shared Operand Building Blocks
// ================================================================================================

/// Operand access flags, register references, memory references, condition codes
pub use crate::detail::{Access, Condition, MemoryRef, RegisterRef};

// ================================================================================================
// Architecture-Specific Detail and Operand Types
// ================================================================================================

/// x86 detail and operands
pub use crate::detail::{X86Detail, X86Operand, X86Payload};

/// ARM detail and operands
pub use crate::detail::{
    ArmDetail, ArmEndian, ArmOperand, ArmPayload, ArmShift, ArmShiftKind, MemBarrier,
};

/// AArch64 detail and operands
pub use crate::detail::{
    Aarch64Detail, Aarch64Operand, Aarch64Payload, Aarch64Shift, Aarch64ShiftKind, Extender,
    PredicateOperand, SmeOperand, SmeSliceOffset, SysAliasCategory, SysOperand,
    VectorArrangement,
};

// ================================================================================================
// Decoding Infrastructure
// ================================================================================================

/// Bounds-checked raw-record access
pub use crate::record::Record;

/// Value-to-symbol registries with aliasing
pub use crate::registry::{SymbolRegistry, INVALID_SYMBOL};

/// Ordered status-flag decoding
pub use crate::flags::FlagTable;

/// Tagged-union layout schemas
pub use crate::schema::{DecodedVariant, Field, FieldKind, TaggedSchema, VariantLayout};
