// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # archscope
//!
//! A cross-platform framework for decoding the architecture-specific instruction detail
//! records emitted by native disassembly engines. Built in pure Rust, `archscope` turns
//! the fixed-layout, tagged-union metadata block the engine produces for each x86, ARM,
//! or AArch64 instruction into safe, strongly-typed operand and detail values.
//!
//! ## Features
//!
//! - **🔍 Complete operand models** - Registers with alias sets, immediates, memory
//!   references, and the architecture compounds (system operands, SVE predicates, SME
//!   matrix operands)
//! - **⚡ Schema-driven decoding** - Record layouts are static data; an engine version
//!   bump is a schema edit, not a logic change
//! - **🛡️ Memory safe** - Bounds-checked reads, no references retained into the raw
//!   record, comprehensive error handling
//! - **🔧 Cross-platform** - No native engine required to decode captured records;
//!   works on any Rust-supported platform
//! - **🧩 Closed dispatch** - The architecture set is a closed enum, checked
//!   exhaustively at compile time
//!
//! ## Quick Start
//!
//! Add `archscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! archscope = "0.2"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust,no_run
//! use archscope::prelude::*;
//!
//! # let raw_record: Vec<u8> = Vec::new();
//! // Decode one raw detail record captured from the engine
//! let detail = decode_detail(&raw_record, Arch::X86)?;
//! println!("{} operands", detail.arch.operand_count());
//! # Ok::<(), archscope::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use archscope::{decode_detail, Arch, ArchDetail, X86Payload};
//!
//! # let raw_record: Vec<u8> = Vec::new();
//! let detail = decode_detail(&raw_record, Arch::X86)?;
//!
//! // Register read/write sets and instruction groups
//! println!("reads: {:?}", detail.regs_read);
//! println!("writes: {:?}", detail.regs_write);
//!
//! // Architecture-specific operands
//! if let ArchDetail::X86(x86) = &detail.arch {
//!     for operand in &x86.operands {
//!         if let X86Payload::Register(reg) = &operand.payload {
//!             println!("register operand: {}", reg);
//!         }
//!     }
//! }
//! # Ok::<(), archscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `archscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`detail`] - Architecture dispatch, header decoding, and per-arch operand decoders
//! - [`schema`] - The tagged-union layout engine driving every operand read
//! - [`registry`] - Value-to-symbol lookup with one-to-many aliasing
//! - [`flags`] - Ordered decoding of wide status-flag bitmasks
//! - [`record`] - Bounds-checked access to the caller-owned raw record
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Decoding Model
//!
//! Data flows one way: raw bytes → [`record::Record`] → [`schema::TaggedSchema`] →
//! per-architecture operand decoder → [`detail::decode_detail`] → caller. Decoding is
//! synchronous, stateless, and side-effect-free; independent records can be decoded
//! concurrently without coordination. The only shared state is the lazily-built symbol
//! registries, which are immutable after initialization.
//!
//! ### Lookup Policy
//!
//! Display-oriented values (registers, groups, condition codes, arrangements) resolve
//! *softly*: codes this build does not know yield an INVALID sentinel, keeping decode
//! working against newer engines. Values that select decode behavior — tagged-union
//! discriminants, shift types, the architecture tag — resolve *hard* and fail the call
//! with full context when unknown.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error
//! information:
//!
//! ```rust,no_run
//! use archscope::{decode_detail, Arch, Error};
//!
//! # let raw_record: Vec<u8> = Vec::new();
//! match decode_detail(&raw_record, Arch::Aarch64) {
//!     Ok(detail) => println!("decoded {} operands", detail.arch.operand_count()),
//!     Err(Error::UnknownDiscriminant { value, schema }) => {
//!         println!("unknown {schema} discriminant {value}")
//!     }
//!     Err(Error::Truncated { expected, available }) => {
//!         println!("record too short: {available}/{expected} bytes")
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! The crate includes comprehensive fuzzing support for security and robustness:
//!
//! ### Fuzzing
//!
//! ```bash
//! # Install fuzzing tools
//! cargo install cargo-fuzz
//!
//! # Run fuzzer
//! cargo +nightly fuzz run decode_detail --release
//! ```
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench  # decode throughput
//! ```
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the archscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use archscope::prelude::*;
///
/// # let raw_record: Vec<u8> = Vec::new();
/// let detail = decode_detail(&raw_record, Arch::Arm)?;
/// # Ok::<(), archscope::Error>(())
/// ```
pub mod prelude;

/// Instruction-detail decoding: architecture dispatch, operands, and scalar fields.
///
/// This module is the crate's entry point for turning raw detail records into typed
/// values. It includes:
///
/// - **Header decoding**: register read/write sets, groups, writeback flag
/// - **Architecture dispatch**: a closed [`detail::Arch`] enum, matched exhaustively
/// - **Operand decoding**: per-architecture tagged-union payloads
///
/// # Key Types
///
/// - [`detail::InstructionDetail`] - Everything a record says about one instruction
/// - [`detail::ArchDetail`] - The architecture-specific payload
/// - [`detail::X86Detail`], [`detail::ArmDetail`], [`detail::Aarch64Detail`]
///
/// # Main Functions
///
/// - [`detail::decode_detail`] - Decode a single raw record
pub mod detail;

/// Ordered decoding of wide status-flag bitmasks into named flag sets.
///
/// [`flags::FlagTable`] pairs bit positions with flag names and extracts the set bits
/// of a mask in ascending bit order. Used for x86 EFLAGS and the ARM status masks.
pub mod flags;

/// Bounds-checked access to raw, caller-owned detail records.
///
/// [`record::Record`] provides offset-addressed, little-endian reads with
/// [`Error::Truncated`] on any out-of-range access. All values are copied out; decoded
/// structures never borrow the record.
pub mod record;

/// Value-to-symbol registries with one-to-many aliasing.
///
/// [`registry::SymbolRegistry`] groups raw `(value, name)` constant tables into
/// value → alias-set maps once at construction, with soft and hard lookup modes.
pub mod registry;

/// Schema-driven reading of fixed-layout tagged unions.
///
/// [`schema::TaggedSchema`] describes a discriminant and its variant field layouts as
/// static data; reading validates the discriminant hard and copies the selected
/// variant's fields out of the record, recursing through nested unions.
pub mod schema;

/// `archscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible
/// operations.
///
/// # Examples
///
/// ```rust,no_run
/// use archscope::{Arch, InstructionDetail, Result};
///
/// fn decode(record: &[u8]) -> Result<InstructionDetail> {
///     archscope::decode_detail(record, Arch::X86)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `archscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for structural decode failures and architecture dispatch.
///
/// # Examples
///
/// ```rust,no_run
/// use archscope::{decode_detail, Arch, Error};
///
/// # let raw_record: Vec<u8> = Vec::new();
/// match decode_detail(&raw_record, Arch::X86) {
///     Ok(_) => println!("decoded"),
///     Err(Error::UnsupportedArchitecture(tag)) => println!("no decoder for tag {tag}"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Main entry point for decoding raw detail records.
///
/// See [`detail::decode_detail`] for the full contract.
///
/// # Example
///
/// ```rust,no_run
/// use archscope::{decode_detail, Arch};
/// # let raw_record: Vec<u8> = Vec::new();
/// let detail = decode_detail(&raw_record, Arch::X86)?;
/// println!("{} operands", detail.arch.operand_count());
/// # Ok::<(), archscope::Error>(())
/// ```
pub use detail::decode_detail;

/// Core detail types, re-exported for direct access.
///
/// These types form the decoded output structure:
/// - [`Arch`] - The closed architecture set
/// - [`InstructionDetail`] - Decoded register sets, groups, and arch payload
/// - [`ArchDetail`] - Closed enum over the per-architecture detail structures
/// - [`Access`], [`RegisterRef`], [`MemoryRef`] - Shared operand building blocks
pub use detail::{
    Aarch64Detail, Aarch64Operand, Aarch64Payload, Aarch64Shift, Aarch64ShiftKind, Access, Arch,
    ArchDetail, ArmDetail, ArmEndian, ArmOperand, ArmPayload, ArmShift, ArmShiftKind, Condition,
    Extender, InstructionDetail, MemBarrier, MemoryRef, PredicateOperand, RegisterRef,
    SmeOperand, SmeSliceOffset, SysAliasCategory, SysOperand, VectorArrangement, X86Detail,
    X86Operand, X86Payload,
};
