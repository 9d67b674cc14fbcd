use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while decoding instruction
/// detail records. Each variant provides specific context about the failure mode to enable
/// appropriate error handling.
///
/// # Error Categories
///
/// ## Structural Decode Errors
/// - [`Error::UnknownDiscriminant`] - A tagged-union discriminant has no matching variant
/// - [`Error::Truncated`] - The record is shorter than its schema requires
/// - [`Error::Malformed`] - A structural invariant of the record layout is violated
///
/// ## Dispatch Errors
/// - [`Error::UnsupportedArchitecture`] - No operand decoder is registered for the tag
///
/// All hard errors abort only the current decode call; they carry enough context (schema
/// name, discriminant value, byte counts) to diagnose a layout or version mismatch. Soft
/// symbol lookups never raise — they degrade to the INVALID sentinel instead.
///
/// # Examples
///
/// ```rust
/// use archscope::{decode_detail, Arch, Error};
///
/// match decode_detail(&[0u8; 4], Arch::X86) {
///     Ok(detail) => println!("{} operands", detail.arch.operand_count()),
///     Err(Error::Truncated { expected, available }) => {
///         eprintln!("record too short: need {expected}, have {available}");
///     }
///     Err(Error::UnknownDiscriminant { value, schema }) => {
///         eprintln!("unknown {schema} discriminant: {value}");
///     }
///     Err(e) => eprintln!("decode failed: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A tagged-union discriminant has no matching variant in the active schema.
    ///
    /// This error occurs when a kind/sub-kind selector read from the record does not
    /// appear in the schema's variant table — typically a record produced by a newer
    /// engine version than this build's schemas describe, or corrupted input.
    ///
    /// # Fields
    ///
    /// * `value` - The discriminant value that was read
    /// * `schema` - Name of the schema whose variant table was consulted
    #[error("Unknown discriminant {value:#x} for schema '{schema}'")]
    UnknownDiscriminant {
        /// The discriminant value read from the record
        value: u64,
        /// The schema the value failed to match against
        schema: &'static str,
    },

    /// The schema requires more bytes than the record provides.
    ///
    /// This is a safety check to prevent out-of-bound reads when decoding truncated
    /// or mis-sized records.
    ///
    /// # Fields
    ///
    /// * `expected` - Number of bytes the read would have required
    /// * `available` - Number of bytes actually present in the record
    #[error("Record truncated - needed {expected} bytes, only {available} available")]
    Truncated {
        /// Bytes required to satisfy the read
        expected: usize,
        /// Bytes present in the record
        available: usize,
    },

    /// No operand decoder is registered for the given architecture tag.
    ///
    /// The architecture set is closed; numeric tags outside it cannot be dispatched.
    #[error("Unsupported architecture tag: {0}")]
    UnsupportedArchitecture(u32),

    /// The record violates a structural invariant of its declared layout.
    ///
    /// Raised for conditions such as a declared element count exceeding the schema's
    /// fixed array capacity, or an internal schema table naming a field that does not
    /// exist. The error includes the source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
