//! Schema-driven reader for fixed-layout tagged unions.
//!
//! Detail records describe each operand as a C-style tagged union: a discriminant field
//! selects which of several overlapping payload layouts is valid to read. This module
//! models those layouts as static data — a [`crate::schema::TaggedSchema`] pairs the
//! discriminant's position with a variant table, and each
//! [`crate::schema::VariantLayout`] declares the fields that exist when its discriminant
//! is active.
//!
//! Keeping the layout as data means an engine version bump that moves byte offsets is a
//! schema edit, not a decode-logic change, and each nesting level's variant set stays
//! independently checkable.
//!
//! # Architecture
//!
//! - **Hard discriminants** - A discriminant absent from the variant table is a
//!   [`crate::Error::UnknownDiscriminant`], fatal for the current decode call only
//! - **Byte-exact reads** - Only the selected variant's declared field ranges are read;
//!   sibling variants' bytes are never touched
//! - **Recursive nesting** - A field may itself be a tagged union
//!   ([`crate::schema::FieldKind::Nested`]), decoded with the field's offset as the new
//!   base (system-operand sub-kinds, SME payloads)
//! - **Copy-out values** - The resulting [`crate::schema::DecodedVariant`] owns every
//!   value; nothing borrows the raw record
//!
//! # Examples
//!
//! ```rust
//! use archscope::record::{IntWidth, Record};
//! use archscope::schema::{Field, TaggedSchema, VariantLayout};
//!
//! static SCHEMA: TaggedSchema = TaggedSchema {
//!     name: "demo",
//!     disc_offset: 0,
//!     disc_width: IntWidth::W8,
//!     variants: &[
//!         (1, VariantLayout { name: "reg", fields: &[Field::uint("reg", 4, IntWidth::W32)] }),
//!         (2, VariantLayout { name: "imm", fields: &[Field::int("imm", 4, IntWidth::W64)] }),
//!     ],
//! };
//!
//! let data = [0x01, 0, 0, 0, 0x2A, 0, 0, 0];
//! let variant = SCHEMA.read(&Record::new(&data), 0)?;
//! assert_eq!(variant.variant(), "reg");
//! assert_eq!(variant.uint("reg")?, 0x2A);
//! # Ok::<(), archscope::Error>(())
//! ```

use crate::{
    record::{FloatWidth, IntWidth, Record},
    Error, Result,
};

/// The typed shape of one field within a variant layout.
#[derive(Debug)]
pub enum FieldKind {
    /// Unsigned integer, zero-extended to `u64`
    UInt(IntWidth),
    /// Signed integer, sign-extended to `i64`
    Int(IntWidth),
    /// IEEE-754 float, widened to `f64`
    Float(FloatWidth),
    /// A nested tagged union decoded at this field's offset
    Nested(&'static TaggedSchema),
}

/// One field of a variant: a name, a byte offset relative to the union base, and a shape.
#[derive(Debug)]
pub struct Field {
    /// Field name used by the typed accessors
    pub name: &'static str,
    /// Byte offset relative to the enclosing union's base offset
    pub offset: usize,
    /// The field's shape
    pub kind: FieldKind,
}

impl Field {
    /// An unsigned integer field.
    #[must_use]
    pub const fn uint(name: &'static str, offset: usize, width: IntWidth) -> Self {
        Field {
            name,
            offset,
            kind: FieldKind::UInt(width),
        }
    }

    /// A signed integer field.
    #[must_use]
    pub const fn int(name: &'static str, offset: usize, width: IntWidth) -> Self {
        Field {
            name,
            offset,
            kind: FieldKind::Int(width),
        }
    }

    /// A float field.
    #[must_use]
    pub const fn float(name: &'static str, offset: usize, width: FloatWidth) -> Self {
        Field {
            name,
            offset,
            kind: FieldKind::Float(width),
        }
    }

    /// A nested tagged-union field decoded at `offset`.
    #[must_use]
    pub const fn nested(name: &'static str, offset: usize, schema: &'static TaggedSchema) -> Self {
        Field {
            name,
            offset,
            kind: FieldKind::Nested(schema),
        }
    }
}

/// The fields valid to read while a particular discriminant value is active.
#[derive(Debug)]
pub struct VariantLayout {
    /// Variant name, carried into the decoded output
    pub name: &'static str,
    /// Declared fields, offsets relative to the union base
    pub fields: &'static [Field],
}

/// A fixed-layout tagged union: discriminant position plus variant table.
///
/// Schemas are `static` data defined by the architecture modules; the reader walks them
/// at decode time. Variant tables are small (a handful to ~14 entries), so matching the
/// discriminant is a scan of the table — the registry-style no-linear-scan rule applies
/// to the thousands-of-constants symbol tables, not to these.
#[derive(Debug)]
pub struct TaggedSchema {
    /// Schema name, reported by [`crate::Error::UnknownDiscriminant`]
    pub name: &'static str,
    /// Byte offset of the discriminant relative to the union base
    pub disc_offset: usize,
    /// Width of the discriminant field
    pub disc_width: IntWidth,
    /// discriminant value -> variant layout
    pub variants: &'static [(u32, VariantLayout)],
}

impl TaggedSchema {
    /// Read the union at `base`, selecting the variant by discriminant.
    ///
    /// Reads the discriminant at `base + disc_offset`, requires it to match one variant
    /// key exactly, then copies each of that variant's fields out of the record at
    /// `base + field.offset`. Nested fields recurse with `base + field.offset` as the
    /// nested base.
    ///
    /// # Errors
    /// - [`crate::Error::UnknownDiscriminant`] if the discriminant matches no variant
    /// - [`crate::Error::Truncated`] if any declared field extends past the record
    pub fn read(&'static self, record: &Record<'_>, base: usize) -> Result<DecodedVariant> {
        let discriminant = record.read_uint(base + self.disc_offset, self.disc_width)?;

        let Some((_, layout)) = self
            .variants
            .iter()
            .find(|(value, _)| u64::from(*value) == discriminant)
        else {
            return Err(Error::UnknownDiscriminant {
                value: discriminant,
                schema: self.name,
            });
        };

        let mut values = Vec::with_capacity(layout.fields.len());
        for field in layout.fields {
            let value = match &field.kind {
                FieldKind::UInt(width) => {
                    FieldValue::UInt(record.read_uint(base + field.offset, *width)?)
                }
                FieldKind::Int(width) => {
                    FieldValue::Int(record.read_int(base + field.offset, *width)?)
                }
                FieldKind::Float(width) => {
                    FieldValue::Float(record.read_float(base + field.offset, *width)?)
                }
                FieldKind::Nested(schema) => {
                    FieldValue::Nested(Box::new(schema.read(record, base + field.offset)?))
                }
            };

            values.push((field.name, value));
        }

        Ok(DecodedVariant {
            schema: self.name,
            variant: layout.name,
            discriminant,
            values,
        })
    }
}

/// One decoded field value, copied out of the record.
#[derive(Debug)]
pub enum FieldValue {
    /// Unsigned integer field
    UInt(u64),
    /// Signed integer field
    Int(i64),
    /// Float field
    Float(f64),
    /// Nested union, decoded recursively
    Nested(Box<DecodedVariant>),
}

/// The decoded form of one tagged union: the selected variant plus its field values.
///
/// Owns all of its data; valid independently of the raw record it was read from. The
/// typed accessors fail with a [`crate::Error::Malformed`] naming the schema if decode
/// logic asks for a field the layout does not declare — that indicates a bug in a
/// schema table rather than bad input, and the location makes it diagnosable.
#[derive(Debug)]
pub struct DecodedVariant {
    schema: &'static str,
    variant: &'static str,
    discriminant: u64,
    values: Vec<(&'static str, FieldValue)>,
}

impl DecodedVariant {
    /// The discriminant value that selected this variant.
    #[must_use]
    pub fn discriminant(&self) -> u64 {
        self.discriminant
    }

    /// The selected variant's name.
    #[must_use]
    pub fn variant(&self) -> &'static str {
        self.variant
    }

    fn value(&self, name: &str) -> Result<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                malformed_error!(
                    "schema '{}' variant '{}' has no field '{}'",
                    self.schema,
                    self.variant,
                    name
                )
            })
    }

    /// The value of unsigned integer field `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the variant declares no such unsigned field.
    pub fn uint(&self, name: &str) -> Result<u64> {
        match self.value(name)? {
            FieldValue::UInt(value) => Ok(*value),
            _ => Err(malformed_error!(
                "schema '{}' field '{}' is not an unsigned integer",
                self.schema,
                name
            )),
        }
    }

    /// The value of signed integer field `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the variant declares no such signed field.
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.value(name)? {
            FieldValue::Int(value) => Ok(*value),
            _ => Err(malformed_error!(
                "schema '{}' field '{}' is not a signed integer",
                self.schema,
                name
            )),
        }
    }

    /// The value of float field `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the variant declares no such float field.
    pub fn float(&self, name: &str) -> Result<f64> {
        match self.value(name)? {
            FieldValue::Float(value) => Ok(*value),
            _ => Err(malformed_error!(
                "schema '{}' field '{}' is not a float",
                self.schema,
                name
            )),
        }
    }

    /// The decoded nested union stored in field `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the variant declares no such nested field.
    pub fn nested(&self, name: &str) -> Result<&DecodedVariant> {
        match self.value(name)? {
            FieldValue::Nested(variant) => Ok(variant),
            _ => Err(malformed_error!(
                "schema '{}' field '{}' is not a nested union",
                self.schema,
                name
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: TaggedSchema = TaggedSchema {
        name: "test.inner",
        disc_offset: 0,
        disc_width: IntWidth::W8,
        variants: &[
            (
                1,
                VariantLayout {
                    name: "narrow",
                    fields: &[Field::uint("value", 1, IntWidth::W8)],
                },
            ),
            (
                2,
                VariantLayout {
                    name: "wide",
                    fields: &[Field::uint("value", 1, IntWidth::W16)],
                },
            ),
        ],
    };

    static OUTER: TaggedSchema = TaggedSchema {
        name: "test.outer",
        disc_offset: 0,
        disc_width: IntWidth::W8,
        variants: &[
            (
                1,
                VariantLayout {
                    name: "scalar",
                    fields: &[
                        Field::uint("reg", 4, IntWidth::W32),
                        Field::int("disp", 8, IntWidth::W32),
                    ],
                },
            ),
            (
                2,
                VariantLayout {
                    name: "float",
                    fields: &[Field::float("fp", 4, FloatWidth::F64)],
                },
            ),
            (
                3,
                VariantLayout {
                    name: "nested",
                    fields: &[Field::nested("sub", 4, &INNER)],
                },
            ),
        ],
    };

    #[test]
    fn read_selects_variant_by_discriminant() {
        let mut data = [0u8; 12];
        data[0] = 1;
        data[4..8].copy_from_slice(&7u32.to_le_bytes());
        data[8..12].copy_from_slice(&(-3i32).to_le_bytes());

        let variant = OUTER.read(&Record::new(&data), 0).unwrap();
        assert_eq!(variant.discriminant(), 1);
        assert_eq!(variant.variant(), "scalar");
        assert_eq!(variant.uint("reg").unwrap(), 7);
        assert_eq!(variant.int("disp").unwrap(), -3);
    }

    #[test]
    fn read_float_variant() {
        let mut data = [0u8; 12];
        data[0] = 2;
        data[4..12].copy_from_slice(&1.75f64.to_le_bytes());

        let variant = OUTER.read(&Record::new(&data), 0).unwrap();
        assert_eq!(variant.float("fp").unwrap(), 1.75);
    }

    #[test]
    fn read_with_nonzero_base() {
        let mut data = [0u8; 16];
        data[4] = 1;
        data[8..12].copy_from_slice(&9u32.to_le_bytes());
        data[12..16].copy_from_slice(&2i32.to_le_bytes());

        let variant = OUTER.read(&Record::new(&data), 4).unwrap();
        assert_eq!(variant.uint("reg").unwrap(), 9);
    }

    #[test]
    fn unknown_discriminant_is_fatal() {
        let data = [99u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        match OUTER.read(&Record::new(&data), 0) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 99);
                assert_eq!(schema, "test.outer");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn nested_union_decodes_recursively() {
        let mut data = [0u8; 8];
        data[0] = 3; // outer: nested
        data[4] = 2; // inner: wide
        data[5..7].copy_from_slice(&0x1234u16.to_le_bytes());

        let variant = OUTER.read(&Record::new(&data), 0).unwrap();
        let sub = variant.nested("sub").unwrap();
        assert_eq!(sub.variant(), "wide");
        assert_eq!(sub.uint("value").unwrap(), 0x1234);
    }

    #[test]
    fn nested_unknown_discriminant_names_inner_schema() {
        let mut data = [0u8; 8];
        data[0] = 3;
        data[4] = 77; // not an inner variant

        match OUTER.read(&Record::new(&data), 0) {
            Err(Error::UnknownDiscriminant { value, schema }) => {
                assert_eq!(value, 77);
                assert_eq!(schema, "test.inner");
            }
            other => panic!("Expected UnknownDiscriminant, got {other:?}"),
        }
    }

    #[test]
    fn reads_stay_within_declared_field_range() {
        // Variant 1's last field ends at byte 12; a record of exactly that size decodes.
        let mut data = vec![0u8; 12];
        data[0] = 1;
        assert!(OUTER.read(&Record::new(&data), 0).is_ok());

        // One byte short of the declared range fails with Truncated.
        data.pop();
        match OUTER.read(&Record::new(&data), 0) {
            Err(Error::Truncated { expected, .. }) => assert_eq!(expected, 12),
            other => panic!("Expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn sibling_variant_bytes_are_not_required() {
        // The float variant needs 12 bytes; the narrow nested variant only 6.
        let data = [3u8, 0, 0, 0, 1, 0x55];
        let variant = OUTER.read(&Record::new(&data), 0).unwrap();
        assert_eq!(variant.nested("sub").unwrap().uint("value").unwrap(), 0x55);
    }

    #[test]
    fn accessor_mismatch_is_malformed() {
        let mut data = [0u8; 12];
        data[0] = 1;
        let variant = OUTER.read(&Record::new(&data), 0).unwrap();

        assert!(matches!(
            variant.uint("missing"),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(variant.float("reg"), Err(Error::Malformed { .. })));
    }
}
