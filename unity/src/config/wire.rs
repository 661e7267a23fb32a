//! Fixed-order binary encoding of hyperparameter records.
//!
//! A checkpoint header is a flat run of little-endian scalars with no magic,
//! version tag or length prefix. The order of the fields *is* the format, so
//! records are declared once through [`wire_record!`] and the struct, reader,
//! writer and descriptor table are all generated from that single list.

use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum HparamsError {
    #[error(
        "Checkpoint truncated: field \"{field}\" at byte {offset} needs \
        {width} bytes."
    )]
    TruncatedInput {
        field: String,
        offset: usize,
        width: usize,
    },
    #[error("Failed to read hyperparameters")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I32,
    I64,
    F32,
}

impl ScalarKind {
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::Bool => 1,
            ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::I64 => 8,
        }
    }
}

/// One entry of a flattened record layout, e.g.
/// `nllb_config__num_decoder_layers: I64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ScalarKind,
}

pub struct HparamsReader<R> {
    inner: R,
    offset: usize,
}

impl<R: Read> HparamsReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_array<const N: usize>(
        &mut self,
        field: &str,
    ) -> Result<[u8; N], HparamsError> {
        let mut bytes = [0u8; N];
        match self.inner.read_exact(&mut bytes) {
            Ok(()) => {
                self.offset += N;
                Ok(bytes)
            },
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                Err(HparamsError::TruncatedInput {
                    field: field.to_string(),
                    offset: self.offset,
                    width: N,
                })
            },
            Err(error) => Err(error.into()),
        }
    }
}

pub struct HparamsWriter<W> {
    inner: W,
    offset: usize,
}

impl<W: Write> HparamsWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bytes(
        &mut self,
        bytes: &[u8],
    ) -> Result<(), HparamsError> {
        self.inner.write_all(bytes)?;
        self.offset += bytes.len();
        Ok(())
    }
}

/// A value that knows its own position-independent wire encoding.
///
/// Scalars read and write themselves; records generated by [`wire_record!`]
/// delegate to their fields in declaration order.
pub trait WireField: Sized {
    fn read_field<R: Read>(
        reader: &mut HparamsReader<R>,
        path: &str,
    ) -> Result<Self, HparamsError>;

    fn write_field<W: Write>(
        &self,
        writer: &mut HparamsWriter<W>,
    ) -> Result<(), HparamsError>;

    fn describe(
        path: &str,
        table: &mut Vec<FieldDescriptor>,
    );
}

/// Top-level entry points for records declared with [`wire_record!`].
pub trait WireRecord: WireField {
    fn read_from<R: Read>(
        reader: &mut HparamsReader<R>
    ) -> Result<Self, HparamsError> {
        Self::read_field(reader, "")
    }

    fn write_to<W: Write>(
        &self,
        writer: &mut HparamsWriter<W>,
    ) -> Result<(), HparamsError> {
        self.write_field(writer)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, HparamsError> {
        let mut writer = HparamsWriter::new(Vec::new());
        self.write_field(&mut writer)?;
        Ok(writer.into_inner())
    }

    fn field_table() -> Vec<FieldDescriptor> {
        let mut table = Vec::new();
        Self::describe("", &mut table);
        table
    }

    fn wire_size() -> usize {
        Self::field_table().iter().map(|field| field.kind.width()).sum()
    }
}

/// Joins a record path and a field name with the `__` separator used by the
/// checkpoint writer. Empty components are skipped so a record can be spliced
/// into its parent without a prefix.
pub fn join_path(
    path: &str,
    name: &str,
) -> String {
    match (path.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => path.to_string(),
        (false, false) => format!("{path}__{name}"),
    }
}

macro_rules! impl_numeric_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl WireField for $ty {
                fn read_field<R: Read>(
                    reader: &mut HparamsReader<R>,
                    path: &str,
                ) -> Result<Self, HparamsError> {
                    let value = <$ty>::from_le_bytes(reader.read_array(path)?);
                    trace!(field = path, value, "read hparam");
                    Ok(value)
                }

                fn write_field<W: Write>(
                    &self,
                    writer: &mut HparamsWriter<W>,
                ) -> Result<(), HparamsError> {
                    writer.write_bytes(&self.to_le_bytes())
                }

                fn describe(
                    path: &str,
                    table: &mut Vec<FieldDescriptor>,
                ) {
                    table.push(FieldDescriptor {
                        name: path.to_string(),
                        kind: ScalarKind::$kind,
                    });
                }
            }
        )*
    };
}

impl_numeric_field! {
    i32 => I32,
    i64 => I64,
    f32 => F32,
}

impl WireField for bool {
    fn read_field<R: Read>(
        reader: &mut HparamsReader<R>,
        path: &str,
    ) -> Result<Self, HparamsError> {
        let [byte] = reader.read_array::<1>(path)?;
        let value = byte != 0;
        trace!(field = path, value, "read hparam");
        Ok(value)
    }

    fn write_field<W: Write>(
        &self,
        writer: &mut HparamsWriter<W>,
    ) -> Result<(), HparamsError> {
        writer.write_bytes(&[u8::from(*self)])
    }

    fn describe(
        path: &str,
        table: &mut Vec<FieldDescriptor>,
    ) {
        table.push(FieldDescriptor {
            name: path.to_string(),
            kind: ScalarKind::Bool,
        });
    }
}

/// Declares a record whose field list doubles as its wire layout.
///
/// Each field is written as `name: Type => "wire_name"`. Nested records are
/// flattened as `parent__child`; an empty wire name splices the nested
/// record's fields into the parent unprefixed.
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty => $wire:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::config::wire::WireField for $name {
            fn read_field<R: ::std::io::Read>(
                reader: &mut $crate::config::wire::HparamsReader<R>,
                path: &str,
            ) -> Result<Self, $crate::config::wire::HparamsError> {
                // Struct expressions evaluate in source order, which is the
                // wire order.
                Ok(Self {
                    $(
                        $field: <$ty as $crate::config::wire::WireField>::read_field(
                            reader,
                            &$crate::config::wire::join_path(path, $wire),
                        )?,
                    )*
                })
            }

            fn write_field<W: ::std::io::Write>(
                &self,
                writer: &mut $crate::config::wire::HparamsWriter<W>,
            ) -> Result<(), $crate::config::wire::HparamsError> {
                $(
                    $crate::config::wire::WireField::write_field(
                        &self.$field,
                        writer,
                    )?;
                )*
                Ok(())
            }

            fn describe(
                path: &str,
                table: &mut Vec<$crate::config::wire::FieldDescriptor>,
            ) {
                $(
                    <$ty as $crate::config::wire::WireField>::describe(
                        &$crate::config::wire::join_path(path, $wire),
                        table,
                    );
                )*
            }
        }

        impl $crate::config::wire::WireRecord for $name {}
    };
}

pub(crate) use wire_record;

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    wire_record! {
        #[derive(Debug, Clone, PartialEq, Default)]
        struct Inner {
            depth: i64 => "depth",
            enabled: bool => "enabled",
        }
    }

    wire_record! {
        #[derive(Debug, Clone, PartialEq, Default)]
        struct Outer {
            dim: i32 => "dim",
            inner: Inner => "inner",
            spliced: Inner => "",
            scale: f32 => "scale",
        }
    }

    #[test]
    fn test_scalar_widths_match_rust_types() {
        assert_eq!(ScalarKind::I32.width(), size_of::<i32>());
        assert_eq!(ScalarKind::I64.width(), size_of::<i64>());
        assert_eq!(ScalarKind::F32.width(), size_of::<f32>());
        assert_eq!(ScalarKind::Bool.width(), size_of::<bool>());
    }

    #[test]
    fn test_field_table_flattens_nested_records() {
        let names: Vec<String> =
            Outer::field_table().into_iter().map(|field| field.name).collect();
        assert_eq!(
            names,
            [
                "dim",
                "inner__depth",
                "inner__enabled",
                "depth",
                "enabled",
                "scale"
            ]
        );
        assert_eq!(Outer::wire_size(), 4 + 9 + 9 + 4);
    }

    #[test]
    fn test_record_layout_is_little_endian_in_declaration_order() {
        let record = Outer {
            dim: 0x0102_0304,
            inner: Inner {
                depth: -1,
                enabled: true,
            },
            spliced: Inner {
                depth: 2,
                enabled: false,
            },
            scale: 1.0,
        };
        let bytes = record.to_bytes().unwrap();

        assert_eq!(bytes.len(), Outer::wire_size());
        assert_eq!(&bytes[0..4], &[0x04u8, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..12], &[0xffu8; 8]);
        assert_eq!(bytes[12], 1);
        assert_eq!(&bytes[13..21], &2i64.to_le_bytes());
        assert_eq!(bytes[21], 0);
        assert_eq!(&bytes[22..26], &1.0f32.to_le_bytes());

        let mut reader = HparamsReader::new(Cursor::new(bytes));
        let decoded = Outer::read_from(&mut reader).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(reader.offset(), Outer::wire_size());
    }

    #[test]
    fn test_truncation_reports_the_missing_field() {
        let bytes = Outer::default().to_bytes().unwrap();
        let mut reader = HparamsReader::new(Cursor::new(&bytes[..10]));

        match Outer::read_from(&mut reader) {
            Err(HparamsError::TruncatedInput {
                field,
                offset,
                width,
            }) => {
                assert_eq!(field, "inner__depth");
                assert_eq!(offset, 4);
                assert_eq!(width, 8);
            },
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_nonzero_bool_byte_reads_as_true() {
        let mut reader = HparamsReader::new(Cursor::new([0x7fu8]));
        assert!(bool::read_field(&mut reader, "flag").unwrap());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "model_dim"), "model_dim");
        assert_eq!(join_path("nllb_config", ""), "nllb_config");
        assert_eq!(
            join_path("nllb_config", "model_dim"),
            "nllb_config__model_dim"
        );
    }
}
