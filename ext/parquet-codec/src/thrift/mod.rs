//! Thrift compact protocol, the framing used by the Parquet file footer.
//!
//! Only the byte-level protocol lives here. The Parquet structs built on top
//! of it are in [`crate::metadata`].

mod compact_type;
mod reader;
pub mod varint;
mod writer;

pub use compact_type::CompactType;
pub use reader::{CompactReader, FieldHeader, ListHeader, MapHeader, MAX_SKIP_DEPTH};
pub use writer::CompactWriter;

use crate::Result;

/// Reads and writes a struct on the compact protocol.
pub trait CompactSerialize: Sized {
    fn read_from(reader: &mut CompactReader) -> Result<Self>;
    fn write_to(&self, writer: &mut CompactWriter) -> Result<()>;
}

/// Reads a list whose elements are structs.
pub fn read_struct_list<T: CompactSerialize>(reader: &mut CompactReader) -> Result<Vec<T>> {
    let header = reader.read_list_header()?;
    if header.element_type != CompactType::Struct {
        return Err(reader.error(format!(
            "expected list<struct>, got list<{}>",
            header.element_type
        )));
    }
    let mut out = Vec::with_capacity(header.size);
    for _ in 0..header.size {
        out.push(T::read_from(reader)?);
    }
    Ok(out)
}

/// Writes `items` as a struct-list field with id `id`.
pub fn write_struct_list<T: CompactSerialize>(
    writer: &mut CompactWriter,
    id: i16,
    items: &[T],
) -> Result<()> {
    writer.write_field_begin(CompactType::List, id)?;
    writer.write_list_begin(CompactType::Struct, items.len());
    for item in items {
        item.write_to(writer)?;
    }
    Ok(())
}

/// Checks that a field's wire type is what the struct definition expects.
pub fn expect_type(reader: &CompactReader, field: &FieldHeader, expected: CompactType) -> Result<()> {
    let matches = if expected.is_bool() {
        field.field_type.is_bool()
    } else {
        field.field_type == expected
    };
    if !matches {
        return Err(reader.error(format!(
            "field {} has type {}, expected {}",
            field.id, field.field_type, expected
        )));
    }
    Ok(())
}
