use std::fmt;

/// Wire-level type tags of the compact protocol.
///
/// The STOP marker (`0`) is not a type; it is surfaced as `None` by
/// [`super::CompactReader::read_next_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompactType {
    BooleanTrue = 1,
    BooleanFalse = 2,
    Byte = 3,
    I16 = 4,
    I32 = 5,
    I64 = 6,
    Double = 7,
    Binary = 8,
    List = 9,
    Set = 10,
    Map = 11,
    Struct = 12,
}

impl CompactType {
    /// Tag for a boolean field carrying `value`.
    pub fn for_bool(value: bool) -> Self {
        if value {
            CompactType::BooleanTrue
        } else {
            CompactType::BooleanFalse
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, CompactType::BooleanTrue | CompactType::BooleanFalse)
    }

    /// Low-nibble representation used in headers.
    pub fn nibble(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CompactType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => CompactType::BooleanTrue,
            2 => CompactType::BooleanFalse,
            3 => CompactType::Byte,
            4 => CompactType::I16,
            5 => CompactType::I32,
            6 => CompactType::I64,
            7 => CompactType::Double,
            8 => CompactType::Binary,
            9 => CompactType::List,
            10 => CompactType::Set,
            11 => CompactType::Map,
            12 => CompactType::Struct,
            other => return Err(other),
        })
    }
}

impl fmt::Display for CompactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
