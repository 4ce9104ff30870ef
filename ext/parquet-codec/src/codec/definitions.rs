//! Conversion between nullable slot arrays and dense values plus
//! definition levels.
//!
//! A slot is present when its level equals the column's maximum definition
//! level. Anything lower is a null at some nesting depth.

use super::array::TypedArray;
use crate::{ParquetError, Result};

/// Dense present values plus one definition level per slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedValues<T> {
    pub values: Vec<T>,
    pub definitions: Vec<i16>,
    pub null_count: usize,
}

impl<T> PackedValues<T> {
    /// Number of present values.
    pub fn packed_len(&self) -> usize {
        self.values.len()
    }
}

/// Packs `array[offset..offset + count]`.
///
/// Present slots get level `max_definition_level`, nulls get 0.
pub fn pack<T: Clone>(
    array: &TypedArray<T>,
    offset: usize,
    count: usize,
    max_definition_level: i16,
) -> Result<PackedValues<T>> {
    let end = offset
        .checked_add(count)
        .filter(|end| *end <= array.len())
        .ok_or_else(|| {
            ParquetError::invalid_argument(format!(
                "slice {}..{} out of bounds for array of {}",
                offset,
                offset.saturating_add(count),
                array.len()
            ))
        })?;

    let values = &array.values()[offset..end];
    let Some(validity) = array.validity() else {
        return Ok(PackedValues {
            values: values.to_vec(),
            definitions: vec![max_definition_level; count],
            null_count: 0,
        });
    };

    let validity = &validity[offset..end];
    let null_count = validity.iter().filter(|v| !**v).count();
    if null_count > 0 && max_definition_level == 0 {
        return Err(ParquetError::data_validation(format!(
            "{} null values in a required column",
            null_count
        )));
    }

    let mut packed = Vec::with_capacity(count - null_count);
    let mut definitions = Vec::with_capacity(count);
    for (value, valid) in values.iter().zip(validity) {
        if *valid {
            packed.push(value.clone());
            definitions.push(max_definition_level);
        } else {
            definitions.push(0);
        }
    }

    Ok(PackedValues {
        values: packed,
        definitions,
        null_count,
    })
}

/// Expands dense `packed` values into one slot per level.
///
/// Null slots are set to `filler` and marked invalid.
pub fn unpack<T: Clone>(
    packed: &[T],
    levels: &[i16],
    max_definition_level: i16,
    filler: &T,
) -> Result<TypedArray<T>> {
    let mut values = Vec::with_capacity(levels.len());
    let mut validity = Vec::with_capacity(levels.len());
    let mut next = 0usize;

    for (slot, level) in levels.iter().enumerate() {
        if *level > max_definition_level || *level < 0 {
            return Err(ParquetError::data_validation(format!(
                "definition level {} at slot {} outside 0..={}",
                level, slot, max_definition_level
            )));
        }
        if *level == max_definition_level {
            let value = packed.get(next).ok_or_else(|| {
                ParquetError::underflow(next, 1, 0)
            })?;
            values.push(value.clone());
            validity.push(true);
            next += 1;
        } else {
            values.push(filler.clone());
            validity.push(false);
        }
    }

    if next != packed.len() {
        return Err(ParquetError::data_validation(format!(
            "{} packed values left over after {} levels",
            packed.len() - next,
            levels.len()
        )));
    }

    TypedArray::from_vec(values).with_validity(validity)
}
