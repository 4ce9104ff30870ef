//! Test utilities for parquet-codec

#[cfg(test)]
pub mod test {
    use crate::metadata::{ConvertedType, FieldRepetitionType, SchemaElement, Type};

    /// Flat schema: required `id`, optional `name`, `age` and `salary`
    pub fn sample_elements() -> Vec<SchemaElement> {
        vec![
            SchemaElement::new_group("schema", None, 4),
            SchemaElement::new_leaf("id", Type::INT64, FieldRepetitionType::REQUIRED),
            SchemaElement::new_leaf("name", Type::BYTE_ARRAY, FieldRepetitionType::OPTIONAL)
                .with_converted_type(ConvertedType::UTF8),
            SchemaElement::new_leaf("age", Type::INT32, FieldRepetitionType::OPTIONAL),
            SchemaElement::new_leaf("salary", Type::DOUBLE, FieldRepetitionType::OPTIONAL),
        ]
    }

    /// Schema with a struct and a three-level list
    pub fn nested_elements() -> Vec<SchemaElement> {
        vec![
            SchemaElement::new_group("schema", None, 3),
            SchemaElement::new_leaf("id", Type::INT64, FieldRepetitionType::REQUIRED),
            SchemaElement::new_group("address", Some(FieldRepetitionType::OPTIONAL), 1),
            SchemaElement::new_leaf("city", Type::BYTE_ARRAY, FieldRepetitionType::OPTIONAL)
                .with_converted_type(ConvertedType::UTF8),
            SchemaElement::new_group("tags", Some(FieldRepetitionType::OPTIONAL), 1)
                .with_converted_type(ConvertedType::LIST),
            SchemaElement::new_group("list", Some(FieldRepetitionType::REPEATED), 1),
            SchemaElement::new_leaf("element", Type::INT32, FieldRepetitionType::OPTIONAL),
        ]
    }
}

#[cfg(test)]
mod test_utils_tests {
    use super::test::*;

    #[test]
    fn test_sample_elements() {
        let elements = sample_elements();
        assert_eq!(elements[0].num_children, Some(4));
        assert_eq!(elements.len(), 5);
        assert!(elements[1..].iter().all(|e| !e.is_group()));
    }

    #[test]
    fn test_nested_elements_groups() {
        let groups: Vec<_> = nested_elements()
            .into_iter()
            .filter(|e| e.is_group())
            .map(|e| e.name)
            .collect();
        assert_eq!(groups, vec!["schema", "address", "tags", "list"]);
    }
}
