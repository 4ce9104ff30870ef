use crate::metadata::{FieldRepetitionType, SchemaElement, Type};
use crate::{ParquetError, Result};

/// Nested schema rebuilt from the footer's flattened element list
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub root: SchemaNode,
    columns: Vec<ColumnDescriptor>,
}

/// Represents a node in the Parquet schema tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A group with named children (struct, list or map wrapper)
    Group {
        element: SchemaElement,
        fields: Vec<SchemaNode>,
    },
    /// A leaf column
    Primitive {
        element: SchemaElement,
        /// Index into [`Schema::columns`]
        column_index: usize,
    },
}

/// A leaf column together with the levels derived from its ancestors
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub element: SchemaElement,
    /// Names from the first child of the root down to the leaf
    pub path: Vec<String>,
    /// Nesting depth; children of the root have depth 1
    pub depth: usize,
    pub max_definition_level: i16,
    pub max_repetition_level: i16,
}

impl ColumnDescriptor {
    /// A top-level column with no ancestors besides the root.
    pub fn new_top_level(element: SchemaElement) -> Self {
        let max_definition_level = i16::from(element.repetition() != FieldRepetitionType::REQUIRED);
        let max_repetition_level = i16::from(element.repetition() == FieldRepetitionType::REPEATED);
        ColumnDescriptor {
            path: vec![element.name.clone()],
            element,
            depth: 1,
            max_definition_level,
            max_repetition_level,
        }
    }

    pub fn name(&self) -> &str {
        &self.element.name
    }

    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    pub fn physical_type(&self) -> Option<Type> {
        self.element.physical_type
    }

    /// Whether any slot of this column can be null
    pub fn is_nullable(&self) -> bool {
        self.max_definition_level > 0
    }
}

impl SchemaNode {
    pub fn element(&self) -> &SchemaElement {
        match self {
            SchemaNode::Group { element, .. } => element,
            SchemaNode::Primitive { element, .. } => element,
        }
    }

    /// Get the name of this schema node
    pub fn name(&self) -> &str {
        &self.element().name
    }

    /// Check if this node is nullable
    pub fn is_nullable(&self) -> bool {
        self.repetition() == FieldRepetitionType::OPTIONAL
    }

    pub fn repetition(&self) -> FieldRepetitionType {
        self.element().repetition()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, SchemaNode::Primitive { .. })
    }

    fn flatten_into(&self, out: &mut Vec<SchemaElement>) {
        match self {
            SchemaNode::Group { element, fields } => {
                let mut element = element.clone();
                element.num_children = Some(fields.len() as i32);
                out.push(element);
                for field in fields {
                    field.flatten_into(out);
                }
            }
            SchemaNode::Primitive { element, .. } => out.push(element.clone()),
        }
    }
}

struct Levels {
    definition: i16,
    repetition: i16,
    depth: usize,
}

struct TreeBuilder<'a> {
    elements: &'a [SchemaElement],
    next: usize,
    columns: Vec<ColumnDescriptor>,
}

impl<'a> TreeBuilder<'a> {
    /// Each child takes at least one element, so a count past the end of
    /// the list can never be satisfied.
    fn check_children(&self, name: &str, num_children: i32) -> Result<()> {
        let remaining = self.elements.len().saturating_sub(self.next);
        if num_children as usize > remaining {
            return Err(ParquetError::schema(format!(
                "schema truncated: '{}' declares {} children but only {} elements follow",
                name, num_children, remaining
            )));
        }
        Ok(())
    }

    fn build_child(&mut self, path: &[String], parent: &Levels) -> Result<SchemaNode> {
        let index = self.next;
        let element = self.elements.get(index).ok_or_else(|| {
            ParquetError::schema(format!(
                "schema truncated: expected element {} but list has {}",
                index,
                self.elements.len()
            ))
        })?;
        self.next += 1;

        let repetition = element.repetition();
        let levels = Levels {
            definition: parent.definition + i16::from(repetition != FieldRepetitionType::REQUIRED),
            repetition: parent.repetition + i16::from(repetition == FieldRepetitionType::REPEATED),
            depth: parent.depth + 1,
        };
        let mut path = path.to_vec();
        path.push(element.name.clone());

        let num_children = element.num_children.unwrap_or(0);
        if num_children < 0 {
            return Err(ParquetError::schema(format!(
                "element '{}' has negative num_children {}",
                element.name, num_children
            )));
        }

        if num_children > 0 || (element.physical_type.is_none() && element.num_children.is_some()) {
            self.check_children(&element.name, num_children)?;
            let mut fields = Vec::with_capacity(num_children as usize);
            for _ in 0..num_children {
                fields.push(self.build_child(&path, &levels)?);
            }
            return Ok(SchemaNode::Group {
                element: element.clone(),
                fields,
            });
        }

        if element.physical_type.is_none() {
            return Err(ParquetError::schema(format!(
                "leaf '{}' has no physical type",
                path.join(".")
            )));
        }

        let column_index = self.columns.len();
        self.columns.push(ColumnDescriptor {
            element: element.clone(),
            path,
            depth: levels.depth,
            max_definition_level: levels.definition,
            max_repetition_level: levels.repetition,
        });
        Ok(SchemaNode::Primitive {
            element: element.clone(),
            column_index,
        })
    }
}

impl Schema {
    /// Rebuilds the tree from a depth-first element list whose first entry
    /// is the root.
    pub fn try_from_elements(elements: &[SchemaElement]) -> Result<Self> {
        let root = elements
            .first()
            .ok_or_else(|| ParquetError::schema("schema has no root element"))?;
        let num_children = root.num_children.unwrap_or(0);
        if root.physical_type.is_some() || num_children < 0 {
            return Err(ParquetError::schema(format!(
                "root '{}' must be a group",
                root.name
            )));
        }

        let mut builder = TreeBuilder {
            elements,
            next: 1,
            columns: Vec::new(),
        };
        let root_levels = Levels {
            definition: 0,
            repetition: 0,
            depth: 0,
        };
        builder.check_children(&root.name, num_children)?;
        let mut fields = Vec::with_capacity(num_children as usize);
        for _ in 0..num_children {
            fields.push(builder.build_child(&[], &root_levels)?);
        }

        if builder.next != elements.len() {
            return Err(ParquetError::schema(format!(
                "schema has {} trailing elements after the root's children",
                elements.len() - builder.next
            )));
        }

        Ok(Schema {
            root: SchemaNode::Group {
                element: root.clone(),
                fields,
            },
            columns: builder.columns,
        })
    }

    /// Flattens back to the depth-first form stored in the footer.
    pub fn to_elements(&self) -> Vec<SchemaElement> {
        let mut out = Vec::new();
        self.root.flatten_into(&mut out);
        out
    }

    /// Leaf columns in file order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Builder for creating schemas
pub struct SchemaBuilder {
    name: String,
    fields: Vec<SchemaNode>,
}

impl SchemaBuilder {
    pub fn new<S: Into<String>>(root_name: S) -> Self {
        Self {
            name: root_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn leaf(mut self, element: SchemaElement) -> Self {
        self.fields.push(SchemaNode::Primitive {
            element,
            column_index: 0,
        });
        self
    }

    pub fn group(mut self, element: SchemaElement, fields: Vec<SchemaNode>) -> Self {
        self.fields.push(SchemaNode::Group { element, fields });
        self
    }

    /// Flattens the added nodes and rebuilds them, which assigns column
    /// indices and levels.
    pub fn build(self) -> Result<Schema> {
        let root = SchemaNode::Group {
            element: SchemaElement::new_group(self.name, None, 0),
            fields: self.fields,
        };
        let mut elements = Vec::new();
        root.flatten_into(&mut elements);
        Schema::try_from_elements(&elements)
    }
}
