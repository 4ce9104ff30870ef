use crate::schema::{ColumnDescriptor, Schema, SchemaNode};

/// Lookup over a schema tree by dotted path, e.g. `"address.city"`.
/// Paths start below the root; the root itself has no path.
pub trait SchemaInspector {
    /// Groups and leaves below the root
    fn node_count(&self) -> usize;

    fn find(&self, path: &str) -> Option<&SchemaNode>;

    fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Every node path in pre-order
    fn field_paths(&self) -> Vec<String>;

    /// Leaf column addressed by `path`, if that path names a leaf.
    fn column_by_path(&self, path: &str) -> Option<&ColumnDescriptor>;
}

impl SchemaInspector for Schema {
    fn node_count(&self) -> usize {
        walk(&self.root).count()
    }

    fn find(&self, path: &str) -> Option<&SchemaNode> {
        if path.is_empty() {
            return None;
        }
        path.split('.').try_fold(&self.root, |node, name| {
            node_children(node).iter().find(|child| child.name() == name)
        })
    }

    fn field_paths(&self) -> Vec<String> {
        walk(&self.root).map(|(path, _)| path).collect()
    }

    fn column_by_path(&self, path: &str) -> Option<&ColumnDescriptor> {
        match self.find(path)? {
            SchemaNode::Primitive { column_index, .. } => self.column(*column_index),
            SchemaNode::Group { .. } => None,
        }
    }
}

fn node_children(node: &SchemaNode) -> &[SchemaNode] {
    match node {
        SchemaNode::Group { fields, .. } => fields,
        SchemaNode::Primitive { .. } => &[],
    }
}

/// Pre-order walk below `root`, yielding each node with its dotted path.
fn walk(root: &SchemaNode) -> impl Iterator<Item = (String, &SchemaNode)> {
    let mut stack: Vec<(String, &SchemaNode)> = node_children(root)
        .iter()
        .rev()
        .map(|child| (child.name().to_string(), child))
        .collect();
    std::iter::from_fn(move || {
        let (path, node) = stack.pop()?;
        for child in node_children(node).iter().rev() {
            stack.push((format!("{}.{}", path, child.name()), child));
        }
        Some((path, node))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test::nested_elements;

    #[test]
    fn test_find_and_contains() {
        let schema = Schema::try_from_elements(&nested_elements()).unwrap();

        // id, address, address.city, tags, tags.list, tags.list.element
        assert_eq!(schema.node_count(), 6);

        assert!(schema.contains("address"));
        assert!(schema.contains("tags.list.element"));
        assert!(!schema.contains("address.zip"));
        assert!(!schema.contains(""));

        let city = schema.find("address.city").unwrap();
        assert!(city.is_leaf());
        assert_eq!(city.name(), "city");
    }

    #[test]
    fn test_field_paths_pre_order() {
        let schema = Schema::try_from_elements(&nested_elements()).unwrap();
        assert_eq!(
            schema.field_paths(),
            vec![
                "id",
                "address",
                "address.city",
                "tags",
                "tags.list",
                "tags.list.element"
            ]
        );
    }

    #[test]
    fn test_column_by_path() {
        let schema = Schema::try_from_elements(&nested_elements()).unwrap();
        let element = schema.column_by_path("tags.list.element").unwrap();
        assert_eq!(element.path_string(), "tags.list.element");
        assert!(schema.column_by_path("tags").is_none());
        assert!(schema.column_by_path("nope").is_none());
    }
}
