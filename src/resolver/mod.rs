//! Dependency resolver: topologically orders tables by foreign-key edges
//! using Kahn's algorithm.
//!
//! Grounded on the teacher's `schema::graph::SchemaGraph::topo_sort`
//! (in-degree counting via a `VecDeque`), inverted here because this
//! crate's [`crate::schema::Constraint`] is borne by the parent rather than
//! the child; error shape grounded on the original `resolveTableGraph`'s
//! "Circular dependency found -> ..." message.

use crate::error::DumpError;
use crate::schema::Schema;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// Tables in dependency order: parents appear before every child that
/// references them. Holds indices into the originating `Schema::tables`.
#[derive(Debug, Clone)]
pub struct TableOrder {
    pub order: Vec<usize>,
    /// For each table index, the set of parent table indices it must wait on.
    pub parents: Vec<Vec<usize>>,
}

pub fn resolve(schema: &Schema) -> Result<TableOrder, DumpError> {
    let n = schema.tables.len();
    let index_of: AHashMap<String, usize> = schema.index_map();

    // parents[child] = set of parent indices; built by scanning each
    // table's incoming_edges (it is the parent) and recording itself as a
    // parent of the referenced child, skipping self-references.
    let mut parents: Vec<AHashSet<usize>> = vec![AHashSet::new(); n];
    for (parent_idx, table) in schema.tables.iter().enumerate() {
        for edge in &table.incoming_edges {
            let Some(&child_idx) = index_of.get(&edge.referencing_table.to_lowercase()) else {
                continue;
            };
            if child_idx == parent_idx {
                continue;
            }
            parents[child_idx].insert(parent_idx);
        }
    }

    let mut remaining: Vec<AHashSet<usize>> = parents.clone();
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (i, p) in remaining.iter().enumerate() {
        if p.is_empty() {
            queue.push_back(i);
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut done = vec![false; n];

    while let Some(idx) = queue.pop_front() {
        if done[idx] {
            continue;
        }
        done[idx] = true;
        order.push(idx);

        for (other, parent_set) in remaining.iter_mut().enumerate() {
            if done[other] {
                continue;
            }
            if parent_set.remove(&idx) && parent_set.is_empty() {
                queue.push_back(other);
            }
        }
    }

    if order.len() != n {
        let nodes: Vec<String> = (0..n)
            .filter(|i| !done[*i])
            .map(|i| schema.tables[i].name.clone())
            .collect();
        return Err(DumpError::CircularDependency { nodes });
    }

    Ok(TableOrder {
        order,
        parents: parents.into_iter().map(|s| s.into_iter().collect()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Constraint, DataType, Table};

    fn table(name: &str, incoming_edges: Vec<Constraint>) -> Table {
        Table {
            name: name.to_string(),
            charset: String::new(),
            collation: String::new(),
            create_ddl: String::new(),
            columns: vec![Column {
                name: "id".to_string(),
                ordinal: 0,
                declared_type: "int".to_string(),
                data_type: DataType::Integer,
            }],
            incoming_edges,
            triggers: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn schema(tables: Vec<Table>) -> Schema {
        Schema {
            database: "test".to_string(),
            charset: "utf8".to_string(),
            collation: "utf8_general_ci".to_string(),
            create_ddl: String::new(),
            tables,
            views: Vec::new(),
            routines: Vec::new(),
        }
    }

    #[test]
    fn orders_parent_before_child() {
        let users = table("users", vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "posts".to_string(),
            referencing_column: "user_id".to_string(),
        }]);
        let posts = table("posts", vec![]);
        let s = schema(vec![posts, users]);
        let resolved = resolve(&s).unwrap();
        let users_pos = resolved.order.iter().position(|&i| s.tables[i].name == "users").unwrap();
        let posts_pos = resolved.order.iter().position(|&i| s.tables[i].name == "posts").unwrap();
        assert!(users_pos < posts_pos);
    }

    #[test]
    fn detects_cycles() {
        let a = table("a", vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "b".to_string(),
            referencing_column: "a_id".to_string(),
        }]);
        let b = table("b", vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "a".to_string(),
            referencing_column: "b_id".to_string(),
        }]);
        let s = schema(vec![a, b]);
        let err = resolve(&s).unwrap_err();
        match err {
            DumpError::CircularDependency { nodes } => assert_eq!(nodes.len(), 2),
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn self_references_are_ignored() {
        let t = table("tree", vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "tree".to_string(),
            referencing_column: "parent_id".to_string(),
        }]);
        let s = schema(vec![t]);
        let resolved = resolve(&s).unwrap();
        assert_eq!(resolved.order, vec![0]);
    }
}
