//! Tree flattening.
//!
//! Nested nodes of the same operator are merged into their parent:
//! `OR(a, OR(b, c))` becomes `OR(a, b, c)`. A child is only merged when doing
//! so cannot change what the tree matches:
//!
//! - its field is unset or equal to the parent's field;
//! - for `NEAR` and `PHRASE`, its gap equals the parent's gap;
//! - for `NOT` and `AND_MAYBE`, it is the first child.
//!
//! The pass is bottom-up and idempotent.

use std::mem;

use crate::ast::{Node, Operator};

/// Flattens nested same-operator nodes.
pub fn optimize(mut node: Node) -> Node {
    let parent = Parent {
        operator: node.operator(),
        gap: node.gap(),
        field: node.field().map(str::to_owned),
    };
    if let Some(children) = node.children_mut() {
        let old = mem::take(children);
        let mut flat = Vec::with_capacity(old.len());
        for (index, child) in old.into_iter().enumerate() {
            parent.absorb(&mut flat, optimize(child), index == 0);
        }
        *children = flat;
    }
    node
}

/// What a child must agree with to be merged.
struct Parent {
    /// Parent operator.
    operator: Operator,
    /// Parent gap, for positional operators.
    gap: Option<u32>,
    /// Parent field scope.
    field: Option<String>,
}

impl Parent {
    /// Whether `child`, sitting first or not, can be merged into this parent.
    fn can_merge(&self, child: &Node, first: bool) -> bool {
        if child.operator() != self.operator || child.gap() != self.gap {
            return false;
        }
        if matches!(self.operator, Operator::Not | Operator::AndMaybe) && !first {
            return false;
        }
        child.field().is_none() || child.field() == self.field.as_deref()
    }

    /// Appends `child` to `flat`, merging it (and, transitively, its
    /// mergeable children) when allowed.
    fn absorb(&self, flat: &mut Vec<Node>, mut child: Node, first: bool) {
        if !self.can_merge(&child, first) {
            flat.push(child);
            return;
        }
        let grandchildren = child.children_mut().map(mem::take).unwrap_or_default();
        for (index, grandchild) in grandchildren.into_iter().enumerate() {
            self.absorb(flat, grandchild, first && index == 0);
        }
    }
}
