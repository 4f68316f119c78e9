use tracing::trace;

use crate::MK_CHILDREN;

use super::ast::{Node, NodeKind, NodePath};
#[cfg(test)]
use super::ast::{NodeId, NodeTag};

/// A child together with the parent field it is stored in and, for list
/// fields, its position.
pub type Child<'a> = (&'static str, Option<usize>, &'a Node);
pub type ChildMut<'a> = (&'static str, Option<usize>, &'a mut Node);

impl Node {
    /// Direct children in declaration order.
    pub fn children(&self) -> Vec<Child<'_>> {
        MK_CHILDREN!(&self.kind, as_ref, iter, as_deref)
    }

    pub fn children_mut(&mut self) -> Vec<ChildMut<'_>> {
        MK_CHILDREN!(&mut self.kind, as_mut, iter_mut, as_deref_mut)
    }
}

/// Assigns the parent link of every node below `node`. The root itself is
/// left unlinked.
pub fn mark_parent(node: &mut Node) {
    let parent = node.id;
    let parent_tag = node.tag();

    for (attribute, index, child) in node.children_mut() {
        child.path = Some(NodePath {
            parent,
            parent_tag,
            attribute,
            index,
        });
        mark_parent(child);
    }
}

pub fn mark_parents(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        mark_parent(node);
    }
    trace!(roots = nodes.len(), "parent links assigned");
}

/// Depth first, parents before children.
pub fn walk<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
    visit(node);
    for (_, _, child) in node.children() {
        walk(child, visit);
    }
}

#[cfg(test)]
pub fn find_node(root: &Node, id: NodeId) -> Option<&Node> {
    if root.id == id {
        return Some(root);
    }

    root.children()
        .into_iter()
        .find_map(|(_, _, child)| find_node(child, id))
}

/// Follows parent links upwards from `id` to the closest ancestor tagged
/// `tag`.
#[cfg(test)]
pub fn find_enclosing(root: &Node, id: NodeId, tag: NodeTag) -> Option<&Node> {
    let mut current = find_node(root, id)?;

    while let Some(path) = &current.path {
        current = find_node(root, path.parent)?;
        if current.tag() == tag {
            return Some(current);
        }
    }

    None
}
