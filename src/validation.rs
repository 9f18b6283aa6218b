use std::collections::HashMap;
use std::hash::Hash;

use crate::error::CladecutError;
use crate::tree::{NodeIndex, TaxonTree};

/// Defensive structural checks run at the head of every public operation.
/// Malformed trees are not expected in normal operation; when one shows up
/// the failure should name what is wrong rather than panic mid-algorithm.
#[derive(Debug, Clone)]
pub(crate) struct TreeValidator<'a> {
    tree: &'a TaxonTree,
}

impl<'a> TreeValidator<'a> {
    pub(crate) fn new(tree: &'a TaxonTree) -> Self {
        Self { tree }
    }

    pub(crate) fn validate(&self) -> Result<(), CladecutError> {
        if self.tree.num_nodes() == 0 {
            return Err(CladecutError::EmptyTree);
        }
        let root = match self.tree.root() {
            Some(root) => root,
            None => {
                return Err(CladecutError::Structural(String::from(
                    "no root has been set",
                )))
            }
        };
        if root >= self.tree.num_nodes() {
            return Err(CladecutError::Structural(format!(
                "root index {root} is out of bounds"
            )));
        }
        if let Some(parent) = self.tree.parent(root) {
            return Err(CladecutError::Structural(format!(
                "root {root} has parent {parent}"
            )));
        }
        self.validate_links()?;
        self.validate_reachability(root)?;
        Ok(())
    }

    /// Every parent/child link must be mutual and in bounds.
    fn validate_links(&self) -> Result<(), CladecutError> {
        let n = self.tree.num_nodes();
        for node in 0..n {
            for &child in self.tree.children(node) {
                if child >= n {
                    return Err(CladecutError::Structural(format!(
                        "node {node} lists out-of-bounds child {child}"
                    )));
                }
                if self.tree.parent(child) != Some(node) {
                    return Err(CladecutError::Structural(format!(
                        "child {child} of node {node} does not point back to it"
                    )));
                }
            }
            if let Some(parent) = self.tree.parent(node) {
                if parent >= n {
                    return Err(CladecutError::Structural(format!(
                        "node {node} has out-of-bounds parent {parent}"
                    )));
                }
                if !self.tree.children(parent).contains(&node) {
                    return Err(CladecutError::Structural(format!(
                        "parent {parent} of node {node} does not list it as a child"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every node must be reached from the root exactly once. A node seen
    /// twice means sharing or a cycle; a node never seen means a second
    /// component.
    fn validate_reachability(&self, root: NodeIndex) -> Result<(), CladecutError> {
        let n = self.tree.num_nodes();
        let mut visited = vec![false; n];
        let mut stack = vec![root];
        let mut count = 0usize;
        while let Some(node) = stack.pop() {
            if visited[node] {
                return Err(CladecutError::Structural(format!(
                    "node {node} is reachable from the root more than once"
                )));
            }
            visited[node] = true;
            count += 1;
            stack.extend(self.tree.children(node).iter().copied());
        }
        if count != n {
            return Err(CladecutError::Structural(format!(
                "{} of {n} nodes are not reachable from the root",
                n - count
            )));
        }
        Ok(())
    }
}

/// Checks that a leaf coloring fits the tree: colors may only be keyed on
/// in-bounds leaf indices, and, when the caller requires a full coloring,
/// every leaf must have one.
pub(crate) fn validate_coloring<C: Eq + Hash>(
    tree: &TaxonTree,
    colors: &HashMap<NodeIndex, C>,
    require_full_coloring: bool,
) -> Result<(), CladecutError> {
    for &node in colors.keys() {
        if node >= tree.num_nodes() {
            return Err(CladecutError::InvalidColoring(format!(
                "color assigned to out-of-bounds node {node}"
            )));
        }
        if !tree.is_leaf(node) {
            return Err(CladecutError::InvalidColoring(format!(
                "color assigned to internal node {node}"
            )));
        }
    }
    if require_full_coloring {
        for leaf in tree.leaves() {
            if !colors.contains_key(&leaf) {
                return Err(CladecutError::MissingColor(format!(
                    "leaf {leaf} has no color"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_is_rejected() {
        let tree = TaxonTree::new();
        let result = TreeValidator::new(&tree).validate();
        assert!(matches!(result, Err(CladecutError::EmptyTree)));
    }

    #[test]
    fn missing_root_is_rejected() {
        let mut tree = TaxonTree::new();
        tree.add_leaf();
        let result = TreeValidator::new(&tree).validate();
        assert!(matches!(result, Err(CladecutError::Structural(_))));
    }

    #[test]
    fn shared_child_is_rejected() {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        // `a` is claimed by two internal nodes; its parent link can only
        // point at one of them.
        let x = tree.add_internal(&[a, b]);
        let y = tree.add_internal(&[a, x]);
        tree.set_root(y);
        let result = TreeValidator::new(&tree).validate();
        assert!(matches!(result, Err(CladecutError::Structural(_))));
    }

    #[test]
    fn disconnected_node_is_rejected() {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        tree.add_leaf(); // never attached
        let root = tree.add_internal(&[a, b]);
        tree.set_root(root);
        let result = TreeValidator::new(&tree).validate();
        assert!(matches!(result, Err(CladecutError::Structural(_))));
    }

    #[test]
    fn well_formed_tree_passes() {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        let c = tree.add_leaf();
        let inner = tree.add_internal(&[a, b]);
        tree.add_root(&[inner, c]);
        assert!(TreeValidator::new(&tree).validate().is_ok());
    }

    #[test]
    fn coloring_on_internal_node_is_rejected() {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        let root = tree.add_root(&[a, b]);
        let colors = HashMap::from([(root, 'x')]);
        let result = validate_coloring(&tree, &colors, false);
        assert!(matches!(result, Err(CladecutError::InvalidColoring(_))));
    }

    #[test]
    fn partial_coloring_requires_opt_in_to_fail() {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        tree.add_root(&[a, b]);
        let colors = HashMap::from([(a, 'x')]);
        assert!(validate_coloring(&tree, &colors, false).is_ok());
        let result = validate_coloring(&tree, &colors, true);
        assert!(matches!(result, Err(CladecutError::MissingColor(_))));
    }
}
