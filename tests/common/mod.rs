#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use cladecut::{is_convex, NodeIndex, TaxonTree};

/// Builds a caterpillar tree whose leaves read left to right in the order
/// of `colors`, colored accordingly.
pub fn caterpillar(colors: &[char]) -> (TaxonTree, HashMap<NodeIndex, char>, Vec<NodeIndex>) {
    assert!(colors.len() >= 2, "a caterpillar needs at least two leaves");
    let mut tree = TaxonTree::new();
    let leaves: Vec<_> = colors.iter().map(|_| tree.add_leaf()).collect();
    let mut hook = tree.add_internal(&[leaves[0], leaves[1]]);
    if colors.len() == 2 {
        tree.set_root(hook);
    } else {
        for &leaf in &leaves[2..colors.len() - 1] {
            hook = tree.add_internal(&[hook, leaf]);
        }
        tree.add_root(&[hook, leaves[colors.len() - 1]]);
    }
    let map = leaves.iter().zip(colors).map(|(&l, &c)| (l, c)).collect();
    (tree, map, leaves)
}

/// Builds a balanced four-leaf tree ((l0, l1), (l2, l3)).
pub fn balanced4(colors: &[char]) -> (TaxonTree, HashMap<NodeIndex, char>, Vec<NodeIndex>) {
    assert_eq!(colors.len(), 4);
    let mut tree = TaxonTree::new();
    let leaves: Vec<_> = colors.iter().map(|_| tree.add_leaf()).collect();
    let x = tree.add_internal(&[leaves[0], leaves[1]]);
    let y = tree.add_internal(&[leaves[2], leaves[3]]);
    tree.add_root(&[x, y]);
    let map = leaves.iter().zip(colors).map(|(&l, &c)| (l, c)).collect();
    (tree, map, leaves)
}

/// Builds a balanced eight-leaf tree (((0,1),(2,3)),((4,5),(6,7))).
pub fn balanced8(colors: &[char]) -> (TaxonTree, HashMap<NodeIndex, char>, Vec<NodeIndex>) {
    assert_eq!(colors.len(), 8);
    let mut tree = TaxonTree::new();
    let leaves: Vec<_> = colors.iter().map(|_| tree.add_leaf()).collect();
    let cherries: Vec<_> = leaves
        .chunks(2)
        .map(|pair| tree.add_internal(pair))
        .collect();
    let left = tree.add_internal(&[cherries[0], cherries[1]]);
    let right = tree.add_internal(&[cherries[2], cherries[3]]);
    tree.add_root(&[left, right]);
    let map = leaves.iter().zip(colors).map(|(&l, &c)| (l, c)).collect();
    (tree, map, leaves)
}

/// Exhaustively finds the size of the largest convex leaf subset. Only
/// usable on small trees.
pub fn brute_force_max_convex(tree: &TaxonTree, colors: &HashMap<NodeIndex, char>) -> usize {
    let leaves: Vec<_> = tree.leaves().collect();
    assert!(leaves.len() <= 16, "brute force is for small fixtures only");
    let mut best = 0;
    for mask in 0u32..(1 << leaves.len()) {
        let subset: BTreeSet<NodeIndex> = leaves
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &leaf)| leaf)
            .collect();
        if subset.len() > best && is_convex(tree, colors, &subset) {
            best = subset.len();
        }
    }
    best
}
