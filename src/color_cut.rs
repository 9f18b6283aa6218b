use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use log::debug;

use crate::metadata::{CladeMetadata, ColorId, ColorSet};
use crate::tree::{NodeIndex, TaxonTree};

/// Computes, for every node, the set of colors whose minimal spanning
/// subtree crosses the edge above that node. The caller is expected to have
/// validated the tree and the coloring already.
pub(crate) struct ColorCutAnnotator<'a, C> {
    tree: &'a TaxonTree,
    colors: &'a HashMap<NodeIndex, C>,
}

impl<'a, C: Clone + Eq + Hash + Ord> ColorCutAnnotator<'a, C> {
    pub(crate) fn new(tree: &'a TaxonTree, colors: &'a HashMap<NodeIndex, C>) -> Self {
        Self { tree, colors }
    }

    pub(crate) fn annotate(&self) -> CladeMetadata<C> {
        let (palette, leaf_colors) = self.intern_colors();
        let parent: Vec<Option<NodeIndex>> =
            (0..self.tree.num_nodes()).map(|n| self.tree.parent(n)).collect();

        let mut cut_colors = self.mark_upward(&leaf_colors);
        self.prune_downward(&mut cut_colors);

        debug!(
            "annotated {} nodes with {} distinct colors",
            self.tree.num_nodes(),
            palette.len()
        );

        CladeMetadata {
            parent,
            leaf_colors,
            cut_colors,
            palette,
        }
    }

    /// Interns colors against a sorted palette, so interned ids are dense
    /// and deterministic for a given coloring.
    fn intern_colors(&self) -> (Vec<C>, Vec<Option<ColorId>>) {
        let distinct: BTreeSet<&C> = self.colors.values().collect();
        let palette: Vec<C> = distinct.iter().map(|&c| c.clone()).collect();
        let index: HashMap<&C, ColorId> = distinct
            .iter()
            .enumerate()
            .map(|(id, &color)| (color, id))
            .collect();

        let mut leaf_colors = vec![None; self.tree.num_nodes()];
        for (&leaf, color) in self.colors {
            leaf_colors[leaf] = Some(index[color]);
        }
        (palette, leaf_colors)
    }

    /// Pass 1: from each colored leaf (inclusive), walk up through its
    /// ancestors adding the leaf's color, stopping as soon as a node
    /// already carries it. Everything above such a node was marked, or
    /// will be marked, by the same propagation chain.
    fn mark_upward(&self, leaf_colors: &[Option<ColorId>]) -> Vec<ColorSet> {
        let mut cut_colors = vec![ColorSet::new(); self.tree.num_nodes()];
        for leaf in 0..self.tree.num_nodes() {
            let color = match leaf_colors[leaf] {
                Some(color) => color,
                None => continue,
            };
            let mut current = Some(leaf);
            while let Some(node) = current {
                if !cut_colors[node].insert(color) {
                    break;
                }
                current = self.tree.parent(node);
            }
        }
        cut_colors
    }

    /// Pass 2: starting at the root with an empty "okayed" set, keep in
    /// each child's cut set only the colors that are split across two or
    /// more sibling subtrees at some level at or above it. A child whose
    /// set is unchanged is already a fixed point, and its whole subtree is
    /// skipped: a color removed here cannot reappear lower down.
    fn prune_downward(&self, cut_colors: &mut [ColorSet]) {
        let root = match self.tree.root() {
            Some(root) => root,
            None => return,
        };
        let mut stack: Vec<(NodeIndex, ColorSet)> = vec![(root, ColorSet::new())];
        while let Some((node, mut okayed)) = stack.pop() {
            if self.tree.is_leaf(node) {
                continue;
            }
            okayed.extend(shared_cut_colors(self.tree.children(node), cut_colors));
            for &child in self.tree.children(node) {
                let pruned: ColorSet =
                    cut_colors[child].intersection(&okayed).copied().collect();
                if pruned != cut_colors[child] {
                    cut_colors[child] = pruned;
                    stack.push((child, okayed.clone()));
                }
            }
        }
    }
}

/// The colors that appear in the cut sets of at least two of the given
/// children. Equivalent to the union over all child pairs of their cut-set
/// intersections, computed by counting instead of enumerating pairs.
pub(crate) fn shared_cut_colors(children: &[NodeIndex], cut_colors: &[ColorSet]) -> ColorSet {
    let mut counts: HashMap<ColorId, usize> = HashMap::new();
    for &child in children {
        for &color in &cut_colors[child] {
            *counts.entry(color).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count >= 2)
        .map(|(color, _)| color)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Balanced four-leaf tree with interleaved colors: ((a,b),(c,d)) with
    /// a,c colored 'A' and b,d colored 'B'.
    fn interleaved() -> (TaxonTree, HashMap<NodeIndex, char>, [NodeIndex; 7]) {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        let c = tree.add_leaf();
        let d = tree.add_leaf();
        let x = tree.add_internal(&[a, b]);
        let y = tree.add_internal(&[c, d]);
        let root = tree.add_root(&[x, y]);
        let colors = HashMap::from([(a, 'A'), (b, 'B'), (c, 'A'), (d, 'B')]);
        (tree, colors, [a, b, c, d, x, y, root])
    }

    #[test]
    fn marking_reaches_the_root_and_stops_early() {
        let (tree, colors, [a, b, c, d, x, y, root]) = interleaved();
        let annotator = ColorCutAnnotator::new(&tree, &colors);
        let (_, leaf_colors) = annotator.intern_colors();
        let marked = annotator.mark_upward(&leaf_colors);
        // 'A' interned as 0, 'B' as 1 (sorted palette)
        assert_eq!(marked[a], ColorSet::from([0]));
        assert_eq!(marked[b], ColorSet::from([1]));
        assert_eq!(marked[c], ColorSet::from([0]));
        assert_eq!(marked[d], ColorSet::from([1]));
        assert_eq!(marked[x], ColorSet::from([0, 1]));
        assert_eq!(marked[y], ColorSet::from([0, 1]));
        assert_eq!(marked[root], ColorSet::from([0, 1]));
    }

    #[test]
    fn pruning_only_removes_colors() {
        let (tree, colors, _) = interleaved();
        let annotator = ColorCutAnnotator::new(&tree, &colors);
        let (_, leaf_colors) = annotator.intern_colors();
        let marked = annotator.mark_upward(&leaf_colors);
        let mut pruned = marked.clone();
        annotator.prune_downward(&mut pruned);
        for node in 0..tree.num_nodes() {
            assert!(
                pruned[node].is_subset(&marked[node]),
                "pass 2 must never add colors at node {node}"
            );
        }
    }

    #[test]
    fn pruning_clears_unconflicted_colors() {
        // Caterpillar with a convex coloring [A, A, B]: nothing conflicts,
        // so every cut set below the root empties out.
        let mut tree = TaxonTree::new();
        let l0 = tree.add_leaf();
        let l1 = tree.add_leaf();
        let l2 = tree.add_leaf();
        let n1 = tree.add_internal(&[l0, l1]);
        tree.add_root(&[n1, l2]);
        let colors = HashMap::from([(l0, 'A'), (l1, 'A'), (l2, 'B')]);
        let metadata = ColorCutAnnotator::new(&tree, &colors).annotate();
        // The two 'A' leaves still split across n1's children
        assert_eq!(*metadata.cut(l0), ColorSet::from([0]));
        assert_eq!(*metadata.cut(l1), ColorSet::from([0]));
        // But nothing conflicts at or above n1, and 'B' conflicts nowhere
        assert_eq!(*metadata.cut(n1), ColorSet::new());
        assert_eq!(*metadata.cut(l2), ColorSet::new());
    }

    #[test]
    fn annotation_is_idempotent() {
        let (tree, colors, _) = interleaved();
        let first = ColorCutAnnotator::new(&tree, &colors).annotate();
        let second = ColorCutAnnotator::new(&tree, &colors).annotate();
        assert_eq!(first.cut_colors, second.cut_colors);
        assert_eq!(first.leaf_colors, second.leaf_colors);
    }

    #[test]
    fn uncolored_leaves_are_ignored() {
        let mut tree = TaxonTree::new();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        let c = tree.add_leaf();
        tree.add_root(&[a, b, c]);
        let colors = HashMap::from([(a, 'A'), (c, 'A')]);
        let metadata = ColorCutAnnotator::new(&tree, &colors).annotate();
        assert_eq!(metadata.leaf_colors[b], None);
        assert_eq!(*metadata.cut(b), ColorSet::new());
        assert_eq!(*metadata.cut(a), ColorSet::from([0]));
    }

    #[test]
    fn shared_cut_colors_counts_pairs() {
        let cut = vec![
            ColorSet::from([0, 1]),
            ColorSet::from([1, 2]),
            ColorSet::from([2]),
        ];
        let shared = shared_cut_colors(&[0, 1, 2], &cut);
        assert_eq!(shared, ColorSet::from([1, 2]));
    }
}
