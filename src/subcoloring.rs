use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::iter::once;

use log::debug;

use crate::color_cut::{shared_cut_colors, ColorCutAnnotator};
use crate::error::CladecutError;
use crate::metadata::{
    best_leaf_set, insert_best, CladeMetadata, ColorId, ColorKey, ColorSet, LeafSet,
    SolutionTable,
};
use crate::params::SolveParams;
use crate::tree::{NodeIndex, TaxonTree};
use crate::validation::{validate_coloring, TreeValidator};

/// The maximum convex subcoloring solver.
///
/// Given a rooted tree and a (possibly partial) leaf coloring, finds the
/// largest subset of leaves whose induced coloring is convex: every
/// retained color's retained leaves form a connected subtree. The root is
/// treated as color-agnostic, so any color may freely cross it.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use cladecut::{ConvexSolver, TaxonTree};
///
/// // ((a, b), (c, d)) with colors interleaved: not convex as given.
/// let mut tree = TaxonTree::new();
/// let a = tree.add_leaf();
/// let b = tree.add_leaf();
/// let c = tree.add_leaf();
/// let d = tree.add_leaf();
/// let x = tree.add_internal(&[a, b]);
/// let y = tree.add_internal(&[c, d]);
/// tree.add_root(&[x, y]);
/// let colors = HashMap::from([(a, 'A'), (b, 'B'), (c, 'A'), (d, 'B')]);
///
/// let solver = ConvexSolver::with_default_params(&tree, &colors);
/// let kept = solver.solve().unwrap();
/// // Dropping any one leaf restores convexity, and no 4-leaf subset works.
/// assert_eq!(kept.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ConvexSolver<'a, C> {
    tree: &'a TaxonTree,
    colors: &'a HashMap<NodeIndex, C>,
    params: SolveParams,
}

impl<'a, C: Clone + Eq + Hash + Ord> ConvexSolver<'a, C> {
    /// Creates a solver over the given tree and leaf coloring with a custom
    /// parameter configuration.
    ///
    /// # Parameters
    /// * `tree` - the rooted tree to solve over; never mutated.
    /// * `colors` - leaf index to color. Leaves absent from the map are
    ///              uncolored, which is legal: they carry no constraint and
    ///              are always retainable.
    /// * `params` - the parameter configuration.
    pub fn new(
        tree: &'a TaxonTree,
        colors: &'a HashMap<NodeIndex, C>,
        params: SolveParams,
    ) -> Self {
        ConvexSolver {
            tree,
            colors,
            params,
        }
    }

    /// Creates a solver over the given tree and leaf coloring using the
    /// default parameters.
    pub fn with_default_params(tree: &'a TaxonTree, colors: &'a HashMap<NodeIndex, C>) -> Self {
        ConvexSolver::new(tree, colors, SolveParams::default())
    }

    /// Computes the per-node cut-color annotation for the tree and
    /// coloring: for every node, the colors whose minimal spanning subtree
    /// crosses the edge above it and which are genuinely split across
    /// sibling subtrees.
    ///
    /// # Returns
    /// * The populated [`CladeMetadata`], or an error if the tree is not a
    ///   single rooted tree or the coloring does not fit it.
    pub fn annotate(&self) -> Result<CladeMetadata<C>, CladecutError> {
        TreeValidator::new(self.tree).validate()?;
        validate_coloring(self.tree, self.colors, self.params.require_full_coloring)?;
        Ok(ColorCutAnnotator::new(self.tree, self.colors).annotate())
    }

    /// Computes the maximum-cardinality convex leaf subset.
    ///
    /// Exact bottom-up dynamic program over the cut-color annotation. The
    /// result is deterministic: when several subsets of equal size achieve
    /// the same used-color combination, the lexicographically smallest set
    /// of leaf indices is kept.
    ///
    /// # Returns
    /// * The selected leaf indices, or an error if the inputs are invalid
    ///   or the per-node subset-search budget is exhausted.
    pub fn solve(&self) -> Result<BTreeSet<NodeIndex>, CladecutError> {
        let metadata = self.annotate()?;
        SubcoloringSearch::new(self.tree, &metadata, &self.params).run()
    }
}

/// The bottom-up table search. Owns the per-node solution tables for the
/// duration of one solve; each child's table is consumed when its parent
/// combines it.
pub(crate) struct SubcoloringSearch<'a, C> {
    tree: &'a TaxonTree,
    metadata: &'a CladeMetadata<C>,
    max_search_states: usize,
    states_left: usize,
    states_total: usize,
}

impl<'a, C> SubcoloringSearch<'a, C> {
    pub(crate) fn new(
        tree: &'a TaxonTree,
        metadata: &'a CladeMetadata<C>,
        params: &SolveParams,
    ) -> Self {
        SubcoloringSearch {
            tree,
            metadata,
            max_search_states: params.max_search_states,
            states_left: params.max_search_states,
            states_total: 0,
        }
    }

    pub(crate) fn run(mut self) -> Result<LeafSet, CladecutError> {
        let root = self.tree.root().ok_or_else(|| {
            CladecutError::Structural(String::from("no root has been set"))
        })?;

        let mut tables: Vec<Option<SolutionTable>> = vec![None; self.tree.num_nodes()];
        for node in self.tree.post_order_iter() {
            let table = if self.tree.is_leaf(node) {
                self.leaf_table(node)?
            } else {
                let mut child_tables = Vec::with_capacity(self.tree.children(node).len());
                for &child in self.tree.children(node) {
                    let child_table = tables[child].take().ok_or_else(|| {
                        CladecutError::Structural(format!(
                            "node {child} visited before its parent {node} expected it"
                        ))
                    })?;
                    child_tables.push(child_table);
                }
                self.combine(node, child_tables)?
            };
            tables[node] = Some(table);
        }

        debug!("subset search explored {} states in total", self.states_total);

        // The root always collapses to a single best entry under the empty
        // used-color set (the root is treated as cutting nothing).
        let answer = tables[root]
            .take()
            .and_then(|table| table.none.get(&ColorKey::new()).cloned())
            .unwrap_or_default();
        Ok(answer)
    }

    /// Builds the solution table for a leaf, hard-checking the annotator's
    /// invariants on the way.
    fn leaf_table(&self, leaf: NodeIndex) -> Result<SolutionTable, CladecutError> {
        let is_root = self.metadata.parent[leaf].is_none();
        let mut table = SolutionTable::new();

        let cut = self.metadata.cut(leaf);
        if is_root || cut.is_empty() {
            // The leaf's color (if any) conflicts with nothing here, so it
            // contributes no used color upward.
            table.none.insert(ColorKey::new(), LeafSet::from([leaf]));
            return Ok(table);
        }

        if cut.len() != 1 {
            return Err(CladecutError::IncoherentCutColors(format!(
                "leaf {leaf} carries {} cut colors",
                cut.len()
            )));
        }
        let cut_color = cut.iter().next().copied().ok_or_else(|| {
            CladecutError::IncoherentCutColors(format!("leaf {leaf} lost its cut color"))
        })?;
        match self.metadata.leaf_colors[leaf] {
            Some(color) if color == cut_color => {}
            Some(_) => {
                return Err(CladecutError::IncoherentCutColors(format!(
                    "cut color at leaf {leaf} differs from the leaf's own color"
                )))
            }
            None => {
                return Err(CladecutError::IncoherentCutColors(format!(
                    "uncolored leaf {leaf} carries a cut color"
                )))
            }
        }

        let key = ColorKey::from([cut_color]);
        let set = LeafSet::from([leaf]);
        table.none.insert(key.clone(), set.clone());
        table
            .per_color
            .entry(cut_color)
            .or_default()
            .insert(key, set);
        Ok(table)
    }

    /// Builds the solution table for an internal node from its children's
    /// tables.
    fn combine(
        &mut self,
        node: NodeIndex,
        child_tables: Vec<SolutionTable>,
    ) -> Result<SolutionTable, CladecutError> {
        let is_root = self.metadata.parent[node].is_none();
        let cut: ColorSet = if is_root {
            ColorSet::new()
        } else {
            self.metadata.cut(node).clone()
        };
        // Colors that conflict between at least two children and therefore
        // cannot both be freely admitted.
        let conflicting =
            shared_cut_colors(self.tree.children(node), &self.metadata.cut_colors);

        debug!(
            "node {node}: {} cut colors, {} conflicting child colors",
            cut.len(),
            conflicting.len()
        );

        self.states_left = self.max_search_states;
        let mut memo: HashMap<Option<ColorId>, Vec<(ColorKey, LeafSet)>> = HashMap::new();
        let mut table = SolutionTable::new();

        let designators: Vec<Option<ColorId>> =
            cut.iter().copied().map(Some).chain(once(None)).collect();
        for &designator in &designators {
            let boundaries: BTreeSet<Option<ColorId>> = conflicting
                .iter()
                .copied()
                .map(Some)
                .chain(once(designator))
                .collect();
            for &boundary in &boundaries {
                if !memo.contains_key(&boundary) {
                    let selections = self.enumerate_selections(node, &child_tables, boundary)?;
                    memo.insert(boundary, selections);
                }
                for (used, leaves) in &memo[&boundary] {
                    // A designator other than the boundary color must not
                    // appear anywhere below: it would be disconnected from
                    // its own occurrences elsewhere.
                    if boundary != designator {
                        if let Some(color) = designator {
                            if used.contains(&color) {
                                continue;
                            }
                        }
                    }
                    insert_best(
                        table.designator_map_mut(designator),
                        used.clone(),
                        leaves.clone(),
                    );
                }
            }
        }

        // With no cut colors this node is not a branch point for any
        // color; only the single best leaf set matters further up.
        if cut.is_empty() {
            let best = best_leaf_set(table.none.values());
            let mut collapsed = SolutionTable::new();
            collapsed.none.insert(ColorKey::new(), best);
            return Ok(collapsed);
        }
        Ok(table)
    }

    /// Enumerates every admissible combination of child contributions for
    /// one boundary color, on an explicit backtracking stack. Each child
    /// contributes nothing, or exactly one of its table entries indexed by
    /// the boundary (falling back to its "none" entries).
    ///
    /// Results are shared across designators; the designator-specific
    /// exclusion is applied by the caller when recording, which yields the
    /// same result set as pruning mid-search since used-color sets only
    /// grow along a path.
    fn enumerate_selections(
        &mut self,
        node: NodeIndex,
        child_tables: &[SolutionTable],
        boundary: Option<ColorId>,
    ) -> Result<Vec<(ColorKey, LeafSet)>, CladecutError> {
        let mut results = Vec::new();
        let mut stack: Vec<(usize, ColorKey, LeafSet)> =
            vec![(0, ColorKey::new(), LeafSet::new())];
        while let Some((child_idx, used, selected)) = stack.pop() {
            if self.states_left == 0 {
                return Err(CladecutError::SearchBudgetExceeded(format!(
                    "more than {} subset states at node {node}",
                    self.max_search_states
                )));
            }
            self.states_left -= 1;
            self.states_total += 1;

            if child_idx == child_tables.len() {
                results.push((used, selected));
                continue;
            }
            // One possible selection ignores this child completely.
            stack.push((child_idx + 1, used.clone(), selected.clone()));

            for (entry_used, entry_leaves) in child_tables[child_idx].entries(boundary) {
                if Self::collides(entry_used, &used, boundary) {
                    continue;
                }
                let mut merged_used = used.clone();
                merged_used.extend(entry_used.iter().copied());
                let mut merged_selected = selected.clone();
                merged_selected.extend(entry_leaves.iter().copied());
                stack.push((child_idx + 1, merged_used, merged_selected));
            }
        }
        Ok(results)
    }

    /// Two children may not both use a color unless it is the boundary
    /// color itself.
    fn collides(entry_used: &ColorKey, used: &ColorKey, boundary: Option<ColorId>) -> bool {
        entry_used
            .iter()
            .any(|&color| used.contains(&color) && Some(color) != boundary)
    }
}

/// Checks whether a retained leaf subset induces a convex coloring: for
/// every color, the minimal spanning subtrees of the retained leaves of
/// distinct colors must be pairwise node-disjoint. Uncolored leaves never
/// block convexity.
pub fn is_convex<C: Clone + Eq + Hash + Ord>(
    tree: &TaxonTree,
    colors: &HashMap<NodeIndex, C>,
    retained: &BTreeSet<NodeIndex>,
) -> bool {
    // Group the retained, colored leaves by color
    let mut classes: HashMap<&C, Vec<NodeIndex>> = HashMap::new();
    for &leaf in retained {
        if let Some(color) = colors.get(&leaf) {
            classes.entry(color).or_default().push(leaf);
        }
    }

    let mut claimed: HashMap<NodeIndex, &C> = HashMap::new();
    for (&color, leaves) in &classes {
        for node in spanning_nodes(tree, leaves) {
            match claimed.get(&node) {
                Some(&prior) if prior != color => return false,
                _ => {
                    claimed.insert(node, color);
                }
            }
        }
    }
    true
}

/// The nodes of the minimal connected subgraph containing all the given
/// leaves: every node on a path from a leaf up to the leaves' common
/// ancestor.
fn spanning_nodes(tree: &TaxonTree, leaves: &[NodeIndex]) -> BTreeSet<NodeIndex> {
    let mut spanning = BTreeSet::new();
    let lca = match leaves.split_first() {
        Some((&first, rest)) => {
            let mut lca = first;
            for &leaf in rest {
                lca = lowest_common_ancestor(tree, lca, leaf);
            }
            lca
        }
        None => return spanning,
    };
    for &leaf in leaves {
        let mut current = Some(leaf);
        while let Some(node) = current {
            spanning.insert(node);
            if node == lca {
                break;
            }
            current = tree.parent(node);
        }
    }
    spanning
}

fn lowest_common_ancestor(tree: &TaxonTree, a: NodeIndex, b: NodeIndex) -> NodeIndex {
    let mut ancestors = BTreeSet::new();
    let mut current = Some(a);
    while let Some(node) = current {
        ancestors.insert(node);
        current = tree.parent(node);
    }
    let mut current = b;
    loop {
        if ancestors.contains(&current) {
            return current;
        }
        match tree.parent(current) {
            Some(parent) => current = parent,
            // Validation guarantees a shared root; fall back to it.
            None => return current,
        }
    }
}
