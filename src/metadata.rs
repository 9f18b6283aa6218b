use std::collections::{BTreeSet, HashMap};

use crate::tree::NodeIndex;

/// Interned color identifier. Colors are interned against a sorted palette,
/// so ids are dense and deterministic for a given input coloring.
pub(crate) type ColorId = usize;

/// A set of interned colors. Ordered so iteration and set operations are
/// deterministic.
pub(crate) type ColorSet = BTreeSet<ColorId>;

/// The exact set of colors used by a partial solution, as a map key.
pub(crate) type ColorKey = BTreeSet<ColorId>;

/// A set of selected leaf indices.
pub(crate) type LeafSet = BTreeSet<NodeIndex>;

/// Per-node annotation produced by the color-cut annotator and consumed by
/// the convex-subcoloring solver.
///
/// `cut_colors` holds, for every node, the colors whose minimal spanning
/// subtree crosses the edge above that node, after pruning to the colors
/// that are genuinely split across two or more sibling subtrees somewhere.
#[derive(Debug, Clone)]
pub struct CladeMetadata<C> {
    pub(crate) parent: Vec<Option<NodeIndex>>,
    pub(crate) leaf_colors: Vec<Option<ColorId>>,
    pub(crate) cut_colors: Vec<ColorSet>,
    pub(crate) palette: Vec<C>,
}

impl<C> CladeMetadata<C> {
    /// Returns the parent of `node` as recorded at annotation time, or
    /// `None` for the root.
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.parent[node]
    }

    /// Returns the color assigned to a leaf, or `None` if the leaf is
    /// uncolored (or the node is not a leaf).
    pub fn color_of(&self, node: NodeIndex) -> Option<&C> {
        self.leaf_colors[node].map(|id| &self.palette[id])
    }

    /// Iterates over the cut colors of `node` in palette order.
    pub fn cut_colors(&self, node: NodeIndex) -> impl Iterator<Item = &C> + '_ {
        self.cut_colors[node].iter().map(|&id| &self.palette[id])
    }

    /// Returns the number of distinct colors seen across all leaves.
    pub fn num_colors(&self) -> usize {
        self.palette.len()
    }

    pub(crate) fn cut(&self, node: NodeIndex) -> &ColorSet {
        &self.cut_colors[node]
    }
}

/// Per-node solution table for the bottom-up subcoloring search: for each
/// designator (the single color permitted to continue crossing upward, or
/// none), the best leaf set for each exactly-achieved color set.
///
/// The "none" designator is a struct field rather than a map entry, so the
/// fallback target of a boundary lookup always exists.
#[derive(Debug, Clone, Default)]
pub(crate) struct SolutionTable {
    pub(crate) none: HashMap<ColorKey, LeafSet>,
    pub(crate) per_color: HashMap<ColorId, HashMap<ColorKey, LeafSet>>,
}

impl SolutionTable {
    pub(crate) fn new() -> Self {
        SolutionTable::default()
    }

    /// Entries indexed by a boundary color, falling back to the "none"
    /// designator when the table has nothing recorded for that color.
    pub(crate) fn entries(&self, boundary: Option<ColorId>) -> &HashMap<ColorKey, LeafSet> {
        match boundary {
            Some(color) => match self.per_color.get(&color) {
                Some(map) if !map.is_empty() => map,
                _ => &self.none,
            },
            None => &self.none,
        }
    }

    pub(crate) fn designator_map_mut(
        &mut self,
        designator: Option<ColorId>,
    ) -> &mut HashMap<ColorKey, LeafSet> {
        match designator {
            Some(color) => self.per_color.entry(color).or_default(),
            None => &mut self.none,
        }
    }
}

/// Keeps `candidate` for `key` only if it beats the incumbent: more leaves
/// wins; on equal cardinality the lexicographically smaller leaf set wins,
/// making the search independent of map iteration order.
pub(crate) fn insert_best(
    map: &mut HashMap<ColorKey, LeafSet>,
    key: ColorKey,
    candidate: LeafSet,
) {
    match map.get_mut(&key) {
        Some(incumbent) => {
            if candidate.len() > incumbent.len()
                || (candidate.len() == incumbent.len() && candidate < *incumbent)
            {
                *incumbent = candidate;
            }
        }
        None => {
            map.insert(key, candidate);
        }
    }
}

/// Selects the best leaf set among a table's entries under the same rule as
/// [`insert_best`].
pub(crate) fn best_leaf_set<'a, I>(entries: I) -> LeafSet
where
    I: Iterator<Item = &'a LeafSet>,
{
    let mut best: Option<&LeafSet> = None;
    for candidate in entries {
        let replace = match best {
            None => true,
            Some(incumbent) => {
                candidate.len() > incumbent.len()
                    || (candidate.len() == incumbent.len() && candidate < incumbent)
            }
        };
        if replace {
            best = Some(candidate);
        }
    }
    best.cloned().unwrap_or_default()
}

/// A rank paired with the neighbor it was measured toward. Ordered by rank
/// first, then node index, so sorting is total and deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Ranking<R> {
    pub(crate) rank: R,
    pub(crate) node: NodeIndex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_best_prefers_larger_then_lexicographic() {
        let mut map = HashMap::new();
        let key: ColorKey = BTreeSet::from([0]);
        insert_best(&mut map, key.clone(), BTreeSet::from([3]));
        insert_best(&mut map, key.clone(), BTreeSet::from([1, 2]));
        assert_eq!(map[&key], BTreeSet::from([1, 2]));
        // Same size, smaller leading element wins
        insert_best(&mut map, key.clone(), BTreeSet::from([0, 9]));
        assert_eq!(map[&key], BTreeSet::from([0, 9]));
        // Same size, larger set does not displace
        insert_best(&mut map, key.clone(), BTreeSet::from([4, 5]));
        assert_eq!(map[&key], BTreeSet::from([0, 9]));
    }

    #[test]
    fn entries_falls_back_to_none() {
        let mut table = SolutionTable::new();
        table
            .none
            .insert(BTreeSet::new(), BTreeSet::from([7]));
        assert_eq!(table.entries(Some(3)).len(), 1);
        table
            .per_color
            .entry(3)
            .or_default()
            .insert(BTreeSet::from([3]), BTreeSet::from([1]));
        assert!(table.entries(Some(3)).contains_key(&BTreeSet::from([3])));
        assert!(table.entries(None).contains_key(&BTreeSet::new()));
    }

    #[test]
    fn rankings_order_by_rank_then_node() {
        let mut ranks = vec![
            Ranking { rank: 2u32, node: 0 },
            Ranking { rank: 1u32, node: 5 },
            Ranking { rank: 1u32, node: 2 },
        ];
        ranks.sort();
        assert_eq!(ranks[0], Ranking { rank: 1, node: 2 });
        assert_eq!(ranks[1], Ranking { rank: 1, node: 5 });
    }
}
