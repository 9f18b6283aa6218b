use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Debug;

use log::debug;
use num_traits::PrimInt;

use crate::error::CladecutError;
use crate::metadata::Ranking;
use crate::tree::{NodeIndex, TaxonTree};
use crate::validation::TreeValidator;

/// Supplies rank information for the rerooting search.
///
/// `rank_of` must be a total function over non-empty leaf sets, returning
/// the rank order of the set's most recent common ancestor in the external
/// taxonomy. Rank orders ascend from general to specific: the taxonomy
/// root carries the smallest value and species-level taxa the largest, so
/// the search walks toward the strictly smallest-ranked neighbor, the
/// direction that contains the rest of the world.
pub trait RankOracle {
    type Rank: PrimInt + Debug;

    fn rank_of(
        &self,
        leaves: &BTreeSet<NodeIndex>,
    ) -> Result<Self::Rank, Box<dyn Error + Send + Sync>>;
}

/// Relocates the root of a tree to the placement most consistent with an
/// externally known taxonomy.
///
/// A tree's given rooting is not guaranteed to agree with taxonomic ranks.
/// The rerooter repeatedly moves a root candidate toward the neighbor
/// whose leaf set has the strictly best (smallest) rank, stopping at a
/// fixed point. Ties are surfaced rather than decided arbitrarily: the
/// result carries the set of equally valid alternate roots, and a
/// two-sided best edge is detected as an oscillation and reported as a
/// degenerate two-member alternate set.
///
/// The search is pure: the tree is never mutated, and rewriting it onto
/// the chosen root is left to the caller.
#[derive(Debug, Clone)]
pub struct Rerooter<'a, O> {
    tree: &'a TaxonTree,
    oracle: &'a O,
}

impl<'a, O: RankOracle> Rerooter<'a, O> {
    pub fn new(tree: &'a TaxonTree, oracle: &'a O) -> Self {
        Rerooter { tree, oracle }
    }

    /// Finds the canonical root and the set of equally valid alternates.
    ///
    /// # Parameters
    /// * `stop_at_first_root` - when true, only the immediate neighbors of
    ///   the found root are tested for ties; when false, every node of the
    ///   tree that is an equally valid root is reported, via a worklist
    ///   expansion outward from the discovered alternates.
    ///
    /// # Returns
    /// * The primary root and the alternate roots, or an error if the tree
    ///   is malformed or the rank oracle fails.
    pub fn reroot(
        &self,
        stop_at_first_root: bool,
    ) -> Result<(NodeIndex, BTreeSet<NodeIndex>), CladecutError> {
        TreeValidator::new(self.tree).validate()?;
        let start = self
            .tree
            .root()
            .ok_or_else(|| CladecutError::Structural(String::from("no root has been set")))?;
        let all_terminals = self.tree.leaves_under(start);

        debug!("starting root search at node {start}");

        let mut current = start;
        let mut previous: Option<NodeIndex> = None;
        let root = loop {
            match self.find_root(current, &all_terminals)? {
                None => break current,
                Some(next) if Some(next) == previous => {
                    // Backtracking: the best edge has exactly two sides and
                    // both are equally valid roots. No further search can
                    // find more.
                    debug!("oscillation between {current} and {next}");
                    return Ok((current, BTreeSet::from([next])));
                }
                Some(next) => {
                    previous = Some(current);
                    current = next;
                }
            }
        };

        debug!("found first root: {root}");

        let mut alternates = BTreeSet::new();
        for neighbor in self.neighborhood(root) {
            if self.is_root(neighbor, &all_terminals)? {
                alternates.insert(neighbor);
            }
        }
        if stop_at_first_root {
            return Ok((root, alternates));
        }

        // Root-equivalence is not necessarily confined to the immediate
        // neighborhood of the first root found; expand outward until the
        // frontier holds no further ties.
        let mut seen: BTreeSet<NodeIndex> = alternates.clone();
        seen.insert(root);
        let mut worklist: Vec<NodeIndex> = alternates.iter().copied().collect();
        while let Some(node) = worklist.pop() {
            debug!("alternate-root worklist ({}): node {node}", worklist.len() + 1);
            if self.is_root(node, &all_terminals)? {
                alternates.insert(node);
                for neighbor in self.neighborhood(node) {
                    if seen.insert(neighbor) {
                        worklist.push(neighbor);
                    }
                }
            }
        }
        Ok((root, alternates))
    }

    /// The directions a root candidate can look toward: its children, plus
    /// its parent if it has one.
    fn neighborhood(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors = self.tree.children(node).to_vec();
        if let Some(parent) = self.tree.parent(node) {
            neighbors.push(parent);
        }
        neighbors
    }

    fn is_root(
        &self,
        node: NodeIndex,
        all_terminals: &BTreeSet<NodeIndex>,
    ) -> Result<bool, CladecutError> {
        if self.tree.is_leaf(node) {
            return Ok(false);
        }
        Ok(self.find_root(node, all_terminals)?.is_none())
    }

    /// One relocation step. Ranks every direction away from `node`; if a
    /// single direction is strictly best, the root candidate moves there.
    /// A tie between the two best directions means `node` itself is a
    /// valid root ("no move"), as does a leaf or a candidate with fewer
    /// than two directions to compare.
    fn find_root(
        &self,
        node: NodeIndex,
        all_terminals: &BTreeSet<NodeIndex>,
    ) -> Result<Option<NodeIndex>, CladecutError> {
        if self.tree.is_leaf(node) {
            return Ok(None);
        }
        let mut rankings = Vec::new();
        for &child in self.tree.children(node) {
            rankings.push(Ranking {
                rank: self.rank_of(&self.tree.leaves_under(child))?,
                node: child,
            });
        }
        if let Some(parent) = self.tree.parent(node) {
            let under = self.tree.leaves_under(node);
            let complement: BTreeSet<NodeIndex> =
                all_terminals.difference(&under).copied().collect();
            if !complement.is_empty() {
                rankings.push(Ranking {
                    rank: self.rank_of(&complement)?,
                    node: parent,
                });
            }
        }
        rankings.sort();
        debug!("rankings at node {node}: {rankings:?}");
        if rankings.len() < 2 {
            return Ok(None);
        }
        if rankings[0].rank == rankings[1].rank {
            return Ok(None);
        }
        Ok(Some(rankings[0].node))
    }

    fn rank_of(&self, leaves: &BTreeSet<NodeIndex>) -> Result<O::Rank, CladecutError> {
        self.oracle.rank_of(leaves).map_err(CladecutError::RankOracle)
    }
}
