use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use crate::reroot::RankOracle;
use crate::tree::NodeIndex;

/// A failed taxonomy lookup: an unmapped leaf, a taxon without a rank, a
/// broken parent chain, or leaves with no common lineage.
#[derive(Debug, Clone)]
pub struct RankLookupError(String);

impl Display for RankLookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for RankLookupError {}

/// A [`RankOracle`] backed by an in-memory taxonomy.
///
/// Holds the three mappings a taxonomy database would provide: leaf index
/// to taxon, taxon to parent taxon (the taxonomy root has no entry), and
/// taxon to rank order. `rank_of` resolves the leaves to taxa, walks each
/// lineage up to the taxonomy root, and returns the rank order of the
/// deepest ancestor common to all of them.
///
/// Rank orders ascend from general to specific, as the rerooting search
/// expects: the taxonomy root carries the smallest order.
#[derive(Debug, Clone)]
pub struct TaxonomyRankOracle<T> {
    leaf_taxa: HashMap<NodeIndex, T>,
    taxon_parent: HashMap<T, T>,
    rank_order: HashMap<T, u32>,
}

impl<T: Clone + Eq + Hash + Debug> TaxonomyRankOracle<T> {
    /// Creates an oracle from the three taxonomy mappings.
    ///
    /// # Parameters
    /// * `leaf_taxa` - tree leaf index to the taxon it is labelled with
    /// * `taxon_parent` - taxon to its parent taxon; the taxonomy root has
    ///                    no entry
    /// * `rank_order` - taxon to its rank order (general = low)
    pub fn new(
        leaf_taxa: HashMap<NodeIndex, T>,
        taxon_parent: HashMap<T, T>,
        rank_order: HashMap<T, u32>,
    ) -> Self {
        TaxonomyRankOracle {
            leaf_taxa,
            taxon_parent,
            rank_order,
        }
    }

    /// The taxon's lineage, taxonomy root first.
    fn lineage(&self, taxon: &T) -> Result<Vec<T>, RankLookupError> {
        let mut path = vec![taxon.clone()];
        let mut current = taxon;
        while let Some(parent) = self.taxon_parent.get(current) {
            if path.contains(parent) {
                return Err(RankLookupError(format!(
                    "taxonomy parent chain of {taxon:?} contains a cycle"
                )));
            }
            path.push(parent.clone());
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    fn most_recent_common_ancestor<'t, I>(&self, mut taxa: I) -> Result<T, RankLookupError>
    where
        I: Iterator<Item = &'t T>,
        T: 't,
    {
        let first = taxa
            .next()
            .ok_or_else(|| RankLookupError(String::from("empty leaf set")))?;
        let mut prefix = self.lineage(first)?;
        for taxon in taxa {
            let lineage = self.lineage(taxon)?;
            let common = prefix
                .iter()
                .zip(lineage.iter())
                .take_while(|(a, b)| a == b)
                .count();
            if common == 0 {
                return Err(RankLookupError(format!(
                    "taxa {first:?} and {taxon:?} share no lineage"
                )));
            }
            prefix.truncate(common);
        }
        prefix
            .last()
            .cloned()
            .ok_or_else(|| RankLookupError(String::from("empty lineage")))
    }
}

impl<T: Clone + Eq + Hash + Debug> RankOracle for TaxonomyRankOracle<T> {
    type Rank = u32;

    fn rank_of(
        &self,
        leaves: &BTreeSet<NodeIndex>,
    ) -> Result<u32, Box<dyn Error + Send + Sync>> {
        let mut seen: HashSet<&T> = HashSet::new();
        let mut distinct: Vec<&T> = Vec::new();
        for &leaf in leaves {
            let taxon = self
                .leaf_taxa
                .get(&leaf)
                .ok_or_else(|| RankLookupError(format!("no taxon mapped for leaf {leaf}")))?;
            if seen.insert(taxon) {
                distinct.push(taxon);
            }
        }
        let mrca = self.most_recent_common_ancestor(distinct.into_iter())?;
        let rank = self.rank_order.get(&mrca).ok_or_else(|| {
            RankLookupError(format!("no rank order recorded for taxon {mrca:?}"))
        })?;
        Ok(*rank)
    }
}
