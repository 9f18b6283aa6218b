//! Exact algorithms for convexity of taxonomic leaf colorings on rooted
//! phylogenetic trees, in pure Rust.
//!
//! A leaf coloring is *convex* when every color's leaves form a connected
//! subtree. Taxonomic assignments placed onto an inferred tree frequently
//! are not convex, and the two questions this crate answers are:
//!  1. Which leaves should be dropped? [`ConvexSolver`] computes the
//!     largest leaf subset whose induced coloring is convex, exactly, by
//!     annotating every edge with the colors whose minimal spanning
//!     subtree it cuts and then running a bottom-up search keyed by the
//!     single color allowed to cross each edge. The annotation confines
//!     the search to genuinely conflicted regions, so typical
//!     near-bifurcating trees solve quickly even though the underlying
//!     problem is hard; and
//!  2. Where should the root be? [`Rerooter`] relocates a root candidate
//!     toward the neighbor whose leaf set has the strictly best taxonomic
//!     rank until it reaches a fixed point, surfacing every equally valid
//!     placement instead of picking one arbitrarily. Rank information
//!     comes from a caller-supplied [`RankOracle`];
//!     [`TaxonomyRankOracle`] is an in-memory implementation backed by
//!     plain maps.
//!
//! Both computations are pure functions of their inputs: the tree is never
//! mutated, nothing is persisted, and results are deterministic.
//!
//! # Examples
//! ```
//! use std::collections::HashMap;
//! use cladecut::{ConvexSolver, TaxonTree};
//!
//! // A caterpillar tree with leaves colored [A, A, B, B, B] left to
//! // right: already convex, so every leaf survives.
//! let mut tree = TaxonTree::new();
//! let leaves: Vec<_> = (0..5).map(|_| tree.add_leaf()).collect();
//! let mut hook = tree.add_internal(&[leaves[0], leaves[1]]);
//! for &leaf in &leaves[2..4] {
//!     hook = tree.add_internal(&[hook, leaf]);
//! }
//! tree.add_root(&[hook, leaves[4]]);
//! let colors = HashMap::from([
//!     (leaves[0], 'A'),
//!     (leaves[1], 'A'),
//!     (leaves[2], 'B'),
//!     (leaves[3], 'B'),
//!     (leaves[4], 'B'),
//! ]);
//!
//! let solver = ConvexSolver::with_default_params(&tree, &colors);
//! let kept = solver.solve().unwrap();
//! assert_eq!(kept.len(), 5);
//! ```
//!
//! # References
//! * [Moran, S.; Snir, S. Convex recolorings of strings and trees: Definitions, hardness results and algorithms.](https://doi.org/10.1016/j.jcss.2007.10.003)

pub use crate::error::CladecutError;
pub use crate::metadata::CladeMetadata;
pub use crate::params::{SolveParams, SolveParamsBuilder};
pub use crate::rank::{RankLookupError, TaxonomyRankOracle};
pub use crate::reroot::{RankOracle, Rerooter};
pub use crate::subcoloring::{is_convex, ConvexSolver};
pub use crate::tree::{NodeIndex, PostOrderIter, PreOrderIter, TaxonTree};

mod color_cut;
mod error;
mod metadata;
mod params;
mod rank;
mod reroot;
mod subcoloring;
mod tree;
mod validation;
