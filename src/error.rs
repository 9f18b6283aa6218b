use std::error::Error;
use std::fmt::{Display, Formatter};

/// Possible errors that arise due to malformed inputs to the cladecut
/// algorithms, or due to a violated internal invariant.
#[derive(Debug)]
pub enum CladecutError {
    /// The tree has no nodes.
    EmptyTree,
    /// The input is not a single connected rooted tree.
    Structural(String),
    /// A color is assigned to a node that is not a leaf of the tree.
    InvalidColoring(String),
    /// A leaf has no color and the solver was configured to require one.
    MissingColor(String),
    /// The annotator produced a cut-color set the solver cannot interpret.
    /// Indicates a bug in the annotator; always surfaced, never ignored.
    IncoherentCutColors(String),
    /// The child-subset search exceeded the configured state budget.
    SearchBudgetExceeded(String),
    /// An error reported by the rank oracle, propagated without
    /// reinterpretation.
    RankOracle(Box<dyn Error + Send + Sync>),
}

impl Error for CladecutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CladecutError::RankOracle(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Display for CladecutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            CladecutError::EmptyTree => String::from("The tree provided has no nodes"),
            CladecutError::Structural(msg) =>
                format!("Input is not a single rooted tree: {msg}"),
            CladecutError::InvalidColoring(msg) =>
                format!("Coloring does not fit the tree: {msg}"),
            CladecutError::MissingColor(msg) =>
                format!("A leaf is missing a required color: {msg}"),
            CladecutError::IncoherentCutColors(msg) =>
                format!("Incoherent cut-color annotation: {msg}"),
            CladecutError::SearchBudgetExceeded(msg) =>
                format!("Subset search budget exhausted: {msg}"),
            CladecutError::RankOracle(source) =>
                format!("Rank oracle failure: {source}"),
        };
        write!(f, "{message}")
    }
}
