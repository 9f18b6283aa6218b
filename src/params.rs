// Defaults for parameters
const REQUIRE_FULL_COLORING_DEFAULT: bool = false;
// Set to a value that will never be triggered
const MAX_SEARCH_STATES_DEFAULT: usize = usize::MAX;

// Valid minimums/left bounds of parameters
const MAX_SEARCH_STATES_MINIMUM: usize = 1;

/// A wrapper around the parameters of the convex-subcoloring solver. Only
/// use if you need to change caller policy or bound the search; otherwise
/// use `ConvexSolver::with_default_params` to run with the defaults.
#[derive(Debug, Clone)]
pub struct SolveParams {
    pub(crate) require_full_coloring: bool,
    pub(crate) max_search_states: usize,
}

/// Builder object to set custom solver parameters.
pub struct SolveParamsBuilder {
    require_full_coloring: Option<bool>,
    max_search_states: Option<usize>,
}

impl SolveParams {
    pub(crate) fn default() -> Self {
        Self::builder().build()
    }

    /// Enters the builder pattern, allowing custom parameters to be set
    /// using the setter methods.
    ///
    /// # Returns
    /// * the parameter builder
    pub fn builder() -> SolveParamsBuilder {
        SolveParamsBuilder {
            require_full_coloring: None,
            max_search_states: None,
        }
    }
}

impl SolveParamsBuilder {
    /// Sets whether every leaf must carry a color. Uncolored leaves are
    /// legal for the algorithms themselves (they carry no constraint and
    /// are always retainable); some callers' contracts nevertheless demand
    /// a fully colored tree, and with this set the solver fails fast with
    /// a `MissingColor` error instead. Defaults to false.
    ///
    /// # Parameters
    /// * require_full_coloring - whether an uncolored leaf is an error
    ///
    /// # Returns
    /// * the parameter builder
    pub fn require_full_coloring(mut self, require_full_coloring: bool) -> SolveParamsBuilder {
        self.require_full_coloring = Some(require_full_coloring);
        self
    }

    /// Sets the maximum number of states the child-subset search may visit
    /// at a single node. The search is exact and, on wide polytomies whose
    /// children share many conflicting colors, worst-case exponential in
    /// the number of children; near-bifurcating trees keep it small. When
    /// the budget is exhausted the solver aborts with a
    /// `SearchBudgetExceeded` error rather than returning a possibly
    /// non-optimal answer. By default the search is not bounded.
    ///
    /// # Parameters
    /// * max_search_states - the search state budget per node
    ///
    /// # Returns
    /// * the parameter builder
    pub fn max_search_states(mut self, max_search_states: usize) -> SolveParamsBuilder {
        let valid_max_search_states = SolveParamsBuilder::validate_input_left_bound(
            max_search_states,
            MAX_SEARCH_STATES_MINIMUM,
            "max_search_states",
        );
        self.max_search_states = Some(valid_max_search_states);
        self
    }

    /// Finishes the building of the parameter configuration. A call to this
    /// method is required to exit the builder pattern and complete the
    /// construction of the parameters.
    ///
    /// # Returns
    /// * The completed solver parameter configuration.
    pub fn build(self) -> SolveParams {
        SolveParams {
            require_full_coloring: self
                .require_full_coloring
                .unwrap_or(REQUIRE_FULL_COLORING_DEFAULT),
            max_search_states: self.max_search_states.unwrap_or(MAX_SEARCH_STATES_DEFAULT),
        }
    }

    fn validate_input_left_bound(input_param: usize, left_bound: usize, param: &str) -> usize {
        if input_param < left_bound {
            log::warn!(
                "{param} ({input_param}) cannot be lower than {left_bound}. Set to {left_bound}."
            );
            left_bound
        } else {
            input_param
        }
    }
}
