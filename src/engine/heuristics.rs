//! Best-case per-stop bounds, for outer pruning layers.

use crate::cost::RaptorCost;
use crate::model::StopIndex;

/// For every stop : the best-case travel duration, ride count and an
/// admissible lower bound on the generalized cost of reaching it.
///
/// Produced from a standard single-iteration search ; the cost bound
/// never overestimates, so outer layers may prune with it.
#[derive(Debug)]
pub struct Heuristics {
    best_duration: Vec<Option<i32>>,
    best_num_of_rides: Vec<u8>,
    lower_bound_cost: Vec<RaptorCost>,
}

impl Heuristics {
    pub(crate) fn new(
        best_duration: Vec<Option<i32>>,
        best_num_of_rides: Vec<u8>,
        lower_bound_cost: Vec<RaptorCost>,
    ) -> Self {
        Self {
            best_duration,
            best_num_of_rides,
            lower_bound_cost,
        }
    }

    pub fn nb_of_stops(&self) -> usize {
        self.best_duration.len()
    }

    pub fn is_reached(&self, stop: StopIndex) -> bool {
        self.best_duration[stop].is_some()
    }

    /// Best-case travel duration to `stop`, in seconds.
    pub fn best_duration(&self, stop: StopIndex) -> Option<i32> {
        self.best_duration[stop]
    }

    pub fn best_num_of_rides(&self, stop: StopIndex) -> Option<u8> {
        self.best_duration[stop].map(|_| self.best_num_of_rides[stop])
    }

    /// An admissible lower bound on the cost of reaching `stop`.
    pub fn lower_bound_cost(&self, stop: StopIndex) -> Option<RaptorCost> {
        self.best_duration[stop].map(|_| self.lower_bound_cost[stop])
    }
}
