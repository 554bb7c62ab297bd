//! Access and egress legs, and their per-round organization.
//!
//! An access (or egress) leg is the street or flex portion of a journey
//! connecting the true origin (destination) to a stop of the transit
//! network. The engine consumes them grouped by arrival mode and number
//! of rides, because a flex leg with `n` rides must be injected at round
//! `n`, not at round 0.

use crate::cost::{to_raptor_cost, RaptorCost};
use crate::model::StopIndex;
use crate::time::{PositiveDuration, Time};

/// An opening-hours restriction : the leg can only *start* within
/// `[earliest_departure, latest_departure]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub earliest_departure: Time,
    pub latest_departure: Time,
}

/// A street-network-derived access or egress leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEgress {
    pub stop: StopIndex,
    pub duration: PositiveDuration,
    /// Generalized cost of the leg, in centi-seconds.
    pub cost: RaptorCost,
    /// Number of rides for flex legs ; 0 for plain street legs.
    pub num_rides: u8,
    /// Whether the leg ends (starts, for an egress) on board a vehicle.
    pub stop_reached_on_board: bool,
    pub opening_hours: Option<OpeningHours>,
    /// Extra time billed when the leg cannot be freely time-shifted.
    pub time_penalty: Option<PositiveDuration>,
}

const WALK_RELUCTANCE: i32 = 2;

impl AccessEgress {
    /// A plain walk leg, costed at twice its duration.
    pub fn walk(stop: StopIndex, duration: PositiveDuration) -> Self {
        Self {
            stop,
            duration,
            cost: to_raptor_cost(WALK_RELUCTANCE * duration.seconds_i32()),
            num_rides: 0,
            stop_reached_on_board: false,
            opening_hours: None,
            time_penalty: None,
        }
    }

    /// A flex leg arriving on board after `num_rides` rides.
    pub fn flex(stop: StopIndex, duration: PositiveDuration, num_rides: u8) -> Self {
        Self {
            stop_reached_on_board: true,
            num_rides,
            ..Self::walk(stop, duration)
        }
    }

    /// A flex leg followed by a walk : rides happened, but the leg ends
    /// on street.
    pub fn flex_and_walk(stop: StopIndex, duration: PositiveDuration, num_rides: u8) -> Self {
        Self {
            num_rides,
            ..Self::walk(stop, duration)
        }
    }

    pub fn with_cost(self, cost: RaptorCost) -> Self {
        Self { cost, ..self }
    }

    pub fn with_opening_hours(self, earliest_departure: Time, latest_departure: Time) -> Self {
        Self {
            opening_hours: Some(OpeningHours {
                earliest_departure,
                latest_departure,
            }),
            ..self
        }
    }

    pub fn with_time_penalty(self, penalty: PositiveDuration) -> Self {
        Self {
            time_penalty: Some(penalty),
            ..self
        }
    }

    pub fn has_opening_hours(&self) -> bool {
        self.opening_hours.is_some()
    }

    /// The earliest time the leg can start when one wants to start at
    /// `requested`, or `None` when the opening hours are already over.
    pub fn earliest_departure_time(&self, requested: Time) -> Option<Time> {
        match self.opening_hours {
            None => Some(requested),
            Some(hours) => {
                if requested <= hours.earliest_departure {
                    Some(hours.earliest_departure)
                } else if requested <= hours.latest_departure {
                    Some(requested)
                } else {
                    None
                }
            }
        }
    }

    /// The latest time the leg can start when it must start no later
    /// than `limit`, or `None` when the opening hours have not begun.
    pub fn latest_departure_time(&self, limit: Time) -> Option<Time> {
        match self.opening_hours {
            None => Some(limit),
            Some(hours) => {
                if limit >= hours.latest_departure {
                    Some(hours.latest_departure)
                } else if limit >= hours.earliest_departure {
                    Some(limit)
                } else {
                    None
                }
            }
        }
    }
}

/// Access legs grouped by `(arrival mode, number of rides)`.
///
/// Legs carrying a time penalty are initially *not* part of the grouped
/// view ; they enter it through
/// [`iterate_over_paths_with_penalty`](Self::iterate_over_paths_with_penalty).
#[derive(Debug)]
pub struct AccessPaths {
    arrived_on_street: Vec<Vec<AccessEgress>>,
    arrived_on_board: Vec<Vec<AccessEgress>>,
    /// Penalized legs not yet admitted, ordered by increasing penalty.
    pending_penalty: Vec<AccessEgress>,
    max_number_of_rides: usize,
}

impl AccessPaths {
    pub fn new(legs: Vec<AccessEgress>) -> Self {
        let max_number_of_rides = legs
            .iter()
            .map(|leg| leg.num_rides as usize)
            .max()
            .unwrap_or(0);
        let mut paths = Self {
            arrived_on_street: vec![Vec::new(); max_number_of_rides + 1],
            arrived_on_board: vec![Vec::new(); max_number_of_rides + 1],
            pending_penalty: Vec::new(),
            max_number_of_rides,
        };
        for leg in legs {
            if leg.time_penalty.is_some() {
                paths.pending_penalty.push(leg);
            } else {
                paths.insert(leg);
            }
        }
        paths
            .pending_penalty
            .sort_by_key(|leg| leg.time_penalty.unwrap());
        paths
    }

    fn insert(&mut self, leg: AccessEgress) {
        let rides = leg.num_rides as usize;
        if leg.stop_reached_on_board {
            self.arrived_on_board[rides].push(leg);
        } else {
            self.arrived_on_street[rides].push(leg);
        }
    }

    pub fn arrived_on_street_by_num_of_rides(&self, num_rides: usize) -> &[AccessEgress] {
        self.arrived_on_street
            .get(num_rides)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn arrived_on_board_by_num_of_rides(&self, num_rides: usize) -> &[AccessEgress] {
        self.arrived_on_board
            .get(num_rides)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The maximum ride count over the whole input set, used to size
    /// per-round structures and as the minimum number of rounds to run.
    pub fn calculate_max_number_of_rides(&self) -> usize {
        self.max_number_of_rides
    }

    /// `true` when any leg (grouped or pending) has opening hours : the
    /// exact-trip-search optimization is then invalid.
    pub fn has_time_dependent_access(&self) -> bool {
        self.arrived_on_street
            .iter()
            .chain(self.arrived_on_board.iter())
            .flatten()
            .chain(self.pending_penalty.iter())
            .any(AccessEgress::has_opening_hours)
    }

    /// The stateful cursor over penalized legs.
    ///
    /// Each `next()` returns the next iteration departure time, in
    /// strictly decreasing order, and, as a side effect, inserts the
    /// legs becoming admissible at that time into the grouped view read
    /// by [`arrived_on_street_by_num_of_rides`](Self::arrived_on_street_by_num_of_rides)
    /// and [`arrived_on_board_by_num_of_rides`](Self::arrived_on_board_by_num_of_rides).
    /// This mutation is the contract, not an accident : the caller runs
    /// one extra search iteration per returned time, with the enlarged
    /// leg set.
    pub fn iterate_over_paths_with_penalty(
        &mut self,
        latest_acceptable_departure_time: Time,
    ) -> PenaltyPaths<'_> {
        PenaltyPaths {
            paths: self,
            latest_acceptable_departure_time,
        }
    }
}

/// See [`AccessPaths::iterate_over_paths_with_penalty`].
pub struct PenaltyPaths<'a> {
    paths: &'a mut AccessPaths,
    latest_acceptable_departure_time: Time,
}

impl Iterator for PenaltyPaths<'_> {
    type Item = Time;

    fn next(&mut self) -> Option<Time> {
        let penalty = self.paths.pending_penalty.first()?.time_penalty.unwrap();
        let departure_time = self.latest_acceptable_departure_time - penalty.seconds_i32();
        while self
            .paths
            .pending_penalty
            .first()
            .map_or(false, |leg| leg.time_penalty == Some(penalty))
        {
            let leg = self.paths.pending_penalty.remove(0);
            self.paths.insert(leg);
        }
        Some(departure_time)
    }
}

/// Egress legs, keyed by the stop they leave the network at.
#[derive(Debug)]
pub struct EgressPaths {
    by_stop: Vec<Vec<AccessEgress>>,
    stops: Vec<StopIndex>,
}

impl EgressPaths {
    pub fn new(nb_of_stops: usize, legs: Vec<AccessEgress>) -> Self {
        let mut by_stop = vec![Vec::new(); nb_of_stops];
        let mut stops = Vec::new();
        for leg in legs {
            if by_stop[leg.stop].is_empty() {
                stops.push(leg.stop);
            }
            by_stop[leg.stop].push(leg);
        }
        Self { by_stop, stops }
    }

    pub fn legs_at(&self, stop: StopIndex) -> &[AccessEgress] {
        &self.by_stop[stop]
    }

    /// The stops where at least one egress leg starts.
    pub fn stops(&self) -> &[StopIndex] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
