//! The range-raptor driver.
//!
//! The outer loop iterates departure times from the latest one in the
//! search window backwards (in search-direction terms), re-using the
//! arrivals of later iterations ; each iteration runs rounds until the
//! state has nothing new or the round budget is exhausted. The worker
//! owns the loop plumbing and delegates all arrival bookkeeping to a
//! [`WorkerState`], so the standard and the multicriteria profile share
//! one driver.

use std::time::Instant;

use tracing::{debug, trace};

use crate::access::{AccessEgress, AccessPaths};
use crate::cost_calculator::CostCalculator;
use crate::engine::arrivals::{ArrivalId, ArrivedBy, Arrivals};
use crate::engine::calculator::SearchDirection;
use crate::engine::constrained_boarding::TransitArrivalSource;
use crate::engine::round_tracker::RoundTracker;
use crate::model::TransitData;
use crate::path::Path;
use crate::time::Time;

/// How the first-round trip search behaves.
#[derive(Debug, Clone, Copy)]
pub enum BoardSearchMode {
    Regular,
    /// Restrict the first boarding to departures within one iteration
    /// step : valid for every iteration but the first, as long as no
    /// access leg is time-dependent.
    ExactTime { step: i32 },
}

/// Everything a round relaxation reads.
pub struct RoundContext<'c, D: TransitData> {
    pub data: &'c D,
    pub cost: &'c CostCalculator,
    pub direction: SearchDirection,
    pub board_search_mode: BoardSearchMode,
}

/// The per-profile arrival bookkeeping driven by the worker.
pub trait WorkerState<D: TransitData> {
    fn setup_iteration(&mut self, iteration_departure_time: Time);

    /// Seed an access leg arriving at its stop in `round`.
    fn set_access_to_stop(
        &mut self,
        ctx: &RoundContext<'_, D>,
        leg: &AccessEgress,
        departure_time: Time,
        round: usize,
    );

    /// Relax transit boardings/alightings for `round`.
    fn transit_round(&mut self, ctx: &RoundContext<'_, D>, round: usize);

    /// Relax foot transfers from the stops reached by transit in `round`.
    fn transfers_round(&mut self, ctx: &RoundContext<'_, D>, round: usize);

    /// Relax egress legs from the stops reached in `round`.
    fn egress_round(&mut self, ctx: &RoundContext<'_, D>, round: usize);

    /// Whether `round` produced anything to relax further.
    fn is_new_round_available(&self, round: usize) -> bool;

    fn is_destination_reached_in_current_round(&self) -> bool;

    /// Harvest the journeys of the finished iteration. The arrival
    /// arena is still valid here and is released afterwards.
    fn iteration_complete(&mut self, data: &D, iteration_departure_time: Time);

    fn take_paths(&mut self) -> Vec<Path>;
}

pub struct RangeRaptorWorker<'d, D: TransitData, S: WorkerState<D>> {
    data: &'d D,
    cost: &'d CostCalculator,
    state: S,
    round_tracker: RoundTracker,
    access_paths: AccessPaths,
    direction: SearchDirection,
    iteration_step: i32,
    /// Iteration departure times, direction-latest first.
    iteration_times: Vec<Time>,
    deadline: Option<Instant>,
    min_number_of_rounds: usize,
    in_first_iteration: bool,
    has_time_dependent_access: bool,
    timed_out: bool,
}

impl<'d, D: TransitData, S: WorkerState<D>> RangeRaptorWorker<'d, D, S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: &'d D,
        cost: &'d CostCalculator,
        direction: SearchDirection,
        state: S,
        access_paths: AccessPaths,
        iteration_times: Vec<Time>,
        iteration_step: i32,
        max_rounds: usize,
        max_additional_transfers: usize,
        deadline: Option<Instant>,
    ) -> Self {
        assert!(!iteration_times.is_empty());
        let min_number_of_rounds = access_paths.calculate_max_number_of_rides();
        let has_time_dependent_access = access_paths.has_time_dependent_access();
        Self {
            data,
            cost,
            state,
            round_tracker: RoundTracker::new(max_rounds, max_additional_transfers),
            access_paths,
            direction,
            iteration_step,
            iteration_times,
            deadline,
            min_number_of_rounds,
            in_first_iteration: true,
            has_time_dependent_access,
            timed_out: false,
        }
    }

    /// Run every iteration of the window, then the extra iterations
    /// produced by time-penalty access legs. Returns `false` when the
    /// deadline cut the search short ; results gathered so far remain
    /// valid.
    pub fn route(&mut self) -> bool {
        let iteration_times = std::mem::take(&mut self.iteration_times);
        for &iteration_departure_time in &iteration_times {
            if self.deadline_exceeded() {
                self.timed_out = true;
                break;
            }
            self.run_iteration(iteration_departure_time);
            self.in_first_iteration = false;
        }

        // access legs with a time penalty extend the search to earlier,
        // penalized departures ; advancing the cursor mutates the
        // grouped access sets used by the iteration
        let last_time = *iteration_times.last().unwrap();
        while !self.timed_out {
            if self.deadline_exceeded() {
                self.timed_out = true;
                break;
            }
            let next_time = self
                .access_paths
                .iterate_over_paths_with_penalty(last_time)
                .next();
            match next_time {
                Some(iteration_departure_time) => self.run_iteration(iteration_departure_time),
                None => break,
            }
        }
        self.iteration_times = iteration_times;
        !self.timed_out
    }

    pub fn into_paths(mut self) -> (Vec<Path>, bool) {
        let complete = !self.timed_out;
        (self.state.take_paths(), complete)
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    fn run_iteration(&mut self, iteration_departure_time: Time) {
        trace!(iteration_departure_time, "raptor iteration");
        self.round_tracker.setup_iteration();
        self.state.setup_iteration(iteration_departure_time);

        self.add_access_on_street(iteration_departure_time, 0);

        while self.has_more_rounds() {
            if self.deadline_exceeded() {
                self.timed_out = true;
                break;
            }
            let round = self.round_tracker.next_round();
            let ctx = self.round_context(round);
            self.state.transit_round(&ctx, round);
            self.add_access_on_board(iteration_departure_time, round);
            self.state.transfers_round(&ctx, round);
            self.add_access_on_street(iteration_departure_time, round);
            self.state.egress_round(&ctx, round);
            if self.state.is_destination_reached_in_current_round() {
                self.round_tracker.destination_reached();
            }
        }

        self.state
            .iteration_complete(self.data, iteration_departure_time);
    }

    fn has_more_rounds(&self) -> bool {
        if !self.round_tracker.has_more_rounds() {
            return false;
        }
        let round = self.round_tracker.round();
        if round < self.min_number_of_rounds {
            return true;
        }
        self.state.is_new_round_available(round)
    }

    fn round_context(&self, round: usize) -> RoundContext<'d, D> {
        let exact_search_valid =
            !self.in_first_iteration && round == 1 && !self.has_time_dependent_access;
        RoundContext {
            data: self.data,
            cost: self.cost,
            direction: self.direction,
            board_search_mode: if exact_search_valid {
                BoardSearchMode::ExactTime {
                    step: self.iteration_step,
                }
            } else {
                BoardSearchMode::Regular
            },
        }
    }

    fn add_access_on_street(&mut self, iteration_departure_time: Time, round: usize) {
        let legs: Vec<AccessEgress> = self
            .access_paths
            .arrived_on_street_by_num_of_rides(round)
            .to_vec();
        self.add_access_paths(&legs, iteration_departure_time, round);
    }

    fn add_access_on_board(&mut self, iteration_departure_time: Time, round: usize) {
        let legs: Vec<AccessEgress> = self
            .access_paths
            .arrived_on_board_by_num_of_rides(round)
            .to_vec();
        self.add_access_paths(&legs, iteration_departure_time, round);
    }

    fn add_access_paths(
        &mut self,
        legs: &[AccessEgress],
        iteration_departure_time: Time,
        round: usize,
    ) {
        let ctx = self.round_context(round.max(1));
        for leg in legs {
            let departure_time = match self.direction {
                SearchDirection::Forward => {
                    leg.earliest_departure_time(iteration_departure_time)
                }
                SearchDirection::Reverse => leg.latest_departure_time(iteration_departure_time),
            };
            // this access is not available at the iteration time
            let Some(departure_time) = departure_time else {
                continue;
            };
            if departure_time != iteration_departure_time {
                self.has_time_dependent_access = true;
            }
            self.state
                .set_access_to_stop(&ctx, leg, departure_time, round);
        }
    }

    fn deadline_exceeded(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl<D: TransitData, S: WorkerState<D>> Drop for RangeRaptorWorker<'_, D, S> {
    fn drop(&mut self) {
        debug!(timed_out = self.timed_out, "raptor worker done");
    }
}

/// Recover the constrained-transfer source of a transit arrival : the
/// trip it rode, the alighting position within that trip's pattern and
/// the slack-free arrival time.
pub(crate) fn transit_arrival_source<D: TransitData>(
    data: &D,
    direction: SearchDirection,
    arrivals: &Arrivals,
    id: ArrivalId,
) -> Option<TransitArrivalSource> {
    let record = arrivals.get(id);
    let ArrivedBy::Transit { trip, .. } = &record.arrived_by else {
        return None;
    };
    let pattern = data.pattern(trip.route);
    let schedule = data.timetable(trip.route).trip(trip.trip);
    let alight_slack = direction.alight_slack(data.slack(), pattern.slack_index());
    let slack_free_arrival_time = direction.minus(record.arrival_time, alight_slack);
    let stop_position = direction.positions(pattern.nb_of_positions()).find(|&pos| {
        pattern.stop_at(pos) == record.stop
            && direction.can_alight(pattern, pos)
            && direction.alight_time_of(schedule, pos) == slack_free_arrival_time
    })?;
    Some(TransitArrivalSource {
        trip: *trip,
        stop: record.stop,
        stop_position,
        slack_free_arrival_time,
    })
}
