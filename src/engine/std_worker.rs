//! The standard (best-arrival-time) worker state.
//!
//! One label per stop per round : relaxation keeps only the minimum
//! arrival time, and a candidate equal to the incumbent never replaces
//! it, making relaxation idempotent. The overall and by-transit best
//! times persist across range-raptor iterations, so an iteration only
//! expands arrivals that genuinely improve on later departures.

use crate::access::{AccessEgress, EgressPaths};
use crate::engine::arrivals::{ArrivalId, ArrivedBy, Arrivals, StopArrival};
use crate::engine::calculator::SearchDirection;
use crate::engine::constrained_boarding::{ConstrainedBoarding, ConstrainedBoardingSearch};
use crate::engine::pareto::ParetoFront;
use crate::engine::trip_search::{search_for_exact_trip, search_for_trip, BoardAlightEvent};
use crate::engine::worker::{transit_arrival_source, BoardSearchMode, RoundContext, WorkerState};
use crate::model::{RouteIndex, StopIndex, TransferConstraint, TransitData};
use crate::path::{build_path, DestinationArrival, Path};
use crate::time::Time;

struct StdRoundState {
    time: Vec<Time>,
    arrival: Vec<Option<ArrivalId>>,
    transit_time: Vec<Time>,
    transit_arrival: Vec<Option<ArrivalId>>,
    touched: Vec<StopIndex>,
    touched_by_transit: Vec<StopIndex>,
}

impl StdRoundState {
    fn new(nb_of_stops: usize, unreached: Time) -> Self {
        Self {
            time: vec![unreached; nb_of_stops],
            arrival: vec![None; nb_of_stops],
            transit_time: vec![unreached; nb_of_stops],
            transit_arrival: vec![None; nb_of_stops],
            touched: Vec::new(),
            touched_by_transit: Vec::new(),
        }
    }

    fn reset(&mut self, unreached: Time) {
        for &stop in &self.touched {
            self.time[stop] = unreached;
            self.arrival[stop] = None;
        }
        for &stop in &self.touched_by_transit {
            self.transit_time[stop] = unreached;
            self.transit_arrival[stop] = None;
        }
        self.touched.clear();
        self.touched_by_transit.clear();
    }
}

struct OnBoard {
    trip_index: usize,
    entry_stop: StopIndex,
    board_time: Time,
    prev: ArrivalId,
    prev_cost: crate::cost::RaptorCost,
    board_cost: crate::cost::RaptorCost,
    num_rides: u8,
    constraint: Option<TransferConstraint>,
}

pub struct StdWorkerState {
    direction: SearchDirection,
    nb_of_stops: usize,
    best_times: Vec<Time>,
    best_transit_times: Vec<Time>,
    rounds: Vec<StdRoundState>,
    marked_prev: Vec<bool>,
    route_marked: Vec<bool>,
    arrivals: Arrivals,
    egress_paths: EgressPaths,
    best_destination_time: Time,
    iteration_destination: Option<DestinationArrival>,
    destination_reached_in_current_round: bool,
    results: ParetoFront<Path>,
}

impl StdWorkerState {
    pub fn new(
        nb_of_stops: usize,
        nb_of_routes: usize,
        direction: SearchDirection,
        egress_paths: EgressPaths,
    ) -> Self {
        let unreached = direction.unreached();
        Self {
            direction,
            nb_of_stops,
            best_times: vec![unreached; nb_of_stops],
            best_transit_times: vec![unreached; nb_of_stops],
            rounds: Vec::new(),
            marked_prev: vec![false; nb_of_stops],
            route_marked: vec![false; nb_of_routes],
            arrivals: Arrivals::new(),
            egress_paths,
            best_destination_time: unreached,
            iteration_destination: None,
            destination_reached_in_current_round: false,
            results: ParetoFront::new(),
        }
    }

    /// The best known arrival at `stop`, over every round and iteration
    /// so far.
    pub fn best_arrival_time(&self, stop: StopIndex) -> Option<Time> {
        let time = self.best_times[stop];
        (time != self.direction.unreached()).then_some(time)
    }

    /// The lowest round in which `stop` was reached this iteration.
    pub fn first_round_reaching(&self, stop: StopIndex) -> Option<usize> {
        self.rounds
            .iter()
            .position(|round| round.arrival[stop].is_some())
    }

    /// Best-case per-stop bounds of the finished search, relative to
    /// `iteration_departure_time`.
    pub fn extract_heuristics(
        &self,
        cost: &crate::cost_calculator::CostCalculator,
        iteration_departure_time: Time,
    ) -> crate::engine::heuristics::Heuristics {
        let mut best_duration = vec![None; self.nb_of_stops];
        let mut best_num_of_rides = vec![0u8; self.nb_of_stops];
        let mut lower_bound_cost = vec![0; self.nb_of_stops];
        for stop in 0..self.nb_of_stops {
            let Some(arrival_time) = self.best_arrival_time(stop) else {
                continue;
            };
            let duration = self
                .direction
                .duration(iteration_departure_time, arrival_time);
            let num_of_rides = self
                .first_round_reaching(stop)
                .unwrap_or(0)
                .min(u8::MAX as usize) as u8;
            best_duration[stop] = Some(duration);
            best_num_of_rides[stop] = num_of_rides;
            lower_bound_cost[stop] = cost.calculate_min_cost(
                duration,
                usize::from(num_of_rides.saturating_sub(1)),
            );
        }
        crate::engine::heuristics::Heuristics::new(
            best_duration,
            best_num_of_rides,
            lower_bound_cost,
        )
    }

    fn ensure_round(&mut self, round: usize) {
        let unreached = self.direction.unreached();
        while self.rounds.len() <= round {
            self.rounds.push(StdRoundState::new(self.nb_of_stops, unreached));
        }
    }

    /// Accept a transit arrival if it beats the best known by-transit
    /// time ; also promote it to the overall best when it beats that
    /// too. Equal times never replace the incumbent.
    #[allow(clippy::too_many_arguments)]
    fn accept_transit(
        &mut self,
        round: usize,
        stop: StopIndex,
        arrival_time: Time,
        cost: crate::cost::RaptorCost,
        num_rides: u8,
        prev: ArrivalId,
        arrived_by: ArrivedBy,
    ) {
        if !self.direction.is_before(arrival_time, self.best_transit_times[stop]) {
            return;
        }
        let id = self.arrivals.add(StopArrival {
            stop,
            round,
            arrival_time,
            cost,
            num_rides,
            prev: Some(prev),
            arrived_by,
        });
        self.best_transit_times[stop] = arrival_time;
        let round_state = &mut self.rounds[round];
        if round_state.transit_arrival[stop].is_none() {
            round_state.touched_by_transit.push(stop);
        }
        round_state.transit_time[stop] = arrival_time;
        round_state.transit_arrival[stop] = Some(id);
        self.accept_overall_id(round, stop, arrival_time, id);
    }

    fn accept_overall_id(
        &mut self,
        round: usize,
        stop: StopIndex,
        arrival_time: Time,
        id: ArrivalId,
    ) {
        if !self.direction.is_before(arrival_time, self.best_times[stop]) {
            return;
        }
        self.best_times[stop] = arrival_time;
        let round_state = &mut self.rounds[round];
        if round_state.arrival[stop].is_none() {
            round_state.touched.push(stop);
        }
        round_state.time[stop] = arrival_time;
        round_state.arrival[stop] = Some(id);
    }

    fn scan_route<D: TransitData>(&mut self, ctx: &RoundContext<'_, D>, round: usize, route: RouteIndex) {
        let data = ctx.data;
        let direction = ctx.direction;
        let pattern = data.pattern(route);
        let timetable = data.timetable(route);
        if timetable.is_empty() {
            return;
        }
        let constrained = match direction {
            SearchDirection::Forward => data.constrained_transfers_to_route(route),
            SearchDirection::Reverse => data.constrained_transfers_from_route(route),
        }
        .map(|transfers| ConstrainedBoardingSearch::new(direction, transfers));
        let board_slack = direction.board_slack(data.slack(), pattern.slack_index());
        let alight_slack = direction.alight_slack(data.slack(), pattern.slack_index());

        let mut onboard: Option<OnBoard> = None;

        for position in direction.positions(pattern.nb_of_positions()) {
            let stop = pattern.stop_at(position);

            // alight above the board search, so we never alight at the
            // stop we just boarded
            if direction.can_alight(pattern, position) {
                if let Some(ob) = &onboard {
                    let trip = timetable.trip(ob.trip_index);
                    let alight_time = direction.alight_time_of(trip, position);
                    let arrival_time = direction.plus(alight_time, alight_slack);
                    let ride_seconds = direction.duration(ob.board_time, alight_time);
                    let cost = ob.prev_cost
                        + ctx.cost.transit_arrival_cost(
                            ob.board_cost,
                            alight_slack.seconds_i32(),
                            ride_seconds,
                            trip.transit_reluctance_index(),
                            pattern,
                            stop,
                        );
                    self.accept_transit(
                        round,
                        stop,
                        arrival_time,
                        cost,
                        ob.num_rides,
                        ob.prev,
                        ArrivedBy::Transit {
                            trip: crate::model::TripRef {
                                route,
                                trip: ob.trip_index,
                            },
                            entry_stop: ob.entry_stop,
                            entry_time: ob.board_time,
                            constraint: ob.constraint,
                        },
                    );
                }
            }

            if !direction.can_board(pattern, position) || !self.marked_prev[stop] {
                continue;
            }
            let prev_round = &self.rounds[round - 1];
            let prev_time = prev_round.time[stop];
            let prev_id = match prev_round.arrival[stop] {
                Some(id) => id,
                None => continue,
            };
            let earliest_board_time = direction.plus(prev_time, board_slack);
            // boarding later than the best destination arrival can
            // never improve it
            if !direction.is_before(earliest_board_time, self.best_destination_time) {
                continue;
            }

            let mut event: Option<BoardAlightEvent> = None;
            let mut blocked = false;
            if let Some(search) = &constrained {
                if search.transfer_exists(position) {
                    let source = prev_round.transit_arrival[stop].and_then(|source_id| {
                        transit_arrival_source(data, direction, &self.arrivals, source_id)
                    });
                    if let Some(source) = source {
                        match search.find(data, timetable, pattern, position, &source) {
                            Some(ConstrainedBoarding::Board(ev)) => event = Some(ev),
                            Some(ConstrainedBoarding::NotAllowed) => blocked = true,
                            None => {}
                        }
                    }
                }
            }
            if event.is_none() && !blocked {
                event = match ctx.board_search_mode {
                    BoardSearchMode::ExactTime { step } if round == 1 => search_for_exact_trip(
                        direction,
                        timetable,
                        pattern,
                        position,
                        earliest_board_time,
                        step,
                    ),
                    _ => search_for_trip(
                        direction,
                        timetable,
                        pattern,
                        position,
                        earliest_board_time,
                        onboard.as_ref().map(|ob| ob.trip_index),
                    ),
                };
            }
            let Some(event) = event else {
                continue;
            };
            let better_than_onboard = match &onboard {
                None => true,
                Some(ob) => match direction {
                    SearchDirection::Forward => event.trip_index < ob.trip_index,
                    SearchDirection::Reverse => event.trip_index > ob.trip_index,
                },
            };
            if !better_than_onboard {
                continue;
            }
            let prev_record = self.arrivals.get(prev_id);
            let first_boarding = prev_record.num_rides == 0;
            let prev_cost = prev_record.cost;
            let num_rides = prev_record.num_rides + 1;
            let trip = timetable.trip(event.trip_index);
            let facilitated = event
                .constraint
                .map_or(false, TransferConstraint::is_facilitated);
            let prev_arrival_for_cost = if facilitated {
                event.earliest_board_time
            } else {
                prev_time
            };
            let wait_seconds = self
                .direction
                .duration(prev_arrival_for_cost, event.time);
            let board_cost = ctx.cost.boarding_cost(
                first_boarding,
                event.time - wait_seconds,
                stop,
                event.time,
                route,
                pattern,
                trip,
                event.constraint,
            );
            onboard = Some(OnBoard {
                trip_index: event.trip_index,
                entry_stop: stop,
                board_time: event.time,
                prev: prev_id,
                prev_cost,
                board_cost,
                num_rides,
                constraint: event.constraint,
            });
        }
    }
}

impl<D: TransitData> WorkerState<D> for StdWorkerState {
    fn setup_iteration(&mut self, _iteration_departure_time: Time) {
        let unreached = self.direction.unreached();
        self.arrivals.clear();
        self.iteration_destination = None;
        self.destination_reached_in_current_round = false;
        for round in &mut self.rounds {
            round.reset(unreached);
        }
    }

    fn set_access_to_stop(
        &mut self,
        _ctx: &RoundContext<'_, D>,
        leg: &AccessEgress,
        departure_time: Time,
        round: usize,
    ) {
        self.ensure_round(round);
        let arrival_time = self.direction.plus(departure_time, leg.duration);
        let improves_overall = self
            .direction
            .is_before(arrival_time, self.best_times[leg.stop]);
        let improves_transit = leg.stop_reached_on_board
            && self
                .direction
                .is_before(arrival_time, self.best_transit_times[leg.stop]);
        if !improves_overall && !improves_transit {
            return;
        }
        let id = self.arrivals.add(StopArrival {
            stop: leg.stop,
            round,
            arrival_time,
            cost: leg.cost,
            num_rides: leg.num_rides,
            prev: None,
            arrived_by: ArrivedBy::Access {
                leg: leg.clone(),
                departure_time,
            },
        });
        if improves_transit {
            self.best_transit_times[leg.stop] = arrival_time;
            let round_state = &mut self.rounds[round];
            if round_state.transit_arrival[leg.stop].is_none() {
                round_state.touched_by_transit.push(leg.stop);
            }
            round_state.transit_time[leg.stop] = arrival_time;
            round_state.transit_arrival[leg.stop] = Some(id);
        }
        if improves_overall {
            self.accept_overall_id(round, leg.stop, arrival_time, id);
        }
    }

    fn transit_round(&mut self, ctx: &RoundContext<'_, D>, round: usize) {
        self.ensure_round(round);
        self.destination_reached_in_current_round = false;

        let prev_touched: Vec<StopIndex> = self.rounds[round - 1].touched.clone();
        for &stop in &prev_touched {
            self.marked_prev[stop] = true;
        }
        let mut routes: Vec<RouteIndex> = Vec::new();
        for &stop in &prev_touched {
            for &route in ctx.data.routes_visiting(stop) {
                if !self.route_marked[route] {
                    self.route_marked[route] = true;
                    routes.push(route);
                }
            }
        }

        for &route in &routes {
            self.scan_route(ctx, round, route);
        }

        for &stop in &prev_touched {
            self.marked_prev[stop] = false;
        }
        for &route in &routes {
            self.route_marked[route] = false;
        }
    }

    fn transfers_round(&mut self, ctx: &RoundContext<'_, D>, round: usize) {
        let touched: Vec<StopIndex> = self.rounds[round].touched_by_transit.clone();
        for stop in touched {
            let from_time = self.rounds[round].transit_time[stop];
            let from_id = match self.rounds[round].transit_arrival[stop] {
                Some(id) => id,
                None => continue,
            };
            let from_cost = self.arrivals.get(from_id).cost;
            let from_rides = self.arrivals.get(from_id).num_rides;
            let transfers = match ctx.direction {
                SearchDirection::Forward => ctx.data.transfers_from(stop),
                SearchDirection::Reverse => ctx.data.transfers_to(stop),
            };
            for transfer in transfers {
                let arrival_time = ctx.direction.plus(from_time, transfer.duration);
                if !self
                    .direction
                    .is_before(arrival_time, self.best_times[transfer.to_stop])
                {
                    continue;
                }
                let id = self.arrivals.add(StopArrival {
                    stop: transfer.to_stop,
                    round,
                    arrival_time,
                    cost: from_cost + transfer.cost,
                    num_rides: from_rides,
                    prev: Some(from_id),
                    arrived_by: ArrivedBy::Transfer {
                        duration: transfer.duration,
                    },
                });
                self.accept_overall_id(round, transfer.to_stop, arrival_time, id);
            }
        }
    }

    fn egress_round(&mut self, ctx: &RoundContext<'_, D>, round: usize) {
        if self.egress_paths.is_empty() {
            return;
        }
        let transfer_slack = ctx.data.slack().transfer_slack();
        let egress_stops: Vec<StopIndex> = self.egress_paths.stops().to_vec();
        for stop in egress_stops {
            let round_state = &self.rounds[round];
            let transit = round_state.transit_arrival[stop]
                .map(|id| (round_state.transit_time[stop], id));
            let overall = round_state.arrival[stop].map(|id| (round_state.time[stop], id));
            if transit.is_none() && overall.is_none() {
                continue;
            }
            let legs: Vec<AccessEgress> = self.egress_paths.legs_at(stop).to_vec();
            for leg in legs {
                // an on-street egress must leave from an on-board
                // arrival ; a flex egress may chain anywhere, after the
                // transfer slack
                let base = if leg.num_rides > 0 {
                    overall.map(|(time, id)| (ctx.direction.plus(time, transfer_slack), id))
                } else {
                    transit
                };
                let Some((start, base_id)) = base else {
                    continue;
                };
                let departure_time = match ctx.direction {
                    SearchDirection::Forward => leg.earliest_departure_time(start),
                    SearchDirection::Reverse => leg.latest_departure_time(start),
                };
                let Some(departure_time) = departure_time else {
                    continue;
                };
                let destination_time = ctx.direction.plus(departure_time, leg.duration);
                if !self
                    .direction
                    .is_before(destination_time, self.best_destination_time)
                {
                    continue;
                }
                let base_record = self.arrivals.get(base_id);
                let wait_seconds = ctx.direction.duration(start, departure_time);
                let cost = base_record.cost
                    + ctx.cost.cost_egress(&leg)
                    + ctx.cost.wait_cost(wait_seconds);
                let num_rides = base_record.num_rides + leg.num_rides;
                self.best_destination_time = destination_time;
                self.destination_reached_in_current_round = true;
                self.iteration_destination = Some(DestinationArrival {
                    prev: base_id,
                    egress: leg,
                    egress_departure_time: departure_time,
                    arrival_time: destination_time,
                    cost,
                    num_rides,
                });
            }
        }
    }

    fn is_new_round_available(&self, round: usize) -> bool {
        self.rounds
            .get(round)
            .map_or(false, |state| !state.touched.is_empty())
    }

    fn is_destination_reached_in_current_round(&self) -> bool {
        self.destination_reached_in_current_round
    }

    fn iteration_complete(&mut self, data: &D, _iteration_departure_time: Time) {
        if let Some(destination) = self.iteration_destination.take() {
            let path = build_path(data, &self.arrivals, &destination, self.direction);
            self.results.add(path, Path::dominates_or_equal);
        }
    }

    fn take_paths(&mut self) -> Vec<Path> {
        let mut paths: Vec<Path> = self.results.drain().collect();
        paths.sort_by_key(|path| (path.departure_time, path.arrival_time));
        paths
    }
}
