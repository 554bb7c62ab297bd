//! The multicriteria worker state.
//!
//! Every stop keeps a pareto set of arrivals over
//! `(arrival time, number of rides, generalized cost, transit-group
//! mask)` ; boarding goes through a pattern-ride pareto set where only
//! rides of the *same* trip may evict each other, deferring the real
//! dominance decision to the stop arrival sets at alighting time.

use crate::access::{AccessEgress, EgressPaths};
use crate::cost::RaptorCost;
use crate::engine::arrivals::{ArrivalId, ArrivedBy, Arrivals, StopArrival};
use crate::engine::calculator::SearchDirection;
use crate::engine::constrained_boarding::{ConstrainedBoarding, ConstrainedBoardingSearch};
use crate::engine::pareto::ParetoFront;
use crate::engine::trip_search::{search_for_exact_trip, search_for_trip, BoardAlightEvent};
use crate::engine::worker::{transit_arrival_source, BoardSearchMode, RoundContext, WorkerState};
use crate::model::{RouteIndex, StopIndex, TransferConstraint, TransitData, TripRef};
use crate::path::{build_path, DestinationArrival, Path};
use crate::time::Time;

/// The criteria vector of one multicriteria arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McCriteria {
    pub arrival_time: Time,
    pub num_rides: u8,
    pub cost: RaptorCost,
    /// Union of the priority-group masks of the patterns ridden.
    pub group_mask: u32,
    /// Set for arrivals whose access leg has opening hours : a freely
    /// time-shiftable arrival dominates an otherwise-equal restricted
    /// one, never the other way around.
    pub restricted: bool,
}

/// Using a subset of the transit priority groups is at least as good.
fn mask_dominates_or_equal(a: u32, b: u32) -> bool {
    a & b == a
}

fn criteria_dominates(direction: SearchDirection) -> impl Fn(&McCriteria, &McCriteria) -> bool {
    move |a, b| {
        direction.is_before_or_equal(a.arrival_time, b.arrival_time)
            && a.num_rides <= b.num_rides
            && a.cost <= b.cost
            && mask_dominates_or_equal(a.group_mask, b.group_mask)
            && (!a.restricted || b.restricted)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct McArrival {
    pub criteria: McCriteria,
    pub id: ArrivalId,
}

/// A candidate boarding of one pattern scan.
///
/// `relative_cost` orders boardings of the same trip only ; rides of
/// different trips are incomparable here and live side by side.
#[derive(Debug, Clone, Copy)]
struct PatternRide {
    prev: ArrivalId,
    prev_cost: RaptorCost,
    board_stop: StopIndex,
    board_time: Time,
    trip_index: usize,
    trip_sort_index: usize,
    board_cost: RaptorCost,
    relative_cost: RaptorCost,
    num_rides: u8,
    group_mask: u32,
    restricted: bool,
    constraint: Option<TransferConstraint>,
}

fn ride_dominates(a: &PatternRide, b: &PatternRide) -> bool {
    a.trip_sort_index == b.trip_sort_index
        && a.relative_cost <= b.relative_cost
        && a.num_rides <= b.num_rides
        && mask_dominates_or_equal(a.group_mask, b.group_mask)
        && (!a.restricted || b.restricted)
}

struct McDestination {
    criteria: McCriteria,
    destination: DestinationArrival,
}

pub struct McWorkerState {
    direction: SearchDirection,
    fronts: Vec<ParetoFront<McArrival>>,
    /// Per-stop copy of the previous round's new arrivals, the boarding
    /// inputs of the current round.
    prev_inputs: Vec<Vec<McArrival>>,
    touched: Vec<StopIndex>,
    marked: Vec<bool>,
    transit_added: Vec<Vec<McArrival>>,
    touched_by_transit: Vec<StopIndex>,
    transit_marked: Vec<bool>,
    route_marked: Vec<bool>,
    arrivals: Arrivals,
    egress_paths: EgressPaths,
    destination: ParetoFront<McDestination>,
    destination_reached_in_current_round: bool,
    results: ParetoFront<(Path, u32)>,
}

impl McWorkerState {
    pub fn new(
        nb_of_stops: usize,
        nb_of_routes: usize,
        direction: SearchDirection,
        egress_paths: EgressPaths,
    ) -> Self {
        Self {
            direction,
            fronts: vec![ParetoFront::new(); nb_of_stops],
            prev_inputs: vec![Vec::new(); nb_of_stops],
            touched: Vec::new(),
            marked: vec![false; nb_of_stops],
            transit_added: vec![Vec::new(); nb_of_stops],
            touched_by_transit: Vec::new(),
            transit_marked: vec![false; nb_of_stops],
            route_marked: vec![false; nb_of_routes],
            arrivals: Arrivals::new(),
            egress_paths,
            destination: ParetoFront::new(),
            destination_reached_in_current_round: false,
            results: ParetoFront::new(),
        }
    }

    /// The current pareto set of arrivals at `stop`.
    pub fn arrivals_at(&self, stop: StopIndex) -> impl Iterator<Item = &McCriteria> {
        self.fronts[stop].iter().map(|arrival| &arrival.criteria)
    }

    /// Insert an arrival, unless the stop's pareto set dominates it.
    fn accept(
        &mut self,
        round: usize,
        stop: StopIndex,
        criteria: McCriteria,
        prev: Option<ArrivalId>,
        arrived_by: ArrivedBy,
    ) -> Option<McArrival> {
        let dominates = criteria_dominates(self.direction);
        if self.fronts[stop]
            .iter()
            .any(|element| dominates(&element.criteria, &criteria))
        {
            return None;
        }
        let id = self.arrivals.add(StopArrival {
            stop,
            round,
            arrival_time: criteria.arrival_time,
            cost: criteria.cost,
            num_rides: criteria.num_rides,
            prev,
            arrived_by,
        });
        let element = McArrival { criteria, id };
        self.fronts[stop].add(element, |a, b| dominates(&a.criteria, &b.criteria));
        if !self.marked[stop] {
            self.marked[stop] = true;
            self.touched.push(stop);
        }
        Some(element)
    }

    fn register_transit(&mut self, stop: StopIndex, element: McArrival) {
        if !self.transit_marked[stop] {
            self.transit_marked[stop] = true;
            self.touched_by_transit.push(stop);
        }
        self.transit_added[stop].push(element);
    }

    fn scan_route<D: TransitData>(
        &mut self,
        ctx: &RoundContext<'_, D>,
        round: usize,
        route: RouteIndex,
    ) {
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

        let mut rides: ParetoFront<PatternRide> = ParetoFront::new();

        for position in direction.positions(pattern.nb_of_positions()) {
            let stop = pattern.stop_at(position);

            if direction.can_alight(pattern, position) {
                for ride in rides.iter().copied().collect::<Vec<PatternRide>>() {
                    let trip = timetable.trip(ride.trip_index);
                    let alight_time = direction.alight_time_of(trip, position);
                    let arrival_time = direction.plus(alight_time, alight_slack);
                    let ride_seconds = direction.duration(ride.board_time, alight_time);
                    let cost = ride.prev_cost
                        + ctx.cost.transit_arrival_cost(
                            ride.board_cost,
                            alight_slack.seconds_i32(),
                            ride_seconds,
                            trip.transit_reluctance_index(),
                            pattern,
                            stop,
                        );
                    let criteria = McCriteria {
                        arrival_time,
                        num_rides: ride.num_rides,
                        cost,
                        group_mask: ride.group_mask,
                        restricted: ride.restricted,
                    };
                    let added = self.accept(
                        round,
                        stop,
                        criteria,
                        Some(ride.prev),
                        ArrivedBy::Transit {
                            trip: TripRef {
                                route,
                                trip: ride.trip_index,
                            },
                            entry_stop: ride.board_stop,
                            entry_time: ride.board_time,
                            constraint: ride.constraint,
                        },
                    );
                    if let Some(element) = added {
                        self.register_transit(stop, element);
                    }
                }
            }

            if !direction.can_board(pattern, position) {
                continue;
            }
            let inputs = self.prev_inputs[stop].clone();
            for input in inputs {
                let earliest_board_time =
                    direction.plus(input.criteria.arrival_time, board_slack);

                let mut event: Option<BoardAlightEvent> = None;
                let mut blocked = false;
                if let Some(search) = &constrained {
                    if search.transfer_exists(position) {
                        let source =
                            transit_arrival_source(data, direction, &self.arrivals, input.id);
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
                        BoardSearchMode::ExactTime { step } if round == 1 => {
                            search_for_exact_trip(
                                direction,
                                timetable,
                                pattern,
                                position,
                                earliest_board_time,
                                step,
                            )
                        }
                        _ => search_for_trip(
                            direction,
                            timetable,
                            pattern,
                            position,
                            earliest_board_time,
                            None,
                        ),
                    };
                }
                let Some(event) = event else {
                    continue;
                };
                let trip = timetable.trip(event.trip_index);
                let first_boarding = input.criteria.num_rides == 0;
                let facilitated = event
                    .constraint
                    .map_or(false, TransferConstraint::is_facilitated);
                let prev_arrival_for_cost = if facilitated {
                    event.earliest_board_time
                } else {
                    input.criteria.arrival_time
                };
                let wait_seconds = direction.duration(prev_arrival_for_cost, event.time);
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
                let relative_cost = input.criteria.cost
                    + board_cost
                    + ctx
                        .cost
                        .on_trip_relative_riding_cost(event.time, trip.transit_reluctance_index());
                rides.add(
                    PatternRide {
                        prev: input.id,
                        prev_cost: input.criteria.cost,
                        board_stop: stop,
                        board_time: event.time,
                        trip_index: event.trip_index,
                        trip_sort_index: trip.trip_sort_index(),
                        board_cost,
                        relative_cost,
                        num_rides: input.criteria.num_rides + 1,
                        group_mask: input.criteria.group_mask | pattern.priority_group_mask(),
                        restricted: input.criteria.restricted,
                        constraint: event.constraint,
                    },
                    ride_dominates,
                );
            }
        }
    }
}

impl<D: TransitData> WorkerState<D> for McWorkerState {
    fn setup_iteration(&mut self, _iteration_departure_time: Time) {
        self.arrivals.clear();
        self.destination.clear();
        self.destination_reached_in_current_round = false;
        for &stop in &self.touched {
            self.marked[stop] = false;
        }
        self.touched.clear();
        for &stop in &self.touched_by_transit {
            self.transit_marked[stop] = false;
            self.transit_added[stop].clear();
        }
        self.touched_by_transit.clear();
        // stale after-marker elements belong to the previous iteration,
        // whose arena is gone : commit them away
        for front in &mut self.fronts {
            if front.has_elements_after_marker() {
                front.commit_marker();
            }
        }
    }

    fn set_access_to_stop(
        &mut self,
        _ctx: &RoundContext<'_, D>,
        leg: &AccessEgress,
        departure_time: Time,
        round: usize,
    ) {
        let arrival_time = self.direction.plus(departure_time, leg.duration);
        let criteria = McCriteria {
            arrival_time,
            num_rides: leg.num_rides,
            cost: leg.cost,
            group_mask: 0,
            restricted: leg.has_opening_hours(),
        };
        let added = self.accept(
            round,
            leg.stop,
            criteria,
            None,
            ArrivedBy::Access {
                leg: leg.clone(),
                departure_time,
            },
        );
        if let Some(element) = added {
            if leg.stop_reached_on_board {
                self.register_transit(leg.stop, element);
            }
        }
    }

    fn transit_round(&mut self, ctx: &RoundContext<'_, D>, round: usize) {
        self.destination_reached_in_current_round = false;
        for &stop in &self.touched_by_transit {
            self.transit_marked[stop] = false;
            self.transit_added[stop].clear();
        }
        self.touched_by_transit.clear();

        let prev_touched = std::mem::take(&mut self.touched);
        for &stop in &prev_touched {
            self.marked[stop] = false;
            self.prev_inputs[stop].clear();
            let new_elements = self.fronts[stop].elements_after_marker().to_vec();
            self.prev_inputs[stop].extend(new_elements);
            self.fronts[stop].commit_marker();
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
        for &route in &routes {
            self.route_marked[route] = false;
        }
        for &stop in &prev_touched {
            self.prev_inputs[stop].clear();
        }
    }

    fn transfers_round(&mut self, ctx: &RoundContext<'_, D>, round: usize) {
        let touched: Vec<StopIndex> = self.touched_by_transit.clone();
        for stop in touched {
            let elements = self.transit_added[stop].clone();
            let transfers = match ctx.direction {
                SearchDirection::Forward => ctx.data.transfers_from(stop),
                SearchDirection::Reverse => ctx.data.transfers_to(stop),
            };
            for transfer in transfers {
                for element in &elements {
                    let criteria = McCriteria {
                        arrival_time: ctx
                            .direction
                            .plus(element.criteria.arrival_time, transfer.duration),
                        num_rides: element.criteria.num_rides,
                        cost: element.criteria.cost + transfer.cost,
                        group_mask: element.criteria.group_mask,
                        restricted: element.criteria.restricted,
                    };
                    self.accept(
                        round,
                        transfer.to_stop,
                        criteria,
                        Some(element.id),
                        ArrivedBy::Transfer {
                            duration: transfer.duration,
                        },
                    );
                }
            }
        }
    }

    fn egress_round(&mut self, ctx: &RoundContext<'_, D>, _round: usize) {
        if self.egress_paths.is_empty() {
            return;
        }
        let transfer_slack = ctx.data.slack().transfer_slack();
        let dominates = criteria_dominates(self.direction);
        let egress_stops: Vec<StopIndex> = self.egress_paths.stops().to_vec();
        for stop in egress_stops {
            let legs: Vec<AccessEgress> = self.egress_paths.legs_at(stop).to_vec();
            for leg in legs {
                let candidates: Vec<McArrival> = if leg.num_rides > 0 {
                    self.fronts[stop]
                        .elements_after_marker()
                        .iter()
                        .map(|element| McArrival {
                            criteria: McCriteria {
                                arrival_time: ctx.direction.plus(
                                    element.criteria.arrival_time,
                                    transfer_slack,
                                ),
                                ..element.criteria
                            },
                            id: element.id,
                        })
                        .collect()
                } else {
                    // an on-street egress must leave from an on-board
                    // arrival
                    self.transit_added[stop].clone()
                };
                for candidate in candidates {
                    let start = candidate.criteria.arrival_time;
                    let departure_time = match ctx.direction {
                        SearchDirection::Forward => leg.earliest_departure_time(start),
                        SearchDirection::Reverse => leg.latest_departure_time(start),
                    };
                    let Some(departure_time) = departure_time else {
                        continue;
                    };
                    let arrival_time = ctx.direction.plus(departure_time, leg.duration);
                    let wait_seconds = ctx.direction.duration(start, departure_time);
                    let criteria = McCriteria {
                        arrival_time,
                        num_rides: candidate.criteria.num_rides + leg.num_rides,
                        cost: candidate.criteria.cost
                            + ctx.cost.cost_egress(&leg)
                            + ctx.cost.wait_cost(wait_seconds),
                        group_mask: candidate.criteria.group_mask,
                        restricted: candidate.criteria.restricted,
                    };
                    let destination = McDestination {
                        criteria,
                        destination: DestinationArrival {
                            prev: candidate.id,
                            egress: leg.clone(),
                            egress_departure_time: departure_time,
                            arrival_time,
                            cost: criteria.cost,
                            num_rides: criteria.num_rides,
                        },
                    };
                    if self
                        .destination
                        .add(destination, |a, b| dominates(&a.criteria, &b.criteria))
                    {
                        self.destination_reached_in_current_round = true;
                    }
                }
            }
        }
    }

    fn is_new_round_available(&self, _round: usize) -> bool {
        !self.touched.is_empty()
    }

    fn is_destination_reached_in_current_round(&self) -> bool {
        self.destination_reached_in_current_round
    }

    fn iteration_complete(&mut self, data: &D, _iteration_departure_time: Time) {
        let destinations: Vec<McDestination> = self.destination.drain().collect();
        for destination in destinations {
            let path = build_path(data, &self.arrivals, &destination.destination, self.direction);
            // the group mask stays a criterion of the result set, so
            // journeys over different priority groups coexist
            self.results.add(
                (path, destination.criteria.group_mask),
                |(a, a_mask), (b, b_mask)| {
                    a.dominates_or_equal(b) && mask_dominates_or_equal(*a_mask, *b_mask)
                },
            );
        }
    }

    fn take_paths(&mut self) -> Vec<Path> {
        let mut paths: Vec<Path> = self.results.drain().map(|(path, _)| path).collect();
        paths.sort_by_key(|path| (path.departure_time, path.arrival_time, path.cost));
        paths
    }
}
