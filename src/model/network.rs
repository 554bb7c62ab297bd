//! A concrete transit snapshot and its validating builder.
//!
//! The builder is the write side of the snapshot : it checks data
//! coherence eagerly (array lengths, time monotonicity, index bounds) so
//! the search never has to.

use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use tracing::debug;

use crate::cost::to_raptor_cost;
use crate::model::{
    ConstrainedTransfer, ConstrainedTransfersForRoute, FlowDirection, Pattern, RouteIndex,
    SlackProvider, StopIndex, Timetable, TransferForPattern, TransferPoint, TransitData,
    TransitMode, Transfer, TripSchedule,
};
use crate::time::{parse_time, BadTimeString, Calendar, PositiveDuration, Time};

/// An immutable snapshot of the transit network.
///
/// Shared read-only between concurrent searches ; nothing in here is
/// ever mutated after [`NetworkBuilder::build`].
#[derive(Debug)]
pub struct TransitNetwork {
    nb_of_stops: usize,
    station_of_stop: Vec<Option<usize>>,
    patterns: Vec<Pattern>,
    timetables: Vec<Vec<TripSchedule>>,
    routes_by_stop: Vec<Vec<RouteIndex>>,
    transfers_from: Vec<Vec<Transfer>>,
    transfers_to: Vec<Vec<Transfer>>,
    constrained_to_route: Vec<Option<ConstrainedTransfersForRoute>>,
    constrained_from_route: Vec<Option<ConstrainedTransfersForRoute>>,
    slack: SlackProvider,
    calendar: Calendar,
}

impl TransitData for TransitNetwork {
    fn nb_of_stops(&self) -> usize {
        self.nb_of_stops
    }

    fn nb_of_routes(&self) -> usize {
        self.patterns.len()
    }

    fn pattern(&self, route: RouteIndex) -> &Pattern {
        &self.patterns[route]
    }

    fn timetable(&self, route: RouteIndex) -> Timetable<'_> {
        Timetable {
            trips: &self.timetables[route],
        }
    }

    fn routes_visiting(&self, stop: StopIndex) -> &[RouteIndex] {
        &self.routes_by_stop[stop]
    }

    fn transfers_from(&self, stop: StopIndex) -> &[Transfer] {
        &self.transfers_from[stop]
    }

    fn transfers_to(&self, stop: StopIndex) -> &[Transfer] {
        &self.transfers_to[stop]
    }

    fn station_of(&self, stop: StopIndex) -> Option<usize> {
        self.station_of_stop[stop]
    }

    fn slack(&self) -> &SlackProvider {
        &self.slack
    }

    fn constrained_transfers_to_route(
        &self,
        route: RouteIndex,
    ) -> Option<&ConstrainedTransfersForRoute> {
        self.constrained_to_route[route].as_ref()
    }

    fn constrained_transfers_from_route(
        &self,
        route: RouteIndex,
    ) -> Option<&ConstrainedTransfersForRoute> {
        self.constrained_from_route[route].as_ref()
    }

    fn calendar(&self) -> &Calendar {
        &self.calendar
    }
}

impl TransitNetwork {
    pub fn nb_of_trips(&self) -> usize {
        self.timetables.iter().map(Vec::len).sum()
    }
}

struct TripSpec {
    arrivals: String,
    departures: String,
    wheelchair_accessible: bool,
}

struct RouteSpec {
    stops: Vec<StopIndex>,
    flows: Vec<FlowDirection>,
    mode: TransitMode,
    agency: usize,
    slack_index: usize,
    priority_group_mask: u32,
    transit_reluctance_index: usize,
    trips: Vec<TripSpec>,
}

/// Incremental description of one route, used inside
/// [`NetworkBuilder::route`].
pub struct RouteBuilder<'a> {
    spec: &'a mut RouteSpec,
}

impl<'a> RouteBuilder<'a> {
    pub fn mode(&mut self, mode: TransitMode) -> &mut Self {
        self.spec.mode = mode;
        self
    }

    pub fn agency(&mut self, agency: usize) -> &mut Self {
        self.spec.agency = agency;
        self
    }

    pub fn slack_index(&mut self, slack_index: usize) -> &mut Self {
        self.spec.slack_index = slack_index;
        self
    }

    pub fn priority_group(&mut self, mask: u32) -> &mut Self {
        self.spec.priority_group_mask = mask;
        self
    }

    pub fn transit_reluctance_index(&mut self, index: usize) -> &mut Self {
        self.spec.transit_reluctance_index = index;
        self
    }

    /// Override the boarding/alighting permission at one position.
    pub fn flow(&mut self, position: usize, flow: FlowDirection) -> &mut Self {
        self.spec.flows[position] = flow;
        self
    }

    /// Add a trip with one `"hh:mm:ss"` time per stop of the pattern,
    /// arrival equal to departure at every stop :
    ///
    /// `route.trip("10:00 10:10 10:20")`
    pub fn trip(&mut self, times: &str) -> &mut Self {
        self.trip_with_dwell(times, times)
    }

    /// Add a trip with distinct arrival and departure times.
    pub fn trip_with_dwell(&mut self, arrivals: &str, departures: &str) -> &mut Self {
        self.spec.trips.push(TripSpec {
            arrivals: arrivals.to_string(),
            departures: departures.to_string(),
            wheelchair_accessible: true,
        });
        self
    }

    /// Mark the last added trip as not wheelchair accessible.
    ///
    /// Panics if no trip was added yet.
    pub fn inaccessible(&mut self) -> &mut Self {
        self.spec
            .trips
            .last_mut()
            .expect("inaccessible() called before any trip")
            .wheelchair_accessible = false;
        self
    }
}

/// Builds a [`TransitNetwork`], validating eagerly.
pub struct NetworkBuilder {
    nb_of_stops: usize,
    station_of_stop: Vec<Option<usize>>,
    routes: Vec<RouteSpec>,
    transfers: Vec<(StopIndex, Transfer)>,
    constrained: Vec<ConstrainedTransfer>,
    slack: SlackProvider,
    calendar: Calendar,
}

impl NetworkBuilder {
    /// A builder for a network of `nb_of_stops` stops, valid over a
    /// default one-day period.
    pub fn new(nb_of_stops: usize) -> Self {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Self {
            nb_of_stops,
            station_of_stop: vec![None; nb_of_stops],
            routes: Vec::new(),
            transfers: Vec::new(),
            constrained: Vec::new(),
            slack: SlackProvider::default(),
            calendar: Calendar::new(start, end),
        }
    }

    pub fn calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn slack(mut self, slack: SlackProvider) -> Self {
        self.slack = slack;
        self
    }

    /// Group `stops` under one station, for station-level constrained
    /// transfer points.
    pub fn station(mut self, station: usize, stops: &[StopIndex]) -> Self {
        for &stop in stops {
            self.station_of_stop[stop] = Some(station);
        }
        self
    }

    /// A foot transfer, costed at its duration.
    pub fn transfer(self, from: StopIndex, to: StopIndex, duration: PositiveDuration) -> Self {
        let cost = to_raptor_cost(duration.seconds_i32());
        self.transfer_with_cost(from, to, duration, cost)
    }

    pub fn transfer_with_cost(
        mut self,
        from: StopIndex,
        to: StopIndex,
        duration: PositiveDuration,
        cost: crate::cost::RaptorCost,
    ) -> Self {
        self.transfers.push((
            from,
            Transfer {
                to_stop: to,
                duration,
                cost,
            },
        ));
        self
    }

    /// Add a route visiting `stops` in order, and describe its trips in
    /// the closure :
    ///
    /// ```
    /// # use raptor::model::NetworkBuilder;
    /// let network = NetworkBuilder::new(3)
    ///     .route(&[0, 1, 2], |route| {
    ///         route.trip("10:00:00 10:05:00 10:10:00");
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn route<F>(mut self, stops: &[StopIndex], route_initer: F) -> Self
    where
        F: FnOnce(&mut RouteBuilder),
    {
        let mut spec = RouteSpec {
            stops: stops.to_vec(),
            flows: vec![FlowDirection::BoardAndAlight; stops.len()],
            mode: TransitMode::Bus,
            agency: 0,
            slack_index: 0,
            priority_group_mask: 0,
            transit_reluctance_index: 0,
            trips: Vec::new(),
        };
        let mut route_builder = RouteBuilder { spec: &mut spec };
        route_initer(&mut route_builder);
        self.routes.push(spec);
        self
    }

    pub fn constrained_transfer(
        mut self,
        from: TransferPoint,
        to: TransferPoint,
        constraint: crate::model::TransferConstraint,
    ) -> Self {
        self.constrained.push(ConstrainedTransfer {
            from,
            to,
            constraint,
        });
        self
    }

    pub fn build(self) -> Result<TransitNetwork, NetworkBuildError> {
        let nb_of_stops = self.nb_of_stops;
        let mut patterns = Vec::with_capacity(self.routes.len());
        let mut timetables = Vec::with_capacity(self.routes.len());

        for (route, spec) in self.routes.iter().enumerate() {
            let pattern = Self::build_pattern(route, spec, nb_of_stops)?;
            let trips = Self::build_trips(route, spec, &pattern)?;
            patterns.push(pattern);
            timetables.push(trips);
        }

        let mut routes_by_stop = vec![Vec::new(); nb_of_stops];
        for (route, pattern) in patterns.iter().enumerate() {
            for &stop in &pattern.stops {
                let routes: &mut Vec<RouteIndex> = &mut routes_by_stop[stop];
                if routes.last() != Some(&route) && !routes.contains(&route) {
                    routes.push(route);
                }
            }
        }

        let mut transfers_from = vec![Vec::new(); nb_of_stops];
        let mut transfers_to = vec![Vec::new(); nb_of_stops];
        for &(from, transfer) in &self.transfers {
            if from >= nb_of_stops || transfer.to_stop >= nb_of_stops {
                return Err(NetworkBuildError::UnknownStop {
                    stop: from.max(transfer.to_stop),
                    nb_of_stops,
                });
            }
            transfers_from[from].push(transfer);
            // the reversed transfer, walked backwards by the reverse search
            transfers_to[transfer.to_stop].push(Transfer {
                to_stop: from,
                duration: transfer.duration,
                cost: transfer.cost,
            });
        }

        let (constrained_to_route, constrained_from_route) = Self::index_constrained_transfers(
            &self.constrained,
            &patterns,
            &timetables,
            &self.station_of_stop,
        )?;

        debug!(
            nb_of_stops,
            nb_of_routes = patterns.len(),
            nb_of_constrained_transfers = self.constrained.len(),
            "built transit network snapshot"
        );

        Ok(TransitNetwork {
            nb_of_stops,
            station_of_stop: self.station_of_stop,
            patterns,
            timetables,
            routes_by_stop,
            transfers_from,
            transfers_to,
            constrained_to_route,
            constrained_from_route,
            slack: self.slack,
            calendar: self.calendar,
        })
    }

    fn build_pattern(
        route: RouteIndex,
        spec: &RouteSpec,
        nb_of_stops: usize,
    ) -> Result<Pattern, NetworkBuildError> {
        if spec.stops.len() < 2 {
            return Err(NetworkBuildError::PatternTooShort { route });
        }
        for &stop in &spec.stops {
            if stop >= nb_of_stops {
                return Err(NetworkBuildError::UnknownStop { stop, nb_of_stops });
            }
        }
        // nobody alights at the first position nor boards at the last
        let last = spec.flows.len() - 1;
        let mut flows = spec.flows.clone();
        flows[0] = match flows[0] {
            FlowDirection::BoardAndAlight => FlowDirection::BoardOnly,
            FlowDirection::AlightOnly => FlowDirection::NoBoardAlight,
            flow => flow,
        };
        flows[last] = match flows[last] {
            FlowDirection::BoardAndAlight => FlowDirection::AlightOnly,
            FlowDirection::BoardOnly => FlowDirection::NoBoardAlight,
            flow => flow,
        };
        Ok(Pattern {
            stops: spec.stops.clone(),
            flows,
            slack_index: spec.slack_index,
            priority_group_mask: spec.priority_group_mask,
            mode: spec.mode,
            agency: spec.agency,
        })
    }

    fn build_trips(
        route: RouteIndex,
        spec: &RouteSpec,
        pattern: &Pattern,
    ) -> Result<Vec<TripSchedule>, NetworkBuildError> {
        let nb_of_positions = pattern.nb_of_positions();
        let mut trips = Vec::with_capacity(spec.trips.len());
        for (trip, trip_spec) in spec.trips.iter().enumerate() {
            let arrivals = Self::parse_times(&trip_spec.arrivals)?;
            let departures = Self::parse_times(&trip_spec.departures)?;
            if arrivals.len() != nb_of_positions || departures.len() != nb_of_positions {
                return Err(NetworkBuildError::TimesStopsMismatch {
                    route,
                    trip,
                    expected: nb_of_positions,
                    actual: arrivals.len().max(departures.len()),
                });
            }
            for position in 0..nb_of_positions {
                let decreasing_dwell = departures[position] < arrivals[position];
                let decreasing_ride = position + 1 < nb_of_positions
                    && arrivals[position + 1] < departures[position];
                if decreasing_dwell || decreasing_ride {
                    return Err(NetworkBuildError::DecreasingTimes {
                        route,
                        trip,
                        position,
                    });
                }
            }
            trips.push(TripSchedule {
                arrival_times: arrivals,
                departure_times: departures,
                trip_sort_index: trip,
                transit_reluctance_index: spec.transit_reluctance_index,
                wheelchair_accessible: trip_spec.wheelchair_accessible,
            });
        }
        // trips must stay ordered at every position so that both trip
        // searches may binary search the timetable
        for trip in 1..trips.len() {
            for position in 0..nb_of_positions {
                let unordered_departure = trips[trip].departure_times[position]
                    < trips[trip - 1].departure_times[position];
                let unordered_arrival =
                    trips[trip].arrival_times[position] < trips[trip - 1].arrival_times[position];
                if unordered_departure || unordered_arrival {
                    return Err(NetworkBuildError::TripsNotOrdered {
                        route,
                        trip,
                        position,
                    });
                }
            }
        }
        Ok(trips)
    }

    fn parse_times(times: &str) -> Result<Vec<Time>, NetworkBuildError> {
        times
            .split_whitespace()
            .map(|clock| parse_time(clock).map_err(NetworkBuildError::BadTime))
            .collect()
    }

    #[allow(clippy::type_complexity)]
    fn index_constrained_transfers(
        constrained: &[ConstrainedTransfer],
        patterns: &[Pattern],
        timetables: &[Vec<TripSchedule>],
        station_of_stop: &[Option<usize>],
    ) -> Result<
        (
            Vec<Option<ConstrainedTransfersForRoute>>,
            Vec<Option<ConstrainedTransfersForRoute>>,
        ),
        NetworkBuildError,
    > {
        let mut to_route: Vec<Option<ConstrainedTransfersForRoute>> = vec![None; patterns.len()];
        let mut from_route: Vec<Option<ConstrainedTransfersForRoute>> = vec![None; patterns.len()];

        for transfer in constrained {
            Self::check_point(&transfer.from, patterns, timetables)?;
            Self::check_point(&transfer.to, patterns, timetables)?;
            // forward search : indexed on the target route, matched
            // against the source arrival
            Self::index_point(
                &transfer.to,
                TransferForPattern {
                    matching_point: transfer.from,
                    own_trip: None,
                    constraint: transfer.constraint,
                    specificity: transfer.from.specificity_ranking(),
                },
                patterns,
                station_of_stop,
                &mut to_route,
            );
            // reverse search : indexed on the source route, matched
            // against the target departure
            Self::index_point(
                &transfer.from,
                TransferForPattern {
                    matching_point: transfer.to,
                    own_trip: None,
                    constraint: transfer.constraint,
                    specificity: transfer.to.specificity_ranking(),
                },
                patterns,
                station_of_stop,
                &mut from_route,
            );
        }
        for index in to_route.iter_mut().chain(from_route.iter_mut()) {
            if let Some(transfers) = index {
                transfers.sort_by_specificity();
            }
        }
        Ok((to_route, from_route))
    }

    fn check_point(
        point: &TransferPoint,
        patterns: &[Pattern],
        timetables: &[Vec<TripSchedule>],
    ) -> Result<(), NetworkBuildError> {
        let route = match *point {
            TransferPoint::Trip { trip, stop_position } => {
                if trip.route >= patterns.len() {
                    return Err(NetworkBuildError::UnknownRoute { route: trip.route });
                }
                if trip.trip >= timetables[trip.route].len() {
                    return Err(NetworkBuildError::TripOutOfBounds {
                        route: trip.route,
                        trip: trip.trip,
                    });
                }
                if stop_position >= patterns[trip.route].nb_of_positions() {
                    return Err(NetworkBuildError::PositionOutOfBounds {
                        route: trip.route,
                        position: stop_position,
                    });
                }
                return Ok(());
            }
            TransferPoint::RouteStop { route, .. } => route,
            TransferPoint::RouteStation { route, .. } => route,
            TransferPoint::Stop(_) | TransferPoint::Station(_) => return Ok(()),
        };
        if route >= patterns.len() {
            return Err(NetworkBuildError::UnknownRoute { route });
        }
        Ok(())
    }

    fn index_point(
        point: &TransferPoint,
        template: TransferForPattern,
        patterns: &[Pattern],
        station_of_stop: &[Option<usize>],
        index: &mut [Option<ConstrainedTransfersForRoute>],
    ) {
        let mut insert = |route: RouteIndex, position: usize, own_trip: Option<usize>| {
            let transfers = index[route].get_or_insert_with(|| {
                ConstrainedTransfersForRoute::new(patterns[route].nb_of_positions())
            });
            transfers.insert(
                position,
                TransferForPattern {
                    own_trip,
                    ..template
                },
            );
        };
        match *point {
            TransferPoint::Trip { trip, stop_position } => {
                insert(trip.route, stop_position, Some(trip.trip));
            }
            TransferPoint::RouteStop { route, stop } => {
                for (position, &pattern_stop) in patterns[route].stops.iter().enumerate() {
                    if pattern_stop == stop {
                        insert(route, position, None);
                    }
                }
            }
            TransferPoint::RouteStation { route, station } => {
                for (position, &pattern_stop) in patterns[route].stops.iter().enumerate() {
                    if station_of_stop[pattern_stop] == Some(station) {
                        insert(route, position, None);
                    }
                }
            }
            TransferPoint::Stop(stop) => {
                for (route, pattern) in patterns.iter().enumerate() {
                    for (position, &pattern_stop) in pattern.stops.iter().enumerate() {
                        if pattern_stop == stop {
                            insert(route, position, None);
                        }
                    }
                }
            }
            TransferPoint::Station(station) => {
                for (route, pattern) in patterns.iter().enumerate() {
                    for (position, &pattern_stop) in pattern.stops.iter().enumerate() {
                        if station_of_stop[pattern_stop] == Some(station) {
                            insert(route, position, None);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkBuildError {
    UnknownStop { stop: StopIndex, nb_of_stops: usize },
    UnknownRoute { route: RouteIndex },
    PatternTooShort { route: RouteIndex },
    TimesStopsMismatch {
        route: RouteIndex,
        trip: usize,
        expected: usize,
        actual: usize,
    },
    DecreasingTimes {
        route: RouteIndex,
        trip: usize,
        position: usize,
    },
    TripsNotOrdered {
        route: RouteIndex,
        trip: usize,
        position: usize,
    },
    TripOutOfBounds { route: RouteIndex, trip: usize },
    PositionOutOfBounds { route: RouteIndex, position: usize },
    BadTime(BadTimeString),
}

impl std::error::Error for NetworkBuildError {}

impl Display for NetworkBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkBuildError::UnknownStop { stop, nb_of_stops } => write!(
                f,
                "Stop {} is out of bounds : the network has {} stops.",
                stop, nb_of_stops
            ),
            NetworkBuildError::UnknownRoute { route } => {
                write!(f, "Route {} does not exist.", route)
            }
            NetworkBuildError::PatternTooShort { route } => {
                write!(f, "Route {} visits fewer than two stops.", route)
            }
            NetworkBuildError::TimesStopsMismatch {
                route,
                trip,
                expected,
                actual,
            } => write!(
                f,
                "Trip {} of route {} has {} times but its pattern has {} stops.",
                trip, route, actual, expected
            ),
            NetworkBuildError::DecreasingTimes {
                route,
                trip,
                position,
            } => write!(
                f,
                "Trip {} of route {} has decreasing times at position {}.",
                trip, route, position
            ),
            NetworkBuildError::TripsNotOrdered {
                route,
                trip,
                position,
            } => write!(
                f,
                "Trip {} of route {} overtakes the previous trip at position {} ; \
                 trips of one route must be inserted in timetable order.",
                trip, route, position
            ),
            NetworkBuildError::TripOutOfBounds { route, trip } => {
                write!(f, "Route {} has no trip {}.", route, trip)
            }
            NetworkBuildError::PositionOutOfBounds { route, position } => {
                write!(f, "Route {} has no stop position {}.", route, position)
            }
            NetworkBuildError::BadTime(err) => err.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_times_stops_mismatch() {
        let result = NetworkBuilder::new(3)
            .route(&[0, 1, 2], |route| {
                route.trip("10:00:00 10:05:00");
            })
            .build();
        assert!(matches!(
            result,
            Err(NetworkBuildError::TimesStopsMismatch { .. })
        ));
    }

    #[test]
    fn rejects_decreasing_times() {
        let result = NetworkBuilder::new(3)
            .route(&[0, 1, 2], |route| {
                route.trip("10:00:00 09:55:00 10:10:00");
            })
            .build();
        assert!(matches!(
            result,
            Err(NetworkBuildError::DecreasingTimes { .. })
        ));
    }

    #[test]
    fn rejects_overtaking_trips() {
        let result = NetworkBuilder::new(2)
            .route(&[0, 1], |route| {
                route.trip("10:00:00 10:10:00").trip("09:00:00 09:10:00");
            })
            .build();
        assert!(matches!(
            result,
            Err(NetworkBuildError::TripsNotOrdered { .. })
        ));
    }

    #[test]
    fn endpoint_flows_are_corrected() {
        let network = NetworkBuilder::new(3)
            .route(&[0, 1, 2], |route| {
                route.trip("10:00:00 10:05:00 10:10:00");
            })
            .build()
            .unwrap();
        let pattern = network.pattern(0);
        assert!(pattern.can_board(0) && !pattern.can_alight(0));
        assert!(pattern.can_board(1) && pattern.can_alight(1));
        assert!(!pattern.can_board(2) && pattern.can_alight(2));
    }

    #[test]
    fn reverse_transfers_are_indexed() {
        let network = NetworkBuilder::new(3)
            .route(&[0, 1], |route| {
                route.trip("10:00:00 10:10:00");
            })
            .transfer(1, 2, PositiveDuration::from_seconds(120))
            .build()
            .unwrap();
        assert_eq!(1, network.transfers_from(1).len());
        assert_eq!(2, network.transfers_from(1)[0].to_stop);
        assert_eq!(1, network.transfers_to(2).len());
        assert_eq!(1, network.transfers_to(2)[0].to_stop);
    }
}
