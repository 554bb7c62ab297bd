//! The outer entry point : resolves the search window, drives the
//! range-raptor worker for the requested profile and harvests results.

use tracing::{debug, info};

use crate::access::{AccessEgress, AccessPaths, EgressPaths};
use crate::cost_calculator::CostCalculator;
use crate::engine::{
    Heuristics, McWorkerState, RangeRaptorWorker, SearchDirection, StdWorkerState,
};
use crate::model::TransitData;
use crate::path::Path;
use crate::request::{Profile, RequestError, SearchParams};
use crate::search_window::{SearchWindow, SearchWindowCalculator};
use crate::time::Time;

/// The result of one search.
#[derive(Debug)]
pub struct RaptorResponse {
    /// Pareto set of journeys, ordered by departure time.
    pub paths: Vec<Path>,
    /// Set when the deadline cut the search short : the paths are
    /// valid, but possibly not all optimal journeys were found.
    pub incomplete: bool,
}

impl RaptorResponse {
    fn empty() -> Self {
        Self {
            paths: Vec::new(),
            incomplete: false,
        }
    }
}

/// Compute the optimal journeys between the given access and egress
/// legs.
pub fn solve<D: TransitData>(
    data: &D,
    cost: &CostCalculator,
    access: Vec<AccessEgress>,
    egress: Vec<AccessEgress>,
    params: &SearchParams,
) -> Result<RaptorResponse, RequestError> {
    params.validate()?;
    if access.is_empty() {
        return Err(RequestError::NoAccessLegs);
    }
    if egress.is_empty() {
        return Err(RequestError::NoEgressLegs);
    }

    // the reverse search runs from the rider's destination, so the leg
    // sets swap roles
    let (origin_legs, destination_legs) = match params.direction {
        SearchDirection::Forward => (access, egress),
        SearchDirection::Reverse => (egress, access),
    };

    let window = match resolve_window(data, cost, &origin_legs, &destination_legs, params)? {
        Some(window) => window,
        // the heuristic search found no journey at all
        None => return Ok(RaptorResponse::empty()),
    };
    debug!(
        earliest_departure_time = window.earliest_departure_time,
        search_window = %window.search_window,
        "resolved search window"
    );

    let times = iteration_times(&window, params);
    let (paths, complete) = run_worker(
        data,
        cost,
        params,
        origin_legs,
        destination_legs,
        times,
    );
    info!(
        nb_of_paths = paths.len(),
        complete, "raptor search finished"
    );
    Ok(RaptorResponse {
        paths,
        incomplete: !complete,
    })
}

/// The per-stop lower-bound table of a standard one-iteration search,
/// for outer pruning layers.
pub fn compute_heuristics<D: TransitData>(
    data: &D,
    cost: &CostCalculator,
    access: Vec<AccessEgress>,
    params: &SearchParams,
) -> Result<Heuristics, RequestError> {
    params.validate()?;
    if access.is_empty() {
        return Err(RequestError::NoAccessLegs);
    }
    let anchor = anchor_time(params)?;
    let state = StdWorkerState::new(
        data.nb_of_stops(),
        data.nb_of_routes(),
        params.direction,
        EgressPaths::new(data.nb_of_stops(), Vec::new()),
    );
    let mut worker = RangeRaptorWorker::new(
        data,
        cost,
        params.direction,
        state,
        AccessPaths::new(access),
        vec![anchor],
        params.iteration_step.seconds_i32(),
        params.max_rounds,
        params.max_additional_transfers,
        params.deadline,
    );
    worker.route();
    Ok(worker.state().extract_heuristics(cost, anchor))
}

fn anchor_time(params: &SearchParams) -> Result<Time, RequestError> {
    match params.direction {
        SearchDirection::Forward => params
            .earliest_departure_time
            .or(params.latest_arrival_time)
            .ok_or(RequestError::MissingTimeAnchor),
        SearchDirection::Reverse => params
            .latest_arrival_time
            .ok_or(RequestError::MissingTimeAnchor),
    }
}

fn resolve_window<D: TransitData>(
    data: &D,
    cost: &CostCalculator,
    origin_legs: &[AccessEgress],
    destination_legs: &[AccessEgress],
    params: &SearchParams,
) -> Result<Option<SearchWindow>, RequestError> {
    if let Some(window) = params.search_window {
        let earliest_departure_time = match (
            params.earliest_departure_time,
            params.latest_arrival_time,
        ) {
            (Some(earliest), _) => earliest,
            (None, Some(latest)) => latest - window.seconds_i32(),
            (None, None) => return Err(RequestError::MissingTimeAnchor),
        };
        return Ok(Some(SearchWindow {
            earliest_departure_time,
            latest_arrival_time: params.latest_arrival_time,
            search_window: window,
        }));
    }

    // no fixed window : derive one from a heuristic standard search
    let Some((min_transit_time, min_wait_time)) =
        heuristic_travel_info(data, cost, origin_legs, destination_legs, params)?
    else {
        return Ok(None);
    };
    let mut calculator = SearchWindowCalculator::new(params.window_params.clone())
        .with_heuristics(min_transit_time, min_wait_time);
    if let Some(earliest) = params.earliest_departure_time {
        calculator = calculator.with_earliest_departure_time(earliest);
    }
    if let Some(latest) = params.latest_arrival_time {
        calculator = calculator.with_latest_arrival_time(latest);
    }
    Ok(Some(calculator.calculate()))
}

/// Run one standard iteration to estimate the minimum transit and wait
/// times of the request. `None` when the destination is unreachable.
///
/// A forward request anchored only on its latest arrival time has no
/// departure anchor yet : the probe then runs in reverse, from the
/// destination.
fn heuristic_travel_info<D: TransitData>(
    data: &D,
    cost: &CostCalculator,
    origin_legs: &[AccessEgress],
    destination_legs: &[AccessEgress],
    params: &SearchParams,
) -> Result<Option<(i32, i32)>, RequestError> {
    let (direction, anchor, origin_legs, destination_legs) =
        match (params.direction, params.earliest_departure_time) {
            (SearchDirection::Forward, None) => (
                SearchDirection::Reverse,
                params
                    .latest_arrival_time
                    .ok_or(RequestError::MissingTimeAnchor)?,
                destination_legs,
                origin_legs,
            ),
            _ => (
                params.direction,
                anchor_time(params)?,
                origin_legs,
                destination_legs,
            ),
        };
    let state = StdWorkerState::new(
        data.nb_of_stops(),
        data.nb_of_routes(),
        direction,
        EgressPaths::new(data.nb_of_stops(), destination_legs.to_vec()),
    );
    let mut worker = RangeRaptorWorker::new(
        data,
        cost,
        direction,
        state,
        AccessPaths::new(origin_legs.to_vec()),
        vec![anchor],
        params.iteration_step.seconds_i32(),
        params.max_rounds,
        params.max_additional_transfers,
        params.deadline,
    );
    worker.route();
    let (paths, _) = worker.into_paths();
    let Some(path) = paths.first() else {
        return Ok(None);
    };
    Ok(Some((
        path.transit_duration() + path.street_duration(),
        path.wait_duration().max(0),
    )))
}

/// The iteration departure times, direction-latest first, so every
/// iteration may re-use the arrivals of the ones already run.
fn iteration_times(window: &SearchWindow, params: &SearchParams) -> Vec<Time> {
    let step = params.iteration_step.seconds_i32().max(1);
    let nb_of_iterations = (window.search_window.seconds_i32() / step).max(1) as usize;
    match params.direction {
        SearchDirection::Forward => {
            let earliest = window.earliest_departure_time;
            (0..nb_of_iterations)
                .rev()
                .map(|k| earliest + (k as i32) * step)
                .collect()
        }
        SearchDirection::Reverse => {
            let latest = window
                .latest_arrival_time
                .unwrap_or(window.earliest_departure_time + window.search_window.seconds_i32());
            (0..nb_of_iterations)
                .rev()
                .map(|k| latest - (k as i32) * step)
                .collect()
        }
    }
}

fn run_worker<D: TransitData>(
    data: &D,
    cost: &CostCalculator,
    params: &SearchParams,
    origin_legs: Vec<AccessEgress>,
    destination_legs: Vec<AccessEgress>,
    iteration_times: Vec<Time>,
) -> (Vec<Path>, bool) {
    let egress_paths = EgressPaths::new(data.nb_of_stops(), destination_legs);
    let access_paths = AccessPaths::new(origin_legs);
    match params.profile {
        Profile::Standard => {
            let state = StdWorkerState::new(
                data.nb_of_stops(),
                data.nb_of_routes(),
                params.direction,
                egress_paths,
            );
            let mut worker = RangeRaptorWorker::new(
                data,
                cost,
                params.direction,
                state,
                access_paths,
                iteration_times,
                params.iteration_step.seconds_i32(),
                params.max_rounds,
                params.max_additional_transfers,
                params.deadline,
            );
            worker.route();
            worker.into_paths()
        }
        Profile::MultiCriteria => {
            let state = McWorkerState::new(
                data.nb_of_stops(),
                data.nb_of_routes(),
                params.direction,
                egress_paths,
            );
            let mut worker = RangeRaptorWorker::new(
                data,
                cost,
                params.direction,
                state,
                access_paths,
                iteration_times,
                params.iteration_step.seconds_i32(),
                params.max_rounds,
                params.max_additional_transfers,
                params.deadline,
            );
            worker.route();
            worker.into_paths()
        }
    }
}
