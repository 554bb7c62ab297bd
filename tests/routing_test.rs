mod utils;

use std::time::{Duration, Instant};

use raptor::access::EgressPaths;
use raptor::engine::std_worker::StdWorkerState;
use raptor::engine::worker::{BoardSearchMode, RoundContext, WorkerState};
use raptor::engine::SearchDirection;
use raptor::model::{NetworkBuilder, TransitData};
use raptor::{
    solve, AccessEgress, CostCalculator, PathLeg, PositiveDuration, Profile, RequestError,
    SearchParams,
};
use utils::{init, time, two_lines_with_transfer, STOP_A, STOP_B, STOP_C, STOP_D};

fn walk(stop: usize, seconds: u32) -> AccessEgress {
    AccessEgress::walk(stop, PositiveDuration::from_seconds(seconds))
}

#[test]
fn single_line_journey() {
    init();
    let network = NetworkBuilder::new(3)
        .route(&[0, 1, 2], |route| {
            route.trip("10:00:00 10:05:00 10:10:00");
        })
        .build()
        .unwrap();

    let params = SearchParams::depart_after(time("09:55:00"))
        .with_search_window(PositiveDuration::from_seconds(300));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        vec![walk(2, 60)],
        &params,
    )
    .unwrap();

    assert!(!response.incomplete);
    assert_eq!(1, response.paths.len());
    let path = &response.paths[0];
    // the access is time-shifted to depart as late as possible
    assert_eq!(time("09:59:00"), path.departure_time);
    assert_eq!(time("10:11:00"), path.arrival_time);
    assert_eq!(0, path.num_transfers);
    assert_eq!(3, path.legs.len());
    match &path.legs[1] {
        PathLeg::Transit {
            board_stop,
            alight_stop,
            board_time,
            alight_time,
            ..
        } => {
            assert_eq!((0, 2), (*board_stop, *alight_stop));
            assert_eq!(time("10:00:00"), *board_time);
            assert_eq!(time("10:10:00"), *alight_time);
        }
        leg => panic!("expected a transit leg, got {:?}", leg),
    }
}

#[test]
fn journey_with_foot_transfer() {
    init();
    let network = two_lines_with_transfer();

    let params = SearchParams::depart_after(time("09:55:00"))
        .with_search_window(PositiveDuration::from_seconds(300));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(STOP_A, 60)],
        vec![walk(STOP_D, 60)],
        &params,
    )
    .unwrap();

    assert_eq!(1, response.paths.len());
    let path = &response.paths[0];
    assert_eq!(1, path.num_transfers);
    assert_eq!(time("09:59:00"), path.departure_time);
    assert_eq!(time("10:31:00"), path.arrival_time);
    assert_eq!(5, path.legs.len());
    assert!(matches!(path.legs[0], PathLeg::Access { .. }));
    assert!(matches!(
        path.legs[2],
        PathLeg::Transfer {
            from_stop: STOP_B,
            to_stop: STOP_C,
            ..
        }
    ));
    assert!(matches!(path.legs[4], PathLeg::Egress { .. }));
}

// the reverse search finds the same journey as the forward one
#[test]
fn reverse_search_is_symmetric() {
    init();
    let network = two_lines_with_transfer();

    let params = raptor::SearchParams::arrive_before(time("10:40:00"))
        .with_search_window(PositiveDuration::from_seconds(600));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(STOP_A, 60)],
        vec![walk(STOP_D, 60)],
        &params,
    )
    .unwrap();

    assert_eq!(1, response.paths.len());
    let path = &response.paths[0];
    assert_eq!(time("09:59:00"), path.departure_time);
    assert_eq!(time("10:31:00"), path.arrival_time);
    assert_eq!(1, path.num_transfers);
    assert_eq!(5, path.legs.len());
}

// two departures of the same line : the range sweep finds both, and an
// iteration producing the same arrival from an earlier departure never
// adds a duplicate
#[test]
fn range_sweep_keeps_one_path_per_departure() {
    init();
    let network = NetworkBuilder::new(2)
        .route(&[0, 1], |route| {
            route.trip("10:00:00 10:10:00").trip("10:30:00 10:40:00");
        })
        .build()
        .unwrap();

    let params = SearchParams::depart_after(time("09:50:00"))
        .with_search_window(PositiveDuration::from_hms(0, 45, 0));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        vec![walk(1, 60)],
        &params,
    )
    .unwrap();

    assert_eq!(2, response.paths.len());
    assert_eq!(time("09:59:00"), response.paths[0].departure_time);
    assert_eq!(time("10:11:00"), response.paths[0].arrival_time);
    assert_eq!(time("10:29:00"), response.paths[1].departure_time);
    assert_eq!(time("10:41:00"), response.paths[1].arrival_time);
}

#[test]
fn dynamic_window_covers_the_next_departures() {
    init();
    // no explicit window : it is derived from the heuristic search
    let network = NetworkBuilder::new(2)
        .route(&[0, 1], |route| {
            route.trip("10:00:00 10:10:00").trip("10:20:00 10:30:00");
        })
        .build()
        .unwrap();

    let params = SearchParams::depart_after(time("09:55:00"));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        vec![walk(1, 60)],
        &params,
    )
    .unwrap();

    // the default minimum window (40 min) spans both departures
    assert_eq!(2, response.paths.len());
}

// a forward request may anchor on its latest arrival time alone : the
// window is derived backwards from it
#[test]
fn forward_request_anchored_on_latest_arrival() {
    init();
    let network = NetworkBuilder::new(2)
        .route(&[0, 1], |route| {
            route.trip("10:00:00 10:10:00");
        })
        .build()
        .unwrap();

    let params = SearchParams {
        latest_arrival_time: Some(time("10:30:00")),
        ..SearchParams::default()
    };
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        vec![walk(1, 60)],
        &params,
    )
    .unwrap();

    assert_eq!(1, response.paths.len());
    assert_eq!(time("10:11:00"), response.paths[0].arrival_time);
}

#[test]
fn unreachable_destination_yields_an_empty_response() {
    init();
    let network = NetworkBuilder::new(3)
        .route(&[0, 1], |route| {
            route.trip("10:00:00 10:10:00");
        })
        .build()
        .unwrap();

    let params = SearchParams::depart_after(time("09:55:00"));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        // stop 2 is served by nothing
        vec![walk(2, 60)],
        &params,
    )
    .unwrap();
    assert!(response.paths.is_empty());
    assert!(!response.incomplete);
}

#[test]
fn missing_legs_are_request_errors() {
    init();
    let network = two_lines_with_transfer();
    let params = SearchParams::depart_after(time("09:55:00"));
    let cost = CostCalculator::default();

    let err = solve(&network, &cost, vec![], vec![walk(STOP_D, 60)], &params).unwrap_err();
    assert_eq!(RequestError::NoAccessLegs, err);
    let err = solve(&network, &cost, vec![walk(STOP_A, 60)], vec![], &params).unwrap_err();
    assert_eq!(RequestError::NoEgressLegs, err);

    let no_anchor = SearchParams::default();
    let err = solve(
        &network,
        &cost,
        vec![walk(STOP_A, 60)],
        vec![walk(STOP_D, 60)],
        &no_anchor,
    )
    .unwrap_err();
    assert_eq!(RequestError::MissingTimeAnchor, err);
}

// an expired deadline yields a valid, explicitly incomplete response
#[test]
fn expired_deadline_yields_partial_results() {
    init();
    let network = two_lines_with_transfer();
    let params = SearchParams {
        deadline: Some(Instant::now() - Duration::from_secs(1)),
        ..SearchParams::depart_after(time("09:55:00"))
            .with_search_window(PositiveDuration::from_seconds(300))
    };
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(STOP_A, 60)],
        vec![walk(STOP_D, 60)],
        &params,
    )
    .unwrap();
    assert!(response.incomplete);
    assert!(response.paths.is_empty());
}

#[test]
fn flex_access_seeds_its_own_round() {
    init();
    let network = two_lines_with_transfer();
    // a flex access arriving on board at B counts as one ride already
    let flex = AccessEgress::flex(STOP_B, PositiveDuration::from_seconds(300), 1);

    let params = SearchParams::depart_after(time("09:55:00"))
        .with_search_window(PositiveDuration::from_seconds(300));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![flex],
        vec![walk(STOP_D, 60)],
        &params,
    )
    .unwrap();

    assert_eq!(1, response.paths.len());
    let path = &response.paths[0];
    // flex ride + transit ride
    assert_eq!(1, path.num_transfers);
    assert_eq!(time("10:31:00"), path.arrival_time);
}

// inserting the same arrival twice never changes the best-known time,
// and an equal candidate never replaces the incumbent
#[test]
fn standard_relaxation_is_idempotent() {
    init();
    let network = two_lines_with_transfer();
    let cost = CostCalculator::default();
    let ctx = RoundContext {
        data: &network,
        cost: &cost,
        direction: SearchDirection::Forward,
        board_search_mode: BoardSearchMode::Regular,
    };
    let mut state = StdWorkerState::new(
        network.nb_of_stops(),
        network.nb_of_routes(),
        SearchDirection::Forward,
        EgressPaths::new(network.nb_of_stops(), Vec::new()),
    );

    let leg = AccessEgress::walk(STOP_A, PositiveDuration::from_seconds(60));
    state.set_access_to_stop(&ctx, &leg, time("09:55:00"), 0);
    let best = state.best_arrival_time(STOP_A);
    assert_eq!(Some(time("09:56:00")), best);

    state.set_access_to_stop(&ctx, &leg, time("09:55:00"), 0);
    assert_eq!(best, state.best_arrival_time(STOP_A));

    // an equal-time leg with a different shape does not replace it
    let equal = AccessEgress::walk(STOP_A, PositiveDuration::from_seconds(120));
    state.set_access_to_stop(&ctx, &equal, time("09:54:00"), 0);
    assert_eq!(best, state.best_arrival_time(STOP_A));

    // a strictly better candidate does
    state.set_access_to_stop(&ctx, &leg, time("09:54:00"), 0);
    assert_eq!(Some(time("09:55:00")), state.best_arrival_time(STOP_A));
}

#[test]
fn standard_profile_keeps_only_the_best_arrival() {
    init();
    // a slow direct line and a faster two-leg alternative
    let network = NetworkBuilder::new(3)
        .route(&[0, 1], |route| {
            route.trip("10:00:00 10:40:00");
        })
        .route(&[0, 2], |route| {
            route.trip("10:00:00 10:10:00");
        })
        .route(&[2, 1], |route| {
            route.trip("10:12:00 10:20:00");
        })
        .build()
        .unwrap();

    let params = SearchParams::depart_after(time("09:55:00"))
        .with_search_window(PositiveDuration::from_seconds(120));
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        vec![walk(1, 60)],
        &params,
    )
    .unwrap();

    assert_eq!(1, response.paths.len());
    assert_eq!(time("10:21:00"), response.paths[0].arrival_time);

    // the multicriteria profile keeps the direct journey too : it rides
    // less, even though it arrives later
    let params = params.with_profile(Profile::MultiCriteria);
    let response = solve(
        &network,
        &CostCalculator::default(),
        vec![walk(0, 60)],
        vec![walk(1, 60)],
        &params,
    )
    .unwrap();
    assert_eq!(2, response.paths.len());
}
