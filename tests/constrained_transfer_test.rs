mod utils;

use raptor::engine::constrained_boarding::{
    ConstrainedBoarding, ConstrainedBoardingSearch, TransitArrivalSource,
};
use raptor::engine::trip_search::BoardAlightEvent;
use raptor::engine::SearchDirection;
use raptor::model::{
    NetworkBuilder, TransferConstraint, TransferPoint, TransitData, TransitNetwork, TripRef,
};
use raptor::{solve, AccessEgress, CostCalculator, PathLeg, PositiveDuration, SearchParams};
use utils::{constrained_transfer_network, init, time, STOP_A, STOP_B, STOP_C, STOP_D};

const ROUTE_1: usize = 0;
const ROUTE_2: usize = 1;
const STATION_B: usize = 0;

const GUARANTEED: TransferConstraint = TransferConstraint::Guaranteed;
const NOT_ALLOWED: TransferConstraint = TransferConstraint::NotAllowed;

/// The last trip of route 1, arriving at B 10:15 and C 10:25.
fn forward_source(stop: usize) -> TransitArrivalSource {
    let (stop_position, arrival) = match stop {
        STOP_B => (1, "10:15:00"),
        STOP_C => (2, "10:25:00"),
        _ => panic!("route 1 does not alight at stop {}", stop),
    };
    TransitArrivalSource {
        trip: TripRef {
            route: ROUTE_1,
            trip: 1,
        },
        stop,
        stop_position,
        slack_free_arrival_time: time(arrival),
    }
}

/// The first trip of route 2, departing B 10:15 and C 10:30.
fn reverse_source(stop: usize) -> TransitArrivalSource {
    let (stop_position, departure) = match stop {
        STOP_B => (0, "10:15:00"),
        STOP_C => (1, "10:30:00"),
        _ => panic!("route 2 does not board at stop {}", stop),
    };
    TransitArrivalSource {
        trip: TripRef {
            route: ROUTE_2,
            trip: 0,
        },
        stop,
        stop_position,
        slack_free_arrival_time: time(departure),
    }
}

fn find_forward(
    network: &TransitNetwork,
    stop: usize,
) -> Option<ConstrainedBoarding> {
    let transfers = network
        .constrained_transfers_to_route(ROUTE_2)
        .expect("route 2 should carry constrained transfers");
    let search = ConstrainedBoardingSearch::new(SearchDirection::Forward, transfers);
    let stop_position = match stop {
        STOP_B => 0,
        STOP_C => 1,
        _ => panic!(),
    };
    assert!(search.transfer_exists(stop_position));
    search.find(
        network,
        network.timetable(ROUTE_2),
        network.pattern(ROUTE_2),
        stop_position,
        &forward_source(stop),
    )
}

fn find_reverse(
    network: &TransitNetwork,
    stop: usize,
) -> Option<ConstrainedBoarding> {
    let transfers = network
        .constrained_transfers_from_route(ROUTE_1)
        .expect("route 1 should carry constrained transfers");
    let search = ConstrainedBoardingSearch::new(SearchDirection::Reverse, transfers);
    let stop_position = match stop {
        STOP_B => 1,
        STOP_C => 2,
        _ => panic!(),
    };
    assert!(search.transfer_exists(stop_position));
    search.find(
        network,
        network.timetable(ROUTE_1),
        network.pattern(ROUTE_1),
        stop_position,
        &reverse_source(stop),
    )
}

fn assert_boarding(
    outcome: Option<ConstrainedBoarding>,
    expected_trip: usize,
    expected_constraint: Option<TransferConstraint>,
) -> BoardAlightEvent {
    match outcome {
        Some(ConstrainedBoarding::Board(event)) => {
            assert_eq!(expected_trip, event.trip_index);
            assert_eq!(expected_constraint, event.constraint);
            event
        }
        other => panic!("expected a boarding, got {:?}", other),
    }
}

/// The tight connection at B (arrival 10:15, departure 10:15) only
/// works for facilitated transfers : every point type must resolve to
/// boarding trip 0 forward and trip 1 in reverse.
fn assert_guaranteed_with_zero_connection_time(network: &TransitNetwork) {
    let event = assert_boarding(find_forward(network, STOP_B), 0, Some(GUARANTEED));
    assert_eq!(time("10:15:00"), event.time);
    assert_eq!(time("10:15:00"), event.earliest_board_time);

    let event = assert_boarding(find_reverse(network, STOP_B), 1, Some(GUARANTEED));
    assert_eq!(time("10:15:00"), event.time);
}

#[test]
fn guaranteed_transfer_with_station_point() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Station(STATION_B),
            TransferPoint::Station(STATION_B),
            GUARANTEED,
        )
    });
    assert_guaranteed_with_zero_connection_time(&network);
}

#[test]
fn guaranteed_transfer_with_stop_point() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Stop(STOP_B),
            TransferPoint::Stop(STOP_B),
            GUARANTEED,
        )
    });
    assert_guaranteed_with_zero_connection_time(&network);
}

#[test]
fn guaranteed_transfer_with_route_stop_points() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::RouteStop {
                route: ROUTE_1,
                stop: STOP_B,
            },
            TransferPoint::RouteStop {
                route: ROUTE_2,
                stop: STOP_B,
            },
            GUARANTEED,
        )
    });
    assert_guaranteed_with_zero_connection_time(&network);
}

#[test]
fn guaranteed_transfer_with_route_station_points() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::RouteStation {
                route: ROUTE_1,
                station: STATION_B,
            },
            TransferPoint::RouteStation {
                route: ROUTE_2,
                station: STATION_B,
            },
            GUARANTEED,
        )
    });
    assert_guaranteed_with_zero_connection_time(&network);
}

#[test]
fn guaranteed_transfer_with_trip_points() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Trip {
                trip: TripRef {
                    route: ROUTE_1,
                    trip: 1,
                },
                stop_position: 1,
            },
            TransferPoint::Trip {
                trip: TripRef {
                    route: ROUTE_2,
                    trip: 0,
                },
                stop_position: 0,
            },
            GUARANTEED,
        )
    });
    assert_guaranteed_with_zero_connection_time(&network);
}

// when a trip-level and coarser constraints could all apply, the most
// specific source point decides
#[test]
fn most_specific_transfer_point_wins() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder
            .constrained_transfer(
                TransferPoint::Stop(STOP_B),
                TransferPoint::Trip {
                    trip: TripRef {
                        route: ROUTE_2,
                        trip: 0,
                    },
                    stop_position: 0,
                },
                NOT_ALLOWED,
            )
            .constrained_transfer(
                TransferPoint::Trip {
                    trip: TripRef {
                        route: ROUTE_1,
                        trip: 1,
                    },
                    stop_position: 1,
                },
                TransferPoint::Stop(STOP_B),
                GUARANTEED,
            )
            .constrained_transfer(
                TransferPoint::RouteStop {
                    route: ROUTE_1,
                    stop: STOP_B,
                },
                TransferPoint::Stop(STOP_B),
                NOT_ALLOWED,
            )
    });
    assert_boarding(find_forward(&network, STOP_B), 0, Some(GUARANTEED));
}

// a trip-to-trip not-allowed transfer skips that trip only : the next
// trip boards as a regular transfer
#[test]
fn next_trip_boards_when_the_first_transfer_is_not_allowed() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Trip {
                trip: TripRef {
                    route: ROUTE_1,
                    trip: 1,
                },
                stop_position: 2,
            },
            TransferPoint::Trip {
                trip: TripRef {
                    route: ROUTE_2,
                    trip: 0,
                },
                stop_position: 1,
            },
            NOT_ALLOWED,
        )
    });
    assert_boarding(find_forward(&network, STOP_C), 1, None);
    assert_boarding(find_reverse(&network, STOP_C), 0, None);
}

// a stop-level not-allowed transfer blocks the stop entirely
#[test]
fn not_allowed_covering_all_trips_blocks_boarding() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Stop(STOP_C),
            TransferPoint::Stop(STOP_C),
            NOT_ALLOWED,
        )
    });
    assert!(matches!(
        find_forward(&network, STOP_C),
        Some(ConstrainedBoarding::NotAllowed)
    ));
    assert!(matches!(
        find_reverse(&network, STOP_C),
        Some(ConstrainedBoarding::NotAllowed)
    ));
}

// the constrained trip sits past the scan horizon : the search gives up
// and the regular search takes over
#[test]
fn search_aborts_after_five_normal_trips() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Trip {
                trip: TripRef {
                    route: ROUTE_1,
                    trip: 1,
                },
                stop_position: 2,
            },
            TransferPoint::Trip {
                trip: TripRef {
                    route: ROUTE_2,
                    trip: 5,
                },
                stop_position: 1,
            },
            GUARANTEED,
        )
    });
    assert!(find_forward(&network, STOP_C).is_none());
}

#[test]
fn minimum_transfer_time_replaces_the_slacks() {
    init();
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Stop(STOP_C),
            TransferPoint::Stop(STOP_C),
            TransferConstraint::MinTransferTime(PositiveDuration::from_seconds(600)),
        )
    });
    // source arrives C at 10:25 ; + 10 min = 10:35, boarding trip 1
    let event = assert_boarding(
        find_forward(&network, STOP_C),
        1,
        Some(TransferConstraint::MinTransferTime(
            PositiveDuration::from_seconds(600),
        )),
    );
    assert_eq!(time("10:35:00"), event.earliest_board_time);
    // reverse : target departs C at 10:30 ; - 10 min = 10:20, trip 0
    let event = assert_boarding(
        find_reverse(&network, STOP_C),
        0,
        Some(TransferConstraint::MinTransferTime(
            PositiveDuration::from_seconds(600),
        )),
    );
    assert_eq!(time("10:20:00"), event.earliest_board_time);
}

#[test]
fn zero_minimum_transfer_time_boards_like_guaranteed() {
    init();
    let constraint = TransferConstraint::MinTransferTime(PositiveDuration::zero());
    let network = constrained_transfer_network(|builder| {
        builder.constrained_transfer(
            TransferPoint::Stop(STOP_B),
            TransferPoint::Stop(STOP_B),
            constraint,
        )
    });
    assert_boarding(find_forward(&network, STOP_B), 0, Some(constraint));
    assert_boarding(find_reverse(&network, STOP_B), 1, Some(constraint));
}

// end to end : with the regular slacks the rider misses the tight
// connection at B, the guaranteed transfer holds it
#[test]
fn guaranteed_transfer_shortens_the_journey() {
    init();
    let build = |guaranteed: bool| {
        let builder = NetworkBuilder::new(4)
            .slack(raptor::model::SlackProvider::uniform(
                PositiveDuration::from_seconds(240),
                PositiveDuration::from_seconds(120),
                PositiveDuration::zero(),
            ))
            .route(&[STOP_A, STOP_B], |route| {
                route.trip("10:00:00 10:10:00").trip("10:05:00 10:15:00");
            })
            .route(&[STOP_B, STOP_D], |route| {
                route
                    .trip("10:15:00 10:40:00")
                    .trip("10:20:00 10:45:00")
                    .trip("10:25:00 10:50:00");
            });
        if guaranteed {
            builder.constrained_transfer(
                TransferPoint::Stop(STOP_B),
                TransferPoint::Stop(STOP_B),
                GUARANTEED,
            )
        } else {
            builder
        }
        .build()
        .unwrap()
    };
    let walk = |stop: usize| AccessEgress::walk(stop, PositiveDuration::from_seconds(60));
    let params = SearchParams::depart_after(time("09:55:00"))
        .with_search_window(PositiveDuration::from_seconds(600));
    let cost = CostCalculator::default();

    let response = solve(
        &build(false),
        &cost,
        vec![walk(STOP_A)],
        vec![walk(STOP_D)],
        &params,
    )
    .unwrap();
    // regular transfer at B : alight 10:10 + 2 min alight slack
    // + 4 min board slack misses the 10:15 departure
    let best_arrival = response
        .paths
        .iter()
        .map(|path| path.arrival_time)
        .min()
        .unwrap();
    assert_eq!(time("10:48:00"), best_arrival);

    let response = solve(
        &build(true),
        &cost,
        vec![walk(STOP_A)],
        vec![walk(STOP_D)],
        &params,
    )
    .unwrap();
    assert_eq!(1, response.paths.len());
    let path = &response.paths[0];
    // the guaranteed transfer boards at 10:15, zero connection time
    assert_eq!(time("10:43:00"), path.arrival_time);
    let second_ride = path
        .legs
        .iter()
        .filter_map(|leg| match leg {
            PathLeg::Transit {
                board_time,
                constraint,
                ..
            } => Some((*board_time, *constraint)),
            _ => None,
        })
        .nth(1)
        .expect("the journey should have two rides");
    assert_eq!((time("10:15:00"), Some(GUARANTEED)), second_ride);
}
