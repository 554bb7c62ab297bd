mod utils;

use rstest::rstest;

use raptor::engine::trip_search::{
    find_positions_forward_approximate, find_positions_reverse_approximate,
    search_for_exact_trip, search_for_trip, BoardAlightPositions,
};
use raptor::engine::SearchDirection;
use raptor::model::{FlowDirection, NetworkBuilder, TransitData, TransitNetwork};
use raptor::Time;
use utils::{init, time};

const STEP: i32 = 60;

/// One route, one trip departing the first stop at t = 500.
fn single_departure_at_500() -> TransitNetwork {
    NetworkBuilder::new(2)
        .route(&[0, 1], |route| {
            route.trip("00:08:20 00:16:40");
        })
        .build()
        .unwrap()
}

#[rstest]
#[case(441, true)]
#[case(470, true)]
#[case(500, true)]
#[case(440, false)]
#[case(501, false)]
fn exact_search_boundary(#[case] earliest_board_time: Time, #[case] found: bool) {
    init();
    let network = single_departure_at_500();
    let event = search_for_exact_trip(
        SearchDirection::Forward,
        network.timetable(0),
        network.pattern(0),
        0,
        earliest_board_time,
        STEP,
    );
    assert_eq!(found, event.is_some());
    if let Some(event) = event {
        assert_eq!(500, event.time);
        assert_eq!(0, event.trip_index);
    }
}

#[test]
fn earliest_trip_search_takes_the_first_departure_at_or_after() {
    init();
    let network = NetworkBuilder::new(2)
        .route(&[0, 1], |route| {
            route
                .trip("10:00:00 10:30:00")
                .trip("10:10:00 10:40:00")
                .trip("10:20:00 10:50:00");
        })
        .build()
        .unwrap();
    let timetable = network.timetable(0);
    let pattern = network.pattern(0);

    let event = search_for_trip(
        SearchDirection::Forward,
        timetable,
        pattern,
        0,
        time("10:05:00"),
        None,
    )
    .unwrap();
    assert_eq!(1, event.trip_index);
    assert_eq!(time("10:10:00"), event.time);

    // an exact-time match takes the trip departing at the limit
    let event = search_for_trip(
        SearchDirection::Forward,
        timetable,
        pattern,
        0,
        time("10:10:00"),
        None,
    )
    .unwrap();
    assert_eq!(1, event.trip_index);

    // nothing departs after the last trip : empty is a valid outcome
    assert!(search_for_trip(
        SearchDirection::Forward,
        timetable,
        pattern,
        0,
        time("10:21:00"),
        None,
    )
    .is_none());

    // the bound restricts the search to strictly earlier trips
    assert!(search_for_trip(
        SearchDirection::Forward,
        timetable,
        pattern,
        0,
        time("10:05:00"),
        Some(1),
    )
    .is_none());
    let event = search_for_trip(
        SearchDirection::Forward,
        timetable,
        pattern,
        0,
        time("10:00:00"),
        Some(1),
    )
    .unwrap();
    assert_eq!(0, event.trip_index);
}

#[test]
fn reverse_search_takes_the_latest_arrival_at_or_before() {
    init();
    let network = NetworkBuilder::new(2)
        .route(&[0, 1], |route| {
            route
                .trip("10:00:00 10:30:00")
                .trip("10:10:00 10:40:00")
                .trip("10:20:00 10:50:00");
        })
        .build()
        .unwrap();
    let timetable = network.timetable(0);
    let pattern = network.pattern(0);

    let event = search_for_trip(
        SearchDirection::Reverse,
        timetable,
        pattern,
        1,
        time("10:45:00"),
        None,
    )
    .unwrap();
    assert_eq!(1, event.trip_index);
    assert_eq!(time("10:40:00"), event.time);

    assert!(search_for_trip(
        SearchDirection::Reverse,
        timetable,
        pattern,
        1,
        time("10:29:00"),
        None,
    )
    .is_none());
}

#[test]
fn permission_flags_are_honored() {
    init();
    let network = NetworkBuilder::new(3)
        .route(&[0, 1, 2], |route| {
            route
                .flow(1, FlowDirection::AlightOnly)
                .trip("10:00:00 10:10:00 10:20:00");
        })
        .build()
        .unwrap();
    let timetable = network.timetable(0);
    let pattern = network.pattern(0);

    // boarding is forbidden at position 1
    assert!(search_for_trip(
        SearchDirection::Forward,
        timetable,
        pattern,
        1,
        time("10:00:00"),
        None,
    )
    .is_none());
    // the reverse search "boards" where the rider alights, which is
    // allowed there
    assert!(search_for_trip(
        SearchDirection::Reverse,
        timetable,
        pattern,
        1,
        time("10:15:00"),
        None,
    )
    .is_some());
}

/// A pattern riding through stop 1 twice : 0, 1, 2, 1, 3.
fn loop_network() -> TransitNetwork {
    NetworkBuilder::new(4)
        .route(&[0, 1, 2, 1, 3], |route| {
            route.trip("10:00:00 10:10:00 10:20:00 10:30:00 10:40:00");
        })
        .build()
        .unwrap()
}

#[test]
fn approximate_search_avoids_riding_an_unnecessary_loop() {
    init();
    let network = loop_network();
    let pattern = network.pattern(0);
    let trip = network.timetable(0).trip(0);

    // alighting at the first occurrence of stop 1 wins over riding the
    // loop to its second occurrence
    let positions =
        find_positions_forward_approximate(pattern, trip, 0, 1, time("10:00:00")).unwrap();
    assert_eq!(
        BoardAlightPositions {
            board_position: 0,
            alight_position: 1,
        },
        positions
    );
}

#[test]
fn approximate_search_picks_the_occurrence_closest_to_the_anchor() {
    init();
    let network = loop_network();
    let pattern = network.pattern(0);
    let trip = network.timetable(0).trip(0);

    // both occurrences of stop 1 board before the anchor : the later
    // one is closest
    let positions =
        find_positions_forward_approximate(pattern, trip, 1, 3, time("10:30:00")).unwrap();
    assert_eq!(3, positions.board_position);
    assert_eq!(4, positions.alight_position);

    // an anchor between the two occurrences resolves to the earlier one
    let positions =
        find_positions_forward_approximate(pattern, trip, 1, 3, time("10:20:00")).unwrap();
    assert_eq!(1, positions.board_position);
    assert_eq!(4, positions.alight_position);
}

#[test]
fn approximate_reverse_search_is_symmetric() {
    init();
    let network = loop_network();
    let pattern = network.pattern(0);
    let trip = network.timetable(0).trip(0);

    let positions =
        find_positions_reverse_approximate(pattern, trip, 0, 1, time("10:30:00")).unwrap();
    // the latest arrival at stop 1 not exceeding the anchor is its
    // second occurrence
    assert_eq!(0, positions.board_position);
    assert_eq!(3, positions.alight_position);

    let positions =
        find_positions_reverse_approximate(pattern, trip, 0, 1, time("10:10:00")).unwrap();
    assert_eq!(1, positions.alight_position);
}

#[test]
fn approximate_search_rejects_inconsistent_anchors() {
    init();
    let network = loop_network();
    let pattern = network.pattern(0);
    let trip = network.timetable(0).trip(0);

    // the same stop for both ends is a caller error
    assert!(find_positions_forward_approximate(pattern, trip, 1, 1, time("10:40:00")).is_err());
    // stop 3 never precedes stop 0 in the pattern
    assert!(find_positions_forward_approximate(pattern, trip, 3, 0, time("10:40:00")).is_err());
    // boarding after the anchor is infeasible
    assert!(find_positions_forward_approximate(pattern, trip, 2, 3, time("10:10:00")).is_err());
}
