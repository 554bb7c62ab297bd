//! Direction-dependent arithmetic.
//!
//! The engine runs the same code forward (earliest arrival) and in
//! reverse (latest departure). All the arithmetic that flips between the
//! two is concentrated here, as plain `match`es on the direction rather
//! than dynamic dispatch.

use crate::model::{Pattern, SlackProvider, TripSchedule};
use crate::time::{PositiveDuration, Time, UNREACHED_FORWARD, UNREACHED_REVERSE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Reverse,
}

impl SearchDirection {
    pub fn unreached(self) -> Time {
        match self {
            SearchDirection::Forward => UNREACHED_FORWARD,
            SearchDirection::Reverse => UNREACHED_REVERSE,
        }
    }

    /// `a` strictly better than `b` in the search direction.
    pub fn is_before(self, a: Time, b: Time) -> bool {
        match self {
            SearchDirection::Forward => a < b,
            SearchDirection::Reverse => a > b,
        }
    }

    pub fn is_before_or_equal(self, a: Time, b: Time) -> bool {
        match self {
            SearchDirection::Forward => a <= b,
            SearchDirection::Reverse => a >= b,
        }
    }

    /// Move `time` further along the search direction.
    pub fn plus(self, time: Time, duration: PositiveDuration) -> Time {
        match self {
            SearchDirection::Forward => time + duration.seconds_i32(),
            SearchDirection::Reverse => time - duration.seconds_i32(),
        }
    }

    pub fn minus(self, time: Time, duration: PositiveDuration) -> Time {
        match self {
            SearchDirection::Forward => time - duration.seconds_i32(),
            SearchDirection::Reverse => time + duration.seconds_i32(),
        }
    }

    /// The non-negative span from `from` to `to`, `to` being further
    /// along the search direction.
    pub fn duration(self, from: Time, to: Time) -> i32 {
        match self {
            SearchDirection::Forward => to - from,
            SearchDirection::Reverse => from - to,
        }
    }

    /// Pattern positions in scan order : a reverse search traverses
    /// patterns from last to first position.
    pub fn positions(self, nb_of_positions: usize) -> PositionIter {
        PositionIter {
            next: match self {
                SearchDirection::Forward => 0,
                SearchDirection::Reverse => nb_of_positions as isize - 1,
            },
            step: match self {
                SearchDirection::Forward => 1,
                SearchDirection::Reverse => -1,
            },
            remaining: nb_of_positions,
        }
    }

    /// The trip time at which the scan *enters* the vehicle : the
    /// departure forward, the arrival in reverse.
    pub fn board_time_of(self, trip: &TripSchedule, position: usize) -> Time {
        match self {
            SearchDirection::Forward => trip.departure_time(position),
            SearchDirection::Reverse => trip.arrival_time(position),
        }
    }

    /// The trip time at which the scan *leaves* the vehicle.
    pub fn alight_time_of(self, trip: &TripSchedule, position: usize) -> Time {
        match self {
            SearchDirection::Forward => trip.arrival_time(position),
            SearchDirection::Reverse => trip.departure_time(position),
        }
    }

    /// Boarding permission in scan terms : the reverse scan "boards"
    /// where the rider alights.
    pub fn can_board(self, pattern: &Pattern, position: usize) -> bool {
        match self {
            SearchDirection::Forward => pattern.can_board(position),
            SearchDirection::Reverse => pattern.can_alight(position),
        }
    }

    pub fn can_alight(self, pattern: &Pattern, position: usize) -> bool {
        match self {
            SearchDirection::Forward => pattern.can_alight(position),
            SearchDirection::Reverse => pattern.can_board(position),
        }
    }

    /// The slack added before boarding, in scan terms : board slack
    /// forward, alight slack in reverse.
    pub fn board_slack(self, slack: &SlackProvider, slack_index: usize) -> PositiveDuration {
        match self {
            SearchDirection::Forward => slack.board_slack(slack_index),
            SearchDirection::Reverse => slack.alight_slack(slack_index),
        }
    }

    pub fn alight_slack(self, slack: &SlackProvider, slack_index: usize) -> PositiveDuration {
        match self {
            SearchDirection::Forward => slack.alight_slack(slack_index),
            SearchDirection::Reverse => slack.board_slack(slack_index),
        }
    }
}

pub struct PositionIter {
    next: isize,
    step: isize,
    remaining: usize,
}

impl Iterator for PositionIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let position = self.next as usize;
        self.next += self.step;
        self.remaining -= 1;
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_iterate_in_scan_order() {
        let forward: Vec<usize> = SearchDirection::Forward.positions(3).collect();
        assert_eq!(vec![0, 1, 2], forward);
        let reverse: Vec<usize> = SearchDirection::Reverse.positions(3).collect();
        assert_eq!(vec![2, 1, 0], reverse);
        assert_eq!(0, SearchDirection::Reverse.positions(0).count());
    }

    #[test]
    fn arithmetic_flips_in_reverse() {
        let d = PositiveDuration::from_seconds(60);
        assert_eq!(160, SearchDirection::Forward.plus(100, d));
        assert_eq!(40, SearchDirection::Reverse.plus(100, d));
        assert!(SearchDirection::Forward.is_before(100, 200));
        assert!(SearchDirection::Reverse.is_before(200, 100));
        assert_eq!(50, SearchDirection::Forward.duration(100, 150));
        assert_eq!(50, SearchDirection::Reverse.duration(150, 100));
    }
}
