//! Search request parameters and their validation.

use std::fmt::{Display, Formatter};
use std::time::Instant;

use chrono::NaiveDateTime;

use crate::engine::SearchDirection;
use crate::search_window::SearchWindowParams;
use crate::time::{Calendar, PositiveDuration, Time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// One best arrival time per stop per round.
    Standard,
    /// A pareto set per stop over arrival time, rides, cost and transit
    /// groups.
    MultiCriteria,
}

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub direction: SearchDirection,
    pub profile: Profile,
    pub earliest_departure_time: Option<Time>,
    pub latest_arrival_time: Option<Time>,
    /// When unset, the window is derived dynamically from heuristics
    /// and `window_params`.
    pub search_window: Option<PositiveDuration>,
    pub window_params: SearchWindowParams,
    pub max_rounds: usize,
    pub max_additional_transfers: usize,
    pub iteration_step: PositiveDuration,
    /// Cooperative cancellation : checked between iterations and
    /// rounds. Expiry yields the paths found so far, flagged
    /// incomplete.
    pub deadline: Option<Instant>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            direction: SearchDirection::Forward,
            profile: Profile::Standard,
            earliest_departure_time: None,
            latest_arrival_time: None,
            search_window: None,
            window_params: SearchWindowParams::default(),
            max_rounds: 12,
            max_additional_transfers: 5,
            iteration_step: PositiveDuration::from_seconds(60),
            deadline: None,
        }
    }
}

impl SearchParams {
    pub fn depart_after(earliest_departure_time: Time) -> Self {
        Self {
            earliest_departure_time: Some(earliest_departure_time),
            ..Self::default()
        }
    }

    pub fn arrive_before(latest_arrival_time: Time) -> Self {
        Self {
            direction: SearchDirection::Reverse,
            latest_arrival_time: Some(latest_arrival_time),
            ..Self::default()
        }
    }

    pub fn depart_after_datetime(
        calendar: &Calendar,
        datetime: NaiveDateTime,
    ) -> Result<Self, RequestError> {
        let time = calendar
            .time_of(datetime)
            .ok_or(RequestError::DatetimeOutsideValidityPeriod)?;
        Ok(Self::depart_after(time))
    }

    pub fn arrive_before_datetime(
        calendar: &Calendar,
        datetime: NaiveDateTime,
    ) -> Result<Self, RequestError> {
        let time = calendar
            .time_of(datetime)
            .ok_or(RequestError::DatetimeOutsideValidityPeriod)?;
        Ok(Self::arrive_before(time))
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_search_window(mut self, window: PositiveDuration) -> Self {
        self.search_window = Some(window);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), RequestError> {
        match self.direction {
            SearchDirection::Forward => {
                if self.earliest_departure_time.is_none() && self.latest_arrival_time.is_none() {
                    return Err(RequestError::MissingTimeAnchor);
                }
            }
            SearchDirection::Reverse => {
                if self.latest_arrival_time.is_none() {
                    return Err(RequestError::MissingTimeAnchor);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    MissingTimeAnchor,
    NoAccessLegs,
    NoEgressLegs,
    DatetimeOutsideValidityPeriod,
}

impl std::error::Error for RequestError {}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::MissingTimeAnchor => write!(
                f,
                "The request needs an earliest departure time or a latest arrival time."
            ),
            RequestError::NoAccessLegs => {
                write!(f, "No access leg connects the origin to the network.")
            }
            RequestError::NoEgressLegs => {
                write!(f, "No egress leg connects the network to the destination.")
            }
            RequestError::DatetimeOutsideValidityPeriod => write!(
                f,
                "The requested datetime is out of the validity period of the data."
            ),
        }
    }
}
