//! Trip patterns : the ordered stop sequence shared by the trips of one
//! route, with per-position boarding/alighting permissions.

use crate::model::StopIndex;

/// What a rider may do at one position of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    BoardAndAlight,
    BoardOnly,
    AlightOnly,
    NoBoardAlight,
}

/// The transit mode of a route, used by cost adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitMode {
    Tram,
    Metro,
    Rail,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
}

/// An ordered sequence of stops visited by the trips of one route.
///
/// Immutable for the lifetime of a snapshot. A stop may appear several
/// times in the sequence (loop patterns), which is why the engine works
/// with *positions* and resolves positions back to stops.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) stops: Vec<StopIndex>,
    pub(crate) flows: Vec<FlowDirection>,
    pub(crate) slack_index: usize,
    pub(crate) priority_group_mask: u32,
    pub(crate) mode: TransitMode,
    pub(crate) agency: usize,
}

impl Pattern {
    pub fn nb_of_positions(&self) -> usize {
        self.stops.len()
    }

    /// Panics if `position` is out of bounds.
    pub fn stop_at(&self, position: usize) -> StopIndex {
        self.stops[position]
    }

    pub fn stops(&self) -> &[StopIndex] {
        &self.stops
    }

    pub fn can_board(&self, position: usize) -> bool {
        matches!(
            self.flows[position],
            FlowDirection::BoardAndAlight | FlowDirection::BoardOnly
        )
    }

    pub fn can_alight(&self, position: usize) -> bool {
        matches!(
            self.flows[position],
            FlowDirection::BoardAndAlight | FlowDirection::AlightOnly
        )
    }

    /// Lookup key into the slack provider tables.
    pub fn slack_index(&self) -> usize {
        self.slack_index
    }

    /// Bitmask used for transit-group dominance in the multicriteria
    /// profile.
    pub fn priority_group_mask(&self) -> u32 {
        self.priority_group_mask
    }

    pub fn mode(&self) -> TransitMode {
        self.mode
    }

    pub fn agency(&self) -> usize {
        self.agency
    }
}
