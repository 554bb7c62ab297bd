//! Foot transfers between stops.

use crate::cost::RaptorCost;
use crate::model::StopIndex;
use crate::time::PositiveDuration;

/// A walkable connection from one stop to another.
#[derive(Debug, Clone, Copy)]
pub struct Transfer {
    pub to_stop: StopIndex,
    pub duration: PositiveDuration,
    pub cost: RaptorCost,
}
