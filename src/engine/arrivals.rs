//! The arena of stop arrivals of one iteration.
//!
//! Arrivals form a tree : each record owns an index pointing to its
//! predecessor, down to an access-leg arrival at the root. The whole
//! arena is dropped (cleared, keeping capacity) at the end of each
//! iteration, once paths have been extracted.

use crate::access::AccessEgress;
use crate::cost::RaptorCost;
use crate::model::{StopIndex, TransferConstraint, TripRef};
use crate::time::{PositiveDuration, Time};

/// Index of a [`StopArrival`] in the iteration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalId(u32);

/// How a stop was reached.
#[derive(Debug, Clone)]
pub enum ArrivedBy {
    Access {
        leg: AccessEgress,
        departure_time: Time,
    },
    Transit {
        trip: TripRef,
        /// The stop where the scan entered the vehicle : the rider's
        /// boarding stop forward, the rider's alighting stop in reverse.
        entry_stop: StopIndex,
        /// The trip time at `entry_stop`.
        entry_time: Time,
        constraint: Option<TransferConstraint>,
    },
    Transfer {
        duration: PositiveDuration,
    },
}

/// One node of the arrival tree.
#[derive(Debug, Clone)]
pub struct StopArrival {
    pub stop: StopIndex,
    pub round: usize,
    pub arrival_time: Time,
    pub cost: RaptorCost,
    pub num_rides: u8,
    pub prev: Option<ArrivalId>,
    pub arrived_by: ArrivedBy,
}

#[derive(Debug, Default)]
pub struct Arrivals {
    records: Vec<StopArrival>,
}

impl Arrivals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, arrival: StopArrival) -> ArrivalId {
        debug_assert!(arrival.prev.map_or(true, |id| (id.0 as usize) < self.records.len()));
        let id = ArrivalId(self.records.len() as u32);
        self.records.push(arrival);
        id
    }

    pub fn get(&self, id: ArrivalId) -> &StopArrival {
        &self.records[id.0 as usize]
    }

    /// Drop every record, keeping the allocation for the next iteration.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::ops::Index<ArrivalId> for Arrivals {
    type Output = StopArrival;

    fn index(&self, id: ArrivalId) -> &StopArrival {
        self.get(id)
    }
}
