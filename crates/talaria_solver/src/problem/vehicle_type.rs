use serde::{Deserialize, Serialize};

use crate::problem::measure::{self, Cost, Duration, Load};

/// A group of identical vehicles: their number, carrying capacity, home
/// depot, fixed deployment cost, shift window, and maximum on-duty duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    pub num_available: usize,
    pub capacity: Load,
    pub depot: usize,
    pub fixed_cost: Cost,
    pub tw_early: Duration,
    pub tw_late: Duration,
    pub max_duration: Duration,
    pub name: String,
}

impl VehicleType {
    pub fn new(num_available: usize, capacity: Load) -> Self {
        VehicleType {
            num_available,
            capacity,
            depot: 0,
            fixed_cost: measure::ZERO,
            tw_early: measure::ZERO,
            tw_late: measure::MAX,
            max_duration: measure::MAX,
            name: String::new(),
        }
    }
}
