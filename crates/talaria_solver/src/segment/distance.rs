use crate::problem::{Matrix, measure::Distance};

/// Cumulative travel distance along a chain of locations, together with the
/// first and last location of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSegment {
    idx_first: usize,
    idx_last: usize,
    distance: Distance,
}

impl DistanceSegment {
    pub fn new(idx_first: usize, idx_last: usize, distance: Distance) -> Self {
        DistanceSegment {
            idx_first,
            idx_last,
            distance,
        }
    }

    /// Segment of the single given location.
    pub fn at(idx: usize) -> Self {
        DistanceSegment::new(idx, idx, Distance::default())
    }

    pub fn merge(matrix: &Matrix<Distance>, first: Self, second: Self) -> Self {
        DistanceSegment {
            idx_first: first.idx_first,
            idx_last: second.idx_last,
            distance: first.distance
                + matrix[(first.idx_last, second.idx_first)]
                + second.distance,
        }
    }

    pub fn merge3(matrix: &Matrix<Distance>, first: Self, second: Self, third: Self) -> Self {
        Self::merge(matrix, Self::merge(matrix, first, second), third)
    }

    pub fn idx_first(&self) -> usize {
        self.idx_first
    }

    pub fn idx_last(&self) -> usize {
        self.idx_last
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }
}
