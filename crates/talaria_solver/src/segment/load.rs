use crate::problem::{Client, measure::Load};

/// Load statistics of a chain of visits: total delivery demand, total pickup
/// demand, and the peak instantaneous load anywhere along the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSegment {
    delivery: Load,
    pickup: Load,
    load: Load,
}

impl LoadSegment {
    pub fn new(delivery: Load, pickup: Load, load: Load) -> Self {
        LoadSegment {
            delivery,
            pickup,
            load,
        }
    }

    pub fn client(client: &Client) -> Self {
        LoadSegment {
            delivery: client.delivery,
            pickup: client.pickup,
            load: client.delivery.max(client.pickup),
        }
    }

    /// Segment of a location without demand (a depot).
    pub fn empty() -> Self {
        LoadSegment::default()
    }

    pub fn merge(first: Self, second: Self) -> Self {
        LoadSegment {
            delivery: first.delivery + second.delivery,
            pickup: first.pickup + second.pickup,
            // Deliveries of the second segment are already on board while
            // traversing the first, and pickups of the first stay on board
            // throughout the second.
            load: (first.load + second.delivery).max(second.load + first.pickup),
        }
    }

    pub fn merge3(first: Self, second: Self, third: Self) -> Self {
        Self::merge(Self::merge(first, second), third)
    }

    pub fn delivery(&self) -> Load {
        self.delivery
    }

    pub fn pickup(&self) -> Load {
        self.pickup
    }

    pub fn load(&self) -> Load {
        self.load
    }
}

impl Default for LoadSegment {
    fn default() -> Self {
        LoadSegment {
            delivery: Load::default(),
            pickup: Load::default(),
            load: Load::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_tracks_peak_load() {
        let first = LoadSegment::new(5, 8, 8);
        let second = LoadSegment::new(3, 9, 11);

        let merged = LoadSegment::merge(first, second);
        assert_eq!(merged.delivery(), 5 + 3);
        assert_eq!(merged.pickup(), 8 + 9);
        assert_eq!(merged.load(), (8 + 3).max(11 + 8));

        let flipped = LoadSegment::merge(second, first);
        assert_eq!(flipped.delivery(), 3 + 5);
        assert_eq!(flipped.pickup(), 9 + 8);
        assert_eq!(flipped.load(), (11 + 5).max(8 + 9));
    }

    #[test]
    fn merge_is_associative() {
        let a = LoadSegment::new(5, 8, 8);
        let b = LoadSegment::new(3, 9, 11);
        let c = LoadSegment::new(2, 0, 2);

        assert_eq!(
            LoadSegment::merge(LoadSegment::merge(a, b), c),
            LoadSegment::merge(a, LoadSegment::merge(b, c)),
        );
    }

    #[test]
    fn merging_with_empty_is_identity() {
        let segment = LoadSegment::new(4, 2, 4);
        assert_eq!(LoadSegment::merge(segment, LoadSegment::empty()), segment);
        assert_eq!(LoadSegment::merge(LoadSegment::empty(), segment), segment);
    }
}
