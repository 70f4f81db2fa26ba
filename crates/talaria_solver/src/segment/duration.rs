use crate::problem::{
    Location, Matrix, VehicleType,
    measure::{self, Duration},
};

/// Schedule statistics of a chain of visits: total duration (travel, service
/// and waiting), accumulated time warp, the feasible window of start times at
/// the first location, and the chain's release time.
///
/// `tw_early` and `tw_late` bound the start times at the first location that
/// realise the minimum chain duration. Starting later than `tw_late` incurs
/// time warp; starting earlier than `tw_early` incurs waiting.
///
/// When the `time-windows` feature is disabled the segment degenerates to a
/// plain travel-duration accumulator: `time_warp` stays zero and the window
/// is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationSegment {
    idx_first: usize,
    idx_last: usize,
    duration: Duration,
    time_warp: Duration,
    tw_early: Duration,
    tw_late: Duration,
    release_time: Duration,
}

impl DurationSegment {
    pub fn new(
        idx_first: usize,
        idx_last: usize,
        duration: Duration,
        time_warp: Duration,
        tw_early: Duration,
        tw_late: Duration,
        release_time: Duration,
    ) -> Self {
        DurationSegment {
            idx_first,
            idx_last,
            duration,
            time_warp,
            tw_early,
            tw_late,
            release_time,
        }
    }

    /// Segment of the single location at the given index.
    pub fn at(idx: usize, location: Location) -> Self {
        #[cfg(feature = "time-windows")]
        return DurationSegment::new(
            idx,
            idx,
            location.service_duration(),
            measure::ZERO,
            location.tw_early(),
            location.tw_late(),
            location.release_time(),
        );

        #[cfg(not(feature = "time-windows"))]
        return DurationSegment::new(
            idx,
            idx,
            location.service_duration(),
            measure::ZERO,
            measure::ZERO,
            measure::MAX,
            measure::ZERO,
        );
    }

    /// Segment of a depot visit at the start or end of a route, restricted to
    /// the vehicle's shift window.
    pub fn depot(idx: usize, location: Location, vehicle_type: &VehicleType) -> Self {
        #[cfg(feature = "time-windows")]
        return DurationSegment::new(
            idx,
            idx,
            measure::ZERO,
            measure::ZERO,
            location.tw_early().max(vehicle_type.tw_early),
            location.tw_late().min(vehicle_type.tw_late),
            measure::ZERO,
        );

        #[cfg(not(feature = "time-windows"))]
        {
            let _ = (location, vehicle_type);
            return DurationSegment::new(
                idx,
                idx,
                measure::ZERO,
                measure::ZERO,
                measure::ZERO,
                measure::MAX,
                measure::ZERO,
            );
        }
    }

    #[cfg(feature = "time-windows")]
    pub fn merge(matrix: &Matrix<Duration>, first: Self, second: Self) -> Self {
        let edge = matrix[(first.idx_last, second.idx_first)];

        // Time elapsed since the start at the first location upon arriving at
        // the second segment.
        let at_second = first.duration - first.time_warp + edge;

        let diff_tw = (first.tw_early + at_second - second.tw_late).max(measure::ZERO);

        // Comparison first: subtracting from an unconstrained tw_late would
        // underflow the integer representation.
        let diff_wait = if second.tw_early - at_second > first.tw_late {
            second.tw_early - at_second - first.tw_late
        } else {
            measure::ZERO
        };

        DurationSegment {
            idx_first: first.idx_first,
            idx_last: second.idx_last,
            duration: first.duration + second.duration + edge + diff_wait,
            time_warp: first.time_warp + second.time_warp + diff_tw,
            tw_early: (second.tw_early - at_second).max(first.tw_early) - diff_wait,
            tw_late: (second.tw_late - at_second).min(first.tw_late) + diff_tw,
            release_time: first.release_time.max(second.release_time),
        }
    }

    #[cfg(not(feature = "time-windows"))]
    pub fn merge(matrix: &Matrix<Duration>, first: Self, second: Self) -> Self {
        let edge = matrix[(first.idx_last, second.idx_first)];

        DurationSegment {
            idx_first: first.idx_first,
            idx_last: second.idx_last,
            duration: first.duration + edge + second.duration,
            time_warp: measure::ZERO,
            tw_early: measure::ZERO,
            tw_late: measure::MAX,
            release_time: measure::ZERO,
        }
    }

    pub fn merge3(matrix: &Matrix<Duration>, first: Self, second: Self, third: Self) -> Self {
        Self::merge(matrix, Self::merge(matrix, first, second), third)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Total time warp, including lateness forced by the release time and any
    /// overrun of the given maximum duration. The maximum duration is applied
    /// here, at read time, never inside `merge`.
    pub fn time_warp(&self, max_duration: Duration) -> Duration {
        self.time_warp
            + (self.release_time - self.tw_late).max(measure::ZERO)
            + (self.duration - max_duration).max(measure::ZERO)
    }

    pub fn tw_early(&self) -> Duration {
        self.tw_early
    }

    pub fn tw_late(&self) -> Duration {
        self.tw_late
    }

    pub fn release_time(&self) -> Duration {
        self.release_time
    }

    pub fn idx_first(&self) -> usize {
        self.idx_first
    }

    pub fn idx_last(&self) -> usize {
        self.idx_last
    }
}

#[cfg(all(test, feature = "time-windows"))]
mod tests {
    use super::*;

    fn matrix() -> Matrix<Duration> {
        Matrix::from_rows(vec![
            vec![0, 4, 7],
            vec![4, 0, 2],
            vec![7, 2, 0],
        ])
        .unwrap()
    }

    fn segment(idx: usize, duration: Duration, tw_early: Duration, tw_late: Duration) -> DurationSegment {
        DurationSegment::new(idx, idx, duration, 0, tw_early, tw_late, 0)
    }

    #[test]
    fn merge_accumulates_time_warp() {
        // Starting at the first location no earlier than 2, the second
        // location is reached after 3 + 4 = 7 elapsed. Its window closes at
        // 8, so one unit of time warp is unavoidable.
        let first = segment(0, 3, 2, 10);
        let second = segment(1, 2, 5, 8);

        let merged = DurationSegment::merge(&matrix(), first, second);
        assert_eq!(merged.duration(), 3 + 2 + 4);
        assert_eq!(merged.time_warp(measure::MAX), 1);
        assert_eq!(merged.tw_early(), 2);
        assert_eq!(merged.tw_late(), 2);
    }

    #[test]
    fn merge_accumulates_wait_duration() {
        // Even when leaving as late as possible (at 10), the second window
        // only opens at 20 while we arrive at 17: three units of wait.
        let first = segment(0, 3, 2, 10);
        let second = segment(1, 2, 20, 25);

        let merged = DurationSegment::merge(&matrix(), first, second);
        assert_eq!(merged.duration(), 3 + 2 + 4 + 3);
        assert_eq!(merged.time_warp(measure::MAX), 0);
        assert_eq!(merged.tw_early(), 13);
        assert_eq!(merged.tw_late(), 10);
    }

    #[test]
    fn merge_is_associative() {
        let matrix = matrix();
        let a = segment(0, 3, 2, 10);
        let b = segment(1, 2, 5, 8);
        let c = segment(2, 4, 9, 30);

        let left = DurationSegment::merge(&matrix, DurationSegment::merge(&matrix, a, b), c);
        let right = DurationSegment::merge(&matrix, a, DurationSegment::merge(&matrix, b, c));

        assert_eq!(left, right);
        assert_eq!(left, DurationSegment::merge3(&matrix, a, b, c));
    }

    #[test]
    fn max_duration_counts_as_time_warp_at_read_time() {
        let first = segment(0, 3, 0, 100);
        let second = segment(1, 2, 0, 100);

        let merged = DurationSegment::merge(&matrix(), first, second);
        assert_eq!(merged.time_warp(measure::MAX), 0);
        assert_eq!(merged.time_warp(5), 9 - 5);
    }

    #[test]
    fn release_time_lateness_counts_as_time_warp() {
        let segment = DurationSegment::new(0, 0, 0, 0, 0, 10, 14);
        assert_eq!(segment.time_warp(measure::MAX), 4);
    }
}
