//! Scalar measure types for distances, durations, loads, costs and
//! coordinates.
//!
//! The default representation is a truncating 64-bit integer; enabling the
//! `double-precision` feature switches every measure to `f64`. All arithmetic
//! in the crate is written against the shared [`Value`] alias so both
//! representations compile.

#[cfg(not(feature = "double-precision"))]
mod repr {
    pub type Value = i64;

    pub const ZERO: Value = 0;
    pub const ONE: Value = 1;
    pub const MAX: Value = i64::MAX;

    pub fn from_f64(value: f64) -> Value {
        value as Value
    }
}

#[cfg(feature = "double-precision")]
mod repr {
    pub type Value = f64;

    pub const ZERO: Value = 0.0;
    pub const ONE: Value = 1.0;
    pub const MAX: Value = f64::INFINITY;

    pub fn from_f64(value: f64) -> Value {
        value
    }
}

pub use repr::{MAX, ONE, Value, ZERO, from_f64};

pub type Coordinate = Value;
pub type Cost = Value;
pub type Distance = Value;
pub type Duration = Value;
pub type Load = Value;

/// Total order over measure values, usable as a sort key for both scalar
/// representations.
pub fn cmp(a: Value, b: Value) -> std::cmp::Ordering {
    a.partial_cmp(&b).expect("measure values are never NaN")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f64_truncates_or_passes_through() {
        #[cfg(not(feature = "double-precision"))]
        assert_eq!(from_f64(2.9), 2);

        #[cfg(feature = "double-precision")]
        assert_eq!(from_f64(2.9), 2.9);
    }

    #[test]
    fn max_is_absorbing_for_comparisons() {
        assert!(MAX > ZERO);
        assert_eq!(cmp(ZERO, MAX), std::cmp::Ordering::Less);
    }
}
