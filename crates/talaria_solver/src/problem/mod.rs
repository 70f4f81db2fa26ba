pub mod data;
pub mod location;
pub mod matrix;
pub mod measure;
pub mod vehicle_type;

pub use data::{ProblemData, ProblemError};
pub use location::{Client, Depot, Location};
pub use matrix::Matrix;
pub use vehicle_type::VehicleType;
